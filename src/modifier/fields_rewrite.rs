use std::{net::Ipv4Addr, sync::Arc};

use arc_swap::ArcSwap;
use tracing::info;

use crate::{
    classify::{IpVersion, LinkLayer, Transport, classify_network, link_layer, locate_network_header},
    error::{ConfigError, FrameError},
    frame::Frame,
    headers::*,
    modifier::{
        ModifierStats, Options, PacketModifier,
        args::{format_mac, normalize, parse_ipv4, parse_mac, parse_u8, parse_u16},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteField {
    EthDst,
    EthSrc,
    EthType,
    Ipv4Proto,
    Ipv4Src,
    Ipv4Dst,
    Ipv4Dscp,
    Ipv4Ttl,
    Ipv4Ecn,
    TcpSrc,
    TcpDst,
    UdpSrc,
    UdpDst,
}

impl RewriteField {
    pub const ALL: [RewriteField; 13] = [
        RewriteField::EthDst,
        RewriteField::EthSrc,
        RewriteField::EthType,
        RewriteField::Ipv4Proto,
        RewriteField::Ipv4Src,
        RewriteField::Ipv4Dst,
        RewriteField::Ipv4Dscp,
        RewriteField::Ipv4Ttl,
        RewriteField::Ipv4Ecn,
        RewriteField::TcpSrc,
        RewriteField::TcpDst,
        RewriteField::UdpSrc,
        RewriteField::UdpDst,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(key.trim()))
    }

    pub fn key(&self) -> &'static str {
        match self {
            RewriteField::EthDst => "ETH_DST",
            RewriteField::EthSrc => "ETH_SRC",
            RewriteField::EthType => "ETH_TYPE",
            RewriteField::Ipv4Proto => "IPV4_PROTO",
            RewriteField::Ipv4Src => "IPV4_SRC",
            RewriteField::Ipv4Dst => "IPV4_DST",
            RewriteField::Ipv4Dscp => "IPV4_DSCP",
            RewriteField::Ipv4Ttl => "IPV4_TTL",
            RewriteField::Ipv4Ecn => "IPV4_ECN",
            RewriteField::TcpSrc => "TCP_SRC",
            RewriteField::TcpDst => "TCP_DST",
            RewriteField::UdpSrc => "UDP_SRC",
            RewriteField::UdpDst => "UDP_DST",
        }
    }
}

/// 每个字段一个可选字面量，`None` = 不改
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteFields {
    pub eth_dst: Option<[u8; 6]>,
    pub eth_src: Option<[u8; 6]>,
    pub eth_type: Option<u16>,
    pub ipv4_proto: Option<u8>,
    pub ipv4_src: Option<Ipv4Addr>,
    pub ipv4_dst: Option<Ipv4Addr>,
    pub ipv4_dscp: Option<u8>,
    pub ipv4_ttl: Option<u8>,
    pub ipv4_ecn: Option<u8>,
    pub tcp_src: Option<u16>,
    pub tcp_dst: Option<u16>,
    pub udp_src: Option<u16>,
    pub udp_dst: Option<u16>,
}

impl RewriteFields {
    pub fn from_options(options: &Options<'_>) -> Result<Self, ConfigError> {
        let mut fields = RewriteFields::default();
        for (key, value) in normalize(options)? {
            let field = RewriteField::from_key(&key).ok_or(ConfigError::UnknownOption(key.clone()))?;
            fields.parse_field(field, value)?;
        }
        Ok(fields)
    }

    /// 空字符串表示取消这个字段
    pub fn parse_field(&mut self, field: RewriteField, value: &str) -> Result<(), ConfigError> {
        let key = field.key();
        let value = value.trim();
        if value.is_empty() {
            self.clear(field);
            return Ok(());
        }
        match field {
            RewriteField::EthDst => self.eth_dst = Some(parse_mac(key, value)?),
            RewriteField::EthSrc => self.eth_src = Some(parse_mac(key, value)?),
            RewriteField::EthType => self.eth_type = Some(parse_u16(key, value)?),
            RewriteField::Ipv4Proto => self.ipv4_proto = Some(parse_u8(key, value, u8::MAX)?),
            RewriteField::Ipv4Src => self.ipv4_src = Some(parse_ipv4(key, value)?),
            RewriteField::Ipv4Dst => self.ipv4_dst = Some(parse_ipv4(key, value)?),
            RewriteField::Ipv4Dscp => self.ipv4_dscp = Some(parse_u8(key, value, IP_DSCP_MAX)?),
            RewriteField::Ipv4Ttl => self.ipv4_ttl = Some(parse_u8(key, value, u8::MAX)?),
            RewriteField::Ipv4Ecn => self.ipv4_ecn = Some(parse_u8(key, value, IP_ECN_MAX)?),
            RewriteField::TcpSrc => self.tcp_src = Some(parse_u16(key, value)?),
            RewriteField::TcpDst => self.tcp_dst = Some(parse_u16(key, value)?),
            RewriteField::UdpSrc => self.udp_src = Some(parse_u16(key, value)?),
            RewriteField::UdpDst => self.udp_dst = Some(parse_u16(key, value)?),
        }
        Ok(())
    }

    fn clear(&mut self, field: RewriteField) {
        let empty = RewriteFields::default();
        self.copy_field(field, &empty);
    }

    fn copy_field(&mut self, field: RewriteField, from: &RewriteFields) {
        match field {
            RewriteField::EthDst => self.eth_dst = from.eth_dst,
            RewriteField::EthSrc => self.eth_src = from.eth_src,
            RewriteField::EthType => self.eth_type = from.eth_type,
            RewriteField::Ipv4Proto => self.ipv4_proto = from.ipv4_proto,
            RewriteField::Ipv4Src => self.ipv4_src = from.ipv4_src,
            RewriteField::Ipv4Dst => self.ipv4_dst = from.ipv4_dst,
            RewriteField::Ipv4Dscp => self.ipv4_dscp = from.ipv4_dscp,
            RewriteField::Ipv4Ttl => self.ipv4_ttl = from.ipv4_ttl,
            RewriteField::Ipv4Ecn => self.ipv4_ecn = from.ipv4_ecn,
            RewriteField::TcpSrc => self.tcp_src = from.tcp_src,
            RewriteField::TcpDst => self.tcp_dst = from.tcp_dst,
            RewriteField::UdpSrc => self.udp_src = from.udp_src,
            RewriteField::UdpDst => self.udp_dst = from.udp_dst,
        }
    }

    /// 读 handler 的文本形式，未设置为空串
    pub fn format_field(&self, field: RewriteField) -> String {
        fn text<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }
        match field {
            RewriteField::EthDst => self.eth_dst.as_ref().map(format_mac).unwrap_or_default(),
            RewriteField::EthSrc => self.eth_src.as_ref().map(format_mac).unwrap_or_default(),
            RewriteField::EthType => self.eth_type.map(|t| format!("0x{t:04x}")).unwrap_or_default(),
            RewriteField::Ipv4Proto => text(self.ipv4_proto),
            RewriteField::Ipv4Src => text(self.ipv4_src),
            RewriteField::Ipv4Dst => text(self.ipv4_dst),
            RewriteField::Ipv4Dscp => text(self.ipv4_dscp),
            RewriteField::Ipv4Ttl => text(self.ipv4_ttl),
            RewriteField::Ipv4Ecn => text(self.ipv4_ecn),
            RewriteField::TcpSrc => text(self.tcp_src),
            RewriteField::TcpDst => text(self.tcp_dst),
            RewriteField::UdpSrc => text(self.udp_src),
            RewriteField::UdpDst => text(self.udp_dst),
        }
    }
}

// 不可变快照：字段 + 各层“有没有要改的”
#[derive(Debug)]
struct RewriteSnapshot {
    fields: RewriteFields,
    any_ethernet: bool,
    any_ipv4: bool,
    any_tcp: bool,
    any_udp: bool,
    any_set: bool,
}

impl RewriteSnapshot {
    fn new(fields: RewriteFields) -> Self {
        let f = &fields;
        let any_ethernet = f.eth_dst.is_some() || f.eth_src.is_some() || f.eth_type.is_some();
        let any_ipv4 = f.ipv4_proto.is_some()
            || f.ipv4_src.is_some()
            || f.ipv4_dst.is_some()
            || f.ipv4_dscp.is_some()
            || f.ipv4_ttl.is_some()
            || f.ipv4_ecn.is_some();
        let any_tcp = f.tcp_src.is_some() || f.tcp_dst.is_some();
        let any_udp = f.udp_src.is_some() || f.udp_dst.is_some();
        Self {
            any_set: any_ethernet || any_ipv4 || any_tcp || any_udp,
            any_ethernet,
            any_ipv4,
            any_tcp,
            any_udp,
            fields,
        }
    }
}

// ==========================================
// 字段改写：把配置的字面量写进对应头部
// 可在运行中整体替换配置，单个包要么全旧要么全新
// ==========================================
#[derive(Debug)]
pub struct NetworkHeaderFieldsRewrite {
    config: ArcSwap<RewriteSnapshot>,
    stats: ModifierStats,
}

impl NetworkHeaderFieldsRewrite {
    pub fn new(fields: RewriteFields) -> Self {
        Self {
            config: ArcSwap::from_pointee(RewriteSnapshot::new(fields)),
            stats: ModifierStats::default(),
        }
    }

    pub fn from_options(options: &Options<'_>) -> Result<Self, ConfigError> {
        Ok(Self::new(RewriteFields::from_options(options)?))
    }

    pub fn fields(&self) -> RewriteFields {
        self.config.load().fields.clone()
    }

    pub fn any_set(&self) -> bool {
        self.config.load().any_set
    }
}

impl PacketModifier for NetworkHeaderFieldsRewrite {
    fn class_name(&self) -> &'static str {
        "NetworkHeaderFieldsRewrite"
    }

    fn stats(&self) -> &ModifierStats {
        &self.stats
    }

    fn process(&self, mut frame: Frame) -> Result<Frame, FrameError> {
        let snapshot = self.config.load_full();
        if !snapshot.any_set {
            return Ok(frame);
        }

        frame.ensure_exclusive()?;
        // 先分类再改写，EtherType / 协议号被改也不影响本包的判断
        let Some(link) = link_layer(&frame)? else {
            return Ok(frame);
        };
        let fields = &snapshot.fields;

        if snapshot.any_ethernet {
            rewrite_ethernet(&mut frame, &link, fields)?;
        }

        // 没有要改的上层字段，网络层坏了也与本元素无关
        let wanted = match link.ip_version() {
            Some(IpVersion::V4) => snapshot.any_ipv4 || snapshot.any_tcp || snapshot.any_udp,
            Some(IpVersion::V6) => snapshot.any_tcp || snapshot.any_udp,
            None => false,
        };
        if !wanted {
            return Ok(frame);
        }

        let class = classify_network(&frame, link)?;
        let Some((net, net_len)) = locate_network_header(&frame, &class)? else {
            return Ok(frame);
        };

        if snapshot.any_ipv4 && class.ip_version == Some(IpVersion::V4) {
            rewrite_ipv4(&mut frame, net, fields)?;
        }

        let th = net + net_len;
        if !class.is_first_fragment || frame.len() < th + MIN_TRANSPORT_LEN {
            return Ok(frame);
        }
        match class.transport {
            Some(Transport::Tcp) if snapshot.any_tcp => {
                rewrite_ports(&mut frame, th, fields.tcp_src, fields.tcp_dst)?
            }
            Some(Transport::Udp) if snapshot.any_udp => {
                rewrite_ports(&mut frame, th, fields.udp_src, fields.udp_dst)?
            }
            _ => {}
        }

        Ok(frame)
    }

    fn configure(&self, options: &Options<'_>) -> Result<(), ConfigError> {
        let fields = RewriteFields::from_options(options)?;
        info!(?fields, "NetworkHeaderFieldsRewrite reconfigured");
        self.config.store(Arc::new(RewriteSnapshot::new(fields)));
        Ok(())
    }

    fn read_handler(&self, name: &str) -> Result<String, ConfigError> {
        let field = RewriteField::from_key(name).ok_or(ConfigError::UnknownHandler(name.to_string()))?;
        Ok(self.config.load().fields.format_field(field))
    }

    fn write_handler(&self, name: &str, value: &str) -> Result<(), ConfigError> {
        let field = RewriteField::from_key(name).ok_or(ConfigError::UnknownHandler(name.to_string()))?;
        // 先在外面解析好，rcu 里只做拷贝
        let mut patch = RewriteFields::default();
        patch.parse_field(field, value)?;
        self.config.rcu(|current| {
            let mut fields = current.fields.clone();
            fields.copy_field(field, &patch);
            RewriteSnapshot::new(fields)
        });
        info!(handler = field.key(), value, "NetworkHeaderFieldsRewrite handler written");
        Ok(())
    }
}

fn rewrite_ethernet(
    frame: &mut Frame,
    link: &LinkLayer,
    fields: &RewriteFields,
) -> Result<(), FrameError> {
    if let Some(dst) = fields.eth_dst {
        frame.write_bytes(ETHER_DHOST, &dst)?;
    }
    if let Some(src) = fields.eth_src {
        frame.write_bytes(ETHER_SHOST, &src)?;
    }
    if let Some(ethertype) = fields.eth_type {
        // 带 VLAN 时改内层协议，外层 TPID 保持 0x8100
        let offset = if link.has_vlan { VLAN_ENCAP_PROTO } else { ETHER_TYPE };
        frame.write_u16(offset, ethertype)?;
    }
    Ok(())
}

fn rewrite_ipv4(frame: &mut Frame, net: usize, fields: &RewriteFields) -> Result<(), FrameError> {
    if fields.ipv4_dscp.is_some() || fields.ipv4_ecn.is_some() {
        let mut tos = frame.read_u8(net + IP_TOS)?;
        if let Some(dscp) = fields.ipv4_dscp {
            tos = (tos & IP_TOS_ECN_MASK) | (dscp << 2);
        }
        if let Some(ecn) = fields.ipv4_ecn {
            tos = (tos & !IP_TOS_ECN_MASK) | (ecn & IP_TOS_ECN_MASK);
        }
        frame.write_u8(net + IP_TOS, tos)?;
    }
    if let Some(ttl) = fields.ipv4_ttl {
        frame.write_u8(net + IP_TTL, ttl)?;
    }
    if let Some(proto) = fields.ipv4_proto {
        frame.write_u8(net + IP_PROTO, proto)?;
    }
    if let Some(src) = fields.ipv4_src {
        frame.write_bytes(net + IP_SRC, &src.octets())?;
    }
    if let Some(dst) = fields.ipv4_dst {
        frame.write_bytes(net + IP_DST, &dst.octets())?;
    }
    Ok(())
}

fn rewrite_ports(
    frame: &mut Frame,
    th: usize,
    src: Option<u16>,
    dst: Option<u16>,
) -> Result<(), FrameError> {
    if let Some(port) = src {
        frame.write_u16(th + TH_SPORT, port)?;
    }
    if let Some(port) = dst {
        frame.write_u16(th + TH_DPORT, port)?;
    }
    Ok(())
}
