use crate::{error::FrameError, frame::Frame, headers::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

impl Transport {
    fn from_proto(proto: u8) -> Option<Self> {
        match proto {
            IP_PROTO_TCP => Some(Transport::Tcp),
            IP_PROTO_UDP => Some(Transport::Udp),
            _ => None,
        }
    }
}

/// 每个包现算的分层结果，不跨包缓存
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub has_vlan: bool,
    /// 有 VLAN 时是内层封装协议，否则是外层 EtherType
    pub ethertype: u16,
    pub ip_version: Option<IpVersion>,
    pub transport: Option<Transport>,
    /// IPv6 没有分片门控，恒为 true
    pub is_first_fragment: bool,
}

impl Classification {
    pub fn link_header_len(&self) -> usize {
        link_header_len(self.has_vlan)
    }
}

fn link_header_len(has_vlan: bool) -> usize {
    if has_vlan {
        VLAN_HEADER_LEN
    } else {
        ETHER_HEADER_LEN
    }
}

/// 只看链路层：是否带 VLAN，以及（内层）EtherType
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkLayer {
    pub has_vlan: bool,
    pub ethertype: u16,
}

impl LinkLayer {
    pub fn parse(frame: &Frame) -> Result<Self, FrameError> {
        check_mac_header(frame)?;

        // 外层类型；是 802.1Q 就再读内层
        let outer = frame.read_u16(ETHER_TYPE)?;
        if outer == ETHERTYPE_8021Q {
            Ok(Self {
                has_vlan: true,
                ethertype: frame.read_u16(VLAN_ENCAP_PROTO)?,
            })
        } else {
            Ok(Self {
                has_vlan: false,
                ethertype: outer,
            })
        }
    }

    pub fn header_len(&self) -> usize {
        link_header_len(self.has_vlan)
    }

    pub fn ip_version(&self) -> Option<IpVersion> {
        match self.ethertype {
            ETHERTYPE_IP => Some(IpVersion::V4),
            ETHERTYPE_IP6 => Some(IpVersion::V6),
            _ => None,
        }
    }
}

/// MAC 头必须从帧首开始；没标记也算
pub fn check_mac_header(frame: &Frame) -> Result<(), FrameError> {
    match frame.mac_header_offset() {
        Some(offset) if offset != 0 => Err(FrameError::MacHeaderNotAtStart(offset)),
        _ => Ok(()),
    }
}

/// 链路层短到读不出类型时返回 `None`：这种帧不属于任何网络层
pub fn link_layer(frame: &Frame) -> Result<Option<LinkLayer>, FrameError> {
    match LinkLayer::parse(frame) {
        Ok(link) => Ok(Some(link)),
        Err(FrameError::Truncated { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

// ==========================================
// 分类器：Ethernet/VLAN -> IPv4/IPv6 -> TCP/UDP
// ==========================================
pub fn classify(frame: &Frame) -> Result<Classification, FrameError> {
    let link = LinkLayer::parse(frame)?;
    classify_network(frame, link)
}

/// 链路层已经解析过，只补网络层和传输层
pub fn classify_network(frame: &Frame, link: LinkLayer) -> Result<Classification, FrameError> {
    let mut class = Classification {
        has_vlan: link.has_vlan,
        ethertype: link.ethertype,
        ip_version: None,
        transport: None,
        is_first_fragment: false,
    };
    let net = link.header_len();

    match link.ip_version() {
        Some(IpVersion::V4) => {
            let ip = frame.bytes(net, IP_MIN_HEADER_LEN)?;
            let frag = u16::from_be_bytes([ip[IP_FRAG], ip[IP_FRAG + 1]]);
            class.ip_version = Some(IpVersion::V4);
            class.transport = Transport::from_proto(ip[IP_PROTO]);
            class.is_first_fragment = frag & IP_OFFMASK == 0;
        }
        Some(IpVersion::V6) => {
            // 扩展头不展开，下一个头直接当作传输层协议
            let ip6 = frame.bytes(net, IP6_HEADER_LEN)?;
            class.ip_version = Some(IpVersion::V6);
            class.transport = Transport::from_proto(ip6[IP6_NXT]);
            class.is_first_fragment = true;
        }
        None => {}
    }

    Ok(class)
}

/// IPv4 头长度 = IHL * 4，且不能小于最小头长
pub fn ipv4_header_len(frame: &Frame, offset: usize) -> Result<usize, FrameError> {
    let len = ((frame.read_u8(offset + IP_VHL)? & 0x0f) as usize) << 2;
    if len < IP_MIN_HEADER_LEN {
        return Err(FrameError::BadHeaderLength(len));
    }
    Ok(len)
}

/// 网络层位置：优先用已有标记，没有就按分类结果现算
pub fn locate_network_header(
    frame: &Frame,
    class: &Classification,
) -> Result<Option<(usize, usize)>, FrameError> {
    if let Some(marked) = frame.network_header() {
        return Ok(Some(marked));
    }
    let offset = class.link_header_len();
    let len = match class.ip_version {
        Some(IpVersion::V4) => ipv4_header_len(frame, offset)?,
        Some(IpVersion::V6) => IP6_HEADER_LEN,
        None => return Ok(None),
    };
    frame.bytes(offset, len)?;
    Ok(Some((offset, len)))
}
