use crate::{
    classify::{IpVersion, ipv4_header_len, link_layer},
    error::FrameError,
    frame::Frame,
    modifier::{ModifierStats, PacketModifier},
};

// ==========================================
// IPv4 头部定位：紧跟链路层头，长度取 IHL * 4
// 非 IPv4 流量原样放行
// ==========================================
#[derive(Debug, Default)]
pub struct AutoMarkIpHeader {
    stats: ModifierStats,
}

impl AutoMarkIpHeader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PacketModifier for AutoMarkIpHeader {
    fn class_name(&self) -> &'static str {
        "AutoMarkIPHeader"
    }

    fn stats(&self) -> &ModifierStats {
        &self.stats
    }

    fn process(&self, mut frame: Frame) -> Result<Frame, FrameError> {
        // 只有 IPv4 头的问题才丢包，其余流量不解析网络层
        let Some(link) = link_layer(&frame)? else {
            return Ok(frame);
        };
        if link.ip_version() == Some(IpVersion::V4) {
            let offset = link.header_len();
            let len = ipv4_header_len(&frame, offset)?;
            frame.set_network_header(offset, len)?;
        }
        Ok(frame)
    }
}
