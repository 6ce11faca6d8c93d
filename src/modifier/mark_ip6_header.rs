use crate::{
    classify::{IpVersion, link_layer},
    error::FrameError,
    frame::Frame,
    headers::IP6_HEADER_LEN,
    modifier::{ModifierStats, PacketModifier},
};

/// IPv6 版本的头部定位，只标记 40 字节固定头
#[derive(Debug, Default)]
pub struct MarkIp6Header {
    stats: ModifierStats,
}

impl MarkIp6Header {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PacketModifier for MarkIp6Header {
    fn class_name(&self) -> &'static str {
        "MarkIP6Header"
    }

    fn stats(&self) -> &ModifierStats {
        &self.stats
    }

    fn process(&self, mut frame: Frame) -> Result<Frame, FrameError> {
        let Some(link) = link_layer(&frame)? else {
            return Ok(frame);
        };
        if link.ip_version() == Some(IpVersion::V6) {
            frame.set_network_header(link.header_len(), IP6_HEADER_LEN)?;
        }
        Ok(frame)
    }
}
