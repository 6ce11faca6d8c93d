use tracing::debug;

use crate::{
    error::{ConfigError, FrameError},
    frame::Frame,
};

mod args;
mod direction_swap;
mod fields_rewrite;
mod mark_ip6_header;
mod mark_ip_header;
mod registry;
mod stats;

pub use direction_swap::{NetworkDirectionSwap, SwapLayer, SwapLayers};
pub use fields_rewrite::{NetworkHeaderFieldsRewrite, RewriteField, RewriteFields};
pub use mark_ip6_header::MarkIp6Header;
pub use mark_ip_header::AutoMarkIpHeader;
pub use registry::{build_element, element_classes};
pub use stats::{ModifierStats, StatsSnapshot};

/// 配置项：(KEY, value)，KEY 大小写不敏感
pub type Options<'a> = [(&'a str, &'a str)];

// ==========================================
// 元素接口：一进一出，不增删头部
// ==========================================
pub trait PacketModifier: Send + Sync {
    fn class_name(&self) -> &'static str;

    fn stats(&self) -> &ModifierStats;

    /// 处理一个包；`Err` 表示这个包要丢掉
    fn process(&self, frame: Frame) -> Result<Frame, FrameError>;

    /// 运行中整体重配，失败时保留旧配置
    fn configure(&self, options: &Options<'_>) -> Result<(), ConfigError> {
        match options.first() {
            Some((key, _)) => Err(ConfigError::UnknownOption(key.to_string())),
            None => Ok(()),
        }
    }

    fn read_handler(&self, name: &str) -> Result<String, ConfigError> {
        Err(ConfigError::UnknownHandler(name.to_string()))
    }

    fn write_handler(&self, name: &str, _value: &str) -> Result<(), ConfigError> {
        Err(ConfigError::UnknownHandler(name.to_string()))
    }

    /// 管道入口：丢包时返回 `None` 并记账
    fn simple_action(&self, frame: Frame) -> Option<Frame> {
        match self.process(frame) {
            Ok(frame) => {
                self.stats().record_pass();
                Some(frame)
            }
            Err(err) => {
                debug!(element = self.class_name(), error = %err, "dropping packet");
                self.stats().record_drop(&err);
                None
            }
        }
    }
}
