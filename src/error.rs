use thiserror::Error;

// ==========================================
// 配置错误：只在配置阶段出现，元素不会带着它上线
// ==========================================
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("option `{0}` given more than once")]
    DuplicateOption(String),

    #[error("option `{key}`: expected boolean, got `{value}`")]
    InvalidBool { key: String, value: String },

    #[error("option `{key}`: expected {expected}, got `{value}`")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("option `{key}`: value {value} out of range (max {max})")]
    OutOfRange { key: String, value: u64, max: u64 },

    #[error("unknown element class `{0}`")]
    UnknownElement(String),

    #[error("unknown element `{0}` in pipeline")]
    UnknownInstance(String),

    #[error("unknown handler `{0}`")]
    UnknownHandler(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

// ==========================================
// 单包错误：只丢这一个包，元素照常工作
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("truncated packet: need {len} bytes at offset {offset}, frame has {frame_len}")]
    Truncated {
        offset: usize,
        len: usize,
        frame_len: usize,
    },

    #[error("bad IPv4 header length {0}")]
    BadHeaderLength(usize),

    #[error("mac header at offset {0}, expected frame start")]
    MacHeaderNotAtStart(usize),

    #[error("overlapping swap ranges at {a} and {b} ({len} bytes)")]
    OverlappingRanges { a: usize, b: usize, len: usize },

    #[error("failed to clone shared frame of {len} bytes")]
    CloneFailed { len: usize },

    #[error("write to a shared frame")]
    NotExclusive,
}

impl FrameError {
    /// 报文本身有问题（截断、头长度非法），而不是资源问题
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            FrameError::Truncated { .. }
                | FrameError::BadHeaderLength(_)
                | FrameError::MacHeaderNotAtStart(_)
        )
    }
}
