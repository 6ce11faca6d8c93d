pub mod classify;
pub mod config;
pub mod error;
pub mod frame;
pub mod headers;
pub mod logging;
pub mod modifier;
pub mod nfq_message;
pub mod pipeline;

#[cfg(test)]
mod test_packets;

pub use classify::{Classification, IpVersion, LinkLayer, Transport, classify};
pub use error::{ConfigError, FrameError};
pub use frame::{Frame, Ownership};
pub use modifier::PacketModifier;
pub use pipeline::Pipeline;
