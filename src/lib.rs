//! Streaming, allocation-free FLAC encoder core.
//!
//! [`Encoder`] turns blocks of PCM samples into FLAC frames one block at a time, using only
//! caller-supplied working memory (sized up front via [`config::size_memory`]) and caller-supplied
//! output buffers. There is no internal heap allocation on the encode path, no LPC subframe
//! support, and no multi-threading: this is the sample-accurate core a higher-level muxer or
//! streaming pipeline builds on.

mod analyzer;
mod bitwriter;
mod config;
mod crc;
mod encoder;
mod error;
mod frame;
mod md5;
mod residual;
mod streaminfo;
mod subframe;

pub use config::{size_frame, size_memory, size_streaminfo, Config};
pub use encoder::{ChannelStats, Encoder, SubframeStats};
pub use error::EncodeError;
pub use subframe::SubframeType;

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, EncodeError>;
