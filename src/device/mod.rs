//! Device module - Serial streaming of animations to a physical cube.
//!
//! # Wire protocol
//!
//! A session brackets one frame packet per animation frame between two
//! fixed-length markers:
//!
//! ```text
//! open marker    70 x 0xAD
//! frame packet   0xF2 + 64 cells       (repeated, one write per frame, paced)
//! close marker   70 x 0xED
//! ```
//!
//! A successful session of N frames puts `70 + 65 * N + 70` bytes on the wire.

mod channel;
mod protocol;
mod streamer;
mod timer;

pub use channel::{
    ChannelOpener, FileChannel, FileChannelOpener, MemoryChannel, MemoryChannelOpener,
    SerialChannel,
};
pub use protocol::*;
pub use streamer::{DeviceStreamer, SessionState, StreamError, StreamReport};
pub use timer::CancellableTimer;
