//! Animation editing, export, storage and playback for LED cube animations.
//!
//! # File Format
//!
//! The `.lcub` container stores frames as raw cell blocks with optional compression:
//!
//! ```text
//! Header (32 bytes):
//!   Magic: "LCUB" (4 bytes)
//!   Version: u16
//!   Flags: u16 (compression)
//!   Frame count: u32
//!   Frame delay (ms): u32
//!   Reserved: 16 bytes
//!
//! Frame data:
//!   frame_count * 64 bytes, cell order 8*y + x
//!   Optionally LZ4 compressed as one block
//! ```
//!
//! Human-editable JSON documents live in [`crate::schema::AnimationDocument`].

mod export;
mod format;
mod player;
mod timeline;

pub use export::{ExportEncoder, ExportFormat, NO_FRAMES_MARKER};
pub use format::{
    CONTAINER_MAGIC, CONTAINER_VERSION, CompressionType, ContainerHeader, load_container,
    read_container, save_container, write_container,
};
pub use player::{PlaybackOutcome, Player};
pub use timeline::Animation;
