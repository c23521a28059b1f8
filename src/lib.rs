//! LED Cube - Voxel animation tooling for 8x8x8 LED cubes.
//!
//! This crate models cube animations as sequences of 64-byte frames, provides the
//! geometric transforms and tweening used while editing them, exports them as
//! byte-array source code and streams them to a cube controller over a serial link.
//!
//! # Architecture
//!
//! - `voxel`: Frame data model, transforms, tweening, generator interface
//! - `animation`: Editable timeline, text export, binary container, playback
//! - `device`: Serial channel abstraction and the streaming protocol
//! - `schema`: Configuration and persisted JSON documents
//!
//! # Example
//!
//! ```rust,no_run
//! use ledcube::{
//!     animation::{Animation, ExportEncoder, ExportFormat},
//!     device::{DeviceStreamer, FileChannelOpener},
//!     schema::StreamConfig,
//!     voxel::Transform,
//! };
//!
//! // Build a short spinning animation
//! let mut anim = Animation::new();
//! anim.frame_mut(0).unwrap().set_layer(0, true);
//! anim.frame_mut(0).unwrap().set(0, 0, 7, true);
//! for i in 0..3 {
//!     anim.insert_transformed(i, Transform::RotateZ90);
//! }
//!
//! // Export as a C array
//! let text = ExportEncoder::new(ExportFormat::ArrayLiteral).encode(anim.frames(), "spin");
//! println!("{text}");
//!
//! // Stream to a cube
//! let config = StreamConfig {
//!     descriptor: "/dev/ttyUSB0".into(),
//!     ..Default::default()
//! };
//! let mut streamer = DeviceStreamer::new(&config);
//! streamer.connect(&FileChannelOpener, &config).unwrap();
//! let report = streamer.stream(&anim.snapshot()).unwrap();
//! println!("{report}");
//! ```

pub mod animation;
pub mod device;
pub mod schema;
pub mod voxel;

// Re-export commonly used types
pub use animation::{Animation, ExportEncoder, ExportFormat};
pub use device::{DeviceStreamer, SessionState, StreamError};
pub use schema::{CubeConfig, StreamConfig};
pub use voxel::{Frame, Transform};
