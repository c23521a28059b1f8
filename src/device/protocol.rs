//! Wire shapes understood by the cube controller.
//!
//! ```text
//! open marker:  70 x 0xAD
//! frame packet: 0xF2, cell[0] .. cell[63]      (65 bytes)
//! close marker: 70 x 0xED
//! ```
//!
//! There is no acknowledgement, checksum or sequence number. The receiver tells
//! markers from packets by length and leading byte.

use crate::voxel::{FRAME_CELLS, Frame};

/// Length of the open and close markers.
pub const MARKER_LEN: usize = 70;

/// Fill byte of the open marker.
pub const OPEN_BYTE: u8 = 0xAD;

/// Fill byte of the close marker.
pub const CLOSE_BYTE: u8 = 0xED;

/// Leading byte of every frame packet.
pub const FRAME_HEADER: u8 = 0xF2;

/// Length of a frame packet.
pub const PACKET_LEN: usize = 1 + FRAME_CELLS;

pub const OPEN_MARKER: [u8; MARKER_LEN] = [OPEN_BYTE; MARKER_LEN];
pub const CLOSE_MARKER: [u8; MARKER_LEN] = [CLOSE_BYTE; MARKER_LEN];

/// Build the packet carrying one frame.
pub fn frame_packet(frame: &Frame) -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = FRAME_HEADER;
    packet[1..].copy_from_slice(frame.cells());
    packet
}

/// Bytes on the wire for a complete session of `frame_count` frames.
pub fn session_len(frame_count: usize) -> usize {
    2 * MARKER_LEN + frame_count * PACKET_LEN
}
