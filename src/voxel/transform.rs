//! Geometric transforms over frames: mirrors along each axis and a quarter turn about Z.
//!
//! Every transform is a pure function returning a new frame; the input is never touched.

use serde::{Deserialize, Serialize};

use super::frame::{CUBE_SIZE, Frame};

const EDGE: usize = CUBE_SIZE - 1;

/// Reflect across the x mid-plane: `out[8y + (7-x)] = in[8y + x]`.
pub fn mirror_x(frame: &Frame) -> Frame {
    let mut out = Frame::blank();
    let cells = out.cells_mut();
    for y in 0..CUBE_SIZE {
        for x in 0..CUBE_SIZE {
            cells[Frame::index(EDGE - x, y)] = frame.cell(Frame::index(x, y));
        }
    }
    out
}

/// Reflect across the y mid-plane: `out[8(7-y) + x] = in[8y + x]`.
pub fn mirror_y(frame: &Frame) -> Frame {
    let mut out = Frame::blank();
    let cells = out.cells_mut();
    for y in 0..CUBE_SIZE {
        for x in 0..CUBE_SIZE {
            cells[Frame::index(x, EDGE - y)] = frame.cell(Frame::index(x, y));
        }
    }
    out
}

/// Flip every column upside down (bit `z` becomes bit `7-z`).
pub fn mirror_z(frame: &Frame) -> Frame {
    let mut out = *frame;
    for cell in out.cells_mut() {
        *cell = cell.reverse_bits();
    }
    out
}

/// Rotate the XY plane a quarter turn clockwise about Z: `out[8x + (7-y)] = in[8y + x]`.
///
/// Layers are unchanged.
pub fn rotate_z90(frame: &Frame) -> Frame {
    let mut out = Frame::blank();
    let cells = out.cells_mut();
    for y in 0..CUBE_SIZE {
        for x in 0..CUBE_SIZE {
            cells[Frame::index(EDGE - y, x)] = frame.cell(Frame::index(x, y));
        }
    }
    out
}

/// A named geometric transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    MirrorX,
    MirrorY,
    MirrorZ,
    RotateZ90,
}

impl Transform {
    pub const ALL: [Transform; 4] = [
        Transform::MirrorX,
        Transform::MirrorY,
        Transform::MirrorZ,
        Transform::RotateZ90,
    ];

    /// Apply this transform, returning a new frame.
    pub fn apply(self, frame: &Frame) -> Frame {
        match self {
            Transform::MirrorX => mirror_x(frame),
            Transform::MirrorY => mirror_y(frame),
            Transform::MirrorZ => mirror_z(frame),
            Transform::RotateZ90 => rotate_z90(frame),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mirror_x" | "mirror-x" => Some(Transform::MirrorX),
            "mirror_y" | "mirror-y" => Some(Transform::MirrorY),
            "mirror_z" | "mirror-z" => Some(Transform::MirrorZ),
            "rotate_z90" | "rotate-z90" | "rotate" => Some(Transform::RotateZ90),
            _ => None,
        }
    }
}
