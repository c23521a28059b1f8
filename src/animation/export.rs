//! Text export of animations as byte-array source code.
//!
//! All formats share one byte body: frames in order, each frame's 64 cells in index
//! order, every cell rendered independently as `0xHH`. Only the surrounding
//! declarations differ.

use std::fmt::{self, Write as _};
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::voxel::{FRAME_CELLS, Frame};

/// Marker written in place of the array when there is nothing to export.
pub const NO_FRAMES_MARKER: &str = "No frames";

const BYTES_PER_LINE: usize = 16;

/// Target text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Bare `const uint8_t name[][64] = {...};` declaration.
    #[default]
    ArrayLiteral,
    /// Include-guarded C header with frame count and size macros.
    Header,
    /// Microcontroller sketch storing frames in program memory with a playback loop.
    Sketch,
}

impl ExportFormat {
    /// Conventional file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::ArrayLiteral => "txt",
            ExportFormat::Header => "h",
            ExportFormat::Sketch => "ino",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "array" | "array_literal" => Ok(ExportFormat::ArrayLiteral),
            "header" | "h" => Ok(ExportFormat::Header),
            "sketch" | "ino" => Ok(ExportFormat::Sketch),
            other => Err(format!(
                "unknown export format '{other}' (expected array, header or sketch)"
            )),
        }
    }
}

/// Renders frames into one of the [`ExportFormat`]s.
#[derive(Debug, Clone)]
pub struct ExportEncoder {
    format: ExportFormat,
    frame_delay_ms: u32,
}

impl ExportEncoder {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            frame_delay_ms: 100,
        }
    }

    /// Frame delay baked into the sketch playback loop.
    pub fn with_frame_delay(mut self, frame_delay_ms: u32) -> Self {
        self.frame_delay_ms = frame_delay_ms;
        self
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Encode `frames` under the symbol `name`.
    pub fn encode(&self, frames: &[Frame], name: &str) -> String {
        let mut out = String::with_capacity(128 + frames.len() * FRAME_CELLS * 6);
        // Writing into a String cannot fail.
        let _ = self.render(&mut out, frames, name);
        out
    }

    /// Encode and write to `w`.
    pub fn write_to<W: io::Write>(
        &self,
        w: &mut W,
        frames: &[Frame],
        name: &str,
    ) -> io::Result<()> {
        w.write_all(self.encode(frames, name).as_bytes())
    }

    fn render(&self, out: &mut String, frames: &[Frame], name: &str) -> fmt::Result {
        match self.format {
            ExportFormat::ArrayLiteral => {
                if frames.is_empty() {
                    return write_empty(out, name);
                }
                writeln!(
                    out,
                    "// {name}: {} frames x {FRAME_CELLS} bytes",
                    frames.len()
                )?;
                write_array(out, "const uint8_t", "", frames, name)
            }
            ExportFormat::Header => {
                let guard = format!("{}_H", name.to_ascii_uppercase());
                writeln!(out, "#ifndef {guard}")?;
                writeln!(out, "#define {guard}")?;
                writeln!(out)?;
                writeln!(out, "#include <stdint.h>")?;
                writeln!(out)?;
                writeln!(out, "#define {name}_FRAME_COUNT {}", frames.len())?;
                writeln!(out, "#define {name}_FRAME_SIZE {FRAME_CELLS}")?;
                writeln!(out)?;
                if frames.is_empty() {
                    write_empty(out, name)?;
                } else {
                    write_array(out, "static const uint8_t", "", frames, name)?;
                }
                writeln!(out)?;
                writeln!(out, "#endif // {guard}")
            }
            ExportFormat::Sketch => {
                writeln!(out, "// {name}: LED cube animation")?;
                if frames.is_empty() {
                    return write_empty(out, name);
                }
                writeln!(out, "#include <avr/pgmspace.h>")?;
                writeln!(out)?;
                writeln!(out, "const uint16_t {name}_FRAME_COUNT = {};", frames.len())?;
                writeln!(
                    out,
                    "const uint16_t {name}_FRAME_DELAY_MS = {};",
                    self.frame_delay_ms
                )?;
                writeln!(out)?;
                write_array(out, "const byte", " PROGMEM", frames, name)?;
                writeln!(out)?;
                writeln!(out, "// Provided by the cube driver: latches one 64-byte frame.")?;
                writeln!(out, "void showFrame(const byte *frame);")?;
                writeln!(out)?;
                writeln!(out, "void setup() {{}}")?;
                writeln!(out)?;
                writeln!(out, "void loop() {{")?;
                writeln!(out, "  byte frame[{FRAME_CELLS}];")?;
                writeln!(
                    out,
                    "  for (uint16_t i = 0; i < {name}_FRAME_COUNT; i++) {{"
                )?;
                writeln!(out, "    memcpy_P(frame, {name}[i], {FRAME_CELLS});")?;
                writeln!(out, "    showFrame(frame);")?;
                writeln!(out, "    delay({name}_FRAME_DELAY_MS);")?;
                writeln!(out, "  }}")?;
                writeln!(out, "}}")
            }
        }
    }
}

fn write_empty(out: &mut String, name: &str) -> fmt::Result {
    writeln!(out, "// {name}: {NO_FRAMES_MARKER} - this animation contains no data.")
}

fn write_array(
    out: &mut String,
    decl: &str,
    attrs: &str,
    frames: &[Frame],
    name: &str,
) -> fmt::Result {
    writeln!(
        out,
        "{decl} {name}[{}][{FRAME_CELLS}]{attrs} = {{",
        frames.len()
    )?;
    for (i, frame) in frames.iter().enumerate() {
        writeln!(out, "  // frame {i}")?;
        writeln!(out, "  {{")?;
        for line in frame.cells().chunks(BYTES_PER_LINE) {
            out.push_str("    ");
            for byte in line {
                write!(out, "0x{byte:02X}, ")?;
            }
            // Drop the space after the last comma on each line
            out.pop();
            out.push('\n');
        }
        writeln!(out, "  }},")?;
    }
    writeln!(out, "}};")
}
