//! Persisted JSON animation documents.
//!
//! An animation is stored as an ordered list of 64-element cell arrays. Loading is
//! lenient: short, long, `null`-holed or out-of-range cell arrays are repaired with the
//! "missing cell is 0" rule instead of being rejected. Cells are kept as raw JSON
//! values, so fractions, huge numbers and non-numbers are repaired the same way. A bare
//! top-level array of frames is accepted as well as the full document object.

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::animation::Animation;
use crate::voxel::{FRAME_CELLS, Frame};

/// Current document version.
pub const DOCUMENT_VERSION: u32 = 1;

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

fn default_frame_delay_ms() -> u64 {
    100
}

/// Serialized animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Playback delay between frames.
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u64,
    /// One cell array per frame. Anything other than an integer in `0..=255` reads as `0`.
    #[serde(default)]
    pub frames: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentRepr {
    Full(AnimationDocument),
    Bare(Vec<Vec<Value>>),
}

impl AnimationDocument {
    /// Capture an animation.
    pub fn from_frames(frames: &[Frame], frame_delay_ms: u64) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            frame_delay_ms,
            frames: frames
                .iter()
                .map(|f| f.cells().iter().map(|&c| Value::from(c)).collect())
                .collect(),
        }
    }

    /// Frames with the missing-cell rule applied.
    pub fn to_frames(&self) -> Vec<Frame> {
        let repaired = self
            .frames
            .iter()
            .filter(|cells| {
                cells.len() != FRAME_CELLS
                    || cells
                        .iter()
                        .any(|c| c.as_i64().is_none_or(|v| !(0..=255).contains(&v)))
            })
            .count();
        if repaired > 0 {
            warn!("repaired {repaired} malformed frame(s) while loading animation");
        }
        self.frames
            .iter()
            .map(|cells| {
                let raw: Vec<Option<i64>> = cells.iter().map(Value::as_i64).collect();
                Frame::from_raw_cells(&raw)
            })
            .collect()
    }

    /// Editable animation; an empty document yields one blank frame.
    pub fn to_animation(&self) -> Animation {
        Animation::from_frames(self.to_frames())
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let doc = match serde_json::from_str(json)? {
            DocumentRepr::Full(doc) => doc,
            DocumentRepr::Bare(frames) => Self {
                version: DOCUMENT_VERSION,
                frame_delay_ms: default_frame_delay_ms(),
                frames,
            },
        };
        if doc.version != DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion(doc.version));
        }
        Ok(doc)
    }

    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let doc = Self::from_json(&fs::read_to_string(path)?)?;
        debug!("loaded {} frames from {}", doc.frames.len(), path.display());
        Ok(doc)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let path = path.as_ref();
        fs::write(path, self.to_json_pretty()?)?;
        debug!("saved {} frames to {}", self.frames.len(), path.display());
        Ok(())
    }
}

/// Document loading/saving errors.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid animation JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported animation document version {0}")]
    UnsupportedVersion(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_bare_array_with_holes_is_repaired() {
        let doc = AnimationDocument::from_json("[[1, 2, null, 300, -4], []]").unwrap();
        let frames = doc.to_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0].cells()[..6], &[1, 2, 0, 0, 0, 0]);
        assert!(frames[1].is_blank());
    }

    #[test]
    fn test_unrepresentable_cells_are_repaired() {
        let doc =
            AnimationDocument::from_json(r#"[[1, 1e20, 3, 99999999999999999999, 2.5, "x", 7]]"#)
                .unwrap();
        let frames = doc.to_frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0].cells()[..8], &[1, 0, 3, 0, 0, 0, 7, 0]);

        let doc = AnimationDocument::from_json(r#"{"frames": [[-1e300, 255, true]]}"#).unwrap();
        assert_eq!(&doc.to_frames()[0].cells()[..3], &[0, 255, 0]);
    }

    #[test]
    fn test_overlong_frame_truncated() {
        let cells: Vec<String> = (0..70).map(|i| (i % 256).to_string()).collect();
        let json = format!(r#"{{"frames": [[{}]]}}"#, cells.join(","));
        let frames = AnimationDocument::from_json(&json).unwrap().to_frames();
        assert_eq!(frames[0].cell(63), 63);
    }

    #[test]
    fn test_empty_document_gives_one_blank_frame() {
        let anim = AnimationDocument::from_json("{}").unwrap().to_animation();
        assert_eq!(anim.len(), 1);
        assert!(anim.frames()[0].is_blank());
    }

    #[test]
    fn test_unsupported_version() {
        let err = AnimationDocument::from_json(r#"{"version": 7, "frames": []}"#).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedVersion(7)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            AnimationDocument::from_json("not json"),
            Err(DocumentError::Json(_))
        ));
    }

    #[test]
    fn test_save_load_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("anim.json");

        let mut frame = Frame::blank();
        frame.set(1, 2, 3, true);
        let frames = vec![frame, Frame::from_cells(&[0xFF; 64])];

        AnimationDocument::from_frames(&frames, 150).save(&path).unwrap();
        let loaded = AnimationDocument::load(&path).unwrap();

        assert_eq!(loaded.frame_delay_ms, 150);
        assert!(loaded.frames.iter().all(|f| f.len() == FRAME_CELLS));
        assert_eq!(loaded.to_frames(), frames);
    }
}
