//! Editable animation timeline.

use crate::voxel::{Frame, FrameGenerator, Transform, interpolate};

/// Ordered sequence of frames; never empty.
///
/// Indices passed to editing methods are clamped or ignored rather than panicking
/// where the operation has a sensible no-op (deleting the last frame, editing past
/// the end). Frames are stored by value, so duplicates never share storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    frames: Vec<Frame>,
}

impl Default for Animation {
    fn default() -> Self {
        Self::new()
    }
}

impl Animation {
    /// A single blank frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::blank()],
        }
    }

    /// Build from frames; an empty list becomes a single blank frame.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        if frames.is_empty() {
            Self::new()
        } else {
            Self { frames }
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false: an animation holds at least one frame.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frame_mut(&mut self, index: usize) -> Option<&mut Frame> {
        self.frames.get_mut(index)
    }

    /// Owned copy for export or streaming while editing continues.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.frames.clone()
    }

    /// Insert a blank frame at `index` (clamped to the end). Returns the new frame's index.
    pub fn add_blank(&mut self, index: usize) -> usize {
        self.insert(index, Frame::blank())
    }

    /// Insert `frame` at `index` (clamped to the end). Returns the new frame's index.
    pub fn insert(&mut self, index: usize, frame: Frame) -> usize {
        let index = index.min(self.frames.len());
        self.frames.insert(index, frame);
        index
    }

    /// Copy frame `index` and insert the copy right after it.
    pub fn duplicate(&mut self, index: usize) -> Option<usize> {
        let copy = *self.frames.get(index)?;
        Some(self.insert(index + 1, copy))
    }

    /// Remove frame `index`. Removing the only frame is a no-op.
    pub fn delete(&mut self, index: usize) -> Option<Frame> {
        if self.frames.len() <= 1 || index >= self.frames.len() {
            return None;
        }
        Some(self.frames.remove(index))
    }

    /// Replace frame `index`, returning the previous frame.
    pub fn replace(&mut self, index: usize, frame: Frame) -> Option<Frame> {
        let slot = self.frames.get_mut(index)?;
        Some(std::mem::replace(slot, frame))
    }

    /// Replace frame `index` with its transformed image.
    pub fn transform(&mut self, index: usize, transform: Transform) -> bool {
        match self.frames.get_mut(index) {
            Some(frame) => {
                *frame = transform.apply(frame);
                true
            }
            None => false,
        }
    }

    /// Apply `transform` to every frame.
    pub fn transform_all(&mut self, transform: Transform) {
        for frame in &mut self.frames {
            *frame = transform.apply(frame);
        }
    }

    /// Insert the transformed image of frame `index` right after it.
    pub fn insert_transformed(&mut self, index: usize, transform: Transform) -> Option<usize> {
        let out = transform.apply(self.frames.get(index)?);
        Some(self.insert(index + 1, out))
    }

    /// Insert `steps` tween frames between frame `index` and frame `index + 1`.
    ///
    /// Returns the number of frames inserted; zero when `index` has no successor.
    pub fn insert_tween(&mut self, index: usize, steps: usize) -> usize {
        let (Some(a), Some(b)) = (self.frames.get(index), self.frames.get(index + 1)) else {
            return 0;
        };
        let tween = interpolate(a, b, steps);
        let inserted = tween.len();
        self.frames.splice(index + 1..index + 1, tween);
        inserted
    }

    /// Insert frames from a generator at `index` (clamped to the end).
    ///
    /// Returns the number of frames inserted.
    pub fn insert_generated<G: FrameGenerator>(
        &mut self,
        index: usize,
        generator: &G,
        input: &str,
        params: &G::Params,
    ) -> usize {
        let generated = generator.generate(input, params);
        let index = index.min(self.frames.len());
        let inserted = generated.len();
        self.frames.splice(index..index, generated);
        inserted
    }
}
