//! Voxel frame: one instant of the 8x8x8 cube packed as 64 vertical columns.

use std::fmt;

/// Edge length of the cube in voxels.
pub const CUBE_SIZE: usize = 8;

/// Number of cells (vertical columns) in a frame.
pub const FRAME_CELLS: usize = CUBE_SIZE * CUBE_SIZE;

/// One frame of the cube.
///
/// Cell `8*y + x` holds the column at `(x, y)`; bit `z` of that cell is the voxel
/// at height `z`. Because cells are `u8`, every `Frame` value is already normalized:
/// loosely typed input is folded into range by [`Frame::from_cells`] and
/// [`Frame::from_raw_cells`], which treat missing or out-of-range cells as `0`.
///
/// `Frame` is `Copy`, so storing it in two places never aliases.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    cells: [u8; FRAME_CELLS],
}

impl Default for Frame {
    fn default() -> Self {
        Self::blank()
    }
}

impl Frame {
    /// A frame with every voxel off.
    pub const fn blank() -> Self {
        Self {
            cells: [0; FRAME_CELLS],
        }
    }

    /// Wrap a full cell array.
    pub const fn new(cells: [u8; FRAME_CELLS]) -> Self {
        Self { cells }
    }

    /// Build a frame from a byte slice of any length.
    ///
    /// Missing trailing cells are `0`; cells past the 64th are ignored.
    pub fn from_cells(cells: &[u8]) -> Self {
        let mut frame = Self::blank();
        for (dst, &src) in frame.cells.iter_mut().zip(cells) {
            *dst = src;
        }
        frame
    }

    /// Build a frame from loosely typed cell values.
    ///
    /// `None` (a hole in the source array) and values outside `0..=255` become `0`.
    pub fn from_raw_cells(cells: &[Option<i64>]) -> Self {
        let mut frame = Self::blank();
        for (dst, &src) in frame.cells.iter_mut().zip(cells) {
            *dst = src.and_then(|v| u8::try_from(v).ok()).unwrap_or(0);
        }
        frame
    }

    /// Cell index of column `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is not in `0..8`.
    #[inline]
    pub fn index(x: usize, y: usize) -> usize {
        assert!(
            x < CUBE_SIZE && y < CUBE_SIZE,
            "column ({x}, {y}) outside the {CUBE_SIZE}x{CUBE_SIZE} cube"
        );
        CUBE_SIZE * y + x
    }

    #[inline]
    fn check_layer(z: usize) {
        assert!(z < CUBE_SIZE, "layer {z} outside the cube");
    }

    /// Whether voxel `(x, y, z)` is lit.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is not in `0..8`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> bool {
        Self::check_layer(z);
        (self.cells[Self::index(x, y)] >> z) & 1 == 1
    }

    /// Light or clear voxel `(x, y, z)`, leaving the rest of its column untouched.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is not in `0..8`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, on: bool) {
        Self::check_layer(z);
        let cell = &mut self.cells[Self::index(x, y)];
        if on {
            *cell |= 1 << z;
        } else {
            *cell &= !(1 << z);
        }
    }

    /// Flip voxel `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is not in `0..8`.
    #[inline]
    pub fn toggle(&mut self, x: usize, y: usize, z: usize) {
        Self::check_layer(z);
        self.cells[Self::index(x, y)] ^= 1 << z;
    }

    /// Light or clear the whole horizontal layer `z`.
    ///
    /// # Panics
    ///
    /// Panics if `z` is not in `0..8`.
    pub fn set_layer(&mut self, z: usize, on: bool) {
        Self::check_layer(z);
        let mask = 1u8 << z;
        for cell in &mut self.cells {
            if on {
                *cell |= mask;
            } else {
                *cell &= !mask;
            }
        }
    }

    /// Light or clear every voxel.
    pub fn fill(&mut self, on: bool) {
        self.cells = [if on { 0xFF } else { 0 }; FRAME_CELLS];
    }

    /// Clear every voxel.
    pub fn clear(&mut self) {
        self.fill(false);
    }

    /// Number of lit voxels.
    pub fn lit_count(&self) -> u32 {
        self.cells.iter().map(|c| c.count_ones()).sum()
    }

    /// True when no voxel is lit.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }

    /// Cell value at `idx`, or `0` when `idx` is past the end.
    #[inline]
    pub fn cell(&self, idx: usize) -> u8 {
        self.cells.get(idx).copied().unwrap_or(0)
    }

    /// All 64 cells in index order.
    #[inline]
    pub fn cells(&self) -> &[u8; FRAME_CELLS] {
        &self.cells
    }

    /// Mutable access to the raw cells.
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [u8; FRAME_CELLS] {
        &mut self.cells
    }
}

impl From<[u8; FRAME_CELLS]> for Frame {
    fn from(cells: [u8; FRAME_CELLS]) -> Self {
        Self::new(cells)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame[")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{cell:02X}")?;
        }
        write!(f, "]")
    }
}
