// Core types shared by the drawing, preprocessing and prediction stages.

use crate::error::{Error, Result};

/// Side length of the square grid the classifier consumes.
pub const GRID_SIZE: usize = 28;

#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the buffer is (pixels)
    pub height: usize,     // how tall the buffer is (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A buffer filled with a single color.
    /// Visual: a flat rectangle of `color` once presented.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }
}

/// A position in surface-intrinsic pixels (independent of how large the
/// surface is shown on screen).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One pointer-down-to-up motion, in drawing order.
/// Needs 2+ points to leave a visible line; a single tap is still recorded.
pub type Stroke = Vec<Point>;

/// 28x28 single-channel model input, row-major. 1.0 = ink, 0.0 = background.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    cells: Vec<f32>,
}

/// Summary numbers logged before every inference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

impl Grid {
    /// Wrap row-major cells; fails unless there are exactly 28*28 of them.
    pub fn from_cells(cells: Vec<f32>) -> Result<Self> {
        if cells.len() != GRID_SIZE * GRID_SIZE {
            return Err(Error::Preprocess(format!(
                "grid needs {} cells, got {}",
                GRID_SIZE * GRID_SIZE,
                cells.len()
            )));
        }
        Ok(Self { cells })
    }

    pub fn zeros() -> Self {
        Self { cells: vec![0.0; GRID_SIZE * GRID_SIZE] }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.cells[y * GRID_SIZE + x]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.cells
    }

    /// Model input shape with the leading batch dimension: `[1, 28, 28, 1]`.
    pub const fn batched_shape() -> [usize; 4] {
        [1, GRID_SIZE, GRID_SIZE, 1]
    }

    pub fn stats(&self) -> GridStats {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f32;
        for &v in &self.cells {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        GridStats { min, max, mean: sum / self.cells.len() as f32 }
    }
}

/// One ranked guess: a display label and its probability in [0,1].
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}
