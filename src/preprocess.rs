// Surface pixels -> classifier input.
// Visual expectation: nothing on screen; the 280x280 drawing becomes a 28x28
// grid where ink is ~1.0 and paper is ~0.0 (light-on-dark, like the model's
// training data).

use crate::error::{Error, Result};
use crate::types::{FrameBuffer, GRID_SIZE, Grid};
use image::{DynamicImage, GrayImage, RgbImage};

/// Read the surface as luminance, shrink it to 28x28 (bilinear), scale to
/// [0,1] and invert. Same pixels in, same grid out; nothing is cached.
pub fn preprocess(surface: &FrameBuffer) -> Result<Grid> {
    let gray = to_luma(surface)?;

    let mut cells = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
    for gy in 0..GRID_SIZE {
        for gx in 0..GRID_SIZE {
            let v = sample_bilinear(&gray, gx, gy);
            cells.push(1.0 - v / 255.0);
        }
    }
    Grid::from_cells(cells)
}

/// Point-sampled bilinear: output cell `i` reads source coordinate
/// `i * (in / out)` (corners not aligned, no half-pixel offset), blending the
/// 2x2 neighbourhood around it. Values stay in f32; no rounding back to u8.
fn sample_bilinear(gray: &GrayImage, gx: usize, gy: usize) -> f32 {
    let (w, h) = gray.dimensions();
    let sx = gx as f32 * w as f32 / GRID_SIZE as f32;
    let sy = gy as f32 * h as f32 / GRID_SIZE as f32;

    let x0 = (sx.floor() as u32).min(w - 1);
    let y0 = (sy.floor() as u32).min(h - 1);
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = sx - x0 as f32;
    let fy = sy - y0 as f32;

    let px = |x, y| f32::from(gray.get_pixel(x, y).0[0]);
    let top = px(x0, y0) + (px(x1, y0) - px(x0, y0)) * fx;
    let bottom = px(x0, y1) + (px(x1, y1) - px(x0, y1)) * fx;
    top + (bottom - top) * fy
}

/// 0x00RRGGBB buffer -> single-channel image at native resolution.
fn to_luma(surface: &FrameBuffer) -> Result<GrayImage> {
    if surface.width == 0 || surface.height == 0 {
        return Err(Error::Preprocess("surface has zero size".into()));
    }
    if surface.pixels.len() != surface.width * surface.height {
        return Err(Error::Preprocess(format!(
            "surface claims {}x{} but holds {} pixels",
            surface.width,
            surface.height,
            surface.pixels.len()
        )));
    }

    let mut bytes = Vec::with_capacity(surface.pixels.len() * 3);
    for &px in &surface.pixels {
        bytes.push(((px >> 16) & 0xFF) as u8);
        bytes.push(((px >> 8) & 0xFF) as u8);
        bytes.push((px & 0xFF) as u8);
    }
    let rgb = RgbImage::from_raw(surface.width as u32, surface.height as u32, bytes)
        .ok_or_else(|| Error::Preprocess("could not wrap surface pixels".into()))?;
    Ok(DynamicImage::ImageRgb8(rgb).to_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::fill_rect;

    #[test]
    fn blank_surface_is_all_background() {
        let fb = FrameBuffer::filled(280, 280, 0x00FF_FFFF);
        let grid = preprocess(&fb).unwrap();
        assert!(grid.as_slice().iter().all(|&v| v < 0.01), "{:?}", grid.stats());
    }

    #[test]
    fn fully_inked_surface_is_all_ink() {
        let fb = FrameBuffer::filled(280, 280, 0x0000_0000);
        let grid = preprocess(&fb).unwrap();
        assert!(grid.as_slice().iter().all(|&v| v > 0.99));
    }

    #[test]
    fn ink_stays_where_it_was_drawn() {
        let mut fb = FrameBuffer::filled(280, 280, 0x00FF_FFFF);
        fill_rect(&mut fb, 0, 0, 140, 280, 0x0000_0000);
        let grid = preprocess(&fb).unwrap();
        assert!(grid.get(2, 14) > 0.99);
        assert!(grid.get(25, 14) < 0.01);
        // Cell 13 reads column 130 (inked), cell 14 reads column 140 (paper).
        assert_eq!(grid.get(13, 14), 1.0);
        assert_eq!(grid.get(14, 14), 0.0);
    }

    #[test]
    fn cells_sample_points_not_areas() {
        // Ink only on every tenth column: each cell lands exactly on one.
        let mut on_grid = FrameBuffer::filled(280, 280, 0x00FF_FFFF);
        for x in (0..280).step_by(10) {
            fill_rect(&mut on_grid, x, 0, 1, 280, 0x0000_0000);
        }
        let grid = preprocess(&on_grid).unwrap();
        assert_eq!(grid.get(5, 5), 1.0);
        assert!(grid.as_slice().iter().all(|&v| v == 1.0));

        // Shifted by half a cell: no sample touches the ink.
        let mut off_grid = FrameBuffer::filled(280, 280, 0x00FF_FFFF);
        for x in (5..280).step_by(10) {
            fill_rect(&mut off_grid, x, 0, 1, 280, 0x0000_0000);
        }
        let grid = preprocess(&off_grid).unwrap();
        assert!(grid.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn fractional_sample_blends_neighbours() {
        // 42 -> 28: cell 1 reads x = 1.5, halfway between columns 1 and 2.
        let mut fb = FrameBuffer::filled(42, 42, 0x00FF_FFFF);
        fill_rect(&mut fb, 1, 0, 1, 42, 0x0000_0000);
        let grid = preprocess(&fb).unwrap();
        assert_eq!(grid.get(1, 7), 0.5);
        assert_eq!(grid.get(0, 7), 0.0);
    }

    #[test]
    fn same_pixels_same_grid() {
        let mut fb = FrameBuffer::filled(280, 280, 0x00FF_FFFF);
        fill_rect(&mut fb, 33, 71, 90, 17, 0x0040_4040);
        assert_eq!(preprocess(&fb).unwrap(), preprocess(&fb).unwrap());
    }

    #[test]
    fn malformed_surface_is_a_preprocess_failure() {
        let empty = FrameBuffer { width: 0, height: 0, pixels: vec![] };
        assert!(matches!(preprocess(&empty), Err(Error::Preprocess(_))));

        let short = FrameBuffer { width: 10, height: 10, pixels: vec![0; 5] };
        assert!(matches!(preprocess(&short), Err(Error::Preprocess(_))));
    }
}
