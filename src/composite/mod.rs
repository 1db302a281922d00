//! Places the assembled globe at the center of a backdrop image.
//!
//! The globe is scaled to fit the backdrop, cut out with a circular mask
//! slightly smaller than the disk (so the dark rim of the tiles never shows)
//! and blended in through a Gaussian-feathered edge.

pub mod blend;
pub mod blur;

use image::{GrayImage, Luma, RgbImage, imageops};
use tracing::info;

use crate::foundation::error::{Goes16Error, Goes16Result};

/// Fraction of the inscribed circle kept by the mask.
pub const MASK_SHRINK: f64 = 0.995;

/// Standard deviation, in pixels, of the mask feathering.
pub const MASK_BLUR_SIGMA: f32 = 2.0;

/// Geometry of one composite, derived from canvas and backdrop sizes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeLayout {
    pub backdrop_width: u32,
    pub backdrop_height: u32,
    pub resize_ratio: f64,
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// Top-left corner of the scaled canvas on the backdrop.
    pub offset: (i64, i64),
    pub mask_radius: f64,
    /// Inclusive `(left, top, right, bottom)` box of the mask ellipse.
    pub mask_box: (i64, i64, i64, i64),
}

impl CompositeLayout {
    pub fn compute(canvas: (u32, u32), backdrop: (u32, u32)) -> Goes16Result<Self> {
        let (cw, ch) = canvas;
        let (bw, bh) = backdrop;
        if cw == 0 || ch == 0 || bw == 0 || bh == 0 {
            return Err(Goes16Error::validation(format!(
                "cannot composite {cw}x{ch} over {bw}x{bh}"
            )));
        }

        let (cw, ch, bw, bh) = (f64::from(cw), f64::from(ch), f64::from(bw), f64::from(bh));
        let ratio = (bw / cw).min(bh / ch);
        let disk = cw.min(ch) * ratio;

        let half_disk = disk / 2.0;
        let offset = (
            round_half_even(bw / 2.0 - half_disk),
            round_half_even(bh / 2.0 - half_disk),
        );

        let radius = disk * MASK_SHRINK / 2.0;
        let mask_box = (
            round_half_even(bw / 2.0 - radius),
            round_half_even(bh / 2.0 - radius),
            round_half_even(bw / 2.0 + radius),
            round_half_even(bh / 2.0 + radius),
        );

        Ok(Self {
            backdrop_width: backdrop.0,
            backdrop_height: backdrop.1,
            resize_ratio: ratio,
            scaled_width: round_half_even(cw * ratio).max(1) as u32,
            scaled_height: round_half_even(ch * ratio).max(1) as u32,
            offset,
            mask_radius: radius,
            mask_box,
        })
    }

    /// Hard-edged mask: white inside the ellipse of `mask_box`, black elsewhere.
    pub fn mask(&self) -> GrayImage {
        let (w, h) = (self.backdrop_width, self.backdrop_height);
        let mut mask = GrayImage::new(w, h);

        let (left, top, right, bottom) = self.mask_box;
        let cx = (left + right) as f64 / 2.0;
        let cy = (top + bottom) as f64 / 2.0;
        let rx = (right - left) as f64 / 2.0;
        let ry = (bottom - top) as f64 / 2.0;
        if rx <= 0.0 || ry <= 0.0 {
            return mask;
        }

        let y0 = top.max(0);
        let y1 = bottom.min(i64::from(h) - 1);
        let x0 = left.max(0);
        let x1 = right.min(i64::from(w) - 1);
        for y in y0..=y1 {
            let dy = (y as f64 - cy) / ry;
            for x in x0..=x1 {
                let dx = (x as f64 - cx) / rx;
                if dx * dx + dy * dy <= 1.0 {
                    mask.put_pixel(x as u32, y as u32, Luma([255]));
                }
            }
        }
        mask
    }
}

/// Composites `canvas` into the center of `backdrop`.
pub fn composite(canvas: &RgbImage, backdrop: RgbImage) -> Goes16Result<RgbImage> {
    let layout = CompositeLayout::compute(canvas.dimensions(), backdrop.dimensions())?;
    info!(
        "Compositing over {}x{} backdrop (scale {:.4})...",
        layout.backdrop_width, layout.backdrop_height, layout.resize_ratio
    );

    let scaled = imageops::resize(
        canvas,
        layout.scaled_width,
        layout.scaled_height,
        imageops::FilterType::Lanczos3,
    );

    let mut centered = RgbImage::new(layout.backdrop_width, layout.backdrop_height);
    imageops::overlay(&mut centered, &scaled, layout.offset.0, layout.offset.1);

    let mask = blur::blur_luma8(
        &layout.mask(),
        blur::kernel_radius_for_sigma(MASK_BLUR_SIGMA),
        MASK_BLUR_SIGMA,
    )?;

    let mut out = backdrop;
    blend::paste_with_mask(&mut out, &centered, &mask)?;
    Ok(out)
}

fn round_half_even(v: f64) -> i64 {
    v.round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn layout_for_small_canvas_on_large_backdrop() {
        let layout = CompositeLayout::compute((100, 100), (1000, 1000)).unwrap();
        assert_eq!(layout.resize_ratio, 10.0);
        assert_eq!((layout.scaled_width, layout.scaled_height), (1000, 1000));
        assert_eq!(layout.offset, (0, 0));
        assert!((layout.mask_radius - 497.5).abs() < 1e-9);
        assert_eq!(layout.mask_box, (2, 2, 998, 998));
    }

    #[test]
    fn layout_centers_on_wide_backdrops() {
        let layout = CompositeLayout::compute((1356, 1356), (1920, 1080)).unwrap();
        assert!((layout.resize_ratio - 1080.0 / 1356.0).abs() < 1e-12);
        assert_eq!((layout.scaled_width, layout.scaled_height), (1080, 1080));
        assert_eq!(layout.offset, (420, 0));
    }

    #[test]
    fn layout_rejects_empty_images() {
        assert!(CompositeLayout::compute((0, 10), (10, 10)).is_err());
        assert!(CompositeLayout::compute((10, 10), (10, 0)).is_err());
    }

    #[test]
    fn mask_is_a_centered_disk() {
        let layout = CompositeLayout::compute((10, 10), (100, 100)).unwrap();
        let mask = layout.mask();
        assert_eq!(mask.get_pixel(50, 50).0[0], 255);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.get_pixel(99, 99).0[0], 0);
        assert_eq!(mask.get_pixel(50, 1).0[0], 255);
        assert_eq!(mask.get_pixel(3, 3).0[0], 0);
    }

    #[test]
    fn globe_lands_in_the_middle_of_the_backdrop() {
        let canvas = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        let backdrop = RgbImage::from_pixel(100, 60, Rgb([0, 0, 255]));

        let out = composite(&canvas, backdrop).unwrap();
        assert_eq!(out.dimensions(), (100, 60));
        assert_eq!(out.get_pixel(50, 30).0, [255, 0, 0]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(out.get_pixel(5, 30).0, [0, 0, 255]);
        assert_eq!(out.get_pixel(95, 30).0, [0, 0, 255]);

        // The edge is feathered rather than hard.
        let edge = out.get_pixel(20, 30).0;
        assert!(edge[0] > 0 && edge[0] < 255, "edge pixel {edge:?}");
    }
}
