use anyhow::Context as _;
use image::GrayImage;
use rayon::prelude::*;

use crate::foundation::error::{Goes16Error, Goes16Result};

/// Separable Gaussian blur of a single-channel mask.
///
/// `radius` is the kernel half-width in pixels; edges clamp.
pub fn blur_luma8(src: &GrayImage, radius: u32, sigma: f32) -> Goes16Result<GrayImage> {
    let (width, height) = src.dimensions();
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.clone());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; src.as_raw().len()];
    let mut out = vec![0u8; src.as_raw().len()];

    horizontal_pass(src.as_raw(), &mut tmp, width, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);

    let blurred = GrayImage::from_raw(width, height, out)
        .with_context(|| format!("blur output buffer does not fit {width}x{height}"))?;
    Ok(blurred)
}

/// Kernel half-width covering three standard deviations.
pub fn kernel_radius_for_sigma(sigma: f32) -> u32 {
    (sigma * 3.0).ceil().max(0.0) as u32
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> Goes16Result<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(Goes16Error::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Keep the kernel summing to exactly 1.0 in Q16.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = i64::from(width);
    dst.par_chunks_mut(width as usize)
        .zip(src.par_chunks(width as usize))
        .for_each(|(dst_row, src_row)| {
            for x in 0..w {
                let mut acc = 0u64;
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = (x + ki as i64 - radius).clamp(0, w - 1);
                    acc += u64::from(kw) * u64::from(src_row[sx as usize]);
                }
                dst_row[x as usize] = q16_to_u8(acc);
            }
        });
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i64;
    let w = width as usize;
    let h = i64::from(height);
    dst.par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, dst_row)| {
            for (x, out) in dst_row.iter_mut().enumerate() {
                let mut acc = 0u64;
                for (ki, &kw) in k.iter().enumerate() {
                    let sy = (y as i64 + ki as i64 - radius).clamp(0, h - 1) as usize;
                    acc += u64::from(kw) * u64::from(src[sy * w + x]);
                }
                *out = q16_to_u8(acc);
            }
        });
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn blur_radius_0_is_identity() {
        let src = GrayImage::from_raw(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(blur_luma8(&src, 0, 1.0).unwrap(), src);
    }

    #[test]
    fn blur_constant_image_is_identity() {
        let src = GrayImage::from_pixel(7, 5, Luma([90]));
        assert_eq!(blur_luma8(&src, 3, 2.0).unwrap(), src);
    }

    #[test]
    fn blur_spreads_energy_from_single_pixel() {
        let mut src = GrayImage::new(9, 9);
        src.put_pixel(4, 4, Luma([255]));

        let out = blur_luma8(&src, 3, 1.2).unwrap();

        let nonzero = out.pixels().filter(|p| p.0[0] != 0).count();
        assert!(nonzero > 1);
        let sum: u32 = out.pixels().map(|p| u32::from(p.0[0])).sum();
        assert!((sum as i32 - 255).abs() <= 8);
        assert!(out.get_pixel(4, 4).0[0] < 255);
    }

    #[test]
    fn kernel_radius_covers_three_sigma() {
        assert_eq!(kernel_radius_for_sigma(2.0), 6);
        assert_eq!(kernel_radius_for_sigma(0.5), 2);
    }

    #[test]
    fn invalid_sigma_is_rejected() {
        let src = GrayImage::new(2, 2);
        assert!(blur_luma8(&src, 2, 0.0).is_err());
        assert!(blur_luma8(&src, 2, f32::NAN).is_err());
    }
}
