use image::{GrayImage, RgbImage};
use rayon::prelude::*;

use crate::foundation::error::{Goes16Error, Goes16Result};

/// `dst * (255 - m) / 255 + src * m / 255` for one channel value.
pub fn lerp_by_mask(dst: u8, src: u8, m: u8) -> u8 {
    let m = u16::from(m);
    let inv = 255 - m;
    mul_div255(u16::from(src), m).saturating_add(mul_div255(u16::from(dst), inv))
}

/// Pastes `src` over `dst` using `mask` as a per-pixel alpha stencil.
pub fn paste_with_mask(dst: &mut RgbImage, src: &RgbImage, mask: &GrayImage) -> Goes16Result<()> {
    if dst.dimensions() != src.dimensions() || dst.dimensions() != mask.dimensions() {
        return Err(Goes16Error::validation(format!(
            "masked paste expects equal sizes (dst {:?}, src {:?}, mask {:?})",
            dst.dimensions(),
            src.dimensions(),
            mask.dimensions()
        )));
    }

    let dst_raw: &mut [u8] = dst;
    dst_raw
        .par_chunks_exact_mut(3)
        .zip(src.as_raw().par_chunks_exact(3))
        .zip(mask.as_raw().par_iter())
        .for_each(|((d, s), &m)| match m {
            0 => {}
            255 => d.copy_from_slice(s),
            _ => {
                for c in 0..3 {
                    d[c] = lerp_by_mask(d[c], s[c], m);
                }
            }
        });
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
