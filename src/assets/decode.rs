use std::path::Path;

use image::{DynamicImage, RgbImage};

use crate::foundation::error::{Goes16Error, Goes16Result};

pub fn decode_rgb(bytes: &[u8]) -> Goes16Result<RgbImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| Goes16Error::decode(format!("decode image from memory: {e}")))?;
    Ok(dyn_img.to_rgb8())
}

/// Opens the image the globe gets composited over.
pub fn load_backdrop(path: &Path) -> Goes16Result<RgbImage> {
    let dyn_img: DynamicImage = image::ImageReader::open(path)
        .map_err(|e| Goes16Error::composite_input(path, e))?
        .with_guessed_format()
        .map_err(|e| Goes16Error::composite_input(path, e))?
        .decode()
        .map_err(|e| Goes16Error::composite_input(path, e))?;

    let rgb = dyn_img.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(Goes16Error::composite_input(path, "image has no pixels"));
    }
    Ok(rgb)
}
