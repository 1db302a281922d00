use image::{RgbImage, imageops};

use crate::{
    assets::decode::decode_rgb,
    foundation::error::{Goes16Error, Goes16Result},
    tiles::{download::TileResult, plan::TileGrid},
};

/// Stitches the downloaded tiles of `grid` into one canvas.
///
/// Requires exactly one result per grid cell. Each tile is decoded and
/// pasted at `(x * edge, y * edge)`; the rectangles are disjoint so the
/// outcome does not depend on the order of `results`.
pub fn assemble(grid: &TileGrid, results: Vec<TileResult>) -> Goes16Result<RgbImage> {
    let n = grid.tile_count as usize;
    if results.len() != grid.tiles_total() {
        return Err(Goes16Error::validation(format!(
            "expected {} tiles for a {n}x{n} grid, got {}",
            grid.tiles_total(),
            results.len()
        )));
    }

    let mut seen = vec![false; grid.tiles_total()];
    for r in &results {
        let (x, y) = (r.coord.x as usize, r.coord.y as usize);
        if x >= n || y >= n {
            return Err(Goes16Error::validation(format!(
                "tile {} is outside the {n}x{n} grid",
                r.coord
            )));
        }
        let slot = &mut seen[y * n + x];
        if *slot {
            return Err(Goes16Error::validation(format!(
                "tile {} supplied more than once",
                r.coord
            )));
        }
        *slot = true;
    }

    let edge = grid.tile_edge;
    let side = grid.canvas_size();
    let mut canvas = RgbImage::new(side, side);

    for result in results {
        let tile = decode_rgb(&result.bytes)
            .map_err(|e| Goes16Error::decode(format!("tile {}: {e}", result.coord)))?;
        if tile.dimensions() != (edge, edge) {
            return Err(Goes16Error::decode(format!(
                "tile {} is {}x{}, expected {edge}x{edge}",
                result.coord,
                tile.width(),
                tile.height()
            )));
        }
        imageops::replace(
            &mut canvas,
            &tile,
            i64::from(result.coord.x * edge),
            i64::from(result.coord.y * edge),
        );
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, Rgb};

    use super::*;
    use crate::foundation::core::TileCoord;

    const EDGE: u32 = 4;

    fn tile_png(color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(EDGE, EDGE, Rgb(color));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn color_for(x: u32, y: u32) -> [u8; 3] {
        [(x * 60 + 10) as u8, (y * 60 + 20) as u8, 200]
    }

    fn results(grid: &TileGrid) -> Vec<TileResult> {
        grid.coords()
            .map(|c| TileResult {
                coord: c,
                bytes: tile_png(color_for(c.x, c.y)),
            })
            .collect()
    }

    #[test]
    fn tiles_land_in_their_rectangles() {
        let grid = TileGrid::new(2, EDGE).unwrap();
        let canvas = assemble(&grid, results(&grid)).unwrap();
        assert_eq!(canvas.dimensions(), (2 * EDGE, 2 * EDGE));

        for (px, py, p) in canvas.enumerate_pixels() {
            assert_eq!(p.0, color_for(px / EDGE, py / EDGE), "pixel ({px}, {py})");
        }
    }

    #[test]
    fn result_order_does_not_change_the_canvas() {
        let grid = TileGrid::new(4, EDGE).unwrap();
        let forward = assemble(&grid, results(&grid)).unwrap();

        let mut shuffled = results(&grid);
        shuffled.reverse();
        shuffled.swap(1, 7);
        let backward = assemble(&grid, shuffled).unwrap();

        assert_eq!(forward.as_raw(), backward.as_raw());
    }

    #[test]
    fn missing_duplicate_or_out_of_range_tiles_are_rejected() {
        let grid = TileGrid::new(2, EDGE).unwrap();

        let mut missing = results(&grid);
        missing.pop();
        assert!(matches!(
            assemble(&grid, missing),
            Err(Goes16Error::Validation(_))
        ));

        let mut duplicate = results(&grid);
        duplicate[0].coord = duplicate[1].coord;
        assert!(matches!(
            assemble(&grid, duplicate),
            Err(Goes16Error::Validation(_))
        ));

        let mut outside = results(&grid);
        outside[0].coord = TileCoord::new(2, 0);
        assert!(matches!(
            assemble(&grid, outside),
            Err(Goes16Error::Validation(_))
        ));
    }

    #[test]
    fn undecodable_or_misshapen_tiles_are_decode_errors() {
        let grid = TileGrid::new(1, EDGE).unwrap();

        let garbage = vec![TileResult {
            coord: TileCoord::new(0, 0),
            bytes: b"<html>503</html>".to_vec(),
        }];
        assert!(matches!(
            assemble(&grid, garbage),
            Err(Goes16Error::Decode(_))
        ));

        let small = TileGrid::new(1, EDGE * 2).unwrap();
        let wrong_size = vec![TileResult {
            coord: TileCoord::new(0, 0),
            bytes: tile_png([1, 2, 3]),
        }];
        assert!(matches!(
            assemble(&small, wrong_size),
            Err(Goes16Error::Decode(_))
        ));
    }
}
