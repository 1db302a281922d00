use crate::foundation::{
    core::{TILE_EDGE, TileCoord, Timestamp},
    error::{Goes16Error, Goes16Result},
};

/// Geometry of the tile grid for one output size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub tile_count: u32,
    pub zoom_level: u32,
    pub tile_edge: u32,
}

impl TileGrid {
    /// Plans the upstream grid for a requested output size.
    pub fn plan(requested_size: u32) -> Goes16Result<Self> {
        if requested_size == 0 || !requested_size.is_multiple_of(TILE_EDGE) {
            return Err(Goes16Error::validation(format!(
                "size {requested_size} is not a multiple of the {TILE_EDGE} px tile edge"
            )));
        }
        Self::new(requested_size / TILE_EDGE, TILE_EDGE)
    }

    pub fn new(tile_count: u32, tile_edge: u32) -> Goes16Result<Self> {
        if !tile_count.is_power_of_two() {
            return Err(Goes16Error::validation(format!(
                "tile count {tile_count} is not a power of two"
            )));
        }
        if tile_edge == 0 {
            return Err(Goes16Error::validation("tile edge must be non-zero"));
        }
        Ok(Self {
            tile_count,
            zoom_level: tile_count.trailing_zeros(),
            tile_edge,
        })
    }

    pub fn canvas_size(&self) -> u32 {
        self.tile_count * self.tile_edge
    }

    pub fn tiles_total(&self) -> usize {
        (self.tile_count as usize) * (self.tile_count as usize)
    }

    /// Every coordinate of the grid, x-major.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let n = self.tile_count;
        (0..n).flat_map(move |x| (0..n).map(move |y| TileCoord::new(x, y)))
    }

    pub fn jobs(&self, base_url: &str, timestamp: Timestamp) -> Vec<TileJob> {
        self.coords()
            .map(|coord| TileJob {
                base_url: base_url.trim_end_matches('/').to_string(),
                timestamp,
                coord,
                zoom_level: self.zoom_level,
                tile_count: self.tile_count,
            })
            .collect()
    }
}

/// One downloadable tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileJob {
    pub base_url: String,
    pub timestamp: Timestamp,
    pub coord: TileCoord,
    pub zoom_level: u32,
    pub tile_count: u32,
}

impl TileJob {
    pub fn url(&self) -> String {
        format!(
            "{}/imagery/{}/goes-16---full_disk/natural_color/{}/0{}/00{}_00{}.png",
            self.base_url,
            self.timestamp.url_date(),
            self.timestamp.url_time(),
            self.zoom_level,
            self.coord.y,
            self.coord.x,
        )
    }
}
