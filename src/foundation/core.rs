use std::fmt;

use chrono::NaiveDateTime;

use crate::foundation::error::{Goes16Error, Goes16Result};

/// Edge length in pixels of one upstream tile.
pub const TILE_EDGE: u32 = 678;

/// Output sizes the upstream tile server can serve as a full grid.
pub const VALID_SIZES: [u32; 5] = [678, 1356, 2712, 5424, 10848];

pub const DEFAULT_SIZE: u32 = 1356;

pub const BASE_URL: &str = "https://rammb-slider.cira.colostate.edu/data";

/// Capture time of an image as published by the metadata feed (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Parses the feed's `YYYYMMDDHHMMSS` integer form.
    pub fn from_feed_int(value: u64) -> Goes16Result<Self> {
        let text = value.to_string();
        NaiveDateTime::parse_from_str(&text, "%Y%m%d%H%M%S")
            .map(Self)
            .map_err(|e| Goes16Error::metadata(format!("invalid timestamp {value}: {e}")))
    }

    /// Date segment of tile URLs, e.g. `2023/01/01`.
    pub fn url_date(self) -> String {
        self.0.format("%Y/%m/%d").to_string()
    }

    /// Time segment of tile URLs, e.g. `20230101120000`.
    pub fn url_time(self) -> String {
        self.0.format("%Y%m%d%H%M%S").to_string()
    }

    pub fn file_stem(self) -> String {
        self.0.format("goes16-%Y%m%dT%H%M%S").to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y/%m/%d %H:%M:%S"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
