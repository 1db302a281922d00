use std::path::PathBuf;

use image::RgbImage;
use tracing::info;

use crate::{
    assets::decode::load_backdrop,
    composite::composite,
    desktop::wallpaper::set_background,
    foundation::{
        core::{BASE_URL, DEFAULT_SIZE, Timestamp},
        error::{Goes16Error, Goes16Result},
    },
    net::{fetch::Fetcher, transport::Transport},
    output::write_output,
    source::{
        latest::fetch_latest_timestamp,
        single_image::{LATEST_FILE_STEM, SingleImageSource, fetch_single_image},
    },
    tiles::{assemble::assemble, download::download_all, plan::TileGrid},
};

/// Where the full-disk picture comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ImageSource {
    /// The tile server, reassembled locally.
    #[default]
    Tiles,
    /// One pre-rendered image linked from an HTML page.
    SingleImage(SingleImageSource),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub base_url: String,
    pub size: u32,
    pub output_dir: PathBuf,
    pub composite_over: Option<PathBuf>,
    pub set_background: bool,
    pub source: ImageSource,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            size: DEFAULT_SIZE,
            output_dir: default_output_dir(),
            composite_over: None,
            set_background: true,
            source: ImageSource::Tiles,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Goes16Result<()> {
        if self.size == 0 {
            return Err(Goes16Error::validation("size must be non-zero"));
        }
        if self.base_url.trim().is_empty() {
            return Err(Goes16Error::validation("base url must not be empty"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(Goes16Error::validation("output dir must not be empty"));
        }
        if matches!(self.source, ImageSource::Tiles) {
            TileGrid::plan(self.size)?;
        }
        Ok(())
    }
}

/// Per-user cache directory the picture is written to by default.
pub fn default_output_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("goes16background")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOutput {
    pub path: PathBuf,
    /// Capture time, known only for the tile source.
    pub timestamp: Option<Timestamp>,
    pub width: u32,
    pub height: u32,
}

/// Fetch, reassemble, composite, save and (optionally) install the picture.
///
/// Any failure aborts before the output directory is touched.
#[tracing::instrument(skip_all, fields(size = config.size))]
pub fn run_pipeline<T: Transport>(
    config: &PipelineConfig,
    fetcher: &Fetcher<T>,
) -> Goes16Result<PipelineOutput> {
    config.validate()?;
    info!("Updating...");

    let (picture, stem, timestamp) = match &config.source {
        ImageSource::Tiles => {
            let latest = fetch_latest_timestamp(fetcher, &config.base_url)?;
            let backdrop = open_backdrop(config)?;
            let canvas = fetch_tiled_canvas(config, fetcher, latest)?;
            (
                finish(canvas, backdrop)?,
                latest.file_stem(),
                Some(latest),
            )
        }
        ImageSource::SingleImage(source) => {
            let backdrop = open_backdrop(config)?;
            let canvas = fetch_single_image(fetcher, source, config.size)?;
            (finish(canvas, backdrop)?, LATEST_FILE_STEM.to_string(), None)
        }
    };

    let path = write_output(&config.output_dir, &stem, &picture)?;
    if config.set_background {
        set_background(&path)?;
    }

    Ok(PipelineOutput {
        path,
        timestamp,
        width: picture.width(),
        height: picture.height(),
    })
}

fn open_backdrop(config: &PipelineConfig) -> Goes16Result<Option<RgbImage>> {
    let Some(path) = &config.composite_over else {
        return Ok(None);
    };
    info!("Opening image to composite over...");
    load_backdrop(path).map(Some)
}

fn fetch_tiled_canvas<T: Transport>(
    config: &PipelineConfig,
    fetcher: &Fetcher<T>,
    latest: Timestamp,
) -> Goes16Result<RgbImage> {
    let grid = TileGrid::plan(config.size)?;
    let jobs = grid.jobs(&config.base_url, latest);
    let tiles = download_all(fetcher, &jobs)?;
    assemble(&grid, tiles)
}

fn finish(canvas: RgbImage, backdrop: Option<RgbImage>) -> Goes16Result<RgbImage> {
    match backdrop {
        Some(backdrop) => composite(&canvas, backdrop),
        None => Ok(canvas),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = PipelineConfig::default();
        cfg.validate().unwrap();
        assert!(cfg.output_dir.ends_with("goes16background"));
        assert_eq!(cfg.size, 1356);
    }

    #[test]
    fn tile_source_rejects_sizes_off_the_grid() {
        let cfg = PipelineConfig {
            size: 1000,
            ..PipelineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Goes16Error::Validation(_))));
    }

    #[test]
    fn single_image_source_accepts_any_positive_size() {
        let cfg = PipelineConfig {
            size: 1808,
            source: ImageSource::SingleImage(SingleImageSource {
                page_url: "https://example.org/".to_string(),
                product_marker: "Full Disk".to_string(),
            }),
            ..PipelineConfig::default()
        };
        cfg.validate().unwrap();
    }
}
