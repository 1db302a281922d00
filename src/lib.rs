//! goes16-background fetches the latest GOES-16 full-disk picture of Earth and
//! installs it as the desktop wallpaper.
//!
//! # Pipeline overview
//!
//! 1. **Latest time**: read the newest capture timestamp from the metadata feed
//! 2. **Plan**: turn the requested size into a grid of tile jobs
//! 3. **Download**: fetch every tile on its own worker, with bounded retry
//! 4. **Assemble**: paste the decoded tiles into one canvas
//! 5. **Composite** (optional): fit the globe into a backdrop with a feathered circular mask
//! 6. **Save & install**: replace the previous picture and set the wallpaper
//!
//! The whole run is supervised by a [`Watchdog`] that gives up after a
//! deadline. Any error aborts the run before the output directory is touched.
#![forbid(unsafe_code)]

mod assets;
mod composite;
mod desktop;
mod foundation;
mod net;
mod output;
mod pipeline;
mod source;
mod tiles;
mod watchdog;

pub use assets::decode::{decode_rgb, load_backdrop};
pub use composite::{
    CompositeLayout, MASK_BLUR_SIGMA, MASK_SHRINK, blend::paste_with_mask, blur::blur_luma8,
    composite,
};
pub use desktop::battery::{any_discharging, is_discharging};
pub use desktop::environment::DesktopEnvironment;
pub use desktop::wallpaper::{
    WallpaperCommand, set_background, set_background_for, wallpaper_commands,
};
pub use foundation::core::{
    BASE_URL, DEFAULT_SIZE, TILE_EDGE, TileCoord, Timestamp, VALID_SIZES,
};
pub use foundation::error::{Goes16Error, Goes16Result};
pub use net::fetch::{Fetcher, RetryPolicy};
pub use net::transport::{HttpTransport, Transport};
pub use output::{remove_stale_outputs, write_output};
pub use pipeline::{
    ImageSource, PipelineConfig, PipelineOutput, default_output_dir, run_pipeline,
};
pub use source::latest::{fetch_latest_timestamp, latest_times_url, parse_latest_times};
pub use source::single_image::{SingleImageSource, fetch_single_image, find_image_link};
pub use tiles::assemble::assemble;
pub use tiles::download::{Progress, TileResult, download_all};
pub use tiles::plan::{TileGrid, TileJob};
pub use watchdog::{Deadline, Outcome, WatchState, Watchdog};
