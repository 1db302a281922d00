use serde::Deserialize;
use tracing::info;

use crate::{
    foundation::{
        core::Timestamp,
        error::{Goes16Error, Goes16Result},
    },
    net::{fetch::Fetcher, transport::Transport},
};

pub const LATEST_TIMES_PATH: &str = "/json/goes-16/full_disk/natural_color/latest_times.json";

#[derive(Debug, Deserialize)]
struct LatestTimes {
    timestamps_int: Vec<u64>,
}

pub fn latest_times_url(base_url: &str) -> String {
    format!("{}{LATEST_TIMES_PATH}", base_url.trim_end_matches('/'))
}

/// Parses the metadata feed body; the first timestamp is the newest.
pub fn parse_latest_times(body: &[u8]) -> Goes16Result<Timestamp> {
    let parsed: LatestTimes = serde_json::from_slice(body)
        .map_err(|e| Goes16Error::metadata(format!("invalid latest_times.json: {e}")))?;
    let first = parsed
        .timestamps_int
        .first()
        .copied()
        .ok_or_else(|| Goes16Error::metadata("latest_times.json lists no timestamps"))?;
    Timestamp::from_feed_int(first)
}

pub fn fetch_latest_timestamp<T: Transport>(
    fetcher: &Fetcher<T>,
    base_url: &str,
) -> Goes16Result<Timestamp> {
    let body = fetcher.fetch(&latest_times_url(base_url))?;
    let latest = parse_latest_times(&body)?;
    info!("Latest version: {latest} UTC.");
    Ok(latest)
}
