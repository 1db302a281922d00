//! Alternate source: one pre-rendered full-disk image linked from an HTML page.

use image::RgbImage;
use reqwest::Url;
use scraper::{Html, Selector};
use tracing::info;

use crate::{
    assets::decode::decode_rgb,
    foundation::error::{Goes16Error, Goes16Result},
    net::{fetch::Fetcher, transport::Transport},
};

pub const LATEST_FILE_STEM: &str = "goes16-latest";

/// Where to look for the direct image link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleImageSource {
    pub page_url: String,
    pub product_marker: String,
}

/// Returns the `href` of the first anchor whose `title` contains
/// `product_marker` and whose text reads `"{size} x {size} px"`.
pub fn find_image_link(html: &str, product_marker: &str, size: u32) -> Goes16Result<Option<String>> {
    let anchors = Selector::parse("a[title][href]")
        .map_err(|e| Goes16Error::validation(format!("anchor selector: {e}")))?;
    let wanted = format!("{size} x {size} px");

    let document = Html::parse_document(html);
    let href = document
        .select(&anchors)
        .filter(|a| {
            a.value()
                .attr("title")
                .is_some_and(|title| title.contains(product_marker))
        })
        .find(|a| a.text().collect::<String>().trim() == wanted)
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);
    Ok(href)
}

fn resolve_link(page_url: &str, href: &str) -> Goes16Result<String> {
    let base = Url::parse(page_url)
        .map_err(|e| Goes16Error::validation(format!("invalid page url '{page_url}': {e}")))?;
    let url = base
        .join(href)
        .map_err(|e| Goes16Error::metadata(format!("invalid image link '{href}': {e}")))?;
    Ok(url.to_string())
}

/// Scrapes the page, downloads the linked image and decodes it.
pub fn fetch_single_image<T: Transport>(
    fetcher: &Fetcher<T>,
    source: &SingleImageSource,
    size: u32,
) -> Goes16Result<RgbImage> {
    info!("Looking up the {size} px image on {}...", source.page_url);
    let page = fetcher.fetch(&source.page_url)?;
    let html = String::from_utf8_lossy(&page);

    let href = find_image_link(&html, &source.product_marker, size)?.ok_or_else(|| {
        Goes16Error::metadata(format!(
            "no '{}' link for {size} x {size} px on {}",
            source.product_marker, source.page_url
        ))
    })?;
    let image_url = resolve_link(&source.page_url, &href)?;

    info!("Downloading {image_url}...");
    let bytes = fetcher.fetch(&image_url)?;
    decode_rgb(&bytes)
}
