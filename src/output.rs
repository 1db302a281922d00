use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbImage;
use tracing::{debug, info};

use crate::foundation::error::Goes16Result;

pub const FILE_PREFIX: &str = "goes16-";
pub const FILE_EXTENSION: &str = "png";

fn is_managed_file(name: &str) -> bool {
    name.starts_with(FILE_PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == FILE_EXTENSION)
}

/// Deletes every `goes16-*.png` in `dir`. A missing directory is not an error.
pub fn remove_stale_outputs(dir: &Path) -> Goes16Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("list output dir '{}'", dir.display()))
                .into());
        }
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry.with_context(|| format!("list output dir '{}'", dir.display()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_managed_file(name) || !entry.path().is_file() {
            continue;
        }
        std::fs::remove_file(entry.path())
            .with_context(|| format!("remove stale output '{}'", entry.path().display()))?;
        debug!(file = name, "removed stale output");
        removed += 1;
    }
    Ok(removed)
}

/// Scratch name `img` is encoded to before it replaces the previous output.
fn partial_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!(".{stem}.{FILE_EXTENSION}.part"))
}

/// Replaces any previous output in `dir` with `img` saved as `<stem>.png`.
///
/// The picture is encoded under a scratch name first, so an interrupted save
/// never leaves a truncated `goes16-*.png` behind.
pub fn write_output(dir: &Path, stem: &str, img: &RgbImage) -> Goes16Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create output dir '{}'", dir.display()))?;

    let path = dir.join(format!("{stem}.{FILE_EXTENSION}"));
    let partial = partial_path(dir, stem);
    info!("Saving to '{}'...", path.display());
    if let Err(e) = img.save_with_format(&partial, image::ImageFormat::Png) {
        let _ = std::fs::remove_file(&partial);
        return Err(anyhow::Error::new(e)
            .context(format!("write png '{}'", partial.display()))
            .into());
    }

    remove_stale_outputs(dir)?;
    std::fs::rename(&partial, &path).with_context(|| {
        format!("move '{}' to '{}'", partial.display(), path.display())
    })?;
    Ok(path)
}
