//! Local storage of the last captured gesture

use crate::dispatch::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Fixed file name; every stored gesture overwrites the previous one.
pub const TOUCH_DATA_FILE: &str = "TouchData.json";

/// Write `data` to `<dir>/TouchData.json`, replacing any previous gesture.
///
/// The file is written to a temporary sibling first and then renamed over
/// the target, so a reader never sees a half-written document.
pub fn write_touch_data(dir: &Path, data: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = dir.join(TOUCH_DATA_FILE);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(&path)?;

    tracing::debug!("Wrote {} bytes of touch data to {}", data.len(), path.display());
    Ok(path)
}
