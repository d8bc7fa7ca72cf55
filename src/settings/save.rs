use std::io::Write;
use std::path::Path;

use super::{AppSettings, ConfigError};

/// Write settings to `path`, creating its folder as needed.
///
/// The document goes to a randomly named sibling first and is renamed over
/// the old file, so readers only ever see a complete document.
pub fn save_to_path(settings: &AppSettings, path: &Path) -> Result<(), ConfigError> {
    let data = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let staged = dir.join(format!(
        ".{}.{:016x}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        rand::random::<u64>()
    ));
    write_then_rename(&staged, path, data.as_bytes()).map_err(|source| {
        let _ = std::fs::remove_file(&staged);
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_then_rename(staged: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staged)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(staged, path)
}
