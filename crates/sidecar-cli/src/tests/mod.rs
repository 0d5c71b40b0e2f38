mod logging;

use std::path::Path;

use tempfile::TempDir;

/// Temp config dir holding `contents` as config.toml.
pub(crate) fn config_dir_with(contents: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), contents);
    dir
}

fn write_config(dir: &Path, contents: &str) {
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}
