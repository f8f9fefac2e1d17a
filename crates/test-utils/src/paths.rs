//! Locating optional real data files for tests.

use std::path::{Path, PathBuf};

/// Environment variable naming an extra directory to search first.
pub const TEST_DATA_DIR: &str = "TEST_DATA_DIR";

/// Workspace root (the directory above `crates/`).
pub fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// `crates/<name>/testdata`
pub fn crate_testdata_dir(name: &str) -> PathBuf {
    workspace_root().join("crates").join(name).join("testdata")
}

/// First existing `name` under `$TEST_DATA_DIR`, the GRIB2, raster and
/// extraction testdata directories, or the workspace `testdata/`.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let env_dir = std::env::var_os(TEST_DATA_DIR).map(PathBuf::from);
    let crate_dirs = ["grib2-parser", "raster", "extraction"].map(crate_testdata_dir);

    env_dir
        .into_iter()
        .chain(crate_dirs)
        .chain([workspace_root().join("testdata")])
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}
