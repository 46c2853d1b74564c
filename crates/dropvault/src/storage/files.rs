//! Small filesystem helpers shared by the stores.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Name of the staging directory kept inside each store root.
///
/// Starts with `.` so no caller-supplied name can collide with it.
pub(crate) const STAGING_DIR: &str = ".staging";

/// Suffix of every JSON document file.
pub(crate) const JSON_SUFFIX: &str = ".json";

/// Write `data` to `path` atomically, staging it first in `staging`.
///
/// With `overwrite` false the call fails with `AlreadyExists` if `path`
/// exists; the check and the link are a single filesystem operation.
pub(crate) fn spit(staging: &Path, path: &Path, overwrite: bool, data: &[u8]) -> io::Result<()> {
    let mut tf = tempfile::NamedTempFile::new_in(staging)?;
    tf.as_file_mut().write_all(data)?;
    tf.as_file_mut().sync_all()?;
    if overwrite {
        tf.persist(path)?;
    } else {
        tf.persist_noclobber(path)?;
    }
    Ok(())
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub(crate) fn write_json<T: Serialize>(staging: &Path, path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    spit(staging, path, true, &json)?;
    Ok(())
}

/// Read and parse a JSON file.
///
/// A missing file surfaces as `StoreError::Io` with kind `NotFound`; a
/// malformed one as `StoreError::InvalidFileFormat`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        StoreError::InvalidFileFormat(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create `path` and its parents. An existing directory is success.
pub(crate) fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Names of the `.json` entries directly inside `dir`, hidden files excluded.
pub(crate) fn list_json(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(JSON_SUFFIX) && !name.starts_with('.') {
            names.push(name.into_owned());
        }
    }
    Ok(names)
}

pub(crate) fn is_not_found(e: &StoreError) -> bool {
    matches!(e, StoreError::Io(io) if io.kind() == io::ErrorKind::NotFound)
}
