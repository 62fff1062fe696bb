//! Per-file load cache.
//!
//! Entries are keyed by a `seahash` of the source file's **contents**, not
//! its name, so an edited file never serves a stale result.  The caller's
//! tag (elevation source and policy) goes into the same hash, so a run
//! against other elevation data never sees this run's altitudes.  The file
//! stem is kept in the entry name only to make the cache directory readable:
//!
//! ```text
//! {cache_dir}/{stem}-{hash:016x}.json
//! ```
//!
//! The cache is an optimisation.  Every read or write failure is logged and
//! treated as a miss.

use std::hash::Hasher;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::loader::FileLoad;
use crate::MergeResult;

/// Directory-backed cache of parsed `(ways, endpoints)` per source file.
#[derive(Clone, Debug)]
pub struct LoadCache {
    dir: PathBuf,
}

impl LoadCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> MergeResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Key for a source file's bytes loaded under `tag`.
    pub fn key_for(contents: &[u8], tag: &str) -> u64 {
        let mut h = seahash::SeaHasher::new();
        h.write(contents);
        h.write(tag.as_bytes());
        h.finish()
    }

    fn entry_path(&self, source: &Path, key: u64) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source".to_owned());
        self.dir.join(format!("{stem}-{key:016x}.json"))
    }

    /// Cached load for `source` with content key `key`, if present and
    /// readable.
    pub fn get(&self, source: &Path, key: u64) -> Option<FileLoad> {
        let path = self.entry_path(source, key);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("load cache read {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_slice::<FileLoad>(&bytes) {
            Ok(load) => Some(load),
            Err(e) => {
                log::warn!("load cache entry {} is corrupt, ignoring: {e}", path.display());
                None
            }
        }
    }

    /// Store `load` for `source`.  Written to a temporary file and renamed
    /// into place so concurrent readers never see a partial entry.
    pub fn put(&self, source: &Path, key: u64, load: &FileLoad) {
        let path = self.entry_path(source, key);
        let tmp = path.with_extension("json.tmp");
        let result = serde_json::to_vec(load)
            .map_err(std::io::Error::from)
            .and_then(|bytes| std::fs::write(&tmp, bytes))
            .and_then(|()| std::fs::rename(&tmp, &path));
        if let Err(e) = result {
            log::warn!("load cache write {}: {e}", path.display());
            let _ = std::fs::remove_file(&tmp);
        }
    }
}
