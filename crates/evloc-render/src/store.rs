use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use uuid::Uuid;

use crate::document::{build_document, ExportedDocument};
use crate::error::RenderError;

/// File name of the single plot slot inside the artifact directory.
pub const SLOT_FILE_NAME: &str = "result_plot.png";

/// Holds the most recently rendered plot in one overwritten file.
///
/// Writers are serialized by an internal lock and publish through a rename,
/// so a reader sees either the previous plot or the new one in full.
#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    slot: PathBuf,
    lock: RwLock<()>,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let slot = dir.join(SLOT_FILE_NAME);
        Self {
            dir,
            slot,
            lock: RwLock::new(()),
        }
    }

    #[must_use]
    pub fn slot_path(&self) -> &Path {
        &self.slot
    }

    /// Replace the slot contents with `image`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Io` if the directory, temp file, or rename fails.
    /// The previous slot contents are left intact on failure.
    pub fn save(&self, image: &[u8]) -> Result<(), RenderError> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);

        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let tmp = self
            .dir
            .join(format!(".{SLOT_FILE_NAME}.{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, image).map_err(|e| io_error(&tmp, e))?;

        if let Err(e) = fs::rename(&tmp, &self.slot) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp artifact");
            }
            return Err(io_error(&self.slot, e));
        }

        tracing::info!(path = %self.slot.display(), bytes = image.len(), "artifact slot updated");
        Ok(())
    }

    /// Read the slot. `None` means nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Io` for any read failure other than absence.
    pub fn load(&self) -> Result<Option<Vec<u8>>, RenderError> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        match fs::read(&self.slot) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&self.slot, e)),
        }
    }

    /// Package the current slot into a one-page PDF. An empty slot yields a
    /// header-only document.
    ///
    /// # Errors
    ///
    /// `RenderError::DocumentEncoding` if the stored bytes cannot be embedded,
    /// `RenderError::Io` if the slot cannot be read.
    pub fn package_as_document(&self) -> Result<ExportedDocument, RenderError> {
        let image = self.load()?;
        let bytes = build_document(image.as_deref())?;
        tracing::info!(
            bytes = bytes.len(),
            with_plot = image.is_some(),
            "document exported"
        );
        Ok(ExportedDocument::new(bytes))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn load_before_save_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("static").join("plots");
        let store = ArtifactStore::new(&nested);
        store.save(b"first").unwrap();
        assert!(nested.join(SLOT_FILE_NAME).is_file());
        assert_eq!(store.load().unwrap().as_deref(), Some(&b"first"[..]));
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(b"a much longer first payload").unwrap();
        store.save(b"short").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some(&b"short"[..]));
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(b"one").unwrap();
        store.save(b"two").unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![SLOT_FILE_NAME.to_string()]);
    }

    #[test]
    fn save_into_a_file_path_fails_with_io_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = ArtifactStore::new(file.path());
        assert!(matches!(store.save(b"x"), Err(RenderError::Io { .. })));
    }

    #[test]
    fn concurrent_saves_never_expose_torn_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path()));
        let payloads: Vec<Vec<u8>> = (0u8..8).map(|i| vec![i; 64 * 1024]).collect();

        let writers: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|payload| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..10 {
                        store.save(&payload).unwrap();
                    }
                })
            })
            .collect();

        let reader = {
            let store = Arc::clone(&store);
            let payloads = payloads.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    if let Some(bytes) = store.load().unwrap() {
                        assert!(payloads.contains(&bytes), "observed a partial write");
                    }
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();

        let last = store.load().unwrap().expect("slot populated");
        assert!(payloads.contains(&last));
    }
}
