//! On-disk storage for uploaded documents.
//!
//! Each vehicle has at most one document, stored as `<vehicle-number>.pdf`
//! in the upload directory. Saving again overwrites the previous file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Directory holding one PDF per vehicle.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    /// Open the upload directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryCreate`] if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| Error::DirectoryCreate {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The upload directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the document for a vehicle number is stored.
    ///
    /// The caller is responsible for having checked the vehicle number with
    /// [`crate::validation::validate_vehicle_number`].
    #[must_use]
    pub fn path_for(&self, vehicle_number: &str) -> PathBuf {
        self.dir.join(format!("{vehicle_number}.pdf"))
    }

    /// Write a document, replacing any previous one for the same vehicle.
    ///
    /// The bytes go to a sibling temporary file first and are renamed into
    /// place, so a reader never sees a half-written PDF.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentWrite`] if writing or renaming fails.
    pub fn save(&self, vehicle_number: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(vehicle_number);
        let tmp = self.dir.join(format!(".{vehicle_number}.pdf.part"));

        let written = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, &path));
        if let Err(source) = written {
            let _ = fs::remove_file(&tmp);
            return Err(Error::DocumentWrite { path, source });
        }

        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Remove a stored document. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error for any failure other than "not found".
    pub fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("truck detail");

        let store = DocumentStore::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.dir(), dir);
    }

    #[test]
    fn test_path_for() {
        let store = DocumentStore {
            dir: PathBuf::from("/srv/docs"),
        };
        assert_eq!(
            store.path_for("MH12AB1234"),
            PathBuf::from("/srv/docs/MH12AB1234.pdf")
        );
    }

    #[test]
    fn test_save_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(tmp.path()).unwrap();

        let first = store.save("KA01", b"first").unwrap();
        let second = store.save("KA01", b"second").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(&second).unwrap(), b"second");
        assert!(!tmp.path().join(".KA01.pdf.part").exists());
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(tmp.path().join("docs")).unwrap();
        fs::remove_dir(store.dir()).unwrap();

        let err = store.save("KA01", b"data").unwrap_err();
        assert!(matches!(err, Error::DocumentWrite { .. }));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(tmp.path()).unwrap();
        let path = store.save("KA01", b"data").unwrap();

        store.remove(&path).unwrap();
        assert!(!path.exists());
        store.remove(&path).unwrap();
    }
}
