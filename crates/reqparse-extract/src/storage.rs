//! Persisting validated uploads.
//!
//! [`FileStore`] owns a [`StorageConfig`] and writes each accepted upload to
//! `base_dir/<uuid><ext>`, where `<ext>` comes from content sniffing. Nothing
//! from the client (filename, declared content type) reaches the file system.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek};
use std::path::PathBuf;

use reqparse_config::StorageConfig;
use uuid::Uuid;

use crate::multipart::UploadedFile;
use crate::sniff;
use crate::{ErrorCode, ParseError};

/// A file written by [`FileStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    generated_name: String,
    extension: String,
}

impl StoredFile {
    /// The generated file name (UUID plus extension).
    #[must_use]
    pub fn generated_name(&self) -> &str {
        &self.generated_name
    }

    /// The sniffed extension, with its leading dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Consumes the record and returns the generated name.
    #[must_use]
    pub fn into_name(self) -> String {
        self.generated_name
    }
}

/// Validates uploads and writes them under a configured directory.
///
/// # Example
///
/// ```rust,no_run
/// use reqparse_config::StorageConfig;
/// use reqparse_extract::{FileStore, UploadedFile};
///
/// let store = FileStore::new(StorageConfig::default().with_base_dir("/srv/uploads"));
/// let upload = UploadedFile::new("avatar", Some("me.png".into()), None, &b"\x89PNG\r\n\x1a\n"[..]);
///
/// let stored = store.save(Some(&upload), "avatar", true)?.unwrap();
/// println!("{}", store.path_of(stored.generated_name()).display());
/// # Ok::<(), reqparse_extract::ParseError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    config: StorageConfig,
}

impl FileStore {
    /// Creates a store over the given configuration.
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Returns the storage configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Full path of a stored file.
    #[must_use]
    pub fn path_of(&self, generated_name: &str) -> PathBuf {
        self.config.path_of(generated_name)
    }

    /// Saves an optional upload using the configured allow-list.
    ///
    /// Returns `Ok(None)` when the file is absent and not required.
    ///
    /// # Errors
    ///
    /// - `NOT_BLANK` for `field` when the file is absent and required
    /// - `EXTENSION_NOT_ALLOWED` for `field` when sniffing rejects it
    /// - any I/O error from opening, creating or writing
    pub fn save(
        &self,
        file: Option<&UploadedFile>,
        field: &str,
        required: bool,
    ) -> Result<Option<StoredFile>, ParseError> {
        let Some(file) = self.present(file, field, required)? else {
            return Ok(None);
        };

        let mut reader = file.open()?;
        self.write_checked(&mut reader, field, |ext| self.config.allows(ext))
            .map(Some)
    }

    /// Like [`save`](Self::save), with an explicit allow-list.
    ///
    /// # Errors
    ///
    /// Same as [`save`](Self::save).
    pub fn save_with<S: AsRef<str>>(
        &self,
        file: Option<&UploadedFile>,
        field: &str,
        required: bool,
        allowed: &[S],
    ) -> Result<Option<StoredFile>, ParseError> {
        let Some(file) = self.present(file, field, required)? else {
            return Ok(None);
        };

        let mut reader = file.open()?;
        self.write(&mut reader, field, allowed).map(Some)
    }

    /// Applies the required check to an optional upload.
    fn present<'f>(
        &self,
        file: Option<&'f UploadedFile>,
        field: &str,
        required: bool,
    ) -> Result<Option<&'f UploadedFile>, ParseError> {
        match file {
            Some(file) => Ok(Some(file)),
            None if required => {
                reqparse_telemetry::log_field_rejected!(field, ErrorCode::NotBlank);
                Err(ParseError::field(field, ErrorCode::NotBlank))
            }
            None => Ok(None),
        }
    }

    /// Validates and writes any seekable stream.
    ///
    /// # Errors
    ///
    /// - `EXTENSION_NOT_ALLOWED` for `field` when sniffing rejects the stream
    /// - any I/O error from creating the directory or file, or copying
    pub fn write<R, S>(
        &self,
        reader: &mut R,
        field: &str,
        allowed: &[S],
    ) -> Result<StoredFile, ParseError>
    where
        R: Read + Seek,
        S: AsRef<str>,
    {
        self.write_checked(reader, field, |ext| sniff::listed(allowed, ext))
    }

    fn write_checked<R, F>(
        &self,
        reader: &mut R,
        field: &str,
        accepts: F,
    ) -> Result<StoredFile, ParseError>
    where
        R: Read + Seek,
        F: Fn(&str) -> bool,
    {
        let extension = sniff::validate_with(reader, field, accepts)?;

        fs::create_dir_all(&self.config.base_dir)?;

        let (mut dest, generated_name) =
            self.create_exclusive(|| format!("{}{extension}", Uuid::now_v7()))?;

        let bytes = match copy_to(reader, &mut dest) {
            Ok(n) => n,
            Err(err) => {
                drop(dest);
                let path = self.path_of(&generated_name);
                if let Err(cleanup) = fs::remove_file(&path) {
                    tracing::warn!(
                        path = %path.display(),
                        error = %cleanup,
                        "failed to remove partial upload"
                    );
                }
                return Err(err.into());
            }
        };

        reqparse_telemetry::log_file_stored!(field, generated_name, bytes);

        Ok(StoredFile {
            generated_name,
            extension,
        })
    }

    /// Opens a fresh file with create-exclusive semantics.
    ///
    /// A name collision is retried once with a new name; a second collision
    /// is returned as `AlreadyExists`.
    fn create_exclusive(
        &self,
        mut next_name: impl FnMut() -> String,
    ) -> io::Result<(File, String)> {
        let name = next_name();
        match open_new(&self.path_of(&name)) {
            Ok(file) => Ok((file, name)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!(name = %name, "generated name collided, retrying");
                let name = next_name();
                let file = open_new(&self.path_of(&name))?;
                Ok((file, name))
            }
            Err(err) => Err(err),
        }
    }
}

fn open_new(path: &std::path::Path) -> io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Copies the stream to the destination. Hitting EOF early counts as done.
fn copy_to<R: Read>(reader: &mut R, dest: &mut File) -> io::Result<u64> {
    match io::copy(reader, dest) {
        Ok(n) => Ok(n),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
            dest.sync_data()?;
            dest.metadata().map(|m| m.len())
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sniff::tests::{JPEG, PDF, PNG};
    use std::io::{Cursor, SeekFrom};

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(StorageConfig::default().with_base_dir(dir.path()))
    }

    fn upload(data: &'static [u8]) -> UploadedFile {
        UploadedFile::new("avatar", Some("../../etc/passwd".to_string()), None, data)
    }

    #[test]
    fn test_save_writes_file_with_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let stored = store.save(Some(&upload(PNG)), "avatar", true).unwrap().unwrap();

        assert!(stored.generated_name().ends_with(".png"));
        assert_eq!(stored.extension(), ".png");
        let stem = stored.generated_name().trim_end_matches(".png");
        assert!(Uuid::parse_str(stem).is_ok());

        let written = fs::read(store.path_of(stored.generated_name())).unwrap();
        assert_eq!(written, PNG);
    }

    #[test]
    fn test_save_ignores_client_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let stored = store.save(Some(&upload(JPEG)), "avatar", true).unwrap().unwrap();

        assert!(!stored.generated_name().contains("passwd"));
        assert_eq!(stored.extension(), ".jpg");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let a = store.save(Some(&upload(PNG)), "avatar", true).unwrap().unwrap();
        let b = store.save(Some(&upload(PNG)), "avatar", true).unwrap().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_save_absent_required() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let err = store.save(None, "avatar", true).unwrap_err();
        let field = err.as_field().unwrap();
        assert_eq!(field.field(), "avatar");
        assert_eq!(field.code(), ErrorCode::NotBlank);
    }

    #[test]
    fn test_save_absent_optional() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.save(None, "avatar", false).unwrap(), None);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_rejected_extension_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(
            StorageConfig::default()
                .with_base_dir(dir.path().join("nested"))
                .with_allowed_extensions([".png"]),
        );

        let err = store.save(Some(&upload(PDF)), "avatar", true).unwrap_err();
        assert_eq!(err.error_code(), "EXTENSION_NOT_ALLOWED");
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn test_save_with_explicit_allow_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let stored = store
            .save_with(Some(&upload(PDF)), "resume", true, &[".pdf"])
            .unwrap()
            .unwrap();
        assert_eq!(stored.extension(), ".pdf");

        assert!(store
            .save_with(Some(&upload(PNG)), "resume", true, &[".pdf"])
            .is_err());
    }

    #[test]
    fn test_write_creates_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("a").join("b");
        let store = FileStore::new(StorageConfig::default().with_base_dir(&base));

        let stored = store.write(&mut Cursor::new(PNG), "img", &[".png"]).unwrap();
        assert!(base.join(stored.generated_name()).is_file());
    }

    #[test]
    fn test_write_copies_from_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut cursor = Cursor::new(PNG);
        cursor.seek(SeekFrom::Start(5)).unwrap();
        let stored = store.write(&mut cursor, "img", &[".png"]).unwrap();

        assert_eq!(fs::read(store.path_of(stored.generated_name())).unwrap(), PNG);
    }

    #[test]
    fn test_create_exclusive_retries_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(dir.path().join("taken.png"), b"x").unwrap();

        let mut names = vec!["free.png", "taken.png"];
        let (_file, name) = store
            .create_exclusive(|| names.pop().unwrap_or_default().to_string())
            .unwrap();

        assert_eq!(name, "free.png");
        assert_eq!(fs::read(dir.path().join("taken.png")).unwrap(), b"x");
    }

    #[test]
    fn test_create_exclusive_second_collision_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(dir.path().join("taken.png"), b"x").unwrap();

        let err = store
            .create_exclusive(|| "taken.png".to_string())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    /// Fails every read once sniffing has rewound the stream.
    struct FailingReader {
        inner: Cursor<&'static [u8]>,
        kind: io::ErrorKind,
        seeks: usize,
    }

    impl FailingReader {
        fn new(kind: io::ErrorKind) -> Self {
            Self {
                inner: Cursor::new(PNG),
                kind,
                seeks: 0,
            }
        }
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.seeks >= 2 {
                return Err(io::Error::new(self.kind, "boom"));
            }
            self.inner.read(buf)
        }
    }

    impl Seek for FailingReader {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.seeks += 1;
            self.inner.seek(pos)
        }
    }

    #[test]
    fn test_write_failure_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut reader = FailingReader::new(io::ErrorKind::Other);

        let err = store.write(&mut reader, "img", &[".png"]).unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_unexpected_eof_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut reader = FailingReader::new(io::ErrorKind::UnexpectedEof);

        let stored = store.write(&mut reader, "img", &[".png"]).unwrap();
        assert!(store.path_of(stored.generated_name()).is_file());
    }

    #[test]
    fn test_save_default_list_accepts_csv_and_office_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut docx = b"PK\x03\x04".to_vec();
        docx.resize(0x1E, 0);
        docx.extend_from_slice(b"word/document.xml");
        docx.resize(96, 0);

        let csv = UploadedFile::new("report", None, None, &b"sku,qty\nA-1,2\nB-7,1\n"[..]);
        let doc = UploadedFile::new("report", None, None, docx);

        let csv = store.save(Some(&csv), "report", true).unwrap().unwrap();
        let doc = store.save(Some(&doc), "report", true).unwrap().unwrap();

        assert_eq!(csv.extension(), ".csv");
        assert_eq!(doc.extension(), ".docx");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
