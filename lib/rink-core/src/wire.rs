//! Serialized parameter values.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;

/// A parameter value after serialization through its data type.
#[derive(Debug)]
pub enum WireValue {
    /// A structured value; rendered as text outside JSON bodies.
    Json(Value),
    /// An open file, read by the transport when the body is sent.
    File(FileStream),
}

impl WireValue {
    /// Text form of the value, or `None` for files.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Json(value) => Some(text_of(value)),
            Self::File(_) => None,
        }
    }

    /// The structured value, or `None` for files.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::File(_) => None,
        }
    }

    /// The file stream, or `None` for structured values.
    #[must_use]
    pub const fn as_file(&self) -> Option<&FileStream> {
        match self {
            Self::Json(_) => None,
            Self::File(stream) => Some(stream),
        }
    }
}

impl From<Value> for WireValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<FileStream> for WireValue {
    fn from(stream: FileStream) -> Self {
        Self::File(stream)
    }
}

/// Text form of a JSON value.
///
/// Strings are taken verbatim, scalars use their JSON spelling and
/// containers are rendered as compact JSON.
#[must_use]
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// An open file whose content is read lazily.
///
/// The handle is opened when the parameter is serialized, so a bad path fails
/// the call before anything is sent. Dropping the stream closes the file.
#[derive(Debug)]
pub struct FileStream {
    path: PathBuf,
    file: File,
}

impl FileStream {
    /// Open the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from opening the file.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        Ok(Self { path, file })
    }

    /// Path the stream was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last component of the path, used as the multipart filename.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| "file".to_string(), |name| name.to_string_lossy().into_owned())
    }

    /// Consume into the underlying file handle.
    #[must_use]
    pub fn into_file(self) -> File {
        self.file
    }
}

impl Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}
