//! Uploaded file descriptors and the uploaded-file tree

use crate::value::Key;
use crate::{Body, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Upload status codes as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadError {
    Ok,
    IniSize,
    FormSize,
    Partial,
    NoFile,
    NoTmpDir,
    CantWrite,
    Extension,
}

impl UploadError {
    /// Map a numeric status code (0, 1, 2, 3, 4, 6, 7, 8)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(UploadError::Ok),
            1 => Some(UploadError::IniSize),
            2 => Some(UploadError::FormSize),
            3 => Some(UploadError::Partial),
            4 => Some(UploadError::NoFile),
            6 => Some(UploadError::NoTmpDir),
            7 => Some(UploadError::CantWrite),
            8 => Some(UploadError::Extension),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            UploadError::Ok => 0,
            UploadError::IniSize => 1,
            UploadError::FormSize => 2,
            UploadError::Partial => 3,
            UploadError::NoFile => 4,
            UploadError::NoTmpDir => 6,
            UploadError::CantWrite => 7,
            UploadError::Extension => 8,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            UploadError::Ok => "There is no error, the file uploaded with success",
            UploadError::IniSize => "The uploaded file exceeds the server's maximum upload size",
            UploadError::FormSize => "The uploaded file exceeds the MAX_FILE_SIZE of the form",
            UploadError::Partial => "The uploaded file was only partially uploaded",
            UploadError::NoFile => "No file was uploaded",
            UploadError::NoTmpDir => "Missing a temporary folder",
            UploadError::CantWrite => "Failed to write file to disk",
            UploadError::Extension => "A server extension stopped the file upload",
        }
    }
}

/// Where an uploaded file's bytes live
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Temporary location written by the server
    Path(PathBuf),
    /// Already-open stream
    Stream(Body),
}

impl From<PathBuf> for FileSource {
    fn from(path: PathBuf) -> Self {
        FileSource::Path(path)
    }
}

impl From<&str> for FileSource {
    fn from(path: &str) -> Self {
        FileSource::Path(PathBuf::from(path))
    }
}

impl From<String> for FileSource {
    fn from(path: String) -> Self {
        FileSource::Path(PathBuf::from(path))
    }
}

impl From<Body> for FileSource {
    fn from(body: Body) -> Self {
        FileSource::Stream(body)
    }
}

/// A single uploaded file
///
/// Clones share the moved state.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    source: FileSource,
    size: Option<u64>,
    error: UploadError,
    client_filename: Option<String>,
    client_media_type: Option<String>,
    moved: Arc<AtomicBool>,
}

impl UploadedFile {
    pub fn new(
        source: impl Into<FileSource>,
        size: Option<u64>,
        error: UploadError,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> Self {
        Self {
            source: source.into(),
            size,
            error,
            client_filename,
            client_media_type,
            moved: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Construct from a raw status code
    pub fn with_code(
        source: impl Into<FileSource>,
        size: Option<u64>,
        code: i64,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> Result<Self> {
        let error = UploadError::from_code(code).ok_or_else(|| {
            Error::InvalidUploadedFile(format!("unknown upload error code {}", code))
        })?;
        Ok(Self::new(source, size, error, client_filename, client_media_type))
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn error(&self) -> UploadError {
        self.error
    }

    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    pub fn client_media_type(&self) -> Option<&str> {
        self.client_media_type.as_deref()
    }

    /// Temporary location, for path-backed uploads
    pub fn location(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Path(path) => Some(path),
            FileSource::Stream(_) => None,
        }
    }

    pub fn is_moved(&self) -> bool {
        self.moved.load(Ordering::Acquire)
    }

    /// Stream over the uploaded bytes
    pub fn stream(&self) -> Result<Body> {
        self.ensure_usable()?;
        Ok(match &self.source {
            FileSource::Path(path) => Body::from_file(path.clone()),
            FileSource::Stream(body) => body.clone(),
        })
    }

    /// Move the upload to `target`; allowed once
    pub fn move_to(&self, target: impl AsRef<Path>) -> Result<()> {
        self.ensure_usable()?;
        let target = target.as_ref();
        match &self.source {
            FileSource::Path(path) => {
                if fs::rename(path, target).is_err() {
                    // Cross-device moves cannot rename
                    fs::copy(path, target)?;
                    fs::remove_file(path)?;
                }
            }
            FileSource::Stream(body) => {
                fs::write(target, body.full_contents()?)?;
                body.close();
            }
        }
        self.moved.store(true, Ordering::Release);
        tracing::debug!(destination = %target.display(), "uploaded file moved");
        Ok(())
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.error != UploadError::Ok {
            return Err(Error::InvalidUploadedFile(self.error.description().to_string()));
        }
        if self.is_moved() {
            return Err(Error::AlreadyMoved);
        }
        Ok(())
    }
}

/// Node of the uploaded-file tree
#[derive(Debug, Clone)]
pub enum FileNode {
    File(UploadedFile),
    Group(FileTree),
}

impl FileNode {
    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            FileNode::File(file) => Some(file),
            FileNode::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&FileTree> {
        match self {
            FileNode::Group(tree) => Some(tree),
            FileNode::File(_) => None,
        }
    }

    /// Child of a group node
    pub fn get(&self, key: impl Into<Key>) -> Option<&FileNode> {
        self.as_group().and_then(|tree| tree.get(key))
    }
}

/// Keyed, ordered collection of uploaded files, nested to any depth
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    entries: Vec<(Key, FileNode)>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<&FileNode> {
        let key = key.into();
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, n)| n)
    }

    /// Leaf at `path`, descending through groups
    pub fn file<K: Into<Key>>(&self, path: impl IntoIterator<Item = K>) -> Option<&UploadedFile> {
        let mut keys = path.into_iter();
        let mut node = self.get(keys.next()?)?;
        for key in keys {
            node = node.get(key)?;
        }
        node.as_file()
    }

    pub fn insert(&mut self, key: impl Into<Key>, node: FileNode) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = node,
            None => self.entries.push((key, node)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &FileNode)> {
        self.entries.iter().map(|(k, n)| (k, n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of leaves at any depth
    pub fn file_count(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, node)| match node {
                FileNode::File(_) => 1,
                FileNode::Group(tree) => tree.file_count(),
            })
            .sum()
    }
}

impl FromIterator<UploadedFile> for FileTree {
    fn from_iter<I: IntoIterator<Item = UploadedFile>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .enumerate()
                .map(|(i, file)| (Key::Index(i), FileNode::File(file)))
                .collect(),
        }
    }
}
