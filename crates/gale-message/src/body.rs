//! Request body stream
//!
//! A read-once byte stream over a [`BodySource`]. The source is opened on the
//! first read, never during construction, because some sources (stdin) can
//! only be consumed once per process. Everything read is cached, so the full
//! body stays available after partial reads.

use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

/// Chunk size used when draining the source
const READ_CHUNK: usize = 8 * 1024;

/// Where body bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
    /// No body
    Empty,
    /// In-memory bytes
    Memory(Bytes),
    /// File on disk
    File(PathBuf),
    /// Process standard input (the CGI request body)
    Stdin,
}

impl BodySource {
    /// Identity reported for diagnostics
    pub fn origin(&self) -> String {
        match self {
            BodySource::Empty => "empty".to_string(),
            BodySource::Memory(_) => "memory".to_string(),
            BodySource::File(path) => path.display().to_string(),
            BodySource::Stdin => "stdin".to_string(),
        }
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(match self {
            BodySource::Empty => Box::new(io::empty()),
            BodySource::Memory(bytes) => Box::new(Cursor::new(bytes.clone())),
            BodySource::File(path) => Box::new(File::open(path)?),
            BodySource::Stdin => Box::new(io::stdin()),
        })
    }
}

impl Default for BodySource {
    fn default() -> Self {
        BodySource::Empty
    }
}

struct State {
    source: BodySource,
    reader: Option<Box<dyn Read + Send>>,
    cache: BytesMut,
    position: u64,
    eof: bool,
    closed: bool,
}

impl State {
    fn reader(&mut self) -> Result<&mut Box<dyn Read + Send>> {
        if self.closed {
            return Err(Error::StreamClosed(self.source.origin()));
        }
        if self.reader.is_none() {
            self.reader = Some(self.source.open()?);
        }
        match self.reader.as_mut() {
            Some(reader) => Ok(reader),
            None => Err(Error::StreamClosed(self.source.origin())),
        }
    }

    fn read(&mut self, len: usize) -> Result<Bytes> {
        if self.eof || len == 0 {
            self.reader()?;
            return Ok(Bytes::new());
        }
        let mut buf = vec![0u8; len.min(READ_CHUNK)];
        let n = self.reader()?.read(&mut buf)?;
        buf.truncate(n);
        if n == 0 {
            self.eof = true;
        }
        self.position += n as u64;
        self.cache.extend_from_slice(&buf);
        Ok(Bytes::from(buf))
    }

    fn drain(&mut self) -> Result<Bytes> {
        let mut rest = BytesMut::new();
        while !self.eof {
            let chunk = self.read(READ_CHUNK)?;
            rest.extend_from_slice(&chunk);
        }
        Ok(rest.freeze())
    }
}

/// Body stream handle
///
/// Clones share the same underlying stream.
#[derive(Clone)]
pub struct Body {
    state: Arc<Mutex<State>>,
}

impl Body {
    pub fn new(source: BodySource) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                source,
                reader: None,
                cache: BytesMut::new(),
                position: 0,
                eof: false,
                closed: false,
            })),
        }
    }

    pub fn empty() -> Self {
        Self::new(BodySource::Empty)
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(BodySource::Memory(bytes.into()))
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(BodySource::File(path.into()))
    }

    pub fn stdin() -> Self {
        Self::new(BodySource::Stdin)
    }

    /// Diagnostic identity of the source (`stdin`, a path, `memory`, `empty`)
    pub fn origin(&self) -> String {
        self.state.lock().source.origin()
    }

    /// Read up to `len` bytes, at most one chunk per call
    pub fn read(&self, len: usize) -> Result<Bytes> {
        self.state.lock().read(len)
    }

    /// Remaining, not yet read bytes
    pub fn contents(&self) -> Result<Bytes> {
        self.state.lock().drain()
    }

    /// Whole body, including bytes already consumed by earlier reads
    pub fn full_contents(&self) -> Result<Bytes> {
        let mut state = self.state.lock();
        state.drain()?;
        Ok(Bytes::copy_from_slice(&state.cache))
    }

    /// Whole body as text, replacing invalid UTF-8
    pub fn to_string_lossy(&self) -> Result<String> {
        let bytes = self.full_contents()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn eof(&self) -> bool {
        self.state.lock().eof
    }

    /// Bytes consumed so far
    pub fn tell(&self) -> Result<u64> {
        let state = self.state.lock();
        if state.closed {
            return Err(Error::StreamClosed(state.source.origin()));
        }
        Ok(state.position)
    }

    /// Size when knowable without reading
    pub fn size(&self) -> Option<u64> {
        let state = self.state.lock();
        if state.closed {
            return None;
        }
        match &state.source {
            BodySource::Empty => Some(0),
            BodySource::Memory(bytes) => Some(bytes.len() as u64),
            BodySource::File(path) => std::fs::metadata(path).ok().map(|m| m.len()),
            BodySource::Stdin => None,
        }
    }

    pub fn is_readable(&self) -> bool {
        !self.state.lock().closed
    }

    pub fn is_writable(&self) -> bool {
        false
    }

    pub fn close(&self) {
        let mut state = self.state.lock();
        state.reader = None;
        state.closed = true;
    }

    /// Both handles refer to the same stream
    pub fn same_stream(&self, other: &Body) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Body")
            .field("origin", &state.source.origin())
            .field("position", &state.position)
            .field("eof", &state.eof)
            .field("closed", &state.closed)
            .finish()
    }
}
