use crate::error::SourceError;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex};

/// Anything that can hand out the character starting at a byte offset.
///
/// Offsets are byte offsets. `char_at` returns the decoded character together
/// with its UTF-8 width, or `None` once the offset reaches the end. Seeking must
/// not depend on the length of the input already consumed.
pub trait Source: Send + Sync {
    fn char_at(&self, offset: usize) -> Result<Option<(char, usize)>, SourceError>;

    /// The full text, when the source keeps it in memory.
    fn text(&self) -> Option<&str> {
        None
    }
}

/// A fixed in-memory text buffer.
#[derive(Debug, Clone)]
pub struct Text {
    text: Arc<str>,
}

impl Text {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }
}

impl Source for Text {
    fn char_at(&self, offset: usize) -> Result<Option<(char, usize)>, SourceError> {
        if offset >= self.text.len() {
            return Ok(None);
        }
        match self.text.get(offset..) {
            Some(rest) => Ok(rest.chars().next().map(|c| (c, c.len_utf8()))),
            None => Err(SourceError::InvalidUtf8 { offset }),
        }
    }

    fn text(&self) -> Option<&str> {
        Some(&*self.text)
    }
}

/// A seekable stream, re-positioned on every read.
pub struct Stream<R> {
    inner: Mutex<R>,
}

impl<R: Read + Seek + Send> Stream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: Mutex::new(reader),
        }
    }
}

impl<R: Read + Seek + Send> Source for Stream<R> {
    fn char_at(&self, offset: usize) -> Result<Option<(char, usize)>, SourceError> {
        let mut reader = self.inner.lock().map_err(|_| SourceError::Poisoned)?;
        reader.seek(SeekFrom::Start(offset as u64))?;
        let (decoded, _) = read_char(&mut *reader, offset)?;
        Ok(decoded)
    }
}

struct BufferedInner<R> {
    reader: BufReader<R>,
    // `None` once a failed read or seek has left the reader somewhere unknown.
    pos: Option<u64>,
}

/// A buffered seekable stream.
///
/// The reader position is tracked so that moving to a nearby offset is a
/// relative seek, which keeps sequential advances inside the buffer. After a
/// failed read the position is re-established with an absolute seek.
pub struct Buffered<R> {
    inner: Mutex<BufferedInner<R>>,
}

impl<R: Read + Seek + Send> Buffered<R> {
    pub fn new(reader: R) -> Self {
        Self::with_reader(BufReader::new(reader))
    }

    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self::with_reader(BufReader::with_capacity(capacity, reader))
    }

    fn with_reader(mut reader: BufReader<R>) -> Self {
        // The caller may hand us a reader that is not at the start.
        let pos = reader.stream_position().ok();
        Self {
            inner: Mutex::new(BufferedInner { reader, pos }),
        }
    }
}

impl<R: Read + Seek + Send> Source for Buffered<R> {
    fn char_at(&self, offset: usize) -> Result<Option<(char, usize)>, SourceError> {
        let mut inner = self.inner.lock().map_err(|_| SourceError::Poisoned)?;
        let target = offset as u64;
        match inner.pos.take() {
            Some(pos) if pos == target => {}
            Some(pos) => inner.reader.seek_relative(target as i64 - pos as i64)?,
            None => {
                inner.reader.seek(SeekFrom::Start(target))?;
            }
        }
        let (decoded, read) = read_char(&mut inner.reader, offset)?;
        inner.pos = Some(target + read as u64);
        Ok(decoded)
    }
}

fn utf8_width(first: u8) -> Option<usize> {
    match first {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Decodes one character from the reader's current position. Also returns
/// the number of bytes pulled from the reader.
fn read_char<R: Read>(
    reader: &mut R,
    offset: usize,
) -> Result<(Option<(char, usize)>, usize), SourceError> {
    let mut buf = [0u8; 4];
    if fill(reader, &mut buf[..1])? == 0 {
        return Ok((None, 0));
    }
    let width = utf8_width(buf[0]).ok_or(SourceError::InvalidUtf8 { offset })?;
    let rest = fill(reader, &mut buf[1..width])?;
    if rest + 1 < width {
        return Err(SourceError::InvalidUtf8 { offset });
    }
    let decoded = std::str::from_utf8(&buf[..width])
        .ok()
        .and_then(|s| s.chars().next())
        .ok_or(SourceError::InvalidUtf8 { offset })?;
    Ok((Some((decoded, width)), width))
}
