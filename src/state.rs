use crate::error::{SourceError, StateError};
use crate::meta::MetaId;
use crate::source::{Buffered, Source, Stream, Text};
use std::fmt;
use std::io::{Read, Seek};
use std::sync::Arc;

/// A saved cursor and failure status. Cheap to take and to restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    cursor: usize,
    failure: Option<MetaId>,
}

impl Snapshot {
    pub fn position(&self) -> usize {
        self.cursor
    }
}

/// The input position threaded through a parse.
///
/// Cloning copies the cursor and failure status and shares the source.
#[derive(Clone)]
pub struct State {
    source: Arc<dyn Source>,
    cursor: usize,
    failure: Option<MetaId>,
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("cursor", &self.cursor)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl State {
    pub fn new(source: impl Source + 'static) -> Self {
        Self::from_shared(Arc::new(source))
    }

    /// Starts a fresh state over a source that may already be in use elsewhere.
    pub fn from_shared(source: Arc<dyn Source>) -> Self {
        Self {
            source,
            cursor: 0,
            failure: None,
        }
    }

    pub fn from_text(text: impl Into<Arc<str>>) -> Self {
        Self::new(Text::new(text))
    }

    pub fn from_stream<R: Read + Seek + Send + 'static>(reader: R) -> Self {
        Self::new(Stream::new(reader))
    }

    pub fn from_buffered<R: Read + Seek + Send + 'static>(reader: R) -> Self {
        Self::new(Buffered::new(reader))
    }

    pub fn source(&self) -> &Arc<dyn Source> {
        &self.source
    }

    /// The full input, for in-memory sources.
    pub fn text(&self) -> Option<&str> {
        self.source.text()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Consumes one character.
    pub fn advance(&mut self) -> Result<char, StateError> {
        match self.source.char_at(self.cursor)? {
            Some((c, width)) => {
                self.cursor += width;
                Ok(c)
            }
            None => Err(StateError::EndOfInput {
                offset: self.cursor,
            }),
        }
    }

    pub fn peek(&self) -> Result<Option<char>, SourceError> {
        Ok(self.source.char_at(self.cursor)?.map(|(c, _)| c))
    }

    pub fn at_end(&self) -> Result<bool, SourceError> {
        Ok(self.peek()?.is_none())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cursor: self.cursor,
            failure: self.failure,
        }
    }

    /// Resets cursor and failure status to a saved point.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.cursor = snapshot.cursor;
        self.failure = snapshot.failure;
    }

    /// Moves the cursor back to a saved point, keeping any recorded failure.
    pub fn rewind(&mut self, snapshot: Snapshot) {
        self.cursor = snapshot.cursor;
    }

    /// Records the failing parser. The first failure recorded wins; returns
    /// whether this call was the one that recorded it.
    pub fn mark_failed(&mut self, id: MetaId) -> bool {
        if self.failure.is_some() {
            return false;
        }
        self.failure = Some(id);
        true
    }

    pub fn has_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failed_by(&self) -> Option<MetaId> {
        self.failure
    }
}
