use crate::meta::{Kind, Meta, MetaId};
use crate::utils::line_and_column;
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt::{self, Display};
use std::sync::Arc;
use thiserror::Error;

/// Failure of an input backend to produce a character.
#[derive(Error, Debug, Diagnostic)]
pub enum SourceError {
    #[error("I/O error while reading input")]
    #[diagnostic(code(strand::source_io))]
    Io(#[from] std::io::Error),

    #[error("Invalid UTF-8 at byte offset {offset}")]
    #[diagnostic(
        code(strand::invalid_utf8),
        help("Sources are decoded as UTF-8; the bytes at this offset do not start a valid character.")
    )]
    InvalidUtf8 { offset: usize },

    #[error("Input source lock was poisoned")]
    #[diagnostic(code(strand::source_poisoned))]
    Poisoned,
}

/// Failure of `State::advance`.
#[derive(Error, Debug, Diagnostic)]
pub enum StateError {
    #[error("Unexpected end of input at byte offset {offset}")]
    #[diagnostic(code(strand::end_of_input))]
    EndOfInput { offset: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),
}

/// Why the innermost parser gave up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cause {
    /// A character was required but the input was exhausted.
    EndOfInput,
    /// The next character did not satisfy a predicate. `found` is `None` at end of input.
    PredicateNotMatched { found: Option<char> },
    LiteralMismatch { expected: char, found: Option<char> },
    /// A `try_map` function refused the value.
    Rejected { reason: String },
    /// `eof` found more input.
    ExpectedEnd { found: char },
    /// `fail` was invoked.
    Explicit,
    /// A recursive parser was run without its definition.
    Unbound,
    /// The input backend failed.
    Source { message: String },
}

impl Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::EndOfInput => f.write_str("unexpected end of input"),
            Cause::PredicateNotMatched { found: Some(c) } => write!(f, "unexpected {c:?}"),
            Cause::PredicateNotMatched { found: None } => f.write_str("unexpected end of input"),
            Cause::LiteralMismatch {
                expected,
                found: Some(c),
            } => write!(f, "expected {expected:?}, found {c:?}"),
            Cause::LiteralMismatch {
                expected,
                found: None,
            } => write!(f, "expected {expected:?}, found end of input"),
            Cause::Rejected { reason } => write!(f, "rejected: {reason}"),
            Cause::ExpectedEnd { found } => write!(f, "expected end of input, found {found:?}"),
            Cause::Explicit => f.write_str("explicit failure"),
            Cause::Unbound => f.write_str("recursive parser used outside its definition"),
            Cause::Source { message } => write!(f, "input error: {message}"),
        }
    }
}

impl From<StateError> for Cause {
    fn from(err: StateError) -> Self {
        match err {
            StateError::EndOfInput { .. } => Cause::EndOfInput,
            StateError::Source(e) => Cause::Source {
                message: e.to_string(),
            },
        }
    }
}

impl From<SourceError> for Cause {
    fn from(err: SourceError) -> Self {
        Cause::Source {
            message: err.to_string(),
        }
    }
}

/// One failed parser: where it started trying, and which parser it was.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    position: usize,
    meta: Arc<Meta>,
}

impl TraceEntry {
    pub(crate) fn new(position: usize, meta: Arc<Meta>) -> Self {
        Self { position, meta }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn id(&self) -> MetaId {
        self.meta.id()
    }

    pub fn kind(&self) -> Kind {
        self.meta.kind()
    }

    pub fn label(&self) -> Option<&str> {
        self.meta.label()
    }

    pub fn meta(&self) -> &Arc<Meta> {
        &self.meta
    }
}

impl Serialize for TraceEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("TraceEntry", 4)?;
        s.serialize_field("position", &self.position)?;
        s.serialize_field("id", &self.meta.id())?;
        s.serialize_field("kind", &self.meta.kind())?;
        s.serialize_field("label", &self.meta.label())?;
        s.end()
    }
}

/// The chain of parsers that failed, innermost first.
///
/// Entries are only ever appended: each enclosing parser adds itself after
/// its child, so `entries()[0]` is the deepest attempted match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureTrace {
    cause: Cause,
    entries: Vec<TraceEntry>,
}

impl FailureTrace {
    pub fn new(cause: Cause) -> Self {
        Self {
            cause,
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn cause(&self) -> &Cause {
        &self.cause
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn deepest(&self) -> Option<&TraceEntry> {
        self.entries.first()
    }

    pub fn outermost(&self) -> Option<&TraceEntry> {
        self.entries.last()
    }

    /// Where the deepest failing parser started.
    pub fn position(&self) -> usize {
        self.deepest().map_or(0, TraceEntry::position)
    }

    pub fn contains(&self, id: MetaId) -> bool {
        self.entries.iter().any(|e| e.id() == id)
    }

    /// The nearest labelled parser, searching outwards from the deepest one.
    pub fn expected(&self) -> String {
        self.entries
            .iter()
            .find_map(|e| e.label().map(str::to_string))
            .or_else(|| self.deepest().map(|e| e.kind().to_string()))
            .unwrap_or_else(|| "input".to_string())
    }

    /// One line per entry with line/column positions resolved against `text`.
    pub fn render(&self, text: &str) -> String {
        let mut out = format!("{}\n", self.cause);
        for entry in &self.entries {
            let (line, column) = line_and_column(text, entry.position);
            out.push_str(&format!("  at {line}:{column} in {}\n", entry.meta.describe()));
        }
        out
    }

    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Display for FailureTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)?;
        // Backend messages carry their own offset where one is known.
        if !matches!(self.cause, Cause::Source { .. }) {
            write!(f, " at byte offset {}", self.position())?;
        }
        if let Some(deepest) = self.deepest() {
            write!(f, " in {}", deepest.meta().describe())?;
        }
        Ok(())
    }
}

impl std::error::Error for FailureTrace {}

impl From<Cause> for FailureTrace {
    fn from(cause: Cause) -> Self {
        Self::new(cause)
    }
}

impl From<StateError> for FailureTrace {
    fn from(err: StateError) -> Self {
        Self::new(err.into())
    }
}

impl From<SourceError> for FailureTrace {
    fn from(err: SourceError) -> Self {
        Self::new(err.into())
    }
}

/// A failed top-level parse, ready for rendering with `miette`.
#[derive(Error, Debug, Diagnostic)]
pub enum ParseError {
    #[error("Parse failed: {cause}")]
    #[diagnostic(
        code(strand::parse_failed),
        help("The innermost failing parser is labelled; the full chain is in the failure trace.")
    )]
    Failed {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected {expected}")]
        span: SourceSpan,
        expected: String,
        cause: Cause,
        trace: FailureTrace,
    },

    #[error("Parse failed: {trace}")]
    #[diagnostic(code(strand::parse_failed_stream))]
    Detached { trace: FailureTrace },
}

impl ParseError {
    /// Attaches the source text so the failure can point into it.
    pub fn from_trace(trace: FailureTrace, name: &str, text: &str) -> Self {
        let position = trace.position().min(text.len());
        let width = text
            .get(position..)
            .and_then(|rest| rest.chars().next())
            .map_or(0, char::len_utf8);
        ParseError::Failed {
            src: NamedSource::new(name, text.to_string()),
            span: (position, width).into(),
            expected: trace.expected(),
            cause: trace.cause().clone(),
            trace,
        }
    }

    pub fn trace(&self) -> &FailureTrace {
        match self {
            ParseError::Failed { trace, .. } | ParseError::Detached { trace } => trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(position: usize, label: Option<&str>, kind: Kind) -> TraceEntry {
        TraceEntry::new(position, Meta::new(kind, label.map(str::to_string), vec![]))
    }

    #[test]
    fn test_trace_order_and_expected() {
        let mut trace = FailureTrace::new(Cause::PredicateNotMatched { found: Some('x') });
        trace.push(entry(3, None, Kind::Primitive));
        trace.push(entry(2, Some("number"), Kind::Repeat));
        trace.push(entry(0, None, Kind::Sequence));

        assert_eq!(trace.position(), 3);
        assert_eq!(trace.outermost().unwrap().position(), 0);
        assert_eq!(trace.expected(), "number");
    }

    #[test]
    fn test_expected_falls_back_to_kind() {
        let mut trace = FailureTrace::new(Cause::EndOfInput);
        trace.push(entry(0, None, Kind::Choice));
        assert_eq!(trace.expected(), "choice");
    }

    #[test]
    fn test_render_resolves_lines() {
        let mut trace = FailureTrace::new(Cause::EndOfInput);
        trace.push(entry(4, Some("digit"), Kind::Primitive));
        let rendered = trace.render("ab\ncd");
        assert!(rendered.starts_with("unexpected end of input"));
        assert!(rendered.contains("at 2:2 in digit#"));
    }

    #[test]
    fn test_parse_error_span() {
        let mut trace = FailureTrace::new(Cause::LiteralMismatch {
            expected: 'b',
            found: Some('c'),
        });
        trace.push(entry(1, Some("'b'"), Kind::Primitive));
        match ParseError::from_trace(trace, "test.txt", "ac") {
            ParseError::Failed { span, expected, .. } => {
                assert_eq!(span.offset(), 1);
                assert_eq!(span.len(), 1);
                assert_eq!(expected, "'b'");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display_names_the_offset_once() {
        let mut trace = FailureTrace::from(SourceError::InvalidUtf8 { offset: 1 });
        trace.push(entry(1, Some("item"), Kind::Primitive));
        let shown = trace.to_string();
        assert_eq!(shown.matches("byte offset").count(), 1, "{shown}");
        assert!(shown.starts_with("input error: Invalid UTF-8 at byte offset 1 in item#"));

        let mut trace = FailureTrace::new(Cause::EndOfInput);
        trace.push(entry(3, Some("digit"), Kind::Primitive));
        assert!(trace
            .to_string()
            .starts_with("unexpected end of input at byte offset 3 in digit#"));
    }

    #[test]
    fn test_trace_json() {
        let mut trace = FailureTrace::new(Cause::Explicit);
        trace.push(entry(0, Some("never"), Kind::Primitive));
        let json = trace.to_json().unwrap();
        assert!(json.contains("\"type\": \"explicit\""));
        assert!(json.contains("\"label\": \"never\""));
    }
}
