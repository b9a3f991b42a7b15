use crate::combinators::seq_first;
use crate::error::ParseError;
use crate::parser::Parser;
use crate::primitives::eof;
use crate::state::State;
use std::io::{Read, Seek};

/// Runs `parser` over in-memory text.
///
/// Trailing input after a successful parse is allowed; see `parse_complete`.
///
/// # Errors
/// Returns `ParseError::Failed`, pointing into `text`, if the parser fails.
pub fn parse_str<T>(parser: &Parser<T>, text: &str, name: &str) -> Result<T, ParseError> {
    let mut state = State::from_text(text);
    parser
        .parse(&mut state)
        .map_err(|trace| ParseError::from_trace(trace, name, text))
}

/// Runs `parser` over in-memory text and requires it to consume all of it.
///
/// # Errors
/// Returns `ParseError::Failed` if the parser fails or input remains.
pub fn parse_complete<T: 'static>(
    parser: &Parser<T>,
    text: &str,
    name: &str,
) -> Result<T, ParseError> {
    parse_str(&seq_first(parser, &eof()), text, name)
}

/// Runs `parser` over a seekable stream, re-reading from the stream on every
/// character.
///
/// # Errors
/// Returns `ParseError::Detached` if the parser fails; stream sources keep no
/// text to point into.
pub fn parse_reader<T, R>(parser: &Parser<T>, reader: R) -> Result<T, ParseError>
where
    R: Read + Seek + Send + 'static,
{
    let mut state = State::from_stream(reader);
    parser
        .parse(&mut state)
        .map_err(|trace| ParseError::Detached { trace })
}

/// Like `parse_reader`, but reads through a buffer.
///
/// # Errors
/// Returns `ParseError::Detached` if the parser fails.
pub fn parse_buffered<T, R>(parser: &Parser<T>, reader: R) -> Result<T, ParseError>
where
    R: Read + Seek + Send + 'static,
{
    let mut state = State::from_buffered(reader);
    parser
        .parse(&mut state)
        .map_err(|trace| ParseError::Detached { trace })
}
