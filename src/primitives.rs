//! Primitive parsers.
//!
//! Parameterless primitives are built once per process and handed out as
//! clones, so every use of `digit()` shares one identity in failure traces.

use crate::alg::string_of_chars;
use crate::combinators::{many, or, seq, seq_second, some};
use crate::error::{Cause, FailureTrace, StateError};
use crate::meta::Kind;
use crate::parser::Parser;
use std::sync::{Arc, OnceLock};

fn cached<T: 'static>(
    cell: &'static OnceLock<Parser<T>>,
    init: impl FnOnce() -> Parser<T>,
) -> Parser<T> {
    cell.get_or_init(init).clone()
}

/// One character satisfying `pred`.
pub fn satisfy<F>(pred: F, label: impl Into<String>) -> Parser<char>
where
    F: Fn(char) -> bool + Send + Sync + 'static,
{
    Parser::build(Kind::Primitive, Some(label.into()), vec![], move |state| {
        match state.advance() {
            Ok(c) if pred(c) => Ok(c),
            Ok(c) => Err(Cause::PredicateNotMatched { found: Some(c) }.into()),
            Err(StateError::EndOfInput { .. }) => {
                Err(Cause::PredicateNotMatched { found: None }.into())
            }
            Err(e) => Err(e.into()),
        }
    })
}

/// Any one character.
pub fn item() -> Parser<char> {
    static P: OnceLock<Parser<char>> = OnceLock::new();
    cached(&P, || {
        Parser::build(Kind::Primitive, Some("item".to_string()), vec![], |state| {
            Ok(state.advance()?)
        })
    })
}

/// Succeeds with `value` without consuming input.
pub fn succeed<T: Clone + Send + Sync + 'static>(value: T) -> Parser<T> {
    Parser::build(Kind::Primitive, Some("succeed".to_string()), vec![], move |_| {
        Ok(value.clone())
    })
}

/// Always fails.
pub fn fail<T: 'static>(label: impl Into<String>) -> Parser<T> {
    Parser::build(Kind::Primitive, Some(label.into()), vec![], |_| {
        Err(FailureTrace::new(Cause::Explicit))
    })
}

/// Succeeds only at the end of the input.
pub fn eof() -> Parser<()> {
    static P: OnceLock<Parser<()>> = OnceLock::new();
    cached(&P, || {
        Parser::build(Kind::Primitive, Some("end of input".to_string()), vec![], |state| {
            match state.peek()? {
                Some(found) => Err(Cause::ExpectedEnd { found }.into()),
                None => Ok(()),
            }
        })
    })
}

pub fn digit() -> Parser<char> {
    static P: OnceLock<Parser<char>> = OnceLock::new();
    cached(&P, || satisfy(|c| c.is_ascii_digit(), "digit"))
}

pub fn lower() -> Parser<char> {
    static P: OnceLock<Parser<char>> = OnceLock::new();
    cached(&P, || satisfy(|c| c.is_ascii_lowercase(), "lower"))
}

pub fn upper() -> Parser<char> {
    static P: OnceLock<Parser<char>> = OnceLock::new();
    cached(&P, || satisfy(|c| c.is_ascii_uppercase(), "upper"))
}

pub fn letter() -> Parser<char> {
    static P: OnceLock<Parser<char>> = OnceLock::new();
    cached(&P, || satisfy(|c| c.is_ascii_alphabetic(), "letter"))
}

pub fn alphanum() -> Parser<char> {
    static P: OnceLock<Parser<char>> = OnceLock::new();
    cached(&P, || satisfy(|c| c.is_ascii_alphanumeric(), "alphanum"))
}

pub fn space() -> Parser<char> {
    static P: OnceLock<Parser<char>> = OnceLock::new();
    cached(&P, || satisfy(|c| c.is_ascii_whitespace(), "space"))
}

pub fn spaces() -> Parser<Vec<char>> {
    static P: OnceLock<Parser<Vec<char>>> = OnceLock::new();
    cached(&P, || many(&space(), 0).labelled("spaces"))
}

/// Exactly the character `expected`.
pub fn char_match(expected: char) -> Parser<char> {
    Parser::build(Kind::Primitive, Some(format!("{expected:?}")), vec![], move |state| {
        match state.advance() {
            Ok(c) if c == expected => Ok(c),
            Ok(c) => Err(Cause::LiteralMismatch {
                expected,
                found: Some(c),
            }
            .into()),
            Err(StateError::EndOfInput { .. }) => Err(Cause::LiteralMismatch {
                expected,
                found: None,
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    })
}

/// Exactly the text `expected`, failing at the first character that differs
/// or is missing.
pub fn string_match(expected: impl Into<String>) -> Parser<String> {
    let expected: String = expected.into();
    let label = format!("{expected:?}");
    Parser::build(Kind::Primitive, Some(label), vec![], move |state| {
        for want in expected.chars() {
            match state.advance() {
                Ok(c) if c == want => {}
                Ok(c) => {
                    return Err(Cause::LiteralMismatch {
                        expected: want,
                        found: Some(c),
                    }
                    .into())
                }
                Err(StateError::EndOfInput { .. }) => {
                    return Err(Cause::LiteralMismatch {
                        expected: want,
                        found: None,
                    }
                    .into())
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(expected.clone())
    })
}

/// Wraps `parser` so surrounding whitespace is skipped on both sides.
pub fn token<T: 'static>(parser: &Parser<T>) -> Parser<T> {
    let ws = spaces();
    let p = parser.clone();
    let children = vec![Arc::clone(ws.meta()), Arc::clone(parser.meta())];
    Parser::build(Kind::Token, None, children, move |state| {
        ws.parse(state)?;
        let value = p.parse(state)?;
        ws.parse(state)?;
        Ok(value)
    })
}

/// A lowercase letter followed by any number of alphanumerics.
pub fn ident() -> Parser<String> {
    static P: OnceLock<Parser<String>> = OnceLock::new();
    cached(&P, || {
        seq(&lower(), &many(&alphanum(), 0), |head, tail| {
            std::iter::once(head).chain(tail).collect::<String>()
        })
        .labelled("ident")
    })
}

/// One or more decimal digits as a number. Values beyond `i64` are rejected.
pub fn nat() -> Parser<i64> {
    static P: OnceLock<Parser<i64>> = OnceLock::new();
    cached(&P, || {
        some(&digit())
            .try_map(|digits| {
                string_of_chars(digits)
                    .parse::<i64>()
                    .map_err(|e| e.to_string())
            })
            .labelled("nat")
    })
}

/// A natural number with an optional leading `-`. The full `i64` range is
/// accepted, including `i64::MIN`.
pub fn intg() -> Parser<i64> {
    static P: OnceLock<Parser<i64>> = OnceLock::new();
    cached(&P, || {
        let negative = seq_second(&char_match('-'), &some(&digit())).try_map(|digits| {
            std::iter::once('-')
                .chain(digits)
                .collect::<String>()
                .parse::<i64>()
                .map_err(|e| e.to_string())
        });
        or(&negative, &nat()).labelled("intg")
    })
}

pub fn identifier() -> Parser<String> {
    static P: OnceLock<Parser<String>> = OnceLock::new();
    cached(&P, || token(&ident()).labelled("identifier"))
}

pub fn natural() -> Parser<i64> {
    static P: OnceLock<Parser<i64>> = OnceLock::new();
    cached(&P, || token(&nat()).labelled("natural"))
}

pub fn integer() -> Parser<i64> {
    static P: OnceLock<Parser<i64>> = OnceLock::new();
    cached(&P, || token(&intg()).labelled("integer"))
}

/// `text` as a whitespace-delimited token.
pub fn symbol(text: impl Into<String>) -> Parser<String> {
    token(&string_match(text))
}
