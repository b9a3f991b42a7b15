pub mod alg;
pub mod api;
pub mod combinators;
pub mod error;
pub mod meta;
pub mod parser;
pub mod primitives;
pub mod source;
pub mod state;
pub mod utils;

pub use api::{parse_buffered, parse_complete, parse_reader, parse_str};
pub use error::{Cause, FailureTrace, ParseError};
pub use parser::{ParseResult, Parser};
pub use state::State;
