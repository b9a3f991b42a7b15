use crate::alg::{InclusiveSum, Product, Sum};
use crate::combinators;
use crate::error::{FailureTrace, TraceEntry};
use crate::meta::{Kind, Meta, MetaId};
use crate::state::State;
use std::fmt;
use std::ops::{Add, BitOr};
use std::sync::{Arc, Weak};

pub type ParseResult<T> = Result<T, FailureTrace>;

type ParseFn<T> = dyn Fn(&mut State) -> ParseResult<T> + Send + Sync;

/// A parse function paired with its provenance metadata.
///
/// Cloning is cheap and shares both, so one parser can sit inside any number
/// of parent combinators.
pub struct Parser<T> {
    run: Arc<ParseFn<T>>,
    meta: Arc<Meta>,
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Parser {
            run: Arc::clone(&self.run),
            meta: Arc::clone(&self.meta),
        }
    }
}

/// A parser reference that does not keep the parse function alive.
pub(crate) struct WeakParser<T> {
    run: Weak<ParseFn<T>>,
    meta: Arc<Meta>,
}

impl<T> WeakParser<T> {
    pub(crate) fn upgrade(&self) -> Option<Parser<T>> {
        Some(Parser {
            run: self.run.upgrade()?,
            meta: Arc::clone(&self.meta),
        })
    }
}

impl<T> fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser").field("meta", &self.meta).finish()
    }
}

impl<T> Parser<T> {
    /// Invokes the parser.
    ///
    /// On failure the state's cursor is put back where this parser started,
    /// the state records this parser as the failure point unless something
    /// deeper already did, and this parser is appended to the trace.
    pub fn parse(&self, state: &mut State) -> ParseResult<T> {
        let start = state.snapshot();
        match (self.run)(state) {
            Ok(value) => Ok(value),
            Err(mut trace) => {
                state.rewind(start);
                state.mark_failed(self.meta.id());
                log::trace!(
                    "{} failed at offset {}",
                    self.meta.describe(),
                    start.position()
                );
                trace.push(TraceEntry::new(start.position(), Arc::clone(&self.meta)));
                Err(trace)
            }
        }
    }

    pub fn meta(&self) -> &Arc<Meta> {
        &self.meta
    }

    pub fn id(&self) -> MetaId {
        self.meta.id()
    }

    pub(crate) fn downgrade(&self) -> WeakParser<T> {
        WeakParser {
            run: Arc::downgrade(&self.run),
            meta: Arc::clone(&self.meta),
        }
    }

    /// Same behaviour under a new identity that carries `label`.
    pub fn labelled(&self, label: impl Into<String>) -> Parser<T> {
        Parser {
            run: Arc::clone(&self.run),
            meta: self.meta.relabel(label.into()),
        }
    }
}

impl<T: 'static> Parser<T> {
    pub(crate) fn build<F>(
        kind: Kind,
        label: Option<String>,
        children: Vec<Arc<Meta>>,
        f: F,
    ) -> Self
    where
        F: Fn(&mut State) -> ParseResult<T> + Send + Sync + 'static,
    {
        Parser {
            run: Arc::new(f),
            meta: Meta::new(kind, label, children),
        }
    }

    /// A hand-written parser. `f` advances the state itself and may call
    /// other parsers; it is wrapped in the usual failure protocol.
    pub fn from_fn<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut State) -> ParseResult<T> + Send + Sync + 'static,
    {
        Self::build(Kind::Custom, Some(label.into()), vec![], f)
    }

    // === Combinators as methods ===

    pub fn map<U: 'static, F>(&self, f: F) -> Parser<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        combinators::map(self, f)
    }

    pub fn try_map<U: 'static, F>(&self, f: F) -> Parser<U>
    where
        F: Fn(T) -> Result<U, String> + Send + Sync + 'static,
    {
        combinators::try_map(self, f)
    }

    /// Sequence keeping both values.
    pub fn then<U: 'static>(&self, other: &Parser<U>) -> Parser<Product<T, U>> {
        combinators::seq_product(self, other)
    }

    /// Sequence keeping only this parser's value.
    pub fn then_ignore<U: 'static>(&self, other: &Parser<U>) -> Parser<T> {
        combinators::seq_first(self, other)
    }

    /// Sequence keeping only `other`'s value.
    pub fn ignore_then<U: 'static>(&self, other: &Parser<U>) -> Parser<U> {
        combinators::seq_second(self, other)
    }

    pub fn alt<U: 'static>(&self, other: &Parser<U>) -> Parser<Sum<T, U>> {
        combinators::alt(self, other)
    }

    pub fn or(&self, other: &Parser<T>) -> Parser<T> {
        combinators::or(self, other)
    }

    pub fn alt_both<U: 'static>(&self, other: &Parser<U>) -> Parser<InclusiveSum<T, U>> {
        combinators::alt_both(self, other)
    }

    pub fn alt_all(&self, other: &Parser<T>) -> Parser<Vec<T>> {
        combinators::alt_all(self, other)
    }

    pub fn many(&self) -> Parser<Vec<T>> {
        combinators::many(self, 0)
    }

    pub fn some(&self) -> Parser<Vec<T>> {
        combinators::many(self, 1)
    }

    pub fn at_least(&self, min: usize) -> Parser<Vec<T>> {
        combinators::many(self, min)
    }

    pub fn fold<V, F>(&self, min: usize, seed: V, f: F) -> Parser<V>
    where
        V: Clone + Send + Sync + 'static,
        F: Fn(V, T) -> V + Send + Sync + 'static,
    {
        combinators::fold(self, min, seed, f)
    }
}

// === Operator Overloading ===

/// `+` for sequence: A + B -> Product<A, B>
impl<T: 'static, U: 'static> Add<Parser<U>> for Parser<T> {
    type Output = Parser<Product<T, U>>;

    fn add(self, rhs: Parser<U>) -> Self::Output {
        self.then(&rhs)
    }
}

/// `|` for ordered choice between parsers of one type
impl<T: 'static> BitOr<Parser<T>> for Parser<T> {
    type Output = Parser<T>;

    fn bitor(self, rhs: Parser<T>) -> Self::Output {
        self.or(&rhs)
    }
}
