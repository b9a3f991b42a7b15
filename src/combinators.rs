//! The combinator algebra.
//!
//! Every combinator borrows its sub-parsers and keeps its own clone, so the
//! caller can reuse them elsewhere. Backtracking is always explicit: a
//! combinator that wants to retry restores a snapshot it took itself.

use crate::alg::{InclusiveSum, Product, Sum};
use crate::error::{Cause, FailureTrace};
use crate::meta::Kind;
use crate::parser::{ParseResult, Parser, WeakParser};
use crate::state::{Snapshot, State};
use std::sync::{Arc, OnceLock};

/// Runs `first` then `second` and combines their values.
pub fn seq<A, B, V, F>(first: &Parser<A>, second: &Parser<B>, combine: F) -> Parser<V>
where
    A: 'static,
    B: 'static,
    V: 'static,
    F: Fn(A, B) -> V + Send + Sync + 'static,
{
    let (p, q) = (first.clone(), second.clone());
    let children = vec![Arc::clone(first.meta()), Arc::clone(second.meta())];
    Parser::build(Kind::Sequence, None, children, move |state| {
        let a = p.parse(state)?;
        let b = q.parse(state)?;
        Ok(combine(a, b))
    })
}

pub fn seq_product<A: 'static, B: 'static>(
    first: &Parser<A>,
    second: &Parser<B>,
) -> Parser<Product<A, B>> {
    seq(first, second, Product::new)
}

/// Both must succeed; only the first value is kept.
pub fn seq_first<A: 'static, B: 'static>(first: &Parser<A>, second: &Parser<B>) -> Parser<A> {
    seq(first, second, |a, _| a)
}

/// Both must succeed; only the second value is kept.
pub fn seq_second<A: 'static, B: 'static>(first: &Parser<A>, second: &Parser<B>) -> Parser<B> {
    seq(first, second, |_, b| b)
}

fn choose<T, U, V>(
    state: &mut State,
    p: &Parser<T>,
    q: &Parser<U>,
    left: impl FnOnce(T) -> V,
    right: impl FnOnce(U) -> V,
) -> ParseResult<V> {
    let start = state.snapshot();
    match p.parse(state) {
        Ok(v) => Ok(left(v)),
        Err(trace) => {
            log::debug!(
                "{} failed at offset {}, trying {}",
                p.meta().describe(),
                trace.position(),
                q.meta().describe()
            );
            state.restore(start);
            q.parse(state).map(right)
        }
    }
}

/// Ordered choice: the first alternative that succeeds wins.
pub fn alt<T: 'static, U: 'static>(first: &Parser<T>, second: &Parser<U>) -> Parser<Sum<T, U>> {
    let (p, q) = (first.clone(), second.clone());
    let children = vec![Arc::clone(first.meta()), Arc::clone(second.meta())];
    Parser::build(Kind::Choice, None, children, move |state| {
        choose(state, &p, &q, Sum::Left, Sum::Right)
    })
}

/// Ordered choice between alternatives of the same type.
pub fn or<T: 'static>(first: &Parser<T>, second: &Parser<T>) -> Parser<T> {
    let (p, q) = (first.clone(), second.clone());
    let children = vec![Arc::clone(first.meta()), Arc::clone(second.meta())];
    Parser::build(Kind::Choice, None, children, move |state| {
        choose(state, &p, &q, |v| v, |v| v)
    })
}

type Attempt<T> = Result<(T, Snapshot), FailureTrace>;

/// Runs both parsers from the same starting point. Leaves the state at the
/// start; the caller decides where to continue.
fn attempt_both<T, U>(
    state: &mut State,
    p: &Parser<T>,
    q: &Parser<U>,
) -> (Attempt<T>, Attempt<U>) {
    let start = state.snapshot();
    let first = p.parse(state).map(|v| (v, state.snapshot()));
    state.restore(start);
    let second = q.parse(state).map(|v| (v, state.snapshot()));
    state.restore(start);
    (first, second)
}

/// Continues from whichever success consumed the most input, preferring the
/// first on a tie.
fn furthest(first: Option<Snapshot>, second: Option<Snapshot>) -> Option<Snapshot> {
    match (first, second) {
        (Some(a), Some(b)) if b.position() > a.position() => Some(b),
        (Some(a), _) => Some(a),
        (None, b) => b,
    }
}

/// Inclusive choice: tries both alternatives and reports which succeeded.
/// Fails only when neither does.
pub fn alt_both<T: 'static, U: 'static>(
    first: &Parser<T>,
    second: &Parser<U>,
) -> Parser<InclusiveSum<T, U>> {
    let (p, q) = (first.clone(), second.clone());
    let children = vec![Arc::clone(first.meta()), Arc::clone(second.meta())];
    Parser::build(Kind::InclusiveChoice, None, children, move |state| {
        let (a, b) = match attempt_both(state, &p, &q) {
            (Err(_), Err(trace)) => {
                if let Some(deepest) = trace.deepest() {
                    state.mark_failed(deepest.id());
                }
                return Err(trace);
            }
            (a, b) => (a.ok(), b.ok()),
        };
        if let Some(end) = furthest(a.as_ref().map(|(_, s)| *s), b.as_ref().map(|(_, s)| *s)) {
            state.restore(end);
        }
        InclusiveSum::from_options(a.map(|(v, _)| v), b.map(|(v, _)| v))
            .ok_or_else(|| FailureTrace::new(Cause::Explicit))
    })
}

/// Inclusive choice between alternatives of the same type, collecting the
/// successes in order. Succeeds with an empty list when neither matches.
pub fn alt_all<T: 'static>(first: &Parser<T>, second: &Parser<T>) -> Parser<Vec<T>> {
    let (p, q) = (first.clone(), second.clone());
    let children = vec![Arc::clone(first.meta()), Arc::clone(second.meta())];
    Parser::build(Kind::InclusiveChoice, None, children, move |state| {
        let (a, b) = attempt_both(state, &p, &q);
        let (a, b) = (a.ok(), b.ok());
        if let Some(end) = furthest(a.as_ref().map(|(_, s)| *s), b.as_ref().map(|(_, s)| *s)) {
            state.restore(end);
        }
        Ok(a.into_iter().chain(b).map(|(v, _)| v).collect())
    })
}

/// Shared loop behind `many` and `fold`.
///
/// Stops at the first failing attempt and restores the state to just before
/// it. With fewer than `min` successes the failing attempt's trace is
/// returned instead. A success that consumes nothing ends the loop once
/// `min` is met, since repeating it would never terminate.
fn repeat<T, V>(
    p: &Parser<T>,
    state: &mut State,
    min: usize,
    mut acc: V,
    step: impl Fn(V, T) -> V,
) -> ParseResult<V> {
    let mut count = 0;
    loop {
        let before = state.snapshot();
        match p.parse(state) {
            Ok(v) => {
                acc = step(acc, v);
                count += 1;
                if state.position() == before.position() && count >= min {
                    log::warn!(
                        "{} succeeded without consuming input at offset {}; stopping repetition",
                        p.meta().describe(),
                        before.position()
                    );
                    break;
                }
            }
            Err(trace) => {
                if count < min {
                    return Err(trace);
                }
                state.restore(before);
                break;
            }
        }
    }
    Ok(acc)
}

/// Zero-or-more (`min = 0`) or at-least-`min` repetition.
pub fn many<T: 'static>(parser: &Parser<T>, min: usize) -> Parser<Vec<T>> {
    let p = parser.clone();
    Parser::build(Kind::Repeat, None, vec![Arc::clone(parser.meta())], move |state| {
        repeat(&p, state, min, Vec::new(), |mut acc, v| {
            acc.push(v);
            acc
        })
    })
}

pub fn some<T: 'static>(parser: &Parser<T>) -> Parser<Vec<T>> {
    many(parser, 1)
}

/// Repetition that folds each value into an accumulator starting at `seed`.
pub fn fold<T, V, F>(parser: &Parser<T>, min: usize, seed: V, f: F) -> Parser<V>
where
    T: 'static,
    V: Clone + Send + Sync + 'static,
    F: Fn(V, T) -> V + Send + Sync + 'static,
{
    let p = parser.clone();
    Parser::build(Kind::Repeat, None, vec![Arc::clone(parser.meta())], move |state| {
        repeat(&p, state, min, seed.clone(), &f)
    })
}

pub fn map<T, U, F>(parser: &Parser<T>, f: F) -> Parser<U>
where
    T: 'static,
    U: 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let p = parser.clone();
    Parser::build(Kind::Map, None, vec![Arc::clone(parser.meta())], move |state| {
        p.parse(state).map(&f)
    })
}

/// Like `map`, but `f` may refuse the value, failing the parse.
pub fn try_map<T, U, F>(parser: &Parser<T>, f: F) -> Parser<U>
where
    T: 'static,
    U: 'static,
    F: Fn(T) -> Result<U, String> + Send + Sync + 'static,
{
    let p = parser.clone();
    Parser::build(Kind::Map, None, vec![Arc::clone(parser.meta())], move |state| {
        let value = p.parse(state)?;
        f(value).map_err(|reason| FailureTrace::new(Cause::Rejected { reason }))
    })
}

/// Builds a parser that refers to itself.
///
/// `define` receives a stand-in for the finished parser. The stand-in only
/// holds a weak reference to it, so the grammar forms no reference cycle and
/// the metadata graph stays acyclic.
pub fn recursive<T, F>(define: F) -> Parser<T>
where
    T: 'static,
    F: FnOnce(Parser<T>) -> Parser<T>,
{
    let slot: Arc<OnceLock<WeakParser<T>>> = Arc::new(OnceLock::new());
    let target = Arc::clone(&slot);
    let stand_in = Parser::build(Kind::Recursive, None, vec![], move |state| {
        match target.get().and_then(WeakParser::upgrade) {
            Some(parser) => parser.parse(state),
            None => Err(FailureTrace::new(Cause::Unbound)),
        }
    });
    let defined = define(stand_in);
    // The slot is fresh, so this cannot already be set.
    let _ = slot.set(defined.downgrade());
    defined
}
