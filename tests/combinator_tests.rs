use strand::alg::{InclusiveSum, Product, Sum};
use strand::combinators::{alt, alt_all, alt_both, many, or, seq_product};
use strand::error::Cause;
use strand::primitives::{char_match, digit, fail, integer, intg, item, nat, natural, succeed};
use strand::{FailureTrace, Parser, State};

fn run<T>(p: &Parser<T>, input: &str) -> (Result<T, FailureTrace>, State) {
    let mut state = State::from_text(input);
    let out = p.parse(&mut state);
    (out, state)
}

#[test]
fn test_sequence_success() {
    let p = seq_product(&char_match('a'), &char_match('b'));
    let (out, state) = run(&p, "ab");
    assert_eq!(out.unwrap(), Product::new('a', 'b'));
    assert_eq!(state.position(), 2);
}

#[test]
fn test_sequence_failure_points_at_second() {
    let a = char_match('a');
    let b = char_match('b');
    let p = seq_product(&a, &b);
    let (out, state) = run(&p, "ac");
    let trace = out.unwrap_err();

    let deepest = trace.deepest().unwrap();
    assert_eq!(deepest.id(), b.id());
    assert_eq!(deepest.position(), 1);
    assert_eq!(trace.outermost().unwrap().id(), p.id());
    assert!(!trace.contains(a.id()));

    assert_eq!(state.position(), 0);
    assert_eq!(state.failed_by(), Some(b.id()));
}

#[test]
fn test_repetition_collects_and_stops() {
    let p = many(&digit(), 0);
    let (out, mut state) = run(&p, "123x");
    assert_eq!(out.unwrap(), vec!['1', '2', '3']);
    assert_eq!(state.position(), 3);
    assert_eq!(state.advance().unwrap(), 'x');
    assert!(!state.has_failed());
}

#[test]
fn test_repetition_shortfall_consumes_nothing() {
    let p = many(&digit(), 3);
    let (out, state) = run(&p, "12x");
    let trace = out.unwrap_err();
    assert_eq!(trace.outermost().unwrap().position(), 0);
    assert_eq!(trace.outermost().unwrap().id(), p.id());
    // The trace is the one from the attempt that fell short.
    assert_eq!(trace.deepest().unwrap().id(), digit().id());
    assert_eq!(trace.deepest().unwrap().position(), 2);
    assert_eq!(state.position(), 0);
}

#[test]
fn test_some_requires_one() {
    let (out, _) = run(&digit().some(), "x");
    assert!(out.is_err());
    let (out, _) = run(&digit().many(), "x");
    assert_eq!(out.unwrap(), Vec::<char>::new());
}

#[test]
fn test_alt_restores_before_second() {
    // Consumes three characters, then fails.
    let greedy = Parser::from_fn("greedy", |s: &mut State| {
        for _ in 0..3 {
            s.advance()?;
        }
        Err::<char, _>(FailureTrace::new(Cause::Explicit))
    });
    let p = alt(&greedy, &item());
    let (out, state) = run(&p, "hello");
    assert_eq!(out.unwrap(), Sum::Right('h'));
    assert_eq!(state.position(), 1);
}

#[test]
fn test_ordered_choice_bias() {
    let one = succeed(1);
    let two = succeed(2);
    assert_eq!(run(&or(&one, &two), "").0.unwrap(), 1);
    assert_eq!(run(&or(&two, &one), "").0.unwrap(), 2);
    assert_eq!(run(&alt(&one, &two), "").0.unwrap(), Sum::Left(1));
    assert_eq!(run(&alt(&two, &one), "").0.unwrap(), Sum::Left(2));
}

#[test]
fn test_alt_fails_with_second_trace() {
    let a = char_match('a');
    let b = char_match('b');
    let p = alt(&a, &b);
    let trace = run(&p, "c").0.unwrap_err();
    assert_eq!(trace.deepest().unwrap().id(), b.id());
    let children: Vec<_> = p.meta().children().iter().map(|m| m.id()).collect();
    assert_eq!(children, vec![a.id(), b.id()]);
}

#[test]
fn test_inclusive_choice_outcomes() {
    let yes = succeed(1);
    let no = fail::<i32>("no");

    let only_first = run(&alt_both(&yes, &no), "").0.unwrap();
    assert_eq!(only_first, InclusiveSum::First(1));
    assert_eq!(only_first.first(), Some(&1));
    assert_eq!(only_first.second(), None);

    let only_second = run(&alt_both(&no, &yes), "").0.unwrap();
    assert_eq!(only_second, InclusiveSum::Second(1));
    assert!(!only_second.has_first());

    let both = run(&alt_both(&yes, &succeed('z')), "").0.unwrap();
    assert_eq!(both, InclusiveSum::Both(1, 'z'));

    assert!(run(&alt_both(&no, &no), "").0.is_err());
}

#[test]
fn test_inclusive_choice_runs_second_from_same_start() {
    let ab = seq_product(&char_match('a'), &char_match('b'));
    let a = char_match('a');
    let (out, state) = run(&alt_both(&ab, &a), "ab");
    assert_eq!(out.unwrap(), InclusiveSum::Both(Product::new('a', 'b'), 'a'));
    assert_eq!(state.position(), 2);
}

#[test]
fn test_inclusive_collect() {
    let digits = digit();
    let any = item();
    assert_eq!(run(&alt_all(&digits, &any), "7").0.unwrap(), vec!['7', '7']);
    assert_eq!(run(&alt_all(&digits, &any), "x").0.unwrap(), vec!['x']);
    let (out, state) = run(&alt_all(&digits, &digits), "x");
    assert_eq!(out.unwrap(), Vec::<char>::new());
    assert_eq!(state.position(), 0);
}

#[test]
fn test_map_never_runs_on_failure() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let p = digit().map(move |c| {
        counter.fetch_add(1, Ordering::SeqCst);
        c
    });
    assert!(run(&p, "x").0.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(run(&p, "4").0.unwrap(), '4');
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_natural_numbers() {
    assert_eq!(run(&nat(), "42").0.unwrap(), 42);
    let (out, state) = run(&natural(), " 42 ");
    assert_eq!(out.unwrap(), 42);
    assert!(state.at_end().unwrap());
}

#[test]
fn test_signed_integers() {
    assert_eq!(run(&intg(), "-7").0.unwrap(), -7);
    assert_eq!(run(&intg(), "7").0.unwrap(), 7);
    assert_eq!(run(&integer(), "  -12  ").0.unwrap(), -12);
}

#[test]
fn test_determinism() {
    let p = seq_product(&natural(), &char_match(';'));
    let first = run(&p, "12 ,").0.unwrap_err();
    let second = run(&p, "12 ,").0.unwrap_err();
    assert_eq!(first, second);
}

#[test]
fn test_reuse_across_inputs() {
    let p = many(&digit(), 1).map(|ds| ds.len());
    assert_eq!(run(&p, "123").0.unwrap(), 3);
    assert_eq!(run(&p, "9").0.unwrap(), 1);
    assert!(run(&p, "").0.is_err());
    assert_eq!(run(&p, "12345").0.unwrap(), 5);
}
