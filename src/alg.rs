//! Algebraic glue types produced by the combinators.
//!
//! `Product` is what sequencing yields, `Sum` is what heterogeneous ordered
//! choice yields and `InclusiveSum` is what inclusive choice yields. None of
//! them carry behaviour beyond construction and inspection.

/// Both values, as produced by a sequence of two parsers.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Product<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> Product<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }

    pub fn map_first<C>(self, f: impl FnOnce(A) -> C) -> Product<C, B> {
        Product::new(f(self.first), self.second)
    }

    pub fn map_second<C>(self, f: impl FnOnce(B) -> C) -> Product<A, C> {
        Product::new(self.first, f(self.second))
    }
}

impl<A, B> From<(A, B)> for Product<A, B> {
    fn from((first, second): (A, B)) -> Self {
        Self::new(first, second)
    }
}

impl<A, B> From<Product<A, B>> for (A, B) {
    fn from(product: Product<A, B>) -> Self {
        product.into_parts()
    }
}

pub fn fst<A, B>(product: Product<A, B>) -> A {
    product.first
}

pub fn snd<A, B>(product: Product<A, B>) -> B {
    product.second
}

/// The middle value of `((a, b), c)`.
pub fn mid_of_left<A, B, C>(product: Product<Product<A, B>, C>) -> B {
    product.first.second
}

/// The middle value of `(a, (b, c))`.
pub fn mid_of_right<A, B, C>(product: Product<A, Product<B, C>>) -> B {
    product.second.first
}

/// Exactly one of two values, tagged by which alternative produced it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Sum<A, B> {
    Left(A),
    Right(B),
}

impl<A, B> Sum<A, B> {
    pub fn is_left(&self) -> bool {
        matches!(self, Sum::Left(_))
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Sum::Right(_))
    }

    pub fn left(&self) -> Option<&A> {
        match self {
            Sum::Left(a) => Some(a),
            Sum::Right(_) => None,
        }
    }

    pub fn right(&self) -> Option<&B> {
        match self {
            Sum::Left(_) => None,
            Sum::Right(b) => Some(b),
        }
    }

    /// Collapses both cases into one type.
    pub fn either<C>(self, on_left: impl FnOnce(A) -> C, on_right: impl FnOnce(B) -> C) -> C {
        match self {
            Sum::Left(a) => on_left(a),
            Sum::Right(b) => on_right(b),
        }
    }
}

impl<T> Sum<T, T> {
    pub fn into_inner(self) -> T {
        match self {
            Sum::Left(v) | Sum::Right(v) => v,
        }
    }
}

/// Outcome of inclusive choice: at least one side is always present.
///
/// The side accessors return `Option`, so reading an absent side cannot go
/// unnoticed.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum InclusiveSum<A, B> {
    Both(A, B),
    First(A),
    Second(B),
}

impl<A, B> InclusiveSum<A, B> {
    /// `None` when neither side is present.
    pub fn from_options(first: Option<A>, second: Option<B>) -> Option<Self> {
        match (first, second) {
            (Some(a), Some(b)) => Some(InclusiveSum::Both(a, b)),
            (Some(a), None) => Some(InclusiveSum::First(a)),
            (None, Some(b)) => Some(InclusiveSum::Second(b)),
            (None, None) => None,
        }
    }

    pub fn has_first(&self) -> bool {
        matches!(self, InclusiveSum::Both(..) | InclusiveSum::First(_))
    }

    pub fn has_second(&self) -> bool {
        matches!(self, InclusiveSum::Both(..) | InclusiveSum::Second(_))
    }

    pub fn first(&self) -> Option<&A> {
        match self {
            InclusiveSum::Both(a, _) | InclusiveSum::First(a) => Some(a),
            InclusiveSum::Second(_) => None,
        }
    }

    pub fn second(&self) -> Option<&B> {
        match self {
            InclusiveSum::Both(_, b) | InclusiveSum::Second(b) => Some(b),
            InclusiveSum::First(_) => None,
        }
    }

    pub fn into_options(self) -> (Option<A>, Option<B>) {
        match self {
            InclusiveSum::Both(a, b) => (Some(a), Some(b)),
            InclusiveSum::First(a) => (Some(a), None),
            InclusiveSum::Second(b) => (None, Some(b)),
        }
    }
}

// === Value combiners, handy as `map` targets ===

pub fn str_of_chars(a: char, b: char) -> String {
    let mut s = String::with_capacity(a.len_utf8() + b.len_utf8());
    s.push(a);
    s.push(b);
    s
}

pub fn str_concat(a: impl Into<String>, b: impl AsRef<str>) -> String {
    let mut s = a.into();
    s.push_str(b.as_ref());
    s
}

pub fn string_of_chars(chars: Vec<char>) -> String {
    chars.into_iter().collect()
}

/// Lifts a binary function to apply element-wise against a fixed right operand.
pub fn fmap<T, U, V>(f: impl Fn(T, U) -> V) -> impl Fn(Vec<T>, U) -> Vec<V>
where
    U: Clone,
{
    move |xs: Vec<T>, y: U| xs.into_iter().map(|x| f(x, y.clone())).collect()
}

/// Lifts a binary function to combine every pair of two vectors, row-major.
pub fn outer_product<T, U, V>(f: impl Fn(T, U) -> V) -> impl Fn(Vec<T>, Vec<U>) -> Vec<V>
where
    T: Clone,
    U: Clone,
{
    move |xs: Vec<T>, ys: Vec<U>| {
        let mut out = Vec::with_capacity(xs.len() * ys.len());
        for x in &xs {
            for y in &ys {
                out.push(f(x.clone(), y.clone()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_accessors() {
        let p = Product::new(1, "hey");
        assert_eq!(*p.first(), 1);
        assert_eq!(*p.second(), "hey");
        assert_eq!(fst(p), 1);
        assert_eq!(snd(p), "hey");
    }

    #[test]
    fn test_nested_product_middle() {
        let inner = Product::new(1, 'a');
        assert_eq!(mid_of_left(Product::new(inner, 2)), 'a');
        assert_eq!(mid_of_right(Product::new(2, inner)), 1);
    }

    #[test]
    fn test_sum_sides() {
        let l: Sum<i32, char> = Sum::Left(1);
        let r: Sum<i32, char> = Sum::Right('x');
        assert!(l.is_left());
        assert_eq!(l.left(), Some(&1));
        assert_eq!(l.right(), None);
        assert!(r.is_right());
        assert_eq!(r.right(), Some(&'x'));

        let same: Sum<i32, i32> = Sum::Right(2);
        assert_eq!(same.into_inner(), 2);
    }

    #[test]
    fn test_inclusive_sum_presence() {
        let both: InclusiveSum<i32, char> = InclusiveSum::Both(1, 'a');
        let first: InclusiveSum<i32, char> = InclusiveSum::First(1);
        let second: InclusiveSum<i32, char> = InclusiveSum::Second('a');

        assert!(both.has_first() && both.has_second());
        assert_eq!(both.first(), Some(&1));
        assert_eq!(both.second(), Some(&'a'));

        assert!(first.has_first());
        assert!(!first.has_second());
        assert_eq!(first.second(), None);

        assert!(!second.has_first());
        assert_eq!(second.second(), Some(&'a'));

        assert_eq!(InclusiveSum::<i32, char>::from_options(None, None), None);
    }

    #[test]
    fn test_value_combiners() {
        assert_eq!(str_of_chars('a', 'b'), "ab");
        assert_eq!(str_concat("hello", "there"), "hellothere");
        assert_eq!(string_of_chars(vec!['o', 'k']), "ok");

        let mul = |a: i32, b: i32| a * b;
        assert_eq!(fmap(mul)(vec![1, 2, 3], 2), vec![2, 4, 6]);
        assert_eq!(
            outer_product(mul)(vec![1, 2, 3], vec![1, 2, 3]),
            vec![1, 2, 3, 2, 4, 6, 3, 6, 9]
        );
    }
}
