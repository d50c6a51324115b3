use core::{cmp::Ordering, fmt, ops::{Add, Sub}};

use crate::span::Span;


/// The only runtime datum: a double tagged with the span that produced it.
///
/// Operators act on the underlying numbers and produce raw `f64`/`bool`;
/// wrapping a result back into a [Value] is left to the node that owns the
/// span for it.
#[derive(Debug, Clone)]
pub struct Value {
    number: f64,
    span: Span,
}

impl Value {
    pub fn new(number: f64, span: Span) -> Self {
        Self { number, span }
    }

    pub fn number(&self) -> f64 {
        self.number
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Only `0.0` is falsy
    pub fn is_truthy(&self) -> bool {
        self.number != 0.0
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::new(number, Span::empty())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.number.fmt(f)
    }
}

impl<'a> Add for &'a Value {
    type Output = f64;

    fn add(self, rhs: Self) -> f64 {
        self.number + rhs.number
    }
}

impl<'a> Sub for &'a Value {
    type Output = f64;

    fn sub(self, rhs: Self) -> f64 {
        self.number - rhs.number
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.number.partial_cmp(&other.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_does_not_affect_equality() {
        let a = Value::new(2.0, Span::new(0, 1, "2"));
        let b = Value::new(2.0, Span::empty());
        assert_eq!(a, b);
    }

    #[test]
    fn arithmetic_on_numbers() {
        let a = Value::from(4.5);
        let b = Value::from(1.5);
        assert_eq!(&a + &b, 6.0);
        assert_eq!(&a - &b, 3.0);
    }

    #[test]
    fn comparisons_follow_ieee() {
        let nan = Value::from(f64::NAN);
        let one = Value::from(1.0);

        assert!(one > Value::from(0.0));
        assert!(one >= Value::from(1.0));
        assert!(!(nan < one) && !(nan >= one));
        assert!(nan != nan.clone());
    }

    #[test]
    fn only_zero_is_falsy() {
        assert!(!Value::from(0.0).is_truthy());
        assert!(!Value::from(-0.0).is_truthy());
        assert!(Value::from(1.4).is_truthy());
        assert!(Value::from(f64::NAN).is_truthy());
    }
}
