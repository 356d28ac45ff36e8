use std::cmp::Ordering;
use std::fmt;

use crate::v4l2::types::v4l2_fract;

/// Exact rational number, used for frame rates
///
/// Both a zero denominator and `0/0` are representable and are left alone by every operation
/// except [`Fraction::reduce`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    pub numerator: u32,
    pub denominator: u32,
}

impl Fraction {
    /// Returns `numerator/denominator` as is, without reducing it
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Fraction {
            numerator,
            denominator,
        }
    }

    /// Compares two fractions by value
    ///
    /// Cross products are computed in 64 bits. `1/2` and `2/4` compare equal here while
    /// `==` tells them apart.
    ///
    /// # Example
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use v4lcam::Fraction;
    ///
    /// assert_eq!(Fraction::new(1, 2).cmp(&Fraction::new(2, 4)), Ordering::Equal);
    /// assert_eq!(Fraction::new(1, 3).cmp(&Fraction::new(1, 2)), Ordering::Less);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn cmp(&self, other: &Fraction) -> Ordering {
        let lhs = u64::from(self.numerator) * u64::from(other.denominator);
        let rhs = u64::from(other.numerator) * u64::from(self.denominator);
        lhs.cmp(&rhs)
    }

    /// Returns the fraction in lowest terms
    ///
    /// `n/0` becomes `1/0` for any non-zero `n`, `0/d` becomes `0/1` and `0/0` is returned
    /// unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use v4lcam::Fraction;
    /// assert_eq!(Fraction::new(60, 2).reduce(), Fraction::new(30, 1));
    /// ```
    pub fn reduce(self) -> Fraction {
        let mut gcd = gcd(self.numerator, self.denominator);
        if gcd == 0 {
            gcd = 1;
        }
        Fraction {
            numerator: self.numerator / gcd,
            denominator: self.denominator / gcd,
        }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl From<v4l2_fract> for Fraction {
    fn from(raw: v4l2_fract) -> Self {
        Fraction::new(raw.numerator, raw.denominator)
    }
}

impl From<Fraction> for v4l2_fract {
    fn from(f: Fraction) -> Self {
        v4l2_fract {
            numerator: f.numerator,
            denominator: f.denominator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce() {
        let cases = [
            ((0, 1), (0, 1)),
            ((2, 4), (1, 2)),
            ((0, 0), (0, 0)),
            ((5, 0), (1, 0)),
            ((0, 7), (0, 1)),
            ((30, 1), (30, 1)),
            ((10000000, 333333), (10000000, 333333)),
            ((u32::MAX, u32::MAX), (1, 1)),
        ];
        for ((n, d), (rn, rd)) in cases {
            let got = Fraction::new(n, d).reduce();
            assert_eq!(got, Fraction::new(rn, rd), "reduce({}/{})", n, d);
            assert_eq!(got.reduce(), got, "reduce is not idempotent for {}/{}", n, d);
        }
    }

    #[test]
    fn cmp() {
        let cases = [
            ((1, 2), (2, 4), Ordering::Equal),
            ((1, 3), (1, 2), Ordering::Less),
            ((1, 2), (1, 3), Ordering::Greater),
            ((1, 0), (1, 0), Ordering::Equal),
            ((0, 1), (0, 5), Ordering::Equal),
            ((u32::MAX, 1), (u32::MAX - 1, 1), Ordering::Greater),
            ((1, u32::MAX), (1, u32::MAX - 1), Ordering::Less),
        ];
        for ((a, b), (c, d), want) in cases {
            assert_eq!(
                Fraction::new(a, b).cmp(&Fraction::new(c, d)),
                want,
                "{}/{} vs {}/{}",
                a,
                b,
                c,
                d
            );
        }
    }

    #[test]
    fn display() {
        assert_eq!(Fraction::new(30000, 1001).to_string(), "30000/1001");
    }
}
