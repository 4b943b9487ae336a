//! Sparse polynomials over day offsets.
//!
//! A term `(coefficient, exponent)` is a cash flow of `coefficient` that has
//! been compounding for `exponent` days. Solving for the root gives the
//! per-day growth factor that makes all flows net to zero at day 0.

use serde::{Deserialize, Serialize};

/// Newton iterations stop once successive estimates differ by less than this.
pub const SOLVE_TOLERANCE: f64 = 1e-10;

/// Upper bound on Newton iterations.
pub const MAX_ITERATIONS: usize = 200;

/// A single `(coefficient, exponent)` term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub coefficient: f64,
    pub exponent: i32,
}

impl Term {
    pub fn new(coefficient: f64, exponent: i32) -> Self {
        Self {
            coefficient,
            exponent,
        }
    }

    fn compute(&self, x: f64) -> f64 {
        match self.exponent {
            0 => self.coefficient,
            1 => self.coefficient * x,
            e => self.coefficient * x.powi(e),
        }
    }
}

/// Univariate polynomial with at most one term per exponent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polynomial {
    terms: Vec<Term>,
}

impl Polynomial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term, summing into an existing term with the same exponent.
    /// Terms whose coefficients cancel out are kept.
    pub fn append(&mut self, coefficient: f64, exponent: i32) {
        if let Some(term) = self.terms.iter_mut().find(|t| t.exponent == exponent) {
            term.coefficient += coefficient;
            return;
        }
        self.terms.push(Term::new(coefficient, exponent));
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Coefficient of the term with `exponent`, 0 if absent.
    pub fn coefficient(&self, exponent: i32) -> f64 {
        self.terms
            .iter()
            .find(|t| t.exponent == exponent)
            .map(|t| t.coefficient)
            .unwrap_or(0.0)
    }

    pub fn min_exponent(&self) -> Option<i32> {
        self.terms.iter().map(|t| t.exponent).min()
    }

    pub fn max_exponent(&self) -> Option<i32> {
        self.terms.iter().map(|t| t.exponent).max()
    }

    /// Subtract `delta` from every exponent.
    pub fn shift_exponents(&mut self, delta: i32) {
        for term in &mut self.terms {
            term.exponent -= delta;
        }
    }

    /// Evaluate at `x`.
    pub fn compute(&self, x: f64) -> f64 {
        self.terms.iter().map(|t| t.compute(x)).sum()
    }

    /// First derivative. Constant terms vanish.
    pub fn derivative(&self) -> Polynomial {
        Polynomial {
            terms: self
                .terms
                .iter()
                .filter(|t| t.exponent > 0)
                .map(|t| Term::new(t.coefficient * t.exponent as f64, t.exponent - 1))
                .collect(),
        }
    }

    /// Find `x` with `compute(x) ≈ 0`.
    ///
    /// Two-term polynomials with a constant term are solved exactly. Everything
    /// else goes through Newton-Raphson starting at 1. A zero derivative yields
    /// 0; a non-finite iterate is returned unchanged, so callers must check
    /// `is_finite()` before using the result.
    pub fn solve(&self) -> f64 {
        if let Some(root) = self.solve_two_term() {
            return root;
        }

        let deriv = self.derivative();
        let mut x = 1.0_f64;
        for iteration in 1..=MAX_ITERATIONS {
            let dx = deriv.compute(x);
            if dx == 0.0 {
                return 0.0;
            }
            let value = self.compute(x);
            let next = x - value / dx;
            if !next.is_finite() {
                tracing::warn!(
                    "Polynomial solve diverged: x={}, previous={}, f={}, f'={}",
                    next,
                    x,
                    value,
                    dx
                );
                return next;
            }
            let converged = (next - x).abs() < SOLVE_TOLERANCE;
            x = next;
            if converged {
                tracing::debug!("Polynomial solve converged after {} iterations", iteration);
                break;
            }
        }
        x
    }

    /// `c_e * x^e + c_0 = 0`  =>  `x = (-c_0 / c_e)^(1/e)`, keeping the sign.
    fn solve_two_term(&self) -> Option<f64> {
        if self.terms.len() != 2 {
            return None;
        }
        let (constant, power) = match (self.terms[0], self.terms[1]) {
            (a, b) if b.exponent == 0 => (b, a),
            (a, b) if a.exponent == 0 => (a, b),
            _ => return None,
        };
        if power.coefficient == 0.0 || power.exponent == 0 {
            return None;
        }
        let factor = -constant.coefficient / power.coefficient;
        let inv = 1.0 / power.exponent as f64;
        Some(if factor < 0.0 {
            -(-factor).powf(inv)
        } else {
            factor.powf(inv)
        })
    }
}

impl FromIterator<(f64, i32)> for Polynomial {
    fn from_iter<I: IntoIterator<Item = (f64, i32)>>(iter: I) -> Self {
        let mut poly = Polynomial::new();
        for (coefficient, exponent) in iter {
            poly.append(coefficient, exponent);
        }
        poly
    }
}

impl Extend<(f64, i32)> for Polynomial {
    fn extend<I: IntoIterator<Item = (f64, i32)>>(&mut self, iter: I) {
        for (coefficient, exponent) in iter {
            self.append(coefficient, exponent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_merges_equal_exponents() {
        let mut p = Polynomial::new();
        p.append(3.0, 2);
        p.append(2.0, 2);
        assert_eq!(p.terms(), &[Term::new(5.0, 2)]);
    }

    #[test]
    fn test_append_keeps_cancelled_term() {
        let mut p = Polynomial::new();
        p.append(3.0, 4);
        p.append(-3.0, 4);
        assert_eq!(p.len(), 1);
        assert_eq!(p.compute(7.0), 0.0);
    }

    #[test]
    fn test_compute_constant_at_zero() {
        let p: Polynomial = [(4.0, 0), (2.0, 1), (1.0, 3)].into_iter().collect();
        assert_eq!(p.compute(0.0), 4.0);
        assert_eq!(p.compute(2.0), 4.0 + 4.0 + 8.0);
    }

    #[test]
    fn test_derivative() {
        let p: Polynomial = [(3.0, 2), (2.0, 1), (-6.72, 0)].into_iter().collect();
        let d = p.derivative();
        assert_eq!(d.terms(), &[Term::new(6.0, 1), Term::new(2.0, 0)]);
    }

    #[test]
    fn test_solve_twenty_percent() {
        // 3 compounding for two periods plus 2 for one period is worth 6.72 at 20%.
        let mut p = Polynomial::new();
        p.append(3.0, 2);
        p.append(2.0, 1);
        p.append(-6.72, 0);
        let x = p.solve();
        assert!((x - 1.2).abs() < 1e-8);
        assert!(p.compute(x).abs() < 1e-8);
    }

    #[test]
    fn test_two_term_closed_form_matches_newton() {
        let closed: Polynomial = [(100.0, 365), (-150.0, 0)].into_iter().collect();
        let expected = 1.5_f64.powf(1.0 / 365.0);
        assert!((closed.solve() - expected).abs() < 1e-12);

        // Same root through the general path, forced by a zero-valued third term.
        let newton: Polynomial = [(100.0, 365), (-150.0, 0), (0.0, 7)].into_iter().collect();
        assert!((newton.solve() - expected).abs() < 1e-8);
    }

    #[test]
    fn test_two_term_order_does_not_matter() {
        let a: Polynomial = [(-150.0, 0), (100.0, 365)].into_iter().collect();
        let b: Polynomial = [(100.0, 365), (-150.0, 0)].into_iter().collect();
        assert_eq!(a.solve(), b.solve());
    }

    #[test]
    fn test_two_term_negative_factor_keeps_sign() {
        // x^3 = -8
        let p: Polynomial = [(1.0, 3), (8.0, 0)].into_iter().collect();
        assert!((p.solve() + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_derivative_returns_zero() {
        // f'(1) = 2 - 2 = 0
        let p: Polynomial = [(1.0, 2), (-2.0, 1), (5.0, 0)].into_iter().collect();
        assert_eq!(p.solve(), 0.0);

        let constant: Polynomial = [(5.0, 0)].into_iter().collect();
        assert_eq!(constant.solve(), 0.0);
        assert_eq!(Polynomial::new().solve(), 0.0);
    }

    #[test]
    fn test_no_real_root_terminates() {
        // x^2 + 1 has no real root; Newton wanders but must stop.
        let p: Polynomial = [(1.0, 2), (1.0, 0), (0.0, 1)].into_iter().collect();
        let _ = p.solve();
    }

    #[test]
    fn test_shift_exponents() {
        let mut p: Polynomial = [(1.0, 10), (2.0, 4)].into_iter().collect();
        p.shift_exponents(4);
        assert_eq!(p.min_exponent(), Some(0));
        assert_eq!(p.max_exponent(), Some(6));
        assert_eq!(p.coefficient(0), 2.0);
    }
}
