//! Line minimization by the secant (false position) method applied to the derivative.
//!
//! A local minimum of `f` inside `[a, b]` is located as a zero of `f'`.
//! Every pass requires the sign condition `f'(L) < 0 < f'(R)`; the secant
//! through `(L, f'(L))` and `(R, f'(R))` gives the next candidate `z`, which
//! replaces the endpoint whose derivative has the same sign.
//!
//! The candidate is not clamped into the current bracket.

use num_traits::Float;
use serde::Serialize;
use thiserror::Error;

/// Secant bracketing minimizer.
#[derive(Debug,Clone)]
pub struct SecantMin<S: Float> {
    /// Convergence tolerance on `|f'(z)|`
    pub tol: S,
    /// Maximum number of passes
    pub max_iter: usize,
}

#[derive(Debug,Clone,Error)]
pub enum SecantMinError<S> {
    #[error("invalid bracket: a and b must be finite with a != b. got [{a}, {b}]")]
    InvalidBounds { a: S, b: S },

    #[error("invalid tolerance: must be finite and > 0. got {got}")]
    InvalidTolerance { got: S },

    #[error("invalid max_iter: must be >= 1. got max_iter={got}")]
    InvalidMaxIter { got: usize },

    #[error("derivative non-finite at x={x}: f'(x)={value}")]
    NonFiniteDerivative { x: S, value: S },

    #[error("function non-finite at x={x}: f(x)={value}")]
    NonFiniteValue { x: S, value: S },

    #[error("secant step overflowed on bracket [{l}, {r}]")]
    NonFiniteStep { l: S, r: S },
}

/// Why the iteration stopped.
#[derive(Debug,Clone,Copy,PartialEq,Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination<S> {
    /// `|f'(z)| <= tol`
    Converged,
    /// All `max_iter` passes were used without meeting `tol`.
    IterationLimit,
    /// The derivatives at the bracket endpoints did not satisfy `f'(L) < 0 < f'(R)`
    /// at the start of the pass `iteration` (1-based).
    BracketFailure { iteration: usize, dl: S, dr: S },
}

/// One pass of the minimizer.
#[derive(Debug,Clone,Copy,PartialEq,Serialize)]
pub struct IterationRecord<S> {
    /// Pass number (indexed from 1)
    pub iteration: usize,
    #[serde(rename = "L")]
    pub l: S,
    #[serde(rename = "R")]
    pub r: S,
    /// Secant estimate of the zero of `f'`
    pub z: S,
    #[serde(rename = "f'(L)")]
    pub dl: S,
    #[serde(rename = "f'(R)")]
    pub dr: S,
    #[serde(rename = "f'(z)")]
    pub dz: S,
}

/// Outcome of a minimization.
///
/// `graphs` holds one slot per entry of `iterations`: the artifact produced by the
/// render hook for that pass, or `None` when none was produced.
#[derive(Debug,Clone)]
pub struct Minimization<S, G = ()> {
    pub x_min: S,
    pub f_min: S,
    pub iterations: Vec<IterationRecord<S>>,
    pub termination: Termination<S>,
    pub graphs: Vec<Option<G>>,
}

impl<S: Float, G> Minimization<S, G> {
    /// Whether the last candidate met the tolerance.
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Artifacts that were actually rendered, in iteration order.
    pub fn rendered(&self) -> impl Iterator<Item = &G> {
        self.graphs.iter().filter_map(Option::as_ref)
    }
}

impl Default for SecantMin<f32> {
    fn default() -> Self {
        SecantMin {
            tol: 1e-4,
            max_iter: 100,
        }
    }
}

impl Default for SecantMin<f64> {
    fn default() -> Self {
        SecantMin {
            tol: 1e-4,
            max_iter: 100,
        }
    }
}

impl SecantMin<f32> {
    pub fn new() -> Self {
        Default::default()
    }
}

impl SecantMin<f64> {
    pub fn new() -> Self {
        Default::default()
    }
}

impl<S: Float> SecantMin<S> {
    pub fn with_tol(mut self, tol: S) -> Self { self.tol = tol; self }
    pub fn with_max_iter(mut self, max_iter: usize) -> Self { self.max_iter = max_iter; self }

    /// Check the parameters against the bracket `[a, b]` without evaluating anything.
    pub fn validate(&self, a: S, b: S) -> Result<(), SecantMinError<S>> {
        if !(a.is_finite() && b.is_finite()) || a == b {
            return Err(SecantMinError::InvalidBounds { a, b });
        }
        if !self.tol.is_finite() || self.tol <= S::zero() {
            return Err(SecantMinError::InvalidTolerance { got: self.tol });
        }
        if self.max_iter == 0 {
            return Err(SecantMinError::InvalidMaxIter { got: self.max_iter });
        }
        Ok(())
    }

    /// Find a local minimum of `f` in the bracket `[a, b]`.
    ///
    ///   - `derivative` evaluates `f'`; it drives the whole iteration.
    ///   - `value` evaluates `f` and is called exactly once, at the returned point.
    ///
    /// The bracket should satisfy `f'(a) < 0 < f'(b)`. If it does not, the
    /// trace is empty and the midpoint `(a + b) / 2` is returned.
    pub fn minimize<D, V>(&self,
                          a: S,
                          b: S,
                          derivative: D,
                          value: V) -> Result<Minimization<S>, SecantMinError<S>>
        where D: FnMut(S) -> S,
              V: FnMut(S) -> S {
        self.minimize_with_trace(a, b, derivative, value, |_| None)
    }

    /// The same as `minimize`, but calls `render` after every recorded pass.
    ///
    /// Whatever `render` returns is stored in `Minimization::graphs` at the index
    /// of the pass; `None` means no artifact for that pass and never stops the
    /// iteration.
    pub fn minimize_with_trace<D, V, R, G>(&self,
                                           a: S,
                                           b: S,
                                           mut derivative: D,
                                           mut value: V,
                                           mut render: R) -> Result<Minimization<S, G>, SecantMinError<S>>
        where D: FnMut(S) -> S,
              V: FnMut(S) -> S,
              R: FnMut(&IterationRecord<S>) -> Option<G> {
        self.validate(a, b)?;

        let mut df = |x: S| {
            let d = derivative(x);
            if d.is_finite() {
                Ok(d)
            } else {
                Err(SecantMinError::NonFiniteDerivative { x, value: d })
            }
        };

        let (mut l, mut r) = (a, b);
        let mut z = None;
        let mut iterations = Vec::new();
        let mut graphs = Vec::new();
        let mut termination = Termination::IterationLimit;

        for k in 0..self.max_iter {
            let dl = df(l)?;
            let dr = df(r)?;

            if !(dl < S::zero() && dr > S::zero()) {
                log::warn!("derivative does not bracket zero: f'({:?})={:?}, f'({:?})={:?}",
                           l.to_f64(), dl.to_f64(), r.to_f64(), dr.to_f64());
                termination = Termination::BracketFailure { iteration: k + 1, dl, dr };
                break;
            }

            let zx = secant((l, dl), (r, dr));
            if !zx.is_finite() {
                return Err(SecantMinError::NonFiniteStep { l, r });
            }
            let dz = df(zx)?;
            z = Some(zx);

            let record = IterationRecord { iteration: k + 1, l, r, z: zx, dl, dr, dz };
            log::debug!("iteration {}: [{:?}, {:?}] -> z={:?}, f'(z)={:?}",
                        record.iteration, l.to_f64(), r.to_f64(), zx.to_f64(), dz.to_f64());
            graphs.push(render(&record));
            iterations.push(record);

            if dz < S::zero() {
                l = zx;
            } else {
                r = zx;
            }

            if dz.abs() <= self.tol {
                termination = Termination::Converged;
                break;
            }
        }

        // no pass produced a candidate: the bracket is still [a, b]
        let two = S::one() + S::one();
        let x_min = z.unwrap_or_else(|| (l + r) / two);

        let f_min = value(x_min);
        if !f_min.is_finite() {
            return Err(SecantMinError::NonFiniteValue { x: x_min, value: f_min });
        }

        Ok(Minimization { x_min, f_min, iterations, termination, graphs })
    }
}

/// Zero of the line through `(l, dl)` and `(r, dr)`, written as a correction of `r`.
fn secant<S: Float>((l, dl): (S, S), (r, dr): (S, S)) -> S {
    r - dr * (r - l) / (dr - dl)
}
