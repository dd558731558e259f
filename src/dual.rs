//! Forward-mode dual numbers, used to differentiate parsed expressions exactly.

use num_traits::Float;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// `re + eps·ε` with `ε² = 0`.
#[derive(Clone,Copy,Debug,Default,PartialEq)]
pub struct Dual<F: Float> {
    /// Value
    pub re: F,
    /// Derivative
    pub eps: F,
}

impl<F: Float> Dual<F> {
    pub fn new(re: F, eps: F) -> Self {
        Dual { re, eps }
    }

    pub fn constant(re: F) -> Self {
        Dual { re, eps: F::zero() }
    }

    /// The independent variable at `re`.
    pub fn variable(re: F) -> Self {
        Dual { re, eps: F::one() }
    }

    fn chain(self, f_val: F, f_deriv: F) -> Self {
        Dual { re: f_val, eps: self.eps * f_deriv }
    }

    fn flat(self, f_val: F) -> Self {
        Dual { re: f_val, eps: F::zero() }
    }

    pub fn sqrt(self) -> Self {
        let s = self.re.sqrt();
        self.chain(s, F::one() / (s + s))
    }

    /// `self^n`. A constant exponent uses the power rule only, so `x^2` is
    /// differentiable at zero and for negative `x`.
    pub fn powf(self, n: Self) -> Self {
        let val = self.re.powf(n.re);
        let base = if self.eps == F::zero() {
            F::zero()
        } else {
            n.re * self.re.powf(n.re - F::one()) * self.eps
        };
        let exponent = if n.eps == F::zero() {
            F::zero()
        } else {
            val * self.re.ln() * n.eps
        };
        Dual { re: val, eps: base + exponent }
    }

    pub fn exp(self) -> Self {
        let e = self.re.exp();
        self.chain(e, e)
    }

    pub fn ln(self) -> Self {
        self.chain(self.re.ln(), self.re.recip())
    }

    pub fn sin(self) -> Self {
        self.chain(self.re.sin(), self.re.cos())
    }

    pub fn cos(self) -> Self {
        self.chain(self.re.cos(), -self.re.sin())
    }

    pub fn tan(self) -> Self {
        let c = self.re.cos();
        self.chain(self.re.tan(), (c * c).recip())
    }

    pub fn asin(self) -> Self {
        self.chain(self.re.asin(), (F::one() - self.re * self.re).sqrt().recip())
    }

    pub fn acos(self) -> Self {
        self.chain(self.re.acos(), -(F::one() - self.re * self.re).sqrt().recip())
    }

    pub fn atan(self) -> Self {
        self.chain(self.re.atan(), (F::one() + self.re * self.re).recip())
    }

    /// `atan2(self, other)`, i.e. the angle of the point `(other, self)`.
    pub fn atan2(self, other: Self) -> Self {
        let denom = self.re * self.re + other.re * other.re;
        Dual {
            re: self.re.atan2(other.re),
            eps: (other.re * self.eps - self.re * other.eps) / denom,
        }
    }

    pub fn sinh(self) -> Self {
        self.chain(self.re.sinh(), self.re.cosh())
    }

    pub fn cosh(self) -> Self {
        self.chain(self.re.cosh(), self.re.sinh())
    }

    pub fn tanh(self) -> Self {
        let c = self.re.cosh();
        self.chain(self.re.tanh(), (c * c).recip())
    }

    pub fn asinh(self) -> Self {
        self.chain(self.re.asinh(), (self.re * self.re + F::one()).sqrt().recip())
    }

    pub fn acosh(self) -> Self {
        self.chain(self.re.acosh(), (self.re * self.re - F::one()).sqrt().recip())
    }

    pub fn atanh(self) -> Self {
        self.chain(self.re.atanh(), (F::one() - self.re * self.re).recip())
    }

    /// The slope at zero is taken as zero.
    pub fn abs(self) -> Self {
        let s = if self.re == F::zero() { F::zero() } else { self.re.signum() };
        self.chain(self.re.abs(), s)
    }

    pub fn signum(self) -> Self { self.flat(self.re.signum()) }
    pub fn floor(self) -> Self { self.flat(self.re.floor()) }
    pub fn ceil(self) -> Self { self.flat(self.re.ceil()) }
    pub fn round(self) -> Self { self.flat(self.re.round()) }

    pub fn max(self, other: Self) -> Self {
        if self.re >= other.re { self } else { other }
    }

    pub fn min(self, other: Self) -> Self {
        if self.re <= other.re { self } else { other }
    }
}

impl<F: Float> Add for Dual<F> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Dual { re: self.re + rhs.re, eps: self.eps + rhs.eps }
    }
}

impl<F: Float> Sub for Dual<F> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Dual { re: self.re - rhs.re, eps: self.eps - rhs.eps }
    }
}

impl<F: Float> Mul for Dual<F> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Dual { re: self.re * rhs.re, eps: self.re * rhs.eps + self.eps * rhs.re }
    }
}

impl<F: Float> Div for Dual<F> {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        let inv = rhs.re.recip();
        Dual {
            re: self.re * inv,
            eps: (self.eps * rhs.re - self.re * rhs.eps) * inv * inv,
        }
    }
}

impl<F: Float> Neg for Dual<F> {
    type Output = Self;
    fn neg(self) -> Self {
        Dual { re: -self.re, eps: -self.eps }
    }
}

// a % b = a - trunc(a / b) * b
impl<F: Float> Rem for Dual<F> {
    type Output = Self;
    fn rem(self, rhs: Self) -> Self {
        Dual {
            re: self.re % rhs.re,
            eps: self.eps - (self.re / rhs.re).trunc() * rhs.eps,
        }
    }
}
