//! Single-variable expressions in `x`.
//!
//! Parsing is done by `meval`. Python-style `**` and `log(` are accepted and
//! rewritten to `^` and `ln(`. The derivative is exact: the parsed expression
//! is evaluated again over dual numbers.

use crate::dual::Dual;
use meval::tokenizer::{Operation, Token};
use meval::Expr;
use std::f64::consts;
use std::fmt;
use thiserror::Error;

#[derive(Debug,Error)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,

    #[error("invalid expression `{expr}`: {source}")]
    Parse { expr: String, source: meval::Error },
}

/// A parsed function `f(x)` together with its derivative.
pub struct Expression {
    expr: String,
    rpn: Vec<Token>,
    f: Box<dyn Fn(f64) -> f64>,
}

impl Expression {
    pub fn parse(src: &str) -> Result<Expression, ExprError> {
        let expr = normalize(src);
        if expr.is_empty() {
            return Err(ExprError::Empty);
        }

        let parsed = expr.parse::<Expr>()
                         .map_err(|source| ExprError::Parse { expr: src.to_string(), source })?;
        let rpn = parsed.to_vec();
        let f = parsed.bind("x")
                      .map_err(|source| ExprError::Parse { expr: src.to_string(), source })?;

        Ok(Expression { expr, rpn, f: Box::new(f) })
    }

    /// The normalized source, as handed to the parser.
    pub fn as_str(&self) -> &str {
        &self.expr
    }

    pub fn value(&self, x: f64) -> f64 {
        (self.f)(x)
    }

    /// `f'(x)`, NaN wherever `f(x)` itself is not finite.
    pub fn derivative(&self, x: f64) -> f64 {
        match eval_dual(&self.rpn, Dual::variable(x)) {
            Some(d) if d.re.is_finite() => d.eps,
            _ => f64::NAN,
        }
    }
}

/// Evaluates the RPN of a bound expression; `None` only on a malformed stack,
/// which `bind` has already ruled out.
fn eval_dual(rpn: &[Token], x: Dual<f64>) -> Option<Dual<f64>> {
    let mut stack: Vec<Dual<f64>> = Vec::with_capacity(16);

    for token in rpn {
        match token {
            Token::Number(v) => stack.push(Dual::constant(*v)),
            Token::Var(name) => stack.push(match name.as_str() {
                "x" => x,
                "pi" => Dual::constant(consts::PI),
                "e" => Dual::constant(consts::E),
                _ => return None,
            }),
            Token::Unary(op) => {
                let a = stack.pop()?;
                stack.push(match op {
                    Operation::Minus => -a,
                    _ => a,
                });
            }
            Token::Binary(op) => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                stack.push(match op {
                    Operation::Plus => a + b,
                    Operation::Minus => a - b,
                    Operation::Times => a * b,
                    Operation::Div => a / b,
                    Operation::Rem => a % b,
                    Operation::Pow => a.powf(b),
                });
            }
            Token::Func(name, Some(n)) => {
                let args = stack.split_off(stack.len().checked_sub(*n)?);
                stack.push(call(name, &args)?);
            }
            _ => return None,
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(d), true) => Some(d),
        _ => None,
    }
}

fn call(name: &str, args: &[Dual<f64>]) -> Option<Dual<f64>> {
    let d = match (name, args) {
        ("sqrt", &[a]) => a.sqrt(),
        ("exp", &[a]) => a.exp(),
        ("ln", &[a]) => a.ln(),
        ("abs", &[a]) => a.abs(),
        ("sin", &[a]) => a.sin(),
        ("cos", &[a]) => a.cos(),
        ("tan", &[a]) => a.tan(),
        ("asin", &[a]) => a.asin(),
        ("acos", &[a]) => a.acos(),
        ("atan", &[a]) => a.atan(),
        ("sinh", &[a]) => a.sinh(),
        ("cosh", &[a]) => a.cosh(),
        ("tanh", &[a]) => a.tanh(),
        ("asinh", &[a]) => a.asinh(),
        ("acosh", &[a]) => a.acosh(),
        ("atanh", &[a]) => a.atanh(),
        ("floor", &[a]) => a.floor(),
        ("ceil", &[a]) => a.ceil(),
        ("round", &[a]) => a.round(),
        ("signum", &[a]) => a.signum(),
        ("atan2", &[y, x]) => y.atan2(x),
        ("max", [first, rest @ ..]) => rest.iter().fold(*first, |m, &a| m.max(a)),
        ("min", [first, rest @ ..]) => rest.iter().fold(*first, |m, &a| m.min(a)),
        _ => return None,
    };
    Some(d)
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.expr).finish()
    }
}

fn normalize(src: &str) -> String {
    src.trim().replace("**", "^").replace("log(", "ln(")
}
