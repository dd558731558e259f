//! Local minimization of a function of one variable by the secant method on its derivative.
//!
//! ```rust
//! use secant_min::SecantMin;
//!
//! let m = SecantMin::<f64>::new();
//! // f(x) = x^2 on [-1, 1]
//! let r = m.minimize(-1., 1., |x| 2. * x, |x| x * x).unwrap();
//!
//! assert!(r.converged());
//! assert!(r.x_min.abs() < 1e-4);
//! ```

pub mod config;
pub mod dual;
pub mod expr;
pub mod plot;
pub mod secant;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use expr::{ExprError, Expression};
pub use plot::{Graph, PlotError, Plotter};
pub use secant::{IterationRecord, Minimization, SecantMin, SecantMinError, Termination};
pub use server::{serve, ApiError, ApiRequest, App, Reply, ServeError};
