//! HTTP server for the secant minimizer.
//!
//! Configuration is read from `SECANT_MIN_*` environment variables, logging
//! from `RUST_LOG` (default `info`).

use secant_min::{serve, App, ServerConfig};
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = match ServerConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            process::exit(2);
        }
    };

    if let Err(e) = serve(&App::new(cfg)) {
        log::error!("{}", e);
        process::exit(1);
    }
}
