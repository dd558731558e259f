//! Server configuration.
//!
//! Defaults can be overridden through the environment:
//!
//!   - `SECANT_MIN_ADDR`: listening address (`127.0.0.1:8000`)
//!   - `SECANT_MIN_ALLOWED_ORIGIN`: the one origin allowed by CORS (`http://localhost:5173`)
//!   - `SECANT_MIN_MAX_ITER`: iteration cap used when a request does not give one (`100`)

use std::env;
use std::net::SocketAddr;
use thiserror::Error;

pub const ENV_ADDR: &str = "SECANT_MIN_ADDR";
pub const ENV_ALLOWED_ORIGIN: &str = "SECANT_MIN_ALLOWED_ORIGIN";
pub const ENV_MAX_ITER: &str = "SECANT_MIN_MAX_ITER";

#[derive(Debug,Error,Clone,PartialEq,Eq)]
pub enum ConfigError {
    #[error("invalid listening address `{0}`")]
    Addr(String),

    #[error("allowed origin must be a non-empty http(s) origin. got `{0}`")]
    Origin(String),

    #[error("invalid max_iter `{0}`: must be an integer >= 1")]
    MaxIter(String),
}

#[derive(Debug,Clone,PartialEq)]
pub struct ServerConfig {
    addr: SocketAddr,
    allowed_origin: String,
    max_iter: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            allowed_origin: "http://localhost:5173".to_string(),
            max_iter: 100,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Default::default()
    }

    /// Defaults overridden by whichever `SECANT_MIN_*` variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
        where L: Fn(&str) -> Option<String> {
        let mut cfg = Self::default();
        if let Some(v) = lookup(ENV_ADDR) {
            cfg = cfg.with_addr(&v)?;
        }
        if let Some(v) = lookup(ENV_ALLOWED_ORIGIN) {
            cfg = cfg.with_allowed_origin(&v)?;
        }
        if let Some(v) = lookup(ENV_MAX_ITER) {
            let n = v.trim().parse().map_err(|_| ConfigError::MaxIter(v.clone()))?;
            cfg = cfg.with_max_iter(n)?;
        }
        Ok(cfg)
    }

    pub fn with_addr(mut self, addr: &str) -> Result<Self, ConfigError> {
        self.addr = addr.trim().parse().map_err(|_| ConfigError::Addr(addr.to_string()))?;
        Ok(self)
    }

    pub fn with_allowed_origin(mut self, origin: &str) -> Result<Self, ConfigError> {
        let origin = origin.trim().trim_end_matches('/');
        let valid = match origin.split_once("://") {
            Some((scheme, host)) => (scheme == "http" || scheme == "https")
                                    && !host.is_empty() && !host.contains('/'),
            None => false,
        };
        if !valid {
            return Err(ConfigError::Origin(origin.to_string()));
        }
        self.allowed_origin = origin.to_string();
        Ok(self)
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Result<Self, ConfigError> {
        if max_iter == 0 {
            return Err(ConfigError::MaxIter(max_iter.to_string()));
        }
        self.max_iter = max_iter;
        Ok(self)
    }

    pub fn addr(&self) -> SocketAddr { self.addr }
    pub fn allowed_origin(&self) -> &str { &self.allowed_origin }
    pub fn max_iter(&self) -> usize { self.max_iter }
}
