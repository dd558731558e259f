//! HTTP surface of the minimizer.
//!
//!   - `GET /`: health check
//!   - `POST /minimize`: `{fx, a, b, tol, max_iter?}` to the minimization result
//!
//! Routing is a plain function of the request (`App::route`); `serve` runs the
//! blocking accept loop on top of `tiny_http`.

use crate::config::ServerConfig;
use crate::expr::{ExprError, Expression};
use crate::plot::{Graph, Plotter, PNG_DATA_URI};
use crate::secant::{IterationRecord, SecantMin, SecantMinError, Termination};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::{self, Read};
use thiserror::Error;
use tiny_http::{Header, Method, Response, Server};

pub const HEALTH_MESSAGE: &str = "Secant Minimization API is running!";

/// Request bodies above this size are answered with 413.
pub const MAX_BODY_BYTES: usize = 1 << 20;

const ALLOWED_METHODS: [&str; 2] = ["GET", "POST"];

#[derive(Debug,Error)]
pub enum ServeError {
    #[error("could not listen on {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

/// Errors of a single `/minimize` call.
#[derive(Debug,Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    Body(#[from] serde_json::Error),

    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error(transparent)]
    Minimize(#[from] SecantMinError<f64>),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Body(_) => 422,
            ApiError::Expr(_) | ApiError::Minimize(_) => 400,
        }
    }
}

#[derive(Debug,Clone,Deserialize)]
pub struct MinimizeRequest {
    pub fx: String,
    pub a: f64,
    pub b: f64,
    pub tol: f64,
    #[serde(default)]
    pub max_iter: Option<usize>,
}

#[derive(Debug,Clone,Serialize)]
pub struct MinimizeResponse {
    pub x_min: f64,
    pub f_min: f64,
    pub iterations: Vec<IterationRecord<f64>>,
    /// Data URIs of the per-iteration plots that rendered; failed ones are left out.
    pub graphs: Vec<String>,
    pub termination: Termination<f64>,
    /// Data URI of the summary plot; an empty payload if it failed to render.
    pub final_graph: String,
}

/// The parts of an HTTP request the router looks at.
#[derive(Debug,Clone)]
pub struct ApiRequest<'a> {
    pub method: Method,
    pub path: &'a str,
    pub origin: Option<&'a str>,
    /// `Access-Control-Request-Method` of a preflight
    pub request_method: Option<&'a str>,
    /// `Access-Control-Request-Headers` of a preflight
    pub request_headers: Option<&'a str>,
    pub body: &'a [u8],
}

impl<'a> ApiRequest<'a> {
    pub fn new(method: Method, path: &'a str) -> Self {
        ApiRequest {
            method,
            path,
            origin: None,
            request_method: None,
            request_headers: None,
            body: &[],
        }
    }

    pub fn with_origin(mut self, origin: &'a str) -> Self { self.origin = Some(origin); self }
    pub fn with_body(mut self, body: &'a [u8]) -> Self { self.body = body; self }

    pub fn with_preflight(mut self, method: &'a str, headers: Option<&'a str>) -> Self {
        self.request_method = Some(method);
        self.request_headers = headers;
        self
    }
}

#[derive(Debug,Clone,PartialEq)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl Reply {
    fn json(status: u16, body: serde_json::Value) -> Reply {
        Reply {
            status,
            headers: vec![("Content-Type", "application/json".to_string())],
            body: body.to_string(),
        }
    }

    fn detail(status: u16, detail: &str) -> Reply {
        Reply::json(status, json!({ "detail": detail }))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct App {
    cfg: ServerConfig,
    plotter: Option<Plotter>,
}

impl App {
    pub fn new(cfg: ServerConfig) -> Self {
        App { cfg, plotter: Some(Plotter::new()) }
    }

    pub fn with_plotter(mut self, plotter: Plotter) -> Self {
        self.plotter = Some(plotter);
        self
    }

    /// Skip all rendering; `graphs` is empty and `final_graph` has no payload.
    pub fn without_plots(mut self) -> Self {
        self.plotter = None;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.cfg
    }

    pub fn route(&self, req: &ApiRequest) -> Reply {
        let path = req.path.split('?').next().unwrap_or("");
        let allowed = req.origin.filter(|o| *o == self.cfg.allowed_origin());

        if req.method == Method::Options && req.request_method.is_some() {
            return self.preflight(req, allowed);
        }

        let mut reply = match (&req.method, path) {
            (Method::Get, "/") => Reply::json(200, json!({ "message": HEALTH_MESSAGE })),
            (Method::Post, "/minimize") => match self.minimize(req.body) {
                Ok(r) => match serde_json::to_value(&r) {
                    Ok(v) => Reply::json(200, v),
                    Err(e) => Reply::detail(500, &e.to_string()),
                },
                Err(e) => Reply::detail(e.status(), &e.to_string()),
            },
            (_, "/") | (_, "/minimize") => Reply::detail(405, "Method Not Allowed"),
            _ => Reply::detail(404, "Not Found"),
        };

        if let Some(origin) = allowed {
            reply.headers.push(("Access-Control-Allow-Origin", origin.to_string()));
            reply.headers.push(("Access-Control-Allow-Credentials", "true".to_string()));
        }
        if req.origin.is_some() {
            reply.headers.push(("Vary", "Origin".to_string()));
        }

        log::info!("{} {} -> {}", req.method, req.path, reply.status);
        reply
    }

    fn preflight(&self, req: &ApiRequest, allowed: Option<&str>) -> Reply {
        let method_ok = req.request_method
                           .map_or(false, |m| ALLOWED_METHODS.contains(&m.trim()));

        let reply = match allowed {
            Some(origin) if method_ok => {
                let mut reply = Reply {
                    status: 200,
                    headers: vec![("Content-Type", "text/plain".to_string())],
                    body: "OK".to_string(),
                };
                reply.headers.push(("Access-Control-Allow-Origin", origin.to_string()));
                reply.headers.push(("Access-Control-Allow-Credentials", "true".to_string()));
                reply.headers.push(("Access-Control-Allow-Methods", ALLOWED_METHODS.join(", ")));
                if let Some(h) = req.request_headers {
                    reply.headers.push(("Access-Control-Allow-Headers", h.to_string()));
                }
                reply.headers.push(("Access-Control-Max-Age", "600".to_string()));
                reply
            }
            Some(_) => Reply::detail(400, "Disallowed CORS method"),
            None => Reply::detail(400, "Disallowed CORS origin"),
        };

        log::info!("OPTIONS {} -> {}", req.path, reply.status);
        reply
    }

    pub fn minimize(&self, body: &[u8]) -> Result<MinimizeResponse, ApiError> {
        let req: MinimizeRequest = serde_json::from_slice(body)?;
        let expr = Expression::parse(&req.fx)?;

        let m = SecantMin {
            tol: req.tol,
            max_iter: req.max_iter.unwrap_or(self.cfg.max_iter()),
        };
        let plotter = self.plotter.as_ref();

        let r = m.minimize_with_trace(req.a, req.b,
                                      |x| expr.derivative(x),
                                      |x| expr.value(x),
                                      |rec| {
            match plotter?.iteration(|x| expr.value(x), rec) {
                Ok(g) => Some(g),
                Err(e) => {
                    log::warn!("no graph for iteration {}: {}", rec.iteration, e);
                    None
                }
            }
        })?;

        let final_graph = match plotter.map(|p| p.summary(|x| expr.value(x),
                                                          |x| expr.derivative(x),
                                                          r.x_min)) {
            Some(Ok(g)) => g.to_data_uri(),
            Some(Err(e)) => {
                log::warn!("no final graph: {}", e);
                PNG_DATA_URI.to_string()
            }
            None => PNG_DATA_URI.to_string(),
        };

        Ok(MinimizeResponse {
            x_min: r.x_min,
            f_min: r.f_min,
            graphs: r.rendered().map(Graph::to_data_uri).collect(),
            iterations: r.iterations,
            termination: r.termination,
            final_graph,
        })
    }
}

/// Serve `app` until the listener shuts down.
pub fn serve(app: &App) -> Result<(), ServeError> {
    let addr = app.config().addr();
    let server = Server::http(addr)
        .map_err(|e| ServeError::Bind { addr: addr.to_string(), reason: e.to_string() })?;
    log::info!("listening on http://{}, allowing origin {}", addr, app.config().allowed_origin());

    for mut request in server.incoming_requests() {
        let declared = request.body_length();
        let body = match read_body(request.as_reader(), declared, MAX_BODY_BYTES) {
            Ok(Some(body)) => body,
            Ok(None) => {
                log::warn!("{} {}: body larger than {} bytes", request.method(), request.url(), MAX_BODY_BYTES);
                respond(request, Reply::detail(413, "Payload Too Large"));
                continue;
            }
            Err(e) => {
                log::warn!("could not read request body: {}", e);
                continue;
            }
        };

        let origin = header(&request, "Origin");
        let request_method = header(&request, "Access-Control-Request-Method");
        let request_headers = header(&request, "Access-Control-Request-Headers");
        let api = ApiRequest {
            method: request.method().clone(),
            path: request.url(),
            origin: origin.as_deref(),
            request_method: request_method.as_deref(),
            request_headers: request_headers.as_deref(),
            body: &body,
        };
        let reply = app.route(&api);

        respond(request, reply);
    }

    Ok(())
}

/// Reads at most `limit` bytes; `None` if the body is larger, whether declared or actual.
fn read_body<R: Read>(reader: R, declared: Option<usize>, limit: usize) -> io::Result<Option<Vec<u8>>> {
    if declared.map_or(false, |n| n > limit) {
        return Ok(None);
    }
    let mut body = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut body)?;
    if body.len() > limit {
        return Ok(None);
    }
    Ok(Some(body))
}

fn respond(request: tiny_http::Request, reply: Reply) {
    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    for (name, value) in reply.headers {
        match Header::from_bytes(name, value) {
            Ok(h) => response.add_header(h),
            Err(()) => log::warn!("dropping malformed header {}", name),
        }
    }
    if let Err(e) = request.respond(response) {
        log::warn!("could not send response: {}", e);
    }
}

fn header(request: &tiny_http::Request, name: &'static str) -> Option<String> {
    request.headers()
           .iter()
           .find(|h| h.field.equiv(name))
           .map(|h| h.value.as_str().to_string())
}
