//! Diagnostic plots of a minimization, rendered to PNG with gnuplot.
//!
//! Rendering needs a `gnuplot` executable with the `pngcairo` terminal on the
//! `PATH`. Every failure is reported as a `PlotError`; nothing here can affect
//! the numeric result.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gnuplot::{AxesCommon, Caption, DashType, Figure, Fix, LineStyle, PointSize, PointSymbol};
use ndarray::Array1;
use crate::secant::IterationRecord;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::{env, fs, process};
use thiserror::Error;

/// Prefix of a PNG data URI; on its own it stands for a missing image.
pub const PNG_DATA_URI: &str = "data:image/png;base64,";

static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug,Error)]
pub enum PlotError {
    #[error("gnuplot failed: {0}")]
    Gnuplot(String),

    #[error("could not read rendered image: {0}")]
    Io(#[from] std::io::Error),

    #[error("gnuplot produced an empty image")]
    Empty,
}

/// A rendered PNG image.
#[derive(Debug,Clone,PartialEq)]
pub struct Graph {
    png: Vec<u8>,
}

impl Graph {
    pub fn from_png(png: Vec<u8>) -> Graph {
        Graph { png }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.png
    }

    /// `data:image/png;base64,...`
    pub fn to_data_uri(&self) -> String {
        let mut uri = String::from(PNG_DATA_URI);
        STANDARD.encode_string(&self.png, &mut uri);
        uri
    }
}

/// Plot settings.
#[derive(Debug,Clone)]
pub struct Plotter {
    /// Size of a single-panel image in pixels
    pub size: (u32, u32),
    /// Number of sample points for the per-iteration plot
    pub iteration_samples: usize,
    /// Number of sample points for each panel of the summary plot
    pub summary_samples: usize,
    /// Directory for the intermediate PNG files
    pub dir: PathBuf,
}

impl Default for Plotter {
    fn default() -> Self {
        Plotter {
            size: (600, 400),
            iteration_samples: 1000,
            summary_samples: 500,
            dir: env::temp_dir(),
        }
    }
}

impl Plotter {
    pub fn new() -> Self {
        Default::default()
    }

    /// Plot of `f` around the current bracket with both endpoints and the candidate marked.
    pub fn iteration<F>(&self, f: F, rec: &IterationRecord<f64>) -> Result<Graph, PlotError>
        where F: Fn(f64) -> f64 {
        let (lo, hi) = (rec.l.min(rec.r), rec.l.max(rec.r));
        let (xs, ys) = sample(&f, lo - 0.5, hi + 0.5, self.iteration_samples);
        let (y0, y1) = match extent(&ys) {
            Some((y0, y1)) => (y0, y1 + 10.),
            None => (-1., 1.),
        };

        let mut fg = Figure::new();
        {
            let ax = fg.axes2d()
                       .set_title(&format!("Iteration {}", rec.iteration), &[])
                       .set_x_label("x", &[])
                       .set_y_label("f(x)", &[])
                       .set_x_grid(true)
                       .set_y_grid(true)
                       .set_y_range(Fix(y0), Fix(y1));
            if !xs.is_empty() {
                ax.lines(xs.iter(), ys.iter(), &[Caption("f(x)")]);
            }
            ax.lines(&[rec.l, rec.l], &[y0, y1],
                     &[Caption("a (Lower Bound)"), LineStyle(DashType::Dash)])
              .lines(&[rec.r, rec.r], &[y0, y1],
                     &[Caption("b (Upper Bound)"), LineStyle(DashType::Dash)]);
            let fz = f(rec.z);
            if fz.is_finite() {
                ax.points(&[rec.z], &[fz], &[Caption("Current Min"), PointSymbol('O'), PointSize(1.5)]);
            }
        }

        self.render(&mut fg, self.size)
    }

    /// Function and derivative side by side around `x_min`.
    pub fn summary<F, D>(&self, f: F, df: D, x_min: f64) -> Result<Graph, PlotError>
        where F: Fn(f64) -> f64,
              D: Fn(f64) -> f64 {
        let lo = (x_min - 2.).max(0.1);
        let hi = x_min + 2.;
        let (xs, ys) = sample(&f, lo, hi, self.summary_samples);
        let (dxs, dys) = sample(&df, lo, hi, self.summary_samples);

        let mut fg = Figure::new();
        fg.set_multiplot_layout(1, 2);
        panel(&mut fg, "Function Curve", "f(x)", &xs, &ys, x_min, f(x_min), "Min Point");
        panel(&mut fg, "Derivative Curve", "f'(x)", &dxs, &dys, x_min, df(x_min), "Derivative at Min");

        self.render(&mut fg, (self.size.0 * 2, self.size.1 * 3 / 2))
    }

    fn render(&self, fg: &mut Figure, (w, h): (u32, u32)) -> Result<Graph, PlotError> {
        let path = self.dir.join(format!("secant_min_{}_{}.png",
                                         process::id(),
                                         NEXT_FILE.fetch_add(1, Ordering::Relaxed)));

        let saved = fg.save_to_png(&path, w, h)
                      .map_err(|e| PlotError::Gnuplot(format!("{:?}", e)));
        let png = saved.and_then(|_| fs::read(&path).map_err(PlotError::from));
        let _ = fs::remove_file(&path);

        let png = png?;
        if png.is_empty() {
            return Err(PlotError::Empty);
        }
        Ok(Graph::from_png(png))
    }
}

fn panel(fg: &mut Figure, title: &str, ylabel: &str,
         xs: &[f64], ys: &[f64], x: f64, y: f64, marker: &str) {
    let ax = fg.axes2d()
               .set_title(title, &[])
               .set_x_label("x", &[])
               .set_y_label(ylabel, &[])
               .set_x_grid(true)
               .set_y_grid(true);
    if !xs.is_empty() {
        ax.lines(xs.iter(), ys.iter(), &[Caption(ylabel)]);
    }
    if y.is_finite() {
        ax.points(&[x], &[y], &[Caption(marker), PointSymbol('O'), PointSize(1.5)]);
    }
}

/// `n` evenly spaced samples of `f` on `[lo, hi]`, dropping non-finite values.
fn sample<F>(f: &F, lo: f64, hi: f64, n: usize) -> (Vec<f64>, Vec<f64>)
    where F: Fn(f64) -> f64 {
    Array1::linspace(lo, hi, n)
        .iter()
        .map(|&x| (x, f(x)))
        .filter(|&(_, y)| y.is_finite())
        .unzip()
}

fn extent(ys: &[f64]) -> Option<(f64, f64)> {
    ys.iter().fold(None, |acc, &y| match acc {
        None => Some((y, y)),
        Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
    })
}
