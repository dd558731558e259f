use quickcheck::{quickcheck, TestResult};
use secant_min::{IterationRecord, SecantMin, Termination};

/// A bracket `[a, b]` and a strictly increasing derivative
/// `f'(x) = (x - c) + k (x - c)^3` with its zero `c` strictly inside.
#[derive(Debug,Clone,Copy)]
struct Problem {
    a: f64,
    b: f64,
    c: f64,
    k: f64,
}

impl Problem {
    fn new(a: i16, w: u16, t: u8, k: u8) -> Problem {
        let a = a as f64 / 100.;
        let w = (w as f64 + 1.) / 100.;
        Problem {
            a,
            b: a + w,
            c: a + w * (t as f64 + 1.) / 257.,
            k: k as f64 / 10.,
        }
    }

    fn df(&self, x: f64) -> f64 {
        let y = x - self.c;
        y + self.k * y * y * y
    }

    fn f(&self, x: f64) -> f64 {
        let y = x - self.c;
        0.5 * y * y + 0.25 * self.k * y.powi(4)
    }
}

fn solve(p: Problem, tol: f64, max_iter: usize) -> secant_min::Minimization<f64> {
    SecantMin::<f64>::new()
        .with_tol(tol)
        .with_max_iter(max_iter)
        .minimize(p.a, p.b, |x| p.df(x), |x| p.f(x))
        .unwrap()
}

fn next_bracket(rec: &IterationRecord<f64>) -> (f64, f64) {
    if rec.dz < 0. { (rec.z, rec.r) } else { (rec.l, rec.z) }
}

quickcheck! {
    fn trace_is_contiguous_and_bounded(a: i16, w: u16, t: u8, k: u8, n: u8) -> TestResult {
        let p = Problem::new(a, w, t, k);
        let max_iter = n as usize % 50 + 1;
        let r = solve(p, 1e-9, max_iter);

        if r.iterations.len() > max_iter || r.iterations.is_empty() {
            return TestResult::failed();
        }
        let contiguous = r.iterations.iter()
                                     .enumerate()
                                     .all(|(i, rec)| rec.iteration == i + 1);
        TestResult::from_bool(contiguous && r.graphs.len() == r.iterations.len())
    }

    fn one_endpoint_replaced_per_pass(a: i16, w: u16, t: u8, k: u8) -> bool {
        let p = Problem::new(a, w, t, k);
        let r = solve(p, 1e-9, 50);

        r.iterations.windows(2).all(|pair| {
            next_bracket(&pair[0]) == (pair[1].l, pair[1].r)
        })
    }

    fn candidate_within_active_bracket(a: i16, w: u16, t: u8, k: u8) -> bool {
        let p = Problem::new(a, w, t, k);
        let r = solve(p, 1e-9, 50);

        r.iterations.iter().all(|rec| {
            let (lo, hi) = (rec.l.min(rec.r), rec.l.max(rec.r));
            // a few ulps of slack for the rounding of the step
            let slack = 8. * f64::EPSILON * (lo.abs().max(hi.abs()) + (hi - lo));
            lo - slack <= rec.z && rec.z <= hi + slack
        })
    }

    fn stops_at_first_tolerance_hit(a: i16, w: u16, t: u8, k: u8, e: u8) -> bool {
        let p = Problem::new(a, w, t, k);
        let tol = 10f64.powi(-(e as i32 % 12) - 1);
        let max_iter = 60;
        let r = solve(p, tol, max_iter);

        let (last, rest) = match r.iterations.split_last() {
            Some(s) => s,
            None => return false,
        };
        let earlier_missed = rest.iter().all(|rec| rec.dz.abs() > tol);

        earlier_missed && match r.termination {
            Termination::Converged => last.dz.abs() <= tol && r.x_min == last.z,
            Termination::IterationLimit => last.dz.abs() > tol && r.iterations.len() == max_iter,
            Termination::BracketFailure { .. } => last.dz.abs() > tol,
        }
    }

    fn no_sign_change_gives_midpoint(a: i16, w: u16, s: u8) -> bool {
        let a = a as f64 / 1000.;
        let b = a + (w as f64 + 1.) / 1000.;
        // f(x) = +-exp(x): the derivative never changes sign
        let sign = if s % 2 == 0 { 1. } else { -1. };
        let r = SecantMin::<f64>::new()
            .minimize(a, b, |x| sign * x.exp(), |x| sign * x.exp())
            .unwrap();

        r.iterations.is_empty() && r.x_min == (a + b) / 2.
    }

    fn deterministic(a: i16, w: u16, t: u8, k: u8) -> bool {
        let p = Problem::new(a, w, t, k);
        let r1 = solve(p, 1e-9, 50);
        let r2 = solve(p, 1e-9, 50);

        r1.iterations == r2.iterations
            && r1.x_min.to_bits() == r2.x_min.to_bits()
            && r1.f_min.to_bits() == r2.f_min.to_bits()
            && r1.termination == r2.termination
    }
}
