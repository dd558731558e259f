use secant_min::{SecantMin, SecantMinError, Termination};
use std::cell::Cell;

type MinResult = Result<(), SecantMinError<f64>>;

#[test]
fn both_positive_falls_back_to_midpoint() -> MinResult {
    let m = SecantMin::<f64>::new();

    // f(x) = e^x is increasing on the whole bracket
    let r = m.minimize(0.5, 3.25, |x| x.exp(), |x| x.exp())?;

    assert!(r.iterations.is_empty());
    assert_eq!(r.x_min, (0.5 + 3.25) / 2.);
    assert_eq!(r.f_min, r.x_min.exp());
    Ok(())
}

#[test]
fn both_negative_falls_back_to_midpoint() -> MinResult {
    let m = SecantMin::<f64>::new();

    let r = m.minimize(-4., -2., |x| 2. * x, |x| x * x)?;

    assert!(r.iterations.is_empty());
    assert_eq!(r.x_min, -3.);
    match r.termination {
        Termination::BracketFailure { iteration, dl, dr } => {
            assert_eq!(iteration, 1);
            assert_eq!((dl, dr), (-8., -4.));
        }
        t => panic!("unexpected termination: {:?}", t),
    }
    Ok(())
}

#[test]
fn late_bracket_failure_keeps_last_candidate() -> MinResult {
    // a derivative that changes between calls: the first pass sees a valid
    // bracket and a negative slope at the candidate, afterwards it reports a
    // positive slope everywhere
    let calls = Cell::new(0);
    let df = |x: f64| {
        calls.set(calls.get() + 1);
        match calls.get() {
            1 | 2 => x - 0.25,
            3 => -0.5,
            _ => 1.,
        }
    };
    let m = SecantMin::<f64>::new().with_tol(1e-12);

    let r = m.minimize(-1., 1., df, |x| x)?;

    assert_eq!(r.iterations.len(), 1);
    assert_eq!(r.iterations[0].z, 0.25);
    assert_eq!(r.iterations[0].dz, -0.5);
    assert_eq!(r.x_min, 0.25);
    assert_eq!(calls.get(), 5);
    assert!(matches!(r.termination, Termination::BracketFailure { iteration: 2, .. }));
    Ok(())
}

// The secant step is not clamped. With a derivative ratio beyond the precision
// of the arithmetic the candidate rounds onto the right endpoint, the bracket
// stops shrinking and every pass repeats the previous one until the cap.
#[test]
fn extreme_derivative_ratio_stagnates_on_endpoint() -> MinResult {
    let df = |x: f64| if x < 1. { -1e10 } else { 1e-10 };
    let m = SecantMin::<f64>::new().with_tol(1e-12).with_max_iter(20);

    let r = m.minimize(-1., 1., df, |x| x)?;

    assert_eq!(r.termination, Termination::IterationLimit);
    assert_eq!(r.iterations.len(), 20);
    for rec in &r.iterations {
        assert_eq!((rec.l, rec.r), (-1., 1.));
        assert_eq!(rec.z, rec.r);
        assert_eq!(rec.dz, 1e-10);
    }
    assert_eq!(r.x_min, 1.);
    Ok(())
}

// Nearly equal derivative magnitudes of opposite sign: the step lands inside
// the bracket, next to the midpoint.
#[test]
fn tiny_symmetric_derivatives_stay_inside() -> MinResult {
    let df = |x: f64| 1e-300 * x;
    let m = SecantMin::<f64>::new().with_tol(1e-320);

    let r = m.minimize(-1., 1. + 1e-15, df, |x| x * x)?;

    let rec = r.iterations[0];
    assert!(rec.l <= rec.z && rec.z <= rec.r);
    assert!(rec.z.abs() < 1e-14);
    Ok(())
}

// A reversed bracket is accepted as given. With `a > b` the sign condition
// `f'(a) < 0 < f'(b)` describes a maximum, and that is what is found.
#[test]
fn reversed_bracket_finds_maximum() -> MinResult {
    let m = SecantMin::<f64>::new();

    // f(x) = -x^2
    let r = m.minimize(1., -1., |x| -2. * x, |x| -x * x)?;

    assert!(r.converged());
    assert_eq!(r.iterations.len(), 1);
    assert_eq!(r.x_min, 0.);
    assert_eq!(r.f_min, 0.);
    Ok(())
}

#[test]
fn overflowing_step_is_an_error() {
    let df = |x: f64| if x < 0. { -f64::MAX } else { f64::MAX };
    let m = SecantMin::<f64>::new();

    match m.minimize(-1e300, 1e300, df, |x| x) {
        Err(SecantMinError::NonFiniteStep { l, r }) => assert_eq!((l, r), (-1e300, 1e300)),
        r => panic!("unexpected result: {:?}", r),
    }
}

// f' is undefined on a small interval inside the bracket that the endpoints
// never touch; the second candidate lands in it.
#[test]
fn non_finite_derivative_at_candidate_is_an_error() {
    let df = |x: f64| if x > 0.2 && x < 0.25 { f64::NAN } else { x.powi(3) - 1. };
    let m = SecantMin::<f64>::new();
    let mut rendered = 0;

    let r = m.minimize_with_trace(0., 3., df, |x| 0.25 * x.powi(4) - x, |_| {
        rendered += 1;
        Some(())
    });

    match r {
        Err(SecantMinError::NonFiniteDerivative { x, value }) => {
            assert!(x > 0.2 && x < 0.25);
            assert!(value.is_nan());
        }
        r => panic!("unexpected result: {:?}", r),
    }
    assert_eq!(rendered, 1);
}
