//! Synthesis of the five-node filmic spline from the user parameters.
//!
//! The curve lives in log/display coordinates: x is the log-encoded
//! scene value in [0, 1], y the display value before the output transfer
//! exponent. The central latitude is affine by construction; the toe and
//! shoulder are polynomials solved from value, slope and curvature
//! constraints at their nodes.

use nalgebra::{Matrix4, Matrix5, Vector4, Vector5};

use crate::params::{CurveType, FilmicParams};
use crate::solver;

pub const TOE: usize = 0;
pub const SHOULDER: usize = 1;
pub const LATITUDE: usize = 2;

/// Piecewise-polynomial tone curve. Coefficients are stored per segment,
/// constant term first, and kept in f64 so node continuity survives the
/// cancellation-heavy Horner evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmicSpline {
    pub x: [f32; 5],
    pub y: [f32; 5],
    pub coeffs: [[f64; 5]; 3],
    pub latitude_min: f32,
    pub latitude_max: f32,
}

impl FilmicSpline {
    /// Identity curve, the fallback when a boundary system degenerates.
    pub fn identity() -> Self {
        let mut coeffs = [[0.0; 5]; 3];
        coeffs[TOE][1] = 1.0;
        coeffs[SHOULDER][1] = 1.0;
        coeffs[LATITUDE][1] = 1.0;
        Self {
            x: [0.0, 0.25, 0.5, 0.75, 1.0],
            y: [0.0, 0.25, 0.5, 0.75, 1.0],
            coeffs,
            latitude_min: 0.25,
            latitude_max: 0.75,
        }
    }

    /// Evaluates the curve at a log-encoded value by Horner's rule on
    /// the segment owning `x`.
    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        let seg = if x < self.latitude_min {
            TOE
        } else if x > self.latitude_max {
            SHOULDER
        } else {
            LATITUDE
        };
        let m = &self.coeffs[seg];
        let x = x as f64;
        (m[0] + x * (m[1] + x * (m[2] + x * (m[3] + x * m[4])))) as f32
    }
}

/// Scalar anchors shared by the curve synthesis and the parameter
/// commit: the effective source range, the grey placements and the
/// clamped contrast.
#[derive(Debug, Clone, Copy)]
pub struct ToneAnchors {
    pub white_source: f32,
    pub black_source: f32,
    pub dynamic_range: f32,
    pub grey_source: f32,
    pub grey_log: f32,
    pub grey_display: f32,
    pub output_power: f32,
    pub contrast: f32,
}

impl ToneAnchors {
    pub fn from_params(p: &FilmicParams) -> Self {
        let enlarge = 1.0 + p.security_factor / 100.0;
        let white_source = p.white_point_source * enlarge;
        let black_source = p.black_point_source * enlarge;
        let dynamic_range = white_source - black_source;

        // middle grey after log encoding
        let grey_log = black_source.abs() / dynamic_range;

        let grey_source = if p.custom_grey {
            p.grey_point_source / 100.0
        } else {
            0.1845
        };
        let grey_target = if p.custom_grey {
            p.grey_point_target / 100.0
        } else {
            0.1845
        };

        let output_power = if p.auto_hardness {
            grey_target.ln() / grey_log.ln()
        } else {
            p.output_power
        };
        let grey_display = grey_target.powf(1.0 / output_power);

        // the latitude needs a non-positive y-intercept to keep the
        // outer boundary systems satisfiable
        let mut contrast = p.contrast;
        if contrast < grey_display / grey_log {
            contrast = 1.0001 * grey_display / grey_log;
        }

        Self {
            white_source,
            black_source,
            dynamic_range,
            grey_source,
            grey_log,
            grey_display,
            output_power,
            contrast,
        }
    }
}

/// Builds the spline for a parameter set. `None` when a boundary system
/// is degenerate; callers fall back to [`FilmicSpline::identity`].
pub fn compute_spline(p: &FilmicParams) -> Option<FilmicSpline> {
    let anchors = ToneAnchors::from_params(p);
    compute_spline_with_anchors(p, &anchors)
}

pub(crate) fn compute_spline_with_anchors(
    p: &FilmicParams,
    a: &ToneAnchors,
) -> Option<FilmicSpline> {
    let contrast = a.contrast as f64;
    let dynamic_range = a.dynamic_range as f64;
    let grey_log = a.grey_log as f64;
    let grey_display = a.grey_display as f64;

    let latitude = (p.latitude.clamp(0.0, 100.0) as f64 / 100.0) * dynamic_range;
    let balance = p.balance.clamp(-50.0, 50.0) as f64 / 100.0;

    let mut toe_log =
        grey_log - (latitude / dynamic_range) * (a.black_source as f64 / dynamic_range).abs();
    let mut shoulder_log =
        grey_log + (latitude / dynamic_range) * (a.white_source as f64 / dynamic_range).abs();

    // y follows the latitude line at the log nodes
    let linear_intercept = grey_display - contrast * grey_log;

    // shift the latitude along its own slope: shadows/highlights balance
    let norm = (contrast * contrast + 1.0).sqrt();
    let coeff = -(2.0 * latitude / dynamic_range) * balance;
    toe_log += coeff / norm;
    shoulder_log += coeff / norm;

    // keep the nodes ordered around grey; y stays on the latitude line
    toe_log = toe_log.clamp(0.0, grey_log);
    shoulder_log = shoulder_log.clamp(grey_log, 1.0);
    let toe_display = contrast * toe_log + linear_intercept;
    let shoulder_display = contrast * shoulder_log + linear_intercept;

    let black_display = (p.black_point_target.max(0.0) as f64 / 100.0)
        .powf(1.0 / a.output_power as f64)
        .clamp(0.0, 1.0);
    let white_display = (p.white_point_target as f64 / 100.0)
        .powf(1.0 / a.output_power as f64)
        .clamp(0.0, 1.0);

    let x = [0.0, toe_log, grey_log, shoulder_log, 1.0];
    let y = [
        black_display,
        toe_display,
        grey_display,
        shoulder_display,
        white_display,
    ];

    let mut coeffs = [[0.0f64; 5]; 3];

    // the latitude is affine by construction
    coeffs[LATITUDE][1] = contrast;
    coeffs[LATITUDE][0] = y[1] - contrast * x[1];

    coeffs[TOE] = solve_toe(p.shadows, x[1], y[0], y[1], contrast)?;
    coeffs[SHOULDER] = solve_shoulder(p.highlights, x[3], y[3], y[4], contrast)?;

    Some(FilmicSpline {
        x: x.map(|v| v as f32),
        y: y.map(|v| v as f32),
        coeffs,
        latitude_min: x[1] as f32,
        latitude_max: x[3] as f32,
    })
}

fn solve_toe(order: CurveType, x_t: f64, y_black: f64, y_toe: f64, contrast: f64) -> Option<[f64; 5]> {
    match order {
        CurveType::Poly4 => {
            // value and flat first derivative at 0; value, slope and flat
            // curvature at the toe node. Unknowns x^4 first.
            let a = Matrix5::new(
                0.0, 0.0, 0.0, 0.0, 1.0, //
                0.0, 0.0, 0.0, 1.0, 0.0, //
                x_t.powi(4), x_t.powi(3), x_t * x_t, x_t, 1.0, //
                4.0 * x_t.powi(3), 3.0 * x_t * x_t, 2.0 * x_t, 1.0, 0.0, //
                12.0 * x_t * x_t, 6.0 * x_t, 2.0, 0.0, 0.0,
            );
            let b = Vector5::new(y_black, 0.0, y_toe, contrast, 0.0);
            let sol = solver::solve(a, b)?;
            Some([sol[4], sol[3], sol[2], sol[1], sol[0]])
        }
        CurveType::Poly3 => {
            let a = Matrix4::new(
                x_t.powi(3), x_t * x_t, x_t, 1.0, //
                3.0 * x_t * x_t, 2.0 * x_t, 1.0, 0.0, //
                6.0 * x_t, 2.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            );
            let b = Vector4::new(y_toe, contrast, 0.0, y_black);
            let sol = solver::solve(a, b)?;
            Some([sol[3], sol[2], sol[1], sol[0], 0.0])
        }
    }
}

fn solve_shoulder(
    order: CurveType,
    x_s: f64,
    y_shoulder: f64,
    y_white: f64,
    contrast: f64,
) -> Option<[f64; 5]> {
    match order {
        CurveType::Poly4 => {
            // value and flat first derivative at 1; value, slope and flat
            // curvature at the shoulder node
            let a = Matrix5::new(
                1.0, 1.0, 1.0, 1.0, 1.0, //
                4.0, 3.0, 2.0, 1.0, 0.0, //
                x_s.powi(4), x_s.powi(3), x_s * x_s, x_s, 1.0, //
                4.0 * x_s.powi(3), 3.0 * x_s * x_s, 2.0 * x_s, 1.0, 0.0, //
                12.0 * x_s * x_s, 6.0 * x_s, 2.0, 0.0, 0.0,
            );
            let b = Vector5::new(y_white, 0.0, y_shoulder, contrast, 0.0);
            let sol = solver::solve(a, b)?;
            Some([sol[4], sol[3], sol[2], sol[1], sol[0]])
        }
        CurveType::Poly3 => {
            let a = Matrix4::new(
                x_s.powi(3), x_s * x_s, x_s, 1.0, //
                3.0 * x_s * x_s, 2.0 * x_s, 1.0, 0.0, //
                6.0 * x_s, 2.0, 0.0, 0.0, //
                1.0, 1.0, 1.0, 1.0,
            );
            let b = Vector4::new(y_shoulder, contrast, 0.0, y_white);
            let sol = solver::solve(a, b)?;
            Some([sol[3], sol[2], sol[1], sol[0], 0.0])
        }
    }
}
