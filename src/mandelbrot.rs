// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Mandelbrot escape-time evaluator.  A point on the
//! complex plane is iterated through `z = z * z + c` until its
//! squared magnitude passes the escape radius or the iteration bound
//! is reached; the (smoothed) iteration count is then handed to the
//! color gradient.  Points provably inside the main cardioid are
//! short-circuited without iterating at all, since the interior of
//! the set is both the most expensive region to iterate and the one
//! whose answer we already know.

use std::f64::consts::{FRAC_PI_2, LN_2};

use num::Complex;

use color::{Color, ColorGradient};

const DEFAULT_MAX_ITERATION: u32 = 400;
const DEFAULT_ESCAPE_RADIUS: f64 = 50.0;

/// The Mandelbrot set, with its iteration parameters and the
/// gradient used to color escape velocities.
///
/// `max_iteration` doubles as the gradient position of points that
/// never escape; the gradient's maximal position should track it,
/// which is the caller's responsibility, not ours.
#[derive(Clone, Debug)]
pub struct Mandelbrot {
    /// Upper bound on the escape-time search.
    pub max_iteration: u32,
    /// Squared-magnitude bailout threshold.
    pub escape_radius: f64,
    /// Maps escape positions to colors.
    pub gradient: ColorGradient,
}

impl Mandelbrot {
    /// Constructor, with the classic parameters: 400 iterations, an
    /// escape radius of 50, and a seven-color palette that fades
    /// from deep blue through white and orange back into the black
    /// heart of the set.
    pub fn new() -> Mandelbrot {
        let palette = vec![
            Color::new(0.0, 7.0, 100.0),
            Color::new(237.0, 255.0, 255.0),
            Color::new(255.0, 160.0, 0.0),
            Color::new(160.0, 100.0, 0.0),
            Color::new(0.0, 0.0, 0.0),
            Color::new(0.0, 3.0, 50.0),
            Color::new(0.0, 7.0, 100.0),
        ];
        let gradient = ColorGradient::new(f64::from(DEFAULT_MAX_ITERATION), palette)
            .expect("the default palette is well-formed");
        Mandelbrot {
            max_iteration: DEFAULT_MAX_ITERATION,
            escape_radius: DEFAULT_ESCAPE_RADIUS,
            gradient,
        }
    }

    /// Returns true if the specified point is located in the main
    /// cardioid of the Mandelbrot set.  This is the closed-form
    /// polar test: the point's signed radius around the cusp at
    /// (0.25, 0) is compared against the cardioid bounds derived
    /// from the cosine of its angle.  Points on the real axis are
    /// reported as outside: the angle computation divides by y, and
    /// rather than reason about infinities we let the escape loop
    /// answer for that one-pixel-high line.
    fn in_cardioid(&self, x: f64, y: f64) -> bool {
        if y == 0.0 {
            return false;
        }

        let t = ((x - 0.25) / y).atan() - FRAC_PI_2;
        let rn = ((x - 0.25) * (x - 0.25) + y * y).sqrt() * if y > 0.0 { 1.0 } else { -1.0 };
        let r1 = -(1.0 + t.cos()) / 2.0;
        let r2 = (1.0 - t.cos()) / 2.0;

        rn >= r1 && rn <= r2
    }

    /// Calculates the Color corresponding to a particular point in
    /// the plane, x on the real axis and y on the imaginary axis.
    /// Escaped points get a continuous (smooth) iteration count so
    /// that the gradient shows no banding between adjacent discrete
    /// counts.
    pub fn color_at(&self, x: f64, y: f64) -> Color {
        if self.in_cardioid(x, y) {
            return self.gradient.interpolate(f64::from(self.max_iteration));
        }

        let c = Complex::new(x, y);
        let mut z: Complex<f64> = Complex::new(0.0, 0.0);
        let max_iteration = f64::from(self.max_iteration);
        let mut iteration = 0.0;

        while z.norm_sqr() < self.escape_radius && iteration < max_iteration {
            z = z * z + c;
            iteration += 1.0;
        }

        if iteration < max_iteration {
            let n = ((0.5 * z.norm_sqr().ln()) / LN_2).ln() / LN_2;
            iteration = iteration - n + 1.0;
        }

        self.gradient.interpolate(iteration)
    }
}

impl Default for Mandelbrot {
    fn default() -> Mandelbrot {
        Mandelbrot::new()
    }
}
