// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Navigator, which owns the rectangle of the complex
//! plane currently being looked at and the fractal being looked at
//! through it.  Panning and zooming are plain affine bookkeeping on
//! the two corner points; the renderer only ever reads the corners
//! and the derived width and height.

use num::Complex;

use mandelbrot::Mandelbrot;

/// A view onto the complex plane: the left-lower corner `p0`, the
/// right-upper corner `p1`, and the fractal rendered inside it.  The
/// real part of each corner is the x-component and the imaginary
/// part the y-component.  Operations keep `p0` strictly left of and
/// below `p1`; constructing a renderer re-checks that invariant
/// rather than trusting it.
#[derive(Clone, Debug)]
pub struct Navigator {
    /// The left-lower corner of the viewport.
    pub p0: Complex<f64>,
    /// The right-upper corner of the viewport.
    pub p1: Complex<f64>,
    /// The fractal this Navigator moves through.
    pub fractal: Mandelbrot,
}

impl Navigator {
    /// Constructor.  Starts at the classic full view of the set,
    /// from (-2, -1.5) to (1, 1.5).
    pub fn new() -> Navigator {
        Navigator {
            p0: Complex::new(-2.0, -1.5),
            p1: Complex::new(1.0, 1.5),
            fractal: Mandelbrot::new(),
        }
    }

    /// The horizontal extent of the viewport in plane units.
    pub fn width(&self) -> f64 {
        self.p1.re - self.p0.re
    }

    /// The vertical extent of the viewport in plane units.
    pub fn height(&self) -> f64 {
        self.p1.im - self.p0.im
    }

    /// Translates the viewport by (dx, dy) in plane units.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        let delta = Complex::new(dx, dy);
        self.p0 += delta;
        self.p1 += delta;
    }

    /// Zooms the viewport around the focal point (px, py), given in
    /// plane units.  `scale` is the zoom delta: negative values zoom
    /// in, positive values zoom out, zero leaves the viewport
    /// untouched.  Both corners are pulled toward (or pushed away
    /// from) the focal point so that it stays fixed on screen.
    pub fn zoom(&mut self, scale: f64, px: f64, py: f64) {
        let scale = scale + 1.0;
        let focus = Complex::new(px, py);
        self.p0 = focus - focus * scale + self.p0 * scale;
        self.p1 = focus - focus * scale + self.p1 * scale;
    }

    /// Symmetrically widens or heightens the viewport so that its
    /// aspect ratio matches a `width` by `height` pixel image.  The
    /// dimension that already fits is untouched; the other one grows
    /// so the view is letterboxed in plane space instead of being
    /// stretched on screen.
    pub fn fit_to_aspect(&mut self, width: usize, height: usize) {
        let plane_width = self.width();
        let plane_height = self.height();

        let (computed_width, computed_height);
        if (width as f64) * plane_height < (height as f64) * plane_width {
            computed_width = width as f64;
            computed_height = (computed_width * plane_height / plane_width).floor();
        } else {
            computed_height = height as f64;
            computed_width = (computed_height * plane_width / plane_height).floor();
        }

        let varx = plane_width * (width as f64 - computed_width) / (2.0 * computed_width);
        self.p0 += Complex::new(-varx, 0.0);
        self.p1 += Complex::new(varx, 0.0);

        let vary = plane_height * (height as f64 - computed_height) / (2.0 * computed_height);
        self.p0 += Complex::new(0.0, -vary);
        self.p1 += Complex::new(0.0, vary);
    }
}

impl Default for Navigator {
    fn default() -> Navigator {
        Navigator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_navigator() -> Navigator {
        let mut nav = Navigator::new();
        nav.p0 = Complex::new(-2.0, -2.0);
        nav.p1 = Complex::new(2.0, 2.0);
        nav
    }

    #[test]
    fn width_and_height_derive_from_the_corners() {
        let nav = Navigator::new();
        assert_eq!(nav.width(), 3.0);
        assert_eq!(nav.height(), 3.0);
    }

    #[test]
    fn translate_moves_both_corners() {
        let mut nav = square_navigator();
        nav.translate(1.0, -0.5);
        assert_eq!(nav.p0, Complex::new(-1.0, -2.5));
        assert_eq!(nav.p1, Complex::new(3.0, 1.5));
        assert_eq!(nav.width(), 4.0);
        assert_eq!(nav.height(), 4.0);
    }

    #[test]
    fn zoom_keeps_the_focal_point_fixed() {
        let mut nav = square_navigator();
        // Zoom in by half around the center; the square shrinks
        // symmetrically.
        nav.zoom(-0.5, 0.0, 0.0);
        assert_eq!(nav.p0, Complex::new(-1.0, -1.0));
        assert_eq!(nav.p1, Complex::new(1.0, 1.0));
    }

    #[test]
    fn zoom_around_an_offcenter_focus() {
        let mut nav = square_navigator();
        nav.zoom(-0.5, 2.0, 2.0);
        // The focal corner stays put; the opposite corner moves
        // halfway toward it.
        assert_eq!(nav.p1, Complex::new(2.0, 2.0));
        assert_eq!(nav.p0, Complex::new(0.0, 0.0));
    }

    #[test]
    fn fit_to_aspect_widens_a_narrow_viewport() {
        let mut nav = square_navigator();
        // A 4x4 plane square shown on an 800x400 image: the height
        // fits, the width has to double.
        nav.fit_to_aspect(800, 400);
        assert_eq!(nav.height(), 4.0);
        assert_eq!(nav.width(), 8.0);
        // The widening is symmetric around the old center.
        assert_eq!(nav.p0.re, -4.0);
        assert_eq!(nav.p1.re, 4.0);
    }

    #[test]
    fn fit_to_aspect_leaves_a_matching_viewport_alone() {
        let mut nav = square_navigator();
        nav.fit_to_aspect(512, 512);
        assert_eq!(nav.p0, Complex::new(-2.0, -2.0));
        assert_eq!(nav.p1, Complex::new(2.0, 2.0));
    }
}
