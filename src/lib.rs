#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Progressive Mandelbrot renderer
//!
//! The Mandelbrot set takes a point on the complex plane and
//! repeatedly multiplies it by itself, measuring how quickly that
//! number goes to infinity.  This "velocity" is the number used to
//! render the image: a cyclic color gradient turns smoothed escape
//! counts into pixels.
//!
//! What makes this renderer *progressive* is the order in which it
//! computes those pixels.  The image is walked in power-of-two
//! blocks from coarse (32 pixels on a side) down to fine (single
//! pixels), and the whole pixel buffer is handed to the caller after
//! every pass, so a recognizable image appears after a small
//! fraction of the total work and sharpens from there.  Later
//! passes only visit the block origins earlier passes skipped, so
//! no point on the plane is ever evaluated twice.  Blocks whose
//! two-sample probe shows disagreement are supersampled; the rest
//! cost one or two evaluations.

extern crate crossbeam;
extern crate itertools;
extern crate num;

pub mod color;
pub mod mandelbrot;
pub mod navigator;
pub mod progressive;
pub mod sampler;

pub use color::{Color, ColorGradient};
pub use mandelbrot::Mandelbrot;
pub use navigator::Navigator;
pub use progressive::{ProgressiveRenderer, RenderHandle, RenderRequest, RenderUpdate};
pub use sampler::ColorSampler;
