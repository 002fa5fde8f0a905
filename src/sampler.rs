// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the ColorSampler, which accumulates color samples for a
//! single pixel block and averages them.  Its real purpose is the
//! cheap anti-aliasing probe: rather than supersampling every block,
//! the renderer takes two samples and asks the sampler whether they
//! disagree enough to make the remaining samples worth computing.
//! Most blocks sit in flat color regions, so the average cost stays
//! at one or two evaluations per block.

use color::Color;

/// Accumulates up to `sample * sample` colors for one pixel block.
/// One sampler is constructed per rendering thread, reset between
/// blocks, and never shared across concurrent block evaluations.
#[derive(Debug)]
pub struct ColorSampler {
    samples: Vec<Color>,
    threshold: f64,
}

impl ColorSampler {
    /// Constructor.  `capacity` is the maximum number of samples a
    /// block can receive (the supersampling factor squared), and
    /// `threshold` is the channel difference, on the 0-255 scale,
    /// above which the probe reports that full supersampling is
    /// warranted.
    pub fn new(capacity: usize, threshold: f64) -> ColorSampler {
        ColorSampler {
            samples: Vec::with_capacity(capacity),
            threshold,
        }
    }

    /// Forgets all accumulated samples.  The backing storage is
    /// retained, so resetting between blocks never reallocates.
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Adds a color to the average.
    pub fn add(&mut self, color: Color) {
        self.samples.push(color);
    }

    /// Adds a color to the average, then compares it against the
    /// immediately preceding sample.  Returns true if any channel
    /// differs by more than the threshold, which the renderer reads
    /// as "this block has detail, supersample it."  At least one
    /// sample must already be present.
    pub fn add_and_is_over_threshold(&mut self, color: Color) -> bool {
        self.samples.push(color);
        let previous = &self.samples[self.samples.len() - 2];

        let delta = (previous.r - color.r)
            .abs()
            .max((previous.g - color.g).abs())
            .max((previous.b - color.b).abs());
        delta > self.threshold
    }

    /// The arithmetic mean of every sample added since the last
    /// reset, one channel at a time.  No rounding happens here.
    pub fn average(&self) -> Color {
        let mut sum = Color::new(0.0, 0.0, 0.0);
        for sample in &self.samples {
            sum.r += sample.r;
            sum.g += sample.g;
            sum.b += sample.b;
        }
        let count = self.samples.len() as f64;
        Color::new(sum.r / count, sum.g / count, sum.b / count)
    }
}
