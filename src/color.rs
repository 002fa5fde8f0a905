// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Color value type and the ColorGradient, which maps a
//! scalar "escape position" onto a cyclic palette of colors.  The
//! escape-time evaluator produces fractional iteration counts, and
//! the gradient is what turns those counts into something worth
//! looking at.

/// An RGB color.  Channels live on the 0-255 scale but are kept as
/// floating point: the gradient and the sampler both interpolate and
/// average colors, and rounding is a display-layer concern, not ours.
/// Nothing here clamps, either; callers feeding positions into a
/// well-formed gradient never leave the scale.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    /// Red channel, 0.0 to 255.0.
    pub r: f64,
    /// Green channel, 0.0 to 255.0.
    pub g: f64,
    /// Blue channel, 0.0 to 255.0.
    pub b: f64,
}

impl Color {
    /// Constructor, from the three channel values.
    pub fn new(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    /// Returns the color lying at `position` (0.0 to 1.0, inclusive)
    /// along the straight line between this color and `other`, one
    /// channel at a time.
    pub fn interpolate_to(&self, other: &Color, position: f64) -> Color {
        Color {
            r: self.r + position * (other.r - self.r),
            g: self.g + position * (other.g - self.g),
            b: self.b + position * (other.b - self.b),
        }
    }
}

/// A cyclic color gradient over an ordered list of at least two
/// colors.  A position is mapped to a pair of adjacent palette
/// entries and linearly interpolated between them; positions at or
/// past `maximal_position` get the fixed dead color instead, which is
/// how "never escaped" points end up as the conventional black heart
/// of the set.
///
/// `param` is the number of position units a full traversal of the
/// palette covers, so smaller values cycle the palette faster.
/// `offset` is a phase shift applied before wrapping, which lets a
/// caller animate or nudge the palette without touching the colors
/// themselves.  Both may be reconfigured between render requests but
/// must never change during one.
#[derive(Clone, Debug)]
pub struct ColorGradient {
    /// The palette.  Guaranteed by construction to hold at least two
    /// entries.
    colors: Vec<Color>,
    /// Positions at or beyond this value map to `dead_color`.
    maximal_position: f64,
    /// The color of points that never escape.  Black by default.
    pub dead_color: Color,
    /// Compression factor: position units per full palette traversal.
    /// Must stay strictly positive.
    pub param: f64,
    /// Phase shift added to every position before wrapping.
    pub offset: f64,
}

impl ColorGradient {
    /// Constructor.  Takes the position corresponding to "never
    /// escaped" and the palette.  A palette with fewer than two
    /// colors has no segment to interpolate across (and would divide
    /// by zero further down), so it is rejected here rather than
    /// special-cased everywhere else.
    pub fn new(maximal_position: f64, colors: Vec<Color>) -> Result<ColorGradient, String> {
        if colors.len() < 2 {
            return Err("A color gradient needs at least two colors.".to_string());
        }
        if maximal_position <= 0.0 {
            return Err("The maximal position of a gradient must be positive.".to_string());
        }
        Ok(ColorGradient {
            colors,
            maximal_position,
            dead_color: Color::new(0.0, 0.0, 0.0),
            param: 100.0,
            offset: 0.0,
        })
    }

    /// The position at and beyond which `interpolate` returns the
    /// dead color.
    pub fn maximal_position(&self) -> f64 {
        self.maximal_position
    }

    /// Moves the position at and beyond which colors die.  The
    /// evaluator's iteration bound is not synchronized with the
    /// gradient automatically; a caller that changes one must change
    /// the other through this setter, or never-escaping points stop
    /// landing on the dead color.
    pub fn set_maximal_position(&mut self, maximal_position: f64) -> Result<(), String> {
        if maximal_position <= 0.0 {
            return Err("The maximal position of a gradient must be positive.".to_string());
        }
        self.maximal_position = maximal_position;
        Ok(())
    }

    /// Returns the Color corresponding to the position specified.
    /// Positions below `maximal_position` are phase-shifted by
    /// `offset`, wrapped back into range, and then interpolated
    /// within the palette segment they land on.
    pub fn interpolate(&self, position: f64) -> Color {
        if position >= self.maximal_position {
            return self.dead_color;
        }

        let mut position = (position + self.offset) % self.maximal_position;
        if position < 0.0 {
            position += self.maximal_position;
        }

        let segments = (self.colors.len() - 1) as f64;
        let index = ((position * segments / self.param) as usize) % (self.colors.len() - 1);

        // Fractional position within the current palette segment.
        let segment_width = self.param / segments;
        let fraction = (position % segment_width) / segment_width;

        self.colors[index].interpolate_to(&self.colors[index + 1], fraction)
    }
}
