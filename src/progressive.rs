// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the ProgressiveRenderer, the orchestrator of a render
//! request.  It walks the output image in power-of-two block sizes
//! from coarse to fine, evaluating the fractal once per block and
//! painting the block with the result, and hands the caller a full
//! copy of the pixel buffer after every refinement pass.  The first
//! pass gives a usable (if chunky) image almost immediately; each
//! later pass only evaluates the block origins the earlier passes
//! have not already painted, so no point in the plane is ever
//! computed twice.

use itertools::iproduct;
use num::Complex;
use std::cmp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam::channel::{unbounded, Receiver};
use crossbeam::thread::ScopedJoinHandle;

use color::Color;
use navigator::Navigator;
use sampler::ColorSampler;

/// The refinement depth: the coarsest pass paints blocks of
/// 2^REFINEMENT_DEPTH pixels on a side, and each pass halves that
/// until single-pixel blocks finish the image.
const REFINEMENT_DEPTH: usize = 5;

/// The side of the top-level block, in pixels.
const TOP_BLOCK: usize = 1 << REFINEMENT_DEPTH;

/// The channel difference (0-255 scale) between the two probe
/// samples of a block above which the block is fully supersampled.
const SAMPLE_THRESHOLD: f64 = 0.05 * 255.0;

/// A render request: everything the renderer needs to produce one
/// sequence of refinement passes.  This is a plain data-transfer
/// structure; validation happens when the renderer is constructed
/// from it.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    /// The viewport (and fractal) to render.
    pub navigator: Navigator,
    /// Target image width in pixels.
    pub width: usize,
    /// Target image height in pixels.
    pub height: usize,
    /// The supersampling factor: up to `sample * sample` evaluations
    /// per block.  1 disables supersampling.
    pub sample: usize,
}

/// One message in the response stream of a render request.
#[derive(Clone, Debug)]
pub enum RenderUpdate {
    /// The viewport actually being rendered, sent once before any
    /// pixels.  The corners may differ from the request's: the
    /// renderer expands the viewport to match the image's aspect
    /// ratio.
    Viewport {
        /// The left-lower corner after aspect fitting.
        p0: Complex<f64>,
        /// The right-upper corner after aspect fitting.
        p1: Complex<f64>,
    },
    /// A complete RGBA pixel buffer, one per refinement pass, from
    /// the coarsest pass to the finest.
    Pass(Vec<u8>),
}

/// A handle on a render request running on its own thread.  Dropping
/// the handle (or just its receiver) abandons the request; calling
/// `cancel` stops it between blocks.
pub struct RenderHandle {
    updates: Receiver<RenderUpdate>,
    cancel: Arc<AtomicBool>,
}

impl RenderHandle {
    /// The stream of updates for this request: one `Viewport`, then
    /// one `Pass` per refinement pass.  The channel disconnects when
    /// the request completes or is cancelled.
    pub fn updates(&self) -> &Receiver<RenderUpdate> {
        &self.updates
    }

    /// Asks the worker to stop.  All-or-nothing: no further updates
    /// arrive after the flag is seen, including the pass in flight.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Renders one request as a sequence of coarse-to-fine refinement
/// passes.  The renderer owns its navigator snapshot and pixel
/// buffer for the duration of the request; a new request gets a new
/// renderer.
#[derive(Clone, Debug)]
pub struct ProgressiveRenderer {
    navigator: Navigator,
    width: usize,
    height: usize,
    sample: usize,
    threads: usize,
    // Plane units per pixel, per axis.
    delta_x: f64,
    delta_y: f64,
}

impl ProgressiveRenderer {
    /// Constructor.  Validates the request — degenerate dimensions,
    /// an inverted viewport or a zero sample factor would silently
    /// corrupt the output, so they are rejected here — then fits the
    /// viewport to the image's aspect ratio and derives the per-axis
    /// plane-to-pixel deltas.  `threads` is the number of evaluation
    /// threads used within each pass.
    pub fn new(request: RenderRequest, threads: usize) -> Result<ProgressiveRenderer, String> {
        let RenderRequest {
            mut navigator,
            width,
            height,
            sample,
        } = request;

        if width == 0 || height == 0 {
            return Err("The target image must be at least one pixel in each dimension.".to_string());
        }
        if sample == 0 {
            return Err("The supersampling factor must be at least 1.".to_string());
        }
        if threads == 0 {
            return Err("At least one rendering thread is required.".to_string());
        }
        if navigator.p1.re <= navigator.p0.re {
            return Err(
                "The left lower corner is not to the left of the right upper corner.".to_string(),
            );
        }
        if navigator.p1.im <= navigator.p0.im {
            return Err("The left lower corner is not lower than the right upper corner.".to_string());
        }

        navigator.fit_to_aspect(width, height);
        let delta_x = navigator.width() / (width as f64);
        let delta_y = navigator.height() / (height as f64);

        Ok(ProgressiveRenderer {
            navigator,
            width,
            height,
            sample,
            threads,
            delta_x,
            delta_y,
        })
    }

    /// The viewport being rendered, after aspect fitting.
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Target image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Target image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Runs the request to completion on the calling thread.  The
    /// `emit` callback receives the viewport update and then every
    /// per-pass buffer; returning false from it stops the render, as
    /// does setting `cancel` from another thread.
    pub fn run<F>(&self, cancel: &AtomicBool, mut emit: F)
    where
        F: FnMut(RenderUpdate) -> bool,
    {
        if !emit(RenderUpdate::Viewport {
            p0: self.navigator.p0,
            p1: self.navigator.p1,
        }) {
            return;
        }

        let mut buffer = vec![0 as u8; self.width * self.height * 4];
        let mut variation = TOP_BLOCK;
        while variation >= 1 {
            let cells = self.evaluate_pass(variation, cancel);
            if cancel.load(Ordering::Relaxed) {
                return;
            }
            for (px, py, color) in cells {
                self.paint_block(&mut buffer, px, py, variation, &color);
            }
            if !emit(RenderUpdate::Pass(buffer.clone())) {
                return;
            }
            variation /= 2;
        }
    }

    /// Runs the request to completion and returns the final,
    /// fully-refined buffer, discarding the intermediate passes.
    pub fn render(&self) -> Vec<u8> {
        let cancel = AtomicBool::new(false);
        let mut last = Vec::new();
        self.run(&cancel, |update| {
            if let RenderUpdate::Pass(buffer) = update {
                last = buffer;
            }
            true
        });
        last
    }

    /// Moves the renderer onto its own thread and returns a handle
    /// carrying the update stream and the cancellation flag.  This
    /// is the request/response boundary: the caller owns the handle,
    /// the renderer owns everything else.
    pub fn spawn(self) -> RenderHandle {
        let (sender, updates) = unbounded();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        thread::spawn(move || {
            self.run(&flag, |update| sender.send(update).is_ok());
        });
        RenderHandle { updates, cancel }
    }

    /// The block origins evaluated by the pass with the given block
    /// size, relative to the top-level block.  Origins already
    /// aligned to the next-coarser grid were painted by an earlier
    /// pass and are skipped, except on the coarsest pass where
    /// everything is new.  Across all passes the origins partition
    /// the top-level block exactly.
    fn pass_origins(variation: usize) -> Vec<(usize, usize)> {
        iproduct!(
            (0..TOP_BLOCK).step_by(variation),
            (0..TOP_BLOCK).step_by(variation)
        )
        .filter(|&(kx, ky)| {
            variation == TOP_BLOCK || kx % (2 * variation) != 0 || ky % (2 * variation) != 0
        })
        .collect()
    }

    /// Evaluates every new block of one pass and returns the block
    /// positions with their colors.  The origins are pulled from a
    /// shared queue by `threads` scoped workers, each with its own
    /// sampler; painting stays with the caller so the pass is
    /// emitted only once it is complete.
    fn evaluate_pass(
        &self,
        variation: usize,
        cancel: &AtomicBool,
    ) -> Vec<(usize, usize, Color)> {
        let work = Arc::new(Mutex::new(Self::pass_origins(variation).into_iter()));

        let mut cells: Vec<(usize, usize, Color)> = vec![];
        crossbeam::scope(|spawner| {
            let handles: Vec<ScopedJoinHandle<Vec<(usize, usize, Color)>>> = (0..self.threads)
                .map(|_| {
                    let work = work.clone();
                    spawner.spawn(move |_| {
                        let mut sampler =
                            ColorSampler::new(self.sample * self.sample, SAMPLE_THRESHOLD);
                        let mut cells: Vec<(usize, usize, Color)> = vec![];
                        loop {
                            if cancel.load(Ordering::Relaxed) {
                                break;
                            }
                            let origin = { work.lock().unwrap().next() };
                            match origin {
                                Some((kx, ky)) => {
                                    self.evaluate_origin(kx, ky, &mut sampler, &mut cells)
                                }
                                None => {
                                    break;
                                }
                            }
                        }
                        cells
                    })
                })
                .collect();

            cells = handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .flatten()
                .collect()
        })
        .unwrap();
        cells
    }

    /// Evaluates one relative origin at every image-wide tile of the
    /// top-level block.  Each tile position maps to a distinct plane
    /// coordinate, so this is purely a scan-order strategy: the same
    /// relative offset is refreshed across the whole image in one
    /// go, which is what makes each pass a uniformly-detailed
    /// partial image.
    fn evaluate_origin(
        &self,
        kx: usize,
        ky: usize,
        sampler: &mut ColorSampler,
        cells: &mut Vec<(usize, usize, Color)>,
    ) {
        for py in (ky..self.height).step_by(TOP_BLOCK) {
            for px in (kx..self.width).step_by(TOP_BLOCK) {
                let x = self.navigator.p0.re + (px as f64) * self.delta_x;
                let y = self.navigator.p0.im + (py as f64) * self.delta_y;
                cells.push((px, py, self.sample_block(x, y, sampler)));
            }
        }
    }

    /// The representative color of the block whose plane coordinate
    /// is (x, y).  With supersampling enabled, a second sample at a
    /// diagonal offset probes for detail; only when the two disagree
    /// beyond the threshold are the remaining sub-positions of the
    /// block evaluated.  The block's color is the average of
    /// whatever was sampled.
    fn sample_block(&self, x: f64, y: f64, sampler: &mut ColorSampler) -> Color {
        let fractal = &self.navigator.fractal;

        sampler.reset();
        sampler.add(fractal.color_at(x, y));
        if self.sample > 1 {
            let diagonal = ((self.sample - 1) as f64) / (self.sample as f64);
            let probe =
                fractal.color_at(x + self.delta_x * diagonal, y + self.delta_y * diagonal);
            if sampler.add_and_is_over_threshold(probe) {
                for p in 1..self.sample * self.sample - 1 {
                    let sub_x = ((p % self.sample) as f64) / (self.sample as f64);
                    let sub_y = ((p / self.sample) as f64) / (self.sample as f64);
                    sampler.add(
                        fractal.color_at(x + self.delta_x * sub_x, y + self.delta_y * sub_y),
                    );
                }
            }
        }
        sampler.average()
    }

    /// Paints one block's color across its pixel footprint, clipped
    /// to the image bounds.  Alpha is always opaque.
    fn paint_block(&self, buffer: &mut [u8], px: usize, py: usize, variation: usize, color: &Color) {
        for y in py..cmp::min(py + variation, self.height) {
            for x in px..cmp::min(px + variation, self.width) {
                let index = 4 * (self.width * y + x);
                buffer[index] = color.r as u8;
                buffer[index + 1] = color.g as u8;
                buffer[index + 2] = color.b as u8;
                buffer[index + 3] = 255;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// A square viewport well inside the main cardioid: every point
    /// resolves to the dead color without iterating.
    fn interior_request(width: usize, height: usize, sample: usize) -> RenderRequest {
        let mut navigator = Navigator::new();
        navigator.p0 = Complex::new(-0.1, -0.1);
        navigator.p1 = Complex::new(0.1, 0.1);
        RenderRequest {
            navigator,
            width,
            height,
            sample,
        }
    }

    #[test]
    fn rejects_degenerate_requests() {
        let mut request = interior_request(0, 4, 1);
        assert!(ProgressiveRenderer::new(request, 1).is_err());

        request = interior_request(4, 4, 0);
        assert!(ProgressiveRenderer::new(request, 1).is_err());

        request = interior_request(4, 4, 1);
        assert!(ProgressiveRenderer::new(request.clone(), 0).is_err());

        request.navigator.p1 = Complex::new(-0.2, 0.1);
        assert!(ProgressiveRenderer::new(request, 1).is_err());
    }

    #[test]
    fn emits_exactly_six_passes() {
        let renderer = ProgressiveRenderer::new(interior_request(16, 16, 1), 1).unwrap();
        let cancel = AtomicBool::new(false);
        let mut passes = 0;
        let mut viewports = 0;
        renderer.run(&cancel, |update| {
            match update {
                RenderUpdate::Viewport { .. } => viewports += 1,
                RenderUpdate::Pass(_) => passes += 1,
            }
            true
        });
        assert_eq!(viewports, 1);
        assert_eq!(passes, 6);
    }

    #[test]
    fn interior_cardioid_render_is_uniformly_dead() {
        let renderer = ProgressiveRenderer::new(interior_request(4, 4, 1), 1).unwrap();
        let dead = renderer.navigator().fractal.gradient.dead_color;
        let cancel = AtomicBool::new(false);
        renderer.run(&cancel, |update| {
            if let RenderUpdate::Pass(buffer) = update {
                assert_eq!(buffer.len(), 4 * 4 * 4);
                for pixel in buffer.chunks(4) {
                    assert_eq!(pixel[0], dead.r as u8);
                    assert_eq!(pixel[1], dead.g as u8);
                    assert_eq!(pixel[2], dead.b as u8);
                    assert_eq!(pixel[3], 255);
                }
            }
            true
        });
    }

    #[test]
    fn refinement_origins_partition_the_top_block() {
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut variation = TOP_BLOCK;
        while variation >= 1 {
            for origin in ProgressiveRenderer::pass_origins(variation) {
                // No origin is ever revisited by a later pass.
                assert!(seen.insert(origin), "origin {:?} evaluated twice", origin);
            }
            variation /= 2;
        }
        assert_eq!(seen.len(), TOP_BLOCK * TOP_BLOCK);
    }

    #[test]
    fn coarsest_pass_covers_every_pixel() {
        let renderer = ProgressiveRenderer::new(interior_request(50, 50, 1), 1).unwrap();
        let cancel = AtomicBool::new(false);
        let mut first = true;
        renderer.run(&cancel, |update| {
            if let RenderUpdate::Pass(buffer) = update {
                if first {
                    first = false;
                    for pixel in buffer.chunks(4) {
                        assert_eq!(pixel[3], 255);
                    }
                }
            }
            true
        });
    }

    #[test]
    fn threaded_passes_match_the_single_threaded_result() {
        let mut navigator = Navigator::new();
        navigator.p0 = Complex::new(-2.0, -1.5);
        navigator.p1 = Complex::new(1.0, 1.5);
        let request = RenderRequest {
            navigator,
            width: 48,
            height: 48,
            sample: 2,
        };
        let single = ProgressiveRenderer::new(request.clone(), 1).unwrap().render();
        let threaded = ProgressiveRenderer::new(request, 4).unwrap().render();
        assert_eq!(single, threaded);
    }

    #[test]
    fn a_cancelled_run_emits_no_passes() {
        let renderer = ProgressiveRenderer::new(interior_request(16, 16, 1), 1).unwrap();
        let cancel = AtomicBool::new(true);
        let mut passes = 0;
        renderer.run(&cancel, |update| {
            if let RenderUpdate::Pass(_) = update {
                passes += 1;
            }
            true
        });
        assert_eq!(passes, 0);
    }

    #[test]
    fn spawn_streams_a_viewport_then_six_passes() {
        let renderer = ProgressiveRenderer::new(interior_request(8, 8, 2), 2).unwrap();
        let handle = renderer.spawn();

        let updates: Vec<RenderUpdate> = handle.updates().iter().collect();
        assert_eq!(updates.len(), 7);
        match updates[0] {
            RenderUpdate::Viewport { .. } => {}
            _ => panic!("the first update must carry the viewport"),
        }
        for update in &updates[1..] {
            match update {
                &RenderUpdate::Pass(ref buffer) => assert_eq!(buffer.len(), 8 * 8 * 4),
                _ => panic!("pixel passes must follow the viewport update"),
            }
        }
    }
}
