// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end exercises of the public rendering API: a request goes
//! in, a viewport update and six increasingly fine pixel buffers
//! come out.

extern crate mandelview;
extern crate num;

use num::Complex;

use mandelview::{Navigator, ProgressiveRenderer, RenderRequest, RenderUpdate};

fn classic_request(width: usize, height: usize, sample: usize) -> RenderRequest {
    RenderRequest {
        navigator: Navigator::new(),
        width,
        height,
        sample,
    }
}

#[test]
fn full_view_renders_both_interior_and_exterior() {
    let renderer = ProgressiveRenderer::new(classic_request(64, 64, 2), 2).unwrap();
    let dead = renderer.navigator().fractal.gradient.dead_color;
    let buffer = renderer.render();
    assert_eq!(buffer.len(), 64 * 64 * 4);

    let mut interior = 0;
    let mut exterior = 0;
    for pixel in buffer.chunks(4) {
        assert_eq!(pixel[3], 255);
        if pixel[0] == dead.r as u8 && pixel[1] == dead.g as u8 && pixel[2] == dead.b as u8 {
            interior += 1;
        } else {
            exterior += 1;
        }
    }
    // The classic view contains the black heart of the set and its
    // colorful surroundings.
    assert!(interior > 0);
    assert!(exterior > 0);
}

#[test]
fn update_stream_is_a_viewport_then_six_passes() {
    let renderer = ProgressiveRenderer::new(classic_request(40, 30, 1), 1).unwrap();
    let handle = renderer.spawn();
    let updates: Vec<RenderUpdate> = handle.updates().iter().collect();

    assert_eq!(updates.len(), 7);
    match updates[0] {
        RenderUpdate::Viewport { p0, p1 } => {
            // The 40x30 image is wider than the 3x3 plane square, so
            // the viewport was widened to match.
            assert!(p1.re - p0.re > 3.0);
            assert_eq!(p1.im - p0.im, 3.0);
        }
        _ => panic!("the first update must carry the viewport"),
    }
    for update in &updates[1..] {
        match update {
            &RenderUpdate::Pass(ref buffer) => assert_eq!(buffer.len(), 40 * 30 * 4),
            _ => panic!("pixel passes must follow the viewport update"),
        }
    }
}

#[test]
fn passes_refine_toward_the_final_image() {
    let renderer = ProgressiveRenderer::new(classic_request(64, 64, 1), 1).unwrap();
    let handle = renderer.spawn();

    let mut passes: Vec<Vec<u8>> = vec![];
    for update in handle.updates().iter() {
        if let RenderUpdate::Pass(buffer) = update {
            passes.push(buffer);
        }
    }

    assert_eq!(passes.len(), 6);
    let finest = passes.last().unwrap().clone();
    // Pixels the coarse pass got right are never touched again, so
    // every pass agrees with the final image on the block origins it
    // painted; in particular the top-left pixel never changes.
    for pass in &passes {
        assert_eq!(&pass[0..4], &finest[0..4]);
    }
}

#[test]
fn interior_stays_dead_under_a_nondefault_iteration_bound() {
    // Lowering the iteration bound without moving the gradient's
    // dead-color boundary would paint the black heart with a
    // mid-palette color; keeping the two in sync must keep the
    // interior dead for any bound, not just the default.
    let mut navigator = Navigator::new();
    navigator.p0 = Complex::new(-0.1, -0.1);
    navigator.p1 = Complex::new(0.1, 0.1);
    navigator.fractal.max_iteration = 58;
    navigator
        .fractal
        .gradient
        .set_maximal_position(58.0)
        .unwrap();

    let request = RenderRequest {
        navigator,
        width: 4,
        height: 4,
        sample: 1,
    };
    let renderer = ProgressiveRenderer::new(request, 1).unwrap();
    let dead = renderer.navigator().fractal.gradient.dead_color;
    let buffer = renderer.render();
    for pixel in buffer.chunks(4) {
        assert_eq!(pixel[0], dead.r as u8);
        assert_eq!(pixel[1], dead.g as u8);
        assert_eq!(pixel[2], dead.b as u8);
        assert_eq!(pixel[3], 255);
    }
}

#[test]
fn cancellation_stops_the_stream_early() {
    let mut navigator = Navigator::new();
    navigator.p0 = Complex::new(-2.0, -1.5);
    navigator.p1 = Complex::new(1.0, 1.5);
    let request = RenderRequest {
        navigator,
        width: 512,
        height: 512,
        sample: 4,
    };
    let renderer = ProgressiveRenderer::new(request, 1).unwrap();
    let handle = renderer.spawn();
    handle.cancel();

    // However far the worker got before it saw the flag, the stream
    // terminates without delivering the full set of passes.
    let updates: Vec<RenderUpdate> = handle.updates().iter().collect();
    assert!(updates.len() < 7);
}
