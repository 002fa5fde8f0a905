// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate image;
extern crate mandelview;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use image::pnm::PNMEncoder;
use image::pnm::{PNMSubtype, SampleEncoding};
use image::ColorType;
use num::Complex;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use mandelview::{Navigator, ProgressiveRenderer, RenderRequest, RenderUpdate};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const SAMPLE: &str = "sample";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandelview")
        .version("0.1.0")
        .about("Progressive Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x600")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .required(false)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.0,-1.5")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the viewport"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .required(false)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1.0,1.5")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the viewport"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads used per refinement pass"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("400")
                .validator(move |s| {
                    validate_range(
                        &s,
                        10,
                        200_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 10 and 200000",
                    )
                })
                .help("Escape-time iteration bound"),
        )
        .arg(
            Arg::with_name(SAMPLE)
                .required(false)
                .long(SAMPLE)
                .short("a")
                .takes_value(true)
                .default_value("2")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        16,
                        "Could not parse sample factor",
                        "Sample factor must be between 1 and 16",
                    )
                })
                .help("Supersampling factor (1 disables anti-aliasing)"),
        )
        .get_matches()
}

fn write_image(outfile: &str, pixels: &[u8], bounds: (usize, usize)) -> Result<(), std::io::Error> {
    let path = Path::new(outfile);
    let output = File::create(&path)?;
    let mut encoder =
        PNMEncoder::new(output).with_subtype(PNMSubtype::Pixmap(SampleEncoding::Binary));
    encoder.encode(pixels, bounds.0 as u32, bounds.1 as u32, ColorType::RGB(8))?;
    Ok(())
}

/// The renderer's buffers are RGBA with a constant alpha; the PNM
/// pixmap wants packed RGB.
fn strip_alpha(buffer: &[u8]) -> Vec<u8> {
    buffer
        .chunks(4)
        .flat_map(|pixel| pixel[..3].iter().cloned())
        .collect()
}

fn main() {
    let matches = args();
    let image_size =
        parse_pair(matches.value_of(SIZE).unwrap(), 'x').expect("Error parsing image dimensions");
    let leftlower = parse_complex(matches.value_of(LEFTLOWER).unwrap())
        .expect("Error parsing left lower point");
    let rightupper = parse_complex(matches.value_of(RIGHTUPPER).unwrap())
        .expect("Error parsing right upper point");
    let threads =
        usize::from_str(matches.value_of(THREADS).unwrap()).expect("Could not parse thread count");
    let iterations = u32::from_str(matches.value_of(ITERATIONS).unwrap())
        .expect("Could not parse iteration count");
    let sample =
        usize::from_str(matches.value_of(SAMPLE).unwrap()).expect("Could not parse sample factor");

    let mut navigator = Navigator::new();
    navigator.p0 = leftlower;
    navigator.p1 = rightupper;
    navigator.fractal.max_iteration = iterations;
    // The gradient's dead-color boundary has to track the iteration
    // bound, or the interior of the set picks up a palette color.
    navigator
        .fractal
        .gradient
        .set_maximal_position(f64::from(iterations))
        .expect("the iteration count is validated positive");

    let request = RenderRequest {
        navigator,
        width: image_size.0,
        height: image_size.1,
        sample,
    };

    let renderer = match ProgressiveRenderer::new(request, threads) {
        Ok(renderer) => renderer,
        Err(e) => {
            eprintln!("Render failure: {}", e);
            std::process::exit(1);
        }
    };

    let handle = renderer.spawn();
    let mut last_pass: Vec<u8> = vec![];
    let mut pass = 0;
    for update in handle.updates().iter() {
        match update {
            RenderUpdate::Viewport { p0, p1 } => {
                eprintln!("Rendering ({}, {}) to ({}, {})", p0.re, p0.im, p1.re, p1.im);
            }
            RenderUpdate::Pass(buffer) => {
                pass += 1;
                eprintln!("Pass {} complete", pass);
                last_pass = buffer;
            }
        }
    }

    if let Err(e) = write_image(
        matches.value_of(OUTPUT).unwrap(),
        &strip_alpha(&last_pass),
        (image_size.0, image_size.1),
    ) {
        eprintln!("Could not write image: {}", e);
        std::process::exit(1);
    }
}
