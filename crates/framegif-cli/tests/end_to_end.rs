#![allow(clippy::unwrap_used)]

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngEncoder;
use image::{AnimationDecoder, ImageEncoder, Rgba, RgbaImage};

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn write_png(dir: &Path, name: &str, rgba: [u8; 4]) -> PathBuf {
    let img = RgbaImage::from_pixel(6, 4, Rgba(rgba));
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), 6, 4, image::ExtendedColorType::Rgba8)
        .unwrap();
    let path = dir.join(name);
    std::fs::write(&path, buf).unwrap();
    path
}

fn framegif(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_framegif"))
        .args(args)
        .output()
        .unwrap()
}

/// Top-left pixel and size of every GIF frame, in order.
fn gif_frames(path: &Path) -> Vec<([u8; 4], (u32, u32), u32)> {
    let decoder = GifDecoder::new(BufReader::new(File::open(path).unwrap())).unwrap();
    decoder
        .into_frames()
        .collect_frames()
        .unwrap()
        .into_iter()
        .map(|frame| {
            let (num, den) = frame.delay().numer_denom_ms();
            let buffer = frame.into_buffer();
            (buffer.get_pixel(0, 0).0, buffer.dimensions(), num / den)
        })
        .collect()
}

fn close(actual: [u8; 4], expected: [u8; 4]) -> bool {
    actual
        .iter()
        .zip(expected)
        .all(|(a, e)| a.abs_diff(e) <= 8)
}

#[test]
fn frames_are_encoded_in_requested_order() {
    let dir = tempfile::tempdir().unwrap();
    let red = write_png(dir.path(), "red.png", RED);
    let green = write_png(dir.path(), "green.png", GREEN);
    let blue = write_png(dir.path(), "blue.png", BLUE);
    let output = dir.path().join("out.gif");

    let result = framegif(&[
        red.to_str().unwrap(),
        green.to_str().unwrap(),
        blue.to_str().unwrap(),
        "--order",
        "blue,red",
        "--delay",
        "150",
        "--output",
        output.to_str().unwrap(),
    ]);
    assert!(result.status.success(), "{result:?}");

    let frames = gif_frames(&output);
    assert_eq!(frames.len(), 3);
    for ((pixel, _, _), expected) in frames.iter().zip([BLUE, RED, GREEN]) {
        assert!(close(*pixel, expected), "{pixel:?} != {expected:?}");
    }
    // Default export scale doubles every frame; the delay is kept.
    assert!(frames.iter().all(|(_, size, delay)| *size == (12, 8) && *delay == 150));
}

#[test]
fn host_encode_honours_scale() {
    let dir = tempfile::tempdir().unwrap();
    let red = write_png(dir.path(), "red.png", RED);
    let output = dir.path().join("out.gif");

    let result = framegif(&[
        red.to_str().unwrap(),
        "--host-encode",
        "--scale",
        "1",
        "--output",
        output.to_str().unwrap(),
    ]);
    assert!(result.status.success(), "{result:?}");

    let frames = gif_frames(&output);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].1, (6, 4));
}

#[test]
fn unreadable_frames_are_skipped_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let red = write_png(dir.path(), "red.png", RED);
    let broken = dir.path().join("broken.png");
    std::fs::write(&broken, b"not a png").unwrap();
    let blue = write_png(dir.path(), "blue.png", BLUE);
    let output = dir.path().join("out.gif");

    let result = framegif(&[
        red.to_str().unwrap(),
        broken.to_str().unwrap(),
        blue.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);
    assert!(result.status.success(), "{result:?}");
    assert_eq!(gif_frames(&output).len(), 2);
}

#[test]
fn abort_on_missing_fails_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let red = write_png(dir.path(), "red.png", RED);
    let broken = dir.path().join("broken.png");
    std::fs::write(&broken, b"not a png").unwrap();
    let output = dir.path().join("out.gif");

    let result = framegif(&[
        red.to_str().unwrap(),
        broken.to_str().unwrap(),
        "--abort-on-missing",
        "--output",
        output.to_str().unwrap(),
    ]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(
        stderr.contains("Error converting frames: failed to export frame"),
        "{stderr}"
    );
    assert!(!output.exists());
}

#[test]
fn invalid_config_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let red = write_png(dir.path(), "red.png", RED);

    let result = framegif(&[
        red.to_str().unwrap(),
        "--config-json",
        r#"{"export_scale": 9}"#,
    ]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Error parsing --config-json"), "{stderr}");
}

#[test]
fn out_of_range_delay_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let red = write_png(dir.path(), "red.png", RED);

    let result = framegif(&[red.to_str().unwrap(), "--delay", "5"]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("frame delay must be between 10 and 10000"), "{stderr}");
}
