use std::io::Cursor;

use relume::{EnhanceParams, ImageOpts, RelumeError, process_image};

fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn mean_brightness(jpeg: &[u8]) -> f64 {
    let rgb = image::load_from_memory(jpeg).unwrap().to_rgb8();
    let data = rgb.as_raw();
    data.iter().map(|&v| v as f64).sum::<f64>() / data.len() as f64
}

#[test]
fn dark_uniform_image_does_not_get_darker() {
    let input = png_bytes(2, 2, [20, 20, 20]);
    let out = process_image(&input, &EnhanceParams::default(), &ImageOpts::default()).unwrap();

    assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::Jpeg);
    let decoded = image::load_from_memory(&out).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (2, 2));

    assert!(mean_brightness(&out) >= 20.0);
}

#[test]
fn undecodable_bytes_fail_with_decode_and_no_output() {
    let truncated = {
        let mut b = png_bytes(4, 4, [20, 20, 20]);
        b.truncate(10);
        b
    };
    for input in [&truncated[..], &[0xDE, 0xAD, 0xBE, 0xEF][..]] {
        let err = process_image(input, &EnhanceParams::default(), &ImageOpts::default())
            .unwrap_err();
        assert!(matches!(err, RelumeError::Decode(_)), "got {err}");
    }
}

#[test]
fn processing_is_deterministic_end_to_end() {
    let input = png_bytes(6, 5, [30, 40, 25]);
    let params = EnhanceParams::auto();
    let a = process_image(&input, &params, &ImageOpts::default()).unwrap();
    let b = process_image(&input, &params, &ImageOpts::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn pixel_ceiling_is_enforced_before_processing() {
    let input = png_bytes(16, 16, [20, 20, 20]);
    let opts = ImageOpts {
        max_pixels: 255,
        ..ImageOpts::default()
    };
    let err = process_image(&input, &EnhanceParams::default(), &opts).unwrap_err();
    assert!(matches!(err, RelumeError::UnsupportedFrame(_)), "got {err}");
}

#[test]
fn extreme_parameters_still_produce_a_valid_jpeg() {
    let input = png_bytes(4, 4, [200, 60, 10]);
    let params = EnhanceParams::manual(relume::RawEnhanceParams {
        denoise_strength: Some(f32::INFINITY),
        saturation_factor: Some(-5.0),
        sharpness_factor: Some(100.0),
        contrast_alpha: Some(f32::NAN),
        brightness_beta: Some(-1e9),
    });
    let out = process_image(&input, &params, &ImageOpts::default()).unwrap();
    assert!(image::load_from_memory(&out).is_ok());
}
