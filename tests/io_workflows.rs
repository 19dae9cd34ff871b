//! File and byte workflows around the pipeline

mod common;

use common::scenario_a;
use garment_colorize::{
    colorize_or_original, colorize_sketch_from_bytes, ColorizationConfig, ColorizationReport, ColorizationRequest,
    ColorizeError, ImageIOService, OutputFormat, SketchColorizer,
};
use image::{DynamicImage, Rgb};
use tempfile::TempDir;

fn red() -> ColorizationRequest {
    ColorizationRequest::new().with_target_color("#FF0000")
}

#[test]
fn test_colorize_file_and_save_formats() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("sketch.png");
    DynamicImage::ImageRgb8(scenario_a()).save(&input).unwrap();

    let colorizer = SketchColorizer::new(ColorizationConfig::default()).unwrap();
    let result = colorizer.colorize_file(&input, &red()).unwrap();
    assert_eq!(result.pixel_count, 192 * 292);

    let png = temp_dir.path().join("out").join("sketch_colorized.png");
    result.save(&png, OutputFormat::Png, 90).unwrap();
    let reloaded = ImageIOService::load_image(&png).unwrap().to_rgb8();
    assert_eq!(reloaded, result.image);

    let jpeg = temp_dir.path().join("sketch_colorized.jpg");
    result.save(&jpeg, OutputFormat::Jpeg, 85).unwrap();
    let reloaded = ImageIOService::load_image(&jpeg).unwrap();
    assert_eq!((reloaded.width(), reloaded.height()), (400, 600));

    let mask_path = temp_dir.path().join("sketch_mask.png");
    result.mask.save_png(&mask_path).unwrap();
    let mask = ImageIOService::load_image(&mask_path).unwrap().to_luma8();
    assert_eq!(mask.get_pixel(200, 300).0, [255]);
    assert_eq!(mask.get_pixel(5, 5).0, [0]);
}

#[cfg(feature = "webp-support")]
#[test]
fn test_webp_bytes_are_lossless() {
    let colorizer = SketchColorizer::new(ColorizationConfig::default()).unwrap();
    let result = colorizer.colorize(&DynamicImage::ImageRgb8(scenario_a()), &red()).unwrap();

    let bytes = result.to_bytes(OutputFormat::WebP, 90).unwrap();
    let decoded = ImageIOService::load_from_bytes(&bytes).unwrap().to_rgb8();
    assert_eq!(decoded, result.image);
}

#[test]
fn test_colorize_from_encoded_bytes() {
    let bytes = ImageIOService::encode_image(&DynamicImage::ImageRgb8(scenario_a()), OutputFormat::Png, 90).unwrap();
    let result = colorize_sketch_from_bytes(&bytes, &red(), &ColorizationConfig::default()).unwrap();
    assert_eq!(*result.image.get_pixel(200, 300), Rgb([255, 0, 0]));
}

#[test]
fn test_undecodable_input_is_an_error() {
    let err = colorize_sketch_from_bytes(b"\x89PNG but not really", &red(), &ColorizationConfig::default())
        .unwrap_err();
    assert!(matches!(err, ColorizeError::Decode(_)));
    assert!(err.is_input_error());

    let temp_dir = TempDir::new().unwrap();
    let bogus = temp_dir.path().join("bogus.png");
    std::fs::write(&bogus, b"nope").unwrap();
    let colorizer = SketchColorizer::new(ColorizationConfig::default()).unwrap();
    assert!(matches!(colorizer.colorize_file(&bogus, &red()), Err(ColorizeError::Decode(_))));
}

#[test]
fn test_empty_mask_is_success_with_zero_pixels() {
    let blank = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(50, 50, Rgb([255, 255, 255])));
    let outcome = colorize_or_original(&blank, &red(), &ColorizationConfig::default());

    assert!(outcome.success);
    assert_eq!(outcome.pixel_count, 0);
    assert_eq!(outcome.image.to_rgb8(), blank.to_rgb8());
}

#[test]
fn test_downscaled_output_size() {
    let config = ColorizationConfig::builder().max_dimension(Some(300)).build().unwrap();
    let colorizer = SketchColorizer::new(config).unwrap();
    let result = colorizer.colorize(&DynamicImage::ImageRgb8(scenario_a()), &red()).unwrap();

    assert_eq!(result.dimensions(), (200, 300));
    assert!(result.pixel_count > 0);
}

#[test]
fn test_report_serialization() {
    let colorizer = SketchColorizer::new(ColorizationConfig::default()).unwrap();
    let result = colorizer.colorize(&DynamicImage::ImageRgb8(scenario_a()), &red()).unwrap();
    let report = result.report(Some("looks/sketch.png"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["input"], "looks/sketch.png");
    assert_eq!(json["success"], true);
    assert_eq!(json["pixel_count"], 192 * 292);
    assert_eq!(json["method"], "line_enclosed");
    assert!(json["processed_at"].is_string());

    let parsed: ColorizationReport = serde_json::from_value(json).unwrap();
    assert_eq!(parsed.width, 400);
    assert_eq!(parsed.height, 600);

    let failure = ColorizationReport::failure(Some("broken.png"), &ColorizeError::decode("bad bytes"));
    assert!(!failure.success);
    assert!(failure.error.unwrap().contains("bad bytes"));
}
