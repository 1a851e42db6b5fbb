//! End-to-end pipeline tests over the stub segmentation model

use bgremove_service::types::compression_ratio;
use bgremove_service::{
    MockSegmenter, OutputFormat, ProcessingRequest, RemovalPipeline, UploadedAsset, WorkerPool,
    DEFAULT_QUALITY,
};
use bytes::Bytes;
use std::sync::Arc;

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 90, 255])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// A small, heavily compressed JPEG of noise; any lossless re-encode of it
/// is larger than the upload.
fn noisy_jpeg_fixture() -> Vec<u8> {
    let mut seed = 0x2545_f491u32;
    let image = image::RgbImage::from_fn(64, 64, |_, _| {
        // Simple LCG keeps the fixture deterministic
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        image::Rgb([(seed >> 8) as u8, (seed >> 16) as u8, (seed >> 24) as u8])
    });
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut std::io::Cursor::new(&mut bytes), 10)
        .encode(
            image.as_raw(),
            64,
            64,
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    bytes
}

fn pipeline() -> (RemovalPipeline, Arc<MockSegmenter>) {
    let model = Arc::new(MockSegmenter::new());
    let pool = Arc::new(WorkerPool::new(4));
    (
        RemovalPipeline::new(Arc::clone(&model) as Arc<dyn bgremove_service::SegmentationModel>, pool, 1024 * 1024),
        model,
    )
}

fn request(bytes: Vec<u8>, filename: &str, format: OutputFormat, quality: u8) -> ProcessingRequest {
    ProcessingRequest {
        asset: UploadedAsset::new(Bytes::from(bytes), None, Some(filename.to_string())),
        format,
        quality,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn png_result_metrics_are_consistent() {
    let (pipeline, _) = pipeline();
    let input = png_fixture(32, 32);
    let input_len = input.len();

    let result = pipeline
        .process(request(input, "fixture.png", OutputFormat::Png, DEFAULT_QUALITY))
        .await
        .unwrap();

    assert_eq!(result.format, OutputFormat::Png);
    assert_eq!(result.original_size, input_len);
    assert!(result.original_size > 0 && result.output_size > 0);
    assert_eq!(result.output_size, result.bytes.len());
    assert_eq!(
        result.compression_ratio,
        compression_ratio(result.original_size, result.output_size)
    );
    // The payload is a decodable PNG of the original dimensions
    let decoded = image::load_from_memory(&result.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (32, 32));
}

#[tokio::test(flavor = "multi_thread")]
async fn webp_results_are_deterministic_across_runs() {
    let (pipeline, _) = pipeline();
    let input = png_fixture(32, 32);

    let first = pipeline
        .process(request(input.clone(), "a.png", OutputFormat::WebP, 80))
        .await
        .unwrap();
    let second = pipeline
        .process(request(input, "a.png", OutputFormat::WebP, 80))
        .await
        .unwrap();

    assert_eq!(first.bytes, second.bytes);
    assert_eq!(&first.bytes[0..4], b"RIFF");
}

#[tokio::test(flavor = "multi_thread")]
async fn negative_compression_ratio_is_reported_accurately() {
    let (pipeline, _) = pipeline();
    let input = noisy_jpeg_fixture();

    let result = pipeline
        .process(request(input, "noise.jpg", OutputFormat::Png, DEFAULT_QUALITY))
        .await
        .unwrap();

    // Lossless re-encode of noise outgrows the q10 JPEG upload
    assert!(result.output_size > result.original_size);
    assert!(result.compression_ratio < 0.0);
    assert_eq!(
        result.compression_ratio,
        compression_ratio(result.original_size, result.output_size)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_requests_beyond_pool_size_all_complete() {
    let model = Arc::new(MockSegmenter::new());
    let pool = Arc::new(WorkerPool::new(4));
    let pipeline = Arc::new(RemovalPipeline::new(
        Arc::clone(&model) as Arc<dyn bgremove_service::SegmentationModel>,
        pool,
        1024 * 1024,
    ));
    let input = png_fixture(64, 64);

    let tasks: Vec<_> = (0..12)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let input = input.clone();
            tokio::spawn(async move {
                pipeline
                    .process(request(input, "many.png", OutputFormat::Png, DEFAULT_QUALITY))
                    .await
            })
        })
        .collect();

    for task in tasks {
        let result = task.await.unwrap().unwrap();
        assert!(result.output_size > 0);
    }
    assert_eq!(model.call_count(), 12);
}

#[tokio::test(flavor = "multi_thread")]
async fn validation_failures_cost_no_model_invocation() {
    let (pipeline, model) = pipeline();

    // Unsupported extension
    let err = pipeline
        .process(request(
            png_fixture(8, 8),
            "scan.bmp",
            OutputFormat::Png,
            DEFAULT_QUALITY,
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        bgremove_service::RemovalError::UnsupportedMediaType(_)
    ));

    // Over the ceiling
    let err = pipeline
        .process(request(
            vec![0u8; 2 * 1024 * 1024],
            "big.png",
            OutputFormat::Png,
            DEFAULT_QUALITY,
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        bgremove_service::RemovalError::PayloadTooLarge { .. }
    ));

    // Zero-byte upload
    let err = pipeline
        .process(request(Vec::new(), "empty.png", OutputFormat::Png, DEFAULT_QUALITY))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        bgremove_service::RemovalError::InvalidParameter(_)
    ));

    assert_eq!(model.call_count(), 0);
}
