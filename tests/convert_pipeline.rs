//! End-to-end checks through the public API with the real `image` backend.
//!
//! Inputs are generated JPEGs written into a temp directory; outputs are
//! decoded again to check the fixed constraints (exact size, byte budget).

use hajj_photos::compliance::{self, FaceDetector, FixedDetector, Guidance, PixelBox};
use hajj_photos::config::{self, AppConfig};
use hajj_photos::imaging::RustBackend;
use hajj_photos::session::{DirectoryExport, Session, SessionError, TransformUpdate};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    // Busy texture so the encoder has real work to do
    let img = RgbImage::from_fn(width, height, |x, y| {
        let v = ((x * 7) ^ (y * 13)) as u8;
        Rgb([v, v.wrapping_mul(3), 255 - v])
    });
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 95)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn portrait_photo_converts_to_200px_under_budget() {
    let tmp = TempDir::new().unwrap();
    let input = write_jpeg(tmp.path(), "portrait.JPEG", 900, 1200);
    let out = tmp.path().join("out");

    let mut session = Session::new(RustBackend::new(), AppConfig::default());
    session.load_file(&input).unwrap();
    session
        .update_transform(TransformUpdate {
            zoom: Some(1.8),
            offset_x: Some(25.0),
            offset_y: Some(-60.0),
        })
        .unwrap();
    let size = session.convert().unwrap().size_bytes();
    let saved = session.download(&mut DirectoryExport::new(&out)).unwrap();

    assert_eq!(saved, out.join("hajj-photo-200x200.jpg"));
    let bytes = std::fs::read(&saved).unwrap();
    assert_eq!(bytes.len(), size);
    assert!(bytes.len() <= 1_048_576);

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 200));
}

#[test]
fn extreme_pan_still_converts() {
    let tmp = TempDir::new().unwrap();
    let input = write_jpeg(tmp.path(), "wide.jpg", 1600, 400);

    let mut session = Session::new(RustBackend::new(), AppConfig::default());
    session.load_file(&input).unwrap();
    session
        .update_transform(TransformUpdate {
            zoom: Some(3.0),
            offset_x: Some(1e6),
            offset_y: Some(-1e6),
        })
        .unwrap();

    let crop = session.crop().unwrap();
    assert_eq!(crop.x, 0);
    // Pinned to the bottom edge, give or take pixel snapping
    assert!((399..=400).contains(&(crop.y + crop.side)));
    assert!(session.convert().is_ok());
}

#[test]
fn unsupported_file_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("photo.png");
    std::fs::write(&path, b"\x89PNG").unwrap();

    let mut session = Session::new(RustBackend::new(), AppConfig::default());
    let err = session.load_file(&path).unwrap_err();

    assert!(matches!(err, SessionError::UnsupportedFormat));
    assert!(session.source().is_none());
}

#[test]
fn configured_output_size_is_respected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("hajj-photos.toml");
    std::fs::write(&config_path, "[geometry]\noutput = 120\n").unwrap();
    let config = config::load_config(&config_path).unwrap();

    let input = write_jpeg(tmp.path(), "me.jpg", 640, 480);
    let mut session = Session::new(RustBackend::new(), config);
    session.load_file(&input).unwrap();
    session.convert().unwrap();
    let saved = session.download(&mut DirectoryExport::new(tmp.path())).unwrap();

    assert!(saved.ends_with("hajj-photo-120x120.jpg"));
    let decoded = image::open(&saved).unwrap();
    assert_eq!(decoded.width(), 120);
}

#[test]
fn still_frame_analysis_matches_guidance() {
    let mut frame = RgbaImage::from_pixel(400, 400, Rgba([236, 236, 236, 255]));
    // Darker oval-ish block where the face is
    for y in 130..300 {
        for x in 160..240 {
            frame.put_pixel(x, y, Rgba([190, 150, 130, 255]));
        }
    }
    let mut detector = FixedDetector::new(vec![PixelBox {
        x: 160.0,
        y: 120.0,
        width: 80.0,
        height: 180.0,
    }]);
    let detections = detector.detect(&frame, Duration::ZERO).unwrap();
    let snapshot =
        compliance::analyze_detections(&frame, &detections, &config::ComplianceConfig::default());

    assert!(snapshot.face_detected);
    assert!(snapshot.size_ok);
    assert!(snapshot.centered_ok);
    assert_eq!(snapshot.guidance, Guidance::Ready);
}
