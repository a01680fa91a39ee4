use image::{GrayImage, Luma};
use penplot_camtools::{extract, PathSetDocument, RasterMask, DEFAULT_SIMPLIFICATION_COEFF};
use tempfile::TempDir;

fn ring_mask() -> RasterMask {
    let mut gray = GrayImage::new(64, 48);
    for y in 8..40 {
        for x in 8..56 {
            let border = x < 12 || x >= 52 || y < 12 || y >= 36;
            if border {
                gray.put_pixel(x, y, Luma([255]));
            }
        }
    }
    RasterMask::from_gray(gray)
}

#[test]
fn test_mask_file_round_trip_uses_black_on_white() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("drawing_processed.png");
    let mask = ring_mask();

    mask.save(&path).unwrap();
    let stored = image::open(&path).unwrap().to_luma8();
    assert_eq!(stored.get_pixel(0, 0).0[0], 255);
    assert_eq!(stored.get_pixel(8, 8).0[0], 0);

    assert_eq!(RasterMask::load(&path).unwrap(), mask);
}

#[test]
fn test_svg_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("drawing_processed.svg");

    let mask = ring_mask();
    let paths = extract(&mask, DEFAULT_SIMPLIFICATION_COEFF).unwrap();
    // Outer border and hole border
    assert_eq!(paths.len(), 2);

    let document = PathSetDocument::new(64.0, 48.0, paths);
    document.save(&path).unwrap();
    let loaded = PathSetDocument::from_file(&path).unwrap();
    assert_eq!(loaded, document);
}

#[test]
fn test_missing_svg_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    let err = PathSetDocument::from_file(dir.path().join("missing.svg")).unwrap_err();
    assert_eq!(err.kind(), penplot_camtools::ErrorKind::InvalidInput);
}
