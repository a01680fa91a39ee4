use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use penplot_camtools::{
    extract, preprocess, PreprocessParameters, RasterMask, DEFAULT_SIMPLIFICATION_COEFF,
};
use penplot_core::{PathSet, POINT_EPSILON};

fn filled_rect_mask(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RasterMask {
    let mut gray = GrayImage::new(w, h);
    for y in y0..y1 {
        for x in x0..x1 {
            gray.put_pixel(x, y, Luma([255]));
        }
    }
    RasterMask::from_gray(gray)
}

#[test]
fn test_all_background_mask_is_empty() {
    let paths = extract(&RasterMask::blank(200, 120), DEFAULT_SIMPLIFICATION_COEFF).unwrap();
    assert!(paths.is_empty());
}

#[test]
fn test_filled_rectangle_gives_one_closed_polyline() {
    let mask = filled_rect_mask(120, 80, 20, 15, 90, 60);
    let paths = extract(&mask, DEFAULT_SIMPLIFICATION_COEFF).unwrap();

    assert_eq!(paths.len(), 1);
    let outline = &paths.polylines()[0];
    assert!(outline.is_closed(POINT_EPSILON));
    let vertices = outline.len() - 1;
    assert!((4..=8).contains(&vertices), "{} vertices", vertices);

    let bbox = outline.bounding_box().unwrap();
    assert_eq!((bbox.min_x, bbox.min_y), (20.0, 15.0));
    assert_eq!((bbox.max_x, bbox.max_y), (89.0, 59.0));
}

#[test]
fn test_separate_shapes_give_separate_paths() {
    let mut gray = GrayImage::new(100, 50);
    for y in 5..20 {
        for x in 5..20 {
            gray.put_pixel(x, y, Luma([255]));
        }
        for x in 60..90 {
            gray.put_pixel(x, y, Luma([255]));
        }
    }
    let paths = extract(&RasterMask::from_gray(gray), DEFAULT_SIMPLIFICATION_COEFF).unwrap();
    assert_eq!(paths.len(), 2);
}

#[test]
fn test_drawn_outline_is_traced_after_preprocessing() {
    let mut canvas = RgbImage::from_pixel(120, 120, Rgb([255, 255, 255]));
    for i in 20..100 {
        for t in 0..3 {
            canvas.put_pixel(i, 20 + t, Rgb([0, 0, 0]));
            canvas.put_pixel(i, 97 + t, Rgb([0, 0, 0]));
            canvas.put_pixel(20 + t, i, Rgb([0, 0, 0]));
            canvas.put_pixel(97 + t, i, Rgb([0, 0, 0]));
        }
    }

    let mask = preprocess(
        &DynamicImage::ImageRgb8(canvas),
        &PreprocessParameters::default(),
    )
    .unwrap();
    assert!(mask.ink_count() > 0);

    let paths = extract(&mask, DEFAULT_SIMPLIFICATION_COEFF).unwrap();
    assert!(!paths.is_empty());
    let bbox = paths.bounding_box().unwrap();
    assert!(bbox.width() > 60.0 && bbox.height() > 60.0);
}

fn white_canvas(w: u32, h: u32) -> RgbImage {
    RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
}

fn trace(canvas: RgbImage, params: &PreprocessParameters) -> PathSet {
    let mask = preprocess(&DynamicImage::ImageRgb8(canvas), params).unwrap();
    extract(&mask, DEFAULT_SIMPLIFICATION_COEFF).unwrap()
}

#[test]
fn test_thick_curved_stroke_is_drawn_once() {
    // 5-pixel pen along the upper half of a circle of radius 60
    let mut canvas = white_canvas(200, 140);
    let steps = 720;
    for i in 0..=steps {
        let t = std::f64::consts::PI * f64::from(i) / f64::from(steps);
        let (cx, cy) = (100.0 + 60.0 * t.cos(), 100.0 - 60.0 * t.sin());
        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                if dx * dx + dy * dy <= 5 {
                    let x = (cx.round() as i32 + dx) as u32;
                    let y = (cy.round() as i32 + dy) as u32;
                    canvas.put_pixel(x, y, Rgb([0, 0, 0]));
                }
            }
        }
    }

    let paths = trace(canvas, &PreprocessParameters::default());
    let half_circle = std::f64::consts::PI * 60.0;

    assert!(
        paths.total_length() < 1.3 * half_circle,
        "drawn {} for a stroke of {}",
        paths.total_length(),
        half_circle
    );
    let longest = paths
        .iter()
        .max_by(|a, b| a.arc_length().total_cmp(&b.arc_length()))
        .unwrap();
    assert!(!longest.is_closed(POINT_EPSILON));
    assert!(longest.arc_length() > 0.8 * half_circle);
}

/// 3-pixel slanted stroke with a 2-pixel break at columns 58 and 59
fn broken_stroke() -> RgbImage {
    let mut canvas = white_canvas(120, 100);
    for x in (0..120u32).filter(|x| !(58..60).contains(x)) {
        let center = (f64::from(x) / 2.0 + 20.0).round() as u32;
        for y in center - 1..=center + 1 {
            canvas.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
    canvas
}

#[test]
fn test_morphology_bridges_small_breaks() {
    let bridged = PreprocessParameters {
        blur_sigma: 0.0,
        ..Default::default()
    };
    let paths = trace(broken_stroke(), &bridged);
    assert_eq!(paths.len(), 1);
    let bbox = paths.bounding_box().unwrap();
    assert!(bbox.width() > 100.0 && bbox.height() > 50.0, "{:?}", bbox);

    let raw = PreprocessParameters {
        blur_sigma: 0.0,
        close_iterations: 0,
        dilate_iterations: 0,
        ..Default::default()
    };
    assert_eq!(trace(broken_stroke(), &raw).len(), 2);
}
