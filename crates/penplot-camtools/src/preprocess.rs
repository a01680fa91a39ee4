//! Raster Preprocessor
//!
//! Reduces a line-art image to a binary mask of 1-pixel-wide strokes:
//! luminance -> optional blur -> inverted Otsu threshold -> closing and
//! dilation -> Zhang-Suen thinning.
//!
//! In memory a [`RasterMask`] stores ink as 255 and paper as 0, which is what
//! the border follower in [`crate::vectorizer`] traces. Stored mask artifacts use
//! the conventional black-lines-on-white polarity; [`RasterMask::to_image`] and
//! [`RasterMask::from_image`] perform the single inversion between the two.

use crate::error::{check_range, CamToolError, CamToolResult, ParameterResult};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Mask value of an ink (foreground) pixel
pub const INK: u8 = 255;
/// Mask value of a paper (background) pixel
pub const PAPER: u8 = 0;

/// Maximum number of closing or dilation passes
pub const MAX_MORPHOLOGY_ITERATIONS: u8 = 8;

/// Preprocessing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParameters {
    /// Gaussian blur sigma applied before thresholding (0 disables)
    pub blur_sigma: f32,
    /// Number of 3x3 closing passes
    pub close_iterations: u8,
    /// Number of 3x3 dilation passes after closing
    pub dilate_iterations: u8,
    /// Thin strokes to a 1-pixel skeleton
    pub thin: bool,
}

impl Default for PreprocessParameters {
    fn default() -> Self {
        Self {
            blur_sigma: 1.0,
            close_iterations: 1,
            dilate_iterations: 1,
            thin: true,
        }
    }
}

impl PreprocessParameters {
    /// Validate parameter ranges
    pub fn validate(&self) -> ParameterResult<()> {
        check_range("blur_sigma", f64::from(self.blur_sigma), 0.0, 10.0)?;
        let max = f64::from(MAX_MORPHOLOGY_ITERATIONS);
        check_range("close_iterations", f64::from(self.close_iterations), 0.0, max)?;
        check_range("dilate_iterations", f64::from(self.dilate_iterations), 0.0, max)?;
        Ok(())
    }
}

/// Binary line mask, ink = 255, paper = 0
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMask {
    mask: GrayImage,
}

impl RasterMask {
    /// Wrap a grayscale buffer; every nonzero pixel becomes ink
    pub fn from_gray(mut mask: GrayImage) -> Self {
        for pixel in mask.pixels_mut() {
            if pixel.0[0] != PAPER {
                *pixel = Luma([INK]);
            }
        }
        Self { mask }
    }

    /// All-paper mask
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            mask: GrayImage::new(width, height),
        }
    }

    /// Read a stored mask artifact (dark lines on a light background)
    pub fn from_image(image: &DynamicImage) -> Self {
        let mut mask = image.to_luma8();
        for pixel in mask.pixels_mut() {
            *pixel = if pixel.0[0] < 128 {
                Luma([INK])
            } else {
                Luma([PAPER])
            };
        }
        Self { mask }
    }

    /// Render in stored polarity: black lines on white
    pub fn to_image(&self) -> GrayImage {
        let mut out = self.mask.clone();
        image::imageops::invert(&mut out);
        out
    }

    /// Load a stored mask artifact
    pub fn load<P: AsRef<Path>>(path: P) -> CamToolResult<Self> {
        let image = open_image(path.as_ref())?;
        Ok(Self::from_image(&image))
    }

    /// Save in stored polarity; format follows the file extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CamToolResult<()> {
        self.to_image().save(path.as_ref())?;
        debug!("Saved mask to {}", path.as_ref().display());
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        self.mask.get_pixel(x, y).0[0] == INK
    }

    /// Number of ink pixels
    pub fn ink_count(&self) -> usize {
        self.mask.pixels().filter(|p| p.0[0] == INK).count()
    }

    /// Internal polarity buffer (ink = 255)
    pub fn as_gray(&self) -> &GrayImage {
        &self.mask
    }
}

/// Turns source images into thinned line masks
#[derive(Debug, Clone, Default)]
pub struct RasterPreprocessor {
    params: PreprocessParameters,
}

impl RasterPreprocessor {
    pub fn new(params: PreprocessParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PreprocessParameters {
        &self.params
    }

    /// Preprocess an image file
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> CamToolResult<RasterMask> {
        let image = open_image(path.as_ref())?;
        self.process(&image)
    }

    /// Preprocess encoded image bytes
    pub fn process_bytes(&self, bytes: &[u8]) -> CamToolResult<RasterMask> {
        if bytes.is_empty() {
            return Err(CamToolError::invalid_input("image data is empty"));
        }
        let image = image::load_from_memory(bytes)?;
        self.process(&image)
    }

    /// Preprocess a decoded image
    pub fn process(&self, image: &DynamicImage) -> CamToolResult<RasterMask> {
        self.params.validate()?;

        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(CamToolError::invalid_input(format!(
                "image has no pixels ({}x{})",
                width, height
            )));
        }

        let mut gray = image.to_luma8();
        if self.params.blur_sigma > 0.0 {
            gray = image::imageops::blur(&gray, self.params.blur_sigma);
        }

        let mut mask = binarize_inverted(&gray);

        for _ in 0..self.params.close_iterations {
            mask = imageproc::morphology::close(&mask, Norm::LInf, 1);
        }
        for _ in 0..self.params.dilate_iterations {
            mask = imageproc::morphology::dilate(&mask, Norm::LInf, 1);
        }

        if self.params.thin {
            let removed = thin_zhang_suen(&mut mask);
            debug!("Thinning removed {} pixels", removed);
        }

        let mask = RasterMask::from_gray(mask);
        info!(
            "Preprocessed {}x{} image into mask with {} ink pixels",
            width,
            height,
            mask.ink_count()
        );
        Ok(mask)
    }
}

/// Preprocess `image` with `params`
pub fn preprocess(
    image: &DynamicImage,
    params: &PreprocessParameters,
) -> CamToolResult<RasterMask> {
    RasterPreprocessor::new(params.clone()).process(image)
}

/// Preprocess the image file at `path`
pub fn preprocess_file<P: AsRef<Path>>(
    path: P,
    params: &PreprocessParameters,
) -> CamToolResult<RasterMask> {
    RasterPreprocessor::new(params.clone()).process_file(path)
}

/// Preprocess encoded image bytes (PNG, JPEG, ...)
pub fn preprocess_bytes(bytes: &[u8], params: &PreprocessParameters) -> CamToolResult<RasterMask> {
    RasterPreprocessor::new(params.clone()).process_bytes(bytes)
}

fn open_image(path: &Path) -> CamToolResult<DynamicImage> {
    if !path.is_file() {
        return Err(CamToolError::invalid_input(format!(
            "Image not found: {}",
            path.display()
        )));
    }
    Ok(image::open(path)?)
}

/// Otsu threshold, inverted: dark pixels become ink
///
/// A uniform image has no contrast to separate and yields no ink.
fn binarize_inverted(gray: &GrayImage) -> GrayImage {
    let (mut lo, mut hi) = (u8::MAX, u8::MIN);
    for p in gray.pixels() {
        lo = lo.min(p.0[0]);
        hi = hi.max(p.0[0]);
    }
    if gray.is_empty() || lo == hi {
        return GrayImage::new(gray.width(), gray.height());
    }

    let level = imageproc::contrast::otsu_level(gray);
    debug!("Otsu level {}", level);

    let mut out = GrayImage::new(gray.width(), gray.height());
    for (x, y, p) in gray.enumerate_pixels() {
        if p.0[0] <= level {
            out.put_pixel(x, y, Luma([INK]));
        }
    }
    out
}

/// Zhang-Suen thinning in place; returns the number of pixels removed
///
/// Pixels outside the image count as paper. Endpoints (one ink neighbor) and
/// pixels whose removal would split a stroke are never removed.
pub fn thin_zhang_suen(mask: &mut GrayImage) -> usize {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let mut grid: Vec<bool> = mask.as_raw().iter().map(|&v| v != PAPER).collect();
    let mut removed_total = 0;
    let mut to_remove = Vec::new();

    loop {
        let mut changed = false;
        for step in 0..2 {
            to_remove.clear();
            for y in 0..height {
                for x in 0..width {
                    if grid[y * width + x] && removable(&grid, width, height, x, y, step) {
                        to_remove.push(y * width + x);
                    }
                }
            }
            if !to_remove.is_empty() {
                changed = true;
                removed_total += to_remove.len();
                for &idx in &to_remove {
                    grid[idx] = false;
                }
            }
        }
        if !changed {
            break;
        }
    }

    for (dst, &ink) in mask.iter_mut().zip(grid.iter()) {
        *dst = if ink { INK } else { PAPER };
    }
    removed_total
}

fn removable(grid: &[bool], width: usize, height: usize, x: usize, y: usize, step: usize) -> bool {
    let at = |dx: isize, dy: isize| -> bool {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
            return false;
        }
        grid[ny as usize * width + nx as usize]
    };

    // P2..P9 clockwise from north
    let n = [
        at(0, -1),
        at(1, -1),
        at(1, 0),
        at(1, 1),
        at(0, 1),
        at(-1, 1),
        at(-1, 0),
        at(-1, -1),
    ];

    let neighbors = n.iter().filter(|&&v| v).count();
    if !(2..=6).contains(&neighbors) {
        return false;
    }

    let transitions = (0..8).filter(|&i| !n[i] && n[(i + 1) % 8]).count();
    if transitions != 1 {
        return false;
    }

    let (p2, p4, p6, p8) = (n[0], n[2], n[4], n[6]);
    if step == 0 {
        !(p2 && p4 && p6) && !(p4 && p6 && p8)
    } else {
        !(p2 && p4 && p8) && !(p2 && p6 && p8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn white_canvas(w: u32, h: u32) -> image::RgbImage {
        image::RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_blank_image_has_no_ink() {
        let image = DynamicImage::ImageRgb8(white_canvas(32, 32));
        let mask = preprocess(&image, &PreprocessParameters::default()).unwrap();
        assert_eq!(mask.ink_count(), 0);
        assert_eq!((mask.width(), mask.height()), (32, 32));
    }

    #[test]
    fn test_zero_sized_image_is_invalid() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let err = preprocess(&image, &PreprocessParameters::default()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_thick_stroke_is_thinned_to_single_pixel() {
        let mut canvas = white_canvas(40, 20);
        for y in 8..13 {
            for x in 5..35 {
                canvas.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let params = PreprocessParameters {
            blur_sigma: 0.0,
            close_iterations: 0,
            dilate_iterations: 0,
            thin: true,
        };
        let mask = preprocess(&DynamicImage::ImageRgb8(canvas), &params).unwrap();

        assert!(mask.ink_count() > 0);
        // Every interior column of the bar keeps exactly one ink pixel
        for x in 10..30 {
            let column = (0..20).filter(|&y| mask.is_ink(x, y)).count();
            assert_eq!(column, 1, "column {} should be one pixel wide", x);
        }
    }

    #[test]
    fn test_thinning_keeps_single_pixel_line() {
        let mut gray = GrayImage::new(20, 5);
        for x in 2..18 {
            gray.put_pixel(x, 2, Luma([INK]));
        }
        let before = gray.clone();
        let removed = thin_zhang_suen(&mut gray);
        assert_eq!(removed, 0);
        assert_eq!(gray, before);
    }

    #[test]
    fn test_stored_polarity_round_trip() {
        let mut gray = GrayImage::new(4, 4);
        gray.put_pixel(1, 2, Luma([INK]));
        let mask = RasterMask::from_gray(gray);

        let stored = mask.to_image();
        assert_eq!(stored.get_pixel(1, 2).0[0], 0);
        assert_eq!(stored.get_pixel(0, 0).0[0], 255);

        let reloaded = RasterMask::from_image(&DynamicImage::ImageLuma8(stored));
        assert_eq!(reloaded, mask);
    }

    #[test]
    fn test_invalid_parameters() {
        let params = PreprocessParameters {
            blur_sigma: -1.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = PreprocessParameters {
            dilate_iterations: 20,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_corrupt_bytes_are_invalid_input() {
        let err = RasterPreprocessor::default()
            .process_bytes(b"definitely not a png")
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);

        let err = RasterPreprocessor::default().process_bytes(&[]).unwrap_err();
        assert!(matches!(err, CamToolError::InvalidInput(_)));
    }
}
