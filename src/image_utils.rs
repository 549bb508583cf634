use std::{io::Cursor, path::Path};

use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use ndarray::Array2;

use crate::error::Result;

/// Luminance conversion with ITU-R BT.601 weights, rounded to the nearest level.
pub fn rgb_to_gray(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let lum = 0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
        gray.put_pixel(x, y, Luma([lum.round().clamp(0.0, 255.0) as u8]));
    }

    gray
}

pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => rgb_to_gray(&other.to_rgb8()),
    }
}

pub fn load_grayscale<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
    let image = image::open(path)?;
    Ok(to_grayscale(&image))
}

pub fn decode_grayscale(bytes: &[u8]) -> Result<GrayImage> {
    let image = image::load_from_memory(bytes)?;
    Ok(to_grayscale(&image))
}

pub fn gray_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut arr = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        arr[[y as usize, x as usize]] = pixel[0] as f64;
    }

    arr
}

/// Returns the grid rescaled into `[0, 1]` along with the original `(min, max)`.
pub fn normalize_unit(arr: &Array2<f64>) -> (Array2<f64>, f64, f64) {
    let min = arr.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = arr.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range < 1e-10 {
        let floor = if min.is_finite() { min } else { 0.0 };
        (Array2::zeros(arr.dim()), floor, floor)
    } else {
        (arr.mapv(|v| (v - min) / range), min, max)
    }
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
