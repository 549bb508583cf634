//! Centered 2D frequency spectra of grayscale images.

use image::GrayImage;
use ndarray::Array2;
use num_complex::Complex;
use rayon::{iter::ParallelIterator, slice::ParallelSliceMut};
use rustfft::FftPlanner;

use crate::{
    error::{DetectorError, Result},
    image_utils::gray_to_array,
};

/// Modulus of the shifted 2D DFT. Same dimensions as the source image.
#[derive(Debug, Clone)]
pub struct MagnitudeSpectrum {
    values: Array2<f64>,
}

impl MagnitudeSpectrum {
    pub fn from_gray(gray: &GrayImage) -> Result<Self> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectorError::InvalidParameter(
                "Image has no pixels".into(),
            ));
        }

        let transformed = fft2(&gray_to_array(gray))?;
        let values = fftshift(&transformed).mapv(|c| c.norm());

        Ok(Self { values })
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// `(height, width)`
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn center(&self) -> (usize, usize) {
        let (height, width) = self.dim();
        (height / 2, width / 2)
    }

    pub fn log_scaled(&self) -> Array2<f64> {
        self.values.mapv(f64::ln_1p)
    }

    pub fn max(&self) -> f64 {
        self.values.iter().cloned().fold(0.0f64, f64::max)
    }
}

/// Forward 2D DFT: rows first, then columns.
pub fn fft2(input: &Array2<f64>) -> Result<Array2<Complex<f64>>> {
    let (height, width) = input.dim();
    let mut planner = FftPlanner::new();
    let row_fft = planner.plan_fft_forward(width);
    let col_fft = planner.plan_fft_forward(height);

    let mut rows = input
        .iter()
        .map(|&v| Complex::new(v, 0.0))
        .collect::<Vec<_>>();

    rows.par_chunks_mut(width)
        .for_each(|row| row_fft.process(row));

    let mut columns = transpose(&rows, height, width);

    columns
        .par_chunks_mut(height)
        .for_each(|column| col_fft.process(column));

    let data = transpose(&columns, width, height);

    Array2::from_shape_vec((height, width), data)
        .map_err(|e| DetectorError::AnalysisFailed(e.to_string()))
}

/// Rotates each axis by half its length so the zero frequency lands at
/// `(height / 2, width / 2)`.
pub fn fftshift<T: Clone>(input: &Array2<T>) -> Array2<T> {
    let (height, width) = input.dim();
    let shift_y = height / 2;
    let shift_x = width / 2;

    Array2::from_shape_fn((height, width), |(y, x)| {
        let src_y = (y + height - shift_y) % height;
        let src_x = (x + width - shift_x) % width;
        input[[src_y, src_x]].clone()
    })
}

fn transpose(data: &[Complex<f64>], rows: usize, cols: usize) -> Vec<Complex<f64>> {
    let mut out = vec![Complex::new(0.0, 0.0); data.len()];
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = data[r * cols + c];
        }
    }
    out
}
