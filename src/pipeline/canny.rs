use std::path::Path;

use image::GrayImage;
use tracing::debug;

use crate::error::PipelineError;

/// Canny edge detector over an 8-bit grayscale image.
///
/// The four stages run in sequence: Gaussian blur, Sobel gradient,
/// non-maximum suppression, double-threshold hysteresis linking.
pub struct EdgeDetection {
    low_threshold: f32,
    high_threshold: f32,
    sigma: f32,
    kernel_size: usize,
}

impl EdgeDetection {
    pub fn new(low_threshold: f32, high_threshold: f32, sigma: f32, kernel_size: usize) -> Self {
        Self {
            low_threshold,
            high_threshold,
            sigma,
            kernel_size,
        }
    }

    /// Run the full detection on `input` and write the single-channel edge
    /// image to `output`. A normalized copy of the gradient-direction
    /// channel is written next to it for diagnostics.
    pub fn detect(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        let img = image::open(input)?.to_luma8();
        let width = img.width() as usize;
        let height = img.height() as usize;
        let pixels: Vec<f32> = img.as_raw().iter().map(|&p| p as f32).collect();
        debug!("loaded {}x{} image from {}", width, height, input.display());

        let blurred = gaussian_blur(&pixels, width, height, self.kernel_size, self.sigma);
        let (magnitude, direction) = sobel(&blurred, width, height);

        let direction_diag = output.with_file_name("sobel_direction.png");
        save_grayscale(&normalize_to_display(&direction), width, height, &direction_diag)?;

        let suppressed = non_maximum_suppression(&magnitude, &direction, width, height);
        let edges = hysteresis(&suppressed, width, height, self.low_threshold, self.high_threshold);

        save_grayscale(&edges, width, height, output)?;
        Ok(())
    }
}

/// Normalized 2-D Gaussian kernel, row-major.
fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let mean = (size / 2) as f32;
    let mut kernel = vec![0.0f32; size * size];
    let mut sum = 0.0f32;
    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32 - mean) / sigma;
            let dy = (y as f32 - mean) / sigma;
            let value = (-0.5 * (dx * dx + dy * dy)).exp()
                / (2.0 * std::f32::consts::PI * sigma * sigma);
            kernel[y * size + x] = value;
            sum += value;
        }
    }
    for value in &mut kernel {
        *value /= sum;
    }
    kernel
}

/// Convolve with a normalized Gaussian kernel. Out-of-range taps read as
/// zero, the same as convolving a zero-padded copy of the image.
fn gaussian_blur(pixels: &[f32], width: usize, height: usize, size: usize, sigma: f32) -> Vec<f32> {
    let kernel = gaussian_kernel(size, sigma);
    let half = (size / 2) as isize;

    let mut out = vec![0.0f32; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0f32;
            for ky in 0..size {
                for kx in 0..size {
                    let iy = y as isize + ky as isize - half;
                    let ix = x as isize + kx as isize - half;
                    if iy >= 0 && iy < height as isize && ix >= 0 && ix < width as isize {
                        acc += pixels[iy as usize * width + ix as usize] * kernel[ky * size + kx];
                    }
                }
            }
            out[y * width + x] = acc;
        }
    }
    out
}

/// 3x3 Sobel gradient: per-pixel magnitude (Euclidean norm of the two
/// directional responses) and direction (`atan2(gy, gx)`, radians). The
/// border ring is forced to zero in both channels.
fn sobel(pixels: &[f32], width: usize, height: usize) -> (Vec<f32>, Vec<f32>) {
    const SOBEL_X: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
    const SOBEL_Y: [[f32; 3]; 3] = [[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]];

    let mut magnitude = vec![0.0f32; width * height];
    let mut direction = vec![0.0f32; width * height];
    if width < 3 || height < 3 {
        return (magnitude, direction);
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut gx = 0.0f32;
            let mut gy = 0.0f32;
            for ky in 0..3 {
                for kx in 0..3 {
                    let pixel = pixels[(y + ky - 1) * width + (x + kx - 1)];
                    gx += pixel * SOBEL_X[ky][kx];
                    gy += pixel * SOBEL_Y[ky][kx];
                }
            }
            magnitude[y * width + x] = (gx * gx + gy * gy).sqrt();
            direction[y * width + x] = gy.atan2(gx);
        }
    }
    (magnitude, direction)
}

/// Keep a pixel only when its magnitude is >= both neighbors along the
/// perpendicular of its direction bucket; zero it otherwise.
///
/// The gradient angle is taken in degrees with negative values wrapped by
/// +180, then bucketed into the four canonical ranges.
fn non_maximum_suppression(
    magnitude: &[f32],
    direction: &[f32],
    width: usize,
    height: usize,
) -> Vec<f32> {
    let mut out = vec![0.0f32; width * height];
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut angle = direction[y * width + x].to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }

            let (a, b) = if !(22.5..157.5).contains(&angle) {
                // Horizontal gradient: compare east/west neighbors.
                (magnitude[y * width + x + 1], magnitude[y * width + x - 1])
            } else if angle < 67.5 {
                (
                    magnitude[(y + 1) * width + x - 1],
                    magnitude[(y - 1) * width + x + 1],
                )
            } else if angle < 112.5 {
                (magnitude[(y + 1) * width + x], magnitude[(y - 1) * width + x])
            } else {
                (
                    magnitude[(y - 1) * width + x - 1],
                    magnitude[(y + 1) * width + x + 1],
                )
            };

            let central = magnitude[y * width + x];
            if central >= a && central >= b {
                out[y * width + x] = central;
            }
        }
    }
    out
}

/// Double-threshold hysteresis linking over an explicit worklist.
///
/// Pixels >= `high` are strong seeds; weak pixels (>= `low`) 8-connected
/// to a strong pixel are promoted transitively. Every remaining non-strong
/// pixel is zeroed.
fn hysteresis(pixels: &[f32], width: usize, height: usize, low: f32, high: f32) -> Vec<f32> {
    let mut strong = vec![false; width * height];
    let mut weak = vec![false; width * height];
    let mut worklist: Vec<(usize, usize)> = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let value = pixels[y * width + x];
            if value >= high {
                strong[y * width + x] = true;
                worklist.push((x, y));
            } else if value >= low {
                weak[y * width + x] = true;
            }
        }
    }

    while let Some((x, y)) = worklist.pop() {
        for ny in y.saturating_sub(1)..=(y + 1).min(height.saturating_sub(1)) {
            for nx in x.saturating_sub(1)..=(x + 1).min(width.saturating_sub(1)) {
                let idx = ny * width + nx;
                if weak[idx] && !strong[idx] {
                    strong[idx] = true;
                    worklist.push((nx, ny));
                }
            }
        }
    }

    pixels
        .iter()
        .zip(&strong)
        .map(|(&value, &keep)| if keep { value } else { 0.0 })
        .collect()
}

/// Min-max normalize a channel into the 0-255 display range.
fn normalize_to_display(values: &[f32]) -> Vec<f32> {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !min.is_finite() || !max.is_finite() || (max - min).abs() < f32::EPSILON {
        return vec![0.0; values.len()];
    }
    values
        .iter()
        .map(|&v| (v - min) / (max - min) * 255.0)
        .collect()
}

fn save_grayscale(
    values: &[f32],
    width: usize,
    height: usize,
    path: &Path,
) -> Result<(), PipelineError> {
    let bytes: Vec<u8> = values.iter().map(|&v| v.clamp(0.0, 255.0) as u8).collect();
    let img = GrayImage::from_raw(width as u32, height as u32, bytes)
        .ok_or_else(|| PipelineError::Io(std::io::Error::other("pixel buffer size mismatch")))?;
    img.save(path)?;
    Ok(())
}
