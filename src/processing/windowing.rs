// src/processing/windowing.rs
//! Window (taper) functions applied before each FFT axis

use crate::config::processing_config::WindowType;
use rustfft::num_complex::Complex;
use std::f32::consts::PI;

/// Precomputed window coefficients for one transform length
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    window_type: WindowType,
    coefficients: Vec<f32>,
}

impl Window {
    pub fn new(window_type: WindowType, size: usize) -> Self {
        Self {
            window_type,
            coefficients: generate_window_function(window_type, size),
        }
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Multiply samples element-wise by the window. Lengths must match.
    pub fn apply<'a, I>(&self, samples: I)
    where
        I: IntoIterator<Item = &'a mut Complex<f32>>,
    {
        for (sample, &w) in samples.into_iter().zip(self.coefficients.iter()) {
            *sample *= w;
        }
    }
}

/// Symmetric window of `size` coefficients; `size == 1` yields `[1.0]`
pub fn generate_window_function(window_type: WindowType, size: usize) -> Vec<f32> {
    match size {
        0 => return Vec::new(),
        1 => return vec![1.0],
        _ => {}
    }

    let denom = (size - 1) as f32;
    match window_type {
        WindowType::Rectangular => vec![1.0; size],
        WindowType::Hamming => (0..size)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / denom).cos())
            .collect(),
        WindowType::Hanning => (0..size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / denom).cos()))
            .collect(),
        WindowType::Blackman => (0..size)
            .map(|i| {
                let n = i as f32 / denom;
                0.42 - 0.5 * (2.0 * PI * n).cos() + 0.08 * (4.0 * PI * n).cos()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_functions() {
        let hamming = generate_window_function(WindowType::Hamming, 10);
        assert_eq!(hamming.len(), 10);
        assert!((hamming[0] - 0.08).abs() < 1e-6);
        assert!((hamming[9] - 0.08).abs() < 1e-6);

        let hanning = generate_window_function(WindowType::Hanning, 10);
        assert!(hanning[0].abs() < 1e-6);

        let blackman = generate_window_function(WindowType::Blackman, 9);
        assert!((blackman[4] - 1.0).abs() < 1e-5);

        let rect = generate_window_function(WindowType::Rectangular, 5);
        assert!(rect.iter().all(|&x| x == 1.0));
    }

    #[test]
    fn test_windows_are_symmetric() {
        for window_type in [WindowType::Hamming, WindowType::Hanning, WindowType::Blackman] {
            let w = generate_window_function(window_type, 33);
            for i in 0..w.len() / 2 {
                assert!((w[i] - w[w.len() - 1 - i]).abs() < 1e-5, "{:?} at {}", window_type, i);
            }
            assert!((w[16] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_degenerate_lengths() {
        assert_eq!(generate_window_function(WindowType::Hamming, 1), vec![1.0]);
        assert!(generate_window_function(WindowType::Hamming, 0).is_empty());
        assert!(Window::new(WindowType::Blackman, 0).is_empty());
    }

    #[test]
    fn test_apply_scales_samples() {
        let window = Window::new(WindowType::Hamming, 4);
        let mut samples = vec![Complex::new(2.0f32, -2.0); 4];
        window.apply(samples.iter_mut());
        for (s, &w) in samples.iter().zip(window.coefficients()) {
            assert!((s.re - 2.0 * w).abs() < 1e-6);
            assert!((s.im + 2.0 * w).abs() < 1e-6);
        }
    }
}
