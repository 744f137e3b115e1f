// src/processing/spectral.rs
//! Range-Doppler processing of raw FMCW frames
//!
//! Per frame: window each chirp and take its range FFT (keeping the
//! non-negative half), window each range bin across chirps and take the
//! Doppler FFT, fftshift the Doppler axis so zero velocity lands on row
//! `num_chirps / 2`, then convert magnitude to dB.

use crate::config::processing_config::{SpectralConfig, WindowType};
use crate::config::RadarConfig;
use crate::error::{RadarErrorBuilder, RadarResult};
use crate::processing::windowing::Window;
use crate::utils::conversion::magnitude_to_db;
use ndarray::Array2;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, Level};

/// One frame of complex IQ samples, shape `(num_chirps, num_samples)`
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    data: Array2<Complex<f32>>,
}

impl RawFrame {
    /// Wrap samples, rejecting a shape that disagrees with `config`
    pub fn new(config: &RadarConfig, data: Array2<Complex<f32>>) -> RadarResult<Self> {
        let expected = config.frame_shape();
        let actual = data.dim();
        if actual != expected {
            return Err(RadarErrorBuilder::new("raw_frame", "new").shape_mismatch(expected, actual));
        }
        Ok(Self { data })
    }

    /// Wrap samples without a shape check; the spectral processor still validates
    pub fn from_array(data: Array2<Complex<f32>>) -> Self {
        Self { data }
    }

    pub fn zeros(config: &RadarConfig) -> Self {
        Self {
            data: Array2::zeros(config.frame_shape()),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> &Array2<Complex<f32>> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<Complex<f32>> {
        &mut self.data
    }

    pub fn into_inner(self) -> Array2<Complex<f32>> {
        self.data
    }
}

/// Power in dB indexed `[doppler_bin, range_bin]`, shape `(num_chirps, num_samples / 2)`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeDopplerMap {
    data: Array2<f32>,
}

impl RangeDopplerMap {
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn into_inner(self) -> Array2<f32> {
        self.data
    }

    /// `(num_doppler_bins, num_range_bins)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn num_doppler_bins(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_range_bins(&self) -> usize {
        self.data.ncols()
    }

    pub fn power_db(&self, range_bin: usize, doppler_bin: usize) -> Option<f32> {
        self.data.get([doppler_bin, range_bin]).copied()
    }

    /// Strongest finite cell as `(range_bin, doppler_bin, power_db)`
    pub fn peak(&self) -> Option<(usize, usize, f32)> {
        self.data
            .indexed_iter()
            .filter(|(_, v)| v.is_finite())
            .fold(None, |best: Option<(usize, usize, f32)>, ((d, r), &v)| match best {
                Some((_, _, b)) if b >= v => best,
                _ => Some((r, d, v)),
            })
    }
}

/// Numpy-compatible fftshift target index for bin `k` of an `n`-point spectrum
#[inline]
pub fn fftshift_index(k: usize, n: usize) -> usize {
    (k + n / 2) % n
}

/// Converts raw frames into Range-Doppler maps
///
/// FFT plans and both windows are built once; `process_frame` is a pure
/// function of the frame and the configuration it was built with.
pub struct SpectralProcessor {
    num_chirps: usize,
    num_samples: usize,
    range_window: Window,
    doppler_window: Window,
    range_fft: Arc<dyn Fft<f32>>,
    doppler_fft: Arc<dyn Fft<f32>>,
    scratch_len: usize,
}

impl fmt::Debug for SpectralProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralProcessor")
            .field("num_chirps", &self.num_chirps)
            .field("num_samples", &self.num_samples)
            .field("window", &self.range_window.window_type())
            .finish()
    }
}

impl SpectralProcessor {
    /// Hamming-windowed processor for `config`
    pub fn new(config: &RadarConfig) -> Self {
        Self::with_window(config, WindowType::Hamming)
    }

    pub fn with_config(config: &RadarConfig, spectral: &SpectralConfig) -> Self {
        Self::with_window(config, spectral.window)
    }

    pub fn with_window(config: &RadarConfig, window_type: WindowType) -> Self {
        let (num_chirps, num_samples) = config.frame_shape();

        let mut planner = FftPlanner::new();
        let range_fft = planner.plan_fft_forward(num_samples);
        let doppler_fft = planner.plan_fft_forward(num_chirps);
        let scratch_len = range_fft
            .get_inplace_scratch_len()
            .max(doppler_fft.get_inplace_scratch_len());

        Self {
            num_chirps,
            num_samples,
            range_window: Window::new(window_type, num_samples),
            doppler_window: Window::new(window_type, num_chirps),
            range_fft,
            doppler_fft,
            scratch_len,
        }
    }

    /// Expected input shape `(num_chirps, num_samples)`
    pub fn frame_shape(&self) -> (usize, usize) {
        (self.num_chirps, self.num_samples)
    }

    /// Output shape `(num_chirps, num_samples / 2)`
    pub fn map_shape(&self) -> (usize, usize) {
        (self.num_chirps, self.num_samples / 2)
    }

    pub fn window_type(&self) -> WindowType {
        self.range_window.window_type()
    }

    /// Produce the Range-Doppler power map for one frame
    pub fn process_frame(&self, frame: &RawFrame) -> RadarResult<RangeDopplerMap> {
        let expected = self.frame_shape();
        let actual = frame.shape();
        if actual != expected {
            return Err(RadarErrorBuilder::new("spectral_processor", "process_frame")
                .shape_mismatch(expected, actual));
        }

        let (rows, half) = self.map_shape();
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.scratch_len];

        // Range FFT per chirp
        let mut range_profiles = Array2::<Complex<f32>>::zeros((rows, half));
        let mut chirp_buffer = vec![Complex::new(0.0f32, 0.0); self.num_samples];
        for (chirp, mut profile) in frame.data().outer_iter().zip(range_profiles.outer_iter_mut()) {
            for (dst, &src) in chirp_buffer.iter_mut().zip(chirp.iter()) {
                *dst = src;
            }
            self.range_window.apply(chirp_buffer.iter_mut());
            self.range_fft.process_with_scratch(&mut chirp_buffer, &mut scratch);
            for (dst, &src) in profile.iter_mut().zip(&chirp_buffer[..half]) {
                *dst = src;
            }
        }

        // Doppler FFT per range bin, written straight into shifted rows
        let mut map = Array2::<f32>::zeros((rows, half));
        let mut column = vec![Complex::new(0.0f32, 0.0); rows];
        for range_bin in 0..half {
            for (dst, &src) in column.iter_mut().zip(range_profiles.column(range_bin).iter()) {
                *dst = src;
            }
            self.doppler_window.apply(column.iter_mut());
            self.doppler_fft.process_with_scratch(&mut column, &mut scratch);
            for (k, value) in column.iter().enumerate() {
                map[[fftshift_index(k, rows), range_bin]] = magnitude_to_db(value.norm());
            }
        }

        let map = RangeDopplerMap::new(map);
        if tracing::enabled!(Level::TRACE) {
            let peak_db = map.peak().map(|(_, _, p)| p);
            trace!(rows, cols = half, ?peak_db, "Range-Doppler map computed");
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadarSettings;
    use crate::error::RadarError;
    use std::f32::consts::PI;

    fn small_config() -> RadarConfig {
        RadarConfig::new(RadarSettings {
            num_chirps: 16,
            num_samples: 32,
            ..RadarSettings::default()
        })
        .unwrap()
    }

    fn tone_frame(config: &RadarConfig, range_bin: f32, doppler_offset: f32) -> RawFrame {
        let (m_total, n_total) = config.frame_shape();
        let data = Array2::from_shape_fn((m_total, n_total), |(m, n)| {
            let phase =
                2.0 * PI * (range_bin * n as f32 / n_total as f32 + doppler_offset * m as f32 / m_total as f32);
            Complex::new(phase.cos(), phase.sin())
        });
        RawFrame::new(config, data).unwrap()
    }

    #[test]
    fn test_fftshift_index_matches_numpy() {
        // np.fft.fftshift(np.arange(4)) == [2, 3, 0, 1]
        let even: Vec<usize> = (0..4).map(|k| fftshift_index(k, 4)).collect();
        assert_eq!(even, vec![2, 3, 0, 1]);
        // np.fft.fftshift(np.arange(5)) == [3, 4, 0, 1, 2]
        let mut odd = vec![0; 5];
        for k in 0..5 {
            odd[fftshift_index(k, 5)] = k;
        }
        assert_eq!(odd, vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn test_peak_carries_both_window_gains() {
        let config = small_config();
        for window_type in [WindowType::Rectangular, WindowType::Hamming, WindowType::Blackman] {
            let processor = SpectralProcessor::with_window(&config, window_type);
            let map = processor.process_frame(&tone_frame(&config, 5.0, 2.0)).unwrap();

            let range_gain: f32 = Window::new(window_type, 32).coefficients().iter().sum();
            let doppler_gain: f32 = Window::new(window_type, 16).coefficients().iter().sum();
            let expected_db = 20.0 * (range_gain * doppler_gain).log10();

            let (range_bin, doppler_bin, peak_db) = map.peak().unwrap();
            assert_eq!((range_bin, doppler_bin), (5, 10), "{:?}", window_type);
            assert!((peak_db - expected_db).abs() < 1e-2, "{:?}: {} vs {}", window_type, peak_db, expected_db);
        }
    }

    #[test]
    fn test_output_shape() {
        let config = small_config();
        let processor = SpectralProcessor::new(&config);
        let map = processor.process_frame(&RawFrame::zeros(&config)).unwrap();
        assert_eq!(map.shape(), (16, 16));
        assert_eq!(map.num_doppler_bins(), config.num_chirps());
        assert_eq!(map.num_range_bins(), config.num_samples() / 2);
        // All-zero input floors at 20*log10(1e-10)
        assert!(map.data().iter().all(|&v| (v + 200.0).abs() < 1e-3));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let config = small_config();
        let processor = SpectralProcessor::new(&config);
        let frame = RawFrame::from_array(Array2::zeros((16, 30)));
        let err = processor.process_frame(&frame).unwrap_err();
        match err {
            RadarError::ShapeMismatch { expected, actual, .. } => {
                assert_eq!(expected, (16, 32));
                assert_eq!(actual, (16, 30));
            }
            other => panic!("unexpected error {:?}", other),
        }

        assert!(RawFrame::new(&config, Array2::zeros((8, 32))).is_err());
    }

    #[test]
    fn test_stationary_tone_peaks_at_zero_doppler() {
        let config = small_config();
        let processor = SpectralProcessor::new(&config);
        let map = processor.process_frame(&tone_frame(&config, 5.0, 0.0)).unwrap();
        let (r, d, _) = map.peak().unwrap();
        assert_eq!(r, 5);
        assert_eq!(d, config.zero_doppler_bin());
    }

    #[test]
    fn test_moving_tone_peaks_at_shifted_doppler() {
        let config = small_config();
        let processor = SpectralProcessor::new(&config);
        let map = processor.process_frame(&tone_frame(&config, 9.0, 3.0)).unwrap();
        let (r, d, _) = map.peak().unwrap();
        assert_eq!(r, 9);
        assert_eq!(d, config.zero_doppler_bin() + 3);
    }

    #[test]
    fn test_processing_is_deterministic() {
        let config = small_config();
        let processor = SpectralProcessor::new(&config);
        let frame = tone_frame(&config, 4.0, -2.0);
        assert_eq!(
            processor.process_frame(&frame).unwrap(),
            processor.process_frame(&frame).unwrap()
        );
    }

    #[test]
    fn test_window_override() {
        let config = small_config();
        let spectral = SpectralConfig { window: WindowType::Rectangular };
        let processor = SpectralProcessor::with_config(&config, &spectral);
        assert_eq!(processor.window_type(), WindowType::Rectangular);

        // Rectangular window: an on-bin tone has magnitude N*M at its peak
        let map = processor.process_frame(&tone_frame(&config, 2.0, 0.0)).unwrap();
        let (_, _, peak) = map.peak().unwrap();
        let expected = 20.0 * ((16 * 32) as f32).log10();
        assert!((peak - expected).abs() < 1e-2);
    }
}
