//! Power-scale conversions shared by the spectral processor and CFAR detector

/// Offset added to magnitudes before taking the logarithm, avoids `log10(0)`
pub const MAGNITUDE_EPSILON: f32 = 1e-10;

/// Amplitude magnitude to dB: `20·log10(|x| + ε)`
#[inline]
pub fn magnitude_to_db(magnitude: f32) -> f32 {
    20.0 * (magnitude + MAGNITUDE_EPSILON).log10()
}

/// Power in dB to linear power: `10^(dB/10)`
///
/// Non-finite inputs map to zero power so that corrupted cells cannot raise
/// a noise estimate.
#[inline]
pub fn db_to_linear_power(db: f64) -> f64 {
    if db.is_finite() {
        10.0_f64.powf(db / 10.0)
    } else {
        0.0
    }
}

/// Linear power to dB: `10·log10(p)`
#[inline]
pub fn linear_power_to_db(power: f64) -> f64 {
    10.0 * power.log10()
}
