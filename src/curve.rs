//! Tone-curve synthesis for the contrast (gamma) control.

use std::sync::Arc;

/// Display response exponent the gamma control is defined against,
/// approximating the sRGB transfer curve.
pub const REFERENCE_GAMMA: f64 = 2.2;

/// Number of samples in a synthesized curve.
pub const SAMPLE_COUNT: usize = 256;

/// Maximum sample value (16-bit full scale).
pub const OUTPUT_DEPTH: u32 = 65535;

/// A sampled tone reproduction curve.
///
/// Samples are quantized outputs for evenly spaced inputs over `[0, 1]`,
/// non-decreasing from 0 to full scale. One curve is shared across all
/// three channels, so [ToneCurve::gamma] hands out an [Arc] to
/// reference three times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneCurve {
    samples: Vec<u16>,
}

impl ToneCurve {
    /// Synthesizes the curve for a user gamma value.
    ///
    /// The profile exponent is `2.2 / gamma`, mirroring the xrandr-style
    /// convention in which the user's value divides an assumed 2.2
    /// display response. That mapping is a carried-over convention, not
    /// a calibrated colorimetric model. Callers constrain `gamma` to
    /// `(0.1, 3.0]`; values near zero would produce an unbounded
    /// exponent.
    pub fn gamma(user_gamma: f64) -> Arc<ToneCurve> {
        debug_assert!(
            user_gamma > 0.1 && user_gamma <= 3.0,
            "gamma {user_gamma} outside (0.1, 3.0]"
        );
        let exponent = REFERENCE_GAMMA / user_gamma;

        let mut samples = Vec::with_capacity(SAMPLE_COUNT);
        for i in 0..SAMPLE_COUNT {
            let x = i as f64 / (SAMPLE_COUNT - 1) as f64;
            let y = x.powf(exponent);
            let output = (y * OUTPUT_DEPTH as f64).round().clamp(0.0, OUTPUT_DEPTH as f64);
            samples.push(output as u16);
        }

        Arc::new(ToneCurve { samples })
    }

    /// Wraps raw samples decoded from an existing profile.
    pub fn from_samples(samples: Vec<u16>) -> ToneCurve {
        ToneCurve { samples }
    }

    /// The quantized samples, in input order.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_gamma_matches_reference_ramp() {
        let curve = ToneCurve::gamma(1.0);
        let samples = curve.samples();
        assert_eq!(samples.len(), SAMPLE_COUNT);

        for (i, &sample) in samples.iter().enumerate() {
            let x = i as f64 / (SAMPLE_COUNT - 1) as f64;
            let expected = (x.powf(2.2) * OUTPUT_DEPTH as f64).round() as u16;
            assert_eq!(sample, expected, "sample {i} diverged from x^2.2");
        }
    }

    #[test]
    fn endpoints_are_pinned() {
        for gamma in [0.11, 0.5, 1.0, 2.2, 3.0] {
            let curve = ToneCurve::gamma(gamma);
            let samples = curve.samples();
            assert_eq!(samples[0], 0, "gamma {gamma}");
            assert_eq!(samples[SAMPLE_COUNT - 1], OUTPUT_DEPTH as u16, "gamma {gamma}");
        }
    }

    #[test]
    fn output_is_non_decreasing_across_the_gamma_range() {
        // Sweep the accepted range, endpoints included.
        let mut gamma = 0.11;
        while gamma <= 3.0 {
            let curve = ToneCurve::gamma(gamma);
            for pair in curve.samples().windows(2) {
                assert!(pair[1] >= pair[0], "regression at gamma {gamma}");
            }
            gamma += 0.13;
        }
    }

    #[test]
    fn low_gamma_darkens_midtones() {
        // Exponent 2.2 / 0.5 = 4.4 pushes midtones down.
        let neutral = ToneCurve::gamma(1.0);
        let dark = ToneCurve::gamma(0.5);
        let mid = SAMPLE_COUNT / 2;
        assert!(dark.samples()[mid] < neutral.samples()[mid]);
    }
}
