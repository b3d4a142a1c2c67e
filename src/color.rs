//! Chromaticity math for white-relative saturation scaling.
//!
//! Profile colorants are stored as CIE XYZ tristimulus values. To make a
//! saturation adjustment that leaves brightness alone, each colorant is
//! projected into xyY chromaticity space, moved along the line through the
//! profile-connection-space white point, and projected back.

/// A CIE XYZ tristimulus value.
///
/// The field shape matches the colorant entries of an ICC profile;
/// `y` doubles as relative luminance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tristimulus {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A CIE xyY chromaticity point: hue and saturation in `(x, y)`,
/// luminance carried separately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chromaticity {
    pub x: f64,
    pub y: f64,
    pub luminance: f64,
}

/// D50 white point of the ICC profile connection space.
///
/// Colorants in a profile are expressed relative to this illuminant,
/// so saturation scaling pivots around it. Not user-configurable.
pub const PCS_WHITE: Tristimulus = Tristimulus {
    x: 0.9642,
    y: 1.0,
    z: 0.8249,
};

/// Floor applied to the user's saturation value.
///
/// The scale factor is the reciprocal of the input, so the floor both
/// avoids a division by zero and caps the strongest adjustment.
pub const MIN_SATURATION: f64 = 0.01;

impl Tristimulus {
    /// The zero (black) tristimulus value.
    pub const ZERO: Tristimulus = Tristimulus {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Projects this value onto the chromaticity plane.
    ///
    /// A black (all-zero) value has no defined chromaticity; the PCS
    /// white chromaticity is returned in that case so callers never
    /// divide by zero. The luminance component is passed through.
    pub fn to_chromaticity(self) -> Chromaticity {
        let sum = self.x + self.y + self.z;
        if sum == 0.0 {
            let white_sum = PCS_WHITE.x + PCS_WHITE.y + PCS_WHITE.z;
            return Chromaticity {
                x: PCS_WHITE.x / white_sum,
                y: PCS_WHITE.y / white_sum,
                luminance: self.y,
            };
        }

        Chromaticity {
            x: self.x / sum,
            y: self.y / sum,
            luminance: self.y,
        }
    }
}

impl Chromaticity {
    /// Reconstructs the tristimulus value with this chromaticity and
    /// luminance. A degenerate point with `y = 0` maps to black.
    pub fn to_tristimulus(self) -> Tristimulus {
        if self.y == 0.0 {
            return Tristimulus::ZERO;
        }

        let scale = self.luminance / self.y;
        Tristimulus {
            x: scale * self.x,
            y: self.luminance,
            z: scale * (1.0 - self.x - self.y),
        }
    }
}

/// Scales the chromaticity of `primary` relative to `white`,
/// preserving its luminance.
///
/// The scale factor is the reciprocal of `saturation` (floored at
/// [MIN_SATURATION]): user values below 1.0 push the primary away from
/// white, values above 1.0 pull it in, and 1.0 is the identity. The
/// inversion is deliberate and matches the control's established
/// behavior; see the module tests for the direction of travel.
pub fn scale_saturation(primary: Tristimulus, white: Tristimulus, saturation: f64) -> Tristimulus {
    let factor = 1.0 / saturation.max(MIN_SATURATION);

    let anchor = white.to_chromaticity();
    let point = primary.to_chromaticity();

    Chromaticity {
        x: anchor.x + (point.x - anchor.x) * factor,
        y: anchor.y + (point.y - anchor.y) * factor,
        luminance: point.luminance,
    }
    .to_tristimulus()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    /// sRGB red colorant, adapted to the D50 connection space.
    const RED: Tristimulus = Tristimulus {
        x: 0.4360,
        y: 0.2225,
        z: 0.0139,
    };

    /// sRGB green colorant, adapted to the D50 connection space.
    const GREEN: Tristimulus = Tristimulus {
        x: 0.3851,
        y: 0.7169,
        z: 0.0971,
    };

    /// sRGB blue colorant, adapted to the D50 connection space.
    const BLUE: Tristimulus = Tristimulus {
        x: 0.1431,
        y: 0.0606,
        z: 0.7139,
    };

    fn chromaticity_distance_from_white(t: Tristimulus) -> f64 {
        let anchor = PCS_WHITE.to_chromaticity();
        let point = t.to_chromaticity();
        ((point.x - anchor.x).powi(2) + (point.y - anchor.y).powi(2)).sqrt()
    }

    #[test]
    fn round_trips_through_chromaticity() {
        // A grid of plausible colorant values, including skewed ones.
        let values = [
            RED,
            GREEN,
            BLUE,
            PCS_WHITE,
            Tristimulus { x: 0.01, y: 0.99, z: 0.002 },
            Tristimulus { x: 0.7347, y: 0.2653, z: 0.0001 },
            Tristimulus { x: 0.2, y: 0.3, z: 0.5 },
        ];

        for value in values {
            let back = value.to_chromaticity().to_tristimulus();
            assert!((back.x - value.x).abs() < EPSILON, "X diverged for {value:?}");
            assert!((back.y - value.y).abs() < EPSILON, "Y diverged for {value:?}");
            assert!((back.z - value.z).abs() < EPSILON, "Z diverged for {value:?}");
        }
    }

    #[test]
    fn black_has_white_fallback_chromaticity() {
        let chroma = Tristimulus::ZERO.to_chromaticity();
        let white = PCS_WHITE.to_chromaticity();

        assert!((chroma.x - white.x).abs() < EPSILON);
        assert!((chroma.y - white.y).abs() < EPSILON);
        assert_eq!(chroma.luminance, 0.0);
    }

    #[test]
    fn degenerate_chromaticity_maps_to_black() {
        let point = Chromaticity {
            x: 0.3,
            y: 0.0,
            luminance: 0.5,
        };
        assert_eq!(point.to_tristimulus(), Tristimulus::ZERO);
    }

    #[test]
    fn neutral_saturation_is_identity() {
        for primary in [RED, GREEN, BLUE] {
            let scaled = scale_saturation(primary, PCS_WHITE, 1.0);
            let before = primary.to_chromaticity();
            let after = scaled.to_chromaticity();

            assert!((after.x - before.x).abs() < EPSILON);
            assert!((after.y - before.y).abs() < EPSILON);
            assert!((after.luminance - before.luminance).abs() < EPSILON);
        }
    }

    #[test]
    fn luminance_is_preserved_at_any_saturation() {
        for saturation in [0.01, 0.5, 1.0, 2.0, 4.0] {
            for primary in [RED, GREEN, BLUE] {
                let scaled = scale_saturation(primary, PCS_WHITE, saturation);
                assert!(
                    (scaled.y - primary.y).abs() < EPSILON,
                    "luminance drifted at saturation {saturation}"
                );
            }
        }
    }

    #[test]
    fn distance_from_white_falls_as_saturation_rises() {
        // The factor is the reciprocal of the input: smaller values
        // push chromaticity away from white, larger values pull it in.
        let inputs = [0.01, 0.25, 0.5, 1.0, 2.0, 4.0];

        for primary in [RED, GREEN, BLUE] {
            let mut previous = f64::INFINITY;
            for saturation in inputs {
                let distance =
                    chromaticity_distance_from_white(scale_saturation(primary, PCS_WHITE, saturation));
                assert!(
                    distance < previous,
                    "distance did not fall between saturations for {primary:?}"
                );
                previous = distance;
            }
        }
    }

    #[test]
    fn zero_saturation_clamps_to_floor() {
        for primary in [RED, GREEN, BLUE] {
            let at_zero = scale_saturation(primary, PCS_WHITE, 0.0);
            let at_floor = scale_saturation(primary, PCS_WHITE, MIN_SATURATION);

            assert!((at_zero.x - at_floor.x).abs() < EPSILON);
            assert!((at_zero.y - at_floor.y).abs() < EPSILON);
            assert!((at_zero.z - at_floor.z).abs() < EPSILON);
            assert!(at_zero.x.is_finite() && at_zero.z.is_finite());
        }
    }
}
