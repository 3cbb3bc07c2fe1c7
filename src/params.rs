//! The five tunable enhancement knobs and their validation rules.
//!
//! Validation is total and silent: every construction path clamps each
//! field into its documented range and never fails. NaN inputs fall back to
//! the field default rather than propagating.

/// Inclusive clamp range plus the default used when a raw field is absent.
#[derive(Clone, Copy, Debug)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamRange {
    fn apply(&self, raw: Option<f32>) -> f32 {
        match raw {
            Some(v) if v.is_nan() => self.default,
            Some(v) => v.clamp(self.min, self.max),
            None => self.default,
        }
    }
}

/// Clamp range for [`EnhanceParams::denoise_strength`].
pub const DENOISE_STRENGTH: ParamRange = ParamRange {
    min: 0.0,
    max: 20.0,
    default: 15.0,
};
/// Clamp range for [`EnhanceParams::saturation_factor`].
pub const SATURATION_FACTOR: ParamRange = ParamRange {
    min: 0.5,
    max: 2.0,
    default: 1.3,
};
/// Clamp range for [`EnhanceParams::sharpness_factor`].
pub const SHARPNESS_FACTOR: ParamRange = ParamRange {
    min: 0.0,
    max: 3.0,
    default: 1.0,
};
/// Clamp range for [`EnhanceParams::contrast_alpha`].
pub const CONTRAST_ALPHA: ParamRange = ParamRange {
    min: 1.0,
    max: 3.0,
    default: 1.15,
};
/// Clamp range for [`EnhanceParams::brightness_beta`].
pub const BRIGHTNESS_BETA: ParamRange = ParamRange {
    min: -100.0,
    max: 100.0,
    default: 15.0,
};

/// Raw, unvalidated knob inputs as the caller hands them over (absent
/// fields take the documented defaults).
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct RawEnhanceParams {
    #[serde(default)]
    pub denoise_strength: Option<f32>,
    #[serde(default)]
    pub saturation_factor: Option<f32>,
    #[serde(default)]
    pub sharpness_factor: Option<f32>,
    #[serde(default)]
    pub contrast_alpha: Option<f32>,
    #[serde(default)]
    pub brightness_beta: Option<f32>,
}

/// Validated enhancement parameters.
///
/// Invariant: every field lies within its documented clamp range. The type
/// is read-only for the duration of a pipeline run; no stage mutates it.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnhanceParams {
    /// Non-local-means luminance filter strength, `[0, 20]`.
    pub denoise_strength: f32,
    /// Saturation channel multiplier, `[0.5, 2]`.
    pub saturation_factor: f32,
    /// Sharpening kernel interpolation weight, `[0, 3]`.
    pub sharpness_factor: f32,
    /// Global contrast multiplier, `[1, 3]`.
    pub contrast_alpha: f32,
    /// Global brightness offset, `[-100, 100]`.
    pub brightness_beta: f32,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self::manual(RawEnhanceParams::default())
    }
}

impl EnhanceParams {
    /// Build validated parameters from raw caller input. Absent fields take
    /// defaults; out-of-range values are silently clamped.
    pub fn manual(raw: RawEnhanceParams) -> Self {
        Self {
            denoise_strength: DENOISE_STRENGTH.apply(raw.denoise_strength),
            saturation_factor: SATURATION_FACTOR.apply(raw.saturation_factor),
            sharpness_factor: SHARPNESS_FACTOR.apply(raw.sharpness_factor),
            contrast_alpha: CONTRAST_ALPHA.apply(raw.contrast_alpha),
            brightness_beta: BRIGHTNESS_BETA.apply(raw.brightness_beta),
        }
    }

    /// Fixed preset that bypasses user input entirely.
    pub fn auto() -> Self {
        Self {
            denoise_strength: 10.0,
            saturation_factor: 1.2,
            sharpness_factor: 1.0,
            contrast_alpha: 1.1,
            brightness_beta: 5.0,
        }
    }

    /// Re-clamp every field into range. Total and silent.
    pub fn clamped(self) -> Self {
        Self::manual(RawEnhanceParams {
            denoise_strength: Some(self.denoise_strength),
            saturation_factor: Some(self.saturation_factor),
            sharpness_factor: Some(self.sharpness_factor),
            contrast_alpha: Some(self.contrast_alpha),
            brightness_beta: Some(self.brightness_beta),
        })
    }

    #[cfg(test)]
    fn in_range(&self) -> bool {
        (DENOISE_STRENGTH.min..=DENOISE_STRENGTH.max).contains(&self.denoise_strength)
            && (SATURATION_FACTOR.min..=SATURATION_FACTOR.max).contains(&self.saturation_factor)
            && (SHARPNESS_FACTOR.min..=SHARPNESS_FACTOR.max).contains(&self.sharpness_factor)
            && (CONTRAST_ALPHA.min..=CONTRAST_ALPHA.max).contains(&self.contrast_alpha)
            && (BRIGHTNESS_BETA.min..=BRIGHTNESS_BETA.max).contains(&self.brightness_beta)
    }
}
