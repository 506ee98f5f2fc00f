//! Angular intensity distributions of light-source models.
//!
//! A distribution maps the angle between the source's downward axis and the
//! direction to a receiver to a relative intensity. Relative intensities are
//! normalized so that `∫ D dΩ = 4π` over the sphere, i.e. `flux × D / 4π` is
//! the radiant intensity in that direction for any profile.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Midpoint-rule steps over `[0, π/2]` used to normalize tabulated profiles.
const NORMALIZATION_STEPS: usize = 1024;

/// Beam shape of a source model.
///
/// Every variant except [`Distribution::Isotropic`] emits into the lower
/// hemisphere only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// Equal intensity in every direction.
    Isotropic,
    /// Intensity proportional to `cos θ` (flat LED board).
    #[default]
    Lambertian,
    /// Intensity proportional to `cosⁿ θ`; larger exponents give narrower beams.
    CosinePower { exponent: f64 },
    /// Wide beam: `sec² θ` up to the peak angle, then a linear taper to zero at 90°.
    Batwing { peak_angle_deg: f64 },
}

impl Distribution {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Distribution::Isotropic | Distribution::Lambertian => Ok(()),
            Distribution::CosinePower { exponent } => {
                if exponent.is_finite() && exponent >= 0.0 {
                    Ok(())
                } else {
                    Err(EngineError::InvalidSource(format!(
                        "cosine power exponent must be non-negative, got {exponent}"
                    )))
                }
            }
            Distribution::Batwing { peak_angle_deg } => {
                if peak_angle_deg.is_finite() && peak_angle_deg > 0.0 && peak_angle_deg < 90.0 {
                    Ok(())
                } else {
                    Err(EngineError::InvalidSource(format!(
                        "batwing peak angle must lie in (0, 90) degrees, got {peak_angle_deg}"
                    )))
                }
            }
        }
    }

    /// Unnormalized shape as a function of `cos θ`.
    fn shape(&self, cos_theta: f64) -> f64 {
        if !matches!(self, Distribution::Isotropic) && cos_theta <= 0.0 {
            return 0.0;
        }
        match *self {
            Distribution::Isotropic => 1.0,
            Distribution::Lambertian => cos_theta,
            Distribution::CosinePower { exponent } => cos_theta.powf(exponent),
            Distribution::Batwing { peak_angle_deg } => {
                let peak = peak_angle_deg.to_radians();
                let theta = cos_theta.clamp(0.0, 1.0).acos();
                if theta <= peak {
                    1.0 / (cos_theta * cos_theta)
                } else {
                    let cos_peak = peak.cos();
                    (FRAC_PI_2 - theta) / (FRAC_PI_2 - peak) / (cos_peak * cos_peak)
                }
            }
        }
    }

    /// Factor that scales [`Distribution::shape`] to carry the full flux.
    fn normalization(&self) -> f64 {
        match *self {
            Distribution::Isotropic => 1.0,
            // ∫ cosⁿθ dΩ over the lower hemisphere = 2π / (n + 1)
            Distribution::Lambertian => 4.0,
            Distribution::CosinePower { exponent } => 2.0 * (exponent + 1.0),
            Distribution::Batwing { .. } => 4.0 * PI / self.hemisphere_integral(NORMALIZATION_STEPS),
        }
    }

    /// `∫ shape dΩ` over the lower hemisphere (midpoint rule in θ).
    fn hemisphere_integral(&self, steps: usize) -> f64 {
        let h = FRAC_PI_2 / steps as f64;
        let sum: f64 = (0..steps)
            .map(|i| {
                let theta = (i as f64 + 0.5) * h;
                self.shape(theta.cos()) * theta.sin()
            })
            .sum();
        2.0 * PI * sum * h
    }

    /// Normalized profile ready for evaluation.
    ///
    /// Build it once per solve; batwing normalization integrates numerically.
    pub fn profile(&self) -> Profile {
        Profile {
            distribution: *self,
            scale: self.normalization(),
        }
    }
}

/// A [`Distribution`] with its normalization factor resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    distribution: Distribution,
    scale: f64,
}

impl Profile {
    /// Relative intensity in the direction at `cos θ` from the downward axis.
    ///
    /// Averages to 1 over the sphere. `cos_theta <= 0` is at or above the
    /// source plane.
    pub fn relative_intensity(&self, cos_theta: f64) -> f64 {
        self.scale * self.distribution.shape(cos_theta)
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }
}
