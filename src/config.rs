use serde::{Deserialize, Serialize};

/// Physics constants for the wind mouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tuning {
    /// Pull toward the target, pixels per step squared
    #[serde(default = "default_gravity_strength")]
    pub gravity_strength: u8,
    /// Ceiling on the random wind added per step
    #[serde(default = "default_max_wind_magnitude")]
    pub max_wind_magnitude: u8,
    /// Speed cap in pixels per step, also the final-approach distance
    #[serde(default = "default_max_step_size")]
    pub max_step_size: u8,
}

fn default_gravity_strength() -> u8 {
    10
}

fn default_max_wind_magnitude() -> u8 {
    2
}

fn default_max_step_size() -> u8 {
    32
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity_strength: default_gravity_strength(),
            max_wind_magnitude: default_max_wind_magnitude(),
            max_step_size: default_max_step_size(),
        }
    }
}

impl Tuning {
    /// Tuning without jitter: paths bend only through rounding
    pub fn calm() -> Self {
        Self {
            max_wind_magnitude: 0,
            ..Self::default()
        }
    }
}
