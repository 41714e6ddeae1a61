//! Configuration types for the grapple.
//!
//! [`GrappleConfig`] controls the rope's geometry (link spacing and scale),
//! its reach and extension speed, the pool sizing margin, and the joints used
//! between links and between the tail and the actor.

use crate::joint::CharacterJointConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest accepted link spacing. Smaller values are clamped up to this.
pub const MIN_LINK_SPACING: f64 = 0.001;

/// Main configuration for a grapple.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrappleConfig {
    /// Distance between consecutive link centres (m).
    pub link_spacing: f64,
    /// Uniform visual scale of each link.
    pub link_scale: f64,
    /// Maximum distance the rope extends before giving up (m).
    pub max_extension: f64,
    /// Speed at which the rope head advances while extending (m/s).
    pub extension_speed: f64,
    /// Give every other link a quarter twist about the rope axis.
    pub alternate_rotation: bool,
    /// Pool safety margin multiplied onto `ceil(max_extension / link_spacing)`.
    pub capacity_margin: f64,
    /// Squared distance at which the extending head counts as arrived.
    pub arrival_epsilon_sq: f64,
    /// Squared distance at which a retracting link counts as reeled in.
    pub retract_epsilon_sq: f64,
    /// Joint between consecutive links.
    pub chain_joint: CharacterJointConfig,
    /// Joint between the tail link and the attached actor.
    pub player_joint: CharacterJointConfig,
}

impl Default for GrappleConfig {
    fn default() -> Self {
        Self {
            link_spacing: 1.0,
            link_scale: 1.0,
            max_extension: 100.0,
            extension_speed: 5.0,
            alternate_rotation: false,
            capacity_margin: 1.1,
            arrival_epsilon_sq: 0.01,
            retract_epsilon_sq: 0.01,
            chain_joint: CharacterJointConfig::chain_link(),
            player_joint: CharacterJointConfig::player(),
        }
    }
}

impl GrappleConfig {
    /// Create a configuration for a short, fast grapple (20 m, 40 m/s, 0.5 m links).
    #[must_use]
    pub fn short_range() -> Self {
        Self {
            link_spacing: 0.5,
            link_scale: 0.5,
            max_extension: 20.0,
            extension_speed: 40.0,
            ..Default::default()
        }
    }

    /// Set the link spacing. Values below [`MIN_LINK_SPACING`] are floored when used.
    #[must_use]
    pub fn with_link_spacing(mut self, spacing: f64) -> Self {
        self.link_spacing = spacing;
        self
    }

    /// Set the link visual scale.
    #[must_use]
    pub fn with_link_scale(mut self, scale: f64) -> Self {
        self.link_scale = scale;
        self
    }

    /// Set the maximum extension distance.
    #[must_use]
    pub fn with_max_extension(mut self, distance: f64) -> Self {
        self.max_extension = distance;
        self
    }

    /// Set the extension speed.
    #[must_use]
    pub fn with_extension_speed(mut self, speed: f64) -> Self {
        self.extension_speed = speed;
        self
    }

    /// Enable or disable alternating link rotation.
    #[must_use]
    pub fn with_alternate_rotation(mut self, enable: bool) -> Self {
        self.alternate_rotation = enable;
        self
    }

    /// Set the pool safety margin.
    #[must_use]
    pub fn with_capacity_margin(mut self, margin: f64) -> Self {
        self.capacity_margin = margin;
        self
    }

    /// Set the joint used between links.
    #[must_use]
    pub fn with_chain_joint(mut self, joint: CharacterJointConfig) -> Self {
        self.chain_joint = joint;
        self
    }

    /// Set the joint used between the tail and the actor.
    #[must_use]
    pub fn with_player_joint(mut self, joint: CharacterJointConfig) -> Self {
        self.player_joint = joint;
        self
    }

    /// Link spacing after applying the [`MIN_LINK_SPACING`] floor.
    #[must_use]
    pub fn effective_link_spacing(&self) -> f64 {
        if self.link_spacing.is_nan() {
            return MIN_LINK_SPACING;
        }
        self.link_spacing.max(MIN_LINK_SPACING)
    }

    /// Number of links the pool preallocates.
    ///
    /// `ceil(ceil(max_extension / spacing) * margin)`, never less than the
    /// uncovered link count and never below two.
    #[must_use]
    pub fn link_capacity(&self) -> usize {
        let needed = (self.max_extension.max(0.0) / self.effective_link_spacing()).ceil();
        let with_margin = (needed * self.capacity_margin.max(1.0)).ceil();
        (with_margin as usize).max(needed as usize).max(2)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        // Non-positive spacing is floored by `effective_link_spacing`.
        if !self.link_spacing.is_finite() {
            return Err(crate::GrappleError::invalid_config(
                "link_spacing must be finite",
            ));
        }

        if !self.link_scale.is_finite() || self.link_scale <= 0.0 {
            return Err(crate::GrappleError::invalid_config(
                "link_scale must be positive and finite",
            ));
        }

        if !self.max_extension.is_finite() || self.max_extension < 0.0 {
            return Err(crate::GrappleError::invalid_config(
                "max_extension cannot be negative",
            ));
        }

        if !self.extension_speed.is_finite() || self.extension_speed <= 0.0 {
            return Err(crate::GrappleError::invalid_config(
                "extension_speed must be positive and finite",
            ));
        }

        if !self.capacity_margin.is_finite() || self.capacity_margin < 1.0 {
            return Err(crate::GrappleError::invalid_config(
                "capacity_margin must be at least 1",
            ));
        }

        if self.arrival_epsilon_sq <= 0.0 || self.retract_epsilon_sq <= 0.0 {
            return Err(crate::GrappleError::invalid_config(
                "epsilons must be positive",
            ));
        }

        self.chain_joint.validate()?;
        self.player_joint.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config() {
        let config = GrappleConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.link_spacing, 1.0, epsilon = 1e-10);
        // ceil(100 / 1) * 1.1, rounded up
        let capacity = config.link_capacity();
        assert!((110..=111).contains(&capacity), "capacity = {capacity}");
    }

    #[test]
    fn test_config_presets() {
        let short = GrappleConfig::short_range();
        assert!(short.validate().is_ok());
        assert!(short.link_capacity() >= 44);
    }

    #[test]
    fn test_config_builder() {
        let config = GrappleConfig::default()
            .with_link_spacing(0.25)
            .with_max_extension(10.0)
            .with_extension_speed(20.0)
            .with_alternate_rotation(true);

        assert_relative_eq!(config.link_spacing, 0.25, epsilon = 1e-10);
        assert!(config.alternate_rotation);
        assert!(config.link_capacity() >= 40);
    }

    #[test]
    fn test_spacing_floor() {
        let config = GrappleConfig::default().with_link_spacing(0.0);
        assert_relative_eq!(config.effective_link_spacing(), MIN_LINK_SPACING);
        assert!(config.validate().is_ok());

        let config = GrappleConfig::default().with_link_spacing(-2.0);
        assert_relative_eq!(config.effective_link_spacing(), MIN_LINK_SPACING);
        assert!(config.validate().is_ok());

        let config = GrappleConfig::default().with_link_spacing(f64::NAN);
        assert_relative_eq!(config.effective_link_spacing(), MIN_LINK_SPACING);
        assert!(config.validate().is_err());

        let config = GrappleConfig::default().with_link_spacing(f64::INFINITY);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_range_capacity() {
        let config = GrappleConfig::default().with_max_extension(0.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.link_capacity(), 2);
    }

    #[test]
    fn test_config_validation() {
        let mut config = GrappleConfig::default();
        assert!(config.validate().is_ok());

        config.extension_speed = 0.0;
        assert!(config.validate().is_err());

        config.extension_speed = 5.0;
        config.capacity_margin = 0.5;
        assert!(config.validate().is_err());

        config.capacity_margin = 1.1;
        config.max_extension = -1.0;
        assert!(config.validate().is_err());

        config.max_extension = f64::INFINITY;
        assert!(config.validate().is_err());
    }
}
