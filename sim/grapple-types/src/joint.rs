//! Joint handles, limits and character-joint configuration.
//!
//! Rope links are coupled by character joints: a ball-and-socket constraint
//! around a primary (twist) axis with two cone half-angles (swing) and a
//! damping spring that softens the limits.

use nalgebra::Vector3;
use std::f64::consts::{FRAC_PI_2, PI};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for a joint in the physics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointId(pub u64);

impl JointId {
    /// Create a new joint ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for JointId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Joint({})", self.0)
    }
}

/// Angular limits for one joint axis, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointLimits {
    /// Lower bound (minimum angle).
    lower: f64,

    /// Upper bound (maximum angle).
    upper: f64,
}

impl JointLimits {
    /// Create new angular limits.
    ///
    /// Swapped bounds are reordered.
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        let (lower, upper) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };

        Self { lower, upper }
    }

    /// Create symmetric limits around zero.
    #[must_use]
    pub fn symmetric(bound: f64) -> Self {
        Self::new(-bound.abs(), bound.abs())
    }

    /// Create unlimited joint (no limits).
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Create limits from bounds given in degrees.
    #[must_use]
    pub fn from_degrees(lower: f64, upper: f64) -> Self {
        Self::new(lower.to_radians(), upper.to_radians())
    }

    /// Get the lower limit.
    #[must_use]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Get the upper limit.
    #[must_use]
    pub fn upper(&self) -> f64 {
        self.upper
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Spring-damper that softens joint limits.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointSpring {
    /// Spring stiffness (Nm/rad). Zero means the limit itself is hard.
    pub stiffness: f64,
    /// Damping coefficient (Nms/rad).
    pub damping: f64,
}

impl Default for JointSpring {
    fn default() -> Self {
        Self::damper(1.0)
    }
}

impl JointSpring {
    /// Create a spring with given stiffness and damping.
    #[must_use]
    pub fn new(stiffness: f64, damping: f64) -> Self {
        Self {
            stiffness: stiffness.max(0.0),
            damping: damping.max(0.0),
        }
    }

    /// Create a pure damper (no restoring stiffness).
    #[must_use]
    pub fn damper(damping: f64) -> Self {
        Self::new(0.0, damping)
    }
}

/// Full configuration of a character joint.
///
/// `swing1` and `swing2` are cone half-angles around the two axes
/// perpendicular to `axis`; `twist` bounds rotation about `axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CharacterJointConfig {
    /// Primary (twist) axis in the owner's local frame.
    pub axis: Vector3<f64>,
    /// First swing half-angle (radians).
    pub swing1: f64,
    /// Second swing half-angle (radians).
    pub swing2: f64,
    /// Twist limits about `axis`.
    pub twist: JointLimits,
    /// Spring-damper applied to all limits.
    pub spring: JointSpring,
}

impl Default for CharacterJointConfig {
    fn default() -> Self {
        Self::chain_link()
    }
}

impl CharacterJointConfig {
    /// Joint between two consecutive rope links.
    ///
    /// Swing is limited to 90° either way; twist uses the usual
    /// character-joint range of -20°..70°.
    #[must_use]
    pub fn chain_link() -> Self {
        Self {
            axis: Vector3::z(),
            swing1: FRAC_PI_2,
            swing2: FRAC_PI_2,
            twist: JointLimits::from_degrees(-20.0, 70.0),
            spring: JointSpring::damper(1.0),
        }
    }

    /// Joint between the rope tail and the actor hanging from it.
    ///
    /// Wide swing and near-full twist so the actor swings freely.
    #[must_use]
    pub fn player() -> Self {
        Self {
            axis: Vector3::z(),
            swing1: PI,
            swing2: PI,
            twist: JointLimits::symmetric(PI),
            spring: JointSpring::damper(1.0),
        }
    }

    /// Set symmetric swing half-angles.
    #[must_use]
    pub fn with_swing(mut self, half_angle: f64) -> Self {
        self.swing1 = half_angle.abs();
        self.swing2 = half_angle.abs();
        self
    }

    /// Set twist limits.
    #[must_use]
    pub fn with_twist(mut self, twist: JointLimits) -> Self {
        self.twist = twist;
        self
    }

    /// Set the spring-damper.
    #[must_use]
    pub fn with_spring(mut self, spring: JointSpring) -> Self {
        self.spring = spring;
        self
    }

    /// Set the primary axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        self.axis = axis;
        self
    }

    /// Validate the joint configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.axis.norm_squared() < 1e-20 || !self.axis.iter().all(|x| x.is_finite()) {
            return Err(crate::GrappleError::invalid_config(
                "joint axis must be a finite non-zero vector",
            ));
        }

        if !(0.0..=PI).contains(&self.swing1) || !(0.0..=PI).contains(&self.swing2) {
            return Err(crate::GrappleError::invalid_config(
                "swing limits must be within [0, pi]",
            ));
        }

        if self.twist.lower() < -PI || self.twist.upper() > PI {
            return Err(crate::GrappleError::invalid_config(
                "twist limits must be within [-pi, pi]",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_limits_swapped_order() {
        let limits = JointLimits::new(1.0, -1.0);
        assert_relative_eq!(limits.lower(), -1.0, epsilon = 1e-10);
        assert_relative_eq!(limits.upper(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_limits_from_degrees() {
        let limits = JointLimits::from_degrees(-180.0, 180.0);
        assert_relative_eq!(limits.upper(), PI, epsilon = 1e-10);
        assert_relative_eq!(limits.lower(), -PI, epsilon = 1e-10);
    }

    #[test]
    fn test_spring_clamps_negative() {
        let spring = JointSpring::new(-5.0, -1.0);
        assert_relative_eq!(spring.stiffness, 0.0);
        assert_relative_eq!(spring.damping, 0.0);
    }

    #[test]
    fn test_presets_validate() {
        let link = CharacterJointConfig::chain_link();
        assert!(link.validate().is_ok());
        assert_relative_eq!(link.swing1, FRAC_PI_2, epsilon = 1e-10);

        let player = CharacterJointConfig::player();
        assert!(player.validate().is_ok());
        assert!(player.swing1 > link.swing1);
        assert_relative_eq!(player.twist.upper() - player.twist.lower(), 2.0 * PI, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_joint_config() {
        let config = CharacterJointConfig::chain_link().with_axis(Vector3::zeros());
        assert!(config.validate().is_err());

        let config = CharacterJointConfig::chain_link().with_swing(4.0);
        assert!(config.validate().is_err());

        let config = CharacterJointConfig::chain_link().with_twist(JointLimits::symmetric(4.0));
        assert!(config.validate().is_err());
    }
}
