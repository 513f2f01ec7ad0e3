use crate::error::{Result, SimError};
use ultraviolet::DVec2;

/// A point mass ("star") in the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Position vector.
    pub pos: DVec2,
    /// Velocity vector.
    pub vel: DVec2,
    /// Acceleration from the previous generation's net force.
    pub acc: DVec2,
    /// Mass of the body.
    pub mass: f64,
}

impl Default for Body {
    fn default() -> Self {
        Self::new(DVec2::zero(), DVec2::zero(), 1.0)
    }
}

impl Body {
    /// Creates a new Body with the given properties.
    /// Initial acceleration is zero.
    pub fn new(pos: DVec2, vel: DVec2, mass: f64) -> Self {
        Self {
            pos,
            vel,
            acc: DVec2::zero(),
            mass,
        }
    }

    /// Returns the body with a pre-existing acceleration.
    pub fn with_acc(mut self, acc: DVec2) -> Self {
        self.acc = acc;
        self
    }

    /// Checks that the body can act as a force source and be integrated.
    /// `index` is only used to label the error.
    pub fn validate(&self, index: usize) -> Result<()> {
        if !(self.mass > 0.0 && self.mass.is_finite()) {
            return Err(SimError::InvalidMass {
                index,
                mass: self.mass,
            });
        }
        if !(self.pos.x.is_finite() && self.pos.y.is_finite()) {
            return Err(SimError::NonFinitePosition {
                index,
                x: self.pos.x,
                y: self.pos.y,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_body_starts_without_acceleration() {
        let body = Body::new(DVec2::new(1.0, 2.0), DVec2::new(3.0, 4.0), 5.0);
        assert_eq!(body.acc, DVec2::zero());
        assert_eq!(body.with_acc(DVec2::new(0.5, 0.0)).acc.x, 0.5);
    }

    #[test]
    fn validate_rejects_bad_mass() {
        for mass in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let body = Body::new(DVec2::zero(), DVec2::zero(), mass);
            assert!(matches!(
                body.validate(7),
                Err(SimError::InvalidMass { index: 7, .. })
            ));
        }
    }

    #[test]
    fn validate_rejects_non_finite_position() {
        let body = Body::new(DVec2::new(f64::NAN, 0.0), DVec2::zero(), 1.0);
        assert!(matches!(
            body.validate(0),
            Err(SimError::NonFinitePosition { .. })
        ));
        assert!(Body::default().validate(0).is_ok());
    }
}
