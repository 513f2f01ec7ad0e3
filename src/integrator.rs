use crate::body::Body;
use crate::error::{Result, SimError};
use ultraviolet::DVec2;

/// `a = F / m`.
pub fn new_acceleration(force: DVec2, mass: f64) -> Result<DVec2> {
    if !(mass > 0.0 && mass.is_finite()) {
        return Err(SimError::InvalidMass { index: 0, mass });
    }
    Ok(force / mass)
}

/// `v + a·t`.
pub fn new_velocity(vel: DVec2, acc: DVec2, dt: f64) -> DVec2 {
    vel + acc * dt
}

/// `p + v·t + ½·a·t²`.
pub fn new_position(pos: DVec2, vel: DVec2, acc: DVec2, dt: f64) -> DVec2 {
    pos + vel * dt + acc * (0.5 * dt * dt)
}

/// Returns the body after one step of `dt` under `force`.
///
/// Velocity and position move with the acceleration `body` already carries,
/// derived from the previous generation's force. The new force only sets the
/// acceleration stored for the next step.
pub fn advance(body: &Body, force: DVec2, dt: f64) -> Result<Body> {
    Ok(Body {
        acc: new_acceleration(force, body.mass)?,
        vel: new_velocity(body.vel, body.acc, dt),
        pos: new_position(body.pos, body.vel, body.acc, dt),
        mass: body.mass,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_force_is_inertial() {
        let body = Body::new(DVec2::new(1.0, -2.0), DVec2::new(3.0, 0.5), 4.0);
        for dt in [0.1, 1.0, 250.0] {
            let next = advance(&body, DVec2::zero(), dt).unwrap();
            assert_eq!(next.vel, body.vel);
            assert_eq!(next.pos, body.pos + body.vel * dt);
            assert_eq!(next.acc, DVec2::zero());
        }
    }

    #[test]
    fn uses_previous_acceleration() {
        let body = Body::new(DVec2::zero(), DVec2::new(1.0, 0.0), 2.0)
            .with_acc(DVec2::new(0.0, 2.0));
        let next = advance(&body, DVec2::new(6.0, 0.0), 2.0).unwrap();

        assert_eq!(next.acc, DVec2::new(3.0, 0.0));
        assert_eq!(next.vel, DVec2::new(1.0, 4.0));
        assert_relative_eq!(next.pos.x, 2.0);
        assert_relative_eq!(next.pos.y, 4.0);
        assert_eq!(next.mass, body.mass);
    }

    #[test]
    fn rejects_non_positive_mass() {
        assert!(matches!(
            new_acceleration(DVec2::new(1.0, 0.0), 0.0),
            Err(SimError::InvalidMass { .. })
        ));
        let body = Body::new(DVec2::zero(), DVec2::zero(), -1.0);
        assert!(advance(&body, DVec2::zero(), 1.0).is_err());
    }
}
