use crate::body::Body;
use ultraviolet::DVec2;

/// Generates `n` bodies of equal mass scattered uniformly over `[0, width]²`.
/// The same seed always gives the same bodies.
pub fn uniform_square(n: usize, width: f64, mass: f64, seed: u64) -> Vec<Body> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..n)
        .map(|_| {
            let pos = DVec2::new(rng.f64() * width, rng.f64() * width);
            Body::new(pos, DVec2::zero(), mass)
        })
        .collect()
}

/// A flat rotating disc of stars around a heavy central body.
#[derive(Clone, Copy, Debug)]
pub struct Disc {
    pub center: DVec2,
    pub radius: f64,
    pub central_mass: f64,
    pub star_mass: f64,
}

impl Disc {
    /// Generates the central body followed by `n - 1` stars.
    /// - Stars are spread with uniform area density between 5% and 100% of the radius.
    /// - Each star gets the circular-orbit speed for the mass enclosed by its orbit.
    pub fn generate(&self, n: usize, g: f64, seed: u64) -> Vec<Body> {
        let mut rng = fastrand::Rng::with_seed(seed);
        let inner_radius = self.radius * 0.05;

        let mut bodies: Vec<Body> = Vec::with_capacity(n);
        if n == 0 {
            return bodies;
        }
        bodies.push(Body::new(self.center, DVec2::zero(), self.central_mass));

        while bodies.len() < n {
            let a = rng.f64() * std::f64::consts::TAU;
            let (sin, cos) = a.sin_cos();

            let t = inner_radius / self.radius;
            let r = rng.f64() * (1.0 - t * t) + t * t;
            let offset = DVec2::new(cos, sin) * self.radius * r.sqrt();

            // Unit tangent; scaled to orbital speed below.
            let vel = DVec2::new(sin, -cos);
            bodies.push(Body::new(self.center + offset, vel, self.star_mass));
        }

        // Sort by distance from the center so the enclosed mass accumulates outwards.
        let center = self.center;
        bodies.sort_by(|a, b| (a.pos - center).mag_sq().total_cmp(&(b.pos - center).mag_sq()));

        let mut enclosed = 0.0;
        for body in bodies.iter_mut() {
            enclosed += body.mass;
            let r = (body.pos - center).mag();
            if r == 0.0 {
                continue;
            }
            // v = sqrt(GM / r)
            body.vel *= (g * enclosed / r).sqrt();
        }

        bodies
    }
}

/// Adds a bulk velocity to every body of a group, on both axes.
pub fn push(bodies: &mut [Body], vel: DVec2) {
    for body in bodies {
        body.vel += vel;
    }
}
