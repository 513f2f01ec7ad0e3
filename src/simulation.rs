use crate::{
    body::Body,
    config::{BoundsPolicy, SimulationConfig},
    error::{Result, SimError},
    integrator,
    quadtree::{Quad, Quadtree},
};

use log::{debug, info, warn};
use ultraviolet::DVec2;

/// The complete simulated state at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct Universe {
    pub bodies: Vec<Body>,
    /// Side of the square region `[0, width]²` the bodies are expected to stay in.
    pub width: f64,
}

impl Universe {
    pub fn new(bodies: Vec<Body>, width: f64) -> Self {
        Self { bodies, width }
    }

    /// Concatenates independently generated groups (galaxies, systems) into one universe.
    pub fn from_groups(groups: impl IntoIterator<Item = Vec<Body>>, width: f64) -> Self {
        Self::new(groups.into_iter().flatten().collect(), width)
    }

    /// The configured region, anchored at the origin.
    pub fn region(&self) -> Quad {
        Quad::new(0.0, 0.0, self.width)
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.mass).sum()
    }

    /// `None` for an empty universe.
    pub fn center_of_mass(&self) -> Option<DVec2> {
        let mass = self.total_mass();
        (mass > 0.0).then(|| {
            self.bodies
                .iter()
                .fold(DVec2::zero(), |acc, b| acc + b.pos * b.mass)
                / mass
        })
    }

    pub fn momentum(&self) -> DVec2 {
        self.bodies
            .iter()
            .fold(DVec2::zero(), |acc, b| acc + b.vel * b.mass)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.width.is_finite()) {
            return Err(SimError::InvalidWidth(self.width));
        }
        for (index, body) in self.bodies.iter().enumerate() {
            body.validate(index)?;
        }
        Ok(())
    }
}

/// Region the generation's tree is built over, after applying the bounds policy.
fn root_region(universe: &Universe, policy: BoundsPolicy) -> Result<Quad> {
    let region = universe.region();
    let mut outside = universe
        .bodies
        .iter()
        .enumerate()
        .filter(|(_, b)| !region.contains(b.pos));

    match policy {
        BoundsPolicy::Clamp => {
            let count = outside.count();
            if count > 0 {
                warn!("{count} bodies outside region of width {}, clamping", universe.width);
            }
            Ok(region)
        }
        BoundsPolicy::Reject => match outside.next() {
            Some((index, b)) => Err(SimError::OutOfBounds {
                index,
                x: b.pos.x,
                y: b.pos.y,
                width: universe.width,
            }),
            None => Ok(region),
        },
        BoundsPolicy::Expand => {
            let quad = Quad::new_containing(&universe.bodies, region);
            if quad != region {
                debug!("expanded root region to width {}", quad.width);
            }
            Ok(quad)
        }
    }
}

/// Builds the tree for one generation of `universe`.
pub fn build_tree(universe: &Universe, config: &SimulationConfig) -> Result<Quadtree> {
    let quad = root_region(universe, config.bounds)?;
    Quadtree::build(&universe.bodies, quad, config.max_depth)
}

/// Produces the snapshot one time step after `current`.
///
/// All forces are evaluated against `current` and its tree, and results are
/// written into a copy, so the iteration order does not matter.
pub fn advance(current: &Universe, config: &SimulationConfig) -> Result<Universe> {
    let tree = build_tree(current, config)?;
    let gravity = config.gravity();

    let mut next = current.clone();
    for (index, (slot, body)) in next.bodies.iter_mut().zip(&current.bodies).enumerate() {
        let force = gravity.net_force(&tree, index, body);
        *slot = integrator::advance(body, force, config.time_step).map_err(|e| e.at(index))?;
    }

    debug!(
        "advanced {} bodies, tree nodes: {}, depth: {}",
        current.bodies.len(),
        tree.len(),
        tree.depth()
    );
    Ok(next)
}

/// Runs `config.generations` steps from `initial`.
/// Returns every snapshot, starting with `initial`.
pub fn run(initial: Universe, config: &SimulationConfig) -> Result<Vec<Universe>> {
    config.validate()?;
    initial.validate()?;

    info!(
        "running {} generations of {} bodies (dt = {}, theta = {})",
        config.generations,
        initial.bodies.len(),
        config.time_step,
        config.theta
    );

    let mut time_points = Vec::with_capacity(config.generations + 1);
    time_points.push(initial);

    for generation in 0..config.generations {
        let next = advance(&time_points[generation], config)?;
        time_points.push(next);
    }

    info!("simulation finished after {} generations", config.generations);
    Ok(time_points)
}

/// Manages the Barnes-Hut simulation state one step at a time.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub config: SimulationConfig,
    /// Current frame count.
    pub frame: usize,
    /// The current snapshot.
    pub universe: Universe,
}

impl Simulation {
    pub fn new(universe: Universe, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        universe.validate()?;
        Ok(Self {
            config,
            frame: 0,
            universe,
        })
    }

    /// Advances the simulation by one generation.
    pub fn step(&mut self) -> Result<()> {
        self.universe = advance(&self.universe, &self.config)?;
        self.frame += 1;
        Ok(())
    }

    /// The tree the next step would use.
    pub fn build_tree(&self) -> Result<Quadtree> {
        build_tree(&self.universe, &self.config)
    }

    /// Steps `config.generations` times, collecting every snapshot including the current one.
    pub fn run(&mut self) -> Result<Vec<Universe>> {
        let mut time_points = Vec::with_capacity(self.config.generations + 1);
        time_points.push(self.universe.clone());
        for _ in 0..self.config.generations {
            self.step()?;
            time_points.push(self.universe.clone());
        }
        Ok(time_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(x: f64, y: f64) -> Body {
        Body::new(DVec2::new(x, y), DVec2::zero(), 1.0)
    }

    #[test]
    fn root_region_policies() {
        let universe = Universe::new(vec![body(1.0, 1.0), body(12.0, 3.0)], 10.0);

        assert_eq!(root_region(&universe, BoundsPolicy::Clamp).unwrap(), universe.region());
        assert!(matches!(
            root_region(&universe, BoundsPolicy::Reject),
            Err(SimError::OutOfBounds { index: 1, .. })
        ));
        let expanded = root_region(&universe, BoundsPolicy::Expand).unwrap();
        assert_eq!(expanded, Quad::new(0.0, 0.0, 12.0));
    }

    #[test]
    fn universe_summaries() {
        let mut universe = Universe::from_groups(
            [vec![body(0.0, 0.0)], vec![body(4.0, 0.0), body(4.0, 6.0)]],
            10.0,
        );
        universe.bodies[0].vel = DVec2::new(1.0, -1.0);

        assert_eq!(universe.bodies.len(), 3);
        assert_eq!(universe.total_mass(), 3.0);
        assert_eq!(universe.center_of_mass(), Some(DVec2::new(8.0 / 3.0, 2.0)));
        assert_eq!(universe.momentum(), DVec2::new(1.0, -1.0));
        assert_eq!(Universe::new(vec![], 1.0).center_of_mass(), None);
    }

    #[test]
    fn validate_checks_width() {
        assert!(matches!(
            Universe::new(vec![], 0.0).validate(),
            Err(SimError::InvalidWidth(_))
        ));
        assert!(matches!(
            Universe::new(vec![body(f64::INFINITY, 0.0)], 1.0).validate(),
            Err(SimError::NonFinitePosition { index: 0, .. })
        ));
    }

    #[test]
    fn stateful_run_matches_free_run() {
        let universe = Universe::new(vec![body(2.0, 2.0), body(7.0, 3.0), body(4.0, 8.0)], 10.0);
        let config = SimulationConfig {
            generations: 5,
            gravitational_constant: 1.0,
            time_step: 0.01,
            ..Default::default()
        };

        let expected = run(universe.clone(), &config).unwrap();
        let mut sim = Simulation::new(universe, config).unwrap();
        let time_points = sim.run().unwrap();

        assert_eq!(time_points, expected);
        assert_eq!(sim.frame, 5);
        assert_eq!(sim.universe, expected[5]);
    }
}
