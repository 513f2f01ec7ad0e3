use crate::error::{Result, SimError};
use crate::forces::{G, Gravity};
use crate::quadtree::Quadtree;
use serde::Deserialize;

/// What to do with a body outside the region `[0, width]²`.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Classify it by the usual midpoint comparisons, which place it in the
    /// nearest edge quadrant at every level. Nodes holding it widen their
    /// opening extent to cover it.
    #[default]
    Clamp,
    /// Fail the generation.
    Reject,
    /// Grow the root region for that generation until it covers every body.
    Expand,
}

/// Run configuration. Every field has a default, so a YAML file only needs
/// the values it changes:
///
/// ```yaml
/// generations: 5000       # number of steps to produce
/// time_step: 2.0e14       # simulated seconds per generation
/// theta: 0.5              # opening angle, 0 = exact summation
/// gravitational_constant: 6.67408e-11
/// max_depth: 64           # 1..=1024, deeper subsets are merged into one leaf
/// bounds: clamp           # clamp | reject | expand
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub generations: usize,
    pub time_step: f64,
    pub theta: f64,
    pub gravitational_constant: f64,
    pub max_depth: usize,
    pub bounds: BoundsPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            generations: 1000,
            time_step: 1.0,
            theta: 0.5,
            gravitational_constant: G,
            max_depth: Quadtree::DEFAULT_MAX_DEPTH,
            bounds: BoundsPolicy::Clamp,
        }
    }
}

impl SimulationConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(SimError::InvalidTimeStep(self.time_step));
        }
        if !(self.theta >= 0.0 && self.theta.is_finite()) {
            return Err(SimError::InvalidTheta(self.theta));
        }
        let g = self.gravitational_constant;
        if !(g > 0.0 && g.is_finite()) {
            return Err(SimError::InvalidGravity(g));
        }
        if !(1..=Quadtree::MAX_DEPTH_LIMIT).contains(&self.max_depth) {
            return Err(SimError::InvalidMaxDepth(self.max_depth));
        }
        Ok(())
    }

    pub fn gravity(&self) -> Gravity {
        Gravity::new(self.gravitational_constant, self.theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = SimulationConfig::from_yaml_str(
            "generations: 20\ntime_step: 2.0e14\nbounds: expand\n",
        )
        .unwrap();

        assert_eq!(config.generations, 20);
        assert_eq!(config.time_step, 2.0e14);
        assert_eq!(config.bounds, BoundsPolicy::Expand);
        assert_eq!(config.theta, 0.5);
        assert_eq!(config.max_depth, Quadtree::DEFAULT_MAX_DEPTH);
        assert_eq!(config.gravity(), Gravity::new(G, 0.5));
    }

    #[test]
    fn rejects_unknown_fields_and_bad_values() {
        assert!(matches!(
            SimulationConfig::from_yaml_str("thetta: 0.5\n"),
            Err(SimError::Config(_))
        ));
        assert!(matches!(
            SimulationConfig::from_yaml_str("time_step: 0.0\n"),
            Err(SimError::InvalidTimeStep(_))
        ));
        assert!(matches!(
            SimulationConfig::from_yaml_str("theta: -0.1\n"),
            Err(SimError::InvalidTheta(_))
        ));
        assert!(matches!(
            SimulationConfig::from_yaml_str("max_depth: 0\n"),
            Err(SimError::InvalidMaxDepth(0))
        ));
        assert!(matches!(
            SimulationConfig::from_yaml_str("generations: 1\nmax_depth: 200000\n"),
            Err(SimError::InvalidMaxDepth(200000))
        ));
        assert!(matches!(
            SimulationConfig::from_yaml_str("gravitational_constant: -1.0\n"),
            Err(SimError::InvalidGravity(_))
        ));
    }

    #[test]
    fn default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }
}
