use thiserror::Error;

/// Conditions under which the engine refuses to advance a system.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("body {index} has invalid mass {mass} (must be positive and finite)")]
    InvalidMass { index: usize, mass: f64 },

    #[error("body {index} has a non-finite position ({x}, {y})")]
    NonFinitePosition { index: usize, x: f64, y: f64 },

    #[error("body {index} at ({x}, {y}) lies outside the region of width {width}")]
    OutOfBounds {
        index: usize,
        x: f64,
        y: f64,
        width: f64,
    },

    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),

    #[error("opening angle must be non-negative and finite, got {0}")]
    InvalidTheta(f64),

    #[error("region width must be positive and finite, got {0}")]
    InvalidWidth(f64),

    #[error("maximum tree depth must be between 1 and 1024, got {0}")]
    InvalidMaxDepth(usize),

    #[error("gravitational constant must be positive and finite, got {0}")]
    InvalidGravity(f64),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    /// Relabels a per-body error with the body's index in its snapshot.
    pub fn at(self, index: usize) -> Self {
        match self {
            SimError::InvalidMass { mass, .. } => SimError::InvalidMass { index, mass },
            SimError::NonFinitePosition { x, y, .. } => SimError::NonFinitePosition { index, x, y },
            other => other,
        }
    }
}
