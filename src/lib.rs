pub mod body;
pub mod config;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod quadtree;
pub mod simulation;
pub mod utils;

pub use body::Body;
pub use config::{BoundsPolicy, SimulationConfig};
pub use error::{Result, SimError};
pub use forces::{G, Gravity};
pub use quadtree::{Node, Occupant, PointMass, Quad, Quadtree};
pub use simulation::{Simulation, Universe, run};
pub use ultraviolet::DVec2;
