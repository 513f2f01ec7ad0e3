use crate::body::Body;
use crate::quadtree::{Occupant, Quadtree};
use log::trace;
use ultraviolet::DVec2;

/// Gravitational constant in SI units.
pub const G: f64 = 6.67408e-11;

/// Newtonian gravity, evaluated through a [`Quadtree`] with the Barnes-Hut
/// opening-angle criterion or by direct summation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gravity {
    /// Gravitational constant.
    pub g: f64,
    /// Opening angle: a branch of extent `s` at distance `d` is treated as a
    /// single point mass when `s / d < theta`. Zero gives exact summation.
    pub theta: f64,
}

impl Default for Gravity {
    fn default() -> Self {
        Self::new(G, 0.5)
    }
}

impl Gravity {
    pub fn new(g: f64, theta: f64) -> Self {
        Self { g, theta }
    }

    /// Force exerted on a mass `m1` at `p1` by a mass `m2` at `p2`.
    ///
    /// Coincident positions contribute no force.
    #[inline(always)]
    pub fn pairwise(&self, p1: DVec2, m1: f64, p2: DVec2, m2: f64) -> DVec2 {
        let d = p2 - p1;
        let d_sq = d.mag_sq();
        if d_sq == 0.0 {
            trace!("skipping zero-distance interaction at ({}, {})", p1.x, p1.y);
            return DVec2::zero();
        }

        let f = self.g * m1 * m2 / d_sq;
        d * (f / d_sq.sqrt())
    }

    /// Force on body `target` from every body under `node`, excluding itself.
    ///
    /// Walks the subtree through the `next` links. Every child of an opened
    /// branch is visited, and a branch that holds `target` is always opened.
    pub fn force(&self, tree: &Quadtree, node: usize, target: usize, body: &Body) -> DVec2 {
        let mut force = DVec2::zero();
        let t_sq = self.theta * self.theta;

        let stop = tree.nodes[node].next as usize;
        let mut node_idx = node;

        loop {
            let n = &tree.nodes[node_idx];

            let open = match &n.occupant {
                Occupant::Empty => false,
                Occupant::Body(p) => {
                    if p.index as usize != target {
                        force += self.pairwise(body.pos, body.mass, p.pos, p.mass);
                    }
                    false
                }
                Occupant::Cluster { members, .. } => {
                    for p in members.iter().filter(|p| p.index as usize != target) {
                        force += self.pairwise(body.pos, body.mass, p.pos, p.mass);
                    }
                    false
                }
                Occupant::Aggregate { mass, com } => {
                    // s/d < theta, squared to avoid the root.
                    let d_sq = (*com - body.pos).mag_sq();
                    let far = n.extent * n.extent < d_sq * t_sq
                        && !tree.contains_body(node_idx, target);
                    if far {
                        force += self.pairwise(body.pos, body.mass, *com, *mass);
                    }
                    !far
                }
            };

            node_idx = if open {
                n.children as usize
            } else {
                n.next as usize
            };
            if node_idx == stop {
                break;
            }
        }

        force
    }

    /// Net force on body `target` from the whole tree.
    pub fn net_force(&self, tree: &Quadtree, target: usize, body: &Body) -> DVec2 {
        self.force(tree, Quadtree::ROOT, target, body)
    }

    /// Exact O(N²) reference: the force on `bodies[target]` from all the others.
    pub fn direct_force(&self, bodies: &[Body], target: usize) -> DVec2 {
        let b = &bodies[target];
        bodies
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != target)
            .fold(DVec2::zero(), |acc, (_, other)| {
                acc + self.pairwise(b.pos, b.mass, other.pos, other.mass)
            })
    }
}
