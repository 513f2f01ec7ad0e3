use crate::body::Body;
use crate::error::{Result, SimError};
use log::warn;
use ultraviolet::DVec2;

/// Represents a square region in the quadtree, anchored at its lower-left corner.
/// Used to define the bounds of nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub anchor: DVec2,
    pub width: f64,
}

impl Quad {
    pub const UPPER_RIGHT: usize = 0;
    pub const UPPER_LEFT: usize = 1;
    pub const LOWER_RIGHT: usize = 2;
    pub const LOWER_LEFT: usize = 3;

    pub fn new(x: f64, y: f64, width: f64) -> Self {
        Self {
            anchor: DVec2::new(x, y),
            width,
        }
    }

    /// Creates the smallest square that keeps `base`'s anchor side and covers
    /// both `base` and every body position.
    pub fn new_containing(bodies: &[Body], base: Quad) -> Self {
        Self::covering(base, bodies.iter().map(|b| b.pos))
    }

    fn covering(base: Quad, positions: impl Iterator<Item = DVec2>) -> Self {
        let mut min_x = base.anchor.x;
        let mut min_y = base.anchor.y;
        let mut max_x = base.anchor.x + base.width;
        let mut max_y = base.anchor.y + base.width;

        for pos in positions {
            min_x = min_x.min(pos.x);
            min_y = min_y.min(pos.y);
            max_x = max_x.max(pos.x);
            max_y = max_y.max(pos.y);
        }

        let width = (max_x - min_x).max(max_y - min_y);
        Self::new(min_x, min_y, width)
    }

    pub fn midpoint(&self) -> DVec2 {
        self.anchor + DVec2::broadcast(self.width * 0.5)
    }

    /// Closed containment test, edges included.
    pub fn contains(&self, pos: DVec2) -> bool {
        pos.x >= self.anchor.x
            && pos.y >= self.anchor.y
            && pos.x <= self.anchor.x + self.width
            && pos.y <= self.anchor.y + self.width
    }

    /// Determines which quadrant a position falls into relative to the quad's midpoint.
    /// Returns an index from 0 to 3:
    /// 0: Upper-Right, 1: Upper-Left, 2: Lower-Right, 3: Lower-Left
    ///
    /// A coordinate equal to the midpoint goes to the lower/left side. Positions
    /// outside the quad are classified by the same comparisons.
    pub fn find_quadrant(&self, pos: DVec2) -> usize {
        let mid = self.midpoint();
        ((pos.y <= mid.y) as usize) << 1 | (pos.x <= mid.x) as usize
    }

    /// Transforms the current Quad into one of its sub-quadrants.
    pub fn into_quadrant(mut self, quadrant: usize) -> Self {
        self.width *= 0.5;
        if quadrant & 1 == 0 {
            self.anchor.x += self.width;
        }
        if quadrant >> 1 == 0 {
            self.anchor.y += self.width;
        }
        self
    }

    /// Divides the quad into 4 equal sub-quadrants, ordered
    /// upper-right, upper-left, lower-right, lower-left.
    pub fn subdivide(&self) -> [Quad; 4] {
        [0, 1, 2, 3].map(|i| self.into_quadrant(i))
    }
}

/// Source data copied out of a real body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointMass {
    /// Index of the body in the snapshot the tree was built from.
    pub index: u32,
    pub pos: DVec2,
    pub mass: f64,
}

impl PointMass {
    fn of(index: u32, body: &Body) -> Self {
        Self {
            index,
            pos: body.pos,
            mass: body.mass,
        }
    }
}

/// What a node holds.
#[derive(Clone, Debug, PartialEq)]
pub enum Occupant {
    Empty,
    /// A leaf with exactly one real body.
    Body(PointMass),
    /// A leaf with several real bodies that could not be separated, either
    /// because they share a position or because the depth limit was hit.
    Cluster {
        members: Vec<PointMass>,
        mass: f64,
        com: DVec2,
    },
    /// Synthetic total mass and center of mass of a branch.
    Aggregate { mass: f64, com: DVec2 },
}

impl Occupant {
    pub fn mass(&self) -> f64 {
        match self {
            Occupant::Empty => 0.0,
            Occupant::Body(p) => p.mass,
            Occupant::Cluster { mass, .. } | Occupant::Aggregate { mass, .. } => *mass,
        }
    }

    /// Center of mass, or `None` for an empty occupant.
    pub fn com(&self) -> Option<DVec2> {
        match self {
            Occupant::Empty => None,
            Occupant::Body(p) => Some(p.pos),
            Occupant::Cluster { com, .. } | Occupant::Aggregate { com, .. } => Some(*com),
        }
    }

    /// Total mass and mass-weighted position of `sources`, `None` if the mass is zero.
    fn weigh(sources: impl Iterator<Item = (DVec2, f64)>) -> Option<(f64, DVec2)> {
        let (mass, moment) = sources.fold((0.0, DVec2::zero()), |(m, s), (pos, mass)| {
            (m + mass, s + pos * mass)
        });
        (mass > 0.0).then(|| (mass, moment / mass))
    }

    fn aggregate<'a>(children: impl Iterator<Item = &'a Occupant>) -> Self {
        let sources = children.filter_map(|c| c.com().map(|com| (com, c.mass())));
        match Self::weigh(sources) {
            Some((mass, com)) => Occupant::Aggregate { mass, com },
            None => Occupant::Empty,
        }
    }

    fn cluster(members: Vec<PointMass>) -> Self {
        match Self::weigh(members.iter().map(|p| (p.pos, p.mass))) {
            Some((mass, com)) => Occupant::Cluster { members, mass, com },
            None => Occupant::Empty,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Index of the first child in the nodes array (0 if leaf).
    pub children: u32,
    /// Index of the node visited after this subtree (0 if none).
    pub next: u32,
    /// Index of the parent node (0 for the root and its children).
    pub parent: u32,
    /// Distance from the root.
    pub depth: u32,
    /// Spatial bounds of the node.
    pub quad: Quad,
    /// Side of the smallest square covering `quad` and every body below the
    /// node. Larger than `quad.width` only when a body outside the root
    /// region was classified into this node.
    pub extent: f64,
    pub occupant: Occupant,
}

impl Node {
    pub fn new(next: u32, parent: u32, depth: u32, quad: Quad) -> Self {
        Self {
            children: 0,
            next,
            parent,
            depth,
            quad,
            extent: quad.width,
            occupant: Occupant::Empty,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children == 0
    }

    pub fn is_branch(&self) -> bool {
        self.children != 0
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.mass() == 0.0
    }

    /// Indices of the four children, in quadrant order.
    pub fn child_indices(&self) -> Option<[usize; 4]> {
        let first = self.children as usize;
        self.is_branch()
            .then(|| [first, first + 1, first + 2, first + 3])
    }
}

/// The Quadtree data structure for the Barnes-Hut simulation.
/// Uses a flat vector `nodes` for better cache locality. Built once per
/// generation and never modified afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Quadtree {
    /// Linearized tree nodes; children of a branch are stored contiguously.
    pub nodes: Vec<Node>,
    /// Leaf node index holding each body.
    pub leaf_of: Vec<u32>,
    /// Depth at which remaining bodies are merged into a cluster leaf.
    pub max_depth: usize,
}

impl Quadtree {
    pub const ROOT: usize = 0;
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    /// Upper bound for `max_depth`; an f64 width underflows after about 1100 halvings.
    pub const MAX_DEPTH_LIMIT: usize = 1024;

    /// Partitions `bodies` over `quad`.
    ///
    /// Every body is validated first, so a tree never carries a non-positive
    /// mass. Subsets that cannot be separated become [`Occupant::Cluster`] leaves.
    pub fn build(bodies: &[Body], quad: Quad, max_depth: usize) -> Result<Self> {
        if !(1..=Self::MAX_DEPTH_LIMIT).contains(&max_depth) {
            return Err(SimError::InvalidMaxDepth(max_depth));
        }
        for (index, body) in bodies.iter().enumerate() {
            body.validate(index)?;
        }

        let mut tree = Self {
            nodes: Vec::with_capacity(bodies.len() * 2 + 1),
            leaf_of: vec![Self::ROOT as u32; bodies.len()],
            max_depth,
        };
        tree.nodes.push(Node::new(0, 0, 0, quad));

        let indices = (0..bodies.len() as u32).collect();
        tree.fill(bodies, indices);
        tree.propagate();

        Ok(tree)
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root().is_empty()
    }

    /// Deepest node depth.
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth as usize).max().unwrap_or(0)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Whether the subtree rooted at `node` holds body `index`.
    pub fn contains_body(&self, node: usize, index: usize) -> bool {
        let Some(&leaf) = self.leaf_of.get(index) else {
            return false;
        };
        let mut current = leaf as usize;
        loop {
            if current == node {
                return true;
            }
            if current == Self::ROOT {
                return false;
            }
            current = self.nodes[current].parent as usize;
        }
    }

    /// Real bodies stored in the leaves under `node`.
    pub fn members(&self, node: usize) -> Vec<PointMass> {
        let mut members = Vec::new();
        let stop = self.nodes[node].next as usize;
        let mut node_idx = node;

        loop {
            let n = &self.nodes[node_idx];
            match &n.occupant {
                Occupant::Body(p) => members.push(*p),
                Occupant::Cluster { members: m, .. } => members.extend_from_slice(m),
                Occupant::Empty | Occupant::Aggregate { .. } => {}
            }

            node_idx = if n.is_branch() {
                n.children as usize
            } else {
                n.next as usize
            };
            if node_idx == stop {
                break;
            }
        }

        members
    }

    /// Subdivides a leaf node into 4 children.
    /// Returns the index of the first child.
    fn subdivide(&mut self, node: usize) -> usize {
        let children = self.nodes.len() as u32;
        self.nodes[node].children = children;

        // The last child links back to the parent's `next` so the whole tree
        // can be walked without a stack.
        let nexts = [
            children + 1,
            children + 2,
            children + 3,
            self.nodes[node].next,
        ];
        let quads = self.nodes[node].quad.subdivide();
        let depth = self.nodes[node].depth + 1;
        for i in 0..4 {
            self.nodes
                .push(Node::new(nexts[i], node as u32, depth, quads[i]));
        }

        children as usize
    }

    /// Distributes body indices top-down. Pending subsets live on an explicit
    /// stack, so tree depth never reaches the call stack.
    fn fill(&mut self, bodies: &[Body], indices: Vec<u32>) {
        let mut pending = vec![(Self::ROOT, indices)];

        while let Some((node, indices)) = pending.pop() {
            let quad = self.nodes[node].quad;
            let positions = indices.iter().map(|&i| bodies[i as usize].pos);
            if positions.clone().any(|pos| !quad.contains(pos)) {
                self.nodes[node].extent = Quad::covering(quad, positions).width;
            }

            match indices.len() {
                0 => {}
                1 => {
                    let index = indices[0];
                    self.leaf_of[index as usize] = node as u32;
                    self.nodes[node].occupant =
                        Occupant::Body(PointMass::of(index, &bodies[index as usize]));
                }
                _ => {
                    let first = bodies[indices[0] as usize].pos;
                    let coincident = indices
                        .iter()
                        .all(|&i| bodies[i as usize].pos == first);
                    let depth = self.nodes[node].depth as usize;

                    if coincident || depth >= self.max_depth {
                        warn!(
                            "merging {} bodies into one leaf at depth {} (coincident: {})",
                            indices.len(),
                            depth,
                            coincident
                        );
                        let members = indices
                            .iter()
                            .map(|&i| {
                                self.leaf_of[i as usize] = node as u32;
                                PointMass::of(i, &bodies[i as usize])
                            })
                            .collect();
                        self.nodes[node].occupant = Occupant::cluster(members);
                    } else {
                        let children = self.subdivide(node);

                        let mut buckets: [Vec<u32>; 4] = Default::default();
                        for i in indices {
                            buckets[quad.find_quadrant(bodies[i as usize].pos)].push(i);
                        }
                        for (quadrant, bucket) in buckets.into_iter().enumerate() {
                            pending.push((children + quadrant, bucket));
                        }
                    }
                }
            }
        }
    }

    /// Sums branch occupants bottom-up. Children are always stored after
    /// their parent, so a reverse sweep visits them first.
    fn propagate(&mut self) {
        for node in (0..self.nodes.len()).rev() {
            let Some([first, ..]) = self.nodes[node].child_indices() else {
                continue;
            };
            self.nodes[node].occupant =
                Occupant::aggregate(self.nodes[first..first + 4].iter().map(|c| &c.occupant));
        }
    }
}
