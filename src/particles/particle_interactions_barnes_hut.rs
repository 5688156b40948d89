//! Barnes–Hut quadtree over particle (x, y) positions.
//!
//! The tree is rebuilt from scratch every step: particles are inserted one by
//! one, splitting a leaf into four quadrants when a second particle lands in
//! it, and mass / center of mass are aggregated bottom-up once all insertions
//! are done. Partitioning only uses x and y, but centers of mass are carried
//! in 3-D so an aggregated node pulls in the right direction along z as well.
//!
//! Nodes live in a [`bumpalo::Bump`] arena owned by the caller. Resetting the
//! arena between steps reuses the same memory for the next tree.
use bumpalo::Bump;
use log::{log_enabled, trace, Level};

use crate::models::Vector3;
use crate::particles::particle_forces::point_mass_force;
use crate::particles::{ForceEvaluator, Particle};
use crate::utils::MAX_TREE_DEPTH;

/// Axis-aligned square cell of the tree, given by its center and half its width.
///
/// # Examples
///
/// ```
/// use rs_nbody::particles::Quad;
///
/// let quad = Quad { cx: 0.0, cy: 0.0, half_size: 1.0 };
///
/// assert!(quad.contains(0.5, 0.5));
/// assert!(!quad.contains(1.5, 0.5));
/// assert_eq!(quad.size(), 2.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub cx: f64,
    pub cy: f64,
    pub half_size: f64,
}

impl Quad {
    /// Half-open containment test, `[min, max)` on both axes, so that a point
    /// on a shared edge belongs to exactly one of [`Quad::subdivide`]'s cells.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (dx, dy) = (x - self.cx, y - self.cy);
        (-self.half_size..self.half_size).contains(&dx) && (-self.half_size..self.half_size).contains(&dy)
    }

    /// Full side length; the `size` in the opening criterion `size / distance < theta`.
    pub fn size(&self) -> f64 {
        self.half_size * 2.0
    }

    /// Subdivides the quad into four smaller quads, ordered NW, NE, SW, SE.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_nbody::particles::Quad;
    ///
    /// let quad = Quad { cx: 0.0, cy: 0.0, half_size: 1.0 };
    /// let [nw, ne, sw, se] = quad.subdivide();
    ///
    /// assert_eq!((nw.cx, nw.cy, nw.half_size), (-0.5, 0.5, 0.5));
    /// assert_eq!((ne.cx, ne.cy), (0.5, 0.5));
    /// assert!(sw.contains(-0.25, -0.25));
    /// assert!(se.contains(0.25, -0.25));
    /// ```
    pub fn subdivide(&self) -> [Quad; 4] {
        let hs = self.half_size / 2.0;
        [
            Quad { cx: self.cx - hs, cy: self.cy + hs, half_size: hs }, // NW
            Quad { cx: self.cx + hs, cy: self.cy + hs, half_size: hs }, // NE
            Quad { cx: self.cx - hs, cy: self.cy - hs, half_size: hs }, // SW
            Quad { cx: self.cx + hs, cy: self.cy - hs, half_size: hs }, // SE
        ]
    }

    /// Index into [`Quad::subdivide`] of the quadrant holding (x, y).
    #[inline]
    pub fn quadrant_of(&self, x: f64, y: f64) -> usize {
        let is_east = x >= self.cx;
        let is_north = y >= self.cy;

        match (is_north, is_east) {
            (true, false) => 0,  // NW
            (true, true) => 1,   // NE
            (false, false) => 2, // SW
            (false, true) => 3,  // SE
        }
    }

    /// Smallest square (slightly padded) enclosing the (x, y) of every particle.
    ///
    /// An empty slice or a single point yields a unit square around it.
    pub fn bounding(particles: &[Particle]) -> Quad {
        let Some(first) = particles.first() else {
            return Quad { cx: 0.0, cy: 0.0, half_size: 1.0 };
        };
        let (mut min_x, mut max_x) = (first.position.x, first.position.x);
        let (mut min_y, mut max_y) = (first.position.y, first.position.y);
        for p in &particles[1..] {
            min_x = min_x.min(p.position.x);
            max_x = max_x.max(p.position.x);
            min_y = min_y.min(p.position.y);
            max_y = max_y.max(p.position.y);
        }
        let half = 0.5 * (max_x - min_x).max(max_y - min_y);
        Quad {
            cx: 0.5 * (min_x + max_x),
            cy: 0.5 * (min_y + max_y),
            half_size: if half > 0.0 { half * (1.0 + 1e-6) } else { 1.0 },
        }
    }
}

/// A particle as stored in the tree: its buffer index, position and mass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub index: usize,
    pub position: Vector3,
    pub mass: f64,
}

impl Body {
    pub fn from_particle(index: usize, p: &Particle) -> Self {
        Body { index, position: p.position, mass: p.mass }
    }
}

/// Barnes–Hut tree node, allocated in the arena that `'a` borrows.
///
/// A node is either a leaf (no children, at most one particle) or internal
/// (no particle of its own, aggregated data and four quadrant children).
/// `Cluster` is the leaf used once [`MAX_TREE_DEPTH`] is reached, for
/// particles whose (x, y) cannot be separated by further quartering.
#[derive(Debug)]
pub enum QuadNode<'a> {
    /// The node is empty; it stores the quad representing its region.
    Empty(Quad),
    /// The node is a leaf and contains one particle.
    Leaf(Quad, Body),
    /// Depth-limited leaf holding every particle that reached it.
    Cluster(Quad, &'a [Body]),
    /// The node is internal and contains aggregated data along with four children.
    Internal {
        quad: Quad,
        mass: f64,
        com: Vector3,
        /// Spread of the subtree along z, which the quad itself says nothing about.
        depth_span: f64,
        count: usize,
        children: &'a mut [QuadNode<'a>; 4], // NW, NE, SW, SE
    },
}

/// Mass, centroid and z range of a subtree.
#[derive(Clone, Copy, Debug)]
struct Summary {
    mass: f64,
    com: Vector3,
    z_min: f64,
    z_max: f64,
}

impl Summary {
    const EMPTY: Summary = Summary {
        mass: 0.0,
        com: Vector3::zero(),
        z_min: f64::INFINITY,
        z_max: f64::NEG_INFINITY,
    };

    fn of_body(body: &Body) -> Self {
        Summary {
            mass: body.mass,
            com: body.position,
            z_min: body.position.z,
            z_max: body.position.z,
        }
    }

    fn merge(self, other: Summary) -> Summary {
        if other.mass == 0.0 {
            return self;
        }
        if self.mass == 0.0 {
            return other;
        }
        let mass = self.mass + other.mass;
        Summary {
            mass,
            com: (self.com * self.mass + other.com * other.mass) / mass,
            z_min: self.z_min.min(other.z_min),
            z_max: self.z_max.max(other.z_max),
        }
    }
}

impl<'a> QuadNode<'a> {
    pub fn new(quad: Quad) -> Self {
        QuadNode::Empty(quad)
    }

    pub fn quad(&self) -> Quad {
        match self {
            QuadNode::Empty(q) => *q,
            QuadNode::Leaf(q, _) => *q,
            QuadNode::Cluster(q, _) => *q,
            QuadNode::Internal { quad, .. } => *quad,
        }
    }

    /// Inserts a body. Aggregates of internal nodes stay stale until the tree is aggregated.
    fn insert(&mut self, arena: &'a Bump, body: Body, depth: usize) {
        match self {
            QuadNode::Empty(quad) => {
                *self = QuadNode::Leaf(*quad, body);
            }
            QuadNode::Leaf(quad, existing) => {
                let quad = *quad;
                let existing = *existing;
                if depth >= MAX_TREE_DEPTH {
                    *self = QuadNode::Cluster(quad, arena.alloc_slice_copy(&[existing, body]));
                    return;
                }
                let [nw, ne, sw, se] = quad.subdivide();
                let mut internal = QuadNode::Internal {
                    quad,
                    mass: 0.0,
                    com: Vector3::zero(),
                    depth_span: 0.0,
                    count: 0,
                    children: arena.alloc([
                        QuadNode::Empty(nw),
                        QuadNode::Empty(ne),
                        QuadNode::Empty(sw),
                        QuadNode::Empty(se),
                    ]),
                };
                internal.insert(arena, existing, depth);
                internal.insert(arena, body, depth);
                *self = internal;
            }
            QuadNode::Cluster(_, bodies) => {
                // Clusters are rare and small; the old slice stays in the arena until reset.
                let old: &'a [Body] = *bodies;
                let grown: &'a [Body] = arena.alloc_slice_fill_with(old.len() + 1, |i| old.get(i).copied().unwrap_or(body));
                *bodies = grown;
            }
            QuadNode::Internal { quad, count, children, .. } => {
                *count += 1;
                let child = quad.quadrant_of(body.position.x, body.position.y);
                children[child].insert(arena, body, depth + 1);
            }
        }
    }

    /// Recomputes the aggregates of every internal node, bottom-up.
    fn aggregate(&mut self) -> Summary {
        match self {
            QuadNode::Empty(_) => Summary::EMPTY,
            QuadNode::Leaf(_, body) => Summary::of_body(body),
            QuadNode::Cluster(_, bodies) => summarize(bodies),
            QuadNode::Internal { mass, com, depth_span, children, .. } => {
                let summary = children
                    .iter_mut()
                    .fold(Summary::EMPTY, |acc, child| acc.merge(child.aggregate()));
                *mass = summary.mass;
                *com = summary.com;
                *depth_span = summary.z_max - summary.z_min;
                summary
            }
        }
    }

    /// Total mass below this node.
    pub fn total_mass(&self) -> f64 {
        match self {
            QuadNode::Empty(_) => 0.0,
            QuadNode::Leaf(_, body) => body.mass,
            QuadNode::Cluster(_, bodies) => bodies.iter().map(|b| b.mass).sum(),
            QuadNode::Internal { mass, .. } => *mass,
        }
    }

    /// Mass-weighted centroid below this node, `None` for an empty node.
    pub fn center_of_mass(&self) -> Option<Vector3> {
        match self {
            QuadNode::Empty(_) => None,
            QuadNode::Leaf(_, body) => Some(body.position),
            QuadNode::Cluster(_, bodies) => Some(summarize(bodies).com),
            QuadNode::Internal { com, .. } => Some(*com),
        }
    }

    pub fn particle_count(&self) -> usize {
        match self {
            QuadNode::Empty(_) => 0,
            QuadNode::Leaf(_, _) => 1,
            QuadNode::Cluster(_, bodies) => bodies.len(),
            QuadNode::Internal { count, .. } => *count,
        }
    }

    pub fn children(&self) -> Option<&[QuadNode<'a>; 4]> {
        match self {
            QuadNode::Internal { children, .. } => Some(&**children),
            _ => None,
        }
    }

    /// Number of levels below and including this node.
    pub fn depth(&self) -> usize {
        match self {
            QuadNode::Internal { children, .. } => {
                1 + children.iter().map(QuadNode::depth).max().unwrap_or(0)
            }
            _ => 1,
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            QuadNode::Internal { children, .. } => {
                1 + children.iter().map(QuadNode::node_count).sum::<usize>()
            }
            _ => 1,
        }
    }

    /// Adds the force on `target` from everything below this node.
    ///
    /// `on_path` marks nodes the target itself was inserted through; those are
    /// never collapsed into a point mass so a particle cannot attract itself.
    fn accumulate_force(&self, target: &Body, theta: f64, on_path: bool, total: &mut Vector3) {
        match self {
            QuadNode::Empty(_) => {}
            QuadNode::Leaf(_, body) => {
                if body.index != target.index {
                    *total += point_mass_force(target.position, target.mass, body.position, body.mass);
                }
            }
            QuadNode::Cluster(_, bodies) => {
                for body in bodies.iter().filter(|b| b.index != target.index) {
                    *total += point_mass_force(target.position, target.mass, body.position, body.mass);
                }
            }
            QuadNode::Internal { quad, mass, com, depth_span, children, .. } => {
                let dist = (*com - target.position).norm();
                let extent = quad.size().max(*depth_span);
                // extent / dist < theta, without dividing by a possibly zero distance
                if !on_path && extent < theta * dist {
                    *total += point_mass_force(target.position, target.mass, *com, *mass);
                } else {
                    let target_child = quad.quadrant_of(target.position.x, target.position.y);
                    for (i, child) in children.iter().enumerate() {
                        child.accumulate_force(target, theta, on_path && i == target_child, total);
                    }
                }
            }
        }
    }
}

fn summarize(bodies: &[Body]) -> Summary {
    bodies
        .iter()
        .fold(Summary::EMPTY, |acc, body| acc.merge(Summary::of_body(body)))
}


/// Arena sized for a tree over `particle_count` particles.
///
/// The estimate covers roughly one internal node per particle, which uniform
/// distributions stay well under. The arena grows past it if it has to.
pub fn tree_arena(particle_count: usize) -> Bump {
    Bump::with_capacity(particle_count.max(1) * std::mem::size_of::<[QuadNode<'static>; 4]>())
}

/// A fully built and aggregated Barnes–Hut tree.
///
/// # Examples
///
/// ```
/// use bumpalo::Bump;
/// use rs_nbody::particles::{Particle, QuadTree};
///
/// let particles = vec![
///     Particle::at_rest(0.0, 0.0, 0.0, 1.0),
///     Particle::at_rest(4.0, 0.0, 0.0, 3.0),
/// ];
/// let arena = Bump::new();
/// let tree = QuadTree::build(&arena, &particles);
///
/// assert_eq!(tree.particle_count(), 2);
/// assert_eq!(tree.total_mass(), 4.0);
/// assert_eq!(tree.center_of_mass().map(|c| c.x), Some(3.0));
/// ```
#[derive(Debug)]
pub struct QuadTree<'a> {
    root: QuadNode<'a>,
}

impl<'a> QuadTree<'a> {
    /// Builds a tree over the bounding square of `particles`.
    pub fn build(arena: &'a Bump, particles: &[Particle]) -> Self {
        Self::build_in(arena, particles, Quad::bounding(particles))
    }

    /// Builds a tree rooted at `quad`.
    ///
    /// Particles outside `quad` still land in the nearest edge quadrant, so
    /// aggregates stay exact but the geometric bounds no longer hold for them.
    pub fn build_in(arena: &'a Bump, particles: &[Particle], quad: Quad) -> Self {
        let mut root = QuadNode::new(quad);
        for (i, p) in particles.iter().enumerate() {
            root.insert(arena, Body::from_particle(i, p), 0);
        }
        root.aggregate();
        let tree = QuadTree { root };
        if log_enabled!(Level::Trace) {
            trace!(
                "built quadtree: {} particles, {} nodes, depth {}, {} arena bytes",
                tree.particle_count(),
                tree.node_count(),
                tree.depth(),
                arena.allocated_bytes()
            );
        }
        tree
    }

    pub fn root(&self) -> &QuadNode<'a> {
        &self.root
    }

    pub fn total_mass(&self) -> f64 {
        self.root.total_mass()
    }

    pub fn center_of_mass(&self) -> Option<Vector3> {
        self.root.center_of_mass()
    }

    pub fn particle_count(&self) -> usize {
        self.root.particle_count()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Approximate force on particle `index` of the buffer this tree was built from.
    ///
    /// A node is collapsed into its center of mass when the larger of its width and
    /// its z span, over the distance, is below `theta`; `theta == 0` never collapses
    /// and reproduces the exact sum.
    pub fn force_on(&self, index: usize, particle: &Particle, theta: f64) -> Vector3 {
        let target = Body::from_particle(index, particle);
        let mut total = Vector3::zero();
        self.root.accumulate_force(&target, theta, true, &mut total);
        total
    }
}

/// [`ForceEvaluator`] backed by a [`QuadTree`] built from one source buffer.
///
/// Only valid for the buffer it was built from; build a new one every step.
#[derive(Debug)]
pub struct BarnesHutEvaluator<'a> {
    tree: QuadTree<'a>,
    theta: f64,
}

impl<'a> BarnesHutEvaluator<'a> {
    pub fn new(arena: &'a Bump, particles: &[Particle], theta: f64) -> Self {
        Self { tree: QuadTree::build(arena, particles), theta }
    }

    pub fn tree(&self) -> &QuadTree<'a> {
        &self.tree
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }
}

impl ForceEvaluator for BarnesHutEvaluator<'_> {
    fn force_on(&self, index: usize, particles: &[Particle]) -> Vector3 {
        self.tree.force_on(index, &particles[index], self.theta)
    }
}
