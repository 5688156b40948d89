use approx::{assert_abs_diff_eq, assert_relative_eq};
use bumpalo::Bump;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::Vector3;
use crate::particles::{tree_arena, BarnesHutEvaluator, DirectSum, ForceEvaluator, Particle, Quad, QuadNode, QuadTree};
use crate::utils::MAX_TREE_DEPTH;

fn random_particles(n: usize, seed: u64) -> Vec<Particle> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Particle::at_rest(
                rng.random_range(0.0..1000.0),
                rng.random_range(0.0..1000.0),
                rng.random_range(0.0..1000.0),
                rng.random_range(0.5..2.0),
            )
        })
        .collect()
}

/// Checks the leaf/internal invariants and that aggregates match the subtree.
fn check_node(node: &QuadNode) -> (f64, Vector3, usize) {
    match node {
        QuadNode::Empty(_) => (0.0, Vector3::zero(), 0),
        QuadNode::Leaf(quad, body) => {
            assert!(quad.contains(body.position.x, body.position.y), "leaf body outside its quad");
            (body.mass, body.position * body.mass, 1)
        }
        QuadNode::Cluster(_, bodies) => {
            assert!(bodies.len() >= 2);
            let mass: f64 = bodies.iter().map(|b| b.mass).sum();
            let weighted = bodies.iter().fold(Vector3::zero(), |acc, b| acc + b.position * b.mass);
            (mass, weighted, bodies.len())
        }
        QuadNode::Internal { mass, com, count, children, .. } => {
            let mut total = 0.0;
            let mut weighted = Vector3::zero();
            let mut n = 0;
            for child in children.iter() {
                let (m, w, c) = check_node(child);
                total += m;
                weighted += w;
                n += c;
            }
            assert!(n >= 2, "internal node must hold at least two particles");
            assert_eq!(n, *count);
            assert_relative_eq!(*mass, total, max_relative = 1e-12);
            let expected = weighted / total;
            assert_relative_eq!(com.x, expected.x, max_relative = 1e-9);
            assert_relative_eq!(com.y, expected.y, max_relative = 1e-9);
            assert_relative_eq!(com.z, expected.z, max_relative = 1e-9);
            (total, weighted, n)
        }
    }
}

#[test]
fn test_quad_contains() {
    let quad = Quad { cx: 0.0, cy: 0.0, half_size: 1.0 };
    assert!(quad.contains(0.0, 0.0));
    assert!(quad.contains(-1.0, -1.0));
    assert!(!quad.contains(1.0, 0.0)); // upper bound is half-open
    assert!(!quad.contains(0.0, 1.0));
}

#[test]
fn test_quadrant_of_matches_subdivide() {
    let quad = Quad { cx: 2.0, cy: -3.0, half_size: 4.0 };
    let children = quad.subdivide();
    for (x, y) in [(0.0, -1.0), (5.0, -1.0), (0.0, -6.0), (5.0, -6.0), (2.0, -3.0)] {
        let i = quad.quadrant_of(x, y);
        assert!(children[i].contains(x, y), "({}, {}) not inside quadrant {}", x, y, i);
    }
}

#[test]
fn test_bounding_encloses_all_particles() {
    let particles = random_particles(200, 4);
    let quad = Quad::bounding(&particles);
    assert!(particles.iter().all(|p| quad.contains(p.position.x, p.position.y)));

    let single = Quad::bounding(&[Particle::at_rest(3.0, 4.0, 5.0, 1.0)]);
    assert_eq!(single, Quad { cx: 3.0, cy: 4.0, half_size: 1.0 });
}

#[test]
fn test_single_particle_is_leaf() {
    let particles = vec![Particle::at_rest(0.5, 0.5, 2.0, 3.0)];
    let arena = Bump::new();
    let tree = QuadTree::build(&arena, &particles);
    match tree.root() {
        QuadNode::Leaf(_, body) => {
            assert_eq!(body.index, 0);
            assert_eq!(body.mass, 3.0);
        }
        other => panic!("Expected a leaf, got {:?}", other),
    }
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.force_on(0, &particles[0], 0.5), Vector3::zero());
}

#[test]
fn test_four_quadrants() {
    let particles = [
        Particle::at_rest(-0.5, 0.5, 0.0, 1.0),  // NW
        Particle::at_rest(0.5, 0.5, 0.0, 2.0),   // NE
        Particle::at_rest(-0.5, -0.5, 0.0, 3.0), // SW
        Particle::at_rest(0.5, -0.5, 0.0, 4.0),  // SE
    ];
    let arena = Bump::new();
    let tree = QuadTree::build_in(&arena, &particles, Quad { cx: 0.0, cy: 0.0, half_size: 1.0 });

    assert_eq!(tree.total_mass(), 10.0);
    assert_eq!(tree.particle_count(), 4);
    assert_eq!(tree.node_count(), 5);
    assert_eq!(tree.depth(), 2);

    let children = tree.root().children().expect("root should be internal");
    for (i, child) in children.iter().enumerate() {
        match child {
            QuadNode::Leaf(_, body) => assert_eq!(body.index, i),
            other => panic!("Expected leaf in quadrant {}, got {:?}", i, other),
        }
    }

    // com = (sum m * x) / 10
    let com = tree.center_of_mass().expect("non-empty tree");
    assert_abs_diff_eq!(com.x, (-0.5 + 1.0 - 1.5 + 2.0) / 10.0, epsilon = 1e-12);
    assert_abs_diff_eq!(com.y, (0.5 + 1.0 - 1.5 - 2.0) / 10.0, epsilon = 1e-12);
}

#[test]
fn test_aggregates_match_subtrees() {
    let particles = random_particles(500, 12);
    let arena = Bump::new();
    let tree = QuadTree::build(&arena, &particles);
    let (mass, _, count) = check_node(tree.root());

    assert_eq!(count, 500);
    let expected: f64 = particles.iter().map(|p| p.mass).sum();
    assert_relative_eq!(mass, expected, max_relative = 1e-12);
    assert_relative_eq!(tree.total_mass(), expected, max_relative = 1e-12);
}

#[test]
fn test_coincident_insertion_terminates() {
    let particles = vec![
        Particle::at_rest(1.0, 1.0, 0.0, 1.0),
        Particle::at_rest(1.0, 1.0, 10.0, 1.0),
        Particle::at_rest(1.0, 1.0, 20.0, 1.0),
        Particle::at_rest(9.0, 9.0, 0.0, 1.0),
    ];
    let arena = Bump::new();
    let tree = QuadTree::build(&arena, &particles);

    assert_eq!(tree.particle_count(), 4);
    assert!(tree.depth() <= MAX_TREE_DEPTH + 1);
    check_node(tree.root());

    // The cluster is evaluated exactly, so even coincident (x, y) pull along z.
    for theta in [0.0, 0.5] {
        let f = tree.force_on(1, &particles[1], theta);
        let exact = DirectSum.force_on(1, &particles);
        assert_relative_eq!(f.x, exact.x, max_relative = 1e-9, epsilon = 1e-15);
        assert_relative_eq!(f.z, exact.z, max_relative = 1e-9, epsilon = 1e-15);
    }
}

#[test]
fn test_zero_theta_matches_direct_sum() {
    let particles = random_particles(120, 21);
    let arena = Bump::new();
    let evaluator = BarnesHutEvaluator::new(&arena, &particles, 0.0);

    for i in 0..particles.len() {
        let approx = evaluator.force_on(i, &particles);
        let exact = DirectSum.force_on(i, &particles);
        assert_relative_eq!(approx.x, exact.x, max_relative = 1e-9, epsilon = 1e-15);
        assert_relative_eq!(approx.y, exact.y, max_relative = 1e-9, epsilon = 1e-15);
        assert_relative_eq!(approx.z, exact.z, max_relative = 1e-9, epsilon = 1e-15);
    }
}

#[test]
fn test_approximation_error_is_small() {
    let particles = random_particles(400, 5);
    let arena = Bump::new();
    let evaluator = BarnesHutEvaluator::new(&arena, &particles, 0.5);

    let mut error = 0.0;
    let mut magnitude = 0.0;
    for i in 0..particles.len() {
        let approx = evaluator.force_on(i, &particles);
        let exact = DirectSum.force_on(i, &particles);
        error += (approx - exact).norm();
        magnitude += exact.norm();
    }
    let relative = error / magnitude;
    assert!(relative < 0.05, "relative error {} too large for theta = 0.5", relative);
}

#[test]
fn test_distant_cluster_collapses_to_point_mass() {
    // A tight group far away in x/y acts as one mass at its centroid.
    let particles = vec![
        Particle::at_rest(0.0, 0.0, 0.0, 1.0),
        Particle::at_rest(1000.0, 1000.0, 0.0, 1.0),
        Particle::at_rest(1000.5, 1000.0, 0.0, 1.0),
        Particle::at_rest(1000.0, 1000.5, 0.0, 1.0),
    ];
    let arena = Bump::new();
    let tree = QuadTree::build(&arena, &particles);
    let f = tree.force_on(0, &particles[0], 1.0);

    let com = Vector3::new(3000.5 / 3.0, 3000.5 / 3.0, 0.0);
    let expected = com * (3.0 / com.norm().powi(3));
    assert_relative_eq!(f.x, expected.x, max_relative = 1e-9);
    assert_relative_eq!(f.y, expected.y, max_relative = 1e-9);
}

#[test]
fn test_depth_spread_keeps_column_open() {
    // Close in x/y but far apart in z: collapsing this pair would misplace both.
    let particles = vec![
        Particle::at_rest(0.0, 0.0, 0.0, 1.0),
        Particle::at_rest(100.0, 100.0, -1000.0, 1.0),
        Particle::at_rest(100.5, 100.0, 1000.0, 1.0),
    ];
    let arena = Bump::new();
    let tree = QuadTree::build(&arena, &particles);
    let f = tree.force_on(0, &particles[0], 0.5);
    let exact = DirectSum.force_on(0, &particles);

    assert_relative_eq!(f.x, exact.x, max_relative = 1e-12);
    assert_relative_eq!(f.y, exact.y, max_relative = 1e-12);
    assert_abs_diff_eq!(f.z, exact.z, epsilon = 1e-15);
}

#[test]
fn test_smaller_theta_is_more_accurate() {
    let particles = random_particles(300, 9);
    let exact: Vec<Vector3> = (0..particles.len()).map(|i| DirectSum.force_on(i, &particles)).collect();

    let error_for = |theta: f64| {
        let arena = Bump::new();
        let evaluator = BarnesHutEvaluator::new(&arena, &particles, theta);
        (0..particles.len())
            .map(|i| (evaluator.force_on(i, &particles) - exact[i]).norm())
            .sum::<f64>()
    };

    let fine = error_for(0.2);
    let coarse = error_for(1.5);
    assert!(fine <= coarse, "theta 0.2 error {} exceeds theta 1.5 error {}", fine, coarse);
}

#[test]
fn test_rebuild_after_reset_reuses_arena() {
    let particles = random_particles(300, 17);
    let mut arena = Bump::with_capacity(1 << 20);

    let (first_nodes, first_force) = {
        let evaluator = BarnesHutEvaluator::new(&arena, &particles, 0.5);
        assert_eq!(evaluator.theta(), 0.5);
        assert_eq!(evaluator.tree().particle_count(), 300);
        (evaluator.tree().node_count(), evaluator.force_on(3, &particles))
    };
    let capacity = arena.allocated_bytes();

    arena.reset();
    let evaluator = BarnesHutEvaluator::new(&arena, &particles, 0.5);

    assert_eq!(evaluator.tree().node_count(), first_nodes);
    assert_eq!(arena.allocated_bytes(), capacity, "a rebuilt tree must fit in the reset arena");
    assert_eq!(evaluator.force_on(3, &particles), first_force);
}

#[test]
fn test_tree_arena_preallocates() {
    let arena = tree_arena(1000);
    assert!(arena.allocated_bytes() >= 1000 * std::mem::size_of::<[QuadNode<'static>; 4]>());

    let particles = random_particles(1000, 30);
    let tree = QuadTree::build(&arena, &particles);
    assert_eq!(tree.particle_count(), 1000);
}
