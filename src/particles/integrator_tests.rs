use crate::models::Vector3;
use crate::particles::{integrate, Boundary, Particle};

#[test]
fn test_integrate_without_boundary() {
    let mut p = Particle::at_rest(1.0, 2.0, 3.0, 4.0);
    p.velocity = Vector3::new(1.0, 0.0, 0.0);
    integrate(&mut p, Vector3::new(8.0, -4.0, 0.0), 0.5, None);

    // v += F / m * dt = (1, -0.5, 0) ; x += v * dt
    assert_eq!(p.velocity, Vector3::new(2.0, -0.5, 0.0));
    assert_eq!(p.position, Vector3::new(2.0, 1.75, 3.0));
}

#[test]
fn test_reflect_upper_edge() {
    let boundary = Boundary::new(100.0, 100.0);
    let mut p = Particle::at_rest(99.9, 50.0, 0.0, 1.0);
    p.velocity = Vector3::new(5.0, 0.0, 0.0);

    integrate(&mut p, Vector3::zero(), 1.0, Some(&boundary));

    assert_eq!(p.position.x, 100.0);
    assert_eq!(p.velocity.x, -5.0);
    assert_eq!(p.position.y, 50.0);
    assert_eq!(p.velocity.y, 0.0);
}

#[test]
fn test_reflect_both_axes_independently() {
    let boundary = Boundary::new(10.0, 20.0);
    let mut p = Particle::at_rest(-1.0, 25.0, 0.0, 1.0);
    p.velocity = Vector3::new(-2.0, 3.0, 0.0);

    boundary.reflect(&mut p);

    assert_eq!((p.position.x, p.position.y), (0.0, 20.0));
    assert_eq!((p.velocity.x, p.velocity.y), (2.0, -3.0));
}

#[test]
fn test_depth_is_never_bounded() {
    let boundary = Boundary::new(10.0, 10.0);
    let mut p = Particle::at_rest(5.0, 5.0, 0.0, 1.0);
    p.velocity = Vector3::new(0.0, 0.0, -50.0);

    integrate(&mut p, Vector3::zero(), 1.0, Some(&boundary));

    assert_eq!(p.position.z, -50.0);
    assert_eq!(p.velocity.z, -50.0);
}

#[test]
fn test_inside_or_on_edge_is_untouched() {
    let boundary = Boundary::new(10.0, 10.0);
    for (x, y) in [(0.0, 0.0), (10.0, 10.0), (3.0, 7.0)] {
        let mut p = Particle::at_rest(x, y, 0.0, 1.0);
        p.velocity = Vector3::new(1.0, -1.0, 0.0);
        boundary.reflect(&mut p);
        assert_eq!((p.position.x, p.position.y), (x, y));
        assert_eq!(p.velocity, Vector3::new(1.0, -1.0, 0.0));
    }
}
