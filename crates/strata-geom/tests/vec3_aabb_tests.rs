use strata_geom::{Aabb, Vec3};

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn vec3_approx_eq(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx_eq(a.x, b.x, eps) && approx_eq(a.y, b.y, eps) && approx_eq(a.z, b.z, eps)
}

#[test]
fn vec3_add_sub_neg() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    let b = Vec3::new(-4.0, 5.0, -6.0);
    let c = a + b;
    assert!(vec3_approx_eq(c, Vec3::new(-3.0, 7.0, -3.0), 1e-6));
    assert!(vec3_approx_eq(c - a, b, 1e-6));
    assert!(vec3_approx_eq(-a, Vec3::new(-1.0, -2.0, -3.0), 1e-6));
}

#[test]
fn vec3_floor_handles_negatives() {
    let v = Vec3::new(-0.5, 1.5, -2.0).floor();
    assert_eq!(v, Vec3::new(-1.0, 1.0, -2.0));
}

#[test]
fn vec3_axis_accessors() {
    let mut v = Vec3::new(1.0, 2.0, 3.0);
    assert_eq!(v.axis(0), 1.0);
    assert_eq!(v.axis(2), 3.0);
    v.set_axis(1, 9.0);
    assert_eq!(v.y, 9.0);
}

#[test]
fn aabb_touching_boxes_do_not_intersect() {
    let a = Aabb::unit();
    let b = Aabb::unit().translated(Vec3::new(1.0, 0.0, 0.0));
    assert!(!a.intersects(&b));
    let c = Aabb::unit().translated(Vec3::new(0.5, 0.5, 0.5));
    assert!(a.intersects(&c));
}

#[test]
fn collide_unit_cube_against_offset_cube() {
    let moving = Aabb::unit();
    let wall = Aabb::new(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.5, 1.0, 1.0));
    let (t, normal) = moving.collide(&wall, Vec3::new(2.0, 0.0, 0.0));
    assert!(approx_eq(t, 0.25, 1e-6));
    assert!(vec3_approx_eq(normal, Vec3::new(-1.0, 0.0, 0.0), 1e-6));
}

#[test]
fn collide_reports_positive_normal_when_moving_down() {
    let moving = Aabb::unit().translated(Vec3::new(0.0, 2.0, 0.0));
    let floor = Aabb::unit();
    let (t, normal) = moving.collide(&floor, Vec3::new(0.0, -2.0, 0.0));
    assert!(approx_eq(t, 0.5, 1e-6));
    assert!(vec3_approx_eq(normal, Vec3::UP, 1e-6));
}

#[test]
fn collide_misses_when_out_of_reach() {
    let moving = Aabb::unit();
    let wall = Aabb::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(6.0, 1.0, 1.0));
    let (t, normal) = moving.collide(&wall, Vec3::new(2.0, 0.0, 0.0));
    assert_eq!(t, 1.0);
    assert_eq!(normal, Vec3::ZERO);
}

#[test]
fn collide_misses_when_lateral_gap() {
    let moving = Aabb::unit();
    let wall = Aabb::new(Vec3::new(1.5, 3.0, 0.0), Vec3::new(2.5, 4.0, 1.0));
    let (t, _) = moving.collide(&wall, Vec3::new(2.0, 0.0, 0.0));
    assert_eq!(t, 1.0);
}
