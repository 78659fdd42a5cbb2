//! Voxel raycasting using the DDA (Amanatides & Woo) algorithm.
//!
//! Steps through the block grid in f64 parametric units, returning the first
//! non-air block along with the entered face, the exact intersection point,
//! and the travelled distance. Block lookup goes through the [`BlockLookup`]
//! trait so any store — or a test fixture — can be traversed.

use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

/// Tolerance within which two boundary distances count as a tie; ties are
/// broken in X, Y, Z order so results are deterministic.
const TIE_EPSILON: f64 = 1e-9;

/// Trait for looking up block state ids by world position.
///
/// Implementors return the state id at the given block position, with 0 (air)
/// for unloaded or out-of-range positions.
pub trait BlockLookup {
    /// Returns the block state id at the given block position.
    fn state_at(&self, pos: IVec3) -> u32;
}

/// One of the six axis-aligned faces of a block.
///
/// The discriminants are the wire face codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Face {
    /// −Y.
    Bottom = 0,
    /// +Y.
    Top = 1,
    /// −Z.
    North = 2,
    /// +Z.
    South = 3,
    /// −X.
    West = 4,
    /// +X.
    East = 5,
}

impl Face {
    /// The numeric face code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Outward unit normal of the face.
    pub fn normal(self) -> IVec3 {
        match self {
            Face::Bottom => IVec3::NEG_Y,
            Face::Top => IVec3::Y,
            Face::North => IVec3::NEG_Z,
            Face::South => IVec3::Z,
            Face::West => IVec3::NEG_X,
            Face::East => IVec3::X,
        }
    }

    /// The face a ray enters when it steps along `axis` in direction `step`:
    /// a positive step enters through the negative-side face.
    fn entered(axis: Axis, step: i32) -> Face {
        match (axis, step > 0) {
            (Axis::X, true) => Face::West,
            (Axis::X, false) => Face::East,
            (Axis::Y, true) => Face::Bottom,
            (Axis::Y, false) => Face::Top,
            (Axis::Z, true) => Face::North,
            (Axis::Z, false) => Face::South,
        }
    }
}

/// Result of a successful raycast.
#[derive(Clone, Debug, PartialEq)]
pub struct RaycastHit {
    /// Block position of the hit.
    pub position: IVec3,
    /// The face the ray entered through.
    pub face: Face,
    /// Exact intersection point in world units.
    pub intersect: DVec3,
    /// State id of the hit block.
    pub state_id: u32,
    /// Distance travelled from the origin, in world units.
    pub distance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

/// Casts a ray through the block grid.
///
/// `direction` need not be normalized; a zero direction yields `None`, as
/// does a negative `max_distance`. The optional `ignore` predicate lets
/// callers skip state ids (fluids, foliage) that should not stop the ray.
/// A ray that starts inside a matching block reports that block with the
/// face and distance of the step it was about to take.
pub fn raycast(
    world: &impl BlockLookup,
    origin: DVec3,
    direction: DVec3,
    max_distance: f64,
    ignore: Option<&dyn Fn(u32) -> bool>,
) -> Option<RaycastHit> {
    let dir = direction.try_normalize()?;
    if max_distance < 0.0 {
        return None;
    }

    let mut voxel = IVec3::new(
        origin.x.floor() as i32,
        origin.y.floor() as i32,
        origin.z.floor() as i32,
    );
    let step = IVec3::new(step_of(dir.x), step_of(dir.y), step_of(dir.z));
    let t_delta = DVec3::new(inv_abs(dir.x), inv_abs(dir.y), inv_abs(dir.z));
    let mut t_max = DVec3::new(
        boundary_t(origin.x, dir.x),
        boundary_t(origin.y, dir.y),
        boundary_t(origin.z, dir.z),
    );

    let stops = |id: u32| id != 0 && !ignore.is_some_and(|f| f(id));
    let hit = |voxel: IVec3, face: Face, t: f64, id: u32| RaycastHit {
        position: voxel,
        face,
        intersect: origin + dir * t,
        state_id: id,
        distance: t,
    };

    // A ray starting inside a stopping block reports it with the face and
    // distance of the first step it would take.
    let id = world.state_at(voxel);
    if stops(id) {
        let axis = next_axis(t_max);
        let t = component(t_max, axis);
        if t > max_distance {
            return None;
        }
        return Some(hit(voxel, Face::entered(axis, component_i(step, axis)), t, id));
    }

    loop {
        let axis = next_axis(t_max);
        let t = component(t_max, axis);
        if t > max_distance {
            return None;
        }
        match axis {
            Axis::X => {
                voxel.x += step.x;
                t_max.x += t_delta.x;
            }
            Axis::Y => {
                voxel.y += step.y;
                t_max.y += t_delta.y;
            }
            Axis::Z => {
                voxel.z += step.z;
                t_max.z += t_delta.z;
            }
        }
        let id = world.state_at(voxel);
        if stops(id) {
            return Some(hit(voxel, Face::entered(axis, component_i(step, axis)), t, id));
        }
    }
}

/// The axis whose boundary the ray crosses next; X wins ties, then Y.
fn next_axis(t_max: DVec3) -> Axis {
    if t_max.x <= t_max.y + TIE_EPSILON && t_max.x <= t_max.z + TIE_EPSILON {
        Axis::X
    } else if t_max.y <= t_max.z + TIE_EPSILON {
        Axis::Y
    } else {
        Axis::Z
    }
}

fn component(v: DVec3, axis: Axis) -> f64 {
    match axis {
        Axis::X => v.x,
        Axis::Y => v.y,
        Axis::Z => v.z,
    }
}

fn component_i(v: IVec3, axis: Axis) -> i32 {
    match axis {
        Axis::X => v.x,
        Axis::Y => v.y,
        Axis::Z => v.z,
    }
}

fn step_of(d: f64) -> i32 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

/// 1/|d|, or infinity for a zero component.
fn inv_abs(d: f64) -> f64 {
    if d == 0.0 { f64::INFINITY } else { (1.0 / d).abs() }
}

/// Parametric distance from the origin to the first integer boundary along
/// one axis, in the step direction.
fn boundary_t(o: f64, d: f64) -> f64 {
    if d > 0.0 {
        (o.floor() + 1.0 - o) / d
    } else if d < 0.0 {
        (o.floor() - o) / d
    } else {
        f64::INFINITY
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Simple test world backed by a hash map.
    #[derive(Default)]
    struct TestWorld {
        blocks: HashMap<(i32, i32, i32), u32>,
    }

    impl TestWorld {
        fn set(&mut self, x: i32, y: i32, z: i32, id: u32) {
            self.blocks.insert((x, y, z), id);
        }
    }

    impl BlockLookup for TestWorld {
        fn state_at(&self, pos: IVec3) -> u32 {
            self.blocks.get(&(pos.x, pos.y, pos.z)).copied().unwrap_or(0)
        }
    }

    fn center(x: i32, y: i32, z: i32) -> DVec3 {
        DVec3::new(x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5)
    }

    #[test]
    fn test_axis_hit_with_entry_face_and_point() {
        let mut world = TestWorld::default();
        world.set(3, 65, 0, 1);

        let hit = raycast(
            &world,
            DVec3::new(0.5, 65.5, 0.5),
            DVec3::new(1.0, 0.0, 0.0),
            10.0,
            None,
        )
        .expect("should hit");
        assert_eq!(hit.position, IVec3::new(3, 65, 0));
        assert_eq!(hit.face, Face::West);
        assert_eq!(hit.face.code(), 4);
        assert_eq!(hit.state_id, 1);
        assert!((hit.intersect.x - 3.0).abs() < 1e-6);
        assert!((hit.intersect.y - 65.5).abs() < 1e-6);
        assert!((hit.intersect.z - 0.5).abs() < 1e-6);
        assert!((hit.distance - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_miss_within_range_returns_none() {
        let mut world = TestWorld::default();
        world.set(3, 65, 0, 1);
        let hit = raycast(
            &world,
            DVec3::new(0.5, 65.5, 0.5),
            DVec3::new(-1.0, 0.0, 0.0),
            100.0,
            None,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_all_six_entry_faces() {
        let cases: [(DVec3, Face); 6] = [
            (DVec3::X, Face::West),
            (DVec3::NEG_X, Face::East),
            (DVec3::Y, Face::Bottom),
            (DVec3::NEG_Y, Face::Top),
            (DVec3::Z, Face::North),
            (DVec3::NEG_Z, Face::South),
        ];
        for (dir, face) in cases {
            let mut world = TestWorld::default();
            let target = IVec3::new(dir.x as i32 * 4, dir.y as i32 * 4, dir.z as i32 * 4);
            world.set(target.x, target.y, target.z, 2);
            let hit = raycast(&world, center(0, 0, 0), dir, 10.0, None)
                .unwrap_or_else(|| panic!("no hit along {dir:?}"));
            assert_eq!(hit.position, target, "direction {dir:?}");
            assert_eq!(hit.face, face, "direction {dir:?}");
        }
    }

    #[test]
    fn test_intersect_point_lies_on_entry_face() {
        let mut world = TestWorld::default();
        world.set(4, 7, -3, 9);
        let origin = DVec3::new(0.3, 5.2, -0.7);
        let dir = (DVec3::new(4.5, 7.5, -2.5) - origin).normalize();
        let hit = raycast(&world, origin, dir, 20.0, None).expect("should hit");
        assert_eq!(hit.position, IVec3::new(4, 7, -3));
        // The intersection must sit on the plane of the entered face.
        let plane = match hit.face {
            Face::West => (hit.intersect.x, 4.0),
            Face::East => (hit.intersect.x, 5.0),
            Face::Bottom => (hit.intersect.y, 7.0),
            Face::Top => (hit.intersect.y, 8.0),
            Face::North => (hit.intersect.z, -3.0),
            Face::South => (hit.intersect.z, -2.0),
        };
        assert!((plane.0 - plane.1).abs() < 1e-6, "face {:?}", hit.face);
    }

    #[test]
    fn test_unnormalized_direction_is_normalized() {
        let mut world = TestWorld::default();
        world.set(3, 0, 0, 1);
        let hit = raycast(
            &world,
            center(0, 0, 0),
            DVec3::new(250.0, 0.0, 0.0),
            10.0,
            None,
        )
        .expect("should hit");
        // Distance is in world units, not direction-vector multiples.
        assert!((hit.distance - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_direction_returns_none() {
        let mut world = TestWorld::default();
        world.set(0, 0, 0, 1);
        assert!(raycast(&world, center(0, 0, 0), DVec3::ZERO, 10.0, None).is_none());
    }

    #[test]
    fn test_negative_max_distance_returns_none() {
        let mut world = TestWorld::default();
        world.set(1, 0, 0, 1);
        assert!(raycast(&world, center(0, 0, 0), DVec3::X, -1.0, None).is_none());
    }

    #[test]
    fn test_max_distance_bounds_the_walk() {
        let mut world = TestWorld::default();
        world.set(20, 0, 0, 1);
        assert!(raycast(&world, center(0, 0, 0), DVec3::X, 10.0, None).is_none());
        assert!(raycast(&world, center(0, 0, 0), DVec3::X, 25.0, None).is_some());
    }

    #[test]
    fn test_larger_max_distance_returns_same_hit() {
        let mut world = TestWorld::default();
        world.set(6, 2, 1, 5);
        let dir = DVec3::new(2.0, 0.7, 0.4).normalize();
        let near = raycast(&world, center(0, 0, 0), dir, 8.0, None).expect("near");
        for max in [10.0, 50.0, 1000.0] {
            let far = raycast(&world, center(0, 0, 0), dir, max, None).expect("far");
            assert_eq!(near, far, "max {max}");
        }
    }

    #[test]
    fn test_origin_inside_block_reports_it() {
        let mut world = TestWorld::default();
        world.set(2, 3, 4, 8);
        let origin = DVec3::new(2.25, 3.5, 4.5);
        let hit = raycast(&world, origin, DVec3::X, 10.0, None).expect("inside hit");
        assert_eq!(hit.position, IVec3::new(2, 3, 4));
        // Face and distance come from the step the ray was about to take.
        assert_eq!(hit.face, Face::West);
        assert!((hit.distance - 0.75).abs() < 1e-9);
        assert!(raycast(&world, origin, DVec3::X, 0.5, None).is_none());
    }

    #[test]
    fn test_ignore_predicate_skips_states() {
        let mut world = TestWorld::default();
        world.set(2, 0, 0, 30); // water, say
        world.set(5, 0, 0, 1);
        let ignore_water = |id: u32| id == 30;
        let hit = raycast(
            &world,
            center(0, 0, 0),
            DVec3::X,
            10.0,
            Some(&ignore_water),
        )
        .expect("should pass through ignored block");
        assert_eq!(hit.position, IVec3::new(5, 0, 0));

        let hit = raycast(&world, center(0, 0, 0), DVec3::X, 10.0, None).expect("plain hit");
        assert_eq!(hit.position, IVec3::new(2, 0, 0));
    }

    #[test]
    fn test_exact_diagonal_tie_breaks_x_first() {
        // From a cell center along (1,1,0), both boundaries are reached at
        // the same t; the X step must win, visiting (1,0,0) before (1,1,0).
        let mut world = TestWorld::default();
        world.set(1, 0, 0, 7);
        world.set(0, 1, 0, 8);
        let dir = DVec3::new(1.0, 1.0, 0.0).normalize();
        let hit = raycast(&world, center(0, 0, 0), dir, 5.0, None).expect("tie hit");
        assert_eq!(hit.position, IVec3::new(1, 0, 0));
        assert_eq!(hit.face, Face::West);
    }

    #[test]
    fn test_diagonal_walk_reaches_target() {
        let mut world = TestWorld::default();
        world.set(3, 3, 0, 1);
        let dir = DVec3::new(1.0, 1.0, 0.0).normalize();
        let hit = raycast(&world, center(0, 0, 0), dir, 20.0, None).expect("diagonal hit");
        assert_eq!(hit.position, IVec3::new(3, 3, 0));
        let expected = (3.0 - 0.5) * 2.0_f64.sqrt();
        assert!((hit.distance - expected).abs() < 1e-9);
    }

    #[test]
    fn test_negative_coordinate_traversal() {
        let mut world = TestWorld::default();
        world.set(-4, 0, 0, 3);
        let hit = raycast(&world, center(0, 0, 0), DVec3::NEG_X, 10.0, None).expect("hit");
        assert_eq!(hit.position, IVec3::new(-4, 0, 0));
        assert_eq!(hit.face, Face::East);
        assert!((hit.intersect.x - (-3.0)).abs() < 1e-6);
    }
}
