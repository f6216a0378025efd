//! Ray-based collision queries for the player body.
//!
//! Every probe is a read-only query against the obstacle world. The player is
//! not a collider: its body is described by a reference point (the body
//! center), the current stance, and the configured radius/heights.

use nalgebra::{Point3, UnitQuaternion, Vector3};

use super::constants::probe;
use super::geometry::{Layer, ObstacleWorld};
use super::movement::Stance;
use crate::config::MovementConfig;

/// Snapshot of the player body used by the probes.
#[derive(Debug, Clone, Copy)]
pub struct BodyPose {
    /// Reference point (body center) in world space.
    pub position: Vector3<f32>,
    pub stance: Stance,
    pub vertical_velocity: f32,
}

/// True when an obstacle's underside leaves enough room above a crouched head.
pub fn crouch_clearance_allows_pass(object_bottom: f32, crouch_top: f32) -> bool {
    object_bottom - crouch_top > probe::CROUCH_PASS_CLEARANCE
}

/// Collision Query Engine bound to one world snapshot and one config.
#[derive(Clone, Copy)]
pub struct CollisionQueries<'a> {
    world: &'a ObstacleWorld,
    config: &'a MovementConfig,
}

impl<'a> CollisionQueries<'a> {
    pub fn new(world: &'a ObstacleWorld, config: &'a MovementConfig) -> Self {
        Self { world, config }
    }

    /// Body height for a stance.
    pub fn body_height(&self, stance: Stance) -> f32 {
        match stance {
            Stance::Standing => self.config.player_height,
            Stance::Crouching => self.config.crouch_height,
        }
    }

    fn point(position: Vector3<f32>, dy: f32) -> Point3<f32> {
        Point3::new(position.x, position.y + dy, position.z)
    }

    /// General body check: three fanned rays at two or three heights.
    ///
    /// Standing samples bottom/middle/top of the body at the full radius.
    /// Crouching samples bottom/middle only, shrinks the radius, and ignores hits
    /// more than a margin above the crouched head.
    pub fn is_blocked(&self, pose: &BodyPose, direction: Vector3<f32>) -> bool {
        let crouching = pose.stance == Stance::Crouching;
        let height = self.body_height(pose.stance);
        let sample = height * probe::BODY_SAMPLE_FRACTION;
        let radius = if crouching {
            self.config.player_radius * probe::CROUCH_RADIUS_FACTOR
        } else {
            self.config.player_radius
        };
        let offsets: &[f32] = if crouching {
            &[-sample, 0.0]
        } else {
            &[-sample, 0.0, sample]
        };
        let player_top = pose.position.y + height / 2.0;

        for angle in [0.0, probe::SIDE_RAY_ANGLE, -probe::SIDE_RAY_ANGLE] {
            let dir = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle) * direction;
            for &offset in offsets {
                let origin = Self::point(pose.position, offset);
                let Some(hit) = self.world.cast(origin, dir, Layer::Collidable) else {
                    continue;
                };
                if hit.distance >= radius {
                    continue;
                }
                if crouching && hit.point.y > player_top + probe::CROUCH_IGNORE_ABOVE {
                    continue;
                }
                return true;
            }
        }
        false
    }

    /// Single-ray check used while crouched.
    ///
    /// A close hit only blocks if the obstacle's underside is too low to pass
    /// under. Crouch-tagged obstacles follow the same clearance rule.
    pub fn is_crouch_blocked(&self, pose: &BodyPose, direction: Vector3<f32>) -> bool {
        let Some(hit) = self
            .world
            .cast(Self::point(pose.position, 0.0), direction, Layer::Collidable)
        else {
            return false;
        };
        if hit.distance >= self.config.player_radius * probe::CROUCH_PROBE_RADIUS_FACTOR {
            return false;
        }

        let crouch_top = pose.position.y + self.config.crouch_height / 2.0;
        let object_bottom = hit.obstacle.bottom();
        let can_pass = crouch_clearance_allows_pass(object_bottom, crouch_top);

        log::debug!(
            "Crouch probe hit {} {:?} (crouch obstacle: {}): bottom {:.2}, top {:.2}, crouch top {:.2}, clearance {:.2} -> {}",
            hit.obstacle.kind.name(),
            hit.obstacle.id,
            hit.obstacle.crouch_obstacle,
            object_bottom,
            hit.obstacle.top(),
            crouch_top,
            object_bottom - crouch_top,
            if can_pass { "pass under" } else { "blocked" }
        );

        !can_pass
    }

    /// Ceiling check from the top of the body; crouched bodies need extra room.
    pub fn overhead_blocked(&self, pose: &BodyPose) -> bool {
        let height = self.body_height(pose.stance);
        let required = match pose.stance {
            Stance::Standing => probe::STAND_OVERHEAD_CLEARANCE,
            Stance::Crouching => self.config.stance_height_delta() + probe::CROUCH_OVERHEAD_EXTRA,
        };
        self.world
            .cast(Self::point(pose.position, height / 2.0), Vector3::y(), Layer::Collidable)
            .is_some_and(|hit| hit.distance < required)
    }

    /// Whether a crouched body has room to stand up. Always true when standing.
    pub fn can_stand(&self, pose: &BodyPose) -> bool {
        if pose.stance == Stance::Standing {
            return true;
        }
        let needed = self.config.stance_height_delta() + probe::STAND_HEADROOM_MARGIN;
        match self
            .world
            .cast(Self::point(pose.position, 0.0), Vector3::y(), Layer::Collidable)
        {
            None => true,
            Some(hit) => hit.distance > needed,
        }
    }

    /// Reference height to snap to when landing on a surface below, if any.
    pub fn landing_height(&self, pose: &BodyPose) -> Option<f32> {
        let hit = self
            .world
            .cast(Self::point(pose.position, 0.0), -Vector3::y(), Layer::Landable)?;
        let half = self.body_height(pose.stance) / 2.0;
        let surface = hit.point.y;
        let bottom = pose.position.y - half;

        if (bottom - surface).abs() < probe::LANDING_SNAP_WINDOW && pose.vertical_velocity <= 0.0 {
            Some(surface + half)
        } else {
            None
        }
    }

    /// Reference height of the ground under the body, or the configured baseline.
    pub fn ground_height(&self, pose: &BodyPose) -> f32 {
        let half = self.body_height(pose.stance) / 2.0;
        self.world
            .cast(Self::point(pose.position, 0.0), -Vector3::y(), Layer::Landable)
            .map(|hit| hit.point.y + half)
            .filter(|surface| (pose.position.y - surface).abs() < probe::GROUND_PROBE_WINDOW)
            .unwrap_or(self.config.ground_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::geometry::{ObstacleDef, ObstacleKind, ObstacleShape, ObstacleWorldBuilder};

    fn slab(center: [f32; 3], half_extents: [f32; 3]) -> ObstacleDef {
        ObstacleDef::custom(
            ObstacleShape::Cuboid { half_extents },
            Vector3::new(center[0], center[1], center[2]),
            false,
        )
    }

    fn world_with(defs: &[ObstacleDef]) -> ObstacleWorld {
        let mut builder = ObstacleWorldBuilder::new(10.0);
        for def in defs {
            builder.add(*def);
        }
        builder.build()
    }

    fn pose(y: f32, stance: Stance) -> BodyPose {
        BodyPose {
            position: Vector3::new(0.0, y, 0.0),
            stance,
            vertical_velocity: 0.0,
        }
    }

    #[test]
    fn test_wall_inside_radius_blocks_standing() {
        // Face at x=4, radius 5.
        let world = world_with(&[slab([5.0, 10.0, 0.0], [1.0, 20.0, 20.0])]);
        let config = MovementConfig::default();
        let queries = CollisionQueries::new(&world, &config);
        let standing = pose(10.0, Stance::Standing);

        assert!(queries.is_blocked(&standing, Vector3::x()));
        assert!(!queries.is_blocked(&standing, -Vector3::x()));
    }

    #[test]
    fn test_crouching_shrinks_radius() {
        // Face at x=4: inside 5, outside 5 * 0.7.
        let world = world_with(&[slab([5.0, 10.0, 0.0], [1.0, 20.0, 20.0])]);
        let config = MovementConfig::default();
        let queries = CollisionQueries::new(&world, &config);

        assert!(queries.is_blocked(&pose(10.0, Stance::Standing), Vector3::x()));
        assert!(!queries.is_blocked(&pose(10.0, Stance::Crouching), Vector3::x()));
    }

    #[test]
    fn test_side_rays_catch_corner() {
        // Small pillar off the forward axis, reachable only by a 45 degree ray.
        let world = world_with(&[slab([3.0, 10.0, 3.0], [0.5, 20.0, 0.5])]);
        let config = MovementConfig::default();
        let queries = CollisionQueries::new(&world, &config);

        assert!(queries.is_blocked(&pose(10.0, Stance::Standing), Vector3::z()));
    }

    #[test]
    fn test_crouched_ignores_hits_above_head() {
        // Ceiling underside at 12.2; crouched top is 11, ignore margin puts the cut at 12.
        let world = world_with(&[slab([0.0, 20.0, 0.0], [10.0, 7.8, 10.0])]);
        let config = MovementConfig::default();
        let queries = CollisionQueries::new(&world, &config);
        let upward_slant = Vector3::new(1.0, 1.0, 0.0);

        assert!(!queries.is_blocked(&pose(10.0, Stance::Crouching), upward_slant));
        assert!(queries.is_blocked(&pose(10.0, Stance::Standing), upward_slant));
    }

    #[test]
    fn test_crouch_clearance_policy() {
        assert!(crouch_clearance_allows_pass(14.0, 11.0));
        assert!(!crouch_clearance_allows_pass(11.2, 11.0));
        assert!(!crouch_clearance_allows_pass(11.3, 11.0));
    }

    #[test]
    fn test_crouch_probe_passes_under_with_clearance() {
        // Ball declares no vertical extent: bottom falls back to 17 - 3 = 14,
        // three units above the crouched top at 11.
        let mut builder = ObstacleWorldBuilder::new(10.0);
        builder.add(
            ObstacleDef::custom(ObstacleShape::Ball { radius: 8.0 }, Vector3::new(6.0, 17.0, 0.0), false)
                .crouch_obstacle(true),
        );
        let world = builder.build();
        let config = MovementConfig::default();
        let queries = CollisionQueries::new(&world, &config);

        assert!(!queries.is_crouch_blocked(&pose(10.0, Stance::Crouching), Vector3::x()));
    }

    #[test]
    fn test_crouch_probe_blocks_low_obstacle() {
        // Face at 2.5 (< 0.6 * 5), bottom at 5: no clearance, even when tagged.
        let tagged = slab([3.5, 10.0, 0.0], [1.0, 5.0, 5.0]).crouch_obstacle(true);
        let world = world_with(&[tagged]);
        let config = MovementConfig::default();
        let queries = CollisionQueries::new(&world, &config);

        assert!(queries.is_crouch_blocked(&pose(10.0, Stance::Crouching), Vector3::x()));
        assert!(!queries.is_crouch_blocked(&pose(10.0, Stance::Crouching), -Vector3::x()));
    }

    #[test]
    fn test_crouch_probe_ignores_far_hits() {
        // Face at 3.5, beyond 0.6 * 5.
        let world = world_with(&[slab([4.5, 10.0, 0.0], [1.0, 5.0, 5.0])]);
        let config = MovementConfig::default();
        let queries = CollisionQueries::new(&world, &config);

        assert!(!queries.is_crouch_blocked(&pose(10.0, Stance::Crouching), Vector3::x()));
    }

    #[test]
    fn test_overhead_clearance_thresholds() {
        let config = MovementConfig::default();

        // Standing head at 14; ceiling 0.5 above.
        let low = world_with(&[slab([0.0, 15.5, 0.0], [10.0, 1.0, 10.0])]);
        assert!(CollisionQueries::new(&low, &config).overhead_blocked(&pose(10.0, Stance::Standing)));

        // 1.5 above the head is enough while standing.
        let high = world_with(&[slab([0.0, 16.5, 0.0], [10.0, 1.0, 10.0])]);
        assert!(!CollisionQueries::new(&high, &config).overhead_blocked(&pose(10.0, Stance::Standing)));

        // Crouched head at 11 needs 6.5; ceiling at 17 is only 6 away.
        let crouched_low = world_with(&[slab([0.0, 18.0, 0.0], [10.0, 1.0, 10.0])]);
        assert!(CollisionQueries::new(&crouched_low, &config)
            .overhead_blocked(&pose(10.0, Stance::Crouching)));
    }

    #[test]
    fn test_headroom_to_stand() {
        let config = MovementConfig::default();

        // Needed: 6 + 0.1 above the reference point.
        let tight = world_with(&[slab([0.0, 15.0, 0.0], [10.0, 1.0, 10.0])]);
        assert!(!CollisionQueries::new(&tight, &config).can_stand(&pose(10.0, Stance::Crouching)));
        assert!(CollisionQueries::new(&tight, &config).can_stand(&pose(10.0, Stance::Standing)));

        let roomy = world_with(&[slab([0.0, 17.2, 0.0], [10.0, 1.0, 10.0])]);
        assert!(CollisionQueries::new(&roomy, &config).can_stand(&pose(10.0, Stance::Crouching)));

        let open = world_with(&[]);
        assert!(CollisionQueries::new(&open, &config).can_stand(&pose(10.0, Stance::Crouching)));
    }

    #[test]
    fn test_landing_and_ground_probes() {
        let mut builder = ObstacleWorldBuilder::new(10.0);
        builder.add(
            ObstacleDef::standard(ObstacleKind::Platform, Vector3::new(0.0, 37.5, 0.0), true).unwrap(),
        );
        let world = builder.build();
        let config = MovementConfig::default();
        let queries = CollisionQueries::new(&world, &config);

        let near = pose(44.5, Stance::Standing);
        let landing = queries.landing_height(&near).expect("surface within window");
        assert!((landing - 44.0).abs() < 1e-3);

        let rising = BodyPose {
            vertical_velocity: 5.0,
            ..near
        };
        assert_eq!(queries.landing_height(&rising), None);
        assert_eq!(queries.landing_height(&pose(50.0, Stance::Standing)), None);

        assert!((queries.ground_height(&pose(45.0, Stance::Standing)) - 44.0).abs() < 1e-3);
        assert_eq!(queries.ground_height(&pose(60.0, Stance::Standing)), config.ground_height);
    }

    #[test]
    fn test_ground_probe_ignores_non_landable() {
        let world = world_with(&[slab([0.0, 37.5, 0.0], [15.0, 2.5, 15.0])]);
        let config = MovementConfig::default();
        let queries = CollisionQueries::new(&world, &config);

        assert_eq!(queries.ground_height(&pose(44.5, Stance::Standing)), config.ground_height);
        assert_eq!(queries.landing_height(&pose(44.5, Stance::Standing)), None);
    }
}
