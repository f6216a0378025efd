//! Static obstacle geometry shared between the world builder and the movement core.
//!
//! All obstacles live in one rapier `ColliderSet`. Landable obstacles carry an
//! extra collision-group membership, so "landable geometry" is a filtered view of
//! the same collection rather than a second copy. The world is immutable once
//! built; every query takes `&self`.

use nalgebra::{Point3, Vector3};
use rapier3d::prelude::*;
use serde::Deserialize;

use super::constants::{layout, probe};
use crate::config::{ConfigError, WorldConfig};

// Every obstacle is collidable; only some can be stood on.
const GROUP_OBSTACLE: Group = Group::GROUP_1;
const GROUP_LANDABLE: Group = Group::GROUP_2;

/// Obstacle categories produced by the world generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    Box,
    Cylinder,
    Platform,
    TallBox,
    LowBarrier,
    Tunnel,
    /// Arbitrary shape; dimensions must be given explicitly.
    Custom,
}

impl ObstacleKind {
    /// Standard dimensions for generator-made obstacles.
    pub fn standard_shape(self) -> Option<ObstacleShape> {
        let cuboid = |w: f32, h: f32, d: f32| ObstacleShape::Cuboid {
            half_extents: [w / 2.0, h / 2.0, d / 2.0],
        };
        match self {
            ObstacleKind::Box => Some(cuboid(20.0, 20.0, 20.0)),
            ObstacleKind::Cylinder => Some(ObstacleShape::Cylinder {
                radius: 5.0,
                half_height: 20.0,
            }),
            ObstacleKind::Platform => Some(cuboid(30.0, 5.0, 30.0)),
            ObstacleKind::TallBox => Some(cuboid(15.0, 60.0, 15.0)),
            ObstacleKind::LowBarrier => Some(cuboid(40.0, 6.0, 8.0)),
            ObstacleKind::Tunnel => Some(cuboid(50.0, 8.0, 12.0)),
            ObstacleKind::Custom => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ObstacleKind::Box => "box",
            ObstacleKind::Cylinder => "cylinder",
            ObstacleKind::Platform => "platform",
            ObstacleKind::TallBox => "tall_box",
            ObstacleKind::LowBarrier => "low_barrier",
            ObstacleKind::Tunnel => "tunnel",
            ObstacleKind::Custom => "custom",
        }
    }
}

/// Collision shape of an obstacle, in local space.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleShape {
    /// Box with the given half extents (x, y, z).
    Cuboid { half_extents: [f32; 3] },
    /// Y-aligned cylinder.
    Cylinder { radius: f32, half_height: f32 },
    /// Sphere. Declares no vertical extent, so clearance math uses the fallback.
    Ball { radius: f32 },
}

impl ObstacleShape {
    /// Declared half height, if the shape has one.
    pub fn vertical_half_extent(&self) -> Option<f32> {
        match *self {
            ObstacleShape::Cuboid { half_extents } => Some(half_extents[1]),
            ObstacleShape::Cylinder { half_height, .. } => Some(half_height),
            ObstacleShape::Ball { .. } => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        match *self {
            ObstacleShape::Cuboid { half_extents } => half_extents.iter().all(|&e| e > 0.0),
            ObstacleShape::Cylinder {
                radius,
                half_height,
            } => radius > 0.0 && half_height > 0.0,
            ObstacleShape::Ball { radius } => radius > 0.0,
        }
    }

    fn to_shared_shape(self) -> SharedShape {
        match self {
            ObstacleShape::Cuboid { half_extents: [hx, hy, hz] } => SharedShape::cuboid(hx, hy, hz),
            ObstacleShape::Cylinder {
                radius,
                half_height,
            } => SharedShape::cylinder(half_height, radius),
            ObstacleShape::Ball { radius } => SharedShape::ball(radius),
        }
    }
}

/// Which subset of the world a ray is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Every obstacle.
    Collidable,
    /// Only obstacles that can be walked or landed on.
    Landable,
}

impl Layer {
    fn query_groups(self) -> InteractionGroups {
        match self {
            Layer::Collidable => InteractionGroups::new(Group::ALL, GROUP_OBSTACLE),
            Layer::Landable => InteractionGroups::new(Group::ALL, GROUP_LANDABLE),
        }
    }
}

/// Stable identifier assigned in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(pub u32);

/// Read-only metadata the movement core consumes for each obstacle.
#[derive(Debug, Clone, Copy)]
pub struct ObstacleMeta {
    pub id: ObstacleId,
    pub kind: ObstacleKind,
    /// World-space center of the shape.
    pub center: Vector3<f32>,
    /// Declared vertical half extent (None for shapes without one).
    pub half_height: Option<f32>,
    /// Tagged as meant to be passed under while crouching.
    pub crouch_obstacle: bool,
    pub landable: bool,
}

impl ObstacleMeta {
    fn effective_half_height(&self) -> f32 {
        self.half_height.unwrap_or(probe::DEFAULT_HALF_EXTENT)
    }

    /// Underside height used by the crouch clearance policy.
    pub fn bottom(&self) -> f32 {
        self.center.y - self.effective_half_height()
    }

    pub fn top(&self) -> f32 {
        self.center.y + self.effective_half_height()
    }
}

/// Definition of one obstacle before the world is built.
#[derive(Debug, Clone, Copy)]
pub struct ObstacleDef {
    pub kind: ObstacleKind,
    pub shape: ObstacleShape,
    pub center: Vector3<f32>,
    /// Rotation about +Y (radians).
    pub yaw: f32,
    pub landable: bool,
    pub crouch_obstacle: bool,
}

impl ObstacleDef {
    /// A generator-standard obstacle. `None` for `ObstacleKind::Custom`.
    pub fn standard(kind: ObstacleKind, center: Vector3<f32>, landable: bool) -> Option<Self> {
        Some(Self {
            kind,
            shape: kind.standard_shape()?,
            center,
            yaw: 0.0,
            landable,
            crouch_obstacle: false,
        })
    }

    /// A custom-shaped obstacle.
    pub fn custom(shape: ObstacleShape, center: Vector3<f32>, landable: bool) -> Self {
        Self {
            kind: ObstacleKind::Custom,
            shape,
            center,
            yaw: 0.0,
            landable,
            crouch_obstacle: false,
        }
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn crouch_obstacle(mut self, flag: bool) -> Self {
        self.crouch_obstacle = flag;
        self
    }
}

/// Nearest intersection along a ray.
#[derive(Debug, Clone, Copy)]
pub struct RayHit<'a> {
    pub distance: f32,
    pub point: Point3<f32>,
    pub obstacle: &'a ObstacleMeta,
}

/// Collects obstacle definitions, then freezes them into an [`ObstacleWorld`].
#[derive(Debug, Clone)]
pub struct ObstacleWorldBuilder {
    ground_height: f32,
    defs: Vec<ObstacleDef>,
}

impl ObstacleWorldBuilder {
    /// `ground_height` is the baseline used to place crouch obstacles.
    pub fn new(ground_height: f32) -> Self {
        Self {
            ground_height,
            defs: Vec::new(),
        }
    }

    /// Build the obstacle list described by a world file.
    pub fn from_world_config(world: &WorldConfig, ground_height: f32) -> Result<Self, ConfigError> {
        world.validate()?;
        let mut builder = Self::new(ground_height);

        for (i, obstacle) in world.obstacles.iter().enumerate() {
            let shape = obstacle
                .shape
                .or_else(|| obstacle.kind.standard_shape())
                .ok_or_else(|| {
                    ConfigError::InvalidObstacle(i, "missing shape".to_string())
                })?;
            let [x, y, z] = obstacle.position;
            builder.add(ObstacleDef {
                kind: obstacle.kind,
                shape,
                center: Vector3::new(x, y, z),
                yaw: obstacle.yaw,
                landable: obstacle.landable,
                crouch_obstacle: obstacle.crouch_obstacle,
            });
        }

        for (i, barrier) in world.crouch_obstacles.iter().enumerate() {
            builder
                .add_crouch_obstacle(barrier.kind, barrier.x, barrier.z, barrier.yaw, barrier.landable)
                .ok_or_else(|| {
                    ConfigError::InvalidObstacle(
                        world.obstacles.len() + i,
                        "crouch obstacle kind has no standard shape".to_string(),
                    )
                })?;
        }

        Ok(builder)
    }

    pub fn add(&mut self, def: ObstacleDef) -> ObstacleId {
        let id = ObstacleId(self.defs.len() as u32);
        self.defs.push(def);
        id
    }

    /// Center height that leaves a crouched player room to pass under `kind`.
    ///
    /// The barrier bottom sits at `ground + crouch height + min clearance`.
    pub fn crouch_barrier_y(&self, kind: ObstacleKind) -> Option<f32> {
        let half_height = kind.standard_shape()?.vertical_half_extent()?;
        let required_bottom =
            self.ground_height + layout::PLAYER_CROUCH_HEIGHT + layout::MIN_CROUCH_CLEARANCE;
        Some(required_bottom + half_height)
    }

    /// Place a standard barrier at crouch height and tag it as a crouch obstacle.
    pub fn add_crouch_obstacle(
        &mut self,
        kind: ObstacleKind,
        x: f32,
        z: f32,
        yaw: f32,
        landable: bool,
    ) -> Option<ObstacleId> {
        let y = self.crouch_barrier_y(kind)?;
        let def = ObstacleDef::standard(kind, Vector3::new(x, y, z), landable)?
            .with_yaw(yaw)
            .crouch_obstacle(true);
        let id = self.add(def);
        log::debug!(
            "Placed {} crouch obstacle {:?} at y={:.2} (bottom {:.2})",
            kind.name(),
            id,
            y,
            y - def.shape.vertical_half_extent().unwrap_or(0.0)
        );
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Insert every definition into a collider set and index it for ray queries.
    pub fn build(self) -> ObstacleWorld {
        let rigid_body_set = RigidBodySet::new();
        let mut collider_set = ColliderSet::new();
        let mut obstacles = Vec::with_capacity(self.defs.len());

        for (index, def) in self.defs.into_iter().enumerate() {
            let memberships = if def.landable {
                GROUP_OBSTACLE | GROUP_LANDABLE
            } else {
                GROUP_OBSTACLE
            };
            let collider = ColliderBuilder::new(def.shape.to_shared_shape())
                .translation(def.center)
                .rotation(vector![0.0, def.yaw, 0.0])
                .collision_groups(InteractionGroups::new(memberships, Group::ALL))
                .user_data(index as u128)
                .build();
            collider_set.insert(collider);

            obstacles.push(ObstacleMeta {
                id: ObstacleId(index as u32),
                kind: def.kind,
                center: def.center,
                half_height: def.shape.vertical_half_extent(),
                crouch_obstacle: def.crouch_obstacle,
                landable: def.landable,
            });
        }

        let mut query_pipeline = QueryPipeline::new();
        query_pipeline.update(&collider_set);

        log::debug!(
            "Built obstacle world: {} obstacles, {} landable",
            obstacles.len(),
            obstacles.iter().filter(|o| o.landable).count()
        );

        ObstacleWorld {
            rigid_body_set,
            collider_set,
            query_pipeline,
            obstacles,
        }
    }
}

/// Immutable obstacle snapshot answering ray queries.
pub struct ObstacleWorld {
    // Colliders are parentless; the query API still wants a body set.
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    query_pipeline: QueryPipeline,
    obstacles: Vec<ObstacleMeta>,
}

impl ObstacleWorld {
    /// A world with no obstacles at all.
    pub fn empty() -> Self {
        ObstacleWorldBuilder::new(0.0).build()
    }

    /// Cast a ray and return the nearest front face it crosses.
    ///
    /// Only faces the ray enters count: a shape containing the origin is
    /// invisible to the ray. Returns `None` for a zero-length direction.
    pub fn cast(&self, origin: Point3<f32>, direction: Vector3<f32>, layer: Layer) -> Option<RayHit<'_>> {
        let norm = direction.norm();
        if norm < probe::MIN_DIRECTION_NORM {
            return None;
        }
        let ray = Ray::new(origin, direction / norm);
        let filter = QueryFilter::default().groups(layer.query_groups());

        let mut nearest: Option<(ColliderHandle, f32)> = None;
        self.query_pipeline.intersections_with_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            probe::MAX_RAY_DISTANCE,
            false,
            filter,
            |handle, intersection| {
                // Exit faces have normals pointing along the ray.
                let entering = intersection.normal.dot(&ray.dir) < 0.0;
                let closer = nearest.map_or(true, |(_, toi)| intersection.time_of_impact < toi);
                if entering && closer {
                    nearest = Some((handle, intersection.time_of_impact));
                }
                true
            },
        );

        let (handle, toi) = nearest?;
        let collider = self.collider_set.get(handle)?;
        let obstacle = self.obstacles.get(collider.user_data as usize)?;
        Some(RayHit {
            distance: toi,
            point: ray.point_at(toi),
            obstacle,
        })
    }

    pub fn obstacle(&self, id: ObstacleId) -> Option<&ObstacleMeta> {
        self.obstacles.get(id.0 as usize)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &ObstacleMeta> {
        self.obstacles.iter()
    }

    pub fn landable_count(&self) -> usize {
        self.obstacles.iter().filter(|o| o.landable).count()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform_world() -> ObstacleWorld {
        let mut builder = ObstacleWorldBuilder::new(10.0);
        // Platform top at y=40.
        builder.add(ObstacleDef::standard(ObstacleKind::Platform, Vector3::new(0.0, 37.5, 0.0), true).unwrap());
        // Non-landable wall off to the side.
        builder.add(
            ObstacleDef::custom(
                ObstacleShape::Cuboid { half_extents: [1.0, 20.0, 20.0] },
                Vector3::new(50.0, 20.0, 0.0),
                false,
            ),
        );
        builder.build()
    }

    #[test]
    fn test_standard_shapes_match_generator_dimensions() {
        assert_eq!(
            ObstacleKind::LowBarrier.standard_shape(),
            Some(ObstacleShape::Cuboid { half_extents: [20.0, 3.0, 4.0] })
        );
        assert_eq!(
            ObstacleKind::Cylinder.standard_shape().and_then(|s| s.vertical_half_extent()),
            Some(20.0)
        );
        assert_eq!(ObstacleKind::Custom.standard_shape(), None);
    }

    #[test]
    fn test_ray_down_hits_platform_top() {
        let world = platform_world();
        let hit = world
            .cast(point![0.0, 50.0, 0.0], vector![0.0, -1.0, 0.0], Layer::Landable)
            .expect("platform should be hit");
        assert!((hit.distance - 10.0).abs() < 1e-3, "distance was {}", hit.distance);
        assert!((hit.point.y - 40.0).abs() < 1e-3);
        assert_eq!(hit.obstacle.kind, ObstacleKind::Platform);
    }

    #[test]
    fn test_landable_layer_skips_non_landable() {
        let world = platform_world();
        let dir = vector![1.0, 0.0, 0.0];
        let origin = point![30.0, 20.0, 0.0];
        assert!(world.cast(origin, dir, Layer::Landable).is_none());
        let hit = world.cast(origin, dir, Layer::Collidable).expect("wall should be hit");
        assert!((hit.distance - 19.0).abs() < 1e-3);
    }

    #[test]
    fn test_nearest_hit_wins() {
        let mut builder = ObstacleWorldBuilder::new(0.0);
        let far = builder.add(ObstacleDef::custom(
            ObstacleShape::Cuboid { half_extents: [1.0, 1.0, 1.0] },
            Vector3::new(20.0, 0.0, 0.0),
            true,
        ));
        let near = builder.add(ObstacleDef::custom(
            ObstacleShape::Cuboid { half_extents: [1.0, 1.0, 1.0] },
            Vector3::new(10.0, 0.0, 0.0),
            true,
        ));
        let world = builder.build();
        let hit = world
            .cast(point![0.0, 0.0, 0.0], vector![2.0, 0.0, 0.0], Layer::Collidable)
            .unwrap();
        assert_eq!(hit.obstacle.id, near);
        assert_ne!(hit.obstacle.id, far);
        assert!((hit.distance - 9.0).abs() < 1e-3, "unnormalized direction should not scale distance");
    }

    #[test]
    fn test_ray_starting_inside_ignores_that_shape() {
        let world = platform_world();
        // Inside the platform (35..40): its underside is an exit face.
        assert!(world
            .cast(point![0.0, 39.0, 0.0], vector![0.0, -1.0, 0.0], Layer::Landable)
            .is_none());

        let mut builder = ObstacleWorldBuilder::new(10.0);
        builder.add(ObstacleDef::standard(ObstacleKind::Platform, Vector3::new(0.0, 37.5, 0.0), true).unwrap());
        // Floor slab below with its top at y=21.
        builder.add(ObstacleDef::custom(
            ObstacleShape::Cuboid { half_extents: [20.0, 1.0, 20.0] },
            Vector3::new(0.0, 20.0, 0.0),
            true,
        ));
        let world = builder.build();
        let hit = world
            .cast(point![0.0, 39.0, 0.0], vector![0.0, -1.0, 0.0], Layer::Landable)
            .expect("floor below should be hit");
        assert!((hit.point.y - 21.0).abs() < 1e-3, "hit at {}", hit.point.y);
        assert_eq!(hit.obstacle.kind, ObstacleKind::Custom);
    }

    #[test]
    fn test_zero_direction_has_no_hit() {
        let world = platform_world();
        assert!(world.cast(point![0.0, 50.0, 0.0], Vector3::zeros(), Layer::Collidable).is_none());
    }

    #[test]
    fn test_crouch_obstacle_placement() {
        let mut builder = ObstacleWorldBuilder::new(10.0);
        // bottom = 10 + 2 + 0.5 = 12.5, half height 3
        assert_eq!(builder.crouch_barrier_y(ObstacleKind::LowBarrier), Some(15.5));
        let id = builder
            .add_crouch_obstacle(ObstacleKind::Tunnel, 0.0, 0.0, std::f32::consts::FRAC_PI_2, false)
            .unwrap();
        assert!(builder.add_crouch_obstacle(ObstacleKind::Custom, 0.0, 0.0, 0.0, false).is_none());

        let world = builder.build();
        let meta = world.obstacle(id).unwrap();
        assert!(meta.crouch_obstacle);
        assert!(!meta.landable);
        assert!((meta.bottom() - 12.5).abs() < 1e-5);
        assert_eq!(world.landable_count(), 0);
    }

    #[test]
    fn test_ball_falls_back_to_default_half_extent() {
        let mut builder = ObstacleWorldBuilder::new(0.0);
        let id = builder.add(ObstacleDef::custom(
            ObstacleShape::Ball { radius: 8.0 },
            Vector3::new(0.0, 17.0, 0.0),
            false,
        ));
        let world = builder.build();
        let meta = world.obstacle(id).unwrap();
        assert_eq!(meta.half_height, None);
        assert_eq!(meta.bottom(), 17.0 - probe::DEFAULT_HALF_EXTENT);
    }
}
