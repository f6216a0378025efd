//! Movement-and-collision core.
//!
//! - geometry:   immutable obstacle world and ray queries (rapier3d)
//! - collision:  body probes built on those rays
//! - movement:   the per-frame controller that owns the player state
//! - input:      logical actions and look angles

pub mod collision;
pub mod constants;
pub mod geometry;
pub mod input;
pub mod movement;

use std::sync::Arc;

pub use collision::{BodyPose, CollisionQueries};
pub use geometry::{
    Layer, ObstacleDef, ObstacleId, ObstacleKind, ObstacleMeta, ObstacleShape, ObstacleWorld,
    ObstacleWorldBuilder, RayHit,
};
pub use input::{InputAction, LookState, MovementInput};
pub use movement::{EyeHeights, MovementController, PlayerState, Stance};

use crate::config::{ConfigError, MovementConfig, WorldConfig};

/// Build the obstacle world described by `world` and place a controller at its spawn.
///
/// The world's `[movement]` section is merged over `base`.
pub fn build_session(
    world: &WorldConfig,
    base: MovementConfig,
) -> Result<MovementController, ConfigError> {
    let mut config = base;
    config.apply(&world.movement);

    let obstacles = ObstacleWorldBuilder::from_world_config(world, config.ground_height)?.build();
    log::info!(
        "Loaded world '{}': {} obstacles ({} landable)",
        world.name,
        obstacles.len(),
        obstacles.landable_count()
    );

    let mut controller = MovementController::new(Arc::new(obstacles), config);
    let [x, y, z] = world.spawn_position(&config);
    controller.set_position(x, y, z);
    if let Some(spawn) = &world.spawn {
        controller.set_yaw(spawn.yaw);
    }
    Ok(controller)
}
