//! Movement tuning and world description parsing from TOML files

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::game::geometry::{ObstacleKind, ObstacleShape};

/// Movement parameters shared by the controller and the collision queries.
///
/// Distances are in engine units (the default player stands 8 units tall),
/// speeds in units/second, gravity before the unit scale is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub gravity: f32,
    pub jump_velocity: f32,
    /// Lowest allowed player reference height.
    pub ground_height: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub crouch_speed: f32,
    pub player_radius: f32,
    pub player_height: f32,
    pub crouch_height: f32,
    pub velocity_damping: f32,
    pub mouse_sensitivity: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            gravity: 8.0,
            jump_velocity: 250.0,
            ground_height: 10.0,
            walk_speed: 450.0,
            run_speed: 1000.0,
            crouch_speed: 200.0,
            player_radius: 5.0,
            player_height: 8.0,
            crouch_height: 2.0,
            velocity_damping: 10.0,
            mouse_sensitivity: 0.002,
        }
    }
}

impl MovementConfig {
    /// Load a full config from a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    /// Height difference between standing and crouching bodies.
    pub fn stance_height_delta(&self) -> f32 {
        self.player_height - self.crouch_height
    }

    /// Merge every field present in `patch` into this config.
    pub fn apply(&mut self, patch: &MovementConfigPatch) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = patch.$field {
                    self.$field = v;
                })*
            };
        }
        merge!(
            gravity,
            jump_velocity,
            ground_height,
            walk_speed,
            run_speed,
            crouch_speed,
            player_radius,
            player_height,
            crouch_height,
            velocity_damping,
            mouse_sensitivity,
        );
    }
}

/// Partial movement config update. Absent fields leave the current value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct MovementConfigPatch {
    pub gravity: Option<f32>,
    pub jump_velocity: Option<f32>,
    pub ground_height: Option<f32>,
    pub walk_speed: Option<f32>,
    pub run_speed: Option<f32>,
    pub crouch_speed: Option<f32>,
    pub player_radius: Option<f32>,
    pub player_height: Option<f32>,
    pub crouch_height: Option<f32>,
    pub velocity_damping: Option<f32>,
    pub mouse_sensitivity: Option<f32>,
}

/// One obstacle placed at an explicit position.
#[derive(Debug, Clone, Deserialize)]
pub struct ObstacleConfig {
    pub kind: ObstacleKind,
    /// World-space center of the shape.
    pub position: [f32; 3],
    /// Rotation about the vertical axis, radians.
    #[serde(default)]
    pub yaw: f32,
    #[serde(default = "default_landable")]
    pub landable: bool,
    #[serde(default)]
    pub crouch_obstacle: bool,
    /// Overrides the kind's standard dimensions.
    #[serde(default)]
    pub shape: Option<ObstacleShape>,
}

/// A barrier whose height is derived from the ground and crouch clearance.
#[derive(Debug, Clone, Deserialize)]
pub struct CrouchObstacleConfig {
    #[serde(default = "default_barrier_kind")]
    pub kind: ObstacleKind,
    pub x: f32,
    pub z: f32,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub landable: bool,
}

/// Player spawn section
#[derive(Debug, Clone, Deserialize)]
pub struct SpawnConfig {
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw: f32,
}

/// World description from world.toml
#[derive(Debug, Clone, Deserialize)]
pub struct WorldConfig {
    /// Display name of the world
    #[serde(default = "default_world_name")]
    pub name: String,
    /// Movement tuning applied on top of the defaults
    #[serde(default)]
    pub movement: MovementConfigPatch,
    #[serde(default)]
    pub spawn: Option<SpawnConfig>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
    #[serde(default)]
    pub crouch_obstacles: Vec<CrouchObstacleConfig>,
}

fn default_landable() -> bool {
    true
}

fn default_barrier_kind() -> ObstacleKind {
    ObstacleKind::LowBarrier
}

fn default_world_name() -> String {
    "untitled".to_string()
}

impl WorldConfig {
    /// Load world description from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    /// Spawn point, or the origin at ground height when the file has none.
    pub fn spawn_position(&self, config: &MovementConfig) -> [f32; 3] {
        self.spawn
            .as_ref()
            .map(|s| s.position)
            .unwrap_or([0.0, config.ground_height, 0.0])
    }

    /// Ensure every explicit shape is usable before the world is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, obstacle) in self.obstacles.iter().enumerate() {
            if obstacle.kind == ObstacleKind::Custom && obstacle.shape.is_none() {
                return Err(ConfigError::InvalidObstacle(
                    i,
                    "custom obstacles need an explicit shape".to_string(),
                ));
            }
            if let Some(shape) = obstacle.shape {
                if !shape.is_valid() {
                    return Err(ConfigError::InvalidObstacle(
                        i,
                        format!("non-positive dimensions in {:?}", shape),
                    ));
                }
            }
        }
        for (i, barrier) in self.crouch_obstacles.iter().enumerate() {
            if barrier.kind == ObstacleKind::Custom {
                return Err(ConfigError::InvalidObstacle(
                    self.obstacles.len() + i,
                    "crouch obstacles must use a standard kind".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Errors that can occur when loading configuration files
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, toml::de::Error),
    InvalidObstacle(usize, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "Failed to read {}: {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
            ConfigError::InvalidObstacle(index, reason) => {
                write!(f, "Invalid obstacle #{}: {}", index, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_movement_config() {
        let config = MovementConfig::default();
        assert_eq!(config.gravity, 8.0);
        assert_eq!(config.jump_velocity, 250.0);
        assert_eq!(config.ground_height, 10.0);
        assert_eq!(config.stance_height_delta(), 6.0);
    }

    #[test]
    fn test_partial_movement_toml_keeps_defaults() {
        let toml = r#"
            run_speed = 1200.0
            player_radius = 3.5
        "#;
        let config: MovementConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.run_speed, 1200.0);
        assert_eq!(config.player_radius, 3.5);
        assert_eq!(config.walk_speed, 450.0);
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut config = MovementConfig::default();
        let patch = MovementConfigPatch {
            crouch_height: Some(3.0),
            gravity: Some(12.0),
            ..Default::default()
        };
        config.apply(&patch);
        assert_eq!(config.crouch_height, 3.0);
        assert_eq!(config.gravity, 12.0);
        assert_eq!(config.player_height, 8.0);
        assert_eq!(config.jump_velocity, 250.0);
    }

    #[test]
    fn test_parse_world_config() {
        let toml = r#"
            name = "Courtyard"

            [movement]
            walk_speed = 300.0

            [spawn]
            position = [0.0, 10.0, 40.0]

            [[obstacles]]
            kind = "platform"
            position = [0.0, 37.5, 0.0]

            [[obstacles]]
            kind = "custom"
            position = [20.0, 12.0, 0.0]
            landable = false
            shape = { ball = { radius = 4.0 } }

            [[crouch_obstacles]]
            x = -150.0
            z = 0.0
        "#;
        let world: WorldConfig = toml::from_str(toml).unwrap();
        assert_eq!(world.name, "Courtyard");
        assert_eq!(world.movement.walk_speed, Some(300.0));
        assert_eq!(world.obstacles.len(), 2);
        assert!(world.obstacles[0].landable);
        assert!(!world.obstacles[1].landable);
        assert_eq!(world.crouch_obstacles[0].kind, ObstacleKind::LowBarrier);
        assert!(world.validate().is_ok());
        assert_eq!(
            world.spawn_position(&MovementConfig::default()),
            [0.0, 10.0, 40.0]
        );
    }

    #[test]
    fn test_custom_obstacle_without_shape_is_rejected() {
        let toml = r#"
            [[obstacles]]
            kind = "custom"
            position = [0.0, 0.0, 0.0]
        "#;
        let world: WorldConfig = toml::from_str(toml).unwrap();
        assert!(matches!(
            world.validate(),
            Err(ConfigError::InvalidObstacle(0, _))
        ));
    }
}
