use nalgebra::{UnitQuaternion, Vector2, Vector3};
use std::str::FromStr;

use super::constants::movement::PITCH_LIMIT;

/// Logical actions fed to the movement controller as press/release events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    Run,
    Jump,
    /// Toggles crouch on press.
    Crouch,
}

impl FromStr for InputAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" | "w" => Ok(InputAction::MoveForward),
            "back" | "backward" | "s" => Ok(InputAction::MoveBack),
            "left" | "a" => Ok(InputAction::MoveLeft),
            "right" | "d" => Ok(InputAction::MoveRight),
            "run" => Ok(InputAction::Run),
            "jump" => Ok(InputAction::Jump),
            "crouch" => Ok(InputAction::Crouch),
            other => Err(format!("unknown input action '{}'", other)),
        }
    }
}

/// Held movement keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementInput {
    pub fn longitudinal(&self) -> bool {
        self.forward || self.back
    }

    pub fn lateral(&self) -> bool {
        self.left || self.right
    }

    /// Normalized intent as (lateral, longitudinal): x is left-positive,
    /// y is forward-positive. Opposing keys cancel out.
    pub fn direction(&self) -> Vector2<f32> {
        let axis = |pos: bool, neg: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        let dir = Vector2::new(axis(self.left, self.right), axis(self.forward, self.back));
        dir.try_normalize(0.0).unwrap_or_else(Vector2::zeros)
    }
}

/// Accumulated pointer look angles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookState {
    /// Rotation about +Y (radians).
    pub yaw: f32,
    /// Rotation about the local X axis, clamped to straight up/down.
    pub pitch: f32,
}

impl LookState {
    /// Apply a pointer delta scaled by `sensitivity`.
    pub fn apply_delta(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw -= dx * sensitivity;
        self.pitch = (self.pitch - dy * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Horizontal facing used to turn local movement into world space.
    pub fn facing(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.yaw)
    }
}
