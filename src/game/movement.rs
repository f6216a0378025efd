//! First-person movement controller.
//!
//! Turns held inputs and elapsed time into a validated player position:
//! gravity, damping, walk/run/crouch speeds, per-axis collision, ceiling checks,
//! and landing. Horizontal velocity is kept in the player's local frame
//! (-Z forward, -X left) and rotated by the facing yaw when applied.

use nalgebra::Vector3;
use std::sync::Arc;
use std::time::Instant;

use super::collision::{BodyPose, CollisionQueries};
use super::constants::movement as consts;
use super::geometry::ObstacleWorld;
use super::input::{InputAction, LookState, MovementInput};
use crate::config::{MovementConfig, MovementConfigPatch};

/// Body posture. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stance {
    #[default]
    Standing,
    Crouching,
}

impl Stance {
    pub fn is_crouching(self) -> bool {
        self == Stance::Crouching
    }
}

/// Kinematic state owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    /// Body center in world space.
    pub position: Vector3<f32>,
    /// x/z in the local frame, y in world space.
    pub velocity: Vector3<f32>,
    pub stance: Stance,
    pub jumping: bool,
    pub can_jump: bool,
    pub running: bool,
    pub input: MovementInput,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            stance: Stance::Standing,
            jumping: false,
            can_jump: true,
            running: false,
            input: MovementInput::default(),
        }
    }
}

/// Camera eye offsets for each stance, relative to the body center.
///
/// Crouching only moves the eye; the collision reference point stays put.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeHeights {
    pub stand: f32,
    pub crouch: f32,
}

impl EyeHeights {
    pub fn derive(stand: f32, config: &MovementConfig) -> Self {
        Self {
            stand,
            crouch: stand - consts::CROUCH_EYE_FACTOR * config.stance_height_delta(),
        }
    }

    pub fn for_stance(&self, stance: Stance) -> f32 {
        match stance {
            Stance::Standing => self.stand,
            Stance::Crouching => self.crouch,
        }
    }
}

/// Movement Controller: sole writer of [`PlayerState`].
pub struct MovementController {
    world: Arc<ObstacleWorld>,
    config: MovementConfig,
    state: PlayerState,
    look: LookState,
    eye: EyeHeights,
    eye_offset: f32,
    last_tick: Instant,
}

impl MovementController {
    /// Create a standing player at the origin. The stand eye height defaults to
    /// a fraction of the body height; see [`Self::with_stand_eye`].
    pub fn new(world: Arc<ObstacleWorld>, config: MovementConfig) -> Self {
        let eye = EyeHeights::derive(config.player_height * consts::STAND_EYE_FRACTION, &config);
        Self {
            world,
            config,
            state: PlayerState::default(),
            look: LookState::default(),
            eye,
            eye_offset: eye.stand,
            last_tick: Instant::now(),
        }
    }

    /// Use the camera's own stand eye height and re-derive the crouch height from it.
    pub fn with_stand_eye(mut self, stand: f32) -> Self {
        self.eye = EyeHeights::derive(stand, &self.config);
        self.eye_offset = self.eye.for_stance(self.state.stance);
        self
    }

    fn pose(&self) -> BodyPose {
        BodyPose {
            position: self.state.position,
            stance: self.state.stance,
            vertical_velocity: self.state.velocity.y,
        }
    }

    /// Collision queries bound to this controller's world and config.
    pub fn queries(&self) -> CollisionQueries<'_> {
        CollisionQueries::new(&self.world, &self.config)
    }

    /// Record a press or release.
    pub fn set_input(&mut self, action: InputAction, pressed: bool) {
        match action {
            InputAction::MoveForward => self.state.input.forward = pressed,
            InputAction::MoveBack => self.state.input.back = pressed,
            InputAction::MoveLeft => self.state.input.left = pressed,
            InputAction::MoveRight => self.state.input.right = pressed,
            InputAction::Run => {
                if !pressed {
                    self.state.running = false;
                } else if !self.state.stance.is_crouching() {
                    self.state.running = true;
                }
            }
            InputAction::Jump => {
                if pressed {
                    self.try_jump();
                }
            }
            InputAction::Crouch => {
                if pressed {
                    self.toggle_crouch();
                }
            }
        }
    }

    /// Apply the jump impulse if allowed. Returns whether the jump happened.
    pub fn try_jump(&mut self) -> bool {
        if !self.state.can_jump || self.state.stance.is_crouching() {
            return false;
        }
        self.state.velocity.y = self.config.jump_velocity;
        self.state.can_jump = false;
        self.state.jumping = true;
        true
    }

    /// Flip between standing and crouching; returns the resulting stance.
    ///
    /// Crouching always succeeds and stops running. Standing up is refused
    /// while something is overhead within the stance height difference.
    pub fn toggle_crouch(&mut self) -> Stance {
        match self.state.stance {
            Stance::Standing => {
                self.state.running = false;
                self.state.stance = Stance::Crouching;
            }
            Stance::Crouching => {
                if !self.queries().can_stand(&self.pose()) {
                    log::debug!("Stand rejected at {:?}: no headroom", self.state.position);
                    return Stance::Crouching;
                }
                self.state.stance = Stance::Standing;
            }
        }
        self.eye_offset = self.eye.for_stance(self.state.stance);
        log::debug!("Stance -> {:?} (eye offset {:.2})", self.state.stance, self.eye_offset);
        self.state.stance
    }

    /// Apply a pointer-motion sample.
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.look.apply_delta(dx, dy, self.config.mouse_sensitivity);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.look.yaw = yaw;
    }

    pub fn look_state(&self) -> LookState {
        self.look
    }

    fn current_speed(&self) -> f32 {
        if self.state.stance.is_crouching() {
            self.config.crouch_speed
        } else if self.state.running {
            self.config.run_speed
        } else {
            self.config.walk_speed
        }
    }

    /// Advance the simulation by `delta` seconds. Non-positive deltas are ignored.
    pub fn update(&mut self, delta: f32) {
        if !(delta > 0.0) {
            return;
        }
        self.last_tick = Instant::now();

        let speed = self.current_speed();
        let facing = self.look.facing();
        let queries = CollisionQueries::new(&self.world, &self.config);
        let config = &self.config;
        let state = &mut self.state;
        let crouching = state.stance.is_crouching();

        let pose = BodyPose {
            position: state.position,
            stance: state.stance,
            vertical_velocity: state.velocity.y,
        };
        let ground = queries.ground_height(&pose);
        if state.jumping || state.position.y > ground {
            state.velocity.y -= config.gravity * consts::GRAVITY_UNIT_SCALE * delta;
        }

        state.velocity.x -= state.velocity.x * config.velocity_damping * delta;
        state.velocity.z -= state.velocity.z * config.velocity_damping * delta;

        let direction = state.input.direction();
        if state.input.longitudinal() {
            state.velocity.z -= direction.y * speed * delta;
        }
        if state.input.lateral() {
            state.velocity.x -= direction.x * speed * delta;
        }

        // Each horizontal axis is probed from the pre-move position and applied on its own.
        let axis_clear = |local: Vector3<f32>| {
            let world_dir = facing * local;
            if crouching {
                !queries.is_crouch_blocked(&pose, world_dir)
            } else {
                !queries.is_blocked(&pose, world_dir)
            }
        };
        let can_move_x =
            state.velocity.x == 0.0 || axis_clear(Vector3::x() * state.velocity.x.signum());
        let can_move_z =
            state.velocity.z == 0.0 || axis_clear(Vector3::z() * state.velocity.z.signum());

        if can_move_x {
            state.position += facing * Vector3::new(state.velocity.x * delta, 0.0, 0.0);
        } else {
            state.velocity.x = 0.0;
        }
        if can_move_z {
            state.position += facing * Vector3::new(0.0, 0.0, state.velocity.z * delta);
        } else {
            state.velocity.z = 0.0;
        }

        if state.velocity.y > 0.0 {
            let rising = BodyPose {
                position: state.position,
                ..pose
            };
            if queries.overhead_blocked(&rising) {
                state.velocity.y = 0.0;
            }
        }

        state.position.y += state.velocity.y * delta;

        let after = BodyPose {
            position: state.position,
            stance: state.stance,
            vertical_velocity: state.velocity.y,
        };
        let landing = queries
            .landing_height(&after)
            .filter(|_| state.velocity.y <= 0.0);
        if let Some(height) = landing {
            state.position.y = height;
            Self::settle(state);
        } else if state.position.y <= config.ground_height {
            state.position.y = config.ground_height;
            Self::settle(state);
        }

        log::trace!(
            "dt={:.4} pos={:?} vel={:?} stance={:?} ground={:.2}",
            delta,
            state.position,
            state.velocity,
            state.stance,
            ground
        );
    }

    fn settle(state: &mut PlayerState) {
        state.velocity.y = 0.0;
        state.can_jump = true;
        state.jumping = false;
    }

    /// Advance by the wall-clock time since the previous update; returns the delta used.
    pub fn update_from_clock(&mut self) -> f32 {
        let delta = self.last_tick.elapsed().as_secs_f32();
        self.update(delta);
        delta
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.state.position = Vector3::new(x, y, z);
    }

    pub fn position(&self) -> Vector3<f32> {
        self.state.position
    }

    /// Overwrite the velocity (x/z local, y world).
    pub fn set_velocity(&mut self, velocity: Vector3<f32>) {
        self.state.velocity = velocity;
    }

    pub fn velocity(&self) -> Vector3<f32> {
        self.state.velocity
    }

    pub fn reset_velocity(&mut self) {
        self.state.velocity = Vector3::zeros();
    }

    /// Merge a partial config and resync the eye offsets with the new body sizes.
    pub fn update_config(&mut self, patch: &MovementConfigPatch) {
        self.config.apply(patch);
        self.eye = EyeHeights::derive(self.eye.stand, &self.config);
        self.eye_offset = self.eye.for_stance(self.state.stance);
    }

    pub fn config(&self) -> MovementConfig {
        self.config
    }

    /// Vertical eye offset for the camera.
    pub fn eye_offset(&self) -> f32 {
        self.eye_offset
    }

    pub fn eye_heights(&self) -> EyeHeights {
        self.eye
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn stance(&self) -> Stance {
        self.state.stance
    }

    pub fn world(&self) -> &ObstacleWorld {
        &self.world
    }
}
