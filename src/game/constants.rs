//! Movement, probe, and world-build constants.
//! Empirical thresholds live here as named tunables instead of inline literals.

/// Integration constants
pub mod movement {
    /// Gravity is configured in "scene" units and multiplied by this factor to match
    /// the engine's distance scale (a standing player is 8 units tall, not 1.8 m).
    pub const GRAVITY_UNIT_SCALE: f32 = 100.0;

    /// Fixed frame time used by the CLI driver (60 Hz)
    pub const DEFAULT_TIMESTEP: f32 = 1.0 / 60.0;

    /// Stand eye height as a fraction of the standing body height,
    /// used when the camera supplies no eye offset of its own.
    pub const STAND_EYE_FRACTION: f32 = 0.9;

    /// Crouch eye drop per unit of stance height difference
    pub const CROUCH_EYE_FACTOR: f32 = 2.5;

    /// Pitch limit for look input (radians)
    pub const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2;
}

/// Collision probe thresholds
pub mod probe {
    /// Rays fanned left/right of the movement direction (radians)
    pub const SIDE_RAY_ANGLE: f32 = std::f32::consts::FRAC_PI_4;

    /// Vertical ray offsets as a fraction of the current body height
    pub const BODY_SAMPLE_FRACTION: f32 = 0.3;

    /// Radius multiplier for the general check while crouched
    pub const CROUCH_RADIUS_FACTOR: f32 = 0.7;

    /// Radius multiplier for the single-ray crouch check
    pub const CROUCH_PROBE_RADIUS_FACTOR: f32 = 0.6;

    /// Hits this far above a crouched player's top are overhead clutter
    pub const CROUCH_IGNORE_ABOVE: f32 = 1.0;

    /// Gap needed between an obstacle's underside and a crouched head to pass under
    pub const CROUCH_PASS_CLEARANCE: f32 = 0.3;

    /// Overhead clearance while standing
    pub const STAND_OVERHEAD_CLEARANCE: f32 = 1.0;

    /// Extra overhead clearance on top of the stance delta while crouched
    pub const CROUCH_OVERHEAD_EXTRA: f32 = 0.5;

    /// Margin on top of the stance delta before standing up is allowed
    pub const STAND_HEADROOM_MARGIN: f32 = 0.1;

    /// Max distance between body bottom and a surface for a landing snap
    pub const LANDING_SNAP_WINDOW: f32 = 2.0;

    /// Max distance between the body and a surface for it to count as ground
    pub const GROUND_PROBE_WINDOW: f32 = 3.0;

    /// Half height assumed for shapes that declare no vertical extent
    pub const DEFAULT_HALF_EXTENT: f32 = 3.0;

    /// Upper bound on ray length; the scene is a few thousand units across
    pub const MAX_RAY_DISTANCE: f32 = 1.0e6;

    /// Directions shorter than this are treated as "no direction"
    pub const MIN_DIRECTION_NORM: f32 = 1.0e-6;
}

/// World-build layout constants for crouch obstacles
pub mod layout {
    /// Crouch height the barrier placement assumes
    pub const PLAYER_CROUCH_HEIGHT: f32 = 2.0;

    /// Minimum space left above a crouched player under a barrier
    pub const MIN_CROUCH_CLEARANCE: f32 = 0.5;
}
