// Simulation clock
pub const SIM_DT: f32 = 1.0 / 60.0;
pub const MAX_FRAME_DT: f32 = 0.1; // longer frames are treated as a hitch
pub const MAX_STEPS_PER_FRAME: u32 = 5;

// Player dimensions and physics
pub const FEET_OFFSET: f32 = 2.0; // rig origin sits at the hips
pub const PLAYER_RADIUS: f32 = 0.5;
pub const GRAVITY: f32 = 79.2;
pub const TERMINAL_FALL_SPEED: f32 = 60.0;
pub const JUMP_VELOCITY: f32 = 33.0;
pub const LANDING_TOLERANCE_ABOVE: f32 = 0.1;
pub const LANDING_TOLERANCE_BELOW: f32 = 1.0;
pub const DEATH_Y: f32 = -30.0;

// Movement
pub const MOVE_SPEED: f32 = 12.0;
pub const MOVE_DEADZONE: f32 = 0.1;
pub const STEP_SOUND_INTERVAL: f32 = 0.35;
pub const VICTORY_SPIN_RATE: f32 = 0.05; // radians per step

// Look
pub const MOUSE_SENSITIVITY: f32 = 0.003;
pub const TOUCH_LOOK_SENSITIVITY: f32 = 0.005;
pub const PITCH_MIN: f32 = -1.0;
pub const PITCH_MAX: f32 = 0.5;
pub const JOYSTICK_RADIUS: f32 = 40.0; // CSS pixels
// Stick pad center, measured from the container's bottom-left corner
pub const JOYSTICK_PAD_LEFT: f32 = 112.0;
pub const JOYSTICK_PAD_BOTTOM: f32 = 128.0;

// Camera
pub const CAMERA_DISTANCE: f32 = 8.0;
pub const CAMERA_HEIGHT: f32 = 4.0;
pub const CAMERA_LOOK_HEIGHT: f32 = 2.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 1000.0;
pub const FOG_NEAR: f32 = 20.0;
pub const FOG_FAR: f32 = 100.0;

// Animation
pub const ANIM_BLEND_RATE: f32 = 0.2;
pub const WALK_TIMER_STEP: f32 = 0.2;
pub const WALK_SWING: f32 = 1.0;

// Level layout
pub const STEP_PLATFORM_COUNT: usize = 50;
pub const CHECKPOINT: [f32; 3] = [0.0, 5.0, 0.0];
pub const GLASS_OPACITY: f32 = 0.6;
pub const BROKEN_GLASS_OPACITY: f32 = 0.1;

// Presence
pub const POSITION_SYNC_INTERVAL: f32 = 0.1;
pub const CHAT_HISTORY_LIMIT: usize = 50;
