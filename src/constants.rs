pub const DEFAULT_FPS: u32 = 60;

// tiles per second
pub const PLAYER_BASE_SPEED: f32 = 4.0;
pub const ROBOT_BASE_SPEED: f32 = 3.2;

pub const STARTING_LIVES: u32 = 3;
pub const POWER_DURATION_SEC: f32 = 8.0;

pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const ROBOT_DEFEAT_SCORE: u32 = 200;

// Manhattan distances
pub const SPAWN_PROTECTION_RADIUS: i32 = 2;
pub const AMBUSH_TRIGGER_RADIUS: i32 = 2;

pub const MAX_SEGMENTS_PER_STEP: u32 = 8;
// A session tick is split so that no actor moves more than one tile per slice.
pub const MAX_SUBSTEPS_PER_TICK: u32 = 64;

pub fn frame_dt(fps: u32) -> f32 {
    1.0 / fps.clamp(1, 1_000) as f32
}
