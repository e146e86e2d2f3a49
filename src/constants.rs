// Playback tuning defaults, shared by the config module and the engines

// === Controls visibility ===
/// Quiet interval before the control surface auto-hides during playback
pub const DEFAULT_INACTIVITY_TIMEOUT_MS: u64 = 3000;

// === Transport ===
/// How long an optimistic play() waits for the engine to confirm playback
pub const DEFAULT_PLAY_CONFIRM_TIMEOUT_MS: u64 = 2000;

/// Volume restored when unmuting while the stored volume is zero
pub const DEFAULT_UNMUTE_VOLUME_FLOOR: f64 = 0.1;

pub const DEFAULT_INITIAL_VOLUME: f64 = 1.0;

/// Step used by keyboard volume up/down
pub const DEFAULT_VOLUME_STEP: f64 = 0.1;

/// Default relative skip for keyboard seeking (Left/Right)
pub const DEFAULT_SKIP_STEP_SECONDS: f64 = 5.0;
pub const FINE_SKIP_STEP_SECONDS: f64 = 1.0;
pub const COARSE_SKIP_STEP_SECONDS: f64 = 10.0;

// === Engines ===
/// How often a native engine's position is polled while playing
pub const POSITION_POLL_MS: u64 = 250;

// === Simulated engine ===
/// Interval at which the simulated engine reports time updates
pub const SIMULATED_TICK_MS: u64 = 250;
pub const SIMULATED_DEFAULT_DURATION_SECS: f64 = 120.0;

// === Config ===
pub const CONFIG_DIR_NAME: &str = "reel-playback";
pub const CONFIG_FILE_NAME: &str = "config.toml";
