//! Centralized balance and tuning constants for Realmkeeper rules.
//!
//! These values define the deterministic math for economy, upkeep and
//! missions. Keeping them together ensures that balance can only be adjusted
//! via code changes reviewed in version control, rather than through external
//! JSON assets.

// Upkeep rates (gold per unit per turn) -----------------------------------
pub(crate) const UPKEEP_HUSCARL: i64 = 2;
pub(crate) const UPKEEP_DISMOUNTED_KNIGHT: i64 = 3;
pub(crate) const UPKEEP_MOUNTED_KNIGHT: i64 = 4;
pub(crate) const UPKEEP_LIGHT_HORSE: i64 = 2;
pub(crate) const UPKEEP_SELLSWORD: i64 = 3;
pub(crate) const UPKEEP_MERC_CROSSBOW: i64 = 3;
pub(crate) const UPKEEP_MERC_CAVALRY: i64 = 4;
/// Levy upkeep is a quarter gold per levy unit.
pub(crate) const LEVY_UPKEEP_NUMERATOR: i64 = 1;
pub(crate) const LEVY_UPKEEP_DENOMINATOR: i64 = 4;
pub(crate) const UPKEEP_WARSHIP: i64 = 2;
pub(crate) const UPKEEP_SPY: i64 = 2;
pub(crate) const UPKEEP_AGITATOR: i64 = 3;
pub(crate) const UPKEEP_ENFORCER: i64 = 2;

// Mission difficulty -------------------------------------------------------
pub const DIFFICULTY_MIN: i32 = 5;
pub const DIFFICULTY_MAX: i32 = 95;
/// Reported for mission keys that cannot be evaluated.
pub const DIFFICULTY_UNKNOWN_MISSION: i32 = 100;
pub(crate) const MOD_KEEP: i32 = 10;
pub(crate) const MOD_CASTLE: i32 = 20;
pub(crate) const MOD_PER_ENEMY_ENFORCER: i32 = 10;
/// Garrison strength points per +1 difficulty.
pub(crate) const GARRISON_STRENGTH_PER_POINT: u32 = 5;
pub(crate) const MOD_PER_TARGET_PROWESS: i32 = 3;
pub(crate) const MOD_PER_TARGET_INTRIGUE: i32 = 3;
pub(crate) const MOD_PER_TARGET_AGENT_LEVEL: i32 = 5;
pub(crate) const MOD_TARGET_REVEALED: i32 = -15;
pub(crate) const MOD_PER_FRIENDLY_AGENT: i32 = -5;

// Outcome margins ----------------------------------------------------------
pub(crate) const MARGIN_CRITICAL: i32 = 30;
pub(crate) const MARGIN_COVERT_EXPOSED_SUCCESS: i32 = 15;
pub(crate) const MARGIN_SUCCESS: i32 = 0;
pub(crate) const MARGIN_ENFORCER_FAILURE: i32 = -15;
pub(crate) const MARGIN_COVERT_CLEAN_FAILURE: i32 = -10;
pub(crate) const MARGIN_COVERT_EXPOSED_FAILURE: i32 = -25;
pub const ROLL_MIN: u8 = 1;
pub const ROLL_MAX: u8 = 100;

// Agents -------------------------------------------------------------------
pub const AGENT_LEVEL_MIN: u8 = 1;
pub const AGENT_LEVEL_MAX: u8 = 10;

// Ledger defaults ----------------------------------------------------------
pub(crate) const DEFAULT_FACTION_SLOTS: u8 = 5;
pub(crate) const DEFAULT_REGION_BUILDS_PER_TURN: u32 = 1;
pub(crate) const DEFAULT_ARMY_MOVES_PER_TURN: u32 = 1;
pub(crate) const DEFAULT_AGENT_MOVES_PER_TURN: u32 = 2;
pub(crate) const DEFAULT_BASE_AGENT_ALLOWANCE: u32 = 1;
pub(crate) const DEFAULT_BASE_ARMY_CAP: u32 = 1;

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_LEDGER: &str = "realmkeeper::ledger";
pub(crate) const LOG_TARGET_MISSION: &str = "realmkeeper::mission";
