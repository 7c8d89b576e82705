//! Survival 21: two-player 21 with modifier cards and HP attrition.

pub mod game;
pub mod modifiers;

pub use game::{TwentyOneGame, TwentyOneOptions, TwentyOnePhase, TwentyOnePlayer};
pub use modifiers::{MODIFIER_POOL, Modifier, TABLE_EFFECT_LIMIT};

pub const ACTION_HIT: &str = "hit";
pub const ACTION_STAND: &str = "stand";
pub const ACTION_PLAY_MODIFIER: &str = "play_modifier";
pub const ACTION_STATUS: &str = "check_21_status";
pub const ACTION_MODIFIER_GUIDE: &str = "modifier_guide";
pub const ACTION_READ_OPPONENT: &str = "read_21_opponent_face_up";
pub const ACTION_READ_HAND: &str = "read_21_hand";
pub const ACTION_READ_BETS: &str = "read_21_bets";
pub const ACTION_READ_EFFECTS: &str = "read_21_active_effects";
