//! Blackjack: the reference game instance.

mod bot;
pub mod game;
pub mod options;

pub use game::{BlackjackGame, BlackjackPhase, BlackjackPlayer, HandSlot};
pub use options::{BlackjackOptions, BlackjackPayout, DoubleDownRule, RulesProfile, SplitRule};

pub const ACTION_HIT: &str = "hit";
pub const ACTION_STAND: &str = "stand";
pub const ACTION_DOUBLE_DOWN: &str = "double_down";
pub const ACTION_SPLIT: &str = "split";
pub const ACTION_SURRENDER: &str = "surrender";
pub const ACTION_TAKE_INSURANCE: &str = "take_insurance";
pub const ACTION_EVEN_MONEY: &str = "even_money";
pub const ACTION_DECLINE_INSURANCE: &str = "decline_insurance";
pub const ACTION_READ_HAND: &str = "read_hand";
pub const ACTION_READ_DEALER: &str = "read_dealer";
pub const ACTION_TABLE_STATUS: &str = "table_status";
pub const ACTION_READ_RULES: &str = "read_rules";
pub const ACTION_CHECK_TURN_TIMER: &str = "check_turn_timer";
