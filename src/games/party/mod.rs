//! Party judging game: prompt cards, submissions, and a rotating judge.

pub mod game;
pub mod packs;

pub use game::{JudgeSelection, PartyGame, PartyOptions, PartyPhase, PartyPlayer, Submission};
pub use packs::{AnswerCard, CardPack, PackRegistry, PromptCard, fill_in_blanks};

pub const ACTION_TOGGLE_CARD: &str = "toggle_card";
pub const ACTION_SUBMIT_CARDS: &str = "submit_cards";
pub const ACTION_JUDGE_PICK: &str = "judge_pick";
pub const ACTION_VIEW_PROMPT: &str = "view_prompt";
pub const ACTION_VIEW_SUBMISSION: &str = "view_submission";
pub const ACTION_VIEW_SCORES: &str = "view_scores";
