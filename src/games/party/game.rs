//! Party judging game: a judge reads a prompt card, everyone else submits
//! answer cards, the judge picks a winner. First to the winning score ends
//! the game.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::bot::BotScheduler;
use crate::game::actions::{self, ActionSpec, ActionView, InputOption, InputSpec, Visibility};
use crate::game::entities::{PlayerId, PlayerIdentity, runtime_rng};
use crate::game::{BotChoice, ConfigError, GameLogic, GameStatus, GameType};
use crate::table::messages::{MessageArgs, Outbox, TableMessage, margs};
use crate::table::result::{GameResult, PlayerResult};

use super::packs::{AnswerCard, PackRegistry, PromptCard, fill_in_blanks};
use super::{
    ACTION_JUDGE_PICK, ACTION_SUBMIT_CARDS, ACTION_TOGGLE_CARD, ACTION_VIEW_PROMPT,
    ACTION_VIEW_SCORES, ACTION_VIEW_SUBMISSION,
};

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 10;

/// Ticks between a round's winner announcement and the next round.
const ROUND_END_WAIT_TICKS: u32 = 100;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyPhase {
    Lobby,
    Submitting,
    Judging,
    RoundEnd,
    Finished,
}

impl PartyPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Submitting => "submitting",
            Self::Judging => "judging",
            Self::RoundEnd => "round_end",
            Self::Finished => "finished",
        }
    }
}

/// How the judge seat moves between rounds.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeSelection {
    #[default]
    Rotating,
    Random,
    MostRecentWinner,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PartyOptions {
    pub hand_size: usize,
    pub winning_score: u32,
    pub num_judges: usize,
    pub judge_selection: JudgeSelection,
    pub card_packs: Vec<String>,
}

impl Default for PartyOptions {
    fn default() -> Self {
        Self {
            hand_size: 10,
            winning_score: 5,
            num_judges: 1,
            judge_selection: JudgeSelection::Rotating,
            card_packs: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PartyPlayer {
    pub seat: PlayerIdentity,
    pub score: u32,
    pub hand: Vec<AnswerCard>,
    /// Submitted card texts, in selection order. `None` until submitted.
    pub submitted: Option<Vec<String>>,
    /// Hand indices currently selected, in selection order.
    pub selected: Vec<usize>,
}

impl PartyPlayer {
    #[must_use]
    pub fn new(seat: PlayerIdentity) -> Self {
        Self {
            seat,
            score: 0,
            hand: Vec::new(),
            submitted: None,
            selected: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Submission {
    pub player: PlayerId,
    pub cards: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PartyGame {
    pub options: PartyOptions,
    pub registry: PackRegistry,
    pub players: Vec<PartyPlayer>,
    pub status: GameStatus,
    pub phase: PartyPhase,
    pub prompt_deck: Vec<PromptCard>,
    pub answer_deck: Vec<AnswerCard>,
    pub prompt_discard: Vec<PromptCard>,
    pub answer_discard: Vec<AnswerCard>,
    pub current_prompt: Option<PromptCard>,
    /// Positions into the active-player list.
    pub judge_indices: Vec<usize>,
    pub last_winner_index: Option<usize>,
    pub submissions: Vec<Submission>,
    /// Shuffled presentation order: display index -> submissions index.
    pub submission_order: Vec<usize>,
    pub round_end_ticks: u32,
    pub round: u32,
    tick_count: u64,
    #[serde(skip)]
    bots: BotScheduler,
    #[serde(skip)]
    outbox: Outbox,
    #[serde(skip, default = "runtime_rng")]
    rng: StdRng,
}

impl PartyGame {
    #[must_use]
    pub fn new(options: PartyOptions, registry: PackRegistry) -> Self {
        Self {
            options,
            registry,
            players: Vec::new(),
            status: GameStatus::Lobby,
            phase: PartyPhase::Lobby,
            prompt_deck: Vec::new(),
            answer_deck: Vec::new(),
            prompt_discard: Vec::new(),
            answer_discard: Vec::new(),
            current_prompt: None,
            judge_indices: Vec::new(),
            last_winner_index: None,
            submissions: Vec::new(),
            submission_order: Vec::new(),
            round_end_ticks: 0,
            round: 0,
            tick_count: 0,
            bots: BotScheduler::default(),
            outbox: Outbox::default(),
            rng: runtime_rng(),
        }
    }

    #[must_use]
    pub fn with_seed(options: PartyOptions, registry: PackRegistry, seed: u64) -> Self {
        use rand::SeedableRng;
        let mut game = Self::new(options, registry);
        game.rng = StdRng::seed_from_u64(seed);
        game
    }

    pub fn add_player(&mut self, id: &str, name: &str, is_bot: bool) {
        self.players
            .push(PartyPlayer::new(PlayerIdentity::new(id, name, is_bot)));
    }

    // ------------------------------------------------------------------
    // Roster and judges
    // ------------------------------------------------------------------

    fn idx_of(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.seat.id == *id)
    }

    fn active_idxs(&self) -> Vec<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.seat.is_spectator)
            .map(|(i, _)| i)
            .collect()
    }

    fn is_judge(&self, i: usize) -> bool {
        let active = self.active_idxs();
        self.judge_indices
            .iter()
            .any(|&pos| active.get(pos) == Some(&i))
    }

    fn judge_player_idxs(&self) -> Vec<usize> {
        let active = self.active_idxs();
        self.judge_indices
            .iter()
            .filter_map(|&pos| active.get(pos).copied())
            .collect()
    }

    fn non_judge_idxs(&self) -> Vec<usize> {
        self.active_idxs()
            .into_iter()
            .filter(|&i| !self.is_judge(i))
            .collect()
    }

    fn select_judges(&mut self) {
        let active = self.active_idxs();
        // Always leave at least one non-judge.
        let num_judges = self
            .options
            .num_judges
            .min(active.len().saturating_sub(1))
            .max(1);

        match self.options.judge_selection {
            JudgeSelection::Random => {
                let mut positions: Vec<usize> = (0..active.len()).collect();
                positions.shuffle(&mut self.rng);
                positions.truncate(num_judges);
                self.judge_indices = positions;
            }
            JudgeSelection::MostRecentWinner => match self.last_winner_index {
                Some(winner_pos) if winner_pos < active.len() => {
                    self.judge_indices = vec![winner_pos];
                    while self.judge_indices.len() < num_judges {
                        let next = (self.judge_indices[self.judge_indices.len() - 1] + 1)
                            % active.len();
                        if self.judge_indices.contains(&next) {
                            break;
                        }
                        self.judge_indices.push(next);
                    }
                }
                _ => self.select_judges_rotating(active.len(), num_judges),
            },
            JudgeSelection::Rotating => self.select_judges_rotating(active.len(), num_judges),
        }
    }

    fn select_judges_rotating(&mut self, active_len: usize, num_judges: usize) {
        if self.judge_indices.is_empty() {
            self.judge_indices = vec![0];
        } else {
            let first = (self.judge_indices[0] + 1) % active_len;
            self.judge_indices = vec![first];
        }
        while self.judge_indices.len() < num_judges {
            let next = (self.judge_indices[self.judge_indices.len() - 1] + 1) % active_len;
            if self.judge_indices.contains(&next) {
                break;
            }
            self.judge_indices.push(next);
        }
    }

    // ------------------------------------------------------------------
    // Decks
    // ------------------------------------------------------------------

    fn build_decks(&mut self) {
        let (prompts, answers) = self.registry.build_decks(&self.options.card_packs);
        self.prompt_deck = prompts;
        self.answer_deck = answers;
        self.prompt_discard.clear();
        self.answer_discard.clear();
        self.prompt_deck.shuffle(&mut self.rng);
        self.answer_deck.shuffle(&mut self.rng);
    }

    fn draw_answer(&mut self) -> Option<AnswerCard> {
        if self.answer_deck.is_empty() && !self.answer_discard.is_empty() {
            self.answer_deck.append(&mut self.answer_discard);
            self.answer_deck.shuffle(&mut self.rng);
            self.outbox.broadcast("party-deck-reshuffled", margs![]);
        }
        self.answer_deck.pop()
    }

    fn draw_prompt(&mut self) -> Option<PromptCard> {
        if self.prompt_deck.is_empty() && !self.prompt_discard.is_empty() {
            self.prompt_deck.append(&mut self.prompt_discard);
            self.prompt_deck.shuffle(&mut self.rng);
            self.outbox
                .broadcast("party-prompt-deck-reshuffled", margs![]);
        }
        self.prompt_deck.pop()
    }

    fn deal_to_hand_size(&mut self, i: usize) {
        while self.players[i].hand.len() < self.options.hand_size {
            let Some(card) = self.draw_answer() else {
                break;
            };
            self.players[i].hand.push(card);
        }
    }

    fn required_picks(&self) -> usize {
        self.current_prompt.as_ref().map_or(1, |p| p.pick)
    }

    // ------------------------------------------------------------------
    // Action availability
    // ------------------------------------------------------------------

    fn is_submit_phase_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        if self.status != GameStatus::Playing {
            return Some("action-not-playing");
        }
        if self.phase != PartyPhase::Submitting {
            return Some("party-not-submitting");
        }
        let Some(i) = self.idx_of(player) else {
            return Some("action-unknown-player");
        };
        if self.players[i].seat.is_spectator {
            return Some("action-spectator");
        }
        if self.is_judge(i) {
            return Some("party-judge-cannot-submit");
        }
        if self.players[i].submitted.is_some() {
            return Some("party-already-submitted");
        }
        None
    }

    fn is_submit_phase_hidden(&self, player: &PlayerId) -> Visibility {
        if self.is_submit_phase_enabled(player).is_some() {
            Visibility::Hidden
        } else {
            Visibility::Visible
        }
    }

    fn is_judge_pick_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        if self.status != GameStatus::Playing {
            return Some("action-not-playing");
        }
        if self.phase != PartyPhase::Judging {
            return Some("party-not-judging");
        }
        let Some(i) = self.idx_of(player) else {
            return Some("action-unknown-player");
        };
        if !self.is_judge(i) {
            return Some("party-not-the-judge");
        }
        None
    }

    fn is_judge_pick_hidden(&self, player: &PlayerId) -> Visibility {
        if self.is_judge_pick_enabled(player).is_some() {
            Visibility::Hidden
        } else {
            Visibility::Visible
        }
    }

    fn is_view_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        if self.status != GameStatus::Playing {
            return Some("action-not-playing");
        }
        if self.idx_of(player).is_none() {
            return Some("action-unknown-player");
        }
        None
    }

    fn always_hidden(&self, _player: &PlayerId) -> Visibility {
        Visibility::Hidden
    }

    fn submit_label_args(&self, player: &PlayerId) -> MessageArgs {
        let selected = self
            .idx_of(player)
            .map_or(0, |i| self.players[i].selected.len());
        margs![("selected", selected), ("required", self.required_picks())]
    }

    fn hand_options(&self, player: &PlayerId) -> Vec<InputOption> {
        let Some(i) = self.idx_of(player) else {
            return Vec::new();
        };
        self.players[i]
            .hand
            .iter()
            .enumerate()
            .map(|(index, card)| InputOption {
                value: index.to_string(),
                label_key: "party-card-option",
                args: margs![("text", card.text.clone()), ("index", index)],
            })
            .collect()
    }

    fn bot_select_hand_card(
        &mut self,
        player: &PlayerId,
        options: &[InputOption],
    ) -> Option<String> {
        let i = self.idx_of(player)?;
        let available: Vec<usize> = (0..self.players[i].hand.len())
            .filter(|index| !self.players[i].selected.contains(index))
            .collect();
        if available.is_empty() {
            return options.first().map(|o| o.value.clone());
        }
        let pick = available[self.rng.random_range(0..available.len())];
        Some(pick.to_string())
    }

    fn submission_options(&self, player: &PlayerId) -> Vec<InputOption> {
        if self.idx_of(player).is_none() {
            return Vec::new();
        }
        let prompt_text = self
            .current_prompt
            .as_ref()
            .map_or("", |p| p.text.as_str());
        self.submission_order
            .iter()
            .enumerate()
            .filter_map(|(display, &actual)| {
                let submission = self.submissions.get(actual)?;
                Some(InputOption {
                    value: display.to_string(),
                    label_key: "party-submission-option",
                    args: margs![
                        ("index", display + 1),
                        ("text", fill_in_blanks(prompt_text, &submission.cards))
                    ],
                })
            })
            .collect()
    }

    fn bot_select_submission(
        &mut self,
        _player: &PlayerId,
        options: &[InputOption],
    ) -> Option<String> {
        if options.is_empty() {
            return None;
        }
        let pick = self.rng.random_range(0..options.len());
        Some(options[pick].value.clone())
    }

    fn registry_specs() -> Vec<ActionSpec<Self>> {
        vec![
            ActionSpec {
                id: ACTION_TOGGLE_CARD,
                label_key: "party-toggle-card",
                label_args: None,
                enabled: Self::is_submit_phase_enabled,
                hidden: Self::is_submit_phase_hidden,
                handler: Self::action_toggle_card,
                input: Some(InputSpec {
                    prompt_key: "party-select-card",
                    options: Self::hand_options,
                    bot_select: Self::bot_select_hand_card,
                }),
            },
            ActionSpec {
                id: ACTION_SUBMIT_CARDS,
                label_key: "party-submit-cards",
                label_args: Some(Self::submit_label_args),
                enabled: Self::is_submit_phase_enabled,
                hidden: Self::is_submit_phase_hidden,
                handler: Self::action_submit_cards,
                input: None,
            },
            ActionSpec {
                id: ACTION_JUDGE_PICK,
                label_key: "party-judge-pick",
                label_args: None,
                enabled: Self::is_judge_pick_enabled,
                hidden: Self::is_judge_pick_hidden,
                handler: Self::action_judge_pick,
                input: Some(InputSpec {
                    prompt_key: "party-select-submission",
                    options: Self::submission_options,
                    bot_select: Self::bot_select_submission,
                }),
            },
            ActionSpec {
                id: ACTION_VIEW_PROMPT,
                label_key: "party-view-prompt",
                label_args: None,
                enabled: Self::is_view_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_view_prompt,
                input: None,
            },
            ActionSpec {
                id: ACTION_VIEW_SUBMISSION,
                label_key: "party-view-submission",
                label_args: None,
                enabled: Self::is_view_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_view_submission,
                input: None,
            },
            ActionSpec {
                id: ACTION_VIEW_SCORES,
                label_key: "party-view-scores",
                label_args: None,
                enabled: Self::is_view_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_view_scores,
                input: None,
            },
        ]
    }

    // ------------------------------------------------------------------
    // Round flow
    // ------------------------------------------------------------------

    fn start_round(&mut self) {
        self.round += 1;
        self.phase = PartyPhase::Submitting;
        self.submissions.clear();
        self.submission_order.clear();

        for i in self.active_idxs() {
            self.players[i].submitted = None;
            self.players[i].selected.clear();
            self.deal_to_hand_size(i);
        }

        self.select_judges();

        let Some(prompt) = self.draw_prompt() else {
            self.outbox.broadcast("party-out-of-prompts", margs![]);
            self.end_game(None);
            return;
        };
        let pick = prompt.pick;
        let prompt_text = prompt.text.clone();
        self.current_prompt = Some(prompt);

        self.outbox
            .broadcast("party-round-start", margs![("round", self.round)]);

        let judges = self.judge_player_idxs();
        let judge_names: Vec<String> = judges
            .iter()
            .map(|&i| self.players[i].seat.name.clone())
            .collect();
        self.outbox.broadcast(
            "party-judge-is",
            margs![
                ("player", judge_names.join(", ")),
                ("count", judge_names.len())
            ],
        );

        self.outbox
            .broadcast("party-prompt", margs![("text", prompt_text)]);
        if pick > 1 {
            self.outbox
                .broadcast("party-prompt-pick", margs![("count", pick)]);
        }

        for i in self.non_judge_idxs() {
            let id = self.players[i].seat.id.clone();
            self.outbox
                .personal(id, "party-select-cards", margs![("count", pick)]);
        }

        let bots_to_jolt: Vec<PlayerId> = self
            .non_judge_idxs()
            .into_iter()
            .filter(|&i| self.players[i].seat.is_bot)
            .map(|i| self.players[i].seat.id.clone())
            .collect();
        for id in bots_to_jolt {
            let ticks = self.rng.random_range(20..=40);
            self.bots.jolt(id, ticks);
        }
        self.outbox.menu_refresh();
    }

    fn start_judging(&mut self) {
        self.phase = PartyPhase::Judging;

        self.submissions = self
            .non_judge_idxs()
            .into_iter()
            .filter_map(|i| {
                let p = &self.players[i];
                p.submitted.as_ref().map(|cards| Submission {
                    player: p.seat.id.clone(),
                    cards: cards.clone(),
                })
            })
            .collect();

        self.submission_order = (0..self.submissions.len()).collect();
        self.submission_order.shuffle(&mut self.rng);

        self.outbox.broadcast("party-judging-start", margs![]);

        let judge_bots: Vec<PlayerId> = self
            .judge_player_idxs()
            .into_iter()
            .filter(|&i| self.players[i].seat.is_bot)
            .map(|i| self.players[i].seat.id.clone())
            .collect();
        for id in judge_bots {
            let ticks = self.rng.random_range(30..=50);
            self.bots.jolt(id, ticks);
        }
        self.outbox.menu_refresh();
    }

    fn end_game(&mut self, winner: Option<usize>) {
        self.phase = PartyPhase::Finished;
        self.status = GameStatus::Finished;
        self.bots.clear();
        if let Some(i) = winner {
            let id = self.players[i].seat.id.clone();
            let score = self.players[i].score;
            self.outbox.personal_echo(
                id,
                "party-you-win",
                "party-game-winner",
                margs![("score", score)],
            );
        }
        self.outbox.finished();
        log::debug!("party: game over after {} rounds", self.round);
    }

    // ------------------------------------------------------------------
    // Player actions
    // ------------------------------------------------------------------

    fn action_toggle_card(&mut self, player: &PlayerId, input: Option<&str>) {
        if self.is_submit_phase_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let Some(index) = input.and_then(|s| s.parse::<usize>().ok()) else {
            return;
        };
        if index >= self.players[i].hand.len() {
            return;
        }

        let required = self.required_picks();
        let text = self.players[i].hand[index].text.clone();
        let p = &mut self.players[i];
        if let Some(position) = p.selected.iter().position(|&s| s == index) {
            p.selected.remove(position);
            let id = p.seat.id.clone();
            self.outbox
                .personal(id, "party-card-deselected", margs![("text", text)]);
        } else {
            if p.selected.len() >= required {
                // Selection is full; the oldest pick makes room.
                p.selected.remove(0);
            }
            p.selected.push(index);
            let count = p.selected.len();
            let id = p.seat.id.clone();
            self.outbox.personal(
                id,
                "party-card-selected",
                margs![("text", text), ("selected", count), ("required", required)],
            );
        }
        self.outbox.menu_refresh();
    }

    fn action_submit_cards(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_submit_phase_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let required = self.required_picks();
        if self.players[i].selected.len() != required {
            let id = self.players[i].seat.id.clone();
            self.outbox
                .personal(id, "party-wrong-card-count", margs![("count", required)]);
            return;
        }

        let discarded = {
            let p = &mut self.players[i];
            let submitted: Vec<String> = p
                .selected
                .iter()
                .filter_map(|&index| p.hand.get(index).map(|c| c.text.clone()))
                .collect();
            let mut indices = p.selected.clone();
            indices.sort_unstable_by(|a, b| b.cmp(a));
            let mut discarded = Vec::with_capacity(indices.len());
            for index in indices {
                if index < p.hand.len() {
                    discarded.push(p.hand.remove(index));
                }
            }
            p.submitted = Some(submitted);
            p.selected.clear();
            discarded
        };
        self.answer_discard.extend(discarded);

        let id = self.players[i].seat.id.clone();
        self.outbox.sound("game_party/submit.ogg");
        self.outbox.personal(id, "party-submitted", margs![]);

        let non_judges = self.non_judge_idxs();
        let submitted_count = non_judges
            .iter()
            .filter(|&&j| self.players[j].submitted.is_some())
            .count();
        let total = non_judges.len();
        self.outbox.broadcast(
            "party-submission-progress",
            margs![("submitted", submitted_count), ("total", total)],
        );
        self.outbox.menu_refresh();

        if submitted_count >= total {
            self.start_judging();
        }
    }

    fn action_judge_pick(&mut self, player: &PlayerId, input: Option<&str>) {
        if self.is_judge_pick_enabled(player).is_some() {
            return;
        }
        let Some(display) = input.and_then(|s| s.parse::<usize>().ok()) else {
            return;
        };
        let Some(&actual) = self.submission_order.get(display) else {
            return;
        };
        let Some(submission) = self.submissions.get(actual).cloned() else {
            return;
        };
        let Some(winner_idx) = self.idx_of(&submission.player) else {
            return;
        };

        self.players[winner_idx].score += 1;
        let active = self.active_idxs();
        self.last_winner_index = active.iter().position(|&i| i == winner_idx);

        let prompt_text = self
            .current_prompt
            .as_ref()
            .map_or(String::new(), |p| p.text.clone());
        let winner_name = self.players[winner_idx].seat.name.clone();
        let winner_score = self.players[winner_idx].score;

        self.outbox.sound("game_party/judgechoice.ogg");
        self.outbox.broadcast(
            "party-winner-announcement",
            margs![("player", winner_name.clone()), ("score", winner_score)],
        );
        self.outbox.broadcast(
            "party-submission-reveal",
            margs![
                ("player", winner_name),
                ("text", fill_in_blanks(&prompt_text, &submission.cards))
            ],
        );

        self.outbox.broadcast("party-all-submissions", margs![]);
        let others: Vec<(String, String)> = self
            .submissions
            .iter()
            .filter(|s| s.player != submission.player)
            .filter_map(|s| {
                let idx = self.idx_of(&s.player)?;
                Some((
                    self.players[idx].seat.name.clone(),
                    fill_in_blanks(&prompt_text, &s.cards),
                ))
            })
            .collect();
        for (name, text) in others {
            self.outbox.broadcast(
                "party-submission-reveal",
                margs![("player", name), ("text", text)],
            );
        }

        if self.players[winner_idx].score >= self.options.winning_score {
            self.end_game(Some(winner_idx));
            return;
        }

        self.phase = PartyPhase::RoundEnd;
        self.round_end_ticks = ROUND_END_WAIT_TICKS;
        if let Some(prompt) = self.current_prompt.take() {
            self.prompt_discard.push(prompt);
        }
        self.outbox.menu_refresh();
    }

    fn action_view_prompt(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_view_enabled(player).is_some() {
            return;
        }
        let Some(prompt) = &self.current_prompt else {
            return;
        };
        let text = prompt.text.clone();
        self.outbox
            .personal(player.clone(), "party-prompt", margs![("text", text)]);
    }

    fn action_view_submission(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_view_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let Some(prompt) = &self.current_prompt else {
            self.outbox
                .personal(player.clone(), "party-select-cards-first", margs![]);
            return;
        };
        let p = &self.players[i];
        if let Some(cards) = &p.submitted {
            let text = fill_in_blanks(&prompt.text, cards);
            self.outbox
                .personal(player.clone(), "party-your-submission", margs![("text", text)]);
        } else if !p.selected.is_empty() {
            let cards: Vec<String> = p
                .selected
                .iter()
                .filter_map(|&index| p.hand.get(index).map(|c| c.text.clone()))
                .collect();
            let text = fill_in_blanks(&prompt.text, &cards);
            self.outbox.personal(
                player.clone(),
                "party-preview-submission",
                margs![("text", text)],
            );
        } else {
            self.outbox
                .personal(player.clone(), "party-select-cards-first", margs![]);
        }
    }

    fn action_view_scores(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_view_enabled(player).is_some() {
            return;
        }
        let mut standings: Vec<(String, u32)> = self
            .active_idxs()
            .into_iter()
            .map(|i| (self.players[i].seat.name.clone(), self.players[i].score))
            .collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1));
        for (name, score) in standings {
            self.outbox.personal(
                player.clone(),
                "party-score-line",
                margs![("player", name), ("score", score)],
            );
        }
    }
}

impl GameLogic for PartyGame {
    fn game_type(&self) -> GameType {
        GameType::Party
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn phase_name(&self) -> &'static str {
        self.phase.as_str()
    }

    fn prestart_validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let seats = self.active_idxs().len();
        if seats < MIN_PLAYERS {
            errors.push(ConfigError::NotEnoughPlayers {
                required: MIN_PLAYERS,
            });
        }
        if seats > MAX_PLAYERS {
            errors.push(ConfigError::TooManyPlayers { max: MAX_PLAYERS });
        }
        if self.options.card_packs.is_empty() {
            errors.push(ConfigError::NoCardPacks);
        } else {
            let (prompts, answers) = self.registry.build_decks(&self.options.card_packs);
            if prompts.is_empty() {
                errors.push(ConfigError::NoPromptCards);
            }
            if answers.len() < self.options.hand_size {
                errors.push(ConfigError::NotEnoughAnswerCards);
            }
        }
        errors
    }

    fn on_start(&mut self) {
        self.status = GameStatus::Playing;
        self.round = 0;
        self.judge_indices.clear();
        self.last_winner_index = None;
        self.build_decks();

        for i in self.active_idxs() {
            let p = &mut self.players[i];
            p.score = 0;
            p.hand.clear();
            p.submitted = None;
            p.selected.clear();
        }

        self.outbox.broadcast("party-game-starting", margs![]);
        self.outbox.broadcast(
            "party-dealing-cards",
            margs![("count", self.options.hand_size)],
        );
        for i in self.active_idxs() {
            self.deal_to_hand_size(i);
        }
        self.start_round();
    }

    fn on_tick(&mut self) {
        self.tick_count += 1;
        if self.status != GameStatus::Playing {
            return;
        }

        if self.phase == PartyPhase::RoundEnd {
            if self.round_end_ticks > 0 {
                self.round_end_ticks -= 1;
            }
            if self.round_end_ticks == 0 {
                self.start_round();
            }
            return;
        }

        if !matches!(self.phase, PartyPhase::Submitting | PartyPhase::Judging) {
            return;
        }
        for id in self.bots.on_tick() {
            if let Some(choice) = self.bot_think(&id) {
                self.execute_action(&id, &choice.action, choice.input.as_deref());
            }
            // Submitters keep picking one card per thought until done.
            if self.phase == PartyPhase::Submitting
                && let Some(i) = self.idx_of(&id)
                && self.players[i].seat.is_bot
                && self.players[i].submitted.is_none()
                && !self.is_judge(i)
            {
                let ticks = self.rng.random_range(5..=10);
                self.bots.jolt(id, ticks);
            }
        }
    }

    fn execute_action(&mut self, player: &PlayerId, action_id: &str, input: Option<&str>) {
        let Some(i) = self.idx_of(player) else {
            log::warn!("party: action {action_id} from unknown player {player}");
            return;
        };
        let is_bot = self.players[i].seat.is_bot;
        let registry = Self::registry_specs();
        match actions::dispatch(self, &registry, player, action_id, input, is_bot) {
            actions::DispatchResult::Handled => {}
            actions::DispatchResult::NeedsInput { prompt_key, options } => {
                self.outbox
                    .input_request(player.clone(), action_id, prompt_key, options);
            }
            actions::DispatchResult::Rejected(reason) => {
                log::debug!("party: rejected {action_id} from {player}: {reason}");
            }
            actions::DispatchResult::Unknown => {
                log::warn!("party: unknown action id {action_id}");
            }
        }
    }

    fn visible_actions(&self, player: &PlayerId) -> Vec<ActionView> {
        actions::visible_actions(self, &Self::registry_specs(), player)
    }

    fn bot_think(&mut self, player: &PlayerId) -> Option<BotChoice> {
        let i = self.idx_of(player)?;
        match self.phase {
            PartyPhase::Submitting if !self.is_judge(i) => {
                let p = &self.players[i];
                if p.submitted.is_some() {
                    return None;
                }
                let required = self.required_picks();
                if self.players[i].selected.len() < required {
                    return Some(BotChoice::plain(ACTION_TOGGLE_CARD));
                }
                Some(BotChoice::plain(ACTION_SUBMIT_CARDS))
            }
            PartyPhase::Judging if self.is_judge(i) => {
                if self.submission_order.is_empty() {
                    return None;
                }
                Some(BotChoice::plain(ACTION_JUDGE_PICK))
            }
            _ => None,
        }
    }

    fn drain_messages(&mut self) -> VecDeque<TableMessage> {
        self.outbox.drain()
    }

    fn build_game_result(&self) -> GameResult {
        let active = self.active_idxs();
        let winner = active.iter().copied().max_by_key(|&i| self.players[i].score);
        let final_scores: serde_json::Map<String, serde_json::Value> = active
            .iter()
            .map(|&i| {
                let p = &self.players[i];
                (p.seat.name.clone(), serde_json::json!(p.score))
            })
            .collect();

        GameResult {
            game_type: GameType::Party,
            timestamp: chrono::Utc::now(),
            duration_ticks: self.tick_count,
            player_results: active
                .iter()
                .map(|&i| {
                    let p = &self.players[i];
                    PlayerResult {
                        player_id: p.seat.id.clone(),
                        player_name: p.seat.name.clone(),
                        is_bot: p.seat.is_bot,
                    }
                })
                .collect(),
            payload: serde_json::json!({
                "winner_name": winner.map(|i| self.players[i].seat.name.clone()),
                "winner_score": winner.map_or(0, |i| self.players[i].score),
                "final_scores": final_scores,
                "rounds_played": self.round,
            }),
        }
    }

    fn rebuild_runtime_state(&mut self) {
        self.bots.clear();
        if self.status != GameStatus::Playing {
            return;
        }
        match self.phase {
            PartyPhase::Submitting => {
                let pending: Vec<PlayerId> = self
                    .non_judge_idxs()
                    .into_iter()
                    .filter(|&i| {
                        self.players[i].seat.is_bot && self.players[i].submitted.is_none()
                    })
                    .map(|i| self.players[i].seat.id.clone())
                    .collect();
                for id in pending {
                    let ticks = self.rng.random_range(20..=40);
                    self.bots.jolt(id, ticks);
                }
            }
            PartyPhase::Judging => {
                let judges: Vec<PlayerId> = self
                    .judge_player_idxs()
                    .into_iter()
                    .filter(|&i| self.players[i].seat.is_bot)
                    .map(|i| self.players[i].seat.id.clone())
                    .collect();
                for id in judges {
                    let ticks = self.rng.random_range(30..=50);
                    self.bots.jolt(id, ticks);
                }
            }
            _ => {}
        }
    }

    fn snapshot_integrity(&self) -> Result<(), &'static str> {
        let active_len = self.active_idxs().len();
        if self.judge_indices.iter().any(|&pos| pos >= active_len) {
            return Err("judge index out of range");
        }
        if self
            .submission_order
            .iter()
            .any(|&idx| idx >= self.submissions.len())
        {
            return Err("submission order references a missing submission");
        }
        Ok(())
    }
}
