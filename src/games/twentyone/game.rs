//! Survival 21: a two-player race to empty the opponent's HP, played as
//! repeated rounds of 21 with tactical modifier cards.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::bot::BotScheduler;
use crate::game::actions::{self, ActionSpec, ActionView, InputOption, InputSpec, Visibility};
use crate::game::entities::{
    Card, CardId, Deck, DeckFactory, PlayerId, PlayerIdentity, runtime_rng,
};
use crate::game::turns::TurnOrder;
use crate::game::{BotChoice, ConfigError, GameLogic, GameStatus, GameType};
use crate::table::messages::{Outbox, TableMessage, margs};
use crate::table::result::{GameResult, PlayerResult};

use super::modifiers::{MODIFIER_POOL, Modifier, TABLE_EFFECT_LIMIT};
use super::{
    ACTION_HIT, ACTION_MODIFIER_GUIDE, ACTION_PLAY_MODIFIER, ACTION_READ_BETS,
    ACTION_READ_EFFECTS, ACTION_READ_HAND, ACTION_READ_OPPONENT, ACTION_STAND, ACTION_STATUS,
};

pub const REQUIRED_PLAYERS: usize = 2;

/// Ranks in each round deck run 1..=11; totals are raw rank sums.
const ROUND_DECK_MAX_RANK: u8 = 11;
const DEFAULT_TARGET: u32 = 21;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TwentyOnePhase {
    Lobby,
    Turns,
    BetweenRounds,
    Finished,
}

impl TwentyOnePhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Turns => "turns",
            Self::BetweenRounds => "between_rounds",
            Self::Finished => "finished",
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TwentyOneOptions {
    pub starting_health: u32,
    pub base_bet: u32,
    pub starting_modifiers_per_round: u32,
    pub draw_modifier_chance_percent: u32,
    pub deck_count: u32,
    pub next_round_wait_ticks: u32,
}

impl Default for TwentyOneOptions {
    fn default() -> Self {
        Self {
            starting_health: 10,
            base_bet: 1,
            starting_modifiers_per_round: 1,
            draw_modifier_chance_percent: 35,
            deck_count: 1,
            next_round_wait_ticks: 30,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TwentyOnePlayer {
    pub seat: PlayerIdentity,
    pub hp: u32,
    pub hand: Vec<Card>,
    pub modifiers: Vec<Modifier>,
    pub table_modifiers: Vec<Modifier>,
    pub stand_pending: bool,
    pub last_drawn_card_id: Option<CardId>,
}

impl TwentyOnePlayer {
    #[must_use]
    pub fn new(seat: PlayerIdentity) -> Self {
        Self {
            seat,
            hp: 0,
            hand: Vec::new(),
            modifiers: Vec::new(),
            table_modifiers: Vec::new(),
            stand_pending: false,
            last_drawn_card_id: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RoundOutcome {
    FirstWins,
    SecondWins,
    Draw,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TwentyOneGame {
    pub options: TwentyOneOptions,
    pub players: Vec<TwentyOnePlayer>,
    pub status: GameStatus,
    pub phase: TwentyOnePhase,
    pub deck: Deck,
    pub round_number: u32,
    pub round_starter_index: usize,
    pub next_round_wait_ticks: u32,
    pub turn_order: TurnOrder,
    tick_count: u64,
    #[serde(skip)]
    bots: BotScheduler,
    #[serde(skip)]
    outbox: Outbox,
    #[serde(skip, default = "runtime_rng")]
    rng: StdRng,
}

impl TwentyOneGame {
    #[must_use]
    pub fn new(options: TwentyOneOptions) -> Self {
        Self {
            options,
            players: Vec::new(),
            status: GameStatus::Lobby,
            phase: TwentyOnePhase::Lobby,
            deck: Deck::default(),
            round_number: 0,
            round_starter_index: 0,
            next_round_wait_ticks: 0,
            turn_order: TurnOrder::default(),
            tick_count: 0,
            bots: BotScheduler::default(),
            outbox: Outbox::default(),
            rng: runtime_rng(),
        }
    }

    #[must_use]
    pub fn with_seed(options: TwentyOneOptions, seed: u64) -> Self {
        use rand::SeedableRng;
        let mut game = Self::new(options);
        game.rng = StdRng::seed_from_u64(seed);
        game
    }

    pub fn add_player(&mut self, id: &str, name: &str, is_bot: bool) {
        self.players
            .push(TwentyOnePlayer::new(PlayerIdentity::new(id, name, is_bot)));
    }

    // ------------------------------------------------------------------
    // Roster helpers
    // ------------------------------------------------------------------

    fn idx_of(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.seat.id == *id)
    }

    fn alive_idxs(&self) -> Vec<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.seat.is_spectator && p.hp > 0)
            .map(|(i, _)| i)
            .collect()
    }

    fn opponent_of(&self, i: usize) -> Option<usize> {
        self.alive_idxs().into_iter().find(|&other| other != i)
    }

    fn current_player_idx(&self) -> Option<usize> {
        self.turn_order.current().and_then(|id| self.idx_of(id))
    }

    // ------------------------------------------------------------------
    // Round state helpers
    // ------------------------------------------------------------------

    fn hand_total(&self, i: usize) -> u32 {
        self.players[i]
            .hand
            .iter()
            .map(|c| u32::from(c.rank))
            .sum()
    }

    fn opponent_visible_cards(&self, i: usize) -> &[Card] {
        let hand = &self.players[i].hand;
        if hand.len() <= 1 { &[] } else { &hand[1..] }
    }

    fn both_standing(&self) -> bool {
        let alive = self.alive_idxs();
        alive.len() >= 2 && alive.iter().all(|&i| self.players[i].stand_pending)
    }

    fn clear_pending_stands(&mut self) {
        for i in self.alive_idxs() {
            self.players[i].stand_pending = false;
        }
    }

    /// Round target: the most recent target effect anywhere on the table,
    /// else 21. Target modifiers are exclusive, so at most one exists.
    pub(crate) fn current_target(&self) -> u32 {
        for i in self.alive_idxs() {
            for modifier in self.players[i].table_modifiers.iter().rev() {
                if let Some(value) = modifier.target_value() {
                    return value;
                }
            }
        }
        DEFAULT_TARGET
    }

    /// Round-loss damage this player would take: the base bet plus the
    /// opponent's raise effects, less this player's guard effects.
    pub(crate) fn current_bet(&self, i: usize) -> u32 {
        let base = self.options.base_bet;
        let Some(opponent) = self.opponent_of(i) else {
            return base;
        };
        let increase: u32 = self.players[opponent]
            .table_modifiers
            .iter()
            .map(|m| m.damage_increase())
            .sum();
        let reduction: u32 = self.players[i]
            .table_modifiers
            .iter()
            .map(|m| m.damage_reduction())
            .sum();
        (base + increase).saturating_sub(reduction)
    }

    fn modifiers_locked_for(&self, i: usize) -> bool {
        self.opponent_of(i).is_some_and(|opponent| {
            self.players[opponent]
                .table_modifiers
                .contains(&Modifier::Lockdown)
        })
    }

    fn is_modifier_playable(&self, i: usize, modifier: Modifier) -> bool {
        if self.modifiers_locked_for(i) {
            return false;
        }
        if modifier.is_table_effect() {
            if modifier.target_value().is_some() {
                return true;
            }
            return self.players[i].table_modifiers.len() < TABLE_EFFECT_LIMIT;
        }
        let Some(opponent) = self.opponent_of(i) else {
            return false;
        };
        match modifier {
            Modifier::Scrap | Modifier::Recycle => self.peek_last_drawn(opponent).is_some(),
            Modifier::BreakEffect | Modifier::BreakAll => {
                !self.players[opponent].table_modifiers.is_empty()
            }
            _ => true,
        }
    }

    fn place_table_effect(&mut self, i: usize, modifier: Modifier) {
        if modifier.target_value().is_some() {
            // Target effects replace older target effects table-wide.
            for idx in self.alive_idxs() {
                self.players[idx]
                    .table_modifiers
                    .retain(|m| m.target_value().is_none());
            }
        }
        self.players[i].table_modifiers.push(modifier);
        while self.players[i].table_modifiers.len() > TABLE_EFFECT_LIMIT {
            let expired = self.players[i].table_modifiers.remove(0);
            let name = self.players[i].seat.name.clone();
            self.outbox.broadcast(
                "twentyone-effect-expires",
                margs![("player", name), ("effect", expired.label_key())],
            );
        }
    }

    fn trigger_salvage_rewards(&mut self) {
        for i in self.alive_idxs() {
            if self.players[i].table_modifiers.contains(&Modifier::Salvage) {
                self.give_random_modifiers(i, 1, true);
            }
        }
    }

    // ------------------------------------------------------------------
    // Deck helpers
    // ------------------------------------------------------------------

    fn build_round_deck(&mut self) {
        let id_base = CardId::from(self.round_number) * 1000;
        self.deck = DeckFactory::numeric_deck(ROUND_DECK_MAX_RANK, self.options.deck_count, id_base);
        self.deck.shuffle(&mut self.rng);
    }

    fn draw_card(&mut self) -> Option<Card> {
        self.deck.draw()
    }

    fn draw_specific_rank(&mut self, rank: u8) -> Option<Card> {
        let index = self.deck.iter().position(|c| c.rank == rank)?;
        self.deck.remove(index)
    }

    /// Best available card for the player's current total: the highest card
    /// that stays at or under the target, else the card landing closest to
    /// the target.
    fn draw_best_possible_card(&mut self, i: usize) -> Option<Card> {
        if self.deck.is_empty() {
            return None;
        }
        let target = self.current_target();
        let current = self.hand_total(i);
        let mut best_index: Option<usize> = None;
        let mut best_value = 0u32;
        let mut fallback_index = 0usize;
        let mut fallback_distance = u32::MAX;
        for (index, card) in self.deck.iter().enumerate() {
            let value = u32::from(card.rank);
            let projected = current + value;
            if projected <= target && value > best_value {
                best_value = value;
                best_index = Some(index);
            }
            let distance = projected.abs_diff(target);
            if distance < fallback_distance {
                fallback_distance = distance;
                fallback_index = index;
            }
        }
        self.deck.remove(best_index.unwrap_or(fallback_index))
    }

    fn add_card_to_hand(
        &mut self,
        i: usize,
        card: Card,
        announce_key: Option<&'static str>,
        reveal_to_others: bool,
    ) {
        self.players[i].hand.push(card);
        self.players[i].last_drawn_card_id = reveal_to_others.then_some(card.id);
        if let Some(key) = announce_key {
            let id = self.players[i].seat.id.clone();
            let name = self.players[i].seat.name.clone();
            if reveal_to_others {
                self.outbox
                    .broadcast(key, margs![("player", name), ("card", card)]);
            } else {
                self.outbox
                    .personal(id.clone(), "twentyone-you-draw-hidden", margs![("card", card)]);
                self.outbox.broadcast_except(
                    "twentyone-player-draws-hidden",
                    margs![("player", name)],
                    id,
                );
            }
        }
    }

    fn peek_last_drawn(&self, i: usize) -> Option<Card> {
        let wanted = self.players[i].last_drawn_card_id?;
        self.players[i]
            .hand
            .iter()
            .copied()
            .find(|c| c.id == wanted)
    }

    fn extract_last_drawn(&mut self, i: usize) -> Option<Card> {
        let wanted = self.players[i].last_drawn_card_id?;
        let position = self.players[i].hand.iter().position(|c| c.id == wanted)?;
        let removed = self.players[i].hand.remove(position);
        self.players[i].last_drawn_card_id = None;
        Some(removed)
    }

    fn return_cards_to_deck_top(&mut self, cards: Vec<Card>) {
        if !cards.is_empty() {
            self.deck.add_top(cards);
        }
    }

    fn give_random_modifiers(&mut self, i: usize, count: u32, announce: bool) {
        for _ in 0..count {
            let Some(&modifier) = MODIFIER_POOL.choose(&mut self.rng) else {
                return;
            };
            self.players[i].modifiers.push(modifier);
            if announce {
                let id = self.players[i].seat.id.clone();
                let name = self.players[i].seat.name.clone();
                self.outbox.personal(
                    id.clone(),
                    "twentyone-you-gain-modifier",
                    margs![("modifier", modifier.label_key())],
                );
                self.outbox.broadcast_except(
                    "twentyone-player-gains-modifier",
                    margs![("player", name)],
                    id,
                );
            }
        }
    }

    fn discard_random_modifiers(&mut self, i: usize, count: u32) {
        let count = (count as usize).min(self.players[i].modifiers.len());
        for _ in 0..count {
            let index = self.rng.random_range(0..self.players[i].modifiers.len());
            self.players[i].modifiers.remove(index);
        }
    }

    // ------------------------------------------------------------------
    // Action availability
    // ------------------------------------------------------------------

    fn is_turn_action_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        if self.status != GameStatus::Playing {
            return Some("action-not-playing");
        }
        if self.phase != TwentyOnePhase::Turns {
            return Some("action-not-available");
        }
        let Some(i) = self.idx_of(player) else {
            return Some("action-unknown-player");
        };
        if self.players[i].seat.is_spectator {
            return Some("action-spectator");
        }
        if self.turn_order.current() != Some(player) {
            return Some("action-not-your-turn");
        }
        None
    }

    fn is_turn_action_hidden(&self, player: &PlayerId) -> Visibility {
        if self.is_turn_action_enabled(player).is_some() {
            Visibility::Hidden
        } else {
            Visibility::Visible
        }
    }

    fn is_play_modifier_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        self.is_turn_action_enabled(player).or_else(|| {
            let i = self.idx_of(player)?;
            if self.modifiers_locked_for(i) || self.players[i].modifiers.is_empty() {
                Some("action-not-available")
            } else {
                None
            }
        })
    }

    fn is_play_modifier_hidden(&self, player: &PlayerId) -> Visibility {
        if self.is_play_modifier_enabled(player).is_some() {
            Visibility::Hidden
        } else {
            Visibility::Visible
        }
    }

    fn is_check_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        if self.status != GameStatus::Playing {
            return Some("action-not-playing");
        }
        let Some(i) = self.idx_of(player) else {
            return Some("action-unknown-player");
        };
        if self.players[i].seat.is_spectator {
            return Some("action-spectator");
        }
        None
    }

    fn always_hidden(&self, _player: &PlayerId) -> Visibility {
        Visibility::Hidden
    }

    fn modifier_options(&self, player: &PlayerId) -> Vec<InputOption> {
        let Some(i) = self.idx_of(player) else {
            return Vec::new();
        };
        self.players[i]
            .modifiers
            .iter()
            .enumerate()
            .map(|(index, modifier)| InputOption {
                value: index.to_string(),
                label_key: modifier.label_key(),
                args: margs![("help", modifier.help_key())],
            })
            .collect()
    }

    fn bot_select_modifier(&mut self, player: &PlayerId, options: &[InputOption]) -> Option<String> {
        let i = self.idx_of(player)?;
        let opponent = self.opponent_of(i)?;
        let target = self.current_target();
        let my_total = self.hand_total(i);
        let opp_total = self.hand_total(opponent);
        let me = &self.players[i];
        let opp = &self.players[opponent];

        let mut preferred: Vec<Modifier> = Vec::new();
        if me.modifiers.contains(&Modifier::Lockdown) && !opp.modifiers.is_empty() {
            preferred.push(Modifier::Lockdown);
        }
        if my_total > target {
            for m in [Modifier::Target24, Modifier::Target27] {
                if me.modifiers.contains(&m) {
                    preferred.push(m);
                }
            }
        }
        if my_total < target {
            for m in [
                Modifier::PrecisionDraw,
                Modifier::PrecisionDrawPlus,
                Modifier::PrimeDraw,
            ] {
                if me.modifiers.contains(&m) {
                    preferred.push(m);
                }
            }
        }
        if me.hp <= opp.hp {
            for m in [Modifier::GuardPlus, Modifier::Guard] {
                if me.modifiers.contains(&m) {
                    preferred.push(m);
                }
            }
        }
        if opp_total + 1 >= target {
            for m in [Modifier::Raise2Plus, Modifier::Raise2, Modifier::Raise1] {
                if me.modifiers.contains(&m) {
                    preferred.push(m);
                }
            }
        }

        let pick_index = |modifier: Modifier| {
            self.players[i]
                .modifiers
                .iter()
                .position(|&m| m == modifier)
        };
        for modifier in preferred {
            if self.is_modifier_playable(i, modifier)
                && let Some(index) = pick_index(modifier)
            {
                return Some(index.to_string());
            }
        }
        for (index, &modifier) in self.players[i].modifiers.iter().enumerate() {
            if self.is_modifier_playable(i, modifier) {
                return Some(index.to_string());
            }
        }
        options.first().map(|o| o.value.clone())
    }

    fn registry() -> Vec<ActionSpec<Self>> {
        vec![
            ActionSpec {
                id: ACTION_HIT,
                label_key: "blackjack-hit",
                label_args: None,
                enabled: Self::is_turn_action_enabled,
                hidden: Self::is_turn_action_hidden,
                handler: Self::action_hit,
                input: None,
            },
            ActionSpec {
                id: ACTION_STAND,
                label_key: "blackjack-stand",
                label_args: None,
                enabled: Self::is_turn_action_enabled,
                hidden: Self::is_turn_action_hidden,
                handler: Self::action_stand,
                input: None,
            },
            ActionSpec {
                id: ACTION_PLAY_MODIFIER,
                label_key: "twentyone-play-modifier",
                label_args: None,
                enabled: Self::is_play_modifier_enabled,
                hidden: Self::is_play_modifier_hidden,
                handler: Self::action_play_modifier,
                input: Some(InputSpec {
                    prompt_key: "twentyone-select-modifier",
                    options: Self::modifier_options,
                    bot_select: Self::bot_select_modifier,
                }),
            },
            ActionSpec {
                id: ACTION_STATUS,
                label_key: "twentyone-check-status",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_check_status,
                input: None,
            },
            ActionSpec {
                id: ACTION_MODIFIER_GUIDE,
                label_key: "twentyone-modifier-guide",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_modifier_guide,
                input: None,
            },
            ActionSpec {
                id: ACTION_READ_OPPONENT,
                label_key: "twentyone-read-opponent",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_read_opponent,
                input: None,
            },
            ActionSpec {
                id: ACTION_READ_HAND,
                label_key: "twentyone-read-hand",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_read_hand,
                input: None,
            },
            ActionSpec {
                id: ACTION_READ_BETS,
                label_key: "twentyone-read-bets",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_read_bets,
                input: None,
            },
            ActionSpec {
                id: ACTION_READ_EFFECTS,
                label_key: "twentyone-read-effects",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_read_effects,
                input: None,
            },
        ]
    }

    // ------------------------------------------------------------------
    // Round flow
    // ------------------------------------------------------------------

    fn start_round(&mut self, rotate_starter: bool) {
        let alive = self.alive_idxs();
        if alive.len() <= 1 {
            self.end_game(alive.first().copied());
            return;
        }

        if rotate_starter {
            self.round_starter_index = (self.round_starter_index + 1) % alive.len();
        }
        if self.round_starter_index >= alive.len() {
            self.round_starter_index = 0;
        }

        self.phase = TwentyOnePhase::Turns;
        self.round_number += 1;
        self.build_round_deck();

        for &i in &alive {
            let p = &mut self.players[i];
            p.hand.clear();
            p.table_modifiers.clear();
            p.stand_pending = false;
            p.last_drawn_card_id = None;
        }
        let starting_modifiers = self.options.starting_modifiers_per_round;
        for &i in &alive {
            self.give_random_modifiers(i, starting_modifiers, false);
        }

        // First card stays hidden; the second is face-up.
        for deal_round in 0..2 {
            for &i in &alive {
                if let Some(card) = self.draw_card() {
                    self.add_card_to_hand(i, card, None, deal_round > 0);
                }
            }
        }

        let order: Vec<PlayerId> = alive
            .iter()
            .map(|&i| self.players[i].seat.id.clone())
            .collect();
        self.turn_order.set(order, true);
        self.turn_order.set_index(self.round_starter_index);

        self.outbox.broadcast(
            "twentyone-round-begins",
            margs![
                ("round", self.round_number),
                ("target", self.current_target())
            ],
        );
        for &i in &alive {
            let name = self.players[i].seat.name.clone();
            if let Some(shown) = self.peek_last_drawn(i) {
                self.outbox.broadcast(
                    "twentyone-player-shows",
                    margs![("player", name), ("card", shown)],
                );
            } else {
                self.outbox
                    .broadcast("twentyone-player-receives-cards", margs![("player", name)]);
            }
            let id = self.players[i].seat.id.clone();
            if let Some(&hidden) = self.players[i].hand.first() {
                self.outbox.personal(
                    id.clone(),
                    "twentyone-your-hidden-card",
                    margs![("card", hidden)],
                );
            }
            self.outbox.personal(
                id.clone(),
                "twentyone-your-total",
                margs![("total", self.hand_total(i))],
            );
            let labels: Vec<&'static str> = self.players[i]
                .modifiers
                .iter()
                .map(|m| m.label_key())
                .collect();
            self.outbox
                .personal(id, "twentyone-your-modifiers", margs![("modifiers", labels)]);
        }

        self.announce_turn_and_jolt();
        self.outbox.menu_refresh();
    }

    fn announce_turn_and_jolt(&mut self) {
        if let Some(i) = self.current_player_idx() {
            let name = self.players[i].seat.name.clone();
            self.outbox
                .broadcast("game-turn-start", margs![("player", name)]);
            if self.players[i].seat.is_bot {
                let ticks = self.rng.random_range(8..=16);
                let id = self.players[i].seat.id.clone();
                self.bots.jolt(id, ticks);
            }
        }
    }

    fn advance_turn_after_action(&mut self) {
        if self.phase != TwentyOnePhase::Turns {
            return;
        }
        self.turn_order.advance();
        self.announce_turn_and_jolt();
        self.outbox.menu_refresh();
    }

    fn settle_round(&mut self) {
        let alive = self.alive_idxs();
        if alive.len() < 2 {
            self.end_game(alive.first().copied());
            return;
        }

        self.phase = TwentyOnePhase::BetweenRounds;
        let (first, second) = (alive[0], alive[1]);
        let target = self.current_target();
        let total_1 = self.hand_total(first);
        let total_2 = self.hand_total(second);
        let bust_1 = total_1 > target;
        let bust_2 = total_2 > target;

        let name_1 = self.players[first].seat.name.clone();
        let name_2 = self.players[second].seat.name.clone();
        self.outbox.broadcast(
            "twentyone-round-totals",
            margs![
                ("target", target),
                ("player1", name_1.clone()),
                ("total1", total_1),
                ("player2", name_2.clone()),
                ("total2", total_2)
            ],
        );

        match Self::resolve_round_outcome(total_1, total_2, target) {
            RoundOutcome::FirstWins => {
                self.apply_round_loss_damage(second);
                self.outbox
                    .broadcast("twentyone-round-winner", margs![("player", name_1.clone())]);
            }
            RoundOutcome::SecondWins => {
                self.apply_round_loss_damage(first);
                self.outbox
                    .broadcast("twentyone-round-winner", margs![("player", name_2.clone())]);
            }
            RoundOutcome::Draw => {
                self.apply_round_loss_damage(first);
                self.apply_round_loss_damage(second);
                self.outbox.broadcast("twentyone-round-draw", margs![]);
            }
        }

        if bust_1 && bust_2 {
            self.outbox.broadcast("twentyone-both-bust", margs![]);
        } else if bust_1 {
            self.outbox
                .broadcast("twentyone-player-busted", margs![("player", name_1)]);
        } else if bust_2 {
            self.outbox
                .broadcast("twentyone-player-busted", margs![("player", name_2)]);
        }

        let survivors = self.alive_idxs();
        if survivors.len() <= 1 {
            self.end_game(survivors.first().copied());
            return;
        }

        self.next_round_wait_ticks = self.options.next_round_wait_ticks;
        self.outbox.menu_refresh();
    }

    /// Both-bust resolves to whichever total lands closer to the target;
    /// equal distance is a draw that damages both.
    pub(crate) fn resolve_round_outcome(total_1: u32, total_2: u32, target: u32) -> RoundOutcome {
        let bust_1 = total_1 > target;
        let bust_2 = total_2 > target;
        if bust_1 && !bust_2 {
            return RoundOutcome::SecondWins;
        }
        if bust_2 && !bust_1 {
            return RoundOutcome::FirstWins;
        }
        if bust_1 && bust_2 {
            let diff_1 = total_1.abs_diff(target);
            let diff_2 = total_2.abs_diff(target);
            if diff_1 < diff_2 {
                return RoundOutcome::FirstWins;
            }
            if diff_2 < diff_1 {
                return RoundOutcome::SecondWins;
            }
            return RoundOutcome::Draw;
        }
        if total_1 > total_2 {
            return RoundOutcome::FirstWins;
        }
        if total_2 > total_1 {
            return RoundOutcome::SecondWins;
        }
        RoundOutcome::Draw
    }

    fn apply_round_loss_damage(&mut self, loser: usize) {
        let damage = self.current_bet(loser);
        let name = self.players[loser].seat.name.clone();
        if damage == 0 {
            self.outbox
                .broadcast("twentyone-round-no-damage", margs![("player", name)]);
            return;
        }
        let p = &mut self.players[loser];
        p.hp = p.hp.saturating_sub(damage);
        let hp = p.hp;
        self.outbox.broadcast(
            "twentyone-player-takes-damage",
            margs![("player", name), ("damage", damage), ("hp", hp)],
        );
    }

    fn end_game(&mut self, winner: Option<usize>) {
        self.phase = TwentyOnePhase::Finished;
        self.status = GameStatus::Finished;
        self.bots.clear();
        match winner {
            Some(i) => {
                let name = self.players[i].seat.name.clone();
                let hp = self.players[i].hp;
                self.outbox.broadcast(
                    "twentyone-player-wins-game",
                    margs![("player", name), ("hp", hp)],
                );
            }
            None => self.outbox.broadcast("twentyone-no-winner", margs![]),
        }
        self.outbox.finished();
        log::debug!(
            "twentyone: game over after {} rounds",
            self.round_number
        );
    }

    // ------------------------------------------------------------------
    // Player actions
    // ------------------------------------------------------------------

    fn action_hit(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_turn_action_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let Some(card) = self.draw_card() else {
            self.outbox.broadcast("twentyone-deck-empty", margs![]);
            self.outbox.menu_refresh();
            return;
        };

        self.clear_pending_stands();
        self.add_card_to_hand(i, card, Some("twentyone-player-draws"), true);
        self.players[i].stand_pending = false;

        let chance = self.options.draw_modifier_chance_percent.min(100);
        if chance > 0 && self.rng.random_range(1..=100) <= chance {
            self.give_random_modifiers(i, 1, true);
        }
        self.outbox.menu_refresh();
    }

    fn action_stand(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_turn_action_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };

        self.players[i].stand_pending = true;
        let name = self.players[i].seat.name.clone();
        self.outbox
            .broadcast("twentyone-player-stays", margs![("player", name)]);

        if self.both_standing() {
            self.settle_round();
            return;
        }
        self.advance_turn_after_action();
    }

    fn action_play_modifier(&mut self, player: &PlayerId, input: Option<&str>) {
        if self.is_play_modifier_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let Some(choice) = input.and_then(|s| s.parse::<usize>().ok()) else {
            return;
        };
        if choice >= self.players[i].modifiers.len() {
            return;
        }

        let modifier = self.players[i].modifiers.remove(choice);
        if !self.is_modifier_playable(i, modifier) {
            self.players[i].modifiers.insert(choice, modifier);
            return;
        }

        self.clear_pending_stands();
        let name = self.players[i].seat.name.clone();
        self.outbox.broadcast(
            "twentyone-player-plays-modifier",
            margs![("player", name), ("modifier", modifier.label_key())],
        );
        self.resolve_modifier(i, modifier);
        self.trigger_salvage_rewards();
        self.outbox.menu_refresh();
    }

    fn resolve_modifier(&mut self, i: usize, modifier: Modifier) {
        let Some(opponent) = self.opponent_of(i) else {
            return;
        };

        if let Some(rank) = modifier.exact_rank() {
            match self.draw_specific_rank(rank) {
                Some(card) => {
                    self.add_card_to_hand(i, card, Some("twentyone-player-draws-exact"), true);
                    self.players[i].stand_pending = false;
                }
                None => self
                    .outbox
                    .broadcast("twentyone-no-exact-card", margs![("rank", rank)]),
            }
            return;
        }

        match modifier {
            Modifier::Raise1 | Modifier::Raise2 => {
                self.place_table_effect(i, modifier);
                self.give_random_modifiers(i, 1, true);
            }
            Modifier::Raise2Plus => {
                self.place_table_effect(i, modifier);
                if let Some(removed) = self.extract_last_drawn(opponent) {
                    self.return_cards_to_deck_top(vec![removed]);
                    let name = self.players[opponent].seat.name.clone();
                    self.outbox
                        .broadcast("twentyone-card-recycled", margs![("player", name)]);
                }
                self.give_random_modifiers(i, 1, true);
            }
            Modifier::Scrap | Modifier::Recycle => match self.extract_last_drawn(opponent) {
                Some(removed) => {
                    self.return_cards_to_deck_top(vec![removed]);
                    let name = self.players[opponent].seat.name.clone();
                    self.outbox
                        .broadcast("twentyone-card-recycled", margs![("player", name)]);
                }
                None => self
                    .outbox
                    .broadcast("twentyone-no-face-up-card", margs![]),
            },
            Modifier::SwapDraw => {
                let mine = self.extract_last_drawn(i);
                let theirs = self.extract_last_drawn(opponent);
                if let Some(card) = self.draw_card() {
                    self.add_card_to_hand(i, card, Some("twentyone-player-draws"), true);
                    self.players[i].stand_pending = false;
                }
                if let Some(card) = self.draw_card() {
                    self.add_card_to_hand(opponent, card, Some("twentyone-player-draws"), true);
                    self.players[opponent].stand_pending = false;
                }
                let returned: Vec<Card> = [mine, theirs].into_iter().flatten().collect();
                self.return_cards_to_deck_top(returned);
                self.outbox.broadcast("twentyone-swap-resolves", margs![]);
            }
            Modifier::Redraft => {
                self.discard_random_modifiers(i, 2);
                self.give_random_modifiers(i, 3, true);
            }
            Modifier::RedraftPlus => {
                self.discard_random_modifiers(i, 1);
                self.give_random_modifiers(i, 4, true);
            }
            Modifier::BreakEffect => {
                let name = self.players[i].seat.name.clone();
                match self.players[opponent].table_modifiers.pop() {
                    Some(removed) => self.outbox.broadcast(
                        "twentyone-effect-destroyed",
                        margs![("player", name), ("effect", removed.label_key())],
                    ),
                    None => self
                        .outbox
                        .broadcast("twentyone-no-effect-to-destroy", margs![]),
                }
            }
            Modifier::BreakAll => {
                let count = self.players[opponent].table_modifiers.len();
                if count > 0 {
                    self.players[opponent].table_modifiers.clear();
                    let name = self.players[i].seat.name.clone();
                    self.outbox.broadcast(
                        "twentyone-all-effects-destroyed",
                        margs![("player", name), ("count", count)],
                    );
                } else {
                    self.outbox
                        .broadcast("twentyone-no-effect-to-destroy", margs![]);
                }
            }
            Modifier::Lockdown => {
                if !self.players[opponent].table_modifiers.is_empty() {
                    self.players[opponent].table_modifiers.clear();
                    let name = self.players[i].seat.name.clone();
                    self.outbox
                        .broadcast("twentyone-effects-cleared", margs![("player", name)]);
                }
                self.place_table_effect(i, modifier);
            }
            Modifier::PrecisionDraw => {
                self.precision_draw_for(i);
            }
            Modifier::PrecisionDrawPlus => {
                self.place_table_effect(i, modifier);
                self.precision_draw_for(i);
            }
            Modifier::PrimeDraw => {
                self.precision_draw_for(i);
                self.give_random_modifiers(i, 2, true);
            }
            Modifier::AidRival => match self.draw_best_possible_card(opponent) {
                Some(card) => {
                    self.add_card_to_hand(opponent, card, Some("twentyone-player-draws-aid"), true);
                    self.players[opponent].stand_pending = false;
                }
                None => self
                    .outbox
                    .broadcast("twentyone-no-card-found", margs![]),
            },
            _ => {
                // Remaining table effects (guards, targets, salvage).
                if modifier.is_table_effect() {
                    self.place_table_effect(i, modifier);
                    if modifier.target_value().is_some() {
                        self.outbox.broadcast(
                            "twentyone-target-changes",
                            margs![("target", self.current_target())],
                        );
                    }
                }
            }
        }
    }

    fn precision_draw_for(&mut self, i: usize) {
        match self.draw_best_possible_card(i) {
            Some(card) => {
                self.add_card_to_hand(i, card, Some("twentyone-player-precision-draws"), true);
                self.players[i].stand_pending = false;
            }
            None => self.outbox.broadcast("twentyone-no-card-found", margs![]),
        }
    }

    // ------------------------------------------------------------------
    // Status readouts
    // ------------------------------------------------------------------

    fn action_check_status(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let target = self.current_target();
        let bet = self.current_bet(i);
        let total = self.hand_total(i);
        let p = &self.players[i];
        let modifiers: Vec<&'static str> = p.modifiers.iter().map(|m| m.label_key()).collect();
        let effects: Vec<&'static str> =
            p.table_modifiers.iter().map(|m| m.label_key()).collect();
        let args = margs![
            ("target", target),
            ("hp", p.hp),
            ("bet", bet),
            ("hand", p.hand.as_slice()),
            ("total", total),
            ("modifiers", modifiers),
            ("effects", effects)
        ];
        self.outbox.personal(player.clone(), "twentyone-status", args);

        if let Some(opponent) = self.opponent_of(i) {
            let shown = self.opponent_visible_cards(opponent).to_vec();
            let shown_total: u32 = shown.iter().map(|c| u32::from(c.rank)).sum();
            let o = &self.players[opponent];
            let args = margs![
                ("player", o.seat.name.clone()),
                ("hp", o.hp),
                ("bet", self.current_bet(opponent)),
                ("shown", shown.as_slice()),
                ("shown_total", shown_total)
            ];
            self.outbox
                .personal(player.clone(), "twentyone-status-opponent", args);
        }
    }

    fn action_modifier_guide(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        self.outbox
            .personal(player.clone(), "twentyone-guide-header", margs![]);
        for modifier in MODIFIER_POOL {
            self.outbox.personal(
                player.clone(),
                "twentyone-guide-entry",
                margs![
                    ("modifier", modifier.label_key()),
                    ("help", modifier.help_key())
                ],
            );
        }
        self.outbox
            .personal(player.clone(), "twentyone-guide-footer", margs![]);
    }

    fn action_read_opponent(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let Some(opponent) = self.opponent_of(i) else {
            self.outbox
                .personal(player.clone(), "twentyone-no-opponent", margs![]);
            return;
        };
        let shown = self.opponent_visible_cards(opponent).to_vec();
        let shown_total: u32 = shown.iter().map(|c| u32::from(c.rank)).sum();
        let name = self.players[opponent].seat.name.clone();
        self.outbox.personal(
            player.clone(),
            "twentyone-opponent-face-up",
            margs![
                ("player", name),
                ("shown", shown.as_slice()),
                ("shown_total", shown_total)
            ],
        );
    }

    fn action_read_hand(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let hand = self.players[i].hand.clone();
        let total = self.hand_total(i);
        self.outbox.personal(
            player.clone(),
            "twentyone-read-hand",
            margs![("hand", hand.as_slice()), ("total", total)],
        );
    }

    fn action_read_bets(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let my_bet = self.current_bet(i);
        match self.opponent_of(i) {
            Some(opponent) => {
                let name = self.players[opponent].seat.name.clone();
                self.outbox.personal(
                    player.clone(),
                    "twentyone-read-bets",
                    margs![
                        ("bet", my_bet),
                        ("player", name),
                        ("opponent_bet", self.current_bet(opponent))
                    ],
                );
            }
            None => self.outbox.personal(
                player.clone(),
                "twentyone-read-bet-solo",
                margs![("bet", my_bet)],
            ),
        }
    }

    fn action_read_effects(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let mine: Vec<&'static str> = self.players[i]
            .table_modifiers
            .iter()
            .map(|m| m.label_key())
            .collect();
        match self.opponent_of(i) {
            Some(opponent) => {
                let theirs: Vec<&'static str> = self.players[opponent]
                    .table_modifiers
                    .iter()
                    .map(|m| m.label_key())
                    .collect();
                let name = self.players[opponent].seat.name.clone();
                self.outbox.personal(
                    player.clone(),
                    "twentyone-read-effects",
                    margs![("effects", mine), ("player", name), ("opponent_effects", theirs)],
                );
            }
            None => self.outbox.personal(
                player.clone(),
                "twentyone-read-effects-solo",
                margs![("effects", mine)],
            ),
        }
    }
}

impl GameLogic for TwentyOneGame {
    fn game_type(&self) -> GameType {
        GameType::TwentyOne
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn phase_name(&self) -> &'static str {
        self.phase.as_str()
    }

    fn prestart_validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let seats = self
            .players
            .iter()
            .filter(|p| !p.seat.is_spectator)
            .count();
        if seats < REQUIRED_PLAYERS {
            errors.push(ConfigError::NotEnoughPlayers {
                required: REQUIRED_PLAYERS,
            });
        }
        if seats > REQUIRED_PLAYERS {
            errors.push(ConfigError::TooManyPlayers {
                max: REQUIRED_PLAYERS,
            });
        }
        errors
    }

    fn on_start(&mut self) {
        self.status = GameStatus::Playing;
        self.phase = TwentyOnePhase::Turns;
        self.round_number = 0;
        self.round_starter_index = 0;
        self.next_round_wait_ticks = 0;

        let starting_health = self.options.starting_health.max(1);
        for p in &mut self.players {
            if p.seat.is_spectator {
                continue;
            }
            p.hp = starting_health;
            p.hand.clear();
            p.modifiers.clear();
            p.table_modifiers.clear();
            p.stand_pending = false;
            p.last_drawn_card_id = None;
        }
        self.start_round(false);
    }

    fn on_tick(&mut self) {
        self.tick_count += 1;
        if self.status != GameStatus::Playing {
            return;
        }

        if self.phase == TwentyOnePhase::BetweenRounds {
            if self.next_round_wait_ticks > 0 {
                self.next_round_wait_ticks -= 1;
            }
            if self.next_round_wait_ticks == 0 {
                self.start_round(true);
            }
            return;
        }

        if self.phase != TwentyOnePhase::Turns {
            return;
        }
        for id in self.bots.on_tick() {
            if self.turn_order.current() != Some(&id) {
                continue;
            }
            if let Some(choice) = self.bot_think(&id) {
                self.execute_action(&id, &choice.action, choice.input.as_deref());
            }
            // A hit or modifier keeps the turn; schedule the next thought.
            if self.phase == TwentyOnePhase::Turns
                && self.turn_order.current() == Some(&id)
                && let Some(i) = self.idx_of(&id)
                && self.players[i].seat.is_bot
            {
                let ticks = self.rng.random_range(8..=16);
                self.bots.jolt(id, ticks);
            }
        }
    }

    fn execute_action(&mut self, player: &PlayerId, action_id: &str, input: Option<&str>) {
        let Some(i) = self.idx_of(player) else {
            log::warn!("twentyone: action {action_id} from unknown player {player}");
            return;
        };
        let is_bot = self.players[i].seat.is_bot;
        let registry = Self::registry();
        match actions::dispatch(self, &registry, player, action_id, input, is_bot) {
            actions::DispatchResult::Handled => {}
            actions::DispatchResult::NeedsInput { prompt_key, options } => {
                self.outbox
                    .input_request(player.clone(), action_id, prompt_key, options);
            }
            actions::DispatchResult::Rejected(reason) => {
                log::debug!("twentyone: rejected {action_id} from {player}: {reason}");
            }
            actions::DispatchResult::Unknown => {
                log::warn!("twentyone: unknown action id {action_id}");
            }
        }
    }

    fn visible_actions(&self, player: &PlayerId) -> Vec<ActionView> {
        actions::visible_actions(self, &Self::registry(), player)
    }

    fn bot_think(&mut self, player: &PlayerId) -> Option<BotChoice> {
        if self.phase != TwentyOnePhase::Turns || self.turn_order.current() != Some(player) {
            return None;
        }
        let i = self.idx_of(player)?;
        let Some(opponent) = self.opponent_of(i) else {
            return Some(BotChoice::plain(ACTION_STAND));
        };

        let target = self.current_target();
        let total = self.hand_total(i);
        let opp_total = self.hand_total(opponent);
        let me = &self.players[i];
        let opp = &self.players[opponent];

        if !self.modifiers_locked_for(i) && !me.modifiers.is_empty() {
            let has = |candidates: &[Modifier]| {
                candidates
                    .iter()
                    .any(|m| me.modifiers.contains(m) && self.is_modifier_playable(i, *m))
            };
            if total > target
                && has(&[Modifier::Target17, Modifier::Target24, Modifier::Target27])
            {
                return Some(BotChoice::plain(ACTION_PLAY_MODIFIER));
            }
            if total + 5 < target
                && has(&[
                    Modifier::PrecisionDraw,
                    Modifier::PrecisionDrawPlus,
                    Modifier::PrimeDraw,
                ])
            {
                return Some(BotChoice::plain(ACTION_PLAY_MODIFIER));
            }
            if opp.stand_pending
                && total <= opp_total
                && has(&[
                    Modifier::Raise1,
                    Modifier::Raise2,
                    Modifier::Raise2Plus,
                    Modifier::Lockdown,
                ])
            {
                return Some(BotChoice::plain(ACTION_PLAY_MODIFIER));
            }
            if me.hp <= opp.hp && has(&[Modifier::Guard, Modifier::GuardPlus]) {
                return Some(BotChoice::plain(ACTION_PLAY_MODIFIER));
            }
        }

        // Nothing left to draw; standing is the only way forward.
        if self.deck.is_empty() {
            return Some(BotChoice::plain(ACTION_STAND));
        }
        if total + 2 < target {
            return Some(BotChoice::plain(ACTION_HIT));
        }
        if opp.stand_pending && total < opp_total && total <= target {
            return Some(BotChoice::plain(ACTION_HIT));
        }
        Some(BotChoice::plain(ACTION_STAND))
    }

    fn drain_messages(&mut self) -> VecDeque<TableMessage> {
        self.outbox.drain()
    }

    fn build_game_result(&self) -> GameResult {
        let seated: Vec<&TwentyOnePlayer> = self
            .players
            .iter()
            .filter(|p| !p.seat.is_spectator)
            .collect();
        let winner = seated.iter().max_by_key(|p| p.hp);
        let final_hp: serde_json::Map<String, serde_json::Value> = seated
            .iter()
            .map(|p| (p.seat.name.clone(), serde_json::json!(p.hp)))
            .collect();

        GameResult {
            game_type: GameType::TwentyOne,
            timestamp: chrono::Utc::now(),
            duration_ticks: self.tick_count,
            player_results: seated
                .iter()
                .map(|p| PlayerResult {
                    player_id: p.seat.id.clone(),
                    player_name: p.seat.name.clone(),
                    is_bot: p.seat.is_bot,
                })
                .collect(),
            payload: serde_json::json!({
                "winner_name": winner.map(|p| p.seat.name.clone()),
                "winner_hp": winner.map_or(0, |p| p.hp),
                "final_hp": final_hp,
                "rounds_played": self.round_number,
            }),
        }
    }

    fn rebuild_runtime_state(&mut self) {
        self.bots.clear();
        if self.status == GameStatus::Playing && self.phase == TwentyOnePhase::Turns {
            if let Some(i) = self.current_player_idx()
                && self.players[i].seat.is_bot
            {
                let ticks = self.rng.random_range(8..=16);
                let id = self.players[i].seat.id.clone();
                self.bots.jolt(id, ticks);
            }
        }
    }

    fn snapshot_integrity(&self) -> Result<(), &'static str> {
        if self
            .turn_order
            .ids()
            .iter()
            .any(|id| self.idx_of(id).is_none())
        {
            return Err("turn order references an unknown player");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    fn card(id: u32, rank: u8) -> Card {
        Card::new(id, rank, Suit::None)
    }

    fn pid(s: &str) -> PlayerId {
        PlayerId::new(s)
    }

    fn two_bot_game() -> TwentyOneGame {
        let mut game = TwentyOneGame::with_seed(TwentyOneOptions::default(), 9);
        game.add_player("a", "Ada", true);
        game.add_player("b", "Brin", true);
        game.status = GameStatus::Playing;
        game.phase = TwentyOnePhase::Turns;
        game.players[0].hp = 10;
        game.players[1].hp = 10;
        game.turn_order.set(vec![pid("a"), pid("b")], true);
        game
    }

    #[test]
    fn test_round_outcome_higher_total_wins() {
        assert_eq!(
            TwentyOneGame::resolve_round_outcome(20, 18, 21),
            RoundOutcome::FirstWins
        );
        assert_eq!(
            TwentyOneGame::resolve_round_outcome(17, 19, 21),
            RoundOutcome::SecondWins
        );
        assert_eq!(
            TwentyOneGame::resolve_round_outcome(18, 18, 21),
            RoundOutcome::Draw
        );
    }

    #[test]
    fn test_round_outcome_single_bust_loses() {
        assert_eq!(
            TwentyOneGame::resolve_round_outcome(24, 12, 21),
            RoundOutcome::SecondWins
        );
        assert_eq!(
            TwentyOneGame::resolve_round_outcome(15, 30, 21),
            RoundOutcome::FirstWins
        );
    }

    #[test]
    fn test_round_outcome_both_bust_closer_to_target_wins() {
        assert_eq!(
            TwentyOneGame::resolve_round_outcome(23, 27, 21),
            RoundOutcome::FirstWins
        );
        assert_eq!(
            TwentyOneGame::resolve_round_outcome(29, 24, 21),
            RoundOutcome::SecondWins
        );
        assert_eq!(
            TwentyOneGame::resolve_round_outcome(25, 25, 21),
            RoundOutcome::Draw
        );
    }

    #[test]
    fn test_current_bet_applies_raises_and_guards() {
        let mut game = two_bot_game();
        assert_eq!(game.current_bet(0), 1);

        game.players[1].table_modifiers = vec![Modifier::Raise2, Modifier::Raise1];
        assert_eq!(game.current_bet(0), 4);

        game.players[0].table_modifiers = vec![Modifier::GuardPlus];
        assert_eq!(game.current_bet(0), 2);

        // Guards never push damage below zero.
        game.players[0].table_modifiers = vec![Modifier::GuardPlus, Modifier::GuardPlus];
        game.players[1].table_modifiers.clear();
        assert_eq!(game.current_bet(0), 0);
    }

    #[test]
    fn test_target_modifiers_replace_older_targets() {
        let mut game = two_bot_game();
        game.place_table_effect(0, Modifier::Target17);
        assert_eq!(game.current_target(), 17);

        game.place_table_effect(1, Modifier::Target27);
        assert_eq!(game.current_target(), 27);
        assert!(!game.players[0].table_modifiers.contains(&Modifier::Target17));
    }

    #[test]
    fn test_table_effect_limit_expires_oldest() {
        let mut game = two_bot_game();
        for _ in 0..TABLE_EFFECT_LIMIT {
            game.place_table_effect(0, Modifier::Raise1);
        }
        game.place_table_effect(0, Modifier::Guard);
        assert_eq!(game.players[0].table_modifiers.len(), TABLE_EFFECT_LIMIT);
        assert_eq!(
            *game.players[0].table_modifiers.last().unwrap(),
            Modifier::Guard
        );
    }

    #[test]
    fn test_lockdown_blocks_opponent_modifiers() {
        let mut game = two_bot_game();
        game.players[0].table_modifiers = vec![Modifier::Lockdown];
        game.players[1].modifiers = vec![Modifier::Guard];
        assert!(game.modifiers_locked_for(1));
        assert!(!game.is_modifier_playable(1, Modifier::Guard));
        assert!(!game.modifiers_locked_for(0));
    }

    #[test]
    fn test_exact_draw_fishes_rank_from_deck() {
        let mut game = two_bot_game();
        game.deck = Deck::from_cards(vec![card(1, 9), card(2, 4), card(3, 7)]);
        game.players[0].modifiers = vec![Modifier::Exact4];

        game.resolve_modifier(0, Modifier::Exact4);

        assert_eq!(game.players[0].hand.last().map(|c| c.rank), Some(4));
        assert_eq!(game.deck.len(), 2);
    }

    #[test]
    fn test_scrap_returns_opponent_face_up_card_to_deck_top() {
        let mut game = two_bot_game();
        game.deck = Deck::from_cards(vec![card(1, 9)]);
        let shown = card(50, 6);
        game.players[1].hand = vec![card(49, 5), shown];
        game.players[1].last_drawn_card_id = Some(50);

        game.resolve_modifier(0, Modifier::Scrap);

        assert_eq!(game.players[1].hand.len(), 1);
        assert_eq!(game.players[1].last_drawn_card_id, None);
        // The scrapped card is the next one dealt.
        assert_eq!(game.deck.draw(), Some(shown));
    }

    #[test]
    fn test_precision_draw_picks_best_card_under_target() {
        let mut game = two_bot_game();
        game.players[0].hand = vec![card(1, 10), card(2, 6)]; // 16
        game.deck = Deck::from_cards(vec![card(3, 9), card(4, 5), card(5, 2)]);

        game.resolve_modifier(0, Modifier::PrecisionDraw);

        // Best is the 5: lands exactly on 21.
        assert_eq!(game.players[0].hand.last().map(|c| c.rank), Some(5));
        assert_eq!(game.hand_total(0), 21);
    }

    #[test]
    fn test_stand_by_both_players_settles_round() {
        let mut game = two_bot_game();
        game.players[0].hand = vec![card(1, 10), card(2, 9)]; // 19
        game.players[1].hand = vec![card(3, 10), card(4, 7)]; // 17
        game.deck = Deck::from_cards(vec![card(9, 2)]);

        game.execute_action(&pid("a"), ACTION_STAND, None);
        assert_eq!(game.phase, TwentyOnePhase::Turns);
        assert_eq!(game.turn_order.current(), Some(&pid("b")));

        game.execute_action(&pid("b"), ACTION_STAND, None);
        assert_eq!(game.phase, TwentyOnePhase::BetweenRounds);
        // Loser takes base-bet damage.
        assert_eq!(game.players[1].hp, 9);
        assert_eq!(game.players[0].hp, 10);
    }

    #[test]
    fn test_hit_clears_pending_stands() {
        let mut game = two_bot_game();
        game.players[0].hand = vec![card(1, 5), card(2, 4)];
        game.players[1].hand = vec![card(3, 10), card(4, 7)];
        game.players[1].stand_pending = true;
        game.deck = Deck::from_cards(vec![card(9, 2)]);

        game.execute_action(&pid("a"), ACTION_HIT, None);

        assert!(!game.players[1].stand_pending);
        assert_eq!(game.players[0].hand.len(), 3);
        // Hitting keeps the turn.
        assert_eq!(game.turn_order.current(), Some(&pid("a")));
    }

    #[test]
    fn test_play_modifier_via_input_value() {
        let mut game = two_bot_game();
        game.players[0].modifiers = vec![Modifier::Guard, Modifier::Target24];
        game.players[0].hand = vec![card(1, 10), card(2, 9)];
        game.players[1].hand = vec![card(3, 10), card(4, 7)];

        game.execute_action(&pid("a"), ACTION_PLAY_MODIFIER, Some("1"));

        assert_eq!(game.players[0].modifiers, vec![Modifier::Guard]);
        assert_eq!(game.current_target(), 24);
    }

    #[test]
    fn test_prestart_requires_exactly_two_players() {
        let mut game = TwentyOneGame::new(TwentyOneOptions::default());
        game.add_player("a", "Ada", true);
        assert!(
            game.prestart_validate()
                .contains(&ConfigError::NotEnoughPlayers { required: 2 })
        );
        game.add_player("b", "Brin", true);
        assert!(game.prestart_validate().is_empty());
        game.add_player("c", "Cy", true);
        assert!(
            game.prestart_validate()
                .contains(&ConfigError::TooManyPlayers { max: 2 })
        );
    }
}
