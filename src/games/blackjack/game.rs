//! Blackjack hand lifecycle: bet, deal, insurance, player turns with
//! split/double/surrender, dealer play, settlement.

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::bot::BotScheduler;
use crate::game::actions::{self, ActionSpec, ActionView, Visibility};
use crate::game::entities::{
    Card, Chips, Deck, DeckFactory, PlayerId, PlayerIdentity, runtime_rng,
};
use crate::game::scoring::{blackjack_total, is_natural};
use crate::game::turns::{TurnOrder, TurnTimer};
use crate::game::{BotChoice, ConfigError, GameLogic, GameStatus, GameType};
use crate::table::messages::{Outbox, TableMessage, margs};
use crate::table::result::{GameResult, PlayerResult};

use super::bot;
use super::options::BlackjackOptions;
use super::{
    ACTION_CHECK_TURN_TIMER, ACTION_DECLINE_INSURANCE, ACTION_DOUBLE_DOWN, ACTION_EVEN_MONEY,
    ACTION_HIT, ACTION_READ_DEALER, ACTION_READ_HAND, ACTION_READ_RULES, ACTION_SPLIT,
    ACTION_STAND, ACTION_SURRENDER, ACTION_TABLE_STATUS, ACTION_TAKE_INSURANCE,
};

pub const MIN_PLAYERS: usize = 1;
pub const MAX_PLAYERS: usize = 7;

/// Ticks between settlement and the next hand.
const NEXT_HAND_WAIT_TICKS: u32 = 40;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackjackPhase {
    Lobby,
    Players,
    Insurance,
    Dealer,
    Settle,
    Finished,
}

impl BlackjackPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::Players => "players",
            Self::Insurance => "insurance",
            Self::Dealer => "dealer",
            Self::Settle => "settle",
            Self::Finished => "finished",
        }
    }
}

/// Which of a player's (up to two) sub-hands is being played.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSlot {
    #[default]
    Main,
    Split,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BlackjackPlayer {
    pub seat: PlayerIdentity,
    pub chips: Chips,
    pub hand: Vec<Card>,
    pub bet: Chips,
    pub hand_done: bool,
    pub stood: bool,
    pub busted: bool,
    pub has_blackjack: bool,
    pub split_hand: Vec<Card>,
    pub split_bet: Chips,
    pub split_hand_done: bool,
    pub split_stood: bool,
    pub split_busted: bool,
    pub split_has_blackjack: bool,
    pub active_hand: HandSlot,
    pub doubled_main: bool,
    pub doubled_split: bool,
    pub surrendered_main: bool,
    pub surrendered_split: bool,
    pub main_from_split_aces: bool,
    pub split_from_split_aces: bool,
    pub insurance_bet: Chips,
    pub insurance_decision_done: bool,
    pub took_even_money: bool,
}

impl BlackjackPlayer {
    #[must_use]
    pub fn new(seat: PlayerIdentity) -> Self {
        Self {
            seat,
            chips: 0,
            hand: Vec::new(),
            bet: 0,
            hand_done: false,
            stood: false,
            busted: false,
            has_blackjack: false,
            split_hand: Vec::new(),
            split_bet: 0,
            split_hand_done: true,
            split_stood: false,
            split_busted: false,
            split_has_blackjack: false,
            active_hand: HandSlot::Main,
            doubled_main: false,
            doubled_split: false,
            surrendered_main: false,
            surrendered_split: false,
            main_from_split_aces: false,
            split_from_split_aces: false,
            insurance_bet: 0,
            insurance_decision_done: false,
            took_even_money: false,
        }
    }

    fn reset_for_hand(&mut self) {
        self.hand.clear();
        self.bet = 0;
        self.hand_done = false;
        self.stood = false;
        self.busted = false;
        self.has_blackjack = false;
        self.split_hand.clear();
        self.split_bet = 0;
        self.split_hand_done = true;
        self.split_stood = false;
        self.split_busted = false;
        self.split_has_blackjack = false;
        self.active_hand = HandSlot::Main;
        self.doubled_main = false;
        self.doubled_split = false;
        self.surrendered_main = false;
        self.surrendered_split = false;
        self.main_from_split_aces = false;
        self.split_from_split_aces = false;
        self.insurance_bet = 0;
        self.insurance_decision_done = false;
        self.took_even_money = false;
    }
}

enum SettleOutcome {
    Win,
    Lose,
    Push,
    EvenMoney,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BlackjackGame {
    pub options: BlackjackOptions,
    pub players: Vec<BlackjackPlayer>,
    pub status: GameStatus,
    pub phase: BlackjackPhase,
    pub deck: Deck,
    pub dealer_hand: Vec<Card>,
    pub hand_number: u32,
    pub dealer_hole_revealed: bool,
    pub next_hand_wait_ticks: u32,
    pub turn_order: TurnOrder,
    tick_count: u64,
    #[serde(skip)]
    timer: TurnTimer,
    #[serde(skip)]
    bots: BotScheduler,
    #[serde(skip)]
    pub(crate) outbox: Outbox,
    #[serde(skip, default = "runtime_rng")]
    rng: StdRng,
}

impl BlackjackGame {
    #[must_use]
    pub fn new(options: BlackjackOptions) -> Self {
        Self {
            options,
            players: Vec::new(),
            status: GameStatus::Lobby,
            phase: BlackjackPhase::Lobby,
            deck: Deck::default(),
            dealer_hand: Vec::new(),
            hand_number: 0,
            dealer_hole_revealed: false,
            next_hand_wait_ticks: 0,
            turn_order: TurnOrder::default(),
            tick_count: 0,
            timer: TurnTimer::default(),
            bots: BotScheduler::default(),
            outbox: Outbox::default(),
            rng: runtime_rng(),
        }
    }

    /// Deterministic construction for tests and replays.
    #[must_use]
    pub fn with_seed(options: BlackjackOptions, seed: u64) -> Self {
        use rand::SeedableRng;
        let mut game = Self::new(options);
        game.rng = StdRng::seed_from_u64(seed);
        game
    }

    pub fn add_player(&mut self, id: &str, name: &str, is_bot: bool) {
        self.players
            .push(BlackjackPlayer::new(PlayerIdentity::new(id, name, is_bot)));
    }

    /// Applies a rules profile, overwriting every governed option.
    pub fn set_rules_profile(&mut self, profile: super::options::RulesProfile) {
        self.options.apply_profile(profile);
        self.outbox.menu_refresh();
    }

    // ------------------------------------------------------------------
    // Roster helpers
    // ------------------------------------------------------------------

    pub(crate) fn idx_of(&self, id: &PlayerId) -> Option<usize> {
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

    pub(crate) fn current_player_idx(&self) -> Option<usize> {
        self.turn_order.current().and_then(|id| self.idx_of(id))
    }

    fn is_current(&self, player: &PlayerId) -> bool {
        self.turn_order.current() == Some(player)
    }

    // ------------------------------------------------------------------
    // Sub-hand helpers
    // ------------------------------------------------------------------

    pub(crate) fn current_hand(&self, i: usize) -> &[Card] {
        let p = &self.players[i];
        match p.active_hand {
            HandSlot::Main => &p.hand,
            HandSlot::Split => &p.split_hand,
        }
    }

    fn current_hand_mut(&mut self, i: usize) -> &mut Vec<Card> {
        let p = &mut self.players[i];
        match p.active_hand {
            HandSlot::Main => &mut p.hand,
            HandSlot::Split => &mut p.split_hand,
        }
    }

    pub(crate) fn current_bet(&self, i: usize) -> Chips {
        let p = &self.players[i];
        match p.active_hand {
            HandSlot::Main => p.bet,
            HandSlot::Split => p.split_bet,
        }
    }

    fn set_current_bet(&mut self, i: usize, amount: Chips) {
        let p = &mut self.players[i];
        match p.active_hand {
            HandSlot::Main => p.bet = amount,
            HandSlot::Split => p.split_bet = amount,
        }
    }

    pub(crate) fn current_hand_done(&self, i: usize) -> bool {
        let p = &self.players[i];
        match p.active_hand {
            HandSlot::Main => p.hand_done,
            HandSlot::Split => p.split_hand_done,
        }
    }

    fn stand_current_hand(&mut self, i: usize) {
        let p = &mut self.players[i];
        match p.active_hand {
            HandSlot::Main => {
                p.hand_done = true;
                p.stood = true;
            }
            HandSlot::Split => {
                p.split_hand_done = true;
                p.split_stood = true;
            }
        }
    }

    fn bust_current_hand(&mut self, i: usize) {
        let p = &mut self.players[i];
        match p.active_hand {
            HandSlot::Main => {
                p.hand_done = true;
                p.busted = true;
            }
            HandSlot::Split => {
                p.split_hand_done = true;
                p.split_busted = true;
            }
        }
    }

    fn set_current_surrendered(&mut self, i: usize) {
        let p = &mut self.players[i];
        match p.active_hand {
            HandSlot::Main => p.surrendered_main = true,
            HandSlot::Split => p.surrendered_split = true,
        }
    }

    fn set_current_doubled(&mut self, i: usize) {
        let p = &mut self.players[i];
        match p.active_hand {
            HandSlot::Main => p.doubled_main = true,
            HandSlot::Split => p.doubled_split = true,
        }
    }

    fn current_hand_from_split_aces(&self, i: usize) -> bool {
        let p = &self.players[i];
        match p.active_hand {
            HandSlot::Main => p.main_from_split_aces,
            HandSlot::Split => p.split_from_split_aces,
        }
    }

    fn is_current_hand_locked_after_split_aces(&self, i: usize) -> bool {
        self.options.split_aces_one_card_only && self.current_hand_from_split_aces(i)
    }

    fn has_pending_hand(&self, i: usize) -> bool {
        let p = &self.players[i];
        (p.bet > 0 && !p.hand_done) || (p.split_bet > 0 && !p.split_hand_done)
    }

    fn select_first_pending_hand(&mut self, i: usize) {
        let p = &mut self.players[i];
        if p.bet > 0 && !p.hand_done {
            p.active_hand = HandSlot::Main;
        } else if p.split_bet > 0 && !p.split_hand_done {
            p.active_hand = HandSlot::Split;
        }
    }

    fn switch_to_next_hand(&mut self, i: usize) -> bool {
        let p = &mut self.players[i];
        if p.active_hand == HandSlot::Main && p.split_bet > 0 && !p.split_hand_done {
            p.active_hand = HandSlot::Split;
            return true;
        }
        false
    }

    // ------------------------------------------------------------------
    // Rule predicates
    // ------------------------------------------------------------------

    fn dealer_upcard_is_ace(&self) -> bool {
        self.dealer_hand.first().is_some_and(|c| c.rank == 1)
    }

    fn insurance_bet_amount(&self, i: usize) -> Chips {
        self.players[i].bet / 2
    }

    pub(crate) fn can_take_insurance(&self, i: usize) -> bool {
        if !self.options.allow_insurance || !self.dealer_upcard_is_ace() {
            return false;
        }
        let p = &self.players[i];
        if p.bet == 0 || p.has_blackjack || p.insurance_decision_done {
            return false;
        }
        let amount = self.insurance_bet_amount(i);
        amount > 0 && p.chips >= amount
    }

    pub(crate) fn can_take_even_money(&self, i: usize) -> bool {
        if !self.options.allow_insurance || !self.dealer_upcard_is_ace() {
            return false;
        }
        let p = &self.players[i];
        p.bet > 0 && p.has_blackjack && !p.insurance_decision_done
    }

    pub(crate) fn needs_insurance_decision(&self, i: usize) -> bool {
        let p = &self.players[i];
        if p.bet == 0 || p.insurance_decision_done {
            return false;
        }
        self.can_take_insurance(i) || self.can_take_even_money(i)
    }

    pub(crate) fn can_split(&self, i: usize) -> bool {
        let p = &self.players[i];
        if p.active_hand != HandSlot::Main
            || self.options.max_split_hands <= 1
            || p.split_bet > 0
            || p.hand.len() != 2
            || p.bet == 0
            || p.chips < p.bet
        {
            return false;
        }
        match self.options.split_rule {
            super::options::SplitRule::SameRank => p.hand[0].rank == p.hand[1].rank,
            super::options::SplitRule::SameValue => {
                crate::game::scoring::blackjack_card_value(p.hand[0])
                    == crate::game::scoring::blackjack_card_value(p.hand[1])
            }
        }
    }

    pub(crate) fn can_double_down(&self, i: usize) -> bool {
        let p = &self.players[i];
        let hand = self.current_hand(i);
        let bet = self.current_bet(i);
        if hand.len() != 2 {
            return false;
        }
        if p.active_hand == HandSlot::Split && !self.options.allow_double_after_split {
            return false;
        }
        if self.is_current_hand_locked_after_split_aces(i) {
            return false;
        }
        if bet == 0 || p.chips < bet {
            return false;
        }
        let (total, _) = blackjack_total(hand);
        self.options.double_down_rule.allows_total(total)
    }

    pub(crate) fn can_surrender(&self, i: usize) -> bool {
        let p = &self.players[i];
        self.options.allow_late_surrender
            && p.active_hand == HandSlot::Main
            && p.split_bet == 0
            && p.hand.len() == 2
            && !p.has_blackjack
            && !p.surrendered_main
            && p.bet > 0
            && !p.hand_done
    }

    // ------------------------------------------------------------------
    // Action availability
    // ------------------------------------------------------------------

    fn is_turn_action_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        if self.status != GameStatus::Playing {
            return Some("action-not-playing");
        }
        if self.phase != BlackjackPhase::Players {
            return Some("blackjack-not-player-phase");
        }
        let Some(i) = self.idx_of(player) else {
            return Some("action-unknown-player");
        };
        if self.players[i].seat.is_spectator {
            return Some("action-spectator");
        }
        if !self.is_current(player) {
            return Some("action-not-your-turn");
        }
        if self.current_hand_done(i) {
            return Some("blackjack-hand-complete");
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

    fn is_split_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        self.is_turn_action_enabled(player).or_else(|| {
            let i = self.idx_of(player)?;
            if self.can_split(i) {
                None
            } else {
                Some("blackjack-cannot-split")
            }
        })
    }

    fn is_double_down_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        self.is_turn_action_enabled(player).or_else(|| {
            let i = self.idx_of(player)?;
            if self.can_double_down(i) {
                None
            } else {
                Some("blackjack-cannot-double-down")
            }
        })
    }

    fn is_surrender_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        self.is_turn_action_enabled(player).or_else(|| {
            let i = self.idx_of(player)?;
            if self.can_surrender(i) {
                None
            } else {
                Some("blackjack-cannot-surrender")
            }
        })
    }

    fn is_insurance_turn_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        if self.status != GameStatus::Playing {
            return Some("action-not-playing");
        }
        if self.phase != BlackjackPhase::Insurance {
            return Some("blackjack-not-insurance-phase");
        }
        let Some(i) = self.idx_of(player) else {
            return Some("action-unknown-player");
        };
        if self.players[i].seat.is_spectator {
            return Some("action-spectator");
        }
        if !self.is_current(player) {
            return Some("action-not-your-turn");
        }
        if !self.needs_insurance_decision(i) {
            return Some("blackjack-insurance-closed");
        }
        None
    }

    fn is_insurance_action_hidden(&self, player: &PlayerId) -> Visibility {
        if self.is_insurance_turn_enabled(player).is_some() {
            Visibility::Hidden
        } else {
            Visibility::Visible
        }
    }

    fn is_take_insurance_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        self.is_insurance_turn_enabled(player).or_else(|| {
            let i = self.idx_of(player)?;
            if self.can_take_insurance(i) {
                None
            } else {
                Some("blackjack-cannot-insure")
            }
        })
    }

    fn is_even_money_enabled(&self, player: &PlayerId) -> Option<&'static str> {
        self.is_insurance_turn_enabled(player).or_else(|| {
            let i = self.idx_of(player)?;
            if self.can_take_even_money(i) {
                None
            } else {
                Some("blackjack-cannot-even-money")
            }
        })
    }

    fn is_check_enabled(&self, _player: &PlayerId) -> Option<&'static str> {
        if self.status != GameStatus::Playing {
            return Some("action-not-playing");
        }
        None
    }

    fn always_hidden(&self, _player: &PlayerId) -> Visibility {
        Visibility::Hidden
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
                id: ACTION_DOUBLE_DOWN,
                label_key: "blackjack-double-down",
                label_args: None,
                enabled: Self::is_double_down_enabled,
                hidden: Self::is_turn_action_hidden,
                handler: Self::action_double_down,
                input: None,
            },
            ActionSpec {
                id: ACTION_SPLIT,
                label_key: "blackjack-split",
                label_args: None,
                enabled: Self::is_split_enabled,
                hidden: Self::is_turn_action_hidden,
                handler: Self::action_split,
                input: None,
            },
            ActionSpec {
                id: ACTION_SURRENDER,
                label_key: "blackjack-surrender",
                label_args: None,
                enabled: Self::is_surrender_enabled,
                hidden: Self::is_turn_action_hidden,
                handler: Self::action_surrender,
                input: None,
            },
            ActionSpec {
                id: ACTION_TAKE_INSURANCE,
                label_key: "blackjack-take-insurance",
                label_args: None,
                enabled: Self::is_take_insurance_enabled,
                hidden: Self::is_insurance_action_hidden,
                handler: Self::action_take_insurance,
                input: None,
            },
            ActionSpec {
                id: ACTION_EVEN_MONEY,
                label_key: "blackjack-even-money",
                label_args: None,
                enabled: Self::is_even_money_enabled,
                hidden: Self::is_insurance_action_hidden,
                handler: Self::action_even_money,
                input: None,
            },
            ActionSpec {
                id: ACTION_DECLINE_INSURANCE,
                label_key: "blackjack-decline-insurance",
                label_args: None,
                enabled: Self::is_insurance_turn_enabled,
                hidden: Self::is_insurance_action_hidden,
                handler: Self::action_decline_insurance,
                input: None,
            },
            ActionSpec {
                id: ACTION_READ_HAND,
                label_key: "blackjack-read-hand",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_read_hand,
                input: None,
            },
            ActionSpec {
                id: ACTION_READ_DEALER,
                label_key: "blackjack-read-dealer",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_read_dealer,
                input: None,
            },
            ActionSpec {
                id: ACTION_TABLE_STATUS,
                label_key: "blackjack-table-status",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_table_status,
                input: None,
            },
            ActionSpec {
                id: ACTION_READ_RULES,
                label_key: "blackjack-read-rules",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_read_rules,
                input: None,
            },
            ActionSpec {
                id: ACTION_CHECK_TURN_TIMER,
                label_key: "poker-check-turn-timer",
                label_args: None,
                enabled: Self::is_check_enabled,
                hidden: Self::always_hidden,
                handler: Self::action_check_turn_timer,
                input: None,
            },
        ]
    }

    // ------------------------------------------------------------------
    // Hand flow
    // ------------------------------------------------------------------

    pub(crate) fn start_new_hand(&mut self) {
        self.phase = BlackjackPhase::Players;
        self.hand_number += 1;
        self.timer.clear();

        let competitors = self.active_idxs();
        let funded: Vec<usize> = competitors
            .iter()
            .copied()
            .filter(|&i| self.players[i].chips > 0)
            .collect();
        if funded.is_empty() {
            self.end_game(None);
            return;
        }
        // Multiplayer ends when one stack remains; a solo player keeps
        // getting hands until they bust out.
        if competitors.len() > 1 && funded.len() <= 1 {
            self.end_game(funded.first().copied());
            return;
        }

        for &i in &funded {
            self.players[i].reset_for_hand();
        }
        self.dealer_hand.clear();
        self.dealer_hole_revealed = false;

        self.outbox
            .broadcast("blackjack-hand-start", margs![("hand", self.hand_number)]);
        self.ensure_deck(funded.len() * 6);
        self.post_bets(&funded);
        self.deal_initial_cards(&funded);

        if self.should_offer_insurance(&funded) {
            self.start_insurance_phase(&funded);
            return;
        }

        if is_natural(&self.dealer_hand) && self.options.dealer_peeks_blackjack {
            self.reveal_dealer_hand();
            self.outbox.broadcast("blackjack-dealer-blackjack", margs![]);
            self.settle_hand();
            return;
        }

        self.start_player_phase();
    }

    fn ensure_deck(&mut self, min_cards: usize) {
        if self.deck.len() >= min_cards.max(1) {
            return;
        }
        self.deck = DeckFactory::standard_deck(self.options.deck_count);
        self.deck.shuffle(&mut self.rng);
        log::debug!("blackjack: rebuilt {}-deck shoe", self.options.deck_count);
    }

    fn draw_card(&mut self) -> Option<Card> {
        self.ensure_deck(1);
        self.deck.draw()
    }

    fn post_bets(&mut self, idxs: &[usize]) {
        for &i in idxs {
            let chips = self.players[i].chips;
            if chips == 0 {
                let p = &mut self.players[i];
                p.bet = 0;
                p.hand_done = true;
                continue;
            }
            let mut bet = chips
                .min(self.options.base_bet)
                .min(self.options.table_max_bet);
            if chips >= self.options.table_min_bet && bet < self.options.table_min_bet {
                bet = self.options.table_min_bet;
            }
            if bet == 0 {
                let p = &mut self.players[i];
                p.bet = 0;
                p.hand_done = true;
                continue;
            }
            let p = &mut self.players[i];
            p.chips -= bet;
            p.bet = bet;
            let id = p.seat.id.clone();
            self.outbox.personal_echo(
                id,
                "blackjack-you-bet",
                "blackjack-player-bets",
                margs![("amount", bet)],
            );
        }
    }

    fn deal_initial_cards(&mut self, idxs: &[usize]) {
        // Card-by-card alternating rounds; the order matters for the
        // face-up broadcasts, not for fairness.
        for _ in 0..2 {
            for &i in idxs {
                if self.players[i].bet == 0 {
                    continue;
                }
                if let Some(card) = self.draw_card() {
                    self.players[i].hand.push(card);
                }
            }
            if let Some(card) = self.draw_card() {
                self.dealer_hand.push(card);
            }
        }

        if let Some(&up) = self.dealer_hand.first() {
            self.outbox
                .broadcast("blackjack-dealer-shows", margs![("card", up)]);
        }

        for &i in idxs {
            if self.players[i].bet == 0 {
                continue;
            }
            let (total, soft) = blackjack_total(&self.players[i].hand);
            let hand = self.players[i].hand.clone();
            let id = self.players[i].seat.id.clone();
            let args = margs![
                ("cards", hand.as_slice()),
                ("total", total),
                ("soft", soft)
            ];
            if self.options.players_cards_face_up {
                self.outbox.personal_echo(
                    id.clone(),
                    "blackjack-you-have",
                    "blackjack-player-has",
                    args,
                );
            } else {
                self.outbox.personal(id.clone(), "blackjack-you-have", args);
            }
            if is_natural(&self.players[i].hand) {
                let p = &mut self.players[i];
                p.has_blackjack = true;
                p.hand_done = true;
                p.stood = true;
                self.outbox.personal_echo(
                    id,
                    "blackjack-you-blackjack",
                    "blackjack-player-blackjack",
                    margs![],
                );
            }
        }
    }

    fn should_offer_insurance(&self, idxs: &[usize]) -> bool {
        self.options.allow_insurance
            && self.dealer_upcard_is_ace()
            && idxs
                .iter()
                .any(|&i| self.can_take_insurance(i) || self.can_take_even_money(i))
    }

    fn start_insurance_phase(&mut self, idxs: &[usize]) {
        self.phase = BlackjackPhase::Insurance;
        self.timer.clear();
        self.outbox.broadcast("blackjack-insurance-offer", margs![]);
        for &i in idxs {
            let needs = self.needs_insurance_decision(i);
            self.players[i].insurance_decision_done = !needs;
        }

        let order: Vec<PlayerId> = idxs
            .iter()
            .copied()
            .filter(|&i| self.needs_insurance_decision(i))
            .map(|i| self.players[i].seat.id.clone())
            .collect();
        self.turn_order.set(order, true);
        if self.turn_order.is_empty() {
            self.finish_insurance_phase();
            return;
        }
        self.start_insurance_turn();
    }

    fn start_insurance_turn(&mut self) {
        let Some(i) = self.current_player_idx() else {
            self.finish_insurance_phase();
            return;
        };
        if !self.needs_insurance_decision(i) {
            self.advance_insurance_to_next_player();
            return;
        }

        let id = self.players[i].seat.id.clone();
        if self.can_take_even_money(i) {
            self.outbox.personal_echo(
                id.clone(),
                "blackjack-insurance-prompt-even-money",
                "blackjack-insurance-prompt-even-money-player",
                margs![],
            );
        } else if self.can_take_insurance(i) {
            let amount = self.insurance_bet_amount(i);
            self.outbox.personal_echo(
                id.clone(),
                "blackjack-insurance-prompt",
                "blackjack-insurance-prompt-player",
                margs![("amount", amount)],
            );
        }

        self.announce_turn(i);
        if self.players[i].seat.is_bot {
            let ticks = self.rng.random_range(20..=35);
            self.bots.jolt(id, ticks);
        }
        self.start_turn_timer();
        self.outbox.menu_refresh();
    }

    fn advance_insurance_to_next_player(&mut self) {
        if self.turn_order.is_empty() {
            self.finish_insurance_phase();
            return;
        }
        for _ in 0..self.turn_order.len() {
            self.turn_order.advance();
            let Some(i) = self.current_player_idx() else {
                continue;
            };
            if self.needs_insurance_decision(i) {
                self.start_insurance_turn();
                return;
            }
        }
        self.finish_insurance_phase();
    }

    fn finish_insurance_phase(&mut self) {
        self.timer.clear();
        for i in self.active_idxs() {
            if self.needs_insurance_decision(i) {
                self.players[i].insurance_decision_done = true;
            }
        }

        if is_natural(&self.dealer_hand) && self.options.dealer_peeks_blackjack {
            self.reveal_dealer_hand();
            self.outbox.broadcast("blackjack-dealer-blackjack", margs![]);
            self.settle_hand();
            return;
        }

        self.start_player_phase();
    }

    fn start_player_phase(&mut self) {
        self.phase = BlackjackPhase::Players;
        let order: Vec<PlayerId> = self
            .active_idxs()
            .into_iter()
            .filter(|&i| self.has_pending_hand(i))
            .map(|i| self.players[i].seat.id.clone())
            .collect();
        self.turn_order.set(order, true);
        if self.turn_order.is_empty() {
            self.settle_hand();
            return;
        }
        self.start_turn();
    }

    fn start_turn(&mut self) {
        let Some(i) = self.current_player_idx() else {
            self.play_dealer_turn();
            return;
        };
        self.select_first_pending_hand(i);
        if self.current_hand_done(i) {
            self.advance_to_next_player();
            return;
        }

        self.announce_turn(i);
        self.announce_player_total(i);

        if self.players[i].seat.is_bot {
            let ticks = self.rng.random_range(20..=35);
            let id = self.players[i].seat.id.clone();
            self.bots.jolt(id, ticks);
        }
        self.start_turn_timer();
        self.outbox.menu_refresh();
    }

    fn announce_turn(&mut self, i: usize) {
        let name = self.players[i].seat.name.clone();
        self.outbox
            .broadcast("game-turn-start", margs![("player", name)]);
        self.outbox.sound("game_cards/turn.ogg");
    }

    fn advance_to_next_player(&mut self) {
        if let Some(i) = self.current_player_idx()
            && self.switch_to_next_hand(i)
        {
            self.start_turn();
            return;
        }

        if self.turn_order.is_empty() {
            self.play_dealer_turn();
            return;
        }

        for _ in 0..self.turn_order.len() {
            self.turn_order.advance();
            let Some(i) = self.current_player_idx() else {
                continue;
            };
            self.select_first_pending_hand(i);
            if self.current_hand_done(i) {
                continue;
            }
            self.start_turn();
            return;
        }

        self.play_dealer_turn();
    }

    pub(crate) fn play_dealer_turn(&mut self) {
        self.phase = BlackjackPhase::Dealer;
        self.timer.clear();
        self.reveal_dealer_hand();

        loop {
            let (total, soft) = blackjack_total(&self.dealer_hand);
            let mut should_hit = total < 17;
            if total == 17 && soft && self.options.dealer_hits_soft_17 {
                should_hit = true;
            }
            if !should_hit {
                break;
            }
            let Some(card) = self.draw_card() else {
                break;
            };
            self.dealer_hand.push(card);
            self.outbox.sound("game_cards/draw3.ogg");
            let (t, s) = blackjack_total(&self.dealer_hand);
            self.outbox.broadcast(
                "blackjack-dealer-hits",
                margs![
                    ("card", card),
                    ("cards", self.dealer_hand.as_slice()),
                    ("total", t),
                    ("soft", s)
                ],
            );
        }

        let (total, soft) = blackjack_total(&self.dealer_hand);
        let key = if total > 21 {
            "blackjack-dealer-bust"
        } else {
            "blackjack-dealer-stands"
        };
        self.outbox
            .broadcast(key, margs![("total", total), ("soft", soft)]);
        self.settle_hand();
    }

    fn reveal_dealer_hand(&mut self) {
        if self.dealer_hole_revealed {
            return;
        }
        self.dealer_hole_revealed = true;
        if self.dealer_hand.len() >= 2 {
            let (total, soft) = blackjack_total(&self.dealer_hand);
            self.outbox.broadcast(
                "blackjack-dealer-reveals",
                margs![
                    ("card", self.dealer_hand[1]),
                    ("cards", self.dealer_hand.as_slice()),
                    ("total", total),
                    ("soft", soft)
                ],
            );
        }
    }

    fn announce_player_total(&mut self, i: usize) {
        let (total, soft) = blackjack_total(self.current_hand(i));
        let p = &self.players[i];
        let id = p.seat.id.clone();
        let split = p.split_bet > 0;
        let hand_number: u32 = match p.active_hand {
            HandSlot::Main => 1,
            HandSlot::Split => 2,
        };
        if split {
            let args = margs![("hand", hand_number), ("total", total), ("soft", soft)];
            if self.options.players_cards_face_up {
                self.outbox.personal_echo(
                    id,
                    "blackjack-your-total-hand",
                    "blackjack-player-total-hand",
                    args,
                );
            } else {
                self.outbox.personal(id, "blackjack-your-total-hand", args);
            }
            return;
        }
        let args = margs![("total", total), ("soft", soft)];
        if self.options.players_cards_face_up {
            self.outbox
                .personal_echo(id, "blackjack-your-total", "blackjack-player-total", args);
        } else {
            self.outbox.personal(id, "blackjack-your-total", args);
        }
    }

    fn start_turn_timer(&mut self) {
        let seconds = self.options.turn_timer_seconds;
        if seconds == 0 {
            self.timer.clear();
        } else {
            self.timer.start(seconds);
        }
    }

    fn handle_turn_timeout(&mut self) {
        let Some(i) = self.current_player_idx() else {
            return;
        };
        let fallback = if self.phase == BlackjackPhase::Insurance {
            ACTION_DECLINE_INSURANCE
        } else {
            ACTION_STAND
        };
        let action = bot::bot_think(self, i).unwrap_or(fallback);
        let id = self.players[i].seat.id.clone();
        log::debug!("blackjack: turn timer expired for {id}, running {action}");
        self.execute_action(&id, action, None);
    }

    fn rejolt_current_if_bot(&mut self) {
        if let Some(i) = self.current_player_idx()
            && self.players[i].seat.is_bot
        {
            let ticks = self.rng.random_range(6..=12);
            let id = self.players[i].seat.id.clone();
            self.bots.jolt(id, ticks);
        }
    }

    fn evaluate_current_hand_after_draw(&mut self, i: usize) {
        let (total, soft) = blackjack_total(self.current_hand(i));
        let id = self.players[i].seat.id.clone();
        if total > 21 {
            self.bust_current_hand(i);
            self.outbox.personal_echo(
                id,
                "blackjack-you-bust",
                "blackjack-player-bust",
                margs![("total", total), ("soft", soft)],
            );
            self.advance_to_next_player();
            return;
        }
        if total == 21 {
            self.stand_current_hand(i);
            self.outbox.personal_echo(
                id,
                "blackjack-you-stand-auto",
                "blackjack-player-stands-auto",
                margs![],
            );
            self.advance_to_next_player();
            return;
        }
        self.announce_player_total(i);
        self.start_turn_timer();
        self.rejolt_current_if_bot();
        self.outbox.menu_refresh();
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
        if self.is_current_hand_locked_after_split_aces(i) {
            return;
        }
        let Some(card) = self.draw_card() else {
            return;
        };
        self.current_hand_mut(i).push(card);
        self.outbox.sound("game_cards/draw3.ogg");
        let id = self.players[i].seat.id.clone();
        self.outbox.personal_echo(
            id,
            "blackjack-you-hit",
            "blackjack-player-hits",
            margs![("card", card)],
        );
        self.evaluate_current_hand_after_draw(i);
    }

    fn action_stand(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_turn_action_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        self.stand_current_hand(i);
        let id = self.players[i].seat.id.clone();
        self.outbox.personal_echo(
            id,
            "blackjack-you-stand",
            "blackjack-player-stands",
            margs![],
        );
        self.advance_to_next_player();
    }

    fn action_surrender(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_surrender_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let bet = self.current_bet(i);
        if bet == 0 {
            return;
        }
        let refund = bet / 2;
        let loss = bet - refund;
        self.players[i].chips += refund;
        self.set_current_surrendered(i);
        self.stand_current_hand(i);
        let id = self.players[i].seat.id.clone();
        self.outbox.personal_echo(
            id,
            "blackjack-you-surrender",
            "blackjack-player-surrenders",
            margs![("amount", loss)],
        );
        self.advance_to_next_player();
    }

    fn action_double_down(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_double_down_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let bet = self.current_bet(i);
        if bet == 0 {
            return;
        }

        self.players[i].chips -= bet;
        self.set_current_bet(i, bet * 2);
        self.set_current_doubled(i);

        let id = self.players[i].seat.id.clone();
        self.outbox.personal_echo(
            id.clone(),
            "blackjack-you-double-down",
            "blackjack-player-double-downs",
            margs![("amount", bet)],
        );

        if let Some(card) = self.draw_card() {
            self.current_hand_mut(i).push(card);
            self.outbox.sound("game_cards/draw3.ogg");
            self.outbox.personal_echo(
                id.clone(),
                "blackjack-you-hit",
                "blackjack-player-hits",
                margs![("card", card)],
            );
        }

        let (total, soft) = blackjack_total(self.current_hand(i));
        if total > 21 {
            self.bust_current_hand(i);
            self.outbox.personal_echo(
                id,
                "blackjack-you-bust",
                "blackjack-player-bust",
                margs![("total", total), ("soft", soft)],
            );
        } else {
            self.stand_current_hand(i);
            self.outbox.personal_echo(
                id,
                "blackjack-you-stand",
                "blackjack-player-stands",
                margs![],
            );
        }
        self.advance_to_next_player();
    }

    fn action_split(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_split_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };

        let split_is_aces = {
            let p = &self.players[i];
            p.hand[0].rank == 1 && p.hand[1].rank == 1
        };
        {
            let p = &mut self.players[i];
            let Some(split_card) = p.hand.pop() else {
                return;
            };
            p.split_hand = vec![split_card];
            p.split_bet = p.bet;
            p.split_hand_done = false;
            p.split_stood = false;
            p.split_busted = false;
            p.split_has_blackjack = false;
            p.split_from_split_aces = split_is_aces;

            p.chips -= p.bet;
            p.active_hand = HandSlot::Main;
            p.has_blackjack = false;
            p.hand_done = false;
            p.stood = false;
            p.busted = false;
            p.surrendered_main = false;
            p.surrendered_split = false;
            p.main_from_split_aces = split_is_aces;
        }

        if let Some(card) = self.draw_card() {
            self.players[i].hand.push(card);
        }
        if let Some(card) = self.draw_card() {
            self.players[i].split_hand.push(card);
        }

        let bet = self.players[i].bet;
        let id = self.players[i].seat.id.clone();
        self.outbox.personal_echo(
            id.clone(),
            "blackjack-you-split",
            "blackjack-player-splits",
            margs![("amount", bet)],
        );

        if split_is_aces && self.options.split_aces_count_as_blackjack {
            let p = &mut self.players[i];
            p.has_blackjack = p.hand.len() == 2 && blackjack_total(&p.hand).0 == 21;
            p.split_has_blackjack =
                p.split_hand.len() == 2 && blackjack_total(&p.split_hand).0 == 21;
        }

        if split_is_aces && self.options.split_aces_one_card_only {
            let p = &mut self.players[i];
            p.hand_done = true;
            p.stood = true;
            p.split_hand_done = true;
            p.split_stood = true;
            self.outbox.personal_echo(
                id,
                "blackjack-you-split-aces-auto-stand",
                "blackjack-player-splits-aces-auto-stand",
                margs![],
            );
            self.advance_to_next_player();
            return;
        }

        let (total, _) = blackjack_total(&self.players[i].hand);
        if total == 21 {
            self.stand_current_hand(i);
            self.outbox.personal_echo(
                id,
                "blackjack-you-stand-auto",
                "blackjack-player-stands-auto",
                margs![],
            );
            self.advance_to_next_player();
            return;
        }

        self.announce_player_total(i);
        self.start_turn_timer();
        self.rejolt_current_if_bot();
        self.outbox.menu_refresh();
    }

    fn action_take_insurance(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_take_insurance_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let amount = self.insurance_bet_amount(i);
        if amount == 0 || self.players[i].chips < amount {
            return;
        }
        let p = &mut self.players[i];
        p.chips -= amount;
        p.insurance_bet = amount;
        p.insurance_decision_done = true;
        let id = p.seat.id.clone();
        self.outbox.personal_echo(
            id,
            "blackjack-you-take-insurance",
            "blackjack-player-takes-insurance",
            margs![("amount", amount)],
        );
        self.advance_insurance_to_next_player();
    }

    fn action_even_money(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_even_money_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let p = &mut self.players[i];
        p.took_even_money = true;
        p.insurance_decision_done = true;
        let id = p.seat.id.clone();
        self.outbox.personal_echo(
            id,
            "blackjack-you-take-even-money",
            "blackjack-player-takes-even-money",
            margs![],
        );
        self.advance_insurance_to_next_player();
    }

    fn action_decline_insurance(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_insurance_turn_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        self.players[i].insurance_decision_done = true;
        let id = self.players[i].seat.id.clone();
        self.outbox.personal_echo(
            id,
            "blackjack-you-decline-insurance",
            "blackjack-player-declines-insurance",
            margs![],
        );
        self.advance_insurance_to_next_player();
    }

    // ------------------------------------------------------------------
    // Status readouts
    // ------------------------------------------------------------------

    fn action_read_hand(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        let Some(i) = self.idx_of(player) else {
            return;
        };
        let p = &self.players[i];
        let id = p.seat.id.clone();
        if p.split_bet > 0 && !p.split_hand.is_empty() {
            let (total1, soft1) = blackjack_total(&p.hand);
            let (total2, soft2) = blackjack_total(&p.split_hand);
            let active: u32 = match p.active_hand {
                HandSlot::Main => 1,
                HandSlot::Split => 2,
            };
            let args = margs![
                ("hand1", p.hand.as_slice()),
                ("total1", total1),
                ("soft1", soft1),
                ("hand2", p.split_hand.as_slice()),
                ("total2", total2),
                ("soft2", soft2),
                ("active", active)
            ];
            self.outbox
                .personal(id, "blackjack-read-hand-response-split", args);
            return;
        }
        let (total, soft) = blackjack_total(&p.hand);
        let args = margs![
            ("cards", p.hand.as_slice()),
            ("total", total),
            ("soft", soft)
        ];
        self.outbox.personal(id, "blackjack-read-hand-response", args);
    }

    fn action_read_dealer(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        let id = player.clone();
        if self.dealer_hand.is_empty() {
            self.outbox.personal(id, "blackjack-no-dealer-cards", margs![]);
            return;
        }
        if !self.dealer_hole_revealed {
            self.outbox.personal(
                id,
                "blackjack-read-dealer-up",
                margs![("card", self.dealer_hand[0])],
            );
            return;
        }
        let (total, soft) = blackjack_total(&self.dealer_hand);
        self.outbox.personal(
            id,
            "blackjack-read-dealer-full",
            margs![
                ("cards", self.dealer_hand.as_slice()),
                ("total", total),
                ("soft", soft)
            ],
        );
    }

    fn can_view_player_cards(&self, viewer: &PlayerId, target: usize) -> bool {
        self.options.players_cards_face_up || self.players[target].seat.id == *viewer
    }

    fn action_table_status(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        let viewer = player.clone();
        self.push_rules_readout(viewer.clone());

        for i in self.active_idxs() {
            let can_view = self.can_view_player_cards(&viewer, i);
            let p = &self.players[i];
            let name = p.seat.name.clone();
            if can_view && p.split_bet > 0 && !p.hand.is_empty() && !p.split_hand.is_empty() {
                let (total1, soft1) = blackjack_total(&p.hand);
                let (total2, soft2) = blackjack_total(&p.split_hand);
                let args = margs![
                    ("player", name),
                    ("chips", p.chips),
                    ("bet1", p.bet),
                    ("total1", total1),
                    ("soft1", soft1),
                    ("bet2", p.split_bet),
                    ("total2", total2),
                    ("soft2", soft2)
                ];
                self.outbox
                    .personal(viewer.clone(), "blackjack-status-line-hands", args);
            } else if can_view
                && self.phase == BlackjackPhase::Players
                && p.bet > 0
                && !p.hand.is_empty()
            {
                let (total, soft) = blackjack_total(&p.hand);
                let args = margs![
                    ("player", name),
                    ("chips", p.chips),
                    ("bet", p.bet),
                    ("total", total),
                    ("soft", soft)
                ];
                self.outbox
                    .personal(viewer.clone(), "blackjack-status-line-hand", args);
            } else if p.bet + p.split_bet > 0 {
                let args = margs![
                    ("player", name),
                    ("chips", p.chips),
                    ("bet", p.bet + p.split_bet)
                ];
                self.outbox
                    .personal(viewer.clone(), "blackjack-status-line-bet", args);
            } else {
                let args = margs![("player", name), ("chips", p.chips)];
                self.outbox
                    .personal(viewer.clone(), "blackjack-status-line", args);
            }
        }

        if !self.dealer_hand.is_empty() {
            if self.dealer_hole_revealed {
                let (total, soft) = blackjack_total(&self.dealer_hand);
                self.outbox.personal(
                    viewer,
                    "blackjack-status-dealer",
                    margs![
                        ("cards", self.dealer_hand.as_slice()),
                        ("total", total),
                        ("soft", soft)
                    ],
                );
            } else {
                self.outbox.personal(
                    viewer,
                    "blackjack-status-dealer-up",
                    margs![("card", self.dealer_hand[0])],
                );
            }
        }
    }

    fn push_rules_readout(&mut self, to: PlayerId) {
        let o = &self.options;
        let args = margs![
            ("profile", o.rules_profile.label_key()),
            ("min_bet", o.table_min_bet),
            ("max_bet", o.table_max_bet),
            ("base_bet", o.base_bet),
            ("soft_17", o.dealer_hits_soft_17),
            ("peek", o.dealer_peeks_blackjack),
            ("insurance", o.allow_insurance),
            ("surrender", o.allow_late_surrender),
            ("payout", o.blackjack_payout.label_key()),
            ("double_rule", o.double_down_rule.label_key()),
            ("das", o.allow_double_after_split),
            ("split_rule", o.split_rule.label_key()),
            ("split_hands", o.max_split_hands),
            ("split_aces_one", o.split_aces_one_card_only),
            ("split_aces_blackjack", o.split_aces_count_as_blackjack),
            ("players_cards_face_up", o.players_cards_face_up)
        ];
        self.outbox.personal(to, "blackjack-rules-readout", args);
    }

    fn action_read_rules(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        self.push_rules_readout(player.clone());
    }

    fn action_check_turn_timer(&mut self, player: &PlayerId, _input: Option<&str>) {
        if self.is_check_enabled(player).is_some() {
            return;
        }
        let remaining = self.timer.seconds_remaining();
        if remaining == 0 {
            self.outbox
                .personal(player.clone(), "poker-timer-disabled", margs![]);
        } else {
            self.outbox.personal(
                player.clone(),
                "poker-timer-remaining",
                margs![("seconds", remaining)],
            );
        }
    }

    // ------------------------------------------------------------------
    // Settlement
    // ------------------------------------------------------------------

    pub(crate) fn settle_hand(&mut self) {
        self.phase = BlackjackPhase::Settle;
        self.timer.clear();

        let (dealer_total, _) = blackjack_total(&self.dealer_hand);
        let dealer_natural = is_natural(&self.dealer_hand);
        let dealer_bust = dealer_total > 21;

        for i in self.active_idxs() {
            let insurance_bet = self.players[i].insurance_bet;
            if insurance_bet > 0 {
                let id = self.players[i].seat.id.clone();
                if dealer_natural {
                    self.players[i].chips += insurance_bet * 3;
                    self.outbox.personal_echo(
                        id,
                        "blackjack-you-insurance-wins",
                        "blackjack-player-insurance-wins",
                        margs![("amount", insurance_bet * 2)],
                    );
                } else {
                    self.outbox.personal_echo(
                        id,
                        "blackjack-you-insurance-loses",
                        "blackjack-player-insurance-loses",
                        margs![("amount", insurance_bet)],
                    );
                }
            }

            // (slot, total, bet, busted, natural, surrendered) per sub-hand.
            let rows: Vec<(HandSlot, u8, Chips, bool, bool, bool)> = {
                let p = &self.players[i];
                let mut rows = Vec::with_capacity(2);
                if p.bet > 0 {
                    rows.push((
                        HandSlot::Main,
                        blackjack_total(&p.hand).0,
                        p.bet,
                        p.busted,
                        p.has_blackjack,
                        p.surrendered_main,
                    ));
                }
                if p.split_bet > 0 {
                    rows.push((
                        HandSlot::Split,
                        blackjack_total(&p.split_hand).0,
                        p.split_bet,
                        p.split_busted,
                        p.split_has_blackjack,
                        p.surrendered_split,
                    ));
                }
                rows
            };
            if rows.is_empty() {
                continue;
            }

            let took_even_money = self.players[i].took_even_money;
            for (slot, player_total, bet, busted, natural, surrendered) in rows {
                if surrendered {
                    // Already resolved at surrender time.
                    continue;
                }
                if slot == HandSlot::Main && took_even_money {
                    self.players[i].chips += bet * 2;
                    self.settle_message(i, slot, SettleOutcome::EvenMoney, bet);
                    continue;
                }
                if busted {
                    self.settle_message(i, slot, SettleOutcome::Lose, bet);
                    continue;
                }
                if natural && !dealer_natural {
                    let payout = self.options.blackjack_payout.total_payout(bet);
                    self.players[i].chips += payout;
                    self.settle_message(i, slot, SettleOutcome::Win, payout - bet);
                } else if dealer_natural && !natural {
                    self.settle_message(i, slot, SettleOutcome::Lose, bet);
                } else if dealer_bust || player_total > dealer_total {
                    self.players[i].chips += bet * 2;
                    self.settle_message(i, slot, SettleOutcome::Win, bet);
                } else if player_total == dealer_total {
                    self.players[i].chips += bet;
                    self.settle_message(i, slot, SettleOutcome::Push, 0);
                } else {
                    self.settle_message(i, slot, SettleOutcome::Lose, bet);
                }
            }

            if self.players[i].chips == 0 {
                let id = self.players[i].seat.id.clone();
                self.outbox.personal_echo(
                    id,
                    "blackjack-you-broke",
                    "blackjack-player-broke",
                    margs![],
                );
            }
        }

        let competitors = self.active_idxs();
        let remaining: Vec<usize> = competitors
            .iter()
            .copied()
            .filter(|&i| self.players[i].chips > 0)
            .collect();
        if remaining.is_empty() {
            self.end_game(None);
            return;
        }
        if competitors.len() > 1 && remaining.len() <= 1 {
            self.end_game(remaining.first().copied());
            return;
        }

        self.next_hand_wait_ticks = NEXT_HAND_WAIT_TICKS;
        self.outbox.menu_refresh();
    }

    fn settle_message(&mut self, i: usize, slot: HandSlot, outcome: SettleOutcome, amount: Chips) {
        let p = &self.players[i];
        let id = p.seat.id.clone();
        let is_split = p.split_bet > 0;
        let hand_number: u32 = match slot {
            HandSlot::Main => 1,
            HandSlot::Split => 2,
        };
        match outcome {
            SettleOutcome::EvenMoney => self.outbox.personal_echo(
                id,
                "blackjack-you-even-money-win",
                "blackjack-player-even-money-win",
                margs![("amount", amount)],
            ),
            SettleOutcome::Win => {
                if is_split {
                    self.outbox.personal_echo(
                        id,
                        "blackjack-you-win-hand",
                        "blackjack-player-wins-hand",
                        margs![("hand", hand_number), ("amount", amount)],
                    );
                } else {
                    self.outbox.personal_echo(
                        id,
                        "blackjack-you-win",
                        "blackjack-player-wins",
                        margs![("amount", amount)],
                    );
                }
            }
            SettleOutcome::Lose => {
                if is_split {
                    self.outbox.personal_echo(
                        id,
                        "blackjack-you-lose-hand",
                        "blackjack-player-loses-hand",
                        margs![("hand", hand_number), ("amount", amount)],
                    );
                } else {
                    self.outbox.personal_echo(
                        id,
                        "blackjack-you-lose",
                        "blackjack-player-loses",
                        margs![("amount", amount)],
                    );
                }
            }
            SettleOutcome::Push => {
                if is_split {
                    self.outbox.personal_echo(
                        id,
                        "blackjack-you-push-hand",
                        "blackjack-player-push-hand",
                        margs![("hand", hand_number)],
                    );
                } else {
                    self.outbox.personal_echo(
                        id,
                        "blackjack-you-push",
                        "blackjack-player-push",
                        margs![],
                    );
                }
            }
        }
    }

    fn end_game(&mut self, winner: Option<usize>) {
        self.phase = BlackjackPhase::Finished;
        self.status = GameStatus::Finished;
        self.timer.clear();
        self.bots.clear();
        if let Some(i) = winner {
            let id = self.players[i].seat.id.clone();
            let chips = self.players[i].chips;
            self.outbox.personal_echo(
                id,
                "blackjack-you-win-game",
                "blackjack-player-wins-game",
                margs![("chips", chips)],
            );
        }
        self.outbox.finished();
        log::debug!("blackjack: game over after {} hands", self.hand_number);
    }
}

impl GameLogic for BlackjackGame {
    fn game_type(&self) -> GameType {
        GameType::Blackjack
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn phase_name(&self) -> &'static str {
        self.phase.as_str()
    }

    fn prestart_validate(&self) -> Vec<ConfigError> {
        let mut errors = self.options.validate();
        let seats = self.active_idxs().len();
        if seats < MIN_PLAYERS {
            errors.push(ConfigError::NotEnoughPlayers {
                required: MIN_PLAYERS,
            });
        }
        if seats > MAX_PLAYERS {
            errors.push(ConfigError::TooManyPlayers { max: MAX_PLAYERS });
        }
        errors
    }

    fn on_start(&mut self) {
        self.status = GameStatus::Playing;
        self.phase = BlackjackPhase::Players;
        self.hand_number = 0;
        self.next_hand_wait_ticks = 0;
        for i in self.active_idxs() {
            self.players[i].chips = self.options.starting_chips;
        }
        self.start_new_hand();
    }

    fn on_tick(&mut self) {
        self.tick_count += 1;
        if self.status != GameStatus::Playing {
            return;
        }

        if self.next_hand_wait_ticks > 0 {
            self.next_hand_wait_ticks -= 1;
            if self.next_hand_wait_ticks == 0 {
                self.start_new_hand();
            }
            return;
        }

        if matches!(
            self.phase,
            BlackjackPhase::Players | BlackjackPhase::Insurance
        ) && self.timer.tick()
        {
            self.handle_turn_timeout();
        }

        for id in self.bots.on_tick() {
            if self.turn_order.current() != Some(&id) {
                continue;
            }
            if let Some(choice) = self.bot_think(&id) {
                self.execute_action(&id, &choice.action, choice.input.as_deref());
            }
        }
    }

    fn execute_action(&mut self, player: &PlayerId, action_id: &str, input: Option<&str>) {
        let Some(i) = self.idx_of(player) else {
            log::warn!("blackjack: action {action_id} from unknown player {player}");
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
                log::debug!("blackjack: rejected {action_id} from {player}: {reason}");
            }
            actions::DispatchResult::Unknown => {
                log::warn!("blackjack: unknown action id {action_id}");
            }
        }
    }

    fn visible_actions(&self, player: &PlayerId) -> Vec<ActionView> {
        actions::visible_actions(self, &Self::registry(), player)
    }

    fn bot_think(&mut self, player: &PlayerId) -> Option<BotChoice> {
        let i = self.idx_of(player)?;
        bot::bot_think(self, i).map(BotChoice::plain)
    }

    fn drain_messages(&mut self) -> VecDeque<TableMessage> {
        self.outbox.drain()
    }

    fn build_game_result(&self) -> GameResult {
        let active = self.active_idxs();
        let winner = active
            .iter()
            .copied()
            .max_by_key(|&i| self.players[i].chips);
        let final_chips: serde_json::Map<String, serde_json::Value> = active
            .iter()
            .map(|&i| {
                let p = &self.players[i];
                (p.seat.name.clone(), serde_json::json!(p.chips))
            })
            .collect();

        GameResult {
            game_type: GameType::Blackjack,
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
                "winner_chips": winner.map_or(0, |i| self.players[i].chips),
                "final_chips": final_chips,
            }),
        }
    }

    fn rebuild_runtime_state(&mut self) {
        self.timer.clear();
        self.bots.clear();
        if self.status == GameStatus::Playing
            && matches!(
                self.phase,
                BlackjackPhase::Players | BlackjackPhase::Insurance
            )
        {
            self.start_turn_timer();
            if let Some(i) = self.current_player_idx()
                && self.players[i].seat.is_bot
            {
                let ticks = self.rng.random_range(20..=35);
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
        if self.status == GameStatus::Playing && self.phase == BlackjackPhase::Lobby {
            return Err("playing status with lobby phase");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;
    use crate::games::blackjack::options::RulesProfile;
    use crate::games::blackjack::{
        ACTION_DOUBLE_DOWN, ACTION_EVEN_MONEY, ACTION_HIT, ACTION_SPLIT, ACTION_SURRENDER,
        ACTION_TAKE_INSURANCE,
    };

    fn card(id: u32, rank: u8) -> Card {
        Card::new(id, rank, Suit::Club)
    }

    fn pid(s: &str) -> PlayerId {
        PlayerId::new(s)
    }

    fn two_player_game() -> BlackjackGame {
        let mut game = BlackjackGame::with_seed(BlackjackOptions::default(), 11);
        game.add_player("host", "Host", false);
        game.add_player("guest", "Guest", false);
        game.status = GameStatus::Playing;
        game.phase = BlackjackPhase::Players;
        game.turn_order.set(vec![pid("host"), pid("guest")], true);
        game
    }

    #[test]
    fn test_hit_bust_advances_turn() {
        let mut game = two_player_game();
        game.deck = Deck::from_cards(vec![card(9, 10)]);
        game.dealer_hand = vec![card(10, 9), card(11, 7)];
        game.players[0].hand = vec![card(1, 10), card(2, 9)];
        game.players[0].bet = 10;
        game.players[1].hand = vec![card(3, 5), card(4, 6)];
        game.players[1].bet = 10;

        game.execute_action(&pid("host"), ACTION_HIT, None);

        assert!(game.players[0].busted);
        assert!(game.players[0].hand_done);
        assert_eq!(game.turn_order.current(), Some(&pid("guest")));
    }

    #[test]
    fn test_hit_to_exactly_21_auto_stands() {
        let mut game = two_player_game();
        game.deck = Deck::from_cards(vec![card(9, 2)]);
        game.dealer_hand = vec![card(10, 9), card(11, 7)];
        game.players[0].hand = vec![card(1, 10), card(2, 9)];
        game.players[0].bet = 10;
        game.players[1].hand = vec![card(3, 5), card(4, 6)];
        game.players[1].bet = 10;

        game.execute_action(&pid("host"), ACTION_HIT, None);

        assert!(game.players[0].stood);
        assert!(!game.players[0].busted);
        assert_eq!(game.turn_order.current(), Some(&pid("guest")));
    }

    #[test]
    fn test_split_contract() {
        let mut game = two_player_game();
        game.deck = Deck::from_cards(vec![card(900, 3), card(901, 4)]);
        game.players[0].hand = vec![card(1, 8), card(2, 8)];
        game.players[0].bet = 10;
        game.players[0].chips = 90;
        game.players[1].bet = 10;
        game.players[1].hand = vec![card(3, 5), card(4, 6)];

        game.execute_action(&pid("host"), ACTION_SPLIT, None);

        let host = &game.players[0];
        assert_eq!(host.split_bet, 10);
        assert_eq!(host.chips, 80);
        assert_eq!(host.hand.len(), 2);
        assert_eq!(host.split_hand.len(), 2);
        assert_eq!(host.active_hand, HandSlot::Main);
        assert_eq!(game.turn_order.current(), Some(&pid("host")));
    }

    #[test]
    fn test_double_down_contract() {
        let mut game = two_player_game();
        game.deck = Deck::from_cards(vec![card(910, 10)]);
        game.players[0].hand = vec![card(1, 5), card(2, 6)];
        game.players[0].bet = 10;
        game.players[0].chips = 90;
        game.players[1].bet = 10;
        game.players[1].hand = vec![card(3, 5), card(4, 6)];

        game.execute_action(&pid("host"), ACTION_DOUBLE_DOWN, None);

        let host = &game.players[0];
        assert_eq!(host.bet, 20);
        assert_eq!(host.chips, 80);
        assert_eq!(host.hand.len(), 3);
        assert!(host.hand_done);
        assert_eq!(game.turn_order.current(), Some(&pid("guest")));
    }

    #[test]
    fn test_late_surrender_refunds_half_and_advances() {
        let mut game = two_player_game();
        game.players[0].hand = vec![card(1, 10), card(2, 6)];
        game.players[0].bet = 10;
        game.players[0].chips = 90;
        game.players[1].bet = 10;
        game.players[1].hand = vec![card(3, 5), card(4, 6)];

        game.execute_action(&pid("host"), ACTION_SURRENDER, None);

        assert_eq!(game.players[0].chips, 95);
        assert!(game.players[0].surrendered_main);
        assert!(game.players[0].hand_done);
        assert_eq!(game.turn_order.current(), Some(&pid("guest")));
    }

    #[test]
    fn test_insurance_pays_three_to_one_on_dealer_blackjack() {
        let mut game = two_player_game();
        game.phase = BlackjackPhase::Insurance;
        game.turn_order.set(vec![pid("host")], true);
        game.players[0].hand = vec![card(1, 10), card(2, 9)];
        game.players[0].bet = 10;
        game.players[0].chips = 90;
        game.players[1].seat.is_spectator = true;
        game.dealer_hand = vec![card(10, 1), card(11, 13)];

        game.execute_action(&pid("host"), ACTION_TAKE_INSURANCE, None);

        // The rotation empties, the dealer peeks a natural, and the hand
        // settles: 85 after the side-bet, +15 insurance, main hand loses.
        assert_eq!(game.players[0].insurance_bet, 5);
        assert!(game.players[0].insurance_decision_done);
        assert_eq!(game.phase, BlackjackPhase::Settle);
        assert_eq!(game.players[0].chips, 100);
    }

    #[test]
    fn test_insurance_forfeited_without_dealer_blackjack() {
        let mut game = two_player_game();
        game.players[0].hand = vec![card(1, 10), card(2, 9)];
        game.players[0].bet = 10;
        game.players[0].chips = 85;
        game.players[0].insurance_bet = 5;
        game.players[0].hand_done = true;
        game.players[1].seat.is_spectator = true;
        game.dealer_hand = vec![card(10, 1), card(11, 9)];

        game.settle_hand();

        // 19 loses to 20 and the insurance side-bet is simply gone.
        assert_eq!(game.players[0].chips, 85);
    }

    #[test]
    fn test_even_money_pays_one_to_one() {
        let mut game = two_player_game();
        game.phase = BlackjackPhase::Insurance;
        game.turn_order.set(vec![pid("host")], true);
        game.players[0].hand = vec![card(1, 1), card(2, 13)];
        game.players[0].has_blackjack = true;
        game.players[0].bet = 10;
        game.players[0].chips = 90;
        game.players[1].seat.is_spectator = true;
        game.dealer_hand = vec![card(10, 1), card(11, 13)];

        game.execute_action(&pid("host"), ACTION_EVEN_MONEY, None);

        assert!(game.players[0].took_even_money);
        assert_eq!(game.phase, BlackjackPhase::Settle);
        assert_eq!(game.players[0].chips, 110);
    }

    #[test]
    fn test_should_offer_insurance_when_dealer_shows_ace() {
        let mut game = two_player_game();
        game.players[0].bet = 10;
        game.players[0].chips = 100;
        game.players[1].bet = 10;
        game.players[1].chips = 100;
        game.dealer_hand = vec![card(10, 1), card(11, 7)];

        assert!(game.should_offer_insurance(&[0, 1]));

        game.options.allow_insurance = false;
        assert!(!game.should_offer_insurance(&[0, 1]));
    }

    #[test]
    fn test_split_limit_disables_split() {
        let mut game = two_player_game();
        game.options.max_split_hands = 1;
        game.players[0].hand = vec![card(1, 8), card(2, 8)];
        game.players[0].bet = 10;
        game.players[0].chips = 100;
        assert!(!game.can_split(0));
    }

    #[test]
    fn test_split_rule_controls_ten_value_splits() {
        let mut game = two_player_game();
        game.players[0].hand = vec![card(1, 10), card(2, 13)];
        game.players[0].bet = 10;
        game.players[0].chips = 100;

        game.options.split_rule = super::super::options::SplitRule::SameValue;
        assert!(game.can_split(0));

        game.options.split_rule = super::super::options::SplitRule::SameRank;
        assert!(!game.can_split(0));
    }

    #[test]
    fn test_split_aces_one_card_only_auto_stands_both_hands() {
        let mut game = two_player_game();
        game.options.split_aces_one_card_only = true;
        game.deck = Deck::from_cards(vec![card(900, 9), card(901, 8)]);
        game.players[0].hand = vec![card(1, 1), card(2, 1)];
        game.players[0].bet = 10;
        game.players[0].chips = 90;
        game.players[1].bet = 10;
        game.players[1].hand = vec![card(3, 5), card(4, 6)];

        game.execute_action(&pid("host"), ACTION_SPLIT, None);

        let host = &game.players[0];
        assert!(host.hand_done);
        assert!(host.split_hand_done);
        assert!(host.main_from_split_aces);
        assert!(host.split_from_split_aces);
        assert_eq!(game.turn_order.current(), Some(&pid("guest")));
    }

    #[test]
    fn test_split_aces_can_count_as_blackjack() {
        let mut game = two_player_game();
        game.options.split_aces_one_card_only = true;
        game.options.split_aces_count_as_blackjack = true;
        game.deck = Deck::from_cards(vec![card(900, 10), card(901, 10)]);
        game.players[0].hand = vec![card(1, 1), card(2, 1)];
        game.players[0].bet = 10;
        game.players[0].chips = 90;
        game.players[1].bet = 10;
        game.players[1].hand = vec![card(3, 5), card(4, 6)];

        game.execute_action(&pid("host"), ACTION_SPLIT, None);

        assert!(game.players[0].has_blackjack);
        assert!(game.players[0].split_has_blackjack);
    }

    #[test]
    fn test_double_down_rules_and_das() {
        let mut game = two_player_game();
        game.players[0].bet = 10;
        game.players[0].chips = 100;

        game.options.double_down_rule = super::super::options::DoubleDownRule::NineToEleven;
        game.players[0].hand = vec![card(1, 4), card(2, 4)];
        assert!(!game.can_double_down(0));

        game.players[0].hand = vec![card(3, 5), card(4, 5)];
        assert!(game.can_double_down(0));

        game.players[0].split_hand = vec![card(5, 5), card(6, 5)];
        game.players[0].split_bet = 10;
        game.players[0].active_hand = HandSlot::Split;
        game.options.allow_double_after_split = false;
        assert!(!game.can_double_down(0));

        game.options.allow_double_after_split = true;
        assert!(game.can_double_down(0));
    }

    #[test]
    fn test_settle_split_hands_independently() {
        let mut game = two_player_game();
        game.dealer_hand = vec![card(100, 10), card(101, 8)];
        game.players[0].hand = vec![card(1, 10), card(2, 10)];
        game.players[0].bet = 10;
        game.players[0].hand_done = true;
        game.players[0].split_hand = vec![card(3, 10), card(4, 9), card(5, 5)];
        game.players[0].split_bet = 10;
        game.players[0].split_busted = true;
        game.players[0].split_hand_done = true;
        game.players[0].chips = 80;
        game.players[1].hand = vec![card(6, 7), card(7, 7)];
        game.players[1].bet = 10;
        game.players[1].hand_done = true;
        game.players[1].chips = 90;

        game.settle_hand();

        assert_eq!(game.players[0].chips, 100);
        assert_eq!(game.players[1].chips, 90);
        assert_eq!(game.next_hand_wait_ticks, 40);
        assert_eq!(game.status, GameStatus::Playing);
    }

    #[test]
    fn test_settlement_symmetry_win_and_push() {
        let mut game = two_player_game();
        game.dealer_hand = vec![card(100, 10), card(101, 8)];
        game.players[0].hand = vec![card(1, 10), card(2, 10)];
        game.players[0].bet = 10;
        game.players[0].hand_done = true;
        game.players[0].chips = 80;
        game.players[1].hand = vec![card(3, 10), card(4, 8)];
        game.players[1].bet = 10;
        game.players[1].hand_done = true;
        game.players[1].chips = 80;

        game.settle_hand();

        // 20 beats 18 for exactly the stake; 18 pushes, stake returned.
        assert_eq!(game.players[0].chips, 100);
        assert_eq!(game.players[1].chips, 90);
    }

    #[test]
    fn test_dealer_hits_soft_17_when_enabled() {
        let mut game = BlackjackGame::with_seed(BlackjackOptions::default(), 3);
        game.add_player("host", "Host", false);
        game.status = GameStatus::Playing;
        game.options.dealer_hits_soft_17 = true;
        game.players[0].chips = 100;
        game.players[0].hand_done = true;
        game.dealer_hand = vec![card(1, 1), card(2, 6)];
        game.deck = Deck::from_cards(vec![card(3, 2)]);

        game.play_dealer_turn();

        assert_eq!(game.dealer_hand.len(), 3);
    }

    #[test]
    fn test_dealer_stands_soft_17_when_disabled() {
        let mut game = BlackjackGame::with_seed(BlackjackOptions::default(), 3);
        game.add_player("host", "Host", false);
        game.status = GameStatus::Playing;
        game.options.dealer_hits_soft_17 = false;
        game.players[0].chips = 100;
        game.players[0].hand_done = true;
        game.dealer_hand = vec![card(1, 1), card(2, 6)];
        game.deck = Deck::from_cards(vec![card(3, 2)]);

        game.play_dealer_turn();

        assert_eq!(game.dealer_hand.len(), 2);
    }

    #[test]
    fn test_dealer_no_peek_does_not_auto_settle() {
        let mut game = BlackjackGame::with_seed(BlackjackOptions::default(), 5);
        game.add_player("host", "Host", false);
        game.add_player("guest", "Guest", false);
        game.options.dealer_peeks_blackjack = false;
        game.options.allow_insurance = false;
        game.status = GameStatus::Playing;
        game.players[0].chips = 100;
        game.players[1].chips = 100;

        // Deal order: host, guest, dealer up, host, guest, dealer hole.
        let mut cards = vec![
            card(1, 10),
            card(2, 9),
            card(3, 1),
            card(4, 7),
            card(5, 8),
            card(6, 13),
        ];
        for filler in 0..8 {
            cards.push(card(100 + filler, 4));
        }
        game.deck = Deck::from_cards(cards);

        game.start_new_hand();

        assert_eq!(game.phase, BlackjackPhase::Players);
        assert_eq!(game.turn_order.current(), Some(&pid("host")));
        assert!(is_natural(&game.dealer_hand));
    }

    #[test]
    fn test_dealer_peek_settles_immediately() {
        let mut game = BlackjackGame::with_seed(BlackjackOptions::default(), 5);
        game.add_player("host", "Host", false);
        game.add_player("guest", "Guest", false);
        game.options.dealer_peeks_blackjack = true;
        game.options.allow_insurance = false;
        game.status = GameStatus::Playing;
        game.players[0].chips = 100;
        game.players[1].chips = 100;

        let mut cards = vec![
            card(1, 10),
            card(2, 9),
            card(3, 1),
            card(4, 7),
            card(5, 8),
            card(6, 13),
        ];
        for filler in 0..8 {
            cards.push(card(100 + filler, 4));
        }
        game.deck = Deck::from_cards(cards);

        game.start_new_hand();

        assert_eq!(game.phase, BlackjackPhase::Settle);
        // Both non-natural hands lose their bets to the dealer natural.
        assert_eq!(game.players[0].chips, 90);
        assert_eq!(game.players[1].chips, 90);
    }

    #[test]
    fn test_rules_profile_switch_applies_preset() {
        let mut game = BlackjackGame::new(BlackjackOptions::default());
        game.set_rules_profile(RulesProfile::European);
        assert!(!game.options.dealer_hits_soft_17);
        assert!(!game.options.dealer_peeks_blackjack);
        assert!(!game.options.allow_late_surrender);
        assert!(!game.options.allow_double_after_split);
    }

    #[test]
    fn test_prestart_validation_checks_seats_and_options() {
        let game = BlackjackGame::new(BlackjackOptions {
            starting_chips: 50,
            base_bet: 100,
            ..BlackjackOptions::default()
        });
        let errors = game.prestart_validate();
        assert!(errors.contains(&ConfigError::BetAboveStartingChips));
        assert!(errors.contains(&ConfigError::NotEnoughPlayers { required: 1 }));
    }

    #[test]
    fn test_on_start_deals_and_posts_bets() {
        let mut game = BlackjackGame::with_seed(
            BlackjackOptions {
                starting_chips: 100,
                base_bet: 10,
                deck_count: 1,
                ..BlackjackOptions::default()
            },
            42,
        );
        game.add_player("host", "Host", false);
        game.add_player("guest", "Guest", false);

        game.on_start();

        assert_eq!(game.status, GameStatus::Playing);
        assert_eq!(game.hand_number, 1);
        assert_eq!(game.players[0].hand.len(), 2);
        assert_eq!(game.players[1].hand.len(), 2);
        assert_eq!(game.dealer_hand.len(), 2);
        assert_eq!(game.players[0].bet, 10);
        assert_eq!(game.players[1].bet, 10);
        assert_eq!(game.players[0].chips, 90);
        assert_eq!(game.players[1].chips, 90);
    }

    #[test]
    fn test_post_bets_sits_out_broke_player_and_honors_limits() {
        let mut game = two_player_game();
        game.players[0].chips = 0;
        game.players[1].chips = 3;
        game.options.table_min_bet = 5;

        game.post_bets(&[0, 1]);

        assert_eq!(game.players[0].bet, 0);
        assert!(game.players[0].hand_done);
        // Below the table minimum but not broke: bets what they can.
        assert_eq!(game.players[1].bet, 3);
        assert_eq!(game.players[1].chips, 0);
    }

    #[test]
    fn test_out_of_turn_action_is_absorbed() {
        let mut game = two_player_game();
        game.deck = Deck::from_cards(vec![card(9, 10)]);
        game.players[0].hand = vec![card(1, 5), card(2, 6)];
        game.players[0].bet = 10;
        game.players[1].hand = vec![card(3, 5), card(4, 6)];
        game.players[1].bet = 10;

        game.execute_action(&pid("guest"), ACTION_HIT, None);

        assert_eq!(game.players[1].hand.len(), 2);
        assert_eq!(game.turn_order.current(), Some(&pid("host")));
    }

    #[test]
    fn test_hidden_actions_do_not_appear_in_menus() {
        let mut game = two_player_game();
        game.players[0].hand = vec![card(1, 5), card(2, 6)];
        game.players[0].bet = 10;
        game.players[0].chips = 90;

        let views = game.visible_actions(&pid("host"));
        let ids: Vec<&str> = views.iter().map(|v| v.id).collect();
        assert!(ids.contains(&ACTION_HIT));
        assert!(!ids.contains(&super::super::ACTION_READ_RULES));

        // The guest sees no turn actions at all while it's not their turn.
        assert!(game.visible_actions(&pid("guest")).is_empty());
    }
}
