//! Blackjack bot decisions: basic strategy against the dealer's up-card.

use crate::game::scoring::{blackjack_card_value, blackjack_total};

use super::game::{BlackjackGame, BlackjackPhase};
use super::{
    ACTION_DECLINE_INSURANCE, ACTION_DOUBLE_DOWN, ACTION_EVEN_MONEY, ACTION_HIT, ACTION_SPLIT,
    ACTION_STAND, ACTION_SURRENDER,
};

/// Chooses the action the player at `idx` would take right now, or `None`
/// when it is not their decision to make. Also used as the turn-timeout
/// fallback for humans.
pub(super) fn bot_think(game: &BlackjackGame, idx: usize) -> Option<&'static str> {
    let player = &game.players[idx];
    if game.turn_order.current() != Some(&player.seat.id) {
        return None;
    }

    if game.phase == BlackjackPhase::Insurance {
        if game.can_take_even_money(idx) {
            return Some(ACTION_EVEN_MONEY);
        }
        // Insurance is a losing side-bet without a count; always decline.
        if game.can_take_insurance(idx) || game.needs_insurance_decision(idx) {
            return Some(ACTION_DECLINE_INSURANCE);
        }
        return None;
    }

    if game.phase != BlackjackPhase::Players || game.current_hand_done(idx) {
        return None;
    }

    let hand = game.current_hand(idx);
    let (total, soft) = blackjack_total(hand);
    if total >= 21 {
        return Some(ACTION_STAND);
    }

    let dealer_value = game
        .dealer_hand
        .first()
        .map_or(10, |&card| blackjack_card_value(card));

    if game.can_surrender(idx) && !soft {
        if total == 16 && matches!(dealer_value, 9 | 10 | 11) {
            return Some(ACTION_SURRENDER);
        }
        if total == 15 && dealer_value == 10 {
            return Some(ACTION_SURRENDER);
        }
    }

    if game.can_split(idx) {
        let split_value = blackjack_card_value(hand[0]);
        if split_value == 8 || split_value == 11 {
            return Some(ACTION_SPLIT);
        }
        if split_value == 9 && !matches!(dealer_value, 7 | 10 | 11) {
            return Some(ACTION_SPLIT);
        }
    }

    if game.can_double_down(idx) {
        if total == 11 {
            return Some(ACTION_DOUBLE_DOWN);
        }
        if total == 10 && dealer_value <= 9 {
            return Some(ACTION_DOUBLE_DOWN);
        }
        if total == 9 && (3..=6).contains(&dealer_value) {
            return Some(ACTION_DOUBLE_DOWN);
        }
    }

    if total <= 11 {
        return Some(ACTION_HIT);
    }
    if soft && total <= 17 {
        return Some(ACTION_HIT);
    }
    if !soft && total >= 17 {
        return Some(ACTION_STAND);
    }
    if dealer_value >= 7 && total <= 16 {
        return Some(ACTION_HIT);
    }
    Some(ACTION_STAND)
}
