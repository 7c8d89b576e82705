//! Blackjack table options and rules profiles.

use serde::{Deserialize, Serialize};

use crate::game::ConfigError;
use crate::game::entities::Chips;

/// Named rule presets. Selecting a profile bulk-sets every governed option
/// atomically; it never merges.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RulesProfile {
    Vegas,
    European,
    Friendly,
}

impl RulesProfile {
    #[must_use]
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Vegas => "blackjack-rules-profile-vegas",
            Self::European => "blackjack-rules-profile-european",
            Self::Friendly => "blackjack-rules-profile-friendly",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackjackPayout {
    ThreeToTwo,
    SixToFive,
    EvenMoney,
}

impl BlackjackPayout {
    /// Total credited to a natural winner: original stake plus the payout
    /// leg, with integer floors on the fractional ratios.
    #[must_use]
    pub fn total_payout(self, bet: Chips) -> Chips {
        match self {
            Self::ThreeToTwo => bet + (bet * 3) / 2,
            Self::SixToFive => bet + (bet * 6) / 5,
            Self::EvenMoney => bet * 2,
        }
    }

    #[must_use]
    pub fn label_key(self) -> &'static str {
        match self {
            Self::ThreeToTwo => "blackjack-payout-3-to-2",
            Self::SixToFive => "blackjack-payout-6-to-5",
            Self::EvenMoney => "blackjack-payout-1-to-1",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleDownRule {
    AnyTwo,
    NineToEleven,
    TenToEleven,
}

impl DoubleDownRule {
    #[must_use]
    pub fn allows_total(self, total: u8) -> bool {
        match self {
            Self::AnyTwo => true,
            Self::NineToEleven => (9..=11).contains(&total),
            Self::TenToEleven => (10..=11).contains(&total),
        }
    }

    #[must_use]
    pub fn label_key(self) -> &'static str {
        match self {
            Self::AnyTwo => "blackjack-double-rule-any-two",
            Self::NineToEleven => "blackjack-double-rule-9-to-11",
            Self::TenToEleven => "blackjack-double-rule-10-to-11",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitRule {
    SameValue,
    SameRank,
}

impl SplitRule {
    #[must_use]
    pub fn label_key(self) -> &'static str {
        match self {
            Self::SameValue => "blackjack-split-rule-same-value",
            Self::SameRank => "blackjack-split-rule-same-rank",
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BlackjackOptions {
    pub rules_profile: RulesProfile,
    pub starting_chips: Chips,
    pub base_bet: Chips,
    pub table_min_bet: Chips,
    pub table_max_bet: Chips,
    pub deck_count: u32,
    pub dealer_hits_soft_17: bool,
    pub dealer_peeks_blackjack: bool,
    pub players_cards_face_up: bool,
    pub allow_insurance: bool,
    pub allow_late_surrender: bool,
    pub blackjack_payout: BlackjackPayout,
    pub double_down_rule: DoubleDownRule,
    pub allow_double_after_split: bool,
    pub split_rule: SplitRule,
    pub max_split_hands: u32,
    pub split_aces_one_card_only: bool,
    pub split_aces_count_as_blackjack: bool,
    /// Seconds per turn; 0 disables the turn timer.
    pub turn_timer_seconds: u32,
}

impl Default for BlackjackOptions {
    fn default() -> Self {
        let mut options = Self {
            rules_profile: RulesProfile::Vegas,
            starting_chips: 500,
            base_bet: 10,
            table_min_bet: 5,
            table_max_bet: 100,
            deck_count: 4,
            dealer_hits_soft_17: true,
            dealer_peeks_blackjack: true,
            players_cards_face_up: true,
            allow_insurance: true,
            allow_late_surrender: true,
            blackjack_payout: BlackjackPayout::ThreeToTwo,
            double_down_rule: DoubleDownRule::AnyTwo,
            allow_double_after_split: true,
            split_rule: SplitRule::SameRank,
            max_split_hands: 2,
            split_aces_one_card_only: true,
            split_aces_count_as_blackjack: false,
            turn_timer_seconds: 0,
        };
        options.apply_profile(RulesProfile::Vegas);
        options
    }
}

impl BlackjackOptions {
    /// Overwrites every profile-governed option. Table limits, chip counts,
    /// deck count, card visibility, and the turn timer are not governed.
    pub fn apply_profile(&mut self, profile: RulesProfile) {
        self.rules_profile = profile;
        match profile {
            RulesProfile::Vegas => {
                self.dealer_hits_soft_17 = true;
                self.dealer_peeks_blackjack = true;
                self.allow_insurance = true;
                self.allow_late_surrender = true;
                self.blackjack_payout = BlackjackPayout::ThreeToTwo;
                self.double_down_rule = DoubleDownRule::AnyTwo;
                self.allow_double_after_split = true;
                self.split_rule = SplitRule::SameRank;
                self.max_split_hands = 2;
                self.split_aces_one_card_only = true;
                self.split_aces_count_as_blackjack = false;
            }
            RulesProfile::European => {
                self.dealer_hits_soft_17 = false;
                self.dealer_peeks_blackjack = false;
                self.allow_insurance = true;
                self.allow_late_surrender = false;
                self.blackjack_payout = BlackjackPayout::ThreeToTwo;
                self.double_down_rule = DoubleDownRule::NineToEleven;
                self.allow_double_after_split = false;
                self.split_rule = SplitRule::SameRank;
                self.max_split_hands = 2;
                self.split_aces_one_card_only = true;
                self.split_aces_count_as_blackjack = false;
            }
            RulesProfile::Friendly => {
                self.dealer_hits_soft_17 = false;
                self.dealer_peeks_blackjack = true;
                self.allow_insurance = true;
                self.allow_late_surrender = true;
                self.blackjack_payout = BlackjackPayout::ThreeToTwo;
                self.double_down_rule = DoubleDownRule::AnyTwo;
                self.allow_double_after_split = true;
                self.split_rule = SplitRule::SameValue;
                self.max_split_hands = 2;
                self.split_aces_one_card_only = false;
                self.split_aces_count_as_blackjack = true;
            }
        }
    }

    #[must_use]
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.base_bet > self.starting_chips {
            errors.push(ConfigError::BetAboveStartingChips);
        }
        if self.table_min_bet > self.table_max_bet {
            errors.push(ConfigError::TableLimitsInvalid);
        }
        if self.base_bet < self.table_min_bet {
            errors.push(ConfigError::BetBelowTableMin);
        }
        if self.base_bet > self.table_max_bet {
            errors.push(ConfigError::BetAboveTableMax);
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_vegas() {
        let options = BlackjackOptions::default();
        assert_eq!(options.rules_profile, RulesProfile::Vegas);
        assert_eq!(options.starting_chips, 500);
        assert_eq!(options.base_bet, 10);
        assert_eq!(options.table_min_bet, 5);
        assert_eq!(options.table_max_bet, 100);
        assert_eq!(options.deck_count, 4);
        assert!(options.dealer_hits_soft_17);
        assert!(options.dealer_peeks_blackjack);
        assert!(options.split_aces_one_card_only);
        assert!(!options.split_aces_count_as_blackjack);
        assert_eq!(options.turn_timer_seconds, 0);
    }

    #[test]
    fn test_european_profile_overwrites_all_governed_options() {
        let mut options = BlackjackOptions::default();
        options.apply_profile(RulesProfile::European);
        assert!(!options.dealer_hits_soft_17);
        assert!(!options.dealer_peeks_blackjack);
        assert!(options.allow_insurance);
        assert!(!options.allow_late_surrender);
        assert_eq!(options.blackjack_payout, BlackjackPayout::ThreeToTwo);
        assert_eq!(options.double_down_rule, DoubleDownRule::NineToEleven);
        assert!(!options.allow_double_after_split);
        assert_eq!(options.split_rule, SplitRule::SameRank);
        assert_eq!(options.max_split_hands, 2);
    }

    #[test]
    fn test_profile_switch_does_not_merge() {
        let mut options = BlackjackOptions::default();
        options.apply_profile(RulesProfile::Friendly);
        assert!(options.split_aces_count_as_blackjack);
        options.apply_profile(RulesProfile::Vegas);
        assert!(!options.split_aces_count_as_blackjack);
        assert!(options.split_aces_one_card_only);
    }

    #[test]
    fn test_payout_totals() {
        assert_eq!(BlackjackPayout::ThreeToTwo.total_payout(10), 25);
        assert_eq!(BlackjackPayout::SixToFive.total_payout(10), 22);
        assert_eq!(BlackjackPayout::EvenMoney.total_payout(10), 20);
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let options = BlackjackOptions {
            starting_chips: 50,
            base_bet: 100,
            table_min_bet: 25,
            table_max_bet: 20,
            ..BlackjackOptions::default()
        };
        let errors = options.validate();
        assert!(errors.contains(&ConfigError::BetAboveStartingChips));
        assert!(errors.contains(&ConfigError::TableLimitsInvalid));
        assert!(errors.contains(&ConfigError::BetAboveTableMax));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(BlackjackOptions::default().validate().is_empty());
    }
}
