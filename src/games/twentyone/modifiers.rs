//! Modifier cards for Survival 21.
//!
//! Each modifier resolves through a pure effect application keyed by its
//! variant: some mutate the player's hand or the deck, some attach to the
//! table as persistent effects that alter future rounds until they expire.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Raise1,
    Raise2,
    Raise2Plus,
    Exact2,
    Exact3,
    Exact4,
    Exact5,
    Exact6,
    Exact7,
    Scrap,
    Recycle,
    SwapDraw,
    Redraft,
    RedraftPlus,
    Guard,
    GuardPlus,
    BreakEffect,
    BreakAll,
    Lockdown,
    PrecisionDraw,
    PrecisionDrawPlus,
    PrimeDraw,
    Target17,
    Target24,
    Target27,
    Salvage,
    AidRival,
}

pub const MODIFIER_POOL: [Modifier; 27] = [
    Modifier::Raise1,
    Modifier::Raise2,
    Modifier::Raise2Plus,
    Modifier::Exact2,
    Modifier::Exact3,
    Modifier::Exact4,
    Modifier::Exact5,
    Modifier::Exact6,
    Modifier::Exact7,
    Modifier::Scrap,
    Modifier::Recycle,
    Modifier::SwapDraw,
    Modifier::Redraft,
    Modifier::RedraftPlus,
    Modifier::Guard,
    Modifier::GuardPlus,
    Modifier::BreakEffect,
    Modifier::BreakAll,
    Modifier::Lockdown,
    Modifier::PrecisionDraw,
    Modifier::PrecisionDrawPlus,
    Modifier::PrimeDraw,
    Modifier::Target17,
    Modifier::Target24,
    Modifier::Target27,
    Modifier::Salvage,
    Modifier::AidRival,
];

/// Persistent effects per player; the oldest expires on overflow.
pub const TABLE_EFFECT_LIMIT: usize = 5;

impl Modifier {
    #[must_use]
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Raise1 => "twentyone-mod-raise-1",
            Self::Raise2 => "twentyone-mod-raise-2",
            Self::Raise2Plus => "twentyone-mod-raise-2-plus",
            Self::Exact2 => "twentyone-mod-exact-2",
            Self::Exact3 => "twentyone-mod-exact-3",
            Self::Exact4 => "twentyone-mod-exact-4",
            Self::Exact5 => "twentyone-mod-exact-5",
            Self::Exact6 => "twentyone-mod-exact-6",
            Self::Exact7 => "twentyone-mod-exact-7",
            Self::Scrap => "twentyone-mod-scrap",
            Self::Recycle => "twentyone-mod-recycle",
            Self::SwapDraw => "twentyone-mod-swap-draw",
            Self::Redraft => "twentyone-mod-redraft",
            Self::RedraftPlus => "twentyone-mod-redraft-plus",
            Self::Guard => "twentyone-mod-guard",
            Self::GuardPlus => "twentyone-mod-guard-plus",
            Self::BreakEffect => "twentyone-mod-break-effect",
            Self::BreakAll => "twentyone-mod-break-all",
            Self::Lockdown => "twentyone-mod-lockdown",
            Self::PrecisionDraw => "twentyone-mod-precision-draw",
            Self::PrecisionDrawPlus => "twentyone-mod-precision-draw-plus",
            Self::PrimeDraw => "twentyone-mod-prime-draw",
            Self::Target17 => "twentyone-mod-target-17",
            Self::Target24 => "twentyone-mod-target-24",
            Self::Target27 => "twentyone-mod-target-27",
            Self::Salvage => "twentyone-mod-salvage",
            Self::AidRival => "twentyone-mod-aid-rival",
        }
    }

    #[must_use]
    pub fn help_key(self) -> &'static str {
        match self {
            Self::Raise1 => "twentyone-help-raise-1",
            Self::Raise2 => "twentyone-help-raise-2",
            Self::Raise2Plus => "twentyone-help-raise-2-plus",
            Self::Exact2 => "twentyone-help-exact-2",
            Self::Exact3 => "twentyone-help-exact-3",
            Self::Exact4 => "twentyone-help-exact-4",
            Self::Exact5 => "twentyone-help-exact-5",
            Self::Exact6 => "twentyone-help-exact-6",
            Self::Exact7 => "twentyone-help-exact-7",
            Self::Scrap => "twentyone-help-scrap",
            Self::Recycle => "twentyone-help-recycle",
            Self::SwapDraw => "twentyone-help-swap-draw",
            Self::Redraft => "twentyone-help-redraft",
            Self::RedraftPlus => "twentyone-help-redraft-plus",
            Self::Guard => "twentyone-help-guard",
            Self::GuardPlus => "twentyone-help-guard-plus",
            Self::BreakEffect => "twentyone-help-break-effect",
            Self::BreakAll => "twentyone-help-break-all",
            Self::Lockdown => "twentyone-help-lockdown",
            Self::PrecisionDraw => "twentyone-help-precision-draw",
            Self::PrecisionDrawPlus => "twentyone-help-precision-draw-plus",
            Self::PrimeDraw => "twentyone-help-prime-draw",
            Self::Target17 => "twentyone-help-target-17",
            Self::Target24 => "twentyone-help-target-24",
            Self::Target27 => "twentyone-help-target-27",
            Self::Salvage => "twentyone-help-salvage",
            Self::AidRival => "twentyone-help-aid-rival",
        }
    }

    /// Rank fished from the deck by exact-draw modifiers.
    #[must_use]
    pub fn exact_rank(self) -> Option<u8> {
        match self {
            Self::Exact2 => Some(2),
            Self::Exact3 => Some(3),
            Self::Exact4 => Some(4),
            Self::Exact5 => Some(5),
            Self::Exact6 => Some(6),
            Self::Exact7 => Some(7),
            _ => None,
        }
    }

    /// Round target set while this effect is on the table.
    #[must_use]
    pub fn target_value(self) -> Option<u32> {
        match self {
            Self::Target17 => Some(17),
            Self::Target24 => Some(24),
            Self::Target27 => Some(27),
            _ => None,
        }
    }

    /// Whether playing this modifier leaves it on the table as a
    /// persistent effect.
    #[must_use]
    pub fn is_table_effect(self) -> bool {
        matches!(
            self,
            Self::Raise1
                | Self::Raise2
                | Self::Raise2Plus
                | Self::Guard
                | Self::GuardPlus
                | Self::Lockdown
                | Self::PrecisionDrawPlus
                | Self::Target17
                | Self::Target24
                | Self::Target27
                | Self::Salvage
        )
    }

    /// Extra round-loss damage dealt to the opponent while on the table.
    #[must_use]
    pub fn damage_increase(self) -> u32 {
        match self {
            Self::Raise1 => 1,
            Self::Raise2 | Self::Raise2Plus => 2,
            Self::PrecisionDrawPlus => 5,
            _ => 0,
        }
    }

    /// Incoming round-loss damage absorbed while on the table.
    #[must_use]
    pub fn damage_reduction(self) -> u32 {
        match self {
            Self::Guard => 1,
            Self::GuardPlus => 2,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_covers_every_variant_once() {
        for (i, a) in MODIFIER_POOL.iter().enumerate() {
            for b in &MODIFIER_POOL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_table_effects_match_damage_tables() {
        assert!(Modifier::Raise1.is_table_effect());
        assert_eq!(Modifier::Raise2Plus.damage_increase(), 2);
        assert_eq!(Modifier::PrecisionDrawPlus.damage_increase(), 5);
        assert_eq!(Modifier::GuardPlus.damage_reduction(), 2);
        assert!(!Modifier::Scrap.is_table_effect());
        assert_eq!(Modifier::Scrap.damage_increase(), 0);
    }

    #[test]
    fn test_target_values() {
        assert_eq!(Modifier::Target17.target_value(), Some(17));
        assert_eq!(Modifier::Target24.target_value(), Some(24));
        assert_eq!(Modifier::Target27.target_value(), Some(27));
        assert_eq!(Modifier::Guard.target_value(), None);
    }

    #[test]
    fn test_exact_ranks() {
        assert_eq!(Modifier::Exact2.exact_rank(), Some(2));
        assert_eq!(Modifier::Exact7.exact_rank(), Some(7));
        assert_eq!(Modifier::PrimeDraw.exact_rank(), None);
    }
}
