//! Auction rules module
//!
//! Pure bidding and squad composition rules that depend only on
//! in-memory domain types, std, and rust_decimal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Players fielded in the playing eleven
pub const XI_SIZE: usize = 11;

/// Maximum overseas players allowed in the eleven
pub const OVERSEAS_LIMIT: usize = 4;

/// Eleven composition caps per role
pub const WICKET_KEEPER_CAP: usize = 1;
pub const BATSMAN_CAP: usize = 5;
pub const BOWLER_CAP: usize = 5;
pub const ALL_ROUNDER_CAP: usize = 3;

/// Minimum role counts for a viable eleven
pub const MIN_WICKET_KEEPERS: usize = 1;
pub const MIN_BATSMEN: usize = 3;
pub const MIN_BOWLERS: usize = 2;

/// Seconds a sold lot stays on display before the next lot opens
pub const SALE_DISPLAY_DELAY_SECS: u64 = 3;

/// Overall team rating weights: batting, bowling, balance, bench depth
pub const RATING_WEIGHT_BATTING: f64 = 0.3;
pub const RATING_WEIGHT_BOWLING: f64 = 0.3;
pub const RATING_WEIGHT_BALANCE: f64 = 0.3;
pub const RATING_WEIGHT_BENCH: f64 = 0.1;

/// The three fixed raise sizes a bidder can choose from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidTier {
    Small,
    Medium,
    Large,
}

/// Per-room raise amounts, configured at room creation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BidIncrements {
    pub small: Decimal,
    pub medium: Decimal,
    pub large: Decimal,
}

impl BidIncrements {
    /// Raise amount for a tier
    pub fn amount(&self, tier: BidTier) -> Decimal {
        match tier {
            BidTier::Small => self.small,
            BidTier::Medium => self.medium,
            BidTier::Large => self.large,
        }
    }

    /// Classify a raise delta back into its tier, if any tier matches exactly
    pub fn matches_delta(&self, delta: Decimal) -> Option<BidTier> {
        if delta == self.small {
            Some(BidTier::Small)
        } else if delta == self.medium {
            Some(BidTier::Medium)
        } else if delta == self.large {
            Some(BidTier::Large)
        } else {
            None
        }
    }
}

/// The price a bid at `tier` proposes on top of the standing bid
pub fn proposed_amount(current_bid: Decimal, increments: &BidIncrements, tier: BidTier) -> Decimal {
    current_bid + increments.amount(tier)
}
