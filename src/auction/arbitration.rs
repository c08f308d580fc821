//! Bid arbitration.
//!
//! Concurrent bids race on an optimistic check-and-set against the lot
//! row: exactly one bid per standing price wins, losers get `StaleBid`
//! and refresh. The accepted bid is appended to the bids ledger in the
//! same transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::auction::rules::{proposed_amount, BidIncrements, BidTier};
use crate::entity::{auction_players, bids, rooms, teams};
use crate::entity::auction_players::AuctionStatus;
use crate::error::AuctionError;

/// What the engine needs back from an accepted bid: enough to re-arm the
/// lot countdown and publish the update.
#[derive(Clone, Debug)]
pub struct BidReceipt {
    pub room_id: Uuid,
    pub timer_duration: i32,
    pub amount: Decimal,
    pub bid_count: i32,
}

/// Validate a proposed price against the standing bid and bidder funds.
///
/// The raise over the standing bid must exactly match one of the room's
/// configured tiers, and the full proposed price must fit in the purse.
pub fn validate_proposal(
    current_bid: Decimal,
    proposed: Decimal,
    increments: &BidIncrements,
    purse_left: Decimal,
) -> Result<(), AuctionError> {
    let delta = proposed - current_bid;
    if increments.matches_delta(delta).is_none() {
        return Err(AuctionError::InvalidTierAmount);
    }
    if proposed > purse_left {
        return Err(AuctionError::InsufficientFunds);
    }
    Ok(())
}

/// Place a bid on an active lot on behalf of a team.
///
/// Runs in a single transaction: validate, then conditionally update the
/// lot row (check-and-set on `current_bid`), then append the ledger row.
/// A zero-row update means another bid landed first.
pub async fn place_bid(
    db: &DatabaseConnection,
    lot_id: Uuid,
    team_id: Uuid,
    tier: BidTier,
) -> Result<BidReceipt, AuctionError> {
    let receipt = db
        .transaction::<_, BidReceipt, AuctionError>(|txn| {
            Box::pin(async move { place_bid_txn(txn, lot_id, team_id, tier).await })
        })
        .await?;
    Ok(receipt)
}

async fn place_bid_txn(
    txn: &DatabaseTransaction,
    lot_id: Uuid,
    team_id: Uuid,
    tier: BidTier,
) -> Result<BidReceipt, AuctionError> {
    let lot = auction_players::Entity::find_by_id(lot_id)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("lot"))?;

    if lot.status != AuctionStatus::Active {
        return Err(AuctionError::LotNotOpen);
    }

    let room = rooms::Entity::find_by_id(lot.room_id)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("room"))?;

    let team = teams::Entity::find_by_id(team_id)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("team"))?;
    if team.room_id != room.id {
        return Err(AuctionError::TeamNotInRoom);
    }

    let increments = BidIncrements {
        small: room.bid_increment_small,
        medium: room.bid_increment_medium,
        large: room.bid_increment_large,
    };

    // A lot is opened with current_bid seeded to the base price, so an
    // active lot always has a standing bid.
    let current = lot
        .current_bid
        .ok_or_else(|| AuctionError::ConsistencyViolation(format!("active lot {lot_id} has no standing bid")))?;
    let proposed = proposed_amount(current, &increments, tier);

    validate_proposal(current, proposed, &increments, team.purse_left)?;

    // Optimistic check-and-set: only the bid that saw the latest standing
    // price gets to move it.
    let result = auction_players::Entity::update_many()
        .col_expr(auction_players::Column::CurrentBid, Expr::value(proposed))
        .col_expr(
            auction_players::Column::CurrentBidderTeamId,
            Expr::value(Some(team_id)),
        )
        .col_expr(
            auction_players::Column::BidCount,
            Expr::col(auction_players::Column::BidCount).add(1),
        )
        .filter(auction_players::Column::Id.eq(lot_id))
        .filter(auction_players::Column::Status.eq(AuctionStatus::Active))
        .filter(auction_players::Column::CurrentBid.eq(current))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AuctionError::StaleBid);
    }

    let ledger_row = bids::ActiveModel {
        id: Set(Uuid::new_v4()),
        auction_player_id: Set(lot_id),
        team_id: Set(team_id),
        bid_amount: Set(proposed),
        created_at: Set(Utc::now().into()),
    };
    ledger_row.insert(txn).await?;

    // Re-read the row we just updated so the receipt carries the stored
    // bid count, not one derived from the pre-update read.
    let updated = auction_players::Entity::find_by_id(lot_id)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("lot"))?;

    Ok(BidReceipt {
        room_id: room.id,
        timer_duration: room.timer_duration,
        amount: proposed,
        bid_count: updated.bid_count,
    })
}
