//! Auction engine.
//!
//! Owns the per-room lot state machine: starting a room, opening lots in
//! queue order, finalizing sales on countdown expiry, and completing the
//! room when the queue runs out. Room transitions are serialized by a
//! row lock on the room inside each transaction; bid contention is
//! handled separately by the arbitration module.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use tokio::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auction::arbitration::{self, BidReceipt};
use crate::auction::optimizer;
use crate::auction::rules::{BidTier, SALE_DISPLAY_DELAY_SECS};
use crate::auction::timer::AuctionTimers;
use crate::entity::auction_players::AuctionStatus;
use crate::entity::rooms::RoomStatus;
use crate::entity::{auction_players, players, rooms, team_players, teams};
use crate::error::AuctionError;
use crate::notify::Publisher;

/// Outcome of a finalized lot, as published and returned to callers.
#[derive(Clone, Debug)]
pub struct SaleOutcome {
    pub room_id: Uuid,
    pub lot_id: Uuid,
    pub player_id: Uuid,
    pub sold_to_team_id: Option<Uuid>,
    pub price: rust_decimal::Decimal,
}

#[derive(Clone)]
pub struct AuctionEngine {
    db: DatabaseConnection,
    timers: AuctionTimers,
    publisher: Arc<dyn Publisher>,
    // Rooms frozen after a consistency violation. Operator restart clears it.
    halted: Arc<Mutex<HashSet<Uuid>>>,
}

impl AuctionEngine {
    pub fn new(db: DatabaseConnection, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            db,
            timers: AuctionTimers::new(),
            publisher,
            halted: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn timers(&self) -> &AuctionTimers {
        &self.timers
    }

    fn is_halted(&self, room_id: Uuid) -> bool {
        let halted = self.halted.lock().unwrap_or_else(|e| e.into_inner());
        halted.contains(&room_id)
    }

    fn halt(&self, room_id: Uuid, reason: &str) {
        error!(%room_id, reason, "room halted after consistency violation");
        let mut halted = self.halted.lock().unwrap_or_else(|e| e.into_inner());
        halted.insert(room_id);
    }

    /// Start a lobby room: all teams ready, team count within bounds.
    /// Creates one WAITING lot per catalog player and opens the first one.
    pub async fn start_auction(&self, room_id: Uuid) -> Result<(), AuctionError> {
        self.db
            .transaction::<_, (), AuctionError>(move |txn| {
                Box::pin(async move { start_auction_txn(txn, room_id).await })
            })
            .await?;

        info!(%room_id, "auction started");
        self.publish_best_effort(room_id, "room.started", json!({ "room_id": room_id }));
        self.advance_room(room_id).await
    }

    /// Advance the room's lot queue. Idempotent: safe to call when a lot
    /// is already in flight or the room is done.
    pub async fn advance_room(&self, room_id: Uuid) -> Result<(), AuctionError> {
        if self.is_halted(room_id) {
            return Err(AuctionError::ConsistencyViolation(format!(
                "room {room_id} is halted"
            )));
        }

        let step = self
            .db
            .transaction::<_, AdvanceStep, AuctionError>(move |txn| {
                Box::pin(async move { advance_room_txn(txn, room_id).await })
            })
            .await
            .map_err(AuctionError::from);

        match step {
            Ok(AdvanceStep::NoOp) => Ok(()),
            Ok(AdvanceStep::LotOpened {
                lot_id,
                player_id,
                timer_duration,
            }) => {
                let generation = self
                    .timers
                    .arm(lot_id, Duration::from_secs(timer_duration.max(0) as u64));
                // Freshly opened lots carry no bids yet.
                self.spawn_expiry(lot_id, generation, timer_duration.max(0) as u64, 0);
                info!(%room_id, %lot_id, "lot opened");
                self.publish_best_effort(
                    room_id,
                    "lot.opened",
                    json!({ "lot_id": lot_id, "player_id": player_id }),
                );
                Ok(())
            }
            Ok(AdvanceStep::RoomCompleted { team_ids }) => {
                info!(%room_id, "auction completed");
                self.publish_best_effort(room_id, "room.completed", json!({ "room_id": room_id }));
                for team_id in team_ids {
                    if let Err(e) = optimizer::run_for_team(&self.db, team_id).await {
                        error!(%room_id, %team_id, error = %e, "squad optimizer failed");
                    }
                }
                Ok(())
            }
            Err(e) => {
                if matches!(e, AuctionError::ConsistencyViolation(_)) {
                    self.halt(room_id, "multiple active lots");
                }
                Err(e)
            }
        }
    }

    /// Place a bid on an active lot. On acceptance the lot countdown is
    /// reset to the full duration.
    pub async fn submit_bid(
        &self,
        lot_id: Uuid,
        team_id: Uuid,
        tier: BidTier,
    ) -> Result<BidReceipt, AuctionError> {
        let receipt = arbitration::place_bid(&self.db, lot_id, team_id, tier).await?;

        let generation = self.timers.arm(
            lot_id,
            Duration::from_secs(receipt.timer_duration.max(0) as u64),
        );
        self.spawn_expiry(
            lot_id,
            generation,
            receipt.timer_duration.max(0) as u64,
            receipt.bid_count,
        );

        self.publish_best_effort(
            receipt.room_id,
            "lot.bid",
            json!({
                "lot_id": lot_id,
                "team_id": team_id,
                "amount": receipt.amount,
                "bid_count": receipt.bid_count,
            }),
        );
        Ok(receipt)
    }

    /// Close an active lot immediately, bypassing the countdown.
    pub async fn force_expire(&self, lot_id: Uuid) -> Result<SaleOutcome, AuctionError> {
        self.finalize_lot(lot_id, None).await
    }

    /// Deadline expiry for a countdown that was armed when the lot held
    /// `armed_bid_count` accepted bids. The count is re-checked under the
    /// lot row lock, so a bid whose commit raced this wakeup makes it a
    /// `StaleBid` no-op and the bid's fresh countdown stands.
    pub async fn expire_countdown(
        &self,
        lot_id: Uuid,
        armed_bid_count: i32,
    ) -> Result<SaleOutcome, AuctionError> {
        match self.finalize_lot(lot_id, Some(armed_bid_count)).await {
            Ok(outcome) => Ok(outcome),
            Err(AuctionError::LotNotOpen) => {
                // The lot closed under a concurrent finalization; drop any
                // countdown entry re-armed for it since.
                self.timers.clear(lot_id);
                Err(AuctionError::LotNotOpen)
            }
            Err(e) => Err(e),
        }
    }

    fn spawn_expiry(&self, lot_id: Uuid, generation: u64, secs: u64, armed_bid_count: i32) {
        let engine = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            engine.handle_expiry(lot_id, generation, armed_bid_count).await;
        });
    }

    async fn handle_expiry(&self, lot_id: Uuid, generation: u64, armed_bid_count: i32) {
        // A bid since we went to sleep re-armed the countdown under a new
        // generation; this wakeup is then stale. The check is only a fast
        // path: the bid-count guard inside the finalize transaction is the
        // authority.
        if !self.timers.is_current(lot_id, generation) {
            return;
        }
        match self.expire_countdown(lot_id, armed_bid_count).await {
            Ok(_) => {}
            // A bid landed after this countdown was armed, or the lot was
            // already closed; either way the wakeup is moot.
            Err(AuctionError::StaleBid) | Err(AuctionError::LotNotOpen) => {}
            Err(e) => error!(%lot_id, error = %e, "lot finalization failed"),
        }
    }

    async fn finalize_lot(
        &self,
        lot_id: Uuid,
        expected_bid_count: Option<i32>,
    ) -> Result<SaleOutcome, AuctionError> {
        let result = self
            .db
            .transaction::<_, SaleOutcome, AuctionError>(move |txn| {
                Box::pin(async move { finalize_lot_txn(txn, lot_id, expected_bid_count).await })
            })
            .await
            .map_err(AuctionError::from);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                if let AuctionError::ConsistencyViolation(reason) = &e {
                    if let Some(room_id) = lot_room_id(&self.db, lot_id).await {
                        self.halt(room_id, reason);
                    }
                }
                return Err(e);
            }
        };

        self.timers.clear(lot_id);

        match outcome.sold_to_team_id {
            Some(team_id) => {
                info!(lot_id = %outcome.lot_id, %team_id, price = %outcome.price, "lot sold");
                self.publish_best_effort(
                    outcome.room_id,
                    "lot.sold",
                    json!({
                        "lot_id": outcome.lot_id,
                        "player_id": outcome.player_id,
                        "team_id": team_id,
                        "price": outcome.price,
                    }),
                );
            }
            None => {
                info!(lot_id = %outcome.lot_id, "lot unsold");
                self.publish_best_effort(
                    outcome.room_id,
                    "lot.unsold",
                    json!({ "lot_id": outcome.lot_id, "player_id": outcome.player_id }),
                );
            }
        }

        self.schedule_advance(outcome.room_id);
        Ok(outcome)
    }

    /// Queue the next advancement after the sold-lot display delay.
    fn schedule_advance(&self, room_id: Uuid) {
        let engine = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(SALE_DISPLAY_DELAY_SECS)).await;
            if let Err(e) = engine.advance_room(room_id).await {
                error!(%room_id, error = %e, "scheduled room advance failed");
            }
        });
    }

    fn publish_best_effort(&self, room_id: Uuid, topic: &str, payload: serde_json::Value) {
        if let Err(e) = self.publisher.publish(room_id, topic, payload) {
            warn!(%room_id, topic, error = %e, "publish failed, continuing");
        }
    }
}

enum AdvanceStep {
    NoOp,
    LotOpened {
        lot_id: Uuid,
        player_id: Uuid,
        timer_duration: i32,
    },
    RoomCompleted {
        team_ids: Vec<Uuid>,
    },
}

async fn start_auction_txn(txn: &DatabaseTransaction, room_id: Uuid) -> Result<(), AuctionError> {
    let room = rooms::Entity::find_by_id(room_id)
        .lock(sea_orm::sea_query::LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("room"))?;

    if room.status != RoomStatus::Lobby {
        return Err(AuctionError::RoomNotOpen);
    }

    let room_teams = teams::Entity::find()
        .filter(teams::Column::RoomId.eq(room.id))
        .all(txn)
        .await?;

    let count = room_teams.len() as i32;
    if count < room.min_users || count > room.max_users {
        return Err(AuctionError::RoomNotOpen);
    }
    let not_ready = room_teams.iter().filter(|t| !t.is_ready).count();
    if not_ready > 0 {
        return Err(AuctionError::TeamsNotReady(not_ready));
    }

    // Queue order: most expensive players first, name as a stable tie-break.
    let catalog = players::Entity::find()
        .order_by_desc(players::Column::BasePrice)
        .order_by_asc(players::Column::Name)
        .all(txn)
        .await?;

    let now = Utc::now();
    let lots: Vec<auction_players::ActiveModel> = catalog
        .iter()
        .enumerate()
        .map(|(i, player)| auction_players::ActiveModel {
            id: Set(Uuid::new_v4()),
            room_id: Set(room.id),
            player_id: Set(player.id),
            status: Set(AuctionStatus::Waiting),
            queue_order: Set(i as i32),
            current_bid: Set(None),
            current_bidder_team_id: Set(None),
            bid_count: Set(0),
            sold_price: Set(None),
            sold_to_team_id: Set(None),
            created_at: Set(now.into()),
        })
        .collect();
    if !lots.is_empty() {
        auction_players::Entity::insert_many(lots).exec(txn).await?;
    }

    let mut room_model: rooms::ActiveModel = room.into();
    room_model.status = Set(RoomStatus::InProgress);
    room_model.update(txn).await?;

    Ok(())
}

async fn advance_room_txn(
    txn: &DatabaseTransaction,
    room_id: Uuid,
) -> Result<AdvanceStep, AuctionError> {
    let room = rooms::Entity::find_by_id(room_id)
        .lock(sea_orm::sea_query::LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("room"))?;

    match room.status {
        RoomStatus::Lobby => return Err(AuctionError::RoomNotOpen),
        RoomStatus::Completed => return Ok(AdvanceStep::NoOp),
        RoomStatus::InProgress => {}
    }

    let active = auction_players::Entity::find()
        .filter(auction_players::Column::RoomId.eq(room.id))
        .filter(auction_players::Column::Status.eq(AuctionStatus::Active))
        .all(txn)
        .await?;
    if active.len() > 1 {
        return Err(AuctionError::ConsistencyViolation(format!(
            "room {room_id} has {} active lots",
            active.len()
        )));
    }
    if active.len() == 1 {
        return Ok(AdvanceStep::NoOp);
    }

    let next = auction_players::Entity::find()
        .filter(auction_players::Column::RoomId.eq(room.id))
        .filter(auction_players::Column::Status.eq(AuctionStatus::Waiting))
        .order_by_asc(auction_players::Column::QueueOrder)
        .one(txn)
        .await?;

    match next {
        Some(lot) => {
            let player = players::Entity::find_by_id(lot.player_id)
                .one(txn)
                .await?
                .ok_or(AuctionError::MissingCatalogPlayer)?;

            let lot_id = lot.id;
            let mut lot_model: auction_players::ActiveModel = lot.into();
            lot_model.status = Set(AuctionStatus::Active);
            lot_model.current_bid = Set(Some(player.base_price));
            lot_model.current_bidder_team_id = Set(None);
            lot_model.update(txn).await?;

            Ok(AdvanceStep::LotOpened {
                lot_id,
                player_id: player.id,
                timer_duration: room.timer_duration,
            })
        }
        None => {
            let team_ids = teams::Entity::find()
                .filter(teams::Column::RoomId.eq(room.id))
                .all(txn)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();

            let mut room_model: rooms::ActiveModel = room.into();
            room_model.status = Set(RoomStatus::Completed);
            room_model.update(txn).await?;

            Ok(AdvanceStep::RoomCompleted { team_ids })
        }
    }
}

async fn finalize_lot_txn(
    txn: &DatabaseTransaction,
    lot_id: Uuid,
    expected_bid_count: Option<i32>,
) -> Result<SaleOutcome, AuctionError> {
    let lot = auction_players::Entity::find_by_id(lot_id)
        .lock(sea_orm::sea_query::LockType::Update)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("lot"))?;

    if lot.status != AuctionStatus::Active {
        return Err(AuctionError::LotNotOpen);
    }

    // Countdown expiries carry the bid count their countdown was armed
    // against. An accepted bid never changes lot status, so this is the
    // check that keeps an in-flight expiry from selling past a bid that
    // committed before we took the row lock.
    if let Some(expected) = expected_bid_count {
        if lot.bid_count != expected {
            return Err(AuctionError::StaleBid);
        }
    }

    let price = lot.current_bid.ok_or_else(|| {
        AuctionError::ConsistencyViolation(format!("active lot {lot_id} has no standing bid"))
    })?;
    let winner = lot.current_bidder_team_id;

    if let Some(team_id) = winner {
        crate::auction::purse::reserve_and_deduct(txn, team_id, price).await?;

        let entry = team_players::ActiveModel {
            id: Set(Uuid::new_v4()),
            team_id: Set(team_id),
            player_id: Set(lot.player_id),
            price: Set(price),
            in_playing_xi: Set(false),
            is_impact_player: Set(false),
            created_at: Set(Utc::now().into()),
        };
        entry.insert(txn).await?;
    }

    let room_id = lot.room_id;
    let player_id = lot.player_id;
    let mut lot_model: auction_players::ActiveModel = lot.into();
    lot_model.status = Set(AuctionStatus::Completed);
    lot_model.sold_price = Set(winner.map(|_| price));
    lot_model.sold_to_team_id = Set(winner);
    lot_model.update(txn).await?;

    Ok(SaleOutcome {
        room_id,
        lot_id,
        player_id,
        sold_to_team_id: winner,
        price,
    })
}

async fn lot_room_id(db: &DatabaseConnection, lot_id: Uuid) -> Option<Uuid> {
    auction_players::Entity::find_by_id(lot_id)
        .one(db)
        .await
        .ok()
        .flatten()
        .map(|lot| lot.room_id)
}
