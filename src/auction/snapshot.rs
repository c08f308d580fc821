//! Room snapshot assembly for the state endpoint.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::auction::timer::AuctionTimers;
use crate::dto::{
    BidSnapshot, LotSnapshot, PlayerInfo, RoomInfo, RoomSnapshot, SoldLotSnapshot, TeamSnapshot,
};
use crate::entity::auction_players::AuctionStatus;
use crate::entity::{auction_players, bids, players, rooms, team_players, teams};
use crate::error::AuctionError;

/// How many ledger rows the current-lot view carries
const RECENT_BID_LIMIT: u64 = 10;

/// Build the full state snapshot for a room: teams by remaining purse,
/// the active lot with its countdown and recent bids, and sold lots.
pub async fn build_room_snapshot(
    db: &DatabaseConnection,
    timers: &AuctionTimers,
    room_id: Uuid,
) -> Result<RoomSnapshot, AuctionError> {
    let room = rooms::Entity::find_by_id(room_id)
        .one(db)
        .await?
        .ok_or(AuctionError::NotFound("room"))?;

    let room_teams = teams::Entity::find()
        .filter(teams::Column::RoomId.eq(room.id))
        .order_by_desc(teams::Column::PurseLeft)
        .all(db)
        .await?;

    let mut team_snapshots = Vec::with_capacity(room_teams.len());
    for team in &room_teams {
        let squad_size = team_players::Entity::find()
            .filter(team_players::Column::TeamId.eq(team.id))
            .count(db)
            .await? as usize;
        team_snapshots.push(TeamSnapshot {
            id: team.id,
            team_name: team.team_name.clone(),
            purse_left: team.purse_left,
            squad_size,
            is_ready: team.is_ready,
        });
    }

    let active = auction_players::Entity::find()
        .filter(auction_players::Column::RoomId.eq(room.id))
        .filter(auction_players::Column::Status.eq(AuctionStatus::Active))
        .one(db)
        .await?;

    let current_lot = match active {
        Some(lot) => {
            let player = players::Entity::find_by_id(lot.player_id)
                .one(db)
                .await?
                .ok_or(AuctionError::MissingCatalogPlayer)?;
            let recent = bids::Entity::find()
                .filter(bids::Column::AuctionPlayerId.eq(lot.id))
                .order_by_desc(bids::Column::CreatedAt)
                .limit(RECENT_BID_LIMIT)
                .all(db)
                .await?;
            Some(LotSnapshot {
                id: lot.id,
                player: PlayerInfo {
                    id: player.id,
                    name: player.name,
                    role: role_label(player.role),
                    country: player.country,
                    base_price: player.base_price,
                    overall_score: player.overall_score,
                    is_overseas: player.is_overseas,
                },
                current_bid: lot.current_bid,
                current_bidder_team_id: lot.current_bidder_team_id,
                bid_count: lot.bid_count,
                time_left_secs: timers.remaining_secs(lot.id),
                recent_bids: recent
                    .into_iter()
                    .map(|b| BidSnapshot {
                        team_id: b.team_id,
                        bid_amount: b.bid_amount,
                        created_at: b.created_at,
                    })
                    .collect(),
            })
        }
        None => None,
    };

    let completed = auction_players::Entity::find()
        .filter(auction_players::Column::RoomId.eq(room.id))
        .filter(auction_players::Column::Status.eq(AuctionStatus::Completed))
        .order_by_asc(auction_players::Column::QueueOrder)
        .find_also_related(players::Entity)
        .all(db)
        .await?;
    let sold_lots = completed
        .into_iter()
        .map(|(lot, player)| SoldLotSnapshot {
            lot_id: lot.id,
            player_id: lot.player_id,
            player_name: player.map(|p| p.name).unwrap_or_default(),
            sold_price: lot.sold_price,
            sold_to_team_id: lot.sold_to_team_id,
        })
        .collect();

    Ok(RoomSnapshot {
        room: RoomInfo {
            id: room.id,
            room_code: room.room_code,
            status: status_label(&room.status),
            timer_duration: room.timer_duration,
            created_at: room.created_at,
        },
        teams: team_snapshots,
        current_lot,
        sold_lots,
    })
}

fn status_label(status: &rooms::RoomStatus) -> String {
    match status {
        rooms::RoomStatus::Lobby => "LOBBY".to_string(),
        rooms::RoomStatus::InProgress => "IN_PROGRESS".to_string(),
        rooms::RoomStatus::Completed => "COMPLETED".to_string(),
    }
}

fn role_label(role: players::PlayerRole) -> String {
    match role {
        players::PlayerRole::Batsman => "BATSMAN".to_string(),
        players::PlayerRole::Bowler => "BOWLER".to_string(),
        players::PlayerRole::AllRounder => "ALL_ROUNDER".to_string(),
        players::PlayerRole::WicketKeeper => "WICKET_KEEPER".to_string(),
    }
}
