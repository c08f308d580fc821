use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room: RoomInfo,
    pub teams: Vec<TeamSnapshot>,
    pub current_lot: Option<LotSnapshot>,
    pub sold_lots: Vec<SoldLotSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: Uuid,
    pub room_code: String,
    pub status: String,
    pub timer_duration: i32,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub id: Uuid,
    pub team_name: String,
    pub purse_left: Decimal,
    pub squad_size: usize,
    pub is_ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotSnapshot {
    pub id: Uuid,
    pub player: PlayerInfo,
    pub current_bid: Option<Decimal>,
    pub current_bidder_team_id: Option<Uuid>,
    pub bid_count: i32,
    pub time_left_secs: Option<u64>,
    pub recent_bids: Vec<BidSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub country: String,
    pub base_price: Decimal,
    pub overall_score: f64,
    pub is_overseas: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidSnapshot {
    pub team_id: Uuid,
    pub bid_amount: Decimal,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoldLotSnapshot {
    pub lot_id: Uuid,
    pub player_id: Uuid,
    pub player_name: String,
    pub sold_price: Option<Decimal>,
    pub sold_to_team_id: Option<Uuid>,
}
