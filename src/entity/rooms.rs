use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rooms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub room_code: String,
    pub status: RoomStatus,
    pub timer_duration: i32,
    pub bid_increment_small: Decimal,
    pub bid_increment_medium: Decimal,
    pub bid_increment_large: Decimal,
    pub min_users: i32,
    pub max_users: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Clone, Debug, PartialEq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RoomStatus {
    #[sea_orm(string_value = "LOBBY")]
    Lobby,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::teams::Entity")]
    Teams,
    #[sea_orm(has_many = "super::auction_players::Entity")]
    AuctionPlayers,
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teams.def()
    }
}

impl Related<super::auction_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuctionPlayers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
