use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "players")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub role: PlayerRole,
    pub country: String,
    pub base_price: Decimal,
    pub batting_score: f64,
    pub bowling_score: f64,
    pub overall_score: f64,
    pub is_overseas: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PlayerRole {
    #[sea_orm(string_value = "BATSMAN")]
    Batsman,
    #[sea_orm(string_value = "BOWLER")]
    Bowler,
    #[sea_orm(string_value = "ALL_ROUNDER")]
    AllRounder,
    #[sea_orm(string_value = "WICKET_KEEPER")]
    WicketKeeper,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::auction_players::Entity")]
    AuctionPlayers,
    #[sea_orm(has_many = "super::team_players::Entity")]
    TeamPlayers,
}

impl Related<super::auction_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuctionPlayers.def()
    }
}

impl Related<super::team_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeamPlayers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
