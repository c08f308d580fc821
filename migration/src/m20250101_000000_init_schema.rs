use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create rooms table
        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rooms::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Rooms::RoomCode).string().not_null().unique_key())
                    .col(ColumnDef::new(Rooms::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Rooms::TimerDuration).integer().not_null().default(30))
                    .col(ColumnDef::new(Rooms::BidIncrementSmall).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Rooms::BidIncrementMedium).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Rooms::BidIncrementLarge).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Rooms::MinUsers).integer().not_null().default(2))
                    .col(ColumnDef::new(Rooms::MaxUsers).integer().not_null().default(10))
                    .col(ColumnDef::new(Rooms::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // Create teams table
        manager
            .create_table(
                Table::create()
                    .table(Teams::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Teams::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Teams::RoomId).uuid().not_null())
                    .col(ColumnDef::new(Teams::TeamName).string().not_null())
                    .col(ColumnDef::new(Teams::ParticipantId).uuid().null())
                    .col(ColumnDef::new(Teams::InitialPurse).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Teams::PurseLeft).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Teams::IsReady).boolean().not_null().default(false))
                    .col(ColumnDef::new(Teams::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teams_room_id")
                            .from(Teams::Table, Teams::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create players table (static catalog)
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Players::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Players::Name).string().not_null())
                    .col(ColumnDef::new(Players::Role).string_len(20).not_null())
                    .col(ColumnDef::new(Players::Country).string().not_null())
                    .col(ColumnDef::new(Players::BasePrice).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Players::BattingScore).double().not_null())
                    .col(ColumnDef::new(Players::BowlingScore).double().not_null())
                    .col(ColumnDef::new(Players::OverallScore).double().not_null())
                    .col(ColumnDef::new(Players::IsOverseas).boolean().not_null().default(false))
                    .col(ColumnDef::new(Players::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // Create auction_players table (one lot per catalog player per room)
        manager
            .create_table(
                Table::create()
                    .table(AuctionPlayers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AuctionPlayers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(AuctionPlayers::RoomId).uuid().not_null())
                    .col(ColumnDef::new(AuctionPlayers::PlayerId).uuid().not_null())
                    .col(ColumnDef::new(AuctionPlayers::Status).string_len(20).not_null())
                    .col(ColumnDef::new(AuctionPlayers::QueueOrder).integer().not_null())
                    .col(ColumnDef::new(AuctionPlayers::CurrentBid).decimal_len(12, 2).null())
                    .col(ColumnDef::new(AuctionPlayers::CurrentBidderTeamId).uuid().null())
                    .col(ColumnDef::new(AuctionPlayers::BidCount).integer().not_null().default(0))
                    .col(ColumnDef::new(AuctionPlayers::SoldPrice).decimal_len(12, 2).null())
                    .col(ColumnDef::new(AuctionPlayers::SoldToTeamId).uuid().null())
                    .col(ColumnDef::new(AuctionPlayers::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auction_players_room_id")
                            .from(AuctionPlayers::Table, AuctionPlayers::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auction_players_player_id")
                            .from(AuctionPlayers::Table, AuctionPlayers::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auction_players_current_bidder_team_id")
                            .from(AuctionPlayers::Table, AuctionPlayers::CurrentBidderTeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auction_players_sold_to_team_id")
                            .from(AuctionPlayers::Table, AuctionPlayers::SoldToTeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // The lot queue is walked in (room_id, queue_order) order
        manager
            .create_index(
                Index::create()
                    .name("idx_auction_players_room_queue")
                    .table(AuctionPlayers::Table)
                    .col(AuctionPlayers::RoomId)
                    .col(AuctionPlayers::QueueOrder)
                    .to_owned(),
            )
            .await?;

        // Create bids table (append-only audit trail)
        manager
            .create_table(
                Table::create()
                    .table(Bids::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bids::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bids::AuctionPlayerId).uuid().not_null())
                    .col(ColumnDef::new(Bids::TeamId).uuid().not_null())
                    .col(ColumnDef::new(Bids::BidAmount).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Bids::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bids_auction_player_id")
                            .from(Bids::Table, Bids::AuctionPlayerId)
                            .to(AuctionPlayers::Table, AuctionPlayers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bids_team_id")
                            .from(Bids::Table, Bids::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create team_players table (squad entries)
        manager
            .create_table(
                Table::create()
                    .table(TeamPlayers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TeamPlayers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TeamPlayers::TeamId).uuid().not_null())
                    .col(ColumnDef::new(TeamPlayers::PlayerId).uuid().not_null())
                    .col(ColumnDef::new(TeamPlayers::Price).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(TeamPlayers::InPlayingXi).boolean().not_null().default(false))
                    .col(ColumnDef::new(TeamPlayers::IsImpactPlayer).boolean().not_null().default(false))
                    .col(ColumnDef::new(TeamPlayers::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_players_team_id")
                            .from(TeamPlayers::Table, TeamPlayers::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_players_player_id")
                            .from(TeamPlayers::Table, TeamPlayers::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create team_ratings table (derived, one row per team)
        manager
            .create_table(
                Table::create()
                    .table(TeamRatings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TeamRatings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TeamRatings::TeamId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(TeamRatings::OverallRating).double().not_null())
                    .col(ColumnDef::new(TeamRatings::BattingRating).double().not_null())
                    .col(ColumnDef::new(TeamRatings::BowlingRating).double().not_null())
                    .col(ColumnDef::new(TeamRatings::BalanceScore).double().not_null())
                    .col(ColumnDef::new(TeamRatings::BenchDepth).double().not_null())
                    .col(ColumnDef::new(TeamRatings::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_ratings_team_id")
                            .from(TeamRatings::Table, TeamRatings::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order due to foreign key constraints
        manager
            .drop_table(Table::drop().table(TeamRatings::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TeamPlayers::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Bids::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AuctionPlayers::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Players::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Teams::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Rooms::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Rooms {
    Table,
    Id,
    RoomCode,
    Status,
    TimerDuration,
    BidIncrementSmall,
    BidIncrementMedium,
    BidIncrementLarge,
    MinUsers,
    MaxUsers,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Teams {
    Table,
    Id,
    RoomId,
    TeamName,
    ParticipantId,
    InitialPurse,
    PurseLeft,
    IsReady,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Players {
    Table,
    Id,
    Name,
    Role,
    Country,
    BasePrice,
    BattingScore,
    BowlingScore,
    OverallScore,
    IsOverseas,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuctionPlayers {
    Table,
    Id,
    RoomId,
    PlayerId,
    Status,
    QueueOrder,
    CurrentBid,
    CurrentBidderTeamId,
    BidCount,
    SoldPrice,
    SoldToTeamId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Bids {
    Table,
    Id,
    AuctionPlayerId,
    TeamId,
    BidAmount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TeamPlayers {
    Table,
    Id,
    TeamId,
    PlayerId,
    Price,
    InPlayingXi,
    IsImpactPlayer,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TeamRatings {
    Table,
    Id,
    TeamId,
    OverallRating,
    BattingRating,
    BowlingRating,
    BalanceScore,
    BenchDepth,
    UpdatedAt,
}
