//! Squad optimizer orchestration.
//!
//! Database-coupled wrapper around the pure selection logic: fetches a
//! team's squad joined with catalog attributes, runs the selection, then
//! persists the XI / impact flags and the team_ratings row. Idempotent,
//! safe to re-run at any time.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::auction::selection::{
    calculate_team_rating, select_playing_xi, SquadCandidate, TeamRatingBreakdown,
    ViabilityShortfall,
};
use crate::entity::{players, team_players, team_ratings, teams};
use crate::error::AuctionError;

/// Optimizer output for one team
#[derive(Clone, Debug, Serialize)]
pub struct TeamAnalysis {
    pub team_id: Uuid,
    pub playing_xi: Vec<Uuid>,
    pub impact_player: Option<Uuid>,
    pub ratings: TeamRatingBreakdown,
    pub shortfall: Option<ViabilityShortfall>,
}

/// Run the squad optimizer for a team and persist the result.
pub async fn run_for_team(
    db: &DatabaseConnection,
    team_id: Uuid,
) -> Result<TeamAnalysis, AuctionError> {
    let analysis = db
        .transaction::<_, TeamAnalysis, AuctionError>(|txn| {
            Box::pin(async move { run_for_team_txn(txn, team_id).await })
        })
        .await?;
    Ok(analysis)
}

pub(crate) async fn run_for_team_txn(
    txn: &DatabaseTransaction,
    team_id: Uuid,
) -> Result<TeamAnalysis, AuctionError> {
    let team = teams::Entity::find_by_id(team_id)
        .one(txn)
        .await?
        .ok_or(AuctionError::NotFound("team"))?;

    // Squad entries in creation order, which doubles as the deterministic
    // tie-break for equal overall scores.
    let entries = team_players::Entity::find()
        .filter(team_players::Column::TeamId.eq(team.id))
        .order_by_asc(team_players::Column::CreatedAt)
        .order_by_asc(team_players::Column::Id)
        .all(txn)
        .await?;

    let player_ids: Vec<Uuid> = entries.iter().map(|e| e.player_id).collect();
    let catalog: HashMap<Uuid, players::Model> = players::Entity::find()
        .filter(players::Column::Id.is_in(player_ids))
        .all(txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut candidates = Vec::with_capacity(entries.len());
    for entry in &entries {
        let player = catalog
            .get(&entry.player_id)
            .ok_or(AuctionError::MissingCatalogPlayer)?;
        candidates.push(SquadCandidate {
            entry_id: entry.id,
            role: player.role,
            overall_score: player.overall_score,
            batting_score: player.batting_score,
            bowling_score: player.bowling_score,
            is_overseas: player.is_overseas,
        });
    }

    let selection = select_playing_xi(&candidates);
    if let Some(shortfall) = &selection.shortfall {
        warn!(
            team_id = %team.id,
            wicket_keepers = shortfall.wicket_keepers,
            batsmen = shortfall.batsmen,
            bowlers = shortfall.bowlers,
            eleven_size = shortfall.eleven_size,
            "squad below minimum viable eleven"
        );
    }
    let ratings = calculate_team_rating(&candidates, &selection);

    // Full replace of the flags: clear everything for the team, then set
    // the freshly selected entries.
    team_players::Entity::update_many()
        .col_expr(team_players::Column::InPlayingXi, Expr::value(false))
        .col_expr(team_players::Column::IsImpactPlayer, Expr::value(false))
        .filter(team_players::Column::TeamId.eq(team.id))
        .exec(txn)
        .await?;

    if !selection.xi.is_empty() {
        team_players::Entity::update_many()
            .col_expr(team_players::Column::InPlayingXi, Expr::value(true))
            .filter(team_players::Column::Id.is_in(selection.xi.clone()))
            .exec(txn)
            .await?;
    }
    if let Some(impact_id) = selection.impact_player {
        team_players::Entity::update_many()
            .col_expr(team_players::Column::IsImpactPlayer, Expr::value(true))
            .filter(team_players::Column::Id.eq(impact_id))
            .exec(txn)
            .await?;
    }

    upsert_ratings(txn, team.id, &ratings).await?;

    Ok(TeamAnalysis {
        team_id: team.id,
        playing_xi: selection.xi,
        impact_player: selection.impact_player,
        ratings,
        shortfall: selection.shortfall,
    })
}

async fn upsert_ratings(
    txn: &DatabaseTransaction,
    team_id: Uuid,
    ratings: &TeamRatingBreakdown,
) -> Result<(), AuctionError> {
    let existing = team_ratings::Entity::find()
        .filter(team_ratings::Column::TeamId.eq(team_id))
        .one(txn)
        .await?;

    match existing {
        Some(row) => {
            let mut model: team_ratings::ActiveModel = row.into();
            model.overall_rating = Set(ratings.overall_rating);
            model.batting_rating = Set(ratings.batting_rating);
            model.bowling_rating = Set(ratings.bowling_rating);
            model.balance_score = Set(ratings.balance_score);
            model.bench_depth = Set(ratings.bench_depth);
            model.updated_at = Set(Utc::now().into());
            model.update(txn).await?;
        }
        None => {
            let model = team_ratings::ActiveModel {
                id: Set(Uuid::new_v4()),
                team_id: Set(team_id),
                overall_rating: Set(ratings.overall_rating),
                batting_rating: Set(ratings.batting_rating),
                bowling_rating: Set(ratings.bowling_rating),
                balance_score: Set(ratings.balance_score),
                bench_depth: Set(ratings.bench_depth),
                updated_at: Set(Utc::now().into()),
            };
            model.insert(txn).await?;
        }
    }
    Ok(())
}
