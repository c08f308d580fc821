//! Purse accounting.
//!
//! Money only leaves a purse at sale finalization, through a conditional
//! single-row UPDATE so the balance can never go negative regardless of
//! interleaving.

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::teams;
use crate::error::AuctionError;

/// Deduct `amount` from the team's purse iff the purse still covers it.
///
/// Zero rows affected means bid-time funds validation was bypassed
/// somewhere, which is a consistency violation rather than a user error.
pub async fn reserve_and_deduct<C: ConnectionTrait>(
    conn: &C,
    team_id: Uuid,
    amount: Decimal,
) -> Result<(), AuctionError> {
    let result = teams::Entity::update_many()
        .col_expr(
            teams::Column::PurseLeft,
            Expr::col(teams::Column::PurseLeft).sub(amount),
        )
        .filter(teams::Column::Id.eq(team_id))
        .filter(teams::Column::PurseLeft.gte(amount))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AuctionError::ConsistencyViolation(format!(
            "purse of team {team_id} cannot cover sale price {amount}"
        )));
    }
    Ok(())
}
