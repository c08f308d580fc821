use actix_web::http::StatusCode;
use sea_orm::{DbErr, TransactionError};
use thiserror::Error;

/// Failures surfaced by the auction engine. Bid arbitration losses
/// (`StaleBid`) are expected under contention and map to 409 so clients
/// can refresh and retry.
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("lot is not open for bidding")]
    LotNotOpen,

    #[error("bid lost arbitration, lot state has moved on")]
    StaleBid,

    #[error("insufficient funds for this bid")]
    InsufficientFunds,

    #[error("bid amount does not match any configured increment tier")]
    InvalidTierAmount,

    #[error("room is not in a state that allows this operation")]
    RoomNotOpen,

    #[error("{0} team(s) are not ready")]
    TeamsNotReady(usize),

    #[error("team does not belong to this room")]
    TeamNotInRoom,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("squad references a player missing from the catalog")]
    MissingCatalogPlayer,

    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

impl AuctionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::StaleBid => StatusCode::CONFLICT,
            AuctionError::NotFound(_) => StatusCode::NOT_FOUND,
            AuctionError::ConsistencyViolation(_)
            | AuctionError::MissingCatalogPlayer
            | AuctionError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Collapses sea-orm's transaction error wrapper back into our taxonomy.
impl From<TransactionError<AuctionError>> for AuctionError {
    fn from(err: TransactionError<AuctionError>) -> Self {
        match err {
            TransactionError::Connection(e) => AuctionError::Db(e),
            TransactionError::Transaction(e) => e,
        }
    }
}
