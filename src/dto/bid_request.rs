use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auction::rules::BidTier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidRequest {
    pub team_id: Uuid,
    pub tier: BidTier,
}
