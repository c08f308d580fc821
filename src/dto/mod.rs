pub mod bid_request;
pub mod room_snapshot;

pub use bid_request::BidRequest;
pub use room_snapshot::{
    BidSnapshot, LotSnapshot, PlayerInfo, RoomInfo, RoomSnapshot, SoldLotSnapshot, TeamSnapshot,
};
