pub mod rooms;
pub mod teams;
pub mod players;
pub mod auction_players;
pub mod bids;
pub mod team_players;
pub mod team_ratings;

pub use rooms::Entity as Rooms;
pub use teams::Entity as Teams;
pub use players::Entity as Players;
pub use auction_players::Entity as AuctionPlayers;
pub use bids::Entity as Bids;
pub use team_players::Entity as TeamPlayers;
pub use team_ratings::Entity as TeamRatings;
