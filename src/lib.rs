pub mod auction;
pub mod bootstrap;
pub mod dto;
pub mod entity;
pub mod error;
pub mod notify;
pub mod test_support;

pub use bootstrap::{connect_and_migrate_from_env, init_tracing, load_dotenv};

use actix_web::web;

use auction::{
    advance_room, force_expire, get_room_state, run_team_analysis, start_auction, submit_bid,
};

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut actix_web::web::ServiceConfig) {
    cfg.service(hello).service(
        web::scope("/api")
            .service(start_auction)
            .service(advance_room)
            .service(submit_bid)
            .service(force_expire)
            .service(run_team_analysis)
            .service(get_room_state),
    );
}

#[actix_web::get("/")]
async fn hello() -> impl actix_web::Responder {
    "Auction backend is running"
}
