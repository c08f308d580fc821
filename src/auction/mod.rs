//! Auction domain: engine orchestration, bid arbitration, purse
//! accounting, squad selection, and the HTTP handlers over them.

pub mod arbitration;
pub mod engine;
pub mod optimizer;
pub mod purse;
pub mod rules;
pub mod selection;
pub mod snapshot;
pub mod timer;

use actix_web::{get, post, web, HttpResponse, Result as ActixResult};
use serde_json::json;
use uuid::Uuid;

use crate::dto::BidRequest;
use crate::error::AuctionError;
use engine::AuctionEngine;

fn error_response(err: &AuctionError) -> HttpResponse {
    HttpResponse::build(err.status_code())
        .content_type("application/json")
        .json(json!({
            "error": err.to_string()
        }))
}

fn parse_id(path: &str, label: &str) -> Result<Uuid, HttpResponse> {
    path.parse::<Uuid>().map_err(|_| {
        HttpResponse::BadRequest()
            .content_type("application/json")
            .json(json!({
                "error": format!("Invalid {label} ID format")
            }))
    })
}

#[post("/room/{id}/start")]
pub async fn start_auction(
    path: web::Path<String>,
    engine: web::Data<AuctionEngine>,
) -> ActixResult<HttpResponse> {
    let room_id = match parse_id(&path, "room") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match engine.start_auction(room_id).await {
        Ok(()) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({
                "room_id": room_id,
                "status": "IN_PROGRESS"
            }))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[post("/room/{id}/advance")]
pub async fn advance_room(
    path: web::Path<String>,
    engine: web::Data<AuctionEngine>,
) -> ActixResult<HttpResponse> {
    let room_id = match parse_id(&path, "room") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match engine.advance_room(room_id).await {
        Ok(()) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({
                "room_id": room_id
            }))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[post("/lot/{id}/bid")]
pub async fn submit_bid(
    path: web::Path<String>,
    bid_data: web::Json<BidRequest>,
    engine: web::Data<AuctionEngine>,
) -> ActixResult<HttpResponse> {
    let lot_id = match parse_id(&path, "lot") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match engine.submit_bid(lot_id, bid_data.team_id, bid_data.tier).await {
        Ok(receipt) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({
                "lot_id": lot_id,
                "team_id": bid_data.team_id,
                "amount": receipt.amount,
                "bid_count": receipt.bid_count
            }))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[post("/lot/{id}/expire")]
pub async fn force_expire(
    path: web::Path<String>,
    engine: web::Data<AuctionEngine>,
) -> ActixResult<HttpResponse> {
    let lot_id = match parse_id(&path, "lot") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match engine.force_expire(lot_id).await {
        Ok(outcome) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(json!({
                "lot_id": outcome.lot_id,
                "player_id": outcome.player_id,
                "sold_to_team_id": outcome.sold_to_team_id,
                "price": outcome.price
            }))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[post("/team/{id}/analysis")]
pub async fn run_team_analysis(
    path: web::Path<String>,
    engine: web::Data<AuctionEngine>,
) -> ActixResult<HttpResponse> {
    let team_id = match parse_id(&path, "team") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match optimizer::run_for_team(engine.db(), team_id).await {
        Ok(analysis) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(analysis)),
        Err(e) => Ok(error_response(&e)),
    }
}

#[get("/room/{id}/state")]
pub async fn get_room_state(
    path: web::Path<String>,
    engine: web::Data<AuctionEngine>,
) -> ActixResult<HttpResponse> {
    let room_id = match parse_id(&path, "room") {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match snapshot::build_room_snapshot(engine.db(), engine.timers(), room_id).await {
        Ok(snapshot) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .json(snapshot)),
        Err(e) => Ok(error_response(&e)),
    }
}
