//! HTTP boundary for the Tactix analysis handler.
//!
//! Rocket owns transport concerns only: body limits, method routing and
//! response headers. Every decision about a request is made by
//! `AnalysisHandler`.

mod reply;
mod routes;

pub use reply::{CorsHeaders, JsonReply};

use log::info;
use rocket::data::{Limits, ToByteUnit};
use rocket::{Build, Rocket, catchers, routes};
use tactix_config::TactixConfig;
use tactix_core::AnalysisHandler;

/// State managed by Rocket and shared by every route.
pub struct ServerState {
    pub handler: AnalysisHandler,
}

/// Assemble the Rocket instance for the configured address, port and route.
pub fn build_rocket(config: &TactixConfig, handler: AnalysisHandler) -> Rocket<Build> {
    let server = &config.server;
    let body_limit = server.body_limit_bytes.bytes();
    let limits = Limits::default()
        .limit("string", body_limit)
        .limit("json", body_limit);
    let figment = rocket::Config::figment()
        .merge(("address", server.address.as_str()))
        .merge(("port", server.port))
        .merge(("limits", limits));
    info!(
        "building server (address={}, port={}, route={}, body_limit_bytes={}, api_key_configured={})",
        server.address,
        server.port,
        server.route,
        server.body_limit_bytes,
        handler.has_client()
    );

    rocket::custom(figment)
        .manage(ServerState { handler })
        .attach(CorsHeaders)
        .mount(
            server.route.as_str(),
            routes![routes::analyze, routes::preflight],
        )
        .mount(
            "/",
            routes![
                routes::reject_get,
                routes::reject_put,
                routes::reject_delete,
                routes::reject_patch,
                routes::reject_trace,
                routes::reject_connect
            ],
        )
        .register("/", catchers![routes::fallback])
}
