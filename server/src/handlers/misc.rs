//! Card packages and liveness checks.

use super::data;
use crate::connection::Incoming;
use crate::context::ServerContext;
use crate::error::ServiceError;
use crate::router::Outcome;
use crate::shop::open_package;
use log::debug;
use serde_json::json;

pub(super) fn buy(_ctx: &ServerContext, incoming: &Incoming) -> Result<Outcome, ServiceError> {
    let package = open_package(&mut rand::thread_rng());
    debug!("Sold package {:?} to {}", package, incoming.from);

    Ok(Outcome::reply(data(json!({
        "message": "Package bought successfully",
        "package": package,
    }))))
}

pub(super) fn ping(_ctx: &ServerContext, _incoming: &Incoming) -> Result<Outcome, ServiceError> {
    Ok(Outcome::reply(data(json!({ "message": "pong" }))))
}
