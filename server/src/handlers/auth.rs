//! Account registration and login sessions.

use super::{data, payload};
use crate::connection::Incoming;
use crate::context::ServerContext;
use crate::error::ServiceError;
use crate::router::Outcome;
use log::info;
use serde_json::json;
use shared::Credentials;

pub(super) fn register(ctx: &ServerContext, incoming: &Incoming) -> Result<Outcome, ServiceError> {
    let credentials: Credentials = payload(incoming)?;
    ctx.users()
        .register(&credentials.username, &credentials.password)?;

    Ok(Outcome::reply(data(json!({
        "message": "User registered successfully",
    }))))
}

/// Checks credentials and binds the user to the calling connection. A user
/// already logged in elsewhere is moved to this connection. Fails if the
/// calling connection closed before the request got here.
pub(super) fn login(ctx: &ServerContext, incoming: &Incoming) -> Result<Outcome, ServiceError> {
    let credentials: Credentials = payload(incoming)?;
    let user = ctx
        .users()
        .login(&credentials.username, &credentials.password)?;

    ctx.sessions().bind(&user, incoming.from)?;
    info!("User {} logged in from {}", user, incoming.from);

    Ok(Outcome::reply(data(json!({
        "message": "User logged in successfully",
        "user_id": user,
    }))))
}

pub(super) fn logout(ctx: &ServerContext, incoming: &Incoming) -> Result<Outcome, ServiceError> {
    let user = ctx.caller(incoming)?;
    ctx.sessions().unbind(&user);
    info!("User {} logged out", user);

    Ok(Outcome::reply(data(json!({
        "message": "User logged out successfully",
    }))))
}
