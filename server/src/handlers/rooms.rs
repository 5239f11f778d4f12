//! Room creation and membership.

use super::{data, payload};
use crate::connection::Incoming;
use crate::context::ServerContext;
use crate::error::ServiceError;
use crate::room::JoinOutcome;
use crate::router::Outcome;
use serde_json::json;
use shared::RoomTarget;

pub(super) fn create(ctx: &ServerContext, _incoming: &Incoming) -> Result<Outcome, ServiceError> {
    let room_id = ctx.rooms().create();

    Ok(Outcome::reply(data(json!({
        "message": "Room created successfully",
        "room_id": room_id,
    }))))
}

pub(super) fn join(ctx: &ServerContext, incoming: &Incoming) -> Result<Outcome, ServiceError> {
    let user = ctx.caller(incoming)?;
    let target: RoomTarget = payload(incoming)?;

    let message = match ctx.rooms().with_room(&target.room_id, |room| room.join(&user))? {
        JoinOutcome::Joined => "Joined room successfully",
        JoinOutcome::AlreadyMember => "Already in room",
    };

    Ok(Outcome::reply(data(json!({
        "message": message,
        "room_id": target.room_id,
    }))))
}

pub(super) fn leave(ctx: &ServerContext, incoming: &Incoming) -> Result<Outcome, ServiceError> {
    let user = ctx.caller(incoming)?;
    let target: RoomTarget = payload(incoming)?;

    ctx.rooms()
        .with_room(&target.room_id, |room| room.leave(&user))?;

    Ok(Outcome::reply(data(json!({
        "message": "Left room successfully",
        "room_id": target.room_id,
    }))))
}
