//! Method handlers and the router that serves them.

mod auth;
mod chat;
mod game;
mod misc;
mod rooms;

use crate::connection::Incoming;
use crate::error::ServiceError;
use crate::router::Router;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{methods, Data};

/// Router with every method the server understands.
pub fn router() -> Router {
    let mut router = Router::new();
    router.add_route(methods::REGISTER, auth::register);
    router.add_route(methods::LOGIN, auth::login);
    router.add_route(methods::LOGOUT, auth::logout);
    router.add_route(methods::CREATE, rooms::create);
    router.add_route(methods::JOIN, rooms::join);
    router.add_route(methods::LEAVE, rooms::leave);
    router.add_route(methods::SEND, chat::send);
    router.add_route(methods::FETCH, chat::fetch);
    router.add_route(methods::PLAY, game::play);
    router.add_route(methods::BUY, misc::buy);
    router.add_route(methods::PING, misc::ping);
    router
}

fn payload<T: DeserializeOwned>(incoming: &Incoming) -> Result<T, ServiceError> {
    Ok(incoming.request.payload()?)
}

/// Unwraps a `json!` object literal into response data.
fn data(value: Value) -> Data {
    match value {
        Value::Object(map) => map,
        _ => Data::new(),
    }
}
