//! Room chat: sending to and fetching from member mailboxes.

use super::{data, payload};
use crate::connection::Incoming;
use crate::context::ServerContext;
use crate::error::ServiceError;
use crate::router::Outcome;
use log::debug;
use serde_json::json;
use shared::{ChatMessage, RoomTarget};

pub(super) fn send(ctx: &ServerContext, incoming: &Incoming) -> Result<Outcome, ServiceError> {
    let user = ctx.caller(incoming)?;
    let chat: ChatMessage = payload(incoming)?;

    let delivered = ctx
        .rooms()
        .with_room(&chat.room_id, |room| room.send_message(&user, &chat.message))?;
    debug!(
        "{} sent a message in room {} to {} mailbox(es)",
        user, chat.room_id, delivered
    );

    Ok(Outcome::reply(data(json!({
        "message": "Message sent successfully",
        "room_id": chat.room_id,
    }))))
}

/// Non-blocking: an empty mailbox yields `available: false` and a null message.
pub(super) fn fetch(ctx: &ServerContext, incoming: &Incoming) -> Result<Outcome, ServiceError> {
    let user = ctx.caller(incoming)?;
    let target: RoomTarget = payload(incoming)?;

    let message = ctx
        .rooms()
        .with_room(&target.room_id, |room| room.fetch_message(&user))?;

    Ok(Outcome::reply(data(json!({
        "room_id": target.room_id,
        "available": message.is_some(),
        "message": message,
    }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::*;
    use serde_json::Value;
    use shared::{methods, Request};
    use tokio_test::assert_ok;

    fn setup() -> (std::sync::Arc<ServerContext>, String) {
        let (ctx, _rx) = test_context();
        let room_id = ctx.rooms().create();
        logged_in(&ctx, "alice", 9100);
        logged_in(&ctx, "bob", 9101);
        for user in ["alice", "bob"] {
            ctx.rooms()
                .with_room(&room_id, |room| room.join(user))
                .unwrap();
        }
        (ctx, room_id)
    }

    fn fetch_request(room_id: &str) -> Request {
        Request::new(methods::FETCH).with("room_id", room_id)
    }

    #[test]
    fn test_message_reaches_the_other_member() {
        let (ctx, room_id) = setup();
        let request = Request::new(methods::SEND)
            .with("room_id", room_id.as_str())
            .with("message", "hi");
        assert_ok!(send(&ctx, &incoming(9100, request)));

        let outcome = assert_ok!(fetch(&ctx, &incoming(9101, fetch_request(&room_id))));
        assert_eq!(outcome.data.get("message"), Some(&json!("hi")));
        assert_eq!(outcome.data.get("available"), Some(&json!(true)));

        // The sender's own mailbox stays empty
        let outcome = assert_ok!(fetch(&ctx, &incoming(9100, fetch_request(&room_id))));
        assert_eq!(outcome.data.get("message"), Some(&Value::Null));
        assert_eq!(outcome.data.get("available"), Some(&json!(false)));
    }

    #[test]
    fn test_outsider_cannot_chat() {
        let (ctx, room_id) = setup();
        logged_in(&ctx, "mallory", 9102);

        let request = Request::new(methods::SEND)
            .with("room_id", room_id.as_str())
            .with("message", "hello?");
        assert_eq!(
            send(&ctx, &incoming(9102, request)).unwrap_err(),
            ServiceError::NotAMember
        );
        assert_eq!(
            fetch(&ctx, &incoming(9102, fetch_request(&room_id))).unwrap_err(),
            ServiceError::NotAMember
        );
    }

    #[test]
    fn test_send_without_message_field() {
        let (ctx, room_id) = setup();
        let request = Request::new(methods::SEND).with("room_id", room_id.as_str());

        let result = send(&ctx, &incoming(9100, request));
        assert!(matches!(result, Err(ServiceError::InvalidPayload(_))));
    }
}
