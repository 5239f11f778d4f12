//! Card plays and round result pushes.

use super::{data, payload};
use crate::connection::{Incoming, Outgoing};
use crate::context::ServerContext;
use crate::error::ServiceError;
use crate::room::{PlayOutcome, RoundResult};
use crate::router::Outcome;
use log::info;
use serde_json::json;
use shared::{methods, PlayCard, Response};

/// Records the caller's card. When this completes the round, each player is
/// pushed the card their opponent played.
pub(super) fn play(ctx: &ServerContext, incoming: &Incoming) -> Result<Outcome, ServiceError> {
    let user = ctx.caller(incoming)?;
    let play: PlayCard = payload(incoming)?;

    let outcome = ctx
        .rooms()
        .with_room(&play.room_id, |room| room.play_card(&user, play.card))?;

    let mut reply = Outcome::reply(data(json!({
        "message": "Card played successfully",
        "room_id": play.room_id,
    })));

    if let PlayOutcome::Completed(result) = outcome {
        info!("Room {} completed round {}", play.room_id, result.round);
        for (player, _) in &result.plays {
            reply = reply.with_push(opponent_played(ctx, &play.room_id, player, &result));
        }
    }

    Ok(reply)
}

fn opponent_played(
    ctx: &ServerContext,
    room_id: &str,
    player: &str,
    result: &RoundResult,
) -> Option<Outgoing> {
    let (opponent, card) = result.opponent_of(player)?;
    let push = Response::ok(
        methods::OPPONENT_PLAYED,
        data(json!({
            "room_id": room_id,
            "opponent_id": opponent,
            "opponent_card": card.card_type().as_str(),
            "opponent_card_star": card.stars(),
        })),
    );
    ctx.push_to(player, push)
}
