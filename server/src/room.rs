//! Two-player room: membership, chat mailboxes and the round state machine.
//!
//! A round moves `Empty` → `OnePlayed` → `BothPlayed` and straight back to
//! `Empty`. The second play completes the round and resets it within the same
//! call, so `BothPlayed` is never observed from outside; the completed plays
//! are handed back to the caller, which delivers them to both members.
//!
//! A `Room` is plain data. Callers wrap it in a mutex and perform each
//! operation under a single guard, which is what makes the check-then-mutate
//! sequences below atomic.

use crate::error::ServiceError;
use crate::mailbox::Mailbox;
use crate::{RoomId, UserId};
use log::{debug, info};
use shared::Card;
use std::collections::HashMap;

pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Empty,
    OnePlayed,
    BothPlayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,
}

/// The two plays of a finished round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    /// 1-based number of the round within the room
    pub round: u64,
    pub plays: Vec<(UserId, Card)>,
}

impl RoundResult {
    /// The play made by whoever is not `user`.
    pub fn opponent_of(&self, user: &str) -> Option<&(UserId, Card)> {
        self.plays.iter().find(|(player, _)| player != user)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The card is recorded; the opponent has not played yet.
    Waiting,
    /// This play completed the round and the round has been reset.
    Completed(RoundResult),
}

#[derive(Debug)]
pub struct Room {
    id: RoomId,
    members: Vec<UserId>,
    mailboxes: HashMap<UserId, Mailbox>,
    plays: Vec<(UserId, Card)>,
    rounds_completed: u64,
    mailbox_capacity: usize,
}

impl Room {
    pub fn new(id: RoomId, mailbox_capacity: usize) -> Self {
        Self {
            id,
            members: Vec::with_capacity(ROOM_CAPACITY),
            mailboxes: HashMap::new(),
            plays: Vec::with_capacity(ROOM_CAPACITY),
            rounds_completed: 0,
            mailbox_capacity,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn members(&self) -> &[UserId] {
        &self.members
    }

    pub fn is_member(&self, user: &str) -> bool {
        self.members.iter().any(|member| member == user)
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }

    pub fn join(&mut self, user: &str) -> Result<JoinOutcome, ServiceError> {
        if self.is_member(user) {
            return Ok(JoinOutcome::AlreadyMember);
        }
        if self.is_full() {
            return Err(ServiceError::RoomFull);
        }

        self.members.push(user.to_string());
        self.mailboxes
            .insert(user.to_string(), Mailbox::new(self.mailbox_capacity));
        info!(
            "User {} joined room {} ({}/{})",
            user,
            self.id,
            self.members.len(),
            ROOM_CAPACITY
        );
        Ok(JoinOutcome::Joined)
    }

    /// Removes a member together with their mailbox and any pending play.
    pub fn leave(&mut self, user: &str) -> Result<(), ServiceError> {
        if !self.is_member(user) {
            return Err(ServiceError::NotAMember);
        }

        self.members.retain(|member| member != user);
        self.mailboxes.remove(user);
        self.plays.retain(|(player, _)| player != user);
        if self.members.is_empty() {
            self.plays.clear();
            self.mailboxes.clear();
        }
        info!("User {} left room {}", user, self.id);
        Ok(())
    }

    /// Queues `message` for every other member. Returns how many mailboxes
    /// received it.
    pub fn send_message(&mut self, from: &str, message: &str) -> Result<usize, ServiceError> {
        if !self.is_member(from) {
            return Err(ServiceError::NotAMember);
        }

        let mut delivered = 0;
        for (member, mailbox) in self.mailboxes.iter_mut() {
            if member == from {
                continue;
            }
            if let Some(evicted) = mailbox.push(message.to_string()) {
                debug!(
                    "Mailbox of {} in room {} full, dropped {:?}",
                    member, self.id, evicted
                );
            }
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Takes the oldest waiting message for `user`, if any.
    pub fn fetch_message(&mut self, user: &str) -> Result<Option<String>, ServiceError> {
        if !self.is_member(user) {
            return Err(ServiceError::NotAMember);
        }
        Ok(self.mailboxes.get_mut(user).and_then(Mailbox::pop))
    }

    pub fn play_card(&mut self, user: &str, card: Card) -> Result<PlayOutcome, ServiceError> {
        if !self.is_member(user) {
            return Err(ServiceError::NotAMember);
        }
        if self.play_of(user).is_some() {
            return Err(ServiceError::AlreadyPlayed);
        }
        if self.plays.len() >= ROOM_CAPACITY {
            return Err(ServiceError::RoundFull);
        }

        self.plays.push((user.to_string(), card));
        if self.plays.len() < ROOM_CAPACITY {
            return Ok(PlayOutcome::Waiting);
        }

        self.rounds_completed += 1;
        Ok(PlayOutcome::Completed(RoundResult {
            round: self.rounds_completed,
            plays: std::mem::take(&mut self.plays),
        }))
    }

    pub fn round_state(&self) -> RoundState {
        match self.plays.len() {
            0 => RoundState::Empty,
            1 => RoundState::OnePlayed,
            _ => RoundState::BothPlayed,
        }
    }

    /// The card `user` has played in the current round.
    pub fn play_of(&self, user: &str) -> Option<Card> {
        self.plays
            .iter()
            .find(|(player, _)| player == user)
            .map(|(_, card)| *card)
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }

    #[cfg(test)]
    pub fn pending_messages(&self, user: &str) -> usize {
        self.mailboxes.get(user).map_or(0, Mailbox::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::CardType;
    use tokio_test::{assert_err, assert_ok};

    fn card(card_type: CardType, stars: i64) -> Card {
        Card::new(card_type, stars).unwrap()
    }

    fn room_with(members: &[&str]) -> Room {
        let mut room = Room::new("1".to_string(), 16);
        for member in members {
            room.join(member).unwrap();
        }
        room
    }

    #[test]
    fn test_room_creation() {
        let room = Room::new("7".to_string(), 16);
        assert_eq!(room.id(), "7");
        assert!(room.members().is_empty());
        assert_eq!(room.round_state(), RoundState::Empty);
        assert_eq!(room.rounds_completed(), 0);
    }

    #[test]
    fn test_join_until_full() {
        let mut room = room_with(&["alice", "bob"]);
        assert!(room.is_full());

        let result = room.join("carol");
        assert_eq!(result, Err(ServiceError::RoomFull));
        assert_eq!(room.members(), ["alice", "bob"]);
        assert!(!room.is_member("carol"));
    }

    #[test]
    fn test_join_twice_is_harmless() {
        let mut room = room_with(&["alice"]);
        assert_eq!(room.join("alice"), Ok(JoinOutcome::AlreadyMember));
        assert_eq!(room.members().len(), 1);

        // Still succeeds once the room is full
        room.join("bob").unwrap();
        assert_eq!(room.join("bob"), Ok(JoinOutcome::AlreadyMember));
    }

    #[test]
    fn test_leave_requires_membership() {
        let mut room = room_with(&["alice"]);
        assert_eq!(room.leave("bob"), Err(ServiceError::NotAMember));
        assert_ok!(room.leave("alice"));
        assert!(room.members().is_empty());
        assert_err!(room.leave("alice"));
    }

    #[test]
    fn test_leave_frees_a_seat() {
        let mut room = room_with(&["alice", "bob"]);
        room.leave("alice").unwrap();
        assert_eq!(room.join("carol"), Ok(JoinOutcome::Joined));
        assert_eq!(room.members(), ["bob", "carol"]);
    }

    #[test]
    fn test_leave_discards_pending_play_and_mailbox() {
        let mut room = room_with(&["alice", "bob"]);
        room.play_card("alice", card(CardType::Rock, 3)).unwrap();
        room.send_message("bob", "hi").unwrap();
        assert_eq!(room.pending_messages("alice"), 1);

        room.leave("alice").unwrap();
        assert_eq!(room.round_state(), RoundState::Empty);
        assert_eq!(room.pending_messages("alice"), 0);

        // Rejoining starts with an empty mailbox
        room.join("alice").unwrap();
        assert_eq!(assert_ok!(room.fetch_message("alice")), None);
    }

    #[test]
    fn test_last_member_leaving_clears_round() {
        let mut room = room_with(&["alice"]);
        room.play_card("alice", card(CardType::Paper, 1)).unwrap();
        room.leave("alice").unwrap();

        assert_eq!(room.round_state(), RoundState::Empty);
        assert!(room.members().is_empty());
    }

    #[test]
    fn test_chat_goes_to_other_member_only() {
        let mut room = room_with(&["alice", "bob"]);
        assert_eq!(room.send_message("alice", "hi"), Ok(1));

        assert_eq!(room.fetch_message("bob"), Ok(Some("hi".to_string())));
        assert_eq!(room.fetch_message("bob"), Ok(None));
        assert_eq!(room.fetch_message("alice"), Ok(None));
    }

    #[test]
    fn test_chat_alone_reaches_nobody() {
        let mut room = room_with(&["alice"]);
        assert_eq!(room.send_message("alice", "anyone?"), Ok(0));
    }

    #[test]
    fn test_chat_requires_membership() {
        let mut room = room_with(&["alice"]);
        assert_eq!(room.send_message("bob", "hi"), Err(ServiceError::NotAMember));
        assert_eq!(room.fetch_message("bob"), Err(ServiceError::NotAMember));
    }

    #[test]
    fn test_chat_overflow_keeps_newest() {
        let mut room = Room::new("1".to_string(), 2);
        room.join("alice").unwrap();
        room.join("bob").unwrap();
        for text in ["one", "two", "three"] {
            room.send_message("alice", text).unwrap();
        }

        assert_eq!(room.pending_messages("bob"), 2);
        assert_eq!(room.fetch_message("bob"), Ok(Some("two".to_string())));
        assert_eq!(room.fetch_message("bob"), Ok(Some("three".to_string())));
    }

    #[test]
    fn test_first_play_waits() {
        let mut room = room_with(&["alice", "bob"]);
        let rock = card(CardType::Rock, 2);

        assert_eq!(room.play_card("alice", rock), Ok(PlayOutcome::Waiting));
        assert_eq!(room.round_state(), RoundState::OnePlayed);
        assert_eq!(room.play_of("alice"), Some(rock));
        assert_eq!(room.play_of("bob"), None);
    }

    #[test]
    fn test_second_play_by_same_member_rejected() {
        let mut room = room_with(&["alice", "bob"]);
        let rock = card(CardType::Rock, 2);
        room.play_card("alice", rock).unwrap();

        let result = room.play_card("alice", card(CardType::Paper, 5));
        assert_eq!(result, Err(ServiceError::AlreadyPlayed));
        assert_eq!(room.play_of("alice"), Some(rock));
        assert_eq!(room.round_state(), RoundState::OnePlayed);
    }

    #[test]
    fn test_play_requires_membership() {
        let mut room = room_with(&["alice"]);
        let result = room.play_card("mallory", card(CardType::Scissors, 1));
        assert_eq!(result, Err(ServiceError::NotAMember));
        assert_eq!(room.round_state(), RoundState::Empty);
    }

    #[test]
    fn test_round_completes_and_resets() {
        let mut room = room_with(&["alice", "bob"]);
        let rock = card(CardType::Rock, 3);
        let paper = card(CardType::Paper, 4);

        room.play_card("alice", rock).unwrap();
        let outcome = room.play_card("bob", paper).unwrap();

        let PlayOutcome::Completed(result) = outcome else {
            panic!("expected completed round, got {:?}", outcome);
        };
        assert_eq!(result.round, 1);
        assert_eq!(result.plays.len(), 2);
        assert_eq!(result.opponent_of("alice"), Some(&("bob".to_string(), paper)));
        assert_eq!(result.opponent_of("bob"), Some(&("alice".to_string(), rock)));

        assert_eq!(room.round_state(), RoundState::Empty);
        assert_eq!(room.rounds_completed(), 1);
        assert_eq!(room.play_of("alice"), None);
    }

    #[test]
    fn test_consecutive_rounds() {
        let mut room = room_with(&["alice", "bob"]);
        for round in 1..=3 {
            // Either member may open a round
            let (first, second) = if round % 2 == 0 {
                ("bob", "alice")
            } else {
                ("alice", "bob")
            };
            assert_eq!(
                room.play_card(first, card(CardType::Scissors, round)),
                Ok(PlayOutcome::Waiting)
            );
            match room.play_card(second, card(CardType::Rock, round)) {
                Ok(PlayOutcome::Completed(result)) => assert_eq!(result.round, round as u64),
                other => panic!("round {} did not complete: {:?}", round, other),
            }
        }
        assert_eq!(room.rounds_completed(), 3);
    }
}
