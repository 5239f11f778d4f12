//! Wire protocol shared by the card server and its clients.
//!
//! Every message on the wire is a single JSON object. Clients send
//! [`Request`]s, the server answers with [`Response`]s and may also push
//! responses nobody asked for (see [`methods::OPPONENT_PLAYED`]).

pub mod codec;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Free-form payload attached to requests and responses.
pub type Data = Map<String, Value>;

pub const MIN_STARS: u8 = 1;
pub const MAX_STARS: u8 = 5;

/// Method names understood by the server.
pub mod methods {
    pub const REGISTER: &str = "register";
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const CREATE: &str = "create";
    pub const JOIN: &str = "join";
    pub const LEAVE: &str = "leave";
    pub const SEND: &str = "send";
    pub const FETCH: &str = "fetch";
    pub const PLAY: &str = "play";
    pub const BUY: &str = "buy";
    pub const PING: &str = "ping";

    /// Server push sent to both players once a round has two plays.
    pub const OPPONENT_PLAYED: &str = "opponent_played";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Data::is_empty"
    )]
    pub data: Data,
}

impl Request {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            data: Data::new(),
        }
    }

    /// Adds a field to the payload.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Deserializes the payload into the typed shape a method expects.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.data.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub method: String,
    pub status: Status,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Data::is_empty"
    )]
    pub data: Data,
}

impl Response {
    pub fn ok(method: impl Into<String>, data: Data) -> Self {
        Self {
            method: method.into(),
            status: Status::Ok,
            data,
        }
    }

    pub fn error(method: impl Into<String>, message: impl Into<String>) -> Self {
        let mut data = Data::new();
        data.insert("message".to_string(), Value::String(message.into()));
        Self {
            method: method.into(),
            status: Status::Error,
            data,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// The human-readable `message` field, if present and a string.
    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Data, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Data>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("invalid card type '{0}': expected rock, paper or scissors")]
    InvalidType(String),
    #[error("invalid star count {0}: must be between 1 and 5")]
    InvalidStars(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Rock,
    Paper,
    Scissors,
}

impl CardType {
    pub const ALL: [CardType; 3] = [CardType::Rock, CardType::Paper, CardType::Scissors];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Rock => "rock",
            CardType::Paper => "paper",
            CardType::Scissors => "scissors",
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardType {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rock" => Ok(CardType::Rock),
            "paper" => Ok(CardType::Paper),
            "scissors" => Ok(CardType::Scissors),
            other => Err(CardError::InvalidType(other.to_string())),
        }
    }
}

/// A playable card. Construction always validates type and stars, so a
/// `Card` value is in domain by definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCard")]
pub struct Card {
    #[serde(rename = "type")]
    card_type: CardType,
    stars: u8,
}

impl Card {
    pub fn new(card_type: CardType, stars: i64) -> Result<Self, CardError> {
        if stars < MIN_STARS as i64 || stars > MAX_STARS as i64 {
            return Err(CardError::InvalidStars(stars));
        }
        Ok(Self {
            card_type,
            stars: stars as u8,
        })
    }

    pub fn card_type(&self) -> CardType {
        self.card_type
    }

    pub fn stars(&self) -> u8 {
        self.stars
    }
}

#[derive(Deserialize)]
struct RawCard {
    #[serde(rename = "type")]
    card_type: String,
    stars: i64,
}

impl TryFrom<RawCard> for Card {
    type Error = CardError;

    fn try_from(raw: RawCard) -> Result<Self, Self::Error> {
        Card::new(raw.card_type.parse()?, raw.stars)
    }
}

/// Payload of `register` and `login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Payload of `join`, `leave` and `fetch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTarget {
    pub room_id: String,
}

/// Payload of `send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub room_id: String,
    pub message: String,
}

/// Payload of `play`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayCard {
    pub room_id: String,
    pub card: Card,
}
