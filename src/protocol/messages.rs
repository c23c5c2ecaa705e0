//! Protocol messages for client-server communication.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::models::{QuestionPayload, QuestionView};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// A teacher publishes a new question.
    #[serde(rename = "teacher:sendQuestion")]
    SendQuestion(QuestionPayload),

    /// A student registers under a display name.
    #[serde(rename = "student:join")]
    Join(String),

    /// A student picks an option by its text.
    #[serde(rename = "student:answer")]
    Answer(String),
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    /// A question has started.
    #[serde(rename = "student:newQuestion")]
    NewQuestion { question: QuestionView, time: u32 },

    /// Current vote counts.
    #[serde(rename = "teacher:pollUpdate")]
    PollUpdate(TallySnapshot),

    /// Seconds left on the countdown.
    #[serde(rename = "teacher:timerUpdate")]
    TimerUpdate(u32),

    /// The countdown reached zero.
    #[serde(rename = "student:timeUp")]
    TimeUp,

    /// Final vote counts for the question that just closed.
    #[serde(rename = "teacher:questionEnded")]
    QuestionEnded(TallySnapshot),

    /// Students ranked by score.
    #[serde(rename = "student:leaderboard")]
    Leaderboard(Vec<LeaderboardEntry>),
}

/// Vote counts keyed by option text, in option order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallySnapshot(pub Vec<(String, u32)>);

impl TallySnapshot {
    pub fn count(&self, text: &str) -> Option<u32> {
        self.0.iter().find(|(t, _)| t == text).map(|(_, c)| *c)
    }
}

impl Serialize for TallySnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (text, count) in &self.0 {
            map.serialize_entry(text, count)?;
        }
        map.end()
    }
}

/// Entry in the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
}

/// How long each question stays open, in seconds.
pub const QUESTION_DURATION_SECS: u32 = 60;

/// Points awarded for a correct answer.
pub const CORRECT_ANSWER_POINTS: u32 = 10;

/// Port the server listens on.
pub const DEFAULT_PORT: u16 = 8000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"student:join","data":"Alice"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Join(name) if name == "Alice"));

        let msg: ClientMessage = serde_json::from_str(
            r#"{"event":"teacher:sendQuestion","data":{"prompt":"?","options":[{"text":"A"}],"correctAnswer":"A"}}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMessage::SendQuestion(q) if q.options.len() == 1));

        assert!(serde_json::from_str::<ClientMessage>(r#"{"event":"student:dance"}"#).is_err());
    }

    #[test]
    fn test_server_message_serialization() {
        let json = serde_json::to_string(&ServerMessage::TimeUp).unwrap();
        assert_eq!(json, r#"{"event":"student:timeUp"}"#);

        let json = serde_json::to_string(&ServerMessage::TimerUpdate(42)).unwrap();
        assert_eq!(json, r#"{"event":"teacher:timerUpdate","data":42}"#);
    }

    #[test]
    fn test_tally_serializes_in_option_order() {
        let tally = TallySnapshot(vec![("B".to_string(), 2), ("A".to_string(), 0)]);
        let json = serde_json::to_string(&ServerMessage::PollUpdate(tally)).unwrap();
        assert_eq!(json, r#"{"event":"teacher:pollUpdate","data":{"B":2,"A":0}}"#);
    }

    #[test]
    fn test_leaderboard_serialization() {
        let board = vec![LeaderboardEntry {
            name: "Alice".to_string(),
            score: 10,
        }];
        let json = serde_json::to_string(&ServerMessage::Leaderboard(board)).unwrap();
        assert_eq!(
            json,
            r#"{"event":"student:leaderboard","data":[{"name":"Alice","score":10}]}"#
        );
    }
}
