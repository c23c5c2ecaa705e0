//! Connection registry.
//!
//! Tracks every connected participant and, for students, their display name
//! and score.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::protocol::LeaderboardEntry;

/// Identifier the transport assigns to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A student's standing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub name: String,
    pub score: u32,
    /// Join order, used to break score ties.
    joined: u64,
}

/// Role of a connected participant.
///
/// There is no authentication: an `Observer` may still act as a teacher by
/// submitting questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Participant {
    /// Connected but never joined as a student.
    Observer,
    Student(Student),
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    participants: HashMap<ConnectionId, Participant>,
    next_join: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh connection. Existing entries are left alone.
    pub fn connect(&mut self, id: ConnectionId) {
        self.participants.entry(id).or_insert(Participant::Observer);
    }

    /// Register `id` as a student with a zero score.
    ///
    /// Joining again resets the score but keeps the original tie-break position.
    pub fn join(&mut self, id: ConnectionId, name: String) {
        let joined = match self.participants.get(&id) {
            Some(Participant::Student(existing)) => existing.joined,
            _ => {
                let seq = self.next_join;
                self.next_join += 1;
                seq
            }
        };

        self.participants.insert(
            id,
            Participant::Student(Student {
                name,
                score: 0,
                joined,
            }),
        );
    }

    /// Add points to a student. Returns the new score, or `None` if `id` is not a student.
    pub fn award(&mut self, id: ConnectionId, points: u32) -> Option<u32> {
        match self.participants.get_mut(&id) {
            Some(Participant::Student(student)) => {
                student.score += points;
                Some(student.score)
            }
            _ => None,
        }
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Participant> {
        self.participants.remove(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.participants.contains_key(&id)
    }

    /// Students sorted by score (desc), then by join order.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut students: Vec<&Student> = self
            .participants
            .values()
            .filter_map(|p| match p {
                Participant::Student(student) => Some(student),
                Participant::Observer => None,
            })
            .collect();

        students.sort_by(|a, b| b.score.cmp(&a.score).then(a.joined.cmp(&b.joined)));

        students
            .into_iter()
            .map(|s| LeaderboardEntry {
                name: s.name.clone(),
                score: s.score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(board: &[LeaderboardEntry]) -> Vec<&str> {
        board.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_observers_are_not_ranked() {
        let mut registry = ConnectionRegistry::new();
        let observer = ConnectionId::new();
        registry.connect(observer);

        assert!(registry.contains(observer));
        assert!(registry.leaderboard().is_empty());
        assert_eq!(registry.award(observer, 10), None);
    }

    #[test]
    fn test_leaderboard_orders_by_score_then_join_order() {
        let mut registry = ConnectionRegistry::new();
        let (a, b, c) = (ConnectionId::new(), ConnectionId::new(), ConnectionId::new());
        registry.join(a, "Ann".to_string());
        registry.join(b, "Bob".to_string());
        registry.join(c, "Cid".to_string());

        assert_eq!(names(&registry.leaderboard()), ["Ann", "Bob", "Cid"]);

        registry.award(c, 10);
        registry.award(b, 10);
        assert_eq!(names(&registry.leaderboard()), ["Bob", "Cid", "Ann"]);
        assert_eq!(registry.leaderboard()[0].score, 10);
    }

    #[test]
    fn test_rejoin_resets_score_and_keeps_position() {
        let mut registry = ConnectionRegistry::new();
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        registry.join(a, "Ann".to_string());
        registry.join(b, "Bob".to_string());
        registry.award(a, 20);

        registry.join(a, "Annie".to_string());
        let board = registry.leaderboard();
        assert_eq!(names(&board), ["Annie", "Bob"]);
        assert_eq!(board[0].score, 0);
    }

    #[test]
    fn test_duplicate_names_allowed() {
        let mut registry = ConnectionRegistry::new();
        registry.join(ConnectionId::new(), "Sam".to_string());
        registry.join(ConnectionId::new(), "Sam".to_string());
        assert_eq!(registry.leaderboard().len(), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = ConnectionRegistry::new();
        let a = ConnectionId::new();
        registry.join(a, "Ann".to_string());

        assert!(registry.remove(a).is_some());
        assert!(registry.remove(a).is_none());
        assert!(!registry.contains(a));
    }
}
