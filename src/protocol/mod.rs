mod messages;

pub use messages::{
    ClientMessage, LeaderboardEntry, ServerMessage, TallySnapshot, CORRECT_ANSWER_POINTS,
    DEFAULT_PORT, QUESTION_DURATION_SECS,
};
