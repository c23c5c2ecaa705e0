//! # classroom-quiz
//!
//! A live classroom quiz broadcaster. A teacher pushes a question over a
//! WebSocket, students answer within a 60 second window, and every connected
//! client receives the running poll tally, the countdown and a score
//! leaderboard.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use classroom_quiz::{Config, QuizError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QuizError> {
//!     classroom_quiz::server::run(Config::from_env()).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod protocol;
pub mod server;

pub use config::Config;
pub use error::{QuestionError, QuizError, Rejection, Result};
pub use models::{AnswerOption, OptionId, Question, QuestionPayload};
pub use protocol::{ClientMessage, LeaderboardEntry, ServerMessage, TallySnapshot};
