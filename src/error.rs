use thiserror::Error;

/// Process-level errors for the quiz server.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for Results using QuizError
pub type Result<T> = std::result::Result<T, QuizError>;

/// Reasons a submitted question is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("question has no options")]
    NoOptions,

    #[error("option text {0:?} appears more than once")]
    DuplicateOption(String),

    #[error("correct answer {0:?} is not one of the options")]
    UnknownCorrectAnswer(String),
}

/// Inbound events the coordinator refuses to act on.
///
/// None of these are reported back to the sender; the event loop only logs them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("invalid question: {0}")]
    InvalidQuestion(#[from] QuestionError),

    #[error("no active question")]
    NoActiveQuestion,

    #[error("answer {0:?} does not match any option")]
    UnknownOption(String),
}
