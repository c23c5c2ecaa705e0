mod question;

pub use question::{AnswerOption, OptionId, OptionPayload, PromptKey, Question, QuestionPayload, QuestionView};
