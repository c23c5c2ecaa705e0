use std::collections::HashSet;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::QuestionError;

/// Position of an option inside its question.
///
/// Tally counts and the correctness check are keyed by this id rather than by
/// the display text, so both always agree on which option an answer selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OptionId(pub usize);

/// Option descriptor as sent by the teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPayload {
    pub text: String,
}

/// Key the teacher used for the prompt text.
///
/// The student broadcast echoes the prompt back under the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptKey {
    #[default]
    Prompt,
    Question,
    Text,
}

impl PromptKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptKey::Prompt => "prompt",
            PromptKey::Question => "question",
            PromptKey::Text => "text",
        }
    }
}

/// Wire shape of a question descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default)]
    options: Vec<OptionPayload>,
    correct_answer: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Question descriptor as sent by the teacher, before validation.
///
/// Fields other than the prompt, options and correct answer are kept in
/// `extra` and passed through to students untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawQuestion", into = "RawQuestion")]
pub struct QuestionPayload {
    pub prompt: String,
    pub prompt_key: PromptKey,
    pub options: Vec<OptionPayload>,
    pub correct_answer: String,
    pub extra: Map<String, Value>,
}

impl From<RawQuestion> for QuestionPayload {
    fn from(raw: RawQuestion) -> Self {
        let mut extra = raw.extra;
        let mut chosen = None;
        for (key, value) in [
            (PromptKey::Prompt, raw.prompt),
            (PromptKey::Question, raw.question),
            (PromptKey::Text, raw.text),
        ] {
            let Some(value) = value else { continue };
            if chosen.is_none() {
                chosen = Some((key, value));
            } else {
                extra.insert(key.as_str().to_string(), Value::String(value));
            }
        }
        let (prompt_key, prompt) = chosen.unwrap_or_default();

        Self {
            prompt,
            prompt_key,
            options: raw.options,
            correct_answer: raw.correct_answer,
            extra,
        }
    }
}

impl From<QuestionPayload> for RawQuestion {
    fn from(payload: QuestionPayload) -> Self {
        let mut raw = RawQuestion {
            prompt: None,
            question: None,
            text: None,
            options: payload.options,
            correct_answer: payload.correct_answer,
            extra: payload.extra,
        };
        let slot = match payload.prompt_key {
            PromptKey::Prompt => &mut raw.prompt,
            PromptKey::Question => &mut raw.question,
            PromptKey::Text => &mut raw.text,
        };
        *slot = Some(payload.prompt);
        raw
    }
}

/// A single answer option of an accepted question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
}

/// A validated question.
#[derive(Debug, Clone)]
pub struct Question {
    pub prompt: String,
    pub prompt_key: PromptKey,
    pub options: Vec<AnswerOption>,
    pub correct: OptionId,
    pub extra: Map<String, Value>,
}

/// What students get to see: the teacher's descriptor with the correct
/// answer withheld and option ids added.
#[derive(Debug, Clone)]
pub struct QuestionView {
    pub prompt: String,
    pub prompt_key: PromptKey,
    pub options: Vec<AnswerOption>,
    pub extra: Map<String, Value>,
}

impl Serialize for QuestionView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.extra.len() + 2))?;
        map.serialize_entry(self.prompt_key.as_str(), &self.prompt)?;
        map.serialize_entry("options", &self.options)?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn canonical(text: &str) -> &str {
    text.trim()
}

impl Question {
    /// Resolve an answer to the option it names.
    pub fn resolve(&self, answer: &str) -> Option<OptionId> {
        let answer = canonical(answer);
        self.options
            .iter()
            .find(|opt| canonical(&opt.text) == answer)
            .map(|opt| opt.id)
    }

    pub fn is_correct(&self, option: OptionId) -> bool {
        self.correct == option
    }

    pub fn view(&self) -> QuestionView {
        QuestionView {
            prompt: self.prompt.clone(),
            prompt_key: self.prompt_key,
            options: self.options.clone(),
            extra: self.extra.clone(),
        }
    }
}

impl TryFrom<QuestionPayload> for Question {
    type Error = QuestionError;

    fn try_from(payload: QuestionPayload) -> Result<Self, Self::Error> {
        if payload.options.is_empty() {
            return Err(QuestionError::NoOptions);
        }

        let mut seen = HashSet::new();
        for opt in &payload.options {
            if !seen.insert(canonical(&opt.text)) {
                return Err(QuestionError::DuplicateOption(opt.text.clone()));
            }
        }

        let options: Vec<AnswerOption> = payload
            .options
            .into_iter()
            .enumerate()
            .map(|(i, opt)| AnswerOption {
                id: OptionId(i),
                text: opt.text,
            })
            .collect();

        let correct = options
            .iter()
            .find(|opt| canonical(&opt.text) == canonical(&payload.correct_answer))
            .map(|opt| opt.id)
            .ok_or(QuestionError::UnknownCorrectAnswer(payload.correct_answer))?;

        Ok(Self {
            prompt: payload.prompt,
            prompt_key: payload.prompt_key,
            options,
            correct,
            extra: payload.extra,
        })
    }
}
