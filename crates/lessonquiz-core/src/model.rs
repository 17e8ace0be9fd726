//! Core content model for lessonquiz.
//!
//! A chapter document bundles theory blocks, a question bank and the
//! configuration of its final test. Questions are a closed sum type over the
//! six supported kinds; the JSON shape (`type` + `correct_answer`) is
//! converted through [`RawQuestion`] so every invariant is checked once, at
//! load time.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::interaction::split_sentence;

/// The six supported question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    McqSingle,
    McqMulti,
    FillBlank,
    Reorder,
    TrueFalse,
    ErrorSpotting,
}

impl QuestionKind {
    /// Kinds answered by picking exactly one identifier.
    pub fn is_single_choice(self) -> bool {
        matches!(
            self,
            QuestionKind::McqSingle | QuestionKind::TrueFalse | QuestionKind::ErrorSpotting
        )
    }

    /// Kinds answered with free-form text.
    pub fn is_text(self) -> bool {
        matches!(self, QuestionKind::FillBlank | QuestionKind::Reorder)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::McqSingle => write!(f, "mcq_single"),
            QuestionKind::McqMulti => write!(f, "mcq_multi"),
            QuestionKind::FillBlank => write!(f, "fill_blank"),
            QuestionKind::Reorder => write!(f, "reorder"),
            QuestionKind::TrueFalse => write!(f, "true_false"),
            QuestionKind::ErrorSpotting => write!(f, "error_spotting"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq_single" => Ok(QuestionKind::McqSingle),
            "mcq_multi" => Ok(QuestionKind::McqMulti),
            "fill_blank" => Ok(QuestionKind::FillBlank),
            "reorder" => Ok(QuestionKind::Reorder),
            "true_false" => Ok(QuestionKind::TrueFalse),
            "error_spotting" => Ok(QuestionKind::ErrorSpotting),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// One selectable option of a choice-based question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    /// Shown next to the option once the answer is revealed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Identifier of the "true" option of a true/false question.
pub const TRUE_ID: &str = "true";
/// Identifier of the "false" option of a true/false question.
pub const FALSE_ID: &str = "false";

/// A learner's submitted answer.
///
/// Single-choice kinds submit one choice id, `mcq_multi` submits the list of
/// checked ids and text kinds submit the entered text. The untagged
/// representation matches the JSON stored in test results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Many(Vec<String>),
    One(String),
}

impl Answer {
    /// The single value, if this is a one-value answer.
    pub fn as_one(&self) -> Option<&str> {
        match self {
            Answer::One(s) => Some(s),
            Answer::Many(_) => None,
        }
    }

    /// All values as a list; a one-value answer becomes a singleton.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Answer::One(s) => vec![s.as_str()],
            Answer::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for Answer {
    fn from(s: &str) -> Self {
        Answer::One(s.to_string())
    }
}

impl From<String> for Answer {
    fn from(s: String) -> Self {
        Answer::One(s)
    }
}

impl From<Vec<String>> for Answer {
    fn from(v: Vec<String>) -> Self {
        Answer::Many(v)
    }
}

impl From<Vec<&str>> for Answer {
    fn from(v: Vec<&str>) -> Self {
        Answer::Many(v.into_iter().map(String::from).collect())
    }
}

/// Kind-specific payload of a question.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionBody {
    McqSingle { choices: Vec<Choice>, correct: String },
    McqMulti { choices: Vec<Choice>, correct: Vec<String> },
    FillBlank { correct: String },
    Reorder { correct: String },
    TrueFalse { correct: bool },
    ErrorSpotting { choices: Vec<Choice>, correct: String },
}

impl QuestionBody {
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionBody::McqSingle { .. } => QuestionKind::McqSingle,
            QuestionBody::McqMulti { .. } => QuestionKind::McqMulti,
            QuestionBody::FillBlank { .. } => QuestionKind::FillBlank,
            QuestionBody::Reorder { .. } => QuestionKind::Reorder,
            QuestionBody::TrueFalse { .. } => QuestionKind::TrueFalse,
            QuestionBody::ErrorSpotting { .. } => QuestionKind::ErrorSpotting,
        }
    }
}

/// One testable unit of a chapter's question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion", into = "RawQuestion")]
pub struct Question {
    /// Unique within the chapter.
    pub id: String,
    pub prompt: String,
    /// At least 1.
    pub difficulty: u32,
    /// Back-reference to the theory block this question covers.
    pub theory_block_id: Option<String>,
    pub explanation: Option<String>,
    pub body: QuestionBody,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        self.body.kind()
    }

    /// The options presented to the learner. True/false questions get their
    /// two fixed options.
    pub fn choices(&self) -> Vec<Choice> {
        match &self.body {
            QuestionBody::McqSingle { choices, .. }
            | QuestionBody::McqMulti { choices, .. }
            | QuestionBody::ErrorSpotting { choices, .. } => choices.clone(),
            QuestionBody::TrueFalse { .. } => vec![
                Choice {
                    id: TRUE_ID.into(),
                    text: "True".into(),
                    feedback: None,
                },
                Choice {
                    id: FALSE_ID.into(),
                    text: "False".into(),
                    feedback: None,
                },
            ],
            QuestionBody::FillBlank { .. } | QuestionBody::Reorder { .. } => Vec::new(),
        }
    }

    /// The expected answer in the same shape a learner submits it.
    pub fn correct_answer(&self) -> Answer {
        match &self.body {
            QuestionBody::McqSingle { correct, .. }
            | QuestionBody::ErrorSpotting { correct, .. }
            | QuestionBody::FillBlank { correct }
            | QuestionBody::Reorder { correct } => Answer::One(correct.clone()),
            QuestionBody::McqMulti { correct, .. } => Answer::Many(correct.clone()),
            QuestionBody::TrueFalse { correct } => Answer::One(bool_id(*correct).to_string()),
        }
    }

    /// Look up the text of a choice by id.
    pub fn choice_text(&self, choice_id: &str) -> Option<String> {
        self.choices()
            .into_iter()
            .find(|c| c.id == choice_id)
            .map(|c| c.text)
    }
}

fn invalid(id: &str, reason: &str) -> ContentError {
    ContentError::InvalidCorrectAnswer {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

fn bool_id(value: bool) -> &'static str {
    if value {
        TRUE_ID
    } else {
        FALSE_ID
    }
}

/// Question as stored on disk, before invariants are checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theory_block_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub correct_answer: Option<RawCorrectAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

fn default_difficulty() -> u32 {
    1
}

/// Any of the shapes `correct_answer` takes in chapter files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCorrectAnswer {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

impl TryFrom<RawQuestion> for Question {
    type Error = ContentError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let id = raw.id;
        let kind: QuestionKind = raw
            .kind
            .parse()
            .map_err(|_| ContentError::UnknownQuestionType {
                id: id.clone(),
                kind: raw.kind.clone(),
            })?;

        if raw.difficulty == 0 {
            return Err(ContentError::InvalidDifficulty { id });
        }

        if kind != QuestionKind::TrueFalse && !kind.is_text() {
            if raw.choices.is_empty() {
                return Err(ContentError::MissingChoices { id, kind });
            }
            let mut seen = std::collections::HashSet::new();
            for choice in &raw.choices {
                if !seen.insert(choice.id.as_str()) {
                    return Err(ContentError::DuplicateChoice {
                        id,
                        choice: choice.id.clone(),
                    });
                }
            }
        }
        let has_choice = |choice_id: &str| raw.choices.iter().any(|c| c.id == choice_id);

        let body = match kind {
            QuestionKind::McqSingle | QuestionKind::ErrorSpotting => {
                let correct = match &raw.correct_answer {
                    Some(RawCorrectAnswer::Text(s)) => s.clone(),
                    _ => return Err(invalid(&id, "expected a single choice id")),
                };
                if !has_choice(&correct) {
                    return Err(invalid(&id, &format!("choice '{correct}' does not exist")));
                }
                if kind == QuestionKind::McqSingle {
                    QuestionBody::McqSingle {
                        choices: raw.choices,
                        correct,
                    }
                } else {
                    QuestionBody::ErrorSpotting {
                        choices: raw.choices,
                        correct,
                    }
                }
            }
            QuestionKind::McqMulti => {
                let correct = match &raw.correct_answer {
                    Some(RawCorrectAnswer::List(ids)) => ids.clone(),
                    Some(RawCorrectAnswer::Text(s)) => vec![s.clone()],
                    _ => return Err(invalid(&id, "expected a list of choice ids")),
                };
                if correct.is_empty() {
                    return Err(invalid(&id, "at least one choice must be correct"));
                }
                if let Some(missing) = correct.iter().find(|c| !has_choice(c)) {
                    return Err(invalid(&id, &format!("choice '{missing}' does not exist")));
                }
                QuestionBody::McqMulti {
                    choices: raw.choices,
                    correct,
                }
            }
            QuestionKind::FillBlank | QuestionKind::Reorder => {
                let correct = match &raw.correct_answer {
                    Some(RawCorrectAnswer::Text(s)) if !s.trim().is_empty() => s.clone(),
                    _ => return Err(invalid(&id, "expected a non-empty string")),
                };
                if kind == QuestionKind::FillBlank {
                    QuestionBody::FillBlank { correct }
                } else {
                    if split_sentence(&correct).0.is_empty() {
                        return Err(invalid(&id, "reorder sentence has no words"));
                    }
                    QuestionBody::Reorder { correct }
                }
            }
            QuestionKind::TrueFalse => {
                let correct = match &raw.correct_answer {
                    Some(RawCorrectAnswer::Flag(b)) => *b,
                    Some(RawCorrectAnswer::Text(s)) => match s.trim().to_lowercase().as_str() {
                        "true" => true,
                        "false" => false,
                        _ => return Err(invalid(&id, "expected true or false")),
                    },
                    _ => return Err(invalid(&id, "expected true or false")),
                };
                QuestionBody::TrueFalse { correct }
            }
        };

        Ok(Question {
            id,
            prompt: raw.prompt,
            difficulty: raw.difficulty,
            theory_block_id: raw.theory_block_id,
            explanation: raw.explanation,
            body,
        })
    }
}

impl From<Question> for RawQuestion {
    fn from(q: Question) -> Self {
        let kind = q.kind().to_string();
        let (choices, correct_answer) = match q.body {
            QuestionBody::McqSingle { choices, correct }
            | QuestionBody::ErrorSpotting { choices, correct } => {
                (choices, RawCorrectAnswer::Text(correct))
            }
            QuestionBody::McqMulti { choices, correct } => {
                (choices, RawCorrectAnswer::List(correct))
            }
            QuestionBody::FillBlank { correct } | QuestionBody::Reorder { correct } => {
                (Vec::new(), RawCorrectAnswer::Text(correct))
            }
            QuestionBody::TrueFalse { correct } => {
                (Vec::new(), RawCorrectAnswer::Text(bool_id(correct).into()))
            }
        };
        RawQuestion {
            id: q.id,
            kind,
            prompt: q.prompt,
            difficulty: q.difficulty,
            theory_block_id: q.theory_block_id,
            choices,
            correct_answer: Some(correct_answer),
            explanation: q.explanation,
        }
    }
}

/// A question that failed validation while loading a bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedQuestion {
    pub id: Option<String>,
    pub reason: String,
}

/// The ordered questions owned by a chapter.
///
/// Deserialization is tolerant: malformed entries land in `rejected`
/// instead of failing the whole chapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawQuestionBank")]
pub struct QuestionBank {
    pub questions: Vec<Question>,
    #[serde(skip)]
    pub rejected: Vec<RejectedQuestion>,
}

#[derive(Deserialize)]
struct RawQuestionBank {
    #[serde(default)]
    questions: Vec<serde_json::Value>,
}

impl From<RawQuestionBank> for QuestionBank {
    fn from(raw: RawQuestionBank) -> Self {
        let mut bank = QuestionBank::default();
        for value in raw.questions {
            let id = value
                .get("id")
                .and_then(|v| v.as_str())
                .map(String::from);
            match serde_json::from_value::<Question>(value) {
                Ok(q) => bank.questions.push(q),
                Err(e) => bank.rejected.push(RejectedQuestion {
                    id,
                    reason: e.to_string(),
                }),
            }
        }
        bank
    }
}

/// How the final test picks questions from the pool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawSelectionStrategy", into = "RawSelectionStrategy")]
pub enum SelectionStrategy {
    /// Guarantee `min_per_theory_block` questions per block, then fill
    /// randomly.
    StratifiedByTheoryBlock {
        min_per_theory_block: usize,
        /// Carried from the content file; selection does not weight by it.
        difficulty_mix: BTreeMap<String, f64>,
    },
    /// Uniform random sample.
    #[default]
    Random,
}

const STRATIFIED: &str = "stratified_by_theory_block";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawSelectionStrategy {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_per_theory_block: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    difficulty_mix: BTreeMap<String, f64>,
}

impl From<RawSelectionStrategy> for SelectionStrategy {
    fn from(raw: RawSelectionStrategy) -> Self {
        match raw.kind.as_deref() {
            Some(STRATIFIED) => SelectionStrategy::StratifiedByTheoryBlock {
                // A zero or missing minimum still guarantees one per block.
                min_per_theory_block: raw.min_per_theory_block.unwrap_or(1).max(1),
                difficulty_mix: raw.difficulty_mix,
            },
            _ => SelectionStrategy::Random,
        }
    }
}

impl From<SelectionStrategy> for RawSelectionStrategy {
    fn from(strategy: SelectionStrategy) -> Self {
        match strategy {
            SelectionStrategy::StratifiedByTheoryBlock {
                min_per_theory_block,
                difficulty_mix,
            } => RawSelectionStrategy {
                kind: Some(STRATIFIED.into()),
                min_per_theory_block: Some(min_per_theory_block),
                difficulty_mix,
            },
            SelectionStrategy::Random => RawSelectionStrategy::default(),
        }
    }
}

/// Configuration of a chapter's final test.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChapterTestConfig {
    /// Target number of questions.
    #[serde(default)]
    pub num_questions: usize,
    /// Bank questions eligible for the final test.
    #[serde(default)]
    pub pool_question_ids: Vec<String>,
    #[serde(default)]
    pub selection_strategy: SelectionStrategy,
}

/// Example sentence attached to a theory block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TheoryExample {
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A typical learner mistake with its correction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommonMistake {
    pub wrong: String,
    pub right: String,
    #[serde(default)]
    pub why: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TheoryContent {
    #[serde(default)]
    pub content_md: Option<String>,
    #[serde(default)]
    pub examples: Vec<TheoryExample>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub common_mistakes: Vec<CommonMistake>,
}

/// The question list and feedback mode of an inline quiz.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InlineQuizSpec {
    #[serde(default)]
    pub question_ids: Vec<String>,
    #[serde(default)]
    pub show_answers_immediately: bool,
}

/// One entry in a chapter's ordered block list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Theory {
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        theory: TheoryContent,
    },
    QuizInline {
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        theory_block_id: Option<String>,
        #[serde(default)]
        quiz_inline: InlineQuizSpec,
    },
    #[serde(other)]
    Other,
}

/// One lesson unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    #[serde(default)]
    pub section_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_short: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub question_bank: Option<QuestionBank>,
    #[serde(default)]
    pub chapter_test: Option<ChapterTestConfig>,
}

impl Chapter {
    /// Title for display: full title, short title, then id.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.title_short.as_deref())
            .unwrap_or(&self.id)
    }

    /// Questions of the bank, empty if there is none.
    pub fn questions(&self) -> &[Question] {
        self.question_bank
            .as_ref()
            .map(|b| b.questions.as_slice())
            .unwrap_or(&[])
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions().iter().find(|q| q.id == question_id)
    }

    /// Resolve ids in order, silently dropping unknown ones.
    pub fn questions_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Question> {
        ids.iter()
            .filter_map(|id| self.question(id.as_ref()).cloned())
            .collect()
    }

    /// Inline quiz blocks as `(block id, title, spec)`.
    pub fn inline_quizzes(&self) -> Vec<(&str, Option<&str>, &InlineQuizSpec)> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::QuizInline {
                    id,
                    title,
                    quiz_inline,
                    ..
                } => Some((id.as_str(), title.as_deref(), quiz_inline)),
                _ => None,
            })
            .collect()
    }

    /// Whether a final test can be generated at all.
    pub fn has_test(&self) -> bool {
        self.chapter_test.is_some() && self.question_bank.is_some()
    }
}
