//! Turns raw model text into typed generation results.
//!
//! Flashcards go through two stages: [`parse_flashcard_json`] looks for a
//! JSON array; anything it cannot use is handed to
//! [`parse_flashcard_text`], which reads question/answer lines and always
//! yields at least one card.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::prompts::{GenerationKind, PromptKind};

pub const FALLBACK_QUESTION: &str = "What are the main topics covered in this material?";
pub const FALLBACK_ANSWER: &str = "Please review the original content for key concepts and themes.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(default, deserialize_with = "lenient_text")]
    pub question: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub answer: String,
}

/// Null reads as `""` and other scalars as their JSON text, so one odd card
/// cannot sink the rest of the array.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Cards plus their count. Only built through [`FlashcardDeck::new`], so the
/// count always matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardDeck {
    flashcards: Vec<Flashcard>,
    total_count: usize,
}

impl FlashcardDeck {
    pub fn new(flashcards: Vec<Flashcard>) -> Self {
        let total_count = flashcards.len();
        Self {
            flashcards,
            total_count,
        }
    }

    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn into_flashcards(self) -> Vec<Flashcard> {
        self.flashcards
    }
}

/// Summary or study plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGeneration {
    #[serde(rename = "type")]
    pub kind: PromptKind,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardGeneration {
    #[serde(rename = "type")]
    pub kind: PromptKind,
    pub title: String,
    pub content: FlashcardDeck,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveGeneration {
    pub summary: String,
    pub study_plan: String,
    pub flashcards: Vec<Flashcard>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationResult {
    Text(TextGeneration),
    Flashcards(FlashcardGeneration),
    Comprehensive(ComprehensiveGeneration),
}

impl GenerationResult {
    pub fn kind(&self) -> GenerationKind {
        match self {
            GenerationResult::Text(t) => t.kind.into(),
            GenerationResult::Flashcards(_) => GenerationKind::Flashcards,
            GenerationResult::Comprehensive(_) => GenerationKind::Comprehensive,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            GenerationResult::Text(t) => t.timestamp,
            GenerationResult::Flashcards(f) => f.timestamp,
            GenerationResult::Comprehensive(c) => c.timestamp,
        }
    }
}

pub fn normalize(kind: PromptKind, raw: &str, title: &str) -> GenerationResult {
    match kind {
        PromptKind::Summary | PromptKind::StudyPlan => {
            GenerationResult::Text(normalize_text(kind, raw, title))
        }
        PromptKind::Flashcards => GenerationResult::Flashcards(normalize_flashcards(raw, title)),
    }
}

pub fn normalize_text(kind: PromptKind, raw: &str, title: &str) -> TextGeneration {
    TextGeneration {
        kind,
        title: title.to_string(),
        content: sanitize(raw),
        timestamp: Utc::now(),
    }
}

pub fn normalize_flashcards(raw: &str, title: &str) -> FlashcardGeneration {
    FlashcardGeneration {
        kind: PromptKind::Flashcards,
        title: title.to_string(),
        content: FlashcardDeck::new(parse_flashcards(raw)),
        timestamp: Utc::now(),
    }
}

/// Joins the three constituent results of a comprehensive run.
pub fn compose_comprehensive(
    summary: TextGeneration,
    study_plan: TextGeneration,
    flashcards: FlashcardGeneration,
) -> GenerationResult {
    GenerationResult::Comprehensive(ComprehensiveGeneration {
        summary: summary.content,
        study_plan: study_plan.content,
        flashcards: flashcards.content.into_flashcards(),
        timestamp: Utc::now(),
    })
}

static BOLD_MARKERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*+").unwrap());

/// Strip bold markers and carriage returns, trim, and turn newlines into
/// `<br>`. Applying it twice changes nothing.
pub fn sanitize(text: &str) -> String {
    // `\r` goes first so that removing it cannot join two lone `*` into a marker.
    let text = text.replace('\r', "");
    BOLD_MARKERS
        .replace_all(&text, "")
        .trim()
        .replace('\n', "<br>")
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlashcardParse {
    Parsed(Vec<Flashcard>),
    Unparsed(String),
}

pub fn parse_flashcards(raw: &str) -> Vec<Flashcard> {
    match parse_flashcard_json(raw) {
        FlashcardParse::Parsed(cards) => cards,
        FlashcardParse::Unparsed(reason) => {
            tracing::debug!(%reason, "flashcard output is not a JSON array, using line parser");
            parse_flashcard_text(raw)
        }
    }
}

/// Parses the span from the first `[` to the last `]` as an array of cards.
pub fn parse_flashcard_json(raw: &str) -> FlashcardParse {
    let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) else {
        return FlashcardParse::Unparsed("no JSON array found".to_string());
    };
    if end < start {
        return FlashcardParse::Unparsed("no JSON array found".to_string());
    }

    match serde_json::from_str::<Vec<Flashcard>>(&raw[start..=end]) {
        Ok(cards) if cards.is_empty() => FlashcardParse::Unparsed("empty JSON array".to_string()),
        Ok(cards) => FlashcardParse::Parsed(cards),
        Err(e) => FlashcardParse::Unparsed(e.to_string()),
    }
}

static QUESTION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:\d+\.|q:|question:)").unwrap());
static QUESTION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:\d+\.\s*|q:\s*|question:\s*)").unwrap());
static ANSWER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:a:\s*|answer:\s*)").unwrap());

/// Line-based reading of unstructured model output.
pub fn parse_flashcard_text(text: &str) -> Vec<Flashcard> {
    let mut flashcards = Vec::new();
    let mut question: Option<String> = None;
    let mut answer: Option<String> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if QUESTION_LINE.is_match(line) || line.ends_with('?') {
            flush(&mut flashcards, question.take(), answer.take());
            question = Some(line.to_string());
        } else if ANSWER_PREFIX.is_match(line) || (question.is_some() && answer.is_none()) {
            answer = Some(line.to_string());
        } else if let Some(current) = answer.as_mut() {
            current.push(' ');
            current.push_str(line);
        }
    }
    flush(&mut flashcards, question, answer);

    if flashcards.is_empty() {
        flashcards.push(Flashcard::new(FALLBACK_QUESTION, FALLBACK_ANSWER));
    }
    flashcards
}

fn flush(cards: &mut Vec<Flashcard>, question: Option<String>, answer: Option<String>) {
    let (Some(question), Some(answer)) = (question, answer) else {
        return;
    };
    let question = QUESTION_PREFIX.replace(&question, "").trim().to_string();
    let answer = ANSWER_PREFIX.replace(&answer, "").trim().to_string();
    if !question.is_empty() && !answer.is_empty() {
        cards.push(Flashcard { question, answer });
    }
}
