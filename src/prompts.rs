//! Prompt templates for each generation kind.
//!
//! Summaries and study plans ask for numbered headings with `-` bullets; the
//! normalizer keeps that structure and only strips bold markers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::models::ProxyRequest;

/// What the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Summary,
    StudyPlan,
    Flashcards,
    Comprehensive,
}

/// A kind that maps onto exactly one model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Summary,
    StudyPlan,
    Flashcards,
}

impl GenerationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::Summary => "summary",
            GenerationKind::StudyPlan => "study_plan",
            GenerationKind::Flashcards => "flashcards",
            GenerationKind::Comprehensive => "comprehensive",
        }
    }

    /// `None` for comprehensive, which is composed from all three prompts.
    pub fn prompt_kind(self) -> Option<PromptKind> {
        match self {
            GenerationKind::Summary => Some(PromptKind::Summary),
            GenerationKind::StudyPlan => Some(PromptKind::StudyPlan),
            GenerationKind::Flashcards => Some(PromptKind::Flashcards),
            GenerationKind::Comprehensive => None,
        }
    }
}

impl std::str::FromStr for GenerationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(GenerationKind::Summary),
            "study_plan" => Ok(GenerationKind::StudyPlan),
            "flashcards" => Ok(GenerationKind::Flashcards),
            "comprehensive" => Ok(GenerationKind::Comprehensive),
            other => Err(format!("Invalid generation type: {}", other)),
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PromptKind {
    /// Human wording used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Summary => "summary",
            PromptKind::StudyPlan => "study plan",
            PromptKind::Flashcards => "flashcards",
        }
    }
}

impl From<PromptKind> for GenerationKind {
    fn from(kind: PromptKind) -> Self {
        match kind {
            PromptKind::Summary => GenerationKind::Summary,
            PromptKind::StudyPlan => GenerationKind::StudyPlan,
            PromptKind::Flashcards => GenerationKind::Flashcards,
        }
    }
}

const SUMMARY_SYSTEM: &str = "You are an expert educational assistant. Create clear, comprehensive summaries of academic content.

FORMATTING REQUIREMENTS:
- Use clear headings with numbers (1., 2., 3., etc.)
- Use bullet points (-) for key concepts
- Use line breaks to separate sections
- Keep sentences concise and readable
- Structure the content logically";

const STUDY_PLAN_SYSTEM: &str = "You are an expert educational planner. Create structured, actionable study plans that help students learn effectively.

FORMATTING REQUIREMENTS:
- Use clear headings with numbers (1., 2., 3., etc.)
- Use bullet points (-) for activities and tasks
- Use line breaks to separate sections
- Include time estimates for each activity
- Structure the content logically";

const FLASHCARDS_SYSTEM: &str = "You are an expert educational content creator. Create effective flashcards for active recall and spaced repetition learning.

Instructions:
- Create 10-15 flashcards that cover the most important concepts
- Questions should test understanding, not just memorization
- Include a mix of factual, conceptual, and application questions
- Keep questions concise but specific
- Provide clear, accurate answers
- Format as a JSON array of objects with \"question\" and \"answer\" fields and nothing else";

const SUMMARY_DELIVERABLES: &str = "Please provide:
1. Brief Overview (2-3 sentences)
2. Key Concepts (bullet points)
3. Important Details (bullet points)
4. Examples or Case Studies (if any)";

const STUDY_PLAN_DELIVERABLES: &str = "Please provide:
1. Learning Objectives (what students should achieve)
2. Study Schedule Breakdown (sessions with time estimates)
3. Key Activities for Each Session (reading, practice, review)
4. Self-Assessment Methods
5. Review Schedule Recommendations
6. Additional Resources or Practice Suggestions";

const FLASHCARDS_DELIVERABLES: &str = r#"Please create 10-15 flashcards in JSON format like this:
[
  {"question": "What is...", "answer": "..."},
  {"question": "How does...", "answer": "..."}
]

Focus on:
- Key concepts and definitions
- Important processes or procedures
- Critical thinking applications
- Common misconceptions to address
- Practical examples and use cases"#;

/// A generation request with its source text already filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub title: String,
    /// Never empty.
    pub source_text: String,
}

pub fn build_request(kind: GenerationKind, extracted_text: &str, title: &str) -> GenerationRequest {
    let source_text = if extracted_text.trim().is_empty() {
        empty_source_placeholder(title)
    } else {
        extracted_text.to_string()
    };

    GenerationRequest {
        kind,
        title: title.to_string(),
        source_text,
    }
}

fn empty_source_placeholder(title: &str) -> String {
    if title.trim().is_empty() {
        "No text content could be extracted from this resource. Base the response on general knowledge of the topic.".to_string()
    } else {
        format!(
            "No text content could be extracted from \"{}\". Base the response on general knowledge of the topic suggested by the title.",
            title
        )
    }
}

impl GenerationRequest {
    /// The system instruction and user content for one model call.
    pub fn prompt(&self, kind: PromptKind) -> ProxyRequest {
        let (system, opening, deliverables) = match kind {
            PromptKind::Summary => (
                SUMMARY_SYSTEM,
                "Create a comprehensive summary of this educational content:",
                SUMMARY_DELIVERABLES,
            ),
            PromptKind::StudyPlan => (
                STUDY_PLAN_SYSTEM,
                "Create a detailed study plan for this educational content:",
                STUDY_PLAN_DELIVERABLES,
            ),
            PromptKind::Flashcards => (
                FLASHCARDS_SYSTEM,
                "Create flashcards for this educational content:",
                FLASHCARDS_DELIVERABLES,
            ),
        };

        let prompt = format!(
            "{}\n\nTitle: {}\n\nContent:\n{}\n\n{}",
            opening, self.title, self.source_text, deliverables
        );

        ProxyRequest::new(prompt, Some(system.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prompt_embeds_title_and_text() {
        let req = build_request(GenerationKind::Summary, "Cells divide by mitosis.", "Biology 101");
        let proxy = req.prompt(PromptKind::Summary);
        assert!(proxy.prompt.contains("Title: Biology 101"));
        assert!(proxy.prompt.contains("Content:\nCells divide by mitosis.\n"));
        assert!(proxy.prompt.contains("4. Examples or Case Studies"));
        assert!(proxy.system_prompt.unwrap().contains("numbers (1., 2., 3., etc.)"));
    }

    #[test]
    fn study_plan_lists_six_deliverables() {
        let req = build_request(GenerationKind::StudyPlan, "text", "t");
        let prompt = req.prompt(PromptKind::StudyPlan).prompt;
        assert!(prompt.contains("1. Learning Objectives"));
        assert!(prompt.contains("6. Additional Resources or Practice Suggestions"));
    }

    #[test]
    fn flashcards_prompt_asks_for_json_array() {
        let req = build_request(GenerationKind::Flashcards, "text", "t");
        let proxy = req.prompt(PromptKind::Flashcards);
        assert!(proxy.system_prompt.unwrap().contains("10-15 flashcards"));
        assert!(proxy.prompt.contains(r#"{"question": "What is...", "answer": "..."}"#));
    }

    #[test]
    fn empty_title_still_renders() {
        let req = build_request(GenerationKind::Summary, "text", "");
        assert!(req.prompt(PromptKind::Summary).prompt.contains("Title: \n\nContent:\ntext"));
    }

    #[test]
    fn empty_text_is_replaced() {
        let req = build_request(GenerationKind::Summary, "   \n", "Thermodynamics");
        assert!(!req.source_text.trim().is_empty());
        assert!(req.source_text.contains("Thermodynamics"));

        let untitled = build_request(GenerationKind::Summary, "", "");
        assert!(!untitled.source_text.is_empty());
    }

    #[test]
    fn only_comprehensive_lacks_a_single_prompt() {
        assert_eq!(GenerationKind::Comprehensive.prompt_kind(), None);
        assert_eq!(
            GenerationKind::StudyPlan.prompt_kind(),
            Some(PromptKind::StudyPlan)
        );
    }

    #[test]
    fn kind_round_trips_through_its_name() {
        for kind in [
            GenerationKind::Summary,
            GenerationKind::StudyPlan,
            GenerationKind::Flashcards,
            GenerationKind::Comprehensive,
        ] {
            assert_eq!(kind.as_str().parse::<GenerationKind>().unwrap(), kind);
        }
        assert!("quiz".parse::<GenerationKind>().is_err());
    }
}
