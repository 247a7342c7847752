use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.,!?;:]").unwrap());

/// Answers this short or shorter must match exactly after normalising.
const SHORT_ANSWER_LEN: usize = 10;
const REQUIRED_WORD_SHARE: f64 = 0.7;

fn normalize_answer(text: &str) -> String {
    PUNCTUATION
        .replace_all(text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lenient comparison of a typed answer with the card's answer.
pub fn check_answer(student_answer: &str, correct_answer: &str) -> bool {
    let student = student_answer.trim().to_lowercase();
    let correct = correct_answer.trim().to_lowercase();

    if student == correct {
        return true;
    }

    let student = normalize_answer(&student);
    let normalized_correct = normalize_answer(&correct);
    if student == normalized_correct {
        return true;
    }

    if correct.chars().count() <= SHORT_ANSWER_LEN {
        return false;
    }

    let student_words: Vec<&str> = student.split_whitespace().collect();
    let correct_words: Vec<&str> = normalized_correct.split_whitespace().collect();

    let matching = correct_words
        .iter()
        .filter(|word| {
            word.chars().count() > 2
                && student_words
                    .iter()
                    .any(|sw| sw.contains(*word) || word.contains(sw))
        })
        .count();

    matching as f64 >= (correct_words.len() as f64 * REQUIRED_WORD_SHARE).max(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttemptScore {
    pub correct: usize,
    pub total: usize,
    pub percent: f64,
}

pub fn score_attempt(results: &[bool]) -> AttemptScore {
    let correct = results.iter().filter(|r| **r).count();
    let total = results.len();
    let percent = if total > 0 {
        correct as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    AttemptScore {
        correct,
        total,
        percent,
    }
}
