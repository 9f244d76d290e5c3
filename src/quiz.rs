//! Practice questions and study suggestions built on the answer generator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AssistantError;
use crate::generator::AnswerGenerator;

const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn focus(&self) -> &'static str {
        match self {
            Difficulty::Easy => "basic concepts and definitions",
            Difficulty::Medium => "application and understanding",
            Difficulty::Hard => "analysis and critical thinking",
        }
    }
}

impl FromStr for Difficulty {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(AssistantError::Validation(format!(
                "unknown difficulty: {} (easy, medium or hard)",
                other
            ))),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqQuestion {
    pub question: String,
    pub options: BTreeMap<char, String>,
    pub correct: char,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortAnswerQuestion {
    pub question: String,
    pub expected_answer: String,
    pub marks: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub percentage: f64,
}

/// Grade answers against questions position by position. Missing answers
/// count as wrong.
pub fn score(questions: &[McqQuestion], answers: &[char]) -> QuizScore {
    let correct = questions
        .iter()
        .zip(answers)
        .filter(|(q, a)| q.correct.eq_ignore_ascii_case(a))
        .count();
    let total = questions.len();
    let percentage = if total > 0 {
        correct as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    QuizScore {
        correct,
        total,
        percentage,
    }
}

fn context_block(context: &[String]) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(
            "Use only the following syllabus content:\n{}\n\n",
            context.join("\n\n")
        )
    }
}

fn value_after<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.strip_prefix(label).map(str::trim)
}

#[derive(Default)]
struct McqDraft {
    question: String,
    options: BTreeMap<char, String>,
    correct: Option<char>,
    explanation: Option<String>,
}

impl McqDraft {
    fn finish(self) -> Option<McqQuestion> {
        let correct = self.correct?;
        if self.question.is_empty() || self.options.len() < 2 || !self.options.contains_key(&correct) {
            return None;
        }
        Some(McqQuestion {
            question: self.question,
            options: self.options,
            correct,
            explanation: self.explanation,
        })
    }
}

/// Parse `Q:` / `A)`..`D)` / `Correct:` / `Explanation:` blocks. Blocks
/// without a usable answer key are skipped.
pub fn parse_mcq(content: &str) -> Vec<McqQuestion> {
    let mut questions = Vec::new();
    let mut current: Option<McqDraft> = None;

    for line in content.lines().map(str::trim) {
        if let Some(text) = value_after(line, "Q:") {
            if let Some(q) = current.take().and_then(McqDraft::finish) {
                questions.push(q);
            }
            current = Some(McqDraft {
                question: text.to_string(),
                ..Default::default()
            });
            continue;
        }

        let Some(draft) = current.as_mut() else {
            continue;
        };
        if let Some(letter) = OPTION_LETTERS
            .iter()
            .find(|l| line.starts_with(&format!("{})", l)))
        {
            draft.options.insert(*letter, line[2..].trim().to_string());
        } else if let Some(answer) = value_after(line, "Correct:") {
            draft.correct = answer
                .chars()
                .next()
                .map(|c| c.to_ascii_uppercase())
                .filter(|c| OPTION_LETTERS.contains(c));
        } else if let Some(explanation) = value_after(line, "Explanation:") {
            draft.explanation = Some(explanation.to_string());
        }
    }

    if let Some(q) = current.and_then(McqDraft::finish) {
        questions.push(q);
    }
    questions
}

/// Parse `Q:` / `Expected Answer:` / `Marks:` blocks.
pub fn parse_short_answer(content: &str) -> Vec<ShortAnswerQuestion> {
    let mut questions = Vec::new();
    let mut current: Option<(String, Option<String>, Option<u8>)> = None;

    let flush = |draft: Option<(String, Option<String>, Option<u8>)>,
                 out: &mut Vec<ShortAnswerQuestion>| {
        if let Some((question, Some(expected_answer), marks)) = draft {
            if !question.is_empty() {
                out.push(ShortAnswerQuestion {
                    question,
                    expected_answer,
                    marks,
                });
            }
        }
    };

    for line in content.lines().map(str::trim) {
        if let Some(text) = value_after(line, "Q:") {
            flush(current.take(), &mut questions);
            current = Some((text.to_string(), None, None));
        } else if let Some((_, expected, marks)) = current.as_mut() {
            if let Some(answer) = value_after(line, "Expected Answer:") {
                *expected = Some(answer.to_string());
            } else if let Some(value) = value_after(line, "Marks:") {
                *marks = value
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|s| !s.is_empty())
                    .and_then(|s| s.parse().ok());
            }
        }
    }
    flush(current, &mut questions);
    questions
}

/// Items of a numbered list (`1. ...` or `1) ...`), in order.
pub fn parse_numbered_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
            if rest.len() == line.len() {
                return None;
            }
            let item = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
            let item = item.trim();
            (!item.is_empty()).then(|| item.to_string())
        })
        .collect()
}

/// Generates practice questions and suggestions from syllabus context.
#[derive(Clone)]
pub struct QuizGenerator {
    generator: AnswerGenerator,
}

impl QuizGenerator {
    pub fn new(generator: AnswerGenerator) -> Self {
        Self { generator }
    }

    pub async fn generate_mcq(
        &self,
        context: &[String],
        count: usize,
        difficulty: Difficulty,
    ) -> Result<Vec<McqQuestion>, AssistantError> {
        let prompt = format!(
            "{context}Generate {count} multiple-choice questions focusing on {focus}.\n\n\
             Format each question EXACTLY as:\n\
             Q: [Clear question text]\n\
             A) [First option]\n\
             B) [Second option]\n\
             C) [Third option]\n\
             D) [Fourth option]\n\
             Correct: [A/B/C/D]\n\
             Explanation: [Brief explanation why this is correct]\n\n\
             ---\n\n\
             Make questions exam-oriented and challenging.",
            context = context_block(context),
            count = count,
            focus = difficulty.focus(),
        );

        let content = self.generator.generate(&prompt).await?;
        let mut questions = parse_mcq(&content);
        if questions.is_empty() {
            warn!(chars = content.len(), "no multiple-choice questions could be parsed");
        }
        questions.truncate(count);
        debug!(count = questions.len(), %difficulty, "generated multiple-choice quiz");
        Ok(questions)
    }

    pub async fn generate_short_answer(
        &self,
        context: &[String],
        count: usize,
    ) -> Result<Vec<ShortAnswerQuestion>, AssistantError> {
        let prompt = format!(
            "{context}Generate {count} short answer questions (2-5 marks each).\n\n\
             Format:\n\
             Q: [Question]\n\
             Expected Answer: [Key points that should be covered]\n\
             Marks: [2/3/5]\n\n\
             ---\n\n\
             Focus on important concepts.",
            context = context_block(context),
            count = count,
        );

        let content = self.generator.generate(&prompt).await?;
        let mut questions = parse_short_answer(&content);
        questions.truncate(count);
        Ok(questions)
    }

    pub async fn suggest_topics(
        &self,
        context: &[String],
        count: usize,
    ) -> Result<Vec<String>, AssistantError> {
        let prompt = format!(
            "{context}Based on the syllabus content, suggest {count} important exam questions.\n\n\
             Focus on key concepts and definitions, important theories and principles, \
             common exam patterns and application-based questions.\n\n\
             Format as a numbered list:\n\
             1. [Question]\n\
             2. [Question]\n\n\
             Keep questions clear and exam-oriented.",
            context = context_block(context),
            count = count,
        );

        let content = self.generator.generate(&prompt).await?;
        let mut items = parse_numbered_list(&content);
        items.truncate(count);
        Ok(items)
    }

    pub async fn related_questions(
        &self,
        question: &str,
        count: usize,
    ) -> Result<Vec<String>, AssistantError> {
        let prompt = format!(
            "Given this question: \"{question}\"\n\n\
             Suggest {count} related questions that explore different aspects of the same topic, \
             prerequisites or foundational concepts, and advanced applications.\n\n\
             Format as:\n\
             1. [Question]\n\
             2. [Question]",
            question = question.trim(),
            count = count,
        );

        let content = self.generator.generate(&prompt).await?;
        let mut items = parse_numbered_list(&content);
        items.truncate(count);
        Ok(items)
    }
}
