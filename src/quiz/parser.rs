//! Turns the model's free-form quiz text into validated questions.
//!
//! The prompt asks for a fixed layout, but models drift: markdown emphasis,
//! `Q1.` instead of `Question 1:`, `(B)` instead of `B)`, answers that repeat
//! the option text. The parser is a single pass over lines with a small state
//! machine; anything that does not validate is dropped with a warning rather
//! than failing the whole quiz.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use thiserror::Error;

use super::{QuizOption, QuizQuestion};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("no valid questions found in model output ({rejected} rejected)")]
    NoQuestions { rejected: usize },
}

struct Patterns {
    prefixed_header: Regex,
    bare_header: Regex,
    option: Regex,
    answer: Regex,
    explanation: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        prefixed_header: Regex::new(r"(?i)^(?:question|q)\s*(\d+)\s*[:.)\-]?\s*(.*)$")
            .expect("valid regex"),
        bare_header: Regex::new(r"^(\d+)\s*[.):]\s+(.+)$").expect("valid regex"),
        option: Regex::new(r"^(?:\(([A-Fa-f])\)|([A-Fa-f])\s*[).:\-])\s*(.+)$")
            .expect("valid regex"),
        answer: Regex::new(r"(?i)^(?:correct\s+)?answer\s*[:\-]\s*\(?([A-F])\b").expect("valid regex"),
        explanation: Regex::new(r"(?i)^explanation\s*[:\-]\s*(.*)$").expect("valid regex"),
    })
}

/// Remove markdown decoration that models like to add around structural markers.
fn clean_line(line: &str) -> String {
    let stripped = line.replace("**", "").replace("__", "");
    stripped
        .trim()
        .trim_start_matches('#')
        .trim()
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Prompt,
    Options,
    Answered,
    Explanation,
}

#[derive(Debug)]
struct Draft {
    number: u32,
    prompt: String,
    options: Vec<(char, String)>,
    answer: Option<char>,
    explanation: Option<String>,
    section: Section,
}

impl Draft {
    fn new(number: u32, first_line: &str) -> Self {
        Self {
            number,
            prompt: first_line.trim().to_string(),
            options: Vec::new(),
            answer: None,
            explanation: None,
            section: Section::Prompt,
        }
    }

    fn continue_with(&mut self, line: &str) {
        let target = match self.section {
            Section::Prompt => &mut self.prompt,
            Section::Options => match self.options.last_mut() {
                Some((_, text)) => text,
                None => &mut self.prompt,
            },
            Section::Answered => return,
            Section::Explanation => self.explanation.get_or_insert_with(String::new),
        };
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(line);
    }

    fn finish(self) -> Result<QuizQuestion, String> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err("empty question text".to_string());
        }
        if self.options.len() < MIN_OPTIONS || self.options.len() > MAX_OPTIONS {
            return Err(format!("{} options", self.options.len()));
        }

        let mut seen_texts = HashSet::new();
        let mut options = Vec::with_capacity(self.options.len());
        for (i, (letter, text)) in self.options.into_iter().enumerate() {
            let expected = (b'A' + i as u8) as char;
            if letter != expected {
                return Err(format!("option {} labelled {}", expected, letter));
            }
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(format!("option {} is empty", letter));
            }
            if !seen_texts.insert(text.to_lowercase()) {
                return Err(format!("duplicate option text {:?}", text));
            }
            options.push(QuizOption { letter, text });
        }

        let answer = self.answer.ok_or_else(|| "missing answer".to_string())?;
        if !options.iter().any(|o| o.letter == answer) {
            return Err(format!("answer {} is not an option", answer));
        }

        Ok(QuizQuestion {
            prompt,
            options,
            answer,
            explanation: self
                .explanation
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            reference: None,
        })
    }
}

/// Parse model output into at most `max_questions` valid questions.
pub fn parse_quiz(text: &str, max_questions: usize) -> Result<Vec<QuizQuestion>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let p = patterns();
    let mut drafts: Vec<Draft> = Vec::new();

    for raw in text.lines() {
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = p
            .prefixed_header
            .captures(&line)
            .or_else(|| p.bare_header.captures(&line))
        {
            let number = caps[1].parse().unwrap_or(0);
            drafts.push(Draft::new(number, caps.get(2).map_or("", |m| m.as_str())));
            continue;
        }

        let Some(current) = drafts.last_mut() else {
            // Preamble before the first question.
            continue;
        };

        if let Some(caps) = p.answer.captures(&line.to_uppercase()) {
            current.answer = caps[1].chars().next();
            current.section = Section::Answered;
            continue;
        }

        if let Some(caps) = p.explanation.captures(&line) {
            current.explanation = Some(caps[1].trim().to_string());
            current.section = Section::Explanation;
            continue;
        }

        if matches!(current.section, Section::Prompt | Section::Options) {
            if let Some(caps) = p.option.captures(&line) {
                let letter = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .and_then(|m| m.as_str().chars().next())
                    .map(|c| c.to_ascii_uppercase());
                if let Some(letter) = letter {
                    current.options.push((letter, caps[3].trim().to_string()));
                    current.section = Section::Options;
                    continue;
                }
            }
        }

        current.continue_with(&line);
    }

    let mut questions = Vec::new();
    let mut rejected = 0;
    for draft in drafts {
        let number = draft.number;
        match draft.finish() {
            Ok(q) => questions.push(q),
            Err(reason) => {
                rejected += 1;
                tracing::warn!(question = number, "Dropping malformed quiz question: {}", reason);
            }
        }
    }

    if questions.is_empty() {
        return Err(ParseError::NoQuestions { rejected });
    }
    if questions.len() > max_questions {
        tracing::debug!(
            "Model produced {} questions, keeping {}",
            questions.len(),
            max_questions
        );
        questions.truncate(max_questions);
    }
    Ok(questions)
}
