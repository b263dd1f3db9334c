//! Quiz generation, parsing and grading.
//!
//! ## Flow
//! 1. A `QuizRequest` is validated against the surah table
//! 2. Questions come either from the LLM (prompt → free text → `parser`) or
//!    from the local generators built on the loaded corpus
//! 3. The full questions (with answer keys) are persisted; clients only ever
//!    see `QuestionView`s
//! 4. Submissions are scored by `grading::grade`

pub mod grading;
pub mod local;
pub mod parser;
pub mod prompt;

pub use grading::{grade, GradeError, GradeReport, QuestionResult, SubmittedAnswer};
pub use parser::{parse_quiz, ParseError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::llm::{ChatOptions, LlmClient};
use crate::quran::{resolve_range, surah, AyahRef, QuranCorpus, QuranError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizKind {
    /// Free-form multiple choice written by the LLM
    AiMultipleChoice,
    /// Which ayah follows the one shown
    NextAyah,
    /// Which surah the shown ayah belongs to
    IdentifySurah,
}

impl QuizKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiMultipleChoice => "ai_multiple_choice",
            Self::NextAyah => "next_ayah",
            Self::IdentifySurah => "identify_surah",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ai_multiple_choice" => Some(Self::AiMultipleChoice),
            "next_ayah" => Some(Self::NextAyah),
            "identify_surah" => Some(Self::IdentifySurah),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOption {
    pub letter: char,
    pub text: String,
}

/// A question including its answer key. Never sent to clients before grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<QuizOption>,
    pub answer: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<AyahRef>,
}

/// What clients see while taking a quiz.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub prompt: String,
    pub options: Vec<QuizOption>,
}

impl QuizQuestion {
    pub fn view(&self, index: usize) -> QuestionView {
        QuestionView {
            index,
            prompt: self.prompt.clone(),
            options: self.options.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizRequest {
    pub surah: u16,
    #[serde(default)]
    pub from_ayah: Option<u16>,
    #[serde(default)]
    pub to_ayah: Option<u16>,
    pub question_count: usize,
    pub kind: QuizKind,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Quran(#[from] QuranError),

    #[error("AI quiz generation is not configured")]
    LlmUnavailable,

    #[error("AI provider request failed: {0}")]
    Llm(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("not enough material for this quiz: {0}")]
    NotEnoughMaterial(String),
}

/// Produces questions for a validated request.
pub struct QuizGenerator {
    llm: Option<Arc<dyn LlmClient>>,
    model: String,
    max_questions: usize,
    corpus: Arc<QuranCorpus>,
}

impl QuizGenerator {
    pub fn new(
        llm: Option<Arc<dyn LlmClient>>,
        model: String,
        max_questions: usize,
        corpus: Arc<QuranCorpus>,
    ) -> Self {
        Self {
            llm,
            model,
            max_questions,
            corpus,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.llm.is_some()
    }

    fn validate(&self, req: &QuizRequest) -> Result<(u16, u16), QuizError> {
        if req.question_count == 0 || req.question_count > self.max_questions {
            return Err(QuizError::InvalidRequest(format!(
                "question_count must be between 1 and {}",
                self.max_questions
            )));
        }
        Ok(resolve_range(req.surah, req.from_ayah, req.to_ayah)?)
    }

    pub async fn generate(&self, req: &QuizRequest) -> Result<Vec<QuizQuestion>, QuizError> {
        let (from, to) = self.validate(req)?;
        match req.kind {
            QuizKind::AiMultipleChoice => self.generate_ai(req, from, to).await,
            QuizKind::NextAyah => {
                let mut rng = StdRng::from_entropy();
                local::next_ayah(&self.corpus, req.surah, from, to, req.question_count, &mut rng)
            }
            QuizKind::IdentifySurah => {
                let mut rng = StdRng::from_entropy();
                local::identify_surah(&self.corpus, req.surah, from, to, req.question_count, &mut rng)
            }
        }
    }

    async fn generate_ai(
        &self,
        req: &QuizRequest,
        from: u16,
        to: u16,
    ) -> Result<Vec<QuizQuestion>, QuizError> {
        let llm = self.llm.as_ref().ok_or(QuizError::LlmUnavailable)?;
        let info = surah(req.surah).ok_or(QuranError::InvalidSurah(req.surah))?;

        let excerpt = if self.corpus.is_loaded(req.surah) {
            self.corpus.range(req.surah, Some(from), Some(to)).ok()
        } else {
            None
        };
        let messages = prompt::build_messages(
            info,
            from,
            to,
            req.question_count,
            req.difficulty,
            excerpt.as_deref(),
        );

        tracing::info!(
            surah = req.surah,
            from,
            to,
            count = req.question_count,
            "Requesting AI quiz"
        );

        let response = llm
            .chat_completion(
                &self.model,
                &messages,
                ChatOptions {
                    temperature: Some(0.7),
                    max_tokens: Some(400 + 250 * req.question_count as u64),
                },
            )
            .await
            .map_err(|e| QuizError::Llm(e.to_string()))?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "AI quiz token usage"
            );
        }

        let text = response.content.unwrap_or_default();
        let mut questions = parse_quiz(&text, req.question_count)?;
        if questions.len() < req.question_count {
            tracing::warn!(
                "Model returned {} usable questions out of {} requested",
                questions.len(),
                req.question_count
            );
        }
        for q in &mut questions {
            if q.reference.is_none() && from == to {
                q.reference = Some(AyahRef::new(req.surah, from));
            }
        }
        Ok(questions)
    }
}
