//! # Hifz
//!
//! Backend for a Quran memorization app.
//!
//! This library provides:
//! - An HTTP API for accounts, profiles and feedback
//! - Surah/ayah lookup, search and mutashabihat (similar ayah) discovery
//! - Quizzes generated by an LLM or built locally from the corpus, with grading
//! - Recitation session tracking, memorization progress and streaks
//!
//! ## Quiz Flow
//! 1. Client requests a quiz for a surah range
//! 2. Questions come from the LLM (free text, parsed) or from the local generators
//! 3. The quiz is stored with its answer key; the client only sees the questions
//! 4. Submitted answers are graded and recorded as an attempt
//!
//! ## Modules
//! - `api`: axum router, auth middleware and handlers
//! - `quran`: surah table, corpus loading, normalisation, similarity
//! - `quiz`: prompt building, reply parsing, local generators, grading
//! - `store`: SQLite persistence
//! - `llm`: chat-completion client

pub mod api;
pub mod config;
pub mod llm;
pub mod password;
pub mod quiz;
pub mod quran;
pub mod store;

pub use config::Config;
