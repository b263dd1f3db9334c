//! Prompt construction for AI-written quizzes.

use crate::llm::ChatMessage;
use crate::quran::{AyahText, SurahInfo};

use super::Difficulty;

/// Cap on how many ayahs of source text go into a single prompt.
const MAX_EXCERPT_AYAHS: usize = 40;

const SYSTEM_PROMPT: &str = "\
You write multiple-choice quizzes that help students memorise the Quran.
Only ask about the passage you are given: its wording, order of ayahs, themes \
and well-known context. Never invent ayahs or misquote text.

Use exactly this plain-text layout for every question, with no markdown:

Question 1: <question text>
A) <option>
B) <option>
C) <option>
D) <option>
Answer: <letter>
Explanation: <one sentence>

Leave one blank line between questions. Do not add any other commentary.";

fn difficulty_hint(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Keep questions simple: themes, names and obvious wording.",
        Difficulty::Medium => "Mix questions on wording, ayah order and meaning.",
        Difficulty::Hard => {
            "Focus on precise wording, ayah order and phrases that resemble other passages."
        }
    }
}

/// Build the system + user messages for a quiz over `surah` ayahs `from..=to`.
pub fn build_messages(
    surah: &SurahInfo,
    from: u16,
    to: u16,
    question_count: usize,
    difficulty: Difficulty,
    excerpt: Option<&[AyahText]>,
) -> Vec<ChatMessage> {
    let mut user = format!(
        "Write {} {} question{} about Surah {} ({}, \"{}\"), ayahs {} to {}.\n{}\n",
        question_count,
        difficulty.as_str(),
        if question_count == 1 { "" } else { "s" },
        surah.name_transliterated,
        surah.name_arabic,
        surah.name_english,
        from,
        to,
        difficulty_hint(difficulty),
    );

    if let Some(ayahs) = excerpt.filter(|a| !a.is_empty()) {
        user.push_str("\nPassage:\n");
        for ayah in ayahs.iter().take(MAX_EXCERPT_AYAHS) {
            user.push_str(&format!("{}:{} {}\n", ayah.surah, ayah.ayah, ayah.text));
        }
        if ayahs.len() > MAX_EXCERPT_AYAHS {
            user.push_str("(passage truncated)\n");
        }
    }

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}
