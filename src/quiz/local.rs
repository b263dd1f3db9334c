//! Quiz kinds generated directly from the corpus, no model involved.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{QuizError, QuizOption, QuizQuestion};
use crate::quran::{surah, AyahRef, QuranCorpus, QuranError, SURAHS};

const DISTRACTORS: usize = 3;

fn ensure_loaded(corpus: &QuranCorpus, surah_number: u16, from: u16) -> Result<(), QuizError> {
    if corpus.is_loaded(surah_number) {
        Ok(())
    } else {
        Err(QuranError::TextUnavailable {
            surah: surah_number,
            ayah: from,
        }
        .into())
    }
}

fn build_question<R: Rng + ?Sized>(
    prompt: String,
    correct: String,
    distractors: Vec<String>,
    explanation: String,
    reference: AyahRef,
    rng: &mut R,
) -> QuizQuestion {
    let mut texts: Vec<(bool, String)> = Vec::with_capacity(distractors.len() + 1);
    texts.push((true, correct));
    texts.extend(distractors.into_iter().map(|d| (false, d)));
    texts.shuffle(rng);

    let mut answer = 'A';
    let options = texts
        .into_iter()
        .enumerate()
        .map(|(i, (is_correct, text))| {
            let letter = (b'A' + i as u8) as char;
            if is_correct {
                answer = letter;
            }
            QuizOption { letter, text }
        })
        .collect();

    QuizQuestion {
        prompt,
        options,
        answer,
        explanation: Some(explanation),
        reference: Some(reference),
    }
}

/// "Which ayah comes next?" questions. Distractors are other ayahs of the same surah.
pub fn next_ayah<R: Rng + ?Sized>(
    corpus: &QuranCorpus,
    surah_number: u16,
    from: u16,
    to: u16,
    count: usize,
    rng: &mut R,
) -> Result<Vec<QuizQuestion>, QuizError> {
    let info = surah(surah_number).ok_or(QuranError::InvalidSurah(surah_number))?;
    ensure_loaded(corpus, surah_number, from)?;

    let last_start = to.min(info.ayah_count.saturating_sub(1));
    if from > last_start {
        return Err(QuizError::NotEnoughMaterial(format!(
            "no ayah follows {}:{} inside the surah",
            surah_number, from
        )));
    }

    let starts: Vec<u16> = (from..=last_start).collect();
    let mut chosen: Vec<u16> = starts
        .choose_multiple(rng, count.min(starts.len()))
        .copied()
        .collect();
    chosen.sort_unstable();

    let mut questions = Vec::with_capacity(chosen.len());
    for ayah in chosen {
        let shown = corpus.text(AyahRef::new(surah_number, ayah))?;
        let next = AyahRef::new(surah_number, ayah + 1);
        let correct = corpus.text(next)?.to_string();

        let mut pool: Vec<String> = Vec::new();
        for n in 1..=info.ayah_count {
            if n == ayah || n == ayah + 1 {
                continue;
            }
            let text = corpus.text(AyahRef::new(surah_number, n))?;
            if text != correct && text != shown && !pool.iter().any(|p| p == text) {
                pool.push(text.to_string());
            }
        }
        let distractors: Vec<String> = pool
            .choose_multiple(rng, DISTRACTORS.min(pool.len()))
            .cloned()
            .collect();
        if distractors.is_empty() {
            continue;
        }

        questions.push(build_question(
            format!("Which ayah comes after {}:{}?\n{}", surah_number, ayah, shown),
            correct,
            distractors,
            format!("{} is followed by {}.", AyahRef::new(surah_number, ayah), next),
            next,
            rng,
        ));
    }

    if questions.is_empty() {
        return Err(QuizError::NotEnoughMaterial(format!(
            "surah {} is too short for next-ayah questions",
            surah_number
        )));
    }
    Ok(questions)
}

/// "Which surah is this ayah from?" questions. Distractors are random other surahs.
pub fn identify_surah<R: Rng + ?Sized>(
    corpus: &QuranCorpus,
    surah_number: u16,
    from: u16,
    to: u16,
    count: usize,
    rng: &mut R,
) -> Result<Vec<QuizQuestion>, QuizError> {
    let info = surah(surah_number).ok_or(QuranError::InvalidSurah(surah_number))?;
    ensure_loaded(corpus, surah_number, from)?;

    let ayahs: Vec<u16> = (from..=to).collect();
    let mut chosen: Vec<u16> = ayahs
        .choose_multiple(rng, count.min(ayahs.len()))
        .copied()
        .collect();
    chosen.sort_unstable();

    let others: Vec<&str> = SURAHS
        .iter()
        .filter(|s| s.number != surah_number)
        .map(|s| s.name_transliterated)
        .collect();

    let mut questions = Vec::with_capacity(chosen.len());
    for ayah in chosen {
        let r = AyahRef::new(surah_number, ayah);
        let text = corpus.text(r)?;
        let distractors = others
            .choose_multiple(rng, DISTRACTORS)
            .map(|name| name.to_string())
            .collect();
        questions.push(build_question(
            format!("Which surah contains this ayah?\n{}", text),
            info.name_transliterated.to_string(),
            distractors,
            format!(
                "This is ayah {} of Surah {} ({}).",
                ayah, info.name_transliterated, info.name_english
            ),
            r,
            rng,
        ));
    }
    Ok(questions)
}
