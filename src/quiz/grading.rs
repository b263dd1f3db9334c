//! Scoring a submission against a quiz's answer key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::QuizQuestion;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GradeError {
    #[error("question {0} does not exist in this quiz")]
    UnknownQuestion(usize),

    #[error("question {0} was answered more than once")]
    DuplicateAnswer(usize),

    #[error("choice {choice:?} is not an option for question {index}")]
    InvalidChoice { index: usize, choice: char },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_index: usize,
    pub choice: char,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_index: usize,
    pub choice: Option<char>,
    pub correct_answer: char,
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    pub total: usize,
    pub correct: usize,
    /// Percentage correct, one decimal place.
    pub percentage: f64,
    pub results: Vec<QuestionResult>,
}

/// Grade `answers` against `questions`. Unanswered questions count as wrong.
pub fn grade(
    questions: &[QuizQuestion],
    answers: &[SubmittedAnswer],
) -> Result<GradeReport, GradeError> {
    let mut chosen: HashMap<usize, char> = HashMap::with_capacity(answers.len());
    for answer in answers {
        let index = answer.question_index;
        let question = questions
            .get(index)
            .ok_or(GradeError::UnknownQuestion(index))?;
        let choice = answer.choice.to_ascii_uppercase();
        if !question.options.iter().any(|o| o.letter == choice) {
            return Err(GradeError::InvalidChoice {
                index,
                choice: answer.choice,
            });
        }
        if chosen.insert(index, choice).is_some() {
            return Err(GradeError::DuplicateAnswer(index));
        }
    }

    let results: Vec<QuestionResult> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let choice = chosen.get(&index).copied();
            QuestionResult {
                question_index: index,
                choice,
                correct_answer: question.answer,
                is_correct: choice == Some(question.answer),
                explanation: question.explanation.clone(),
            }
        })
        .collect();

    let total = results.len();
    let correct = results.iter().filter(|r| r.is_correct).count();
    let percentage = if total == 0 {
        0.0
    } else {
        (correct as f64 * 1000.0 / total as f64).round() / 10.0
    };

    Ok(GradeReport {
        total,
        correct,
        percentage,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuizOption;

    fn question(answer: char) -> QuizQuestion {
        QuizQuestion {
            prompt: "q".to_string(),
            options: ['A', 'B', 'C']
                .into_iter()
                .map(|letter| QuizOption {
                    letter,
                    text: letter.to_string(),
                })
                .collect(),
            answer,
            explanation: Some(format!("it is {}", answer)),
            reference: None,
        }
    }

    fn answer(question_index: usize, choice: char) -> SubmittedAnswer {
        SubmittedAnswer {
            question_index,
            choice,
        }
    }

    #[test]
    fn test_scores_and_rounds() {
        let questions = vec![question('A'), question('B'), question('C')];
        let report = grade(&questions, &[answer(0, 'A'), answer(1, 'c'), answer(2, 'c')]).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.correct, 2);
        assert_eq!(report.percentage, 66.7);
        assert!(report.results[0].is_correct);
        assert!(!report.results[1].is_correct);
        assert_eq!(report.results[1].correct_answer, 'B');
        assert_eq!(report.results[2].choice, Some('C'));
    }

    #[test]
    fn test_unanswered_counts_as_wrong() {
        let questions = vec![question('A'), question('B')];
        let report = grade(&questions, &[answer(1, 'B')]).unwrap();
        assert_eq!(report.correct, 1);
        assert_eq!(report.percentage, 50.0);
        assert_eq!(report.results[0].choice, None);
        assert!(!report.results[0].is_correct);
    }

    #[test]
    fn test_rejects_bad_submissions() {
        let questions = vec![question('A')];
        assert_eq!(
            grade(&questions, &[answer(3, 'A')]).unwrap_err(),
            GradeError::UnknownQuestion(3)
        );
        assert_eq!(
            grade(&questions, &[answer(0, 'A'), answer(0, 'B')]).unwrap_err(),
            GradeError::DuplicateAnswer(0)
        );
        assert_eq!(
            grade(&questions, &[answer(0, 'Z')]).unwrap_err(),
            GradeError::InvalidChoice {
                index: 0,
                choice: 'Z'
            }
        );
    }
}
