//! Generated quizzes and graded attempts.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::{
    enum_col, from_json, to_json, uuid_col, QuizAttempt, Store, StoreError, StoreResult,
    StoredQuiz,
};
use crate::quiz::{Difficulty, GradeReport, QuizKind};

impl Store {
    pub async fn save_quiz(&self, quiz: &StoredQuiz) -> StoreResult<()> {
        let questions = to_json(&quiz.questions)?;
        self.with_conn(|c| {
            c.execute(
                "INSERT INTO quizzes (id, user_id, kind, surah, from_ayah, to_ayah, difficulty, questions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    quiz.id.to_string(),
                    quiz.user_id.to_string(),
                    quiz.kind.as_str(),
                    quiz.surah,
                    quiz.from_ayah,
                    quiz.to_ayah,
                    quiz.difficulty.as_str(),
                    questions,
                    quiz.created_at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Fetch a quiz owned by `user_id`. Other users' quizzes read as not found.
    pub async fn get_quiz(&self, id: Uuid, user_id: Uuid) -> StoreResult<StoredQuiz> {
        let row = self
            .with_conn(|c| {
                Ok(c.query_row(
                    "SELECT id, user_id, kind, surah, from_ayah, to_ayah, difficulty, questions, created_at
                     FROM quizzes WHERE id = ?1 AND user_id = ?2",
                    params![id.to_string(), user_id.to_string()],
                    |row| {
                        Ok((
                            StoredQuiz {
                                id: uuid_col(row, 0)?,
                                user_id: uuid_col(row, 1)?,
                                kind: enum_col(row, 2, QuizKind::parse)?,
                                surah: row.get(3)?,
                                from_ayah: row.get(4)?,
                                to_ayah: row.get(5)?,
                                difficulty: enum_col(row, 6, Difficulty::parse)?,
                                questions: Vec::new(),
                                created_at: row.get(8)?,
                            },
                            row.get::<_, String>(7)?,
                        ))
                    },
                )
                .optional()?)
            })
            .await?;

        let (mut quiz, questions) =
            row.ok_or_else(|| StoreError::NotFound(format!("quiz {}", id)))?;
        quiz.questions = from_json(&questions)?;
        Ok(quiz)
    }

    pub async fn save_attempt(
        &self,
        quiz: &StoredQuiz,
        report: &GradeReport,
    ) -> StoreResult<QuizAttempt> {
        let attempt = QuizAttempt {
            id: Uuid::new_v4(),
            quiz_id: quiz.id,
            user_id: quiz.user_id,
            kind: quiz.kind,
            surah: quiz.surah,
            correct: report.correct,
            total: report.total,
            percentage: report.percentage,
            report: report.clone(),
            created_at: Utc::now(),
        };
        let report_json = to_json(report)?;

        self.with_conn(|c| {
            c.execute(
                "INSERT INTO quiz_attempts (id, quiz_id, user_id, correct, total, percentage, report, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    attempt.id.to_string(),
                    attempt.quiz_id.to_string(),
                    attempt.user_id.to_string(),
                    attempt.correct as i64,
                    attempt.total as i64,
                    attempt.percentage,
                    report_json,
                    attempt.created_at,
                ],
            )?;
            Ok(())
        })
        .await?;

        tracing::info!(
            user = %attempt.user_id,
            quiz = %attempt.quiz_id,
            correct = attempt.correct,
            total = attempt.total,
            "Quiz attempt graded"
        );
        Ok(attempt)
    }

    /// A user's attempts, newest first.
    pub async fn list_attempts(&self, user_id: Uuid, limit: usize) -> StoreResult<Vec<QuizAttempt>> {
        let rows = self
            .with_conn(|c| {
                let mut stmt = c.prepare(
                    "SELECT a.id, a.quiz_id, a.user_id, q.kind, q.surah, a.correct, a.total,
                            a.percentage, a.report, a.created_at
                     FROM quiz_attempts a JOIN quizzes q ON q.id = a.quiz_id
                     WHERE a.user_id = ?1
                     ORDER BY a.created_at DESC, a.rowid DESC
                     LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![user_id.to_string(), limit as i64], |row| {
                    Ok((
                        uuid_col(row, 0)?,
                        uuid_col(row, 1)?,
                        uuid_col(row, 2)?,
                        enum_col(row, 3, QuizKind::parse)?,
                        row.get::<_, u16>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, f64>(7)?,
                        row.get::<_, String>(8)?,
                        row.get(9)?,
                    ))
                })?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await?;

        rows.into_iter()
            .map(
                |(id, quiz_id, user_id, kind, surah, correct, total, percentage, report, created_at)| {
                    Ok(QuizAttempt {
                        id,
                        quiz_id,
                        user_id,
                        kind,
                        surah,
                        correct: correct as usize,
                        total: total as usize,
                        percentage,
                        report: from_json::<GradeReport>(&report)?,
                        created_at,
                    })
                },
            )
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::quiz::{grade, QuizOption, QuizQuestion, SubmittedAnswer};
    use crate::store::tests::store_with_user;

    pub(crate) fn sample_quiz(user_id: Uuid) -> StoredQuiz {
        StoredQuiz {
            id: Uuid::new_v4(),
            user_id,
            kind: QuizKind::NextAyah,
            surah: 112,
            from_ayah: 1,
            to_ayah: 4,
            difficulty: Difficulty::Easy,
            questions: vec![QuizQuestion {
                prompt: "Which ayah comes after 112:1?".to_string(),
                options: vec![
                    QuizOption {
                        letter: 'A',
                        text: "allahu as-samad".to_string(),
                    },
                    QuizOption {
                        letter: 'B',
                        text: "lam yalid".to_string(),
                    },
                ],
                answer: 'A',
                explanation: None,
                reference: None,
            }],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_quiz_roundtrip_and_ownership() {
        let (store, user) = store_with_user("zaid").await;
        let quiz = sample_quiz(user.id);
        store.save_quiz(&quiz).await.unwrap();

        let loaded = store.get_quiz(quiz.id, user.id).await.unwrap();
        assert_eq!(loaded.questions, quiz.questions);
        assert_eq!(loaded.kind, QuizKind::NextAyah);

        assert!(matches!(
            store.get_quiz(quiz.id, Uuid::new_v4()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_attempt_history() {
        let (store, user) = store_with_user("safiya").await;
        let quiz = sample_quiz(user.id);
        store.save_quiz(&quiz).await.unwrap();

        let report = grade(
            &quiz.questions,
            &[SubmittedAnswer {
                question_index: 0,
                choice: 'a',
            }],
        )
        .unwrap();
        store.save_attempt(&quiz, &report).await.unwrap();
        let wrong = grade(&quiz.questions, &[]).unwrap();
        store.save_attempt(&quiz, &wrong).await.unwrap();

        let attempts = store.list_attempts(user.id, 10).await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].correct, 0);
        assert_eq!(attempts[1].percentage, 100.0);
        assert_eq!(attempts[1].report.results[0].choice, Some('A'));

        assert_eq!(store.list_attempts(user.id, 1).await.unwrap().len(), 1);
    }
}
