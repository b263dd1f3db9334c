//! User feedback.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    enum_col, uuid_col, Feedback, FeedbackCategory, FeedbackStatus, Store, StoreError, StoreResult,
};

pub const MAX_FEEDBACK_CHARS: usize = 2000;

const FEEDBACK_COLUMNS: &str =
    "id, user_id, category, rating, message, status, created_at, updated_at";

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        category: enum_col(row, 2, FeedbackCategory::parse)?,
        rating: row.get(3)?,
        message: row.get(4)?,
        status: enum_col(row, 5, FeedbackStatus::parse)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Store {
    pub async fn create_feedback(
        &self,
        user_id: Uuid,
        category: FeedbackCategory,
        rating: u8,
        message: &str,
    ) -> StoreResult<Feedback> {
        if !(1..=5).contains(&rating) {
            return Err(StoreError::Invalid("rating must be between 1 and 5".to_string()));
        }
        let message = message.trim();
        if message.is_empty() || message.chars().count() > MAX_FEEDBACK_CHARS {
            return Err(StoreError::Invalid(format!(
                "message must be 1-{} characters",
                MAX_FEEDBACK_CHARS
            )));
        }

        let now = Utc::now();
        let feedback = Feedback {
            id: Uuid::new_v4(),
            user_id,
            category,
            rating,
            message: message.to_string(),
            status: FeedbackStatus::Open,
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|c| {
            c.execute(
                "INSERT INTO feedback (id, user_id, category, rating, message, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    feedback.id.to_string(),
                    user_id.to_string(),
                    category.as_str(),
                    rating,
                    feedback.message,
                    feedback.status.as_str(),
                    now,
                    now,
                ],
            )?;
            Ok(())
        })
        .await?;

        tracing::info!(user = %user_id, category = %category, rating, "Feedback submitted");
        Ok(feedback)
    }

    pub async fn list_feedback_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Feedback>> {
        self.with_conn(|c| {
            let mut stmt = c.prepare(&format!(
                "SELECT {} FROM feedback WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
                FEEDBACK_COLUMNS
            ))?;
            let rows = stmt.query_map(params![user_id.to_string()], feedback_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    /// All feedback, optionally filtered by status. Newest first.
    pub async fn list_all_feedback(
        &self,
        status: Option<FeedbackStatus>,
    ) -> StoreResult<Vec<Feedback>> {
        self.with_conn(|c| {
            let mut stmt = c.prepare(&format!(
                "SELECT {} FROM feedback WHERE (?1 IS NULL OR status = ?1) ORDER BY created_at DESC, rowid DESC",
                FEEDBACK_COLUMNS
            ))?;
            let rows = stmt.query_map(params![status.map(|s| s.as_str())], feedback_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    pub async fn set_feedback_status(
        &self,
        id: Uuid,
        status: FeedbackStatus,
    ) -> StoreResult<Feedback> {
        self.with_conn(|c| {
            let changed = c.execute(
                "UPDATE feedback SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.to_string(), status.as_str(), Utc::now()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("feedback {}", id)));
            }
            c.query_row(
                &format!("SELECT {} FROM feedback WHERE id = ?1", FEEDBACK_COLUMNS),
                params![id.to_string()],
                feedback_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("feedback {}", id)))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::store_with_user;

    #[tokio::test]
    async fn test_submit_and_list() {
        let (store, user) = store_with_user("khalid").await;
        store
            .create_feedback(user.id, FeedbackCategory::Bug, 2, "quiz froze")
            .await
            .unwrap();
        let second = store
            .create_feedback(user.id, FeedbackCategory::Feature, 5, "  more reciters  ")
            .await
            .unwrap();
        assert_eq!(second.message, "more reciters");

        let mine = store.list_feedback_for_user(user.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|f| f.status == FeedbackStatus::Open));

        store
            .set_feedback_status(second.id, FeedbackStatus::Resolved)
            .await
            .unwrap();
        let open = store
            .list_all_feedback(Some(FeedbackStatus::Open))
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].category, FeedbackCategory::Bug);
        assert_eq!(store.list_all_feedback(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_validation() {
        let (store, user) = store_with_user("huda").await;
        assert!(matches!(
            store.create_feedback(user.id, FeedbackCategory::General, 0, "x").await,
            Err(StoreError::Invalid(_))
        ));
        assert!(matches!(
            store.create_feedback(user.id, FeedbackCategory::General, 3, "   ").await,
            Err(StoreError::Invalid(_))
        ));
        let long = "a".repeat(MAX_FEEDBACK_CHARS + 1);
        assert!(matches!(
            store.create_feedback(user.id, FeedbackCategory::General, 3, &long).await,
            Err(StoreError::Invalid(_))
        ));
        assert!(matches!(
            store
                .set_feedback_status(Uuid::new_v4(), FeedbackStatus::Reviewed)
                .await,
            Err(StoreError::NotFound(_))
        ));
    }
}
