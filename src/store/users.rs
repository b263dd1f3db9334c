//! User accounts and profiles.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    enum_col, map_unique, uuid_col, NewUser, ProfileUpdate, Store, StoreError, StoreResult, User,
    UserRole,
};

pub const DEFAULT_DAILY_GOAL: u32 = 5;
pub const MAX_DAILY_GOAL: u32 = 604;
pub const MAX_DISPLAY_NAME_CHARS: usize = 64;
pub const MAX_BIO_CHARS: usize = 500;

const USER_COLUMNS: &str = "id, username, email, password_hash, display_name, bio, \
                            daily_goal_ayahs, role, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_col(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        display_name: row.get(4)?,
        bio: row.get(5)?,
        daily_goal_ayahs: row.get(6)?,
        role: enum_col(row, 7, UserRole::parse)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Trim an optional free-text field, turning blank into `None`.
fn clean_text(value: String, max_chars: usize, field: &str) -> StoreResult<Option<String>> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max_chars {
        return Err(StoreError::Invalid(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(Some(trimmed.to_string()).filter(|s| !s.is_empty()))
}

impl Store {
    pub async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            display_name: new.display_name,
            bio: None,
            daily_goal_ayahs: DEFAULT_DAILY_GOAL,
            role: new.role,
            created_at: now,
            updated_at: now,
        };

        self.with_conn(|c| {
            c.execute(
                "INSERT INTO users (id, username, email, password_hash, display_name, bio,
                                    daily_goal_ayahs, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    user.id.to_string(),
                    user.username,
                    user.email,
                    user.password_hash,
                    user.display_name,
                    user.bio,
                    user.daily_goal_ayahs,
                    user.role.as_str(),
                    user.created_at,
                    user.updated_at,
                ],
            )
            .map_err(|e| map_unique(e, "username or email"))?;
            Ok(())
        })
        .await?;

        tracing::info!(user = %user.id, username = %user.username, "Created user");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        self.with_conn(|c| {
            c.query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id.to_string()],
                user_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
        })
        .await
    }

    /// Find a user by username or email (case-insensitive).
    pub async fn find_user_by_login(&self, login: &str) -> StoreResult<Option<User>> {
        let login = login.trim();
        self.with_conn(|c| {
            Ok(c.query_row(
                &format!(
                    "SELECT {} FROM users WHERE username = ?1 OR email = ?1",
                    USER_COLUMNS
                ),
                params![login],
                user_from_row,
            )
            .optional()?)
        })
        .await
    }

    pub async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.with_conn(|c| {
            Ok(c.query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                params![username],
                user_from_row,
            )
            .optional()?)
        })
        .await
    }

    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<User> {
        let mut user = self.get_user(id).await?;

        if let Some(name) = update.display_name {
            user.display_name = clean_text(name, MAX_DISPLAY_NAME_CHARS, "display_name")?;
        }
        if let Some(bio) = update.bio {
            user.bio = clean_text(bio, MAX_BIO_CHARS, "bio")?;
        }
        if let Some(goal) = update.daily_goal_ayahs {
            if goal == 0 || goal > MAX_DAILY_GOAL {
                return Err(StoreError::Invalid(format!(
                    "daily_goal_ayahs must be between 1 and {}",
                    MAX_DAILY_GOAL
                )));
            }
            user.daily_goal_ayahs = goal;
        }
        user.updated_at = Utc::now();

        self.with_conn(|c| {
            c.execute(
                "UPDATE users SET display_name = ?2, bio = ?3, daily_goal_ayahs = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    user.display_name,
                    user.bio,
                    user.daily_goal_ayahs,
                    user.updated_at,
                ],
            )?;
            Ok(())
        })
        .await?;

        Ok(user)
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let changed = self
            .with_conn(|c| {
                Ok(c.execute(
                    "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
                    params![id.to_string(), password_hash, Utc::now()],
                )?)
            })
            .await?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    /// Delete a user; sessions, attempts, progress and feedback go with it.
    pub async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let changed = self
            .with_conn(|c| Ok(c.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?))
            .await?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("user {}", id)));
        }
        tracing::info!(user = %id, "Deleted user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::grade;
    use crate::store::quizzes::tests::sample_quiz;
    use crate::store::tests::store_with_user;
    use crate::store::{FeedbackCategory, MistakeKind, SessionMode};

    #[tokio::test]
    async fn test_create_and_lookup() {
        let (store, user) = store_with_user("amina").await;
        assert_eq!(user.daily_goal_ayahs, DEFAULT_DAILY_GOAL);

        let by_id = store.get_user(user.id).await.unwrap();
        assert_eq!(by_id.username, "amina");

        let by_email = store.find_user_by_login("AMINA@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, user.id);
        let by_name = store.find_user_by_login(" Amina ").await.unwrap();
        assert_eq!(by_name.unwrap().id, user.id);

        assert!(store.find_user_by_login("nobody").await.unwrap().is_none());
        assert!(matches!(
            store.get_user(Uuid::new_v4()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (store, _) = store_with_user("yusuf").await;
        let err = store
            .create_user(NewUser {
                username: "YUSUF".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "h".to_string(),
                display_name: None,
                role: UserRole::User,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_profile_update() {
        let (store, user) = store_with_user("maryam").await;
        let updated = store
            .update_profile(
                user.id,
                ProfileUpdate {
                    display_name: Some("  Maryam A.  ".to_string()),
                    bio: None,
                    daily_goal_ayahs: Some(10),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Maryam A."));
        assert_eq!(updated.daily_goal_ayahs, 10);

        let cleared = store
            .update_profile(
                user.id,
                ProfileUpdate {
                    display_name: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.display_name.is_none());
        assert_eq!(cleared.daily_goal_ayahs, 10);

        let err = store
            .update_profile(
                user.id,
                ProfileUpdate {
                    daily_goal_ayahs: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (store, user) = store_with_user("ibrahim").await;
        store.delete_user(user.id).await.unwrap();
        assert!(matches!(
            store.delete_user(user.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    async fn owned_rows(store: &Store, user_id: Uuid) -> [i64; 6] {
        let id = user_id.to_string();
        store
            .with_conn(|c| {
                let count = |sql: &str| -> rusqlite::Result<i64> {
                    c.query_row(sql, params![id], |r| r.get(0))
                };
                Ok([
                    count("SELECT COUNT(*) FROM memorized_ayahs WHERE user_id = ?1")?,
                    count("SELECT COUNT(*) FROM recitation_sessions WHERE user_id = ?1")?,
                    count(
                        "SELECT COUNT(*) FROM recitation_mistakes m
                         JOIN recitation_sessions s ON s.id = m.session_id WHERE s.user_id = ?1",
                    )?,
                    count("SELECT COUNT(*) FROM quizzes WHERE user_id = ?1")?,
                    count("SELECT COUNT(*) FROM quiz_attempts WHERE user_id = ?1")?,
                    count("SELECT COUNT(*) FROM feedback WHERE user_id = ?1")?,
                ])
            })
            .await
            .unwrap()
    }

    async fn add_activity(store: &Store, user_id: Uuid) {
        let session = store
            .start_session(user_id, 112, None, None, SessionMode::Memorize)
            .await
            .unwrap();
        store
            .record_mistake(user_id, session.id, 3, MistakeKind::Tajweed, None)
            .await
            .unwrap();
        store.finish_session(user_id, session.id, Some(5)).await.unwrap();

        let quiz = sample_quiz(user_id);
        store.save_quiz(&quiz).await.unwrap();
        let report = grade(&quiz.questions, &[]).unwrap();
        store.save_attempt(&quiz, &report).await.unwrap();

        store
            .create_feedback(user_id, FeedbackCategory::General, 5, "jazakallahu khayran")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_user_removes_owned_records() {
        let (store, user) = store_with_user("yusuf").await;
        let other = store
            .create_user(NewUser {
                username: "yaqub".to_string(),
                email: "yaqub@example.com".to_string(),
                password_hash: "hash".to_string(),
                display_name: None,
                role: UserRole::User,
            })
            .await
            .unwrap();
        add_activity(&store, user.id).await;
        add_activity(&store, other.id).await;
        assert_eq!(owned_rows(&store, user.id).await, [4, 1, 1, 1, 1, 1]);

        store.delete_user(user.id).await.unwrap();
        assert_eq!(owned_rows(&store, user.id).await, [0; 6]);
        assert_eq!(owned_rows(&store, other.id).await, [4, 1, 1, 1, 1, 1]);
    }
}
