//! Recitation sessions, mistakes and memorization progress.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{
    enum_col, uuid_col, Mistake, MistakeCounts, MistakeKind, Progress, RecitationSession,
    RecitationStats, SessionMode, SessionStatus, Store, StoreError, StoreResult, SurahProgress,
};
use crate::quran::{resolve_range, SURAHS, TOTAL_AYAHS};

/// A memorize session with at most this many mistakes marks its ayahs memorized.
pub const MEMORIZE_MAX_MISTAKES: usize = 2;
pub const MAX_NOTE_CHARS: usize = 500;

const SESSION_COLUMNS: &str = "id, user_id, surah, from_ayah, to_ayah, mode, status, \
                               self_rating, started_at, ended_at, duration_secs";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<RecitationSession> {
    Ok(RecitationSession {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        surah: row.get(2)?,
        from_ayah: row.get(3)?,
        to_ayah: row.get(4)?,
        mode: enum_col(row, 5, SessionMode::parse)?,
        status: enum_col(row, 6, SessionStatus::parse)?,
        self_rating: row.get(7)?,
        started_at: row.get(8)?,
        ended_at: row.get(9)?,
        duration_secs: row.get(10)?,
        mistakes: Vec::new(),
    })
}

fn mistake_from_row(row: &Row<'_>) -> rusqlite::Result<Mistake> {
    Ok(Mistake {
        id: row.get(0)?,
        ayah: row.get(1)?,
        kind: enum_col(row, 2, MistakeKind::parse)?,
        note: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn load_mistakes(c: &Connection, session_id: Uuid) -> StoreResult<Vec<Mistake>> {
    let mut stmt = c.prepare(
        "SELECT id, ayah, kind, note, created_at FROM recitation_mistakes
         WHERE session_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![session_id.to_string()], mistake_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Load a session owned by `user_id`, mistakes included.
fn load_session(c: &Connection, id: Uuid, user_id: Uuid) -> StoreResult<RecitationSession> {
    let mut session = c
        .query_row(
            &format!(
                "SELECT {} FROM recitation_sessions WHERE id = ?1 AND user_id = ?2",
                SESSION_COLUMNS
            ),
            params![id.to_string(), user_id.to_string()],
            session_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("session {}", id)))?;
    session.mistakes = load_mistakes(c, id)?;
    Ok(session)
}

fn ensure_in_progress(session: &RecitationSession) -> StoreResult<()> {
    if session.status != SessionStatus::InProgress {
        return Err(StoreError::Conflict(format!(
            "session {} is already {}",
            session.id, session.status
        )));
    }
    Ok(())
}

/// Number of consecutive days with activity, ending today or yesterday.
///
/// `dates` may be unsorted and contain duplicates.
pub fn current_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut days: Vec<NaiveDate> = dates.iter().copied().filter(|d| *d <= today).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut expected = match days.first() {
        Some(&d) if d == today || d == today - Duration::days(1) => d,
        _ => return 0,
    };
    let mut streak = 0;
    for day in days {
        if day != expected {
            break;
        }
        streak += 1;
        expected = day - Duration::days(1);
    }
    streak
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl Store {
    pub async fn start_session(
        &self,
        user_id: Uuid,
        surah: u16,
        from_ayah: Option<u16>,
        to_ayah: Option<u16>,
        mode: SessionMode,
    ) -> StoreResult<RecitationSession> {
        let (from, to) = resolve_range(surah, from_ayah, to_ayah)
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        let session = RecitationSession {
            id: Uuid::new_v4(),
            user_id,
            surah,
            from_ayah: from,
            to_ayah: to,
            mode,
            status: SessionStatus::InProgress,
            self_rating: None,
            started_at: Utc::now(),
            ended_at: None,
            duration_secs: None,
            mistakes: Vec::new(),
        };

        self.with_conn(|c| {
            c.execute(
                "INSERT INTO recitation_sessions (id, user_id, surah, from_ayah, to_ayah, mode, status, started_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    session.id.to_string(),
                    user_id.to_string(),
                    surah,
                    from,
                    to,
                    mode.as_str(),
                    session.status.as_str(),
                    session.started_at,
                ],
            )?;
            Ok(())
        })
        .await?;

        tracing::info!(user = %user_id, session = %session.id, surah, from, to, %mode, "Recitation started");
        Ok(session)
    }

    pub async fn record_mistake(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        ayah: u16,
        kind: MistakeKind,
        note: Option<String>,
    ) -> StoreResult<Mistake> {
        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if note.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_CHARS) {
            return Err(StoreError::Invalid(format!(
                "note must be at most {} characters",
                MAX_NOTE_CHARS
            )));
        }

        self.with_conn(|c| {
            let session = load_session(c, session_id, user_id)?;
            ensure_in_progress(&session)?;
            if ayah < session.from_ayah || ayah > session.to_ayah {
                return Err(StoreError::Invalid(format!(
                    "ayah {} is outside the session range {}-{}",
                    ayah, session.from_ayah, session.to_ayah
                )));
            }

            let created_at = Utc::now();
            c.execute(
                "INSERT INTO recitation_mistakes (session_id, ayah, kind, note, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![session_id.to_string(), ayah, kind.as_str(), note, created_at],
            )?;
            Ok(Mistake {
                id: c.last_insert_rowid(),
                ayah,
                kind,
                note,
                created_at,
            })
        })
        .await
    }

    /// Complete a session. Clean memorize sessions mark their ayahs memorized.
    pub async fn finish_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        self_rating: Option<u8>,
    ) -> StoreResult<RecitationSession> {
        if let Some(rating) = self_rating {
            if !(1..=5).contains(&rating) {
                return Err(StoreError::Invalid(
                    "self_rating must be between 1 and 5".to_string(),
                ));
            }
        }

        let session = self
            .with_conn(|c| {
                let mut session = load_session(c, session_id, user_id)?;
                ensure_in_progress(&session)?;

                let ended_at = Utc::now();
                let duration = (ended_at - session.started_at).num_seconds().max(0);
                let memorized = session.mode == SessionMode::Memorize
                    && session.mistakes.len() <= MEMORIZE_MAX_MISTAKES;

                let tx = c.transaction()?;
                tx.execute(
                    "UPDATE recitation_sessions
                     SET status = ?2, self_rating = ?3, ended_at = ?4, duration_secs = ?5
                     WHERE id = ?1",
                    params![
                        session_id.to_string(),
                        SessionStatus::Completed.as_str(),
                        self_rating,
                        ended_at,
                        duration,
                    ],
                )?;
                if memorized {
                    let mut stmt = tx.prepare(
                        "INSERT OR IGNORE INTO memorized_ayahs (user_id, surah, ayah, memorized_at)
                         VALUES (?1, ?2, ?3, ?4)",
                    )?;
                    for ayah in session.from_ayah..=session.to_ayah {
                        stmt.execute(params![user_id.to_string(), session.surah, ayah, ended_at])?;
                    }
                }
                tx.commit()?;

                session.status = SessionStatus::Completed;
                session.self_rating = self_rating;
                session.ended_at = Some(ended_at);
                session.duration_secs = Some(duration);
                Ok(session)
            })
            .await?;

        tracing::info!(
            user = %user_id,
            session = %session_id,
            mistakes = session.mistakes.len(),
            duration_secs = session.duration_secs,
            "Recitation finished"
        );
        Ok(session)
    }

    pub async fn abandon_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> StoreResult<RecitationSession> {
        self.with_conn(|c| {
            let mut session = load_session(c, session_id, user_id)?;
            ensure_in_progress(&session)?;
            let ended_at = Utc::now();
            c.execute(
                "UPDATE recitation_sessions SET status = ?2, ended_at = ?3 WHERE id = ?1",
                params![
                    session_id.to_string(),
                    SessionStatus::Abandoned.as_str(),
                    ended_at
                ],
            )?;
            session.status = SessionStatus::Abandoned;
            session.ended_at = Some(ended_at);
            Ok(session)
        })
        .await
    }

    pub async fn get_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> StoreResult<RecitationSession> {
        self.with_conn(|c| load_session(c, session_id, user_id))
            .await
    }

    /// Most recent sessions first, each with its mistakes.
    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<RecitationSession>> {
        self.with_conn(|c| {
            let mut stmt = c.prepare(&format!(
                "SELECT {} FROM recitation_sessions WHERE user_id = ?1
                 ORDER BY started_at DESC, rowid DESC LIMIT ?2",
                SESSION_COLUMNS
            ))?;
            let mut sessions = stmt
                .query_map(params![user_id.to_string(), limit as i64], session_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for session in &mut sessions {
                session.mistakes = load_mistakes(c, session.id)?;
            }
            Ok(sessions)
        })
        .await
    }

    pub async fn progress(&self, user_id: Uuid) -> StoreResult<Progress> {
        let counts: BTreeMap<u16, u32> = self
            .with_conn(|c| {
                let mut stmt = c.prepare(
                    "SELECT surah, COUNT(*) FROM memorized_ayahs WHERE user_id = ?1 GROUP BY surah",
                )?;
                let rows = stmt.query_map(params![user_id.to_string()], |row| {
                    Ok((row.get::<_, u16>(0)?, row.get::<_, u32>(1)?))
                })?;
                Ok(rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()?)
            })
            .await?;

        let surahs: Vec<SurahProgress> = SURAHS
            .iter()
            .map(|info| SurahProgress {
                surah: info.number,
                name: info.name_transliterated,
                memorized: counts.get(&info.number).copied().unwrap_or(0),
                total: u32::from(info.ayah_count),
            })
            .collect();
        let memorized: u32 = counts.values().sum();

        Ok(Progress {
            memorized_ayahs: memorized,
            total_ayahs: TOTAL_AYAHS,
            percentage: round1(f64::from(memorized) * 100.0 / f64::from(TOTAL_AYAHS)),
            surahs,
        })
    }

    pub async fn recitation_stats(&self, user_id: Uuid) -> StoreResult<RecitationStats> {
        self.recitation_stats_at(user_id, Utc::now()).await
    }

    async fn recitation_stats_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<RecitationStats> {
        self.with_conn(|c| {
            let mut stats = RecitationStats::default();
            let mut active_days = Vec::new();

            let mut stmt = c.prepare(
                "SELECT status, from_ayah, to_ayah, duration_secs, ended_at
                 FROM recitation_sessions WHERE user_id = ?1",
            )?;
            let rows = stmt.query_map(params![user_id.to_string()], |row| {
                Ok((
                    enum_col(row, 0, SessionStatus::parse)?,
                    row.get::<_, u16>(1)?,
                    row.get::<_, u16>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<DateTime<Utc>>>(4)?,
                ))
            })?;
            for row in rows {
                let (status, from, to, duration, ended_at) = row?;
                stats.total_sessions += 1;
                if status != SessionStatus::Completed {
                    continue;
                }
                stats.completed_sessions += 1;
                stats.ayahs_recited += u32::from(to - from) + 1;
                stats.total_duration_secs += duration.unwrap_or(0);
                if let Some(ended) = ended_at {
                    active_days.push(ended.date_naive());
                }
            }

            let mut stmt = c.prepare(
                "SELECT m.kind, COUNT(*) FROM recitation_mistakes m
                 JOIN recitation_sessions s ON s.id = m.session_id
                 WHERE s.user_id = ?1 GROUP BY m.kind",
            )?;
            let rows = stmt.query_map(params![user_id.to_string()], |row| {
                Ok((enum_col(row, 0, MistakeKind::parse)?, row.get::<_, u32>(1)?))
            })?;
            let mut mistakes = MistakeCounts::default();
            for row in rows {
                let (kind, n) = row?;
                mistakes.add(kind, n);
            }
            stats.mistakes = mistakes;
            stats.current_streak_days = current_streak(&active_days, now.date_naive());
            Ok(stats)
        })
        .await
    }
}
