//! SQLite-based submission storage.
//!
//! Provides persistent storage for:
//! - Screened users and their assessment records
//! - Zone tallies for reporting
//! - A key-value store for host state (the CLI persists the wizard
//!   engine here between invocations)

use chrono::{DateTime, Utc};
use indoc::indoc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::wizard::Submission;

/// Zone tallies across stored assessments.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ZoneStats {
    pub total: u64,
    pub red: u64,
    pub amber: u64,
    pub green: u64,
    pub today_total: u64,
}

/// One stored assessment joined with its user, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRow {
    pub id: String,
    pub user_name: String,
    pub qr_no: String,
    pub location_code: String,
    pub zone: String,
    pub priority_code: String,
    pub created_at: DateTime<Utc>,
}

/// SQLite database for submission storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/nephroscreen/nephroscreen.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("nephroscreen.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests and ephemeral runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(indoc! {"
                CREATE TABLE IF NOT EXISTS users (
                    id         TEXT PRIMARY KEY,
                    name       TEXT NOT NULL,
                    age        INTEGER NOT NULL,
                    gender     TEXT NOT NULL,
                    phone      TEXT NOT NULL DEFAULT '',
                    language   TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS assessments (
                    id            TEXT PRIMARY KEY,
                    user_id       TEXT NOT NULL REFERENCES users(id),
                    qr_no         TEXT NOT NULL,
                    location_code TEXT NOT NULL,
                    unit          TEXT NOT NULL,
                    zone          TEXT NOT NULL,
                    priority_code TEXT NOT NULL,
                    answers_json  TEXT NOT NULL,
                    language      TEXT NOT NULL,
                    mode          TEXT NOT NULL,
                    created_at    TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_assessments_created_at ON assessments(created_at);
                CREATE INDEX IF NOT EXISTS idx_assessments_zone ON assessments(zone);
                CREATE INDEX IF NOT EXISTS idx_assessments_created_at_zone ON assessments(created_at, zone);
            "})
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Store one completed submission (user row plus assessment row).
    pub fn record_submission(&self, submission: &Submission) -> Result<(), DatabaseError> {
        let gender = match submission.user.gender {
            crate::wizard::Gender::Female => "female",
            crate::wizard::Gender::Male => "male",
            crate::wizard::Gender::Other => "other",
        };
        let language = match submission.language {
            crate::questionnaire::Language::English => "english",
            crate::questionnaire::Language::Tamil => "tamil",
        };
        let mode = match submission.mode {
            crate::wizard::ScreeningMode::SelfCheck => "self_check",
            crate::wizard::ScreeningMode::Relative => "relative",
        };
        let answers_json = serde_json::to_string(&submission.answers)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO users (id, name, age, gender, phone, language, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                submission.user_id,
                submission.user.name,
                submission.user.age,
                gender,
                submission.user.phone,
                language,
                submission.created_at.to_rfc3339(),
            ],
        )?;
        self.conn.execute(
            "INSERT INTO assessments
             (id, user_id, qr_no, location_code, unit, zone, priority_code,
              answers_json, language, mode, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                submission.id,
                submission.user_id,
                submission.qr_no,
                submission.location_code,
                submission.unit,
                submission.zone.label(),
                submission.code,
                answers_json,
                language,
                mode,
                submission.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Zone tallies across all stored assessments.
    pub fn zone_stats(&self) -> Result<ZoneStats, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT zone, COUNT(*) FROM assessments GROUP BY zone")?;

        let mut stats = ZoneStats::default();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;
        for row in rows {
            let (zone, count) = row?;
            stats.total += count;
            match zone.as_str() {
                "RED" => stats.red += count,
                "AMBER" => stats.amber += count,
                "GREEN" => stats.green += count,
                _ => {}
            }
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();
        stats.today_total = self.conn.query_row(
            "SELECT COUNT(*) FROM assessments WHERE created_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| row.get(0),
        )?;
        Ok(stats)
    }

    /// Most recent assessments, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AssessmentRow>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, u.name, a.qr_no, a.location_code, a.zone, a.priority_code, a.created_at
             FROM assessments a JOIN users u ON u.id = a.user_id
             ORDER BY a.created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, user_name, qr_no, location_code, zone, priority_code, created_at) = row?;
            let created_at = created_at
                .parse::<DateTime<Utc>>()
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            out.push(AssessmentRow {
                id,
                user_name,
                qr_no,
                location_code,
                zone,
                priority_code,
                created_at,
            });
        }
        Ok(out)
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::{ids, AnswerSet, Language};
    use crate::risk::Zone;
    use crate::wizard::{Gender, Identity, ScreeningMode};

    fn submission(zone: Zone) -> Submission {
        let mut answers = AnswerSet::new();
        answers.insert(ids::AGE_GROUP, "40-60");
        answers.insert(ids::COMORBIDITY, "No");
        Submission {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: uuid::Uuid::new_v4().to_string(),
            qr_no: "KN-0042".into(),
            location_code: "TN-CHN-01".into(),
            unit: "Mobile Camp A".into(),
            user: Identity {
                name: "Meena".into(),
                age: 52,
                gender: Gender::Female,
                phone: "9876543210".into(),
            },
            answers,
            zone,
            code: format!("KN-{}-070325-412", zone.label()),
            language: Language::Tamil,
            mode: ScreeningMode::SelfCheck,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn record_and_list_submissions() {
        let db = Database::open_in_memory().unwrap();
        db.record_submission(&submission(Zone::Amber)).unwrap();
        db.record_submission(&submission(Zone::Green)).unwrap();

        let rows = db.recent(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_name, "Meena");
        assert_eq!(rows[0].qr_no, "KN-0042");
    }

    #[test]
    fn zone_stats_tally_by_zone() {
        let db = Database::open_in_memory().unwrap();
        db.record_submission(&submission(Zone::Red)).unwrap();
        db.record_submission(&submission(Zone::Amber)).unwrap();
        db.record_submission(&submission(Zone::Amber)).unwrap();
        db.record_submission(&submission(Zone::Green)).unwrap();

        let stats = db.zone_stats().unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.red, 1);
        assert_eq!(stats.amber, 2);
        assert_eq!(stats.green, 1);
        assert_eq!(stats.today_total, 4);
    }

    #[test]
    fn kv_roundtrip_and_overwrite() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.kv_get("wizard_engine").unwrap(), None);

        db.kv_set("wizard_engine", "{\"a\":1}").unwrap();
        assert_eq!(
            db.kv_get("wizard_engine").unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        db.kv_set("wizard_engine", "{\"a\":2}").unwrap();
        assert_eq!(
            db.kv_get("wizard_engine").unwrap().as_deref(),
            Some("{\"a\":2}")
        );

        db.kv_delete("wizard_engine").unwrap();
        assert_eq!(db.kv_get("wizard_engine").unwrap(), None);
    }

    #[test]
    fn stored_answers_json_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let sub = submission(Zone::Green);
        db.record_submission(&sub).unwrap();

        let json: String = db
            .conn()
            .query_row(
                "SELECT answers_json FROM assessments WHERE id = ?1",
                params![sub.id],
                |row| row.get(0),
            )
            .unwrap();
        let restored: AnswerSet = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, sub.answers);
    }
}
