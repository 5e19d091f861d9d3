//! Interviews, their turns and their reports.
//!
//! Turns are stored with a zero-based `seq` equal to their position in the
//! transcript, so loading them `ORDER BY seq` rebuilds the transcript exactly.

use chrono::{DateTime, Utc};
use insight_types::{InterviewReport, Speaker, Transcript, Turn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreError;
use crate::{parse_time, parse_uuid};

const INTERVIEWS: &str = "interviews";
const TURNS: &str = "interview_turns";
const REPORTS: &str = "interview_reports";

/// Interview row without its transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRecord {
    pub id: Uuid,
    pub participant_id: Option<Uuid>,
    pub theme: String,
    pub turn_count: u32,
    pub terminated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An interview together with its full transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredInterview {
    pub record: InterviewRecord,
    pub transcript: Transcript,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredReport {
    pub report: InterviewReport,
    pub artifact_path: Option<String>,
}

pub fn create_interview(
    conn: &Connection,
    id: &Uuid,
    participant_id: Option<&Uuid>,
    theme: &str,
    created_at: DateTime<Utc>,
) -> Result<(), StoreError> {
    let created_at = created_at.to_rfc3339();
    conn.execute(
        "INSERT INTO interviews (id, participant_id, theme, turn_count, terminated, created_at, updated_at)
         VALUES (?1, ?2, ?3, 0, 0, ?4, ?4)",
        params![
            id.to_string(),
            participant_id.map(Uuid::to_string),
            theme,
            created_at,
        ],
    )?;
    Ok(())
}

/// Stores one turn at position `seq`.
pub fn append_turn(
    conn: &Connection,
    interview_id: &Uuid,
    seq: u32,
    turn: &Turn,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO interview_turns (interview_id, seq, speaker, text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            interview_id.to_string(),
            seq,
            turn.speaker.label(),
            turn.text,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Stores every turn of `transcript` that is not stored yet and returns how
/// many were added. Runs in one transaction.
pub fn sync_transcript(
    conn: &Connection,
    interview_id: &Uuid,
    transcript: &Transcript,
) -> Result<usize, StoreError> {
    let tx = conn.unchecked_transaction()?;
    let stored: usize = tx.query_row(
        "SELECT COUNT(*) FROM interview_turns WHERE interview_id = ?1",
        [interview_id.to_string()],
        |row| row.get(0),
    )?;
    let mut added = 0;
    for (seq, turn) in transcript.iter().enumerate().skip(stored) {
        append_turn(&tx, interview_id, seq as u32, turn)?;
        added += 1;
    }
    tx.commit()?;
    Ok(added)
}

/// Records the counter and terminated flag after a turn.
pub fn update_progress(
    conn: &Connection,
    interview_id: &Uuid,
    turn_count: u32,
    terminated: bool,
) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE interviews SET turn_count = ?2, terminated = ?3, updated_at = ?4 WHERE id = ?1",
        params![
            interview_id.to_string(),
            turn_count,
            terminated,
            Utc::now().to_rfc3339(),
        ],
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound(format!("interview {interview_id}")));
    }
    Ok(())
}

type RecordRow = (String, Option<String>, String, u32, bool, String, String);

const RECORD_COLUMNS: &str =
    "id, participant_id, theme, turn_count, terminated, created_at, updated_at";

fn read_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn into_record(row: RecordRow) -> Result<InterviewRecord, StoreError> {
    let (id, participant_id, theme, turn_count, terminated, created_at, updated_at) = row;
    Ok(InterviewRecord {
        id: parse_uuid(INTERVIEWS, &id)?,
        participant_id: participant_id
            .map(|p| parse_uuid(INTERVIEWS, &p))
            .transpose()?,
        theme,
        turn_count,
        terminated,
        created_at: parse_time(INTERVIEWS, &created_at)?,
        updated_at: parse_time(INTERVIEWS, &updated_at)?,
    })
}

fn load_transcript(conn: &Connection, interview_id: &Uuid) -> Result<Transcript, StoreError> {
    let mut stmt = conn
        .prepare("SELECT speaker, text FROM interview_turns WHERE interview_id = ?1 ORDER BY seq")?;
    let rows = stmt.query_map([interview_id.to_string()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut turns = Vec::new();
    for row in rows {
        let (speaker, text) = row?;
        let speaker = Speaker::from_label(&speaker)
            .ok_or_else(|| StoreError::corrupt(TURNS, format!("unknown speaker {speaker:?}")))?;
        turns.push(Turn { speaker, text });
    }
    Ok(Transcript::from_turns(turns))
}

pub fn load_interview(conn: &Connection, id: &Uuid) -> Result<StoredInterview, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM interviews WHERE id = ?1"),
            [id.to_string()],
            read_record_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("interview {id}")))?;

    Ok(StoredInterview {
        record: into_record(row)?,
        transcript: load_transcript(conn, id)?,
    })
}

/// Newest first. With `participant_id`, only that participant's interviews.
pub fn list_interviews(
    conn: &Connection,
    participant_id: Option<&Uuid>,
) -> Result<Vec<InterviewRecord>, StoreError> {
    let rows: Vec<RecordRow> = match participant_id {
        Some(participant) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM interviews
                 WHERE participant_id = ?1 ORDER BY created_at DESC"
            ))?;
            let rows = stmt.query_map([participant.to_string()], read_record_row)?;
            rows.collect::<rusqlite::Result<_>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM interviews ORDER BY created_at DESC"
            ))?;
            let rows = stmt.query_map([], read_record_row)?;
            rows.collect::<rusqlite::Result<_>>()?
        }
    };
    rows.into_iter().map(into_record).collect()
}

/// Stores the report, replacing an earlier one for the same interview.
pub fn save_report(
    conn: &Connection,
    report: &InterviewReport,
    artifact_path: Option<&str>,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO interview_reports
            (interview_id, theme, summary_text, generated_at, artifact_path)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            report.session_id.to_string(),
            report.theme,
            report.summary_text,
            report.generated_at.to_rfc3339(),
            artifact_path,
        ],
    )?;
    Ok(())
}

/// The report with its source transcript reloaded from the turns table.
pub fn get_report(conn: &Connection, interview_id: &Uuid) -> Result<StoredReport, StoreError> {
    let (theme, summary_text, generated_at, artifact_path) = conn
        .query_row(
            "SELECT theme, summary_text, generated_at, artifact_path
             FROM interview_reports WHERE interview_id = ?1",
            [interview_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("report for interview {interview_id}")))?;

    Ok(StoredReport {
        report: InterviewReport {
            session_id: *interview_id,
            theme,
            summary_text,
            source_transcript: load_transcript(conn, interview_id)?,
            generated_at: parse_time(REPORTS, &generated_at)?,
        },
        artifact_path,
    })
}
