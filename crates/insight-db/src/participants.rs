//! Participant profiles.

use chrono::{DateTime, Utc};
use insight_types::{Gender, ParticipantProfile};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::StoreError;
use crate::parse_time;

const TABLE: &str = "participants";

/// A stored profile with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredParticipant {
    pub id: Uuid,
    pub profile: ParticipantProfile,
    pub created_at: DateTime<Utc>,
}

/// Inserts `profile` and returns its new id. The caller validates first.
pub fn create_participant(
    conn: &Connection,
    profile: &ParticipantProfile,
) -> Result<Uuid, StoreError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO participants (id, display_name, age, gender, occupation, email, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id.to_string(),
            profile.display_name,
            profile.age,
            profile.gender.label(),
            profile.occupation,
            profile.email,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(id)
}

pub fn get_participant(conn: &Connection, id: &Uuid) -> Result<StoredParticipant, StoreError> {
    let row = conn
        .query_row(
            "SELECT display_name, age, gender, occupation, email, created_at
             FROM participants WHERE id = ?1",
            [id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u8>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("participant {id}")))?;

    let (display_name, age, gender, occupation, email, created_at) = row;
    let gender = Gender::from_label(&gender)
        .ok_or_else(|| StoreError::corrupt(TABLE, format!("unknown gender {gender:?}")))?;

    Ok(StoredParticipant {
        id: *id,
        profile: ParticipantProfile {
            display_name,
            age,
            gender,
            occupation,
            email,
        },
        created_at: parse_time(TABLE, &created_at)?,
    })
}
