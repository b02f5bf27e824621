//! Matchmaking queue rows, ordered by a monotonically increasing `seq`.

use crate::storage::database::Database;
use crate::storage::errors::Result;
use crate::storage::models::QueueEntry;
use rusqlite::{Connection, OptionalExtension, Row};

/// Insert or refresh an entry; a refreshed entry moves to the back of the queue
pub fn upsert_entry(conn: &Connection, participant_id: &str, rating: i32) -> Result<QueueEntry> {
    let now = Database::current_timestamp();
    conn.execute(
        r#"
        INSERT INTO matchmaking_queue (participant_id, rating, enqueued_at, seq)
        VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(seq), 0) + 1 FROM matchmaking_queue))
        ON CONFLICT(participant_id) DO UPDATE SET
            rating = excluded.rating,
            enqueued_at = excluded.enqueued_at,
            seq = excluded.seq
        "#,
        (participant_id, rating, now),
    )?;

    Ok(conn.query_row(
        "SELECT participant_id, rating, enqueued_at, seq FROM matchmaking_queue WHERE participant_id = ?1",
        [participant_id],
        entry_from_row,
    )?)
}

/// Remove an entry, reporting whether one existed
pub fn remove_entry(conn: &Connection, participant_id: &str) -> Result<bool> {
    let rows = conn.execute(
        "DELETE FROM matchmaking_queue WHERE participant_id = ?1",
        [participant_id],
    )?;
    Ok(rows > 0)
}

/// Read and delete the two oldest entries.
///
/// Returns an empty vector, with nothing deleted, when fewer than two are queued.
/// Must run inside a transaction for the read and delete to be one step.
pub fn claim_oldest_pair(conn: &Connection) -> Result<Vec<QueueEntry>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT participant_id, rating, enqueued_at, seq
        FROM matchmaking_queue
        ORDER BY seq ASC
        LIMIT 2
        "#,
    )?;
    let entries = stmt
        .query_map([], entry_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if entries.len() < 2 {
        return Ok(Vec::new());
    }

    for entry in &entries {
        remove_entry(conn, &entry.participant_id)?;
    }

    Ok(entries)
}

pub fn queue_len(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM matchmaking_queue", [], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}

/// 1-based position of a participant in the queue
pub fn queue_position(conn: &Connection, participant_id: &str) -> Result<Option<usize>> {
    let seq: Option<i64> = conn
        .query_row(
            "SELECT seq FROM matchmaking_queue WHERE participant_id = ?1",
            [participant_id],
            |row| row.get(0),
        )
        .optional()?;

    match seq {
        Some(seq) => {
            let ahead: i64 = conn.query_row(
                "SELECT COUNT(*) FROM matchmaking_queue WHERE seq < ?1",
                [seq],
                |row| row.get(0),
            )?;
            Ok(Some(ahead as usize + 1))
        }
        None => Ok(None),
    }
}

fn entry_from_row(row: &Row) -> rusqlite::Result<QueueEntry> {
    Ok(QueueEntry {
        participant_id: row.get("participant_id")?,
        rating: row.get("rating")?,
        enqueued_at: row.get("enqueued_at")?,
        seq: row.get("seq")?,
    })
}
