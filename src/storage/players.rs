use crate::storage::database::Database;
use crate::storage::errors::{Result, StorageError};
use crate::storage::models::PlayerRecord;
use rusqlite::{Connection, OptionalExtension, Row};

/// Fetch a player, creating the row at `default_rating` on first sight
pub fn ensure_player(
    conn: &Connection,
    participant_id: &str,
    default_rating: i32,
) -> Result<PlayerRecord> {
    let now = Database::current_timestamp();
    conn.execute(
        r#"
        INSERT OR IGNORE INTO players (participant_id, rating, games_played, created_at, updated_at)
        VALUES (?1, ?2, 0, ?3, ?3)
        "#,
        (participant_id, default_rating.max(0), now),
    )?;

    find_player(conn, participant_id)?.ok_or_else(|| StorageError::player_not_found(participant_id))
}

pub fn find_player(conn: &Connection, participant_id: &str) -> Result<Option<PlayerRecord>> {
    Ok(conn
        .query_row(
            r#"
            SELECT participant_id, rating, games_played, created_at, updated_at
            FROM players
            WHERE participant_id = ?1
            "#,
            [participant_id],
            player_from_row,
        )
        .optional()?)
}

/// Store a finalized rating and count the finished game
pub fn record_result(conn: &Connection, participant_id: &str, new_rating: i32) -> Result<()> {
    let rows_affected = conn.execute(
        r#"
        UPDATE players
        SET rating = ?1, games_played = games_played + 1, updated_at = ?2
        WHERE participant_id = ?3
        "#,
        (new_rating.max(0), Database::current_timestamp(), participant_id),
    )?;

    if rows_affected == 0 {
        return Err(StorageError::player_not_found(participant_id));
    }

    Ok(())
}

impl Database {
    pub fn get_player(&self, participant_id: &str) -> Result<PlayerRecord> {
        self.with_connection(|conn| {
            find_player(conn, participant_id)?
                .ok_or_else(|| StorageError::player_not_found(participant_id))
        })
    }

    pub fn ensure_player(&self, participant_id: &str, default_rating: i32) -> Result<PlayerRecord> {
        self.with_connection(|conn| ensure_player(conn, participant_id, default_rating))
    }
}

fn player_from_row(row: &Row) -> rusqlite::Result<PlayerRecord> {
    Ok(PlayerRecord {
        participant_id: row.get("participant_id")?,
        rating: row.get("rating")?,
        games_played: row.get("games_played")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
