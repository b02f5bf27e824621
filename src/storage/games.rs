//! Game and move-history rows.
//!
//! The free functions take a bare `Connection` so callers can compose several of
//! them inside one `Database::with_transaction`.

use crate::storage::database::Database;
use crate::storage::errors::{Result, StorageError};
use crate::storage::models::{GameRecord, GameState, MoveRecord, Termination};
use rusqlite::{named_params, Connection, OptionalExtension, Row};

const GAME_COLUMNS: &str = "id, white_id, black_id, status, result, winner_id, current_fen, \
                            created_at, updated_at, finished_at";

/// Insert a fresh active game
pub fn insert_game(
    conn: &Connection,
    game_id: &str,
    white_id: &str,
    black_id: &str,
    fen: &str,
) -> Result<GameRecord> {
    let now = Database::current_timestamp();
    let game = GameRecord {
        id: game_id.to_string(),
        white_id: white_id.to_string(),
        black_id: black_id.to_string(),
        status: GameState::Active,
        result: None,
        winner_id: None,
        current_fen: fen.to_string(),
        created_at: now,
        updated_at: now,
        finished_at: None,
    };

    conn.execute(
        r#"
        INSERT INTO games (
            id, white_id, black_id, status, result, winner_id,
            current_fen, created_at, updated_at, finished_at
        ) VALUES (
            :id, :white_id, :black_id, :status, NULL, NULL,
            :current_fen, :created_at, :updated_at, NULL
        )
        "#,
        named_params! {
            ":id": game.id,
            ":white_id": game.white_id,
            ":black_id": game.black_id,
            ":status": game.status.as_str(),
            ":current_fen": game.current_fen,
            ":created_at": game.created_at,
            ":updated_at": game.updated_at,
        },
    )?;

    Ok(game)
}

/// Append one ply to a game's history and move its current position forward
pub fn append_move(
    conn: &Connection,
    game_id: &str,
    ply: u32,
    participant_id: &str,
    token: &str,
    fen_after: &str,
) -> Result<()> {
    let now = Database::current_timestamp();

    conn.execute(
        r#"
        INSERT INTO moves (game_id, ply, participant_id, token, fen_after, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        (game_id, ply, participant_id, token, fen_after, now),
    )?;

    let rows_affected = conn.execute(
        "UPDATE games SET current_fen = ?1, updated_at = ?2 WHERE id = ?3 AND status = 'active'",
        (fen_after, now, game_id),
    )?;

    if rows_affected == 0 {
        return Err(StorageError::game_not_found(game_id));
    }

    Ok(())
}

/// Mark a game finished with its termination reason and optional winner
pub fn finish_game(
    conn: &Connection,
    game_id: &str,
    result: Termination,
    winner_id: Option<&str>,
) -> Result<()> {
    let now = Database::current_timestamp();

    let rows_affected = conn.execute(
        r#"
        UPDATE games
        SET status = 'finished', result = ?1, winner_id = ?2, updated_at = ?3, finished_at = ?3
        WHERE id = ?4 AND status = 'active'
        "#,
        (result.as_str(), winner_id, now, game_id),
    )?;

    if rows_affected == 0 {
        return Err(StorageError::game_not_found(game_id));
    }

    Ok(())
}

pub fn find_game(conn: &Connection, game_id: &str) -> Result<Option<GameRecord>> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1");
    Ok(conn.query_row(&sql, [game_id], game_from_row).optional()?)
}

pub fn active_games(conn: &Connection) -> Result<Vec<GameRecord>> {
    let sql = format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE status = 'active' ORDER BY created_at, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let games = stmt
        .query_map([], game_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(games)
}

/// Move history of a game in ply order
pub fn moves_for_game(conn: &Connection, game_id: &str) -> Result<Vec<MoveRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT game_id, ply, participant_id, token, fen_after, created_at
        FROM moves
        WHERE game_id = ?1
        ORDER BY ply ASC
        "#,
    )?;

    let moves = stmt
        .query_map([game_id], |row| {
            Ok(MoveRecord {
                game_id: row.get("game_id")?,
                ply: row.get("ply")?,
                participant_id: row.get("participant_id")?,
                token: row.get("token")?,
                fen_after: row.get("fen_after")?,
                created_at: row.get("created_at")?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(moves)
}

impl Database {
    /// Get a game by ID
    pub fn get_game(&self, game_id: &str) -> Result<GameRecord> {
        self.with_connection(|conn| {
            find_game(conn, game_id)?.ok_or_else(|| StorageError::game_not_found(game_id))
        })
    }

    pub fn list_active_games(&self) -> Result<Vec<GameRecord>> {
        self.with_connection(active_games)
    }

    pub fn get_moves(&self, game_id: &str) -> Result<Vec<MoveRecord>> {
        self.with_connection(|conn| moves_for_game(conn, game_id))
    }
}

fn text_column_error(column: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(0, column.to_string(), rusqlite::types::Type::Text)
}

/// Convert a database row to a GameRecord
fn game_from_row(row: &Row) -> rusqlite::Result<GameRecord> {
    let status_str: String = row.get("status")?;
    let status = status_str
        .parse::<GameState>()
        .map_err(|_e| text_column_error("status"))?;

    let result_str: Option<String> = row.get("result")?;
    let result = match result_str {
        Some(s) => Some(
            s.parse::<Termination>()
                .map_err(|_e| text_column_error("result"))?,
        ),
        None => None,
    };

    Ok(GameRecord {
        id: row.get("id")?,
        white_id: row.get("white_id")?,
        black_id: row.get("black_id")?,
        status,
        result,
        winner_id: row.get("winner_id")?,
        current_fen: row.get("current_fen")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        finished_at: row.get("finished_at")?,
    })
}
