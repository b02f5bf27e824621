use crate::storage::database::Database;
use crate::storage::errors::{Result, StorageError};
use rusqlite::Connection;

pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Migration represents a single database migration
pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All database migrations in order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Players, games and move history",
        sql: r#"
            CREATE TABLE players (
                participant_id TEXT PRIMARY KEY,
                rating INTEGER NOT NULL CHECK(rating >= 0),
                games_played INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE games (
                id TEXT PRIMARY KEY,
                white_id TEXT NOT NULL,
                black_id TEXT NOT NULL,
                status TEXT NOT NULL CHECK(status IN ('active', 'finished')),
                result TEXT CHECK(result IN ('checkmate', 'stalemate', 'resignation', 'draw_agreement')),
                winner_id TEXT,
                current_fen TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                finished_at INTEGER
            );

            CREATE TABLE moves (
                game_id TEXT NOT NULL,
                ply INTEGER NOT NULL,
                participant_id TEXT NOT NULL,
                token TEXT NOT NULL,
                fen_after TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (game_id, ply),
                FOREIGN KEY (game_id) REFERENCES games(id) ON DELETE CASCADE
            );

            CREATE TABLE schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL,
                description TEXT NOT NULL
            );

            CREATE INDEX idx_games_status ON games(status);
            CREATE INDEX idx_games_white ON games(white_id);
            CREATE INDEX idx_games_black ON games(black_id);
        "#,
    },
    Migration {
        version: 2,
        description: "Matchmaking queue",
        sql: r#"
            CREATE TABLE matchmaking_queue (
                participant_id TEXT PRIMARY KEY,
                rating INTEGER NOT NULL,
                enqueued_at INTEGER NOT NULL,
                seq INTEGER NOT NULL
            );

            CREATE INDEX idx_queue_seq ON matchmaking_queue(seq);
        "#,
    },
];

/// Initialize the database schema and run any pending migrations
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(|e| {
            StorageError::migration_failed(0, format!("Failed to enable foreign keys: {}", e))
        })?;

    let current_version = if migrations_table_exists(conn) {
        get_current_version(conn)?
    } else {
        0
    };

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
        .collect();

    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.unchecked_transaction().map_err(|e| {
        StorageError::migration_failed(-1, format!("Failed to start transaction: {}", e))
    })?;

    for migration in pending {
        execute_migration(&tx, migration)?;
    }

    tx.commit().map_err(|e| {
        StorageError::migration_failed(-1, format!("Failed to commit migrations: {}", e))
    })?;

    Ok(())
}

fn migrations_table_exists(conn: &Connection) -> bool {
    conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='schema_migrations'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false)
}

/// Execute a single migration
fn execute_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute_batch(migration.sql).map_err(|e| {
        StorageError::migration_failed(
            migration.version,
            format!("Failed to execute migration {}: {}", migration.version, e),
        )
    })?;

    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?1, ?2, ?3)",
        (
            migration.version,
            Database::current_timestamp(),
            migration.description,
        ),
    )
    .map_err(|e| {
        StorageError::migration_failed(
            migration.version,
            format!("Failed to record migration {}: {}", migration.version, e),
        )
    })?;

    Ok(())
}

/// Get the current schema version
pub fn get_current_version(conn: &Connection) -> Result<i32> {
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .map_err(|e| {
            StorageError::migration_failed(-1, format!("Failed to get current version: {}", e))
        })?
        .unwrap_or(0);

    Ok(version)
}
