use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id               INTEGER PRIMARY KEY,
            login            TEXT NOT NULL UNIQUE,
            email            TEXT NOT NULL,
            password         TEXT NOT NULL,
            technical_token  TEXT NOT NULL UNIQUE,
            role             TEXT NOT NULL DEFAULT 'user'
        );

        CREATE TABLE IF NOT EXISTS texts (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            id          INTEGER NOT NULL,
            owner_id    INTEGER NOT NULL REFERENCES users(id),
            kind        TEXT NOT NULL CHECK (kind IN ('plain', 'encrypted', 'decrypted')),
            content     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_texts_owner_kind
            ON texts(owner_id, kind, id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
