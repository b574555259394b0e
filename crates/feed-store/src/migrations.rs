use anyhow::Result;
use rusqlite::Connection;
use tracing::debug;

pub const CHANNEL_NICKNAMES_KEY: &str = "channel_nicknames";
pub const MAX_MESSAGES_KEY: &str = "max_messages";

/// Create the flat settings table and seed first-run defaults.
/// Existing values are left untouched.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS settings (
            key     TEXT PRIMARY KEY,
            value   TEXT NOT NULL
        );
        ",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, '{}')",
        [CHANNEL_NICKNAMES_KEY],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
        (MAX_MESSAGES_KEY, feed_types::api::DEFAULT_MAX_MESSAGES.to_string()),
    )?;

    debug!("Settings schema ready");
    Ok(())
}
