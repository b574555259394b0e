use std::collections::BTreeMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use tracing::warn;

use feed_types::api::{ChannelEntry, DEFAULT_MAX_MESSAGES};

use crate::SettingsStore;
use crate::migrations::{CHANNEL_NICKNAMES_KEY, MAX_MESSAGES_KEY};

pub type ChannelNicknames = BTreeMap<String, String>;

impl SettingsStore {
    // -- Channel nicknames --

    pub fn channel_nicknames(&self) -> Result<ChannelNicknames> {
        self.with_conn(read_nicknames)
    }

    /// Insert or replace the nickname for a channel.
    pub fn set_channel_nickname(&self, channel_id: &str, nickname: &str) -> Result<()> {
        self.with_conn(|conn| {
            let mut nicknames = read_nicknames(conn)?;
            nicknames.insert(channel_id.to_string(), nickname.to_string());
            write_nicknames(conn, &nicknames)
        })
    }

    /// Returns whether the channel was configured.
    pub fn remove_channel_nickname(&self, channel_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let mut nicknames = read_nicknames(conn)?;
            let removed = nicknames.remove(channel_id).is_some();
            write_nicknames(conn, &nicknames)?;
            Ok(removed)
        })
    }

    /// Configured channels, ordered by channel id.
    pub fn channel_list(&self) -> Result<Vec<ChannelEntry>> {
        Ok(self
            .channel_nicknames()?
            .into_iter()
            .map(|(id, nickname)| ChannelEntry { id, nickname })
            .collect())
    }

    // -- Retention cap --

    pub fn max_messages(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let Some(raw) = read_value(conn, MAX_MESSAGES_KEY)? else {
                return Ok(DEFAULT_MAX_MESSAGES);
            };
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => Ok(n),
                _ => {
                    warn!("Stored max_messages {:?} is invalid, using default", raw);
                    Ok(DEFAULT_MAX_MESSAGES)
                }
            }
        })
    }

    pub fn set_max_messages(&self, max_messages: usize) -> Result<()> {
        self.with_conn(|conn| write_value(conn, MAX_MESSAGES_KEY, &max_messages.to_string()))
    }
}

fn read_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?)
}

fn write_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, value),
    )?;
    Ok(())
}

fn read_nicknames(conn: &Connection) -> Result<ChannelNicknames> {
    let Some(raw) = read_value(conn, CHANNEL_NICKNAMES_KEY)? else {
        return Ok(ChannelNicknames::new());
    };
    match serde_json::from_str(&raw) {
        Ok(map) => Ok(map),
        Err(e) => {
            warn!("Stored channel nicknames are corrupt ({}), starting empty", e);
            Ok(ChannelNicknames::new())
        }
    }
}

fn write_nicknames(conn: &Connection, nicknames: &ChannelNicknames) -> Result<()> {
    write_value(conn, CHANNEL_NICKNAMES_KEY, &serde_json::to_string(nicknames)?)
}
