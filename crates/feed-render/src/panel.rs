use serde::Serialize;
use tracing::error;

use feed_store::SettingsStore;
use feed_types::api::{ChannelEntry, DEFAULT_MAX_MESSAGES, MAX_MAX_MESSAGES, MIN_MAX_MESSAGES};

/// Editable copy of the configuration while the panel is open.
///
/// Channel edits go straight to the store and the list is re-read after each
/// one. The cap is only committed on an explicit save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPanel {
    channels: Vec<ChannelEntry>,
    max_messages: usize,
    pending_max_messages: usize,
}

/// What the webview draws for the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    pub channels: Vec<ChannelEntry>,
    pub max_messages: usize,
    pub pending_max_messages: usize,
    pub can_save_max_messages: bool,
    pub min_max_messages: usize,
    pub max_max_messages: usize,
}

impl ConfigPanel {
    pub fn open(store: &SettingsStore) -> Self {
        let mut panel = Self {
            channels: Vec::new(),
            max_messages: DEFAULT_MAX_MESSAGES,
            pending_max_messages: DEFAULT_MAX_MESSAGES,
        };
        panel.reload_channels(store);

        match store.max_messages() {
            Ok(max) => {
                panel.max_messages = max;
                panel.pending_max_messages = max;
            }
            Err(e) => error!("Failed to load max messages: {:#}", e),
        }
        panel
    }

    pub fn channels(&self) -> &[ChannelEntry] {
        &self.channels
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn pending_max_messages(&self) -> usize {
        self.pending_max_messages
    }

    /// Both fields must be non-blank after trimming.
    pub fn can_add(channel_id: &str, nickname: &str) -> bool {
        !channel_id.trim().is_empty() && !nickname.trim().is_empty()
    }

    pub fn add_channel(&mut self, store: &SettingsStore, channel_id: &str, nickname: &str) -> bool {
        if !Self::can_add(channel_id, nickname) {
            return false;
        }
        if let Err(e) = store.set_channel_nickname(channel_id.trim(), nickname.trim()) {
            error!("Failed to add channel {}: {:#}", channel_id.trim(), e);
            return false;
        }
        self.reload_channels(store)
    }

    pub fn remove_channel(&mut self, store: &SettingsStore, channel_id: &str) -> bool {
        if let Err(e) = store.remove_channel_nickname(channel_id) {
            error!("Failed to remove channel {}: {:#}", channel_id, e);
            return false;
        }
        self.reload_channels(store)
    }

    pub fn set_pending_max_messages(&mut self, max_messages: usize) {
        self.pending_max_messages = max_messages;
    }

    /// Raw input from the number field; unparseable input resets to the default.
    pub fn set_pending_max_messages_input(&mut self, input: &str) {
        self.pending_max_messages = match input.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => DEFAULT_MAX_MESSAGES,
        };
    }

    pub fn can_save_max_messages(&self) -> bool {
        self.pending_max_messages != self.max_messages
    }

    /// Commit the pending cap, clamped to the allowed range.
    /// Returns false when nothing was written; a failed write leaves the
    /// panel untouched.
    pub fn save_max_messages(&mut self, store: &SettingsStore) -> bool {
        let value = self
            .pending_max_messages
            .clamp(MIN_MAX_MESSAGES, MAX_MAX_MESSAGES);
        if value == self.max_messages {
            self.pending_max_messages = value;
            return false;
        }

        if let Err(e) = store.set_max_messages(value) {
            error!("Failed to save max messages: {:#}", e);
            return false;
        }
        self.max_messages = value;
        self.pending_max_messages = value;
        true
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            channels: self.channels.clone(),
            max_messages: self.max_messages,
            pending_max_messages: self.pending_max_messages,
            can_save_max_messages: self.can_save_max_messages(),
            min_max_messages: MIN_MAX_MESSAGES,
            max_max_messages: MAX_MAX_MESSAGES,
        }
    }

    fn reload_channels(&mut self, store: &SettingsStore) -> bool {
        match store.channel_list() {
            Ok(channels) => {
                self.channels = channels;
                true
            }
            Err(e) => {
                error!("Failed to load channels: {:#}", e);
                false
            }
        }
    }
}
