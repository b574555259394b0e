use serde::{Deserialize, Serialize};

// -- Configuration --

/// One row of the configured channel list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub id: String,
    pub nickname: String,
}

/// Default number of retained messages.
pub const DEFAULT_MAX_MESSAGES: usize = 300;

/// Bounds enforced by the configuration panel when committing a new cap.
pub const MIN_MAX_MESSAGES: usize = 10;
pub const MAX_MAX_MESSAGES: usize = 1000;

/// Maximum number of records shown at once.
pub const VISIBLE_WINDOW: usize = 30;
