/// Event carrying each decoded inbound JSON object, verbatim.
pub const NEW_MESSAGE_EVENT: &str = "new-discord-message";

/// Emitted whenever the pipeline's visible output may have changed.
pub const FEED_UPDATED_EVENT: &str = "feed-updated";
