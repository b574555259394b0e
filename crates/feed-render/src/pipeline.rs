use std::collections::VecDeque;
use std::fmt;

use chrono::TimeZone;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use feed_store::SettingsStore;
use feed_store::queries::ChannelNicknames;
use feed_types::api::{DEFAULT_MAX_MESSAGES, VISIBLE_WINDOW};
use feed_types::models::FeedMessage;

use crate::message::{RenderedMessage, render_message};
use crate::time::RenderContext;

/// Retained records plus the channel filter and cap they are viewed through.
#[derive(Debug)]
pub struct FeedPipeline {
    /// Most recently received first.
    messages: VecDeque<FeedMessage>,
    max_messages: usize,
    nicknames: ChannelNicknames,
}

/// Outcome of render-selection, borrowing from the retained records.
#[derive(Debug, PartialEq)]
pub enum Selection<'a> {
    Unconfigured,
    AwaitingMessages,
    Messages(Vec<&'a FeedMessage>),
}

/// Serializable view handed to the webview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedView {
    Unconfigured,
    AwaitingMessages,
    Messages { messages: Vec<RenderedMessage> },
}

impl Default for FeedPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES, ChannelNicknames::new())
    }
}

impl FeedPipeline {
    pub fn new(max_messages: usize, nicknames: ChannelNicknames) -> Self {
        Self {
            messages: VecDeque::new(),
            max_messages: max_messages.max(1),
            nicknames,
        }
    }

    /// Build a pipeline from the persisted settings, falling back to
    /// defaults for anything that cannot be read.
    pub fn from_store(store: &SettingsStore) -> Self {
        let mut pipeline = Self::default();
        pipeline.reload(store);
        pipeline
    }

    /// Decode a forwarded JSON object and retain it.
    /// Returns whether the record was accepted.
    pub fn ingest(&mut self, payload: Value) -> bool {
        match serde_json::from_value::<FeedMessage>(payload) {
            Ok(msg) => self.push(msg),
            Err(e) => {
                warn!("Dropping payload that is not a message record: {}", e);
                false
            }
        }
    }

    /// Prepend a record unless its id is already retained; first seen wins.
    pub fn push(&mut self, msg: FeedMessage) -> bool {
        if self.messages.iter().any(|m| m.id == msg.id) {
            debug!("Duplicate message {} ignored", msg.id);
            return false;
        }
        self.messages.push_front(msg);
        self.messages.truncate(self.max_messages);
        true
    }

    pub fn messages(&self) -> impl Iterator<Item = &FeedMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Lowering the cap evicts the oldest records immediately.
    pub fn set_max_messages(&mut self, max_messages: usize) {
        self.max_messages = max_messages.max(1);
        self.messages.truncate(self.max_messages);
    }

    pub fn channel_nicknames(&self) -> &ChannelNicknames {
        &self.nicknames
    }

    /// Only changes what is visible; retained records are kept.
    pub fn set_channel_nicknames(&mut self, nicknames: ChannelNicknames) {
        self.nicknames = nicknames;
    }

    /// Re-fetch nicknames and cap. On failure the previous value is kept.
    /// Returns false if either read failed.
    pub fn reload(&mut self, store: &SettingsStore) -> bool {
        let mut ok = true;

        match store.channel_nicknames() {
            Ok(nicknames) => self.set_channel_nicknames(nicknames),
            Err(e) => {
                error!("Failed to load channel nicknames: {:#}", e);
                ok = false;
            }
        }

        match store.max_messages() {
            Ok(max) => self.set_max_messages(max),
            Err(e) => {
                error!("Failed to load max messages: {:#}", e);
                ok = false;
            }
        }

        ok
    }

    pub fn select(&self) -> Selection<'_> {
        if self.nicknames.is_empty() {
            return Selection::Unconfigured;
        }

        let visible: Vec<&FeedMessage> = self
            .messages
            .iter()
            .filter(|m| {
                self.nicknames
                    .get(&m.channel)
                    .is_some_and(|nick| !nick.is_empty())
            })
            .filter(|m| !m.is_empty())
            .take(VISIBLE_WINDOW)
            .collect();

        if visible.is_empty() {
            Selection::AwaitingMessages
        } else {
            Selection::Messages(visible)
        }
    }

    pub fn render<Tz>(&self, ctx: &RenderContext<Tz>) -> FeedView
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self.select() {
            Selection::Unconfigured => FeedView::Unconfigured,
            Selection::AwaitingMessages => FeedView::AwaitingMessages,
            Selection::Messages(messages) => FeedView::Messages {
                messages: messages
                    .into_iter()
                    .map(|m| {
                        let nickname = self
                            .nicknames
                            .get(&m.channel)
                            .map(String::as_str)
                            .unwrap_or(&m.channel);
                        render_message(m, nickname, ctx)
                    })
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn msg(id: &str, channel: &str, content: &str) -> FeedMessage {
        FeedMessage {
            id: id.into(),
            channel: channel.into(),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    fn nicknames(pairs: &[(&str, &str)]) -> ChannelNicknames {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ids(pipeline: &FeedPipeline) -> Vec<&str> {
        pipeline.messages().map(|m| m.id.as_str()).collect()
    }

    fn selected_ids<'a>(selection: &Selection<'a>) -> Vec<&'a str> {
        match selection {
            Selection::Messages(msgs) => msgs.iter().copied().map(|m| m.id.as_str()).collect(),
            _ => vec![],
        }
    }

    #[test]
    fn duplicates_keep_first_seen() {
        let mut pipeline = FeedPipeline::default();
        assert!(pipeline.push(msg("1", "c", "original")));
        assert!(pipeline.push(msg("2", "c", "other")));
        assert!(!pipeline.push(msg("1", "c", "replacement")));

        assert_eq!(ids(&pipeline), ["2", "1"]);
        assert_eq!(
            pipeline.messages().last().unwrap().content.as_deref(),
            Some("original")
        );
    }

    #[test]
    fn cap_evicts_oldest_by_position() {
        let mut pipeline = FeedPipeline::new(3, ChannelNicknames::new());
        for i in 0..10 {
            pipeline.push(msg(&i.to_string(), "c", "x"));
            assert!(pipeline.len() <= 3);
        }
        assert_eq!(ids(&pipeline), ["9", "8", "7"]);

        // An evicted id is no longer known, so it is accepted again.
        assert!(pipeline.push(msg("0", "c", "back")));
        assert_eq!(ids(&pipeline), ["0", "9", "8"]);
    }

    #[test]
    fn lowering_cap_truncates_immediately() {
        let mut pipeline = FeedPipeline::new(10, ChannelNicknames::new());
        for i in 0..6 {
            pipeline.push(msg(&i.to_string(), "c", "x"));
        }
        pipeline.set_max_messages(2);
        assert_eq!(ids(&pipeline), ["5", "4"]);
        pipeline.set_max_messages(0);
        assert_eq!(pipeline.max_messages(), 1);
        assert_eq!(ids(&pipeline), ["5"]);
    }

    #[test]
    fn ingest_tolerates_loosely_typed_records() {
        let mut pipeline = FeedPipeline::new(300, nicknames(&[("a", "Alpha")]));
        assert!(pipeline.ingest(json!({"id": 1234567890123u64, "channel": "a", "content": "hi"})));
        assert!(pipeline.ingest(json!({
            "id": "2",
            "channel": "a",
            "sticker_id": "9",
            "sticker_type": "1"
        })));
        assert!(pipeline.ingest(json!({
            "id": "3",
            "channel": "a",
            "content": "<@5> hello",
            "mentions": [{"id": 5, "username": "bob"}]
        })));
        assert!(pipeline.ingest(json!({"id": 5})));
        assert!(!pipeline.ingest(json!({"id": "2"})));
        assert_eq!(pipeline.len(), 4);

        let FeedView::Messages { messages } =
            pipeline.render(&RenderContext::new(Utc, Utc::now()))
        else {
            panic!("expected messages");
        };
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["3", "2", "1234567890123"]);
        assert!(messages[0].content.as_ref().unwrap().html.contains("@bob"));
        assert!(messages[1].sticker.is_some());
    }

    #[test]
    fn empty_mapping_is_unconfigured() {
        let mut pipeline = FeedPipeline::default();
        assert_eq!(pipeline.select(), Selection::Unconfigured);
        pipeline.push(msg("1", "c", "hello"));
        assert_eq!(pipeline.select(), Selection::Unconfigured);
        assert_eq!(
            pipeline.render(&RenderContext::new(Utc, Utc::now())),
            FeedView::Unconfigured
        );
    }

    #[test]
    fn no_matching_channel_is_awaiting() {
        let mut pipeline = FeedPipeline::new(300, nicknames(&[("a", "Alpha")]));
        assert_eq!(pipeline.select(), Selection::AwaitingMessages);
        pipeline.push(msg("1", "b", "hello"));
        assert_eq!(pipeline.select(), Selection::AwaitingMessages);
    }

    #[test]
    fn empty_records_are_never_selected() {
        let mut pipeline = FeedPipeline::new(300, nicknames(&[("a", "Alpha")]));
        pipeline.push(FeedMessage {
            id: "blank".into(),
            channel: "a".into(),
            ..Default::default()
        });
        pipeline.push(msg("empty-text", "a", ""));
        assert_eq!(pipeline.select(), Selection::AwaitingMessages);

        pipeline.push(FeedMessage {
            id: "sticker".into(),
            channel: "a".into(),
            sticker_id: Some("9".into()),
            sticker_type: Some(1),
            ..Default::default()
        });
        assert_eq!(selected_ids(&pipeline.select()), ["sticker"]);
    }

    #[test]
    fn visible_window_is_thirty_most_recent() {
        let mut pipeline = FeedPipeline::new(300, nicknames(&[("a", "Alpha")]));
        for i in 0..50 {
            pipeline.push(msg(&i.to_string(), "a", "x"));
        }
        let selection = pipeline.select();
        let selected = selected_ids(&selection);
        assert_eq!(selected.len(), VISIBLE_WINDOW);
        assert_eq!(selected[0], "49");
        assert_eq!(selected[29], "20");
    }

    #[test]
    fn removing_a_channel_hides_without_discarding() {
        let mut pipeline =
            FeedPipeline::new(300, nicknames(&[("a", "Alpha"), ("b", "Beta")]));
        pipeline.push(msg("1", "a", "from a"));
        pipeline.push(msg("2", "b", "from b"));
        assert_eq!(selected_ids(&pipeline.select()), ["2", "1"]);

        pipeline.set_channel_nicknames(nicknames(&[("b", "Beta")]));
        assert_eq!(selected_ids(&pipeline.select()), ["2"]);
        assert_eq!(pipeline.len(), 2);

        pipeline.set_channel_nicknames(nicknames(&[("a", "Again"), ("b", "Beta")]));
        assert_eq!(selected_ids(&pipeline.select()), ["2", "1"]);
    }

    #[test]
    fn render_uses_channel_nickname() {
        let mut pipeline = FeedPipeline::new(300, nicknames(&[("a", "Alpha")]));
        pipeline.push(msg("1", "a", "hi <@&4>"));
        let FeedView::Messages { messages } =
            pipeline.render(&RenderContext::new(Utc, Utc::now()))
        else {
            panic!("expected messages");
        };
        assert_eq!(messages[0].channel_nickname, "Alpha");
        assert!(messages[0]
            .content
            .as_ref()
            .unwrap()
            .html
            .contains("@RoleMention"));
    }

    #[test]
    fn blank_nickname_does_not_enable_a_channel() {
        let mut pipeline = FeedPipeline::new(300, nicknames(&[("a", ""), ("b", "Beta")]));
        pipeline.push(msg("1", "a", "hidden"));
        assert_eq!(pipeline.select(), Selection::AwaitingMessages);

        pipeline.push(msg("2", "b", "shown"));
        assert_eq!(selected_ids(&pipeline.select()), ["2"]);
    }

    #[test]
    fn reload_keeps_previous_values_when_store_fails() {
        let store = SettingsStore::open_in_memory().unwrap();
        store.set_channel_nickname("a", "Alpha").unwrap();
        store.set_max_messages(25).unwrap();
        let mut pipeline = FeedPipeline::from_store(&store);

        store
            .with_conn(|conn| Ok(conn.execute_batch("DROP TABLE settings")?))
            .unwrap();

        assert!(!pipeline.reload(&store));
        assert_eq!(pipeline.max_messages(), 25);
        assert_eq!(
            pipeline.channel_nicknames().get("a").map(String::as_str),
            Some("Alpha")
        );
    }

    #[test]
    fn reload_reads_store() {
        let store = SettingsStore::open_in_memory().unwrap();
        store.set_channel_nickname("a", "Alpha").unwrap();
        store.set_max_messages(25).unwrap();

        let pipeline = FeedPipeline::from_store(&store);
        assert_eq!(pipeline.max_messages(), 25);
        assert_eq!(pipeline.channel_nicknames().len(), 1);
    }

    #[test]
    fn view_serializes_with_state_tag() {
        let json = serde_json::to_value(FeedView::AwaitingMessages).unwrap();
        assert_eq!(json, json!({"state": "awaiting_messages"}));
    }
}
