//! Direct settings operations. These write the store only; the feed picks up
//! changes when the configuration panel closes.

use std::collections::BTreeMap;

use tauri::State;
use tracing::error;

use feed_types::api::ChannelEntry;

use crate::state::FeedState;

#[tauri::command]
pub fn get_channel_nicknames(state: State<FeedState>) -> Result<BTreeMap<String, String>, String> {
    state.store.channel_nicknames().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_channel_nickname(state: State<FeedState>, channel_id: String, nickname: String) -> bool {
    match state.store.set_channel_nickname(&channel_id, &nickname) {
        Ok(()) => true,
        Err(e) => {
            error!("set_channel_nickname({}) failed: {:#}", channel_id, e);
            false
        }
    }
}

#[tauri::command]
pub fn remove_channel_nickname(state: State<FeedState>, channel_id: String) -> bool {
    match state.store.remove_channel_nickname(&channel_id) {
        Ok(_) => true,
        Err(e) => {
            error!("remove_channel_nickname({}) failed: {:#}", channel_id, e);
            false
        }
    }
}

#[tauri::command]
pub fn get_channel_list(state: State<FeedState>) -> Result<Vec<ChannelEntry>, String> {
    state.store.channel_list().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_max_messages(state: State<FeedState>) -> Result<usize, String> {
    state.store.max_messages().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_max_messages(state: State<FeedState>, max_messages: usize) -> bool {
    match state.store.set_max_messages(max_messages) {
        Ok(()) => true,
        Err(e) => {
            error!("set_max_messages({}) failed: {:#}", max_messages, e);
            false
        }
    }
}
