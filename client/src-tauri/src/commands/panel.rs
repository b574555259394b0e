use tauri::{AppHandle, State};

use feed_render::FeedView;
use feed_render::panel::{ConfigPanel, ConfigSnapshot};
use feed_render::ui::UiState;

use crate::state::{FeedState, notify_feed_updated};

/// Run `f` against the open panel and return its refreshed snapshot.
fn with_panel<F>(ui: &mut UiState, f: F) -> Result<ConfigSnapshot, String>
where
    F: FnOnce(&mut ConfigPanel),
{
    let panel = ui
        .config_panel()
        .ok_or_else(|| "configuration panel is not open".to_string())?;
    f(&mut *panel);
    Ok(panel.snapshot())
}

#[tauri::command]
pub fn open_config(state: State<FeedState>) -> Result<ConfigSnapshot, String> {
    let mut ui = state.ui()?;
    ui.open_config(&state.store);
    with_panel(&mut ui, |_| {})
}

#[tauri::command]
pub fn panel_add_channel(
    state: State<FeedState>,
    channel_id: String,
    nickname: String,
) -> Result<ConfigSnapshot, String> {
    with_panel(&mut *state.ui()?, |panel| {
        panel.add_channel(&state.store, &channel_id, &nickname);
    })
}

#[tauri::command]
pub fn panel_remove_channel(state: State<FeedState>, channel_id: String) -> Result<ConfigSnapshot, String> {
    with_panel(&mut *state.ui()?, |panel| {
        panel.remove_channel(&state.store, &channel_id);
    })
}

#[tauri::command]
pub fn panel_set_pending_max_messages(state: State<FeedState>, input: String) -> Result<ConfigSnapshot, String> {
    with_panel(&mut *state.ui()?, |panel| {
        panel.set_pending_max_messages_input(&input)
    })
}

#[tauri::command]
pub fn panel_save_max_messages(state: State<FeedState>) -> Result<ConfigSnapshot, String> {
    with_panel(&mut *state.ui()?, |panel| {
        panel.save_max_messages(&state.store);
    })
}

/// Closing re-reads nicknames and cap so render-selection recomputes.
#[tauri::command]
pub fn close_config(app: AppHandle, state: State<FeedState>) -> Result<FeedView, String> {
    if state.ui()?.close_config() {
        state.pipeline()?.reload(&state.store);
        notify_feed_updated(&app);
    }
    state.render()
}
