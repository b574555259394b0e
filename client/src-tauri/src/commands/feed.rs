use tauri::State;

use feed_render::FeedView;
use feed_render::ui::HeaderVisibility;

use crate::state::FeedState;

#[derive(serde::Serialize)]
pub struct FeedSnapshot {
    pub channel_count: usize,
    pub view: FeedView,
}

#[tauri::command]
pub fn render_feed(state: State<FeedState>) -> Result<FeedSnapshot, String> {
    let channel_count = state.pipeline()?.channel_nicknames().len();
    Ok(FeedSnapshot {
        channel_count,
        view: state.render()?,
    })
}

#[tauri::command]
pub fn pointer_entered(state: State<FeedState>) -> Result<HeaderVisibility, String> {
    Ok(state.ui()?.pointer_entered())
}

#[tauri::command]
pub fn pointer_left(state: State<FeedState>) -> Result<HeaderVisibility, String> {
    Ok(state.ui()?.pointer_left())
}
