mod commands;
mod state;

use tauri::Manager;
use tracing::{error, info};

use commands::{config, feed, panel};
use feed_gateway::config::FeedConfig;
use feed_gateway::dispatcher::Dispatcher;
use state::FeedState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feed=debug,tower_http=info".into()),
        )
        .init();

    let config = FeedConfig::from_env().unwrap_or_else(|e| {
        error!("{}; using defaults", e);
        FeedConfig::default()
    });

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![
            config::get_channel_nicknames,
            config::set_channel_nickname,
            config::remove_channel_nickname,
            config::get_channel_list,
            config::get_max_messages,
            config::set_max_messages,
            panel::open_config,
            panel::panel_add_channel,
            panel::panel_remove_channel,
            panel::panel_set_pending_max_messages,
            panel::panel_save_max_messages,
            panel::close_config,
            feed::render_feed,
            feed::pointer_entered,
            feed::pointer_left,
        ])
        .setup(move |app| {
            let store = state::open_store(app.handle(), &config)?;
            app.manage(FeedState::new(store));

            let (dispatcher, rx) = Dispatcher::new();
            let listener_config = config.clone();
            tauri::async_runtime::spawn(async move {
                if let Err(e) = feed_gateway::server::serve(&listener_config, dispatcher).await {
                    error!("Feed listener stopped: {:#}", e);
                }
            });
            tauri::async_runtime::spawn(state::pump_messages(app.handle().clone(), rx));

            info!("Feed viewer started");
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running feed viewer");
}
