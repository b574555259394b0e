use std::fmt;

use chrono::TimeZone;
use serde::Serialize;
use tracing::debug;

use feed_types::models::{Attachment, FeedMessage, LOTTIE_STICKER_TYPE, sticker_extension};

use crate::content::{ParsedContent, parse_content};
use crate::time::RenderContext;

pub const FALLBACK_AVATAR: &str = "https://cdn.discordapp.com/embed/avatars/0.png";
const AVATAR_BASE: &str = "https://cdn.discordapp.com/avatars";
const LOTTIE_STICKER_BASE: &str = "https://discord.com/stickers";
const STICKER_BASE: &str = "https://media.discordapp.net/stickers";

/// Everything the webview needs to draw one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedMessage {
    pub id: String,
    pub avatar_url: String,
    pub author_name: String,
    pub display_name: String,
    pub channel_nickname: String,
    pub display_time: String,
    pub content: Option<ParsedContent>,
    pub sticker: Option<StickerView>,
    pub images: Vec<MediaView>,
    pub videos: Vec<MediaView>,
    pub files: Vec<FileLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StickerView {
    Lottie { url: String },
    Image { url: String, alt: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaView {
    pub id: String,
    pub url: String,
    pub alt: String,
    /// Clicking opens the image full-window.
    pub fullscreen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLink {
    pub id: String,
    pub url: String,
    pub filename: String,
    pub size: String,
}

pub fn render_message<Tz>(
    msg: &FeedMessage,
    channel_nickname: &str,
    ctx: &RenderContext<Tz>,
) -> RenderedMessage
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let display_time = match msg.time.as_deref().filter(|t| !t.is_empty()) {
        Some(time) => ctx.short_time(time).unwrap_or_else(|| {
            debug!("Message {} has unparseable time {:?}", msg.id, time);
            String::new()
        }),
        None => String::new(),
    };

    let content = msg
        .content
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|c| parse_content(c, msg.mentions.as_deref().unwrap_or_default(), ctx));

    let attachments = msg.attachments.as_deref().unwrap_or_default();
    let images = attachments
        .iter()
        .filter(|a| a.is_image())
        .map(|a| media(a, true))
        .collect();
    let videos = attachments
        .iter()
        .filter(|a| a.is_video())
        .map(|a| media(a, false))
        .collect();
    let files = attachments
        .iter()
        .filter(|a| !a.is_image() && !a.is_video())
        .map(|a| FileLink {
            id: a.id.clone(),
            url: a.url.clone(),
            filename: a.filename.clone(),
            size: human_size(a.size),
        })
        .collect();

    RenderedMessage {
        id: msg.id.clone(),
        avatar_url: avatar_url(msg),
        author_name: msg.author_name.clone(),
        display_name: display_name(msg).to_string(),
        channel_nickname: channel_nickname.to_string(),
        display_time,
        content,
        sticker: sticker(msg),
        images,
        videos,
        files,
    }
}

pub fn avatar_url(msg: &FeedMessage) -> String {
    if msg.author.is_empty() || msg.avatar_id.is_empty() {
        return FALLBACK_AVATAR.to_string();
    }
    format!("{}/{}/{}.webp?size=80", AVATAR_BASE, msg.author, msg.avatar_id)
}

pub fn display_name(msg: &FeedMessage) -> &str {
    match msg.nickname.as_deref() {
        Some(nick) if !nick.is_empty() => nick,
        _ if !msg.author_name.is_empty() => &msg.author_name,
        _ => &msg.global_author_name,
    }
}

pub fn sticker(msg: &FeedMessage) -> Option<StickerView> {
    let id = msg.sticker_id.as_deref().filter(|id| !id.is_empty())?;
    let sticker_type = msg.sticker_type?;

    if sticker_type == LOTTIE_STICKER_TYPE {
        return Some(StickerView::Lottie {
            url: format!("{}/{}.json", LOTTIE_STICKER_BASE, id),
        });
    }

    let Some(ext) = sticker_extension(sticker_type) else {
        debug!("Sticker {} has unknown type {}", id, sticker_type);
        return None;
    };
    Some(StickerView::Image {
        url: format!("{}/{}.{}?size=128", STICKER_BASE, id, ext),
        alt: msg.sticker_name.clone().unwrap_or_default(),
    })
}

fn media(attachment: &Attachment, fullscreen: bool) -> MediaView {
    MediaView {
        id: attachment.id.clone(),
        url: attachment.media_url().to_string(),
        alt: attachment.filename.clone(),
        fullscreen,
    }
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
