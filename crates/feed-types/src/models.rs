use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A message record as relayed by the external companion.
///
/// Every field is optional on the wire. Missing, `null` or wrongly typed
/// values decode as defaults so that a partially shaped payload still
/// renders. Identifiers may arrive as strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedMessage {
    #[serde(deserialize_with = "snowflake")]
    pub id: String,
    #[serde(deserialize_with = "snowflake")]
    pub author: String,
    #[serde(deserialize_with = "lenient")]
    pub author_name: String,
    #[serde(deserialize_with = "lenient")]
    pub global_author_name: String,
    #[serde(deserialize_with = "snowflake")]
    pub avatar_id: String,
    #[serde(deserialize_with = "snowflake")]
    pub channel: String,

    #[serde(deserialize_with = "lenient")]
    pub nickname: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub content: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub time: Option<String>,

    #[serde(deserialize_with = "optional_snowflake")]
    pub sticker_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub sticker_name: Option<String>,
    #[serde(deserialize_with = "optional_number")]
    pub sticker_type: Option<u32>,

    #[serde(deserialize_with = "lenient")]
    pub mentions: Option<Vec<UserMention>>,
    #[serde(deserialize_with = "lenient")]
    pub attachments: Option<Vec<Attachment>>,
}

impl FeedMessage {
    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn has_sticker(&self) -> bool {
        self.sticker_id.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn has_attachments(&self) -> bool {
        self.attachments.as_ref().is_some_and(|a| !a.is_empty())
    }

    /// A record with no text, no sticker and no attachments has nothing to show.
    pub fn is_empty(&self) -> bool {
        !self.has_content() && !self.has_sticker() && !self.has_attachments()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMention {
    #[serde(deserialize_with = "snowflake")]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub username: String,
    #[serde(deserialize_with = "lenient")]
    pub discriminator: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    #[serde(deserialize_with = "snowflake")]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub filename: String,
    #[serde(deserialize_with = "lenient")]
    pub size: u64,
    #[serde(deserialize_with = "lenient")]
    pub url: String,
    #[serde(deserialize_with = "lenient")]
    pub proxy_url: String,
    #[serde(deserialize_with = "optional_number")]
    pub width: Option<u32>,
    #[serde(deserialize_with = "optional_number")]
    pub height: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub content_type: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image/"))
    }

    pub fn is_video(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|t| t.starts_with("video/"))
    }

    /// Source for inline media: the proxy URL when present, else the direct one.
    pub fn media_url(&self) -> &str {
        if self.proxy_url.is_empty() {
            &self.url
        } else {
            &self.proxy_url
        }
    }
}

/// Sticker type reserved for Lottie animations.
pub const LOTTIE_STICKER_TYPE: u32 = 3;

/// Sticker format type -> file extension on the media CDN.
pub const STICKER_TYPE_TO_EXTENSION: &[(u32, &str)] =
    &[(1, "webp"), (2, "png"), (LOTTIE_STICKER_TYPE, "json"), (4, "gif")];

pub fn sticker_extension(sticker_type: u32) -> Option<&'static str> {
    STICKER_TYPE_TO_EXTENSION
        .iter()
        .find(|(t, _)| *t == sticker_type)
        .map(|(_, ext)| *ext)
}

/// Accepts a string or a number; numbers are kept as their decimal text.
/// Anything else decodes as empty.
fn snowflake<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn optional_snowflake<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(snowflake(deserializer)?).filter(|s| !s.is_empty()))
}

/// Accepts a number or a string holding one.
fn optional_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A value of the wrong type decodes as the field's default instead of
/// rejecting the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
