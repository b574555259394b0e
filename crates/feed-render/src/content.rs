use std::fmt;
use std::sync::LazyLock;

use chrono::TimeZone;
use regex::{Captures, Regex};
use serde::Serialize;

use feed_types::models::UserMention;

use crate::html::escape;
use crate::time::{RenderContext, TimestampStyle, UNKNOWN_TIMESTAMP};

const EMOJI_CDN: &str = "https://cdn.discordapp.com/emojis";

static USER_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?([0-9]+)>").expect("Invalid user mention regex"));
static ROLE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@&([0-9]+)>").expect("Invalid role mention regex"));
static EVERYONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@everyone").expect("Invalid everyone regex"));
static HAMMERTIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<t:([0-9]+)(?::([tTdDfFR]))?>").expect("Invalid timestamp regex")
});
static EMOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(a?):([^:<>]+):([0-9]+)>").expect("Invalid emote regex"));
static MALFORMED_EMOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a?:([^:>]*)[^>]*>").expect("Invalid emote fallback regex"));
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("Invalid URL regex"));
static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|webp)(\?\S*)?$").expect("Invalid image URL regex")
});
static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(mp4|webm|mov|avi|mkv|flv|wmv|m4v)(\?\S*)?$")
        .expect("Invalid video URL regex")
});
static NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n").expect("Invalid newline regex"));

/// One piece of rendered message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// Styled mention; the label includes the leading `@`.
    Mention(String),
    Timestamp { text: String, full: String },
    Emote { name: String, url: String },
    Link(String),
    LineBreak,
}

/// Message text after every substitution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedContent {
    pub html: String,
    /// Media URLs lifted out of the text, in order of appearance.
    pub image_urls: Vec<String>,
    pub video_urls: Vec<String>,
    #[serde(skip)]
    pub segments: Vec<Segment>,
}

/// Run the ordered substitution passes over raw message text.
///
/// Each pass only sees plain text left behind by earlier passes, so markup
/// produced by one pass (emote images in particular) is never re-matched.
pub fn parse_content<Tz>(
    content: &str,
    mentions: &[UserMention],
    ctx: &RenderContext<Tz>,
) -> ParsedContent
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut segments = vec![Segment::Text(content.to_string())];

    for mention in mentions.iter().filter(|m| !m.id.is_empty()) {
        let pattern = format!("<@!?{}>", regex::escape(&mention.id));
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        segments = replace_text(segments, &re, |_| {
            Some(Segment::Mention(format!("@{}", mention.username)))
        });
    }
    segments = replace_text(segments, &USER_MENTION, |_| {
        Some(Segment::Mention("@unknown".into()))
    });

    // Role names are not resolvable from the payload.
    segments = replace_text(segments, &ROLE_MENTION, |_| {
        Some(Segment::Mention("@RoleMention".into()))
    });
    segments = replace_text(segments, &EVERYONE, |_| {
        Some(Segment::Mention("@everyone".into()))
    });

    segments = replace_text(segments, &HAMMERTIME, |caps| {
        let style = TimestampStyle::from_letter(caps.get(2).map(|m| m.as_str()));
        Some(match ctx.stamp(&caps[1], style) {
            Some(stamp) => Segment::Timestamp {
                text: stamp.text,
                full: stamp.full,
            },
            None => Segment::Text(UNKNOWN_TIMESTAMP.into()),
        })
    });

    segments = replace_text(segments, &EMOTE, |caps| {
        Some(emote(&caps[2], &caps[3], &caps[1] == "a"))
    });
    segments = replace_text(segments, &MALFORMED_EMOTE, |caps| {
        Some(Segment::Text(bracketed(&caps[1])))
    });

    let mut image_urls = Vec::new();
    let mut video_urls = Vec::new();
    segments = replace_text(segments, &URL, |caps| {
        let url = &caps[0];
        if VIDEO_URL.is_match(url) {
            video_urls.push(url.to_string());
            None
        } else if IMAGE_URL.is_match(url) {
            image_urls.push(url.to_string());
            None
        } else {
            Some(Segment::Link(url.to_string()))
        }
    });

    segments = replace_text(segments, &NEWLINE, |_| Some(Segment::LineBreak));

    ParsedContent {
        html: to_html(&segments),
        image_urls,
        video_urls,
        segments,
    }
}

fn emote(name: &str, id: &str, animated: bool) -> Segment {
    let valid_id = id.parse::<u64>().is_ok_and(|n| n != 0);
    if !valid_id || name.trim().is_empty() {
        return Segment::Text(bracketed(name));
    }
    let extension = if animated { "gif" } else { "webp" };
    Segment::Emote {
        name: name.to_string(),
        url: format!("{}/{}.{}?size=64", EMOJI_CDN, id, extension),
    }
}

fn bracketed(name: &str) -> String {
    if name.trim().is_empty() {
        "[emote]".to_string()
    } else {
        format!("[{}]", name)
    }
}

/// Split every text segment on `re`, replacing each match with the segment
/// `f` returns, or dropping it when `f` returns `None`.
fn replace_text<F>(segments: Vec<Segment>, re: &Regex, mut f: F) -> Vec<Segment>
where
    F: FnMut(&Captures<'_>) -> Option<Segment>,
{
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let Segment::Text(text) = segment else {
            out.push(segment);
            continue;
        };

        let mut last = 0;
        for caps in re.captures_iter(&text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_segment(&mut out, Segment::Text(text[last..whole.start()].to_string()));
            if let Some(replacement) = f(&caps) {
                push_segment(&mut out, replacement);
            }
            last = whole.end();
        }
        push_segment(&mut out, Segment::Text(text[last..].to_string()));
    }
    out
}

/// Adjacent text is merged so later passes see it as one run.
fn push_segment(out: &mut Vec<Segment>, segment: Segment) {
    if let Segment::Text(text) = &segment {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(prev)) = out.last_mut() {
            prev.push_str(text);
            return;
        }
    }
    out.push(segment);
}

pub fn to_html(segments: &[Segment]) -> String {
    let mut html = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => html.push_str(&escape(text)),
            Segment::Mention(label) => {
                html.push_str(&format!(r#"<span class="mention">{}</span>"#, escape(label)));
            }
            Segment::Timestamp { text, full } => {
                html.push_str(&format!(
                    r#"<span class="hammertime-timestamp" title="{}">{}</span>"#,
                    escape(full),
                    escape(text)
                ));
            }
            Segment::Emote { name, url } => {
                let name = escape(name);
                html.push_str(&format!(
                    r#"<img src="{}" alt="{}" class="inline-emote" data-fallback="[{}]" />"#,
                    escape(url),
                    name,
                    name
                ));
            }
            Segment::Link(url) => {
                let url = escape(url);
                html.push_str(&format!(
                    r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                    url, url
                ));
            }
            Segment::LineBreak => html.push_str("<br>"),
        }
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn ctx() -> RenderContext<Utc> {
        RenderContext::new(Utc, DateTime::from_timestamp(1_700_259_200, 0).unwrap())
    }

    fn mention(id: &str, username: &str) -> UserMention {
        UserMention {
            id: id.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    fn parse(content: &str) -> ParsedContent {
        parse_content(content, &[], &ctx())
    }

    #[test]
    fn mixed_tokens_render_together() {
        let parsed = parse_content(
            "<@123> hello <t:1700000000:R> <:wave:987654321>",
            &[mention("123", "bob")],
            &ctx(),
        );

        assert!(parsed.html.contains(r#"<span class="mention">@bob</span>"#));
        let stamp = parsed.segments.iter().find_map(|s| match s {
            Segment::Timestamp { text, .. } => Some(text.as_str()),
            _ => None,
        });
        assert_eq!(stamp, Some("November 14, 2023 10:13 PM (3 days ago)"));
        assert!(parsed.html.contains(">November 14, 2023 10:13 PM (3 days ago)</span>"));
        assert!(parsed.html.contains(
            r#"<img src="https://cdn.discordapp.com/emojis/987654321.webp?size=64" alt="wave""#
        ));
        assert!(!parsed.html.contains("&lt;t:"));
        assert!(parsed.image_urls.is_empty());
    }

    #[test]
    fn unresolved_role_and_broadcast_mentions() {
        let parsed = parse_content(
            "<@!1> <@2> <@&3> @everyone",
            &[mention("1", "alice")],
            &ctx(),
        );
        let mentions: Vec<_> = parsed
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Mention(label) => Some(label.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(mentions, ["@alice", "@unknown", "@RoleMention", "@everyone"]);
    }

    #[test]
    fn mention_usernames_are_escaped() {
        let parsed = parse_content("<@9>", &[mention("9", "<b>x</b>")], &ctx());
        assert_eq!(
            parsed.html,
            r#"<span class="mention">@&lt;b&gt;x&lt;/b&gt;</span>"#
        );
    }

    #[test]
    fn non_ascii_digits_are_left_as_text() {
        let parsed = parse("<@١٢> <t:١٢٣>");
        assert_eq!(parsed.segments, vec![Segment::Text("<@١٢> <t:١٢٣>".into())]);
        assert_eq!(parsed.html, "&lt;@١٢&gt; &lt;t:١٢٣&gt;");
    }

    #[test]
    fn bad_timestamp_falls_back() {
        let parsed = parse("at <t:99999999999999999999:f>!");
        assert_eq!(parsed.html, "at Unknown Timestamp!");
    }

    #[test]
    fn animated_emote_uses_gif() {
        let parsed = parse("<a:party:42>");
        assert_eq!(
            parsed.segments,
            vec![Segment::Emote {
                name: "party".into(),
                url: "https://cdn.discordapp.com/emojis/42.gif?size=64".into(),
            }]
        );
    }

    #[test]
    fn invalid_emotes_fall_back_to_brackets() {
        assert_eq!(parse("<:wave:0>").html, "[wave]");
        assert_eq!(parse("<: :12>").html, "[emote]");
        assert_eq!(parse("<:wave:abc>").html, "[wave]");
        assert_eq!(parse("<a:>").html, "[emote]");
    }

    #[test]
    fn emote_names_are_escaped() {
        let parsed = parse(r#"<:a"b&c:5>"#);
        assert!(parsed.html.contains(r#"alt="a&quot;b&amp;c""#));
        assert!(parsed.html.contains(r#"data-fallback="[a&quot;b&amp;c]""#));
    }

    #[test]
    fn media_urls_are_extracted_in_order() {
        let parsed = parse(
            "look https://x.io/a.png and https://x.io/b.JPG?w=2 then https://x.io/c.mp4 end",
        );
        assert_eq!(
            parsed.image_urls,
            ["https://x.io/a.png", "https://x.io/b.JPG?w=2"]
        );
        assert_eq!(parsed.video_urls, ["https://x.io/c.mp4"]);
        assert!(!parsed.html.contains("x.io"));
        assert_eq!(parsed.html, "look  and  then  end");
    }

    #[test]
    fn plain_urls_become_links() {
        let parsed = parse("see https://example.com/page?q=1&r=2");
        assert_eq!(
            parsed.html,
            r#"see <a href="https://example.com/page?q=1&amp;r=2" target="_blank" rel="noopener noreferrer">https://example.com/page?q=1&amp;r=2</a>"#
        );
    }

    #[test]
    fn emote_images_are_not_treated_as_urls() {
        let parsed = parse("<:cat:77> https://x.io/d.gif");
        assert_eq!(parsed.image_urls, ["https://x.io/d.gif"]);
        assert!(matches!(parsed.segments[0], Segment::Emote { .. }));
        assert!(parsed.html.contains("emojis/77.webp"));
    }

    #[test]
    fn newlines_and_raw_markup() {
        let parsed = parse("line one\r\n<script>x</script>\nend");
        assert_eq!(
            parsed.html,
            "line one<br>&lt;script&gt;x&lt;/script&gt;<br>end"
        );
    }
}
