//! Token stages: rewrites applied to the parsed token stream.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::token::{Tag, Token, VideoService};

static SHORTCODE: OnceLock<Regex> = OnceLock::new();
static YOUTUBE_ID: OnceLock<Regex> = OnceLock::new();
static VIMEO_ID: OnceLock<Regex> = OnceLock::new();
static VINE_ID: OnceLock<Regex> = OnceLock::new();
static PREZI_ID: OnceLock<Regex> = OnceLock::new();
static OSF_ID: OnceLock<Regex> = OnceLock::new();

/// Extract the video id from an id or a full URL
pub fn video_id(service: VideoService, source: &str) -> String {
    let source = source.trim();
    let (regex, group) = match service {
        VideoService::Youtube => (
            YOUTUBE_ID.get_or_init(|| {
                Regex::new(r"^.*((youtu\.be/)|(v/)|(/u/\w/)|(embed/)|(watch\?))\??v?=?([^#&?]*).*")
                    .unwrap()
            }),
            7,
        ),
        VideoService::Vimeo => (
            VIMEO_ID.get_or_init(|| {
                Regex::new(r"^.*(vimeo\.com/)((channels/[A-Za-z]+/)|(groups/[A-Za-z]+/videos/))?([0-9]+)")
                    .unwrap()
            }),
            5,
        ),
        VideoService::Vine => (
            VINE_ID.get_or_init(|| {
                Regex::new(r"^https?://(?:www\.)?vine\.co/v/([a-zA-Z0-9]{1,13}).*").unwrap()
            }),
            1,
        ),
        VideoService::Prezi => (
            PREZI_ID.get_or_init(|| Regex::new(r"^https://prezi\.com/([^/]+)").unwrap()),
            1,
        ),
        VideoService::Osf => (
            OSF_ID.get_or_init(|| {
                Regex::new(
                    r"^https?://(?:www\.)?mfr\.osf\.io/render\?url=https?://osf\.io/([a-zA-Z0-9]{1,5})/\?action=download",
                )
                .unwrap()
            }),
            1,
        ),
    };

    let extracted = regex
        .captures(source)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str());
    match (service, extracted) {
        // YouTube ids are always 11 characters
        (VideoService::Youtube, Some(id)) if id.len() == 11 => id.to_string(),
        (VideoService::Youtube, _) => source.to_string(),
        (_, Some(id)) => id.to_string(),
        (_, None) => source.to_string(),
    }
}

/// Recognize `@[service](id)`.
///
/// The base parser reads this as an `@` followed by a link whose only
/// content is the service name.
pub fn videos(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        if let Some((service, url)) = video_at(&tokens, i) {
            let preceded_by_at = matches!(out.last(), Some(Token::Text { content }) if content.ends_with('@'));
            if preceded_by_at {
                if let Some(Token::Text { content }) = out.last_mut() {
                    content.pop();
                    if content.is_empty() {
                        out.pop();
                    }
                }
                let id = video_id(service, &url);
                debug!(service = service.as_str(), %id, "Embedded video");
                out.push(Token::Video { service, id });
                i += 3;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }

    out
}

fn video_at(tokens: &[Token], i: usize) -> Option<(VideoService, String)> {
    let Token::Open {
        tag: Tag::Link { url, .. },
        ..
    } = tokens.get(i)?
    else {
        return None;
    };
    let service = VideoService::from_name(tokens.get(i + 1)?.as_text()?)?;
    match tokens.get(i + 2)? {
        Token::Close {
            tag: Tag::Link { .. },
        } => Some((service, url.clone())),
        _ => None,
    }
}

/// Replace `:shortcode:` in text with emoji glyphs. Unknown codes stay text.
pub fn emoji(tokens: Vec<Token>) -> Vec<Token> {
    let shortcode = SHORTCODE.get_or_init(|| Regex::new(r":([a-z0-9_+\-]+):").unwrap());
    let mut out = Vec::with_capacity(tokens.len());

    for token in tokens {
        let Token::Text { content } = token else {
            out.push(token);
            continue;
        };

        let mut last = 0;
        let mut at = 0;
        while let Some(caps) = shortcode.captures_at(&content, at) {
            let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let Some(found) = emojis::get_by_shortcode(code.as_str()) else {
                // The closing colon may open the next code
                at = whole.start() + 1;
                continue;
            };
            at = whole.end();
            if whole.start() > last {
                out.push(Token::text(&content[last..whole.start()]));
            }
            out.push(Token::Emoji {
                shortcode: code.as_str().to_string(),
                glyph: found.as_str().to_string(),
            });
            last = whole.end();
        }
        if last == 0 {
            out.push(Token::Text { content });
        } else if last < content.len() {
            out.push(Token::text(&content[last..]));
        }
    }

    out
}
