//! `{#id .class key=value}` attribute syntax.
//!
//! Attributes attach to a block when they trail its text, and to an image,
//! inline code span or inline container when they directly follow it.

use std::sync::OnceLock;

use regex::Regex;

use crate::token::{Attributes, Tag, Token};

static TRAILING: OnceLock<Regex> = OnceLock::new();
static LEADING: OnceLock<Regex> = OnceLock::new();
static ITEM: OnceLock<Regex> = OnceLock::new();

fn trailing_regex() -> &'static Regex {
    TRAILING.get_or_init(|| Regex::new(r"[ \t]*\{([^{}\n]*)\}[ \t]*$").unwrap())
}

fn leading_regex() -> &'static Regex {
    LEADING.get_or_init(|| Regex::new(r"^\{([^{}\n]*)\}").unwrap())
}

fn item_regex() -> &'static Regex {
    ITEM.get_or_init(|| {
        Regex::new(
            r#"#([\w:-]+)|\.([\w:-]+)|([\w:-]+)=(?:"([^"]*)"|'([^']*)'|([^\s"']+))|([\w:-]+)"#,
        )
        .unwrap()
    })
}

/// Parse the inside of an attribute block (without the braces).
///
/// Returns `None` when the content is empty or contains anything that is
/// not an attribute, so ordinary text in braces is left alone.
pub fn parse_attributes(content: &str) -> Option<Attributes> {
    let mut attrs = Attributes::default();
    let mut consumed = 0;
    let mut any = false;

    for caps in item_regex().captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        if !content[consumed..whole.start()].trim().is_empty() {
            return None;
        }
        consumed = whole.end();
        any = true;

        if let Some(id) = caps.get(1) {
            attrs.id = Some(id.as_str().to_string());
        } else if let Some(class) = caps.get(2) {
            let class = class.as_str().to_string();
            if !attrs.has_class(&class) {
                attrs.classes.push(class);
            }
        } else if let Some(key) = caps.get(3) {
            let value = caps
                .get(4)
                .or_else(|| caps.get(5))
                .or_else(|| caps.get(6))
                .map(|m| m.as_str())
                .unwrap_or_default();
            attrs.pairs.push((key.as_str().to_string(), value.to_string()));
        } else if let Some(flag) = caps.get(7) {
            attrs.pairs.push((flag.as_str().to_string(), String::new()));
        }
    }

    if !any || !content[consumed..].trim().is_empty() {
        return None;
    }
    Some(attrs)
}

/// Strip a trailing `{...}` from `text`, returning the remaining text and
/// the parsed attributes
pub fn split_trailing(text: &str) -> Option<(&str, Attributes)> {
    let caps = trailing_regex().captures(text)?;
    let whole = caps.get(0)?;
    let attrs = parse_attributes(caps.get(1)?.as_str())?;
    Some((&text[..whole.start()], attrs))
}

/// Strip a leading `{...}` from `text`, returning the parsed attributes and
/// the remaining text
pub fn split_leading(text: &str) -> Option<(Attributes, &str)> {
    let caps = leading_regex().captures(text)?;
    let whole = caps.get(0)?;
    let attrs = parse_attributes(caps.get(1)?.as_str())?;
    Some((attrs, &text[whole.end()..]))
}

fn is_block(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Paragraph | Tag::Heading(_) | Tag::TableCell | Tag::ListItem
    )
}

/// Attach attribute blocks in the token stream to their targets.
pub fn apply(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    // Indices in `out` of the currently open containers
    let mut open: Vec<usize> = Vec::new();
    // Index of the open token of the last inline container closed
    let mut last_closed_inline: Option<usize> = None;

    for token in tokens {
        match token {
            Token::Open { .. } => {
                last_closed_inline = None;
                open.push(out.len());
                out.push(token);
            }
            Token::Close { tag } => {
                let opener = open.pop();
                if is_block(&tag) {
                    if let Some(opener) = opener {
                        attach_trailing(&mut out, opener);
                    }
                }
                last_closed_inline = if tag.is_inline() { opener } else { None };
                out.push(Token::Close { tag });
            }
            Token::Text { content } => {
                let target = match out.last() {
                    Some(Token::Image { .. }) | Some(Token::Code { .. }) => Some(out.len() - 1),
                    Some(Token::Close { .. }) => last_closed_inline,
                    _ => None,
                };
                last_closed_inline = None;

                let leading = target.and_then(|index| {
                    split_leading(&content).map(|(attrs, rest)| (index, attrs, rest.to_string()))
                });
                match leading {
                    Some((index, attrs, rest)) => {
                        if let Some(existing) = out[index].attrs_mut() {
                            existing.extend(attrs);
                        }
                        if !rest.is_empty() {
                            out.push(Token::Text { content: rest });
                        }
                    }
                    None => out.push(Token::Text { content }),
                }
            }
            other => {
                last_closed_inline = None;
                out.push(other);
            }
        }
    }

    out
}

/// Move a `{...}` trailing the last text of a block onto its open token
fn attach_trailing(out: &mut Vec<Token>, opener: usize) {
    let Some(last) = out.len().checked_sub(1) else {
        return;
    };
    if last <= opener {
        return;
    }
    let Some(text) = out[last].as_text() else {
        return;
    };
    let Some((rest, attrs)) = split_trailing(text) else {
        return;
    };
    let rest = rest.trim_end().to_string();

    if rest.is_empty() {
        out.remove(last);
    } else {
        out[last] = Token::Text { content: rest };
    }
    if let Some(existing) = out[opener].attrs_mut() {
        existing.extend(attrs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attribute_forms() {
        let attrs = parse_attributes(r#"#intro .big .column layout="Title and body" n=3 flag"#)
            .unwrap();
        assert_eq!(attrs.id.as_deref(), Some("intro"));
        assert_eq!(attrs.classes, vec!["big", "column"]);
        assert_eq!(attrs.get("layout"), Some("Title and body"));
        assert_eq!(attrs.get("n"), Some("3"));
        assert_eq!(attrs.get("flag"), Some(""));
    }

    #[test]
    fn test_rejects_non_attribute_braces() {
        assert!(parse_attributes("").is_none());
        assert!(parse_attributes("a, b").is_none());
        assert!(parse_attributes("x + y").is_none());
        assert!(split_trailing("set {1, 2}").is_none());
    }

    #[test]
    fn test_trailing_block_attributes() {
        let tokens = vec![
            Token::open(Tag::Heading(1)),
            Token::text("Title {.big}"),
            Token::close(Tag::Heading(1)),
        ];
        let out = apply(tokens);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], Token::text("Title"));
        match &out[0] {
            Token::Open { attrs, .. } => assert!(attrs.has_class("big")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_attribute_only_paragraph_drops_text() {
        let tokens = vec![
            Token::open(Tag::Paragraph),
            Token::text("{.column}"),
            Token::close(Tag::Paragraph),
        ];
        let out = apply(tokens);
        assert_eq!(out.len(), 2);
        match &out[0] {
            Token::Open { attrs, .. } => assert!(attrs.has_class("column")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_image_attributes() {
        let tokens = vec![
            Token::open(Tag::Paragraph),
            Token::Image {
                url: "bg.png".into(),
                title: String::new(),
                alt: String::new(),
                attrs: Attributes::default(),
            },
            Token::text("{.background} more"),
            Token::close(Tag::Paragraph),
        ];
        let out = apply(tokens);
        match &out[1] {
            Token::Image { attrs, .. } => assert!(attrs.has_class("background")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(out[2], Token::text(" more"));
    }

    #[test]
    fn test_inline_container_attributes() {
        let tokens = vec![
            Token::open(Tag::Paragraph),
            Token::open(Tag::Strong),
            Token::text("loud"),
            Token::close(Tag::Strong),
            Token::text("{color=red}"),
            Token::close(Tag::Paragraph),
        ];
        let out = apply(tokens);
        match &out[1] {
            Token::Open { tag: Tag::Strong, attrs } => assert_eq!(attrs.get("color"), Some("red")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(out.iter().all(|t| t.as_text() != Some("{color=red}")));
    }
}
