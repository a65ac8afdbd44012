//! Token stream produced by the tokenizer.
//!
//! The stream is flat: containers are bracketed by [`Token::Open`] and
//! [`Token::Close`], leaves stand alone.

use serde::{Deserialize, Serialize};

/// `{#id .class key=value}` attributes attached to a token
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pairs: Vec<(String, String)>,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.classes.is_empty() && self.pairs.is_empty()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Value of the last `key=value` pair with this key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Merge `other` into `self`; later ids and pairs win, classes accumulate
    pub fn extend(&mut self, other: Attributes) {
        if other.id.is_some() {
            self.id = other.id;
        }
        for class in other.classes {
            if !self.has_class(&class) {
                self.classes.push(class);
            }
        }
        self.pairs.extend(other.pairs);
    }
}

/// Container kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Paragraph,
    Heading(u8),
    BlockQuote,
    /// `start` is set for ordered lists
    List { start: Option<u64> },
    ListItem,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { url: String, title: String },
}

impl Tag {
    /// Inline containers can take attributes that directly follow them
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. }
        )
    }
}

/// Embedded video hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoService {
    Youtube,
    Vimeo,
    Vine,
    Prezi,
    Osf,
}

impl VideoService {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "youtube" => Some(Self::Youtube),
            "vimeo" => Some(Self::Vimeo),
            "vine" => Some(Self::Vine),
            "prezi" => Some(Self::Prezi),
            "osf" => Some(Self::Osf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Vimeo => "vimeo",
            Self::Vine => "vine",
            Self::Prezi => "prezi",
            Self::Osf => "osf",
        }
    }
}

/// A single token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    Open {
        tag: Tag,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        attrs: Attributes,
    },
    Close {
        tag: Tag,
    },
    Text {
        content: String,
    },
    Code {
        content: String,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        attrs: Attributes,
    },
    SoftBreak,
    HardBreak,
    Rule,
    Html {
        content: String,
    },
    CodeBlock {
        language: Option<String>,
        content: String,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        attrs: Attributes,
    },
    Image {
        url: String,
        title: String,
        alt: String,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        attrs: Attributes,
    },
    Emoji {
        shortcode: String,
        glyph: String,
    },
    Video {
        service: VideoService,
        id: String,
    },
    GeneratedImage {
        params: String,
        content: String,
    },
}

impl Token {
    pub fn open(tag: Tag) -> Self {
        Token::Open {
            tag,
            attrs: Attributes::default(),
        }
    }

    pub fn close(tag: Tag) -> Self {
        Token::Close { tag }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Token::Text {
            content: content.into(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Token::Text { content } => Some(content),
            _ => None,
        }
    }

    /// Attributes of tokens that can carry them
    pub fn attrs_mut(&mut self) -> Option<&mut Attributes> {
        match self {
            Token::Open { attrs, .. }
            | Token::Code { attrs, .. }
            | Token::CodeBlock { attrs, .. }
            | Token::Image { attrs, .. } => Some(attrs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_merge() {
        let mut attrs = Attributes {
            classes: vec!["big".into()],
            ..Default::default()
        };
        attrs.extend(Attributes {
            id: Some("intro".into()),
            classes: vec!["big".into(), "column".into()],
            pairs: vec![("layout".into(), "BLANK".into())],
        });
        assert_eq!(attrs.classes, vec!["big", "column"]);
        assert_eq!(attrs.id.as_deref(), Some("intro"));
        assert_eq!(attrs.get("layout"), Some("BLANK"));
        assert_eq!(attrs.get("missing"), None);
    }

    #[test]
    fn test_token_json_shape() {
        let json = serde_json::to_value(Token::text("hi")).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["content"], "hi");

        let json = serde_json::to_value(Token::open(Tag::Heading(1))).unwrap();
        assert_eq!(json["type"], "open");
        assert!(json.get("attrs").is_none());
    }

    #[test]
    fn test_video_service_names() {
        assert_eq!(VideoService::from_name("YouTube"), Some(VideoService::Youtube));
        assert_eq!(VideoService::from_name("dailymotion"), None);
        assert_eq!(VideoService::Osf.as_str(), "osf");
    }
}
