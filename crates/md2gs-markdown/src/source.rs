//! Source stages: rewrites applied to the raw Markdown before parsing.
//!
//! Each stage works line by line and leaves the content of fenced code
//! blocks untouched, except the generated-image stage which turns its own
//! `$` fences into tilde fences with a sentinel info string.

use std::sync::OnceLock;

use regex::Regex;

/// Info string prefix marking a rewritten generated-image fence
pub const GENERATED_IMAGE_SENTINEL: &str = "md2gs-generated-image";

static QUOTE_PREFIX: OnceLock<Regex> = OnceLock::new();
static FENCE_LINE: OnceLock<Regex> = OnceLock::new();
static LAZY_HEADING: OnceLock<Regex> = OnceLock::new();
static DOLLAR_OPEN: OnceLock<Regex> = OnceLock::new();

fn quote_prefix_regex() -> &'static Regex {
    QUOTE_PREFIX.get_or_init(|| Regex::new(r"^(?:[ ]{0,3}>[ ]?)*").unwrap())
}

fn fence_line_regex() -> &'static Regex {
    FENCE_LINE.get_or_init(|| Regex::new(r"^\s*(?:[-*+]\s+|\d+[.)]\s+)*(`{3,}|~{3,})").unwrap())
}

/// Split a line into its blockquote prefix and the rest
fn split_quote_prefix(line: &str) -> (&str, &str) {
    let end = quote_prefix_regex().find(line).map(|m| m.end()).unwrap_or(0);
    line.split_at(end)
}

fn quote_depth(prefix: &str) -> usize {
    prefix.matches('>').count()
}

/// Tracks whether the current line sits inside a backtick or tilde fence
#[derive(Debug, Default)]
struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Feed a line; returns true when the line belongs to a fence
    /// (including the fence lines themselves)
    fn observe(&mut self, line: &str) -> bool {
        let (_, rest) = split_quote_prefix(line);
        let marker = fence_line_regex()
            .captures(rest)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());
        match (self.open, marker) {
            (None, Some(marker)) => {
                let ch = marker.chars().next().unwrap_or('`');
                self.open = Some((ch, marker.len()));
                true
            }
            (Some((ch, len)), Some(marker)) => {
                let closes = marker.starts_with(ch) && marker.len() >= len;
                let tail = rest.trim_start().trim_start_matches(ch).trim();
                if closes && tail.is_empty() {
                    self.open = None;
                }
                true
            }
            (Some(_), None) => true,
            (None, None) => false,
        }
    }
}

/// Expand tabs to spaces, column aware
pub fn expand_tabs(source: &str, tab_width: usize) -> String {
    if !source.contains('\t') || tab_width == 0 {
        return source.to_string();
    }

    let mut out = String::with_capacity(source.len());
    for (i, line) in source.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut column = 0;
        for ch in line.chars() {
            if ch == '\t' {
                let spaces = tab_width - column % tab_width;
                out.extend(std::iter::repeat(' ').take(spaces));
                column += spaces;
            } else {
                out.push(ch);
                column += 1;
            }
        }
    }
    out
}

/// `#Title` without a space after the hashes becomes `# Title`
pub fn lazy_headers(source: &str) -> String {
    let heading = LAZY_HEADING.get_or_init(|| Regex::new(r"^([ ]{0,3})(#{1,6})([^#\s])").unwrap());

    let mut fences = FenceTracker::default();
    let lines: Vec<String> = source
        .split('\n')
        .map(|line| {
            if fences.observe(line) {
                return line.to_string();
            }
            let (prefix, rest) = split_quote_prefix(line);
            match heading.captures(rest) {
                Some(caps) => {
                    let matched = caps.get(0).map(|m| m.end()).unwrap_or(0);
                    format!(
                        "{}{}{} {}{}",
                        prefix,
                        &caps[1],
                        &caps[2],
                        &caps[3],
                        &rest[matched..]
                    )
                }
                None => line.to_string(),
            }
        })
        .collect();
    lines.join("\n")
}

/// An opening `$` fence found on a line
struct DollarFence {
    /// Text before the marker (quote prefix, indentation, list markers)
    lead: String,
    quote_depth: usize,
    /// Column where the marker starts, relative to the quote prefix
    indent: usize,
    markup: String,
    params: String,
}

fn dollar_open(line: &str) -> Option<DollarFence> {
    let regex = DOLLAR_OPEN.get_or_init(|| {
        Regex::new(r"^([ ]{0,3}(?:(?:[-*+]|\d+[.)])[ ]+)*)(\${1,3})(.*)$").unwrap()
    });
    let (prefix, rest) = split_quote_prefix(line);
    let caps = regex.captures(rest)?;
    let lead = &caps[1];
    Some(DollarFence {
        lead: format!("{}{}", prefix, lead),
        quote_depth: quote_depth(prefix),
        indent: lead.chars().count(),
        markup: caps[2].to_string(),
        params: caps[3].trim().to_string(),
    })
}

fn longest_run(lines: &[&str], ch: char) -> usize {
    lines
        .iter()
        .map(|line| {
            let mut best = 0;
            let mut run = 0;
            for c in line.chars() {
                if c == ch {
                    run += 1;
                    best = best.max(run);
                } else {
                    run = 0;
                }
            }
            best
        })
        .max()
        .unwrap_or(0)
}

/// Rewrite `$`-fenced generated-image blocks into tilde fences whose info
/// string starts with [`GENERATED_IMAGE_SENTINEL`].
///
/// The block runs to the closing fence made of the same markup. Without
/// one it ends at the end of the document, at a change of blockquote depth,
/// or at a non-empty line indented less than the opener.
pub fn generated_image_fences(source: &str) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut fences = FenceTracker::default();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if fences.observe(line) {
            out.push(line.to_string());
            i += 1;
            continue;
        }
        let Some(open) = dollar_open(line) else {
            out.push(line.to_string());
            i += 1;
            continue;
        };

        // Find the end of the block
        let mut end = i + 1;
        let mut close = None;
        while end < lines.len() {
            let (prefix, rest) = split_quote_prefix(lines[end]);
            if quote_depth(prefix) != open.quote_depth {
                break;
            }
            let trimmed = rest.trim();
            let indent = rest.len() - rest.trim_start().len();
            if !trimmed.is_empty() && indent < open.indent {
                break;
            }
            if let Some(tail) = trimmed.strip_prefix(open.markup.as_str()) {
                if tail.trim().is_empty() {
                    close = Some(end);
                    break;
                }
            }
            end += 1;
        }

        let body_end = close.unwrap_or(end);
        let body = &lines[i + 1..body_end];
        let fence = "~".repeat((longest_run(body, '~') + 1).max(3));
        let opener = format!(
            "{}{} {} {}",
            open.lead, fence, GENERATED_IMAGE_SENTINEL, open.params
        );
        out.push(opener.trim_end().to_string());
        out.extend(body.iter().map(|l| l.to_string()));

        match close {
            Some(close_line) => {
                let (prefix, _) = split_quote_prefix(lines[close_line]);
                let pad = " ".repeat(open.indent);
                out.push(format!("{}{}{}", prefix, pad, fence));
                i = close_line + 1;
            }
            None => {
                // Auto-close where the block stopped
                let prefix = match lines.get(i) {
                    Some(l) => split_quote_prefix(l).0.to_string(),
                    None => String::new(),
                };
                out.push(format!("{}{}{}", prefix, " ".repeat(open.indent), fence));
                i = body_end;
            }
        }
    }

    out.join("\n")
}
