//! Syntax highlighting into style runs.
//!
//! Code is parsed with syntect into a tree of `span` elements (one per
//! scope, classed by the scope's atoms) and text nodes. The tree is then
//! walked depth-first against a [`Stylesheet`], opening a style scope for
//! every styled element.

use md2gs_text::constants::LINE_SEPARATOR;
use md2gs_text::TextBuilder;
use syntect::parsing::{BasicScopeStackOp, ParseState, Scope, ScopeStack, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::{debug, warn};

use crate::css::Stylesheet;

/// Node of a highlighted syntax tree
#[derive(Debug, Clone, PartialEq)]
pub enum HighlightNode {
    Text(String),
    Element {
        tag: String,
        classes: Vec<String>,
        children: Vec<HighlightNode>,
    },
}

impl HighlightNode {
    pub fn span(classes: &[&str], children: Vec<HighlightNode>) -> Self {
        HighlightNode::Element {
            tag: "span".to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            children,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        HighlightNode::Text(value.into())
    }
}

/// Builds a [`HighlightNode`] tree from scope push/pop operations
struct TreeBuilder {
    frames: Vec<(Vec<String>, Vec<HighlightNode>)>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            frames: vec![(Vec::new(), Vec::new())],
        }
    }

    fn text(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        let Some((_, children)) = self.frames.last_mut() else {
            return;
        };
        match children.last_mut() {
            Some(HighlightNode::Text(existing)) => existing.push_str(value),
            _ => children.push(HighlightNode::text(value)),
        }
    }

    fn push(&mut self, scope: Scope) {
        let classes = scope
            .build_string()
            .split('.')
            .map(str::to_string)
            .collect();
        self.frames.push((classes, Vec::new()));
    }

    fn pop(&mut self) {
        if self.frames.len() < 2 {
            return;
        }
        if let Some((classes, children)) = self.frames.pop() {
            if let Some((_, parent)) = self.frames.last_mut() {
                parent.push(HighlightNode::Element {
                    tag: "span".to_string(),
                    classes,
                    children,
                });
            }
        }
    }

    fn finish(mut self) -> Vec<HighlightNode> {
        while self.frames.len() > 1 {
            self.pop();
        }
        self.frames.pop().map(|(_, nodes)| nodes).unwrap_or_default()
    }
}

/// Highlights code blocks into a [`TextBuilder`]
pub struct Highlighter {
    syntaxes: SyntaxSet,
    stylesheet: Stylesheet,
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("syntaxes", &self.syntaxes.syntaxes().len())
            .field("stylesheet", &self.stylesheet)
            .finish()
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(Stylesheet::default_theme())
    }
}

impl Highlighter {
    /// Create a highlighter with the bundled syntax definitions
    pub fn new(stylesheet: Stylesheet) -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            stylesheet,
        }
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// True when `language` names a known syntax
    pub fn supports(&self, language: &str) -> bool {
        self.syntaxes.find_syntax_by_token(language).is_some()
    }

    /// Parse `code` into a syntax tree. `None` for unknown languages or
    /// when the grammar fails on the input.
    pub fn syntax_tree(&self, code: &str, language: &str) -> Option<Vec<HighlightNode>> {
        let syntax = self.syntaxes.find_syntax_by_token(language)?;
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        let mut tree = TreeBuilder::new();

        for line in LinesWithEndings::from(code) {
            let ops = match state.parse_line(line, &self.syntaxes) {
                Ok(ops) => ops,
                Err(err) => {
                    warn!(language, error = %err, "Highlighting failed, using plain text");
                    return None;
                }
            };
            let mut position = 0;
            for (offset, op) in ops {
                let offset = offset.min(line.len());
                if offset > position {
                    tree.text(&line[position..offset]);
                    position = offset;
                }
                let applied = stack.apply_with_hook(&op, |basic, _| match basic {
                    BasicScopeStackOp::Push(scope) => tree.push(scope),
                    BasicScopeStackOp::Pop => tree.pop(),
                });
                if let Err(err) = applied {
                    warn!(language, error = ?err, "Scope stack mismatch, using plain text");
                    return None;
                }
            }
            tree.text(&line[position..]);
        }

        Some(tree.finish())
    }

    /// Append `code` to `builder`, styled when `language` is known.
    ///
    /// Line feeds become line separators so the block stays one paragraph.
    pub fn highlight(&self, code: &str, language: Option<&str>, builder: &mut TextBuilder) {
        let tree = language
            .filter(|l| !l.is_empty())
            .and_then(|l| self.syntax_tree(code, l));
        match tree {
            Some(nodes) => {
                debug!(
                    language = language.unwrap_or_default(),
                    nodes = nodes.len(),
                    "Highlighted code"
                );
                walk(&nodes, &self.stylesheet, builder);
            }
            None => {
                if let Some(language) = language {
                    debug!(language, "No syntax for language");
                }
                builder.append_text(&to_line_separators(code));
            }
        }
    }
}

fn to_line_separators(text: &str) -> String {
    text.replace('\n', &LINE_SEPARATOR.to_string())
}

/// Walk a syntax tree depth-first, appending text and opening style scopes.
/// Elements other than `span` are skipped along with their children.
pub fn walk(nodes: &[HighlightNode], stylesheet: &Stylesheet, builder: &mut TextBuilder) {
    for node in nodes {
        match node {
            HighlightNode::Text(value) => builder.append_text(&to_line_separators(value)),
            HighlightNode::Element {
                tag,
                classes,
                children,
            } => {
                if tag != "span" {
                    continue;
                }
                let style = stylesheet.style_for(classes.as_slice());
                if style.is_empty() {
                    walk(children, stylesheet, builder);
                } else {
                    builder.start_style(style);
                    walk(children, stylesheet, builder);
                    builder.end_style();
                }
            }
        }
    }
}
