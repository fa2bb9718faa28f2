//! Captured DOM snapshot — the reducer's input.
//!
//! Deserialized from the JSON the capture script returns. Field names follow
//! the script's camelCase output. All fields default so hand-built snapshots
//! in tests stay terse; a missing geometry reads as zero-size, which the
//! visibility gate treats as invisible.

use std::collections::BTreeMap;

use serde::Deserialize;

/// One element of the captured DOM tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceNode {
    /// Lowercase tag name.
    pub tag: String,
    /// Raw attribute map as present on the live element.
    pub attrs: BTreeMap<String, String>,
    /// Computed style subset.
    pub style: ComputedStyle,
    /// Offset width in CSS pixels.
    pub width: f64,
    /// Offset height in CSS pixels.
    pub height: f64,
    /// Live `disabled` property (form controls).
    pub disabled: bool,
    /// Live `readOnly` property (text controls).
    pub read_only: bool,
    /// Current value of form controls.
    pub value: Option<String>,
    /// Live `checked` property (checkbox/radio).
    pub checked: Option<bool>,
    /// Live `selected` property (option elements).
    pub selected: Option<bool>,
    /// Whether this element is the document's active element.
    pub focused: bool,
    /// Selection range of text controls, when defined.
    pub selection_start: Option<u32>,
    pub selection_end: Option<u32>,
    /// Selected option index (select elements).
    pub selected_index: Option<i64>,
    /// Multi-select flag (select elements).
    pub multiple: bool,
    /// Element and text children, in document order.
    pub children: Vec<SourceChild>,

    /// Identifier stamped back by the traversal.
    #[serde(skip)]
    pub semantic_id: Option<String>,
}

/// A child slot: either a nested element or a raw text node.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceChild {
    Text { text: String },
    Element(SourceNode),
}

/// Computed style subset the reducer consults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
    pub cursor: String,
    pub pointer_events: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".into(),
            visibility: "visible".into(),
            opacity: "1".into(),
            cursor: "auto".into(),
            pointer_events: "auto".into(),
        }
    }
}

impl SourceNode {
    /// Bare element with visible defaults. Intended for building snapshots in
    /// code (tests, fixtures); production snapshots arrive via serde.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.into(),
            width: 100.0,
            height: 20.0,
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: SourceNode) -> Self {
        self.children.push(SourceChild::Element(child));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.children.push(SourceChild::Text { text: text.into() });
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Concatenated, whitespace-collapsed text of this subtree. Used to
    /// derive identifier base names.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                SourceChild::Text { text } => {
                    out.push(' ');
                    out.push_str(text);
                }
                SourceChild::Element(el) => el.collect_text(out),
            }
        }
    }
}
