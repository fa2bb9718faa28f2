//! The observation envelope returned to the agent after setup, reset, and
//! every step.

use serde::Serialize;

use crate::parser::{InputRecord, PageContent, SelectRecord};

/// Everything the agent sees about the environment at one step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Observation {
    /// Serialized reduced DOM of the active tab.
    pub html: String,
    /// Identifiers classified clickable, in document order.
    pub clickable_elements: Vec<String>,
    /// Identifiers carrying the hover marker, in document order.
    pub hoverable_elements: Vec<String>,
    /// Form state of identifier-bearing editable elements.
    pub input_elements: Vec<InputRecord>,
    /// Selection state of identifier-bearing select elements.
    pub select_elements: Vec<SelectRecord>,
    /// All open tabs.
    pub tabs: Vec<TabRecord>,
    /// Set once the agent has issued `terminate`.
    pub terminated: bool,
    /// Final answer recorded by `terminate`, if any.
    pub answer: Option<String>,
    /// Error produced by the preceding action, if any. Action failures are
    /// reported here instead of interrupting the observe/act loop.
    pub error: Option<String>,
}

/// One open tab.
#[derive(Debug, Clone, Serialize)]
pub struct TabRecord {
    /// Position in the tab list; the `tab_id` accepted by tab actions.
    pub id: usize,
    pub title: String,
    pub url: String,
    pub is_active: bool,
}

impl Observation {
    /// Build an observation around one page's reduced content.
    pub fn from_content(content: PageContent) -> Self {
        Self {
            html: content.html,
            clickable_elements: content.clickable_elements,
            hoverable_elements: content.hoverable_elements,
            input_elements: content.input_elements,
            select_elements: content.select_elements,
            ..Self::default()
        }
    }
}
