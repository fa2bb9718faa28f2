//! DOM reduction and semantic-identifier assignment.
//!
//! One recursive pass turns a captured DOM snapshot into a detached output
//! tree: invisible and non-semantic nodes are filtered out, attributes are
//! projected through an allow-list, every interactive element gets a unique
//! hierarchical identifier, and single-child wrapper chains are collapsed.
//! The pass also produces a stamp sheet mapping capture handles to assigned
//! identifiers so the environment can mirror them onto the live page.

mod output;
mod reduce;
mod registry;
mod scripts;
mod snapshot;

pub use output::{InputRecord, OutputChild, OutputNode, PageContent, SelectRecord};
pub use reduce::{reduce_document, ReducedPage, Reducer, Stamp};
pub use registry::{slug, IdRegistry};
pub use scripts::{stamp_script, CAPTURE_JS, HOVER_INSTRUMENT_JS};
pub use snapshot::{ComputedStyle, SourceChild, SourceNode};

/// Attribute carrying a node's assigned semantic identifier.
pub const ATTR_SEMANTIC_ID: &str = "data-semantic-id";
/// Marks the topmost actionable element in its ancestor chain.
pub const ATTR_CLICKABLE: &str = "data-clickable";
/// Best-effort marker written by the hover instrumentation layer.
pub const ATTR_MAYBE_HOVERABLE: &str = "data-maybe-hoverable";
/// Stamped on identifier-bearing editable elements (always "false": disabled
/// elements never receive identifiers).
pub const ATTR_INPUT_DISABLED: &str = "data-input-disabled";
/// Whether the element accepts text edits (inverse of readonly).
pub const ATTR_CAN_EDIT: &str = "data-can-edit";
/// Set when the source element held input focus at capture time.
pub const ATTR_IS_FOCUSED: &str = "data-is-focused";
/// Non-default computed pointer-events value, kept for disabled-reasoning.
pub const ATTR_POINTER_EVENTS: &str = "data-pointer-events";
/// Parsed numeric value of number inputs.
pub const ATTR_NUMERIC_VALUE: &str = "data-numeric-value";
/// Selection range of focused text controls.
pub const ATTR_SELECTION_START: &str = "data-selection-start";
pub const ATTR_SELECTION_END: &str = "data-selection-end";
/// Index of the selected option on a select element.
pub const ATTR_SELECTED_INDEX: &str = "data-selected-index";
/// Comma-joined values of all selected options.
pub const ATTR_SELECTED_VALUES: &str = "data-selected-values";
/// Capture handle stamped on live elements by the capture script. Internal
/// bookkeeping: excluded from attribute projection.
pub const ATTR_NODE_HANDLE: &str = "data-wg-node";
