//! Agent action schema.
//!
//! Actions arrive as flat JSON objects tagged by an `action` field, e.g.
//! `{"action": "type", "target": "search_input", "text": "rust", "enter": true}`.
//! Every element-targeting action references a semantic identifier produced
//! by the most recent observation.

use serde::Deserialize;

use crate::{Error, Result};

/// One agent-issued action.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Click the element carrying the identifier.
    Click { target: String },
    /// Clear and type into the element; optionally confirm with Enter.
    Type {
        target: String,
        text: String,
        #[serde(default)]
        enter: bool,
    },
    /// Hover the element (triggers tooltips, dropdown menus).
    Hover { target: String },
    /// Select a dropdown option by value or visible text.
    Select { target: String, value: String },
    /// Clear the element's current value.
    Clear { target: String },
    /// Press a key, optionally focused on a specific element.
    KeyPress {
        key: String,
        #[serde(default)]
        target: Option<String>,
    },
    /// Navigate the active tab to a URL.
    GotoUrl { url: String },
    Back,
    Forward,
    Refresh,
    /// Open a new tab, optionally navigating it.
    NewTab {
        #[serde(default)]
        url: Option<String>,
    },
    /// Activate a tab by its position in the tab list.
    SwitchTab { tab_id: usize },
    /// Close a tab by its position in the tab list.
    CloseTab { tab_id: usize },
    /// End the episode, optionally recording a final answer.
    Terminate {
        #[serde(default)]
        answer: Option<String>,
    },
}

impl Action {
    /// Parse an action from its JSON wire form.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Action(e.to_string()))
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Type { .. } => "type",
            Self::Hover { .. } => "hover",
            Self::Select { .. } => "select",
            Self::Clear { .. } => "clear",
            Self::KeyPress { .. } => "key_press",
            Self::GotoUrl { .. } => "goto_url",
            Self::Back => "back",
            Self::Forward => "forward",
            Self::Refresh => "refresh",
            Self::NewTab { .. } => "new_tab",
            Self::SwitchTab { .. } => "switch_tab",
            Self::CloseTab { .. } => "close_tab",
            Self::Terminate { .. } => "terminate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_click() {
        let action = Action::parse(r#"{"action": "click", "target": "login_button"}"#).unwrap();
        assert_eq!(
            action,
            Action::Click {
                target: "login_button".into()
            }
        );
        assert_eq!(action.name(), "click");
    }

    #[test]
    fn parses_type_with_defaults() {
        let action =
            Action::parse(r#"{"action": "type", "target": "username", "text": "jo"}"#).unwrap();
        assert_eq!(
            action,
            Action::Type {
                target: "username".into(),
                text: "jo".into(),
                enter: false
            }
        );

        let action = Action::parse(
            r#"{"action": "type", "target": "username", "text": "jo", "enter": true}"#,
        )
        .unwrap();
        assert!(matches!(action, Action::Type { enter: true, .. }));
    }

    #[test]
    fn parses_navigation_actions() {
        assert_eq!(Action::parse(r#"{"action": "back"}"#).unwrap(), Action::Back);
        assert_eq!(
            Action::parse(r#"{"action": "forward"}"#).unwrap(),
            Action::Forward
        );
        assert_eq!(
            Action::parse(r#"{"action": "refresh"}"#).unwrap(),
            Action::Refresh
        );
        assert_eq!(
            Action::parse(r#"{"action": "goto_url", "url": "http://x.test"}"#).unwrap(),
            Action::GotoUrl {
                url: "http://x.test".into()
            }
        );
    }

    #[test]
    fn parses_key_press_with_optional_target() {
        let global = Action::parse(r#"{"action": "key_press", "key": "Escape"}"#).unwrap();
        assert_eq!(
            global,
            Action::KeyPress {
                key: "Escape".into(),
                target: None
            }
        );
        let targeted =
            Action::parse(r#"{"action": "key_press", "key": "Enter", "target": "search"}"#)
                .unwrap();
        assert!(matches!(targeted, Action::KeyPress { target: Some(t), .. } if t == "search"));
    }

    #[test]
    fn parses_tab_actions() {
        assert_eq!(
            Action::parse(r#"{"action": "new_tab", "url": "http://x.test"}"#).unwrap(),
            Action::NewTab {
                url: Some("http://x.test".into())
            }
        );
        assert_eq!(
            Action::parse(r#"{"action": "new_tab"}"#).unwrap(),
            Action::NewTab { url: None }
        );
        assert_eq!(
            Action::parse(r#"{"action": "switch_tab", "tab_id": 1}"#).unwrap(),
            Action::SwitchTab { tab_id: 1 }
        );
        assert_eq!(
            Action::parse(r#"{"action": "close_tab", "tab_id": 2}"#).unwrap(),
            Action::CloseTab { tab_id: 2 }
        );
    }

    #[test]
    fn parses_terminate() {
        let action =
            Action::parse(r#"{"action": "terminate", "answer": "The total is $12"}"#).unwrap();
        assert_eq!(
            action,
            Action::Terminate {
                answer: Some("The total is $12".into())
            }
        );
    }

    #[test]
    fn rejects_malformed_requests() {
        assert!(Action::parse("not json").is_err());
        assert!(Action::parse(r#"{"action": "fly"}"#).is_err());
        assert!(Action::parse(r#"{"action": "click"}"#).is_err(), "missing target");
        assert!(Action::parse(r#"{"target": "x"}"#).is_err(), "missing action tag");
    }
}
