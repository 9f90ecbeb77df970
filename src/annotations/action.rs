//! Actions attached to link, screen and widget annotations.
//!
//! PDF Spec: ISO 32000-1:2008, Section 12.6 - Actions

use crate::object::{Dict, Object};
use serde::{Deserialize, Serialize};

/// An action triggered by activating an annotation (`/A`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Open a URI
    Uri(String),
    /// Go to a page of this document (zero-based)
    GoTo {
        /// Target page index
        page: u32,
    },
    /// Execute a named action such as `NextPage`
    Named(String),
    /// Run a JavaScript snippet
    JavaScript(String),
    /// Launch an application or open a file
    Launch(String),
}

impl Action {
    /// The `/S` action type name.
    pub fn pdf_type(&self) -> &'static str {
        match self {
            Action::Uri(_) => "URI",
            Action::GoTo { .. } => "GoTo",
            Action::Named(_) => "Named",
            Action::JavaScript(_) => "JavaScript",
            Action::Launch(_) => "Launch",
        }
    }

    /// Build the action dictionary.
    pub fn to_dict(&self) -> Dict {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::name("Action"));
        dict.insert("S".to_string(), Object::name(self.pdf_type()));
        match self {
            Action::Uri(uri) => {
                dict.insert("URI".to_string(), Object::String(uri.as_bytes().to_vec()));
            },
            Action::GoTo { page } => {
                dict.insert(
                    "D".to_string(),
                    Object::Array(vec![Object::Integer(*page as i64), Object::name("Fit")]),
                );
            },
            Action::Named(name) => {
                dict.insert("N".to_string(), Object::name(name.as_str()));
            },
            Action::JavaScript(script) => {
                dict.insert("JS".to_string(), Object::text(script));
            },
            Action::Launch(file) => {
                dict.insert("F".to_string(), Object::text(file));
            },
        }
        dict
    }

    /// Parse an action dictionary. Unsupported action types yield `None`.
    pub fn from_dict(dict: &Dict) -> Option<Self> {
        let text = |key: &str| dict.get(key).and_then(Object::as_text);
        match dict.get("S").and_then(Object::as_name)? {
            "URI" => text("URI").map(Action::Uri),
            "GoTo" => {
                let dest = dict.get("D")?.as_array()?;
                let page = dest.first()?.as_integer()?;
                u32::try_from(page).ok().map(|page| Action::GoTo { page })
            },
            "Named" => dict
                .get("N")
                .and_then(Object::as_name)
                .map(|n| Action::Named(n.to_string())),
            "JavaScript" => text("JS").map(Action::JavaScript),
            "Launch" => text("F").map(Action::Launch),
            other => {
                log::debug!("Ignoring unsupported action type /{}", other);
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_action_dict() {
        let action = Action::Uri("https://example.com".to_string());
        let dict = action.to_dict();
        assert_eq!(dict.get("S"), Some(&Object::name("URI")));
        assert_eq!(Action::from_dict(&dict), Some(action));
    }

    #[test]
    fn test_goto_action_dict() {
        let action = Action::GoTo { page: 3 };
        let dict = action.to_dict();
        assert_eq!(Action::from_dict(&dict), Some(action));
    }

    #[test]
    fn test_named_and_script_actions() {
        for action in [
            Action::Named("NextPage".to_string()),
            Action::JavaScript("app.alert('hi')".to_string()),
            Action::Launch("notes.txt".to_string()),
        ] {
            assert_eq!(Action::from_dict(&action.to_dict()), Some(action.clone()));
        }
    }

    #[test]
    fn test_unsupported_action() {
        let mut dict = Dict::new();
        dict.insert("S".to_string(), Object::name("SubmitForm"));
        assert_eq!(Action::from_dict(&dict), None);
    }
}
