//! Fixed client-side actions offered to the model as tools
//!
//! Exactly two zero-argument tools are offered on every completion. The
//! server never executes them; a chosen tool is surfaced to the client as a
//! descriptor header and the client performs the navigation.

use serde::Serialize;

use crate::llm::ToolCall;
use crate::persona::Advocate;

/// The two client actions the model may request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAction {
    /// Open the candidate's public profile page
    OpenLinkedIn,
    /// Open the candidate's resume document
    OpenResume,
}

impl ToolAction {
    /// Wire name of the tool function
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OpenLinkedIn => "open_linkedin",
            Self::OpenResume => "open_resume",
        }
    }

    /// Resolve a wire name back to an action
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "open_linkedin" => Some(Self::OpenLinkedIn),
            "open_resume" => Some(Self::OpenResume),
            _ => None,
        }
    }

    /// Spoken placeholder reply used when a tool turn carries no text
    #[must_use]
    pub const fn placeholder_reply(self) -> &'static str {
        match self {
            Self::OpenLinkedIn => "Opening LinkedIn profile...",
            Self::OpenResume => "Opening resume...",
        }
    }

    /// URL the client navigates to for this action
    #[must_use]
    pub fn url(self, advocate: &Advocate) -> &str {
        match self {
            Self::OpenLinkedIn => &advocate.profile_url,
            Self::OpenResume => &advocate.resume_url,
        }
    }
}

/// OpenAI-style tool definition offered to the completion API
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionDefinition,
}

/// Function schema within a tool definition (always zero parameters here)
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: serde_json::Value,
}

fn zero_arg(name: &'static str, description: &'static str) -> ToolDefinition {
    ToolDefinition {
        kind: "function",
        function: FunctionDefinition {
            name,
            description,
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": [],
            }),
        },
    }
}

/// The fixed two-item tool set offered on every turn
#[must_use]
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        zero_arg(
            ToolAction::OpenLinkedIn.name(),
            "Opens the LinkedIn profile in a new tab",
        ),
        zero_arg(
            ToolAction::OpenResume.name(),
            "Opens the resume in a new tab",
        ),
    ]
}

/// Pick the single honored invocation from a completion's tool calls
///
/// Only the first call is ever considered, even when the model requests
/// several. Returns `None` when there are no calls or the first call names an
/// unknown function (the turn then falls through to the synthesis path).
#[must_use]
pub fn first_action(calls: &[ToolCall]) -> Option<(ToolAction, &ToolCall)> {
    let call = calls.first()?;
    match ToolAction::from_name(&call.function.name) {
        Some(action) => Some((action, call)),
        None => {
            tracing::warn!(name = %call.function.name, "ignoring unknown tool call");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FunctionCall, ToolCall};

    fn call(name: &str) -> ToolCall {
        ToolCall {
            id: Some("call_1".to_string()),
            kind: Some("function".to_string()),
            function: FunctionCall {
                name: name.to_string(),
                arguments: Some("{}".to_string()),
            },
        }
    }

    #[test]
    fn exactly_two_tools_are_offered() {
        let defs = definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].function.name, "open_linkedin");
        assert_eq!(defs[1].function.name, "open_resume");
    }

    #[test]
    fn only_the_first_call_is_honored() {
        let calls = vec![call("open_resume"), call("open_linkedin")];
        let (action, _) = first_action(&calls).unwrap();
        assert_eq!(action, ToolAction::OpenResume);
    }

    #[test]
    fn unknown_first_call_is_ignored() {
        let calls = vec![call("delete_everything"), call("open_resume")];
        assert!(first_action(&calls).is_none());
    }

    #[test]
    fn empty_calls_yield_no_action() {
        assert!(first_action(&[]).is_none());
    }

    #[test]
    fn names_round_trip() {
        for action in [ToolAction::OpenLinkedIn, ToolAction::OpenResume] {
            assert_eq!(ToolAction::from_name(action.name()), Some(action));
        }
        assert_eq!(ToolAction::from_name("open_portal"), None);
    }
}
