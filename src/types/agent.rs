//! Agent descriptors supplied by the directory collaborator

use serde::{Deserialize, Serialize};

use super::identifiers::AgentId;

/// An independent player process (originally a browser tab)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier
    pub id: AgentId,
    /// Whether this agent currently has focus; at most one agent does
    #[serde(default)]
    pub focused: bool,
    /// Origin of the agent, opaque to the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Agent {
    /// Create an unfocused agent with no url
    pub fn new(id: impl Into<AgentId>) -> Self {
        Self {
            id: id.into(),
            focused: false,
            url: None,
        }
    }

    /// Mark this agent as focused
    #[must_use]
    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }

    /// Attach an origin url
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}
