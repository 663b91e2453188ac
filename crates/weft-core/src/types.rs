use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declare a string-backed id newtype with a stable prefix.
///
/// Ids serialize as plain strings (`"nd_…"`) so graph JSON written by other
/// services round-trips unchanged.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh id.
            pub fn new() -> Self {
                Self(format!(concat!($prefix, "_{}"), Uuid::new_v4().simple()))
            }

            pub fn from_str(s: &str) -> Self {
                Self(s.to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifies an agent (the owner of a stored graph).
    AgentId, "agnt"
);
id_type!(
    /// Identifies one execution attempt. Partial-artifact ordering is only
    /// guaranteed within a single execution id.
    ExecutionId, "exec"
);
id_type!(
    /// Identifies a node in the workflow graph.
    NodeId, "nd"
);
id_type!(
    /// Identifies an input or output slot on a node.
    NodeHandleId, "ndh"
);
id_type!(FlowId, "flw");
id_type!(StepId, "stp");
id_type!(TeamId, "tm");

/// Subscription plan of the team owning an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

/// The team an agent belongs to, as resolved by the quota service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub plan: Plan,
    #[serde(default)]
    pub active_subscription_id: Option<String>,
}

impl Team {
    /// Whether this team is on a paid plan with an active subscription.
    pub fn is_pro(&self) -> bool {
        self.plan == Plan::Pro && self.active_subscription_id.is_some()
    }
}

/// Token usage reported by a generation backend for one completed call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}
