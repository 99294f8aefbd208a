use serde::Deserialize;
use serde::Serialize;

/// Closed sum type for the recommended next action on a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NextAction {
    Call,
    Email,
    Ignore,
    Qualify,
}

impl std::fmt::Display for NextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NextAction::Call => "call",
            NextAction::Email => "email",
            NextAction::Ignore => "ignore",
            NextAction::Qualify => "qualify",
        };
        write!(f, "{s}")
    }
}
