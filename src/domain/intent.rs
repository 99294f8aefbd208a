use serde::Deserialize;
use serde::Serialize;

/// Closed sum type for a lead's classified intent. Encoded as lowercase text
/// on the wire (JSON, Redis stream fields) and in the `insights.intent`
/// column, per §9's "dynamic typing -> tagged enums" design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Buy,
    Support,
    Spam,
    Job,
    Other,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Intent::Buy => "buy",
            Intent::Support => "support",
            Intent::Spam => "spam",
            Intent::Job => "job",
            Intent::Other => "other",
        };
        write!(f, "{s}")
    }
}
