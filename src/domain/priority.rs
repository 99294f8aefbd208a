use serde::Deserialize;
use serde::Serialize;

/// Closed sum type for lead priority, P0 (most urgent) through P3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum Priority {
    #[sqlx(rename = "P0")]
    #[serde(rename = "P0")]
    P0,
    #[sqlx(rename = "P1")]
    #[serde(rename = "P1")]
    P1,
    #[sqlx(rename = "P2")]
    #[serde(rename = "P2")]
    P2,
    #[sqlx(rename = "P3")]
    #[serde(rename = "P3")]
    P3,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        };
        write!(f, "{s}")
    }
}
