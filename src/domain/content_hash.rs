use sha2::Digest;
use sha2::Sha256;

/// Lowercase hex SHA-256 of a note's UTF-8 bytes — the note-fingerprint used
/// to de-duplicate insights for the same lead. `ContentHash` is only ever
/// constructed via `of` (from a trusted note) or `parse` (validating a value
/// arriving over the wire, e.g. from a Redis stream entry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(note: &str) -> Self {
        let digest = Sha256::digest(note.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn parse(value: String) -> Result<Self, String> {
        let is_hex64 = value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
        if !is_hex64 {
            return Err(format!("{value:?} is not a 64-char lowercase hex digest"));
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
