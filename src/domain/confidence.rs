/// A classifier's confidence in its own output, constrained to `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(transparent)]
pub struct Confidence(f32);

impl Confidence {
    pub fn new(value: f32) -> Result<Self, String> {
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("confidence {value} is outside [0.0, 1.0]"));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f32 { self.0 }
}
