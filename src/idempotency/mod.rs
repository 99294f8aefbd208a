mod key;
mod persistence;

pub use key::IdempotencyKey;
pub use persistence::lookup;
pub use persistence::normalize;
pub use persistence::store;
pub use persistence::IdempotencyRecord;
pub use persistence::LookupOutcome;
