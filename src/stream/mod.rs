mod log;

pub use log::EventLog;
pub use log::EventLogError;
pub use log::RedisEventLog;
pub use log::StreamEntry;

#[cfg(test)]
pub use log::fake;
