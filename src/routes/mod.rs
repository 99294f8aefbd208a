mod health_check;
mod insights;
mod leads;

pub use health_check::health_check;
pub use insights::get_insight;
pub use leads::create_lead;
pub use leads::get_lead;
pub use leads::LeadPayload;
