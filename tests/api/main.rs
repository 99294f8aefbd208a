// fn main not required
mod event_log;
mod health_check;
mod insights;
mod leads;
