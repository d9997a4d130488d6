mod registry;
mod schedule;
mod worker;

pub use registry::{CronRegistry, TickError};
pub use schedule::Daily;
pub use worker::Worker;
