pub use uuid;

pub mod cron;
pub mod jobs;

pub mod app_state;
pub mod setup;

pub use color_eyre::Result;
