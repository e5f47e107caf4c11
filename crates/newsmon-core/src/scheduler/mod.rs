mod service;

pub use service::{CollectRunner, Scheduler, SchedulerStatus};
