pub mod articles;
pub mod collect;
pub mod export;
pub mod run;
pub mod settings;
pub mod sources;
pub mod stats;
pub mod summarize;
