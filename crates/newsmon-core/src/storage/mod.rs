mod article_repo;
mod database;
mod export_repo;
mod settings_repo;
mod source_repo;
mod summary_repo;

pub use article_repo::{ArticleRepository, Stats};
pub use database::Database;
pub use export_repo::ExportRepository;
pub use settings_repo::{keys, SettingsRepository};
pub use source_repo::SourceRepository;
pub use summary_repo::{NewSummary, SummaryRepository};
