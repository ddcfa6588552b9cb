mod models;
mod schema;
mod store;
mod timeline;

pub use models::*;
pub use schema::{BASE_TABLES, OVERRIDE_TABLES, OVERRIDES_SCHEMA};
pub use store::SqliteHistoryStore;
pub use timeline::{ChartMode, ListeningHistory, MonthlyCount, YearlyCount};
