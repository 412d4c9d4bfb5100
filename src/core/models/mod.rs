pub mod analytics;
pub mod change_log;
pub mod expense;
pub mod settlement;
pub mod trip;
pub mod user;
