pub mod config;
pub mod context;
pub mod db;
pub mod expiry;
pub mod geo;
pub mod impact;
pub mod schema;
pub mod types;

pub use config::Config;
pub use context::AppContext;
pub use db::DbPool;
