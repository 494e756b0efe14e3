//! Shared utilities

pub mod paths;
pub mod slug;

pub use paths::{config_path, data_dir, database_path, init_data_dir, site_dir};
pub use slug::make_slug;
