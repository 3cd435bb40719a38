pub mod app_controller;
pub mod post_controller;

// Re-export key functions
pub use app_controller::{init_feed, start_app};
