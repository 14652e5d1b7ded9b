// Presentation layer - HTTP surface consumed by the dashboard client
pub mod app_state;
pub mod handlers;
