// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_response;
pub mod json_mapper;
pub mod logging;
pub mod sqlite_repository;
pub mod sse;
