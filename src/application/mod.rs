// Application layer - Use cases over the fatality dataset
pub mod dashboard_service;
pub mod dataset_cache;
pub mod fatality_repository;
pub mod session_service;
