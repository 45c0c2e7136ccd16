pub mod automation_service;
pub mod hook_service;
pub mod match_service;
pub mod notification_service;
pub mod profile_service;
pub mod scoring;
pub mod session_service;
pub mod slot_service;
