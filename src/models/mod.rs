pub mod match_request;
pub mod notification;
pub mod profile;
pub mod session;
pub mod slot;
