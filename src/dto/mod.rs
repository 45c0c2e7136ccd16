pub mod match_dto;
pub mod profile_dto;
pub mod session_dto;
pub mod slot_dto;
