//! Data Transfer Objects for REST request/response serialization.

pub mod action_dto;
pub mod admin_dto;
pub mod common_dto;
pub mod game_dto;
pub mod ranking_dto;

pub use action_dto::*;
pub use admin_dto::*;
pub use common_dto::*;
pub use game_dto::*;
pub use ranking_dto::*;
