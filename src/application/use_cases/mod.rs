pub mod attachment;
pub mod auth;
pub mod comment;
pub mod contact;
pub mod organization;
pub mod team;
pub mod ticket;
pub mod user;
