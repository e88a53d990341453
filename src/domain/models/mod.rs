pub mod admin;
pub mod auth;
pub mod event;
pub mod guest;
