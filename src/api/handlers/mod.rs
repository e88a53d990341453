pub mod admin;
pub mod auth;
pub mod email;
pub mod event;
pub mod guest;
pub mod health;
pub mod invitation;
