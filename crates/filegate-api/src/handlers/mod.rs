pub mod admin;
pub mod audit;
pub mod auth;
pub mod files;
pub mod health;
