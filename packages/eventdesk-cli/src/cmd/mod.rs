pub mod auth;
pub mod dashboard;
pub mod events;
pub mod files;
pub mod notifications;
pub mod users;
