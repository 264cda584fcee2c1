//! Resource shapes exchanged with the API.

pub mod event;
pub mod file;
pub mod notification;
pub mod page;
pub mod user;

pub use event::*;
pub use file::*;
pub use notification::*;
pub use page::*;
pub use user::*;
