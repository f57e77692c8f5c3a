pub mod classify;
pub mod error;
pub mod notification;
pub mod resolution;
