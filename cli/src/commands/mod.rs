pub mod dismiss;
pub mod pending;
pub mod resolve;
pub mod watch;
