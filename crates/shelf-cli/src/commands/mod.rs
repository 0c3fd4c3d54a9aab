pub mod add;
pub mod common;
pub mod favorite;
pub mod list;
pub mod pending;
pub mod prune;
pub mod sync;
pub mod watch;
