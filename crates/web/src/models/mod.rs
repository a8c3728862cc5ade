//! Models held by the web layer.

pub mod session;

pub use session::keys as session_keys;
