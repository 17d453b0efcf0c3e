//! Control-port protocol client
//!
//! This module provides:
//! - Reply framing for single-line, multi-line and data-block replies
//! - The signal table and the repeat-signal debounce
//! - GETINFO key lookup
//! - The `Controller` session that ties them to one connection

pub mod debounce;
pub mod info;
pub mod reply;
pub mod session;
pub mod signal;

pub use debounce::{SignalDebounce, SIGNAL_DEBOUNCE_WINDOW};
pub use reply::{
    read_reply, read_reply_resumable, skip_reply, Reply, ReplyEntry, ReplyLine, Separator,
    STATUS_OK,
};
pub use session::Controller;
pub use signal::{Signal, UnknownSignal};
