//! Background Tasks Module
//!
//! Contains background tasks owned by long-lived components.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries at a configured interval

mod cleanup;

pub(crate) use cleanup::spawn_cleanup_task;
