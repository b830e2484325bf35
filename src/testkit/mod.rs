//! Mock collaborators for exercising the session without any network I/O.
//!
//! - [`stream::ScriptedStream`]: pre-loaded connect results and frames,
//!   with connect/close counters. Best for reconnection and teardown tests.
//! - [`api::ScriptedApi`]: scripted stats/queue responses with failure
//!   injection. Best for polling-fallback tests.
//! - [`fixtures`]: frame and snapshot constructors shared across tests.

pub mod api;
pub mod fixtures;
pub mod stream;
