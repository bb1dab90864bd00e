//! Types shared between the upload service and its clients.
//!
//! Everything here is plain serde data: the backend produces these values and any
//! client (browser, CLI, tests) consumes them as JSON. Field names are camelCase on
//! the wire and record ids go out as `_id`, which is what the existing web client reads.

pub mod model;
pub mod responses;
