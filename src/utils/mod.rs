//! Utilities for jobtrigger.
//!
//! Submodules:
//! - `json_path`: Lookup paths into JSON event payloads (`$.test.strategy`, `items[0]`).

pub mod json_path;
