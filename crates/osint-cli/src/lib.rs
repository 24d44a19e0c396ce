//! Library half of the `osint` binary: the built-in collection tools.

pub mod tools;
