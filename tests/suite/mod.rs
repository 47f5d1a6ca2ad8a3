//! Integration test suite modules

mod concurrency;
mod config;
mod node_end_to_end;
