//! Integration test harness
//!
//! Each submodule drives the library against wiremock servers.

mod common;
mod crawl_tests;
