//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the discussion site and drive
//! the coordinator end-to-end.

mod common;
mod crawl_tests;
mod discovery_tests;
