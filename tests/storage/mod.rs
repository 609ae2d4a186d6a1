//! Storage Integration Tests

pub mod concurrent_writes_test;
