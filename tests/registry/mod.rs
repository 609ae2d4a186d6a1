//! Registry Integration Tests

pub mod components_pool_test;
