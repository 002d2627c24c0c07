//! Shared fixtures for the end-to-end dialect tests.

pub mod test_util;
