//! Cross-module tests for fnkit-lib through its public API.

mod common;

mod lifecycle_tests;
