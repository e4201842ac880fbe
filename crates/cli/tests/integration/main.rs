//! End-to-end tests driving the fnkit binary against temporary directories.

mod common;

mod config_tests;
mod create_tests;
mod migrate_tests;
mod repository_tests;
