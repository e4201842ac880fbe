//! fnkit-lib: function project descriptors and templates
//!
//! This crate provides the pieces behind the `fnkit` command:
//! - `descriptor`: the `func.yaml` model, its codec and validation
//! - `migration`: upgrades of older descriptors to the current schema
//! - `fingerprint`: build stamps and staleness detection
//! - `manifest`: layered template defaults from `manifest.yaml` files
//! - `repository`, `repositories`, `templates`: the template catalog
//! - `init`: creating a new function from a template
//! - `config`: global settings

pub mod config;
pub mod consts;
pub mod descriptor;
pub mod error;
pub mod fingerprint;
pub mod fs;
pub mod init;
pub mod manifest;
pub mod migration;
pub mod paths;
pub mod repositories;
pub mod repository;
pub mod rundata;
pub mod templates;

pub use descriptor::Descriptor;
pub use error::{Error, ErrorKind, Result};
