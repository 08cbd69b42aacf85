// src/descriptor/mod.rs

//! Package descriptors: declarative build and environment definitions
//!
//! Each package version has a descriptor at
//! `<packages_path>/<name>/<version>/descriptor`:
//!
//! ```toml
//! [package]
//! name = "nuke"
//! version = "11.2v3"
//! executable = "Nuke11.2"
//! requires = ["ocio-2.1"]
//!
//! [[build]]
//! op = "mkdir"
//! path = "{install}/bin"
//!
//! [[build]]
//! op = "command"
//! program = "make"
//! args = ["install", "PREFIX={install}"]
//!
//! [[environment]]
//! action = "prepend"
//! var = "PATH"
//! value = "{root}/bin"
//! ```

mod format;
pub mod parser;
mod store;

pub use format::{BuildStep, EnvAction, PackageDescriptor, PackageSection, Placeholders};
pub use parser::{parse_descriptor, validate_descriptor};
pub use store::{DescriptorStore, DESCRIPTOR_FILE};
