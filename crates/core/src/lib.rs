#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # rigbridge-core
//!
//! Shared building blocks for the rigbridge workspace: the core error type,
//! result combinators, filesystem helpers and the on-disk project model.

pub mod error;
pub mod fs;
pub mod project;
pub mod result;

pub use error::Error;
pub use project::{LightMapInfo, Project, ProjectType, UniverseInfo, Version};
pub use result::{Result, ResultExt};
