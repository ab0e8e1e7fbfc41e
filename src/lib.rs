//! Media cache, rotation and upload-verification core for a species
//! identification quiz bot.
//!
//! Images live in a git repository laid out as `<category>/<item>/<file>`.
//! The bot side keeps a local working copy, syncs it on demand and rotates
//! through each item's images per channel. The upload side pushes a
//! verification repository and applies community votes to move images
//! into the main repository.

pub mod categories;
pub mod channel;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod jobs;
pub mod media;
pub mod store;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use context::Context;
pub use error::{Error, Result};
