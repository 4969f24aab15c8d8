//! feedkeeper library
//!
//! A resource-loading pipeline for an image feed: remote loads are cached as
//! a side effect, and the cache answers when the network cannot. The binary
//! in `main.rs` is a thin shell over [`composer::Composer`].

pub mod cache;
pub mod cli;
pub mod composer;
pub mod config;
pub mod data;
pub mod http;
pub mod loader;
pub mod task;

pub use composer::Composer;
pub use config::Config;
pub use loader::{LoadError, LoadResult, Loader, LoaderExt};
pub use task::{Cancellable, Completion, TaskHandle};
