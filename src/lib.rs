//! makenovel: a novel kept as plotlines, nested parts and ordered chapters in flat
//! files, bound into single documents recorded in the project's version control.

pub mod bind;
pub mod config;
pub mod editor;
pub mod env;
pub mod error;
pub mod models;
pub mod novel;
pub mod prompt;
pub mod render;
pub mod store;
pub mod vcs;

pub use bind::{BindState, Binder};
pub use config::Config;
pub use env::NovelEnvironment;
pub use error::{NovelError, Result};
pub use novel::Novel;
