//! Acrobot: a shared glossary of keys and values, driven by chat commands.
//!
//! Text after the invocation prefix is parsed by [`command`], executed by
//! [`dispatch::Dispatcher`] against the SQLite-backed [`store::Store`], and
//! answered with a classified [`dispatch::Reply`]. [`search`] resolves
//! fragment queries through the store's trigram mirror.

pub mod channels;
pub mod cli;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod search;
pub mod store;

pub use error::{Error, ErrorKind, Result, StorageError};
