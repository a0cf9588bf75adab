//! Command dispatch: parse, execute against the store, and classify.
//!
//! Store and search calls are synchronous SQLite work, so each one runs on
//! the blocking pool. Only [`Error::Storage`] is retried; parse failures and
//! missing keys are reported as-is.

mod reply;

pub use reply::{Outcome, Reply, ReplyStatus};

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::command::{self, Operation};
use crate::config::{Config, RetryConfig};
use crate::error::{Error, Result, StorageError};
use crate::search::SearchEngine;
use crate::store::Store;

/// Executes parsed operations. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Dispatcher {
    store: Store,
    search: SearchEngine,
    list_limit: usize,
    retry: RetryConfig,
    prefix: String,
}

impl Dispatcher {
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            search: SearchEngine::new(store.clone(), config.search.limit),
            store,
            list_limit: config.list.default_limit,
            retry: config.retry.clone(),
            prefix: config.telegram.command.clone(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Handle the argument text that followed the invocation prefix.
    pub async fn handle(&self, text: &str) -> Reply {
        let started = Instant::now();
        let op = match command::parse(text) {
            Ok(op) => op,
            Err(err) => {
                debug!(error = %err, "rejected command");
                return Reply::failure(&Error::Parse(err), &self.prefix);
            }
        };

        let verb = op.command().map(|c| c.as_str()).unwrap_or("help");
        let mutation = op.is_mutation();
        let is_get = matches!(op, Operation::Get { .. });

        let reply = match self.execute(op).await {
            Ok(outcome) => Reply::success(reply::render(&outcome, &self.prefix)),
            Err(Error::NotFound(key)) if is_get => {
                let similar = self.similar_keys(&key).await;
                Reply {
                    status: ReplyStatus::NotFound,
                    text: reply::not_found_with_suggestions(&key, &similar),
                }
            }
            Err(err) => Reply::failure(&err, &self.prefix),
        };

        info!(
            command = verb,
            mutation,
            status = ?reply.status,
            retryable = reply.is_retryable(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "command handled"
        );
        reply
    }

    /// Run one operation to completion.
    pub async fn execute(&self, op: Operation) -> Result<Outcome> {
        match op {
            Operation::Add { key, values } => {
                let store = self.store.clone();
                let (k, v) = (key.clone(), values);
                let inserted = self.with_retry("add", move || store.add(&k, &v)).await?;
                Ok(Outcome::Added { key, inserted })
            }
            Operation::Get { key } => {
                let store = self.store.clone();
                let entry = self.with_retry("get", move || store.get(&key)).await?;
                Ok(Outcome::Values(entry))
            }
            Operation::Remove { key, values } => {
                let store = self.store.clone();
                let (k, v) = (key.clone(), values);
                let removed = self
                    .with_retry("remove", move || store.remove(&k, &v))
                    .await?;
                Ok(Outcome::Removed { key, removed })
            }
            Operation::Delete { key } => {
                let store = self.store.clone();
                let k = key.clone();
                let removed = self.with_retry("delete", move || store.delete(&k)).await?;
                Ok(Outcome::Deleted { key, removed })
            }
            Operation::List { limit } => {
                let store = self.store.clone();
                let limit = limit.unwrap_or(self.list_limit);
                let keys = self.with_retry("list", move || store.list(limit)).await?;
                Ok(Outcome::Sampled { keys })
            }
            Operation::Search { query } => {
                let search = self.search.clone();
                let q = query.clone();
                let keys = self.with_retry("search", move || search.search(&q)).await?;
                Ok(Outcome::Matches { query, keys })
            }
            Operation::Help => Ok(Outcome::Help),
        }
    }

    /// Suggestions for a `get` miss. A failing search only loses the hint.
    async fn similar_keys(&self, key: &str) -> Vec<String> {
        let search = self.search.clone();
        let q = key.to_string();
        match self.with_retry("search", move || search.search(&q)).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "suggestion lookup failed");
                Vec::new()
            }
        }
    }

    async fn with_retry<T, F>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: Fn() -> Result<T> + Clone + Send + 'static,
        T: Send + 'static,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = run_blocking(call.clone()).await;
            match result {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(op, attempt, error = %err, "storage failure");
                    info!(op, delay_ms = delay.as_millis() as u64, "retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!(op, attempt, error = %err, "storage failure, giving up");
                    }
                    return Err(err);
                }
                ok => return ok,
            }
        }
    }
}

async fn run_blocking<T, F>(call: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(call).await {
        Ok(result) => result,
        Err(join) => Err(StorageError::Task(join.to_string()).into()),
    }
}
