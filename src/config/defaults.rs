/// Default configuration constants used across the system.

/// Default database file name under the state directory.
pub const DEFAULT_DATABASE_FILE: &str = "acrobot.db";

/// Default connection pool size.
pub const DEFAULT_POOL_SIZE: u32 = 8;

/// Default `SQLite` busy timeout.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

/// Default number of keys returned by `search`.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Default sample size for `list` without an explicit limit.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Default chat command that invokes the bot (`/acro`).
pub const DEFAULT_COMMAND: &str = "acro";

/// Default storage retry attempts (including the first try).
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;

/// Default storage retry backoff initial delay.
pub const DEFAULT_RETRY_INITIAL_MS: u64 = 100;

/// Default storage retry backoff max delay.
pub const DEFAULT_RETRY_MAX_MS: u64 = 2_000;

/// Storage retry backoff factor.
pub const RETRY_BACKOFF_FACTOR: u64 = 2;

/// Max text length of a single Telegram message.
pub const TELEGRAM_MAX_TEXT: usize = 4096;
