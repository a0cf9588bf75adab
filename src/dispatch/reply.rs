//! Human-readable reply text.

use crate::command::{ParseError, ParseErrorKind};
use crate::error::{Error, ErrorKind};
use crate::store::Entry;

/// Classification attached to every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Success,
    ParseError,
    NotFound,
    StorageError,
}

impl From<ErrorKind> for ReplyStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Parse => ReplyStatus::ParseError,
            ErrorKind::NotFound => ReplyStatus::NotFound,
            ErrorKind::Storage => ReplyStatus::StorageError,
        }
    }
}

/// What goes back to the chat for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: ReplyStatus,
    pub text: String,
}

impl Reply {
    pub fn success(text: String) -> Self {
        Self {
            status: ReplyStatus::Success,
            text,
        }
    }

    pub fn failure(err: &Error, prefix: &str) -> Self {
        Self {
            status: err.kind().into(),
            text: error_message(&describe_error(err, prefix)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReplyStatus::Success
    }

    /// Whether the caller may resend the same command.
    pub fn is_retryable(&self) -> bool {
        self.status == ReplyStatus::StorageError
    }
}

/// Successful result of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added { key: String, inserted: Vec<String> },
    Values(Entry),
    Removed { key: String, removed: usize },
    Deleted { key: String, removed: usize },
    Sampled { keys: Vec<String> },
    Matches { query: String, keys: Vec<String> },
    Help,
}

// ============================================================================
// Formatting
// ============================================================================

pub fn error_message(message: &str) -> String {
    format!("❌ Error: {message}")
}

pub fn success_message(header: &str, items: &[String]) -> String {
    let mut text = format!("✅ {header}");
    for item in items {
        text.push_str("\n- ");
        text.push_str(item);
    }
    text
}

fn notice_message(message: &str) -> String {
    format!("ℹ️ {message}")
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

pub fn render(outcome: &Outcome, prefix: &str) -> String {
    match outcome {
        Outcome::Added { key, inserted } if inserted.is_empty() => {
            notice_message(&format!("Nothing new for `{key}`: all values already present."))
        }
        Outcome::Added { key, inserted } => success_message(
            &format!("Added {} to `{key}`", plural(inserted.len(), "value")),
            inserted,
        ),
        Outcome::Values(entry) => success_message(&format!("`{}`", entry.key), &entry.values),
        Outcome::Removed { key, removed: 0 } => {
            notice_message(&format!("No matching values for `{key}`; nothing removed."))
        }
        Outcome::Removed { key, removed } => success_message(
            &format!("Removed {} from `{key}`", plural(*removed, "value")),
            &[],
        ),
        Outcome::Deleted { key, removed } => success_message(
            &format!("Deleted `{key}` ({})", plural(*removed, "value")),
            &[],
        ),
        Outcome::Sampled { keys } if keys.is_empty() => notice_message("No keys stored yet."),
        Outcome::Sampled { keys } => {
            success_message(&format!("{} at random", plural(keys.len(), "key")), keys)
        }
        Outcome::Matches { query, keys } if keys.is_empty() => {
            notice_message(&format!("No keys found similar to `{query}`."))
        }
        Outcome::Matches { query, keys } => {
            success_message(&format!("Search results for `{query}`"), keys)
        }
        Outcome::Help => help(prefix),
    }
}

/// `NotFound` reply for `get`, listing similar keys when there are any.
pub fn not_found_with_suggestions(key: &str, similar: &[String]) -> String {
    if similar.is_empty() {
        return error_message(&format!("Values not found for key `{key}`."));
    }
    let mut text = error_message(&format!(
        "Values not found for key `{key}`. Did you mean one of these?"
    ));
    for candidate in similar {
        text.push_str("\n- ");
        text.push_str(candidate);
    }
    text
}

fn describe_error(err: &Error, prefix: &str) -> String {
    match err {
        Error::Parse(parse) => describe_parse_error(parse, prefix),
        Error::NotFound(key) => format!("Key `{key}` not found."),
        Error::Storage(_) => {
            "The glossary is unavailable right now. Please try again later.".to_string()
        }
    }
}

fn describe_parse_error(err: &ParseError, prefix: &str) -> String {
    let token = err.token.as_str();
    match err.kind {
        ParseErrorKind::UnknownCommand => {
            format!("Unknown command `{token}`. Use `/{prefix}` to see available commands.")
        }
        ParseErrorKind::MissingArguments => match token {
            "add" | "remove" => {
                format!("`{token}` needs a key and at least one value.")
            }
            _ => "Missing key argument.".to_string(),
        },
        ParseErrorKind::TooManyArguments => match token {
            "get" => "Only the values for a single key can be retrieved at a time.".to_string(),
            "delete" => "Only a single key can be deleted at a time.".to_string(),
            "search" => {
                "Only a single key can be searched at a time. Quote phrases with spaces.".to_string()
            }
            _ => format!("`{token}` takes at most one number."),
        },
        ParseErrorKind::EmptyArgument => "Keys and values must be non-empty.".to_string(),
        ParseErrorKind::InvalidLimit => {
            format!("Invalid limit `{token}`: expected a positive number.")
        }
        ParseErrorKind::UnterminatedQuote => format!("Unterminated quote in {token}"),
    }
}

/// Usage instructions for the bare invocation prefix.
pub fn help(prefix: &str) -> String {
    format!(
        "🤖 Acrobot - avoid acronym acrobats!\n\
         \n\
         1. Add values to a key\n   /{prefix} add <key> <value> [<value> ...]\n   /{prefix} add \"key with spaces\" \"value with spaces\"\n\
         2. Get the values of a key\n   /{prefix} get <key>\n\
         3. Remove specific values\n   /{prefix} remove <key> <value> [<value> ...]\n\
         4. Delete a key\n   /{prefix} delete <key>\n\
         5. List random keys\n   /{prefix} list [count]\n\
         6. Search keys and values\n   /{prefix} search <fragment>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn success_message_lists_items() {
        assert_eq!(
            success_message("Header", &strings(&["a", "b"])),
            "✅ Header\n- a\n- b"
        );
        assert_eq!(success_message("Header", &[]), "✅ Header");
    }

    #[test]
    fn error_message_format() {
        assert_eq!(error_message("An error occurred."), "❌ Error: An error occurred.");
    }

    #[test]
    fn renders_add_outcomes() {
        let added = Outcome::Added {
            key: "key1".into(),
            inserted: strings(&["value1", "value2"]),
        };
        assert_eq!(
            render(&added, "acro"),
            "✅ Added 2 values to `key1`\n- value1\n- value2"
        );

        let nothing = Outcome::Added {
            key: "key1".into(),
            inserted: vec![],
        };
        assert!(render(&nothing, "acro").contains("already present"));
    }

    #[test]
    fn renders_remove_zero_as_notice() {
        let text = render(
            &Outcome::Removed {
                key: "K".into(),
                removed: 0,
            },
            "acro",
        );
        assert_eq!(text, "ℹ️ No matching values for `K`; nothing removed.");
    }

    #[test]
    fn renders_empty_list_and_search() {
        assert_eq!(
            render(&Outcome::Sampled { keys: vec![] }, "acro"),
            "ℹ️ No keys stored yet."
        );
        assert_eq!(
            render(
                &Outcome::Matches {
                    query: "nonexistent".into(),
                    keys: vec![]
                },
                "acro"
            ),
            "ℹ️ No keys found similar to `nonexistent`."
        );
    }

    #[test]
    fn suggestions_follow_not_found() {
        assert_eq!(
            not_found_with_suggestions("key1", &strings(&["key2", "key3"])),
            "❌ Error: Values not found for key `key1`. Did you mean one of these?\n- key2\n- key3"
        );
        assert_eq!(
            not_found_with_suggestions("key1", &[]),
            "❌ Error: Values not found for key `key1`."
        );
    }

    #[test]
    fn parse_errors_read_naturally() {
        let err = Error::Parse(ParseError::new(ParseErrorKind::TooManyArguments, "get"));
        let reply = Reply::failure(&err, "acro");
        assert_eq!(reply.status, ReplyStatus::ParseError);
        assert_eq!(
            reply.text,
            "❌ Error: Only the values for a single key can be retrieved at a time."
        );

        let err = Error::Parse(ParseError::new(ParseErrorKind::UnknownCommand, "frob"));
        assert!(Reply::failure(&err, "gloss").text.contains("`/gloss`"));
    }

    #[test]
    fn storage_failures_are_retryable_replies() {
        let err = Error::from(rusqlite::Error::InvalidQuery);
        let reply = Reply::failure(&err, "acro");
        assert!(reply.is_retryable());
        assert!(!reply.is_success());
        assert!(!reply.text.contains("sqlite"));
    }

    #[test]
    fn help_uses_the_configured_prefix() {
        let text = help("gloss");
        assert!(text.contains("/gloss add <key>"));
        assert!(text.contains("/gloss search <fragment>"));
    }
}
