//! Command grammar: turns the text after the invocation prefix into a typed
//! [`Operation`].
//!
//! Parsing is pure. It performs no I/O and never touches the store, so every
//! malformed input is rejected here before a transaction is opened.

mod lexer;

pub use lexer::{is_quote, tokenize};

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ============================================================================
// Verbs
// ============================================================================

/// The verbs understood after the invocation prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add,
    Get,
    Remove,
    Delete,
    List,
    Search,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Add,
        Command::Get,
        Command::Remove,
        Command::Delete,
        Command::List,
        Command::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Add => "add",
            Command::Get => "get",
            Command::Remove => "remove",
            Command::Delete => "delete",
            Command::List => "list",
            Command::Search => "search",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::new(ParseErrorKind::UnknownCommand, s))
    }
}

// ============================================================================
// Operations
// ============================================================================

/// A validated command, ready to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Add { key: String, values: Vec<String> },
    Get { key: String },
    Remove { key: String, values: Vec<String> },
    Delete { key: String },
    List { limit: Option<usize> },
    Search { query: String },
    /// Bare invocation prefix; replies with usage instructions.
    Help,
}

impl Operation {
    /// The verb this operation was parsed from, `None` for [`Operation::Help`].
    pub fn command(&self) -> Option<Command> {
        match self {
            Operation::Add { .. } => Some(Command::Add),
            Operation::Get { .. } => Some(Command::Get),
            Operation::Remove { .. } => Some(Command::Remove),
            Operation::Delete { .. } => Some(Command::Delete),
            Operation::List { .. } => Some(Command::List),
            Operation::Search { .. } => Some(Command::Search),
            Operation::Help => None,
        }
    }

    /// Whether the operation mutates the store.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::Add { .. } | Operation::Remove { .. } | Operation::Delete { .. }
        )
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnknownCommand,
    MissingArguments,
    TooManyArguments,
    EmptyArgument,
    InvalidLimit,
    UnterminatedQuote,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::UnknownCommand => "unknown command",
            ParseErrorKind::MissingArguments => "missing arguments",
            ParseErrorKind::TooManyArguments => "too many arguments",
            ParseErrorKind::EmptyArgument => "empty argument",
            ParseErrorKind::InvalidLimit => "invalid limit",
            ParseErrorKind::UnterminatedQuote => "unterminated quote",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed command text. `token` is the verb or argument at fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: `{token}`")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub token: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, token: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Parse the text following the invocation prefix.
///
/// Empty input parses to [`Operation::Help`].
pub fn parse(input: &str) -> Result<Operation, ParseError> {
    let tokens = tokenize(input)?;
    let Some((verb, args)) = tokens.split_first() else {
        return Ok(Operation::Help);
    };

    let command: Command = verb.parse()?;

    match command {
        Command::Add | Command::Remove => {
            let (key, values) = key_and_values(command, args)?;
            Ok(match command {
                Command::Add => Operation::Add { key, values },
                _ => Operation::Remove { key, values },
            })
        }
        Command::Get | Command::Delete => {
            let key = single_argument(command, args)?;
            Ok(match command {
                Command::Get => Operation::Get { key },
                _ => Operation::Delete { key },
            })
        }
        Command::Search => Ok(Operation::Search {
            query: single_argument(command, args)?,
        }),
        Command::List => match args {
            [] => Ok(Operation::List { limit: None }),
            [limit] => Ok(Operation::List {
                limit: Some(parse_limit(limit)?),
            }),
            _ => Err(ParseError::new(ParseErrorKind::TooManyArguments, command.as_str())),
        },
    }
}

fn non_empty(token: &str) -> Result<String, ParseError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(ParseErrorKind::EmptyArgument, token));
    }
    Ok(trimmed.to_string())
}

fn key_and_values(command: Command, args: &[String]) -> Result<(String, Vec<String>), ParseError> {
    match args {
        [key, values @ ..] if !values.is_empty() => {
            let key = non_empty(key)?;
            let values = values
                .iter()
                .map(|v| non_empty(v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((key, values))
        }
        _ => Err(ParseError::new(ParseErrorKind::MissingArguments, command.as_str())),
    }
}

fn single_argument(command: Command, args: &[String]) -> Result<String, ParseError> {
    match args {
        [] => Err(ParseError::new(ParseErrorKind::MissingArguments, command.as_str())),
        [arg] => non_empty(arg),
        _ => Err(ParseError::new(ParseErrorKind::TooManyArguments, command.as_str())),
    }
}

fn parse_limit(token: &str) -> Result<usize, ParseError> {
    match token.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::new(ParseErrorKind::InvalidLimit, token)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_add_with_multiple_values() {
        let op = parse("add key1 value1 value2").unwrap();
        assert_eq!(
            op,
            Operation::Add {
                key: "key1".into(),
                values: strings(&["value1", "value2"]),
            }
        );
    }

    #[test]
    fn parses_quoted_key_and_values() {
        let op = parse(r#"add "key with spaces" "value with spaces" value2"#).unwrap();
        assert_eq!(
            op,
            Operation::Add {
                key: "key with spaces".into(),
                values: strings(&["value with spaces", "value2"]),
            }
        );
    }

    #[test]
    fn verb_is_case_insensitive() {
        assert_eq!(
            parse("GeT HTTP").unwrap(),
            Operation::Get { key: "HTTP".into() }
        );
        assert_eq!(
            parse("Delete HTTP").unwrap(),
            Operation::Delete { key: "HTTP".into() }
        );
    }

    #[test]
    fn add_and_remove_need_a_value() {
        for input in ["add", "add key1", "remove", "remove key1"] {
            let err = parse(input).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::MissingArguments, "{input}");
        }
        let err = parse("remove key1").unwrap_err();
        assert_eq!(err.token, "remove");
    }

    #[test]
    fn get_and_delete_take_exactly_one_key() {
        assert_eq!(
            parse("get").unwrap_err().kind,
            ParseErrorKind::MissingArguments
        );
        assert_eq!(
            parse("get key1 value1").unwrap_err().kind,
            ParseErrorKind::TooManyArguments
        );
        assert_eq!(
            parse("delete a b").unwrap_err().kind,
            ParseErrorKind::TooManyArguments
        );
    }

    #[test]
    fn search_accepts_a_quoted_phrase() {
        assert_eq!(
            parse(r#"search "transfer pro""#).unwrap(),
            Operation::Search {
                query: "transfer pro".into()
            }
        );
        assert_eq!(
            parse("search key1 key2").unwrap_err().kind,
            ParseErrorKind::TooManyArguments
        );
    }

    #[test]
    fn list_limit_is_optional_and_numeric() {
        assert_eq!(parse("list").unwrap(), Operation::List { limit: None });
        assert_eq!(parse("list 3").unwrap(), Operation::List { limit: Some(3) });

        for input in ["list many", "list 0", "list -2"] {
            let err = parse(input).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::InvalidLimit, "{input}");
        }
        assert_eq!(
            parse("list 1 2").unwrap_err().kind,
            ParseErrorKind::TooManyArguments
        );
    }

    #[test]
    fn unknown_verb_reports_the_token() {
        let err = parse("frobnicate x").unwrap_err();
        assert_eq!(err, ParseError::new(ParseErrorKind::UnknownCommand, "frobnicate"));
        assert_eq!(err.to_string(), "unknown command: `frobnicate`");
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = parse(r#"add "" value1"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyArgument);
        let err = parse(r#"add key "  ""#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::EmptyArgument);
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        let err = parse(r#"get "HTTP"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedQuote);
    }

    #[test]
    fn bare_prefix_is_help() {
        assert_eq!(parse("").unwrap(), Operation::Help);
        assert_eq!(parse("  \n").unwrap(), Operation::Help);
    }

    #[test]
    fn mutations_are_flagged() {
        assert!(parse("add k v").unwrap().is_mutation());
        assert!(parse("delete k").unwrap().is_mutation());
        assert!(!parse("search k").unwrap().is_mutation());
        assert_eq!(parse("list").unwrap().command(), Some(Command::List));
    }
}
