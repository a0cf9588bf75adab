use super::{ParseError, ParseErrorKind};

/// Whether `c` opens or closes a quoted span.
///
/// Typographic quotes from mobile keyboards delimit spans too.
pub fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\u{201C}' | '\u{201D}')
}

/// Split command text into whitespace-separated tokens.
///
/// A double-quoted span is copied verbatim (inner whitespace included) and
/// its quotes are dropped. Quotes may sit inside a word, so `a"b c"` is the
/// single token `ab c`. An empty pair of quotes yields an empty token.
pub fn tokenize(input: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote_start: Option<usize> = None;

    for (offset, c) in input.char_indices() {
        if quote_start.is_some() {
            if is_quote(c) {
                quote_start = None;
            } else {
                current.push(c);
            }
            continue;
        }

        if is_quote(c) {
            quote_start = Some(offset);
            in_token = true;
        } else if c.is_whitespace() {
            if in_token {
                tokens.push(std::mem::take(&mut current));
                in_token = false;
            }
        } else {
            current.push(c);
            in_token = true;
        }
    }

    if let Some(start) = quote_start {
        return Err(ParseError::new(
            ParseErrorKind::UnterminatedQuote,
            &input[start..],
        ));
    }

    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_any_whitespace() {
        let tokens = tokenize("  add\tHTTP \n hypertext  ").unwrap();
        assert_eq!(tokens, vec!["add", "HTTP", "hypertext"]);
    }

    #[test]
    fn quoted_span_is_one_token() {
        let tokens = tokenize(r#"add "key with spaces" "value with spaces" value2"#).unwrap();
        assert_eq!(
            tokens,
            vec!["add", "key with spaces", "value with spaces", "value2"]
        );
    }

    #[test]
    fn quotes_inside_a_word_join() {
        let tokens = tokenize(r#"ab"c d"e f"#).unwrap();
        assert_eq!(tokens, vec!["abc de", "f"]);
    }

    #[test]
    fn empty_quotes_give_empty_token() {
        let tokens = tokenize(r#"add "" value"#).unwrap();
        assert_eq!(tokens, vec!["add", "", "value"]);
    }

    #[test]
    fn typographic_quotes_delimit_spans() {
        let tokens = tokenize("get \u{201C}foo bar\u{201D}").unwrap();
        assert_eq!(tokens, vec!["get", "foo bar"]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = tokenize(r#"add key "half open"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedQuote);
        assert_eq!(err.token, "\"half open");
    }

    #[test]
    fn blank_input_has_no_tokens() {
        assert!(tokenize("   ").unwrap().is_empty());
    }
}
