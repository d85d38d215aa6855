//! nginx configuration lexer
//!
//! Turns raw file content into normalized statements (one directive, one
//! block opener or one block closer per statement) and classifies them.

use nom::{
    branch::alt,
    bytes::complete::{escaped, is_not, take_while1},
    character::complete::{anychar, char, multispace0},
    combinator::{all_consuming, map, opt},
    multi::many0,
    sequence::{delimited, preceded, terminated},
    IResult,
};

/// Quote state of a left-to-right character scan.
///
/// A quote only opens a string at the start of a token; inside a word such
/// as `don't` it is a plain character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteState {
    open: Option<char>,
    escaped: bool,
    in_word: bool,
}

impl QuoteState {
    /// Feed the next character. Returns `true` when the character is live
    /// syntax: outside quotes, not escaped and not a string delimiter.
    pub fn advance(&mut self, c: char) -> bool {
        if self.escaped {
            self.escaped = false;
            self.in_word = true;
            return false;
        }

        if c == '\\' {
            self.escaped = true;
            return false;
        }

        match self.open {
            Some(quote) => {
                if c == quote {
                    self.open = None;
                    self.in_word = true;
                }
                false
            }
            None if (c == '"' || c == '\'') && !self.in_word => {
                self.open = Some(c);
                false
            }
            None => {
                self.in_word = !(c.is_whitespace() || matches!(c, ';' | '{' | '}'));
                true
            }
        }
    }

    /// Whether the scan currently sits inside a quoted string
    pub fn in_quotes(&self) -> bool {
        self.open.is_some()
    }

    /// Mark a token boundary, as at the start of a new line
    pub fn break_token(&mut self) {
        if self.open.is_none() {
            self.in_word = false;
        }
    }
}

/// Kind of a normalized statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `name args {`
    BlockStart,
    /// `}`
    BlockEnd,
    /// `name value;`
    Statement,
}

/// Check if the line carries an unquoted `{`
pub fn is_block_start(line: &str) -> bool {
    let mut state = QuoteState::default();
    line.chars().any(|c| state.advance(c) && c == '{')
}

/// Check if the line carries an unquoted `}` and leaves no quote open
pub fn is_block_end(line: &str) -> bool {
    let mut state = QuoteState::default();
    let mut found = false;

    for c in line.chars() {
        if state.advance(c) && c == '}' {
            found = true;
        }
    }

    found && !state.in_quotes()
}

/// Classify a normalized statement
pub fn classify(line: &str) -> LineKind {
    if is_block_end(line) {
        LineKind::BlockEnd
    } else if is_block_start(line) {
        LineKind::BlockStart
    } else {
        LineKind::Statement
    }
}

/// Normalize file content into a flat list of statements.
///
/// Comments are stripped, whitespace outside quotes is collapsed, statements
/// spanning several lines are joined and lines holding several statements are
/// split. `include` statements are left in place for the caller to expand.
pub fn normalize(content: &str) -> Vec<String> {
    let mut normalizer = Normalizer::default();
    for line in content.lines() {
        normalizer.push_line(line);
    }
    normalizer.finish()
}

#[derive(Debug, Default)]
struct Normalizer {
    pending: String,
    quote: QuoteState,
    statements: Vec<String>,
}

impl Normalizer {
    fn push_line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }

        if !self.pending.is_empty() && !self.pending.ends_with(' ') {
            self.pending.push(' ');
        }
        self.quote.break_token();

        for c in line.chars() {
            if !self.quote.advance(c) {
                self.pending.push(c);
                continue;
            }

            match c {
                '#' => break,
                ';' => {
                    self.pending.push(';');
                    self.flush();
                }
                '{' => {
                    let head = self.pending.trim();
                    let statement = if head.is_empty() {
                        "{".to_string()
                    } else {
                        format!("{} {{", head)
                    };
                    self.statements.push(statement);
                    self.pending.clear();
                }
                '}' => {
                    self.flush();
                    self.statements.push("}".to_string());
                }
                c if c.is_whitespace() => {
                    if !self.pending.is_empty() && !self.pending.ends_with(' ') {
                        self.pending.push(' ');
                    }
                }
                c => self.pending.push(c),
            }
        }
    }

    fn flush(&mut self) {
        let statement = self.pending.trim();
        if !statement.is_empty() {
            self.statements.push(statement.to_string());
        }
        self.pending.clear();
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.statements
    }
}

/// Split a directive statement into its name and raw value.
///
/// The value is everything after the first space, without the terminator.
pub fn parse_property(statement: &str) -> (String, String) {
    let body = statement.strip_suffix(';').unwrap_or(statement).trim_end();

    match body.split_once(' ') {
        Some((name, value)) => (name.to_string(), value.to_string()),
        None => (body.to_string(), String::new()),
    }
}

/// Name of the directive a statement starts with
pub fn directive_name(statement: &str) -> &str {
    statement
        .split(|c: char| c == ' ' || c == ';' || c == '{')
        .next()
        .unwrap_or_default()
}

/// Parsed `name args {` block opener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub name: String,
    /// Arguments with surrounding quotes removed
    pub args: Vec<String>,
    /// Argument text exactly as written
    pub raw_args: String,
}

impl BlockHeader {
    pub fn parse(statement: &str) -> Self {
        let trimmed = statement.trim_end();
        let body = trimmed.strip_suffix('{').unwrap_or(trimmed).trim();
        let (name, rest) = body.split_once(' ').unwrap_or((body, ""));

        let args = match header_arguments(rest) {
            Ok((_, args)) => args,
            // Unbalanced quotes; fall back to plain word splitting
            Err(_) => rest.split_whitespace().map(str::to_string).collect(),
        };

        Self {
            name: name.to_string(),
            args,
            raw_args: rest.trim().to_string(),
        }
    }

    /// First argument, if any
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(|s| s.as_str())
    }

    /// Condition of an `if` block: the text between the first `(` and the
    /// last `)`, or the whole argument text when parentheses are missing.
    pub fn condition(&self) -> String {
        let raw = &self.raw_args;
        match (raw.find('('), raw.rfind(')')) {
            (Some(start), Some(end)) if start < end => raw[start + 1..end].trim().to_string(),
            _ => raw.clone(),
        }
    }
}

fn header_arguments(input: &str) -> IResult<&str, Vec<String>> {
    all_consuming(terminated(
        many0(preceded(multispace0, argument)),
        multispace0,
    ))(input)
}

fn argument(input: &str) -> IResult<&str, String> {
    alt((double_quoted, single_quoted, word))(input)
}

fn double_quoted(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('"'),
            opt(escaped(is_not("\\\""), '\\', anychar)),
            char('"'),
        ),
        |s: Option<&str>| s.unwrap_or_default().to_string(),
    )(input)
}

fn single_quoted(input: &str) -> IResult<&str, String> {
    map(
        delimited(
            char('\''),
            opt(escaped(is_not("\\'"), '\\', anychar)),
            char('\''),
        ),
        |s: Option<&str>| s.unwrap_or_default().to_string(),
    )(input)
}

fn word(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| !c.is_whitespace() && c != '"' && c != '\''),
        |s: &str| s.to_string(),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_state() {
        let mut state = QuoteState::default();
        assert!(state.advance('a'));
        assert!(state.advance(' '));
        assert!(!state.advance('"'));
        assert!(state.in_quotes());
        assert!(!state.advance('\''));
        assert!(state.in_quotes());
        assert!(!state.advance('"'));
        assert!(!state.in_quotes());
        assert!(!state.advance('\\'));
        assert!(!state.advance('{'));
        assert!(state.advance('{'));
    }

    #[test]
    fn test_quote_inside_word_is_literal() {
        let mut state = QuoteState::default();
        for c in "don".chars() {
            assert!(state.advance(c));
        }
        assert!(state.advance('\''));
        assert!(!state.in_quotes());

        assert!(is_block_start("location /it's {"));
        assert!(is_block_end("return 200 don't; }"));
    }

    #[test]
    fn test_block_classifier() {
        assert!(is_block_start("server {"));
        assert!(!is_block_start("return 200 '{';"));
        assert!(is_block_start("location = '{' {"));
        assert!(is_block_end("}"));
        assert!(!is_block_end("return 200 \"}\";"));
        assert!(!is_block_end("return 200 \"}"));

        assert_eq!(classify("http {"), LineKind::BlockStart);
        assert_eq!(classify("}"), LineKind::BlockEnd);
        assert_eq!(classify("listen 80;"), LineKind::Statement);
    }

    #[test]
    fn test_normalize_comments_and_spaces() {
        let input = "  # comment\nresolver_timeout           10s;\n\n  location = '{' { # TEST\n}";
        assert_eq!(
            normalize(input),
            vec!["resolver_timeout 10s;", "location = '{' {", "}"]
        );
    }

    #[test]
    fn test_normalize_keeps_quoted_text() {
        let input = "add_header X-Test \"a  # b;\";";
        assert_eq!(normalize(input), vec!["add_header X-Test \"a  # b;\";"]);
    }

    #[test]
    fn test_normalize_joins_multiline_statements() {
        let input = "log_format main '$remote_addr'\n    '$status'\n    '$body_bytes_sent';";
        assert_eq!(
            normalize(input),
            vec!["log_format main '$remote_addr' '$status' '$body_bytes_sent';"]
        );

        let input = "server\n{\nlisten\n80;\n}";
        assert_eq!(normalize(input), vec!["server {", "listen 80;", "}"]);
    }

    #[test]
    fn test_normalize_apostrophe_in_word() {
        let input = "server {\n    return 200 don't;\n    listen 80;\n}\n";
        assert_eq!(
            normalize(input),
            vec!["server {", "return 200 don't;", "listen 80;", "}"]
        );

        let input = "log_format main 'it''s'\n  \"$status\";";
        assert_eq!(normalize(input), vec!["log_format main 'it''s' \"$status\";"]);
    }

    #[test]
    fn test_normalize_splits_one_line_blocks() {
        let input = "events { worker_connections 1024; }\nlocation / { root /var/www; index index.html; }";
        assert_eq!(
            normalize(input),
            vec![
                "events {",
                "worker_connections 1024;",
                "}",
                "location / {",
                "root /var/www;",
                "index index.html;",
                "}",
            ]
        );
    }

    #[test]
    fn test_parse_property() {
        assert_eq!(
            parse_property("listen 443 ssl http2;"),
            ("listen".to_string(), "443 ssl http2".to_string())
        );
        assert_eq!(
            parse_property("ip_hash;"),
            ("ip_hash".to_string(), String::new())
        );
        assert_eq!(directive_name("include conf.d/*.conf;"), "include");
        assert_eq!(directive_name("include_subdomains;"), "include_subdomains");
    }

    #[test]
    fn test_block_header() {
        let header = BlockHeader::parse("location ~* \"\\.(gif|jpg)$\" {");
        assert_eq!(header.name, "location");
        assert_eq!(header.args, vec!["~*", "\\.(gif|jpg)$"]);

        let header = BlockHeader::parse("server {");
        assert_eq!(header.name, "server");
        assert!(header.args.is_empty());
        assert_eq!(header.first_arg(), None);

        let header = BlockHeader::parse("upstream backend {");
        assert_eq!(header.first_arg(), Some("backend"));
    }

    #[test]
    fn test_block_header_condition() {
        let header = BlockHeader::parse("if ($request_method = POST) {");
        assert_eq!(header.name, "if");
        assert_eq!(header.condition(), "$request_method = POST");

        let header = BlockHeader::parse("if ($http_user_agent ~ (MSIE|Trident)) {");
        assert_eq!(header.condition(), "$http_user_agent ~ (MSIE|Trident)");

        let header = BlockHeader::parse("if $invalid {");
        assert_eq!(header.condition(), "$invalid");
    }
}
