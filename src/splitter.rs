//! Splitting of multi-statement scripts into executable statements.

use crate::error::{Result, UpdateError};

/// Splits a script blob into individually executable statements.
pub trait ScriptSplitter: Send + Sync {
    /// Returns the statements of `script` in order, without terminators.
    fn split_script(&self, script: &str) -> Result<Vec<String>>;
}

/// How statements are separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    /// A single character such as `;`.
    Char(char),
    /// A keyword alone on its line, such as `GO`. Matched case-insensitively.
    Batch(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Code,
    LineComment,
    BlockComment,
    Quoted(char),
}

/// Comment and literal aware SQL splitter.
///
/// Terminators inside `--` line comments, `/* */` block comments and quoted
/// literals are not statement boundaries. Quotes are escaped by doubling
/// them; the MySQL preset also accepts backslash escapes, backtick
/// identifiers and `#` line comments. Fragments holding only whitespace or comments are dropped.
///
/// # Examples
///
/// ```
/// use schemakeeper::{ScriptSplitter, SqlScriptSplitter};
///
/// let splitter = SqlScriptSplitter::ansi();
/// let statements = splitter.split_script(
///     "INSERT INTO t VALUES ('a;b'); -- trailing; comment\nDELETE FROM t;",
/// )?;
///
/// assert_eq!(statements, vec![
///     "INSERT INTO t VALUES ('a;b')".to_string(),
///     "-- trailing; comment\nDELETE FROM t".to_string(),
/// ]);
/// # Ok::<(), schemakeeper::UpdateError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlScriptSplitter {
    terminator: Terminator,
    backtick_quotes: bool,
    backslash_escapes: bool,
    hash_comments: bool,
}

impl Default for SqlScriptSplitter {
    fn default() -> Self {
        Self::ansi()
    }
}

impl SqlScriptSplitter {
    /// `;` terminated statements with standard quoting.
    pub fn ansi() -> Self {
        Self {
            terminator: Terminator::Char(';'),
            backtick_quotes: false,
            backslash_escapes: false,
            hash_comments: false,
        }
    }

    /// `;` terminated statements with backtick identifiers, backslash escapes
    /// and `#` line comments.
    pub fn mysql() -> Self {
        Self {
            terminator: Terminator::Char(';'),
            backtick_quotes: true,
            backslash_escapes: true,
            hash_comments: true,
        }
    }

    /// Batches separated by `keyword` alone on a line, e.g. `GO`.
    pub fn batch(keyword: impl Into<String>) -> Self {
        Self {
            terminator: Terminator::Batch(keyword.into()),
            backtick_quotes: false,
            backslash_escapes: false,
            hash_comments: false,
        }
    }

    /// Returns the statement terminator.
    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }

    fn opens_quote(&self, c: char) -> bool {
        c == '\'' || c == '"' || (c == '`' && self.backtick_quotes)
    }

    /// Returns the end of the line starting at `at` if that line is a batch separator.
    fn batch_separator_at(&self, script: &str, at: usize) -> Option<usize> {
        let Terminator::Batch(keyword) = &self.terminator else {
            return None;
        };
        if at != 0 && script.as_bytes()[at - 1] != b'\n' {
            return None;
        }

        let line_end = script[at..].find('\n').map_or(script.len(), |n| at + n + 1);
        script[at..line_end]
            .trim()
            .eq_ignore_ascii_case(keyword)
            .then_some(line_end)
    }
}

impl ScriptSplitter for SqlScriptSplitter {
    fn split_script(&self, script: &str) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        let mut start = 0;
        let mut has_code = false;
        let mut state = Lexeme::Code;
        let mut chars = script.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            let next = chars.peek().map(|&(_, n)| n);

            match state {
                Lexeme::Code => {
                    if let Some(line_end) = self.batch_separator_at(script, i) {
                        push_statement(&mut statements, &script[start..i], has_code);
                        while chars.next_if(|&(j, _)| j < line_end).is_some() {}
                        start = line_end;
                        has_code = false;
                    } else if self.terminator == Terminator::Char(c) {
                        push_statement(&mut statements, &script[start..i], has_code);
                        start = i + c.len_utf8();
                        has_code = false;
                    } else if c == '-' && next == Some('-') {
                        chars.next();
                        state = Lexeme::LineComment;
                    } else if c == '#' && self.hash_comments {
                        state = Lexeme::LineComment;
                    } else if c == '/' && next == Some('*') {
                        chars.next();
                        state = Lexeme::BlockComment;
                    } else if self.opens_quote(c) {
                        has_code = true;
                        state = Lexeme::Quoted(c);
                    } else if !c.is_whitespace() {
                        has_code = true;
                    }
                }
                Lexeme::LineComment => {
                    if c == '\n' {
                        state = Lexeme::Code;
                    }
                }
                Lexeme::BlockComment => {
                    if c == '*' && next == Some('/') {
                        chars.next();
                        state = Lexeme::Code;
                    }
                }
                Lexeme::Quoted(quote) => {
                    if c == '\\' && self.backslash_escapes {
                        chars.next();
                    } else if c == quote {
                        if next == Some(quote) {
                            chars.next();
                        } else {
                            state = Lexeme::Code;
                        }
                    }
                }
            }
        }

        match state {
            Lexeme::Quoted(quote) => Err(UpdateError::invalid_argument(format!(
                "script ends inside a {} quoted literal",
                quote
            ))),
            Lexeme::BlockComment => Err(UpdateError::invalid_argument(
                "script ends inside a block comment",
            )),
            Lexeme::Code | Lexeme::LineComment => {
                push_statement(&mut statements, &script[start..], has_code);
                Ok(statements)
            }
        }
    }
}

fn push_statement(statements: &mut Vec<String>, fragment: &str, has_code: bool) {
    if has_code {
        statements.push(fragment.trim().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(splitter: &SqlScriptSplitter, script: &str) -> Vec<String> {
        splitter.split_script(script).unwrap()
    }

    #[test]
    fn test_splits_on_semicolons() {
        let statements = split(
            &SqlScriptSplitter::ansi(),
            "CREATE TABLE a (id INT);\nCREATE TABLE b (id INT);\n",
        );
        assert_eq!(
            statements,
            vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]
        );
    }

    #[test]
    fn test_last_statement_without_terminator() {
        let statements = split(&SqlScriptSplitter::ansi(), "SELECT 1; SELECT 2");
        assert_eq!(statements, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_ignores_terminators_in_literals_and_comments() {
        let script = "INSERT INTO t VALUES ('it''s; fine', \"x;y\");\n\
                      /* block; comment */ UPDATE t SET a = 1;\n\
                      -- only a comment;\n";
        let statements = split(&SqlScriptSplitter::ansi(), script);
        assert_eq!(
            statements,
            vec![
                "INSERT INTO t VALUES ('it''s; fine', \"x;y\")",
                "/* block; comment */ UPDATE t SET a = 1",
            ]
        );
    }

    #[test]
    fn test_comment_only_fragments_are_dropped() {
        let statements = split(&SqlScriptSplitter::ansi(), ";;  -- nothing here\n/* nor here */;");
        assert!(statements.is_empty());
    }

    #[test]
    fn test_mysql_backslash_escapes_and_backticks() {
        let statements = split(
            &SqlScriptSplitter::mysql(),
            "INSERT INTO `odd;name` VALUES ('it\\'s; ok'); SELECT 1;",
        );
        assert_eq!(
            statements,
            vec!["INSERT INTO `odd;name` VALUES ('it\\'s; ok')", "SELECT 1"]
        );
    }

    #[test]
    fn test_mysql_hash_comments() {
        let statements = split(
            &SqlScriptSplitter::mysql(),
            "# add column; later\nALTER TABLE t ADD c INT;\n# trailing; note\n",
        );
        assert_eq!(statements, vec!["# add column; later\nALTER TABLE t ADD c INT"]);
    }

    #[test]
    fn test_ansi_treats_hash_as_code() {
        let statements = split(&SqlScriptSplitter::ansi(), "SELECT a #b; SELECT 2");
        assert_eq!(statements, vec!["SELECT a #b", "SELECT 2"]);
    }

    #[test]
    fn test_ansi_rejects_unterminated_literal() {
        let err = SqlScriptSplitter::ansi()
            .split_script("SELECT 'open;")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: script ends inside a ' quoted literal"
        );
    }

    #[test]
    fn test_batch_separator() {
        let script = "CREATE PROCEDURE p AS SELECT 1; SELECT 2;\nGO\n  go  \nPRINT 'GO'\nGO";
        let statements = split(&SqlScriptSplitter::batch("GO"), script);
        assert_eq!(
            statements,
            vec!["CREATE PROCEDURE p AS SELECT 1; SELECT 2;", "PRINT 'GO'"]
        );
    }

    #[test]
    fn test_batch_separator_inside_block_comment() {
        let script = "SELECT 1\n/*\nGO\n*/\nSELECT 2\nGO\n";
        let statements = split(&SqlScriptSplitter::batch("GO"), script);
        assert_eq!(statements, vec!["SELECT 1\n/*\nGO\n*/\nSELECT 2"]);
    }
}
