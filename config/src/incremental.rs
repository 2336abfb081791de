//! Incremental variable stacking
//!
//! Variables such as FEATURES or CONFIG_PROTECT accumulate across every
//! file that sets them instead of being replaced:
//!
//! ```text
//! FEATURES="${FEATURES} foo"    # works
//! FEATURES="$FEATURES foo"      # works
//! FEATURES="baz bar -* foo"     # only "foo" survives
//! ```
//!
//! The previous value is always folded in by appending, so a reference to
//! the variable itself is dropped rather than expanded later. Tokens are
//! matched exactly: `-nls nls -nls` is kept as written and references to
//! other variables are left for the expansion pass.

/// Token that drops everything accumulated before it
pub const CLEAR_TOKEN: &str = "-*";

/// One operation produced by tokenizing an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Append a word
    Word(&'a str),
    /// Forget all accumulated words
    Clear,
}

/// Split an assignment into merge operations
///
/// Self references (`${NAME}` anywhere in a word, `$NAME` at the end of one)
/// produce no token at all.
pub fn tokenize<'a>(text: &'a str, name: &str) -> Vec<Token<'a>> {
    let braced = format!("${{{}}}", name);
    let bare = format!("${}", name);
    let mut tokens = Vec::new();

    for word in text.split_whitespace() {
        if word == CLEAR_TOKEN {
            tokens.push(Token::Clear);
            continue;
        }

        let mut parts = word.split(braced.as_str()).peekable();
        while let Some(part) = parts.next() {
            let part = if parts.peek().is_none() {
                part.strip_suffix(bare.as_str()).unwrap_or(part)
            } else {
                part
            };
            if !part.is_empty() {
                tokens.push(Token::Word(part));
            }
        }
    }

    tokens
}

/// Merge `text` into the accumulated value of the variable `name`
pub fn merge(accumulated: &str, text: &str, name: &str) -> String {
    let mut words: Vec<&str> = accumulated.split_whitespace().collect();

    for token in tokenize(text, name) {
        match token {
            Token::Word(word) => words.push(word),
            Token::Clear => words.clear(),
        }
    }

    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_assignment() {
        assert_eq!(merge("", "  sandbox   userpriv ", "FEATURES"), "sandbox userpriv");
    }

    #[test]
    fn test_braced_self_reference() {
        let value = merge("", "a b", "VAR");
        assert_eq!(merge(&value, "${VAR} c", "VAR"), "a b c");
    }

    #[test]
    fn test_bare_self_reference() {
        assert_eq!(merge("a", "$VAR b", "VAR"), "a b");
        assert_eq!(merge("a", "b $VAR", "VAR"), "a b");
    }

    #[test]
    fn test_bare_reference_needs_boundary() {
        // $VARX names a different variable
        assert_eq!(merge("a", "$VARX", "VAR"), "a $VARX");
    }

    #[test]
    fn test_embedded_braced_reference_splits() {
        assert_eq!(merge("a", "x${VAR}y", "VAR"), "a x y");
    }

    #[test]
    fn test_clear_token() {
        assert_eq!(merge("", "a b -* c", "VAR"), "c");
        assert_eq!(merge("old stuff", "-* new", "VAR"), "new");
        assert_eq!(merge("x", "a -* b -* c", "VAR"), "c");
    }

    #[test]
    fn test_clear_token_must_be_exact() {
        assert_eq!(merge("a", "foo-*", "VAR"), "a foo-*");
    }

    #[test]
    fn test_other_variables_untouched() {
        assert_eq!(merge("a", "${OTHER} b", "VAR"), "a ${OTHER} b");
    }

    #[test]
    fn test_no_deduplication() {
        assert_eq!(merge("", "-nls nls -nls", "USE"), "-nls nls -nls");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("${F} a -* b", "F"),
            vec![Token::Word("a"), Token::Clear, Token::Word("b")]
        );
    }
}
