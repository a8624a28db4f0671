use std::env;
use std::iter::Peekable;
use std::str::Chars;

use crate::types::Token;

/// Split a raw input line into word and operator tokens.
///
/// Space and tab outside quotes separate words; a backslash escapes the next
/// character literally; single quotes pass their span through verbatim
/// (expansion suppressed), double quotes strip the quotes but still expand;
/// `$NAME` is replaced by the environment value wherever it is not
/// single-quoted or escaped. Unquoted `|`, `||`, `&&`, `<`, `>` and `>>`
/// become operator tokens. An unterminated quote consumes to end of line.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = vec![];
    let mut word = String::new();
    // Distinguishes "no word yet" from an explicitly empty word ('' or "").
    let mut started = false;
    let mut chars = line.chars().peekable();

    macro_rules! flush {
        () => {
            if started {
                tokens.push(Token::Word(std::mem::take(&mut word)));
                started = false;
            }
        };
    }

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' | '\n' => flush!(),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    word.push(escaped);
                    started = true;
                }
            }
            '\'' => {
                started = true;
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    word.push(q);
                }
            }
            '"' => {
                started = true;
                while let Some(q) = chars.next() {
                    match q {
                        '"' => break,
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                word.push(escaped);
                            }
                        }
                        '$' => word.push_str(&expand_var(&mut chars)),
                        _ => word.push(q),
                    }
                }
            }
            '$' => {
                word.push_str(&expand_var(&mut chars));
                started = !word.is_empty() || started;
            }
            '|' => {
                flush!();
                if chars.peek() == Some(&'|') {
                    chars.next();
                    tokens.push(Token::Or);
                } else {
                    tokens.push(Token::Pipe);
                }
            }
            '&' => {
                // No background jobs in the grammar; a lone '&' stays a word.
                if chars.peek() == Some(&'&') {
                    chars.next();
                    flush!();
                    tokens.push(Token::And);
                } else {
                    word.push('&');
                    started = true;
                }
            }
            '<' => {
                flush!();
                tokens.push(Token::RedirIn);
            }
            '>' => {
                flush!();
                if chars.peek() == Some(&'>') {
                    chars.next();
                    tokens.push(Token::RedirAppend);
                } else {
                    tokens.push(Token::RedirOut);
                }
            }
            _ => {
                word.push(c);
                started = true;
            }
        }
    }
    flush!();
    tokens
}

/// Consume a `NAME` (letters, digits, underscore) after a `$` and return the
/// environment value, empty if unset. A `$` with no name stays literal.
fn expand_var(chars: &mut Peekable<Chars>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if name.is_empty() {
        "$".to_string()
    } else {
        env::var(&name).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Token::*;

    fn words(line: &str) -> Vec<String> {
        tokenize(line)
            .into_iter()
            .map(|t| match t {
                Word(w) => w,
                other => panic!("expected word, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(words("ls  -la\t/tmp"), ["ls", "-la", "/tmp"]);
    }

    #[test]
    fn empty_line_yields_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
    }

    #[test]
    fn single_quotes_are_verbatim() {
        env::set_var("MINISH_LEX_SQ", "nope");
        assert_eq!(words("echo 'a $MINISH_LEX_SQ b'"), ["echo", "a $MINISH_LEX_SQ b"]);
    }

    #[test]
    fn double_quotes_expand() {
        env::set_var("MINISH_LEX_DQ", "val");
        assert_eq!(words(r#"echo "a $MINISH_LEX_DQ b""#), ["echo", "a val b"]);
    }

    #[test]
    fn bare_dollar_expands() {
        env::set_var("MINISH_LEX_BARE", "xyz");
        assert_eq!(words("echo $MINISH_LEX_BARE"), ["echo", "xyz"]);
    }

    #[test]
    fn unset_variable_is_empty() {
        env::remove_var("MINISH_LEX_UNSET");
        assert_eq!(words("echo a$MINISH_LEX_UNSET"), ["echo", "a"]);
    }

    #[test]
    fn lone_dollar_is_literal() {
        assert_eq!(words("echo $ a"), ["echo", "$", "a"]);
    }

    #[test]
    fn backslash_escapes_literally() {
        assert_eq!(words(r"echo a\ b \$HOME"), ["echo", "a b", "$HOME"]);
        assert_eq!(words(r"echo \|"), ["echo", "|"]);
    }

    #[test]
    fn operators_are_tokens() {
        assert_eq!(
            tokenize("a | b && c || d < e > f >> g"),
            vec![
                Word("a".into()),
                Pipe,
                Word("b".into()),
                And,
                Word("c".into()),
                Or,
                Word("d".into()),
                RedirIn,
                Word("e".into()),
                RedirOut,
                Word("f".into()),
                RedirAppend,
                Word("g".into()),
            ]
        );
    }

    #[test]
    fn operators_need_no_surrounding_space() {
        assert_eq!(
            tokenize("a|b>c"),
            vec![Word("a".into()), Pipe, Word("b".into()), RedirOut, Word("c".into())]
        );
    }

    #[test]
    fn quoted_operators_are_words() {
        assert_eq!(words("echo '|' \"&&\""), ["echo", "|", "&&"]);
    }

    #[test]
    fn lone_ampersand_is_a_word() {
        assert_eq!(words("a & b"), ["a", "&", "b"]);
    }

    #[test]
    fn empty_quotes_make_empty_word() {
        assert_eq!(words("echo ''"), ["echo", ""]);
        assert_eq!(words("echo \"\""), ["echo", ""]);
    }

    #[test]
    fn unterminated_quote_consumes_rest() {
        assert_eq!(words("echo 'a b"), ["echo", "a b"]);
    }

    #[test]
    fn trailing_backslash_is_dropped() {
        assert_eq!(words("echo a\\"), ["echo", "a"]);
    }
}
