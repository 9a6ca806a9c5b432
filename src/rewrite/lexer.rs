//! Java token scanner.
//!
//! Only what identifier-level rewriting needs: identifiers, literals and
//! punctuation with their byte spans. Whitespace and comments are dropped.

use super::error::RewriteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// String literal or text block, quotes included.
    Str,
    Char,
    Number,
    /// `::`
    ColonColon,
    /// `...`
    Ellipsis,
    Punct(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }

    pub fn is_punct(&self, c: u8) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, RewriteError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let start = i;
        match b {
            b' ' | b'\t' | b'\r' | b'\n' | 0x0c => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = find_from(bytes, i, b"\n").unwrap_or(bytes.len());
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = find_from(bytes, i + 2, b"*/").ok_or_else(|| RewriteError::Lex {
                    what: "comment",
                    line: line_of(source, start),
                })?;
                i = end + 2;
            }
            b'"' if bytes[i..].starts_with(b"\"\"\"") => {
                let mut j = i + 3;
                loop {
                    match bytes.get(j) {
                        None => {
                            return Err(RewriteError::Lex {
                                what: "text block",
                                line: line_of(source, start),
                            });
                        }
                        Some(b'\\') => j += 2,
                        Some(b'"') if bytes[j..].starts_with(b"\"\"\"") => break,
                        Some(_) => j += 1,
                    }
                }
                i = j + 3;
                tokens.push(token(TokenKind::Str, start, i));
            }
            b'"' | b'\'' => {
                let mut j = i + 1;
                loop {
                    match bytes.get(j) {
                        None | Some(b'\n') => {
                            return Err(RewriteError::Lex {
                                what: if b == b'"' { "string" } else { "char literal" },
                                line: line_of(source, start),
                            });
                        }
                        Some(b'\\') => j += 2,
                        Some(&c) if c == b => break,
                        Some(_) => j += 1,
                    }
                }
                i = j + 1;
                let kind = if b == b'"' {
                    TokenKind::Str
                } else {
                    TokenKind::Char
                };
                tokens.push(token(kind, start, i));
            }
            b'0'..=b'9' => {
                i += 1;
                while i < bytes.len() {
                    let c = bytes[i];
                    let exponent_sign =
                        (c == b'+' || c == b'-') && matches!(bytes[i - 1], b'e' | b'E' | b'p' | b'P');
                    if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || exponent_sign {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(token(TokenKind::Number, start, i));
            }
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
                tokens.push(token(TokenKind::ColonColon, start, i));
            }
            b'.' if bytes[i..].starts_with(b"...") => {
                i += 3;
                tokens.push(token(TokenKind::Ellipsis, start, i));
            }
            b'.' if bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(token(TokenKind::Number, start, i));
            }
            _ if is_ident_start(source, i) => {
                i += char_len(source, i);
                while i < bytes.len() && is_ident_part(source, i) {
                    i += char_len(source, i);
                }
                tokens.push(token(TokenKind::Ident, start, i));
            }
            _ if b.is_ascii() => {
                i += 1;
                tokens.push(token(TokenKind::Punct(b), start, i));
            }
            _ => i += char_len(source, i),
        }
    }
    Ok(tokens)
}

fn token(kind: TokenKind, start: usize, end: usize) -> Token {
    Token { kind, start, end }
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn char_at(source: &str, i: usize) -> Option<char> {
    source.get(i..).and_then(|s| s.chars().next())
}

fn char_len(source: &str, i: usize) -> usize {
    char_at(source, i).map_or(1, char::len_utf8)
}

fn is_ident_start(source: &str, i: usize) -> bool {
    char_at(source, i).is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
}

fn is_ident_part(source: &str, i: usize) -> bool {
    char_at(source, i).is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// 1-based line of byte offset `pos`.
pub fn line_of(source: &str, pos: usize) -> usize {
    source.as_bytes()[..pos.min(source.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

/// Content of a plain string literal token, without quotes. Text blocks and
/// literals with escapes yield `None`.
pub fn string_content<'s>(token: &Token, source: &'s str) -> Option<&'s str> {
    if token.kind != TokenKind::Str {
        return None;
    }
    let text = token.text(source);
    if text.starts_with("\"\"\"") || text.len() < 2 {
        return None;
    }
    let inner = &text[1..text.len() - 1];
    (!inner.contains('\\')).then_some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<&str> {
        tokenize(source)
            .unwrap()
            .iter()
            .map(|t| t.text(source))
            .collect()
    }

    #[test]
    fn skips_comments_and_keeps_literals() {
        let src = "// World here\nint a = \"World\"; /* World */ char c = '\\''; x::y";
        assert_eq!(
            texts(src),
            ["int", "a", "=", "\"World\"", ";", "char", "c", "=", "'\\''", ";", "x", "::", "y"]
        );
    }

    #[test]
    fn text_blocks_and_numbers() {
        let src = "s = \"\"\"\n  \"quoted\" World\n  \"\"\"; d = 1.5e-3f + .5 + 0x1F;";
        let tokens = texts(src);
        assert_eq!(tokens[2], "\"\"\"\n  \"quoted\" World\n  \"\"\"");
        assert!(tokens.contains(&"1.5e-3f"));
        assert!(tokens.contains(&".5"));
        assert!(tokens.contains(&"0x1F"));
    }

    #[test]
    fn unicode_identifiers() {
        assert_eq!(texts("int wärme$1 = 0;"), ["int", "wärme$1", "=", "0", ";"]);
    }

    #[test]
    fn unterminated_string_reports_line() {
        let err = tokenize("a\nb = \"oops\n").unwrap_err();
        assert!(matches!(err, RewriteError::Lex { line: 2, .. }));
    }

    #[test]
    fn string_content_plain_only() {
        let src = "\"a.b.C\" \"a\\nb\"";
        let tokens = tokenize(src).unwrap();
        assert_eq!(string_content(&tokens[0], src), Some("a.b.C"));
        assert_eq!(string_content(&tokens[1], src), None);
    }
}
