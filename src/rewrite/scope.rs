//! Per-file declarations: package, imports and declared types.

use std::collections::HashSet;

use crate::mapping::descriptor::simple_name;

use super::lexer::{Token, TokenKind};

/// Token index range `[start, end)` of a dotted name.
pub type TokenRange = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub is_static: bool,
    pub on_demand: bool,
    /// Dotted name without the trailing `.*`.
    pub path: String,
    pub name_range: TokenRange,
    /// Whole statement, `import` through `;`.
    pub stmt_range: TokenRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    /// Internal name, `pkg/Outer$Inner`.
    pub internal: String,
    /// Token index of the declared identifier.
    pub name_token: usize,
    pub top_level: bool,
    /// Dotted names written after `extends` / `implements`.
    pub supertypes: Vec<String>,
    /// Token range of the body braces.
    pub body: TokenRange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileScope {
    /// Slashed package, empty for the default package.
    pub package: String,
    pub package_range: Option<TokenRange>,
    pub imports: Vec<Import>,
    pub types: Vec<DeclaredType>,
    /// Tokens that belong to `package`/`import` statements.
    pub header_end: usize,
}

impl FileScope {
    pub fn analyze(tokens: &[Token], source: &str) -> FileScope {
        let mut scope = FileScope::default();
        let text = |i: usize| tokens[i].text(source);
        let mut i = 0;

        // Package annotations are skipped without ending the header.
        while i < tokens.len() {
            if tokens[i].is_punct(b'@')
                && tokens
                    .get(i + 1)
                    .is_some_and(|t| t.is_ident() && text(i + 1) != "interface")
            {
                i = skip_annotation(tokens, source, i);
                continue;
            }
            match text(i) {
                "package" if tokens[i].is_ident() => {
                    let (path, range, next) = dotted_name(tokens, source, i + 1);
                    scope.package = path.replace('.', "/");
                    scope.package_range = Some(range);
                    i = skip_past_semicolon(tokens, next);
                    scope.header_end = i;
                }
                "import" if tokens[i].is_ident() => {
                    let stmt_start = i;
                    let mut j = i + 1;
                    let is_static = tokens.get(j).is_some_and(|_| text(j) == "static");
                    if is_static {
                        j += 1;
                    }
                    let (path, name_range, mut next) = dotted_name(tokens, source, j);
                    let on_demand = tokens.get(next).is_some_and(|t| t.is_punct(b'.'))
                        && tokens.get(next + 1).is_some_and(|t| t.is_punct(b'*'));
                    if on_demand {
                        next += 2;
                    }
                    let end = skip_past_semicolon(tokens, next);
                    scope.imports.push(Import {
                        is_static,
                        on_demand,
                        path,
                        name_range,
                        stmt_range: (stmt_start, end),
                    });
                    i = end;
                    scope.header_end = i;
                }
                ";" => i += 1,
                _ => break,
            }
        }
        let header_end = scope.header_end;
        scope.collect_types(tokens, source, header_end);
        scope
    }

    fn collect_types(&mut self, tokens: &[Token], source: &str, from: usize) {
        let text = |i: usize| tokens[i].text(source);
        // (internal name, brace depth of its body)
        let mut stack: Vec<(String, usize)> = Vec::new();
        let mut depth = 0usize;
        let mut i = from;

        while i < tokens.len() {
            let tok = &tokens[i];
            if tok.is_punct(b'{') {
                depth += 1;
            } else if tok.is_punct(b'}') {
                depth = depth.saturating_sub(1);
                while stack.last().is_some_and(|(_, d)| *d > depth) {
                    stack.pop();
                }
            } else if tok.is_ident() && is_type_keyword(tokens, source, i) {
                let name_idx = i + 1;
                if tokens.get(name_idx).is_some_and(Token::is_ident) {
                    let name = text(name_idx);
                    let internal = match stack.last() {
                        Some((outer, _)) => format!("{outer}${name}"),
                        None if self.package.is_empty() => name.to_string(),
                        None => format!("{}/{name}", self.package),
                    };
                    let (supertypes, body_start) = read_supertypes(tokens, source, name_idx + 1);
                    if let Some(body_start) = body_start {
                        let body_end = matching_brace(tokens, body_start);
                        self.types.push(DeclaredType {
                            internal: internal.clone(),
                            name_token: name_idx,
                            top_level: stack.is_empty(),
                            supertypes,
                            body: (body_start, body_end),
                        });
                        stack.push((internal, depth + 1));
                        depth += 1;
                        i = body_start + 1;
                        continue;
                    }
                }
            }
            i += 1;
        }
    }

    /// Declared type with simple name `name`, innermost first.
    pub fn declared(&self, name: &str) -> Option<&DeclaredType> {
        self.types
            .iter()
            .rev()
            .find(|t| simple_name(&t.internal) == name)
    }

    /// The type the file is named after, else the first top-level type.
    pub fn primary_type(&self, file_stem: Option<&str>) -> Option<&DeclaredType> {
        let top = || self.types.iter().filter(|t| t.top_level);
        file_stem
            .and_then(|stem| top().find(|t| simple_name(&t.internal) == stem))
            .or_else(|| top().next())
    }

    /// Innermost declared type whose body contains token `idx`.
    pub fn enclosing(&self, idx: usize) -> Option<&DeclaredType> {
        self.types
            .iter()
            .filter(|t| t.body.0 < idx && idx < t.body.1)
            .min_by_key(|t| t.body.1 - t.body.0)
    }

    pub fn is_header_token(&self, idx: usize) -> bool {
        idx < self.header_end
    }

    pub fn declared_names(&self) -> HashSet<&str> {
        self.types.iter().map(|t| t.internal.as_str()).collect()
    }
}

/// `class Foo`, `interface Foo`, `enum Foo`, `record Foo(`, `@interface Foo`.
fn is_type_keyword(tokens: &[Token], source: &str, i: usize) -> bool {
    let prev_is_dot = i > 0 && tokens[i - 1].is_punct(b'.');
    if prev_is_dot {
        return false;
    }
    match tokens[i].text(source) {
        "class" | "interface" | "enum" => true,
        "record" => {
            tokens.get(i + 1).is_some_and(Token::is_ident)
                && tokens
                    .get(i + 2)
                    .is_some_and(|t| t.is_punct(b'(') || t.is_punct(b'<'))
        }
        _ => false,
    }
}

fn read_supertypes(tokens: &[Token], source: &str, from: usize) -> (Vec<String>, Option<usize>) {
    let mut supertypes = Vec::new();
    let mut in_clause = false;
    let mut generic_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut i = from;
    while i < tokens.len() {
        let tok = &tokens[i];
        match tok.kind {
            TokenKind::Punct(b'{') if paren_depth == 0 => return (supertypes, Some(i)),
            TokenKind::Punct(b';') if paren_depth == 0 => return (supertypes, None),
            TokenKind::Punct(b'(') => paren_depth += 1,
            TokenKind::Punct(b')') => paren_depth = paren_depth.saturating_sub(1),
            TokenKind::Punct(b'<') => generic_depth += 1,
            TokenKind::Punct(b'>') => generic_depth = generic_depth.saturating_sub(1),
            TokenKind::Ident if paren_depth == 0 => match tok.text(source) {
                "extends" | "implements" if generic_depth == 0 => in_clause = true,
                "permits" if generic_depth == 0 => in_clause = false,
                _ if in_clause && generic_depth == 0 => {
                    let (name, _, next) = dotted_name(tokens, source, i);
                    supertypes.push(name);
                    i = next;
                    continue;
                }
                _ => {}
            },
            _ => {}
        }
        i += 1;
    }
    (supertypes, None)
}

fn matching_brace(tokens: &[Token], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, tok) in tokens.iter().enumerate().skip(open) {
        if tok.is_punct(b'{') {
            depth += 1;
        } else if tok.is_punct(b'}') {
            depth -= 1;
            if depth == 0 {
                return i;
            }
        }
    }
    tokens.len()
}

/// Reads `a.b.C` starting at token `from`. Returns the dotted text, the token
/// range it covers and the index after it.
pub fn dotted_name(tokens: &[Token], source: &str, from: usize) -> (String, TokenRange, usize) {
    let mut name = String::new();
    let mut i = from;
    while let Some(tok) = tokens.get(i) {
        if !tok.is_ident() {
            break;
        }
        if !name.is_empty() {
            name.push('.');
        }
        name.push_str(tok.text(source));
        let continues = tokens.get(i + 1).is_some_and(|t| t.is_punct(b'.'))
            && tokens.get(i + 2).is_some_and(Token::is_ident);
        i += 1;
        if !continues {
            break;
        }
        i += 1;
    }
    (name, (from, i), i)
}

fn skip_past_semicolon(tokens: &[Token], from: usize) -> usize {
    tokens[from.min(tokens.len())..]
        .iter()
        .position(|t| t.is_punct(b';'))
        .map_or(tokens.len(), |p| from + p + 1)
}

/// Index after `@Name(...)` starting at the `@`.
pub fn skip_annotation(tokens: &[Token], source: &str, at: usize) -> usize {
    let (_, _, mut i) = dotted_name(tokens, source, at + 1);
    if tokens.get(i).is_some_and(|t| t.is_punct(b'(')) {
        let mut depth = 0usize;
        while let Some(tok) = tokens.get(i) {
            if tok.is_punct(b'(') {
                depth += 1;
            } else if tok.is_punct(b')') {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            i += 1;
        }
    }
    i
}
