//! Pre-pass over mixin classes.
//!
//! Mixins name their targets inside annotation literals, which the bulk
//! rewrite cannot see. This pass resolves those literals against the mapping
//! and records the results in a [`MixinHints`] that the bulk rewrite applies.

use std::collections::HashMap;

use crate::mapping::descriptor::to_internal_name;
use crate::mapping::{MemberKind, Remapper};

use super::error::RewriteError;
use super::lexer::{Token, TokenKind, string_content, tokenize};
use super::scope::{FileScope, dotted_name, skip_annotation};
use super::unit::{Edit, Resolver, RewriteContext};

const INJECTORS: &[&str] = &[
    "Inject",
    "Redirect",
    "ModifyArg",
    "ModifyArgs",
    "ModifyVariable",
    "ModifyConstant",
    "ModifyExpressionValue",
    "ModifyReturnValue",
    "WrapOperation",
    "WrapWithCondition",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MixinHints {
    /// Target classes, internal names in the `from` namespace.
    pub targets: Vec<String>,
    /// Literal rewrites inside annotations.
    pub edits: Vec<Edit>,
    /// Shadowed member name to its destination name.
    pub member_renames: HashMap<String, String>,
}

/// One `key = value` argument of an annotation, as token indices.
#[derive(Debug)]
struct Arg {
    key: String,
    values: Vec<usize>,
}

/// Collects hints for a mixin class. Returns `None` for files without a
/// resolvable `@Mixin` target.
pub fn collect_hints(source: &str, ctx: &RewriteContext<'_>) -> Result<Option<MixinHints>, RewriteError> {
    let tokens = tokenize(source)?;
    let scope = FileScope::analyze(&tokens, source);
    let resolver = Resolver::new(ctx, &scope);
    let mut pass = HintPass {
        source,
        tokens: &tokens,
        resolver: &resolver,
        ctx,
        hints: MixinHints::default(),
    };

    let annotations: Vec<(usize, String)> = (scope.header_end..tokens.len())
        .filter(|&i| tokens[i].is_punct(b'@') && tokens.get(i + 1).is_some_and(Token::is_ident))
        .map(|i| {
            let (name, _, _) = dotted_name(&tokens, source, i + 1);
            let simple = name.rsplit('.').next().unwrap_or_default().to_string();
            (i, simple)
        })
        .collect();

    for (at, name) in annotations.iter().filter(|(_, n)| n == "Mixin") {
        pass.mixin_targets(*at);
        tracing::trace!(annotation = %name, targets = pass.hints.targets.len(), "read mixin targets");
    }
    if pass.hints.targets.is_empty() {
        return Ok(None);
    }

    for (at, name) in &annotations {
        match name.as_str() {
            n if INJECTORS.contains(&n) => pass.injector(*at),
            "At" => pass.at_target(*at),
            "Accessor" => pass.accessor(*at, MemberKind::Field),
            "Invoker" => pass.accessor(*at, MemberKind::Method),
            "Shadow" | "Overwrite" => pass.shadow(*at),
            _ => {}
        }
    }
    Ok(Some(pass.hints))
}

struct HintPass<'p, 'c, 'a> {
    source: &'p str,
    tokens: &'p [Token],
    resolver: &'p Resolver<'c, 'a>,
    ctx: &'p RewriteContext<'a>,
    hints: MixinHints,
}

impl HintPass<'_, '_, '_> {
    fn remapper(&self) -> &Remapper {
        self.ctx.remapper()
    }

    fn args(&self, at: usize) -> Vec<Arg> {
        let (_, _, open) = dotted_name(self.tokens, self.source, at + 1);
        if !self.tokens.get(open).is_some_and(|t| t.is_punct(b'(')) {
            return Vec::new();
        }
        let close = skip_annotation(self.tokens, self.source, at).saturating_sub(1);
        let mut args = Vec::new();
        let mut segment = Vec::new();
        let (mut parens, mut braces) = (0usize, 0usize);
        for i in open + 1..close {
            let tok = &self.tokens[i];
            match tok.kind {
                TokenKind::Punct(b'(') => parens += 1,
                TokenKind::Punct(b')') => parens = parens.saturating_sub(1),
                TokenKind::Punct(b'{') => braces += 1,
                TokenKind::Punct(b'}') => braces = braces.saturating_sub(1),
                TokenKind::Punct(b',') if parens == 0 && braces == 0 => {
                    args.push(self.arg(std::mem::take(&mut segment)));
                    continue;
                }
                _ => {}
            }
            segment.push(i);
        }
        if !segment.is_empty() {
            args.push(self.arg(segment));
        }
        args
    }

    fn arg(&self, segment: Vec<usize>) -> Arg {
        let keyed = segment.len() > 1
            && self.tokens[segment[0]].is_ident()
            && self.tokens[segment[1]].is_punct(b'=');
        if keyed {
            Arg {
                key: self.tokens[segment[0]].text(self.source).to_string(),
                values: segment[2..].to_vec(),
            }
        } else {
            Arg {
                key: "value".to_string(),
                values: segment,
            }
        }
    }

    /// String literal tokens of argument `key`, skipping nested annotations.
    fn strings(&self, args: &[Arg], key: &str) -> Vec<usize> {
        let mut out = Vec::new();
        for arg in args.iter().filter(|a| a.key == key) {
            let mut nested = 0usize;
            for &i in &arg.values {
                let tok = &self.tokens[i];
                if tok.is_punct(b'@') {
                    nested += 1;
                } else if nested > 0 && tok.is_punct(b')') {
                    nested -= 1;
                } else if nested == 0 && tok.kind == TokenKind::Str {
                    out.push(i);
                }
            }
        }
        out
    }

    fn replace_string(&mut self, i: usize, text: &str) {
        self.hints.edits.push(Edit::replace(&self.tokens[i], format!("\"{text}\"")));
    }

    fn mixin_targets(&mut self, at: usize) {
        let args = self.args(at);
        for arg in args.iter().filter(|a| a.key == "value") {
            for &i in &arg.values {
                if !self.tokens[i].is_ident() || self.tokens[i - 1].is_punct(b'.') {
                    continue;
                }
                let (name, _, _) = dotted_name(self.tokens, self.source, i);
                let Some(reference) = name.strip_suffix(".class") else {
                    continue;
                };
                match self.resolver.resolve_reference(reference) {
                    Some(target) => self.hints.targets.push(target),
                    None => tracing::debug!(reference, "unresolved mixin target"),
                }
            }
        }
        for i in self.strings(&args, "targets") {
            let Some(literal) = string_content(&self.tokens[i], self.source) else {
                continue;
            };
            let slashed = literal.contains('/');
            let target = if slashed {
                literal.to_string()
            } else {
                self.ctx
                    .resolve_dotted(literal)
                    .unwrap_or_else(|| to_internal_name(literal))
            };
            let mapped = self.remapper().map_class(&target);
            if mapped != target {
                let text = if slashed { mapped.to_string() } else { mapped.replace('/', ".") };
                self.replace_string(i, &text);
            }
            self.hints.targets.push(target);
        }
    }

    fn injector(&mut self, at: usize) {
        let args = self.args(at);
        for i in self.strings(&args, "method") {
            if let Some(literal) = string_content(&self.tokens[i], self.source)
                && let Some(mapped) = self.map_selector(literal, MemberKind::Method)
            {
                self.replace_string(i, &mapped);
            }
        }
    }

    fn at_target(&mut self, at: usize) {
        let args = self.args(at);
        for i in self.strings(&args, "target") {
            let Some(literal) = string_content(&self.tokens[i], self.source) else {
                continue;
            };
            let kind = if literal.contains('(') { MemberKind::Method } else { MemberKind::Field };
            if let Some(mapped) = self.map_selector(literal, kind) {
                self.replace_string(i, &mapped);
            }
        }
    }

    /// Rewrites a member selector: `name`, `name(desc)ret`, `name*`,
    /// `Lowner;name(desc)ret` or `Lowner;name:desc`. `None` when nothing
    /// changes.
    fn map_selector(&self, selector: &str, kind: MemberKind) -> Option<String> {
        let parsed = Selector::parse(selector);
        let remapper = self.remapper();
        let owners: Vec<String> = match parsed.owner {
            Some(owner) => vec![owner.to_string()],
            None => self.hints.targets.clone(),
        };

        let name = match parsed.desc {
            Some(desc) if kind == MemberKind::Method => {
                owners.iter().find_map(|o| remapper.map_method(o, parsed.name, desc))
            }
            Some(desc) => owners.iter().find_map(|o| remapper.map_field(o, parsed.name, desc)),
            None => unique_target(remapper, &owners, parsed.name, kind),
        }
        .unwrap_or(parsed.name);

        let mut out = String::new();
        if let Some(owner) = parsed.owner {
            out.push('L');
            out.push_str(remapper.map_class(owner));
            out.push(';');
        }
        out.push_str(name);
        if let Some(desc) = parsed.desc {
            if parsed.field_desc {
                out.push(':');
            }
            out.push_str(&remapper.map_descriptor(desc));
        }
        if parsed.wildcard {
            out.push('*');
        }
        if out == selector {
            None
        } else {
            Some(out)
        }
    }

    fn accessor(&mut self, at: usize, kind: MemberKind) {
        let args = self.args(at);
        let explicit = self.strings(&args, "value");
        if !explicit.is_empty() {
            for i in explicit {
                let Some(name) = string_content(&self.tokens[i], self.source) else {
                    continue;
                };
                if let Some(target) = unique_target(self.remapper(), &self.hints.targets, name, kind)
                    && target != name
                {
                    let target = target.to_string();
                    self.replace_string(i, &target);
                }
            }
            return;
        }
        if !args.is_empty() {
            return;
        }

        let Some((decl, _)) = self.declaration_after(at) else {
            return;
        };
        let method = self.tokens[decl].text(self.source);
        let prefixes: &[&str] = match kind {
            MemberKind::Field => &["get", "is", "set"],
            MemberKind::Method => &["call", "invoke"],
        };
        let Some(implied) = prefixes
            .iter()
            .find_map(|p| method.strip_prefix(p))
            .filter(|rest| rest.starts_with(char::is_uppercase))
            .map(decapitalize)
        else {
            return;
        };
        if let Some(target) = unique_target(self.remapper(), &self.hints.targets, &implied, kind)
            && target != implied
        {
            let (_, (_, end), _) = dotted_name(self.tokens, self.source, at + 1);
            let anchor = self.tokens[end - 1].end;
            self.hints.edits.push(Edit {
                start: anchor,
                end: anchor,
                text: format!("(\"{target}\")"),
            });
        }
    }

    fn shadow(&mut self, at: usize) {
        let Some((decl, kind)) = self.declaration_after(at) else {
            return;
        };
        let name = self.tokens[decl].text(self.source);
        if let Some(target) = unique_target(self.remapper(), &self.hints.targets, name, kind)
            && target != name
        {
            let (name, target) = (name.to_string(), target.to_string());
            self.hints.member_renames.insert(name, target);
        }
    }

    /// Name token and kind of the member declared after the annotation at
    /// `at`.
    fn declaration_after(&self, at: usize) -> Option<(usize, MemberKind)> {
        let mut i = skip_annotation(self.tokens, self.source, at);
        while let Some(tok) = self.tokens.get(i) {
            if tok.is_punct(b'@') {
                i = skip_annotation(self.tokens, self.source, i);
                continue;
            }
            if tok.is_punct(b'{') || tok.is_punct(b';') || tok.is_punct(b'}') {
                return None;
            }
            if tok.is_ident() {
                match self.tokens.get(i + 1).map(|t| t.kind) {
                    Some(TokenKind::Punct(b'(')) => return Some((i, MemberKind::Method)),
                    Some(TokenKind::Punct(b';' | b'=')) => return Some((i, MemberKind::Field)),
                    _ => {}
                }
            }
            i += 1;
        }
        None
    }
}

/// Destination name shared by every `kind` member `name` of `owners`.
fn unique_target<'r>(remapper: &'r Remapper, owners: &[String], name: &str, kind: MemberKind) -> Option<&'r str> {
    let mut targets = owners
        .iter()
        .flat_map(|o| remapper.members_of(o))
        .filter(|m| m.kind == kind && m.name == name)
        .map(|m| m.target_or_name());
    let first = targets.next()?;
    targets.all(|t| t == first).then_some(first)
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Selector<'s> {
    owner: Option<&'s str>,
    name: &'s str,
    desc: Option<&'s str>,
    field_desc: bool,
    wildcard: bool,
}

impl<'s> Selector<'s> {
    fn parse(selector: &'s str) -> Selector<'s> {
        let (owner, rest) = match selector.find(';') {
            Some(semi) if selector.starts_with('L') && !selector[..semi].contains('(') => {
                (Some(&selector[1..semi]), &selector[semi + 1..])
            }
            _ => (None, selector),
        };
        let (rest, wildcard) = match rest.strip_suffix('*') {
            Some(stripped) => (stripped, true),
            None => (rest, false),
        };
        if let Some(paren) = rest.find('(') {
            Selector { owner, name: &rest[..paren], desc: Some(&rest[paren..]), field_desc: false, wildcard }
        } else if let Some((name, desc)) = rest.split_once(':') {
            Selector { owner, name, desc: Some(desc), field_desc: true, wildcard }
        } else {
            Selector { owner, name: rest, desc: None, field_desc: false, wildcard }
        }
    }
}
