//! Identifier-level rewrite of one compilation unit.
//!
//! Simple type names are resolved in `javac` order: declared types,
//! single-type imports, the file's package, then on-demand imports. Member
//! names have no type information, so a member occurrence is renamed only
//! when every candidate owner agrees on one target. Candidates for a bare
//! name are the file's own types, their resolved supertypes and static
//! import owners; names the file declares as variables are left alone.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::mapping::descriptor::{package_of, simple_name, to_source_name};
use crate::mapping::{MemberKind, Remapper};

use super::classpath::ClassIndex;
use super::error::RewriteError;
use super::lexer::{Token, TokenKind, tokenize};
use super::mixin::MixinHints;
use super::scope::{FileScope, dotted_name};

/// Replacement of `source[start..end]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Edit {
    pub fn replace(token: &Token, text: impl Into<String>) -> Self {
        Edit {
            start: token.start,
            end: token.end,
            text: text.into(),
        }
    }
}

/// Applies edits in offset order. An edit overlapping an earlier one is
/// dropped.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.start, e.end));
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.start < cursor {
            continue;
        }
        out.push_str(&source[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);
    out
}

/// Read-only state shared by every unit of a run.
#[derive(Debug)]
pub struct RewriteContext<'a> {
    remapper: &'a Remapper,
    classpath: &'a ClassIndex,
    source_packages: HashSet<String>,
    dest_packages: HashSet<String>,
}

impl<'a> RewriteContext<'a> {
    pub fn new(remapper: &'a Remapper, classpath: &'a ClassIndex) -> Self {
        let mut source_packages = HashSet::new();
        let mut dest_packages = HashSet::new();
        for class in remapper.class_names() {
            source_packages.insert(package_of(class).to_string());
            dest_packages.insert(package_of(remapper.map_class(class)).to_string());
        }
        for class in classpath.iter().filter(|c| !remapper.knows_class(c)) {
            dest_packages.insert(package_of(class).to_string());
        }
        Self {
            remapper,
            classpath,
            source_packages,
            dest_packages,
        }
    }

    pub fn remapper(&self) -> &'a Remapper {
        self.remapper
    }

    pub fn knows(&self, internal: &str) -> bool {
        self.remapper.knows_class(internal) || self.classpath.contains(internal)
    }

    /// Resolves `a.b.Outer.Inner` to `a/b/Outer$Inner` when some split of
    /// the dotted name is a known class.
    pub fn resolve_dotted(&self, dotted: &str) -> Option<String> {
        if dotted.contains('/') {
            return self.knows(dotted).then(|| dotted.to_string());
        }
        let segments: Vec<&str> = dotted.split('.').collect();
        (1..=segments.len()).rev().find_map(|class_start| {
            let package = segments[..class_start - 1].join("/");
            let class = segments[class_start - 1..].join("$");
            let internal = if package.is_empty() {
                class
            } else {
                format!("{package}/{class}")
            };
            self.knows(&internal).then_some(internal)
        })
    }

    /// Whether every known class of `package` leaves it under the mapping.
    pub fn package_vanishes(&self, package: &str) -> bool {
        self.source_packages.contains(package) && !self.dest_packages.contains(package)
    }
}

/// How a simple type name was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Via {
    Declared,
    SingleImport,
    SamePackage,
    OnDemand,
}

/// Type name resolution for one file.
#[derive(Debug)]
pub struct Resolver<'c, 'a> {
    ctx: &'c RewriteContext<'a>,
    scope: &'c FileScope,
    /// Simple name to internal name; `None` for imports of unknown classes,
    /// which still shadow other lookups.
    single: HashMap<String, Option<String>>,
    on_demand_packages: Vec<String>,
    on_demand_types: Vec<String>,
    static_owners: Vec<String>,
}

impl<'c, 'a> Resolver<'c, 'a> {
    pub fn new(ctx: &'c RewriteContext<'a>, scope: &'c FileScope) -> Self {
        let mut resolver = Resolver {
            ctx,
            scope,
            single: HashMap::new(),
            on_demand_packages: Vec::new(),
            on_demand_types: Vec::new(),
            static_owners: Vec::new(),
        };
        for import in &scope.imports {
            match (import.is_static, import.on_demand) {
                (false, false) => {
                    let simple = import.path.rsplit('.').next().unwrap_or_default();
                    resolver
                        .single
                        .insert(simple.to_string(), ctx.resolve_dotted(&import.path));
                }
                (false, true) => match ctx.resolve_dotted(&import.path) {
                    Some(owner) => resolver.on_demand_types.push(owner),
                    None => resolver
                        .on_demand_packages
                        .push(import.path.replace('.', "/")),
                },
                (true, on_demand) => {
                    let owner_path = if on_demand {
                        import.path.as_str()
                    } else {
                        import.path.rsplit_once('.').map_or("", |(owner, _)| owner)
                    };
                    if let Some(owner) = ctx.resolve_dotted(owner_path) {
                        resolver.static_owners.push(owner);
                    }
                }
            }
        }
        resolver
    }

    pub fn resolve_simple(&self, name: &str) -> Option<(String, Via)> {
        if let Some(declared) = self.scope.declared(name) {
            return Some((declared.internal.clone(), Via::Declared));
        }
        if let Some(imported) = self.single.get(name) {
            return imported.clone().map(|i| (i, Via::SingleImport));
        }
        let same_package = if self.scope.package.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.scope.package)
        };
        if self.ctx.knows(&same_package) {
            return Some((same_package, Via::SamePackage));
        }
        self.on_demand_types
            .iter()
            .map(|owner| format!("{owner}${name}"))
            .chain(
                self.on_demand_packages
                    .iter()
                    .map(|pkg| format!("{pkg}/{name}")),
            )
            .find(|candidate| self.ctx.knows(candidate))
            .map(|found| (found, Via::OnDemand))
    }

    /// Resolves a reference as written in source: `Simple`, `Outer.Inner`
    /// or `a.b.Qualified`.
    pub fn resolve_reference(&self, reference: &str) -> Option<String> {
        let mut segments = reference.split('.');
        let first = segments.next()?;
        if first.starts_with(char::is_uppercase) {
            let (mut current, _) = self.resolve_simple(first)?;
            for segment in segments {
                let nested = format!("{current}${segment}");
                if !self.ctx.knows(&nested) {
                    return None;
                }
                current = nested;
            }
            Some(current)
        } else {
            self.ctx.resolve_dotted(reference)
        }
    }

    pub fn static_owners(&self) -> &[String] {
        &self.static_owners
    }

    /// Resolved supertypes of every type declared in the file.
    pub fn supertypes(&self) -> Vec<String> {
        self.scope
            .types
            .iter()
            .flat_map(|t| t.supertypes.iter())
            .filter_map(|s| self.resolve_reference(s))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenUnit {
    pub text: String,
    /// Primary top-level type before and after remapping.
    pub primary: Option<(String, String)>,
    pub edits: usize,
}

/// Rewrites one compilation unit. `hints` are the mixin pre-pass results for
/// this file, if any.
pub fn rewrite_unit(
    source: &str,
    file_stem: Option<&str>,
    ctx: &RewriteContext<'_>,
    hints: Option<&MixinHints>,
) -> Result<RewrittenUnit, RewriteError> {
    let tokens = tokenize(source)?;
    let scope = FileScope::analyze(&tokens, source);
    let resolver = Resolver::new(ctx, &scope);
    let primary = scope
        .primary_type(file_stem)
        .map(|t| (t.internal.clone(), ctx.remapper().map_class(&t.internal).to_string()));
    let new_package = match &primary {
        Some((_, to)) => package_of(to).to_string(),
        None => scope.package.clone(),
    };

    let mut pass = UnitPass {
        source,
        tokens: &tokens,
        scope: &scope,
        resolver: &resolver,
        ctx,
        hints,
        new_package,
        edits: Vec::new(),
        edited: HashSet::new(),
        in_scope: HashSet::new(),
        shadowed: HashSet::new(),
        own_fields: HashSet::new(),
        owner_hints: HashMap::new(),
        added_imports: BTreeSet::new(),
    };
    pass.declarations();
    pass.package();
    pass.imports();
    pass.types();
    pass.members();
    pass.insert_imports();

    let mut edits = pass.edits;
    if let Some(hints) = hints {
        edits.extend(hints.edits.iter().cloned());
    }
    let count = edits.len();
    Ok(RewrittenUnit {
        text: apply_edits(source, edits),
        primary,
        edits: count,
    })
}

struct UnitPass<'p, 'c, 'a> {
    source: &'p str,
    tokens: &'p [Token],
    scope: &'p FileScope,
    resolver: &'p Resolver<'c, 'a>,
    ctx: &'p RewriteContext<'a>,
    hints: Option<&'p MixinHints>,
    new_package: String,
    edits: Vec<Edit>,
    edited: HashSet<usize>,
    /// Classes referenced anywhere in the file.
    in_scope: HashSet<String>,
    /// Names declared as locals, parameters or unmapped fields of the file's
    /// own types. Bare uses of these are never renamed.
    shadowed: HashSet<String>,
    /// Unmapped fields of the file's own types.
    own_fields: HashSet<String>,
    /// Member token index -> the class it was accessed through.
    owner_hints: HashMap<usize, String>,
    added_imports: BTreeSet<String>,
}

impl UnitPass<'_, '_, '_> {
    fn text(&self, i: usize) -> &str {
        self.tokens[i].text(self.source)
    }

    fn edit_token(&mut self, i: usize, text: impl Into<String>) {
        if self.edited.insert(i) {
            self.edits.push(Edit::replace(&self.tokens[i], text));
        }
    }

    fn edit_range(&mut self, first: usize, last: usize, text: String) {
        if (first..=last).any(|i| self.edited.contains(&i)) {
            return;
        }
        self.edited.extend(first..=last);
        self.edits.push(Edit {
            start: self.tokens[first].start,
            end: self.tokens[last].end,
            text,
        });
    }

    fn package(&mut self) {
        let Some((first, end)) = self.scope.package_range else {
            return;
        };
        if end > first && self.new_package != self.scope.package {
            let dotted = self.new_package.replace('/', ".");
            self.edit_range(first, end - 1, dotted);
        }
    }

    fn imports(&mut self) {
        let remapper = self.ctx.remapper();
        let scope = self.scope;
        for import in &scope.imports {
            let (first, end) = import.name_range;
            if end <= first {
                continue;
            }
            let last = end - 1;
            match (import.is_static, import.on_demand) {
                (false, false) => {
                    if let Some(internal) = self.ctx.resolve_dotted(&import.path) {
                        let mapped = remapper.map_class(&internal);
                        if mapped != internal {
                            self.edit_range(first, last, to_source_name(mapped));
                        }
                        self.in_scope.insert(internal);
                    }
                }
                (false, true) => {
                    if let Some(owner) = self.ctx.resolve_dotted(&import.path) {
                        let mapped = remapper.map_class(&owner);
                        if mapped != owner {
                            self.edit_range(first, last, to_source_name(mapped));
                        }
                    } else {
                        let package = import.path.replace('.', "/");
                        if self.ctx.package_vanishes(&package) {
                            let (stmt_first, stmt_end) = import.stmt_range;
                            self.remove_statement(stmt_first, stmt_end - 1);
                        }
                    }
                }
                (true, true) => {
                    if let Some(owner) = self.ctx.resolve_dotted(&import.path) {
                        let mapped = remapper.map_class(&owner);
                        if mapped != owner {
                            self.edit_range(first, last, to_source_name(mapped));
                        }
                        self.in_scope.insert(owner);
                    }
                }
                (true, false) => {
                    let Some((owner_path, member)) = import.path.rsplit_once('.') else {
                        continue;
                    };
                    let Some(owner) = self.ctx.resolve_dotted(owner_path) else {
                        continue;
                    };
                    let owners = HashSet::from([owner.clone()]);
                    if self.shadowed.contains(member)
                        && self
                            .unique_target(member, Some(MemberKind::Field), &owners)
                            .is_some_and(|target| target != member)
                    {
                        tracing::debug!(%member, "static import shadowed by a declaration, left as is");
                        self.in_scope.insert(owner);
                        continue;
                    }
                    let target = self
                        .unique_target(member, None, &owners)
                        .unwrap_or(member)
                        .to_string();
                    let mapped_owner = to_source_name(remapper.map_class(&owner));
                    let rewritten = format!("{mapped_owner}.{target}");
                    if rewritten != import.path {
                        self.edit_range(first, last, rewritten);
                    }
                    self.in_scope.insert(owner);
                }
            }
        }
    }

    fn types(&mut self) {
        let remapper = self.ctx.remapper();
        let mut i = self.scope.header_end;
        while i < self.tokens.len() {
            if !self.tokens[i].is_ident() || self.after_member_access(i) || is_keyword(self.text(i)) {
                i += 1;
                continue;
            }
            let word = self.text(i).to_string();

            if word.starts_with(char::is_lowercase) {
                let (dotted, (_, end), _) = dotted_name(self.tokens, self.source, i);
                let segments: Vec<&str> = dotted.split('.').collect();
                let qualified = (2..=segments.len()).rev().find_map(|k| {
                    self.ctx
                        .resolve_dotted(&segments[..k].join("."))
                        .map(|internal| (k, internal))
                });
                if let Some((k, internal)) = qualified {
                    let last = i + 2 * (k - 1);
                    let mapped = remapper.map_class(&internal);
                    if mapped != internal {
                        self.edit_range(i, last, to_source_name(mapped));
                    }
                    if last + 2 < end {
                        self.owner_hints.insert(last + 2, internal.clone());
                    }
                    self.in_scope.insert(internal);
                    i = last + 1;
                } else {
                    i = end.max(i + 1);
                }
                continue;
            }

            if word.starts_with(char::is_uppercase)
                && let Some((internal, via)) = self.resolver.resolve_simple(&word)
            {
                self.rename_type_segment(i, &internal);
                self.require_import(&internal, via);
                let mut current = internal;
                let mut j = i;
                while self.tokens.get(j + 1).is_some_and(|t| t.is_punct(b'.'))
                    && self.tokens.get(j + 2).is_some_and(Token::is_ident)
                {
                    let nested = format!("{current}${}", self.text(j + 2));
                    if !self.ctx.knows(&nested) {
                        break;
                    }
                    j += 2;
                    self.rename_type_segment(j, &nested);
                    self.in_scope.insert(std::mem::replace(&mut current, nested));
                }
                if self.tokens.get(j + 1).is_some_and(|t| t.is_punct(b'.') || t.kind == TokenKind::ColonColon)
                    && self.tokens.get(j + 2).is_some_and(Token::is_ident)
                {
                    self.owner_hints.insert(j + 2, current.clone());
                }
                self.in_scope.insert(current);
                i = j + 1;
                continue;
            }
            i += 1;
        }
    }

    fn rename_type_segment(&mut self, i: usize, internal: &str) {
        let mapped = self.ctx.remapper().map_class(internal);
        let new_simple = simple_name(mapped);
        if new_simple != simple_name(internal) {
            self.edit_token(i, new_simple.to_string());
        }
    }

    fn require_import(&mut self, internal: &str, via: Via) {
        if !matches!(via, Via::SamePackage | Via::OnDemand) || internal.contains('$') {
            return;
        }
        let mapped = self.ctx.remapper().map_class(internal);
        if package_of(mapped) != self.new_package && (mapped != internal || via == Via::SamePackage)
        {
            self.added_imports.insert(to_source_name(mapped));
        }
    }

    fn members(&mut self) {
        let mut bare_owners: HashSet<String> = self.resolver.supertypes().into_iter().collect();
        bare_owners.extend(self.resolver.static_owners().iter().cloned());
        if let Some(hints) = self.hints {
            bare_owners.extend(hints.targets.iter().cloned());
        }
        bare_owners.extend(self.scope.types.iter().map(|t| t.internal.clone()));
        let mut qualified_owners = self.in_scope.clone();
        qualified_owners.extend(bare_owners.iter().cloned());

        for i in self.scope.header_end..self.tokens.len() {
            if !self.tokens[i].is_ident() || self.edited.contains(&i) {
                continue;
            }
            let word = self.text(i).to_string();
            if is_keyword(&word) {
                continue;
            }
            let prev = i.checked_sub(1).map(|p| self.tokens[p]);
            let after_dot = prev.is_some_and(|t| t.is_punct(b'.'));
            let after_colons = prev.is_some_and(|t| t.kind == TokenKind::ColonColon);
            let call = self.tokens.get(i + 1).is_some_and(|t| t.is_punct(b'('));

            if let Some(target) = self.shadow_rename(i, &word, after_dot, after_colons) {
                self.edit_token(i, target);
                continue;
            }

            let (kind, owners) = if after_dot || after_colons {
                let kind = if call || after_colons {
                    MemberKind::Method
                } else {
                    MemberKind::Field
                };
                let owners = match self.owner_hints.get(&i) {
                    Some(owner) => HashSet::from([owner.clone()]),
                    None if kind == MemberKind::Field
                        && self.through_this(i)
                        && self.own_fields.contains(&word) =>
                    {
                        continue;
                    }
                    None => qualified_owners.clone(),
                };
                (Some(kind), owners)
            } else if call {
                let after_new = i
                    .checked_sub(1)
                    .is_some_and(|p| self.text(p) == "new");
                if after_new || self.scope.declared(&word).is_some() {
                    continue;
                }
                (Some(MemberKind::Method), bare_owners.clone())
            } else if self.shadowed.contains(&word) {
                continue;
            } else {
                (Some(MemberKind::Field), bare_owners.clone())
            };

            if let Some(target) = self.unique_target(&word, kind, &owners)
                && target != word
            {
                let target = target.to_string();
                self.edit_token(i, target);
            }
        }
    }

    /// Renames from `@Shadow`/`@Overwrite` declarations apply to bare uses
    /// and `this.` accesses.
    fn shadow_rename(&self, i: usize, word: &str, after_dot: bool, after_colons: bool) -> Option<String> {
        let target = self.hints?.member_renames.get(word)?;
        ((!after_dot && !after_colons) || (after_dot && self.through_this(i))).then(|| target.clone())
    }

    fn through_this(&self, i: usize) -> bool {
        i >= 2 && self.tokens[i - 1].is_punct(b'.') && self.text(i - 2) == "this"
    }

    /// Collects the names the file declares as variables, parameters or
    /// fields. A field of one of the file's own types that the table maps is
    /// renamed like any other member, so it does not shadow.
    fn declarations(&mut self) {
        let lambda_params = lambda_parameters(self.tokens);
        for i in self.scope.header_end..self.tokens.len() {
            if !lambda_params.contains(&i) && !is_variable_declaration(self.tokens, self.source, i) {
                continue;
            }
            let word = self.text(i).to_string();
            match self.field_owner(i) {
                Some(owner) => {
                    let owners = HashSet::from([owner]);
                    if self.unique_target(&word, Some(MemberKind::Field), &owners).is_none() {
                        self.own_fields.insert(word.clone());
                        self.shadowed.insert(word);
                    }
                }
                None => {
                    self.shadowed.insert(word);
                }
            }
        }
    }

    /// The declared type whose body holds token `i` directly, outside any
    /// block or parameter list.
    fn field_owner(&self, i: usize) -> Option<String> {
        let owner = self.scope.enclosing(i)?;
        let (mut braces, mut parens) = (0i32, 0i32);
        for token in &self.tokens[owner.body.0 + 1..i] {
            match token.kind {
                TokenKind::Punct(b'{') => braces += 1,
                TokenKind::Punct(b'}') => braces -= 1,
                TokenKind::Punct(b'(') => parens += 1,
                TokenKind::Punct(b')') => parens -= 1,
                _ => {}
            }
        }
        (braces == 0 && parens == 0).then(|| owner.internal.clone())
    }

    /// Deletes tokens `first..=last` together with the line break before
    /// them, or after them at the start of the file.
    fn remove_statement(&mut self, first: usize, last: usize) {
        if (first..=last).any(|i| self.edited.contains(&i)) {
            return;
        }
        let bytes = self.source.as_bytes();
        let mut start = self.tokens[first].start;
        let mut end = self.tokens[last].end;
        let mut back = start;
        while back > 0 && matches!(bytes[back - 1], b' ' | b'\t') {
            back -= 1;
        }
        if back > 0 && bytes[back - 1] == b'\n' {
            start = back - 1;
            if start > 0 && bytes[start - 1] == b'\r' {
                start -= 1;
            }
        } else {
            let mut ahead = end;
            while bytes.get(ahead).is_some_and(|&b| matches!(b, b' ' | b'\t' | b'\r')) {
                ahead += 1;
            }
            if bytes.get(ahead) == Some(&b'\n') {
                end = ahead + 1;
            }
        }
        self.edited.extend(first..=last);
        self.edits.push(Edit {
            start,
            end,
            text: String::new(),
        });
    }

    /// Destination name shared by every member called `name` among `owners`.
    fn unique_target(&self, name: &str, kind: Option<MemberKind>, owners: &HashSet<String>) -> Option<&str> {
        let remapper: &Remapper = self.ctx.remapper();
        let mut targets = remapper
            .members_named(name)
            .filter(|m| kind.is_none_or(|k| m.kind == k) && owners.contains(&m.owner))
            .map(|m| m.target_or_name());
        let first = targets.next()?;
        targets.all(|t| t == first).then_some(first)
    }

    fn after_member_access(&self, i: usize) -> bool {
        i > 0
            && (self.tokens[i - 1].is_punct(b'.') || self.tokens[i - 1].kind == TokenKind::ColonColon)
    }

    fn insert_imports(&mut self) {
        let existing: HashSet<String> = self
            .scope
            .imports
            .iter()
            .filter(|i| !i.is_static && !i.on_demand)
            .filter_map(|i| self.ctx.resolve_dotted(&i.path))
            .map(|internal| to_source_name(self.ctx.remapper().map_class(&internal)))
            .collect();
        let missing: Vec<String> = self
            .added_imports
            .iter()
            .filter(|name| !existing.contains(*name))
            .cloned()
            .collect();
        if missing.is_empty() {
            return;
        }

        let anchor = self
            .scope
            .imports
            .last()
            .map(|i| i.stmt_range.1)
            .or(self.scope.package_range.map(|(_, end)| end + 1))
            .filter(|end| *end > 0 && *end <= self.tokens.len())
            .map(|end| self.tokens[end - 1].end);
        let edit = match anchor {
            Some(at) => Edit {
                start: at,
                end: at,
                text: missing.iter().map(|n| format!("\nimport {n};")).collect(),
            },
            None => Edit {
                start: 0,
                end: 0,
                text: missing.iter().map(|n| format!("import {n};\n")).collect(),
            },
        };
        self.edits.push(edit);
    }
}

/// `Type name` followed by `=`, `;`, `,`, `)` or `:`.
fn is_variable_declaration(tokens: &[Token], source: &str, i: usize) -> bool {
    let token = tokens[i];
    if i == 0 || !token.is_ident() || is_keyword(token.text(source)) {
        return false;
    }
    let ends = tokens.get(i + 1).is_some_and(|next| match next.kind {
        TokenKind::Punct(b';' | b',' | b')' | b':') => true,
        TokenKind::Punct(b'=') => !tokens.get(i + 2).is_some_and(|t| t.is_punct(b'=')),
        _ => false,
    });
    if !ends {
        return false;
    }
    let prev = tokens[i - 1];
    match prev.kind {
        TokenKind::Ident => {
            let word = prev.text(source);
            !is_keyword(word) || is_primitive(word)
        }
        TokenKind::Ellipsis => true,
        TokenKind::Punct(b']') => i >= 2 && tokens[i - 2].is_punct(b'['),
        TokenKind::Punct(b'>') => closes_type_arguments(tokens, i - 1),
        _ => false,
    }
}

/// Whether the `>` at `gt` closes a type argument list such as
/// `Map<K, List<V>>`.
fn closes_type_arguments(tokens: &[Token], gt: usize) -> bool {
    let mut depth = 0usize;
    for k in (0..=gt).rev() {
        match tokens[k].kind {
            TokenKind::Punct(b'>') => depth += 1,
            TokenKind::Punct(b'<') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return k > 0 && tokens[k - 1].is_ident();
                }
            }
            TokenKind::Ident | TokenKind::Punct(b'.' | b',' | b'?' | b'[' | b']') => {}
            _ => return false,
        }
    }
    false
}

/// Token indices of lambda parameters: `x ->` and `(a, b) ->`.
fn lambda_parameters(tokens: &[Token]) -> HashSet<usize> {
    let mut params = HashSet::new();
    for arrow in 2..tokens.len() {
        if !(tokens[arrow - 1].is_punct(b'-') && tokens[arrow].is_punct(b'>')) {
            continue;
        }
        let before = arrow - 2;
        if tokens[before].is_ident() {
            params.insert(before);
            continue;
        }
        if !tokens[before].is_punct(b')') {
            continue;
        }
        let mut depth = 0usize;
        for k in (0..=before).rev() {
            let token = tokens[k];
            if token.is_punct(b')') {
                depth += 1;
            } else if token.is_punct(b'(') {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else if depth == 1
                && token.is_ident()
                && tokens
                    .get(k + 1)
                    .is_some_and(|next| next.is_punct(b',') || next.is_punct(b')'))
            {
                params.insert(k);
            }
        }
    }
    params
}

fn is_primitive(word: &str) -> bool {
    matches!(
        word,
        "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double" | "var"
    )
}

fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "abstract"
            | "assert"
            | "boolean"
            | "break"
            | "byte"
            | "case"
            | "catch"
            | "char"
            | "class"
            | "const"
            | "continue"
            | "default"
            | "do"
            | "double"
            | "else"
            | "enum"
            | "extends"
            | "final"
            | "finally"
            | "float"
            | "for"
            | "goto"
            | "if"
            | "implements"
            | "import"
            | "instanceof"
            | "int"
            | "interface"
            | "long"
            | "native"
            | "new"
            | "package"
            | "private"
            | "protected"
            | "public"
            | "return"
            | "short"
            | "static"
            | "strictfp"
            | "super"
            | "switch"
            | "synchronized"
            | "this"
            | "throw"
            | "throws"
            | "transient"
            | "try"
            | "void"
            | "volatile"
            | "while"
            | "true"
            | "false"
            | "null"
            | "var"
            | "record"
            | "yield"
    )
}
