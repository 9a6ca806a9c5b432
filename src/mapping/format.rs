//! Flat text serialization of mapping tables.
//!
//! ```text
//! remap-mappings v1 named mojang
//! net/minecraft/entity/Entity net/minecraft/world/entity/Entity
//! 	f I age tickCount
//! 	m ()Lnet/minecraft/world/World; getWorld level
//! ```
//!
//! The first line names the namespaces. A class line lists its name in every
//! namespace; an indented member line carries the kind, the descriptor in the
//! source namespace and one name per namespace. Missing names are `-`.
//! Output order is fully determined by the table, so two writes of equal
//! tables are byte-identical.

use std::fmt::Write as _;
use std::fs;
use std::io::{Read as _, Write as _};
use std::path::Path;

use tempfile::NamedTempFile;

use super::error::MappingError;
use super::tiny;
use super::tree::{ClassMapping, MappingTree, MemberKind, MemberMapping, Namespace};

pub const FLAT_HEADER: &str = "remap-mappings";
pub const FLAT_VERSION: &str = "v1";
const MISSING: &str = "-";

/// Entry read when a table is packaged inside a jar or zip.
pub const ARCHIVE_ENTRY: &str = "mappings/mappings.tiny";

pub fn write_mappings(tree: &MappingTree) -> String {
    let mut out = String::new();
    out.push_str(FLAT_HEADER);
    out.push(' ');
    out.push_str(FLAT_VERSION);
    for ns in tree.namespaces() {
        out.push(' ');
        out.push_str(ns.as_str());
    }
    out.push('\n');

    for class in tree.classes() {
        push_names(&mut out, class.names());
        out.push('\n');
        for (kind, member) in class
            .fields()
            .map(|m| (MemberKind::Field, m))
            .chain(class.methods().map(|m| (MemberKind::Method, m)))
        {
            let _ = write!(out, "\t{} {} ", kind.tag(), member.descriptor());
            push_names(&mut out, member.names());
            out.push('\n');
        }
    }
    out
}

fn push_names(out: &mut String, names: &[Option<String>]) {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(name.as_deref().unwrap_or(MISSING));
    }
}

pub fn parse_mappings(text: &str) -> Result<MappingTree, MappingError> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));
    let (_, header) = lines
        .by_ref()
        .find(|(_, l)| !is_skipped(l))
        .ok_or_else(|| parse_err(1, "empty mapping file"))?;

    let mut fields = header.split_whitespace();
    if fields.next() != Some(FLAT_HEADER) {
        return Err(MappingError::UnknownFormat(header.to_string()));
    }
    match fields.next() {
        Some(FLAT_VERSION) => {}
        other => {
            return Err(parse_err(
                1,
                format!("unsupported version {}", other.unwrap_or("<none>")),
            ));
        }
    }
    let namespaces = fields
        .map(Namespace::new)
        .collect::<Result<Vec<_>, _>>()?;
    let width = namespaces.len();
    let mut tree = MappingTree::new(namespaces)?;

    let mut current: Option<ClassMapping> = None;
    for (line_no, line) in lines {
        if is_skipped(line) {
            continue;
        }
        if let Some(member_line) = line.strip_prefix('\t') {
            let class = current
                .as_mut()
                .ok_or_else(|| parse_err(line_no, "member line before any class"))?;
            let mut cols = member_line.split_whitespace();
            let kind = match cols.next() {
                Some("f") => MemberKind::Field,
                Some("m") => MemberKind::Method,
                other => {
                    return Err(parse_err(
                        line_no,
                        format!("unknown member kind {:?}", other.unwrap_or_default()),
                    ));
                }
            };
            let desc = cols
                .next()
                .ok_or_else(|| parse_err(line_no, "missing descriptor"))?;
            let names = read_names(cols, width, line_no)?;
            class.insert_member(kind, MemberMapping::new(desc, names));
        } else {
            if let Some(done) = current.take() {
                tree.insert_class(done);
            }
            let names = read_names(line.split_whitespace(), width, line_no)?;
            current = Some(ClassMapping::new(names));
        }
    }
    if let Some(done) = current {
        tree.insert_class(done);
    }
    Ok(tree)
}

fn read_names<'a>(
    cols: impl Iterator<Item = &'a str>,
    width: usize,
    line: usize,
) -> Result<Vec<Option<String>>, MappingError> {
    let names: Vec<Option<String>> = cols
        .map(|c| (c != MISSING).then(|| c.to_string()))
        .collect();
    if names.len() != width {
        return Err(parse_err(
            line,
            format!("expected {width} names, found {}", names.len()),
        ));
    }
    if names[0].is_none() {
        return Err(parse_err(line, "source name is missing"));
    }
    Ok(names)
}

fn is_skipped(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn parse_err(line: usize, reason: impl Into<String>) -> MappingError {
    MappingError::Parse {
        line,
        reason: reason.into(),
    }
}

/// Parses a table in whichever supported format its first line announces.
pub fn parse_any(text: &str) -> Result<MappingTree, MappingError> {
    let first = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default();
    if first.starts_with(FLAT_HEADER) || first.starts_with('#') {
        parse_mappings(text)
    } else if first.starts_with(tiny::TINY_V2_HEADER) {
        tiny::parse_tiny(text)
    } else {
        Err(MappingError::UnknownFormat(first.to_string()))
    }
}

/// Reads a table from a flat or Tiny v2 text file, or from the
/// [`ARCHIVE_ENTRY`] of a `.jar`/`.zip`.
pub fn read_mappings(path: &Path) -> Result<MappingTree, MappingError> {
    let read_err = |source| MappingError::Read {
        path: path.to_path_buf(),
        source,
    };
    let is_archive = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"));

    let text = if is_archive {
        let file = fs::File::open(path).map_err(read_err)?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| read_err(std::io::Error::other(e)))?;
        let mut entry = archive
            .by_name(ARCHIVE_ENTRY)
            .map_err(|_| MappingError::MissingArchiveEntry {
                path: path.to_path_buf(),
                entry: ARCHIVE_ENTRY.to_string(),
            })?;
        let mut text = String::new();
        entry.read_to_string(&mut text).map_err(read_err)?;
        text
    } else {
        fs::read_to_string(path).map_err(read_err)?
    };
    parse_any(&text)
}

/// Writes the flat form of `tree` to `path`, replacing it atomically.
pub fn write_mappings_file(path: &Path, tree: &MappingTree) -> Result<(), MappingError> {
    let write_err = |source| MappingError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(write_mappings(tree).as_bytes())
        .map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = "\
remap-mappings v1 named mojang
# comment lines are ignored

net/minecraft/entity/Entity net/minecraft/world/entity/Entity
\tm ()Lnet/minecraft/world/World; getWorld level
\tf I age tickCount
\tm ()V tick -
net/minecraft/a/Alpha -
";

    #[test]
    fn parses_classes_and_members() {
        let tree = parse_mappings(SAMPLE).unwrap();
        assert_eq!(tree.class_count(), 2);
        let entity = tree.class("net/minecraft/entity/Entity").unwrap();
        assert_eq!(entity.fields().count(), 1);
        assert_eq!(entity.methods().count(), 2);
        let tick = entity.member(MemberKind::Method, "tick", "()V").unwrap();
        assert_eq!(tick.name(1), None);
        assert_eq!(tree.class("net/minecraft/a/Alpha").unwrap().name(1), None);
    }

    #[test]
    fn writes_sorted_with_fields_first() {
        let tree = parse_mappings(SAMPLE).unwrap();
        let text = write_mappings(&tree);
        let expected = "\
remap-mappings v1 named mojang
net/minecraft/a/Alpha -
net/minecraft/entity/Entity net/minecraft/world/entity/Entity
\tf I age tickCount
\tm ()Lnet/minecraft/world/World; getWorld level
\tm ()V tick -
";
        assert_eq!(text, expected);
        assert_eq!(parse_mappings(&text).unwrap(), tree);
    }

    #[test]
    fn reports_line_of_malformed_entry() {
        let text = "remap-mappings v1 named mojang\nA B\n\tf I onlyone\n";
        let err = parse_mappings(text).unwrap_err();
        assert!(matches!(err, MappingError::Parse { line: 3, .. }), "{err:?}");

        let text = "remap-mappings v1 named mojang\n\tf I a b\n";
        let err = parse_mappings(text).unwrap_err();
        assert!(matches!(err, MappingError::Parse { line: 2, .. }), "{err:?}");
    }

    #[test]
    fn unknown_format_detected() {
        let err = parse_any("v1\tofficial\tnamed\n").unwrap_err();
        assert!(matches!(err, MappingError::UnknownFormat(_)));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.mappings");
        let tree = parse_mappings(SAMPLE).unwrap();
        write_mappings_file(&path, &tree).unwrap();
        assert_eq!(read_mappings(&path).unwrap(), tree);
    }

    #[test]
    fn reads_tiny_from_jar() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mappings.jar");
        let file = fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(ARCHIVE_ENTRY, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"tiny\t2\t0\tofficial\tnamed\nc\ta\tnet/minecraft/Entity\n")
            .unwrap();
        zip.finish().unwrap();

        let tree = read_mappings(&path).unwrap();
        assert_eq!(tree.class("a").unwrap().name(1), Some("net/minecraft/Entity"));
    }
}
