//! Tiny v2 reader.
//!
//! Only the class/field/method skeleton is read. Properties, comments,
//! parameters and local variables are skipped. Escaped names are not
//! supported.

use super::error::MappingError;
use super::tree::{ClassMapping, MappingTree, MemberKind, MemberMapping, Namespace};

pub const TINY_V2_HEADER: &str = "tiny\t2\t";

pub fn parse_tiny(text: &str) -> Result<MappingTree, MappingError> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));
    let (_, header) = lines
        .next()
        .ok_or_else(|| parse_err(1, "empty mapping file"))?;
    let mut cols = header.split('\t');
    if cols.next() != Some("tiny") || cols.next() != Some("2") {
        return Err(MappingError::UnknownFormat(header.to_string()));
    }
    cols.next()
        .ok_or_else(|| parse_err(1, "missing minor version"))?;
    let namespaces = cols.map(Namespace::new).collect::<Result<Vec<_>, _>>()?;
    let width = namespaces.len();
    let mut tree = MappingTree::new(namespaces)?;

    let mut current: Option<ClassMapping> = None;
    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let depth = line.bytes().take_while(|b| *b == b'\t').count();
        let mut cols = line[depth..].split('\t');
        match (depth, cols.next()) {
            (0, Some("c")) => {
                if let Some(done) = current.take() {
                    tree.insert_class(done);
                }
                current = Some(ClassMapping::new(read_names(cols, width, line_no)?));
            }
            (1, Some(tag @ ("f" | "m"))) => {
                let Some(class) = current.as_mut() else {
                    return Err(parse_err(line_no, "member line before any class"));
                };
                let kind = if tag == "f" {
                    MemberKind::Field
                } else {
                    MemberKind::Method
                };
                let desc = cols
                    .next()
                    .ok_or_else(|| parse_err(line_no, "missing descriptor"))?;
                let names = read_names(cols, width, line_no)?;
                class.insert_member(kind, MemberMapping::new(desc, names));
            }
            (0, other) => {
                return Err(parse_err(
                    line_no,
                    format!("unknown section {:?}", other.unwrap_or_default()),
                ));
            }
            // Properties, comments, parameters, variables.
            _ => {}
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
    let mut names: Vec<Option<String>> = cols
        .map(|c| (!c.is_empty()).then(|| c.to_string()))
        .collect();
    // Trailing empty names may be omitted entirely.
    if names.len() > width {
        return Err(parse_err(
            line,
            format!("expected {width} names, found {}", names.len()),
        ));
    }
    names.resize(width, None);
    if names[0].is_none() {
        return Err(parse_err(line, "source name is missing"));
    }
    Ok(names)
}

fn parse_err(line: usize, reason: impl Into<String>) -> MappingError {
    MappingError::Parse {
        line,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = "tiny\t2\t0\tofficial\tintermediary\tnamed
\tsorted-by
c\ta\tnet/minecraft/class_1297\tnet/minecraft/entity/Entity
\tc\tAn entity.
\tf\tI\tb\tfield_1\tage
\tm\t(La;)V\tc\tmethod_1\t
\t\tp\t1\t\t\tother
\t\tc\tParameter comment.
c\td\tnet/minecraft/class_1937
";

    #[test]
    fn reads_skeleton() {
        let tree = parse_tiny(TINY).unwrap();
        let labels: Vec<_> = tree.namespaces().iter().map(|n| n.as_str()).collect();
        assert_eq!(labels, ["official", "intermediary", "named"]);

        let entity = tree.class("a").unwrap();
        assert_eq!(entity.name(2), Some("net/minecraft/entity/Entity"));
        let age = entity.member(MemberKind::Field, "b", "I").unwrap();
        assert_eq!(age.name(2), Some("age"));
        let method = entity.member(MemberKind::Method, "c", "(La;)V").unwrap();
        assert_eq!(method.name(1), Some("method_1"));
        assert_eq!(method.name(2), None);

        let world = tree.class("d").unwrap();
        assert_eq!(world.name(1), Some("net/minecraft/class_1937"));
        assert_eq!(world.name(2), None);
    }

    #[test]
    fn rejects_other_versions() {
        let err = parse_tiny("tiny\t1\t0\ta\tb\n").unwrap_err();
        assert!(matches!(err, MappingError::UnknownFormat(_)));
    }

    #[test]
    fn rejects_unknown_sections() {
        let err = parse_tiny("tiny\t2\t0\ta\tb\nx\tfoo\n").unwrap_err();
        assert!(matches!(err, MappingError::Parse { line: 2, .. }));
    }
}
