//! Line reader for access descriptors.
//!
//! ```text
//! accessWidener v2 named
//! accessible class net/minecraft/world/World
//! transitive-accessible method net/minecraft/Foo bar (I)V
//! mutable field net/minecraft/Foo baz I   # trailing comment
//! ```

use std::fs;
use std::path::Path;

use super::error::DescriptorError;
use super::model::{
    Access, AccessDescriptor, AccessVisitor, Collector, HEADER_KEYWORD, Header, MAX_VERSION, Rule,
};

/// Parses the header line only.
pub fn read_header(text: &str) -> Result<Header, DescriptorError> {
    let (_, line) = content_lines(text)
        .next()
        .ok_or(DescriptorError::MissingHeader)?;
    parse_header(line)
}

pub fn read_version(text: &str) -> Result<u32, DescriptorError> {
    read_header(text).map(|h| h.version)
}

/// Streams `text` into `visitor`, validating each entry.
pub fn read_descriptor<V: AccessVisitor + ?Sized>(
    text: &str,
    visitor: &mut V,
) -> Result<(), DescriptorError> {
    let mut lines = content_lines(text);
    let (_, header_line) = lines.next().ok_or(DescriptorError::MissingHeader)?;
    let header = parse_header(header_line)?;
    visitor.visit_header(&header)?;

    for (line_no, line) in lines {
        let mut tokens = line.split_whitespace();
        let (Some(rule), Some(kind)) = (tokens.next(), tokens.next()) else {
            return Err(parse_err(line_no, "expected access and target kind"));
        };
        let rule = Rule::parse(rule).map_err(|reason| parse_err(line_no, reason))?;
        if rule.transitive && header.version < 2 {
            return Err(parse_err(
                line_no,
                "transitive access requires version 2",
            ));
        }
        let rest: Vec<&str> = tokens.collect();

        match (kind, rest.as_slice()) {
            ("class", [name]) => {
                if rule.access == Access::Mutable {
                    return Err(parse_err(line_no, "classes cannot be mutable"));
                }
                visitor.visit_class(name, rule)?;
            }
            ("method", [owner, name, desc]) => {
                if rule.access == Access::Mutable {
                    return Err(parse_err(line_no, "methods cannot be mutable"));
                }
                visitor.visit_method(owner, name, desc, rule)?;
            }
            ("field", [owner, name, desc]) => {
                if rule.access == Access::Extendable {
                    return Err(parse_err(line_no, "fields cannot be extendable"));
                }
                visitor.visit_field(owner, name, desc, rule)?;
            }
            ("class" | "method" | "field", _) => {
                return Err(parse_err(
                    line_no,
                    format!("wrong number of tokens for {kind} entry"),
                ));
            }
            (other, _) => {
                return Err(parse_err(line_no, format!("unknown target kind {other:?}")));
            }
        }
    }
    Ok(())
}

pub fn parse_descriptor(text: &str) -> Result<AccessDescriptor, DescriptorError> {
    let mut collector = Collector::default();
    read_descriptor(text, &mut collector)?;
    collector.finish()
}

pub fn read_descriptor_file(path: &Path) -> Result<AccessDescriptor, DescriptorError> {
    let text = fs::read_to_string(path).map_err(|source| DescriptorError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_descriptor(&text)
}

fn parse_header(line: &str) -> Result<Header, DescriptorError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [keyword, version, namespace] = tokens.as_slice() else {
        return Err(parse_err(1, "header must be `accessWidener <version> <namespace>`"));
    };
    if *keyword != HEADER_KEYWORD {
        return Err(parse_err(1, format!("unexpected header keyword {keyword:?}")));
    }
    let version = version
        .strip_prefix('v')
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| parse_err(1, format!("invalid version {version:?}")))?;
    if version == 0 || version > MAX_VERSION {
        return Err(DescriptorError::UnsupportedVersion(version));
    }
    Ok(Header {
        version,
        namespace: namespace.to_string(),
    })
}

/// Non-empty lines with comments stripped, numbered from 1.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(i, line)| {
        let line = line.split('#').next().unwrap_or_default().trim();
        (!line.is_empty()).then_some((i + 1, line))
    })
}

fn parse_err(line: usize, reason: impl Into<String>) -> DescriptorError {
    DescriptorError::Parse {
        line,
        reason: reason.into(),
    }
}
