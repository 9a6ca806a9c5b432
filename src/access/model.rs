//! Access descriptor values and the visitor seam.

use std::fmt;
use std::str::FromStr;

use super::error::DescriptorError;

pub const HEADER_KEYWORD: &str = "accessWidener";
pub const MAX_VERSION: u32 = 2;
const TRANSITIVE_PREFIX: &str = "transitive-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub namespace: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Access {
    Accessible,
    Extendable,
    Mutable,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Accessible => "accessible",
            Access::Extendable => "extendable",
            Access::Mutable => "mutable",
        }
    }
}

impl FromStr for Access {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accessible" => Ok(Access::Accessible),
            "extendable" => Ok(Access::Extendable),
            "mutable" => Ok(Access::Mutable),
            other => Err(format!("unknown access {other:?}")),
        }
    }
}

/// Access keyword with its optional `transitive-` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rule {
    pub access: Access,
    pub transitive: bool,
}

impl Rule {
    pub fn new(access: Access, transitive: bool) -> Self {
        Self { access, transitive }
    }

    pub(crate) fn parse(word: &str) -> Result<Self, String> {
        match word.strip_prefix(TRANSITIVE_PREFIX) {
            Some(rest) => Ok(Rule::new(rest.parse()?, true)),
            None => Ok(Rule::new(word.parse()?, false)),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.transitive {
            f.write_str(TRANSITIVE_PREFIX)?;
        }
        f.write_str(self.access.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Class {
        name: String,
    },
    Method {
        owner: String,
        name: String,
        desc: String,
    },
    Field {
        owner: String,
        name: String,
        desc: String,
    },
}

impl Target {
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Class { .. } => "class",
            Target::Method { .. } => "method",
            Target::Field { .. } => "field",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub rule: Rule,
    pub target: Target,
}

/// Streaming consumer of a descriptor. The reader calls `visit_header` once,
/// then one entry method per line in file order.
pub trait AccessVisitor {
    fn visit_header(&mut self, header: &Header) -> Result<(), DescriptorError>;

    fn visit_class(&mut self, name: &str, rule: Rule) -> Result<(), DescriptorError>;

    fn visit_method(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
        rule: Rule,
    ) -> Result<(), DescriptorError>;

    fn visit_field(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
        rule: Rule,
    ) -> Result<(), DescriptorError>;
}

/// Whole descriptor held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDescriptor {
    pub header: Header,
    pub entries: Vec<Entry>,
}

impl AccessDescriptor {
    pub fn new(version: u32, namespace: impl Into<String>) -> Self {
        Self {
            header: Header {
                version,
                namespace: namespace.into(),
            },
            entries: Vec::new(),
        }
    }

    /// Replays the descriptor into `visitor`.
    pub fn accept<V: AccessVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), DescriptorError> {
        visitor.visit_header(&self.header)?;
        for entry in &self.entries {
            match &entry.target {
                Target::Class { name } => visitor.visit_class(name, entry.rule)?,
                Target::Method { owner, name, desc } => {
                    visitor.visit_method(owner, name, desc, entry.rule)?
                }
                Target::Field { owner, name, desc } => {
                    visitor.visit_field(owner, name, desc, entry.rule)?
                }
            }
        }
        Ok(())
    }
}

/// Collects visited entries into an [`AccessDescriptor`].
#[derive(Debug, Default)]
pub struct Collector {
    descriptor: Option<AccessDescriptor>,
}

impl Collector {
    pub fn finish(self) -> Result<AccessDescriptor, DescriptorError> {
        self.descriptor.ok_or(DescriptorError::MissingHeader)
    }

    fn push(&mut self, rule: Rule, target: Target) -> Result<(), DescriptorError> {
        let descriptor = self
            .descriptor
            .as_mut()
            .ok_or(DescriptorError::MissingHeader)?;
        descriptor.entries.push(Entry { rule, target });
        Ok(())
    }
}

impl AccessVisitor for Collector {
    fn visit_header(&mut self, header: &Header) -> Result<(), DescriptorError> {
        self.descriptor = Some(AccessDescriptor {
            header: header.clone(),
            entries: Vec::new(),
        });
        Ok(())
    }

    fn visit_class(&mut self, name: &str, rule: Rule) -> Result<(), DescriptorError> {
        self.push(
            rule,
            Target::Class {
                name: name.to_string(),
            },
        )
    }

    fn visit_method(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
        rule: Rule,
    ) -> Result<(), DescriptorError> {
        self.push(
            rule,
            Target::Method {
                owner: owner.to_string(),
                name: name.to_string(),
                desc: desc.to_string(),
            },
        )
    }

    fn visit_field(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
        rule: Rule,
    ) -> Result<(), DescriptorError> {
        self.push(
            rule,
            Target::Field {
                owner: owner.to_string(),
                name: name.to_string(),
                desc: desc.to_string(),
            },
        )
    }
}
