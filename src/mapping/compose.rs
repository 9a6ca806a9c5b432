//! Composition of two origin-keyed tables into one namespace-pair table.

use std::path::{Path, PathBuf};

use super::error::MappingError;
use super::format::{read_mappings, write_mappings_file};
use super::tree::MappingTree;

/// Labels used while composing `origin -> A` with `origin -> B`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    /// Private label `A` is carried under while both tables are merged.
    pub intermediate: String,
    /// Namespace of table B promoted to the lookup-primary destination.
    pub promote: String,
}

impl Composition {
    pub fn new(intermediate: impl Into<String>, promote: impl Into<String>) -> Self {
        Self {
            intermediate: intermediate.into(),
            promote: promote.into(),
        }
    }
}

/// Result of [`compose`]: the `A -> B` table and the reordered B table it was
/// composed from.
#[derive(Debug, Clone)]
pub struct Composed {
    pub mapping: MappingTree,
    pub promoted: MappingTree,
}

/// Composes `a: origin -> A` and `b: origin -> B` into `A -> B`.
///
/// The output is keyed by A names and carries B names as its only
/// destination. A keeps its own label unless B already uses it, in which
/// case the intermediate label stays.
pub fn compose(
    a: &MappingTree,
    b: &MappingTree,
    composition: &Composition,
) -> Result<Composed, MappingError> {
    if a.source() != b.source() {
        return Err(MappingError::OriginMismatch {
            left: a.source().to_string(),
            right: b.source().to_string(),
        });
    }
    let a_label = match a.destinations() {
        [only] => only.as_str().to_string(),
        [] => return Err(MappingError::NoDestination),
        [first, ..] => {
            tracing::debug!(namespace = %first, "using first destination of table A");
            first.as_str().to_string()
        }
    };

    let renamed = a
        .rename_namespaces(&[(a_label.as_str(), composition.intermediate.as_str())])?
        .retain_namespaces(&[a.source().as_str(), composition.intermediate.as_str()])?;

    let mut order = vec![composition.promote.as_str()];
    order.extend(
        b.destinations()
            .iter()
            .map(|ns| ns.as_str())
            .filter(|ns| *ns != composition.promote),
    );
    let promoted = b.reorder_destinations(&order)?;

    let merged = promoted.merge(&renamed)?;
    let switched = merged
        .switch_source(&composition.intermediate, true)?
        .retain_namespaces(&[composition.intermediate.as_str(), composition.promote.as_str()])?;

    let mapping = if a_label != composition.promote {
        switched.rename_namespaces(&[(composition.intermediate.as_str(), a_label.as_str())])?
    } else {
        switched
    };

    tracing::debug!(
        classes = mapping.class_count(),
        from = %mapping.source(),
        to = %composition.promote,
        "composed mappings"
    );
    Ok(Composed { mapping, promoted })
}

/// Output files written by [`compose_files`].
#[derive(Debug, Clone)]
pub struct ComposeOutputs {
    pub composed: PathBuf,
    pub promoted: PathBuf,
}

/// Loads both tables, composes them and writes the composed table to
/// `output` with the reordered B table next to it.
pub fn compose_files(
    a: &Path,
    b: &Path,
    composition: &Composition,
    output: &Path,
) -> Result<ComposeOutputs, MappingError> {
    let a = read_mappings(a)?;
    let b = read_mappings(b)?;
    let composed = compose(&a, &b, composition)?;

    let promoted_path = side_file(output, &composition.promote);
    write_mappings_file(output, &composed.mapping)?;
    write_mappings_file(&promoted_path, &composed.promoted)?;
    tracing::info!(
        output = %output.display(),
        classes = composed.mapping.class_count(),
        "wrote composed mappings"
    );
    Ok(ComposeOutputs {
        composed: output.to_path_buf(),
        promoted: promoted_path,
    })
}

/// `out/composed.mappings` -> `out/composed.<label>.mappings`.
fn side_file(output: &Path, label: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mappings".to_string());
    let name = match output.extension() {
        Some(ext) => format!("{stem}.{label}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{label}"),
    };
    output.with_file_name(name)
}
