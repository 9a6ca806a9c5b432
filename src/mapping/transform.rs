//! Pure table transformations.
//!
//! Every stage borrows its input and returns a new table, so a composition
//! pipeline is a plain chain of calls with no hidden visiting order.

use std::collections::BTreeMap;

use super::descriptor::map_descriptor;
use super::error::MappingError;
use super::tree::{ClassMapping, MappingTree, MemberKind, MemberMapping, Namespace};

impl MappingTree {
    /// Relabels namespaces; `renames` pairs existing labels with new ones.
    pub fn rename_namespaces(&self, renames: &[(&str, &str)]) -> Result<MappingTree, MappingError> {
        let mut namespaces = self.namespaces.clone();
        for (from, to) in renames {
            let idx = self.namespace_index(from)?;
            namespaces[idx] = Namespace::new(*to)?;
        }
        let mut out = MappingTree::new(namespaces)?;
        out.classes = self.classes.clone();
        Ok(out)
    }

    /// Keeps the source namespace and exactly the listed destinations, in
    /// the listed order. The first entry becomes the lookup-primary
    /// destination.
    pub fn reorder_destinations(&self, order: &[&str]) -> Result<MappingTree, MappingError> {
        let mut indices = vec![0];
        for ns in order {
            let idx = self.namespace_index(ns)?;
            if indices.contains(&idx) {
                return Err(MappingError::DuplicateNamespace(ns.to_string()));
            }
            indices.push(idx);
        }
        Ok(self.project(&indices))
    }

    /// Restricts the table to `keep`, which must name the source namespace.
    pub fn retain_namespaces(&self, keep: &[&str]) -> Result<MappingTree, MappingError> {
        if !keep.iter().any(|ns| self.source() == *ns) {
            return Err(MappingError::SourceNotRetained(self.source().to_string()));
        }
        let destinations: Vec<&str> = keep
            .iter()
            .copied()
            .filter(|ns| self.source() != *ns)
            .collect();
        self.reorder_destinations(&destinations)
    }

    /// Namespace union of two tables keyed from the same origin. Names from
    /// `other` win where both tables name the same node in one namespace.
    pub fn merge(&self, other: &MappingTree) -> Result<MappingTree, MappingError> {
        if self.source() != other.source() {
            return Err(MappingError::OriginMismatch {
                left: self.source().to_string(),
                right: other.source().to_string(),
            });
        }

        let mut namespaces = self.namespaces.clone();
        let mut slots = Vec::with_capacity(other.namespaces.len());
        for ns in &other.namespaces {
            match namespaces.iter().position(|n| n == ns) {
                Some(idx) => slots.push(idx),
                None => {
                    slots.push(namespaces.len());
                    namespaces.push(ns.clone());
                }
            }
        }

        let mut out = MappingTree::new(namespaces)?;
        for class in self.classes.values() {
            out.insert_class(class.clone());
        }
        let width = out.namespaces.len();
        for class in other.classes.values() {
            let mut placed = ClassMapping::new(scatter(&class.names, &slots, width));
            for (kind, member) in class_members(class) {
                placed.insert_member(
                    kind,
                    MemberMapping::new(member.desc.clone(), scatter(&member.names, &slots, width)),
                );
            }
            out.insert_class(placed);
        }
        Ok(out)
    }

    /// Makes `ns` the source namespace. The previous source takes the slot
    /// `ns` occupied. Nodes without a name in `ns` are dropped when
    /// `drop_missing` is set, otherwise they keep their old source name.
    pub fn switch_source(&self, ns: &str, drop_missing: bool) -> Result<MappingTree, MappingError> {
        let idx = self.namespace_index(ns)?;
        if idx == 0 {
            return Ok(self.clone());
        }
        let mut order: Vec<usize> = (0..self.namespaces.len()).collect();
        order.swap(0, idx);

        let class_names = self.class_names_to(idx);
        let mut out = MappingTree::new(order.iter().map(|&i| self.namespaces[i].clone()).collect())?;
        for class in self.classes.values() {
            let Some(new_source) = class
                .name(idx)
                .or((!drop_missing).then(|| class.source_name()))
            else {
                continue;
            };
            let mut names = gather(&class.names, &order);
            names[0] = Some(new_source.to_string());
            let mut switched = ClassMapping::new(names);

            for (kind, member) in class_members(class) {
                let Some(new_name) = member
                    .name(idx)
                    .or((!drop_missing).then(|| member.source_name()))
                else {
                    continue;
                };
                let mut names = gather(&member.names, &order);
                names[0] = Some(new_name.to_string());
                let desc = map_descriptor(&member.desc, |c| class_names.get(c).copied());
                switched.insert_member(kind, MemberMapping::new(desc, names));
            }

            if out.class(new_source).is_some() {
                tracing::debug!(class = new_source, namespace = ns, "merging colliding class");
            }
            out.insert_class(switched);
        }
        Ok(out)
    }

    /// Copies the table keeping the namespaces at `indices`; `indices[0]`
    /// must be 0 so member keys stay valid.
    fn project(&self, indices: &[usize]) -> MappingTree {
        let namespaces = indices.iter().map(|&i| self.namespaces[i].clone()).collect();
        let mut classes = BTreeMap::new();
        for (key, class) in &self.classes {
            let mut projected = ClassMapping::new(gather(&class.names, indices));
            for (kind, member) in class_members(class) {
                projected.insert_member(
                    kind,
                    MemberMapping::new(member.desc.clone(), gather(&member.names, indices)),
                );
            }
            classes.insert(key.clone(), projected);
        }
        MappingTree {
            namespaces,
            classes,
        }
    }
}

fn class_members(class: &ClassMapping) -> impl Iterator<Item = (MemberKind, &MemberMapping)> {
    class
        .fields
        .values()
        .map(|m| (MemberKind::Field, m))
        .chain(class.methods.values().map(|m| (MemberKind::Method, m)))
}

/// Picks `names[i]` for every `i` in `indices`.
fn gather(names: &[Option<String>], indices: &[usize]) -> Vec<Option<String>> {
    indices
        .iter()
        .map(|&i| names.get(i).cloned().flatten())
        .collect()
}

/// Places `names[i]` at `slots[i]` in a vector of `width` entries.
fn scatter(names: &[Option<String>], slots: &[usize], width: usize) -> Vec<Option<String>> {
    let mut out = vec![None; width];
    for (name, &slot) in names.iter().zip(slots) {
        out[slot].clone_from(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::format::parse_mappings;

    const OFFICIAL_NAMED: &str = "\
remap-mappings v1 official named
a net/minecraft/Entity
\tf I b age
\tm (La;)V c tick
b net/minecraft/World
";

    const OFFICIAL_MOJANG: &str = "\
remap-mappings v1 official mojang
a net/minecraft/world/Entity
\tf I b tickCount
\tm (La;)V c baseTick
c net/minecraft/Unused
";

    #[test]
    fn rename_keeps_nodes() {
        let tree = parse_mappings(OFFICIAL_NAMED).unwrap();
        let renamed = tree.rename_namespaces(&[("named", "yarn")]).unwrap();
        assert_eq!(renamed.destinations()[0].as_str(), "yarn");
        assert_eq!(renamed.class("a").unwrap().name(1), Some("net/minecraft/Entity"));
    }

    #[test]
    fn rename_to_existing_label_fails() {
        let tree = parse_mappings(OFFICIAL_NAMED).unwrap();
        let err = tree.rename_namespaces(&[("named", "official")]).unwrap_err();
        assert!(matches!(err, MappingError::DuplicateNamespace(_)));
    }

    #[test]
    fn merge_requires_shared_origin() {
        let left = parse_mappings(OFFICIAL_NAMED).unwrap();
        let right = parse_mappings("remap-mappings v1 intermediary named\n").unwrap();
        let err = left.merge(&right).unwrap_err();
        assert!(matches!(err, MappingError::OriginMismatch { .. }));
    }

    #[test]
    fn merge_unions_namespaces() {
        let named = parse_mappings(OFFICIAL_NAMED).unwrap();
        let mojang = parse_mappings(OFFICIAL_MOJANG).unwrap();
        let merged = named.merge(&mojang).unwrap();
        let labels: Vec<_> = merged.namespaces().iter().map(Namespace::as_str).collect();
        assert_eq!(labels, ["official", "named", "mojang"]);

        let entity = merged.class("a").unwrap();
        assert_eq!(entity.name(1), Some("net/minecraft/Entity"));
        assert_eq!(entity.name(2), Some("net/minecraft/world/Entity"));
        let tick = entity.member(MemberKind::Method, "c", "(La;)V").unwrap();
        assert_eq!(tick.name(2), Some("baseTick"));
        assert_eq!(merged.class("c").unwrap().name(1), None);
    }

    #[test]
    fn switch_source_rekeys_members_and_descriptors() {
        let named = parse_mappings(OFFICIAL_NAMED).unwrap();
        let switched = named.switch_source("named", true).unwrap();
        assert_eq!(switched.source().as_str(), "named");
        let entity = switched.class("net/minecraft/Entity").unwrap();
        assert_eq!(entity.name(1), Some("a"));
        let tick = entity
            .member(MemberKind::Method, "tick", "(Lnet/minecraft/Entity;)V")
            .unwrap();
        assert_eq!(tick.name(1), Some("c"));
    }

    #[test]
    fn switch_source_drops_unnamed_nodes() {
        let merged = parse_mappings(OFFICIAL_NAMED)
            .unwrap()
            .merge(&parse_mappings(OFFICIAL_MOJANG).unwrap())
            .unwrap();
        let dropped = merged.switch_source("named", true).unwrap();
        assert!(dropped.class("net/minecraft/Unused").is_none());
        assert!(dropped.class("c").is_none());

        let kept = merged.switch_source("named", false).unwrap();
        assert!(kept.class("c").is_some());
    }

    #[test]
    fn retain_requires_source() {
        let merged = parse_mappings(OFFICIAL_NAMED)
            .unwrap()
            .merge(&parse_mappings(OFFICIAL_MOJANG).unwrap())
            .unwrap();
        let err = merged.retain_namespaces(&["named", "mojang"]).unwrap_err();
        assert!(matches!(err, MappingError::SourceNotRetained(_)));

        let two = merged.retain_namespaces(&["official", "mojang"]).unwrap();
        assert_eq!(two.namespaces().len(), 2);
        assert_eq!(two.class("a").unwrap().name(1), Some("net/minecraft/world/Entity"));
    }

    mod laws {
        use proptest::prelude::*;

        use crate::mapping::tree::{ClassMapping, MappingTree, MemberKind, MemberMapping, Namespace};

        type Shape = Vec<(Vec<usize>, Vec<usize>)>;

        /// Every node named in both namespaces, no two nodes sharing a name.
        fn bijective(shape: &Shape) -> MappingTree {
            let namespaces = vec![Namespace::new("a").unwrap(), Namespace::new("b").unwrap()];
            let mut tree = MappingTree::new(namespaces).unwrap();
            let n = shape.len();
            for (i, (fields, methods)) in shape.iter().enumerate() {
                let mut class = ClassMapping::new(vec![
                    Some(format!("src/C{i}")),
                    Some(format!("dst/D{i}")),
                ]);
                for (j, target) in fields.iter().enumerate() {
                    let desc = format!("Lsrc/C{};", target % n);
                    class.insert_member(
                        MemberKind::Field,
                        MemberMapping::new(desc, vec![Some(format!("f{j}")), Some(format!("tf{j}"))]),
                    );
                }
                for (j, target) in methods.iter().enumerate() {
                    let desc = format!("(ILsrc/C{};)V", target % n);
                    class.insert_member(
                        MemberKind::Method,
                        MemberMapping::new(desc, vec![Some(format!("m{j}")), Some(format!("tm{j}"))]),
                    );
                }
                tree.insert_class(class);
            }
            tree
        }

        fn shape_strategy() -> impl Strategy<Value = Shape> {
            let members = prop::collection::vec(0usize..8, 0..4);
            prop::collection::vec((members.clone(), members), 1..6)
        }

        proptest! {
            #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

            #[test]
            fn switching_source_twice_is_identity(shape in shape_strategy()) {
                let tree = bijective(&shape);
                let back = tree
                    .switch_source("b", true)
                    .and_then(|t| t.switch_source("a", true))
                    .unwrap_or_else(|e| panic!("switch failed: {e}"));
                prop_assert_eq!(back, tree);
            }

            #[test]
            fn flat_text_preserves_table(shape in shape_strategy()) {
                let tree = bijective(&shape);
                let text = crate::mapping::write_mappings(&tree);
                let parsed = crate::mapping::parse_mappings(&text)
                    .unwrap_or_else(|e| panic!("parse failed: {e}"));
                prop_assert_eq!(parsed, tree);
            }
        }
    }
}
