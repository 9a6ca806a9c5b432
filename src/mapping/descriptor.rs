//! Type descriptor and internal class name helpers.
//!
//! Class names are JVM internal names (`net/minecraft/Foo$Bar`). Descriptors
//! are JVM field/method descriptors (`I`, `Lnet/minecraft/Foo;`,
//! `(ILjava/lang/String;)V`).

/// Rewrites every `L<class>;` reference in a field or method descriptor.
///
/// Classes `map_class` does not know are kept as they are.
pub fn map_descriptor<'m, F>(desc: &str, map_class: F) -> String
where
    F: Fn(&str) -> Option<&'m str>,
{
    let mut out = String::with_capacity(desc.len());
    let mut rest = desc;
    // Primitive tags never use `L`, so the next `L` always opens a class name.
    while let Some(start) = rest.find('L') {
        out.push_str(&rest[..=start]);
        let after = &rest[start + 1..];
        match after.find(';') {
            Some(end) => {
                let class = &after[..end];
                out.push_str(map_class(class).unwrap_or(class));
                out.push(';');
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(after);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn is_method_descriptor(desc: &str) -> bool {
    desc.starts_with('(')
}

/// `net/minecraft/Foo$Bar` -> `Bar`.
pub fn simple_name(internal: &str) -> &str {
    let tail = internal.rsplit('/').next().unwrap_or(internal);
    tail.rsplit('$').next().unwrap_or(tail)
}

/// `net/minecraft/Foo$Bar` -> `net/minecraft`; empty for the default package.
pub fn package_of(internal: &str) -> &str {
    internal.rfind('/').map_or("", |i| &internal[..i])
}

/// `net/minecraft/Foo$Bar` -> `net.minecraft.Foo.Bar` (source spelling).
pub fn to_source_name(internal: &str) -> String {
    internal.replace(['/', '$'], ".")
}

/// Converts a dotted or slashed class reference (`a.b.C`, `a/b/C`) to
/// slashed form without resolving nesting.
pub fn to_internal_name(reference: &str) -> String {
    reference.replace('.', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> Option<&'static str> {
        match name {
            "net/minecraft/class_1297" => Some("net/minecraft/world/entity/Entity"),
            "net/minecraft/class_1937" => Some("net/minecraft/world/level/Level"),
            _ => None,
        }
    }

    #[test]
    fn maps_method_descriptor_classes() {
        let desc = "(ILnet/minecraft/class_1297;[Lnet/minecraft/class_1937;)Ljava/lang/String;";
        assert_eq!(
            map_descriptor(desc, table),
            "(ILnet/minecraft/world/entity/Entity;[Lnet/minecraft/world/level/Level;)Ljava/lang/String;"
        );
    }

    #[test]
    fn primitive_descriptors_untouched() {
        assert_eq!(map_descriptor("(IJZ)V", table), "(IJZ)V");
        assert_eq!(map_descriptor("[D", table), "[D");
    }

    #[test]
    fn class_name_helpers() {
        assert_eq!(simple_name("net/minecraft/Foo$Bar"), "Bar");
        assert_eq!(simple_name("Foo"), "Foo");
        assert_eq!(package_of("net/minecraft/Foo$Bar"), "net/minecraft");
        assert_eq!(package_of("Foo"), "");
        assert_eq!(to_source_name("net/minecraft/Foo$Bar"), "net.minecraft.Foo.Bar");
        assert!(is_method_descriptor("()V"));
        assert!(!is_method_descriptor("I"));
    }
}
