//! Canonical nominal type identity.

use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of one nominal type.
///
/// Equality and hashing use `stable_id` only, which is derived from the
/// platform-qualified name. Two ids built from different spellings of the
/// same type are therefore equal as long as they agree on `platform_name`.
#[derive(Debug, Clone, Serialize)]
pub struct TypeId {
    pub stable_id: u64,
    /// Name as written in source (`List`, `number`, `User`).
    pub surface_name: Arc<str>,
    /// Fully qualified metadata name (``System.Collections.Generic.List`1``).
    pub platform_name: Arc<str>,
}

impl TypeId {
    pub fn new(surface_name: impl Into<Arc<str>>, platform_name: impl Into<Arc<str>>) -> Self {
        let platform_name = platform_name.into();
        Self {
            stable_id: stable_hash(&platform_name),
            surface_name: surface_name.into(),
            platform_name,
        }
    }

    /// Namespace part of the platform name (`System.Collections.Generic`).
    pub fn namespace(&self) -> &str {
        self.platform_name
            .rsplit_once('.')
            .map(|(ns, _)| ns)
            .unwrap_or("")
    }

    /// Metadata name without namespace (``List`1``).
    pub fn metadata_name(&self) -> &str {
        self.platform_name
            .rsplit_once('.')
            .map(|(_, name)| name)
            .unwrap_or(&self.platform_name)
    }

    /// Simple name without namespace or arity suffix (`List`).
    pub fn simple_name(&self) -> &str {
        strip_arity(self.metadata_name())
    }

    /// Qualified name without arity suffix (`System.Collections.Generic.List`).
    pub fn qualified_name(&self) -> String {
        let ns = self.namespace();
        if ns.is_empty() {
            self.simple_name().to_string()
        } else {
            format!("{}.{}", ns, self.simple_name())
        }
    }

    /// Generic arity encoded in the metadata name.
    pub fn arity(&self) -> usize {
        arity_of(self.metadata_name())
    }
}

impl PartialEq for TypeId {
    fn eq(&self, other: &Self) -> bool {
        self.stable_id == other.stable_id
    }
}

impl Eq for TypeId {}

impl Hash for TypeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stable_id.hash(state);
    }
}

impl PartialOrd for TypeId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.platform_name.cmp(&other.platform_name)
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.platform_name)
    }
}

/// First 8 bytes of the blake3 hash of `name`.
pub fn stable_hash(name: &str) -> u64 {
    let hash = blake3::hash(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// ``List`1`` → `List`, `List_1` → `List`.
pub fn strip_arity(name: &str) -> &str {
    for sep in ['`', '_'] {
        if let Some((base, digits)) = name.rsplit_once(sep)
            && !base.is_empty()
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
        {
            return base;
        }
    }
    name
}

fn arity_of(name: &str) -> usize {
    name.rsplit_once('`')
        .and_then(|(_, digits)| digits.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_follows_platform_name() {
        let a = TypeId::new("List", "System.Collections.Generic.List`1");
        let b = TypeId::new("List_1", "System.Collections.Generic.List`1");
        assert_eq!(a, b);
        assert_eq!(a.stable_id, stable_hash("System.Collections.Generic.List`1"));
    }

    #[test]
    fn test_name_parts() {
        let id = TypeId::new("Dictionary", "System.Collections.Generic.Dictionary`2");
        assert_eq!(id.namespace(), "System.Collections.Generic");
        assert_eq!(id.simple_name(), "Dictionary");
        assert_eq!(id.arity(), 2);
        assert_eq!(id.qualified_name(), "System.Collections.Generic.Dictionary");
    }

    #[test]
    fn test_strip_arity_keeps_plain_underscores() {
        assert_eq!(strip_arity("List_1"), "List");
        assert_eq!(strip_arity("my_type"), "my_type");
        assert_eq!(strip_arity("Func`3"), "Func");
    }
}
