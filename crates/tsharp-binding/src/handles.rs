//! Arena handles.
//!
//! Each handle is a `u32` index into one of the tables owned by
//! [`Bindings`](crate::Bindings). Handles are only meaningful for the
//! table that produced them.

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle!(
    /// A declared name (class, function, variable, import...).
    DeclId
);
handle!(
    /// One call signature of a function or method.
    SignatureId
);
handle!(
    /// A member of a class or interface.
    MemberId
);
handle!(
    /// A captured type annotation.
    TypeSyntaxId
);
handle!(
    /// A source module.
    ModuleId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_roundtrip_and_display() {
        let id = DeclId::new(7);
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "DeclId#7");
        assert!(SignatureId::new(1) < SignatureId::new(2));
    }
}
