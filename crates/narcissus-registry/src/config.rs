//! Names of the well-known host entities the registry resolves.
//!
//! The defaults are the JVM's own names. A host with a different object
//! model overrides individual entries:
//!
//! ```
//! use narcissus_core::PrimitiveKind;
//! use narcissus_registry::RegistryConfig;
//!
//! let config = RegistryConfig::default()
//!     .with_object_name("core/Any")
//!     .with_boxed_name(PrimitiveKind::Int, "core/BoxedInt");
//! assert_eq!(config.wrapper(PrimitiveKind::Int).unwrap().boxed, "core/BoxedInt");
//! ```

use narcissus_core::PrimitiveKind;

/// Names needed to resolve one primitive kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperNames {
    pub kind: PrimitiveKind,
    /// Internal name of the boxed wrapper type (`java/lang/Integer`)
    pub boxed: String,
    /// Static field of the wrapper holding the canonical primitive type (`TYPE`)
    pub type_field: String,
    /// Unbox accessor name and signature (`intValue`, `()I`)
    pub unbox: (String, String),
    /// Box accessor name and signature (`valueOf`, `(I)Ljava/lang/Integer;`)
    pub box_value: (String, String),
}

impl WrapperNames {
    fn jvm(kind: PrimitiveKind, simple: &str, unbox: &str) -> Self {
        let boxed = format!("java/lang/{simple}");
        let descriptor = kind.descriptor();
        Self {
            kind,
            type_field: "TYPE".to_string(),
            unbox: (unbox.to_string(), format!("(){descriptor}")),
            box_value: ("valueOf".to_string(), format!("({descriptor})L{boxed};")),
            boxed,
        }
    }
}

/// Everything [`crate::TypeRegistry::initialize`] resolves by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// One entry per value kind, in [`PrimitiveKind::VALUE_KINDS`] order
    pub wrappers: Vec<WrapperNames>,
    /// Owner type and static field holding the canonical `void` type
    pub void_type: (String, String),
    /// The reference supertype
    pub object: String,
    /// The type of class objects, which owns the component accessor
    pub class: String,
    /// Array component accessor name and signature
    pub component_accessor: (String, String),
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let wrappers = PrimitiveKind::VALUE_KINDS
            .into_iter()
            .map(|kind| {
                let unbox = format!("{}Value", kind.name());
                WrapperNames::jvm(kind, kind.boxed_name(), &unbox)
            })
            .collect();
        Self {
            wrappers,
            void_type: ("java/lang/Void".to_string(), "TYPE".to_string()),
            object: "java/lang/Object".to_string(),
            class: "java/lang/Class".to_string(),
            component_accessor: (
                "getComponentType".to_string(),
                "()Ljava/lang/Class;".to_string(),
            ),
        }
    }
}

impl RegistryConfig {
    /// Names for one value kind. `None` for `Void`.
    pub fn wrapper(&self, kind: PrimitiveKind) -> Option<&WrapperNames> {
        self.wrappers.iter().find(|w| w.kind == kind)
    }

    pub fn with_boxed_name(mut self, kind: PrimitiveKind, name: impl Into<String>) -> Self {
        let name = name.into();
        if let Some(w) = self.wrappers.iter_mut().find(|w| w.kind == kind) {
            w.boxed = name;
        }
        self
    }

    pub fn with_unbox_accessor(
        mut self,
        kind: PrimitiveKind,
        name: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        let accessor = (name.into(), signature.into());
        if let Some(w) = self.wrappers.iter_mut().find(|w| w.kind == kind) {
            w.unbox = accessor;
        }
        self
    }

    pub fn with_object_name(mut self, name: impl Into<String>) -> Self {
        self.object = name.into();
        self
    }
}
