//! Class definitions for the in-memory host.
//!
//! [`ClassBuilder`] describes a class by name; [`SimRuntime::define`]
//! resolves the names and installs it. Type names may be given in source form
//! (`java.lang.String`, `int[]`) or internal form (`java/lang/String`, `[I`).
//!
//! # Example
//!
//! ```
//! use narcissus::sim::{ClassBuilder, SimRuntime, arg};
//! use narcissus_core::{Modifiers, ReturnValue};
//!
//! let rt = SimRuntime::new();
//! rt.define(
//!     ClassBuilder::new("demo.Calc")
//!         .field("total", "long", Modifiers::PRIVATE)
//!         .method("sum", &["int", "int"], "int", Modifiers::STATIC, |_, _, args| {
//!             let sum = arg::<i32>(args, 0)? + arg::<i32>(args, 1)?;
//!             Ok(ReturnValue::Primitive(sum.into()))
//!         }),
//! )
//! .unwrap();
//! ```
//!
//! [`SimRuntime::define`]: crate::sim::SimRuntime::define

use std::fmt;
use std::sync::Arc;

use narcissus_core::{
    HostError, MemberDescriptor, Modifiers, ObjectRef, PrimitiveKind, ReturnValue, Slot,
    TypeHandle,
};

use crate::names::internal_name;
use crate::sim::SimRuntime;

/// Body of a simulated method or constructor.
///
/// Receives the runtime, the receiver (`None` for static methods) and the
/// marshaled argument slots.
pub type MethodBody = Arc<
    dyn Fn(&SimRuntime, Option<ObjectRef>, &[Slot]) -> Result<ReturnValue, HostError>
        + Send
        + Sync,
>;

// ============================================================================
// Installed definitions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClassKind {
    Class,
    Interface,
    Primitive(PrimitiveKind),
    Array { component: TypeHandle },
}

#[derive(Debug, Clone)]
pub(crate) struct MethodDef {
    pub descriptor: MemberDescriptor,
    /// Method descriptor string, matched by accessor resolution
    pub signature: String,
}

#[derive(Debug, Clone)]
pub(crate) struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub superclass: Option<TypeHandle>,
    pub interfaces: Vec<TypeHandle>,
    pub fields: Vec<MemberDescriptor>,
    pub methods: Vec<MethodDef>,
    pub constructors: Vec<MethodDef>,
}

impl ClassDef {
    /// A definition with no members, for primitive and array classes.
    pub fn synthetic(name: String, kind: ClassKind, superclass: Option<TypeHandle>) -> Self {
        Self {
            name,
            kind,
            modifiers: Modifiers::PUBLIC | Modifiers::FINAL | Modifiers::ABSTRACT,
            superclass,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Class
            && !self
                .modifiers
                .intersects(Modifiers::ABSTRACT | Modifiers::INTERFACE)
    }

    pub fn field_named(&self, name: &str) -> Option<&MemberDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ============================================================================
// Builder
// ============================================================================

pub(crate) struct FieldSpec {
    pub name: String,
    pub type_name: String,
    pub modifiers: Modifiers,
}

pub(crate) struct MethodSpec {
    pub name: String,
    pub params: Vec<String>,
    pub ret: String,
    pub modifiers: Modifiers,
    pub body: Option<MethodBody>,
}

/// Fluent description of a class to install in a [`SimRuntime`].
///
/// Classes extend `java/lang/Object` unless [`ClassBuilder::extends`] says
/// otherwise. A class with no declared constructor gets a public no-arg one.
pub struct ClassBuilder {
    pub(crate) name: String,
    pub(crate) modifiers: Modifiers,
    pub(crate) superclass: Option<String>,
    pub(crate) interfaces: Vec<String>,
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) methods: Vec<MethodSpec>,
    pub(crate) constructors: Vec<MethodSpec>,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: internal_name(name),
            modifiers: Modifiers::PUBLIC,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Class-level modifiers. `INTERFACE` and `ABSTRACT` are kept if already set.
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        let kept = self.modifiers & (Modifiers::INTERFACE | Modifiers::ABSTRACT);
        self.modifiers = modifiers | kept;
        self
    }

    /// Mark as an interface.
    pub fn interface(mut self) -> Self {
        self.modifiers |= Modifiers::INTERFACE | Modifiers::ABSTRACT;
        self
    }

    /// Mark as abstract, so it cannot be instantiated.
    pub fn abstract_class(mut self) -> Self {
        self.modifiers |= Modifiers::ABSTRACT;
        self
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(internal_name(superclass));
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(internal_name(interface));
        self
    }

    /// Declare a field. Include `Modifiers::STATIC` for a static field.
    pub fn field(mut self, name: &str, type_name: &str, modifiers: Modifiers) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            type_name: internal_name(type_name),
            modifiers,
        });
        self
    }

    /// Declare a method with a body.
    pub fn method<F>(
        mut self,
        name: &str,
        params: &[&str],
        ret: &str,
        modifiers: Modifiers,
        body: F,
    ) -> Self
    where
        F: Fn(&SimRuntime, Option<ObjectRef>, &[Slot]) -> Result<ReturnValue, HostError>
            + Send
            + Sync
            + 'static,
    {
        let body: MethodBody = Arc::new(body);
        self.methods
            .push(method_spec(name, params, ret, modifiers, Some(body)));
        self
    }

    /// Declare a method without a body.
    pub fn abstract_method(
        mut self,
        name: &str,
        params: &[&str],
        ret: &str,
        modifiers: Modifiers,
    ) -> Self {
        self.methods.push(method_spec(
            name,
            params,
            ret,
            modifiers | Modifiers::ABSTRACT,
            None,
        ));
        self
    }

    /// Declare a constructor. The body runs on an already allocated receiver.
    pub fn constructor<F>(mut self, params: &[&str], modifiers: Modifiers, body: F) -> Self
    where
        F: Fn(&SimRuntime, Option<ObjectRef>, &[Slot]) -> Result<ReturnValue, HostError>
            + Send
            + Sync
            + 'static,
    {
        let body: MethodBody = Arc::new(body);
        self.constructors.push(method_spec(
            "<init>",
            params,
            "void",
            modifiers - Modifiers::STATIC,
            Some(body),
        ));
        self
    }

    pub(crate) fn is_interface(&self) -> bool {
        self.modifiers.contains(Modifiers::INTERFACE)
    }
}

impl fmt::Debug for ClassBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBuilder")
            .field("name", &self.name)
            .field("modifiers", &self.modifiers)
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

fn method_spec(
    name: &str,
    params: &[&str],
    ret: &str,
    modifiers: Modifiers,
    body: Option<MethodBody>,
) -> MethodSpec {
    MethodSpec {
        name: name.to_string(),
        params: params.iter().map(|p| internal_name(p)).collect(),
        ret: internal_name(ret),
        modifiers,
        body,
    }
}
