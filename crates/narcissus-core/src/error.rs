//! Error types for the bridge.
//!
//! ## Error Hierarchy
//!
//! ```text
//! BridgeError (top-level wrapper)
//! ├── MarshalError    - argument marshaling (null, type, arity)
//! ├── AccessError     - gate checks before a field/method operation
//! ├── RegistryError   - registry lifecycle and resolution failures
//! │   └── ResolutionError
//! ├── HostError       - failures reported by the host runtime
//! └── lookup failures - no such class/method/field/constructor
//! ```
//!
//! Every error maps to a coarse [`FailureKind`] through `kind()`, which is
//! what a forwarding layer uses to pick the embedding's exception type.

use std::fmt;

use thiserror::Error;

use crate::{MemberKind, ObjectRef, PrimitiveKind, TypeHandle};

/// Coarse failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NullArgument,
    TypeMismatch,
    ArityMismatch,
    ResolutionFailure,
    HostFailure,
    Lookup,
}

// ============================================================================
// Host Errors
// ============================================================================

/// Failures reported by the host runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// The object reference no longer denotes a live object
    #[error("stale object reference {0}")]
    StaleReference(ObjectRef),

    /// The type handle is not known to the host
    #[error("unknown type {0:?}")]
    UnknownType(TypeHandle),

    /// The member address is not known to the host
    #[error("unknown member `{name}`")]
    UnknownMember { name: String },

    /// A value of the wrong shape was handed to a host primitive
    #[error("{operation}: {message}")]
    InvalidOperand {
        operation: &'static str,
        message: String,
    },

    /// Only throwables can be thrown
    #[error("{type_name} is not throwable")]
    NotThrowable { type_name: String },

    /// The type cannot be instantiated (abstract, interface, array, primitive)
    #[error("cannot instantiate {type_name}")]
    NotInstantiable { type_name: String },

    /// The invoked code raised a throwable
    #[error("exception thrown by invoked code: {0}")]
    Thrown(ObjectRef),

    /// Generic host failure
    #[error("host error: {message}")]
    Other { message: String },
}

impl HostError {
    pub fn invalid_operand(operation: &'static str, message: impl Into<String>) -> Self {
        HostError::InvalidOperand {
            operation,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        HostError::Other {
            message: message.into(),
        }
    }
}

// ============================================================================
// Marshal Errors
// ============================================================================

/// Declared arity of a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Fixed-arity member with this many parameters
    Exactly(usize),
    /// Variadic member with this many leading positional parameters
    AtLeast(usize),
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Where in a call a marshaling failure happened.
///
/// Argument positions are 1-based, as printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// A positional argument
    Argument(usize),
    /// One element of a packed variadic tail
    VariadicElement { position: usize, element: usize },
    /// The value of a field write
    FieldValue,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Argument(p) => write!(f, "argument {p}"),
            Position::VariadicElement { position, element } => {
                write!(f, "argument {position} (variadic element {element})")
            }
            Position::FieldValue => write!(f, "field value"),
        }
    }
}

/// Argument marshaling failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalError {
    /// A primitive slot received null
    #[error("{position}: tried to unbox a null argument; expected {expected}")]
    NullArgument {
        position: Position,
        expected: String,
    },

    /// The supplied value is not exactly the boxed type, or not assignable
    #[error("{position}: argument of wrong type; expected {expected}, got {found}")]
    TypeMismatch {
        position: Position,
        expected: String,
        found: String,
    },

    /// Supplied argument count incompatible with the declared arity
    #[error("wrong number of arguments: expected {expected}, got {supplied}")]
    ArityMismatch { expected: Arity, supplied: usize },

    /// A host query failed while marshaling
    #[error(transparent)]
    Host(#[from] HostError),
}

impl MarshalError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MarshalError::NullArgument { .. } => FailureKind::NullArgument,
            MarshalError::TypeMismatch { .. } => FailureKind::TypeMismatch,
            MarshalError::ArityMismatch { .. } => FailureKind::ArityMismatch,
            MarshalError::Host(_) => FailureKind::HostFailure,
        }
    }

    /// Position of a null or type failure.
    pub fn position(&self) -> Option<Position> {
        match self {
            MarshalError::NullArgument { position, .. }
            | MarshalError::TypeMismatch { position, .. } => Some(*position),
            _ => None,
        }
    }
}

// ============================================================================
// Access (gate) Errors
// ============================================================================

/// Static or instance access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Static,
    Instance,
}

impl AccessMode {
    pub fn of(is_static: bool) -> Self {
        if is_static {
            AccessMode::Static
        } else {
            AccessMode::Instance
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Static => f.write_str("static"),
            AccessMode::Instance => f.write_str("non-static"),
        }
    }
}

/// Gate check failures, raised before any field or method access happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Static-vs-instance modifier does not match the requested access
    #[error("expected {expected} {kind}; `{member}` is not")]
    StaticMismatch {
        member: String,
        kind: MemberKind,
        expected: AccessMode,
    },

    /// The receiver is not an instance of the declaring type
    #[error(
        "object class {receiver_type} does not match declaring class {declaring_type} of {kind} `{member}`"
    )]
    ReceiverMismatch {
        member: String,
        kind: MemberKind,
        receiver_type: String,
        declaring_type: String,
    },

    /// The descriptor is not the kind of member the operation needs
    #[error("expected a {expected}, but `{member}` is a {found}")]
    WrongMemberKind {
        member: String,
        expected: MemberKind,
        found: MemberKind,
    },

    /// A typed field accessor does not match the field's declared type
    #[error("field `{field}` has type {declared}; cannot access it as {requested}")]
    FieldKindMismatch {
        field: String,
        declared: String,
        requested: String,
    },

    /// A typed invoke does not match the method's declared return type
    #[error("method `{method}` returns {declared}; cannot invoke it as {requested}")]
    ReturnKindMismatch {
        method: String,
        declared: String,
        requested: String,
    },
}

impl AccessError {
    /// Gate failures are reported as type mismatches.
    pub fn kind(&self) -> FailureKind {
        FailureKind::TypeMismatch
    }
}

// ============================================================================
// Registry Errors
// ============================================================================

/// A well-known type or operation could not be resolved at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("could not resolve type `{name}`")]
    MissingType { name: String },

    #[error("could not resolve primitive type {kind} via `{owner}.{field}`")]
    MissingPrimitive {
        kind: PrimitiveKind,
        owner: String,
        field: String,
    },

    #[error("could not resolve accessor `{owner}.{name}{signature}`")]
    MissingAccessor {
        owner: String,
        name: String,
        signature: String,
    },
}

/// Registry lifecycle failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("type registry is not initialized")]
    NotInitialized,

    #[error("type registry is already initialized")]
    AlreadyInitialized,

    /// The registry has no boxed wrapper for this kind (only `Void`)
    #[error("primitive kind {0} has no boxed wrapper")]
    NoWrapper(PrimitiveKind),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl RegistryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RegistryError::Host(_) => FailureKind::HostFailure,
            RegistryError::NoWrapper(_) => FailureKind::TypeMismatch,
            _ => FailureKind::ResolutionFailure,
        }
    }
}

// ============================================================================
// Top-level
// ============================================================================

/// Any failure of a bridge operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("class not found: {name}")]
    NoSuchClass { name: String },

    #[error("no such method: {name}")]
    NoSuchMethod { name: String },

    #[error("no such constructor in {type_name}")]
    NoSuchConstructor { type_name: String },

    #[error("no such field: {name}")]
    NoSuchField { name: String },
}

impl BridgeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BridgeError::Marshal(e) => e.kind(),
            BridgeError::Access(e) => e.kind(),
            BridgeError::Registry(e) => e.kind(),
            BridgeError::Host(_) => FailureKind::HostFailure,
            BridgeError::NoSuchClass { .. }
            | BridgeError::NoSuchMethod { .. }
            | BridgeError::NoSuchConstructor { .. }
            | BridgeError::NoSuchField { .. } => FailureKind::Lookup,
        }
    }
}

impl From<ResolutionError> for BridgeError {
    fn from(err: ResolutionError) -> Self {
        BridgeError::Registry(RegistryError::Resolution(err))
    }
}

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
