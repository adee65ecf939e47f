use thiserror::Error;

pub type Result<T, E = ReflectError> = std::result::Result<T, E>;

/// Errors produced while resolving generic signatures.
///
/// `SignatureFormat` and `ArgumentCountMismatch` are raised while a value is being constructed and
/// abort that construction. `TypeNotPresent` is raised by the accessor that needs the missing
/// class; the rest of the owning value stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ReflectError {
    #[error("malformed generic signature `{node}` in {declaration}: {reason}")]
    SignatureFormat {
        node: String,
        declaration: String,
        reason: String,
    },

    #[error("wrong number of type arguments for {raw}: expected {expected}, found {found}")]
    ArgumentCountMismatch {
        raw: String,
        expected: usize,
        found: usize,
    },

    #[error("type {name} not present")]
    TypeNotPresent { name: String },

    #[error("{class} has no member {member}")]
    NoSuchMember { class: String, member: String },

    #[error("class {name} is already defined by this loader")]
    DuplicateClass { name: String },

    #[error("invalid member metadata: {0}")]
    Metadata(String),
}

impl ReflectError {
    pub fn type_not_present(name: impl Into<String>) -> Self {
        ReflectError::TypeNotPresent { name: name.into() }
    }

    pub fn is_type_not_present(&self) -> bool {
        matches!(self, ReflectError::TypeNotPresent { .. })
    }
}

impl From<nova_classfile::Error> for ReflectError {
    fn from(err: nova_classfile::Error) -> Self {
        ReflectError::Metadata(err.to_string())
    }
}
