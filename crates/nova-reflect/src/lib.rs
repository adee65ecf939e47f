#![forbid(unsafe_code)]

//! Lazy reflection over generic signatures.
//!
//! A [`Resolver`] turns an unresolved [`nova_classfile::SigNode`] tree, read in the scope of a
//! [`GenericDeclaration`], into a [`ResolvedType`]:
//!
//! - classes and the shape of parameterized types are resolved when the value is built;
//! - wildcard and type-variable bounds are resolved on first access and memoized per value;
//! - parameterized types are interned in a [`CanonicalCache`] keyed by signature and declaration.
//!
//! All resolved types compare structurally. A type variable is identified by its name and
//! declaring scope alone, so self-referential bounds (`T extends Comparable<T>`) never recurse.
//!
//! [`Reflector`] layers member lookups (supertypes, fields, methods) on top of a
//! [`ClassRegistry`].

mod cache;
mod class;
mod decl;
mod error;
mod format;
mod lazy;
mod reflector;
mod resolve;
mod ty;

pub use crate::cache::{CacheKey, CacheStats, CanonicalCache};
pub use crate::class::{
    ClassDef, ClassKind, ClassLoader, ClassRegistry, ErasedClass, LoaderId, MetadataProvider,
    OBJECT,
};
pub use crate::decl::{DeclarationKey, GenericDeclaration, MethodDecl};
pub use crate::error::{ReflectError, Result};
pub use crate::lazy::BoundState;
pub use crate::reflector::Reflector;
pub use crate::resolve::Resolver;
pub use crate::ty::{GenericArrayType, ParameterizedType, ResolvedType, TypeVariable, WildcardType};

pub use nova_config::BoundFailurePolicy;
