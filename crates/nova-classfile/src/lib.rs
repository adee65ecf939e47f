#![forbid(unsafe_code)]

//! Unresolved generic-signature trees and the member metadata they are attached to.
//!
//! Nothing in this crate loads classes: names stay names. Turning a [`SigNode`] into a
//! resolved type is the job of `nova-reflect`.

mod descriptor;
mod error;
mod signature;
mod stub;

pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor, MethodDescriptor};
pub use crate::error::{Error, Result};
pub use crate::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    MethodSignature, SigNode, TypeParameter,
};
pub use crate::stub::{
    ClassStub, FieldStub, MethodStub, ACC_ABSTRACT, ACC_FINAL, ACC_INTERFACE, ACC_PRIVATE,
    ACC_PUBLIC, ACC_STATIC, ACC_VARARGS,
};
