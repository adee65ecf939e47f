//! Source-like rendering of resolved types.
//!
//! Class names are binary names. Wildcards render from their written bounds so formatting
//! never triggers class loading.

use std::fmt;

use crate::error::ReflectError;
use crate::ty::{GenericArrayType, ParameterizedType, ResolvedType, Slot, TypeVariable, WildcardType};

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedType::Class(class) => write!(f, "{class}"),
            ResolvedType::Parameterized(ty) => write!(f, "{ty}"),
            ResolvedType::Wildcard(ty) => write!(f, "{ty}"),
            ResolvedType::TypeVariable(ty) => write!(f, "{ty}"),
            ResolvedType::GenericArray(ty) => write!(f, "{ty}"),
        }
    }
}

fn write_slot(f: &mut fmt::Formatter<'_>, slot: &Slot) -> fmt::Result {
    match slot {
        Ok(ty) => write!(f, "{ty}"),
        Err(ReflectError::TypeNotPresent { name }) => f.write_str(name),
        Err(err) => write!(f, "<{err}>"),
    }
}

impl fmt::Display for ParameterizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (args, owner) = self.slots();
        let raw = self.raw_type().name();
        match owner {
            Some(owner) => {
                write_slot(f, owner)?;
                f.write_str(".")?;
                f.write_str(raw.rsplit('$').next().unwrap_or(raw))?;
            }
            None => f.write_str(raw)?,
        }

        if args.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (idx, arg) in args.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write_slot(f, arg)?;
        }
        f.write_str(">")
    }
}

impl fmt::Display for WildcardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("?")?;
        let bounds = self.bound_nodes();
        if bounds.is_empty() {
            return Ok(());
        }
        f.write_str(if self.is_upper_bound() {
            " extends "
        } else {
            " super "
        })?;
        for (idx, bound) in bounds.iter().enumerate() {
            if idx > 0 {
                f.write_str(" & ")?;
            }
            write!(f, "{bound}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for GenericArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[]", self.component_type())
    }
}

impl fmt::Debug for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedType::Class(class) => write!(f, "Class({class})"),
            ResolvedType::Parameterized(ty) => write!(f, "{ty:?}"),
            ResolvedType::Wildcard(ty) => write!(f, "{ty:?}"),
            ResolvedType::TypeVariable(ty) => write!(f, "{ty:?}"),
            ResolvedType::GenericArray(ty) => write!(f, "{ty:?}"),
        }
    }
}

impl fmt::Debug for ParameterizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameterized({self})")
    }
}

impl fmt::Debug for WildcardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wildcard({self})")
    }
}

impl fmt::Debug for TypeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeVariable({} in {})", self.name(), self.generic_declaration())
    }
}

impl fmt::Debug for GenericArrayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GenericArray({self})")
    }
}
