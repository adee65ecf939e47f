use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use nova_classfile::{MethodDescriptor, MethodSignature, MethodStub, TypeParameter};

use crate::class::{ClassLoader, ErasedClass, LoaderId};
use crate::error::{ReflectError, Result};

/// A method or constructor that can declare type parameters.
#[derive(Debug)]
pub struct MethodDecl {
    declaring_class: ErasedClass,
    name: String,
    descriptor: String,
    parsed_descriptor: MethodDescriptor,
    signature: Option<MethodSignature>,
    exceptions: Vec<String>,
}

impl MethodDecl {
    pub fn new(declaring_class: ErasedClass, stub: &MethodStub) -> Self {
        Self {
            declaring_class,
            name: stub.name.clone(),
            descriptor: stub.descriptor.clone(),
            parsed_descriptor: stub.parsed_descriptor.clone(),
            signature: stub.signature.clone(),
            exceptions: stub.exceptions.clone(),
        }
    }

    pub fn declaring_class(&self) -> &ErasedClass {
        &self.declaring_class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn parsed_descriptor(&self) -> &MethodDescriptor {
        &self.parsed_descriptor
    }

    pub fn signature(&self) -> Option<&MethodSignature> {
        self.signature.as_ref()
    }

    pub fn exceptions(&self) -> &[String] {
        &self.exceptions
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn type_parameters(&self) -> &[TypeParameter] {
        self.signature
            .as_ref()
            .map(|sig| sig.type_parameters.as_slice())
            .unwrap_or_default()
    }
}

/// The class, method, or constructor whose type-parameter scope anchors a signature.
#[derive(Clone)]
pub enum GenericDeclaration {
    Class(ErasedClass),
    Method(Arc<MethodDecl>),
    Constructor(Arc<MethodDecl>),
}

/// Stable identity of a [`GenericDeclaration`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclarationKey {
    Class {
        loader: LoaderId,
        name: String,
    },
    Method {
        loader: LoaderId,
        class: String,
        name: String,
        descriptor: String,
    },
    Constructor {
        loader: LoaderId,
        class: String,
        descriptor: String,
    },
}

impl GenericDeclaration {
    pub fn from_method(decl: MethodDecl) -> Self {
        if decl.is_constructor() {
            GenericDeclaration::Constructor(Arc::new(decl))
        } else {
            GenericDeclaration::Method(Arc::new(decl))
        }
    }

    pub fn key(&self) -> DeclarationKey {
        match self {
            GenericDeclaration::Class(class) => DeclarationKey::Class {
                loader: class.loader(),
                name: class.name().to_string(),
            },
            GenericDeclaration::Method(method) => DeclarationKey::Method {
                loader: method.declaring_class.loader(),
                class: method.declaring_class.name().to_string(),
                name: method.name.clone(),
                descriptor: method.descriptor.clone(),
            },
            GenericDeclaration::Constructor(ctor) => DeclarationKey::Constructor {
                loader: ctor.declaring_class.loader(),
                class: ctor.declaring_class.name().to_string(),
                descriptor: ctor.descriptor.clone(),
            },
        }
    }

    pub fn type_parameters(&self) -> &[TypeParameter] {
        match self {
            GenericDeclaration::Class(class) => class.type_parameters(),
            GenericDeclaration::Method(method) | GenericDeclaration::Constructor(method) => {
                method.type_parameters()
            }
        }
    }

    /// The nearest class: the declaration itself, or the class declaring the method.
    pub fn enclosing_class(&self) -> &ErasedClass {
        match self {
            GenericDeclaration::Class(class) => class,
            GenericDeclaration::Method(method) | GenericDeclaration::Constructor(method) => {
                &method.declaring_class
            }
        }
    }

    /// The next scope whose type parameters are visible from this one.
    ///
    /// Static member classes do not see their enclosing class's type parameters. An enclosing
    /// class the loader cannot find is reported as not present.
    fn outer(&self, loader: &dyn ClassLoader) -> Result<Option<GenericDeclaration>> {
        match self {
            GenericDeclaration::Method(method) | GenericDeclaration::Constructor(method) => Ok(
                Some(GenericDeclaration::Class(method.declaring_class.clone())),
            ),
            GenericDeclaration::Class(class) => {
                let Some(enclosing) = class.enclosing_class().filter(|_| !class.is_static()) else {
                    return Ok(None);
                };
                loader
                    .load(enclosing)
                    .map(|outer| Some(GenericDeclaration::Class(outer)))
                    .ok_or_else(|| ReflectError::type_not_present(enclosing))
            }
        }
    }

    /// Find the declaration in scope that declares `name`, starting here and walking outward.
    ///
    /// Each enclosing declaration is visited at most once.
    pub(crate) fn find_type_parameter(
        &self,
        name: &str,
        loader: &dyn ClassLoader,
    ) -> Result<Option<(GenericDeclaration, TypeParameter)>> {
        let mut seen = HashSet::new();
        let mut current = self.clone();
        loop {
            if !seen.insert(current.key()) {
                return Ok(None);
            }
            if let Some(param) = current.type_parameters().iter().find(|p| p.name == name) {
                let param = param.clone();
                return Ok(Some((current, param)));
            }
            match current.outer(loader)? {
                Some(outer) => current = outer,
                None => return Ok(None),
            }
        }
    }
}

impl PartialEq for GenericDeclaration {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for GenericDeclaration {}

impl Hash for GenericDeclaration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for GenericDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GenericDeclaration({self})")
    }
}

impl fmt::Display for GenericDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericDeclaration::Class(class) => write!(f, "{class}"),
            GenericDeclaration::Method(method) | GenericDeclaration::Constructor(method) => write!(
                f,
                "{}.{}{}",
                method.declaring_class, method.name, method.descriptor
            ),
        }
    }
}

impl From<ErasedClass> for GenericDeclaration {
    fn from(class: ErasedClass) -> Self {
        GenericDeclaration::Class(class)
    }
}
