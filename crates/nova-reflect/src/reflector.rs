use std::sync::Arc;

use nova_classfile::{ClassStub, SigNode};
use nova_config::{ReflectConfig, REFLECT_TARGET};

use crate::class::{ClassKind, ClassRegistry, ErasedClass, MetadataProvider};
use crate::decl::{GenericDeclaration, MethodDecl};
use crate::error::{ReflectError, Result};
use crate::resolve::Resolver;
use crate::ty::{ResolvedType, TypeVariable};

/// Member-level entry points: the generic view of a class's supertypes, fields and methods.
///
/// Members without a generic signature report their erased descriptor types.
#[derive(Clone)]
pub struct Reflector {
    metadata: Arc<dyn MetadataProvider>,
    resolver: Resolver,
}

impl std::fmt::Debug for Reflector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reflector")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl Reflector {
    pub fn new(registry: Arc<ClassRegistry>, config: &ReflectConfig) -> Self {
        let resolver = Resolver::new(registry.clone(), config);
        Self::from_parts(registry, resolver)
    }

    pub fn from_parts(metadata: Arc<dyn MetadataProvider>, resolver: Resolver) -> Self {
        Self { metadata, resolver }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn class(&self, binary_name: &str) -> Result<ErasedClass> {
        self.resolver.load_class(binary_name)
    }

    pub fn method(
        &self,
        class: &ErasedClass,
        name: &str,
        descriptor: &str,
    ) -> Result<GenericDeclaration> {
        let stub = self.stub(class)?;
        let method = stub
            .method(name, descriptor)
            .ok_or_else(|| ReflectError::NoSuchMember {
                class: class.name().to_string(),
                member: format!("{name}{descriptor}"),
            })?;
        Ok(GenericDeclaration::from_method(MethodDecl::new(
            class.clone(),
            method,
        )))
    }

    pub fn constructor(&self, class: &ErasedClass, descriptor: &str) -> Result<GenericDeclaration> {
        self.method(class, "<init>", descriptor)
    }

    /// The type variables declared by `declaration`, in declaration order.
    pub fn type_parameters(&self, declaration: &GenericDeclaration) -> Vec<TypeVariable> {
        declaration
            .type_parameters()
            .iter()
            .map(|param| {
                TypeVariable::new(param.clone(), declaration.clone(), self.resolver.downgrade())
            })
            .collect()
    }

    /// `None` for interfaces, primitives and `java.lang.Object`.
    pub fn generic_superclass(&self, class: &ErasedClass) -> Result<Option<ResolvedType>> {
        if class.kind() != ClassKind::Class {
            return Ok(None);
        }
        let stub = self.stub(class)?;
        let Some(super_class) = &stub.super_class else {
            return Ok(None);
        };
        let declaration = GenericDeclaration::Class(class.clone());
        match &stub.signature {
            Some(sig) => self.resolve(&sig.super_class, &declaration).map(Some),
            None => self.class(super_class).map(|class| Some(class.into())),
        }
    }

    pub fn generic_interfaces(&self, class: &ErasedClass) -> Result<Vec<ResolvedType>> {
        let stub = self.stub(class)?;
        let declaration = GenericDeclaration::Class(class.clone());
        match &stub.signature {
            Some(sig) => sig
                .interfaces
                .iter()
                .map(|iface| self.resolve(iface, &declaration))
                .collect(),
            None => stub
                .interfaces
                .iter()
                .map(|name| self.class(name).map(ResolvedType::Class))
                .collect(),
        }
    }

    pub fn generic_field_type(&self, class: &ErasedClass, field: &str) -> Result<ResolvedType> {
        let stub = self.stub(class)?;
        let field = stub.field(field).ok_or_else(|| ReflectError::NoSuchMember {
            class: class.name().to_string(),
            member: field.to_string(),
        })?;
        let node = field.signature.as_ref().unwrap_or(&field.parsed_descriptor);
        self.resolve(node, &GenericDeclaration::Class(class.clone()))
    }

    pub fn generic_return_type(&self, method: &GenericDeclaration) -> Result<ResolvedType> {
        let decl = method_decl(method)?;
        let node = match decl.signature() {
            Some(sig) => &sig.return_type,
            None => &decl.parsed_descriptor().return_type,
        };
        self.resolve(node, method)
    }

    pub fn generic_parameter_types(&self, method: &GenericDeclaration) -> Result<Vec<ResolvedType>> {
        let decl = method_decl(method)?;
        let nodes = match decl.signature() {
            Some(sig) => &sig.parameters,
            None => &decl.parsed_descriptor().params,
        };
        nodes.iter().map(|node| self.resolve(node, method)).collect()
    }

    /// The generic `throws` clause, or the erased one when the signature declares none.
    pub fn generic_exception_types(&self, method: &GenericDeclaration) -> Result<Vec<ResolvedType>> {
        let decl = method_decl(method)?;
        match decl.signature() {
            Some(sig) if !sig.exceptions.is_empty() => sig
                .exceptions
                .iter()
                .map(|node| self.resolve(node, method))
                .collect(),
            _ => decl
                .exceptions()
                .iter()
                .map(|name| self.class(name).map(ResolvedType::Class))
                .collect(),
        }
    }

    fn stub(&self, class: &ErasedClass) -> Result<Arc<ClassStub>> {
        self.metadata
            .class_stub(class.name())
            .ok_or_else(|| ReflectError::Metadata(format!("no metadata recorded for {class}")))
    }

    fn resolve(&self, node: &SigNode, declaration: &GenericDeclaration) -> Result<ResolvedType> {
        let resolved = self.resolver.resolve(node, declaration);
        if let Err(err) = &resolved {
            tracing::debug!(
                target: REFLECT_TARGET,
                declaration = %declaration,
                node = %node,
                error = %err,
                "failed to resolve member signature"
            );
        }
        resolved
    }
}

fn method_decl(declaration: &GenericDeclaration) -> Result<&MethodDecl> {
    match declaration {
        GenericDeclaration::Method(method) | GenericDeclaration::Constructor(method) => Ok(&**method),
        GenericDeclaration::Class(class) => Err(ReflectError::NoSuchMember {
            class: class.name().to_string(),
            member: "<method>".to_string(),
        }),
    }
}
