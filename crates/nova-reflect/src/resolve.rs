use std::sync::{Arc, Weak};

use nova_classfile::{SigNode, TypeParameter};
use nova_config::{BoundFailurePolicy, ReflectConfig, REFLECT_TARGET};

use crate::cache::{CacheKey, CanonicalCache};
use crate::class::{ClassLoader, ErasedClass, OBJECT};
use crate::decl::GenericDeclaration;
use crate::error::{ReflectError, Result};
use crate::ty::{GenericArrayType, ParameterizedType, ResolvedType, Slot, TypeVariable, WildcardType};

/// Turns unresolved signature nodes into [`ResolvedType`]s.
///
/// Shapes are checked and classes are loaded eagerly; the bounds of wildcards and type variables
/// are left for their accessors. No lock is held while the class loader runs.
#[derive(Clone)]
pub struct Resolver {
    loader: Arc<dyn ClassLoader>,
    cache: Option<Arc<CanonicalCache>>,
    failure_policy: BoundFailurePolicy,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("loader", &self.loader.loader_id())
            .field("cached", &self.cache.is_some())
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

impl Resolver {
    /// A resolver configured from `config`, sharing the process-wide cache when caching is enabled.
    pub fn new(loader: Arc<dyn ClassLoader>, config: &ReflectConfig) -> Self {
        let cache = config.cache.enabled.then(CanonicalCache::global);
        Self {
            loader,
            cache,
            failure_policy: config.bounds.failure_policy,
        }
    }

    pub fn with_cache(
        loader: Arc<dyn ClassLoader>,
        cache: Arc<CanonicalCache>,
        failure_policy: BoundFailurePolicy,
    ) -> Self {
        Self {
            loader,
            cache: Some(cache),
            failure_policy,
        }
    }

    pub fn uncached(loader: Arc<dyn ClassLoader>, failure_policy: BoundFailurePolicy) -> Self {
        Self {
            loader,
            cache: None,
            failure_policy,
        }
    }

    pub fn loader(&self) -> &Arc<dyn ClassLoader> {
        &self.loader
    }

    pub fn cache(&self) -> Option<&Arc<CanonicalCache>> {
        self.cache.as_ref()
    }

    pub fn failure_policy(&self) -> BoundFailurePolicy {
        self.failure_policy
    }

    /// Resolve `node` in the type-parameter scope of `declaration`.
    ///
    /// Malformed nodes and argument-count mismatches fail the whole call. A missing class fails
    /// the call only when it is the node itself (or the raw type of a parameterized node); inside
    /// arguments and owners it is kept in the slot and raised by that slot's accessor.
    pub fn resolve(&self, node: &SigNode, declaration: &GenericDeclaration) -> Result<ResolvedType> {
        match node {
            SigNode::ClassRef(name) => self.load_class(name).map(ResolvedType::Class),
            SigNode::ParameterizedRef { .. } => self
                .resolve_parameterized(node, declaration)
                .map(ResolvedType::Parameterized),
            SigNode::WildcardRef {
                bounds,
                is_upper_bound,
            } => Ok(ResolvedType::Wildcard(WildcardType::new(
                bounds.clone(),
                *is_upper_bound,
                declaration.clone(),
                self.downgrade(),
            ))),
            SigNode::VariableRef(name) => self
                .resolve_variable(name, declaration)
                .map(ResolvedType::TypeVariable),
            SigNode::ArrayRef(component) => {
                Ok(match self.resolve(component, declaration)? {
                    ResolvedType::Class(class) => ResolvedType::Class(ErasedClass::array_of(&class)),
                    generic => ResolvedType::GenericArray(GenericArrayType::new(generic)),
                })
            }
        }
    }

    /// Resolve `node` requiring every class it mentions to be present.
    pub fn resolve_complete(
        &self,
        node: &SigNode,
        declaration: &GenericDeclaration,
    ) -> Result<ResolvedType> {
        let ty = self.resolve(node, declaration)?;
        match ty.missing_type() {
            Some(err) => Err(err.clone()),
            None => Ok(ty),
        }
    }

    pub fn load_class(&self, name: &str) -> Result<ErasedClass> {
        self.loader.load(name).ok_or_else(|| {
            tracing::debug!(target: REFLECT_TARGET, class = name, "type not present");
            ReflectError::type_not_present(name)
        })
    }

    fn resolve_parameterized(
        &self,
        node: &SigNode,
        declaration: &GenericDeclaration,
    ) -> Result<ParameterizedType> {
        let SigNode::ParameterizedRef { raw, args, owner } = node else {
            return Err(format_error(node, declaration, "expected a parameterized reference"));
        };

        let key = self
            .cache
            .as_ref()
            .map(|_| {
                CacheKey::new(
                    Arc::new(node.clone()),
                    declaration.key(),
                    self.loader.loader_id(),
                    self.failure_policy,
                )
            });
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.lookup(key) {
                return Ok(hit);
            }
        }

        let raw = match self.resolve(raw, declaration)? {
            ResolvedType::Class(class) => class,
            _ => return Err(format_error(node, declaration, "raw type is not a class")),
        };
        let expected = raw.declared_type_parameter_count();
        if args.len() != expected {
            return Err(ReflectError::ArgumentCountMismatch {
                raw: raw.name().to_string(),
                expected,
                found: args.len(),
            });
        }

        let args = args
            .iter()
            .map(|arg| self.resolve_slot(arg, declaration))
            .collect::<Result<Vec<_>>>()?;
        let owner = owner
            .as_deref()
            .map(|owner| self.resolve_slot(owner, declaration))
            .transpose()?;

        let candidate = ParameterizedType::new(raw, args, owner);
        match (&self.cache, key) {
            (Some(cache), Some(key)) if candidate.is_complete() => {
                Ok(cache.insert_if_absent(key, candidate))
            }
            _ => Ok(candidate),
        }
    }

    /// Resolve one argument or owner position, capturing a missing class in the slot.
    fn resolve_slot(&self, node: &SigNode, declaration: &GenericDeclaration) -> Result<Slot> {
        match self.resolve(node, declaration) {
            Ok(ty) => Ok(Ok(ty)),
            Err(err) if err.is_type_not_present() => Ok(Err(err)),
            Err(err) => Err(err),
        }
    }

    fn resolve_variable(
        &self,
        name: &str,
        declaration: &GenericDeclaration,
    ) -> Result<TypeVariable> {
        match declaration.find_type_parameter(name, &*self.loader)? {
            Some((owner, parameter)) => Ok(TypeVariable::new(parameter, owner, self.downgrade())),
            None => Err(format_error(
                &SigNode::variable(name),
                declaration,
                "type variable is not declared in any enclosing scope",
            )),
        }
    }

    /// Bounds of `parameter` as declared by `owner`: the class bound followed by the interface
    /// bounds, or just `java.lang.Object` when nothing is declared.
    pub(crate) fn type_variable_bounds(
        &self,
        parameter: &TypeParameter,
        owner: &GenericDeclaration,
    ) -> Result<Vec<ResolvedType>> {
        tracing::debug!(
            target: REFLECT_TARGET,
            variable = %parameter.name,
            declaration = %owner,
            "resolving type variable bounds"
        );
        let mut bounds = Vec::with_capacity(1 + parameter.interface_bounds.len());
        for bound in parameter.class_bound.iter().chain(&parameter.interface_bounds) {
            bounds.push(self.resolve_complete(bound, owner)?);
        }
        if bounds.is_empty() {
            bounds.push(ResolvedType::Class(self.load_class(OBJECT)?));
        }
        Ok(bounds)
    }

    /// The populated side of a wildcard's bounds. An empty upper side means `java.lang.Object`.
    pub(crate) fn wildcard_bounds(
        &self,
        nodes: &[SigNode],
        is_upper_bound: bool,
        declaration: &GenericDeclaration,
    ) -> Result<Vec<ResolvedType>> {
        if nodes.is_empty() && is_upper_bound {
            return Ok(vec![ResolvedType::Class(self.load_class(OBJECT)?)]);
        }
        nodes
            .iter()
            .map(|node| self.resolve_complete(node, declaration))
            .collect()
    }

    pub(crate) fn downgrade(&self) -> WeakResolver {
        WeakResolver {
            loader: self.loader.clone(),
            cache: self.cache.as_ref().map(Arc::downgrade),
            failure_policy: self.failure_policy,
        }
    }
}

/// What a lazily-resolved type keeps of the resolver that built it.
///
/// The cache holds parameterized types that hold these, so the cache itself is only referenced
/// weakly. If it is gone, bound resolution continues uncached.
#[derive(Clone)]
pub(crate) struct WeakResolver {
    loader: Arc<dyn ClassLoader>,
    cache: Option<Weak<CanonicalCache>>,
    failure_policy: BoundFailurePolicy,
}

impl WeakResolver {
    pub(crate) fn upgrade(&self) -> Resolver {
        Resolver {
            loader: self.loader.clone(),
            cache: self.cache.as_ref().and_then(Weak::upgrade),
            failure_policy: self.failure_policy,
        }
    }

    pub(crate) fn failure_policy(&self) -> BoundFailurePolicy {
        self.failure_policy
    }
}

fn format_error(node: &SigNode, declaration: &GenericDeclaration, reason: &str) -> ReflectError {
    ReflectError::SignatureFormat {
        node: node.to_string(),
        declaration: declaration.to_string(),
        reason: reason.to_string(),
    }
}
