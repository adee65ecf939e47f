use std::sync::Arc;

use nova_classfile::{SigNode, TypeParameter};

use crate::class::{hash_of, ErasedClass, OBJECT};
use crate::decl::{DeclarationKey, GenericDeclaration};
use crate::error::{ReflectError, Result};
use crate::lazy::{BoundState, LazyBounds};
use crate::resolve::WeakResolver;

/// An argument or owner position of a [`ParameterizedType`].
///
/// A class that could not be loaded is remembered here and raised by the accessor for this
/// position only.
pub(crate) type Slot = Result<ResolvedType>;

/// A fully or partially resolved generic type.
///
/// Every variant is a cheap-clone handle. Equality and hashing are structural.
#[derive(Clone)]
pub enum ResolvedType {
    Class(ErasedClass),
    Parameterized(ParameterizedType),
    Wildcard(WildcardType),
    TypeVariable(TypeVariable),
    GenericArray(GenericArrayType),
}

impl ResolvedType {
    pub fn as_class(&self) -> Option<&ErasedClass> {
        match self {
            ResolvedType::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_parameterized(&self) -> Option<&ParameterizedType> {
        match self {
            ResolvedType::Parameterized(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_wildcard(&self) -> Option<&WildcardType> {
        match self {
            ResolvedType::Wildcard(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_type_variable(&self) -> Option<&TypeVariable> {
        match self {
            ResolvedType::TypeVariable(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_generic_array(&self) -> Option<&GenericArrayType> {
        match self {
            ResolvedType::GenericArray(ty) => Some(ty),
            _ => None,
        }
    }

    /// The first class that failed to load anywhere inside this type, if any.
    ///
    /// Wildcard and type-variable bounds are not inspected; they are resolved on demand.
    pub fn missing_type(&self) -> Option<&ReflectError> {
        match self {
            ResolvedType::Parameterized(ty) => ty.0.missing.as_ref(),
            ResolvedType::GenericArray(ty) => ty.terminal().missing_type(),
            ResolvedType::Class(_) | ResolvedType::Wildcard(_) | ResolvedType::TypeVariable(_) => {
                None
            }
        }
    }

    pub(crate) fn structural_hash(&self) -> u64 {
        match self {
            ResolvedType::Class(class) => class.structural_hash(),
            ResolvedType::Parameterized(ty) => ty.0.hash,
            ResolvedType::Wildcard(ty) => ty.structural_hash(),
            ResolvedType::TypeVariable(ty) => ty.structural_hash(),
            ResolvedType::GenericArray(ty) => ty.structural_hash(),
        }
    }
}

impl PartialEq for ResolvedType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResolvedType::Class(a), ResolvedType::Class(b)) => a == b,
            (ResolvedType::Parameterized(a), ResolvedType::Parameterized(b)) => a == b,
            (ResolvedType::Wildcard(a), ResolvedType::Wildcard(b)) => a == b,
            (ResolvedType::TypeVariable(a), ResolvedType::TypeVariable(b)) => a == b,
            (ResolvedType::GenericArray(a), ResolvedType::GenericArray(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ResolvedType {}

impl std::hash::Hash for ResolvedType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

impl From<ErasedClass> for ResolvedType {
    fn from(class: ErasedClass) -> Self {
        ResolvedType::Class(class)
    }
}

fn slot_hash(slot: &Slot) -> u64 {
    match slot {
        Ok(ty) => ty.structural_hash(),
        Err(err) => hash_of(err),
    }
}

// ---- Parameterized types ----

struct ParameterizedInner {
    raw: ErasedClass,
    args: Vec<Slot>,
    owner: Option<Slot>,
    missing: Option<ReflectError>,
    hash: u64,
}

/// `raw<args...>`, optionally qualified by an owner type (`Outer<A>.Inner<B>`).
///
/// Raw type, arguments and owner are all fixed at construction.
#[derive(Clone)]
pub struct ParameterizedType(Arc<ParameterizedInner>);

impl ParameterizedType {
    pub(crate) fn new(raw: ErasedClass, args: Vec<Slot>, owner: Option<Slot>) -> Self {
        let mut hash = raw.structural_hash();
        for arg in &args {
            hash ^= slot_hash(arg);
        }
        if let Some(owner) = &owner {
            hash ^= slot_hash(owner);
        }

        let missing = args
            .iter()
            .chain(owner.as_ref())
            .find_map(|slot| match slot {
                Err(err) => Some(err.clone()),
                Ok(ty) => ty.missing_type().cloned(),
            });

        ParameterizedType(Arc::new(ParameterizedInner {
            raw,
            args,
            owner,
            missing,
            hash,
        }))
    }

    pub fn raw_type(&self) -> &ErasedClass {
        &self.0.raw
    }

    pub fn argument_count(&self) -> usize {
        self.0.args.len()
    }

    /// All type arguments, failing with the first argument whose class is not present.
    pub fn actual_type_arguments(&self) -> Result<Vec<ResolvedType>> {
        self.0.args.iter().cloned().collect()
    }

    /// The argument at `index`, or `None` when out of range.
    pub fn actual_type_argument(&self, index: usize) -> Option<Result<ResolvedType>> {
        self.0.args.get(index).cloned()
    }

    pub fn owner_type(&self) -> Result<Option<ResolvedType>> {
        self.0.owner.clone().transpose()
    }

    /// `true` when every class reachable through the arguments and owner was loaded.
    pub fn is_complete(&self) -> bool {
        self.0.missing.is_none()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn slots(&self) -> (&[Slot], Option<&Slot>) {
        (&self.0.args, self.0.owner.as_ref())
    }
}

impl PartialEq for ParameterizedType {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (&*self.0, &*other.0);
        a.hash == b.hash && a.raw == b.raw && a.args == b.args && a.owner == b.owner
    }
}

impl Eq for ParameterizedType {}

// ---- Wildcards ----

struct WildcardInner {
    bounds: Vec<SigNode>,
    is_upper_bound: bool,
    declaration: GenericDeclaration,
    resolver: WeakResolver,
    resolved: LazyBounds,
}

/// `?`, `? extends A & B` or `? super A`.
///
/// Bounds are resolved on first access. Only one side is ever populated: an upper-bounded
/// wildcard has no lower bounds, and a lower-bounded one has no upper bounds.
#[derive(Clone)]
pub struct WildcardType(Arc<WildcardInner>);

impl WildcardType {
    pub(crate) fn new(
        bounds: Vec<SigNode>,
        is_upper_bound: bool,
        declaration: GenericDeclaration,
        resolver: WeakResolver,
    ) -> Self {
        let resolved = LazyBounds::new(resolver.failure_policy());
        WildcardType(Arc::new(WildcardInner {
            bounds,
            is_upper_bound,
            declaration,
            resolver,
            resolved,
        }))
    }

    pub fn is_upper_bound(&self) -> bool {
        self.0.is_upper_bound
    }

    /// Unresolved bound nodes as written in the signature.
    pub fn bound_nodes(&self) -> &[SigNode] {
        &self.0.bounds
    }

    /// Upper bounds; `[java.lang.Object]` for an unbounded wildcard.
    pub fn upper_bounds(&self) -> Result<Arc<[ResolvedType]>> {
        if self.0.is_upper_bound {
            self.resolve_bounds()
        } else {
            Ok(Arc::from(Vec::new()))
        }
    }

    pub fn lower_bounds(&self) -> Result<Arc<[ResolvedType]>> {
        if self.0.is_upper_bound {
            Ok(Arc::from(Vec::new()))
        } else {
            self.resolve_bounds()
        }
    }

    pub fn bound_state(&self) -> BoundState {
        self.0.resolved.state()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn resolve_bounds(&self) -> Result<Arc<[ResolvedType]>> {
        let inner = &*self.0;
        inner.resolved.get_or_resolve(|| {
            inner.resolver.upgrade().wildcard_bounds(
                &inner.bounds,
                inner.is_upper_bound,
                &inner.declaration,
            )
        })
    }

    /// `(lower, upper)` bound nodes with the implicit `java.lang.Object` upper bound spelled out.
    fn normalized_nodes(&self) -> (&[SigNode], Vec<SigNode>) {
        let inner = &*self.0;
        if !inner.is_upper_bound {
            return (&inner.bounds, Vec::new());
        }
        let upper = if inner.bounds.is_empty() {
            vec![SigNode::class(OBJECT)]
        } else {
            inner.bounds.clone()
        };
        (&[], upper)
    }

    fn structural_hash(&self) -> u64 {
        hash_of(&self.normalized_nodes())
    }
}

impl PartialEq for WildcardType {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let resolved = || -> Result<bool> {
            let lower = self.lower_bounds()?;
            if lower[..] != other.lower_bounds()?[..] {
                return Ok(false);
            }
            if !lower.is_empty() {
                return Ok(true);
            }
            Ok(self.upper_bounds()?[..] == other.upper_bounds()?[..])
        };
        match resolved() {
            Ok(equal) => equal,
            // Without loadable bounds, fall back to what was written and where.
            Err(_) => {
                self.normalized_nodes() == other.normalized_nodes()
                    && self.0.declaration.key() == other.0.declaration.key()
            }
        }
    }
}

impl Eq for WildcardType {}

// ---- Type variables ----

struct TypeVariableInner {
    parameter: TypeParameter,
    declaration: GenericDeclaration,
    key: DeclarationKey,
    resolver: WeakResolver,
    bounds: LazyBounds,
}

/// A type parameter reference, identified by its name and declaring scope.
///
/// Bounds are resolved on first access and never consulted by equality or hashing, so a
/// self-referential bound such as `T extends Comparable<T>` stays finite.
#[derive(Clone)]
pub struct TypeVariable(Arc<TypeVariableInner>);

impl TypeVariable {
    pub(crate) fn new(
        parameter: TypeParameter,
        declaration: GenericDeclaration,
        resolver: WeakResolver,
    ) -> Self {
        let key = declaration.key();
        let bounds = LazyBounds::new(resolver.failure_policy());
        TypeVariable(Arc::new(TypeVariableInner {
            parameter,
            declaration,
            key,
            resolver,
            bounds,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.parameter.name
    }

    pub fn generic_declaration(&self) -> &GenericDeclaration {
        &self.0.declaration
    }

    pub fn declaration_key(&self) -> &DeclarationKey {
        &self.0.key
    }

    /// Class bound followed by the interface bounds in declaration order; `[java.lang.Object]`
    /// when the parameter declares none.
    pub fn bounds(&self) -> Result<Arc<[ResolvedType]>> {
        let inner = &*self.0;
        inner.bounds.get_or_resolve(|| {
            inner
                .resolver
                .upgrade()
                .type_variable_bounds(&inner.parameter, &inner.declaration)
        })
    }

    pub fn bound_state(&self) -> BoundState {
        self.0.bounds.state()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn structural_hash(&self) -> u64 {
        hash_of(self.name()) ^ hash_of(&self.0.key)
    }
}

impl PartialEq for TypeVariable {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.name() == other.name() && self.0.key == other.0.key)
    }
}

impl Eq for TypeVariable {}

impl std::hash::Hash for TypeVariable {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

// ---- Generic arrays ----

/// An array whose component is a parameterized type, a type variable, or another generic array.
#[derive(Clone)]
pub struct GenericArrayType(Arc<ResolvedType>);

impl GenericArrayType {
    pub(crate) fn new(component: ResolvedType) -> Self {
        GenericArrayType(Arc::new(component))
    }

    pub fn component_type(&self) -> &ResolvedType {
        &self.0
    }

    /// Number of nested generic-array layers, counting this one.
    pub fn depth(&self) -> usize {
        self.layers().0
    }

    /// The innermost non-array component.
    pub fn terminal(&self) -> &ResolvedType {
        self.layers().1
    }

    fn layers(&self) -> (usize, &ResolvedType) {
        let mut depth = 1;
        let mut component = &*self.0;
        while let ResolvedType::GenericArray(inner) = component {
            depth += 1;
            component = &*inner.0;
        }
        (depth, component)
    }

    fn structural_hash(&self) -> u64 {
        let (depth, terminal) = self.layers();
        hash_of(&depth) ^ terminal.structural_hash()
    }
}

impl PartialEq for GenericArrayType {
    fn eq(&self, other: &Self) -> bool {
        let mut a = &*self.0;
        let mut b = &*other.0;
        loop {
            match (a, b) {
                (ResolvedType::GenericArray(x), ResolvedType::GenericArray(y)) => {
                    if Arc::ptr_eq(&x.0, &y.0) {
                        return true;
                    }
                    a = &*x.0;
                    b = &*y.0;
                }
                (ResolvedType::GenericArray(_), _) | (_, ResolvedType::GenericArray(_)) => {
                    return false
                }
                (a, b) => return a == b,
            }
        }
    }
}

impl Eq for GenericArrayType {}
