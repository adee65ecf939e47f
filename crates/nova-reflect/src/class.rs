use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use nova_classfile::{
    ClassStub, FieldStub, MethodStub, TypeParameter, ACC_ABSTRACT, ACC_FINAL, ACC_INTERFACE,
    ACC_PUBLIC, ACC_STATIC,
};
use nova_config::REFLECT_TARGET;
use parking_lot::RwLock;

use crate::error::{ReflectError, Result};

pub const OBJECT: &str = "java.lang.Object";

const PRIMITIVES: [&str; 9] = [
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

pub(crate) fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

static NEXT_LOADER_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a class loader. Two classes are the same class only if they share a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(u32);

impl LoaderId {
    pub fn fresh() -> Self {
        LoaderId(NEXT_LOADER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Primitive,
    Array,
}

/// Erased view of a loaded class, as handed out by a [`ClassLoader`].
#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub loader: LoaderId,
    pub type_parameters: Vec<TypeParameter>,
    pub enclosing_class: Option<String>,
    pub is_static: bool,
    pub component: Option<ErasedClass>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind, loader: LoaderId) -> Self {
        Self {
            name: name.into(),
            kind,
            loader,
            type_parameters: Vec::new(),
            enclosing_class: None,
            is_static: false,
            component: None,
        }
    }
}

/// A loaded, non-generic class handle. Compares by `(loader, name)`.
#[derive(Clone)]
pub struct ErasedClass(Arc<ClassDef>);

impl ErasedClass {
    pub fn new(def: ClassDef) -> Self {
        ErasedClass(Arc::new(def))
    }

    /// The array class whose elements are `component`.
    pub fn array_of(component: &ErasedClass) -> Self {
        let mut def = ClassDef::new(
            format!("{}[]", component.name()),
            ClassKind::Array,
            component.loader(),
        );
        def.component = Some(component.clone());
        ErasedClass::new(def)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> ClassKind {
        self.0.kind
    }

    pub fn loader(&self) -> LoaderId {
        self.0.loader
    }

    pub fn type_parameters(&self) -> &[TypeParameter] {
        &self.0.type_parameters
    }

    pub fn declared_type_parameter_count(&self) -> usize {
        self.0.type_parameters.len()
    }

    pub fn enclosing_class(&self) -> Option<&str> {
        self.0.enclosing_class.as_deref()
    }

    pub fn is_static(&self) -> bool {
        self.0.is_static
    }

    pub fn component_type(&self) -> Option<&ErasedClass> {
        self.0.component.as_ref()
    }

    pub(crate) fn structural_hash(&self) -> u64 {
        hash_of(&(self.0.loader, self.0.name.as_str()))
    }
}

impl PartialEq for ErasedClass {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.loader == other.0.loader && self.0.name == other.0.name)
    }
}

impl Eq for ErasedClass {}

impl Hash for ErasedClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

impl fmt::Debug for ErasedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErasedClass").field(&self.0.name).finish()
    }
}

impl fmt::Display for ErasedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// The class-loading collaborator.
///
/// Implementations may run arbitrary initialization (including re-entering the resolver), so
/// callers never hold a lock across `load`.
pub trait ClassLoader: Send + Sync {
    fn loader_id(&self) -> LoaderId;

    /// Load `binary_name` (`java.util.Map$Entry`, `int`, `java.lang.String[]`).
    fn load(&self, binary_name: &str) -> Option<ErasedClass>;
}

/// Member metadata lookup.
pub trait MetadataProvider: Send + Sync {
    fn class_stub(&self, binary_name: &str) -> Option<Arc<ClassStub>>;
}

/// In-memory class model: a [`ClassLoader`] and [`MetadataProvider`] over registered
/// [`ClassStub`]s.
///
/// Primitives, `void` and `java.lang.Object` are always present. Array classes of registered
/// classes are synthesized on demand.
pub struct ClassRegistry {
    id: LoaderId,
    classes: RwLock<HashMap<String, ErasedClass>>,
    stubs: RwLock<HashMap<String, Arc<ClassStub>>>,
    loads: AtomicUsize,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("id", &self.id)
            .field("classes", &self.classes.read().len())
            .finish_non_exhaustive()
    }
}

impl ClassRegistry {
    pub fn new() -> Self {
        let id = LoaderId::fresh();
        let mut classes = HashMap::new();
        for name in PRIMITIVES {
            classes.insert(
                name.to_string(),
                ErasedClass::new(ClassDef::new(name, ClassKind::Primitive, id)),
            );
        }
        let registry = Self {
            id,
            classes: RwLock::new(classes),
            stubs: RwLock::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        };
        registry
            .register(ClassStub::new(OBJECT, ACC_PUBLIC))
            .expect("a fresh registry only holds primitives");
        registry
    }

    /// A registry preloaded with the handful of JDK types most signatures mention.
    pub fn with_minimal_jdk() -> Self {
        let registry = Self::new();
        let stubs = minimal_jdk_stubs().expect("built-in JDK signatures should parse");
        for stub in stubs {
            registry
                .register(stub)
                .expect("built-in JDK classes are defined once");
        }
        registry
    }

    /// Define the class described by `stub`.
    ///
    /// A binary name can be defined once per registry. Resolved types already handed out (and
    /// cached) refer to the first definition, so redefinition is rejected.
    pub fn register(&self, stub: ClassStub) -> Result<ErasedClass> {
        let kind = if stub.is_interface() {
            ClassKind::Interface
        } else {
            ClassKind::Class
        };
        let mut def = ClassDef::new(stub.binary_name.clone(), kind, self.id);
        def.type_parameters = stub.type_parameters().to_vec();
        def.enclosing_class = stub.enclosing_class.clone();
        def.is_static = stub.is_static();
        let class = ErasedClass::new(def);

        let name = stub.binary_name.clone();
        {
            let mut classes = self.classes.write();
            if classes.contains_key(&name) {
                return Err(ReflectError::DuplicateClass { name });
            }
            classes.insert(name.clone(), class.clone());
        }
        self.stubs.write().insert(name, Arc::new(stub));

        tracing::trace!(
            target: REFLECT_TARGET,
            class = %class,
            type_params = class.declared_type_parameter_count(),
            "registered class"
        );
        Ok(class)
    }

    pub fn stub(&self, binary_name: &str) -> Option<Arc<ClassStub>> {
        self.stubs.read().get(binary_name).cloned()
    }

    /// Number of [`ClassLoader::load`] calls served so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    fn lookup(&self, binary_name: &str) -> Option<ErasedClass> {
        if let Some(component) = binary_name.strip_suffix("[]") {
            return self
                .lookup(component)
                .map(|component| ErasedClass::array_of(&component));
        }
        self.classes.read().get(binary_name).cloned()
    }
}

impl ClassLoader for ClassRegistry {
    fn loader_id(&self) -> LoaderId {
        self.id
    }

    fn load(&self, binary_name: &str) -> Option<ErasedClass> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.lookup(binary_name)
    }
}

impl MetadataProvider for ClassRegistry {
    fn class_stub(&self, binary_name: &str) -> Option<Arc<ClassStub>> {
        self.stub(binary_name)
    }
}

fn minimal_jdk_stubs() -> nova_classfile::Result<Vec<ClassStub>> {
    const IFACE: u16 = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;

    Ok(vec![
        ClassStub::new("java.io.Serializable", IFACE),
        ClassStub::new("java.lang.CharSequence", IFACE),
        ClassStub::new("java.lang.Comparable", IFACE)
            .with_signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")?
            .with_method(MethodStub::new(
                "compareTo",
                "(Ljava/lang/Object;)I",
                Some("(TT;)I"),
            )?),
        ClassStub::new("java.lang.Iterable", IFACE)
            .with_signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")?,
        ClassStub::new("java.util.Collection", IFACE)
            .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Iterable<TE;>;")?
            .with_interface("java.lang.Iterable"),
        ClassStub::new("java.util.List", IFACE)
            .with_signature(
                "<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/Collection<TE;>;",
            )?
            .with_interface("java.util.Collection")
            .with_method(MethodStub::new("get", "(I)Ljava/lang/Object;", Some("(I)TE;"))?)
            .with_method(MethodStub::new("add", "(Ljava/lang/Object;)Z", Some("(TE;)Z"))?),
        ClassStub::new("java.util.ArrayList", ACC_PUBLIC)
            .with_signature(
                "<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/List<TE;>;Ljava/io/Serializable;",
            )?
            .with_super_class(OBJECT)
            .with_interface("java.util.List")
            .with_interface("java.io.Serializable")
            .with_method(MethodStub::new("<init>", "()V", None)?),
        ClassStub::new("java.util.Map", IFACE)
            .with_signature("<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;")?
            .with_method(MethodStub::new(
                "get",
                "(Ljava/lang/Object;)Ljava/lang/Object;",
                Some("(Ljava/lang/Object;)TV;"),
            )?),
        ClassStub::new("java.util.Map$Entry", IFACE | ACC_STATIC)
            .with_signature("<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;")?
            .with_enclosing_class("java.util.Map"),
        ClassStub::new("java.lang.Number", ACC_PUBLIC | ACC_ABSTRACT)
            .with_super_class(OBJECT)
            .with_interface("java.io.Serializable"),
        ClassStub::new("java.lang.Integer", ACC_PUBLIC | ACC_FINAL)
            .with_signature("Ljava/lang/Number;Ljava/lang/Comparable<Ljava/lang/Integer;>;")?
            .with_super_class("java.lang.Number")
            .with_interface("java.lang.Comparable")
            .with_field(FieldStub::new("value", "I", None)?.with_access_flags(ACC_FINAL)),
        ClassStub::new("java.lang.String", ACC_PUBLIC | ACC_FINAL)
            .with_signature(
                "Ljava/lang/Object;Ljava/io/Serializable;Ljava/lang/Comparable<Ljava/lang/String;>;Ljava/lang/CharSequence;",
            )?
            .with_super_class(OBJECT)
            .with_interface("java.io.Serializable")
            .with_interface("java.lang.Comparable")
            .with_interface("java.lang.CharSequence"),
        ClassStub::new("java.lang.Enum", ACC_PUBLIC | ACC_ABSTRACT)
            .with_signature(
                "<E:Ljava/lang/Enum<TE;>;>Ljava/lang/Object;Ljava/lang/Comparable<TE;>;Ljava/io/Serializable;",
            )?
            .with_super_class(OBJECT)
            .with_interface("java.lang.Comparable")
            .with_interface("java.io.Serializable"),
        ClassStub::new("java.lang.Throwable", ACC_PUBLIC)
            .with_super_class(OBJECT)
            .with_interface("java.io.Serializable"),
        ClassStub::new("java.lang.Exception", ACC_PUBLIC).with_super_class("java.lang.Throwable"),
        ClassStub::new("java.io.IOException", ACC_PUBLIC).with_super_class("java.lang.Exception"),
    ])
}
