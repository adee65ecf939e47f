use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use nova_classfile::{parse_field_signature, ClassStub, MethodStub, SigNode, ACC_PUBLIC};
use nova_config::ReflectConfig;
use nova_reflect::{
    BoundFailurePolicy, BoundState, ClassLoader, ClassRegistry, GenericDeclaration, ReflectError,
    Reflector, ResolvedType, Resolver, TypeVariable,
};
use pretty_assertions::assert_eq;

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn registry_with(stubs: Vec<ClassStub>) -> Arc<ClassRegistry> {
    let registry = ClassRegistry::with_minimal_jdk();
    for stub in stubs {
        registry.register(stub).unwrap();
    }
    Arc::new(registry)
}

fn generic_class(name: &str, signature: &str) -> ClassStub {
    ClassStub::new(name, ACC_PUBLIC)
        .with_signature(signature)
        .unwrap()
}

fn type_variable(resolver: &Resolver, declaration: &GenericDeclaration, name: &str) -> TypeVariable {
    resolver
        .resolve(&SigNode::variable(name), declaration)
        .unwrap()
        .as_type_variable()
        .expect("resolves to a type variable")
        .clone()
}

fn setup(stubs: Vec<ClassStub>, policy: BoundFailurePolicy) -> (Arc<ClassRegistry>, Resolver) {
    let registry = registry_with(stubs);
    let resolver = Resolver::uncached(registry.clone(), policy);
    (registry, resolver)
}

#[test]
fn self_referential_bound_terminates() {
    let (registry, resolver) = setup(
        vec![generic_class(
            "com.example.Node",
            "<T::Ljava/lang/Comparable<TT;>;>Ljava/lang/Object;",
        )],
        BoundFailurePolicy::Retry,
    );
    let node = GenericDeclaration::Class(registry.load("com.example.Node").unwrap());
    let t = type_variable(&resolver, &node, "T");
    assert!(t.bound_state().is_unresolved());

    let bounds = t.bounds().unwrap();
    assert_eq!(bounds.len(), 1);
    let comparable = bounds[0].as_parameterized().unwrap();
    assert_eq!(comparable.raw_type().name(), "java.lang.Comparable");

    let nested = comparable.actual_type_arguments().unwrap();
    let nested = nested[0].as_type_variable().unwrap();
    assert_eq!(nested, &t);
    assert!(!nested.ptr_eq(&t));
    // The nested `T` is compared by key; its own bounds are never needed.
    assert!(nested.bound_state().is_unresolved());
    assert!(t.bound_state().is_resolved());
    assert_eq!(bounds[0].to_string(), "java.lang.Comparable<T>");
}

#[test]
fn enum_style_class_bound_resolves() {
    let registry = registry_with(vec![]);
    let reflector = Reflector::new(registry.clone(), &ReflectConfig::default());
    let enum_class = GenericDeclaration::Class(registry.load("java.lang.Enum").unwrap());

    let params = reflector.type_parameters(&enum_class);
    assert_eq!(params.len(), 1);
    let e = &params[0];
    let bounds = e.bounds().unwrap();
    assert_eq!(bounds[0].to_string(), "java.lang.Enum<E>");
    let inner = bounds[0].as_parameterized().unwrap().actual_type_arguments().unwrap();
    assert_eq!(&inner[0], &ResolvedType::TypeVariable(e.clone()));
}

#[test]
fn bounds_are_memoized_without_further_lookups() {
    let (registry, resolver) = setup(
        vec![generic_class(
            "com.example.Sorted",
            "<T:Ljava/lang/Number;:Ljava/lang/Comparable<TT;>;:Ljava/io/Serializable;>Ljava/lang/Object;",
        )],
        BoundFailurePolicy::Retry,
    );
    let sorted = GenericDeclaration::Class(registry.load("com.example.Sorted").unwrap());
    let t = type_variable(&resolver, &sorted, "T");

    let first = t.bounds().unwrap();
    let loads = registry.load_count();
    let second = t.bounds().unwrap();

    assert_eq!(registry.load_count(), loads);
    assert_eq!(first, second);
    assert_eq!(
        first.iter().map(ToString::to_string).collect::<Vec<_>>(),
        vec![
            "java.lang.Number",
            "java.lang.Comparable<T>",
            "java.io.Serializable",
        ]
    );
}

#[test]
fn interface_only_bound_has_no_implicit_object() {
    let (registry, resolver) = setup(
        vec![generic_class(
            "com.example.Holder",
            "<T::Ljava/io/Serializable;>Ljava/lang/Object;",
        )],
        BoundFailurePolicy::Retry,
    );
    let holder = GenericDeclaration::Class(registry.load("com.example.Holder").unwrap());
    let t = type_variable(&resolver, &holder, "T");

    assert_eq!(
        &*t.bounds().unwrap(),
        &[ResolvedType::Class(registry.load("java.io.Serializable").unwrap())]
    );
}

#[test]
fn retry_policy_resolves_once_the_class_appears() {
    let (registry, resolver) = setup(
        vec![generic_class(
            "com.example.Box",
            "<T:Lcom/example/Later;>Ljava/lang/Object;",
        )],
        BoundFailurePolicy::Retry,
    );
    let boxed = GenericDeclaration::Class(registry.load("com.example.Box").unwrap());
    let t = type_variable(&resolver, &boxed, "T");

    let err = t.bounds().unwrap_err();
    assert_eq!(err, ReflectError::type_not_present("com.example.Later"));
    assert_eq!(t.bound_state(), BoundState::Unresolved);

    let later = registry
        .register(ClassStub::new("com.example.Later", ACC_PUBLIC))
        .unwrap();
    assert_eq!(&*t.bounds().unwrap(), &[ResolvedType::Class(later)]);
    assert!(t.bound_state().is_resolved());
}

#[test]
fn memoize_policy_replays_the_first_failure() {
    let (registry, resolver) = setup(
        vec![generic_class(
            "com.example.Box",
            "<T:Lcom/example/Later;>Ljava/lang/Object;",
        )],
        BoundFailurePolicy::Memoize,
    );
    let boxed = GenericDeclaration::Class(registry.load("com.example.Box").unwrap());
    let t = type_variable(&resolver, &boxed, "T");

    assert!(t.bounds().unwrap_err().is_type_not_present());
    assert!(t.bound_state().is_failed());

    registry
        .register(ClassStub::new("com.example.Later", ACC_PUBLIC))
        .unwrap();
    let loads = registry.load_count();
    assert_eq!(
        t.bounds().unwrap_err(),
        ReflectError::type_not_present("com.example.Later")
    );
    assert_eq!(registry.load_count(), loads);

    // A fresh type variable for the same parameter starts over.
    let fresh = type_variable(&resolver, &boxed, "T");
    assert!(fresh.bounds().is_ok());
}

#[test]
fn failed_bound_does_not_publish_earlier_bounds() {
    let (registry, resolver) = setup(
        vec![generic_class(
            "com.example.Multi",
            "<T:Ljava/lang/Number;:Lcom/example/MissingIface;>Ljava/lang/Object;",
        )],
        BoundFailurePolicy::Retry,
    );
    let multi = GenericDeclaration::Class(registry.load("com.example.Multi").unwrap());
    let t = type_variable(&resolver, &multi, "T");

    assert!(t.bounds().is_err());
    assert_eq!(t.bound_state(), BoundState::Unresolved);
}

#[test]
fn type_variable_equality_never_forces_bounds() {
    let (registry, resolver) = setup(
        vec![generic_class(
            "com.example.Broken",
            "<T:Lcom/example/Missing;>Ljava/lang/Object;",
        )],
        BoundFailurePolicy::Retry,
    );
    let broken = GenericDeclaration::Class(registry.load("com.example.Broken").unwrap());
    let a = type_variable(&resolver, &broken, "T");
    let b = type_variable(&resolver, &broken, "T");

    let loads = registry.load_count();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_eq!(registry.load_count(), loads);
    assert!(a.bound_state().is_unresolved());
    assert!(b.bound_state().is_unresolved());

    assert!(a.bounds().is_err());
    assert_eq!(a, b);
}

#[test]
fn same_name_in_different_declarations_differs() {
    let (registry, resolver) = setup(
        vec![
            generic_class("com.example.A", "<T:Ljava/lang/Object;>Ljava/lang/Object;"),
            generic_class("com.example.B", "<T:Ljava/lang/Object;>Ljava/lang/Object;"),
        ],
        BoundFailurePolicy::Retry,
    );
    let a = GenericDeclaration::Class(registry.load("com.example.A").unwrap());
    let b = GenericDeclaration::Class(registry.load("com.example.B").unwrap());

    assert_ne!(
        type_variable(&resolver, &a, "T"),
        type_variable(&resolver, &b, "T")
    );
}

#[test]
fn method_type_variable_bound_refers_to_class_parameter() {
    let registry = registry_with(vec![generic_class(
        "com.example.Container",
        "<T:Ljava/lang/Object;>Ljava/lang/Object;",
    )
    .with_method(
        MethodStub::new(
            "narrow",
            "(Ljava/lang/Object;)Ljava/lang/Object;",
            Some("<U:TT;>(TU;)TT;"),
        )
        .unwrap(),
    )]);
    let reflector = Reflector::new(registry.clone(), &ReflectConfig::default());
    let container = registry.load("com.example.Container").unwrap();
    let narrow = reflector
        .method(&container, "narrow", "(Ljava/lang/Object;)Ljava/lang/Object;")
        .unwrap();

    let params = reflector.type_parameters(&narrow);
    let u = &params[0];
    assert_eq!(u.generic_declaration(), &narrow);

    let bounds = u.bounds().unwrap();
    let t = bounds[0].as_type_variable().unwrap();
    assert_eq!(t.name(), "T");
    assert_eq!(t.generic_declaration(), &GenericDeclaration::Class(container));
}

#[test]
fn unbounded_wildcard_defaults_to_object() {
    let (registry, resolver) = setup(vec![], BoundFailurePolicy::Retry);
    let object = GenericDeclaration::Class(registry.load("java.lang.Object").unwrap());
    let node = parse_field_signature("Ljava/util/List<*>;").unwrap();

    let list = resolver.resolve(&node, &object).unwrap();
    let args = list.as_parameterized().unwrap().actual_type_arguments().unwrap();
    let wildcard = args[0].as_wildcard().unwrap();

    assert!(wildcard.bound_state().is_unresolved());
    assert_eq!(
        &*wildcard.upper_bounds().unwrap(),
        &[ResolvedType::Class(registry.load("java.lang.Object").unwrap())]
    );
    assert!(wildcard.lower_bounds().unwrap().is_empty());
    assert_eq!(list.to_string(), "java.util.List<?>");
}

#[test]
fn lower_bounded_wildcard_has_no_upper_bounds() {
    let (registry, resolver) = setup(vec![], BoundFailurePolicy::Retry);
    let object = GenericDeclaration::Class(registry.load("java.lang.Object").unwrap());
    let node = parse_field_signature("Ljava/lang/Comparable<-Ljava/lang/Integer;>;").unwrap();

    let ty = resolver.resolve(&node, &object).unwrap();
    let args = ty.as_parameterized().unwrap().actual_type_arguments().unwrap();
    let wildcard = args[0].as_wildcard().unwrap();

    assert!(!wildcard.is_upper_bound());
    assert_eq!(
        &*wildcard.lower_bounds().unwrap(),
        &[ResolvedType::Class(registry.load("java.lang.Integer").unwrap())]
    );
    assert!(wildcard.upper_bounds().unwrap().is_empty());
    assert_eq!(ty.to_string(), "java.lang.Comparable<? super java.lang.Integer>");
}

#[test]
fn explicit_object_bound_equals_unbounded_wildcard() {
    let (registry, resolver) = setup(vec![], BoundFailurePolicy::Retry);
    let object = GenericDeclaration::Class(registry.load("java.lang.Object").unwrap());
    let unbounded = resolver
        .resolve(&SigNode::unbounded_wildcard(), &object)
        .unwrap();
    let explicit = resolver
        .resolve(
            &SigNode::extends_wildcard(SigNode::class("java.lang.Object")),
            &object,
        )
        .unwrap();

    assert_eq!(unbounded, explicit);
    assert_eq!(hash_of(&unbounded), hash_of(&explicit));
    assert_ne!(
        unbounded,
        resolver
            .resolve(&SigNode::super_wildcard(SigNode::class("java.lang.Object")), &object)
            .unwrap()
    );
}

#[test]
fn wildcards_with_missing_bounds_compare_by_signature() {
    let (registry, resolver) = setup(vec![], BoundFailurePolicy::Retry);
    let object = GenericDeclaration::Class(registry.load("java.lang.Object").unwrap());
    let node = SigNode::extends_wildcard(SigNode::class("com.example.Missing"));

    let a = resolver.resolve(&node, &object).unwrap();
    let b = resolver.resolve(&node, &object).unwrap();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert!(a.as_wildcard().unwrap().upper_bounds().is_err());
}

#[test]
fn concurrent_first_access_publishes_one_list() {
    let (registry, resolver) = setup(
        vec![generic_class(
            "com.example.Node",
            "<T::Ljava/lang/Comparable<TT;>;>Ljava/lang/Object;",
        )],
        BoundFailurePolicy::Retry,
    );
    let node = GenericDeclaration::Class(registry.load("com.example.Node").unwrap());
    let t = type_variable(&resolver, &node, "T");

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| t.bounds().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let published = t.bounds().unwrap();
    for bounds in &results {
        assert_eq!(bounds, &published);
    }
}
