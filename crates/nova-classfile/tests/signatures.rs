use nova_classfile::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassStub, FieldStub,
    MethodStub, SigNode, TypeParameter, ACC_INTERFACE, ACC_STATIC,
};
use pretty_assertions::assert_eq;

#[test]
fn self_referential_bound_stays_symbolic() {
    let sig = parse_class_signature(
        "<T:Ljava/lang/Object;:Ljava/lang/Comparable<TT;>;>Ljava/lang/Object;",
    )
    .unwrap();

    assert_eq!(
        sig.type_parameters,
        vec![TypeParameter {
            name: "T".to_string(),
            class_bound: Some(SigNode::class("java.lang.Object")),
            interface_bounds: vec![SigNode::parameterized(
                "java.lang.Comparable",
                vec![SigNode::variable("T")]
            )],
        }]
    );
    assert_eq!(sig.super_class, SigNode::class("java.lang.Object"));
    assert!(sig.interfaces.is_empty());
}

#[test]
fn wildcards_translate() {
    assert_eq!(
        parse_field_signature("Ljava/util/List<*>;").unwrap(),
        SigNode::parameterized("java.util.List", vec![SigNode::unbounded_wildcard()])
    );
    assert_eq!(
        parse_field_signature("Ljava/util/List<+Ljava/lang/Number;>;").unwrap(),
        SigNode::parameterized(
            "java.util.List",
            vec![SigNode::extends_wildcard(SigNode::class("java.lang.Number"))]
        )
    );
    assert_eq!(
        parse_field_signature("Ljava/util/List<-Ljava/lang/Number;>;").unwrap(),
        SigNode::parameterized(
            "java.util.List",
            vec![SigNode::super_wildcard(SigNode::class("java.lang.Number"))]
        )
    );
}

#[test]
fn map_of_list_renders_in_source_form() {
    let sig = parse_field_signature("Ljava/util/Map<TK;Ljava/util/List<TV;>;>;").unwrap();
    assert_eq!(
        sig,
        SigNode::parameterized(
            "java.util.Map",
            vec![
                SigNode::variable("K"),
                SigNode::parameterized("java.util.List", vec![SigNode::variable("V")]),
            ]
        )
    );
    assert_eq!(sig.to_string(), "java.util.Map<K, java.util.List<V>>");
}

#[test]
fn arrays_and_primitives_in_method_signatures() {
    let sig = parse_method_signature("([I[[Ljava/lang/String;)I").unwrap();
    assert_eq!(
        sig.parameters,
        vec![
            SigNode::array(SigNode::class("int")),
            SigNode::array(SigNode::array(SigNode::class("java.lang.String"))),
        ]
    );
    assert_eq!(sig.return_type, SigNode::class("int"));
    assert!(sig.type_parameters.is_empty());
}

#[test]
fn class_stub_collects_member_metadata() {
    let stub = ClassStub::new("com.example.Box", 0)
        .with_signature("<T:Ljava/lang/Number;>Ljava/lang/Object;")
        .unwrap()
        .with_super_class("java.lang.Object")
        .with_field(FieldStub::new("value", "Ljava/lang/Number;", Some("TT;")).unwrap())
        .with_field(FieldStub::new("count", "I", None).unwrap())
        .with_method(
            MethodStub::new("get", "()Ljava/lang/Number;", Some("()TT;"))
                .unwrap()
                .with_exception("java.io.IOException"),
        );

    assert!(!stub.is_interface());
    assert_eq!(stub.type_parameters().len(), 1);
    assert_eq!(
        stub.field("value").unwrap().signature,
        Some(SigNode::variable("T"))
    );
    assert_eq!(stub.field("count").unwrap().signature, None);
    assert_eq!(
        stub.field("count").unwrap().parsed_descriptor,
        SigNode::class("int")
    );

    let get = stub.method("get", "()Ljava/lang/Number;").unwrap();
    assert!(!get.is_constructor());
    assert_eq!(
        get.signature.as_ref().unwrap().return_type,
        SigNode::variable("T")
    );
    assert_eq!(get.exceptions, vec!["java.io.IOException".to_string()]);
    assert!(stub.method("get", "()V").is_none());

    let nested = ClassStub::new("java.util.Map$Entry", ACC_INTERFACE | ACC_STATIC)
        .with_enclosing_class("java.util.Map");
    assert!(nested.is_interface());
    assert!(nested.is_static());
    assert!(nested.type_parameters().is_empty());
}

#[test]
fn invalid_member_signature_is_reported_at_parse() {
    assert!(FieldStub::new("broken", "Ljava/lang/Object;", Some("Ljava/util/List<")).is_err());
    assert!(MethodStub::new("broken", "()V", Some("()")).is_err());
    assert!(ClassStub::new("Broken", 0).with_signature("<T>").is_err());
}
