use std::fmt;

use crate::descriptor::{base_type_name, internal_to_binary};
use crate::error::{Error, Result};

/// A node of an unresolved generic signature tree.
///
/// Class names are stored as binary names (`java.util.Map$Entry`). Primitive types are class
/// references to their keyword name (`int`, `void`).
///
/// Trees are immutable once built and compare structurally, so a node can be used directly as
/// the structural half of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SigNode {
    ClassRef(String),
    ParameterizedRef {
        raw: Box<SigNode>,
        args: Vec<SigNode>,
        owner: Option<Box<SigNode>>,
    },
    WildcardRef {
        bounds: Vec<SigNode>,
        is_upper_bound: bool,
    },
    VariableRef(String),
    ArrayRef(Box<SigNode>),
}

impl SigNode {
    pub fn class(name: impl Into<String>) -> Self {
        SigNode::ClassRef(name.into())
    }

    pub fn parameterized(raw: impl Into<String>, args: Vec<SigNode>) -> Self {
        SigNode::ParameterizedRef {
            raw: Box::new(SigNode::ClassRef(raw.into())),
            args,
            owner: None,
        }
    }

    /// Attach `owner` to a parameterized reference. Other nodes are returned unchanged.
    pub fn with_owner(self, owner: SigNode) -> Self {
        match self {
            SigNode::ParameterizedRef { raw, args, .. } => SigNode::ParameterizedRef {
                raw,
                args,
                owner: Some(Box::new(owner)),
            },
            other => other,
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        SigNode::VariableRef(name.into())
    }

    pub fn array(component: SigNode) -> Self {
        SigNode::ArrayRef(Box::new(component))
    }

    pub fn unbounded_wildcard() -> Self {
        SigNode::WildcardRef {
            bounds: Vec::new(),
            is_upper_bound: true,
        }
    }

    pub fn extends_wildcard(bound: SigNode) -> Self {
        SigNode::WildcardRef {
            bounds: vec![bound],
            is_upper_bound: true,
        }
    }

    pub fn super_wildcard(bound: SigNode) -> Self {
        SigNode::WildcardRef {
            bounds: vec![bound],
            is_upper_bound: false,
        }
    }
}

/// Source-like rendering used for diagnostics (`java.util.Map<K, java.util.List<V>>`).
impl fmt::Display for SigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigNode::ClassRef(name) | SigNode::VariableRef(name) => f.write_str(name),
            SigNode::ParameterizedRef { raw, args, owner } => {
                match owner {
                    Some(owner) => {
                        write!(f, "{owner}.")?;
                        match raw.as_ref() {
                            SigNode::ClassRef(name) => {
                                f.write_str(name.rsplit('$').next().unwrap_or(name))?
                            }
                            other => write!(f, "{other}")?,
                        }
                    }
                    None => write!(f, "{raw}")?,
                }
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (idx, arg) in args.iter().enumerate() {
                        if idx > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            SigNode::WildcardRef {
                bounds,
                is_upper_bound,
            } => {
                f.write_str("?")?;
                if bounds.is_empty() {
                    return Ok(());
                }
                f.write_str(if *is_upper_bound { " extends " } else { " super " })?;
                for (idx, bound) in bounds.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{bound}")?;
                }
                Ok(())
            }
            SigNode::ArrayRef(component) => write!(f, "{component}[]"),
        }
    }
}

/// A formal type parameter: `T extends ClassBound & Iface1 & Iface2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<SigNode>,
    pub interface_bounds: Vec<SigNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub super_class: SigNode,
    pub interfaces: Vec<SigNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<SigNode>,
    pub return_type: SigNode,
    pub exceptions: Vec<SigNode>,
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    let mut parser = Parser::new(sig);
    let type_parameters = parser.type_parameters()?;
    let super_class = parser.class_type()?;
    let mut interfaces = Vec::new();
    while parser.peek() == Some(b'L') {
        interfaces.push(parser.class_type()?);
    }
    parser.finish()?;
    Ok(ClassSignature {
        type_parameters,
        super_class,
        interfaces,
    })
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    let mut parser = Parser::new(sig);
    let type_parameters = parser.type_parameters()?;
    parser.expect(b'(', "expected `(` before parameter types")?;
    let mut parameters = Vec::new();
    while !parser.eat(b')') {
        if parser.peek().is_none() {
            return Err(parser.error("unterminated parameter list"));
        }
        parameters.push(parser.java_type()?);
    }
    let return_type = if parser.eat(b'V') {
        SigNode::ClassRef("void".to_string())
    } else {
        parser.java_type()?
    };
    let mut exceptions = Vec::new();
    while parser.eat(b'^') {
        exceptions.push(parser.reference_type()?);
    }
    parser.finish()?;
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        exceptions,
    })
}

pub fn parse_field_signature(sig: &str) -> Result<SigNode> {
    let mut parser = Parser::new(sig);
    let ty = parser.reference_type()?;
    parser.finish()?;
    Ok(ty)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: u8, reason: &'static str) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(reason))
        }
    }

    fn error(&self, reason: &'static str) -> Error {
        Error::signature(self.input, self.pos, reason)
    }

    fn finish(&self) -> Result<()> {
        if self.pos == self.input.len() {
            Ok(())
        } else {
            Err(self.error("trailing characters"))
        }
    }

    /// Consume a non-empty identifier ending right before one of `stops`.
    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.peek().is_none() {
            return Err(self.error("unterminated identifier"));
        }
        if self.pos == start {
            return Err(self.error("empty identifier"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn type_parameters(&mut self) -> Result<Vec<TypeParameter>> {
        if !self.eat(b'<') {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        while !self.eat(b'>') {
            if self.peek().is_none() {
                return Err(self.error("unterminated type parameter list"));
            }
            out.push(self.type_parameter()?);
        }
        if out.is_empty() {
            return Err(self.error("empty type parameter list"));
        }
        Ok(out)
    }

    fn type_parameter(&mut self) -> Result<TypeParameter> {
        let name = self.identifier(b":>")?.to_string();
        self.expect(b':', "expected `:` after type parameter name")?;
        let class_bound = match self.peek() {
            Some(b'L' | b'T' | b'[') => Some(self.reference_type()?),
            _ => None,
        };
        let mut interface_bounds = Vec::new();
        while self.eat(b':') {
            interface_bounds.push(self.reference_type()?);
        }
        Ok(TypeParameter {
            name,
            class_bound,
            interface_bounds,
        })
    }

    fn java_type(&mut self) -> Result<SigNode> {
        if let Some(name) = self.peek().and_then(base_type_name) {
            self.pos += 1;
            return Ok(SigNode::ClassRef(name.to_string()));
        }
        self.reference_type()
    }

    fn reference_type(&mut self) -> Result<SigNode> {
        match self.peek() {
            Some(b'L') => self.class_type(),
            Some(b'T') => {
                self.pos += 1;
                let name = self.identifier(b";")?.to_string();
                self.expect(b';', "expected `;` after type variable")?;
                Ok(SigNode::VariableRef(name))
            }
            Some(b'[') => {
                self.pos += 1;
                Ok(SigNode::ArrayRef(Box::new(self.java_type()?)))
            }
            _ => Err(self.error("expected class, array, or type variable signature")),
        }
    }

    /// `Lpkg/Outer<..>.Inner<..>;`. Each `.Inner` segment becomes a node owned by the segment
    /// before it.
    fn class_type(&mut self) -> Result<SigNode> {
        self.expect(b'L', "expected class type signature")?;
        let mut binary_name = internal_to_binary(self.identifier(b"<.;")?);
        let mut node = self.class_segment(&binary_name, None)?;
        while self.eat(b'.') {
            let simple = self.identifier(b"<.;")?;
            binary_name.push('$');
            binary_name.push_str(simple);
            node = self.class_segment(&binary_name, Some(node))?;
        }
        self.expect(b';', "expected `;` after class type signature")?;
        Ok(node)
    }

    fn class_segment(&mut self, binary_name: &str, owner: Option<SigNode>) -> Result<SigNode> {
        let args = if self.peek() == Some(b'<') {
            self.type_arguments()?
        } else {
            Vec::new()
        };
        let owner_is_generic = matches!(owner, Some(SigNode::ParameterizedRef { .. }));
        if args.is_empty() && !owner_is_generic {
            return Ok(SigNode::ClassRef(binary_name.to_string()));
        }
        Ok(SigNode::ParameterizedRef {
            raw: Box::new(SigNode::ClassRef(binary_name.to_string())),
            args,
            owner: owner.map(Box::new),
        })
    }

    fn type_arguments(&mut self) -> Result<Vec<SigNode>> {
        self.expect(b'<', "expected `<`")?;
        let mut args = Vec::new();
        while !self.eat(b'>') {
            let arg = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    SigNode::unbounded_wildcard()
                }
                Some(b'+') => {
                    self.pos += 1;
                    SigNode::extends_wildcard(self.reference_type()?)
                }
                Some(b'-') => {
                    self.pos += 1;
                    SigNode::super_wildcard(self.reference_type()?)
                }
                None => return Err(self.error("unterminated type argument list")),
                _ => self.reference_type()?,
            };
            args.push(arg);
        }
        if args.is_empty() {
            return Err(self.error("empty type argument list"));
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_segments_keep_their_owner() {
        let sig = parse_field_signature("Lcom/example/Outer<TT;>.Inner<TU;>;").unwrap();
        assert_eq!(
            sig,
            SigNode::parameterized("com.example.Outer$Inner", vec![SigNode::variable("U")])
                .with_owner(SigNode::parameterized(
                    "com.example.Outer",
                    vec![SigNode::variable("T")]
                ))
        );
        assert_eq!(sig.to_string(), "com.example.Outer<T>.Inner<U>");
    }

    #[test]
    fn non_generic_owner_collapses_into_binary_name() {
        let sig = parse_field_signature("Ljava/util/Map.Entry;").unwrap();
        assert_eq!(sig, SigNode::class("java.util.Map$Entry"));
    }

    #[test]
    fn interface_only_bound_has_no_class_bound() {
        let sig = parse_class_signature("<T::Ljava/io/Serializable;>Ljava/lang/Object;").unwrap();
        assert_eq!(
            sig.type_parameters,
            vec![TypeParameter {
                name: "T".to_string(),
                class_bound: None,
                interface_bounds: vec![SigNode::class("java.io.Serializable")],
            }]
        );
    }

    #[test]
    fn method_signature_with_throws() {
        let sig = parse_method_signature("<X:Ljava/lang/Exception;>([TX;)V^TX;^Ljava/io/IOException;")
            .unwrap();
        assert_eq!(sig.parameters, vec![SigNode::array(SigNode::variable("X"))]);
        assert_eq!(sig.return_type, SigNode::class("void"));
        assert_eq!(
            sig.exceptions,
            vec![SigNode::variable("X"), SigNode::class("java.io.IOException")]
        );
    }

    #[test]
    fn errors_report_offset() {
        let err = parse_field_signature("Ljava/util/List<>;").unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSignature {
                signature: "Ljava/util/List<>;".to_string(),
                offset: 17,
                reason: "empty type argument list",
            }
        );
        assert!(parse_field_signature("Ljava/util/List").is_err());
        assert!(parse_field_signature("TT").is_err());
        assert!(parse_class_signature("<>Ljava/lang/Object;").is_err());
        assert!(parse_method_signature("(I").is_err());
    }
}
