use crate::descriptor::{parse_field_descriptor, parse_method_descriptor, MethodDescriptor};
use crate::error::Result;
use crate::signature::{
    parse_class_signature, parse_field_signature, parse_method_signature, ClassSignature,
    MethodSignature, SigNode, TypeParameter,
};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_VARARGS: u16 = 0x0080;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;

/// Metadata recorded for a class: erased supertypes, the optional generic signature, and its
/// members.
///
/// Names are binary names (`java.util.Map$Entry`).
#[derive(Debug, Clone)]
pub struct ClassStub {
    pub binary_name: String,
    pub access_flags: u16,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<ClassSignature>,
    /// Lexically enclosing class, for member classes.
    pub enclosing_class: Option<String>,
    pub fields: Vec<FieldStub>,
    pub methods: Vec<MethodStub>,
}

#[derive(Debug, Clone)]
pub struct FieldStub {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub parsed_descriptor: SigNode,
    pub signature: Option<SigNode>,
}

#[derive(Debug, Clone)]
pub struct MethodStub {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub parsed_descriptor: MethodDescriptor,
    pub signature: Option<MethodSignature>,
    /// Erased `throws` clause.
    pub exceptions: Vec<String>,
}

impl ClassStub {
    pub fn new(binary_name: impl Into<String>, access_flags: u16) -> Self {
        Self {
            binary_name: binary_name.into(),
            access_flags,
            super_class: None,
            interfaces: Vec::new(),
            signature: None,
            enclosing_class: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_signature(mut self, signature: &str) -> Result<Self> {
        self.signature = Some(parse_class_signature(signature)?);
        Ok(self)
    }

    pub fn with_super_class(mut self, binary_name: impl Into<String>) -> Self {
        self.super_class = Some(binary_name.into());
        self
    }

    pub fn with_interface(mut self, binary_name: impl Into<String>) -> Self {
        self.interfaces.push(binary_name.into());
        self
    }

    pub fn with_enclosing_class(mut self, binary_name: impl Into<String>) -> Self {
        self.enclosing_class = Some(binary_name.into());
        self
    }

    pub fn with_field(mut self, field: FieldStub) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodStub) -> Self {
        self.methods.push(method);
        self
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn type_parameters(&self) -> &[TypeParameter] {
        self.signature
            .as_ref()
            .map(|sig| sig.type_parameters.as_slice())
            .unwrap_or_default()
    }

    pub fn field(&self, name: &str) -> Option<&FieldStub> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodStub> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }
}

impl FieldStub {
    pub fn new(name: impl Into<String>, descriptor: &str, signature: Option<&str>) -> Result<Self> {
        let parsed_descriptor = parse_field_descriptor(descriptor)?;
        let signature = match signature {
            Some(sig) => Some(parse_field_signature(sig)?),
            None => None,
        };
        Ok(Self {
            access_flags: ACC_PUBLIC,
            name: name.into(),
            descriptor: descriptor.to_string(),
            parsed_descriptor,
            signature,
        })
    }

    pub fn with_access_flags(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }
}

impl MethodStub {
    pub fn new(name: impl Into<String>, descriptor: &str, signature: Option<&str>) -> Result<Self> {
        let parsed_descriptor = parse_method_descriptor(descriptor)?;
        let signature = match signature {
            Some(sig) => Some(parse_method_signature(sig)?),
            None => None,
        };
        Ok(Self {
            access_flags: ACC_PUBLIC,
            name: name.into(),
            descriptor: descriptor.to_string(),
            parsed_descriptor,
            signature,
            exceptions: Vec::new(),
        })
    }

    pub fn with_access_flags(mut self, access_flags: u16) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn with_exception(mut self, binary_name: impl Into<String>) -> Self {
        self.exceptions.push(binary_name.into());
        self
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
