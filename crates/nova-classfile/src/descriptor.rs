use crate::error::{Error, Result};
use crate::signature::SigNode;

/// Erased parameter and return types of a method, as written in its descriptor.
///
/// `void` is represented as `ClassRef("void")` so callers can treat every return type uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<SigNode>,
    pub return_type: SigNode,
}

/// Binary name of the primitive denoted by a descriptor/signature base-type character.
pub(crate) fn base_type_name(tag: u8) -> Option<&'static str> {
    let name = match tag {
        b'B' => "byte",
        b'C' => "char",
        b'D' => "double",
        b'F' => "float",
        b'I' => "int",
        b'J' => "long",
        b'S' => "short",
        b'Z' => "boolean",
        _ => return None,
    };
    Some(name)
}

pub(crate) fn internal_to_binary(internal: &str) -> String {
    internal.replace('/', ".")
}

/// Parse an erased field descriptor (`[Ljava/lang/String;`) into a signature tree made only of
/// class and array references.
pub fn parse_field_descriptor(desc: &str) -> Result<SigNode> {
    let (ty, rest) = parse_field_type(desc)?;
    if !rest.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let Some(mut rest) = desc.strip_prefix('(') else {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    };

    let mut params = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix(')') {
            rest = after;
            break;
        }
        if rest.is_empty() {
            return Err(Error::InvalidDescriptor(desc.to_string()));
        }
        let (param, after) = parse_field_type(rest)?;
        params.push(param);
        rest = after;
    }

    let (return_type, rest) = if let Some(after) = rest.strip_prefix('V') {
        (SigNode::ClassRef("void".to_string()), after)
    } else {
        parse_field_type(rest)?
    };

    if !rest.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }

    Ok(MethodDescriptor {
        params,
        return_type,
    })
}

fn parse_field_type(input: &str) -> Result<(SigNode, &str)> {
    let Some(&tag) = input.as_bytes().first() else {
        return Err(Error::InvalidDescriptor(input.to_string()));
    };
    if let Some(name) = base_type_name(tag) {
        return Ok((SigNode::ClassRef(name.to_string()), &input[1..]));
    }
    match tag {
        b'L' => match input.find(';') {
            Some(end) if end > 1 => Ok((
                SigNode::ClassRef(internal_to_binary(&input[1..end])),
                &input[end + 1..],
            )),
            _ => Err(Error::InvalidDescriptor(input.to_string())),
        },
        b'[' => {
            let (component, rest) = parse_field_type(&input[1..])?;
            Ok((SigNode::ArrayRef(Box::new(component)), rest))
        }
        _ => Err(Error::InvalidDescriptor(input.to_string())),
    }
}
