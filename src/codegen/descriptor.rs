//! Utilities to build and parse field/method descriptors

use std::fmt;

use super::defs::{binary_name, internal_name};
use super::error::DescriptorError;

/// A Java type as it appears in signatures
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JavaType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
    /// Reference type, held in dotted form (`java.util.EventObject`)
    Object(String),
    Array(Box<JavaType>),
}

impl JavaType {
    pub fn object(name: &str) -> Self {
        JavaType::Object(binary_name(name))
    }

    pub fn array_of(element: JavaType) -> Self {
        JavaType::Array(Box::new(element))
    }

    /// Resolve a source-level type name (`int`, `java.lang.String`) with `dims` array dimensions
    pub fn from_source(name: &str, dims: usize) -> Self {
        let mut ty = match name {
            "boolean" => JavaType::Boolean,
            "byte" => JavaType::Byte,
            "char" => JavaType::Char,
            "short" => JavaType::Short,
            "int" => JavaType::Int,
            "long" => JavaType::Long,
            "float" => JavaType::Float,
            "double" => JavaType::Double,
            "void" => JavaType::Void,
            other => JavaType::object(other),
        };
        for _ in 0..dims {
            ty = JavaType::array_of(ty);
        }
        ty
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, JavaType::Object(_) | JavaType::Array(_) | JavaType::Void)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, JavaType::Object(_) | JavaType::Array(_))
    }

    /// `long` and `double` occupy two local/stack words
    pub fn is_wide(&self) -> bool {
        matches!(self, JavaType::Long | JavaType::Double)
    }

    /// Number of local variable or operand stack words a value of this type takes
    pub fn word_size(&self) -> u16 {
        match self {
            JavaType::Void => 0,
            JavaType::Long | JavaType::Double => 2,
            _ => 1,
        }
    }

    pub fn descriptor(&self) -> String {
        match self {
            JavaType::Boolean => "Z".to_string(),
            JavaType::Byte => "B".to_string(),
            JavaType::Char => "C".to_string(),
            JavaType::Short => "S".to_string(),
            JavaType::Int => "I".to_string(),
            JavaType::Long => "J".to_string(),
            JavaType::Float => "F".to_string(),
            JavaType::Double => "D".to_string(),
            JavaType::Void => "V".to_string(),
            JavaType::Object(name) => format!("L{};", internal_name(name)),
            JavaType::Array(element) => format!("[{}", element.descriptor()),
        }
    }

    /// Name accepted by `Class.forName`: dotted for classes, descriptor-shaped for arrays
    pub fn class_for_name(&self) -> Option<String> {
        match self {
            JavaType::Object(name) => Some(name.clone()),
            JavaType::Array(_) => Some(binary_name(&self.descriptor())),
            _ => None,
        }
    }

    /// Source spelling (`int`, `java.lang.String[]`)
    pub fn source_name(&self) -> String {
        match self {
            JavaType::Boolean => "boolean".to_string(),
            JavaType::Byte => "byte".to_string(),
            JavaType::Char => "char".to_string(),
            JavaType::Short => "short".to_string(),
            JavaType::Int => "int".to_string(),
            JavaType::Long => "long".to_string(),
            JavaType::Float => "float".to_string(),
            JavaType::Double => "double".to_string(),
            JavaType::Void => "void".to_string(),
            JavaType::Object(name) => name.clone(),
            JavaType::Array(element) => format!("{}[]", element.source_name()),
        }
    }

    /// Parse a single field descriptor
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let mut chars = descriptor.char_indices().peekable();
        let ty = parse_one(descriptor, &mut chars)?;
        if chars.next().is_some() {
            return Err(DescriptorError::InvalidTypeDescriptor { descriptor: descriptor.to_string() });
        }
        Ok(ty)
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source_name())
    }
}

type DescriptorChars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn parse_one(descriptor: &str, chars: &mut DescriptorChars<'_>) -> Result<JavaType, DescriptorError> {
    let invalid = || DescriptorError::InvalidTypeDescriptor { descriptor: descriptor.to_string() };
    let (start, c) = chars.next().ok_or_else(invalid)?;
    Ok(match c {
        'Z' => JavaType::Boolean,
        'B' => JavaType::Byte,
        'C' => JavaType::Char,
        'S' => JavaType::Short,
        'I' => JavaType::Int,
        'J' => JavaType::Long,
        'F' => JavaType::Float,
        'D' => JavaType::Double,
        'V' => JavaType::Void,
        '[' => {
            let element = parse_one(descriptor, chars)?;
            if element == JavaType::Void {
                return Err(invalid());
            }
            JavaType::array_of(element)
        }
        'L' => {
            let mut end = None;
            for (i, ch) in chars.by_ref() {
                if ch == ';' {
                    end = Some(i);
                    break;
                }
            }
            let end = end.ok_or_else(invalid)?;
            let name = &descriptor[start + 1..end];
            if name.is_empty() || name.contains('.') {
                return Err(invalid());
            }
            JavaType::object(name)
        }
        _ => return Err(invalid()),
    })
}

/// Parameter and return types of a method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<JavaType>,
    pub ret: JavaType,
}

impl MethodDescriptor {
    pub fn new(params: Vec<JavaType>, ret: JavaType) -> Self {
        Self { params, ret }
    }

    /// Words occupied by the arguments, not counting `this`
    pub fn arg_words(&self) -> u16 {
        self.params.iter().map(JavaType::word_size).sum()
    }

    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let invalid = || DescriptorError::InvalidMethodDescriptor { descriptor: descriptor.to_string() };
        let mut chars = descriptor.char_indices().peekable();
        match chars.next() {
            Some((_, '(')) => {}
            _ => return Err(invalid()),
        }
        let mut params = Vec::new();
        loop {
            match chars.peek() {
                Some((_, ')')) => {
                    chars.next();
                    break;
                }
                Some(_) => {
                    let param = parse_one(descriptor, &mut chars).map_err(|_| invalid())?;
                    if param == JavaType::Void {
                        return Err(invalid());
                    }
                    params.push(param);
                }
                None => return Err(invalid()),
            }
        }
        let ret = parse_one(descriptor, &mut chars).map_err(|_| invalid())?;
        if chars.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { params, ret })
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for param in &self.params {
            f.write_str(&param.descriptor())?;
        }
        write!(f, "){}", self.ret.descriptor())
    }
}

pub fn type_to_descriptor(ty: &JavaType) -> String {
    ty.descriptor()
}

pub fn method_descriptor(params: &[JavaType], ret: &JavaType) -> String {
    let mut d = String::from("(");
    for p in params {
        d.push_str(&p.descriptor());
    }
    d.push(')');
    d.push_str(&ret.descriptor());
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangling() {
        assert_eq!(JavaType::from_source("java.lang.String", 1).descriptor(), "[Ljava/lang/String;");
        assert_eq!(method_descriptor(&[JavaType::Boolean], &JavaType::Void), "(Z)V");
        assert_eq!(
            method_descriptor(&[JavaType::Long, JavaType::object("java.util.EventObject")], &JavaType::Int),
            "(JLjava/util/EventObject;)I"
        );
    }

    #[test]
    fn test_parse_method_descriptor() {
        let d = MethodDescriptor::parse("([Ljava/lang/Object;Ljava/lang/reflect/Method;)Z").unwrap();
        assert_eq!(d.params.len(), 2);
        assert_eq!(d.params[0], JavaType::array_of(JavaType::object("java.lang.Object")));
        assert_eq!(d.ret, JavaType::Boolean);
        assert_eq!(d.to_string(), "([Ljava/lang/Object;Ljava/lang/reflect/Method;)Z");
        assert_eq!(MethodDescriptor::parse("(JD)V").unwrap().arg_words(), 4);
    }

    #[test]
    fn test_reject_malformed() {
        assert!(MethodDescriptor::parse("(V)V").is_err());
        assert!(MethodDescriptor::parse("(I").is_err());
        assert!(MethodDescriptor::parse("()Ljava/lang/String").is_err());
        assert!(JavaType::parse("Ljava.lang.String;").is_err());
        assert!(JavaType::parse("II").is_err());
    }

    #[test]
    fn test_class_for_name() {
        assert_eq!(JavaType::array_of(JavaType::Int).class_for_name().as_deref(), Some("[I"));
        assert_eq!(
            JavaType::from_source("java.lang.String", 1).class_for_name().as_deref(),
            Some("[Ljava.lang.String;")
        );
        assert_eq!(JavaType::Int.class_for_name(), None);
    }
}
