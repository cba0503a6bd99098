//! How each primitive parameter is boxed before it goes into the `Object[]`

use crate::codegen::descriptor::JavaType;
use crate::codegen::opcodes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boxing {
    /// Wrapper class, internal form
    pub wrapper: &'static str,
    /// Descriptor of the wrapper constructor taking the primitive
    pub constructor: &'static str,
    /// Conversion applied to the loaded value before the constructor call
    pub narrowing: Option<u8>,
}

const fn boxing(wrapper: &'static str, constructor: &'static str, narrowing: Option<u8>) -> Boxing {
    Boxing { wrapper, constructor, narrowing }
}

/// Boxing for a primitive type; `None` for references and `void`
pub fn boxing_for(ty: &JavaType) -> Option<Boxing> {
    Some(match ty {
        JavaType::Boolean => boxing("java/lang/Boolean", "(Z)V", Some(opcodes::I2B)),
        JavaType::Char => boxing("java/lang/Character", "(C)V", Some(opcodes::I2C)),
        JavaType::Byte => boxing("java/lang/Byte", "(B)V", Some(opcodes::I2B)),
        JavaType::Short => boxing("java/lang/Short", "(S)V", Some(opcodes::I2S)),
        JavaType::Int => boxing("java/lang/Integer", "(I)V", None),
        JavaType::Long => boxing("java/lang/Long", "(J)V", None),
        JavaType::Float => boxing("java/lang/Float", "(F)V", None),
        JavaType::Double => boxing("java/lang/Double", "(D)V", None),
        JavaType::Void | JavaType::Object(_) | JavaType::Array(_) => return None,
    })
}

/// Wrapper class whose static `TYPE` field holds the `Class` of a primitive
pub fn primitive_class_holder(ty: &JavaType) -> Option<&'static str> {
    match ty {
        JavaType::Void => Some("java/lang/Void"),
        other => boxing_for(other).map(|b| b.wrapper),
    }
}
