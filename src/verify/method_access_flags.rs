use crate::codegen::class::ClassFile;
use crate::codegen::defs::{access_flags, CONSTRUCTOR_METHOD_NAME, STATIC_INITIALIZER_METHOD_NAME};
use crate::codegen::method::MethodInfo;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MethodAccessFlagsError {
    #[error("Invalid method access flags: 0x{0:04x}")]
    Invalid(u16),
}

pub type Result<T> = std::result::Result<T, MethodAccessFlagsError>;

/// Verify method access flags
pub fn verify(class_file: &ClassFile, method: &MethodInfo) -> Result<()> {
    let flags = method.access_flags;
    let has = |bit: u16| flags & bit != 0;

    if (has(access_flags::ACC_PUBLIC) as u8 + has(access_flags::ACC_PROTECTED) as u8 + has(access_flags::ACC_PRIVATE) as u8) > 1 {
        return Err(MethodAccessFlagsError::Invalid(flags));
    }

    let class_is_interface = class_file.access_flags & access_flags::ACC_INTERFACE != 0;
    let name = class_file.method_name(method);
    if class_is_interface && name != Some(STATIC_INITIALIZER_METHOD_NAME) {
        let required = access_flags::ACC_PUBLIC | access_flags::ACC_ABSTRACT;
        if flags & required != required {
            return Err(MethodAccessFlagsError::Invalid(flags));
        }
    }

    if has(access_flags::ACC_ABSTRACT)
        && (has(access_flags::ACC_PRIVATE)
            || has(access_flags::ACC_STATIC)
            || has(access_flags::ACC_FINAL)
            || has(access_flags::ACC_SYNCHRONIZED)
            || has(access_flags::ACC_NATIVE))
    {
        return Err(MethodAccessFlagsError::Invalid(flags));
    }

    if name == Some(CONSTRUCTOR_METHOD_NAME)
        && (has(access_flags::ACC_STATIC)
            || has(access_flags::ACC_FINAL)
            || has(access_flags::ACC_SYNCHRONIZED)
            || has(access_flags::ACC_NATIVE)
            || has(access_flags::ACC_ABSTRACT))
    {
        return Err(MethodAccessFlagsError::Invalid(flags));
    }

    Ok(())
}
