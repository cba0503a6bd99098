use crate::codegen::attribute::AttributeBody;
use crate::codegen::class::ClassFile;
use crate::codegen::constpool::Constant;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AttributesVerifyError {
    #[error("Duplicate class attribute: {0}")]
    DuplicateClassAttribute(&'static str),
    #[error("Attribute name {0} is not a Utf8 constant")]
    InvalidName(u16),
    #[error("Invalid attribute content: {0}")]
    InvalidContent(&'static str),
}

pub type Result<T> = std::result::Result<T, AttributesVerifyError>;

/// Verify class-level attributes
pub fn verify(class_file: &ClassFile) -> Result<()> {
    let mut has_source_file = false;
    for attribute in &class_file.attributes {
        if class_file.constant_pool.utf8_at(attribute.name_index).is_none() {
            return Err(AttributesVerifyError::InvalidName(attribute.name_index));
        }
        match &attribute.body {
            AttributeBody::SourceFile(index) => {
                if has_source_file {
                    return Err(AttributesVerifyError::DuplicateClassAttribute("SourceFile"));
                }
                has_source_file = true;
                if !matches!(class_file.constant_pool.get(*index), Some(Constant::Utf8(_))) {
                    return Err(AttributesVerifyError::InvalidContent("SourceFile"));
                }
            }
            AttributeBody::Code(_) | AttributeBody::Exceptions(_) | AttributeBody::ConstantValue(_) => {
                return Err(AttributesVerifyError::InvalidContent("member attribute at class level"));
            }
            _ => {}
        }
    }
    Ok(())
}
