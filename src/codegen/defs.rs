//! Generic classfile-specific definitions

/// Header of Java class file (magic number)
pub const MAGIC: u32 = 0xCAFEBABE;

/// Minor version written by default (JDK 1.0.2 compatible class files)
pub const DEFAULT_MINOR_VERSION: u16 = 3;

/// Major version written by default (JDK 1.0.2 compatible class files)
pub const DEFAULT_MAJOR_VERSION: u16 = 45;

/// Name of a constructor
pub const CONSTRUCTOR_METHOD_NAME: &str = "<init>";

/// Name of a static initializer
pub const STATIC_INITIALIZER_METHOD_NAME: &str = "<clinit>";

/// Largest number of constant pool slots a class file can address
pub const MAX_CONSTANT_POOL_SLOTS: usize = 0xFFFF;

/// Largest code array a method may carry
pub const MAX_CODE_LENGTH: usize = 0xFFFF;

/// Floor applied to every Code attribute's max_stack
pub const MIN_MAX_STACK: u16 = 2;

/// JVM version constants
pub mod major_versions {
    pub const JAVA_1_0: u16 = 45;
    pub const JAVA_1_1: u16 = 45;
    pub const JAVA_1_2: u16 = 46;
    pub const JAVA_1_3: u16 = 47;
    pub const JAVA_1_4: u16 = 48;
    pub const JAVA_5_0: u16 = 49;
    pub const JAVA_6_0: u16 = 50;
    pub const JAVA_7: u16 = 51;
    pub const JAVA_8: u16 = 52;
}

/// Access flags for classes, fields, and methods
pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    /// Class flag sharing its bit with ACC_SYNCHRONIZED
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_SYNCHRONIZED: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
}

/// Constant pool tags
pub mod constant_tags {
    pub const CONSTANT_UTF8: u8 = 1;
    pub const CONSTANT_INTEGER: u8 = 3;
    pub const CONSTANT_FLOAT: u8 = 4;
    pub const CONSTANT_LONG: u8 = 5;
    pub const CONSTANT_DOUBLE: u8 = 6;
    pub const CONSTANT_CLASS: u8 = 7;
    pub const CONSTANT_STRING: u8 = 8;
    pub const CONSTANT_FIELDREF: u8 = 9;
    pub const CONSTANT_METHODREF: u8 = 10;
    pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
    pub const CONSTANT_NAMEANDTYPE: u8 = 12;
}

/// Standard attribute names
pub mod attribute_names {
    pub const CODE: &str = "Code";
    pub const EXCEPTIONS: &str = "Exceptions";
    pub const CONSTANT_VALUE: &str = "ConstantValue";
    pub const SOURCE_FILE: &str = "SourceFile";
    pub const LINE_NUMBER_TABLE: &str = "LineNumberTable";
    pub const LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";
}

/// Convert a dotted Java name (`java.lang.Object`) into its internal form (`java/lang/Object`)
pub fn internal_name(name: &str) -> String {
    name.replace('.', "/")
}

/// Convert an internal name back into dotted form
pub fn binary_name(name: &str) -> String {
    name.replace('/', ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_conversions() {
        assert_eq!(internal_name("java.util.EventObject"), "java/util/EventObject");
        assert_eq!(binary_name("java/util/EventObject"), "java.util.EventObject");
        assert_eq!(internal_name("[Ljava.lang.String;"), "[Ljava/lang/String;");
    }

    #[test]
    fn test_shared_flag_bits() {
        assert_eq!(access_flags::ACC_SUPER, access_flags::ACC_SYNCHRONIZED);
        assert_eq!(DEFAULT_MAJOR_VERSION, major_versions::JAVA_1_0);
    }
}
