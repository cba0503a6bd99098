/// Java bytecode instruction opcodes
///
/// All opcodes are defined according to the Java Virtual Machine Specification.
/// Values are in hexadecimal format and ordered by opcode value.

// 0x00 - 0x0F: Constants and basic operations
pub const NOP: u8 = 0x00;
pub const ACONST_NULL: u8 = 0x01;
pub const ICONST_M1: u8 = 0x02;
pub const ICONST_0: u8 = 0x03;
pub const ICONST_1: u8 = 0x04;
pub const ICONST_2: u8 = 0x05;
pub const ICONST_3: u8 = 0x06;
pub const ICONST_4: u8 = 0x07;
pub const ICONST_5: u8 = 0x08;
pub const LCONST_0: u8 = 0x09;
pub const LCONST_1: u8 = 0x0a;
pub const FCONST_0: u8 = 0x0b;
pub const FCONST_1: u8 = 0x0c;
pub const FCONST_2: u8 = 0x0d;
pub const DCONST_0: u8 = 0x0e;
pub const DCONST_1: u8 = 0x0f;

// 0x10 - 0x14: Immediate pushes and constant loads
pub const BIPUSH: u8 = 0x10;
pub const SIPUSH: u8 = 0x11;
pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const LDC2_W: u8 = 0x14;

// 0x15 - 0x2D: Loads
pub const ILOAD: u8 = 0x15;
pub const LLOAD: u8 = 0x16;
pub const FLOAD: u8 = 0x17;
pub const DLOAD: u8 = 0x18;
pub const ALOAD: u8 = 0x19;
pub const ILOAD_0: u8 = 0x1a;
pub const ILOAD_1: u8 = 0x1b;
pub const ILOAD_2: u8 = 0x1c;
pub const ILOAD_3: u8 = 0x1d;
pub const LLOAD_0: u8 = 0x1e;
pub const LLOAD_1: u8 = 0x1f;
pub const LLOAD_2: u8 = 0x20;
pub const LLOAD_3: u8 = 0x21;
pub const FLOAD_0: u8 = 0x22;
pub const FLOAD_1: u8 = 0x23;
pub const FLOAD_2: u8 = 0x24;
pub const FLOAD_3: u8 = 0x25;
pub const DLOAD_0: u8 = 0x26;
pub const DLOAD_1: u8 = 0x27;
pub const DLOAD_2: u8 = 0x28;
pub const DLOAD_3: u8 = 0x29;
pub const ALOAD_0: u8 = 0x2a;
pub const ALOAD_1: u8 = 0x2b;
pub const ALOAD_2: u8 = 0x2c;
pub const ALOAD_3: u8 = 0x2d;

// 0x2E - 0x35: Array loads
pub const IALOAD: u8 = 0x2e;
pub const LALOAD: u8 = 0x2f;
pub const FALOAD: u8 = 0x30;
pub const DALOAD: u8 = 0x31;
pub const AALOAD: u8 = 0x32;
pub const BALOAD: u8 = 0x33;
pub const CALOAD: u8 = 0x34;
pub const SALOAD: u8 = 0x35;

// 0x36 - 0x4E: Stores
pub const ISTORE: u8 = 0x36;
pub const LSTORE: u8 = 0x37;
pub const FSTORE: u8 = 0x38;
pub const DSTORE: u8 = 0x39;
pub const ASTORE: u8 = 0x3a;
pub const ISTORE_0: u8 = 0x3b;
pub const ISTORE_1: u8 = 0x3c;
pub const ISTORE_2: u8 = 0x3d;
pub const ISTORE_3: u8 = 0x3e;
pub const LSTORE_0: u8 = 0x3f;
pub const LSTORE_1: u8 = 0x40;
pub const LSTORE_2: u8 = 0x41;
pub const LSTORE_3: u8 = 0x42;
pub const FSTORE_0: u8 = 0x43;
pub const FSTORE_1: u8 = 0x44;
pub const FSTORE_2: u8 = 0x45;
pub const FSTORE_3: u8 = 0x46;
pub const DSTORE_0: u8 = 0x47;
pub const DSTORE_1: u8 = 0x48;
pub const DSTORE_2: u8 = 0x49;
pub const DSTORE_3: u8 = 0x4a;
pub const ASTORE_0: u8 = 0x4b;
pub const ASTORE_1: u8 = 0x4c;
pub const ASTORE_2: u8 = 0x4d;
pub const ASTORE_3: u8 = 0x4e;

// 0x4F - 0x56: Array stores
pub const IASTORE: u8 = 0x4f;
pub const LASTORE: u8 = 0x50;
pub const FASTORE: u8 = 0x51;
pub const DASTORE: u8 = 0x52;
pub const AASTORE: u8 = 0x53;
pub const BASTORE: u8 = 0x54;
pub const CASTORE: u8 = 0x55;
pub const SASTORE: u8 = 0x56;

// 0x57 - 0x5F: Stack operations
pub const POP: u8 = 0x57;
pub const POP2: u8 = 0x58;
pub const DUP: u8 = 0x59;
pub const DUP_X1: u8 = 0x5a;
pub const DUP_X2: u8 = 0x5b;
pub const DUP2: u8 = 0x5c;
pub const DUP2_X1: u8 = 0x5d;
pub const DUP2_X2: u8 = 0x5e;
pub const SWAP: u8 = 0x5f;

// 0x60 - 0x77: Arithmetic
pub const IADD: u8 = 0x60;
pub const LADD: u8 = 0x61;
pub const FADD: u8 = 0x62;
pub const DADD: u8 = 0x63;
pub const ISUB: u8 = 0x64;
pub const LSUB: u8 = 0x65;
pub const FSUB: u8 = 0x66;
pub const DSUB: u8 = 0x67;
pub const IMUL: u8 = 0x68;
pub const LMUL: u8 = 0x69;
pub const FMUL: u8 = 0x6a;
pub const DMUL: u8 = 0x6b;
pub const IDIV: u8 = 0x6c;
pub const LDIV: u8 = 0x6d;
pub const FDIV: u8 = 0x6e;
pub const DDIV: u8 = 0x6f;
pub const IREM: u8 = 0x70;
pub const LREM: u8 = 0x71;
pub const FREM: u8 = 0x72;
pub const DREM: u8 = 0x73;
pub const INEG: u8 = 0x74;
pub const LNEG: u8 = 0x75;
pub const FNEG: u8 = 0x76;
pub const DNEG: u8 = 0x77;

// 0x78 - 0x83: Shifts and bitwise logic
pub const ISHL: u8 = 0x78;
pub const LSHL: u8 = 0x79;
pub const ISHR: u8 = 0x7a;
pub const LSHR: u8 = 0x7b;
pub const IUSHR: u8 = 0x7c;
pub const LUSHR: u8 = 0x7d;
pub const IAND: u8 = 0x7e;
pub const LAND: u8 = 0x7f;
pub const IOR: u8 = 0x80;
pub const LOR: u8 = 0x81;
pub const IXOR: u8 = 0x82;
pub const LXOR: u8 = 0x83;

// 0x84: Increment
pub const IINC: u8 = 0x84;

// 0x85 - 0x93: Conversions
pub const I2L: u8 = 0x85;
pub const I2F: u8 = 0x86;
pub const I2D: u8 = 0x87;
pub const L2I: u8 = 0x88;
pub const L2F: u8 = 0x89;
pub const L2D: u8 = 0x8a;
pub const F2I: u8 = 0x8b;
pub const F2L: u8 = 0x8c;
pub const F2D: u8 = 0x8d;
pub const D2I: u8 = 0x8e;
pub const D2L: u8 = 0x8f;
pub const D2F: u8 = 0x90;
pub const I2B: u8 = 0x91;
pub const I2C: u8 = 0x92;
pub const I2S: u8 = 0x93;

// 0x94 - 0x98: Comparisons
pub const LCMP: u8 = 0x94;
pub const FCMPL: u8 = 0x95;
pub const FCMPG: u8 = 0x96;
pub const DCMPL: u8 = 0x97;
pub const DCMPG: u8 = 0x98;

// 0x99 - 0xB1: Control flow
pub const IFEQ: u8 = 0x99;
pub const IFNE: u8 = 0x9a;
pub const IFLT: u8 = 0x9b;
pub const IFGE: u8 = 0x9c;
pub const IFGT: u8 = 0x9d;
pub const IFLE: u8 = 0x9e;
pub const IF_ICMPEQ: u8 = 0x9f;
pub const IF_ICMPNE: u8 = 0xa0;
pub const IF_ICMPLT: u8 = 0xa1;
pub const IF_ICMPGE: u8 = 0xa2;
pub const IF_ICMPGT: u8 = 0xa3;
pub const IF_ICMPLE: u8 = 0xa4;
pub const IF_ACMPEQ: u8 = 0xa5;
pub const IF_ACMPNE: u8 = 0xa6;
pub const GOTO: u8 = 0xa7;
pub const JSR: u8 = 0xa8;
pub const RET: u8 = 0xa9;
pub const TABLESWITCH: u8 = 0xaa;
pub const LOOKUPSWITCH: u8 = 0xab;
pub const IRETURN: u8 = 0xac;
pub const LRETURN: u8 = 0xad;
pub const FRETURN: u8 = 0xae;
pub const DRETURN: u8 = 0xaf;
pub const ARETURN: u8 = 0xb0;
pub const RETURN: u8 = 0xb1;

// 0xB2 - 0xC3: References and object operations
pub const GETSTATIC: u8 = 0xb2;
pub const PUTSTATIC: u8 = 0xb3;
pub const GETFIELD: u8 = 0xb4;
pub const PUTFIELD: u8 = 0xb5;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const NEW: u8 = 0xbb;
pub const NEWARRAY: u8 = 0xbc;
pub const ANEWARRAY: u8 = 0xbd;
pub const ARRAYLENGTH: u8 = 0xbe;
pub const ATHROW: u8 = 0xbf;
pub const CHECKCAST: u8 = 0xc0;
pub const INSTANCEOF: u8 = 0xc1;
pub const MONITORENTER: u8 = 0xc2;
pub const MONITOREXIT: u8 = 0xc3;

// 0xC4 - 0xC9: Extended instructions
pub const WIDE: u8 = 0xc4;
pub const MULTIANEWARRAY: u8 = 0xc5;
pub const IFNULL: u8 = 0xc6;
pub const IFNONNULL: u8 = 0xc7;
pub const GOTO_W: u8 = 0xc8;
pub const JSR_W: u8 = 0xc9;

/// `newarray` element type codes
pub mod array_types {
    pub const T_BOOLEAN: u8 = 4;
    pub const T_CHAR: u8 = 5;
    pub const T_FLOAT: u8 = 6;
    pub const T_DOUBLE: u8 = 7;
    pub const T_BYTE: u8 = 8;
    pub const T_SHORT: u8 = 9;
    pub const T_INT: u8 = 10;
    pub const T_LONG: u8 = 11;
}

/// Static description of one instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    /// Bytes following the opcode, `None` for variable-length forms
    pub operand_bytes: Option<u8>,
    /// Net operand-stack change in words, `None` when it depends on a descriptor
    pub stack_delta: Option<i8>,
}

const fn op(mnemonic: &'static str, operand_bytes: u8, stack_delta: i8) -> OpcodeInfo {
    OpcodeInfo { mnemonic, operand_bytes: Some(operand_bytes), stack_delta: Some(stack_delta) }
}

const fn op_dynamic(mnemonic: &'static str, operand_bytes: u8) -> OpcodeInfo {
    OpcodeInfo { mnemonic, operand_bytes: Some(operand_bytes), stack_delta: None }
}

const fn op_variable(mnemonic: &'static str, stack_delta: Option<i8>) -> OpcodeInfo {
    OpcodeInfo { mnemonic, operand_bytes: None, stack_delta }
}

static OPCODE_TABLE: [OpcodeInfo; 0xca] = [
    op("nop", 0, 0), op("aconst_null", 0, 1), op("iconst_m1", 0, 1), op("iconst_0", 0, 1),
    op("iconst_1", 0, 1), op("iconst_2", 0, 1), op("iconst_3", 0, 1), op("iconst_4", 0, 1),
    op("iconst_5", 0, 1), op("lconst_0", 0, 2), op("lconst_1", 0, 2), op("fconst_0", 0, 1),
    op("fconst_1", 0, 1), op("fconst_2", 0, 1), op("dconst_0", 0, 2), op("dconst_1", 0, 2),
    // 0x10
    op("bipush", 1, 1), op("sipush", 2, 1), op("ldc", 1, 1), op("ldc_w", 2, 1),
    op("ldc2_w", 2, 2), op("iload", 1, 1), op("lload", 1, 2), op("fload", 1, 1),
    op("dload", 1, 2), op("aload", 1, 1), op("iload_0", 0, 1), op("iload_1", 0, 1),
    op("iload_2", 0, 1), op("iload_3", 0, 1), op("lload_0", 0, 2), op("lload_1", 0, 2),
    // 0x20
    op("lload_2", 0, 2), op("lload_3", 0, 2), op("fload_0", 0, 1), op("fload_1", 0, 1),
    op("fload_2", 0, 1), op("fload_3", 0, 1), op("dload_0", 0, 2), op("dload_1", 0, 2),
    op("dload_2", 0, 2), op("dload_3", 0, 2), op("aload_0", 0, 1), op("aload_1", 0, 1),
    op("aload_2", 0, 1), op("aload_3", 0, 1), op("iaload", 0, -1), op("laload", 0, 0),
    // 0x30
    op("faload", 0, -1), op("daload", 0, 0), op("aaload", 0, -1), op("baload", 0, -1),
    op("caload", 0, -1), op("saload", 0, -1), op("istore", 1, -1), op("lstore", 1, -2),
    op("fstore", 1, -1), op("dstore", 1, -2), op("astore", 1, -1), op("istore_0", 0, -1),
    op("istore_1", 0, -1), op("istore_2", 0, -1), op("istore_3", 0, -1), op("lstore_0", 0, -2),
    // 0x40
    op("lstore_1", 0, -2), op("lstore_2", 0, -2), op("lstore_3", 0, -2), op("fstore_0", 0, -1),
    op("fstore_1", 0, -1), op("fstore_2", 0, -1), op("fstore_3", 0, -1), op("dstore_0", 0, -2),
    op("dstore_1", 0, -2), op("dstore_2", 0, -2), op("dstore_3", 0, -2), op("astore_0", 0, -1),
    op("astore_1", 0, -1), op("astore_2", 0, -1), op("astore_3", 0, -1), op("iastore", 0, -3),
    // 0x50
    op("lastore", 0, -4), op("fastore", 0, -3), op("dastore", 0, -4), op("aastore", 0, -3),
    op("bastore", 0, -3), op("castore", 0, -3), op("sastore", 0, -3), op("pop", 0, -1),
    op("pop2", 0, -2), op("dup", 0, 1), op("dup_x1", 0, 1), op("dup_x2", 0, 1),
    op("dup2", 0, 2), op("dup2_x1", 0, 2), op("dup2_x2", 0, 2), op("swap", 0, 0),
    // 0x60
    op("iadd", 0, -1), op("ladd", 0, -2), op("fadd", 0, -1), op("dadd", 0, -2),
    op("isub", 0, -1), op("lsub", 0, -2), op("fsub", 0, -1), op("dsub", 0, -2),
    op("imul", 0, -1), op("lmul", 0, -2), op("fmul", 0, -1), op("dmul", 0, -2),
    op("idiv", 0, -1), op("ldiv", 0, -2), op("fdiv", 0, -1), op("ddiv", 0, -2),
    // 0x70
    op("irem", 0, -1), op("lrem", 0, -2), op("frem", 0, -1), op("drem", 0, -2),
    op("ineg", 0, 0), op("lneg", 0, 0), op("fneg", 0, 0), op("dneg", 0, 0),
    op("ishl", 0, -1), op("lshl", 0, -1), op("ishr", 0, -1), op("lshr", 0, -1),
    op("iushr", 0, -1), op("lushr", 0, -1), op("iand", 0, -1), op("land", 0, -2),
    // 0x80
    op("ior", 0, -1), op("lor", 0, -2), op("ixor", 0, -1), op("lxor", 0, -2),
    op("iinc", 2, 0), op("i2l", 0, 1), op("i2f", 0, 0), op("i2d", 0, 1),
    op("l2i", 0, -1), op("l2f", 0, -1), op("l2d", 0, 0), op("f2i", 0, 0),
    op("f2l", 0, 1), op("f2d", 0, 1), op("d2i", 0, -1), op("d2l", 0, 0),
    // 0x90
    op("d2f", 0, -1), op("i2b", 0, 0), op("i2c", 0, 0), op("i2s", 0, 0),
    op("lcmp", 0, -3), op("fcmpl", 0, -1), op("fcmpg", 0, -1), op("dcmpl", 0, -3),
    op("dcmpg", 0, -3), op("ifeq", 2, -1), op("ifne", 2, -1), op("iflt", 2, -1),
    op("ifge", 2, -1), op("ifgt", 2, -1), op("ifle", 2, -1), op("if_icmpeq", 2, -2),
    // 0xA0
    op("if_icmpne", 2, -2), op("if_icmplt", 2, -2), op("if_icmpge", 2, -2), op("if_icmpgt", 2, -2),
    op("if_icmple", 2, -2), op("if_acmpeq", 2, -2), op("if_acmpne", 2, -2), op("goto", 2, 0),
    op("jsr", 2, 1), op("ret", 1, 0), op_variable("tableswitch", Some(-1)), op_variable("lookupswitch", Some(-1)),
    op("ireturn", 0, -1), op("lreturn", 0, -2), op("freturn", 0, -1), op("dreturn", 0, -2),
    // 0xB0
    op("areturn", 0, -1), op("return", 0, 0), op_dynamic("getstatic", 2), op_dynamic("putstatic", 2),
    op_dynamic("getfield", 2), op_dynamic("putfield", 2), op_dynamic("invokevirtual", 2), op_dynamic("invokespecial", 2),
    op_dynamic("invokestatic", 2), op_dynamic("invokeinterface", 4), op_dynamic("invokedynamic", 4), op("new", 2, 1),
    op("newarray", 1, 0), op("anewarray", 2, 0), op("arraylength", 0, 0), op("athrow", 0, -1),
    // 0xC0
    op("checkcast", 2, 0), op("instanceof", 2, 0), op("monitorenter", 0, -1), op("monitorexit", 0, -1),
    op_variable("wide", None), op_dynamic("multianewarray", 3), op("ifnull", 2, -1), op("ifnonnull", 2, -1),
    op("goto_w", 4, 0), op("jsr_w", 4, 1),
];

/// Look up the static description of an opcode
pub fn info(opcode: u8) -> Option<&'static OpcodeInfo> {
    OPCODE_TABLE.get(opcode as usize)
}

/// Helper function to check if an opcode is valid
pub fn is_valid_opcode(opcode: u8) -> bool {
    (opcode as usize) < OPCODE_TABLE.len()
}

/// Helper function to get opcode name as string
pub fn opcode_name(opcode: u8) -> &'static str {
    info(opcode).map(|i| i.mnemonic).unwrap_or("<invalid>")
}

/// Number of operand bytes following a fixed-width opcode
pub fn operand_count(opcode: u8) -> Option<usize> {
    info(opcode).and_then(|i| i.operand_bytes).map(usize::from)
}

/// Whether the opcode ends the current basic block unconditionally
pub fn is_terminal(opcode: u8) -> bool {
    matches!(
        opcode,
        IRETURN | LRETURN | FRETURN | DRETURN | ARETURN | RETURN | ATHROW | GOTO | GOTO_W | RET
    )
}

/// Whether the opcode carries a 16-bit relative branch offset
pub fn is_branch16(opcode: u8) -> bool {
    matches!(opcode, IFEQ..=JSR | IFNULL | IFNONNULL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_opcode() {
        assert_eq!(opcode_name(NOP), "nop");
        assert_eq!(opcode_name(LDC_W), "ldc_w");
        assert_eq!(opcode_name(I2B), "i2b");
        assert_eq!(opcode_name(INVOKEVIRTUAL), "invokevirtual");
        assert_eq!(opcode_name(AASTORE), "aastore");
        assert_eq!(opcode_name(JSR_W), "jsr_w");
        assert_eq!(opcode_name(0xfe), "<invalid>");
    }

    #[test]
    fn test_operand_widths() {
        assert_eq!(operand_count(LDC), Some(1));
        assert_eq!(operand_count(LDC_W), Some(2));
        assert_eq!(operand_count(INVOKEINTERFACE), Some(4));
        assert_eq!(operand_count(MULTIANEWARRAY), Some(3));
        assert_eq!(operand_count(TABLESWITCH), None);
        assert_eq!(operand_count(RETURN), Some(0));
    }

    #[test]
    fn test_stack_deltas() {
        assert_eq!(info(DUP).and_then(|i| i.stack_delta), Some(1));
        assert_eq!(info(AASTORE).and_then(|i| i.stack_delta), Some(-3));
        assert_eq!(info(LLOAD_1).and_then(|i| i.stack_delta), Some(2));
        assert_eq!(info(INVOKESPECIAL).and_then(|i| i.stack_delta), None);
    }

    #[test]
    fn test_branch_classification() {
        assert!(is_branch16(IFEQ));
        assert!(is_branch16(GOTO));
        assert!(is_branch16(IFNONNULL));
        assert!(!is_branch16(GOTO_W));
        assert!(is_terminal(ATHROW));
        assert!(!is_terminal(INVOKESTATIC));
    }
}
