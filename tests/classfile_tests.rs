//! Hand-built classes through the writer, the verifier and the reader

use fesi::codegen::attribute::{LineNumberTableAttribute, NamedAttribute};
use fesi::codegen::defs::access_flags::{ACC_PUBLIC, ACC_STATIC, ACC_SUPER};
use fesi::codegen::{inspect, opcodes, ClassFile, CodeBuilder, Constant, ConstantPool, JavaType, MethodDescriptor};
use fesi::verify;

fn hello_class() -> ClassFile {
    let mut class = ClassFile::new_class("demo/Hello", "java/lang/Object", ACC_PUBLIC | ACC_SUPER).unwrap();

    let descriptor = MethodDescriptor::parse("(JI)J").unwrap();
    let mut code = CodeBuilder::for_method(true, &descriptor);
    let cp = &mut class.constant_pool;
    code.load_local(&JavaType::Long, 0).unwrap();
    code.load_local(&JavaType::Int, 2).unwrap();
    code.emit(opcodes::I2L).unwrap();
    code.emit(opcodes::LADD).unwrap();
    code.load_constant(cp, Constant::Long(1 << 40)).unwrap();
    code.emit(opcodes::LADD).unwrap();
    code.emit_return(&JavaType::Long).unwrap();
    let mut lines = LineNumberTableAttribute::new();
    lines.add_line_number(0, 3);
    code.add_attribute(NamedAttribute::line_number_table(cp, lines).unwrap());
    let body = code.finish().unwrap();
    class.add_method(ACC_PUBLIC | ACC_STATIC, "add", &descriptor.to_string(), Some(body)).unwrap();
    class
}

#[test]
fn test_round_trip_through_inspect() {
    let class = hello_class();
    verify::verify(&class).unwrap();
    let bytes = class.to_bytes().unwrap();
    assert_eq!(&bytes[..4], &[0xCA, 0xFE, 0xBA, 0xBE]);

    let summary = inspect(&bytes).unwrap();
    assert_eq!(summary.this_class, "demo/Hello");
    assert_eq!(summary.super_class.as_deref(), Some("java/lang/Object"));
    assert_eq!(summary.constant_pool_count, class.constant_pool.count());

    let add = summary.method("add").unwrap();
    assert_eq!(add.descriptor, "(JI)J");
    let code = add.code.as_ref().unwrap();
    assert_eq!(code.max_locals, 3);
    assert_eq!(code.max_stack, 4);
    assert_eq!(
        code.opcodes(),
        vec![opcodes::LLOAD_0, opcodes::ILOAD_2, opcodes::I2L, opcodes::LADD, opcodes::LDC2_W, opcodes::LADD, opcodes::LRETURN]
    );
    assert_eq!(code.attribute_names, vec!["LineNumberTable".to_string()]);
}

#[test]
fn test_code_length_is_exact() {
    let class = hello_class();
    let bytes = class.to_bytes().unwrap();
    let summary = inspect(&bytes).unwrap();
    let code = summary.method("add").unwrap().code.as_ref().unwrap();
    // header + code + no handlers + LineNumberTable(6 + 2 + 4)
    assert_eq!(code.attribute_length, 12 + code.code.len() as u32 + 12);
}

#[test]
fn test_wide_constants_shift_indices() {
    let mut cp = ConstantPool::new();
    let first = cp.add_long(5).unwrap();
    let second = cp.add_double(0.5).unwrap();
    let third = cp.add_utf8("after").unwrap();
    assert_eq!((first, second, third), (1, 3, 5));
    assert_eq!(cp.count(), 6);
    assert_eq!(cp.add_long(5).unwrap(), 1);
    assert!(cp.get(2).is_none());
}

#[test]
fn test_ldc_form_tracks_pool_growth() {
    let mut class = ClassFile::new_class("demo/Many", "java/lang/Object", ACC_PUBLIC | ACC_SUPER).unwrap();
    let cp = &mut class.constant_pool;
    let mut code = CodeBuilder::new(0);
    code.load_string(cp, "early").unwrap();
    code.emit(opcodes::POP).unwrap();
    while cp.len() < 300 {
        let n = cp.len();
        cp.add_utf8(&format!("filler{}", n)).unwrap();
    }
    code.load_string(cp, "late").unwrap();
    code.emit(opcodes::POP).unwrap();
    code.load_string(cp, "early").unwrap();
    code.emit(opcodes::POP).unwrap();
    code.emit(opcodes::RETURN).unwrap();
    let ops = code.finish().unwrap();
    let summary_ops: Vec<u8> = {
        let mut out = Vec::new();
        let mut pc = 0;
        while pc < ops.code.len() {
            out.push(ops.code[pc]);
            pc += match ops.code[pc] {
                opcodes::LDC => 2,
                opcodes::LDC_W => 3,
                _ => 1,
            };
        }
        out
    };
    assert_eq!(
        summary_ops,
        vec![opcodes::LDC, opcodes::POP, opcodes::LDC_W, opcodes::POP, opcodes::LDC, opcodes::POP, opcodes::RETURN]
    );
    assert_eq!(ops.max_stack, 2);
}

#[test]
fn test_cloned_class_serializes_identically() {
    let class = hello_class();
    let copy = class.clone();
    assert!(copy == class);
    assert_eq!(copy.to_bytes().unwrap(), class.to_bytes().unwrap());
}
