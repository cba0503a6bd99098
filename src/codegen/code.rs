//! Bytecode buffer for a single method body
//!
//! `CodeBuilder` accumulates the instruction stream, tracks the program
//! counter, the operand-stack depth and the local-variable bound, and keeps a
//! running count of the Code attribute length so it always equals the number
//! of bytes that will be serialized.

use super::attribute::{CodeAttribute, ExceptionTableEntry, NamedAttribute, CODE_HEADER_LENGTH, EXCEPTION_ENTRY_LENGTH};
use super::constpool::{Constant, ConstantPool};
use super::defs::{MAX_CODE_LENGTH, MIN_MAX_STACK};
use super::descriptor::{JavaType, MethodDescriptor};
use super::error::{BytecodeError, BytecodeResult, CodeGenResult};
use super::opcodes;

#[derive(Debug, Clone)]
pub struct CodeBuilder {
    code: Vec<u8>,
    /// Current operand stack depth in words
    stacksize: i32,
    max_stack: u16,
    max_locals: u16,
    exception_table: Vec<ExceptionTableEntry>,
    attributes: Vec<NamedAttribute>,
    /// Running Code attribute payload length
    length: u32,
}

impl Default for CodeBuilder {
    fn default() -> Self {
        Self::new(0)
    }
}

impl CodeBuilder {
    pub fn new(max_locals: u16) -> Self {
        Self {
            code: Vec::new(),
            stacksize: 0,
            max_stack: 0,
            max_locals,
            exception_table: Vec::new(),
            attributes: Vec::new(),
            length: CODE_HEADER_LENGTH as u32,
        }
    }

    /// Builder whose locals already cover `this` (unless static) and every argument
    pub fn for_method(is_static: bool, descriptor: &MethodDescriptor) -> Self {
        let this_words = if is_static { 0 } else { 1 };
        Self::new(this_words + descriptor.arg_words())
    }

    // ============================================================================
    // STATE
    // ============================================================================

    /// Current program counter
    pub fn pc(&self) -> u16 {
        self.code.len() as u16
    }

    /// Tracked Code attribute payload length
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn stack_depth(&self) -> u16 {
        self.stacksize.max(0) as u16
    }

    /// Maximum stack depth with the floor of two words applied
    pub fn max_stack(&self) -> u16 {
        self.max_stack.max(MIN_MAX_STACK)
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    pub fn exception_table(&self) -> &[ExceptionTableEntry] {
        &self.exception_table
    }

    /// Make sure locals cover `slot` plus the width of `ty`
    pub fn reserve_local(&mut self, slot: u16, ty: &JavaType) {
        let top = slot.saturating_add(ty.word_size().max(1));
        self.max_locals = self.max_locals.max(top);
    }

    fn adjust_stack(&mut self, delta: i32) {
        self.stacksize = (self.stacksize + delta).max(0);
        let depth = self.stacksize.min(u16::MAX as i32) as u16;
        self.max_stack = self.max_stack.max(depth);
    }

    /// Entry of an exception handler: the thrown object is the only stack item
    pub fn enter_handler(&mut self) {
        self.stacksize = 0;
        self.adjust_stack(1);
    }

    // ============================================================================
    // BASIC BYTECODE EMISSION
    // ============================================================================

    /// Emit one byte of code
    pub fn emit1(&mut self, od: u8) {
        self.code.push(od);
        self.length += 1;
    }

    /// Emit two bytes of code
    pub fn emit2(&mut self, od: u16) {
        self.emit1((od >> 8) as u8);
        self.emit1(od as u8);
    }

    /// Emit four bytes of code
    pub fn emit4(&mut self, od: u32) {
        self.emit2((od >> 16) as u16);
        self.emit2(od as u16);
    }

    /// Overwrite two bytes at `pc`
    pub fn put2(&mut self, pc: u16, od: u16) {
        let pc = pc as usize;
        if pc + 1 < self.code.len() {
            self.code[pc] = (od >> 8) as u8;
            self.code[pc + 1] = od as u8;
        }
    }

    // ============================================================================
    // INSTRUCTION EMISSION
    // ============================================================================

    /// Emit an opcode that takes no operands
    pub fn emit(&mut self, op: u8) -> BytecodeResult<()> {
        self.emit_with_operands(op, &[])
    }

    /// Emit an opcode followed by its raw operand bytes
    ///
    /// The operand width must match the opcode's fixed width. The stack is
    /// adjusted by the opcode's static effect; descriptor-dependent opcodes
    /// should go through the typed helpers instead.
    pub fn emit_with_operands(&mut self, op: u8, operands: &[u8]) -> BytecodeResult<()> {
        let info = opcodes::info(op).ok_or(BytecodeError::InvalidOpcode { opcode: op })?;
        let expected = info.operand_bytes.ok_or(BytecodeError::InvalidOpcode { opcode: op })? as usize;
        if operands.len() != expected {
            return Err(BytecodeError::OperandWidth { opcode: op, expected, found: operands.len() });
        }
        self.emitop(op);
        for &b in operands {
            self.emit1(b);
        }
        if let Some(delta) = info.stack_delta {
            self.adjust_stack(delta as i32);
        }
        if opcodes::is_terminal(op) {
            self.stacksize = 0;
        }
        self.check_length()
    }

    fn emitop(&mut self, op: u8) {
        self.emit1(op);
    }

    pub fn emitop1(&mut self, op: u8, od: u8) -> BytecodeResult<()> {
        self.emit_with_operands(op, &[od])
    }

    pub fn emitop2(&mut self, op: u8, od: u16) -> BytecodeResult<()> {
        self.emit_with_operands(op, &od.to_be_bytes())
    }

    pub fn emitop4(&mut self, op: u8, od: u32) -> BytecodeResult<()> {
        self.emit_with_operands(op, &od.to_be_bytes())
    }

    /// Emit a local-variable instruction, switching to the WIDE form above slot 255
    pub fn emitop1w(&mut self, op: u8, od: u16) -> BytecodeResult<()> {
        if od > 0xFF {
            self.emitop(opcodes::WIDE);
            self.emitop(op);
            self.emit2(od);
            if let Some(delta) = opcodes::info(op).and_then(|i| i.stack_delta) {
                self.adjust_stack(delta as i32);
            }
            self.check_length()
        } else {
            self.emitop1(op, od as u8)
        }
    }

    fn check_length(&self) -> BytecodeResult<()> {
        if self.code.len() > MAX_CODE_LENGTH {
            return Err(BytecodeError::CodeTooLong { length: self.code.len() });
        }
        Ok(())
    }

    // ============================================================================
    // CONSTANTS
    // ============================================================================

    /// Load a one-word constant by pool index; `LDC_W` once the index no longer fits a byte
    pub fn emit_ldc(&mut self, index: u16) -> BytecodeResult<()> {
        if index > 0xFF {
            self.emitop2(opcodes::LDC_W, index)
        } else {
            self.emitop1(opcodes::LDC, index as u8)
        }
    }

    /// Load a long or double constant by pool index
    pub fn emit_ldc2(&mut self, index: u16) -> BytecodeResult<()> {
        self.emitop2(opcodes::LDC2_W, index)
    }

    /// Intern `constant` and load it, choosing the instruction form from the
    /// index it resolves to at this call
    pub fn load_constant(&mut self, constant_pool: &mut ConstantPool, constant: Constant) -> CodeGenResult<()> {
        let wide = constant.slot_width() == 2;
        let index = constant_pool.intern(constant)?;
        if wide {
            self.emit_ldc2(index)?;
        } else {
            self.emit_ldc(index)?;
        }
        Ok(())
    }

    pub fn load_string(&mut self, constant_pool: &mut ConstantPool, value: &str) -> CodeGenResult<()> {
        let index = constant_pool.add_string(value)?;
        self.emit_ldc(index)?;
        Ok(())
    }

    /// Push an int using the shortest encoding
    pub fn push_int(&mut self, constant_pool: &mut ConstantPool, value: i32) -> CodeGenResult<()> {
        match value {
            -1..=5 => self.emit((opcodes::ICONST_0 as i32 + value) as u8)?,
            -128..=127 => self.emitop1(opcodes::BIPUSH, value as i8 as u8)?,
            -32768..=32767 => self.emitop2(opcodes::SIPUSH, value as i16 as u16)?,
            _ => self.load_constant(constant_pool, Constant::Integer(value))?,
        }
        Ok(())
    }

    // ============================================================================
    // LOCALS
    // ============================================================================

    /// Load local `slot` of type `ty`
    pub fn load_local(&mut self, ty: &JavaType, slot: u16) -> BytecodeResult<()> {
        let (long_form, short_base) = match ty {
            JavaType::Boolean | JavaType::Byte | JavaType::Char | JavaType::Short | JavaType::Int => {
                (opcodes::ILOAD, opcodes::ILOAD_0)
            }
            JavaType::Long => (opcodes::LLOAD, opcodes::LLOAD_0),
            JavaType::Float => (opcodes::FLOAD, opcodes::FLOAD_0),
            JavaType::Double => (opcodes::DLOAD, opcodes::DLOAD_0),
            JavaType::Object(_) | JavaType::Array(_) => (opcodes::ALOAD, opcodes::ALOAD_0),
            JavaType::Void => return Err(BytecodeError::InvalidOpcode { opcode: opcodes::ILOAD }),
        };
        self.reserve_local(slot, ty);
        self.local_op(long_form, short_base, slot)
    }

    /// Store the top of stack into local `slot`
    pub fn store_local(&mut self, ty: &JavaType, slot: u16) -> BytecodeResult<()> {
        let (long_form, short_base) = match ty {
            JavaType::Boolean | JavaType::Byte | JavaType::Char | JavaType::Short | JavaType::Int => {
                (opcodes::ISTORE, opcodes::ISTORE_0)
            }
            JavaType::Long => (opcodes::LSTORE, opcodes::LSTORE_0),
            JavaType::Float => (opcodes::FSTORE, opcodes::FSTORE_0),
            JavaType::Double => (opcodes::DSTORE, opcodes::DSTORE_0),
            JavaType::Object(_) | JavaType::Array(_) => (opcodes::ASTORE, opcodes::ASTORE_0),
            JavaType::Void => return Err(BytecodeError::InvalidOpcode { opcode: opcodes::ISTORE }),
        };
        self.reserve_local(slot, ty);
        self.local_op(long_form, short_base, slot)
    }

    fn local_op(&mut self, long_form: u8, short_base: u8, slot: u16) -> BytecodeResult<()> {
        if slot == u16::MAX {
            return Err(BytecodeError::LocalIndexOutOfBounds { index: slot as u32 });
        }
        if slot <= 3 {
            self.emit(short_base + slot as u8)
        } else {
            self.emitop1w(long_form, slot)
        }
    }

    // ============================================================================
    // BRANCHES
    // ============================================================================

    /// Emit a 16-bit branch to an already known `target`
    pub fn emit_branch16(&mut self, op: u8, target: u16) -> BytecodeResult<()> {
        if !opcodes::is_branch16(op) {
            return Err(BytecodeError::InvalidOpcode { opcode: op });
        }
        let offset = target as i32 - self.pc() as i32;
        if offset < i16::MIN as i32 || offset > i16::MAX as i32 {
            return Err(BytecodeError::BranchTooFar { offset });
        }
        self.emitop2(op, offset as i16 as u16)
    }

    /// Emit a forward branch with a placeholder offset, returning its pc for `resolve`
    pub fn emit_jump(&mut self, op: u8) -> BytecodeResult<u16> {
        let pc = self.pc();
        self.emit_branch16(op, pc)?;
        Ok(pc)
    }

    /// Point the branch at `jump_pc` to the current pc
    pub fn resolve(&mut self, jump_pc: u16) -> BytecodeResult<()> {
        let offset = self.pc() as i32 - jump_pc as i32;
        if offset > i16::MAX as i32 {
            return Err(BytecodeError::BranchTooFar { offset });
        }
        self.put2(jump_pc + 1, offset as u16);
        Ok(())
    }

    // ============================================================================
    // FIELDS, INVOCATION AND OBJECTS
    // ============================================================================

    pub fn emit_getstatic(&mut self, field_index: u16, field_size: u16) -> BytecodeResult<()> {
        self.emit_ref(opcodes::GETSTATIC, field_index, field_size as i32)
    }

    pub fn emit_putstatic(&mut self, field_index: u16, field_size: u16) -> BytecodeResult<()> {
        self.emit_ref(opcodes::PUTSTATIC, field_index, -(field_size as i32))
    }

    pub fn emit_getfield(&mut self, field_index: u16, field_size: u16) -> BytecodeResult<()> {
        self.emit_ref(opcodes::GETFIELD, field_index, field_size as i32 - 1)
    }

    pub fn emit_putfield(&mut self, field_index: u16, field_size: u16) -> BytecodeResult<()> {
        self.emit_ref(opcodes::PUTFIELD, field_index, -(field_size as i32) - 1)
    }

    pub fn emit_invokevirtual(&mut self, meth_index: u16, arg_size: u16, return_size: u16) -> BytecodeResult<()> {
        // Pop 'this' + arguments, push return value
        self.emit_ref(opcodes::INVOKEVIRTUAL, meth_index, return_size as i32 - arg_size as i32 - 1)
    }

    pub fn emit_invokespecial(&mut self, meth_index: u16, arg_size: u16, return_size: u16) -> BytecodeResult<()> {
        self.emit_ref(opcodes::INVOKESPECIAL, meth_index, return_size as i32 - arg_size as i32 - 1)
    }

    pub fn emit_invokestatic(&mut self, meth_index: u16, arg_size: u16, return_size: u16) -> BytecodeResult<()> {
        self.emit_ref(opcodes::INVOKESTATIC, meth_index, return_size as i32 - arg_size as i32)
    }

    pub fn emit_invokeinterface(&mut self, meth_index: u16, arg_size: u16, return_size: u16) -> BytecodeResult<()> {
        self.emitop(opcodes::INVOKEINTERFACE);
        self.emit2(meth_index);
        self.emit1((arg_size + 1) as u8);
        self.emit1(0);
        self.adjust_stack(return_size as i32 - arg_size as i32 - 1);
        self.check_length()
    }

    fn emit_ref(&mut self, op: u8, index: u16, delta: i32) -> BytecodeResult<()> {
        self.emitop(op);
        self.emit2(index);
        self.adjust_stack(delta);
        self.check_length()
    }

    /// Intern a method reference and invoke it with `op`, sizing the stack from its descriptor
    pub fn invoke(
        &mut self,
        constant_pool: &mut ConstantPool,
        op: u8,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> CodeGenResult<()> {
        let parsed = MethodDescriptor::parse(descriptor)?;
        let arg_size = parsed.arg_words();
        let return_size = parsed.ret.word_size();
        match op {
            opcodes::INVOKEINTERFACE => {
                let index = constant_pool.add_interface_method_ref(class, name, descriptor)?;
                self.emit_invokeinterface(index, arg_size, return_size)?;
            }
            opcodes::INVOKESTATIC => {
                let index = constant_pool.add_method_ref(class, name, descriptor)?;
                self.emit_invokestatic(index, arg_size, return_size)?;
            }
            opcodes::INVOKESPECIAL => {
                let index = constant_pool.add_method_ref(class, name, descriptor)?;
                self.emit_invokespecial(index, arg_size, return_size)?;
            }
            opcodes::INVOKEVIRTUAL => {
                let index = constant_pool.add_method_ref(class, name, descriptor)?;
                self.emit_invokevirtual(index, arg_size, return_size)?;
            }
            other => return Err(BytecodeError::InvalidOpcode { opcode: other }.into()),
        }
        Ok(())
    }

    /// Intern a field reference and emit a get/put for it
    pub fn access_field(
        &mut self,
        constant_pool: &mut ConstantPool,
        op: u8,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> CodeGenResult<()> {
        let size = JavaType::parse(descriptor)?.word_size();
        let index = constant_pool.add_field_ref(class, name, descriptor)?;
        match op {
            opcodes::GETSTATIC => self.emit_getstatic(index, size)?,
            opcodes::PUTSTATIC => self.emit_putstatic(index, size)?,
            opcodes::GETFIELD => self.emit_getfield(index, size)?,
            opcodes::PUTFIELD => self.emit_putfield(index, size)?,
            other => return Err(BytecodeError::InvalidOpcode { opcode: other }.into()),
        }
        Ok(())
    }

    /// `NEW class`
    pub fn new_object(&mut self, constant_pool: &mut ConstantPool, class: &str) -> CodeGenResult<()> {
        let index = constant_pool.add_class(class)?;
        self.emitop2(opcodes::NEW, index)?;
        Ok(())
    }

    /// `ANEWARRAY class`; the length must already be on the stack
    pub fn new_reference_array(&mut self, constant_pool: &mut ConstantPool, element: &str) -> CodeGenResult<()> {
        let index = constant_pool.add_class(element)?;
        self.emitop2(opcodes::ANEWARRAY, index)?;
        Ok(())
    }

    pub fn emit_multianewarray(&mut self, class_index: u16, dims: u8) -> BytecodeResult<()> {
        self.emitop(opcodes::MULTIANEWARRAY);
        self.emit2(class_index);
        self.emit1(dims);
        self.adjust_stack(1 - dims as i32);
        self.check_length()
    }

    /// The return instruction matching `ty`
    pub fn emit_return(&mut self, ty: &JavaType) -> BytecodeResult<()> {
        let op = match ty {
            JavaType::Void => opcodes::RETURN,
            JavaType::Long => opcodes::LRETURN,
            JavaType::Float => opcodes::FRETURN,
            JavaType::Double => opcodes::DRETURN,
            JavaType::Object(_) | JavaType::Array(_) => opcodes::ARETURN,
            _ => opcodes::IRETURN,
        };
        self.emit(op)
    }

    // ============================================================================
    // EXCEPTION TABLE AND NESTED ATTRIBUTES
    // ============================================================================

    /// Add a handler covering `start_pc..end_pc`; `catch_type` of `None` catches everything
    pub fn add_exception_handler(
        &mut self,
        start_pc: u16,
        end_pc: u16,
        handler_pc: u16,
        catch_type: Option<u16>,
    ) -> BytecodeResult<()> {
        if start_pc >= end_pc || end_pc > self.pc() {
            return Err(BytecodeError::InvalidExceptionRange { start: start_pc, end: end_pc });
        }
        self.exception_table
            .push(ExceptionTableEntry::new(start_pc, end_pc, handler_pc, catch_type.unwrap_or(0)));
        self.length += EXCEPTION_ENTRY_LENGTH as u32;
        Ok(())
    }

    /// Attach an attribute (LineNumberTable, LocalVariableTable) to the Code attribute
    pub fn add_attribute(&mut self, attribute: NamedAttribute) {
        self.length += 6 + attribute.attribute_length();
        self.attributes.push(attribute);
    }

    /// Finish the method body
    pub fn finish(self) -> BytecodeResult<CodeAttribute> {
        self.check_length()?;
        let max_stack = self.max_stack();
        Ok(CodeAttribute {
            max_stack,
            max_locals: self.max_locals,
            code: self.code,
            exception_table: self.exception_table,
            attributes: self.attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with(entries: usize) -> ConstantPool {
        let mut cp = ConstantPool::new();
        for i in 0..entries {
            cp.add_integer(100_000 + i as i32).unwrap();
        }
        cp
    }

    #[test]
    fn test_ldc_threshold() {
        let mut cp = pool_with(254);
        let mut code = CodeBuilder::new(0);
        code.load_constant(&mut cp, Constant::Integer(-7_000_000)).unwrap();
        assert_eq!(cp.find(&Constant::Integer(-7_000_000)), Some(255));
        assert_eq!(code.code(), &[opcodes::LDC, 0xFF]);

        code.load_constant(&mut cp, Constant::Integer(-8_000_000)).unwrap();
        assert_eq!(&code.code()[2..], &[opcodes::LDC_W, 0x01, 0x00]);

        // Re-loading index 255 still uses the byte form
        code.load_constant(&mut cp, Constant::Integer(-7_000_000)).unwrap();
        assert_eq!(&code.code()[5..], &[opcodes::LDC, 0xFF]);
    }

    #[test]
    fn test_local_forms() {
        let mut code = CodeBuilder::new(0);
        code.load_local(&JavaType::Int, 2).unwrap();
        code.load_local(&JavaType::Long, 5).unwrap();
        code.load_local(&JavaType::object("java.lang.Object"), 300).unwrap();
        assert_eq!(
            code.code(),
            &[opcodes::ILOAD_2, opcodes::LLOAD, 5, opcodes::WIDE, opcodes::ALOAD, 0x01, 0x2C]
        );
        assert_eq!(code.max_locals(), 301);
        assert_eq!(code.stack_depth(), 4);
    }

    #[test]
    fn test_max_stack_floor() {
        let mut code = CodeBuilder::new(1);
        code.emit(opcodes::RETURN).unwrap();
        assert_eq!(code.finish().unwrap().max_stack, 2);
    }

    #[test]
    fn test_length_accounting() {
        let mut cp = ConstantPool::new();
        let mut code = CodeBuilder::new(1);
        code.load_local(&JavaType::object("java.lang.Object"), 0).unwrap();
        code.invoke(&mut cp, opcodes::INVOKESPECIAL, "java.lang.Object", "<init>", "()V").unwrap();
        code.emit(opcodes::RETURN).unwrap();
        code.add_exception_handler(0, 4, 4, None).unwrap();
        let expected = code.length();
        let attribute = code.finish().unwrap();
        assert_eq!(expected, attribute.attribute_length());
        assert_eq!(expected as usize, attribute.to_bytes().len());
    }

    #[test]
    fn test_operand_width_is_checked() {
        let mut code = CodeBuilder::new(0);
        assert_eq!(
            code.emit_with_operands(opcodes::SIPUSH, &[1]),
            Err(BytecodeError::OperandWidth { opcode: opcodes::SIPUSH, expected: 2, found: 1 })
        );
        assert!(code.emit(0xFE).is_err());
    }

    #[test]
    fn test_forward_branch() {
        let mut code = CodeBuilder::new(1);
        code.load_local(&JavaType::Int, 0).unwrap();
        let jump = code.emit_jump(opcodes::IFEQ).unwrap();
        code.emit(opcodes::NOP).unwrap();
        code.resolve(jump).unwrap();
        code.emit(opcodes::RETURN).unwrap();
        assert_eq!(code.code(), &[opcodes::ILOAD_0, opcodes::IFEQ, 0, 4, opcodes::NOP, opcodes::RETURN]);
    }

    #[test]
    fn test_invalid_handler_range() {
        let mut code = CodeBuilder::new(0);
        code.emit(opcodes::RETURN).unwrap();
        assert!(code.add_exception_handler(1, 1, 0, None).is_err());
        assert!(code.add_exception_handler(0, 5, 0, None).is_err());
    }
}
