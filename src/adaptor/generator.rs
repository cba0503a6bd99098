//! Event adaptor synthesis
//!
//! Given a listener interface, author a class that implements it by
//! forwarding every listener method to one of the two `fire` overloads of the
//! adaptor base class:
//!
//! ```text
//! fire(EventObject event, Method method)   // one event-typed argument
//! fire(Object[] args, Method method)       // anything else, primitives boxed
//! ```
//!
//! The reflected `Method` objects live in a static `methods` array filled by
//! `<clinit>` in the same order the stubs index into it.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::boxing::{boxing_for, primitive_class_holder};
use super::error::{SynthesisError, SynthesisResult, SynthesisWarning};
use crate::codegen::attribute::{LineNumberTableAttribute, LocalVariableTableAttribute, NamedAttribute};
use crate::codegen::defs::access_flags::{ACC_ABSTRACT, ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC, ACC_SUPER};
use crate::codegen::defs::{CONSTRUCTOR_METHOD_NAME, STATIC_INITIALIZER_METHOD_NAME};
use crate::codegen::descriptor::{JavaType, MethodDescriptor};
use crate::codegen::{opcodes, ClassFile, CodeBuilder, ConstantPool};
use crate::config::{Config, MethodOrder};
use crate::reflect::{ClassRegistry, MethodInfo};
use crate::verify;

const CLASS_CLASS: &str = "java/lang/Class";
const METHOD_CLASS: &str = "java/lang/reflect/Method";
const OBJECT_CLASS: &str = "java/lang/Object";
const CLAZZ_FIELD: &str = "clazz";
const METHODS_FIELD: &str = "methods";
const CLAZZ_DESCRIPTOR: &str = "Ljava/lang/Class;";
const METHODS_DESCRIPTOR: &str = "[Ljava/lang/reflect/Method;";
const FIRE_METHOD: &str = "fire";

/// Which `fire` overload a stub forwards to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubKind {
    /// `fire(event, method)`
    Simple,
    /// `fire(Object[], method)`
    Cracked,
}

/// One generated stub; its position in `SynthesizedAdaptor::methods` is its ordinal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptorMethod {
    pub name: String,
    pub descriptor: String,
    pub params: Vec<JavaType>,
    pub kind: StubKind,
}

impl AdaptorMethod {
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.descriptor)
    }
}

/// A finished adaptor class
#[derive(Debug, Clone)]
pub struct SynthesizedAdaptor {
    /// Dotted name
    pub class_name: String,
    pub bytes: Vec<u8>,
    pub methods: Vec<AdaptorMethod>,
    pub warnings: Vec<SynthesisWarning>,
}

impl SynthesizedAdaptor {
    /// Ordinal of the stub for `name`; the first overload wins
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name == name)
    }

    /// Path of the class file below a classpath root
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.class_name.split('.').collect();
        path.set_extension("class");
        path
    }

    /// Write the class file below `dir`, creating package directories
    pub fn write_to(&self, dir: &Path) -> SynthesisResult<PathBuf> {
        let path = dir.join(self.relative_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SynthesisError::Io { path: parent.to_path_buf(), source })?;
        }
        fs::write(&path, &self.bytes).map_err(|source| SynthesisError::Io { path: path.clone(), source })?;
        info!("wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Listener method accepted for stub generation
struct StubPlan<'r> {
    method: &'r MethodInfo,
    kind: StubKind,
}

pub struct EventAdaptorSynthesizer<'a> {
    registry: &'a ClassRegistry,
    config: &'a Config,
}

impl<'a> EventAdaptorSynthesizer<'a> {
    pub fn new(registry: &'a ClassRegistry, config: &'a Config) -> Self {
        Self { registry, config }
    }

    /// `<package>.<listener with dots replaced>Adaptor`
    pub fn adaptor_name(&self, listener: &str) -> String {
        let mangled = listener.replace(['.', '$'], "_");
        if self.config.adaptor_package.is_empty() {
            format!("{}Adaptor", mangled)
        } else {
            format!("{}.{}Adaptor", self.config.adaptor_package, mangled)
        }
    }

    /// Listener methods in stub order, before the return type filter
    pub fn listener_methods(&self, listener: &str) -> SynthesisResult<Vec<&'a MethodInfo>> {
        self.registry.lookup_interface(listener)?;
        let mut methods: Vec<&MethodInfo> = self
            .registry
            .methods(listener)?
            .into_iter()
            .filter(|m| m.access_flags & ACC_ABSTRACT != 0 && !m.is_static())
            .collect();
        if self.config.method_order == MethodOrder::Sorted {
            methods.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.descriptor().cmp(&b.descriptor())));
        }
        Ok(methods)
    }

    pub fn synthesize(&self, listener: &str) -> SynthesisResult<SynthesizedAdaptor> {
        let class_name = self.adaptor_name(listener);
        debug!("synthesizing {} for {}", class_name, listener);

        let (plans, warnings) = self.resolve(listener)?;
        if self.config.fail_on_warning {
            if let Some(first) = warnings.first() {
                return Err(SynthesisError::Warnings {
                    listener: listener.to_string(),
                    count: warnings.len(),
                    first: first.clone(),
                });
            }
        }

        let mut class = self.scaffold(&class_name, listener)?;
        self.emit_static_initializer(&mut class, listener, &plans)?;
        self.emit_constructor(&mut class)?;
        debug!("{}: scaffold, <clinit> and <init> done", class_name);
        for (ordinal, plan) in plans.iter().enumerate() {
            self.emit_stub(&mut class, &class_name, ordinal, plan)?;
        }
        if self.config.emit_source_file {
            let simple = class_name.rsplit('.').next().unwrap_or(&class_name);
            let attribute = NamedAttribute::source_file(&mut class.constant_pool, &format!("{}.java", simple))?;
            class.add_attribute(attribute);
        }

        if self.config.verify_before_write {
            verify::verify(&class)?;
        }
        let bytes = class.to_bytes()?;
        debug!(
            "{}: {} stubs, {} constants, {} bytes",
            class_name,
            plans.len(),
            class.constant_pool.len(),
            bytes.len()
        );

        let methods = plans
            .iter()
            .map(|plan| AdaptorMethod {
                name: plan.method.name.clone(),
                descriptor: plan.method.descriptor(),
                params: plan.method.params.clone(),
                kind: plan.kind,
            })
            .collect();
        Ok(SynthesizedAdaptor { class_name, bytes, methods, warnings })
    }

    /// Synthesize and stream the class file into `sink`
    pub fn synthesize_to<W: Write>(&self, listener: &str, sink: &mut W) -> SynthesisResult<SynthesizedAdaptor> {
        let adaptor = self.synthesize(listener)?;
        sink.write_all(&adaptor.bytes).map_err(|source| SynthesisError::Io {
            path: PathBuf::from(format!("<{}>", adaptor.class_name)),
            source,
        })?;
        Ok(adaptor)
    }

    // ============================================================================
    // RESOLVE
    // ============================================================================

    fn resolve(&self, listener: &str) -> SynthesisResult<(Vec<StubPlan<'a>>, Vec<SynthesisWarning>)> {
        let mut plans = Vec::new();
        let mut warnings = Vec::new();
        for method in self.listener_methods(listener)? {
            if method.ret != JavaType::Void {
                let warning = SynthesisWarning::UnsupportedReturnType {
                    method: method.signature(),
                    return_type: method.ret.source_name(),
                };
                warn!("{}: {}", listener, warning);
                warnings.push(warning);
                continue;
            }
            let kind = self.stub_kind(method);
            debug!("{}: {} -> {:?}", listener, method.signature(), kind);
            plans.push(StubPlan { method, kind });
        }
        Ok((plans, warnings))
    }

    fn stub_kind(&self, method: &MethodInfo) -> StubKind {
        let event_type = JavaType::object(&self.config.event_base_class);
        match method.params.as_slice() {
            [only] if self.registry.is_type_assignable(only, &event_type) => StubKind::Simple,
            _ => StubKind::Cracked,
        }
    }

    // ============================================================================
    // SCAFFOLD
    // ============================================================================

    fn scaffold(&self, class_name: &str, listener: &str) -> SynthesisResult<ClassFile> {
        let mut class = ClassFile::new_class(
            &internal(class_name),
            &internal(&self.config.adaptor_base_class),
            ACC_PUBLIC | ACC_SUPER,
        )?
        .with_version(self.config.major_version, self.config.minor_version);
        class.add_interface(&internal(listener))?;
        class.add_field(ACC_PRIVATE | ACC_STATIC, CLAZZ_FIELD, CLAZZ_DESCRIPTOR)?;
        class.add_field(ACC_PRIVATE | ACC_STATIC, METHODS_FIELD, METHODS_DESCRIPTOR)?;
        Ok(class)
    }

    // ============================================================================
    // STATIC INITIALIZER
    // ============================================================================

    /// `clazz = Class.forName(listener)` and `methods[k] = clazz.getMethod(...)`
    /// for every stub, all under a handler rethrowing as `NoClassDefFoundError`
    fn emit_static_initializer(&self, class: &mut ClassFile, listener: &str, plans: &[StubPlan]) -> SynthesisResult<()> {
        let this = internal(&self.adaptor_name(listener));
        let cp = &mut class.constant_pool;
        let mut code = CodeBuilder::new(0);

        let try_start = code.pc();
        code.load_string(cp, listener)?;
        code.invoke(cp, opcodes::INVOKESTATIC, CLASS_CLASS, "forName", "(Ljava/lang/String;)Ljava/lang/Class;")?;
        code.access_field(cp, opcodes::PUTSTATIC, &this, CLAZZ_FIELD, CLAZZ_DESCRIPTOR)?;

        code.push_int(cp, plans.len() as i32)?;
        code.new_reference_array(cp, METHOD_CLASS)?;
        code.access_field(cp, opcodes::PUTSTATIC, &this, METHODS_FIELD, METHODS_DESCRIPTOR)?;

        for (ordinal, plan) in plans.iter().enumerate() {
            code.access_field(cp, opcodes::GETSTATIC, &this, METHODS_FIELD, METHODS_DESCRIPTOR)?;
            code.push_int(cp, ordinal as i32)?;
            code.access_field(cp, opcodes::GETSTATIC, &this, CLAZZ_FIELD, CLAZZ_DESCRIPTOR)?;
            code.load_string(cp, &plan.method.name)?;
            code.push_int(cp, plan.method.params.len() as i32)?;
            code.new_reference_array(cp, CLASS_CLASS)?;
            for (index, param) in plan.method.params.iter().enumerate() {
                code.emit(opcodes::DUP)?;
                code.push_int(cp, index as i32)?;
                match primitive_class_holder(param) {
                    Some(holder) => code.access_field(cp, opcodes::GETSTATIC, holder, "TYPE", CLAZZ_DESCRIPTOR)?,
                    None => {
                        let name = param.class_for_name().unwrap_or_else(|| param.source_name());
                        code.load_string(cp, &name)?;
                        code.invoke(
                            cp,
                            opcodes::INVOKESTATIC,
                            CLASS_CLASS,
                            "forName",
                            "(Ljava/lang/String;)Ljava/lang/Class;",
                        )?;
                    }
                }
                code.emit(opcodes::AASTORE)?;
            }
            code.invoke(
                cp,
                opcodes::INVOKEVIRTUAL,
                CLASS_CLASS,
                "getMethod",
                "(Ljava/lang/String;[Ljava/lang/Class;)Ljava/lang/reflect/Method;",
            )?;
            code.emit(opcodes::AASTORE)?;
        }
        let try_end = code.pc();
        code.emit(opcodes::RETURN)?;

        let handler = code.pc();
        code.enter_handler();
        let exception = JavaType::object("java.lang.Exception");
        code.store_local(&exception, 0)?;
        code.new_object(cp, "java/lang/NoClassDefFoundError")?;
        code.emit(opcodes::DUP)?;
        code.load_local(&exception, 0)?;
        code.invoke(cp, opcodes::INVOKEVIRTUAL, "java/lang/Throwable", "getMessage", "()Ljava/lang/String;")?;
        code.invoke(
            cp,
            opcodes::INVOKESPECIAL,
            "java/lang/NoClassDefFoundError",
            CONSTRUCTOR_METHOD_NAME,
            "(Ljava/lang/String;)V",
        )?;
        code.emit(opcodes::ATHROW)?;

        let catch_type = cp.add_class("java/lang/Exception")?;
        code.add_exception_handler(try_start, try_end, handler, Some(catch_type))?;

        let body = code.finish()?;
        class.add_method(ACC_STATIC, STATIC_INITIALIZER_METHOD_NAME, "()V", Some(body))?;
        Ok(())
    }

    // ============================================================================
    // CONSTRUCTOR AND STUBS
    // ============================================================================

    fn emit_constructor(&self, class: &mut ClassFile) -> SynthesisResult<()> {
        let base = internal(&self.config.adaptor_base_class);
        let cp = &mut class.constant_pool;
        let mut code = CodeBuilder::new(1);
        code.emit(opcodes::ALOAD_0)?;
        code.invoke(cp, opcodes::INVOKESPECIAL, &base, CONSTRUCTOR_METHOD_NAME, "()V")?;
        code.emit(opcodes::RETURN)?;
        let body = code.finish()?;
        class.add_method(ACC_PUBLIC, CONSTRUCTOR_METHOD_NAME, "()V", Some(body))?;
        Ok(())
    }

    fn emit_stub(&self, class: &mut ClassFile, class_name: &str, ordinal: usize, plan: &StubPlan) -> SynthesisResult<()> {
        let method = plan.method;
        let descriptor = MethodDescriptor::new(method.params.clone(), JavaType::Void);
        let this = internal(class_name);
        let base = internal(&self.config.adaptor_base_class);
        let cp = &mut class.constant_pool;
        let mut code = CodeBuilder::for_method(false, &descriptor);

        code.emit(opcodes::ALOAD_0)?;
        let fire_descriptor = match plan.kind {
            StubKind::Simple => {
                code.load_local(&method.params[0], 1)?;
                format!("({}Ljava/lang/reflect/Method;)V", JavaType::object(&self.config.event_base_class).descriptor())
            }
            StubKind::Cracked => {
                code.push_int(cp, method.params.len() as i32)?;
                code.new_reference_array(cp, OBJECT_CLASS)?;
                let mut slot = 1;
                for (index, param) in method.params.iter().enumerate() {
                    code.emit(opcodes::DUP)?;
                    code.push_int(cp, index as i32)?;
                    match boxing_for(param) {
                        Some(boxing) => {
                            code.new_object(cp, boxing.wrapper)?;
                            code.emit(opcodes::DUP)?;
                            code.load_local(param, slot)?;
                            if let Some(narrowing) = boxing.narrowing {
                                code.emit(narrowing)?;
                            }
                            code.invoke(cp, opcodes::INVOKESPECIAL, boxing.wrapper, CONSTRUCTOR_METHOD_NAME, boxing.constructor)?;
                        }
                        None => code.load_local(param, slot)?,
                    }
                    code.emit(opcodes::AASTORE)?;
                    slot += param.word_size();
                }
                "([Ljava/lang/Object;Ljava/lang/reflect/Method;)V".to_string()
            }
        };
        code.access_field(cp, opcodes::GETSTATIC, &this, METHODS_FIELD, METHODS_DESCRIPTOR)?;
        code.push_int(cp, ordinal as i32)?;
        code.emit(opcodes::AALOAD)?;
        code.invoke(cp, opcodes::INVOKEVIRTUAL, &base, FIRE_METHOD, &fire_descriptor)?;
        code.emit(opcodes::RETURN)?;

        if self.config.emit_debug_tables {
            self.add_debug_tables(&mut code, cp, class_name, ordinal, &method.params)?;
        }
        let body = code.finish()?;
        let index = class.add_method(ACC_PUBLIC, &method.name, &descriptor.to_string(), Some(body))?;

        let exceptions: Vec<String> = method.exceptions.iter().map(|e| internal(e)).collect();
        let exceptions: Vec<&str> = exceptions.iter().map(String::as_str).collect();
        class.add_method_exceptions(index, &exceptions)?;
        Ok(())
    }

    fn add_debug_tables(
        &self,
        code: &mut CodeBuilder,
        cp: &mut ConstantPool,
        class_name: &str,
        ordinal: usize,
        params: &[JavaType],
    ) -> SynthesisResult<()> {
        let length = code.pc();
        let mut lines = LineNumberTableAttribute::new();
        lines.add_line_number(0, (ordinal + 1).min(u16::MAX as usize) as u16);
        code.add_attribute(NamedAttribute::line_number_table(cp, lines)?);

        let mut locals = LocalVariableTableAttribute::new();
        locals.add_local(cp, 0, length, "this", &JavaType::object(class_name).descriptor(), 0)?;
        let mut slot = 1;
        for (index, param) in params.iter().enumerate() {
            locals.add_local(cp, 0, length, &format!("arg{}", index), &param.descriptor(), slot)?;
            slot += param.word_size();
        }
        code.add_attribute(NamedAttribute::local_variable_table(cp, locals)?);
        Ok(())
    }
}

/// Dotted name to internal form
fn internal(name: &str) -> String {
    name.replace('.', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::inspect;

    const CUSTOM: &str = r#"
        package app.events;

        import java.util.EventListener;

        public interface ProgressListener extends EventListener {
            void progressed(app.events.ProgressEvent e);
            void stepped(int step, long total, boolean done) throws java.io.IOException;
            void tick();
            int poll();
        }

        public class ProgressEvent extends java.util.EventObject {
            public ProgressEvent(Object source) { }
        }
    "#;

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::with_jdk();
        registry.load_source(CUSTOM).unwrap();
        registry
    }

    #[test]
    fn test_adaptor_name() {
        let registry = ClassRegistry::new();
        let config = Config::default();
        let synthesizer = EventAdaptorSynthesizer::new(&registry, &config);
        assert_eq!(
            synthesizer.adaptor_name("java.awt.event.ActionListener"),
            "FESI.ClassFile.java_awt_event_ActionListenerAdaptor"
        );
    }

    #[test]
    fn test_stub_kinds_and_order() {
        let registry = registry();
        let config = Config::default();
        let adaptor = EventAdaptorSynthesizer::new(&registry, &config).synthesize("app.events.ProgressListener").unwrap();

        let names: Vec<&str> = adaptor.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["progressed", "stepped", "tick"]);
        assert_eq!(adaptor.methods[0].kind, StubKind::Simple);
        assert_eq!(adaptor.methods[1].kind, StubKind::Cracked);
        assert_eq!(adaptor.methods[2].kind, StubKind::Cracked);
        assert_eq!(adaptor.warnings.len(), 1);
        assert!(adaptor.warnings[0].method().starts_with("poll"));
    }

    #[test]
    fn test_class_shape() {
        let registry = registry();
        let config = Config::default();
        let adaptor = EventAdaptorSynthesizer::new(&registry, &config).synthesize("app.events.ProgressListener").unwrap();
        let summary = inspect(&adaptor.bytes).unwrap();

        assert_eq!(summary.this_class, "FESI/ClassFile/app_events_ProgressListenerAdaptor");
        assert_eq!(summary.super_class.as_deref(), Some("FESI/ClassFile/EventAdaptor"));
        assert_eq!(summary.interfaces, vec!["app/events/ProgressListener".to_string()]);
        assert!(summary.field("clazz").is_some());
        assert_eq!(summary.field("methods").unwrap().descriptor, "[Ljava/lang/reflect/Method;");

        let clinit = summary.method("<clinit>").unwrap().code.as_ref().unwrap();
        assert_eq!(clinit.exception_table.len(), 1);
        assert_eq!(clinit.exception_table[0].3.as_deref(), Some("java/lang/Exception"));
        assert!(clinit.opcodes().contains(&opcodes::ATHROW));

        let stepped = summary.method("stepped").unwrap();
        assert_eq!(stepped.descriptor, "(IJZ)V");
        assert_eq!(stepped.exceptions, vec!["java/io/IOException".to_string()]);
        let code = stepped.code.as_ref().unwrap();
        assert_eq!(code.max_locals, 5);
        let ops = code.opcodes();
        assert!(ops.contains(&opcodes::I2B));
        assert!(ops.contains(&opcodes::LLOAD_2));
        assert!(ops.contains(&opcodes::ILOAD));
        assert!(summary.method("poll").is_none());
    }

    #[test]
    fn test_fail_on_warning() {
        let registry = registry();
        let config = Config { fail_on_warning: true, ..Config::default() };
        let result = EventAdaptorSynthesizer::new(&registry, &config).synthesize("app.events.ProgressListener");
        assert!(matches!(result, Err(SynthesisError::Warnings { count: 1, .. })));
    }

    #[test]
    fn test_not_an_interface() {
        let registry = registry();
        let config = Config::default();
        let synthesizer = EventAdaptorSynthesizer::new(&registry, &config);
        assert!(matches!(synthesizer.synthesize("app.events.ProgressEvent"), Err(SynthesisError::Registry(_))));
        assert!(matches!(synthesizer.synthesize("app.events.Missing"), Err(SynthesisError::Registry(_))));
    }
}
