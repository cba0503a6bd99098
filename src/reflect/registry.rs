//! Explicit class registry standing in for host reflection
//!
//! A registry is an ordinary value: synthesis and evaluation take it by
//! reference, so independent runtimes never share class tables.

use std::collections::{HashMap, HashSet};

use log::{debug, error};
use once_cell::sync::Lazy;

use super::error::{RegistryError, RegistryResult};
use super::jdk::JDK_SOURCES;
use super::parser::{self, ParsedUnit, TypeRef};
use crate::codegen::defs::access_flags::{ACC_ABSTRACT, ACC_INTERFACE, ACC_PUBLIC, ACC_STATIC};
use crate::codegen::descriptor::{method_descriptor, JavaType};

pub const OBJECT_CLASS: &str = "java.lang.Object";

/// A method as reflection reports it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodInfo {
    pub declaring_class: String,
    pub name: String,
    pub params: Vec<JavaType>,
    pub ret: JavaType,
    /// Declared checked exceptions, dotted names
    pub exceptions: Vec<String>,
    pub access_flags: u16,
}

impl MethodInfo {
    pub fn descriptor(&self) -> String {
        method_descriptor(&self.params, &self.ret)
    }

    /// Name followed by descriptor, the key methods are ordered and deduplicated by
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.descriptor())
    }

    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn is_public(&self) -> bool {
        self.access_flags & ACC_PUBLIC != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// Dotted binary name
    pub name: String,
    pub access_flags: u16,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    /// Declared methods in declaration order
    pub methods: Vec<MethodInfo>,
}

impl ClassInfo {
    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

static JDK_CLASSES: Lazy<Vec<ClassInfo>> = Lazy::new(|| {
    let mut seed = ClassRegistry::new();
    for source in JDK_SOURCES {
        if let Err(e) = seed.load_source(source) {
            error!("bundled class declaration failed to load: {}", e);
        }
    }
    let mut classes: Vec<ClassInfo> = seed.classes.into_values().collect();
    classes.sort_by(|a, b| a.name.cmp(&b.name));
    classes
});

#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassInfo>,
}

impl ClassRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the JDK types adaptor synthesis relies on
    pub fn with_jdk() -> Self {
        let mut registry = Self::new();
        for class in JDK_CLASSES.iter() {
            registry.register(class.clone());
        }
        registry
    }

    pub fn register(&mut self, class: ClassInfo) {
        debug!("registering {}", class.name);
        self.classes.insert(class.name.clone(), class);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Resolve a class by dotted or internal name
    pub fn lookup(&self, name: &str) -> RegistryResult<&ClassInfo> {
        self.classes
            .get(&normalize(name))
            .ok_or_else(|| RegistryError::ClassNotFound(name.to_string()))
    }

    /// Resolve a class that must be an interface
    pub fn lookup_interface(&self, name: &str) -> RegistryResult<&ClassInfo> {
        let class = self.lookup(name)?;
        if !class.is_interface() {
            return Err(RegistryError::NotAnInterface(class.name.clone()));
        }
        Ok(class)
    }

    /// Public methods of a class including inherited ones, like `Class.getMethods()`
    ///
    /// Declared methods come first, then superclass and superinterface methods
    /// breadth-first. A signature seen earlier hides later ones. Interfaces do
    /// not inherit `java.lang.Object` methods here.
    pub fn methods(&self, name: &str) -> RegistryResult<Vec<&MethodInfo>> {
        let root = self.lookup(name)?;
        let mut result = Vec::new();
        let mut signatures = HashSet::new();
        let mut visited = HashSet::new();
        let mut queue = vec![root];
        while !queue.is_empty() {
            let mut next = Vec::new();
            for class in queue {
                if !visited.insert(class.name.as_str()) {
                    continue;
                }
                for method in &class.methods {
                    if method.is_public() && method.name != "<init>" && method.name != "<clinit>"
                        && signatures.insert(method.signature())
                    {
                        result.push(method);
                    }
                }
                let supers = class.super_class.iter().chain(class.interfaces.iter());
                for super_name in supers {
                    next.push(self.lookup(super_name)?);
                }
            }
            queue = next;
        }
        Ok(result)
    }

    /// Whether a value of class `from` can be assigned to `to`
    pub fn is_assignable(&self, from: &str, to: &str) -> bool {
        let (from, to) = (normalize(from), normalize(to));
        if from == to || to == OBJECT_CLASS {
            return true;
        }
        let mut stack = vec![from];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(class) = self.classes.get(&current) {
                stack.extend(class.super_class.iter().cloned());
                stack.extend(class.interfaces.iter().cloned());
            }
        }
        false
    }

    /// Assignability for full types; primitives only match themselves
    pub fn is_type_assignable(&self, from: &JavaType, to: &JavaType) -> bool {
        match (from, to) {
            (JavaType::Object(a), JavaType::Object(b)) => self.is_assignable(a, b),
            (JavaType::Array(_), JavaType::Object(b)) => {
                b == OBJECT_CLASS || b == "java.lang.Cloneable" || b == "java.io.Serializable"
            }
            (JavaType::Array(a), JavaType::Array(b)) => {
                if a.is_primitive() || b.is_primitive() {
                    a == b
                } else {
                    self.is_type_assignable(a, b)
                }
            }
            (a, b) => a == b,
        }
    }

    /// Parse declarations from source text and register them; returns the registered names
    pub fn load_source(&mut self, source: &str) -> RegistryResult<Vec<String>> {
        let unit = parser::parse(source)?;
        let classes = self.resolve_unit(&unit);
        let names = classes.iter().map(|c| c.name.clone()).collect();
        for class in classes {
            self.register(class);
        }
        Ok(names)
    }

    fn resolve_unit(&self, unit: &ParsedUnit) -> Vec<ClassInfo> {
        let local: HashSet<&str> = unit.types.iter().map(|t| t.name.as_str()).collect();
        let resolver = NameResolver { registry: self, unit, local };
        unit.types
            .iter()
            .map(|ty| {
                let name = unit.qualified_name(&ty.name);
                let (super_class, interfaces) = if ty.is_interface {
                    (None, ty.extends.iter().map(|n| resolver.class_name(n)).collect())
                } else {
                    let super_class = match ty.extends.first() {
                        Some(n) => Some(resolver.class_name(n)),
                        None if name == OBJECT_CLASS => None,
                        None => Some(OBJECT_CLASS.to_string()),
                    };
                    (super_class, ty.implements.iter().map(|n| resolver.class_name(n)).collect())
                };
                let methods = ty
                    .methods
                    .iter()
                    .map(|m| MethodInfo {
                        declaring_class: name.clone(),
                        name: m.name.clone(),
                        params: m.params.iter().map(|p| resolver.java_type(p)).collect(),
                        ret: resolver.java_type(&m.ret),
                        exceptions: m.throws.iter().map(|t| resolver.class_name(t)).collect(),
                        access_flags: m.modifiers,
                    })
                    .collect();
                let access_flags = if ty.is_interface { ty.modifiers | ACC_ABSTRACT } else { ty.modifiers };
                ClassInfo { name, access_flags, super_class, interfaces, methods }
            })
            .collect()
    }
}

/// Resolves simple names the way a Java compiler would for declarations:
/// single-type imports, types of the same unit, the unit's package,
/// on-demand imports, then `java.lang`
struct NameResolver<'a> {
    registry: &'a ClassRegistry,
    unit: &'a ParsedUnit,
    local: HashSet<&'a str>,
}

impl NameResolver<'_> {
    fn class_name(&self, name: &str) -> String {
        if name.contains('.') {
            // Outer.Inner written with a dot inside the same unit
            let nested = name.replace('.', "$");
            if self.local.contains(nested.as_str()) {
                return self.unit.qualified_name(&nested);
            }
            return name.to_string();
        }
        if let Some(import) = self.unit.imports.iter().find(|i| i.rsplit('.').next() == Some(name)) {
            return import.clone();
        }
        if self.local.contains(name) {
            return self.unit.qualified_name(name);
        }
        if let Some(local) = self.local.iter().find(|l| l.rsplit('$').next() == Some(name)) {
            return self.unit.qualified_name(local);
        }
        let same_package = self.unit.qualified_name(name);
        if self.registry.contains(&same_package) {
            return same_package;
        }
        for package in &self.unit.wildcard_imports {
            let candidate = format!("{}.{}", package, name);
            if self.registry.contains(&candidate) {
                return candidate;
            }
        }
        let lang = format!("java.lang.{}", name);
        if self.registry.contains(&lang) || self.unit.package.is_none() && is_java_lang(name) {
            return lang;
        }
        same_package
    }

    fn java_type(&self, ty: &TypeRef) -> JavaType {
        let base = JavaType::from_source(&ty.name, 0);
        let base = match base {
            JavaType::Object(name) => JavaType::Object(self.class_name(&name)),
            primitive => primitive,
        };
        (0..ty.dims).fold(base, |t, _| JavaType::array_of(t))
    }
}

fn is_java_lang(name: &str) -> bool {
    matches!(
        name,
        "Object" | "String" | "Class" | "Throwable" | "Exception" | "RuntimeException" | "Error" | "Boolean"
            | "Character" | "Byte" | "Short" | "Integer" | "Long" | "Float" | "Double" | "Number" | "Void"
    )
}

fn normalize(name: &str) -> String {
    name.replace('/', ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jdk_seed_resolves_listener_methods() {
        let registry = ClassRegistry::with_jdk();
        let listener = registry.lookup_interface("java.awt.event.ActionListener").unwrap();
        assert_eq!(listener.interfaces, vec!["java.util.EventListener".to_string()]);
        let methods = registry.methods("java/awt/event/ActionListener").unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].signature(), "actionPerformed(Ljava/awt/event/ActionEvent;)V");
    }

    #[test]
    fn test_assignability_walks_supers() {
        let registry = ClassRegistry::with_jdk();
        assert!(registry.is_assignable("java.awt.event.MouseEvent", "java.util.EventObject"));
        assert!(registry.is_assignable("java.beans.PropertyChangeEvent", "java.io.Serializable"));
        assert!(!registry.is_assignable("java.lang.String", "java.util.EventObject"));
        assert!(registry.is_type_assignable(
            &JavaType::array_of(JavaType::Int),
            &JavaType::object("java.lang.Object")
        ));
        assert!(!registry.is_type_assignable(&JavaType::Int, &JavaType::object("java.util.EventObject")));
    }

    #[test]
    fn test_not_an_interface() {
        let registry = ClassRegistry::with_jdk();
        assert!(matches!(
            registry.lookup_interface("java.util.EventObject"),
            Err(RegistryError::NotAnInterface(_))
        ));
        assert!(matches!(registry.lookup("no.such.Type"), Err(RegistryError::ClassNotFound(_))));
    }

    #[test]
    fn test_inherited_interface_methods_follow_declared() {
        let mut registry = ClassRegistry::with_jdk();
        registry
            .load_source(
                "package app;\n\
                 import java.awt.event.*;\n\
                 public interface Both extends MouseListener, KeyListener {\n\
                     void both(MouseEvent m, KeyEvent k);\n\
                 }",
            )
            .unwrap();
        let methods = registry.methods("app.Both").unwrap();
        assert_eq!(methods[0].name, "both");
        assert_eq!(methods[0].params[0], JavaType::object("java.awt.event.MouseEvent"));
        assert_eq!(methods.len(), 1 + 5 + 3);
    }

    #[test]
    fn test_name_resolution_order() {
        let mut registry = ClassRegistry::with_jdk();
        registry
            .load_source("package app; public class Thing { public Thing() {} }")
            .unwrap();
        registry
            .load_source(
                "package app;\n\
                 public interface ThingListener extends java.util.EventListener {\n\
                     void changed(Thing t, String label, Missing m) throws Exception;\n\
                 }",
            )
            .unwrap();
        let m = &registry.lookup("app.ThingListener").unwrap().methods[0];
        assert_eq!(m.params[0], JavaType::object("app.Thing"));
        assert_eq!(m.params[1], JavaType::object("java.lang.String"));
        assert_eq!(m.params[2], JavaType::object("app.Missing"));
        assert_eq!(m.exceptions, vec!["java.lang.Exception".to_string()]);
    }
}
