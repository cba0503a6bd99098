//! Recursive-descent parser for class and interface declarations
//!
//! Only the declaration surface is kept: package, imports, type headers,
//! fields and method signatures. Method bodies, initializers, annotations and
//! generic arguments are skipped.

use super::error::{RegistryError, RegistryResult};
use super::lexer::{Lexer, LexicalToken, Token};
use crate::codegen::defs::access_flags::*;

/// Type as written in source, before name resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub dims: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMethod {
    pub modifiers: u16,
    pub name: String,
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
    pub throws: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedField {
    pub modifiers: u16,
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedType {
    pub modifiers: u16,
    pub is_interface: bool,
    /// Simple name; nested types are joined with `$`
    pub name: String,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub fields: Vec<ParsedField>,
    pub methods: Vec<ParsedMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedUnit {
    pub package: Option<String>,
    /// Single-type imports (`java.awt.event.ActionEvent`)
    pub imports: Vec<String>,
    /// On-demand import packages (`java.awt.event` for `java.awt.event.*`)
    pub wildcard_imports: Vec<String>,
    pub types: Vec<ParsedType>,
}

impl ParsedUnit {
    pub fn qualified_name(&self, simple: &str) -> String {
        match &self.package {
            Some(pkg) => format!("{}.{}", pkg, simple),
            None => simple.to_string(),
        }
    }
}

pub fn parse(source: &str) -> RegistryResult<ParsedUnit> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser { tokens, pos: 0 }.compilation_unit()
}

struct Parser {
    tokens: Vec<LexicalToken>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|t| t.token)
    }

    fn peek_at(&self, offset: usize) -> Option<Token> {
        self.tokens.get(self.pos + offset).map(|t| t.token)
    }

    fn advance(&mut self) -> Option<&LexicalToken> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, expected: &str) -> RegistryError {
        match self.tokens.get(self.pos) {
            Some(t) => RegistryError::Parse {
                line: t.line,
                column: t.column,
                expected: expected.to_string(),
                found: t.lexeme.clone(),
            },
            None => {
                let (line, column) = self.tokens.last().map(|t| (t.line, t.column + t.lexeme.len())).unwrap_or((1, 1));
                RegistryError::Parse { line, column, expected: expected.to_string(), found: "end of input".to_string() }
            }
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> RegistryResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn identifier(&mut self) -> RegistryResult<String> {
        match self.tokens.get(self.pos) {
            Some(t) if t.token == Token::Identifier => {
                let name = t.lexeme.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn qualified_name(&mut self) -> RegistryResult<String> {
        let mut name = self.identifier()?;
        while self.peek() == Some(Token::Dot) && self.peek_at(1) == Some(Token::Identifier) {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.identifier()?);
        }
        Ok(name)
    }

    fn compilation_unit(mut self) -> RegistryResult<ParsedUnit> {
        let mut unit = ParsedUnit::default();
        self.skip_annotations()?;
        if self.eat(Token::Package) {
            unit.package = Some(self.qualified_name()?);
            self.expect(Token::Semicolon, "';' after package name")?;
        }
        while self.eat(Token::Import) {
            self.eat(Token::Static);
            let name = self.qualified_name()?;
            if self.eat(Token::Dot) {
                self.expect(Token::Operator, "'*' in on-demand import")?;
                unit.wildcard_imports.push(name);
            } else {
                unit.imports.push(name);
            }
            self.expect(Token::Semicolon, "';' after import")?;
        }
        while self.peek().is_some() {
            if self.eat(Token::Semicolon) {
                continue;
            }
            let modifiers = self.modifiers()?;
            self.type_declaration(modifiers, None, &mut unit.types)?;
        }
        Ok(unit)
    }

    fn modifiers(&mut self) -> RegistryResult<u16> {
        let mut flags = 0;
        loop {
            flags |= match self.peek() {
                Some(Token::Public) => ACC_PUBLIC,
                Some(Token::Protected) => ACC_PROTECTED,
                Some(Token::Private) => ACC_PRIVATE,
                Some(Token::Abstract) => ACC_ABSTRACT,
                Some(Token::Final) => ACC_FINAL,
                Some(Token::Static) => ACC_STATIC,
                Some(Token::Native) => ACC_NATIVE,
                Some(Token::Synchronized) => ACC_SYNCHRONIZED,
                Some(Token::Transient) => ACC_TRANSIENT,
                Some(Token::Volatile) => ACC_VOLATILE,
                Some(Token::Strictfp) | Some(Token::Default) => 0,
                Some(Token::At) if self.peek_at(1) != Some(Token::Interface) => {
                    self.skip_annotations()?;
                    continue;
                }
                _ => return Ok(flags),
            };
            self.pos += 1;
        }
    }

    fn skip_annotations(&mut self) -> RegistryResult<()> {
        while self.peek() == Some(Token::At) && self.peek_at(1) != Some(Token::Interface) {
            self.pos += 1;
            self.qualified_name()?;
            if self.peek() == Some(Token::LParen) {
                self.skip_balanced(Token::LParen, Token::RParen)?;
            }
        }
        Ok(())
    }

    /// Skip from an opening token to its matching close, inclusive
    fn skip_balanced(&mut self, open: Token, close: Token) -> RegistryResult<()> {
        self.expect(open, "opening delimiter")?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance().map(|t| t.token) {
                Some(t) if t == open => depth += 1,
                Some(t) if t == close => depth -= 1,
                Some(_) => {}
                None => return Err(self.error("closing delimiter")),
            }
        }
        Ok(())
    }

    fn skip_type_arguments(&mut self) -> RegistryResult<()> {
        if self.peek() == Some(Token::Lt) {
            self.skip_balanced(Token::Lt, Token::Gt)?;
        }
        Ok(())
    }

    fn type_declaration(
        &mut self,
        modifiers: u16,
        outer: Option<&str>,
        out: &mut Vec<ParsedType>,
    ) -> RegistryResult<()> {
        let is_interface = match self.peek() {
            Some(Token::Class) => false,
            Some(Token::Interface) => true,
            _ => return Err(self.error("'class' or 'interface'")),
        };
        self.pos += 1;
        let simple = self.identifier()?;
        let name = match outer {
            Some(outer) => format!("{}${}", outer, simple),
            None => simple,
        };
        self.skip_type_arguments()?;

        let mut extends = Vec::new();
        let mut implements = Vec::new();
        if self.eat(Token::Extends) {
            extends = self.type_name_list()?;
        }
        if self.eat(Token::Implements) {
            implements = self.type_name_list()?;
        }

        let mut declared = ParsedType {
            modifiers: if is_interface { modifiers | ACC_INTERFACE | ACC_ABSTRACT } else { modifiers },
            is_interface,
            name: name.clone(),
            extends,
            implements,
            fields: Vec::new(),
            methods: Vec::new(),
        };
        let mut nested = Vec::new();
        self.class_body(&mut declared, &mut nested)?;
        out.push(declared);
        out.extend(nested);
        Ok(())
    }

    fn type_name_list(&mut self) -> RegistryResult<Vec<String>> {
        let mut names = Vec::new();
        loop {
            names.push(self.qualified_name()?);
            self.skip_type_arguments()?;
            if !self.eat(Token::Comma) {
                return Ok(names);
            }
        }
    }

    fn class_body(&mut self, declared: &mut ParsedType, nested: &mut Vec<ParsedType>) -> RegistryResult<()> {
        self.expect(Token::LBrace, "'{' to open type body")?;
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(Token::Semicolon) => {
                    self.pos += 1;
                }
                Some(Token::LBrace) => {
                    // instance initializer
                    self.skip_balanced(Token::LBrace, Token::RBrace)?;
                }
                Some(Token::Static) if self.peek_at(1) == Some(Token::LBrace) => {
                    self.pos += 1;
                    self.skip_balanced(Token::LBrace, Token::RBrace)?;
                }
                Some(_) => self.member(declared, nested)?,
                None => return Err(self.error("'}' to close type body")),
            }
        }
    }

    fn member(&mut self, declared: &mut ParsedType, nested: &mut Vec<ParsedType>) -> RegistryResult<()> {
        let mut modifiers = self.modifiers()?;
        if matches!(self.peek(), Some(Token::Class) | Some(Token::Interface)) {
            let outer = declared.name.clone();
            return self.type_declaration(modifiers, Some(&outer), nested);
        }
        self.skip_type_arguments()?;

        // Constructor: Name '('
        if self.peek() == Some(Token::Identifier) && self.peek_at(1) == Some(Token::LParen) {
            let simple = declared.name.rsplit('$').next().unwrap_or_default().to_string();
            let name = self.identifier()?;
            if name != simple {
                return Err(self.error("return type"));
            }
            let params = self.parameters()?;
            let throws = self.throws_clause()?;
            self.method_tail()?;
            declared.methods.push(ParsedMethod {
                modifiers,
                name: "<init>".to_string(),
                params,
                ret: TypeRef { name: "void".to_string(), dims: 0 },
                throws,
            });
            return Ok(());
        }

        let ty = self.type_ref()?;
        let name = self.identifier()?;
        if self.peek() == Some(Token::LParen) {
            let params = self.parameters()?;
            let mut ret = ty;
            ret.dims += self.dims();
            let throws = self.throws_clause()?;
            let has_body = self.method_tail()?;
            if declared.is_interface && !has_body && modifiers & ACC_STATIC == 0 {
                modifiers |= ACC_PUBLIC | ACC_ABSTRACT;
            } else if declared.is_interface {
                modifiers |= ACC_PUBLIC;
            }
            declared.methods.push(ParsedMethod { modifiers, name, params, ret, throws });
            return Ok(());
        }

        if declared.is_interface {
            modifiers |= ACC_PUBLIC | ACC_STATIC | ACC_FINAL;
        }
        let mut current = name;
        loop {
            let dims = self.dims();
            declared.fields.push(ParsedField {
                modifiers,
                name: current,
                ty: TypeRef { name: ty.name.clone(), dims: ty.dims + dims },
            });
            if self.eat(Token::Assign) {
                self.skip_initializer()?;
            }
            if self.eat(Token::Comma) {
                current = self.identifier()?;
                continue;
            }
            return self.expect(Token::Semicolon, "';' after field declaration");
        }
    }

    /// Skip a field initializer up to (not including) the next top-level ',' or ';'
    fn skip_initializer(&mut self) -> RegistryResult<()> {
        loop {
            match self.peek() {
                Some(Token::Comma) | Some(Token::Semicolon) => return Ok(()),
                Some(Token::LParen) => self.skip_balanced(Token::LParen, Token::RParen)?,
                Some(Token::LBrace) => self.skip_balanced(Token::LBrace, Token::RBrace)?,
                Some(Token::LBracket) => self.skip_balanced(Token::LBracket, Token::RBracket)?,
                Some(_) => self.pos += 1,
                None => return Err(self.error("';' after initializer")),
            }
        }
    }

    /// `;` or a body; returns whether a body was present
    fn method_tail(&mut self) -> RegistryResult<bool> {
        if self.eat(Token::Semicolon) {
            return Ok(false);
        }
        if self.eat(Token::Default) {
            self.skip_initializer()?;
            self.expect(Token::Semicolon, "';'")?;
            return Ok(false);
        }
        if self.peek() == Some(Token::LBrace) {
            self.skip_balanced(Token::LBrace, Token::RBrace)?;
            return Ok(true);
        }
        Err(self.error("';' or method body"))
    }

    fn dims(&mut self) -> usize {
        let mut dims = 0;
        while self.peek() == Some(Token::LBracket) && self.peek_at(1) == Some(Token::RBracket) {
            self.pos += 2;
            dims += 1;
        }
        dims
    }

    fn type_ref(&mut self) -> RegistryResult<TypeRef> {
        let name = match self.peek() {
            Some(Token::Void) => "void".to_string(),
            Some(Token::Boolean) => "boolean".to_string(),
            Some(Token::Byte) => "byte".to_string(),
            Some(Token::Char) => "char".to_string(),
            Some(Token::Short) => "short".to_string(),
            Some(Token::Int) => "int".to_string(),
            Some(Token::Long) => "long".to_string(),
            Some(Token::Float) => "float".to_string(),
            Some(Token::Double) => "double".to_string(),
            Some(Token::Identifier) => {
                let name = self.qualified_name()?;
                self.skip_type_arguments()?;
                let dims = self.dims();
                return Ok(TypeRef { name, dims });
            }
            _ => return Err(self.error("type")),
        };
        self.pos += 1;
        let dims = self.dims();
        Ok(TypeRef { name, dims })
    }

    fn parameters(&mut self) -> RegistryResult<Vec<TypeRef>> {
        self.expect(Token::LParen, "'('")?;
        let mut params = Vec::new();
        if self.eat(Token::RParen) {
            return Ok(params);
        }
        loop {
            self.modifiers()?;
            let mut ty = self.type_ref()?;
            if self.eat(Token::Ellipsis) {
                ty.dims += 1;
            }
            self.identifier()?;
            ty.dims += self.dims();
            params.push(ty);
            if self.eat(Token::Comma) {
                continue;
            }
            self.expect(Token::RParen, "')' after parameters")?;
            return Ok(params);
        }
    }

    fn throws_clause(&mut self) -> RegistryResult<Vec<String>> {
        if self.eat(Token::Throws) {
            self.type_name_list()
        } else {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_interface() {
        let unit = parse(
            "package demo.events;\n\
             import java.util.EventListener;\n\
             import java.awt.event.*;\n\
             public interface ClickListener extends EventListener {\n\
                 int MAX = 3, MIN = -1;\n\
                 void onClick(ActionEvent e);\n\
                 void onMove(int x, long y, String... tags) throws java.io.IOException, Oops;\n\
             }",
        )
        .unwrap();
        assert_eq!(unit.package.as_deref(), Some("demo.events"));
        assert_eq!(unit.imports, vec!["java.util.EventListener".to_string()]);
        assert_eq!(unit.wildcard_imports, vec!["java.awt.event".to_string()]);
        let ty = &unit.types[0];
        assert!(ty.is_interface);
        assert_eq!(ty.extends, vec!["EventListener".to_string()]);
        assert_eq!(ty.fields.len(), 2);
        assert_eq!(ty.methods.len(), 2);
        let on_move = &ty.methods[1];
        assert_eq!(on_move.params[2], TypeRef { name: "String".to_string(), dims: 1 });
        assert_eq!(on_move.throws, vec!["java.io.IOException".to_string(), "Oops".to_string()]);
        assert_eq!(on_move.modifiers & (ACC_PUBLIC | ACC_ABSTRACT), ACC_PUBLIC | ACC_ABSTRACT);
    }

    #[test]
    fn test_class_with_bodies_and_nested_type() {
        let unit = parse(
            "public class Holder<T extends Object> extends Base implements A, B<T> {\n\
                 private static final String NAME = \"x\" + (1 + 2);\n\
                 static { init(); }\n\
                 public Holder(int size) { this.size = size; }\n\
                 public synchronized T[] get(int i) [] { return null; }\n\
                 @Deprecated protected native void poke();\n\
                 public static class Inner { void run() {} }\n\
             }",
        )
        .unwrap();
        assert_eq!(unit.types.len(), 2);
        let holder = &unit.types[0];
        assert_eq!(holder.extends, vec!["Base".to_string()]);
        assert_eq!(holder.implements, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(holder.methods[0].name, "<init>");
        assert_eq!(holder.methods[1].ret, TypeRef { name: "T".to_string(), dims: 2 });
        assert_eq!(holder.methods[2].modifiers, ACC_PROTECTED | ACC_NATIVE);
        assert_eq!(unit.types[1].name, "Holder$Inner");
    }

    #[test]
    fn test_parse_error_location() {
        let err = parse("interface X {\n  void f(int);\n}").unwrap_err();
        match err {
            RegistryError::Parse { line, expected, .. } => {
                assert_eq!(line, 2);
                assert_eq!(expected, "identifier");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
