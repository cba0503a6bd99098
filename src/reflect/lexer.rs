use logos::Logos;

use super::error::{RegistryError, RegistryResult};

/// Tokens of Java-like class and interface declarations
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Token {
    // Keywords
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("public")]
    Public,
    #[token("protected")]
    Protected,
    #[token("private")]
    Private,
    #[token("abstract")]
    Abstract,
    #[token("final")]
    Final,
    #[token("static")]
    Static,
    #[token("native")]
    Native,
    #[token("synchronized")]
    Synchronized,
    #[token("transient")]
    Transient,
    #[token("volatile")]
    Volatile,
    #[token("strictfp")]
    Strictfp,
    #[token("default")]
    Default,
    #[token("class")]
    Class,
    #[token("interface")]
    Interface,
    #[token("extends")]
    Extends,
    #[token("implements")]
    Implements,
    #[token("throws")]
    Throws,

    // Primitive type names
    #[token("void")]
    Void,
    #[token("boolean")]
    Boolean,
    #[token("byte")]
    Byte,
    #[token("char")]
    Char,
    #[token("short")]
    Short,
    #[token("int")]
    Int,
    #[token("long")]
    Long,
    #[token("float")]
    Float,
    #[token("double")]
    Double,

    // Separators
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("...")]
    Ellipsis,
    #[token(".")]
    Dot,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("?")]
    Question,
    #[token("&")]
    Amp,
    #[token("@")]
    At,
    #[token("=")]
    Assign,
    #[regex(r"[-+*/%|^~!:]")]
    Operator,

    // Literals only matter inside skipped initializers and bodies
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,
    #[regex(r"'([^'\\\n]|\\.)*'")]
    CharLiteral,
    #[regex(r"[0-9][0-9a-zA-Z_.]*")]
    NumberLiteral,

    // Identifiers
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Identifier,

    // Trivia
    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/", priority = 3)]
    BlockComment,
    #[regex(r"[ \t\n\r\f]+")]
    Whitespace,
    #[token("\u{FEFF}")]
    Bom,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::Bom | Token::LineComment | Token::BlockComment)
    }
}

/// Token with its text and 1-based position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalToken {
    pub token: Token,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl LexicalToken {
    pub fn is(&self, token: Token) -> bool {
        self.token == token
    }
}

pub struct Lexer<'a> {
    lexer: logos::Lexer<'a, Token>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { lexer: Token::lexer(source), line: 1, column: 1 }
    }

    /// Get the next token, trivia included
    pub fn next_token(&mut self) -> Option<RegistryResult<LexicalToken>> {
        let token = self.lexer.next()?;
        let lexeme = self.lexer.slice().to_string();
        let (line, column) = (self.line, self.column);
        self.update_position(&lexeme);
        Some(match token {
            Ok(token) => Ok(LexicalToken { token, lexeme, line, column }),
            Err(()) => Err(RegistryError::Lex { line, column, found: lexeme }),
        })
    }

    fn update_position(&mut self, lexeme: &str) {
        for ch in lexeme.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// All significant tokens of the source
    pub fn tokenize(mut self) -> RegistryResult<Vec<LexicalToken>> {
        let mut tokens = Vec::new();
        while let Some(result) = self.next_token() {
            let token = result?;
            if !token.token.is_trivia() {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }
}
