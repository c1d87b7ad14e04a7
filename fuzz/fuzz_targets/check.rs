#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

/// Token-level building blocks, so most inputs get past the lexer.
#[derive(Arbitrary, Debug)]
enum FuzzToken {
    Ident(u8),
    ClassName(u8),
    IntLit(u8),
    StringLit,
    Class,
    Def,
    Extends,
    If,
    Elif,
    Else,
    While,
    Return,
    Typecase,
    And,
    Or,
    Not,
    True,
    None,
    This,
    Plus,
    Minus,
    Star,
    Less,
    EqEq,
    Assign,
    Colon,
    Semicolon,
    Comma,
    Dot,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
}

impl FuzzToken {
    fn text(&self) -> String {
        match self {
            FuzzToken::Ident(n) => format!("v{}", n % 4),
            FuzzToken::ClassName(n) => ["Obj", "Int", "String", "A", "B"][*n as usize % 5].to_string(),
            FuzzToken::IntLit(n) => n.to_string(),
            FuzzToken::StringLit => "\"s\"".to_string(),
            FuzzToken::Class => "class".to_string(),
            FuzzToken::Def => "def".to_string(),
            FuzzToken::Extends => "extends".to_string(),
            FuzzToken::If => "if".to_string(),
            FuzzToken::Elif => "elif".to_string(),
            FuzzToken::Else => "else".to_string(),
            FuzzToken::While => "while".to_string(),
            FuzzToken::Return => "return".to_string(),
            FuzzToken::Typecase => "typecase".to_string(),
            FuzzToken::And => "and".to_string(),
            FuzzToken::Or => "or".to_string(),
            FuzzToken::Not => "not".to_string(),
            FuzzToken::True => "true".to_string(),
            FuzzToken::None => "none".to_string(),
            FuzzToken::This => "this".to_string(),
            FuzzToken::Plus => "+".to_string(),
            FuzzToken::Minus => "-".to_string(),
            FuzzToken::Star => "*".to_string(),
            FuzzToken::Less => "<".to_string(),
            FuzzToken::EqEq => "==".to_string(),
            FuzzToken::Assign => "=".to_string(),
            FuzzToken::Colon => ":".to_string(),
            FuzzToken::Semicolon => ";".to_string(),
            FuzzToken::Comma => ",".to_string(),
            FuzzToken::Dot => ".".to_string(),
            FuzzToken::LeftParen => "(".to_string(),
            FuzzToken::RightParen => ")".to_string(),
            FuzzToken::LeftBrace => "{".to_string(),
            FuzzToken::RightBrace => "}".to_string(),
        }
    }
}

fuzz_target!(|tokens: Vec<FuzzToken>| {
    let source = tokens.iter().map(FuzzToken::text).collect::<Vec<_>>().join(" ");
    // Whole pipeline - should never panic, whatever the input
    let _ = quackc::check_source(&source);
});
