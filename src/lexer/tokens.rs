//! Token definitions for Ruby snippets
//!
//! This module defines all the tokens that can be produced by the lexer.
//! The tokens are defined using the logos derive macro for efficient tokenization.
//! Literal payloads (names, decoded strings, numbers) are carried on the token so the
//! grammar never has to look back at the source text.
use logos::{Lexer, Logos};
use std::fmt;

/// Why a piece of source text did not become a token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LexError {
    /// No token pattern matches here
    #[default]
    Unrecognised,
    /// `#{...}`, `#@x` or `#$x` inside a double-quoted string
    Interpolation,
    /// An integer literal that does not fit in 64 bits
    IntegerOutOfRange,
}

/// All possible tokens in a snippet
#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"\\\r?\n")]
pub enum Token {
    // Keywords
    #[token("def")]
    Def,
    #[token("end")]
    End,
    #[token("if")]
    If,
    #[token("elsif")]
    Elsif,
    #[token("else")]
    Else,
    #[token("unless")]
    Unless,
    #[token("while")]
    While,
    #[token("until")]
    Until,
    #[token("case")]
    Case,
    #[token("when")]
    When,
    #[token("then")]
    Then,
    #[token("do")]
    Do,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("next")]
    Next,
    #[token("yield")]
    Yield,
    #[token("class")]
    Class,
    #[token("module")]
    Module,
    #[token("self")]
    SelfKw,
    #[token("nil")]
    Nil,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,

    // Names
    #[regex(r"[a-z_][A-Za-z0-9_]*[?!]?", |lex| lex.slice().to_owned())]
    Ident(String),
    #[regex(r"[A-Z][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Const(String),
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ivar(String),
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Gvar(String),
    /// `name:` inside hash literals
    #[regex(r"[a-z_][A-Za-z0-9_]*[?!]?:", |lex| strip_last(lex.slice()))]
    Label(String),

    // Literals
    #[regex(r"[0-9][0-9_]*", parse_integer)]
    Integer(i64),
    /// Bit pattern of an `f64`, keeping tokens `Eq + Hash`
    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+", parse_float)]
    Float(u64),
    #[regex(r#""([^"\\]|\\[\s\S])*""#, double_quoted)]
    #[regex(r"'([^'\\]|\\[\s\S])*'", single_quoted)]
    Str(String),
    #[regex(r":[A-Za-z_][A-Za-z0-9_]*[?!]?", |lex| lex.slice()[1..].to_owned())]
    #[regex(r":(\*\*|<=>|===?|=~|<<|>>|<=|>=|\[\]=?|[-+*/%<>!&|^])", |lex| lex.slice()[1..].to_owned())]
    Symbol(String),

    // Operators
    #[token("**")]
    Pow,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    /// `-` that opens the first argument of a command call (`fibo -1`); produced by
    /// [`crate::lexer::argument_spacing`], never by logos
    UMinus,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("===")]
    CaseEq,
    #[token("=~")]
    Match,
    #[token("<=>")]
    Spaceship,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,
    #[token("=")]
    Assign,
    /// Compound assignment; carries the operator without its `=` (`+`, `||`, ...)
    #[regex(r"(\*\*|<<|>>|\|\||&&|[-+*/%|&^])=", |lex| strip_last(lex.slice()))]
    OpAssign(String),
    #[token("=>")]
    Arrow,
    #[token("..")]
    DotDot,
    #[token("...")]
    DotDotDot,

    // Punctuation
    #[token(".")]
    Dot,
    #[token("::")]
    ColonColon,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    /// `[` that opens an array argument of a command call (`puts [1]`); produced by
    /// [`crate::lexer::argument_spacing`], never by logos
    LBracketArg,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Line breaks
    #[token("\n")]
    Newline,
}

fn strip_last(slice: &str) -> String {
    slice[..slice.len() - 1].to_owned()
}

fn parse_integer(lex: &mut Lexer<Token>) -> Result<i64, LexError> {
    lex.slice()
        .replace('_', "")
        .parse()
        .map_err(|_| LexError::IntegerOutOfRange)
}

fn parse_float(lex: &mut Lexer<Token>) -> Option<u64> {
    lex.slice()
        .replace('_', "")
        .parse::<f64>()
        .ok()
        .map(f64::to_bits)
}

fn double_quoted(lex: &mut Lexer<Token>) -> Result<String, LexError> {
    let slice = lex.slice();
    let mut value = String::with_capacity(slice.len());
    let mut chars = slice[1..slice.len() - 1].chars();

    while let Some(ch) = chars.next() {
        if ch == '#' && interpolates(chars.clone()) {
            return Err(LexError::Interpolation);
        }
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some('s') => value.push(' '),
            Some('0') => value.push('\0'),
            Some('e') => value.push('\u{1b}'),
            // A backslash before a line break joins the lines
            Some('\n') => {}
            Some(other) => value.push(other),
            None => {}
        }
    }

    Ok(value)
}

/// Check if the text after an unescaped `#` opens an interpolation
fn interpolates(mut rest: impl Iterator<Item = char>) -> bool {
    match rest.next() {
        Some('{') => true,
        Some('@') => {
            matches!(rest.next(), Some(c) if c == '@' || c == '_' || c.is_ascii_alphabetic())
        }
        Some('$') => matches!(rest.next(), Some(c) if c == '_' || c.is_ascii_alphabetic()),
        _ => false,
    }
}

fn single_quoted(lex: &mut Lexer<Token>) -> String {
    let slice = lex.slice();
    let mut value = String::with_capacity(slice.len());
    let mut chars = slice[1..slice.len() - 1].chars().peekable();

    while let Some(ch) = chars.next() {
        match (ch, chars.peek()) {
            ('\\', Some(&next)) if next == '\\' || next == '\'' => {
                value.push(next);
                chars.next();
            }
            _ => value.push(ch),
        }
    }

    value
}

impl Token {
    /// Check if a line break right after this token cannot end the statement
    pub fn continues_line(&self) -> bool {
        self.is_binary_operator()
            || matches!(
                self,
                Token::Newline
                    | Token::Semicolon
                    | Token::Comma
                    | Token::Dot
                    | Token::ColonColon
                    | Token::Assign
                    | Token::OpAssign(_)
                    | Token::Arrow
                    | Token::LParen
                    | Token::LBracket
                    | Token::LBracketArg
                    | Token::LBrace
                    | Token::Question
                    | Token::Colon
                    | Token::DotDot
                    | Token::DotDotDot
                    | Token::And
                    | Token::Or
                    | Token::Not
                    | Token::Bang
            )
    }

    /// Check if this token is an infix operator that maps onto a method call
    pub fn is_binary_operator(&self) -> bool {
        matches!(
            self,
            Token::Pow
                | Token::Star
                | Token::Slash
                | Token::Percent
                | Token::Plus
                | Token::Minus
                | Token::UMinus
                | Token::EqEq
                | Token::NotEq
                | Token::CaseEq
                | Token::Match
                | Token::Spaceship
                | Token::Lt
                | Token::LtEq
                | Token::Gt
                | Token::GtEq
                | Token::Shl
                | Token::Shr
                | Token::AndAnd
                | Token::OrOr
                | Token::Amp
                | Token::Pipe
                | Token::Caret
        )
    }

    /// Check if this token can open the first argument of a call written without
    /// parentheses (`fibo 10`, `puts name`).
    ///
    /// A plain `-` or `[` never does: `n - 1` is a subtraction and `list [0]` an index.
    /// Only their spacing-resolved forms open an argument.
    pub fn starts_command_argument(&self) -> bool {
        matches!(
            self,
            Token::Ident(_)
                | Token::UMinus
                | Token::LBracketArg
                | Token::Const(_)
                | Token::Ivar(_)
                | Token::Gvar(_)
                | Token::Integer(_)
                | Token::Float(_)
                | Token::Str(_)
                | Token::Symbol(_)
                | Token::Nil
                | Token::True
                | Token::False
                | Token::SelfKw
        )
    }

    /// Method name an operator token dispatches to
    pub fn operator_name(&self) -> Option<&'static str> {
        let name = match self {
            Token::Pow => "**",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Plus => "+",
            Token::Minus | Token::UMinus => "-",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::CaseEq => "===",
            Token::Match => "=~",
            Token::Spaceship => "<=>",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Shl => "<<",
            Token::Shr => ">>",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            _ => return None,
        };
        Some(name)
    }
}

impl Token {
    /// Keywords double as method names after a dot (`obj.class`, `x.then`)
    pub fn keyword_name(&self) -> Option<&'static str> {
        match self {
            Token::Def
            | Token::End
            | Token::If
            | Token::Elsif
            | Token::Else
            | Token::Unless
            | Token::While
            | Token::Until
            | Token::Case
            | Token::When
            | Token::Then
            | Token::Do
            | Token::Return
            | Token::Break
            | Token::Next
            | Token::Yield
            | Token::Class
            | Token::Module
            | Token::SelfKw
            | Token::Nil
            | Token::True
            | Token::False
            | Token::And
            | Token::Or
            | Token::Not => Some(self.fixed_text()),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier `{}`", name),
            Token::Const(name) => write!(f, "constant `{}`", name),
            Token::Ivar(name) | Token::Gvar(name) => write!(f, "variable `{}`", name),
            Token::Label(name) => write!(f, "label `{}:`", name),
            Token::Integer(value) => write!(f, "integer `{}`", value),
            Token::Float(bits) => write!(f, "float `{:?}`", f64::from_bits(*bits)),
            Token::Str(_) => f.write_str("string literal"),
            Token::Symbol(name) => write!(f, "symbol `:{}`", name),
            Token::OpAssign(op) => write!(f, "`{}=`", op),
            Token::Newline => f.write_str("end of line"),
            other => write!(f, "`{}`", other.fixed_text()),
        }
    }
}

impl Token {
    /// Source text of tokens that have exactly one spelling
    fn fixed_text(&self) -> &'static str {
        match self {
            Token::Def => "def",
            Token::End => "end",
            Token::If => "if",
            Token::Elsif => "elsif",
            Token::Else => "else",
            Token::Unless => "unless",
            Token::While => "while",
            Token::Until => "until",
            Token::Case => "case",
            Token::When => "when",
            Token::Then => "then",
            Token::Do => "do",
            Token::Return => "return",
            Token::Break => "break",
            Token::Next => "next",
            Token::Yield => "yield",
            Token::Class => "class",
            Token::Module => "module",
            Token::SelfKw => "self",
            Token::Nil => "nil",
            Token::True => "true",
            Token::False => "false",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Bang => "!",
            Token::Assign => "=",
            Token::Arrow => "=>",
            Token::DotDot => "..",
            Token::DotDotDot => "...",
            Token::Dot => ".",
            Token::ColonColon => "::",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Question => "?",
            Token::Colon => ":",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket | Token::LBracketArg => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            other => other.operator_name().unwrap_or("?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<Token> {
        Token::lexer(source).filter_map(|result| result.ok()).collect()
    }

    #[test]
    fn test_keywords_win_over_identifiers() {
        assert_eq!(
            lex_all("def define end"),
            vec![Token::Def, Token::Ident("define".into()), Token::End]
        );
    }

    #[test]
    fn test_names() {
        assert_eq!(
            lex_all("fibo Fibo @memo $stdout empty?"),
            vec![
                Token::Ident("fibo".into()),
                Token::Const("Fibo".into()),
                Token::Ivar("@memo".into()),
                Token::Gvar("$stdout".into()),
                Token::Ident("empty?".into()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            lex_all("10 1_000 1.5 1e5 2.5E-1"),
            vec![
                Token::Integer(10),
                Token::Integer(1000),
                Token::Float(1.5f64.to_bits()),
                Token::Float(1e5f64.to_bits()),
                Token::Float(0.25f64.to_bits()),
            ]
        );
    }

    #[test]
    fn test_integer_overflow() {
        let mut lexer = Token::lexer("99999999999999999999");
        assert_eq!(lexer.next(), Some(Err(LexError::IntegerOutOfRange)));
        assert_eq!(lexer.span(), 0..20);
    }

    #[test]
    fn test_range_is_not_a_float() {
        assert_eq!(
            lex_all("1..10"),
            vec![Token::Integer(1), Token::DotDot, Token::Integer(10)]
        );
    }

    #[test]
    fn test_strings_are_decoded() {
        assert_eq!(
            lex_all(r#""a\tb" 'it\'s'"#),
            vec![Token::Str("a\tb".into()), Token::Str("it's".into())]
        );
    }

    #[test]
    fn test_interpolation_is_rejected() {
        for source in [r##""#{n}""##, r##""a #@name""##, r##""#$stdout""##] {
            let mut lexer = Token::lexer(source);
            assert_eq!(lexer.next(), Some(Err(LexError::Interpolation)), "{}", source);
        }
    }

    #[test]
    fn test_escaped_or_bare_hash_is_text() {
        assert_eq!(
            lex_all(r##""\#{n}" "# 1" "a#@" '#{n}'"##),
            vec![
                Token::Str("#{n}".into()),
                Token::Str("# 1".into()),
                Token::Str("a#@".into()),
                Token::Str("#{n}".into()),
            ]
        );
    }

    #[test]
    fn test_symbols_and_labels() {
        assert_eq!(
            lex_all(":fibo :+ key: ::"),
            vec![
                Token::Symbol("fibo".into()),
                Token::Symbol("+".into()),
                Token::Label("key".into()),
                Token::ColonColon,
            ]
        );
    }

    #[test]
    fn test_operators_prefer_longest_match() {
        assert_eq!(
            lex_all("<=> <= << <<= ** **= ||= ..."),
            vec![
                Token::Spaceship,
                Token::LtEq,
                Token::Shl,
                Token::OpAssign("<<".into()),
                Token::Pow,
                Token::OpAssign("**".into()),
                Token::OpAssign("||".into()),
                Token::DotDotDot,
            ]
        );
    }

    #[test]
    fn test_comments_and_continuations_are_skipped() {
        assert_eq!(
            lex_all("a # comment\nb \\\n c"),
            vec![
                Token::Ident("a".into()),
                Token::Newline,
                Token::Ident("b".into()),
                Token::Ident("c".into()),
            ]
        );
    }

    #[test]
    fn test_token_predicates() {
        assert!(Token::Plus.is_binary_operator());
        assert!(!Token::Bang.is_binary_operator());

        assert!(Token::Comma.continues_line());
        assert!(!Token::RParen.continues_line());

        assert!(Token::Integer(1).starts_command_argument());
        assert!(!Token::Minus.starts_command_argument());
        assert!(!Token::LBracket.starts_command_argument());
        assert!(Token::UMinus.starts_command_argument());
        assert!(Token::LBracketArg.starts_command_argument());
    }

    #[test]
    fn test_token_display() {
        assert_eq!(Token::RParen.to_string(), "`)`");
        assert_eq!(Token::Def.to_string(), "`def`");
        assert_eq!(Token::Ident("n".into()).to_string(), "identifier `n`");
        assert_eq!(Token::Newline.to_string(), "end of line");
        assert_eq!(Token::OpAssign("+".into()).to_string(), "`+=`");
        assert_eq!(Token::UMinus.to_string(), "`-`");
        assert_eq!(Token::LBracketArg.to_string(), "`[`");
    }
}
