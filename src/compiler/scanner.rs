use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take, take_while};
use nom::character::complete::{alpha1, alphanumeric1, char, digit1, multispace1, one_of};
use nom::combinator::{opt, recognize, rest, value};
use nom::error::{context, Error};
use nom::multi::many0;
use nom::sequence::{delimited, pair};
use nom::IResult;
use nom_locate::LocatedSpan;

use crate::vm::byte_code::chunk::LineNumber;

pub type Input<'a> = LocatedSpan<&'a str>;

pub type ParseResult<'a, T> = IResult<Input<'a>, T, Error<Input<'a>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    // one or two characters
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    // literals
    Identifier,
    String,
    Number,
    // keywords
    And,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    Error,
    Eof,
}

/// A lexeme together with its position in the source.
///
/// For `TokenKind::Error` the lexeme holds the error message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub line: LineNumber,
    pub offset: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, lexeme: &'a str, line: LineNumber, offset: usize) -> Self {
        Self {
            kind,
            lexeme,
            line,
            offset,
        }
    }

    fn from_span(kind: TokenKind, span: Input<'a>) -> Self {
        Self::new(
            kind,
            *span.fragment(),
            span.location_line(),
            span.location_offset(),
        )
    }

    fn error(message: &'static str, at: Input<'a>) -> Self {
        Self::new(
            TokenKind::Error,
            message,
            at.location_line(),
            at.location_offset(),
        )
    }

    /// Byte range of the token in the source
    pub fn span(&self) -> std::ops::Range<usize> {
        match self.kind {
            TokenKind::Error => self.offset..self.offset + 1,
            _ => self.offset..self.offset + self.lexeme.len(),
        }
    }
}

/// Split `source` into tokens.
///
/// Scanning never fails. Malformed input turns into `TokenKind::Error` tokens
/// and the result always ends with a single `TokenKind::Eof`.
pub fn scan(source: &str) -> Vec<Token<'_>> {
    let mut tokens = vec![];
    let mut input = Input::new(source);

    loop {
        if let Ok((remaining, _)) = parse_inter_token_space(input) {
            input = remaining;
        }

        if input.fragment().is_empty() {
            tokens.push(Token::from_span(TokenKind::Eof, input));
            break;
        }

        match parse_token(input) {
            Ok((remaining, token)) => {
                tokens.push(token);
                input = remaining;
            }
            Err(_) if input.fragment().starts_with('"') => {
                // everything up to the end of the source belongs to the string
                tokens.push(Token::error("Unterminated string.", input));
                match rest::<Input, Error<Input>>(input) {
                    Ok((remaining, _)) => input = remaining,
                    Err(_) => break,
                }
            }
            Err(_) => {
                tokens.push(Token::error("Unexpected character.", input));
                match skip_char(input) {
                    Ok((remaining, _)) => input = remaining,
                    Err(_) => break,
                }
            }
        }
    }

    log::trace!("scanned {} tokens", tokens.len());
    tokens
}

fn skip_char(input: Input) -> ParseResult<Input> {
    take(1usize)(input)
}

#[inline]
pub fn parse_inter_token_space(input: Input) -> ParseResult<()> {
    value((), many0(alt((multispace1, parse_line_comment))))(input)
}

#[inline]
fn parse_line_comment(input: Input) -> ParseResult<Input> {
    context("comment", recognize(pair(tag("//"), opt(is_not("\n")))))(input)
}

fn parse_token(input: Input) -> ParseResult<Token> {
    alt((
        parse_number,
        parse_string,
        parse_identifier_or_keyword,
        parse_operator,
    ))(input)
}

#[inline]
fn parse_number(input: Input) -> ParseResult<Token> {
    let (rest, span) = context(
        "number",
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
    )(input)?;
    Ok((rest, Token::from_span(TokenKind::Number, span)))
}

// The lexeme keeps its quotes. Strings may span lines and have no escapes.
#[inline]
fn parse_string(input: Input) -> ParseResult<Token> {
    let (rest, span) = context(
        "string",
        recognize(delimited(char('"'), take_while(|c: char| c != '"'), char('"'))),
    )(input)?;
    Ok((rest, Token::from_span(TokenKind::String, span)))
}

#[inline]
fn parse_identifier_or_keyword(input: Input) -> ParseResult<Token> {
    let (rest, span) = context(
        "identifier",
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
    )(input)?;
    Ok((rest, Token::from_span(keyword(span.fragment()), span)))
}

fn keyword(identifier: &str) -> TokenKind {
    use TokenKind::*;

    match identifier {
        "and" => And,
        "class" => Class,
        "else" => Else,
        "false" => False,
        "for" => For,
        "fun" => Fun,
        "if" => If,
        "nil" => Nil,
        "or" => Or,
        "print" => Print,
        "return" => Return,
        "super" => Super,
        "this" => This,
        "true" => True,
        "var" => Var,
        "while" => While,
        _ => Identifier,
    }
}

#[inline]
fn parse_operator(input: Input) -> ParseResult<Token> {
    let (rest, span) = alt((
        tag("!="),
        tag("=="),
        tag("<="),
        tag(">="),
        recognize(one_of("(){},.-+;/*!=<>")),
    ))(input)?;
    Ok((rest, Token::from_span(operator(span.fragment()), span)))
}

fn operator(lexeme: &str) -> TokenKind {
    use TokenKind::*;

    match lexeme {
        "(" => LeftParen,
        ")" => RightParen,
        "{" => LeftBrace,
        "}" => RightBrace,
        "," => Comma,
        "." => Dot,
        "-" => Minus,
        "+" => Plus,
        ";" => Semicolon,
        "/" => Slash,
        "*" => Star,
        "!=" => BangEqual,
        "!" => Bang,
        "==" => EqualEqual,
        "=" => Equal,
        "<=" => LessEqual,
        "<" => Less,
        ">=" => GreaterEqual,
        ">" => Greater,
        _ => TokenKind::Error,
    }
}
