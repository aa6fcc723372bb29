//! Abstract Syntax Tree for GCode
//!
//! Clean, minimal types representing parsed GCode structure.
//! No interpretation logic - pure data representation.

use std::fmt;

use crate::parser::lexer::{Token, TokenKind};

/// A parsed line of GCode
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// A GCode command with parameters and optional comment
    Command(Command),
    /// A comment-only line
    Comment(Comment),
    /// An empty or whitespace-only line
    Empty,
}

impl ParsedLine {
    /// The comments carried by this line, joined with a space
    pub fn comment(&self) -> Option<&Comment> {
        match self {
            ParsedLine::Command(cmd) => cmd.comment.as_ref(),
            ParsedLine::Comment(comment) => Some(comment),
            ParsedLine::Empty => None,
        }
    }
}

/// A GCode command like "G1", "M104" or "T0"
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Normalized command word (e.g., "G1", "M104", "SET_FAN_SPEED")
    pub name: String,
    /// Command letter, upper case
    pub letter: char,
    /// Numeric code after the letter; `None` for `Tc`, `T?` or extended words
    pub code: Option<u32>,
    /// Decimal sub-code, e.g. the `1` of `G29.1`
    pub subcode: Option<u32>,
    /// Multi-letter macro-style command word
    pub extended: bool,
    /// Command parameters (e.g., X10, Y20)
    pub parameters: Vec<Parameter>,
    /// Raw argument text of string commands and extended commands
    pub text: Option<String>,
    /// Optional trailing comment
    pub comment: Option<Comment>,
}

impl Command {
    /// Value of the first parameter with the given letter, if it carries one
    pub fn value(&self, letter: char) -> Option<f64> {
        self.parameters
            .iter()
            .find(|p| p.letter == letter)
            .and_then(|p| p.value)
    }

    /// Whether a parameter with the given letter is present, with or without value
    pub fn has(&self, letter: char) -> bool {
        self.parameters.iter().any(|p| p.letter == letter)
    }
}

/// A command parameter like "X10" or "S255"
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter letter, upper case
    pub letter: char,
    /// Numeric value; `None` for flag words like the `X` of `G28 X`
    pub value: Option<f64>,
}

/// A comment (semicolon or parenthetical)
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Comment text (without the delimiters)
    pub text: String,
}

/// Why a line could not be parsed
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnterminatedComment,
    InvalidCommandCode(String),
    InvalidParameterValue { letter: char, value: String },
    UnexpectedText(String),
    MissingCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnterminatedComment => write!(f, "unterminated '(' comment"),
            ParseError::InvalidCommandCode(name) => write!(f, "invalid command code '{}'", name),
            ParseError::InvalidParameterValue { letter, value } => {
                write!(f, "parameter '{}' has non-numeric value '{}'", letter, value)
            }
            ParseError::UnexpectedText(text) => write!(f, "unexpected text '{}'", text),
            ParseError::MissingCommand(word) => {
                write!(f, "line starts with '{}' instead of a command", word)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Convert tokens into a parsed line
pub fn tokens_to_parsed_line(tokens: Vec<Token>) -> Result<ParsedLine, ParseError> {
    if let Some(invalid) = tokens.iter().find(|t| t.kind == TokenKind::Invalid) {
        return Err(if invalid.text.starts_with('(') {
            ParseError::UnterminatedComment
        } else {
            ParseError::UnexpectedText(invalid.text.clone())
        });
    }

    // Every comment on the line, joined: `G1 X1 (note) E1 ; tag` keeps both
    let comments: Vec<String> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Comment)
        .map(|t| extract_comment_text(&t.text))
        .collect();
    let comment = (!comments.is_empty()).then(|| Comment {
        text: comments.join(" "),
    });

    let Some(cmd_token) = tokens.iter().find(|t| t.kind == TokenKind::Command) else {
        if let Some(stray) = tokens.iter().find(|t| t.kind == TokenKind::Parameter) {
            return Err(ParseError::MissingCommand(stray.text.clone()));
        }
        return Ok(match comment {
            Some(comment) => ParsedLine::Comment(comment),
            None => ParsedLine::Empty,
        });
    };

    let mut command = parse_command_word(&cmd_token.text)?;

    command.parameters = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Parameter)
        .map(|t| parse_parameter_token(&t.text))
        .collect::<Result<_, _>>()?;

    command.text = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Text)
        .map(|t| t.text.clone());
    command.comment = comment;

    Ok(ParsedLine::Command(command))
}

/// Split a command word like "G29.1" into letter, code and sub-code
fn parse_command_word(text: &str) -> Result<Command, ParseError> {
    let name = text.to_ascii_uppercase();
    let mut chars = name.chars();
    let letter = chars
        .next()
        .ok_or_else(|| ParseError::InvalidCommandCode(text.to_string()))?;
    let digits = chars.as_str();

    let starts_with_word = digits
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let tool_selector = letter == 'T' && digits.len() == 1;
    let extended = (starts_with_word && !tool_selector) || digits.contains('_');

    let (code, subcode) = if extended {
        (None, None)
    } else {
        match parse_code(digits) {
            Some((code, subcode)) => (Some(code), subcode),
            // Tool selectors like "Tc" or "T?" are well formed but carry no index
            None if letter == 'T' => (None, None),
            None => return Err(ParseError::InvalidCommandCode(text.to_string())),
        }
    };

    Ok(Command {
        name,
        letter,
        code,
        subcode,
        extended,
        parameters: Vec::new(),
        text: None,
        comment: None,
    })
}

fn parse_code(digits: &str) -> Option<(u32, Option<u32>)> {
    match digits.split_once('.') {
        Some((code, subcode)) => Some((code.parse().ok()?, Some(subcode.parse().ok()?))),
        None => Some((digits.parse().ok()?, None)),
    }
}

/// Parse a parameter token like "X10.5" into a Parameter
fn parse_parameter_token(text: &str) -> Result<Parameter, ParseError> {
    let mut chars = text.chars();
    let letter = chars
        .next()
        .filter(|c| c.is_ascii_alphabetic())
        .ok_or_else(|| ParseError::UnexpectedText(text.to_string()))?
        .to_ascii_uppercase();

    let raw = chars.as_str();
    if raw.is_empty() {
        return Ok(Parameter {
            letter,
            value: None,
        });
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Parameter {
            letter,
            value: Some(value),
        }),
        _ => Err(ParseError::InvalidParameterValue {
            letter,
            value: raw.to_string(),
        }),
    }
}

/// Extract comment text, removing delimiters
fn extract_comment_text(text: &str) -> String {
    if let Some(stripped) = text.strip_prefix(';') {
        stripped.to_string()
    } else if text.starts_with('(') && text.ends_with(')') {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}
