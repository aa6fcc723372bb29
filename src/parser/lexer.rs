//! GCode Lexer
//!
//! Fast, simple tokenization of GCode lines.
//! Focus: extract tokens quickly with minimal allocations.

/// Token types in GCode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// Leading line number like "N120"
    LineNumber,
    /// Command like "G1", "M104", "T0" or an extended word like "SET_FAN_SPEED"
    Command,
    /// Parameter like "X10", "S255"
    Parameter,
    /// Free-form argument text of a string command (M117 message, macro arguments)
    Text,
    /// Comment (semicolon or parenthetical)
    Comment,
    /// Trailing checksum like "*71"
    Checksum,
    /// Anything that cannot start a token, or an unterminated parenthetical comment
    Invalid,
}

/// A token with its text content
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// Tokenize a line of GCode into tokens
///
/// The first word of a line (after an optional line number) is the command;
/// every following word is a parameter. String commands and extended
/// commands keep the rest of the line as a single [`TokenKind::Text`] token.
pub fn tokenize_line(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();
    let mut command_seen = false;

    while let Some((start_idx, ch)) = chars.next() {
        match ch {
            // Skip whitespace
            ' ' | '\t' | '\r' | '\n' => continue,

            // Semicolon comment: consume rest of line
            ';' => {
                tokens.push(Token {
                    kind: TokenKind::Comment,
                    text: line[start_idx..].to_string(),
                });
                break;
            }

            // Parenthetical comment
            '(' => {
                let mut end_idx = line.len();
                let mut found_close = false;

                for (idx, ch) in chars.by_ref() {
                    if ch == ')' {
                        end_idx = idx + 1;
                        found_close = true;
                        break;
                    }
                }

                let kind = if found_close {
                    TokenKind::Comment
                } else {
                    TokenKind::Invalid
                };
                tokens.push(Token {
                    kind,
                    text: line[start_idx..end_idx].to_string(),
                });
            }

            // Checksum: '*' followed by digits
            '*' => {
                let mut end_idx = start_idx + 1;
                while let Some(&(idx, next_ch)) = chars.peek() {
                    if next_ch.is_ascii_digit() {
                        end_idx = idx + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Checksum,
                    text: line[start_idx..end_idx].to_string(),
                });
            }

            // Letter starts command or parameter
            c if c.is_ascii_alphabetic() => {
                let end_idx = consume_word(&mut chars, start_idx + 1);
                let text = line[start_idx..end_idx].to_string();

                if command_seen {
                    tokens.push(Token {
                        kind: TokenKind::Parameter,
                        text,
                    });
                    continue;
                }

                if tokens.is_empty() && is_line_number(&text) {
                    tokens.push(Token {
                        kind: TokenKind::LineNumber,
                        text,
                    });
                    continue;
                }

                command_seen = true;
                if !is_command(&text) {
                    tokens.push(Token {
                        kind: TokenKind::Parameter,
                        text,
                    });
                    continue;
                }

                let raw_arguments = is_extended(&text) || takes_text_argument(&text);
                tokens.push(Token {
                    kind: TokenKind::Command,
                    text,
                });

                if raw_arguments {
                    // Everything up to a semicolon comment belongs to the command
                    let mut text_end = end_idx;
                    while let Some(&(idx, next_ch)) = chars.peek() {
                        if next_ch == ';' {
                            break;
                        }
                        text_end = idx + next_ch.len_utf8();
                        chars.next();
                    }
                    let argument = line[end_idx..text_end].trim();
                    if !argument.is_empty() {
                        tokens.push(Token {
                            kind: TokenKind::Text,
                            text: argument.to_string(),
                        });
                    }
                }
            }

            // Anything else cannot start a token (malformed input)
            _ => {
                let end_idx = consume_word(&mut chars, start_idx + ch.len_utf8());
                tokens.push(Token {
                    kind: TokenKind::Invalid,
                    text: line[start_idx..end_idx].to_string(),
                });
            }
        }
    }

    tokens
}

/// Consume word characters, returning the byte index one past the word
fn consume_word(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    mut end_idx: usize,
) -> usize {
    while let Some(&(idx, next_ch)) = chars.peek() {
        if next_ch.is_whitespace() || matches!(next_ch, ';' | '(' | '*') {
            break;
        }
        end_idx = idx + next_ch.len_utf8();
        chars.next();
    }
    end_idx
}

/// Determine if a token is a command
///
/// G/M/T codes are commands, as are multi-letter extended words.
fn is_command(text: &str) -> bool {
    match text.chars().next() {
        Some(first_char) => {
            matches!(first_char.to_ascii_uppercase(), 'G' | 'M' | 'T') || is_extended(text)
        }
        None => false,
    }
}

/// Extended (macro-style) command words such as `SET_FAN_SPEED` or `M600_HOOK`
///
/// `Tc` and `Tx` are two-letter tool selectors, not extended commands.
fn is_extended(text: &str) -> bool {
    let mut chars = text.chars();
    let (Some(first), Some(second)) = (chars.next(), chars.next()) else {
        return false;
    };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    if first.eq_ignore_ascii_case(&'T') && text.len() == 2 {
        return false;
    }
    second.is_ascii_alphabetic() || second == '_' || text.contains('_')
}

fn is_line_number(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some('N' | 'n'))
        && text.len() > 1
        && chars.all(|c| c.is_ascii_digit())
}

/// M-codes whose argument is free text rather than letter/value words
fn takes_text_argument(text: &str) -> bool {
    matches!(
        text.to_ascii_uppercase().as_str(),
        "M23" | "M28" | "M30" | "M32" | "M117" | "M118" | "M928"
    )
}
