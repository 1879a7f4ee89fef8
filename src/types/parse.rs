// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! Parser for the textual type names the server sends in block headers.
//!
//! Grammar:
//!
//! ```plain
//! Type      := Simple | "FixedString(" uint ")"
//!            | "Array(" Type ")" | "Nullable(" Type ")"
//!            | "Enum8(" EnumItems ")" | "Enum16(" EnumItems ")"
//! EnumItems := "'" name "'" "=" int ("," "'" name "'" "=" int)*
//! ```
//!
//! Enum names are single-quoted with backslash escaping of `'` and `\`.

use super::{EnumItem, EnumItems, Type};
use crate::{Error, Result};

/// Parse a canonical type name into a [`Type`].
pub fn parse(name: &str) -> Result<Type> {
    let mut parser = Parser { input: name, pos: 0 };
    let ty = parser.parse_type()?;
    parser.skip_spaces();
    if parser.pos != parser.input.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(ty)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn error(&self, message: &str) -> Error {
        Error::malformed(format!(
            "{} at byte {} of type name {:?}",
            message, self.pos, self.input
        ))
    }

    fn skip_spaces(&mut self) {
        self.pos += self
            .rest()
            .bytes()
            .take_while(|byte| *byte == b' ')
            .count();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        self.skip_spaces();
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {token:?}")))
        }
    }

    /// An identifier run: ASCII letters and digits.
    fn parse_ident(&mut self) -> Result<&'a str> {
        self.skip_spaces();
        let len = self
            .rest()
            .bytes()
            .take_while(|byte| byte.is_ascii_alphanumeric())
            .count();
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        let ident = &self.rest()[..len];
        self.pos += len;
        Ok(ident)
    }

    fn parse_type(&mut self) -> Result<Type> {
        let ident = self.parse_ident()?;
        if self.eat("(") {
            let ty = match ident {
                "FixedString" => {
                    let width = self.parse_uint()?;
                    Type::fixed_string(width)
                        .map_err(|_| self.error("FixedString width must be at least 1"))?
                }
                "Array" => Type::array(self.parse_type()?),
                "Nullable" => Type::nullable(self.parse_type()?),
                "Enum8" => {
                    let items = self.parse_enum_items()?;
                    Type::enum8(items)
                        .map_err(|_| self.error("enum value does not fit Enum8"))?
                }
                "Enum16" => Type::enum16(self.parse_enum_items()?),
                "Tuple" => return Err(Error::Unsupported("Tuple columns")),
                _ => return Err(self.error("unknown parameterized type")),
            };
            self.expect(")")?;
            Ok(ty)
        } else {
            match ident {
                "Int8" => Ok(Type::Int8),
                "Int16" => Ok(Type::Int16),
                "Int32" => Ok(Type::Int32),
                "Int64" => Ok(Type::Int64),
                "UInt8" => Ok(Type::UInt8),
                "UInt16" => Ok(Type::UInt16),
                "UInt32" => Ok(Type::UInt32),
                "UInt64" => Ok(Type::UInt64),
                "Float32" => Ok(Type::Float32),
                "Float64" => Ok(Type::Float64),
                "String" => Ok(Type::String),
                "Date" => Ok(Type::Date),
                "DateTime" => Ok(Type::DateTime),
                _ => Err(self.error("unknown type name")),
            }
        }
    }

    fn parse_uint(&mut self) -> Result<usize> {
        self.skip_spaces();
        let len = self
            .rest()
            .bytes()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        if len == 0 {
            return Err(self.error("expected an unsigned integer"));
        }
        let digits = &self.rest()[..len];
        let value = digits
            .parse::<usize>()
            .map_err(|_| self.error("integer out of range"))?;
        self.pos += len;
        Ok(value)
    }

    fn parse_int(&mut self) -> Result<i16> {
        self.skip_spaces();
        let negative = self.eat("-");
        let len = self
            .rest()
            .bytes()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        if len == 0 {
            return Err(self.error("expected an integer"));
        }
        let magnitude = self.rest()[..len]
            .parse::<i32>()
            .map_err(|_| self.error("integer out of range"))?;
        self.pos += len;
        let value = if negative { -magnitude } else { magnitude };
        i16::try_from(value).map_err(|_| self.error("enum value does not fit 16 bits"))
    }

    fn parse_enum_items(&mut self) -> Result<EnumItems> {
        let mut items = vec![];
        loop {
            let name = self.parse_quoted_name()?;
            self.expect("=")?;
            let value = self.parse_int()?;
            items.push(EnumItem { name, value });
            self.skip_spaces();
            if !self.eat(",") {
                break;
            }
        }
        EnumItems::new(items).map_err(|err| match err {
            Error::InvalidArgument(message) => self.error(&message),
            other => other,
        })
    }

    fn parse_quoted_name(&mut self) -> Result<String> {
        self.expect("'")?;
        let mut name = String::new();
        let mut chars = self.rest().char_indices();
        loop {
            let Some((idx, c)) = chars.next() else {
                return Err(self.error("unterminated enum name"));
            };
            match c {
                '\\' => {
                    let Some((_, escaped)) = chars.next() else {
                        return Err(self.error("dangling escape in enum name"));
                    };
                    name.push(escaped);
                }
                '\'' => {
                    self.pos += idx + 1;
                    return Ok(name);
                }
                _ => name.push(c),
            }
        }
    }
}
