// Save file decoder.
// A recursive-descent JSON reader that keeps numbers as decimals, keeps key
// order, and only accepts the non-finite tokens when asked to.

use super::decimal::{Decimal, DecimalError};
use super::value::{Map, Value};
use super::CodecError;

/// Nesting deeper than this is rejected instead of exhausting the stack.
const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Accept `NaN`, `Infinity` and `-Infinity` number tokens.
    pub allow_non_finite: bool,
}

/// Decodes a save document with default (strict) options.
pub fn from_str(text: &str) -> Result<Value, CodecError> {
    from_str_with(text, ReadOptions::default())
}

pub fn from_str_with(text: &str, options: ReadOptions) -> Result<Value, CodecError> {
    let mut reader = Reader {
        src: text,
        bytes: text.as_bytes(),
        pos: 0,
        depth: 0,
        options,
    };
    reader.skip_whitespace();
    let value = reader.parse_value()?;
    reader.skip_whitespace();
    if reader.pos != reader.bytes.len() {
        return Err(reader.syntax("Extra data"));
    }
    Ok(value)
}

pub fn from_slice(bytes: &[u8], options: ReadOptions) -> Result<Value, CodecError> {
    let text = std::str::from_utf8(bytes)?;
    from_str_with(text, options)
}

struct Reader<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    options: ReadOptions,
}

impl<'a> Reader<'a> {
    fn location(&self, pos: usize) -> (usize, usize) {
        let before = &self.bytes[..pos.min(self.bytes.len())];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |idx| idx + 1);
        (line, pos - line_start + 1)
    }

    fn syntax_at(&self, message: &str, pos: usize) -> CodecError {
        let (line, column) = self.location(pos);
        CodecError::Syntax {
            message: message.to_string(),
            line,
            column,
        }
    }

    fn syntax(&self, message: &str) -> CodecError {
        self.syntax_at(message, self.pos)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn starts_with(&self, token: &str) -> bool {
        self.bytes[self.pos..].starts_with(token.as_bytes())
    }

    fn parse_value(&mut self) -> Result<Value, CodecError> {
        match self.peek() {
            Some(b'{') => self.nested(Self::parse_object),
            Some(b'[') => self.nested(Self::parse_array),
            Some(b'"') => Ok(Value::String(self.parse_string()?)),
            Some(b't') if self.starts_with("true") => {
                self.pos += 4;
                Ok(Value::Bool(true))
            }
            Some(b'f') if self.starts_with("false") => {
                self.pos += 5;
                Ok(Value::Bool(false))
            }
            Some(b'n') if self.starts_with("null") => {
                self.pos += 4;
                Ok(Value::Null)
            }
            Some(b'N') if self.starts_with("NaN") => self.non_finite("NaN", Decimal::nan()),
            Some(b'I') if self.starts_with("Infinity") => {
                self.non_finite("Infinity", Decimal::infinity())
            }
            Some(b'-') if self.starts_with("-Infinity") => {
                self.non_finite("-Infinity", Decimal::neg_infinity())
            }
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            _ => Err(self.syntax("Expecting value")),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Value, CodecError>,
    ) -> Result<Value, CodecError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.syntax("Nesting too deep"));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn non_finite(&mut self, token: &'static str, value: Decimal) -> Result<Value, CodecError> {
        if !self.options.allow_non_finite {
            let (line, column) = self.location(self.pos);
            return Err(CodecError::ValueKind {
                token,
                line,
                column,
            });
        }
        self.pos += token.len();
        Ok(Value::Decimal(value))
    }

    fn parse_object(&mut self) -> Result<Value, CodecError> {
        self.pos += 1; // '{'
        let mut map = Map::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::Object(map));
        }

        loop {
            if self.peek() != Some(b'"') {
                return Err(self.syntax("Expecting property name enclosed in double quotes"));
            }
            let key = self.parse_string()?;

            self.skip_whitespace();
            if self.peek() != Some(b':') {
                return Err(self.syntax("Expecting ':' delimiter"));
            }
            self.pos += 1;
            self.skip_whitespace();

            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                }
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                _ => return Err(self.syntax("Expecting ',' delimiter")),
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value, CodecError> {
        self.pos += 1; // '['
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                }
                Some(b']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                _ => return Err(self.syntax("Expecting ',' delimiter")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, CodecError> {
        let open = self.pos;
        self.pos += 1; // '"'
        let mut out = String::new();
        let mut run_start = self.pos;

        loop {
            match self.peek() {
                None => return Err(self.syntax_at("Unterminated string starting", open)),
                Some(b'"') => {
                    out.push_str(&self.src[run_start..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    out.push_str(&self.src[run_start..self.pos]);
                    self.parse_escape(&mut out)?;
                    run_start = self.pos;
                }
                Some(b) if b < 0x20 => return Err(self.syntax("Invalid control character")),
                Some(_) => self.pos += 1,
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), CodecError> {
        let escape_pos = self.pos;
        self.pos += 1; // '\'
        let Some(kind) = self.peek() else {
            return Err(self.syntax_at("Unterminated string starting", escape_pos));
        };
        self.pos += 1;

        let ch = match kind {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => self.parse_unicode_escape(escape_pos)?,
            _ => return Err(self.syntax_at("Invalid \\escape", escape_pos)),
        };
        out.push(ch);
        Ok(())
    }

    fn parse_hex4(&mut self, escape_pos: usize) -> Result<u32, CodecError> {
        let digits = self
            .src
            .get(self.pos..self.pos + 4)
            .filter(|d| d.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| self.syntax_at("Invalid \\uXXXX escape", escape_pos))?;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| self.syntax_at("Invalid \\uXXXX escape", escape_pos))?;
        self.pos += 4;
        Ok(code)
    }

    fn parse_unicode_escape(&mut self, escape_pos: usize) -> Result<char, CodecError> {
        let first = self.parse_hex4(escape_pos)?;
        let code = match first {
            0xD800..=0xDBFF => {
                if !self.starts_with("\\u") {
                    return Err(self.syntax_at("Lone surrogate in \\u escape", escape_pos));
                }
                self.pos += 2;
                let second = self.parse_hex4(escape_pos)?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(self.syntax_at("Lone surrogate in \\u escape", escape_pos));
                }
                0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
            }
            0xDC00..=0xDFFF => {
                return Err(self.syntax_at("Lone surrogate in \\u escape", escape_pos))
            }
            other => other,
        };
        char::from_u32(code).ok_or_else(|| self.syntax_at("Invalid \\uXXXX escape", escape_pos))
    }

    fn eat_digits(&mut self) -> usize {
        let start = self.pos;
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
        self.pos - start
    }

    fn parse_number(&mut self) -> Result<Value, CodecError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => {
                self.eat_digits();
            }
            _ => return Err(self.syntax_at("Expecting value", start)),
        }

        let mut is_integer = true;
        if self.peek() == Some(b'.')
            && matches!(self.bytes.get(self.pos + 1), Some(b'0'..=b'9'))
        {
            self.pos += 1;
            self.eat_digits();
            is_integer = false;
        }

        if let Some(b'e' | b'E') = self.peek() {
            let mark = self.pos;
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            if self.eat_digits() == 0 {
                // Not an exponent after all; leave it for the caller to reject.
                self.pos = mark;
            } else {
                is_integer = false;
            }
        }

        let literal = &self.src[start..self.pos];
        let number = literal.parse::<Decimal>().map_err(|err| match err {
            DecimalError::ExponentOutOfRange(_) => {
                let (line, column) = self.location(start);
                CodecError::NumberOutOfRange { line, column }
            }
            DecimalError::Invalid(_) => self.syntax_at("Expecting value", start),
        })?;

        if is_integer {
            // "-0" is plain zero once read as an integer
            let number = if number.is_zero() {
                Decimal::from_i64(0)
            } else {
                number
            };
            Ok(Value::Integer(number))
        } else {
            Ok(Value::Decimal(number))
        }
    }
}
