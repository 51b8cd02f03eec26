// Save file encoder.
// Walks the document tree and writes it the way the game does:
// `{ "k": v, "k2": v2 }`, `[ a, b ]`, `{ }`, `[ ]`, ASCII-only strings, and
// near-zero decimals in exponential form.

use std::fmt::Write as _;
use std::io;

use super::decimal::Decimal;
use super::value::Value;

const ITEM_SEPARATOR: &str = ", ";
const KEY_SEPARATOR: &str = ": ";

/// Text of a single decimal as the game writes it. A decimal never comes
/// out as a bare integer token, so `5e0` is written `5.0`.
pub fn encode_number(value: &Decimal) -> String {
    let value = value.float_family();
    if value.is_almost_zero() {
        value.to_scientific()
    } else {
        value.to_string()
    }
}

pub fn to_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

pub fn to_writer<W: io::Write + ?Sized>(writer: &mut W, value: &Value) -> io::Result<()> {
    writer.write_all(to_string(value).as_bytes())
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Integer(number) => {
            let _ = write!(out, "{number}");
        }
        Value::Decimal(number) => out.push_str(&encode_number(number)),
        Value::String(text) => write_string(out, text),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[ ]");
                return;
            }
            out.push_str("[ ");
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push_str(ITEM_SEPARATOR);
                }
                write_value(out, item);
            }
            out.push_str(" ]");
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{ }");
                return;
            }
            out.push_str("{ ");
            for (idx, (key, item)) in map.iter().enumerate() {
                if idx > 0 {
                    out.push_str(ITEM_SEPARATOR);
                }
                write_string(out, key);
                out.push_str(KEY_SEPARATOR);
                write_value(out, item);
            }
            out.push_str(" }");
        }
    }
}

fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            ' '..='~' => out.push(ch),
            _ => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{unit:04x}");
                }
            }
        }
    }
    out.push('"');
}
