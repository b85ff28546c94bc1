//! Decoder for PHP `serialize()` output, as stored in WordPress options and meta.
//!
//! Arrays with the keys `0..n` in order become JSON arrays, every other array
//! and every object becomes a JSON object with stringified keys. Objects lose
//! their class name. References (`r:`/`R:`) and custom serialization (`C:`)
//! are not supported and make the whole value undecodable, as does nesting
//! deeper than `MAX_DEPTH`.
use serde_json::{Map, Number, Value};

/// Same limit serde_json applies to JSON input.
const MAX_DEPTH: usize = 128;

/// Decodes a complete serialized value. Returns `None` when `input` is not
/// valid serialized data or has trailing content.
pub fn decode(input: &str) -> Option<Value> {
    let mut cursor = Cursor {
        bytes: input.trim().as_bytes(),
        pos: 0,
        depth: 0,
    };
    let value = cursor.value()?;
    (cursor.pos == cursor.bytes.len()).then_some(value)
}

/// Cheap pre-check used before attempting a full decode.
pub fn looks_serialized(input: &str) -> bool {
    let input = input.trim();
    input == "N;"
        || matches!(
            input.as_bytes(),
            [b'a' | b'O' | b's' | b'i' | b'b' | b'd', b':', ..]
        )
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Cursor<'a> {
    fn value(&mut self) -> Option<Value> {
        let tag = self.next()?;
        if tag == b'N' {
            self.expect(b';')?;
            return Some(Value::Null);
        }
        self.expect(b':')?;
        match tag {
            b'b' => {
                let raw = self.until(b';')?;
                match raw {
                    b"0" => Some(Value::Bool(false)),
                    b"1" => Some(Value::Bool(true)),
                    _ => None,
                }
            }
            b'i' => {
                let raw = std::str::from_utf8(self.until(b';')?).ok()?;
                raw.parse::<i64>().ok().map(Value::from)
            }
            b'd' => {
                let raw = std::str::from_utf8(self.until(b';')?).ok()?;
                let number = raw.parse::<f64>().ok()?;
                Some(Number::from_f64(number).map_or(Value::Null, Value::Number))
            }
            b's' => {
                let text = self.string_body()?;
                self.expect(b';')?;
                Some(Value::String(text))
            }
            b'a' => {
                let len = self.length(b':')?;
                self.entries(len)
            }
            b'O' => {
                // Class name is discarded.
                self.string_body()?;
                self.expect(b':')?;
                let len = self.length(b':')?;
                let value = self.entries(len)?;
                Some(match value {
                    Value::Array(items) => Value::Object(
                        items
                            .into_iter()
                            .enumerate()
                            .map(|(i, v)| (i.to_string(), v))
                            .collect(),
                    ),
                    other => other,
                })
            }
            _ => None,
        }
    }

    /// Parses `{key;value;...}` after the element count.
    fn entries(&mut self, len: usize) -> Option<Value> {
        self.expect(b'{')?;
        if self.depth == MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let pairs = self.pairs(len);
        self.depth -= 1;
        let pairs = pairs?;
        self.expect(b'}')?;

        let sequential = pairs
            .iter()
            .enumerate()
            .all(|(i, (key, _))| matches!(key, Key::Int(k) if *k == i as i64));
        if sequential {
            return Some(Value::Array(pairs.into_iter().map(|(_, v)| v).collect()));
        }

        let mut object = Map::new();
        for (key, value) in pairs {
            let key = match key {
                Key::Int(k) => k.to_string(),
                Key::Text(s) => s,
            };
            object.insert(key, value);
        }
        Some(Value::Object(object))
    }

    fn pairs(&mut self, len: usize) -> Option<Vec<(Key, Value)>> {
        let mut pairs = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            let key = match self.value()? {
                Value::Number(n) => Key::Int(n.as_i64()?),
                Value::String(s) => Key::Text(s),
                _ => return None,
            };
            let value = self.value()?;
            pairs.push((key, value));
        }
        Some(pairs)
    }

    /// Parses `len:"bytes"` and returns the bytes as text.
    fn string_body(&mut self) -> Option<String> {
        let len = self.length(b':')?;
        self.expect(b'"')?;
        let end = self.pos.checked_add(len)?;
        let raw = self.bytes.get(self.pos..end)?;
        self.pos = end;
        self.expect(b'"')?;
        Some(String::from_utf8_lossy(raw).into_owned())
    }

    fn length(&mut self, terminator: u8) -> Option<usize> {
        let raw = std::str::from_utf8(self.until(terminator)?).ok()?;
        raw.parse().ok()
    }

    /// Returns the bytes up to `terminator` and consumes the terminator.
    fn until(&mut self, terminator: u8) -> Option<&'a [u8]> {
        let start = self.pos;
        let offset = self.bytes[start..].iter().position(|b| *b == terminator)?;
        self.pos = start + offset + 1;
        Some(&self.bytes[start..start + offset])
    }

    fn next(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        (self.next()? == byte).then_some(())
    }
}

enum Key {
    Int(i64),
    Text(String),
}
