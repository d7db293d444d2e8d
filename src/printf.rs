//! printf-style format strings: parsing, argument decoding and rendering.
//!
//! A format string fixes the shape of a call site's arguments. Non-string
//! arguments (including `*` width and precision) are packed behind a block
//! of width nibbles, strings follow NUL-terminated, and rendering follows C
//! printf rules so decoded lines match what the original call would have
//! printed.

use std::fmt::Write;

use thiserror::Error;

use crate::byte_cursor::ByteCursor;
use crate::error::Result;
use crate::varint::{self, TwoNibbles};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatStringError {
    #[error("unrecognized format specifier \"{0}\"")]
    Unrecognized(String),
    #[error("invalid length modifier for format specifier \"{0}\"")]
    InvalidLength(String),
    #[error("\"%n\" is not supported (\"{0}\")")]
    WriteBack(String),
    #[error("width or precision above {} in format specifier \"{}\"", MAX_FIELD_WIDTH, .0)]
    FieldTooWide(String),
}

/// Largest width or precision a conversion may use.
///
/// Fixed counts above it are rejected when parsing; `*` counts read from
/// the stream are clamped to it.
pub const MAX_FIELD_WIDTH: usize = 4096;

/// C type of one argument as recorded in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Signed integer of the given byte width.
    Signed(u8),
    /// Unsigned integer of the given byte width.
    Unsigned(u8),
    Float,
    /// `int` printed as a single byte character.
    Char,
    /// `wint_t` printed as a character.
    WideChar,
    Pointer,
    String,
    WideString,
}

impl ArgKind {
    pub fn is_string(self) -> bool {
        matches!(self, ArgKind::String | ArgKind::WideString)
    }
}

/// A decoded argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Int(i64),
    Uint(u64),
    Float(f64),
    Char(char),
    Pointer(u64),
    Str(String),
}

impl ArgValue {
    fn as_i64(&self) -> i64 {
        match self {
            ArgValue::Int(v) => *v,
            ArgValue::Uint(v) | ArgValue::Pointer(v) => *v as i64,
            ArgValue::Float(v) => *v as i64,
            ArgValue::Char(c) => *c as i64,
            ArgValue::Str(_) => 0,
        }
    }

    fn as_u64(&self) -> u64 {
        match self {
            ArgValue::Uint(v) | ArgValue::Pointer(v) => *v,
            other => other.as_i64() as u64,
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            ArgValue::Float(v) => *v,
            ArgValue::Uint(v) | ArgValue::Pointer(v) => *v as f64,
            other => other.as_i64() as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub left: bool,
    pub plus: bool,
    pub space: bool,
    pub alt: bool,
    pub zero: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Fixed(usize),
    /// Taken from an `int` argument preceding the value.
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    pub flags: Flags,
    pub width: Option<Count>,
    pub precision: Option<Count>,
    pub specifier: char,
    pub kind: ArgKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Literal(String),
    Conversion(Conversion),
}

/// A parsed printf format string.
///
/// # Examples
///
/// ```
/// # use binary_log_decoder::printf::{ArgValue, PrintfFormat};
/// let format = PrintfFormat::parse("%s took %5.1f ms (%d%%)").unwrap();
///
/// let mut line = String::new();
/// format.render(
///     &[ArgValue::Str("flush".into()), ArgValue::Float(12.345), ArgValue::Int(87)],
///     &mut line,
/// );
/// assert_eq!(line, "flush took  12.3 ms (87%)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PrintfFormat {
    pieces: Vec<Piece>,
    // Call order, dynamic width/precision included.
    arg_kinds: Vec<ArgKind>,
}

const INT: ArgKind = ArgKind::Signed(4);

impl PrintfFormat {
    pub fn parse(format: &str) -> std::result::Result<Self, FormatStringError> {
        let mut pieces = Vec::new();
        let mut arg_kinds = Vec::new();
        let mut literal = String::new();
        let mut chars = format.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if let Some(&(_, '%')) = chars.peek() {
                chars.next();
                literal.push('%');
                continue;
            }

            let mut flags = Flags::default();
            while let Some(&(_, f)) = chars.peek() {
                match f {
                    '-' => flags.left = true,
                    '+' => flags.plus = true,
                    ' ' => flags.space = true,
                    '#' => flags.alt = true,
                    '0' => flags.zero = true,
                    _ => break,
                }
                chars.next();
            }

            let width = parse_count(&mut chars);
            let precision = match chars.peek() {
                Some(&(_, '.')) => {
                    chars.next();
                    Some(parse_count(&mut chars).unwrap_or(Count::Fixed(0)))
                }
                _ => None,
            };

            let mut length = String::new();
            while let Some(&(_, l)) = chars.peek() {
                if !matches!(l, 'h' | 'l' | 'j' | 'z' | 'Z' | 't' | 'L') || length.len() == 2 {
                    break;
                }
                length.push(l);
                chars.next();
            }

            let (end, specifier) = match chars.next() {
                Some((i, s)) => (i + s.len_utf8(), s),
                None => return Err(FormatStringError::Unrecognized(format[start..].to_string())),
            };
            let text = &format[start..end];
            let kind = arg_kind(specifier, &length, text)?;
            let too_wide =
                |count: Option<Count>| matches!(count, Some(Count::Fixed(n)) if n > MAX_FIELD_WIDTH);
            if too_wide(width) || too_wide(precision) {
                return Err(FormatStringError::FieldTooWide(text.to_string()));
            }

            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            if width == Some(Count::Dynamic) {
                arg_kinds.push(INT);
            }
            if precision == Some(Count::Dynamic) {
                arg_kinds.push(INT);
            }
            arg_kinds.push(kind);
            pieces.push(Piece::Conversion(Conversion {
                flags,
                width,
                precision,
                specifier,
                kind,
            }));
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(Self { pieces, arg_kinds })
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Argument kinds in call order.
    pub fn arg_kinds(&self) -> &[ArgKind] {
        &self.arg_kinds
    }

    /// Consumes exactly this call site's argument bytes.
    ///
    /// Values come back in call order even though strings are stored after
    /// all the packed values.
    pub fn decode_args(&self, cursor: &mut ByteCursor<'_>) -> Result<Vec<ArgValue>> {
        let numeric = self.arg_kinds.iter().filter(|k| !k.is_string()).count();
        let mut nibbles = vec![TwoNibbles::default(); numeric.div_ceil(2)];
        for pair in nibbles.iter_mut() {
            *pair = TwoNibbles(cursor.read_byte()?);
        }

        let mut values = vec![ArgValue::Int(0); self.arg_kinds.len()];
        let mut nibble_index = 0;
        for (slot, kind) in self.arg_kinds.iter().enumerate() {
            if kind.is_string() {
                continue;
            }
            let nibble = TwoNibbles::nth(&nibbles, nibble_index);
            nibble_index += 1;
            values[slot] = decode_numeric(cursor, *kind, nibble)?;
        }

        for (slot, kind) in self.arg_kinds.iter().enumerate() {
            match kind {
                ArgKind::String => {
                    let bytes = cursor.read_c_string()?;
                    values[slot] = ArgValue::Str(String::from_utf8_lossy(bytes).into_owned());
                }
                ArgKind::WideString => values[slot] = ArgValue::Str(read_wide_string(cursor)?),
                _ => {}
            }
        }
        Ok(values)
    }

    /// Renders the format with `args` given in call order.
    ///
    /// Missing arguments render as zero/empty rather than failing; a table
    /// built from the same format never produces fewer.
    pub fn render(&self, args: &[ArgValue], out: &mut String) {
        let mut args = args.iter();
        let zero = ArgValue::Int(0);

        for piece in &self.pieces {
            let conversion = match piece {
                Piece::Literal(text) => {
                    out.push_str(text);
                    continue;
                }
                Piece::Conversion(conversion) => conversion,
            };

            let mut flags = conversion.flags;
            let width = match conversion.width {
                Some(Count::Fixed(w)) => w,
                Some(Count::Dynamic) => {
                    let w = args.next().unwrap_or(&zero).as_i64();
                    if w < 0 {
                        flags.left = true;
                    }
                    (w.unsigned_abs() as usize).min(MAX_FIELD_WIDTH)
                }
                None => 0,
            };
            let precision = match conversion.precision {
                Some(Count::Fixed(p)) => Some(p),
                Some(Count::Dynamic) => usize::try_from(args.next().unwrap_or(&zero).as_i64())
                    .ok()
                    .map(|p| p.min(MAX_FIELD_WIDTH)),
                None => None,
            };

            let value = args.next().unwrap_or(&zero);
            render_conversion(conversion.specifier, flags, width, precision, value, out);
        }
    }
}

fn parse_count<I>(chars: &mut std::iter::Peekable<I>) -> Option<Count>
where
    I: Iterator<Item = (usize, char)>,
{
    if let Some(&(_, '*')) = chars.peek() {
        chars.next();
        return Some(Count::Dynamic);
    }

    let mut value: Option<usize> = None;
    while let Some(&(_, d)) = chars.peek() {
        let Some(digit) = d.to_digit(10) else { break };
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit as usize));
        chars.next();
    }
    value.map(Count::Fixed)
}

fn arg_kind(specifier: char, length: &str, text: &str) -> std::result::Result<ArgKind, FormatStringError> {
    let invalid = || FormatStringError::InvalidLength(text.to_string());
    let kind = match specifier {
        'd' | 'i' => match length {
            "" => ArgKind::Signed(4),
            "hh" => ArgKind::Signed(1),
            "h" => ArgKind::Signed(2),
            "l" | "ll" | "j" | "t" => ArgKind::Signed(8),
            "z" | "Z" => ArgKind::Unsigned(8),
            _ => return Err(invalid()),
        },
        'u' | 'o' | 'x' | 'X' => match length {
            "" => ArgKind::Unsigned(4),
            "hh" => ArgKind::Unsigned(1),
            "h" => ArgKind::Unsigned(2),
            "l" | "ll" | "j" | "z" | "Z" => ArgKind::Unsigned(8),
            "t" => ArgKind::Signed(8),
            _ => return Err(invalid()),
        },
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 'a' | 'A' => ArgKind::Float,
        'p' if length.is_empty() => ArgKind::Pointer,
        's' if length.is_empty() => ArgKind::String,
        's' if length == "l" => ArgKind::WideString,
        'c' if length.is_empty() => ArgKind::Char,
        'c' if length == "l" => ArgKind::WideChar,
        'p' | 's' | 'c' => return Err(invalid()),
        'n' => return Err(FormatStringError::WriteBack(text.to_string())),
        _ => return Err(FormatStringError::Unrecognized(text.to_string())),
    };
    Ok(kind)
}

fn decode_numeric(cursor: &mut ByteCursor<'_>, kind: ArgKind, nibble: u8) -> Result<ArgValue> {
    let value = match kind {
        ArgKind::Signed(width) => {
            let v = varint::decode_signed(cursor, nibble)?;
            ArgValue::Int(match width {
                1 => v as i8 as i64,
                2 => v as i16 as i64,
                4 => v as i32 as i64,
                _ => v,
            })
        }
        ArgKind::Unsigned(width) => {
            let v = varint::decode_unsigned(cursor, nibble)?;
            ArgValue::Uint(match width {
                1 => v as u8 as u64,
                2 => v as u16 as u64,
                4 => v as u32 as u64,
                _ => v,
            })
        }
        ArgKind::Float => ArgValue::Float(f64::from_bits(varint::decode_unsigned(cursor, nibble)?)),
        ArgKind::Char => ArgValue::Char(byte_char(varint::decode_signed(cursor, nibble)? as u8)),
        ArgKind::WideChar => {
            let v = varint::decode_unsigned(cursor, nibble)?;
            ArgValue::Char(char::from_u32(v as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        }
        ArgKind::Pointer => ArgValue::Pointer(varint::decode_unsigned(cursor, nibble)?),
        ArgKind::String | ArgKind::WideString => unreachable!("strings are not packed"),
    };
    Ok(value)
}

// A lone byte past ASCII is not valid UTF-8 on its own.
fn byte_char(byte: u8) -> char {
    if byte.is_ascii() {
        byte as char
    } else {
        char::REPLACEMENT_CHARACTER
    }
}

fn read_wide_string(cursor: &mut ByteCursor<'_>) -> Result<String> {
    let mut text = String::new();
    loop {
        let unit = u32::from_le_bytes(cursor.read_array()?);
        if unit == 0 {
            return Ok(text);
        }
        text.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
    }
}

fn render_conversion(
    specifier: char,
    flags: Flags,
    width: usize,
    precision: Option<usize>,
    value: &ArgValue,
    out: &mut String,
) {
    let upper = specifier.is_ascii_uppercase();
    match specifier {
        'd' | 'i' => {
            let v = value.as_i64();
            let digits = integer_digits(v.unsigned_abs(), 10, false, precision);
            let sign = sign_prefix(v < 0, flags);
            pad(out, sign, &digits, width, flags, precision.is_none());
        }
        'u' => {
            let digits = integer_digits(value.as_u64(), 10, false, precision);
            pad(out, "", &digits, width, flags, precision.is_none());
        }
        'o' => {
            let mut digits = integer_digits(value.as_u64(), 8, false, precision);
            if flags.alt && !digits.starts_with('0') {
                digits.insert(0, '0');
            }
            pad(out, "", &digits, width, flags, precision.is_none());
        }
        'x' | 'X' => {
            let v = value.as_u64();
            let digits = integer_digits(v, 16, upper, precision);
            let prefix = match (flags.alt && v != 0, upper) {
                (true, false) => "0x",
                (true, true) => "0X",
                _ => "",
            };
            pad(out, prefix, &digits, width, flags, precision.is_none());
        }
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' | 'a' | 'A' => {
            let v = value.as_f64();
            let sign = sign_prefix(v.is_sign_negative(), flags);
            if !v.is_finite() {
                let text = match (v.is_nan(), upper) {
                    (true, false) => "nan",
                    (true, true) => "NAN",
                    (false, false) => "inf",
                    (false, true) => "INF",
                };
                pad(out, sign, text, width, flags, false);
                return;
            }

            let abs = v.abs();
            let body = match specifier.to_ascii_lowercase() {
                'f' => fixed(abs, precision.unwrap_or(6), flags.alt),
                'e' => exponential(abs, precision.unwrap_or(6), upper, flags.alt),
                'g' => general(abs, precision.unwrap_or(6), upper, flags.alt),
                _ => hex_float(abs, precision, upper, flags.alt),
            };
            pad(out, sign, &body, width, flags, true);
        }
        'c' => {
            let c = match value {
                ArgValue::Char(c) => *c,
                other => byte_char(other.as_i64() as u8),
            };
            pad(out, "", c.encode_utf8(&mut [0; 4]), width, flags, false);
        }
        's' => {
            let text = match value {
                ArgValue::Str(s) => s.as_str(),
                _ => "",
            };
            let text = match precision {
                Some(p) => match text.char_indices().nth(p) {
                    Some((end, _)) => &text[..end],
                    None => text,
                },
                None => text,
            };
            pad(out, "", text, width, flags, false);
        }
        'p' => {
            let v = value.as_u64();
            if v == 0 {
                pad(out, "", "(nil)", width, flags, false);
            } else {
                pad(out, "0x", &format!("{:x}", v), width, flags, false);
            }
        }
        _ => {}
    }
}

fn sign_prefix(negative: bool, flags: Flags) -> &'static str {
    if negative {
        "-"
    } else if flags.plus {
        "+"
    } else if flags.space {
        " "
    } else {
        ""
    }
}

fn integer_digits(value: u64, radix: u32, upper: bool, precision: Option<usize>) -> String {
    if precision == Some(0) && value == 0 {
        return String::new();
    }
    let digits = match (radix, upper) {
        (8, _) => format!("{:o}", value),
        (16, false) => format!("{:x}", value),
        (16, true) => format!("{:X}", value),
        _ => value.to_string(),
    };
    match precision {
        Some(p) if p > digits.len() => format!("{}{}", "0".repeat(p - digits.len()), digits),
        _ => digits,
    }
}

fn pad(out: &mut String, prefix: &str, body: &str, width: usize, flags: Flags, zero_allowed: bool) {
    let len = prefix.chars().count() + body.chars().count();
    let fill = width.saturating_sub(len);

    if flags.left {
        out.push_str(prefix);
        out.push_str(body);
        out.extend(std::iter::repeat(' ').take(fill));
    } else if flags.zero && zero_allowed {
        out.push_str(prefix);
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(body);
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(prefix);
        out.push_str(body);
    }
}

fn fixed(abs: f64, precision: usize, alt: bool) -> String {
    let mut text = format!("{:.*}", precision, abs);
    if alt && precision == 0 {
        text.push('.');
    }
    text
}

// Rust prints `1.5e3`; C wants `1.5e+03`.
fn exponential(abs: f64, precision: usize, upper: bool, alt: bool) -> String {
    let text = format!("{:.*e}", precision, abs);
    let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let mut out = mantissa.to_string();
    if alt && precision == 0 {
        out.push('.');
    }
    out.push(if upper { 'E' } else { 'e' });
    out.push(if exponent < 0 { '-' } else { '+' });
    let _ = write!(out, "{:02}", exponent.unsigned_abs());
    out
}

fn general(abs: f64, precision: usize, upper: bool, alt: bool) -> String {
    let p = precision.max(1);
    let exponent = if abs == 0.0 {
        0
    } else {
        let text = format!("{:.*e}", p - 1, abs);
        text.split_once('e')
            .and_then(|(_, e)| e.parse::<i32>().ok())
            .unwrap_or(0)
    };

    let text = if exponent >= -4 && exponent < p as i32 {
        fixed(abs, (p as i32 - 1 - exponent) as usize, alt)
    } else {
        exponential(abs, p - 1, upper, alt)
    };
    if alt {
        return text;
    }

    let split = text.find(|c: char| c == 'e' || c == 'E').unwrap_or(text.len());
    let (mantissa, exponent) = text.split_at(split);
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{}{}", mantissa, exponent)
}

const MANTISSA_DIGITS: usize = 13;

fn hex_float(abs: f64, precision: Option<usize>, upper: bool, alt: bool) -> String {
    let bits = abs.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let mantissa = bits & ((1u64 << 52) - 1);
    let (mut lead, exponent) = match (biased, mantissa) {
        (0, 0) => (0u64, 0),
        (0, _) => (0, -1022),
        _ => (1, biased - 1023),
    };

    let digits = match precision {
        Some(p) if p < MANTISSA_DIGITS => {
            let shift = (MANTISSA_DIGITS - p) * 4;
            let half = 1u64 << (shift - 1);
            let rest = mantissa & ((1u64 << shift) - 1);
            let mut kept = mantissa >> shift;
            let last = if p == 0 { lead } else { kept };
            if rest > half || (rest == half && last & 1 == 1) {
                kept += 1;
            }
            if kept >> (p * 4) != 0 {
                kept &= (1u64 << (p * 4)) - 1;
                lead += 1;
            }
            if p == 0 {
                String::new()
            } else {
                format!("{:0width$x}", kept, width = p)
            }
        }
        Some(p) => format!("{:013x}{}", mantissa, "0".repeat(p - MANTISSA_DIGITS)),
        None => format!("{:013x}", mantissa).trim_end_matches('0').to_string(),
    };

    let mut text = format!("0x{}", lead);
    if !digits.is_empty() || alt {
        text.push('.');
    }
    text.push_str(&digits);
    let _ = write!(text, "p{}{}", if exponent < 0 { '-' } else { '+' }, exponent.unsigned_abs());
    if upper {
        text.make_ascii_uppercase();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(format: &str, args: &[ArgValue]) -> String {
        let mut out = String::new();
        PrintfFormat::parse(format).unwrap().render(args, &mut out);
        out
    }

    #[test]
    fn test_parse_arg_kinds() {
        let format = PrintfFormat::parse("%d %hhu %ld %zu %.*s %*.*f %ls %c %lc %p %%").unwrap();
        assert_eq!(
            format.arg_kinds(),
            &[
                ArgKind::Signed(4),
                ArgKind::Unsigned(1),
                ArgKind::Signed(8),
                ArgKind::Unsigned(8),
                INT,
                ArgKind::String,
                INT,
                INT,
                ArgKind::Float,
                ArgKind::WideString,
                ArgKind::Char,
                ArgKind::WideChar,
                ArgKind::Pointer,
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(PrintfFormat::parse("count %n"), Err(FormatStringError::WriteBack(_))));
        assert!(matches!(PrintfFormat::parse("%q"), Err(FormatStringError::Unrecognized(_))));
        assert!(matches!(PrintfFormat::parse("trailing %"), Err(FormatStringError::Unrecognized(_))));
        assert!(matches!(PrintfFormat::parse("%Ld"), Err(FormatStringError::InvalidLength(_))));
        assert!(matches!(PrintfFormat::parse("%hs"), Err(FormatStringError::InvalidLength(_))));
    }

    #[test]
    fn test_rejects_oversized_fixed_counts() {
        assert!(PrintfFormat::parse("%4096d|%.4096f").is_ok());
        assert!(matches!(PrintfFormat::parse("%4097d"), Err(FormatStringError::FieldTooWide(_))));
        assert!(matches!(
            PrintfFormat::parse("%.99999999999999999999999f"),
            Err(FormatStringError::FieldTooWide(_))
        ));
    }

    #[test]
    fn test_dynamic_counts_are_clamped() {
        let line = render("v=%.*f", &[ArgValue::Int(70_000), ArgValue::Float(1.5)]);
        assert_eq!(line.len(), "v=1.".len() + MAX_FIELD_WIDTH);
        assert!(line.starts_with("v=1.5000"));

        let line = render("v=%*d", &[ArgValue::Int(i32::MAX as i64), ArgValue::Int(7)]);
        assert_eq!(line.len(), "v=".len() + MAX_FIELD_WIDTH);
        assert!(line.ends_with(" 7"));

        let line = render("%-*s|", &[ArgValue::Int(i64::MIN), ArgValue::Str("x".into())]);
        assert_eq!(line.len(), MAX_FIELD_WIDTH + 1);
    }

    #[test]
    fn test_char_outside_ascii() {
        assert_eq!(render("[%c]", &[ArgValue::Int(0x41)]), "[A]");
        assert_eq!(render("[%c]", &[ArgValue::Int(0xe9)]), "[\u{fffd}]");

        let format = PrintfFormat::parse("%c%c").unwrap();
        let mut payload = Vec::new();
        let mut packed = Vec::new();
        let a = varint::pack_signed(0x7a, &mut packed);
        let b = varint::pack_signed(0xe9, &mut packed);
        payload.push(TwoNibbles::new(a, b).0);
        payload.extend_from_slice(&packed);

        let mut cursor = ByteCursor::new(&payload[..]);
        let values = format.decode_args(&mut cursor).unwrap();
        assert_eq!(values, vec![ArgValue::Char('z'), ArgValue::Char('\u{fffd}')]);
    }

    #[test]
    fn test_literal_only() {
        let format = PrintfFormat::parse("no args here, 100%% sure").unwrap();
        assert!(format.arg_kinds().is_empty());
        assert_eq!(render("no args here, 100%% sure", &[]), "no args here, 100% sure");
    }

    #[test]
    fn test_render_integers() {
        assert_eq!(render("[%5d]", &[ArgValue::Int(42)]), "[   42]");
        assert_eq!(render("[%-5d]", &[ArgValue::Int(42)]), "[42   ]");
        assert_eq!(render("[%05d]", &[ArgValue::Int(-42)]), "[-0042]");
        assert_eq!(render("[%+d]", &[ArgValue::Int(7)]), "[+7]");
        assert_eq!(render("[% d]", &[ArgValue::Int(7)]), "[ 7]");
        assert_eq!(render("[%.3d]", &[ArgValue::Int(7)]), "[007]");
        assert_eq!(render("[%8.3d]", &[ArgValue::Int(-7)]), "[    -007]");
        assert_eq!(render("[%.0d]", &[ArgValue::Int(0)]), "[]");
        assert_eq!(render("%u", &[ArgValue::Uint(4_000_000_000)]), "4000000000");
        assert_eq!(render("%#x %X %#o", &[ArgValue::Uint(255), ArgValue::Uint(255), ArgValue::Uint(8)]), "0xff FF 010");
        assert_eq!(render("%#010x", &[ArgValue::Uint(255)]), "0x000000ff");
    }

    #[test]
    fn test_render_floats() {
        assert_eq!(render("%f", &[ArgValue::Float(3.14159)]), "3.141590");
        assert_eq!(render("%.2f", &[ArgValue::Float(2.675)]), "2.67");
        assert_eq!(render("%08.3f", &[ArgValue::Float(-1.5)]), "-001.500");
        assert_eq!(render("%e", &[ArgValue::Float(12345.678)]), "1.234568e+04");
        assert_eq!(render("%.1E", &[ArgValue::Float(0.00012)]), "1.2E-04");
        assert_eq!(render("%g", &[ArgValue::Float(100000.0)]), "100000");
        assert_eq!(render("%g", &[ArgValue::Float(1000000.0)]), "1e+06");
        assert_eq!(render("%g", &[ArgValue::Float(0.0001)]), "0.0001");
        assert_eq!(render("%g", &[ArgValue::Float(0.00001234)]), "1.234e-05");
        assert_eq!(render("%.3g", &[ArgValue::Float(3.14159)]), "3.14");
        assert_eq!(render("%#g", &[ArgValue::Float(1.0)]), "1.00000");
        assert_eq!(render("%g", &[ArgValue::Float(0.0)]), "0");
        assert_eq!(render("%5.1f|", &[ArgValue::Float(f64::INFINITY)]), "  inf|");
        assert_eq!(render("%F", &[ArgValue::Float(f64::NEG_INFINITY)]), "-INF");
    }

    #[test]
    fn test_render_hex_floats() {
        assert_eq!(render("%a", &[ArgValue::Float(1.0)]), "0x1p+0");
        assert_eq!(render("%a", &[ArgValue::Float(0.5)]), "0x1p-1");
        assert_eq!(render("%a", &[ArgValue::Float(10.0)]), "0x1.4p+3");
        assert_eq!(render("%A", &[ArgValue::Float(-10.0)]), "-0X1.4P+3");
        assert_eq!(render("%a", &[ArgValue::Float(0.0)]), "0x0p+0");
        assert_eq!(render("%.1a", &[ArgValue::Float(1.96875)]), "0x2.0p+0");
        assert_eq!(render("%.0a", &[ArgValue::Float(1.5)]), "0x2p+0");
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render("[%s]", &[ArgValue::Str("hello".into())]), "[hello]");
        assert_eq!(render("[%.3s]", &[ArgValue::Str("hello".into())]), "[hel]");
        assert_eq!(render("[%-7s]", &[ArgValue::Str("hi".into())]), "[hi     ]");
        assert_eq!(render("[%3c]", &[ArgValue::Char('x')]), "[  x]");
        assert_eq!(render("%p %p", &[ArgValue::Pointer(0), ArgValue::Pointer(0xdead)]), "(nil) 0xdead");
    }

    #[test]
    fn test_render_dynamic_width_and_precision() {
        let args = [ArgValue::Int(6), ArgValue::Int(2), ArgValue::Float(3.14159)];
        assert_eq!(render("[%*.*f]", &args), "[  3.14]");

        let args = [ArgValue::Int(-4), ArgValue::Int(1)];
        assert_eq!(render("[%*d]", &args), "[1   ]");

        let args = [ArgValue::Int(-1), ArgValue::Str("abc".into())];
        assert_eq!(render("[%.*s]", &args), "[abc]");
    }

    #[test]
    fn test_decode_args_in_call_order() {
        let format = PrintfFormat::parse("%s=%d (%hd) %ls %f").unwrap();

        let mut payload = Vec::new();
        let mut packed = Vec::new();
        let a = varint::pack_signed(-5, &mut packed);
        let b = varint::pack_signed(70_000, &mut packed);
        let c = varint::pack_unsigned(2.5f64.to_bits(), &mut packed);
        payload.push(TwoNibbles::new(a, b).0);
        payload.push(TwoNibbles::new(c, 0).0);
        payload.extend_from_slice(&packed);
        payload.extend_from_slice(b"key\0");
        for unit in ['w' as u32, 'i' as u32, 0] {
            payload.extend_from_slice(&unit.to_le_bytes());
        }
        payload.push(0xee);

        let mut cursor = ByteCursor::new(&payload[..]);
        let values = format.decode_args(&mut cursor).unwrap();
        assert_eq!(
            values,
            vec![
                ArgValue::Str("key".into()),
                ArgValue::Int(-5),
                // %hd truncates to a short.
                ArgValue::Int(70_000i64 as i16 as i64),
                ArgValue::Str("wi".into()),
                ArgValue::Float(2.5),
            ]
        );
        assert_eq!(cursor.peek().unwrap(), Some(0xee));

        let mut line = String::new();
        format.render(&values, &mut line);
        assert_eq!(line, "key=-5 (4464) wi 2.500000");
    }
}
