#![allow(dead_code)]

use binary_log_decoder::checkpoint::{encode_checkpoint, Checkpoint};
use binary_log_decoder::metadata::{encode_metadata, DecompressedMetadata, StreamState};
use binary_log_decoder::varint::{self, TwoNibbles};
use binary_log_decoder::{FormatInfo, FormatRegistry, FormatTable};

/// Argument as the producer would have packed it.
#[derive(Debug, Clone, Copy)]
pub enum Arg {
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(&'static str),
}

/// Writes compressed logs the way the producer does.
#[derive(Debug, Default)]
pub struct StreamBuilder {
    bytes: Vec<u8>,
    state: StreamState,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(&mut self, format_id: u32, timestamp: u64, args: &[Arg]) -> &mut Self {
        let metadata = DecompressedMetadata {
            format_id,
            timestamp,
        };
        encode_metadata(&metadata, &self.state, &mut self.bytes);
        self.state.commit(&metadata);
        encode_args(args, &mut self.bytes);
        self
    }

    pub fn checkpoint(&mut self, cycles_per_second: f64) -> &mut Self {
        let checkpoint = Checkpoint {
            cycles_at_epoch: 1_000,
            unix_time: 1_700_000_000,
            cycles_per_second,
        };
        encode_checkpoint(&checkpoint, &mut self.bytes);
        self
    }

    pub fn padding(&mut self, len: usize) -> &mut Self {
        self.bytes.resize(self.bytes.len() + len, 0);
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Current length, usable as the offset of the next record.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// Packs arguments in producer order: width nibbles, values, then strings.
pub fn encode_args(args: &[Arg], out: &mut Vec<u8>) {
    let mut nibbles = Vec::new();
    let mut packed = Vec::new();
    let mut strings = Vec::new();

    for arg in args {
        match *arg {
            Arg::Int(v) => nibbles.push(varint::pack_signed(v, &mut packed)),
            Arg::Uint(v) => nibbles.push(varint::pack_unsigned(v, &mut packed)),
            Arg::Float(v) => nibbles.push(varint::pack_unsigned(v.to_bits(), &mut packed)),
            Arg::Str(s) => {
                strings.extend_from_slice(s.as_bytes());
                strings.push(0);
            }
        }
    }

    for pair in nibbles.chunks(2) {
        out.push(TwoNibbles::new(pair[0], pair.get(1).copied().unwrap_or(0)).0);
    }
    out.extend_from_slice(&packed);
    out.extend_from_slice(&strings);
}

/// Table whose format id `n` is `formats[n]`.
pub fn table(formats: &[&str]) -> FormatTable {
    let entries = formats
        .iter()
        .enumerate()
        .map(|(id, format)| (id as u32, FormatInfo::new(*format)));
    FormatTable::from(FormatRegistry::from_entries(entries).unwrap())
}

/// JSON registry text matching [`table`].
pub fn registry_json(formats: &[&str]) -> String {
    let entries: Vec<String> = formats
        .iter()
        .enumerate()
        .map(|(id, format)| format!(r#"{{"id": {}, "format": {:?}}}"#, id, format))
        .collect();
    format!(r#"{{"formats": [{}]}}"#, entries.join(", "))
}
