//! # Binary Log Decoder
//!
//! Turns compact binary logs back into readable text. The producer side
//! writes each log call as a few bytes of delta-encoded metadata followed
//! by its raw arguments; everything else (format strings, file names,
//! argument types) lives in a format table shipped next to the log.
//!
//! ## Key Features
//!
//! * Streaming decode: constant memory no matter how large the log is
//! * Nibble-packed variable-length integers for ids, timestamps and arguments
//! * Checkpoint records that recalibrate cycle counts into nanoseconds
//! * Zero padding between records is skipped and validated
//! * Transparent handling of logs wrapped in an LZ4 frame
//!
//! ## Main Components
//!
//! * `Decompressor`: the decode loop and its running delta state
//! * `FormatTable`: dispatch from format id to argument decoder
//! * `FormatRegistry`: JSON description of the program's log call sites
//! * `ByteCursor`: bounds-checked reads over any buffered input
//!
//! ## Quick Start
//!
//! ```
//! use binary_log_decoder::{ByteCursor, Decompressor, FormatRegistry, FormatTable};
//!
//! let registry = FormatRegistry::from_json(
//!     r#"{ "formats": [ { "id": 0, "format": "Temperature: %d C" } ] }"#,
//! ).unwrap();
//! let table = FormatTable::from(registry);
//!
//! // tag, width nibbles, format id +0, timestamp +100,
//! // then the argument width nibbles and the argument 25
//! let log = [0x01, 0x11, 0x00, 0x64, 0x01, 0x19];
//! let mut cursor = ByteCursor::new(&log[..]);
//! let mut out = Vec::new();
//!
//! Decompressor::new(&table).run(&mut cursor, &mut out).unwrap();
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "   0) +    100.00 ns: Temperature: 25 C\n"
//! );
//! ```

pub mod app;
pub mod byte_cursor;
pub mod checkpoint;
pub mod config;
pub mod decompressor;
pub mod error;
pub mod format_registry;
pub mod format_table;
pub mod metadata;
pub mod printf;
pub mod varint;

pub use byte_cursor::ByteCursor;
pub use checkpoint::{Calibration, Checkpoint};
pub use config::DecoderConfig;
pub use decompressor::{DecodedMessage, Decompressor, Event};
pub use error::{DecodeError, Error};
pub use format_registry::{FormatInfo, FormatRegistry};
pub use format_table::{ArgumentDecoder, FormatTable};
pub use metadata::{DecompressedMetadata, EntryType, StreamState};
