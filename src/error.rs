use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions hit while walking a compressed log stream.
///
/// None of these are retried: the stream carries no redundancy beyond
/// zero padding, so the decode loop halts on the first one. Lines that were
/// already emitted stay valid.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error while reading the log: {0}")]
    Io(#[from] io::Error),

    #[error("malformed variable-length integer at offset {offset}: {reason}")]
    MalformedVarint { offset: u64, reason: &'static str },

    #[error("truncated record at offset {offset}: {needed} more byte(s) required")]
    TruncatedRecord { offset: u64, needed: usize },

    #[error(
        "unknown format id {format_id} (table holds {table_len} entries); \
         the log and the format table were built from different program versions"
    )]
    UnknownFormatId { format_id: i64, table_len: usize },

    #[error("corrupt stream at offset {offset}: {reason}")]
    CorruptStream { offset: u64, reason: String },
}

/// Application-level failures of the `decoder` command.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("Unable to open file: {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid format schema: {0}")]
    Schema(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
