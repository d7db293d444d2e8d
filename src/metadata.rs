use crate::byte_cursor::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::varint::{self, TwoNibbles};

/// Tag byte that precedes every record in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// No record starts here; the producer's zero padding.
    Invalid,
    LogMessage,
    Checkpoint,
}

impl EntryType {
    pub const INVALID_TAG: u8 = 0x00;
    pub const LOG_MESSAGE_TAG: u8 = 0x01;
    pub const CHECKPOINT_TAG: u8 = 0x02;

    /// Maps a tag byte to its entry type, or `None` for an unrecognized tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            Self::INVALID_TAG => Some(EntryType::Invalid),
            Self::LOG_MESSAGE_TAG => Some(EntryType::LogMessage),
            Self::CHECKPOINT_TAG => Some(EntryType::Checkpoint),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            EntryType::Invalid => Self::INVALID_TAG,
            EntryType::LogMessage => Self::LOG_MESSAGE_TAG,
            EntryType::Checkpoint => Self::CHECKPOINT_TAG,
        }
    }
}

/// Absolute format id and cycle-count timestamp of one log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompressedMetadata {
    pub format_id: u32,
    pub timestamp: u64,
}

/// Running memory of the previous log message.
///
/// Both metadata fields are stored as deltas against these values. The
/// decompressor commits a new state only after a whole record decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamState {
    pub last_format_id: u32,
    pub last_timestamp: u64,
}

impl StreamState {
    pub fn commit(&mut self, metadata: &DecompressedMetadata) {
        self.last_format_id = metadata.format_id;
        self.last_timestamp = metadata.timestamp;
    }
}

/// Decodes the metadata header of a log-message record.
///
/// The layout is the tag byte, one byte of width nibbles (format-id delta
/// low, timestamp delta high), then the two signed deltas. The caller's
/// running state is taken by value and left untouched.
///
/// # Examples
///
/// ```
/// # use binary_log_decoder::ByteCursor;
/// # use binary_log_decoder::metadata::decode_metadata;
/// // format id +2, timestamp +1000
/// let data = [0x01, 0x21, 0x02, 0xe8, 0x03];
/// let mut cursor = ByteCursor::new(&data[..]);
///
/// let metadata = decode_metadata(&mut cursor, 5, 10_000).unwrap();
/// assert_eq!(metadata.format_id, 7);
/// assert_eq!(metadata.timestamp, 11_000);
/// ```
pub fn decode_metadata(
    cursor: &mut ByteCursor<'_>,
    last_format_id: u32,
    last_timestamp: u64,
) -> Result<DecompressedMetadata> {
    let offset = cursor.position();
    let tag = cursor.read_byte()?;
    if tag != EntryType::LOG_MESSAGE_TAG {
        return Err(DecodeError::CorruptStream {
            offset,
            reason: format!("expected a log message tag, found 0x{:02x}", tag),
        });
    }

    let nibbles = TwoNibbles(cursor.read_byte()?);
    let format_id_delta = varint::decode_signed(cursor, nibbles.first())?;
    let timestamp_delta = varint::decode_signed(cursor, nibbles.second())?;

    let format_id = i64::from(last_format_id).wrapping_add(format_id_delta);
    let format_id = u32::try_from(format_id).map_err(|_| DecodeError::UnknownFormatId {
        format_id,
        table_len: 0,
    })?;

    Ok(DecompressedMetadata {
        format_id,
        timestamp: last_timestamp.wrapping_add(timestamp_delta as u64),
    })
}

/// Appends the metadata header for `metadata` given the previous record's
/// values. Exact inverse of [`decode_metadata`].
pub fn encode_metadata(metadata: &DecompressedMetadata, previous: &StreamState, out: &mut Vec<u8>) {
    out.push(EntryType::LOG_MESSAGE_TAG);
    let nibble_pos = out.len();
    out.push(0);

    let format_id_delta = i64::from(metadata.format_id) - i64::from(previous.last_format_id);
    let timestamp_delta = metadata.timestamp.wrapping_sub(previous.last_timestamp) as i64;

    let first = varint::pack_signed(format_id_delta, out);
    let second = varint::pack_signed(timestamp_delta, out);
    out[nibble_pos] = TwoNibbles::new(first, second).0;
}
