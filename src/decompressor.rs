use std::io::Write;

use tracing::{debug, error, trace};

use crate::byte_cursor::ByteCursor;
use crate::checkpoint::{decode_checkpoint, Calibration, Checkpoint};
use crate::error::{DecodeError, Result};
use crate::format_table::FormatTable;
use crate::metadata::{decode_metadata, EntryType, StreamState};

/// One decoded log message.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// Zero-based position among emitted messages; checkpoints don't count.
    pub index: u64,
    pub format_id: u32,
    /// Absolute cycle count.
    pub timestamp: u64,
    /// Time since the previous message under the active calibration.
    pub elapsed_ns: f64,
    pub text: String,
}

/// Something the decompressor found in the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Message(DecodedMessage),
    Checkpoint(Checkpoint),
}

/// Drives the decode loop over a compressed log.
///
/// The decompressor owns the running delta state and the active
/// calibration. Records are read strictly in order:
///
/// 1. Log messages are decoded (metadata, then arguments through the
///    [`FormatTable`]) and only then committed to the delta state, so a
///    record that fails half way never corrupts it.
/// 2. Checkpoints replace the calibration and are not counted as messages.
/// 3. Zero bytes between records are padding and are skipped.
///
/// Decoding stops at the end of the stream, when the optional message limit
/// is reached, or on the first fatal error.
///
/// # Examples
///
/// ```
/// # use binary_log_decoder::{ByteCursor, Decompressor, FormatInfo, FormatTable};
/// let mut table = FormatTable::new();
/// table.push_fn(FormatInfo::new("hello"), |_cursor, out| {
///     out.push_str("hello");
///     Ok(())
/// });
///
/// // One message: format id +0, timestamp +250, then two bytes of padding.
/// let data = [0x01, 0x11, 0x00, 0xfa, 0x00, 0x00];
/// let mut cursor = ByteCursor::new(&data[..]);
/// let mut out = Vec::new();
///
/// let mut decompressor = Decompressor::new(&table);
/// assert_eq!(decompressor.run(&mut cursor, &mut out).unwrap(), 1);
/// assert_eq!(String::from_utf8(out).unwrap(), "   0) +    250.00 ns: hello\n");
/// ```
pub struct Decompressor<'t> {
    table: &'t FormatTable,
    state: StreamState,
    calibration: Calibration,
    limit: Option<u64>,
    messages: u64,
}

impl<'t> Decompressor<'t> {
    pub fn new(table: &'t FormatTable) -> Self {
        Self {
            table,
            state: StreamState::default(),
            calibration: Calibration::default(),
            limit: None,
            messages: 0,
        }
    }

    /// Stops after `limit` messages. `None` or zero means no limit.
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit.filter(|&n| n > 0);
        self
    }

    /// Calibration used until the stream supplies a checkpoint.
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Messages emitted so far. Still valid after a fatal error.
    pub fn messages_emitted(&self) -> u64 {
        self.messages
    }

    /// Decodes up to the next event, or returns `None` once decoding is done.
    ///
    /// A returned message counts as emitted.
    pub fn next_event(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Event>> {
        let event = self.decode_next(cursor)?;
        if let Some(Event::Message(_)) = event {
            self.messages += 1;
        }
        Ok(event)
    }

    fn decode_next(&mut self, cursor: &mut ByteCursor<'_>) -> Result<Option<Event>> {
        loop {
            if self.limit.is_some_and(|limit| self.messages >= limit) {
                return Ok(None);
            }

            let Some(tag) = cursor.peek()? else {
                return Ok(None);
            };

            match EntryType::from_tag(tag) {
                Some(EntryType::LogMessage) => {
                    return self.decode_message(cursor).map(|m| Some(Event::Message(m)));
                }
                Some(EntryType::Checkpoint) => {
                    let checkpoint = decode_checkpoint(cursor)?;
                    debug!(
                        cycles_per_second = checkpoint.cycles_per_second,
                        cycles_at_epoch = checkpoint.cycles_at_epoch,
                        unix_time = checkpoint.unix_time,
                        "calibration updated from checkpoint"
                    );
                    self.calibration = Calibration::from(&checkpoint);
                    return Ok(Some(Event::Checkpoint(checkpoint)));
                }
                Some(EntryType::Invalid) => self.skip_padding(cursor)?,
                None => {
                    return Err(DecodeError::CorruptStream {
                        offset: cursor.position(),
                        reason: format!("entry type 0x{:02x} does not match anything", tag),
                    });
                }
            }
        }
    }

    /// Decodes the whole stream, writing one line per event to `out`.
    ///
    /// Returns the number of messages emitted. Lines written before an
    /// error stay written; [`messages_emitted`](Self::messages_emitted)
    /// reports how many there were. A message only counts once its line
    /// has been written.
    pub fn run<W: Write + ?Sized>(&mut self, cursor: &mut ByteCursor<'_>, out: &mut W) -> Result<u64> {
        loop {
            let event = match self.decode_next(cursor) {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(e) => {
                    error!(
                        offset = cursor.position(),
                        messages = self.messages,
                        "decoding halted: {}",
                        e
                    );
                    return Err(e);
                }
            };

            match event {
                Event::Message(message) => {
                    writeln!(
                        out,
                        "{:4}) +{:10.2} ns: {}",
                        message.index, message.elapsed_ns, message.text
                    )?;
                    self.messages += 1;
                }
                Event::Checkpoint(checkpoint) => writeln!(
                    out,
                    "Found a checkpoint. CyclesPerSec={:.6}",
                    checkpoint.cycles_per_second
                )?,
            }
        }
        Ok(self.messages)
    }

    fn decode_message(&mut self, cursor: &mut ByteCursor<'_>) -> Result<DecodedMessage> {
        let offset = cursor.position();
        let table_len = self.table.len();
        let metadata = decode_metadata(cursor, self.state.last_format_id, self.state.last_timestamp)
            .map_err(|e| match e {
                DecodeError::UnknownFormatId { format_id, .. } => {
                    DecodeError::UnknownFormatId { format_id, table_len }
                }
                other => other,
            })?;

        let entry = self
            .table
            .get(metadata.format_id)
            .ok_or(DecodeError::UnknownFormatId {
                format_id: i64::from(metadata.format_id),
                table_len,
            })?;
        trace!(
            offset,
            format_id = metadata.format_id,
            timestamp = metadata.timestamp,
            file = entry.info().file.as_deref().unwrap_or(""),
            line = entry.info().line.unwrap_or(0),
            "decoding log message"
        );

        let mut text = String::new();
        entry.decode(cursor, &mut text)?;

        let elapsed = metadata.timestamp.wrapping_sub(self.state.last_timestamp) as i64;
        let message = DecodedMessage {
            index: self.messages,
            format_id: metadata.format_id,
            timestamp: metadata.timestamp,
            elapsed_ns: self.calibration.to_nanos(elapsed),
            text,
        };

        self.state.commit(&metadata);
        Ok(message)
    }

    fn skip_padding(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        let start = cursor.position();
        let skipped = cursor.skip_zeros()?;
        debug!(offset = start, bytes = skipped, "skipped padding");

        match cursor.peek()? {
            None => Ok(()),
            Some(tag) if EntryType::from_tag(tag).is_some() => Ok(()),
            Some(tag) => Err(DecodeError::CorruptStream {
                offset: cursor.position(),
                reason: format!(
                    "byte 0x{:02x} after {} byte(s) of padding is not a record tag",
                    tag, skipped
                ),
            }),
        }
    }
}
