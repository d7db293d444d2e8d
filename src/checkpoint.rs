use crate::byte_cursor::ByteCursor;
use crate::error::{DecodeError, Result};
use crate::metadata::EntryType;

/// Cycle rate assumed until the stream supplies a checkpoint.
pub const DEFAULT_CYCLES_PER_SECOND: f64 = 1.0e9;

/// Encoded size of a checkpoint record, tag included.
pub const CHECKPOINT_SIZE: usize = 1 + 8 + 8 + 8;

/// Calibration record written by the producer.
///
/// `cycles_at_epoch` and `unix_time` anchor the cycle counter to wall-clock
/// time; only `cycles_per_second` is used for display today.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub cycles_at_epoch: u64,
    pub unix_time: i64,
    pub cycles_per_second: f64,
}

/// Converts raw cycle counts into elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    cycles_per_second: f64,
}

impl Calibration {
    /// Returns `None` unless `cycles_per_second` is finite and positive.
    pub fn new(cycles_per_second: f64) -> Option<Self> {
        (cycles_per_second.is_finite() && cycles_per_second > 0.0)
            .then_some(Self { cycles_per_second })
    }

    pub fn cycles_per_second(&self) -> f64 {
        self.cycles_per_second
    }

    /// Nanoseconds spanned by `cycles`; negative for a clock that went back.
    pub fn to_nanos(&self, cycles: i64) -> f64 {
        1.0e9 * cycles as f64 / self.cycles_per_second
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            cycles_per_second: DEFAULT_CYCLES_PER_SECOND,
        }
    }
}

impl From<&Checkpoint> for Calibration {
    fn from(checkpoint: &Checkpoint) -> Self {
        Self {
            cycles_per_second: checkpoint.cycles_per_second,
        }
    }
}

/// Decodes a checkpoint record, tag included.
///
/// The record has a fixed shape: three little-endian 8-byte fields after
/// the tag. A cycle rate that cannot calibrate anything is rejected as
/// corruption rather than producing infinite elapsed times later.
pub fn decode_checkpoint(cursor: &mut ByteCursor<'_>) -> Result<Checkpoint> {
    let offset = cursor.position();
    let tag = cursor.read_byte()?;
    if tag != EntryType::CHECKPOINT_TAG {
        return Err(DecodeError::CorruptStream {
            offset,
            reason: format!("expected a checkpoint tag, found 0x{:02x}", tag),
        });
    }

    let cycles_at_epoch = u64::from_le_bytes(cursor.read_array()?);
    let unix_time = i64::from_le_bytes(cursor.read_array()?);
    let cycles_per_second = f64::from_le_bytes(cursor.read_array()?);

    if Calibration::new(cycles_per_second).is_none() {
        return Err(DecodeError::CorruptStream {
            offset,
            reason: format!("checkpoint has an unusable cycle rate {}", cycles_per_second),
        });
    }

    Ok(Checkpoint {
        cycles_at_epoch,
        unix_time,
        cycles_per_second,
    })
}

/// Appends the encoding of `checkpoint`. Exact inverse of [`decode_checkpoint`].
pub fn encode_checkpoint(checkpoint: &Checkpoint, out: &mut Vec<u8>) {
    out.push(EntryType::CHECKPOINT_TAG);
    out.extend_from_slice(&checkpoint.cycles_at_epoch.to_le_bytes());
    out.extend_from_slice(&checkpoint.unix_time.to_le_bytes());
    out.extend_from_slice(&checkpoint.cycles_per_second.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_checkpoint() {
        let checkpoint = Checkpoint {
            cycles_at_epoch: 123_456_789,
            unix_time: 1_700_000_000,
            cycles_per_second: 2.5e9,
        };
        let mut bytes = Vec::new();
        encode_checkpoint(&checkpoint, &mut bytes);
        assert_eq!(bytes.len(), CHECKPOINT_SIZE);

        let mut cursor = ByteCursor::new(&bytes[..]);
        assert_eq!(decode_checkpoint(&mut cursor).unwrap(), checkpoint);
        assert_eq!(cursor.position(), CHECKPOINT_SIZE as u64);
    }

    #[test]
    fn test_truncated_checkpoint() {
        let mut bytes = Vec::new();
        encode_checkpoint(
            &Checkpoint { cycles_at_epoch: 1, unix_time: 2, cycles_per_second: 3.0 },
            &mut bytes,
        );
        bytes.truncate(20);

        let mut cursor = ByteCursor::new(&bytes[..]);
        assert!(matches!(
            decode_checkpoint(&mut cursor),
            Err(DecodeError::TruncatedRecord { needed: 5, .. })
        ));
    }

    #[test]
    fn test_unusable_cycle_rate() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut bytes = Vec::new();
            encode_checkpoint(
                &Checkpoint { cycles_at_epoch: 0, unix_time: 0, cycles_per_second: rate },
                &mut bytes,
            );
            let mut cursor = ByteCursor::new(&bytes[..]);
            assert!(matches!(
                decode_checkpoint(&mut cursor),
                Err(DecodeError::CorruptStream { offset: 0, .. })
            ));
        }
    }

    #[test]
    fn test_calibration_conversion() {
        let calibration = Calibration::new(2.0e9).unwrap();
        assert_eq!(calibration.to_nanos(4_000), 2_000.0);
        assert_eq!(calibration.to_nanos(-4_000), -2_000.0);

        assert_eq!(Calibration::default().to_nanos(1_500), 1_500.0);
        assert!(Calibration::new(0.0).is_none());
    }
}
