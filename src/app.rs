use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use clap::error::ErrorKind;
use lz4_flex::frame::FrameDecoder;
use tracing::info;

use crate::byte_cursor::ByteCursor;
use crate::config::DecoderConfig;
use crate::decompressor::Decompressor;
use crate::error::Error;
use crate::format_registry::FormatRegistry;
use crate::format_table::FormatTable;

pub const EXIT_SUCCESS: u8 = 0;
/// Bad arguments, unreadable input or an unusable format registry.
pub const EXIT_USAGE: u8 = 1;
/// Decoding started but hit a fatal error part way through.
pub const EXIT_DECODE_FAILURE: u8 = 2;

/// Leading bytes of an LZ4 frame.
pub const LZ4_FRAME_MAGIC: [u8; 4] = [0x04, 0x22, 0x4d, 0x18];

/// Runs the `decoder` command and returns its exit code.
///
/// Decoded lines go to `out`, diagnostics to `err`. The summary line is
/// printed even when decoding halts early, so the count always matches
/// what was written.
pub fn run<I, T>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let config = match DecoderConfig::try_parse_from(args) {
        Ok(config) => config,
        Err(e) => {
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = write!(out, "{}", e);
                    EXIT_SUCCESS
                }
                _ => {
                    let _ = write!(err, "{}", Error::Usage(e.to_string()));
                    EXIT_USAGE
                }
            };
        }
    };

    let mut cursor = match open_log(&config.log_file) {
        Ok(cursor) => cursor,
        Err(e) => {
            let _ = writeln!(err, "{}", e);
            return EXIT_USAGE;
        }
    };

    let table = match FormatRegistry::load(&config.formats) {
        Ok(registry) => FormatTable::from(registry),
        Err(e) => {
            let _ = writeln!(err, "{}", e);
            return EXIT_USAGE;
        }
    };

    info!(
        log = %config.log_file.display(),
        formats = %config.formats.display(),
        entries = table.len(),
        limit = config.max_messages,
        "starting decode"
    );
    let _ = writeln!(out, "Opening file {}", config.log_file.display());

    let mut decompressor = Decompressor::new(&table)
        .with_limit(config.max_messages)
        .with_calibration(config.calibration);
    let result = decompressor.run(&mut cursor, out);
    let printed = decompressor.messages_emitted();

    let _ = writeln!(
        out,
        "\n\nDecompression Complete after printing {} log messages",
        printed
    );
    let _ = out.flush();

    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(e) => {
            let _ = writeln!(err, "{}", Error::from(e));
            EXIT_DECODE_FAILURE
        }
    }
}

/// Opens a log for decoding, transparently unwrapping an LZ4 frame.
pub fn open_log(path: &Path) -> Result<ByteCursor<'static>, Error> {
    let open_error = |source: io::Error| Error::Open {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = BufReader::new(File::open(path).map_err(open_error)?);
    let compressed = reader.fill_buf().map_err(open_error)?.starts_with(&LZ4_FRAME_MAGIC);

    if compressed {
        info!(path = %path.display(), "log is wrapped in an lz4 frame");
        Ok(ByteCursor::new(BufReader::new(FrameDecoder::new(reader))))
    } else {
        Ok(ByteCursor::new(reader))
    }
}
