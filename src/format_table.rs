use crate::byte_cursor::ByteCursor;
use crate::error::Result;
use crate::format_registry::{FormatInfo, FormatRegistry};
use crate::printf::PrintfFormat;

/// Decodes the argument bytes of one call site into a printable line.
///
/// Implementations must consume exactly the bytes their call site wrote;
/// the stream has no record length, so anything left over would be read
/// as the next record. Plain closures with the matching signature work:
///
/// ```
/// # use binary_log_decoder::{ByteCursor, FormatInfo, FormatTable};
/// let mut table = FormatTable::new();
/// let id = table.push_fn(FormatInfo::new("byte %d"), |cursor, out| {
///     let byte = cursor.read_byte()?;
///     out.push_str(&format!("byte {}", byte));
///     Ok(())
/// });
///
/// let data = [42u8];
/// let mut cursor = ByteCursor::new(&data[..]);
/// let mut line = String::new();
/// table.get(id).unwrap().decode(&mut cursor, &mut line).unwrap();
/// assert_eq!(line, "byte 42");
/// ```
pub trait ArgumentDecoder {
    fn decode(&self, cursor: &mut ByteCursor<'_>, out: &mut String) -> Result<()>;
}

impl<F> ArgumentDecoder for F
where
    F: Fn(&mut ByteCursor<'_>, &mut String) -> Result<()>,
{
    fn decode(&self, cursor: &mut ByteCursor<'_>, out: &mut String) -> Result<()> {
        self(cursor, out)
    }
}

impl ArgumentDecoder for PrintfFormat {
    fn decode(&self, cursor: &mut ByteCursor<'_>, out: &mut String) -> Result<()> {
        let args = self.decode_args(cursor)?;
        self.render(&args, out);
        Ok(())
    }
}

/// One slot of the dispatch table.
pub struct FormatEntry {
    info: FormatInfo,
    decoder: Box<dyn ArgumentDecoder + Send + Sync>,
}

impl FormatEntry {
    pub fn info(&self) -> &FormatInfo {
        &self.info
    }

    pub fn decode(&self, cursor: &mut ByteCursor<'_>, out: &mut String) -> Result<()> {
        self.decoder.decode(cursor, out)
    }
}

/// Ordered mapping from format id to argument decoder.
///
/// Ids are dense and zero-based: the n-th pushed decoder answers format id
/// n. The table is built once before decoding starts and only read after.
#[derive(Default)]
pub struct FormatTable {
    entries: Vec<FormatEntry>,
}

impl FormatTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decoder and returns the format id it answers to.
    pub fn push<D>(&mut self, info: FormatInfo, decoder: D) -> u32
    where
        D: ArgumentDecoder + Send + Sync + 'static,
    {
        let id = self.entries.len() as u32;
        self.entries.push(FormatEntry {
            info,
            decoder: Box::new(decoder),
        });
        id
    }

    /// Same as [`push`](Self::push), spelled out for closures so their
    /// argument types are inferred.
    pub fn push_fn<F>(&mut self, info: FormatInfo, decoder: F) -> u32
    where
        F: Fn(&mut ByteCursor<'_>, &mut String) -> Result<()> + Send + Sync + 'static,
    {
        self.push(info, decoder)
    }

    pub fn get(&self, format_id: u32) -> Option<&FormatEntry> {
        self.entries.get(format_id as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<FormatRegistry> for FormatTable {
    fn from(registry: FormatRegistry) -> Self {
        let mut table = FormatTable::new();
        for format in registry.into_formats() {
            table.push(format.info, format.printf);
        }
        table
    }
}
