//! ASF (WMA) attribute container.
//!
//! Reads and rewrites the descriptive attributes stored in an ASF header
//! object:
//! - Content Description Object: `Title`, `Author`, `Copyright`,
//!   `Description`, `Rating`
//! - Extended Content Description Object: every other named attribute
//!   (`WM/AlbumTitle`, `WM/SharedUserRating`, ...)
//! - Metadata and Metadata Library objects inside the Header Extension
//!   Object: read for lookups, and dropped per name when that name is set
//!
//! All other header children are carried through byte for byte. Saving
//! rebuilds the header, patches the File Properties size, and replaces the
//! file through a temporary sibling.

pub mod extension;
pub mod object;

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use extension::{HeaderExtension, MetadataRecord};
use object::{ByteReader, Guid, HEADER_PREAMBLE_SIZE, OBJECT_PREAMBLE_SIZE};

/// Headers larger than this are rejected as corrupt.
const MAX_HEADER_SIZE: u64 = 64 * 1024 * 1024;

/// Attributes stored in the Content Description Object, in on-disk order.
pub const CONTENT_DESCRIPTION_FIELDS: [&str; 5] =
    ["Title", "Author", "Copyright", "Description", "Rating"];

/// Errors reading or writing an ASF header.
#[derive(Debug, thiserror::Error)]
pub enum AsfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("File is not an ASF container")]
    NotAsf,

    #[error("ASF header is truncated")]
    Truncated,

    #[error("ASF header is malformed: {0}")]
    Malformed(String),

    #[error("Unknown ASF attribute type {code} for {name}")]
    UnknownType { name: String, code: u16 },

    #[error("ASF attribute {0} is too large")]
    ValueTooLarge(String),
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Unicode(String),
    Bytes(Vec<u8>),
    Bool(bool),
    DWord(u32),
    QWord(u64),
    Word(u16),
    /// Only valid in the Metadata Library object
    Guid(Guid),
}

impl AttributeValue {
    fn type_code(&self) -> u16 {
        match self {
            AttributeValue::Unicode(_) => 0,
            AttributeValue::Bytes(_) => 1,
            AttributeValue::Bool(_) => 2,
            AttributeValue::DWord(_) => 3,
            AttributeValue::QWord(_) => 4,
            AttributeValue::Word(_) => 5,
            AttributeValue::Guid(_) => 6,
        }
    }

    fn decode(name: &str, code: u16, data: &[u8]) -> Result<Self, AsfError> {
        let mut reader = ByteReader::new(data);
        Ok(match code {
            0 => AttributeValue::Unicode(object::decode_utf16(data)),
            1 => AttributeValue::Bytes(data.to_vec()),
            // BOOL is a DWORD in the extended content description
            2 => AttributeValue::Bool(match data.len() {
                2 => reader.u16()? != 0,
                _ => reader.u32()? != 0,
            }),
            3 => AttributeValue::DWord(reader.u32()?),
            4 => AttributeValue::QWord(reader.u64()?),
            5 => AttributeValue::Word(reader.u16()?),
            6 => AttributeValue::Guid(reader.guid()?),
            code => {
                return Err(AsfError::UnknownType {
                    name: name.to_string(),
                    code,
                });
            }
        })
    }

    fn encode(&self) -> Vec<u8> {
        match self {
            AttributeValue::Unicode(text) => object::encode_utf16(text),
            AttributeValue::Bytes(bytes) => bytes.clone(),
            AttributeValue::Bool(flag) => u32::from(*flag).to_le_bytes().to_vec(),
            AttributeValue::DWord(n) => n.to_le_bytes().to_vec(),
            AttributeValue::QWord(n) => n.to_le_bytes().to_vec(),
            AttributeValue::Word(n) => n.to_le_bytes().to_vec(),
            AttributeValue::Guid(guid) => guid.0.to_vec(),
        }
    }

    /// Encoding used in Metadata and Metadata Library records, where BOOL is a WORD.
    fn encode_word_bool(&self) -> Vec<u8> {
        match self {
            AttributeValue::Bool(flag) => u16::from(*flag).to_le_bytes().to_vec(),
            other => other.encode(),
        }
    }

    /// Text form for display; byte arrays have none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttributeValue::Bytes(_) => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Unicode(text) => f.write_str(text),
            AttributeValue::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            AttributeValue::Bool(flag) => write!(f, "{flag}"),
            AttributeValue::DWord(n) => write!(f, "{n}"),
            AttributeValue::QWord(n) => write!(f, "{n}"),
            AttributeValue::Word(n) => write!(f, "{n}"),
            AttributeValue::Guid(guid) => write!(f, "{guid:?}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Unicode(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Unicode(value)
    }
}

/// Position of a header child, so a rewrite keeps the original order.
#[derive(Debug, Clone)]
enum HeaderChild {
    ContentDescription,
    ExtendedContentDescription,
    HeaderExtension(HeaderExtension),
    Other { guid: Guid, payload: Vec<u8> },
}

/// The attribute set of one ASF file.
#[derive(Debug, Clone)]
pub struct AsfTag {
    attributes: Vec<(String, AttributeValue)>,
    /// Records from the header extension, kept apart so they are written back there
    records: Vec<MetadataRecord>,
    children: Vec<HeaderChild>,
    reserved: [u8; 2],
}

impl Default for AsfTag {
    fn default() -> Self {
        Self {
            attributes: Vec::new(),
            records: Vec::new(),
            children: Vec::new(),
            reserved: [0x01, 0x02],
        }
    }
}

impl AsfTag {
    /// Read the header object of the file at `path`.
    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self, AsfError> {
        let mut file = File::open(path.as_ref())?;
        let (tag, _) = Self::read_from(&mut file)?;
        Ok(tag)
    }

    /// Read a header object, returning the tag and the header's size in bytes.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<(Self, u64), AsfError> {
        let (size, count, reserved) = read_preamble(reader)?;

        let mut body = vec![0u8; (size as usize) - HEADER_PREAMBLE_SIZE];
        reader.read_exact(&mut body).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => AsfError::Truncated,
            _ => AsfError::Io(e),
        })?;

        let mut tag = AsfTag {
            reserved,
            ..Default::default()
        };
        let mut body = ByteReader::new(&body);
        for _ in 0..count {
            let guid = body.guid()?;
            let object_size = body.u64()?;
            let payload_len = object_size
                .checked_sub(OBJECT_PREAMBLE_SIZE as u64)
                .filter(|len| *len <= body.remaining() as u64)
                .ok_or_else(|| {
                    AsfError::Malformed(format!("object {guid:?} has invalid size {object_size}"))
                })?;
            let payload = body.take(payload_len as usize)?;

            if guid == Guid::CONTENT_DESCRIPTION {
                tag.parse_content_description(payload)?;
                tag.place(HeaderChild::ContentDescription);
            } else if guid == Guid::EXTENDED_CONTENT_DESCRIPTION {
                tag.parse_extended_content_description(payload)?;
                tag.place(HeaderChild::ExtendedContentDescription);
            } else if guid == Guid::HEADER_EXTENSION {
                let extension = HeaderExtension::parse(payload, &mut tag.records)?;
                tag.children.push(HeaderChild::HeaderExtension(extension));
            } else {
                tag.children.push(HeaderChild::Other {
                    guid,
                    payload: payload.to_vec(),
                });
            }
        }

        Ok((tag, size))
    }

    fn place(&mut self, child: HeaderChild) {
        let present = self
            .children
            .iter()
            .any(|c| std::mem::discriminant(c) == std::mem::discriminant(&child));
        if !present {
            self.children.push(child);
        }
    }

    fn parse_content_description(&mut self, payload: &[u8]) -> Result<(), AsfError> {
        let mut reader = ByteReader::new(payload);
        let mut lengths = [0u16; 5];
        for length in &mut lengths {
            *length = reader.u16()?;
        }
        for (name, length) in CONTENT_DESCRIPTION_FIELDS.iter().zip(lengths) {
            let text = object::decode_utf16(reader.take(usize::from(length))?);
            if !text.is_empty() {
                self.attributes
                    .push((name.to_string(), AttributeValue::Unicode(text)));
            }
        }
        Ok(())
    }

    fn parse_extended_content_description(&mut self, payload: &[u8]) -> Result<(), AsfError> {
        let mut reader = ByteReader::new(payload);
        let count = reader.u16()?;
        for _ in 0..count {
            let name_len = reader.u16()?;
            let name = object::decode_utf16(reader.take(usize::from(name_len))?);
            let code = reader.u16()?;
            let value_len = reader.u16()?;
            let value = AttributeValue::decode(&name, code, reader.take(usize::from(value_len))?)?;
            self.attributes.push((name, value));
        }
        Ok(())
    }

    /// First value stored under `name`, preferring the content description objects.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
            .or_else(|| {
                self.records
                    .iter()
                    .find(|record| record.name == name)
                    .map(|record| &record.value)
            })
    }

    /// Every value stored under `name`: content description objects first,
    /// then header extension records, each in file order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AttributeValue> + 'a {
        let records = self
            .records
            .iter()
            .filter(move |record| record.name == name)
            .map(|record| &record.value);
        self.attributes
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value)
            .chain(records)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set `name` to a single value, replacing all previous values,
    /// including header extension records of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        let name = name.into();
        let value = value.into();
        self.records.retain(|record| record.name != name);
        match self.attributes.iter().position(|(key, _)| *key == name) {
            Some(index) => {
                self.attributes[index].1 = value;
                let mut seen = 0usize;
                self.attributes.retain(|(key, _)| {
                    if *key != name {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove every value stored under `name`. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.attributes.len() + self.records.len();
        self.attributes.retain(|(key, _)| key != name);
        self.records.retain(|record| record.name != name);
        self.attributes.len() + self.records.len() != before
    }

    /// All attributes, content description objects first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        let records = self
            .records
            .iter()
            .map(|record| (record.name.as_str(), &record.value));
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value))
            .chain(records)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.records.is_empty()
    }

    fn is_content_description(name: &str) -> bool {
        CONTENT_DESCRIPTION_FIELDS.contains(&name)
    }

    fn content_description_payload(&self) -> Result<Option<Vec<u8>>, AsfError> {
        if !self
            .attributes
            .iter()
            .any(|(key, _)| Self::is_content_description(key))
        {
            return Ok(None);
        }

        let mut lengths = Vec::with_capacity(10);
        let mut strings = Vec::new();
        for name in CONTENT_DESCRIPTION_FIELDS {
            let encoded = match self.get(name) {
                Some(value) => object::encode_utf16(&value.to_string()),
                None => Vec::new(),
            };
            let length = u16::try_from(encoded.len())
                .map_err(|_| AsfError::ValueTooLarge(name.to_string()))?;
            lengths.extend_from_slice(&length.to_le_bytes());
            strings.extend_from_slice(&encoded);
        }
        lengths.extend_from_slice(&strings);
        Ok(Some(lengths))
    }

    fn extended_content_description_payload(&self) -> Result<Option<Vec<u8>>, AsfError> {
        let extended: Vec<&(String, AttributeValue)> = self
            .attributes
            .iter()
            .filter(|(key, _)| !Self::is_content_description(key))
            .collect();
        if extended.is_empty() {
            return Ok(None);
        }

        let count = u16::try_from(extended.len())
            .map_err(|_| AsfError::Malformed("too many attributes".to_string()))?;
        let mut payload = count.to_le_bytes().to_vec();
        for (name, value) in extended {
            if matches!(value, AttributeValue::Guid(_)) {
                return Err(AsfError::Malformed(format!(
                    "{name}: GUID values belong in the metadata library"
                )));
            }
            let too_large = || AsfError::ValueTooLarge(name.clone());
            let encoded_name = object::encode_utf16(name);
            let encoded_value = value.encode();
            let name_len = u16::try_from(encoded_name.len()).map_err(|_| too_large())?;
            let value_len = u16::try_from(encoded_value.len()).map_err(|_| too_large())?;
            payload.extend_from_slice(&name_len.to_le_bytes());
            payload.extend_from_slice(&encoded_name);
            payload.extend_from_slice(&value.type_code().to_le_bytes());
            payload.extend_from_slice(&value_len.to_le_bytes());
            payload.extend_from_slice(&encoded_value);
        }
        Ok(Some(payload))
    }

    /// Serialize the header object for a file whose non-header part is
    /// `trailing_len` bytes long.
    fn header_bytes(&self, trailing_len: u64) -> Result<Vec<u8>, AsfError> {
        let mut content = self.content_description_payload()?;
        let mut extended = self.extended_content_description_payload()?;

        let mut objects: Vec<(Guid, Vec<u8>)> = Vec::new();
        for child in &self.children {
            match child {
                HeaderChild::ContentDescription => {
                    if let Some(payload) = content.take() {
                        objects.push((Guid::CONTENT_DESCRIPTION, payload));
                    }
                }
                HeaderChild::ExtendedContentDescription => {
                    if let Some(payload) = extended.take() {
                        objects.push((Guid::EXTENDED_CONTENT_DESCRIPTION, payload));
                    }
                }
                HeaderChild::HeaderExtension(extension) => {
                    objects.push((Guid::HEADER_EXTENSION, extension.to_payload(&self.records)?))
                }
                HeaderChild::Other { guid, payload } => objects.push((*guid, payload.clone())),
            }
        }
        if let Some(payload) = content {
            objects.push((Guid::CONTENT_DESCRIPTION, payload));
        }
        if let Some(payload) = extended {
            objects.push((Guid::EXTENDED_CONTENT_DESCRIPTION, payload));
        }

        let header_len = HEADER_PREAMBLE_SIZE
            + objects
                .iter()
                .map(|(_, payload)| OBJECT_PREAMBLE_SIZE + payload.len())
                .sum::<usize>();
        let file_size = header_len as u64 + trailing_len;

        let mut out = Vec::with_capacity(header_len);
        out.extend_from_slice(&Guid::HEADER.0);
        out.extend_from_slice(&(header_len as u64).to_le_bytes());
        out.extend_from_slice(&(objects.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.reserved);
        for (guid, mut payload) in objects {
            // File ID (16 bytes) precedes the file size field
            if guid == Guid::FILE_PROPERTIES && payload.len() >= 24 {
                payload[16..24].copy_from_slice(&file_size.to_le_bytes());
            }
            object::write_object(&mut out, guid, &payload);
        }
        Ok(out)
    }

    /// Rewrite the header of the ASF file at `path` with this tag's attributes.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), AsfError> {
        let path = path.as_ref();
        let mut original = File::open(path)?;
        let permissions = original.metadata()?.permissions();
        let file_len = original.metadata()?.len();

        let (old_header_len, _, _) = read_preamble(&mut original)?;
        let trailing_len = file_len
            .checked_sub(old_header_len)
            .ok_or(AsfError::Truncated)?;
        let header = self.header_bytes(trailing_len)?;

        let temp_path = temp_sibling(path);
        let written = (|| -> Result<(), AsfError> {
            let mut out = BufWriter::new(File::create(&temp_path)?);
            out.write_all(&header)?;
            original.seek(SeekFrom::Start(old_header_len))?;
            io::copy(&mut original, &mut out)?;
            out.into_inner().map_err(|e| e.into_error())?.sync_all()?;
            fs::set_permissions(&temp_path, permissions)?;
            Ok(())
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        drop(original);
        fs::rename(&temp_path, path).inspect_err(|_| {
            let _ = fs::remove_file(&temp_path);
        })?;
        Ok(())
    }
}

/// Read and check the 30-byte header preamble: (size, child count, reserved).
fn read_preamble<R: Read>(reader: &mut R) -> Result<(u64, u32, [u8; 2]), AsfError> {
    let mut preamble = [0u8; HEADER_PREAMBLE_SIZE];
    reader.read_exact(&mut preamble).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => AsfError::NotAsf,
        _ => AsfError::Io(e),
    })?;

    let mut cursor = ByteReader::new(&preamble);
    if cursor.guid()? != Guid::HEADER {
        return Err(AsfError::NotAsf);
    }
    let size = cursor.u64()?;
    let count = cursor.u32()?;
    let reserved = [preamble[28], preamble[29]];

    if size < HEADER_PREAMBLE_SIZE as u64 || size > MAX_HEADER_SIZE {
        return Err(AsfError::Malformed(format!("header size {size}")));
    }
    Ok((size, count, reserved))
}

/// `song.wma` -> `song.wma.tagwright.tmp` in the same directory.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tagwright.tmp");
    path.with_file_name(name)
}
