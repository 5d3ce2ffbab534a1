//! Header Extension Object and the two attribute objects it may carry:
//! the Metadata Object and the Metadata Library Object.
//!
//! Both hold description records with a 32-bit value length, a stream
//! number and (for the library) a language index. Records are parsed into
//! the tag so lookups and updates see them; every other extension child is
//! kept byte for byte.

use super::object::{self, ByteReader, Guid, OBJECT_PREAMBLE_SIZE};
use super::{AsfError, AttributeValue};

/// Reserved GUID and WORD at the start of a header extension payload.
const RESERVED_LEN: usize = 18;

/// Which extension object a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Metadata,
    MetadataLibrary,
}

/// One description record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub kind: RecordKind,
    /// Language list index; reserved (0) in the Metadata object
    pub language: u16,
    pub stream: u16,
    pub name: String,
    pub value: AttributeValue,
}

#[derive(Debug, Clone)]
enum ExtensionChild {
    Metadata,
    MetadataLibrary,
    Other { guid: Guid, payload: Vec<u8> },
}

/// Layout of a Header Extension Object, with its records held separately.
#[derive(Debug, Clone)]
pub struct HeaderExtension {
    reserved: [u8; RESERVED_LEN],
    children: Vec<ExtensionChild>,
}

impl HeaderExtension {
    /// Parse a header extension payload, appending its records to `records`.
    pub fn parse(payload: &[u8], records: &mut Vec<MetadataRecord>) -> Result<Self, AsfError> {
        let mut reader = ByteReader::new(payload);
        let mut reserved = [0u8; RESERVED_LEN];
        reserved.copy_from_slice(reader.take(RESERVED_LEN)?);
        let data_len = reader.u32()? as usize;
        let mut data = ByteReader::new(reader.take(data_len)?);

        let mut children = Vec::new();
        while data.remaining() >= OBJECT_PREAMBLE_SIZE {
            let guid = data.guid()?;
            let size = data.u64()?;
            let len = size
                .checked_sub(OBJECT_PREAMBLE_SIZE as u64)
                .filter(|len| *len <= data.remaining() as u64)
                .ok_or_else(|| {
                    AsfError::Malformed(format!("extension object {guid:?} has invalid size {size}"))
                })?;
            let payload = data.take(len as usize)?;

            if guid == Guid::METADATA {
                parse_records(RecordKind::Metadata, payload, records)?;
                children.push(ExtensionChild::Metadata);
            } else if guid == Guid::METADATA_LIBRARY {
                parse_records(RecordKind::MetadataLibrary, payload, records)?;
                children.push(ExtensionChild::MetadataLibrary);
            } else {
                children.push(ExtensionChild::Other {
                    guid,
                    payload: payload.to_vec(),
                });
            }
        }

        Ok(Self { reserved, children })
    }

    /// Serialize the extension payload with the surviving `records`. A
    /// Metadata or Metadata Library object left without records is dropped.
    pub fn to_payload(&self, records: &[MetadataRecord]) -> Result<Vec<u8>, AsfError> {
        let mut metadata = records_payload(RecordKind::Metadata, records)?;
        let mut library = records_payload(RecordKind::MetadataLibrary, records)?;

        let mut data = Vec::new();
        for child in &self.children {
            match child {
                ExtensionChild::Metadata => {
                    if let Some(payload) = metadata.take() {
                        object::write_object(&mut data, Guid::METADATA, &payload);
                    }
                }
                ExtensionChild::MetadataLibrary => {
                    if let Some(payload) = library.take() {
                        object::write_object(&mut data, Guid::METADATA_LIBRARY, &payload);
                    }
                }
                ExtensionChild::Other { guid, payload } => {
                    object::write_object(&mut data, *guid, payload)
                }
            }
        }

        let data_len = u32::try_from(data.len())
            .map_err(|_| AsfError::Malformed("header extension too large".to_string()))?;
        let mut payload = self.reserved.to_vec();
        payload.extend_from_slice(&data_len.to_le_bytes());
        payload.extend_from_slice(&data);
        Ok(payload)
    }
}

fn parse_records(
    kind: RecordKind,
    payload: &[u8],
    records: &mut Vec<MetadataRecord>,
) -> Result<(), AsfError> {
    let mut reader = ByteReader::new(payload);
    let count = reader.u16()?;
    for _ in 0..count {
        let language = reader.u16()?;
        let stream = reader.u16()?;
        let name_len = reader.u16()?;
        let code = reader.u16()?;
        let value_len = reader.u32()? as usize;
        let name = object::decode_utf16(reader.take(usize::from(name_len))?);
        let value = AttributeValue::decode(&name, code, reader.take(value_len)?)?;
        records.push(MetadataRecord {
            kind,
            language,
            stream,
            name,
            value,
        });
    }
    Ok(())
}

fn records_payload(
    kind: RecordKind,
    records: &[MetadataRecord],
) -> Result<Option<Vec<u8>>, AsfError> {
    let selected: Vec<&MetadataRecord> = records.iter().filter(|r| r.kind == kind).collect();
    if selected.is_empty() {
        return Ok(None);
    }

    let count = u16::try_from(selected.len())
        .map_err(|_| AsfError::Malformed("too many metadata records".to_string()))?;
    let mut payload = count.to_le_bytes().to_vec();
    for record in selected {
        let too_large = || AsfError::ValueTooLarge(record.name.clone());
        let name = object::encode_utf16(&record.name);
        let value = record.value.encode_word_bool();
        let name_len = u16::try_from(name.len()).map_err(|_| too_large())?;
        let value_len = u32::try_from(value.len()).map_err(|_| too_large())?;
        payload.extend_from_slice(&record.language.to_le_bytes());
        payload.extend_from_slice(&record.stream.to_le_bytes());
        payload.extend_from_slice(&name_len.to_le_bytes());
        payload.extend_from_slice(&record.value.type_code().to_le_bytes());
        payload.extend_from_slice(&value_len.to_le_bytes());
        payload.extend_from_slice(&name);
        payload.extend_from_slice(&value);
    }
    Ok(Some(payload))
}
