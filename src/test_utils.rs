//! Test utilities and fixtures for tagwright tests.
//!
//! Synthesizes the smallest files each container reader accepts, so the
//! encoders can be exercised end to end without shipping binary fixtures.
//!
//! # Example
//!
//! ```ignore
//! let dir = tempfile::tempdir().unwrap();
//! let path = test_utils::mp3_fixture(dir.path(), "song.mp3");
//! // ... apply updates to `path`, then read them back
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::asf::object::{self, Guid};

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, joint stereo, no CRC.
const MPEG_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
/// 144 * 128000 / 44100, no padding
const MPEG_FRAME_LEN: usize = 417;

/// Writes a tagless MP3 made of a few silent frames.
pub fn mp3_fixture(dir: &Path, name: &str) -> PathBuf {
    let mut data = Vec::with_capacity(MPEG_FRAME_LEN * 10);
    for _ in 0..10 {
        data.extend_from_slice(&MPEG_FRAME_HEADER);
        data.resize(data.len() + MPEG_FRAME_LEN - MPEG_FRAME_HEADER.len(), 0);
    }
    write(dir, name, &data)
}

fn flac_stream(streaminfo_last: bool) -> Vec<u8> {
    let mut data = b"fLaC".to_vec();
    // last-metadata-block flag + STREAMINFO, 34 bytes
    let flag = if streaminfo_last { 0x80 } else { 0x00 };
    data.extend_from_slice(&[flag, 0x00, 0x00, 0x22]);
    data.extend_from_slice(&4096u16.to_be_bytes()); // min block size
    data.extend_from_slice(&4096u16.to_be_bytes()); // max block size
    data.extend_from_slice(&[0, 0, 0]); // min frame size
    data.extend_from_slice(&[0, 0, 0]); // max frame size
    // sample rate (20 bits), channels - 1 (3), bits per sample - 1 (5), total samples (36)
    let packed: u64 = (44_100u64 << 44) | (1u64 << 41) | (15u64 << 36);
    data.extend_from_slice(&packed.to_be_bytes());
    data.extend_from_slice(&[0u8; 16]); // MD5
    if !streaminfo_last {
        // last block: PADDING, 64 bytes
        data.extend_from_slice(&[0x81, 0x00, 0x00, 0x40]);
        data.extend_from_slice(&[0u8; 64]);
    }
    data.extend_from_slice(&[0u8; 32]); // stand-in for audio frames
    data
}

/// Writes a FLAC stream with STREAMINFO followed by a PADDING block.
pub fn flac_fixture(dir: &Path, name: &str) -> PathBuf {
    write(dir, name, &flac_stream(false))
}

/// Writes a FLAC stream whose only metadata block is STREAMINFO.
pub fn flac_streaminfo_only_fixture(dir: &Path, name: &str) -> PathBuf {
    write(dir, name, &flac_stream(true))
}

fn mp4_atom(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut atom = ((8 + payload.len()) as u32).to_be_bytes().to_vec();
    atom.extend_from_slice(kind);
    atom.extend_from_slice(payload);
    atom
}

/// Writes an MP4 with `ftyp`, a `moov` holding only `mvhd`, and a small `mdat`.
pub fn mp4_fixture(dir: &Path, name: &str) -> PathBuf {
    let mut ftyp = b"M4A ".to_vec();
    ftyp.extend_from_slice(&0u32.to_be_bytes());
    ftyp.extend_from_slice(b"M4A mp42isom");

    let mut mvhd = vec![0u8; 100];
    mvhd[12..16].copy_from_slice(&1000u32.to_be_bytes()); // timescale
    mvhd[20..24].copy_from_slice(&0x0001_0000u32.to_be_bytes()); // rate 1.0
    mvhd[24..26].copy_from_slice(&0x0100u16.to_be_bytes()); // volume 1.0
    mvhd[36..40].copy_from_slice(&0x0001_0000u32.to_be_bytes()); // matrix a
    mvhd[52..56].copy_from_slice(&0x0001_0000u32.to_be_bytes()); // matrix d
    mvhd[68..72].copy_from_slice(&0x4000_0000u32.to_be_bytes()); // matrix w
    mvhd[96..100].copy_from_slice(&2u32.to_be_bytes()); // next track id

    let mut data = mp4_atom(b"ftyp", &ftyp);
    data.extend_from_slice(&mp4_atom(b"moov", &mp4_atom(b"mvhd", &mvhd)));
    data.extend_from_slice(&mp4_atom(b"mdat", &[0u8; 16]));
    write(dir, name, &data)
}

fn asf_file(dir: &Path, name: &str, extra: &[(Guid, Vec<u8>)]) -> PathBuf {
    let data_object_len = 50usize;
    let mut props = vec![0u8; 80];
    let header_len = 30
        + 24
        + props.len()
        + extra
            .iter()
            .map(|(_, payload)| 24 + payload.len())
            .sum::<usize>();
    props[16..24].copy_from_slice(&((header_len + data_object_len) as u64).to_le_bytes());

    let mut data = Guid::HEADER.0.to_vec();
    data.extend_from_slice(&(header_len as u64).to_le_bytes());
    data.extend_from_slice(&(1 + extra.len() as u32).to_le_bytes());
    data.extend_from_slice(&[0x01, 0x02]);
    object::write_object(&mut data, Guid::FILE_PROPERTIES, &props);
    for (guid, payload) in extra {
        object::write_object(&mut data, *guid, payload);
    }
    object::write_object(&mut data, Guid::DATA, &[0xAB; 26]);
    write(dir, name, &data)
}

/// Writes an ASF file: header with a File Properties object, then a Data object.
pub fn asf_fixture(dir: &Path, name: &str) -> PathBuf {
    asf_file(dir, name, &[])
}

/// One Metadata / Metadata Library description record.
fn metadata_record(name: &str, type_code: u16, value: &[u8]) -> Vec<u8> {
    let name = object::encode_utf16(name);
    let mut record = Vec::new();
    record.extend_from_slice(&0u16.to_le_bytes()); // language index / reserved
    record.extend_from_slice(&0u16.to_le_bytes()); // stream number
    record.extend_from_slice(&(name.len() as u16).to_le_bytes());
    record.extend_from_slice(&type_code.to_le_bytes());
    record.extend_from_slice(&(value.len() as u32).to_le_bytes());
    record.extend_from_slice(&name);
    record.extend_from_slice(value);
    record
}

/// Like [`asf_fixture`], plus a Header Extension Object whose Metadata
/// object stores `WM/SharedUserRating` = 25 (DWORD) and whose Metadata
/// Library object stores `WM/Year` = "1999".
pub fn asf_fixture_with_extension(dir: &Path, name: &str) -> PathBuf {
    let mut metadata = 1u16.to_le_bytes().to_vec();
    metadata.extend_from_slice(&metadata_record(
        "WM/SharedUserRating",
        3,
        &25u32.to_le_bytes(),
    ));
    let mut library = 1u16.to_le_bytes().to_vec();
    library.extend_from_slice(&metadata_record(
        "WM/Year",
        0,
        &object::encode_utf16("1999"),
    ));

    let mut children = Vec::new();
    object::write_object(&mut children, Guid::METADATA, &metadata);
    object::write_object(&mut children, Guid::METADATA_LIBRARY, &library);

    let mut extension = Guid::HEADER_EXTENSION_RESERVED.0.to_vec();
    extension.extend_from_slice(&6u16.to_le_bytes());
    extension.extend_from_slice(&(children.len() as u32).to_le_bytes());
    extension.extend_from_slice(&children);

    asf_file(dir, name, &[(Guid::HEADER_EXTENSION, extension)])
}

/// Writes the fixture matching `name`'s extension, or a plain text file.
pub fn fixture(dir: &Path, name: &str) -> PathBuf {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => mp3_fixture(dir, name),
        "flac" => flac_fixture(dir, name),
        "m4a" | "m4b" | "m4p" | "m4r" | "mp4" | "m4v" => mp4_fixture(dir, name),
        "wma" | "asf" => asf_fixture(dir, name),
        _ => write(dir, name, b"This is just some text, not music."),
    }
}

fn write(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(&path, data).expect("Failed to write fixture");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fixture_dispatches_on_extension() {
        let dir = tempdir().unwrap();
        let flac = fixture(dir.path(), "a.FLAC");
        assert!(fs::read(&flac).unwrap().starts_with(b"fLaC"));
        let text = fixture(dir.path(), "notes.txt");
        assert!(fs::read_to_string(&text).unwrap().contains("not music"));
    }

    #[test]
    fn test_mp3_fixture_frames() {
        let dir = tempdir().unwrap();
        let data = fs::read(mp3_fixture(dir.path(), "a.mp3")).unwrap();
        assert_eq!(data.len(), MPEG_FRAME_LEN * 10);
        assert_eq!(&data[MPEG_FRAME_LEN..MPEG_FRAME_LEN + 4], &MPEG_FRAME_HEADER);
    }

    #[test]
    fn test_asf_fixture_sizes_agree() {
        let dir = tempdir().unwrap();
        let data = fs::read(asf_fixture(dir.path(), "a.wma")).unwrap();
        let header_len = u64::from_le_bytes(data[16..24].try_into().unwrap()) as usize;
        assert_eq!(&data[header_len..header_len + 16], &Guid::DATA.0);
        assert_eq!(data.len(), header_len + 50);

        let data = fs::read(asf_fixture_with_extension(dir.path(), "b.wma")).unwrap();
        let header_len = u64::from_le_bytes(data[16..24].try_into().unwrap()) as usize;
        assert_eq!(u32::from_le_bytes(data[24..28].try_into().unwrap()), 2);
        assert_eq!(&data[header_len..header_len + 16], &Guid::DATA.0);
        assert_eq!(data.len(), header_len + 50);
    }

    #[test]
    fn test_flac_fixture_layouts() {
        let dir = tempdir().unwrap();
        let padded = fs::read(flac_fixture(dir.path(), "a.flac")).unwrap();
        assert_eq!(padded[4], 0x00);
        assert_eq!(padded[4 + 4 + 34], 0x81);
        let bare = fs::read(flac_streaminfo_only_fixture(dir.path(), "b.flac")).unwrap();
        assert_eq!(bare[4], 0x80);
    }
}
