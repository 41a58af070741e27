//! # UEF Container
//!
//! The Unified Emulator Format stores a cassette (or, less often, a disc) as a sequence of chunks.
//! The file starts with `UEF File!` and a NUL, then the minor and major version bytes.
//! Chunks follow until the end of the file.  A UEF may be compressed as a whole with gzip,
//! in which case the gzip header takes the place of the signature.
//!
//! * `chunk` decodes individual chunks
//! * `files` converts between tape data chunks and `FileRecord`s
//! * `edit` transforms chunk sequences without going through `FileRecord`s

pub mod chunk;
pub mod files;
pub mod edit;

use std::fmt;
use std::io::{Read,Write};
use std::str::FromStr;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug,info,warn};
use chunk::Chunk;
use crate::DYNERR;

pub const MAGIC: &[u8;10] = b"UEF File!\0";
pub const GZIP_MAGIC: [u8;2] = [0x1f,0x8b];
const HEADER_LEN: usize = 12;

/// Enumerates UEF errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("UEF container is corrupt")]
    CorruptContainer,
    #[error("UEF version is outside the known range")]
    UnsupportedVersion,
    #[error("not a UEF file")]
    NotUef
}

#[derive(Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Debug)]
pub struct Version {
    pub major: u8,
    pub minor: u8
}

pub const OLDEST_VERSION: Version = Version { major: 0, minor: 1 };
pub const NEWEST_VERSION: Version = Version { major: 0, minor: 10 };
/// from this version on, explicit data chunks begin with the count of unused bits
pub const EXPLICIT_PAD_VERSION: Version = Version { major: 0, minor: 9 };

impl Version {
    pub fn new(major: u8,minor: u8) -> Self {
        Self { major, minor }
    }
    pub fn is_known(&self) -> bool {
        *self >= OLDEST_VERSION && *self <= NEWEST_VERSION
    }
}

impl fmt::Display for Version {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,"{}.{}",self.major,self.minor)
    }
}

impl FromStr for Version {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        let mut it = s.split('.');
        match (it.next().and_then(|x| u8::from_str(x).ok()),it.next().and_then(|x| u8::from_str(x).ok()),it.next()) {
            (Some(major),Some(minor),None) => Ok(Self { major, minor }),
            _ => Err(Error::UnsupportedVersion)
        }
    }
}

/// Options used when writing a UEF
#[derive(Clone,Debug)]
pub struct WriteOptions {
    pub version: Version,
    pub compress: bool,
    pub origin: String,
    pub target_machine: u8
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: NEWEST_VERSION,
            compress: false,
            origin: format!("tape2disc {}",env!("CARGO_PKG_VERSION")),
            target_machine: 1
        }
    }
}

/// Options used when extracting files from a UEF
#[derive(Clone,Debug)]
pub struct ReadOptions {
    /// CRC errors make the file fail rather than produce a warning
    pub verify_crc: bool,
    /// unnamed files are called `<stem>1`, `<stem>2`, ...
    pub noname_stem: String
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            verify_crc: false,
            noname_stem: "noname".to_string()
        }
    }
}

/// A decoded UEF container
#[derive(Clone,PartialEq,Debug)]
pub struct Uef {
    pub version: Version,
    /// whether the container was, or will be, wrapped in gzip
    pub compressed: bool,
    pub chunks: Vec<Chunk>
}

impl Uef {
    pub fn new(version: Version,compressed: bool,chunks: Vec<Chunk>) -> Self {
        Self { version, compressed, chunks }
    }
    /// Quick test based on the first bytes, compressed or not
    pub fn test(dat: &[u8]) -> bool {
        dat.starts_with(MAGIC) || dat.starts_with(&GZIP_MAGIC)
    }
    /// Decode the container.  Framing errors are fatal, a version outside the
    /// known range only produces a warning.
    pub fn from_bytes(dat: &[u8]) -> Result<Self,DYNERR> {
        let (buf,compressed) = match dat {
            d if d.starts_with(MAGIC) => (d.to_vec(),false),
            d if d.starts_with(&GZIP_MAGIC) => {
                let mut ans = Vec::new();
                let mut decoder = GzDecoder::new(d);
                if let Err(e) = decoder.read_to_end(&mut ans) {
                    warn!("gzip envelope: {}",e);
                    return Err(Box::new(Error::CorruptContainer));
                }
                if !ans.starts_with(MAGIC) {
                    return Err(Box::new(Error::NotUef));
                }
                (ans,true)
            },
            _ => return Err(Box::new(Error::NotUef))
        };
        if buf.len() < HEADER_LEN {
            return Err(Box::new(Error::CorruptContainer));
        }
        let version = Version::new(buf[11],buf[10]);
        match version.is_known() {
            true => info!("UEF version {}",version),
            false => warn!("{}: {}, proceeding",Error::UnsupportedVersion,version)
        }
        let mut chunks = Vec::new();
        let mut ptr = HEADER_LEN;
        while ptr < buf.len() {
            if ptr + chunk::HEADER_LEN > buf.len() {
                warn!("partial chunk header at offset {}",ptr);
                return Err(Box::new(Error::CorruptContainer));
            }
            let id = u16::from_le_bytes([buf[ptr],buf[ptr+1]]);
            let size = u32::from_le_bytes([buf[ptr+2],buf[ptr+3],buf[ptr+4],buf[ptr+5]]) as usize;
            let beg = ptr + chunk::HEADER_LEN;
            let end = match beg.checked_add(size) {
                Some(e) if e <= buf.len() => e,
                _ => {
                    warn!("chunk {:04X} at offset {} needs {} bytes, {} remain",id,ptr,size,buf.len()-beg);
                    return Err(Box::new(Error::CorruptContainer));
                }
            };
            let chunk = Chunk::from_raw(id,buf[beg..end].to_vec());
            debug!("{} at offset {}",chunk,ptr);
            chunks.push(chunk);
            ptr = end;
        }
        Ok(Self { version, compressed, chunks })
    }
    /// Encode the container, lengths always come from the payloads
    pub fn to_bytes(&self) -> Result<Vec<u8>,DYNERR> {
        let mut ans = MAGIC.to_vec();
        ans.push(self.version.minor);
        ans.push(self.version.major);
        for chunk in &self.chunks {
            ans.append(&mut chunk.to_bytes());
        }
        if self.compressed {
            let mut encoder = GzEncoder::new(Vec::new(),Compression::default());
            encoder.write_all(&ans)?;
            return Ok(encoder.finish()?);
        }
        Ok(ans)
    }
    /// Text of the first origin chunk, if any
    pub fn origin(&self) -> Option<String> {
        self.chunks.iter().find_map(|c| c.origin_text())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> Uef {
        Uef::new(NEWEST_VERSION,false,vec![
            Chunk::origin("test"),
            Chunk::TargetMachine(1),
            Chunk::CarrierTone(0x05dc),
            Chunk::Opaque { id: 0x7e00, payload: vec![1,2,3] }
        ])
    }

    #[test]
    fn header_and_chunks() {
        let bytes = sample().to_bytes().expect("encode failed");
        assert_eq!(&bytes[0..10],MAGIC);
        assert_eq!(bytes[10],10);
        assert_eq!(bytes[11],0);
        let uef = Uef::from_bytes(&bytes).expect("decode failed");
        assert_eq!(uef,sample());
        assert_eq!(uef.origin(),Some("test".to_string()));
    }

    #[test]
    fn gzip_envelope() {
        let mut uef = sample();
        uef.compressed = true;
        let bytes = uef.to_bytes().expect("encode failed");
        assert_eq!(bytes[0..2],GZIP_MAGIC);
        let back = Uef::from_bytes(&bytes).expect("decode failed");
        assert!(back.compressed);
        assert_eq!(back.chunks,sample().chunks);
    }

    #[test]
    fn truncated_chunk() {
        let mut bytes = sample().to_bytes().expect("encode failed");
        bytes.pop();
        let err = Uef::from_bytes(&bytes).expect_err("should fail");
        assert!(matches!(err.downcast_ref::<Error>(),Some(Error::CorruptContainer)));
        let err = Uef::from_bytes(b"PK\x03\x04").expect_err("should fail");
        assert!(matches!(err.downcast_ref::<Error>(),Some(Error::NotUef)));
    }

    #[test]
    fn future_version() {
        let mut uef = sample();
        uef.version = Version::new(1,2);
        let bytes = uef.to_bytes().expect("encode failed");
        assert_eq!(Uef::from_bytes(&bytes).expect("decode failed").version,Version::new(1,2));
        assert_eq!(Version::from_str("0.10").expect("bad version"),NEWEST_VERSION);
        assert!(Version::from_str("ten").is_err());
    }
}
