//! ### ADFS directories
//!
//! A directory starts with a sequence byte and a four character marker, then up to
//! 47 (old format) or 77 (new format) entries of 26 bytes, ended early by a zero byte.
//! The tail holds the directory name, its parent, its title, and repeats the sequence
//! byte and marker.  A directory that was being rewritten when the disc was ejected
//! shows different sequence bytes at head and tail.

use log::{debug,error};
use super::types::{RawEntry,ENTRY_SIZE,NAME_LEN,decode_name,decode_title};
use super::Error;
use crate::fs::Attributes;
use crate::DYNERR;

const MARKERS: [&[u8;4];2] = [b"Hugo",b"Nick"];
const TITLE_LEN: usize = 19;

#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum DirFormat {
    /// 1280 bytes, used with 256 byte sectors, attributes in the name
    Old,
    /// 2048 bytes, used with 1024 byte sectors, attributes in the last byte of the entry
    New
}

impl DirFormat {
    pub fn size(&self) -> usize {
        match self {
            Self::Old => 0x500,
            Self::New => 0x800
        }
    }
    pub fn max_entries(&self) -> usize {
        match self {
            Self::Old => 47,
            Self::New => 77
        }
    }
    /// offsets of the name, parent, and title in the tail
    fn tail(&self) -> (usize,usize,usize) {
        match self {
            Self::Old => (0x4cc,0x4d6,0x4d9),
            Self::New => (0x7f0,0x7da,0x7dd)
        }
    }
    fn end_seq(&self) -> usize {
        self.size() - 6
    }
}

/// One entry of a directory, file or subdirectory
#[derive(Clone,Debug,PartialEq)]
pub struct Entry {
    pub name: String,
    pub load_addr: u32,
    pub exec_addr: u32,
    pub length: u32,
    /// start sector in 256 byte units, or indirect address with a new map
    pub start: u32,
    pub attr: Attributes,
    pub is_dir: bool
}

#[derive(Clone,Debug,PartialEq)]
pub struct Directory {
    pub name: String,
    pub title: String,
    pub parent: u32,
    pub seq: u8,
    pub entries: Vec<Entry>
}

impl Directory {
    pub fn parse(buf: &[u8],fmt: DirFormat) -> Result<Self,DYNERR> {
        if buf.len() < fmt.size() {
            return Err(Box::new(Error::CorruptCatalog));
        }
        let seq = buf[0];
        let marker = &buf[1..5];
        if !MARKERS.iter().any(|m| &m[..]==marker) {
            error!("directory marker missing");
            return Err(Box::new(Error::CorruptCatalog));
        }
        let tail_marker = &buf[fmt.end_seq()+1..fmt.end_seq()+5];
        if tail_marker != marker || buf[fmt.end_seq()] != seq {
            error!("directory head and tail do not match, the directory is broken");
            return Err(Box::new(Error::CorruptCatalog));
        }
        let mut entries: Vec<Entry> = Vec::new();
        for i in 0..fmt.max_entries() {
            let off = 5 + i*ENTRY_SIZE;
            if buf[off]==0 {
                break;
            }
            let raw = RawEntry::from_bytes(&buf[off..off+ENTRY_SIZE])?;
            let (attr,is_dir) = raw.attributes(fmt==DirFormat::New);
            let name = decode_name(&raw.name);
            if entries.iter().any(|e| e.name.eq_ignore_ascii_case(&name)) {
                error!("name {} appears twice in one directory",name);
                return Err(Box::new(Error::CorruptCatalog));
            }
            debug!("entry {} {:08X} {:08X} {:08X} {:06X}",name,raw.load_addr,raw.exec_addr,raw.length,raw.start);
            entries.push(Entry {
                name,
                load_addr: raw.load_addr,
                exec_addr: raw.exec_addr,
                length: raw.length,
                start: raw.start,
                attr,
                is_dir
            });
        }
        let (name_off,parent_off,title_off) = fmt.tail();
        Ok(Self {
            name: decode_name(&buf[name_off..name_off+NAME_LEN]),
            title: decode_title(&buf[title_off..title_off+TITLE_LEN]),
            parent: u32::from_le_bytes([buf[parent_off],buf[parent_off+1],buf[parent_off+2],0]),
            seq,
            entries
        })
    }
}

/// Build the bytes of an empty directory, for tests and fixtures
pub fn blank(fmt: DirFormat,name: &str,title: &str,parent: u32) -> Vec<u8> {
    let mut buf = vec![0;fmt.size()];
    buf[1..5].copy_from_slice(MARKERS[0]);
    let end = fmt.end_seq();
    buf[end+1..end+5].copy_from_slice(MARKERS[0]);
    let (name_off,parent_off,title_off) = fmt.tail();
    for (i,c) in name.bytes().take(NAME_LEN).enumerate() {
        buf[name_off+i] = c;
    }
    if name.len() < NAME_LEN {
        buf[name_off+name.len()] = 0x0d;
    }
    buf[parent_off..parent_off+3].copy_from_slice(&u32::to_le_bytes(parent)[0..3]);
    for (i,c) in title.bytes().take(TITLE_LEN).enumerate() {
        buf[title_off+i] = c;
    }
    if title.len() < TITLE_LEN {
        buf[title_off+title.len()] = 0x0d;
    }
    buf
}
