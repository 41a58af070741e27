//! ### ADFS on-disc structures
//!
//! Fixed layouts are declared with `binrw`.  Variable parts, such as the directory tail
//! whose position depends on the directory size, are handled in `directory`.

use binrw::{BinRead,BinWrite};
use binrw::io::Cursor;
use crate::fs::Attributes;
use crate::DYNERR;

pub const ENTRY_SIZE: usize = 26;
pub const DISC_RECORD_SIZE: usize = 60;
pub const NAME_LEN: usize = 10;

/// attribute bits in the final byte of a new-format directory entry
pub const NEW_READ: u8 = 0x01;
pub const NEW_WRITE: u8 = 0x02;
pub const NEW_LOCKED: u8 = 0x04;
pub const NEW_DIR: u8 = 0x08;

/// characters whose top bit carries an attribute in an old-format directory entry
pub const OLD_READ_CHAR: usize = 0;
pub const OLD_WRITE_CHAR: usize = 1;
pub const OLD_LOCKED_CHAR: usize = 2;
pub const OLD_DIR_CHAR: usize = 3;

fn u24_from(x: [u8;3]) -> u32 {
    u32::from_le_bytes([x[0],x[1],x[2],0])
}

fn u24_to(x: &u32) -> [u8;3] {
    let b = u32::to_le_bytes(*x);
    [b[0],b[1],b[2]]
}

/// A directory entry as stored
#[derive(BinRead,BinWrite,Debug,Clone,PartialEq)]
#[brw(little)]
pub struct RawEntry {
    pub name: [u8;NAME_LEN],
    pub load_addr: u32,
    pub exec_addr: u32,
    pub length: u32,
    #[br(map = u24_from)]
    #[bw(map = u24_to)]
    pub start: u32,
    /// sequence number in old directories, attributes in new ones
    pub last: u8
}

/// The disc record, found in zone 0 of a new map and in the boot block
#[derive(BinRead,BinWrite,Debug,Clone,Default,PartialEq)]
#[brw(little)]
pub struct DiscRecord {
    pub log2secsize: u8,
    pub secspertrack: u8,
    pub heads: u8,
    pub density: u8,
    pub idlen: u8,
    pub log2bpmb: u8,
    pub skew: u8,
    pub bootoption: u8,
    pub lowsector: u8,
    pub nzones: u8,
    pub zone_spare: u16,
    pub root: u32,
    pub disc_size: u32,
    pub disc_id: u16,
    pub disc_name: [u8;NAME_LEN],
    pub disc_type: u32,
    pub disc_size_high: u32,
    pub log2sharesize: u8,
    pub big_flag: u8,
    pub nzones_high: u8,
    pub reserved: u8,
    pub format_version: u32,
    pub root_size: u32,
    pub unused: [u8;8]
}

/// Decode a stored name.  Top bits are stripped, and the name ends at the first
/// control character or space.
pub fn decode_name(raw: &[u8]) -> String {
    let mut ans = String::new();
    for b in raw {
        let c = b & 0x7f;
        if c <= 32 {
            break;
        }
        ans.push(c as char);
    }
    ans
}

/// Decode a stored title, which may contain spaces
pub fn decode_title(raw: &[u8]) -> String {
    let mut ans = String::new();
    for b in raw {
        let c = b & 0x7f;
        if c < 32 {
            break;
        }
        ans.push(c as char);
    }
    ans.trim_end().to_string()
}

impl RawEntry {
    pub fn from_bytes(dat: &[u8]) -> Result<Self,DYNERR> {
        Ok(Self::read(&mut Cursor::new(dat))?)
    }
    pub fn to_bytes(&self) -> Result<Vec<u8>,DYNERR> {
        let mut curs = Cursor::new(Vec::new());
        self.write(&mut curs)?;
        Ok(curs.into_inner())
    }
    fn top_bit(&self,idx: usize) -> bool {
        self.name[idx] & 0x80 > 0
    }
    /// Attributes and directory flag, `new_format` selects where they are stored
    pub fn attributes(&self,new_format: bool) -> (Attributes,bool) {
        let (r,w,l,d) = match new_format {
            true => (self.last & NEW_READ > 0,self.last & NEW_WRITE > 0,self.last & NEW_LOCKED > 0,self.last & NEW_DIR > 0),
            false => (self.top_bit(OLD_READ_CHAR),self.top_bit(OLD_WRITE_CHAR),self.top_bit(OLD_LOCKED_CHAR),self.top_bit(OLD_DIR_CHAR))
        };
        let mut attr = Attributes::default();
        if r { attr = attr.with(Attributes::READ); }
        if w { attr = attr.with(Attributes::WRITE); }
        if l { attr = attr.with(Attributes::LOCKED); }
        (attr,d)
    }
}

impl DiscRecord {
    pub fn from_bytes(dat: &[u8]) -> Result<Self,DYNERR> {
        Ok(Self::read(&mut Cursor::new(dat))?)
    }
    pub fn to_bytes(&self) -> Result<Vec<u8>,DYNERR> {
        let mut curs = Cursor::new(Vec::new());
        self.write(&mut curs)?;
        Ok(curs.into_inner())
    }
    pub fn name(&self) -> String {
        decode_title(&self.disc_name)
    }
}
