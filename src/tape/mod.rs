//! # Acorn Tape Blocks
//!
//! Files saved by the Acorn MOS cassette filing system are split into blocks of up to
//! 256 bytes.  Each block repeats the file name and addresses, so that a loader can
//! pick up in the middle of a file.  The same block structure appears inside UEF
//! tape data chunks and, obscured, in Slogger T2 files.
//!
//! Block layout, all numbers little endian except the CRCs:
//! * sync byte `0x2A`
//! * name, 1 to 10 bytes, terminated by NUL
//! * load address (4), execution address (4)
//! * block number (2), data length (2), flag (1), next file address (4)
//! * header CRC (2, high byte first), covering name through next file address
//! * data, followed by the data CRC (2, high byte first) if there is any data
//!
//! The `Assembler` turns a stream of blocks into `FileRecord`s, the function `encode_file`
//! goes the other way.

pub mod t2;

use std::collections::HashSet;
use binrw::{BinRead,BinWrite,NullString};
use binrw::io::Cursor;
use log::{debug,info,warn,error};
use crate::fs::{FileRecord,Attributes,Failure,Extracted};
use crate::crc::crc16;
use crate::DYNERR;

pub const SYNC: u8 = 0x2a;
pub const MAX_NAME: usize = 10;
pub const BLOCK_SIZE: usize = 256;
/// flag bit set on the final block of a file
pub const LAST_BLOCK: u8 = 0x80;
/// flag bit set on a block with no data
pub const EMPTY_BLOCK: u8 = 0x40;
/// flag bit set when the file is locked
pub const LOCKED_BLOCK: u8 = 0x01;

/// Enumerates tape block errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("tape block is malformed")]
    BadBlock,
    #[error("name is too long for a tape file")]
    NameTooLong,
    #[error("name cannot be stored on tape")]
    BadName
}

#[derive(BinRead,BinWrite,Debug,Clone)]
#[brw(little, magic = 0x2au8)]
struct Header {
    name: NullString,
    load_addr: u32,
    exec_addr: u32,
    num: u16,
    len: u16,
    flag: u8,
    next_addr: u32
}

/// One tape block, decoded.  The name is kept as raw bytes.
#[derive(Clone,Debug)]
pub struct Block {
    pub name: Vec<u8>,
    pub load_addr: u32,
    pub exec_addr: u32,
    pub num: u16,
    pub flag: u8,
    pub next_addr: u32,
    pub data: Vec<u8>,
    /// false if either CRC did not match, or the data was cut short
    pub crc_ok: bool
}

/// Acorn names are stored as bytes, we take each byte as a Latin-1 character.
/// A `.` on tape is not a path separator, it is swapped with `/` as RISC OS does.
pub fn name_from_tape(raw: &[u8]) -> String {
    raw.iter().map(|b| match *b {
        b'.' => '/',
        x => x as char
    }).collect()
}

/// Inverse of `name_from_tape`, fails if a character is outside Latin-1 or is NUL
pub fn name_to_tape(name: &str) -> Result<Vec<u8>,DYNERR> {
    let mut ans = Vec::new();
    for c in name.chars() {
        match c {
            '/' => ans.push(b'.'),
            '\0' => return Err(Box::new(Error::BadName)),
            c if (c as u32) < 256 => ans.push(c as u32 as u8),
            _ => return Err(Box::new(Error::BadName))
        }
    }
    Ok(ans)
}

impl Block {
    pub fn is_last(&self) -> bool {
        self.flag & LAST_BLOCK > 0
    }
    pub fn is_locked(&self) -> bool {
        self.flag & LOCKED_BLOCK > 0
    }
    /// Decode the first block found in `buf`.  Bytes ahead of the sync byte are skipped.
    /// Returns the block and the number of bytes consumed.
    /// A header that cannot be read is an error, data that is cut short is not,
    /// it is returned as far as it goes with `crc_ok` false.
    pub fn parse(buf: &[u8]) -> Result<(Self,usize),DYNERR> {
        let start = match buf.iter().position(|b| *b==SYNC) {
            Some(p) => p,
            None => {
                debug!("no sync byte in {} bytes",buf.len());
                return Err(Box::new(Error::BadBlock));
            }
        };
        let mut curs = Cursor::new(&buf[start..]);
        let hdr = match Header::read(&mut curs) {
            Ok(h) => h,
            Err(e) => {
                debug!("tape header: {}",e);
                return Err(Box::new(Error::BadBlock));
            }
        };
        if hdr.name.0.len() > MAX_NAME {
            debug!("tape name runs to {} bytes",hdr.name.0.len());
            return Err(Box::new(Error::BadBlock));
        }
        let hdr_end = start + curs.position() as usize;
        if buf.len() < hdr_end + 2 {
            return Err(Box::new(Error::BadBlock));
        }
        let mut crc_ok = true;
        let stored = u16::from_be_bytes([buf[hdr_end],buf[hdr_end+1]]);
        if stored != crc16(&buf[start+1..hdr_end]) {
            debug!("header CRC mismatch in block {}",hdr.num);
            crc_ok = false;
        }
        let beg = hdr_end + 2;
        let len = hdr.len as usize;
        let mut end = beg + len;
        let data = match buf.len() {
            l if l >= end + 2 || len==0 => buf[beg..end].to_vec(),
            l => {
                debug!("block {} cut short",hdr.num);
                crc_ok = false;
                end = l;
                buf[usize::min(beg,l)..l].to_vec()
            }
        };
        if len > 0 && end + 2 <= buf.len() {
            let stored = u16::from_be_bytes([buf[end],buf[end+1]]);
            if stored != crc16(&data) {
                debug!("data CRC mismatch in block {}",hdr.num);
                crc_ok = false;
            }
            end += 2;
        }
        Ok((Self {
            name: hdr.name.0,
            load_addr: hdr.load_addr,
            exec_addr: hdr.exec_addr,
            num: hdr.num,
            flag: hdr.flag,
            next_addr: hdr.next_addr,
            data,
            crc_ok
        },end))
    }
    /// Encode the block with fresh CRCs.
    pub fn to_bytes(&self) -> Result<Vec<u8>,DYNERR> {
        let hdr = Header {
            name: NullString(self.name.clone()),
            load_addr: self.load_addr,
            exec_addr: self.exec_addr,
            num: self.num,
            len: self.data.len() as u16,
            flag: self.flag,
            next_addr: self.next_addr
        };
        let mut curs = Cursor::new(Vec::new());
        hdr.write(&mut curs)?;
        let mut ans = curs.into_inner();
        let crc = crc16(&ans[1..]);
        ans.extend_from_slice(&u16::to_be_bytes(crc));
        if self.data.len() > 0 {
            ans.extend_from_slice(&self.data);
            ans.extend_from_slice(&u16::to_be_bytes(crc16(&self.data)));
        }
        Ok(ans)
    }
}

/// Split a record into tape blocks.  Names that do not fit on tape are an error.
pub fn encode_file(rec: &FileRecord) -> Result<Vec<Block>,DYNERR> {
    let name = name_to_tape(rec.name())?;
    if name.len() > MAX_NAME {
        error!("{} is longer than {} characters",rec.name(),MAX_NAME);
        return Err(Box::new(Error::NameTooLong));
    }
    let lock = match rec.attributes().is_locked() {
        true => LOCKED_BLOCK,
        false => 0
    };
    let mut ans = Vec::new();
    let blank = Block {
        name,
        load_addr: rec.load_addr(),
        exec_addr: rec.exec_addr(),
        num: 0,
        flag: lock,
        next_addr: 0,
        data: Vec::new(),
        crc_ok: true
    };
    if rec.len()==0 {
        let mut blk = blank;
        blk.flag |= LAST_BLOCK | EMPTY_BLOCK;
        ans.push(blk);
        return Ok(ans);
    }
    let count = (rec.len() + BLOCK_SIZE - 1) / BLOCK_SIZE;
    if count > u16::MAX as usize + 1 {
        return Err(Box::new(Error::BadBlock));
    }
    for (i,chunk) in rec.data().chunks(BLOCK_SIZE).enumerate() {
        let mut blk = blank.clone();
        blk.num = i as u16;
        blk.data = chunk.to_vec();
        if i+1 == count {
            blk.flag |= LAST_BLOCK;
        }
        ans.push(blk);
    }
    Ok(ans)
}

struct Pending {
    name: String,
    load_addr: u32,
    exec_addr: u32,
    locked: bool,
    data: Vec<u8>,
    next_num: u32,
    ended: bool,
    crc_ok: bool
}

/// Builds file records out of a sequence of blocks.
/// A new file starts at block 0, at the first block, or after a block flagged last.
/// Repeated names get a `-<n>` suffix, and unnamed files are called `<stem><n>`,
/// both using the same counter.
pub struct Assembler {
    stem: String,
    verify_crc: bool,
    created: HashSet<String>,
    counter: usize,
    curr: Option<Pending>,
    out: Vec<Extracted>
}

impl Assembler {
    pub fn new(stem: &str,verify_crc: bool) -> Self {
        Self {
            stem: stem.to_string(),
            verify_crc,
            created: HashSet::new(),
            counter: 1,
            curr: None,
            out: Vec::new()
        }
    }
    fn unique_name(&mut self,raw: &[u8]) -> String {
        let mut name = name_from_tape(raw);
        if self.created.contains(&name) {
            warn!("duplicate file name {}, renaming",name);
            name = format!("{}-{}",name,self.counter);
            self.counter += 1;
        }
        if name.len()==0 {
            name = format!("{}{}",self.stem,self.counter);
            self.counter += 1;
        }
        self.created.insert(name.clone());
        name
    }
    fn finalize(&mut self,next: Option<String>) {
        if let Some(p) = self.curr.take() {
            if !p.crc_ok {
                match self.verify_crc {
                    true => {
                        error!("{}: CRC error",p.name);
                        self.out.push(Err(Failure::new(&p.name,"tape block CRC error")));
                        return;
                    },
                    false => warn!("{}: CRC error, keeping data",p.name)
                }
            }
            let attr = match p.locked {
                true => Attributes::default().with(Attributes::LOCKED),
                false => Attributes::default()
            };
            info!("tape file {} {:X} {:X} {:X}",p.name,p.load_addr,p.exec_addr,p.data.len());
            let item = match FileRecord::new(&p.name,p.load_addr,p.exec_addr,p.data) {
                Ok(rec) => Ok(rec.with_attributes(attr).with_next(next)),
                Err(e) => Err(Failure::new(&p.name,&e.to_string()))
            };
            self.out.push(item);
        }
    }
    /// Add the next block from the tape
    pub fn push(&mut self,blk: Block) {
        let starts_file = match &self.curr {
            None => true,
            Some(p) => blk.num==0 || p.ended
        };
        if starts_file {
            if blk.num != 0 {
                warn!("file starts at block {}",blk.num);
            }
            let name = self.unique_name(&blk.name);
            self.finalize(Some(name.clone()));
            debug!("new tape file {}",name);
            self.curr = Some(Pending {
                name,
                load_addr: blk.load_addr,
                exec_addr: blk.exec_addr,
                locked: false,
                data: Vec::new(),
                next_num: blk.num as u32,
                ended: false,
                crc_ok: true
            });
        }
        if let Some(p) = self.curr.as_mut() {
            if blk.num as u32 != p.next_num {
                warn!("{}: expected block {}, got {}",p.name,p.next_num,blk.num);
            }
            p.next_num = blk.num as u32 + 1;
            p.locked |= blk.is_locked();
            p.ended = blk.is_last();
            p.crc_ok &= blk.crc_ok;
            p.data.extend_from_slice(&blk.data);
        }
    }
    /// Close the last file and return everything assembled, in tape order
    pub fn finish(mut self) -> Vec<Extracted> {
        self.finalize(None);
        self.out
    }
}
