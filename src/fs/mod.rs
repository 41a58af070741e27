//! # File Module
//!
//! Every source format is decoded into a sequence of `FileRecord`, and every target
//! format is encoded from one.  The record is the only thing the codecs share.
//! A record is built once, by a decoder or by the host reader, and is never
//! modified afterwards.  Changing the name produces a new record.
//!
//! The `adfs` submodule decodes the catalog of ADFS disc images.

pub mod adfs;

use std::fmt;
use crate::DYNERR;

/// The separator in Acorn paths, such as `$.GAMES.ELITE`, never part of a name
pub const PATH_SEP: char = '.';

/// Enumerates file record errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("file name is empty or contains a reserved character")]
    BadName
}

/// Access bits carried with a file.  The bit values follow the RISC OS
/// attribute word, which is also what the `.inf` access field holds.
#[derive(PartialEq,Eq,Clone,Copy,Default,Debug)]
pub struct Attributes(u8);

impl Attributes {
    pub const READ: u8 = 0x01;
    pub const WRITE: u8 = 0x02;
    pub const LOCKED: u8 = 0x08;
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }
    pub fn bits(&self) -> u8 {
        self.0
    }
    pub fn contains(&self,bit: u8) -> bool {
        self.0 & bit == bit
    }
    pub fn with(&self,bit: u8) -> Self {
        Self(self.0 | bit)
    }
    pub fn is_locked(&self) -> bool {
        self.contains(Self::LOCKED)
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        if self.contains(Self::LOCKED) { s += "L"; }
        if self.contains(Self::WRITE) { s += "W"; }
        if self.contains(Self::READ) { s += "R"; }
        write!(f,"{}",s)
    }
}

/// One logical file taken from, or destined for, a container.
/// The length is always the length of the data, there is no separate field to disagree with it.
#[derive(Clone,PartialEq,Debug)]
pub struct FileRecord {
    name: String,
    dir: Vec<String>,
    load_addr: u32,
    exec_addr: u32,
    attr: Attributes,
    next: Option<String>,
    data: Vec<u8>
}

/// A file that could not be produced or consumed.  Conversion carries on without it.
#[derive(Clone,PartialEq,Debug)]
pub struct Failure {
    pub name: String,
    pub reason: String
}

impl Failure {
    pub fn new(name: &str,reason: &str) -> Self {
        Self {
            name: name.to_string(),
            reason: reason.to_string()
        }
    }
}

/// Result of decoding one file from a source, failures keep the name for the report
pub type Extracted = Result<FileRecord,Failure>;

/// True if `name` can be the leaf name of a record
pub fn is_valid_name(name: &str) -> bool {
    name.len() > 0 && !name.contains(PATH_SEP) && !name.contains('\0')
}

impl FileRecord {
    /// Create a record in the root directory with no attributes.
    pub fn new(name: &str,load_addr: u32,exec_addr: u32,data: Vec<u8>) -> Result<Self,DYNERR> {
        if !is_valid_name(name) {
            log::error!("invalid file name `{}`",name);
            return Err(Box::new(Error::BadName));
        }
        Ok(Self {
            name: name.to_string(),
            dir: Vec::new(),
            load_addr,
            exec_addr,
            attr: Attributes::default(),
            next: None,
            data
        })
    }
    pub fn with_attributes(mut self,attr: Attributes) -> Self {
        self.attr = attr;
        self
    }
    /// Put the record in a directory given as path segments, `$` is implied.
    pub fn with_dir(mut self,dir: Vec<String>) -> Result<Self,DYNERR> {
        for seg in &dir {
            if !is_valid_name(seg) {
                log::error!("invalid directory name `{}`",seg);
                return Err(Box::new(Error::BadName));
            }
        }
        self.dir = dir;
        Ok(self)
    }
    /// Name of the file that follows this one on a tape
    pub fn with_next(mut self,next: Option<String>) -> Self {
        self.next = next;
        self
    }
    /// Copy of this record with a new leaf name
    pub fn renamed(&self,name: &str) -> Result<Self,DYNERR> {
        if !is_valid_name(name) {
            return Err(Box::new(Error::BadName));
        }
        let mut ans = self.clone();
        ans.name = name.to_string();
        Ok(ans)
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn dir(&self) -> &[String] {
        &self.dir
    }
    pub fn load_addr(&self) -> u32 {
        self.load_addr
    }
    pub fn exec_addr(&self) -> u32 {
        self.exec_addr
    }
    pub fn attributes(&self) -> Attributes {
        self.attr
    }
    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }
    pub fn data(&self) -> &[u8] {
        &self.data
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    /// Full Acorn path, e.g. `$.GAMES.ELITE`
    pub fn path(&self) -> String {
        let mut ans = "$".to_string();
        for seg in &self.dir {
            ans.push(PATH_SEP);
            ans += seg;
        }
        ans.push(PATH_SEP);
        ans += &self.name;
        ans
    }
}

impl fmt::Display for FileRecord {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,"{:<20} {:08X} {:08X} {:08X} {}",self.path(),self.load_addr,self.exec_addr,self.len(),self.attr)
    }
}
