//! # Sidecar Module
//!
//! A file kept on the host carries its Acorn metadata in a companion text file with
//! the same name plus `.inf`.  The single line holds the name, load address, execution
//! address, length, and optionally the access byte and the name of the next file on tape.
//! There are many dialects in the wild, so the parser is lenient, the writer is not.

use regex::Regex;
use crate::fs::{FileRecord,Attributes};
use crate::DYNERR;

pub const SUFFIX: &str = "inf";

/// Enumerates sidecar errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("sidecar record is missing fields")]
    BadRecord,
    #[error("sidecar field is not hex")]
    BadHex
}

/// Metadata parsed from a sidecar
#[derive(Clone,Debug,PartialEq,Default)]
pub struct InfRecord {
    /// name as written, without any `$.` prefix
    pub name: Option<String>,
    pub load_addr: u32,
    pub exec_addr: u32,
    pub length: Option<u32>,
    pub attr: Attributes,
    pub next: Option<String>
}

fn strip_root(name: &str) -> String {
    match name.strip_prefix("$.") {
        Some(s) => s.to_string(),
        None => name.to_string()
    }
}

fn hex(tok: &str) -> Result<u32,DYNERR> {
    match u32::from_str_radix(tok,16) {
        Ok(v) => Ok(v),
        Err(_) => Err(Box::new(Error::BadHex))
    }
}

/// Format the sidecar line for `rec`, without a line ending
pub fn format(rec: &FileRecord) -> String {
    let mut ans = format!("{}\t{:X}\t{:X}\t{:X}",rec.path(),rec.load_addr(),rec.exec_addr(),rec.len());
    if rec.attributes().bits() != 0 {
        ans += &format!("\t{:02X}",rec.attributes().bits());
    }
    if let Some(next) = rec.next() {
        ans += &format!("\tNEXT $.{}",next);
    }
    ans
}

/// Parse the first line of a sidecar
pub fn parse(txt: &str) -> Result<InfRecord,DYNERR> {
    let hex_patt = Regex::new(r"^[0-9A-Fa-f]{1,8}$").expect("unreachable");
    let line = txt.lines().next().unwrap_or("");
    let toks: Vec<&str> = line.split_whitespace().collect();
    let mut ans = InfRecord::default();
    let mut idx = 0;
    let leading_hex = toks.iter().take_while(|t| hex_patt.is_match(t)).count();
    if let Some(first) = toks.first() {
        // load, exec, length and access make at most 3 more hex fields
        if !hex_patt.is_match(first) || first.contains('.') || leading_hex >= 4 {
            ans.name = Some(strip_root(first));
            idx = 1;
        }
    }
    if toks.len() < idx + 2 {
        return Err(Box::new(Error::BadRecord));
    }
    ans.load_addr = hex(toks[idx])?;
    ans.exec_addr = hex(toks[idx+1])?;
    idx += 2;
    if idx < toks.len() && hex_patt.is_match(toks[idx]) {
        ans.length = Some(hex(toks[idx])?);
        idx += 1;
    }
    while idx < toks.len() {
        let tok = toks[idx];
        match tok.to_uppercase().as_str() {
            "L" | "LOCKED" => ans.attr = ans.attr.with(Attributes::LOCKED),
            "NEXT" => {
                idx += 1;
                ans.next = toks.get(idx).map(|s| strip_root(s));
            },
            _ if tok.contains('=') => {},
            _ if hex_patt.is_match(tok) => {
                let bits = u8::try_from(hex(tok)?).map_err(|_| Error::BadHex)?;
                ans.attr = Attributes::from_bits(ans.attr.bits() | bits);
            },
            _ => return Err(Box::new(Error::BadHex))
        }
        idx += 1;
    }
    Ok(ans)
}
