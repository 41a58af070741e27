//! ### Chunk transformations
//!
//! Each function takes a chunk sequence and returns a new one.  Chunks that are
//! not the subject of the edit are cloned as they are, so re-encoding reproduces
//! their bytes exactly.

use log::{debug,info};
use super::chunk::{Chunk,ChunkId};
use super::files::DEFAULT_BAUD;
use super::{Version,EXPLICIT_PAD_VERSION};
use crate::DYNERR;

/// Baud rate in force after the last chunk
fn final_baud(chunks: &[Chunk]) -> u16 {
    chunks.iter().fold(DEFAULT_BAUD,|acc,c| match c {
        Chunk::BaudRate(b) => *b,
        _ => acc
    })
}

/// True if a baud rate chunk appears before the first data chunk
fn declares_baud(chunks: &[Chunk]) -> bool {
    for c in chunks {
        match c {
            Chunk::BaudRate(_) => return true,
            c if c.is_data() => return false,
            _ => {}
        }
    }
    false
}

/// Append tape `b` to tape `a`.  A gap is put at the join, and if `a` leaves the baud rate
/// somewhere `b` does not expect, the rate is set back.  Origin and target chunks of `b`
/// that `a` already has are dropped.
pub fn merge(a: &[Chunk],b: &[Chunk]) -> Vec<Chunk> {
    let mut ans = a.to_vec();
    ans.push(Chunk::IntegerGap(0x0258));
    let baud = final_baud(a);
    if baud != DEFAULT_BAUD && !declares_baud(b) {
        info!("restoring baud rate {} at join",DEFAULT_BAUD);
        ans.push(Chunk::BaudRate(DEFAULT_BAUD));
    }
    for c in b {
        match c {
            Chunk::Origin(_) | Chunk::TargetMachine(_) if a.contains(c) => {
                debug!("dropping repeated {}",c);
            },
            _ => ans.push(c.clone())
        }
    }
    ans
}

/// Rewrite explicit data chunks recorded under version `from` so that they read the same
/// under version `to`.  From 0.9 the payload starts with a count of unused trailing bits,
/// earlier payloads are all bits.  Everything else is cloned as it is.
pub fn restamp(chunks: &[Chunk],from: Version,to: Version) -> Vec<Chunk> {
    let (was_padded,now_padded) = (from >= EXPLICIT_PAD_VERSION,to >= EXPLICIT_PAD_VERSION);
    if was_padded==now_padded {
        return chunks.to_vec();
    }
    info!("converting explicit data from version {} to {}",from,to);
    chunks.iter().map(|c| match c {
        Chunk::ExplicitData(dat) if now_padded => {
            let mut ans = vec![0];
            ans.extend_from_slice(dat);
            Chunk::ExplicitData(ans)
        },
        Chunk::ExplicitData(dat) => {
            // unused bits are fewer than a frame, so they decode to nothing without the count
            Chunk::ExplicitData(dat.get(1..).unwrap_or(&[]).to_vec())
        },
        _ => c.clone()
    }).collect()
}

/// Drop every chunk for which `pred` is true
pub fn remove<F: Fn(&Chunk) -> bool>(chunks: &[Chunk],pred: F) -> Vec<Chunk> {
    chunks.iter().filter(|c| !pred(c)).cloned().collect()
}

/// Keep only the chunks for which `pred` is true
pub fn keep<F: Fn(&Chunk) -> bool>(chunks: &[Chunk],pred: F) -> Vec<Chunk> {
    chunks.iter().filter(|c| pred(c)).cloned().collect()
}

/// Replace the text of the first origin chunk, or put an origin chunk at the front
pub fn set_origin(chunks: &[Chunk],text: &str) -> Vec<Chunk> {
    let mut ans = chunks.to_vec();
    match ans.iter().position(|c| c.id()==ChunkId::Origin as u16) {
        Some(i) => ans[i] = Chunk::origin(text),
        None => ans.insert(0,Chunk::origin(text))
    }
    ans
}

/// Parse a comma separated list of hex chunk ids, such as `100,0x110,112`
pub fn parse_ids(list: &str) -> Result<Vec<u16>,DYNERR> {
    let mut ans = Vec::new();
    for item in list.split(',') {
        let s = item.trim();
        let digits = s.strip_prefix("0x").or(s.strip_prefix("&")).unwrap_or(s);
        ans.push(u16::from_str_radix(digits,16)?);
    }
    Ok(ans)
}
