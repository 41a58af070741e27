//! ### Files in a UEF
//!
//! Tape data chunks each carry one tape block.  Decoding walks the chunks, converts explicit
//! and defined-format data back to bytes, and feeds the blocks to the tape assembler.
//! Encoding writes each file as a run of implicit data chunks separated by carrier tone.

use log::{debug,info,warn};
use super::chunk::Chunk;
use super::{Uef,Version,ReadOptions,WriteOptions,EXPLICIT_PAD_VERSION};
use crate::tape::{self,Block,Assembler};
use crate::fs::{FileRecord,Failure,Extracted};

pub const DEFAULT_BAUD: u16 = 1200;
const LEADER: u16 = 0x05dc;
const INTER_BLOCK: u16 = 0x0258;
const DUMMY_BYTE: u8 = 0xdc;

/// Convert explicit tape data to bytes.  Each byte on tape is a start bit, eight data
/// bits least significant first, and a stop bit.  Bits are packed least significant first.
/// From version 0.9 the first byte counts the unused bits at the end.
pub fn explicit_to_bytes(dat: &[u8],version: Version) -> Vec<u8> {
    let (ignore,mut ptr) = match version < EXPLICIT_PAD_VERSION {
        true => (0,0),
        false => (*dat.get(0).unwrap_or(&0) as usize,8)
    };
    let end = (dat.len()*8).saturating_sub(ignore);
    let bit = |p: usize| (dat[p >> 3] >> (p & 7)) & 1;
    let mut ans = Vec::new();
    while ptr + 9 <= end {
        // skip start bit
        ptr += 1;
        let mut byte = 0;
        for i in 0..8 {
            byte |= bit(ptr+i) << i;
        }
        ans.push(byte);
        // data and stop bit
        ptr += 9;
    }
    ans
}

/// Bytes of a data chunk as the tape block codec wants them, or None if the chunk
/// carries no usable block.
fn block_bytes(chunk: &Chunk,version: Version) -> Option<Vec<u8>> {
    match chunk {
        Chunk::ImplicitData(dat) => Some(dat.clone()),
        Chunk::ExplicitData(dat) => Some(explicit_to_bytes(dat,version)),
        Chunk::DefinedData { bits: 8, parity: b'N', data, .. } => Some(data.clone()),
        Chunk::DefinedData { bits, parity, .. } => {
            warn!("skipping defined format data with {} bits, parity {}",bits,*parity as char);
            None
        },
        Chunk::MultiplexedData(_) => {
            warn!("skipping multiplexed data");
            None
        },
        _ => None
    }
}

/// Extract the files stored on the tape, in tape order
pub fn decode_files(uef: &Uef,opt: &ReadOptions) -> Vec<Extracted> {
    let mut asm = Assembler::new(&opt.noname_stem,opt.verify_crc);
    let mut baud = DEFAULT_BAUD;
    for chunk in &uef.chunks {
        if let Chunk::BaudRate(b) = chunk {
            debug!("baud rate {}",b);
            baud = *b;
            continue;
        }
        let dat = match block_bytes(chunk,uef.version) {
            Some(d) => d,
            None => continue
        };
        // lead-in bytes sit in chunks of their own
        if dat.len() <= 1 {
            continue;
        }
        match Block::parse(&dat) {
            Ok((blk,used)) => {
                if blk.num==0 {
                    info!("found {} at {} baud",tape::name_from_tape(&blk.name),baud);
                }
                if used < dat.len() {
                    debug!("{} bytes after block {}",dat.len()-used,blk.num);
                }
                asm.push(blk);
            },
            Err(e) => warn!("skipping data chunk: {}",e)
        }
    }
    asm.finish()
}

/// Build a tape from the records.  Records that cannot go on tape are returned as failures,
/// the rest of the tape is still built.
pub fn encode_files(recs: &[FileRecord],opt: &WriteOptions) -> (Uef,Vec<Failure>) {
    let mut chunks = vec![
        Chunk::origin(&opt.origin),
        Chunk::TargetMachine(opt.target_machine),
        Chunk::CarrierTone(LEADER),
        Chunk::ImplicitData(vec![DUMMY_BYTE])
    ];
    let mut failures = Vec::new();
    for rec in recs {
        let blocks = match tape::encode_file(rec) {
            Ok(b) => b,
            Err(e) => {
                failures.push(Failure::new(&rec.path(),&e.to_string()));
                continue;
            }
        };
        let mut file_chunks = Vec::new();
        for blk in blocks {
            let tone = match blk.num {
                0 => LEADER,
                _ => INTER_BLOCK
            };
            match blk.to_bytes() {
                Ok(bytes) => {
                    file_chunks.push(Chunk::CarrierTone(tone));
                    file_chunks.push(Chunk::ImplicitData(bytes));
                },
                Err(e) => {
                    failures.push(Failure::new(&rec.path(),&e.to_string()));
                    file_chunks.clear();
                    break;
                }
            }
        }
        if file_chunks.len() > 0 {
            info!("tape file {}",rec);
            chunks.append(&mut file_chunks);
        }
    }
    chunks.push(Chunk::CarrierTone(INTER_BLOCK));
    chunks.push(Chunk::IntegerGap(INTER_BLOCK));
    (Uef::new(opt.version,opt.compress,chunks),failures)
}
