//! ### Slogger T2 files
//!
//! The T2 ROMs for the Electron save a copy of a tape to disc.  After a 5 byte header
//! the file holds ordinary tape blocks with every byte exclusive-or'd with 0x5A.
//! A sync byte of 0x2B, instead of 0x2A, marks the end.

use log::{debug,warn};
use super::{Block,Assembler};
use crate::fs::Extracted;

const HEADER_LEN: usize = 5;
const MASK: u8 = 0x5a;
const END_MARK: u8 = 0x2b;

/// Quick test whether `dat` decodes as a T2 stream
pub fn test(dat: &[u8]) -> bool {
    match dat.get(HEADER_LEN) {
        Some(b) => *b ^ MASK == super::SYNC,
        None => false
    }
}

/// Undo the mask, dropping the header
pub fn unmask(dat: &[u8]) -> Vec<u8> {
    dat.iter().skip(HEADER_LEN).map(|b| b ^ MASK).collect()
}

/// Decode all blocks in a T2 file into records.
/// A block that cannot be read ends the stream with a warning.
pub fn read(dat: &[u8],stem: &str,verify_crc: bool) -> Vec<Extracted> {
    let buf = unmask(dat);
    let mut asm = Assembler::new(stem,verify_crc);
    let mut ptr = 0;
    while ptr < buf.len() {
        if buf[ptr]==END_MARK {
            debug!("end mark at {}",ptr + HEADER_LEN);
            break;
        }
        match Block::parse(&buf[ptr..]) {
            Ok((blk,used)) => {
                debug!("T2 block {} at {}",blk.num,ptr + HEADER_LEN);
                asm.push(blk);
                ptr += used;
            },
            Err(e) => {
                warn!("T2 stream ends early at offset {}: {}",ptr + HEADER_LEN,e);
                break;
            }
        }
    }
    asm.finish()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fs::FileRecord;
    use crate::tape::encode_file;

    #[test]
    fn masked_stream() {
        let rec = FileRecord::new("SAVED",0x3000,0x3000,vec![0xa9;300]).expect("bad record");
        let mut plain = Vec::new();
        for blk in encode_file(&rec).expect("encode failed") {
            plain.append(&mut blk.to_bytes().expect("write failed"));
        }
        plain.push(END_MARK);
        plain.append(&mut vec![0xff;4]);
        let mut dat = vec![0;HEADER_LEN];
        dat.extend(plain.iter().map(|b| b ^ MASK));
        assert!(test(&dat));
        let files = read(&dat,"noname",true);
        assert_eq!(files.len(),1);
        let got = files[0].as_ref().expect("file failed");
        assert_eq!(got.name(),"SAVED");
        assert_eq!(got.data(),rec.data());
    }
}
