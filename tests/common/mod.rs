// Builders for synthetic disc images and tapes used by the integration tests.
#![allow(dead_code)]

use tape2disc::crc::{old_map_check,zone_check};
use tape2disc::fs::FileRecord;
use tape2disc::tape::encode_file;
use tape2disc::uef::{Uef,Version};
use tape2disc::uef::chunk::Chunk;
use tape2disc::fs::adfs::directory::{blank,DirFormat};
use tape2disc::fs::adfs::types::{RawEntry,DiscRecord,ENTRY_SIZE,NAME_LEN,NEW_READ,NEW_DIR,OLD_READ_CHAR,OLD_DIR_CHAR};
use tape2disc::img::{DiscGeometry,ADFS_S,ADFS_M,ADFS_D,ADFS_E,ADFS_F};

pub const LOAD: u32 = 0xffff1900;
pub const EXEC: u32 = 0xffff8023;

/// A file for the root directory: name, start sector in 256 byte units, declared length, data
pub struct Placed<'a> {
    pub name: &'a str,
    pub start: u32,
    pub length: u32,
    pub data: &'a [u8],
    pub is_dir: bool
}

impl<'a> Placed<'a> {
    pub fn file(name: &'a str,start: u32,data: &'a [u8]) -> Self {
        Self { name, start, length: data.len() as u32, data, is_dir: false }
    }
    pub fn dir(name: &'a str,start: u32) -> Self {
        Self { name, start, length: 0x500, data: &[], is_dir: true }
    }
}

fn raw_entry(name: &str,start: u32,length: u32,is_dir: bool,fmt: DirFormat) -> Vec<u8> {
    let mut n = [0x0d;NAME_LEN];
    n[..name.len()].copy_from_slice(name.as_bytes());
    let mut last = 0;
    match fmt {
        DirFormat::Old => {
            n[OLD_READ_CHAR] |= 0x80;
            if is_dir {
                n[OLD_DIR_CHAR] |= 0x80;
            }
        },
        DirFormat::New => {
            last = NEW_READ;
            if is_dir {
                last |= NEW_DIR;
            }
        }
    }
    RawEntry { name: n, load_addr: LOAD, exec_addr: EXEC, length, start, last }
        .to_bytes().expect("entry")
}

/// Directory bytes holding the given entries, data placement is up to the caller
pub fn directory(fmt: DirFormat,name: &str,title: &str,entries: &[(&str,u32,u32,bool)]) -> Vec<u8> {
    let mut buf = blank(fmt,name,title,2);
    for (i,(n,start,len,is_dir)) in entries.iter().enumerate() {
        let off = 5 + i*ENTRY_SIZE;
        buf[off..off+ENTRY_SIZE].copy_from_slice(&raw_entry(n,*start,*len,*is_dir,fmt));
    }
    buf
}

/// Write an old map with no free space and correct check bytes
pub fn old_map(dat: &mut [u8],geom: &DiscGeometry) {
    let sectors = (geom.total_bytes() / 256) as u32;
    dat[0xfc..0xff].copy_from_slice(&u32::to_le_bytes(sectors)[0..3]);
    dat[0x1fb] = 0x34;
    dat[0x1fc] = 0x12;
    dat[0xff] = old_map_check(&dat[0..256]);
    dat[0x1ff] = old_map_check(&dat[256..512]);
}

/// Image with an old map, root directory at `root`, and the files in it
fn old_map_image(geom: &DiscGeometry,root: usize,fmt: DirFormat,files: &[Placed]) -> Vec<u8> {
    let mut dat = vec![0;geom.total_bytes()];
    old_map(&mut dat,geom);
    let entries: Vec<(&str,u32,u32,bool)> = files.iter().map(|f| (f.name,f.start,f.length,f.is_dir)).collect();
    let dir = directory(fmt,"$","Test disc",&entries);
    dat[root..root+dir.len()].copy_from_slice(&dir);
    for f in files {
        let off = f.start as usize * 256;
        dat[off..off+f.data.len()].copy_from_slice(f.data);
    }
    dat
}

/// 160K image, root at 0x200, files should start at sector 7 or later
pub fn s_image(files: &[Placed]) -> Vec<u8> {
    old_map_image(&ADFS_S,0x200,DirFormat::Old,files)
}

/// 320K image, root at 0x200, files should start at sector 7 or later
pub fn m_image(files: &[Placed]) -> Vec<u8> {
    old_map_image(&ADFS_M,0x200,DirFormat::Old,files)
}

/// 800K old map image, root at 0x400, files should start at sector 12 or later
pub fn d_image(files: &[Placed]) -> Vec<u8> {
    old_map_image(&ADFS_D,0x400,DirFormat::New,files)
}

fn set_bit(zone: &mut [u8],bit: usize) {
    zone[bit >> 3] |= 1 << (bit & 7);
}

fn put_bits(zone: &mut [u8],bit: usize,width: usize,val: u32) {
    for i in 0..width {
        if val & (1 << i) > 0 {
            set_bit(zone,bit+i);
        }
    }
}

const E_IDLEN: usize = 15;
const E_ZONE_START: usize = 32 + 480;
const E_UNITS: usize = 819200 / 128;

/// 800K new map image with one zone.  The map and root directory are object 2,
/// each file is an object of its own starting at id 3.  Returns the image and the
/// indirect address of each file.
pub fn e_image(files: &[(&str,&[u8])]) -> (Vec<u8>,Vec<u32>) {
    let mut dat = vec![0;ADFS_E.total_bytes()];
    let mut zone = vec![0u8;1024];
    let mut rec = DiscRecord::default();
    rec.log2secsize = 10;
    rec.secspertrack = 5;
    rec.heads = 2;
    rec.density = 2;
    rec.idlen = E_IDLEN as u8;
    rec.log2bpmb = 7;
    rec.skew = 1;
    rec.nzones = 1;
    rec.root = 0x203;
    rec.disc_size = 819200;
    rec.disc_id = 0x4321;
    rec.disc_name = *b"EDisc     ";
    zone[4..64].copy_from_slice(&rec.to_bytes().expect("record"));
    // object 2: two map copies and the root directory, 4096 bytes or 32 units
    put_bits(&mut zone,E_ZONE_START,E_IDLEN,2);
    set_bit(&mut zone,E_ZONE_START+31);
    let mut unit = 32;
    let mut addrs = Vec::new();
    let mut entries = Vec::new();
    for (i,(name,data)) in files.iter().enumerate() {
        let id = 3 + i as u32;
        let units = usize::max(16,(data.len() + 1023) / 1024 * 8);
        put_bits(&mut zone,E_ZONE_START+unit,E_IDLEN,id);
        set_bit(&mut zone,E_ZONE_START+unit+units-1);
        let off = unit * 128;
        dat[off..off+data.len()].copy_from_slice(data);
        addrs.push(id << 8);
        entries.push((*name,id << 8,data.len() as u32,false));
        unit += units;
    }
    // the rest is one free fragment at the end of the free chain
    let free_start = E_ZONE_START + unit;
    put_bits(&mut zone,8,E_IDLEN,(free_start - 8) as u32);
    set_bit(&mut zone,E_ZONE_START+E_UNITS-1);
    zone[3] = 0xff;
    zone[0] = zone_check(&zone);
    dat[0..1024].copy_from_slice(&zone);
    dat[1024..2048].copy_from_slice(&zone);
    let root = directory(DirFormat::New,"$","New map disc",&entries);
    dat[0x800..0x1000].copy_from_slice(&root);
    (dat,addrs)
}

const F_IDLEN: usize = 15;
const F_ZONE_SIZE: usize = 3440;
const F_MAP_START: usize = F_ZONE_SIZE - 480;
const F_UNITS: usize = 1638400 / 256;

/// 1600K new map image with two zones and 256 byte map units.  The map sits at the start
/// of zone 1, found through the disc record in the boot block.  `small` is object 3 in
/// zone 0, `big` is object 4, split between zone 0 and zone 1.  Each fragment is 4096 bytes.
pub fn f_image(small: &[u8],big: &[u8]) -> Vec<u8> {
    assert!(small.len() <= 4096 && big.len() > 4096 && big.len() <= 8192);
    let mut dat = vec![0;ADFS_F.total_bytes()];
    let mut rec = DiscRecord::default();
    rec.log2secsize = 10;
    rec.secspertrack = 10;
    rec.heads = 2;
    rec.density = 4;
    rec.idlen = F_IDLEN as u8;
    rec.log2bpmb = 8;
    rec.skew = 1;
    rec.nzones = 2;
    rec.zone_spare = (8192 - F_ZONE_SIZE) as u16;
    rec.root = 0x205;
    rec.disc_size = 1638400;
    rec.disc_id = 0x5555;
    rec.disc_name = *b"BigDisc   ";
    let rec_bytes = rec.to_bytes().expect("record");
    dat[0xdc0..0xdc0+60].copy_from_slice(&rec_bytes);
    // zone 0: units 0..F_MAP_START, bits from 32+480
    let mut z0 = vec![0u8;1024];
    z0[4..64].copy_from_slice(&rec_bytes);
    let base0 = 32 + 480;
    let frags0 = [(2u32,0usize),(3,16),(4,32)];
    for (id,unit) in frags0 {
        put_bits(&mut z0,base0+unit,F_IDLEN,id);
        set_bit(&mut z0,base0+unit+15);
    }
    put_bits(&mut z0,8,F_IDLEN,(base0 + 48 - 8) as u32);
    set_bit(&mut z0,base0+F_MAP_START-1);
    z0[3] = 0xff;
    z0[0] = zone_check(&z0);
    // zone 1: units F_MAP_START..F_UNITS, bits from 32
    let mut z1 = vec![0u8;1024];
    put_bits(&mut z1,32,F_IDLEN,2);
    set_bit(&mut z1,32+23);
    put_bits(&mut z1,32+24,F_IDLEN,4);
    set_bit(&mut z1,32+39);
    put_bits(&mut z1,8,F_IDLEN,(32 + 40 - 8) as u32);
    set_bit(&mut z1,32+F_UNITS-F_MAP_START-1);
    z1[0] = zone_check(&z1);
    let map = F_MAP_START * 256;
    for copy in 0..2 {
        dat[map+copy*2048..map+copy*2048+1024].copy_from_slice(&z0);
        dat[map+copy*2048+1024..map+copy*2048+2048].copy_from_slice(&z1);
    }
    let root = directory(DirFormat::New,"$","Two zones",&[
        ("SMALL",0x300,small.len() as u32,false),
        ("BIG",0x400,big.len() as u32,false)
    ]);
    dat[map+4096..map+6144].copy_from_slice(&root);
    dat[16*256..16*256+small.len()].copy_from_slice(small);
    dat[32*256..32*256+4096].copy_from_slice(&big[0..4096]);
    let rest = (F_MAP_START + 24) * 256;
    dat[rest..rest+big.len()-4096].copy_from_slice(&big[4096..]);
    dat
}

pub fn record(name: &str,data: &[u8]) -> FileRecord {
    FileRecord::new(name,LOAD,EXEC,data.to_vec()).expect("record")
}

/// Bit framing used by explicit data chunks, without the leading count byte
pub fn explicit(dat: &[u8]) -> Vec<u8> {
    let mut bits = Vec::new();
    for b in dat {
        bits.push(0);
        for i in 0..8 {
            bits.push((b >> i) & 1);
        }
        bits.push(1);
    }
    let mut ans = vec![0u8;(bits.len() + 7) / 8];
    for (i,bit) in bits.iter().enumerate() {
        ans[i >> 3] |= bit << (i & 7);
    }
    ans
}

/// A version 0.6 tape holding `rec` as explicit data chunks
pub fn old_explicit_tape(rec: &FileRecord) -> Uef {
    let mut chunks = vec![Chunk::origin("old tape"),Chunk::CarrierTone(0x05dc)];
    for blk in encode_file(rec).expect("encode failed") {
        chunks.push(Chunk::ExplicitData(explicit(&blk.to_bytes().expect("block"))));
        chunks.push(Chunk::CarrierTone(0x0258));
    }
    Uef::new(Version::new(0,6),false,chunks)
}
