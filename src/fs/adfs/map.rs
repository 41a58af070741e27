//! ### Free space maps
//!
//! The old map occupies the first two 256 byte sectors.  Sector 0 lists the start of each
//! free fragment, sector 1 the length, 3 bytes each, in 256 byte units.  There is room for
//! 82 fragments.  Each sector ends with a check byte.
//!
//! The new map is a bitmap, one bit per allocation unit, divided into zones of one sector.
//! Every object on the disc owns one or more fragments.  A fragment starts with the object's
//! id in `idlen` bits and ends at the next set bit.  Free fragments are chained through the
//! id field, starting from the link in bits 8..23 of each zone.  Objects are addressed
//! indirectly, as `id << 8 | sector offset + 1`.

use log::{debug,trace,error};
use super::types::{DiscRecord,DISC_RECORD_SIZE};
use super::Error;
use crate::img::{DiscGeometry,MapKind};
use crate::img::adf::AdfImage;
use crate::crc::{old_map_check,zone_check};
use crate::DYNERR;

pub const OLD_MAP_UNIT: usize = 256;
pub const OLD_MAP_MAX_FRAGMENTS: usize = 82;
const OLD_MAP_END_PTR: usize = 0xfe;
const OLD_MAP_DISC_SIZE: usize = 0xfc;
const OLD_MAP_DISC_ID: usize = 0xfb;
const OLD_MAP_BOOT: usize = 0xfd;
const CHECK_BYTE: usize = 0xff;
const DR_SIZE_BITS: usize = DISC_RECORD_SIZE * 8;
/// id of the fragment holding the map and root directory
pub const ROOT_FRAG: u32 = 2;
/// the boot block, found on some new map discs, carries a copy of the disc record
const BOOT_RECORD: usize = 0xc00 + 0x1c0;

/// Free space and identity of a disc, whichever map it uses
#[derive(Clone,Debug,PartialEq)]
pub struct FreeSpaceMap {
    pub kind: MapKind,
    /// free fragments as (byte offset, byte count), in map order
    pub free: Vec<(usize,usize)>,
    pub disc_size: usize,
    pub disc_id: u16,
    pub boot_option: u8,
    pub disc_name: String
}

impl FreeSpaceMap {
    pub fn free_bytes(&self) -> usize {
        self.free.iter().map(|f| f.1).sum()
    }
}

fn u24(dat: &[u8]) -> usize {
    dat[0] as usize + ((dat[1] as usize) << 8) + ((dat[2] as usize) << 16)
}

/// True if both old map sectors carry correct check bytes
pub fn old_map_valid(img: &AdfImage) -> bool {
    match img.read(0,2*OLD_MAP_UNIT) {
        Ok(buf) => {
            old_map_check(&buf[0..OLD_MAP_UNIT])==buf[CHECK_BYTE] &&
            old_map_check(&buf[OLD_MAP_UNIT..])==buf[OLD_MAP_UNIT+CHECK_BYTE] &&
            u24(&buf[OLD_MAP_DISC_SIZE..]) * OLD_MAP_UNIT <= img.geometry().total_bytes()
        },
        Err(_) => false
    }
}

/// Decode the old map.  The check bytes should have been validated already.
pub fn read_old_map(img: &AdfImage) -> Result<FreeSpaceMap,DYNERR> {
    let buf = img.read(0,2*OLD_MAP_UNIT)?;
    let (s0,s1) = buf.split_at(OLD_MAP_UNIT);
    let end = s1[OLD_MAP_END_PTR] as usize;
    if end % 3 != 0 {
        error!("old map end pointer {} is not a multiple of 3",end);
        return Err(Box::new(Error::CorruptCatalog));
    }
    let count = end / 3;
    if count > OLD_MAP_MAX_FRAGMENTS {
        error!("old map lists {} fragments, the limit is {}",count,OLD_MAP_MAX_FRAGMENTS);
        return Err(Box::new(Error::FragmentOverflow));
    }
    let disc_size = u24(&s0[OLD_MAP_DISC_SIZE..]) * OLD_MAP_UNIT;
    let total = img.geometry().total_bytes();
    let mut free: Vec<(usize,usize)> = Vec::new();
    for i in 0..count {
        let start = u24(&s0[i*3..]) * OLD_MAP_UNIT;
        let len = u24(&s1[i*3..]) * OLD_MAP_UNIT;
        if start + len > total {
            error!("free fragment {} runs past the end of the disc",i);
            return Err(Box::new(Error::CorruptCatalog));
        }
        free.push((start,len));
    }
    let mut sorted = free.clone();
    sorted.sort();
    for pair in sorted.windows(2) {
        if pair[0].0 + pair[0].1 > pair[1].0 {
            error!("free fragments at {:X} and {:X} overlap",pair[0].0,pair[1].0);
            return Err(Box::new(Error::CorruptCatalog));
        }
    }
    let mut name = String::new();
    for i in 0..5 {
        for c in [s0[0xf7+i],s1[0xf6+i]] {
            if c > 32 && c < 127 {
                name.push(c as char);
            }
        }
    }
    debug!("old map: {} free fragments, disc size {}",count,disc_size);
    Ok(FreeSpaceMap {
        kind: MapKind::Old,
        free,
        disc_size,
        disc_id: u16::from_le_bytes([s1[OLD_MAP_DISC_ID],s1[OLD_MAP_DISC_ID+1]]),
        boot_option: s1[OLD_MAP_BOOT],
        disc_name: name
    })
}

#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Fragment {
    pub id: u32,
    /// first allocation unit
    pub start: usize,
    /// allocation units
    pub len: usize,
    pub free: bool
}

/// Decoded new map
pub struct NewMap {
    pub record: DiscRecord,
    /// byte offset of zone 0
    pub offset: usize,
    zones: Vec<Vec<Fragment>>,
    ids_per_zone: u32
}

fn asl(v: usize,shift: i32) -> usize {
    match shift >= 0 {
        true => v << shift,
        false => v >> -shift
    }
}

/// Read `width` bits starting at bit `ptr`, least significant first
fn get_bits(zone: &[u8],ptr: usize,width: usize) -> u32 {
    let mut ans: u32 = 0;
    for i in 0..width {
        let p = ptr + i;
        if zone[p >> 3] & (1 << (p & 7)) > 0 {
            ans |= 1 << i;
        }
    }
    ans
}

impl NewMap {
    fn zone_size(rec: &DiscRecord) -> usize {
        (8 << rec.log2secsize) - rec.zone_spare as usize
    }
    /// Byte offset of the map that `rec` describes, None if the record is not sensible
    fn map_offset(rec: &DiscRecord) -> Option<usize> {
        if rec.nzones==0 || rec.log2secsize < 8 || rec.log2secsize > 12 || rec.idlen < 8 || rec.idlen > 21 || rec.log2bpmb > 16 {
            return None;
        }
        if rec.zone_spare as usize >= (8 << rec.log2secsize) - DR_SIZE_BITS - 32 {
            return None;
        }
        let nzones = rec.nzones as usize;
        let mut units = (nzones >> 1) * Self::zone_size(rec);
        if nzones > 1 {
            units -= DR_SIZE_BITS;
        }
        let sector = asl(units,rec.log2bpmb as i32 - rec.log2secsize as i32);
        Some(sector << rec.log2secsize)
    }
    /// Try to find and validate a new map.  The boot block copy of the disc record is
    /// consulted first, then the map is looked for at the start of the disc.
    pub fn probe(img: &AdfImage) -> Option<usize> {
        let secsize = img.geometry().sector_size;
        let mut places = Vec::new();
        if let Ok(buf) = img.read(BOOT_RECORD,DISC_RECORD_SIZE) {
            if let Ok(rec) = DiscRecord::from_bytes(&buf) {
                if rec.log2secsize as u32 == secsize.trailing_zeros() {
                    if let Some(offset) = Self::map_offset(&rec) {
                        places.push(offset);
                    }
                }
            }
        }
        places.push(0);
        for offset in places {
            if Self::zones_valid(img,offset) {
                debug!("new map at {:X}",offset);
                return Some(offset);
            }
        }
        None
    }
    fn zones_valid(img: &AdfImage,offset: usize) -> bool {
        let secsize = img.geometry().sector_size;
        let zone0 = match img.read(offset,secsize) {
            Ok(z) => z,
            Err(_) => return false
        };
        let rec = match DiscRecord::from_bytes(&zone0[4..]) {
            Ok(r) => r,
            Err(_) => return false
        };
        if rec.log2secsize as u32 != secsize.trailing_zeros() || Self::map_offset(&rec) != Some(offset) {
            return false;
        }
        let mut cross: u8 = 0;
        for z in 0..rec.nzones as usize {
            let zone = match img.read(offset + z*secsize,secsize) {
                Ok(buf) => buf,
                Err(_) => return false
            };
            if zone_check(&zone) != zone[0] {
                trace!("zone {} check byte mismatch",z);
                return false;
            }
            cross ^= zone[3];
        }
        cross==0xff
    }
    /// Decode the map at `offset`, which should have come from `probe`.
    pub fn read(img: &AdfImage,offset: usize) -> Result<Self,DYNERR> {
        let secsize = img.geometry().sector_size;
        let zone0 = img.read(offset,secsize)?;
        let record = DiscRecord::from_bytes(&zone0[4..])?;
        let nzones = record.nzones as usize;
        let idlen = record.idlen as usize;
        let zone_size = Self::zone_size(&record);
        let disc_units = (record.disc_size as usize) >> record.log2bpmb;
        let mut zones = Vec::new();
        for z in 0..nzones {
            let zone = img.read(offset + z*secsize,secsize)?;
            let startbit = match z {
                0 => 32 + DR_SIZE_BITS,
                _ => 32
            };
            let startblk = match z {
                0 => 0,
                _ => z*zone_size - DR_SIZE_BITS
            };
            let mut endbit = 32 + zone_size;
            if z+1 == nzones {
                let last = disc_units.saturating_sub((nzones-1)*zone_size) + DR_SIZE_BITS;
                endbit = usize::min(endbit,32 + last);
            }
            endbit = usize::min(endbit,secsize*8);
            let link = get_bits(&zone,8,usize::min(idlen,15)) as usize;
            let mut freelink = match link {
                0 => 0,
                l => 8 + l
            };
            let mut frags = Vec::new();
            let mut ptr = startbit;
            while ptr < endbit {
                let mut end = ptr + idlen;
                while end < endbit && zone[end >> 3] & (1 << (end & 7))==0 {
                    end += 1;
                }
                if end >= endbit {
                    error!("fragment at bit {} of zone {} does not end",ptr,z);
                    return Err(Box::new(Error::CorruptCatalog));
                }
                let id = get_bits(&zone,ptr,idlen);
                let free = ptr==freelink;
                if free {
                    freelink = match id & 0x7fff {
                        0 => 0,
                        step => freelink + step as usize
                    };
                }
                frags.push(Fragment {
                    id,
                    start: startblk + ptr - startbit,
                    len: end + 1 - ptr,
                    free
                });
                ptr = end + 1;
            }
            trace!("zone {}: {} fragments",z,frags.len());
            zones.push(frags);
        }
        let ids_per_zone = (zone_size / (idlen + 1)) as u32;
        Ok(Self { record, offset, zones, ids_per_zone })
    }
    /// Byte address of sector `sector` of object `id`
    pub fn lookup(&self,id: u32,sector: usize) -> Option<usize> {
        let nzones = self.zones.len();
        let map2blk = self.record.log2bpmb as i32 - self.record.log2secsize as i32;
        let first = match id {
            ROOT_FRAG => nzones >> 1,
            _ => (id / u32::max(self.ids_per_zone,1)) as usize
        };
        if first >= nzones {
            return None;
        }
        let mapoff0 = asl(sector,-map2blk);
        let mut mapoff = mapoff0;
        for i in 0..nzones {
            for frag in &self.zones[(first + i) % nzones] {
                if frag.free || frag.id != id {
                    continue;
                }
                if mapoff < frag.len {
                    let unit = frag.start + mapoff;
                    let secoff = sector - asl(mapoff0,map2blk);
                    return Some((secoff + asl(unit,map2blk)) << self.record.log2secsize);
                }
                mapoff -= frag.len;
            }
        }
        None
    }
    /// Byte addresses of each sector of an object of `len` bytes
    pub fn sectors(&self,addr: u32,len: usize) -> Option<Vec<usize>> {
        let secsize = 1usize << self.record.log2secsize;
        let off = match addr & 0xff {
            0 => 0,
            x => (x - 1) as usize
        };
        let mut ans = Vec::new();
        for i in 0..(len + secsize - 1) / secsize {
            ans.push(self.lookup(addr >> 8,(off << self.record.log2sharesize) + i)?);
        }
        Some(ans)
    }
    pub fn free_space(&self) -> FreeSpaceMap {
        let free = self.zones.iter().flatten().filter(|f| f.free)
            .map(|f| (f.start << self.record.log2bpmb,f.len << self.record.log2bpmb))
            .collect();
        FreeSpaceMap {
            kind: MapKind::New,
            free,
            disc_size: self.record.disc_size as usize,
            disc_id: self.record.disc_id,
            boot_option: self.record.bootoption,
            disc_name: self.record.name()
        }
    }
}

/// Check whether the map of geometry `geom` validates on `img`
pub fn map_valid(img: &AdfImage,geom: &DiscGeometry) -> bool {
    match geom.map {
        MapKind::Old => old_map_valid(img),
        MapKind::New => NewMap::probe(img).is_some()
    }
}
