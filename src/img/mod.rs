//! # Disc Image Module
//!
//! ADFS disc images are raw sector dumps.  The geometry fixes the sector size, the track layout,
//! and which kind of free space map the catalog uses.  Six geometries are recognized, covering
//! the nominal 160K, 320K, 640K, 800K (old and new map), and 1600K formats.
//!
//! The `adf` submodule presents an image as a linear sequence of bytes, undoing the track
//! interleave of the 640K format.  It knows nothing about the file system.

pub mod adf;

use std::fmt;
use std::str::FromStr;

/// Enumerates disc image errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("unknown disc geometry")]
    UnknownGeometry,
    #[error("image size did not match the geometry")]
    ImageSizeMismatch,
    #[error("unable to access sector")]
    SectorAccess
}

#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum MapKind {
    Old,
    New
}

#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum Layout {
    /// tracks in order, all of side 0 then all of side 1
    Sequential,
    /// side 0 and side 1 tracks alternate in the image
    Interleaved
}

#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub struct DiscGeometry {
    pub name: char,
    pub nominal: &'static str,
    pub sector_size: usize,
    pub tracks: usize,
    pub heads: usize,
    pub sectors: usize,
    pub layout: Layout,
    pub map: MapKind
}

pub const ADFS_S: DiscGeometry = DiscGeometry { name: 'S', nominal: "160K", sector_size: 256, tracks: 40, heads: 1, sectors: 16, layout: Layout::Sequential, map: MapKind::Old };
pub const ADFS_M: DiscGeometry = DiscGeometry { name: 'M', nominal: "320K", sector_size: 256, tracks: 80, heads: 1, sectors: 16, layout: Layout::Sequential, map: MapKind::Old };
pub const ADFS_L: DiscGeometry = DiscGeometry { name: 'L', nominal: "640K", sector_size: 256, tracks: 80, heads: 2, sectors: 16, layout: Layout::Interleaved, map: MapKind::Old };
pub const ADFS_D: DiscGeometry = DiscGeometry { name: 'D', nominal: "800K", sector_size: 1024, tracks: 80, heads: 2, sectors: 5, layout: Layout::Sequential, map: MapKind::Old };
pub const ADFS_E: DiscGeometry = DiscGeometry { name: 'E', nominal: "800K", sector_size: 1024, tracks: 80, heads: 2, sectors: 5, layout: Layout::Sequential, map: MapKind::New };
pub const ADFS_F: DiscGeometry = DiscGeometry { name: 'F', nominal: "1600K", sector_size: 1024, tracks: 80, heads: 2, sectors: 10, layout: Layout::Sequential, map: MapKind::New };

/// All geometries, smallest first; where sizes tie the old map comes first
pub const ALL_GEOMETRIES: [DiscGeometry;6] = [ADFS_S,ADFS_M,ADFS_L,ADFS_D,ADFS_E,ADFS_F];

/// Extensions conventionally used for ADFS images
pub const FILE_EXTENSIONS: [&str;7] = ["adf","adl","ads","adm","add","ade","adx"];

impl DiscGeometry {
    pub fn total_bytes(&self) -> usize {
        self.sector_size * self.sectors * self.tracks * self.heads
    }
    pub fn total_sectors(&self) -> usize {
        self.sectors * self.tracks * self.heads
    }
    pub fn track_bytes(&self) -> usize {
        self.sector_size * self.sectors
    }
}

/// Geometries that could hold an image of `size` bytes, in the order they should be tried
pub fn candidates(size: usize) -> Vec<DiscGeometry> {
    ALL_GEOMETRIES.iter().filter(|g| g.total_bytes() >= size).cloned().collect()
}

impl FromStr for DiscGeometry {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s.to_uppercase().as_str() {
            "S" | "160K" => Ok(ADFS_S),
            "M" | "320K" => Ok(ADFS_M),
            "L" | "640K" => Ok(ADFS_L),
            "D" => Ok(ADFS_D),
            "E" => Ok(ADFS_E),
            "F" | "1600K" => Ok(ADFS_F),
            _ => Err(Error::UnknownGeometry)
        }
    }
}

impl fmt::Display for DiscGeometry {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = match self.map {
            MapKind::Old => "old map",
            MapKind::New => "new map"
        };
        write!(f,"ADFS {} ({}, {})",self.name,self.nominal,map)
    }
}
