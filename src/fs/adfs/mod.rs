//! # ADFS file system module
//!
//! This module reads the catalog of an ADFS disc image and extracts its files.
//! The image is first matched to a geometry, either given by the caller or inferred from
//! the image size and a valid free space map.  The geometry determines where the root
//! directory is and how disc addresses are interpreted:
//! * S, M, L: old map, 1280 byte directories, root at 0x200
//! * D: old map, 2048 byte directories, root at 0x400
//! * E, F: new map, 2048 byte directories, root found through the disc record
//!
//! Sub-directories are visited with an explicit work list.  Any directory seen twice
//! makes the whole catalog corrupt.  Any extent that would run past the end of the
//! geometry also makes the catalog corrupt.  An extent that fits the geometry but is
//! missing from a short image only causes that one file to fail.

pub mod types;
pub mod map;
pub mod directory;

use std::collections::HashSet;
use log::{debug,info,warn,error};
use crate::img::{self,DiscGeometry,MapKind};
use crate::img::adf::AdfImage;
use crate::fs::{FileRecord,Failure,Extracted,PATH_SEP};
use directory::{Directory,DirFormat,Entry};
use map::{FreeSpaceMap,NewMap,OLD_MAP_UNIT};
use crate::DYNERR;

const OLD_ROOT: usize = 0x200;
const BIG_ROOT: usize = 0x400;
const UNTITLED: &str = "Untitled";

/// Enumerates ADFS errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("unknown geometry, no map validates")]
    UnknownGeometry,
    #[error("catalog is corrupt")]
    CorruptCatalog,
    #[error("too many fragments in free space map")]
    FragmentOverflow,
    #[error("free space map checksum is wrong")]
    BadMapChecksum,
    #[error("file extends past the end of the image")]
    FileExtent
}

#[derive(Clone,Copy,Debug,Default)]
pub struct Options {
    /// skip inference and use this geometry
    pub geometry: Option<DiscGeometry>
}

/// Byte ranges in the image, as (offset,length)
type Extents = Vec<(usize,usize)>;

enum Allocation {
    Old,
    New(NewMap)
}

/// A catalog entry and where it was found
#[derive(Clone,Debug)]
pub struct CatalogItem {
    pub dir: Vec<String>,
    pub entry: Entry,
    extents: Extents
}

impl CatalogItem {
    /// Full ADFS path, such as `$.GAMES.ELITE`
    pub fn path(&self) -> String {
        let mut ans = String::from("$");
        for seg in self.dir.iter().chain([&self.entry.name]) {
            ans.push(PATH_SEP);
            ans += seg;
        }
        ans
    }
}

#[derive(Debug)]
pub struct Catalog {
    pub title: String,
    pub items: Vec<CatalogItem>
}

/// Find the smallest geometry that can hold `dat` and whose map validates.
pub fn infer_geometry(dat: &[u8]) -> Result<DiscGeometry,DYNERR> {
    for geom in img::candidates(dat.len()) {
        let img = AdfImage::from_bytes(dat,geom)?;
        if map::map_valid(&img,&geom) {
            return Ok(geom);
        }
        debug!("image is not {}",geom);
    }
    error!("no geometry matches an image of {} bytes",dat.len());
    Err(Box::new(Error::UnknownGeometry))
}

pub struct Disc {
    img: AdfImage,
    alloc: Allocation,
    free: FreeSpaceMap,
    root: Extents,
    format: DirFormat
}

impl Disc {
    pub fn from_bytes(dat: &[u8],opt: &Options) -> Result<Self,DYNERR> {
        let geometry = match opt.geometry {
            Some(geom) => {
                let img = AdfImage::from_bytes(dat,geom)?;
                if !map::map_valid(&img,&geom) {
                    error!("map does not validate for {}",geom);
                    return Err(Box::new(Error::BadMapChecksum));
                }
                geom
            },
            None => infer_geometry(dat)?
        };
        info!("identified {}",geometry);
        let img = AdfImage::from_bytes(dat,geometry)?;
        let format = match geometry.sector_size {
            256 => DirFormat::Old,
            _ => DirFormat::New
        };
        let mut ans = match geometry.map {
            MapKind::Old => {
                let root = match format {
                    DirFormat::Old => OLD_ROOT,
                    DirFormat::New => BIG_ROOT
                };
                Self {
                    free: map::read_old_map(&img)?,
                    img,
                    alloc: Allocation::Old,
                    root: vec![(root,format.size())],
                    format
                }
            },
            MapKind::New => {
                let offset = match NewMap::probe(&img) {
                    Some(o) => o,
                    None => return Err(Box::new(Error::BadMapChecksum))
                };
                let new_map = NewMap::read(&img,offset)?;
                Self {
                    free: new_map.free_space(),
                    img,
                    alloc: Allocation::New(new_map),
                    root: Vec::new(),
                    format
                }
            }
        };
        if let Allocation::New(new_map) = &ans.alloc {
            let root_addr = new_map.record.root;
            debug!("root directory at indirect address {:06X}",root_addr);
            ans.root = ans.locate(root_addr,format.size())?;
        }
        Ok(ans)
    }
    pub fn geometry(&self) -> DiscGeometry {
        self.img.geometry()
    }
    pub fn free_space(&self) -> &FreeSpaceMap {
        &self.free
    }
    /// Name of the disc: the disc record name on new map discs, otherwise the title of
    /// the root directory.  Blank names give `Untitled`.
    pub fn label(&self) -> Result<String,DYNERR> {
        let name = match (&self.alloc,self.free.disc_name.trim()) {
            (Allocation::New(_),n) if n.len() > 0 => n.to_string(),
            _ => Directory::parse(&self.read_extents(&self.root)?,self.format)?.title
        };
        Ok(match name.trim() {
            "" => UNTITLED.to_string(),
            n => n.to_string()
        })
    }
    /// Byte ranges of an object of `len` bytes starting at disc address `start`
    fn locate(&self,start: u32,len: usize) -> Result<Extents,DYNERR> {
        let total = self.geometry().total_bytes();
        match &self.alloc {
            Allocation::Old => {
                let offset = start as usize * OLD_MAP_UNIT;
                if offset + len > total {
                    error!("object at sector {:X} with length {} runs past the end of the disc",start,len);
                    return Err(Box::new(Error::CorruptCatalog));
                }
                Ok(vec![(offset,len)])
            },
            Allocation::New(new_map) => {
                let secsize = self.geometry().sector_size;
                let sectors = match new_map.sectors(start,len) {
                    Some(s) => s,
                    None => {
                        error!("indirect address {:06X} is not in the map",start);
                        return Err(Box::new(Error::CorruptCatalog));
                    }
                };
                let mut ans: Extents = Vec::new();
                let mut remaining = len;
                for addr in sectors {
                    let n = usize::min(remaining,secsize);
                    if addr + n > total {
                        error!("object at {:06X} maps past the end of the disc",start);
                        return Err(Box::new(Error::CorruptCatalog));
                    }
                    match ans.last_mut() {
                        Some(prev) if prev.0 + prev.1 == addr => prev.1 += n,
                        _ => ans.push((addr,n))
                    }
                    remaining -= n;
                }
                Ok(ans)
            }
        }
    }
    fn read_extents(&self,extents: &Extents) -> Result<Vec<u8>,DYNERR> {
        let mut ans = Vec::new();
        for (offset,len) in extents {
            ans.append(&mut self.img.read(*offset,*len)?);
        }
        Ok(ans)
    }
    fn readable(&self,extents: &Extents) -> bool {
        extents.iter().all(|(offset,len)| self.img.contains(*offset,*len))
    }
    /// Walk the directory tree, returning every entry, directories included.
    /// A sub-directory missing from a short image is listed but not descended into.
    pub fn catalog(&self) -> Result<Catalog,DYNERR> {
        let mut items = Vec::new();
        let mut title = String::new();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut work: Vec<(Vec<String>,Extents)> = vec![(Vec::new(),self.root.clone())];
        while let Some((path,extents)) = work.pop() {
            let key = match extents.first() {
                Some(e) => e.0,
                None => return Err(Box::new(Error::CorruptCatalog))
            };
            if !visited.insert(key) {
                error!("directory at {:X} is reached twice",key);
                return Err(Box::new(Error::CorruptCatalog));
            }
            let buf = match (self.read_extents(&extents),path.is_empty()) {
                (Ok(buf),_) => buf,
                (Err(e),true) => return Err(e),
                (Err(_),false) => {
                    warn!("directory $.{} is not in the image",path.join("."));
                    continue;
                }
            };
            let dir = Directory::parse(&buf,self.format)?;
            if path.is_empty() {
                title = dir.title.clone();
            }
            debug!("directory {} has {} entries",dir.name,dir.entries.len());
            let mut subdirs = Vec::new();
            for entry in dir.entries {
                let len = match entry.is_dir {
                    true => self.format.size(),
                    false => entry.length as usize
                };
                let extents = self.locate(entry.start,len)?;
                if entry.is_dir {
                    let mut sub = path.clone();
                    sub.push(entry.name.clone());
                    subdirs.push((sub,extents.clone()));
                }
                items.push(CatalogItem {
                    dir: path.clone(),
                    entry,
                    extents
                });
            }
            work.extend(subdirs.into_iter().rev());
        }
        Ok(Catalog { title, items })
    }
    fn extract_item(&self,item: &CatalogItem) -> Extracted {
        let path = item.path();
        let data = match self.read_extents(&item.extents) {
            Ok(dat) => dat,
            Err(_) => {
                error!("{} has {} bytes but the image ends first",path,item.entry.length);
                return Err(Failure::new(&path,&Error::FileExtent.to_string()));
            }
        };
        let rec = FileRecord::new(&item.entry.name,item.entry.load_addr,item.entry.exec_addr,data)
            .and_then(|r| r.with_dir(item.dir.clone()));
        match rec {
            Ok(r) => Ok(r.with_attributes(item.entry.attr)),
            Err(e) => {
                error!("{}: {}",path,e);
                Err(Failure::new(&path,&e.to_string()))
            }
        }
    }
    /// Extract every file in catalog order.  Errors in the catalog structure are fatal,
    /// problems with one file are returned in its place.
    pub fn extract(&self) -> Result<Vec<Extracted>,DYNERR> {
        let catalog = self.catalog()?;
        if catalog.title.len() > 0 {
            info!("disc title {}",catalog.title);
        }
        let mut ans = Vec::new();
        for item in &catalog.items {
            if !item.entry.is_dir {
                ans.push(self.extract_item(item));
            } else if !self.readable(&item.extents) {
                ans.push(Err(Failure::new(&item.path(),&Error::FileExtent.to_string())));
            }
        }
        Ok(ans)
    }
}

/// Extract all files from the image in `dat`
pub fn read(dat: &[u8],opt: &Options) -> Result<Vec<Extracted>,DYNERR> {
    Disc::from_bytes(dat,opt)?.extract()
}
