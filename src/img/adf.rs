//! ### Raw ADFS images
//!
//! Offsets handed to `AdfImage::read` are logical: they run through side 0 and then
//! side 1.  For the interleaved 640K layout they are mapped onto the alternating tracks
//! of the image.  An image may be shorter than its geometry, as when trailing empty
//! tracks were not saved, and reading the missing part is an error.

use log::{debug,error};
use super::{DiscGeometry,Layout,Error};
use crate::DYNERR;

pub struct AdfImage {
    geometry: DiscGeometry,
    data: Vec<u8>
}

impl AdfImage {
    /// Wrap the image bytes, which may not exceed the size of the geometry
    pub fn from_bytes(dat: &[u8],geometry: DiscGeometry) -> Result<Self,DYNERR> {
        if dat.len() > geometry.total_bytes() {
            error!("image has {} bytes, {} holds {}",dat.len(),geometry,geometry.total_bytes());
            return Err(Box::new(Error::ImageSizeMismatch));
        }
        if dat.len() < geometry.total_bytes() {
            debug!("image is short by {} bytes",geometry.total_bytes() - dat.len());
        }
        Ok(Self {
            geometry,
            data: dat.to_vec()
        })
    }
    pub fn geometry(&self) -> DiscGeometry {
        self.geometry
    }
    /// Map a logical offset to an offset in the image
    fn physical(&self,offset: usize) -> usize {
        match self.geometry.layout {
            Layout::Sequential => offset,
            Layout::Interleaved => {
                let tbytes = self.geometry.track_bytes();
                let track = offset / tbytes;
                let phys_track = match track < self.geometry.tracks {
                    true => 2*track,
                    false => 2*(track - self.geometry.tracks) + 1
                };
                phys_track * tbytes + offset % tbytes
            }
        }
    }
    /// True if every byte in the logical range is in the image
    pub fn contains(&self,offset: usize,len: usize) -> bool {
        self.read(offset,len).is_ok()
    }
    /// Read `len` bytes starting at logical `offset`
    pub fn read(&self,offset: usize,len: usize) -> Result<Vec<u8>,DYNERR> {
        let end = match offset.checked_add(len) {
            Some(e) if e <= self.geometry.total_bytes() => e,
            _ => return Err(Box::new(Error::SectorAccess))
        };
        let tbytes = self.geometry.track_bytes();
        let mut ans = Vec::with_capacity(len);
        let mut ptr = offset;
        while ptr < end {
            let n = usize::min(end - ptr,tbytes - ptr % tbytes);
            let phys = self.physical(ptr);
            if phys + n > self.data.len() {
                debug!("logical offset {} is beyond the end of the image",ptr);
                return Err(Box::new(Error::SectorAccess));
            }
            ans.extend_from_slice(&self.data[phys..phys+n]);
            ptr += n;
        }
        Ok(ans)
    }
}
