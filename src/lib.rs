//! # `tape2disc` main library
//!
//! This library converts Acorn tape and disc archives used with emulators of the BBC Micro,
//! Electron, and Archimedes.  Every conversion goes through one shared representation,
//! the `fs::FileRecord`, which holds a file's name, directory, load and execution addresses,
//! access bits, and data.
//!
//! ## Architecture
//!
//! Sources decode into a sequence of records, targets encode from one:
//! * `uef` decodes and encodes the UEF tape container, chunk by chunk
//! * `tape` decodes and encodes the Acorn cassette block format carried inside UEF and T2
//! * `fs::adfs` decodes the catalog of an ADFS disc image, on top of `img`
//! * `host` reads and writes plain files with `inf` sidecars
//!
//! The `pipeline` module ties a source to a target and produces a `Report`.
//! The `uef::edit` module works on UEF chunks directly, for merging and filtering tapes.
//!
//! ## Disc Images
//!
//! ADFS images are raw sector dumps.  The supported geometries are
//! * S, M, L: 160K, 320K, 640K with the old free space map
//! * D: 800K with the old map and large directories
//! * E, F: 800K, 1600K with the new map
//!
//! The geometry is inferred from the image size and the free space map, or given explicitly.
//!
//! ## Errors
//!
//! Functions return `Result<T,Box<dyn std::error::Error>>`.  Each module has its own error
//! enumeration, which can be recovered with `downcast_ref`.  Problems confined to one file
//! do not stop a conversion, they are returned as `fs::Failure` in place of the file.

pub mod crc;
pub mod tape;
pub mod uef;
pub mod img;
pub mod fs;
pub mod inf;
pub mod host;
pub mod pipeline;
pub mod commands;

pub type DYNERR = Box<dyn std::error::Error>;
pub type STDRESULT = Result<(),Box<dyn std::error::Error>>;
