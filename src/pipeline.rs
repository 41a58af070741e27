//! # Conversion Pipeline
//!
//! A conversion decodes the whole source into records, then encodes all of them into the
//! target.  Problems with the source or target as a whole are returned as errors.
//! Problems with single files are collected in the `Report` and the conversion goes on.

use std::fmt;
use std::path::{Path,PathBuf};
use std::str::FromStr;
use std::collections::HashSet;
use log::{info,warn,error};
use crate::uef::{self,Uef};
use crate::tape::t2;
use crate::fs::{adfs,FileRecord,Failure,Extracted};
use crate::img;
use crate::host;
use crate::commands::CommandError;
use crate::{DYNERR,STDRESULT};

#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum SourceFormat {
    Uef,
    Adfs,
    T2,
    Native
}

#[derive(PartialEq,Eq,Clone,Copy,Debug)]
pub enum TargetFormat {
    Uef,
    Native
}

impl FromStr for SourceFormat {
    type Err = CommandError;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "uef" => Ok(Self::Uef),
            "adf" | "adfs" => Ok(Self::Adfs),
            "t2" => Ok(Self::T2),
            "inf" | "native" => Ok(Self::Native),
            _ => Err(CommandError::UnknownFormat)
        }
    }
}

impl FromStr for TargetFormat {
    type Err = CommandError;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "uef" => Ok(Self::Uef),
            "inf" | "native" => Ok(Self::Native),
            "adf" | "adfs" | "t2" => Err(CommandError::UnsupportedFormat),
            _ => Err(CommandError::UnknownFormat)
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

impl SourceFormat {
    /// Decide by extension, falling back to the content of the file.
    /// Directories are always native.
    pub fn from_path(path: &Path) -> Result<Self,DYNERR> {
        if path.is_dir() {
            return Ok(Self::Native);
        }
        match extension(path) {
            Some(ext) if ext=="uef" => return Ok(Self::Uef),
            Some(ext) if ext.starts_with("t2") => return Ok(Self::T2),
            Some(ext) if img::FILE_EXTENSIONS.contains(&ext.as_str()) => return Ok(Self::Adfs),
            _ => {}
        }
        let dat = std::fs::read(path)?;
        if Uef::test(&dat) {
            Ok(Self::Uef)
        } else if t2::test(&dat) {
            Ok(Self::T2)
        } else if img::candidates(dat.len()).len() > 0 && dat.len() >= img::ADFS_S.total_bytes() / 2 {
            Ok(Self::Adfs)
        } else {
            error!("could not tell the format of {}",path.display());
            Err(Box::new(CommandError::UnknownFormat))
        }
    }
}

impl TargetFormat {
    /// A `.uef` extension means UEF, anything else is a host directory
    pub fn from_path(path: &Path) -> Self {
        match extension(path) {
            Some(ext) if ext=="uef" => Self::Uef,
            _ => Self::Native
        }
    }
}

/// Options for every stage, each stage uses only its own
#[derive(Clone,Debug,Default)]
pub struct ConvertOptions {
    pub uef_read: uef::ReadOptions,
    pub uef_write: uef::WriteOptions,
    pub adfs: adfs::Options,
    pub host: host::WriteOptions,
    /// write the files of a disc into a directory named after the disc
    pub disc_dir: bool
}

/// Outcome of one conversion
#[derive(Clone,Debug,Default)]
pub struct Report {
    pub source: String,
    pub target: String,
    /// name of the source disc, if it has one
    pub label: Option<String>,
    /// paths of the files written
    pub successes: Vec<String>,
    pub failures: Vec<Failure>,
    pub warnings: Vec<String>
}

impl Report {
    pub fn new(source: &Path,target: &Path) -> Self {
        Self {
            source: source.display().to_string(),
            target: target.display().to_string(),
            ..Default::default()
        }
    }
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
    /// 0 unless files failed and none succeeded
    pub fn exit_code(&self) -> i32 {
        match self.successes.is_empty() && !self.failures.is_empty() {
            true => 2,
            false => 0
        }
    }
    pub fn to_json(&self,indent: Option<u16>) -> String {
        let mut root = json::JsonValue::new_object();
        root["source"] = json::JsonValue::String(self.source.clone());
        root["target"] = json::JsonValue::String(self.target.clone());
        if let Some(label) = &self.label {
            root["label"] = json::JsonValue::String(label.clone());
        }
        root["successes"] = json::JsonValue::new_array();
        for s in &self.successes {
            let _ = root["successes"].push(s.as_str());
        }
        root["failures"] = json::JsonValue::new_array();
        for f in &self.failures {
            let _ = root["failures"].push(json::object! {
                name: f.name.as_str(),
                reason: f.reason.as_str()
            });
        }
        root["warnings"] = json::JsonValue::new_array();
        for w in &self.warnings {
            let _ = root["warnings"].push(w.as_str());
        }
        match indent {
            Some(spaces) => json::stringify_pretty(root,spaces),
            None => json::stringify(root)
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self,f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f,"{} -> {}",self.source,self.target)?;
        for s in &self.successes {
            writeln!(f,"  ok      {}",s)?;
        }
        for fail in &self.failures {
            writeln!(f,"  failed  {}: {}",fail.name,fail.reason)?;
        }
        for w in &self.warnings {
            writeln!(f,"  warning {}",w)?;
        }
        write!(f,"{} written, {} failed",self.successes.len(),self.failures.len())
    }
}

/// Read a UEF file
pub fn read_uef(path: &Path) -> Result<Uef,DYNERR> {
    let dat = std::fs::read(path)?;
    Uef::from_bytes(&dat)
}

/// Write a UEF file by way of a temporary sibling, so that a failure never
/// leaves a truncated container behind
pub fn write_uef(path: &Path,uef: &Uef) -> STDRESULT {
    let bytes = uef.to_bytes()?;
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);
    if let Err(e) = std::fs::write(&tmp,&bytes).and_then(|_| std::fs::rename(&tmp,path)) {
        error!("could not write {}: {}",path.display(),e);
        let _ = std::fs::remove_file(&tmp);
        return Err(Box::new(e));
    }
    info!("wrote {} chunks to {}",uef.chunks.len(),path.display());
    Ok(())
}

/// Decode the source into records, in source order
pub fn decode(path: &Path,fmt: SourceFormat,opt: &ConvertOptions,report: &mut Report) -> Result<Vec<Extracted>,DYNERR> {
    match fmt {
        SourceFormat::Uef => {
            let uef = read_uef(path)?;
            if !uef.version.is_known() {
                report.warnings.push(format!("{}: {}",uef::Error::UnsupportedVersion,uef.version));
            }
            Ok(uef::files::decode_files(&uef,&opt.uef_read))
        },
        SourceFormat::T2 => {
            let dat = std::fs::read(path)?;
            Ok(t2::read(&dat,&opt.uef_read.noname_stem,opt.uef_read.verify_crc))
        },
        SourceFormat::Adfs => {
            let dat = std::fs::read(path)?;
            let disc = adfs::Disc::from_bytes(&dat,&opt.adfs)?;
            report.label = Some(disc.label()?);
            disc.extract()
        },
        SourceFormat::Native => host::read_dir(path)
    }
}

/// Encode the records into the target, adding the outcome to the report
pub fn encode(files: &[FileRecord],path: &Path,fmt: TargetFormat,opt: &ConvertOptions,report: &mut Report) -> STDRESULT {
    match fmt {
        TargetFormat::Uef => {
            let (uef,failures) = uef::files::encode_files(files,&opt.uef_write);
            write_uef(path,&uef)?;
            let failed: HashSet<String> = failures.iter().map(|f| f.name.clone()).collect();
            for rec in files {
                if !failed.contains(&rec.path()) {
                    report.successes.push(rec.path());
                }
            }
            report.failures.extend(failures);
        },
        TargetFormat::Native => {
            for (rec,res) in files.iter().zip(host::write_dir(path,files,&opt.host)?) {
                match res {
                    Ok(written) => {
                        let expected = host::typed_name(rec,&opt.host).unwrap_or_else(|| host::name_to_host(rec.name()));
                        if written.file_name().map(|n| n.to_string_lossy().to_string()) != Some(expected) {
                            report.warnings.push(format!("{} written as {}",rec.path(),written.display()));
                        }
                        report.successes.push(written.display().to_string());
                    },
                    Err(f) => report.failures.push(f)
                }
            }
        }
    }
    Ok(())
}

/// Run one conversion.  The error return is reserved for failures of the whole source or target.
pub fn convert(source: &Path,sfmt: SourceFormat,target: &Path,tfmt: TargetFormat,opt: &ConvertOptions) -> Result<Report,DYNERR> {
    let mut report = Report::new(source,target);
    info!("converting {:?} {} to {:?} {}",sfmt,source.display(),tfmt,target.display());
    let mut files = Vec::new();
    for item in decode(source,sfmt,opt,&mut report)? {
        match item {
            Ok(rec) => files.push(rec),
            Err(f) => {
                warn!("skipping {}: {}",f.name,f.reason);
                report.failures.push(f);
            }
        }
    }
    match (opt.disc_dir,&report.label) {
        (true,Some(label)) => {
            let mut opt = opt.clone();
            opt.host.subdir = Some(label.clone());
            encode(&files,target,tfmt,&opt,&mut report)?;
        },
        _ => encode(&files,target,tfmt,opt,&mut report)?
    }
    Ok(report)
}
