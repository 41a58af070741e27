//! # Host Module
//!
//! Files are kept on the host as plain files, each with an `.inf` sidecar, in a directory
//! tree that mirrors the Acorn directories.  A `.` is not allowed in an Acorn name, while
//! a `/` is not allowed in a host name, so the two are swapped, as RISC OS does.
//!
//! The root of the tree may hold `index.txt`, listing files in the order they should be
//! put on tape, one relative path per line with `/` separating directories.  Without it,
//! files are taken in name order, each directory before its sub-directories.

use std::path::{Component,Path,PathBuf};
use log::{debug,info,warn,error};
use crate::fs::{FileRecord,Failure,Extracted};
use crate::inf;
use crate::DYNERR;

pub const INDEX_FILE: &str = "index.txt";

#[derive(Clone,Debug)]
pub struct WriteOptions {
    /// extension of the sidecar files
    pub inf_suffix: String,
    /// write `index.txt` so that the order can be recovered
    pub index: bool,
    /// files whose load address carries a RISC OS filetype are written as
    /// `<name><separator><type>` with no sidecar
    pub filetypes: Option<String>,
    /// write everything into this sub-directory of the root
    pub subdir: Option<String>
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            inf_suffix: inf::SUFFIX.to_string(),
            index: true,
            filetypes: None,
            subdir: None
        }
    }
}

/// RISC OS filetype carried in the load address, if the address is stamped
pub fn filetype(load_addr: u32) -> Option<u16> {
    match load_addr & 0xfff00000 {
        0xfff00000 => Some(((load_addr >> 8) & 0xfff) as u16),
        _ => None
    }
}

/// Host name carrying the filetype, when the options ask for one and the file has one
pub fn typed_name(rec: &FileRecord,opt: &WriteOptions) -> Option<String> {
    match (&opt.filetypes,filetype(rec.load_addr())) {
        (Some(sep),Some(ftype)) => Some(format!("{}{}{:03x}",name_to_host(rec.name()),sep,ftype)),
        _ => None
    }
}

/// Acorn name to host name
pub fn name_to_host(name: &str) -> String {
    name.replace('/',".")
}

/// Host name to Acorn name
pub fn name_from_host(name: &str) -> String {
    name.replace('.',"/")
}

fn sidecar(path: &Path,suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(suffix);
    PathBuf::from(s)
}

fn is_sidecar(name: &str,suffix: &str) -> bool {
    name.to_lowercase().ends_with(&[".",&suffix.to_lowercase()].concat())
}

/// Read one host file and its sidecar.  The record is placed in directory `dir`.
fn read_file(path: &Path,dir: Vec<String>) -> Extracted {
    let host_name = path.file_name().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let display = path.display().to_string();
    let data = match std::fs::read(path) {
        Ok(dat) => dat,
        Err(e) => {
            error!("could not read {}: {}",display,e);
            return Err(Failure::new(&display,&e.to_string()));
        }
    };
    let meta = match std::fs::read_to_string(sidecar(path,inf::SUFFIX)) {
        Ok(txt) => match inf::parse(&txt) {
            Ok(m) => m,
            Err(e) => {
                error!("sidecar of {}: {}",display,e);
                return Err(Failure::new(&display,&e.to_string()));
            }
        },
        Err(_) => {
            warn!("{} has no sidecar, addresses will be zero",display);
            inf::InfRecord::default()
        }
    };
    if let Some(len) = meta.length {
        if len as usize != data.len() {
            warn!("sidecar of {} gives length {:X}, file has {:X}",display,len,data.len());
        }
    }
    let rec = FileRecord::new(&name_from_host(&host_name),meta.load_addr,meta.exec_addr,data)
        .and_then(|r| r.with_dir(dir));
    match rec {
        Ok(r) => Ok(r.with_attributes(meta.attr).with_next(meta.next)),
        Err(e) => {
            error!("{}: {}",display,e);
            Err(Failure::new(&display,&e.to_string()))
        }
    }
}

/// Read every file under `root` into records
pub fn read_dir(root: &Path) -> Result<Vec<Extracted>,DYNERR> {
    let index = root.join(INDEX_FILE);
    if index.is_file() {
        info!("taking file order from {}",index.display());
        let txt = std::fs::read_to_string(&index)?;
        let mut ans = Vec::new();
        for line in txt.lines().map(|l| l.trim()).filter(|l| l.len() > 0) {
            if !Path::new(line).components().all(|c| matches!(c,Component::Normal(_))) {
                error!("{} lists {}, which is outside the directory",INDEX_FILE,line);
                ans.push(Err(Failure::new(line,"index entry is outside the directory")));
                continue;
            }
            let segs: Vec<&str> = line.split('/').collect();
            let mut path = root.to_path_buf();
            for seg in &segs {
                path.push(seg);
            }
            let dir = segs[0..segs.len()-1].iter().map(|s| name_from_host(s)).collect();
            ans.push(read_file(&path,dir));
        }
        return Ok(ans);
    }
    let mut ans = Vec::new();
    let mut work: Vec<(PathBuf,Vec<String>)> = vec![(root.to_path_buf(),Vec::new())];
    while let Some((path,dir)) = work.pop() {
        let mut names: Vec<(String,PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(&path)? {
            let entry = entry?;
            names.push((entry.file_name().to_string_lossy().to_string(),entry.path()));
        }
        names.sort();
        let mut subdirs = Vec::new();
        for (name,full) in names {
            if full.is_dir() {
                let mut sub = dir.clone();
                sub.push(name_from_host(&name));
                subdirs.push((full,sub));
            } else if !is_sidecar(&name,inf::SUFFIX) {
                debug!("found {}",full.display());
                ans.push(read_file(&full,dir.clone()));
            }
        }
        work.extend(subdirs.into_iter().rev());
    }
    Ok(ans)
}

/// Write data and sidecar, removing both if either fails
fn write_pair(path: &Path,data: &[u8],side: &Path,line: &str) -> std::io::Result<()> {
    let res = std::fs::write(path,data).and_then(|_| std::fs::write(side,line));
    if res.is_err() {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(side);
    }
    res
}

/// Write data with no sidecar, removing the file if the write fails
fn write_data(path: &Path,data: &[u8]) -> std::io::Result<()> {
    let res = std::fs::write(path,data);
    if res.is_err() {
        let _ = std::fs::remove_file(path);
    }
    res
}

/// Pick a host path for `name` in `dir` that does not exist yet
fn free_path(dir: &Path,name: &str,suffix: &str) -> PathBuf {
    let mut path = dir.join(name);
    let mut n = 1;
    while path.exists() || sidecar(&path,suffix).exists() {
        warn!("{} already exists",path.display());
        path = dir.join(format!("{}-{}",name,n));
        n += 1;
    }
    path
}

/// Write records under `root`, creating it if necessary.  Failure to create the root is
/// fatal, any other failure only affects the file concerned.  Successes return the path written.
pub fn write_dir(root: &Path,files: &[FileRecord],opt: &WriteOptions) -> Result<Vec<Result<PathBuf,Failure>>,DYNERR> {
    let root = match &opt.subdir {
        Some(sub) => {
            let leaf = match name_to_host(sub.trim()) {
                s if s.len()==0 || s=="." || s==".." => "Untitled".to_string(),
                s => s
            };
            info!("writing into {}",leaf);
            root.join(leaf)
        },
        None => root.to_path_buf()
    };
    let root = root.as_path();
    std::fs::create_dir_all(root)?;
    let mut ans = Vec::new();
    let mut index = String::new();
    for rec in files {
        let mut dir = root.to_path_buf();
        let mut rel = String::new();
        for seg in rec.dir() {
            dir.push(name_to_host(seg));
            rel += &name_to_host(seg);
            rel.push('/');
        }
        if let Err(e) = std::fs::create_dir_all(&dir) {
            error!("could not create {}: {}",dir.display(),e);
            ans.push(Err(Failure::new(&rec.path(),&e.to_string())));
            continue;
        }
        let res = match &typed_name(rec,opt) {
            Some(name) => {
                let path = free_path(&dir,name,&opt.inf_suffix);
                write_data(&path,rec.data()).map(|_| path)
            },
            None => {
                let path = free_path(&dir,&name_to_host(rec.name()),&opt.inf_suffix);
                let side = sidecar(&path,&opt.inf_suffix);
                write_pair(&path,rec.data(),&side,&(inf::format(rec) + "\n")).map(|_| path)
            }
        };
        match res {
            Ok(path) => {
                info!("wrote {}",path.display());
                if let Some(leaf) = path.file_name() {
                    rel += &leaf.to_string_lossy();
                }
                index += &rel;
                index.push('\n');
                ans.push(Ok(path));
            },
            Err(e) => {
                error!("could not write {}: {}",rec.path(),e);
                ans.push(Err(Failure::new(&rec.path(),&e.to_string())));
            }
        }
    }
    let index_path = root.join(INDEX_FILE);
    if opt.index && index.len() > 0 {
        match index_path.exists() {
            true => warn!("{} is taken by a file, order will not be kept",index_path.display()),
            false => std::fs::write(&index_path,index)?
        }
    }
    Ok(ans)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fs::Attributes;

    fn rec(name: &str,dir: &[&str],n: usize) -> FileRecord {
        FileRecord::new(name,0x1900,0x8023,vec![n as u8;n]).expect("bad record")
            .with_dir(dir.iter().map(|s| s.to_string()).collect()).expect("bad dir")
    }

    #[test]
    fn write_then_read() {
        let tmp = tempfile::tempdir().expect("no temp dir");
        let files = vec![
            rec("ZED",&[],3),
            rec("A/B",&[],2).with_attributes(Attributes::from_bits(8)),
            rec("INNER",&["SUB"],5),
            rec("ZED",&[],1)
        ];
        let written = write_dir(tmp.path(),&files,&WriteOptions::default()).expect("write failed");
        assert_eq!(written.len(),4);
        assert!(tmp.path().join("A.B").is_file());
        assert!(tmp.path().join("A.B.inf").is_file());
        assert!(tmp.path().join("SUB").join("INNER").is_file());
        assert!(tmp.path().join("ZED-1").is_file());
        let back: Vec<FileRecord> = read_dir(tmp.path()).expect("read failed").into_iter()
            .map(|x| x.expect("file failed")).collect();
        let names: Vec<String> = back.iter().map(|r| r.path()).collect();
        assert_eq!(names,vec!["$.ZED","$.A/B","$.SUB.INNER","$.ZED-1"]);
        assert_eq!(back[1].attributes().bits(),8);
        assert_eq!(back[2].data(),&[5;5]);
        assert_eq!(back[2].load_addr(),0x1900);
    }

    #[test]
    fn no_index_no_sidecar() {
        let tmp = tempfile::tempdir().expect("no temp dir");
        std::fs::write(tmp.path().join("B"),b"bb").expect("write failed");
        std::fs::write(tmp.path().join("A"),b"a").expect("write failed");
        std::fs::write(tmp.path().join("A.inf"),"$.A FFFF0E00 FFFF8023 1 L\n").expect("write failed");
        let back: Vec<FileRecord> = read_dir(tmp.path()).expect("read failed").into_iter()
            .map(|x| x.expect("file failed")).collect();
        assert_eq!(back.len(),2);
        assert_eq!(back[0].name(),"A");
        assert!(back[0].attributes().is_locked());
        assert_eq!(back[1].load_addr(),0);
    }

    #[test]
    fn filetypes_and_disc_dir() {
        let tmp = tempfile::tempdir().expect("no temp dir");
        let files = vec![
            FileRecord::new("TEXT",0xffffff00,0,b"hi".to_vec()).expect("bad record"),
            FileRecord::new("GAME",0xffff1900,0xffff8023,b"go".to_vec()).expect("bad record"),
            FileRecord::new("RAW",0x1900,0x1900,b"..".to_vec()).expect("bad record")
        ];
        let opt = WriteOptions {
            filetypes: Some(",".to_string()),
            subdir: Some("My Disc".to_string()),
            ..WriteOptions::default()
        };
        let written = write_dir(tmp.path(),&files,&opt).expect("write failed");
        assert!(written.iter().all(|w| w.is_ok()));
        let disc = tmp.path().join("My Disc");
        assert_eq!(std::fs::read(disc.join("TEXT,fff")).expect("missing file"),b"hi");
        assert!(!disc.join("TEXT,fff.inf").exists());
        assert!(disc.join("GAME,f19").is_file());
        assert!(disc.join("RAW").is_file());
        assert!(disc.join("RAW.inf").is_file());
        let index = std::fs::read_to_string(disc.join(INDEX_FILE)).expect("missing index");
        assert_eq!(index,"TEXT,fff\nGAME,f19\nRAW\n");
        assert_eq!(filetype(0xfffff900),Some(0xff9));
        assert_eq!(filetype(0x00001900),None);
    }

    #[test]
    fn index_stays_inside() {
        let tmp = tempfile::tempdir().expect("no temp dir");
        let root = tmp.path().join("root");
        std::fs::create_dir(&root).expect("mkdir failed");
        std::fs::write(tmp.path().join("SECRET"),b"outside").expect("write failed");
        std::fs::write(root.join("OK"),b"inside").expect("write failed");
        std::fs::write(root.join(INDEX_FILE),"OK\n../SECRET\n/etc/passwd\n").expect("write failed");
        let back = read_dir(&root).expect("read failed");
        assert_eq!(back.len(),3);
        assert_eq!(back[0].as_ref().expect("file failed").data(),b"inside");
        assert!(back[1].is_err());
        assert!(back[2].is_err());
    }
}
