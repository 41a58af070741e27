// test of ADFS catalog decoding
mod common;

use common::Placed;
use tape2disc::crc::old_map_check;
use tape2disc::fs::adfs::{self,Disc,Options,Error};
use tape2disc::fs::adfs::directory::DirFormat;
use tape2disc::img::{self,ADFS_S,ADFS_M,ADFS_L,ADFS_D,ADFS_E,ADFS_F};

fn adfs_error(err: &Box<dyn std::error::Error>) -> Option<&Error> {
    err.downcast_ref::<Error>()
}

#[test]
fn infer_800k() {
    let dat = common::d_image(&[Placed::file("HELLO",12,b"hello")]);
    assert_eq!(dat.len(),819200);
    let geom = adfs::infer_geometry(&dat).expect("no geometry");
    assert_eq!(geom.nominal,"800K");
    assert_eq!(geom,ADFS_D);
    let disc = Disc::from_bytes(&dat,&Options::default()).expect("bad disc");
    assert_eq!(disc.free_space().disc_id,0x1234);
    assert_eq!(disc.free_space().disc_size,819200);
    let files = disc.extract().expect("extract failed");
    let rec = files[0].as_ref().expect("file failed");
    assert_eq!(rec.path(),"$.HELLO");
    assert_eq!(rec.data(),b"hello");
    assert_eq!(rec.load_addr(),common::LOAD);
}

#[test]
fn new_map_disc() {
    let big: Vec<u8> = (0..3072).map(|i| (i % 256) as u8).collect();
    let (dat,addrs) = common::e_image(&[("HELLO",b"hello world"),("BIG",&big)]);
    assert_eq!(addrs,vec![0x300,0x400]);
    let geom = adfs::infer_geometry(&dat).expect("no geometry");
    assert_eq!(geom,ADFS_E);
    let disc = Disc::from_bytes(&dat,&Options { geometry: Some(ADFS_E) }).expect("bad disc");
    let free = disc.free_space();
    assert_eq!(free.disc_name,"EDisc");
    assert_eq!(free.free.len(),1);
    assert_eq!(free.free[0],(72*128,(6400-72)*128));
    let cat = disc.catalog().expect("bad catalog");
    assert_eq!(cat.title,"New map disc");
    let files: Vec<_> = disc.extract().expect("extract failed").into_iter()
        .map(|x| x.expect("file failed")).collect();
    assert_eq!(files[0].data(),b"hello world");
    assert_eq!(files[1].data(),&big[..]);
}

#[test]
fn interleaved_640k() {
    // one file on side 1, logical sector 1280 is on physical track 1
    let mut dat = vec![0;ADFS_L.total_bytes()];
    common::old_map(&mut dat,&ADFS_L);
    let root = common::directory(DirFormat::Old,"$","Side one",&[("FAR",1280,4,false)]);
    dat[0x200..0x700].copy_from_slice(&root);
    dat[4096..4100].copy_from_slice(b"side");
    assert_eq!(adfs::infer_geometry(&dat).expect("no geometry"),ADFS_L);
    let files = adfs::read(&dat,&Options::default()).expect("read failed");
    assert_eq!(files[0].as_ref().expect("file failed").data(),b"side");
}

#[test]
fn catalog_out_of_bounds() {
    let dat = common::s_image(&[
        Placed::file("OK",7,b"fine"),
        Placed { name: "HUGE", start: 0x27f, length: 0x1000, data: &[], is_dir: false }
    ]);
    let disc = Disc::from_bytes(&dat,&Options::default()).expect("bad disc");
    let err = disc.extract().expect_err("bounds not checked");
    assert!(matches!(adfs_error(&err),Some(Error::CorruptCatalog)));
}

#[test]
fn too_many_fragments() {
    let mut dat = common::s_image(&[]);
    dat[0x1fe] = 83*3;
    dat[0x1ff] = old_map_check(&dat[256..512]);
    let err = Disc::from_bytes(&dat,&Options::default()).err().expect("overflow not detected");
    assert!(matches!(adfs_error(&err),Some(Error::FragmentOverflow)));
}

#[test]
fn unknown_geometry() {
    let err = adfs::infer_geometry(&vec![0;819200]).expect_err("blank image matched");
    assert!(matches!(adfs_error(&err),Some(Error::UnknownGeometry)));
    assert!(adfs::infer_geometry(&vec![0;2_000_000]).is_err());
    // explicit geometry with a bad map
    let err = Disc::from_bytes(&vec![0;ADFS_S.total_bytes()],&Options { geometry: Some(ADFS_S) }).err().expect("bad map accepted");
    assert!(matches!(adfs_error(&err),Some(Error::BadMapChecksum)));
    assert_eq!(img::candidates(ADFS_S.total_bytes()).len(),6);
}

#[test]
fn short_image_fails_one_file() {
    let dat = common::s_image(&[
        Placed::file("ONE",7,b"first"),
        Placed::file("TWO",8,b"second"),
        Placed::file("THREE",0x40,b"third")
    ]);
    let files = adfs::read(&dat[0..0x1000],&Options::default()).expect("read failed");
    assert_eq!(files.len(),3);
    assert!(files[0].is_ok());
    assert!(files[1].is_ok());
    let fail = files[2].as_ref().expect_err("should fail");
    assert_eq!(fail.name,"$.THREE");
}

#[test]
fn two_zone_1600k() {
    let big: Vec<u8> = (0..6000).map(|i| (i % 253) as u8).collect();
    let dat = common::f_image(b"in zone zero",&big);
    assert_eq!(adfs::infer_geometry(&dat).expect("no geometry"),ADFS_F);
    let disc = Disc::from_bytes(&dat,&Options::default()).expect("bad disc");
    let free = disc.free_space();
    assert_eq!(free.disc_name,"BigDisc");
    assert_eq!(free.disc_size,1638400);
    assert_eq!(free.free,vec![(48*256,2912*256),(3000*256,3400*256)]);
    let cat = disc.catalog().expect("bad catalog");
    assert_eq!(cat.title,"Two zones");
    let files: Vec<_> = disc.extract().expect("extract failed").into_iter()
        .map(|x| x.expect("file failed")).collect();
    assert_eq!(files[0].path(),"$.SMALL");
    assert_eq!(files[0].data(),b"in zone zero");
    assert_eq!(files[1].data(),&big[..]);
}

#[test]
fn f_map_needs_boot_record() {
    let mut dat = common::f_image(b"x",&[1;5000]);
    dat[0xdc0..0xdc0+60].fill(0);
    assert!(adfs::infer_geometry(&dat).is_err());
}

#[test]
fn infer_320k() {
    let dat = common::m_image(&[Placed::file("FAR",0x400,b"past 160K")]);
    assert_eq!(adfs::infer_geometry(&dat).expect("no geometry"),ADFS_M);
    let files = adfs::read(&dat,&Options::default()).expect("read failed");
    assert_eq!(files.len(),1);
    assert_eq!(files[0].as_ref().expect("file failed").data(),b"past 160K");
}
