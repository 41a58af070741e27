use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*; // Used for writing assertions
use std::process::Command; // Run programs
mod common;

use common::Placed;

#[test]
fn help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tape2disc")?;
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("uef2inf"));
    Ok(())
}

#[test]
fn files_to_tape_and_back() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let src = tmp.path().join("src");
    std::fs::create_dir(&src)?;
    std::fs::write(src.join("HELLO"),b"PRINT \"HELLO\"")?;
    std::fs::write(src.join("HELLO.inf"),"$.HELLO FFFF0E00 FFFF802B 0D L\n")?;
    let tape = tmp.path().join("hello.uef");
    let mut cmd = Command::cargo_bin("tape2disc")?;
    cmd.arg("inf2uef").arg(&src).arg(&tape).arg("-z")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 written, 0 failed"));
    let dst = tmp.path().join("dst");
    let mut cmd = Command::cargo_bin("tape2disc")?;
    cmd.arg("uef2inf").arg(&tape).arg(&dst).arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"failures\":[]"));
    assert_eq!(std::fs::read(dst.join("HELLO"))?,b"PRINT \"HELLO\"");
    assert_eq!(std::fs::read_to_string(dst.join("HELLO.inf"))?,"$.HELLO\tFFFF0E00\tFFFF802B\tD\t08\n");
    Ok(())
}

#[test]
fn some_files_fail() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let dat = common::s_image(&[
        Placed::file("ONE",7,b"first"),
        Placed::file("THREE",0x40,b"third")
    ]);
    let img = tmp.path().join("short.ads");
    std::fs::write(&img,&dat[0..0x1000])?;
    let mut cmd = Command::cargo_bin("tape2disc")?;
    cmd.arg("adf2inf").arg(&img).arg(tmp.path().join("out")).arg("-g").arg("s")
        .assert()
        .success()
        .stdout(predicate::str::contains("failed  $.THREE"));
    Ok(())
}

#[test]
fn all_files_fail() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let dat = common::s_image(&[Placed::file("THREE",0x40,b"third")]);
    let img = tmp.path().join("short.adf");
    std::fs::write(&img,&dat[0..0x1000])?;
    let mut cmd = Command::cargo_bin("tape2disc")?;
    cmd.arg("convert").arg(&img).arg(tmp.path().join("out"))
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn not_a_disc() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let img = tmp.path().join("blank.adf");
    std::fs::write(&img,vec![0;163840])?;
    let mut cmd = Command::cargo_bin("tape2disc")?;
    cmd.arg("adf2inf").arg(&img).arg(tmp.path().join("out"))
        .assert()
        .code(1);
    let mut cmd = Command::cargo_bin("tape2disc")?;
    cmd.arg("convert").arg(&img).arg(tmp.path().join("x.adf"))
        .assert()
        .failure();
    Ok(())
}

#[test]
fn chunk_edits() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let src = tmp.path().join("src");
    std::fs::create_dir(&src)?;
    std::fs::write(src.join("DATA"),vec![7;600])?;
    let tape = tmp.path().join("data.uef");
    Command::cargo_bin("tape2disc")?.arg("inf2uef").arg(&src).arg(&tape)
        .assert()
        .success();
    let silent = tmp.path().join("silent.uef");
    Command::cargo_bin("tape2disc")?.arg("uef-filter").arg(&tape).arg("--remove").arg("110").arg("-o").arg(&silent)
        .assert()
        .success();
    Command::cargo_bin("tape2disc")?.arg("uef-origin").arg(&silent).arg("-t").arg("edited")
        .assert()
        .success();
    let back = tape2disc::pipeline::read_uef(&silent)?;
    assert_eq!(back.origin(),Some("edited".to_string()));
    assert!(back.chunks.iter().all(|c| c.id() != 0x0110));
    let both = tmp.path().join("both.uef");
    Command::cargo_bin("tape2disc")?.arg("uef-merge").arg(&tape).arg(&silent).arg("-o").arg(&both)
        .assert()
        .success();
    let dst = tmp.path().join("dst");
    Command::cargo_bin("tape2disc")?.arg("uef2inf").arg(&both).arg(&dst)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 written"));
    assert!(dst.join("DATA-1").is_file());
    Ok(())
}

#[test]
fn completions() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tape2disc")?;
    cmd.arg("completions").arg("-s").arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("tape2disc"));
    Ok(())
}

#[test]
fn merge_old_and_new_tapes() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let old = tmp.path().join("old.uef");
    std::fs::write(&old,common::old_explicit_tape(&common::record("OLDFILE",b"from 1990")).to_bytes()?)?;
    let src = tmp.path().join("src");
    std::fs::create_dir(&src)?;
    std::fs::write(src.join("NEWFILE"),b"0123456789")?;
    let new = tmp.path().join("new.uef");
    Command::cargo_bin("tape2disc")?.arg("inf2uef").arg(&src).arg(&new)
        .assert()
        .success();
    let both = tmp.path().join("both.uef");
    Command::cargo_bin("tape2disc")?.arg("uef-merge").arg(&old).arg(&new).arg("-o").arg(&both)
        .assert()
        .success();
    let dst = tmp.path().join("dst");
    Command::cargo_bin("tape2disc")?.arg("uef2inf").arg(&both).arg(&dst)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 written, 0 failed"));
    assert_eq!(std::fs::read(dst.join("OLDFILE"))?,b"from 1990");
    Ok(())
}

#[test]
fn disc_dir_and_filetypes() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let img = tmp.path().join("disc.adf");
    std::fs::write(&img,common::d_image(&[Placed::file("LOADER",12,b"CHAIN\"GAME\"")]))?;
    let out = tmp.path().join("out");
    Command::cargo_bin("tape2disc")?.arg("adf2inf").arg(&img).arg(&out).arg("-d")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 written, 0 failed"));
    assert!(out.join("Test disc").join("LOADER.inf").is_file());
    let typed = tmp.path().join("typed");
    Command::cargo_bin("tape2disc")?.arg("adf2inf").arg(&img).arg(&typed).arg("-t").arg("-s").arg("_")
        .assert()
        .success();
    assert_eq!(std::fs::read(typed.join("LOADER_f19"))?,b"CHAIN\"GAME\"");
    assert!(!typed.join("LOADER_f19.inf").exists());
    Command::cargo_bin("tape2disc")?.arg("adf2inf").arg(&img).arg(&typed).arg("-s").arg("_")
        .assert()
        .failure();
    Ok(())
}
