use clap;
use std::path::Path;
use std::str::FromStr;
use log::warn;
use crate::pipeline::{self,SourceFormat,TargetFormat,ConvertOptions,Report};
use crate::img::DiscGeometry;
use crate::uef::Version;
use super::{CommandError,RCH};
use crate::STDRESULT;

/// Gather whatever options this subcommand defines, the rest keep their defaults
fn options(cmd: &clap::ArgMatches) -> Result<ConvertOptions,crate::DYNERR> {
    let mut opt = ConvertOptions::default();
    let has = |id: &str| cmd.try_contains_id(id).unwrap_or(false);
    if has("geometry") {
        if let Some(g) = cmd.get_one::<String>("geometry") {
            opt.adfs.geometry = Some(DiscGeometry::from_str(g)?);
        }
    }
    if has("verify-crc") {
        opt.uef_read.verify_crc = cmd.get_flag("verify-crc");
    }
    if has("stem") {
        opt.uef_read.noname_stem = cmd.get_one::<String>("stem").expect(RCH).to_string();
    }
    if has("compress") {
        opt.uef_write.compress = cmd.get_flag("compress");
    }
    if has("uef-version") {
        if let Some(v) = cmd.get_one::<String>("uef-version") {
            opt.uef_write.version = Version::from_str(v)?;
        }
    }
    if has("origin") {
        if let Some(o) = cmd.get_one::<String>("origin") {
            opt.uef_write.origin = o.to_string();
        }
    }
    if has("machine") {
        if let Some(m) = cmd.get_one::<u8>("machine") {
            opt.uef_write.target_machine = *m;
        }
    }
    if has("no-index") {
        opt.host.index = !cmd.get_flag("no-index");
    }
    if has("filetypes") && cmd.get_flag("filetypes") {
        opt.host.filetypes = Some(cmd.get_one::<String>("separator").expect(RCH).to_string());
    }
    if has("disc-dir") {
        opt.disc_dir = cmd.get_flag("disc-dir");
    }
    Ok(opt)
}

fn print_report(cmd: &clap::ArgMatches,report: &Report) -> STDRESULT {
    match cmd.get_flag("json") {
        true => println!("{}",report.to_json(cmd.get_one::<u16>("indent").copied())),
        false => println!("{}",report)
    }
    if report.exit_code() != 0 {
        return Err(Box::new(CommandError::NoFilesConverted));
    }
    if !report.is_success() {
        warn!("{} of {} files failed",report.failures.len(),report.failures.len() + report.successes.len());
    }
    Ok(())
}

/// Run a conversion between fixed formats
pub fn convert(cmd: &clap::ArgMatches,sfmt: SourceFormat,tfmt: TargetFormat) -> STDRESULT {
    let source = Path::new(cmd.get_one::<String>("source").expect(RCH));
    let target = Path::new(cmd.get_one::<String>("target").expect(RCH));
    let opt = options(cmd)?;
    let report = pipeline::convert(source,sfmt,target,tfmt,&opt)?;
    print_report(cmd,&report)
}

/// Run a conversion with formats taken from the paths, or from `--from`
pub fn convert_any(cmd: &clap::ArgMatches) -> STDRESULT {
    let source = Path::new(cmd.get_one::<String>("source").expect(RCH));
    let target = Path::new(cmd.get_one::<String>("target").expect(RCH));
    let sfmt = match cmd.get_one::<String>("from") {
        Some(f) => SourceFormat::from_str(f)?,
        None => SourceFormat::from_path(source)?
    };
    let tfmt = TargetFormat::from_path(target);
    let opt = options(cmd)?;
    let report = pipeline::convert(source,sfmt,target,tfmt,&opt)?;
    print_report(cmd,&report)
}
