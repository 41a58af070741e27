use clap;
use std::path::Path;
use log::info;
use crate::pipeline::{read_uef,write_uef};
use crate::uef::edit;
use super::RCH;
use crate::STDRESULT;

pub fn merge(cmd: &clap::ArgMatches) -> STDRESULT {
    let sources: Vec<&String> = cmd.get_many::<String>("sources").expect(RCH).collect();
    let out = Path::new(cmd.get_one::<String>("output").expect(RCH));
    let mut ans = read_uef(Path::new(sources[0]))?;
    for src in &sources[1..] {
        let next = read_uef(Path::new(src))?;
        info!("appending {} chunks from {}",next.chunks.len(),src);
        let version = ans.version.max(next.version);
        ans.chunks = edit::merge(
            &edit::restamp(&ans.chunks,ans.version,version),
            &edit::restamp(&next.chunks,next.version,version)
        );
        ans.version = version;
    }
    ans.compressed = cmd.get_flag("compress");
    write_uef(out,&ans)
}

pub fn filter(cmd: &clap::ArgMatches) -> STDRESULT {
    let src = Path::new(cmd.get_one::<String>("source").expect(RCH));
    let out = Path::new(cmd.get_one::<String>("output").expect(RCH));
    let mut uef = read_uef(src)?;
    let before = uef.chunks.len();
    uef.chunks = match (cmd.get_one::<String>("remove"),cmd.get_one::<String>("keep")) {
        (Some(list),_) => {
            let ids = edit::parse_ids(list)?;
            edit::remove(&uef.chunks,|c| ids.contains(&c.id()))
        },
        (None,Some(list)) => {
            let ids = edit::parse_ids(list)?;
            edit::keep(&uef.chunks,|c| ids.contains(&c.id()))
        },
        (None,None) => panic!("{}",RCH)
    };
    info!("{} of {} chunks remain",uef.chunks.len(),before);
    write_uef(out,&uef)
}

pub fn origin(cmd: &clap::ArgMatches) -> STDRESULT {
    let src = Path::new(cmd.get_one::<String>("source").expect(RCH));
    let out = match cmd.get_one::<String>("output") {
        Some(o) => Path::new(o),
        None => src
    };
    let text = cmd.get_one::<String>("text").expect(RCH);
    let mut uef = read_uef(src)?;
    uef.chunks = edit::set_origin(&uef.chunks,text);
    write_uef(out,&uef)
}
