use clap_complete::shells;
use super::RCH;
use crate::STDRESULT;

pub fn generate(mut main_cmd: clap::Command,cmd: &clap::ArgMatches) -> STDRESULT {
    let name = "tape2disc";
    let mut out = std::io::stdout();
    match cmd.get_one::<String>("shell").expect(RCH).as_str() {
        "bash" => clap_complete::generate(shells::Bash,&mut main_cmd,name,&mut out),
        "elv" => clap_complete::generate(shells::Elvish,&mut main_cmd,name,&mut out),
        "fish" => clap_complete::generate(shells::Fish,&mut main_cmd,name,&mut out),
        "ps1" => clap_complete::generate(shells::PowerShell,&mut main_cmd,name,&mut out),
        "zsh" => clap_complete::generate(shells::Zsh,&mut main_cmd,name,&mut out),
        _ => panic!("{}",RCH)
    }
    Ok(())
}
