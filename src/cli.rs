use clap::{value_parser, crate_version, Arg, ArgAction, ArgGroup, Command, ValueHint};

const SRC_HELP: &str = "file or directory to convert";
const DST_HELP: &str = "UEF file or directory to create";
const GEOM_LONG_HELP: &str = "ADFS format of the image: S (160K), M (320K), L (640K),
D (800K old map), E (800K new map), F (1600K).
If omitted the smallest format whose free space map validates is used.";
const IDS_LONG_HELP: &str = "comma delimited list of chunk ids in hex, e.g. `100,110,0x112`";

fn src_arg(help: &'static str) -> Arg {
    Arg::new("source").help(help).value_name("SOURCE")
        .value_hint(ValueHint::AnyPath)
        .required(true)
}

fn dst_arg(help: &'static str) -> Arg {
    Arg::new("target").help(help).value_name("TARGET")
        .value_hint(ValueHint::AnyPath)
        .required(true)
}

fn out_arg(req: bool) -> Arg {
    Arg::new("output").short('o').long("output").help("path to the UEF to write")
        .value_name("PATH")
        .value_hint(ValueHint::FilePath)
        .required(req)
}

fn geometry_arg() -> Arg {
    Arg::new("geometry").short('g').long("geometry").help("ADFS disc format")
        .long_help(GEOM_LONG_HELP)
        .value_name("FORMAT")
        .value_parser(["S","M","L","D","E","F"])
        .ignore_case(true)
        .required(false)
}

fn compress_arg() -> Arg {
    Arg::new("compress").short('z').long("compress").help("wrap the UEF in gzip")
        .action(ArgAction::SetTrue)
}

fn version_arg() -> Arg {
    Arg::new("uef-version").long("uef-version").help("UEF version to write, e.g. 0.10")
        .value_name("VERSION")
        .required(false)
}

fn origin_arg() -> Arg {
    Arg::new("origin").long("origin").help("text of the origin chunk")
        .value_name("TEXT")
        .required(false)
}

fn machine_arg() -> Arg {
    Arg::new("machine").long("machine").help("target machine byte, 0 BBC Model A, 1 Electron, 2 BBC Model B")
        .value_name("CODE")
        .value_parser(value_parser!(u8).range(0..=6))
        .required(false)
}

fn crc_arg() -> Arg {
    Arg::new("verify-crc").long("verify-crc").help("files with a CRC error fail")
        .long_help("without this option a block with a bad CRC is kept and a warning is logged")
        .action(ArgAction::SetTrue)
}

fn stem_arg() -> Arg {
    Arg::new("stem").long("stem").help("base name for unnamed files")
        .value_name("NAME")
        .default_value("noname")
}

fn json_arg() -> Arg {
    Arg::new("json").long("json").help("print the report as JSON")
        .action(ArgAction::SetTrue)
}

fn indent_arg() -> Arg {
    Arg::new("indent").long("indent").help("JSON indentation, omit to minify")
        .value_name("SPACES")
        .value_parser(value_parser!(u16).range(0..16))
        .required(false)
}

fn no_index_arg() -> Arg {
    Arg::new("no-index").long("no-index").help("do not write index.txt")
        .action(ArgAction::SetTrue)
}

/// Add the options for naming files extracted from a disc
fn disc_writer(cmd: Command) -> Command {
    cmd.arg(Arg::new("filetypes").short('t').long("filetypes")
            .help("append RISC OS filetypes to names instead of writing .inf files")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("separator").short('s').long("separator").value_name("SEP")
            .help("put between a name and its filetype").default_value(",")
            .requires("filetypes"))
        .arg(Arg::new("disc-dir").short('d').long("disc-dir")
            .help("write into a directory named after the disc")
            .action(ArgAction::SetTrue))
}

/// Add the options that apply when writing a UEF
fn uef_writer(cmd: Command) -> Command {
    cmd.arg(compress_arg())
        .arg(version_arg())
        .arg(origin_arg())
        .arg(machine_arg())
}

/// Add the options that apply when reading tape files
fn tape_reader(cmd: Command) -> Command {
    cmd.arg(crc_arg())
        .arg(stem_arg())
}

fn report_args(cmd: Command) -> Command {
    cmd.arg(json_arg())
        .arg(indent_arg())
}

pub fn build_cli() -> Command {
    let long_help = "tape2disc is always invoked with exactly one of several subcommands.
Conversions read the whole source, then write every file that could be decoded.
Files that fail are listed in the report, they do not stop the conversion.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Examples:
---------
tape to files:         `tape2disc uef2inf games.uef games`
files to tape:         `tape2disc inf2uef games games.uef`
disc to files:         `tape2disc adf2inf -g L disc.adl disc`
typed files:           `tape2disc adf2inf -t -d disc.adf out`
join two tapes:        `tape2disc uef-merge side1.uef side2.uef -o both.uef`
strip disc chunks:     `tape2disc uef-filter tape.uef --remove 200,201 -o clean.uef`";

    let mut main_cmd = Command::new("tape2disc")
        .about("Converts Acorn tape and disc archives: UEF, ADFS images, T2 files, and INF sidecars.")
        .after_long_help(long_help)
        .version(crate_version!());

    main_cmd = main_cmd.subcommand(report_args(tape_reader(Command::new("uef2inf")
        .arg(src_arg("UEF file to read"))
        .arg(dst_arg("directory to write files into"))
        .arg(no_index_arg())
        .about("extract the files on a UEF tape"))));
    main_cmd = main_cmd.subcommand(report_args(uef_writer(Command::new("inf2uef")
        .arg(src_arg("directory of files with sidecars"))
        .arg(dst_arg("UEF file to create"))
        .about("put files on a UEF tape"))));
    main_cmd = main_cmd.subcommand(report_args(disc_writer(Command::new("adf2inf")
        .arg(src_arg("ADFS image to read"))
        .arg(dst_arg("directory to write files into"))
        .arg(geometry_arg())
        .arg(no_index_arg())
        .about("extract the files in an ADFS disc image"))));
    main_cmd = main_cmd.subcommand(report_args(uef_writer(Command::new("adf2uef")
        .arg(src_arg("ADFS image to read"))
        .arg(dst_arg("UEF file to create"))
        .arg(geometry_arg())
        .about("copy the files in an ADFS disc image to a UEF tape"))));
    main_cmd = main_cmd.subcommand(report_args(tape_reader(Command::new("t22inf")
        .arg(src_arg("T2 file to read"))
        .arg(dst_arg("directory to write files into"))
        .arg(no_index_arg())
        .about("extract the files in a Slogger T2 file"))));
    main_cmd = main_cmd.subcommand(report_args(uef_writer(tape_reader(Command::new("t22uef")
        .arg(src_arg("T2 file to read"))
        .arg(dst_arg("UEF file to create"))
        .about("copy the files in a Slogger T2 file to a UEF tape")))));
    main_cmd = main_cmd.subcommand(report_args(Command::new("convert")
        .arg(src_arg(SRC_HELP))
        .arg(dst_arg(DST_HELP))
        .arg(Arg::new("from").long("from").help("source format, otherwise inferred")
            .value_name("FORMAT")
            .value_parser(["uef","adf","t2","inf"]))
        .arg(geometry_arg())
        .arg(crc_arg())
        .arg(stem_arg())
        .arg(compress_arg())
        .arg(version_arg())
        .arg(origin_arg())
        .arg(machine_arg())
        .arg(no_index_arg())
        .about("convert, choosing formats from the paths")));
    main_cmd = main_cmd.subcommand(Command::new("uef-merge")
        .arg(Arg::new("sources").num_args(2..=1000).help("UEF files to join, in order").value_name("SOURCES")
            .value_hint(ValueHint::FilePath)
            .required(true))
        .arg(out_arg(true))
        .arg(compress_arg())
        .about("join UEF tapes end to end"));
    main_cmd = main_cmd.subcommand(Command::new("uef-filter")
        .arg(src_arg("UEF file to read"))
        .arg(out_arg(true))
        .arg(Arg::new("remove").long("remove").help("drop chunks with these ids")
            .long_help(IDS_LONG_HELP)
            .value_name("IDS"))
        .arg(Arg::new("keep").long("keep").help("keep only chunks with these ids")
            .long_help(IDS_LONG_HELP)
            .value_name("IDS"))
        .group(ArgGroup::new("filter").args(["remove","keep"]).required(true).multiple(false))
        .about("remove chunks from a UEF"));
    main_cmd = main_cmd.subcommand(Command::new("uef-origin")
        .arg(src_arg("UEF file to read"))
        .arg(Arg::new("text").short('t').long("text").help("new origin text").value_name("TEXT")
            .required(true))
        .arg(out_arg(false).help("path to the UEF to write, default is to replace the source"))
        .about("set the origin text of a UEF"));
    main_cmd = main_cmd.subcommand(Command::new("completions")
        .arg(Arg::new("shell").short('s').long("shell").help("shell type")
            .value_name("SHELL")
            .value_parser(["bash","elv","fish","ps1","zsh"])
            .required(true))
        .about("write shell completion script to stdout"));
    main_cmd
}
