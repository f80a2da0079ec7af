use std::path::PathBuf;

use clap::Parser;
use color_print::{cformat, cprintln};
use sixasm::{OutFmt, Project, SectionFlags, Sections};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Project file
    #[clap(default_value = "main.yaml")]
    input: PathBuf,

    /// Output file
    #[clap(short, long, default_value = "main.bin")]
    output: PathBuf,

    /// Output format, overrides the project file
    #[clap(short, long, value_enum)]
    format: Option<OutFmt>,

    /// Write a listing of the final pass
    #[clap(short, long)]
    listing: Option<PathBuf>,

    /// Dump the section map and disassembly
    #[clap(short, long)]
    dump: bool,

    /// More log output (-v, -vv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&args) {
        e.print_diag();
        std::process::exit(1);
    }
}

fn run(args: &Args) -> sixasm::Result<()> {
    cprintln!("<s>1. Read project</> {}", args.input.display());
    let project = Project::load(&args.input)?;

    cprintln!("<s>2. Assemble</>");
    let sections = sixasm::assemble(&project, args.listing.is_some())?;

    let format = args.format.unwrap_or(project.format);
    cprintln!("<s>3. Write</> {} ({:?})", args.output.display(), format);
    sections.write(&args.output, format)?;

    if let (Some(path), Some(text)) = (&args.listing, sections.listing()) {
        std::fs::write(path, text)
            .map_err(|e| sixasm::Error::FileWrite(path.display().to_string(), e))?;
    }

    if args.dump {
        dump(&sections);
    }
    Ok(())
}

fn dump(sections: &Sections) {
    println!("-------------------+-----------------------------------------------------");
    for s in sections.iter().filter(|s| s.valid) {
        let kind = if s.flags.contains(SectionFlags::NO_STORAGE) {
            "bss"
        } else if s.flags.contains(SectionFlags::WRITE_TO_DISK) {
            "file"
        } else if s.children.is_empty() {
            "data"
        } else {
            "group"
        };
        let size = if s.is_leaf() { s.len() as i32 } else { s.size };
        println!(
            "{}",
            cformat!(
                "<c>{:06X}</> <y>{:>6}</> {:<5} <s>{}</>",
                s.start,
                size,
                kind,
                s.name
            )
        );
    }
    for s in sections.iter().filter(|s| s.is_leaf()) {
        if s.flags.contains(SectionFlags::NO_STORAGE) {
            continue;
        }
        println!("-------------------+-----------------------------------------------------");
        cprintln!("<s>{}</>", s.name);
        for line in arch::disasm::disassemble(&s.data, s.start as u16) {
            println!("{}", line.cformat());
        }
    }
    println!("-------------------+-----------------------------------------------------");
}
