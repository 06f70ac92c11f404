use std::io::{BufReader, IsTerminal};

use clap::Parser;

use crate::{
    cli::Cli,
    console::Console,
    eutils::pubmed::PubMed,
    sink::{FixedPath, SavePrompt, TerminalDialog},
};

mod cli;
mod console;
mod eutils;
mod extract;
mod logging;
mod markup;
mod pipeline;
mod record;
mod sink;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let stdout = std::io::stdout();
    let color = stdout.is_terminal() && std::env::var_os("NO_COLOR").is_none();
    let mut console = Console::new(stdout.lock(), color, std::io::stderr().is_terminal());
    logging::init(args.verbose, console.active_bar())?;

    let source = PubMed::new(args.eutils_url.clone(), args.api_key.clone(), args.timeout());
    let mut prompt: Box<dyn SavePrompt> = match args.output.clone() {
        Some(dest) => Box::new(FixedPath::new(dest.into_path())),
        None => Box::new(TerminalDialog::default()),
    };

    // Not locked for the whole run: the save prompt reads the terminal too.
    let mut input = BufReader::new(std::io::stdin());
    pipeline::run(
        args.request(),
        &mut input,
        &mut console,
        &source,
        prompt.as_mut(),
    )?;
    Ok(())
}
