use std::{error::Error, io, path::PathBuf, process, sync::Arc};

use clap::{Parser, Subcommand};
use log::info;
use roosty_alarm::{
    clock::SystemClock,
    config::Config,
    report::{is_valid_time_format, ConsoleReporter},
    Scheduler,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Option<Command>,
    /// config file to use instead of the default one
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// strftime format for the times in reports
    #[clap(long, short)]
    time_format: Option<String>,
    /// don't print the `alarm> ` prompt
    #[clap(long)]
    no_prompt: bool,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("roosty_alarm")?;

    let args = Args::parse();
    let path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    if let Some(Command::Init { force }) = args.command {
        if force || !path.exists() {
            Config::new().save(&path)?;
            println!("wrote {}", path.display());
        } else {
            println!("{} already exists, use --force to overwrite it", path.display());
        }
        return Ok(());
    }

    let mut config = Config::load(&path)?;
    if let Some(time_format) = args.time_format {
        if !is_valid_time_format(&time_format) {
            eprintln!("`{time_format}` is not a valid time format");
            process::exit(2);
        }
        config.time_format = time_format;
    }
    if args.no_prompt {
        config.prompt = false;
    }
    info!("starting with {config:?}");

    let reporter = ConsoleReporter::new(
        config.time_format.clone(),
        config.prompt.then(|| "alarm> ".to_string()),
    );
    let scheduler = Scheduler::new(
        config.dispatcher(),
        Arc::new(SystemClock),
        Arc::new(reporter),
    )
    .abort_on_fatal();

    match scheduler.run(io::stdin().lock()) {
        Ok(summary) => {
            info!("finished: {summary:?}");
            Ok(())
        }
        Err(e) => roosty_alarm::error::abort(&e),
    }
}
