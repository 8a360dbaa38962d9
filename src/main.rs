use bounce::cli::{print_file_types, print_version, Options};
use bounce::{logging, prepare, ExitCode, PROGRAM_NAME};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::{error, info};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    // Zero arguments is equivalent to asking for help.
    if std::env::args().len() <= 1 {
        let mut command = Options::command();
        let _ = command.print_help();
        return ExitCode::NotRun.code();
    }

    let options = match Options::try_parse() {
        Ok(options) => options,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::NotRun.code();
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::InvalidArgument.code();
        }
    };

    if options.version {
        print_version();
        return ExitCode::NotRun.code();
    }
    if options.list_file_types {
        print_file_types();
        return ExitCode::NotRun.code();
    }

    logging::init(&options);
    info!(
        "{} version {} initialized",
        PROGRAM_NAME,
        env!("CARGO_PKG_VERSION")
    );

    match prepare(&options.to_run_config()).and_then(|engine| engine.run()) {
        Ok(_) => {
            info!("Goodbye!");
            ExitCode::Success.code()
        }
        Err(e) => {
            error!("{}", e);
            e.exit_code().code()
        }
    }
}
