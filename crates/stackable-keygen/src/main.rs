use clap::Parser;
use snafu::{ResultExt, Snafu};
use stackable_keygen::{
    cli::{self, Cli, KeygenOptions, normalize_args},
    logging::{LOG_ENV_VAR, initialize_logging},
};

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("invalid command line options"))]
    Options { source: cli::Error },

    #[snafu(display("failed to generate key pair"))]
    Generate { source: stackable_keygen::Error },
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    initialize_logging(LOG_ENV_VAR);

    let options = KeygenOptions::try_from(cli).context(OptionsSnafu)?;
    stackable_keygen::run(&options).context(GenerateSnafu)
}
