use clap::Parser;

use lifetrace::cli::Args;

fn main() {
    let args = Args::parse();

    env_logger::Builder::new().filter_level(args.log_level()).parse_default_env().init();

    if let Err(err) = lifetrace::run(args) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
