use clap::Parser;
use mem_sim::config::Config;
use mem_sim::run_simulation;
use std::process::ExitCode;

fn init_logger(config: &Config) {
    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let config = Config::parse();
    init_logger(&config);
    match run_simulation(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}
