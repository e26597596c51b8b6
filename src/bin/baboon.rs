use baboon::cmdline;
use baboon::config::Config;
use std::process;

fn main() {
    pretty_env_logger::init();
    let config = Config::from_env();
    let args = std::env::args().collect();

    if let Err(e) = cmdline::launch(args, &config) {
        eprintln!("{}", cmdline::paint_error(&e.to_string(), config.color_enabled()));
        process::exit(e.exit_code());
    }
}
