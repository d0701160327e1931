use clap::Parser;
use wikiedits::cli::Config;

fn main() {
    let config = Config::parse();
    wikiedits::cli::run(config)
}
