use mimalloc::MiMalloc;

use kwclass::{cli::CLI, driver};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() {
    let result = match CLI::parse() {
        CLI::Classify(args) => driver::classify_main(&args),
        CLI::Scan(args) => driver::scan_main(&args),
        CLI::Verify(args) => driver::verify_main(&args),
        CLI::Dump(args) => driver::dump_main(&args),
        CLI::Bench(args) => driver::bench_main(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
