use clap::Parser;
use nbsite::{Args, build_site};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    // --verbose forces INFO, otherwise RUST_LOG decides
    let filter = if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.into_options().and_then(|options| build_site(&options)) {
        Ok(summary) => println!(
            "[OK] Site generated at {} • notebooks converted: {}",
            summary.out.display(),
            summary.nb_count
        ),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
