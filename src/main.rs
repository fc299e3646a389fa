use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = tempmail::cli::Cli::parse();
    tempmail::logging::init(cli.verbose);

    if let Err(err) = tempmail::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
