use clap::Parser;

fn main() -> anyhow::Result<()> {
    vbaexport::init();

    let cli = vbaexport::cli::Cli::parse();
    vbaexport::cli::execute(cli)
}
