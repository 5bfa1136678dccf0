//! Non-interactive entry point: `yt2mp3-get URL [--title T]`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use yt2mp3_cli::prompt;
use yt2mp3_cli::session::{self, Session};

#[derive(Debug, Parser)]
#[command(name = "yt2mp3-get", version, about = "Download one URL as a tagged MP3")]
struct Args {
    /// YouTube or SoundCloud URL
    url: String,

    /// Title for the file and tags (default: fetched title)
    #[arg(short, long)]
    title: Option<String>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    session::finish(run(args).await)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let session = Session::start(args.config.as_deref())?;
    let title = args.title.as_deref().and_then(prompt::normalize_title);
    session
        .download(&mut std::io::stdout(), &args.url, title)
        .await?;
    Ok(())
}
