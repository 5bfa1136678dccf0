use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};
use tracing::info;
use yt2mp3_cli::prompt;
use yt2mp3_cli::session::{self, Session};

/// Download YouTube or SoundCloud audio as a tagged MP3.
#[derive(Debug, Parser)]
#[command(name = "yt2mp3", version)]
#[command(group(ArgGroup::new("source").required(true).args(["url", "query"])))]
struct Args {
    /// YouTube or SoundCloud URL
    #[arg(short, long)]
    url: Option<String>,

    /// Search YouTube and pick a result
    #[arg(short, long)]
    query: Option<String>,

    /// Title for the file and tags; skips the title prompt
    #[arg(short, long)]
    title: Option<String>,

    /// Config file (default: ~/.config/yt2mp3/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    session::finish(run(Args::parse()).await)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let session = Session::start(args.config.as_deref())?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    let url = match (args.url, args.query) {
        (Some(url), _) => url,
        (None, Some(query)) => {
            info!("searching for {:?}", query);
            let results = session.search(&query).await?;
            if results.is_empty() {
                writeln!(stdout, "No results found.")?;
                return Ok(());
            }
            prompt::choose_result(&mut input, &mut stdout, &results)?
                .url
                .clone()
        }
        (None, None) => anyhow::bail!("Please provide either --url/-u or --query/-q."),
    };

    let title = match args.title {
        Some(title) => prompt::normalize_title(&title),
        None => prompt::ask_title(&mut input, &mut stdout)?,
    };

    session.download(&mut stdout, &url, title).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_and_query_are_exclusive() {
        assert!(Args::try_parse_from(["yt2mp3", "-u", "https://youtu.be/a", "-q", "song"]).is_err());
        assert!(Args::try_parse_from(["yt2mp3"]).is_err());
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from(["yt2mp3", "-q", "some song", "-t", "Name"]).unwrap();
        assert_eq!(args.query.as_deref(), Some("some song"));
        assert_eq!(args.title.as_deref(), Some("Name"));
        assert!(args.url.is_none());
    }
}
