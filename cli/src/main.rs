use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use clap::Subcommand;
use client::InsideOutClient;
use iodj_core::AppConfig;
use store::FileStore;
use tracing_subscriber::EnvFilter;

mod client;
mod store;

#[derive(Parser, Debug)]
#[clap(author, version, about = "InsideOutDJ: diary playlists from the terminal", long_about = None)]
struct TopLevel {
    #[clap(long, env = "IODJ_BACKEND_URL", value_parser)]
    /// InsideOutDJ backend address
    backend_url: Option<String>,

    #[clap(long, value_parser)]
    /// Where the session token is kept
    token_file: Option<PathBuf>,

    #[clap(subcommand)]
    command: Subcommands,
}

#[derive(Subcommand, Debug)]
enum Subcommands {
    /// Print the address to open for logging in
    Login,

    /// Store the token from the address the browser was redirected to
    Callback {
        #[clap(short, long, value_parser)]
        url: String,
    },

    Logout,

    /// Show the logged in user, registering them with the backend if needed
    Whoami,

    /// Turn a diary entry into a playlist
    Diary {
        #[clap(short, long, value_parser)]
        title: String,

        #[clap(long, value_parser, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        #[clap(short, long, value_parser)]
        /// read the diary from a file
        file: Option<PathBuf>,
    },

    /// List saved diary playlists
    Playlists,

    /// Create a playlist from track uris
    Create {
        #[clap(short, long, value_parser)]
        title: String,

        #[clap(long = "track", value_parser, required = true)]
        /// spotify:track:... uri, may be repeated
        tracks: Vec<String>,
    },

    /// Start a playlist on a device
    Play {
        #[clap(short, long, value_parser)]
        playlist: String,

        #[clap(short, long, value_parser)]
        device: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = TopLevel::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(backend_url) = args.backend_url {
        config.backend_url = backend_url;
    }
    let store = FileStore::new(args.token_file.unwrap_or_else(FileStore::default_path));
    let mut client = InsideOutClient::new(config, store)?;

    match args.command {
        Subcommands::Login => {
            println!("Open this address and log in to Spotify:");
            println!("{}", client.login_url()?);
            println!("Then run `iodj callback --url <address you were sent back to>`.");
        }
        Subcommands::Callback { url } => {
            client.accept_redirect(&url)?;
            println!("Logged in.");
        }
        Subcommands::Logout => {
            client.logout()?;
            println!("Logged out.");
        }
        Subcommands::Whoami => {
            let (profile, user) = client.whoami().await?;
            println!(
                "{} <{}>",
                profile.display_name.as_deref().unwrap_or(&profile.id),
                profile.email.as_deref().unwrap_or("no email")
            );
            println!("backend user: {}", user.id);
        }
        Subcommands::Diary { title, text, file } => {
            let diary = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("reading diary from {}", path.display()))?,
                (None, None) => anyhow::bail!("a diary needs --text or --file"),
            };
            let generated = client.write_diary(&title, &diary).await?;
            let coordinate = generated.emotion_analysis.normalized_emotion;
            println!("--- {} ---", generated.playlist_name);
            println!("Id:      {}", generated.playlist_id);
            println!(
                "Emotion: {} ({:.2}, {:.2}) [{}]",
                generated.emotion(),
                coordinate.x,
                coordinate.y,
                generated.palette().name()
            );
        }
        Subcommands::Playlists => {
            let playlists = client.saved_playlists().await?;
            if playlists.is_empty() {
                println!("no saved playlists");
            }
            for playlist in playlists {
                println!("- {} [{}]", playlist.name, playlist.id);
                println!("    Diary:   {}", playlist.diary_text);
                println!(
                    "    Emotion: {} [{}]",
                    playlist.emotion(),
                    playlist.palette().name()
                );
            }
        }
        Subcommands::Create { title, tracks } => {
            let playlist = client.create_playlist(&title, &tracks).await?;
            println!("--- {} ---", playlist.name);
            println!("Id:     {}", playlist.id);
            println!("Tracks: {}", playlist.tracks.items.len());
        }
        Subcommands::Play { playlist, device } => {
            client.play(&playlist, &device).await?;
            println!("Playing.");
        }
    }

    Ok(())
}
