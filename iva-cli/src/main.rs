use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use iva_core::types::RecorderState;
use iva_engine::error::UploadError;
use iva_engine::{Registered, VoiceClient};
use iva_runtime::{
    ConfigStore, build_client_from_config, capture_device, list_microphones, playback_sink,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod command;
mod render;

use command::Command;

#[derive(Debug, Parser)]
#[command(name = "iva", about = "Terminal client for the IVA voice assistant")]
struct Args {
    /// Client config (JSON). Missing file means defaults.
    #[arg(long, default_value = "iva.json")]
    config: PathBuf,

    #[arg(long, env = "IVA_BACKEND_URL")]
    backend_url: Option<String>,

    /// WAV file to use as the microphone.
    #[arg(long)]
    clip: Option<PathBuf>,

    #[arg(long)]
    no_playback: bool,

    /// Write the effective config back to --config and exit.
    #[arg(long)]
    save_config: bool,

    /// Print input device names (values for `microphone_device`) and exit.
    #[arg(long)]
    list_mics: bool,
}

fn init_logging() {
    // RUST_LOG wins; logs go to stderr so the screen on stdout stays readable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn show(client: &VoiceClient) {
    print!("{}", render::format_view(&client.view()));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    if args.list_mics {
        for name in list_microphones()? {
            println!("{name}");
        }
        return Ok(());
    }

    let store = ConfigStore::at_path(&args.config);
    let mut cfg = store.load_or_default()?;
    if let Some(url) = args.backend_url {
        cfg.backend_url = url;
    }
    if args.no_playback {
        cfg.playback_enabled = false;
    }
    cfg.validate()?;

    if args.save_config {
        store.save(&cfg)?;
        println!("saved {}", store.path().display());
        return Ok(());
    }

    let device = capture_device(&cfg, args.clip.as_deref())?;
    let client = build_client_from_config(&cfg, device, playback_sink())?;
    tracing::info!(backend = %cfg.backend_url, "iva client ready");

    show(&client);
    println!("{}", command::help(client.current_view()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cmd = match command::parse(&line, client.current_view()) {
            Ok(cmd) => cmd,
            Err(usage) => {
                println!("{usage}");
                continue;
            }
        };
        if cmd == Command::Quit {
            break;
        }
        dispatch(&client, cmd).await;
        show(&client);
    }

    client.logout();
    Ok(())
}

async fn dispatch(client: &VoiceClient, cmd: Command) {
    match cmd {
        Command::Login { email, password } => {
            if let Err(e) = client.login(email, password).await {
                println!("! {}", e.user_message());
            }
        }
        Command::Register(reg) => match client.register(reg).await {
            Ok(Registered::ShowingLogin) => println!("{}", iva_core::text::REGISTRATION_SUCCEEDED),
            Ok(Registered::AlreadySignedIn) => println!("account created; still signed in"),
            Err(e) => println!("! {}", e.user_message()),
        },
        Command::ShowRegister => {
            client.show_register();
        }
        Command::ShowLogin => {
            client.show_login();
        }
        Command::ToggleRecording => toggle_recording(client).await,
        Command::Say(text) => {
            // Replies land in the log; the screen is redrawn when they do.
            let client = client.clone();
            tokio::spawn(async move {
                match client.send_text(&text).await {
                    Err(e) if !lands_in_log(&e) => println!("! {}", e.user_message()),
                    _ => {}
                }
                show(&client);
            });
        }
        Command::Health => match client.health(Duration::from_secs(5)).await {
            Ok(true) => println!("backend is healthy"),
            Ok(false) => println!("backend reports a problem"),
            Err(e) => println!("! {e}"),
        },
        Command::Logout => client.logout(),
        Command::Help => println!("{}", command::help(client.current_view())),
        Command::Quit => {}
    }
}

// These failures already put "Message failed." in the conversation, or belong
// to a session that is gone.
fn lands_in_log(e: &UploadError) -> bool {
    matches!(
        e,
        UploadError::Stale | UploadError::Rejected { .. } | UploadError::Network(_)
    )
}

async fn toggle_recording(client: &VoiceClient) {
    match client.recorder_state() {
        RecorderState::Idle => {
            if let Err(e) = client.start_recording().await {
                println!("! {}", e.user_message());
            }
        }
        RecorderState::Capturing => {
            let client = client.clone();
            tokio::spawn(async move {
                if client.stop_recording().await.is_some() {
                    show(&client);
                }
            });
        }
        RecorderState::Finalizing => println!("still finishing the last recording"),
    }
}
