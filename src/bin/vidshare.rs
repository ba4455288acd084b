use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use vidshare::file_picker::{DialogFilePicker, FilePicker, LocalFile};
use vidshare::remote::{HttpRemoteService, RemoteService};
use vidshare::upload::{UploadCoordinator, UploadError, UploadProgress};
use vidshare::{CatalogStore, Config};

fn print_usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} list", program);
    eprintln!("  {} show <video-id>", program);
    eprintln!("  {} url <video-id>", program);
    eprintln!("  {} delete <video-id>", program);
    eprintln!("  {} upload --title <title> [--file <path>]", program);
    eprintln!();
    eprintln!("Without --file, upload opens a file dialog.");
    eprintln!("The API base URL comes from VIDSHARE_API_BASE_URL.");
}

enum Command {
    List,
    Show(String),
    Url(String),
    Delete(String),
    Upload {
        title: String,
        file: Option<PathBuf>,
    },
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let command = args.get(1).ok_or("Missing command")?;

    let id_arg = || {
        args.get(2)
            .cloned()
            .ok_or_else(|| format!("{} requires a video id", command))
    };

    match command.as_str() {
        "list" => Ok(Command::List),
        "show" => Ok(Command::Show(id_arg()?)),
        "url" => Ok(Command::Url(id_arg()?)),
        "delete" => Ok(Command::Delete(id_arg()?)),
        "upload" => {
            let mut title = None;
            let mut file = None;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--title" => {
                        title = Some(args.get(i + 1).ok_or("--title requires a value")?.clone());
                        i += 2;
                    }
                    "--file" => {
                        file = Some(PathBuf::from(
                            args.get(i + 1).ok_or("--file requires a path")?,
                        ));
                        i += 2;
                    }
                    other => return Err(format!("Unknown argument: {}", other)),
                }
            }

            Ok(Command::Upload {
                title: title.unwrap_or_default(),
                file,
            })
        }
        other => Err(format!("Unknown command: {}", other)),
    }
}

#[tokio::main]
async fn main() {
    // Use RUST_LOG env var if set, otherwise default to info level
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("vidshare");

    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            error!("{}", e);
            print_usage(program);
            std::process::exit(2);
        }
    };

    let config = Config::load();
    info!("Using API at {}", config.api_base_url);

    let remote: Arc<dyn RemoteService> = match HttpRemoteService::from_config(&config) {
        Ok(remote) => Arc::new(remote),
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(command, remote).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command, remote: Arc<dyn RemoteService>) -> Result<(), String> {
    let catalog = CatalogStore::new(remote.clone());

    match command {
        Command::List => {
            catalog.refresh().await.map_err(|e| e.to_string())?;
            for video in catalog.videos().await {
                println!(
                    "{}\t{}\t{}",
                    video.id,
                    video.duration.as_deref().unwrap_or("-"),
                    video.title
                );
            }
        }
        Command::Show(id) => {
            let video = catalog.get(&id).await.map_err(|e| e.to_string())?;
            let json = serde_json::to_string_pretty(&video).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
        Command::Url(id) => {
            let url = catalog.playback_url(&id).await.map_err(|e| e.to_string())?;
            println!("{}", url);
        }
        Command::Delete(id) => {
            catalog.delete(&id).await.map_err(|e| e.to_string())?;
            println!("Deleted {}", id);
        }
        Command::Upload { title, file } => {
            let file = match file {
                Some(path) => Some(LocalFile::from_path(path)),
                None => DialogFilePicker::new().pick_video().await.into_file(),
            };
            let Some(file) = file else {
                info!("No file selected, nothing to upload");
                return Ok(());
            };

            let coordinator = UploadCoordinator::new(remote, tokio::runtime::Handle::current());
            let mut progress_rx = coordinator.subscribe_progress();
            let printer = tokio::spawn(async move {
                while let Some(progress) = progress_rx.recv().await {
                    match &progress {
                        UploadProgress::PhaseChanged { phase, percent, .. } => {
                            println!("{:>3}% {:?}", percent, phase)
                        }
                        UploadProgress::Complete { .. } | UploadProgress::Failed { .. } => break,
                        UploadProgress::Started { title, .. } => {
                            println!("Uploading {:?}", title)
                        }
                    }
                }
            });

            let result = coordinator
                .submit_and_refresh(&catalog, Some(file), &title)
                .await;
            match &result {
                // Rejected before any event was sent
                Err(UploadError::Validation(_)) => printer.abort(),
                _ => {
                    let _ = printer.await;
                }
            }

            let outcome = result.map_err(|e| e.to_string())?;
            println!("Uploaded {:?} as {}", outcome.title, outcome.storage_key);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_upload_args() {
        match parse_args(&args(&["vidshare", "upload", "--title", "Demo", "--file", "a.mp4"])) {
            Ok(Command::Upload { title, file }) => {
                assert_eq!(title, "Demo");
                assert_eq!(file, Some(PathBuf::from("a.mp4")));
            }
            _ => panic!("Expected upload command"),
        }
    }

    #[test]
    fn test_parse_rejects_missing_id() {
        assert!(parse_args(&args(&["vidshare", "delete"])).is_err());
        assert!(parse_args(&args(&["vidshare"])).is_err());
    }
}
