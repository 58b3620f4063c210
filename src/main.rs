mod cache;
mod fetch;
mod pipeline;
mod redirect;
mod render;
mod scrape;
mod settings;
mod structs;

use log::{info, warn};
use settings::Settings;
use std::error::Error;
use std::path::Path;
use std::process::Command;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load()?;
    let index = pipeline::run(&settings).await?;
    info!("Site written to {}", index.display());

    if settings.open_browser {
        if let Err(e) = open_in_browser(&index) {
            warn!("Could not open {}: {e}", index.display());
        }
    }
    Ok(())
}

fn open_in_browser(path: &Path) -> std::io::Result<()> {
    let path = path.canonicalize()?;

    #[cfg(target_os = "macos")]
    let mut cmd = Command::new("open");
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = Command::new("xdg-open");

    cmd.arg(path).spawn()?;
    Ok(())
}
