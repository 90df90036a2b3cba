use anyhow::Result;

mod app;
mod client;
mod config;
mod error;
mod handler;
mod locale;
mod logging;
mod message;
mod tui;
mod ui;

use app::App;
use client::RagClient;
use config::{Settings, Source};
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    config::load_env_files();

    match logging::init() {
        Ok(path) => log::info!(
            "rag-chat v{} starting, logging to {}",
            env!("CARGO_PKG_VERSION"),
            path.display()
        ),
        Err(e) => eprintln!("warning: logging disabled: {:#}", e),
    }

    let settings = Settings::load();
    match (&settings.api_url, settings.api_url_source) {
        (Some(url), Some(Source::Env)) => log::info!("backend {} (from {})", url, config::API_URL_VAR),
        (Some(url), _) => log::info!("backend {} (from config file)", url),
        (None, _) => log::warn!("{} is not set; questions will fail until it is", config::API_URL_VAR),
    }

    let client = RagClient::new(settings.api_url.as_deref());
    let mut app = App::new(client, settings.locale);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    if let Err(e) = &result {
        log::error!("exiting with error: {:#}", e);
    }
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        // Wake up for terminal input, or as soon as the outstanding reply lands
        let next = tokio::select! {
            event = events.next() => Some(event),
            _ = app.await_reply(), if app.is_sending() => None,
        };

        match next {
            Some(Some(event)) => handler::handle_event(app, event),
            Some(None) => break,
            None => {}
        }
    }

    Ok(())
}
