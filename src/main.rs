use mathmemo::{actions, app, clipboard, config, event, logging, render, ui};

use anyhow::{Context, Result};
use app::AppState;
use clap::Parser;
use clipboard::SystemClipboard;
use config::{load_config, CliArgs};
use log::{error, info};
use logging::LogSink;
use render::{MathJaxVersion, WebViewChannel};
use std::sync::mpsc;
use std::time::Instant;

fn main() -> Result<()> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // The child process that hosts the webview.
    if let Some(ref server) = args.render_host {
        logging::init_logger(LogSink::Stderr);
        let version = match args.mathjax_version.as_deref() {
            Some(version) => version.parse::<MathJaxVersion>().map_err(anyhow::Error::msg)?,
            None => MathJaxVersion::default(),
        };
        let url = args
            .mathjax_url
            .clone()
            .unwrap_or_else(|| version.default_url().to_string());
        render::host::run(server, version, &url)?;
        return Ok(());
    }

    // Load configuration
    let config = load_config(&args)?;

    if args.debug_config {
        println!("Configuration:");
        println!("{:#?}", config);
        return Ok(());
    }

    let log_sink = logging::default_log_path().map_or(LogSink::Stderr, LogSink::File);
    logging::init_logger(log_sink);
    info!("Starting mathmemo (MathJax {})", config.main.mathjax_version);

    let (events_tx, events_rx) = mpsc::channel();
    let channel = WebViewChannel::launch(
        config.main.mathjax_version,
        &config.main.mathjax_url,
        events_tx,
    )
    .context("starting the render host")?;

    // Create application state
    let mut app = AppState::new(
        config,
        Box::new(channel),
        events_rx,
        Box::new(SystemClipboard::new()),
    );

    // Load file if provided
    if let Some(ref filename) = args.filename {
        if filename.exists() {
            actions::open(&mut app, filename)?;
        } else {
            app.filename = Some(filename.clone());
            app.set_message(format!("New file {}", filename.display()));
        }
    }

    // Setup terminal
    let mut terminal = ui::setup_terminal()?;

    // Run the main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    ui::restore_terminal(&mut terminal)?;

    // Handle any errors from the main loop
    if let Err(err) = res {
        error!("Main loop failed: {:#}", err);
        eprintln!("Error: {}", err);
    }

    info!("Exiting, {} temporary exports removed", app.temp_files.len());
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut ratatui::Terminal<B>,
    app: &mut AppState,
) -> Result<()> {
    while app.running {
        // Draw the UI
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if let Some(action) = event::handle_events(app)? {
            if let Err(err) = actions::execute_action(action, app) {
                error!("Action failed: {:#}", err);
                app.set_message(format!("Error: {}", err));
            }
        }

        // Render results arriving in the background
        app.pump(Instant::now());
    }

    Ok(())
}
