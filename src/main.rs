use pswp::cli::{AppConfig, Args};
use pswp::config::UserConfig;
use pswp::controller::{DeleteOutcome, SyncReviewClient};
use pswp::domain::{Decision, TriageStatistics};
use pswp::logging::{default_log_dir, init_logging};
use pswp::source::{AssetSource, DirectorySource};
use pswp::tui::{
    handle_confirm_input, handle_key_event, render, render_confirm_delete_overlay,
    render_help_overlay, render_summary, render_welcome_overlay, KeyAction, PhotoCache,
    ViewState,
};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc, time::Duration};
use tracing::{info, warn};

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Load user configuration
    let user_config = UserConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load user config: {}", e);
        UserConfig::default()
    });

    let config = match AppConfig::resolve(&args, &user_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let log_dir = default_log_dir();
    let _log_guard = init_logging(&log_dir)
        .map_err(|e| {
            eprintln!(
                "Warning: Logging disabled, cannot write to {}: {}",
                log_dir.display(),
                e
            );
        })
        .ok();
    info!(
        directory = %config.directory.display(),
        dry_run = config.dry_run,
        "starting review session"
    );

    run_app_with_config(&config, user_config)
}

/// Runs the TUI application with configuration
pub fn run_app_with_config(config: &AppConfig, mut user_config: UserConfig) -> io::Result<()> {
    let source: Arc<dyn AssetSource> =
        Arc::new(DirectorySource::new(config.directory.clone()).with_dry_run(config.dry_run));
    let mut client = SyncReviewClient::start(source, config.review).map_err(io::Error::other)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_loop(&mut terminal, &mut client, config, &mut user_config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // A delete still in flight must land before the summary is taken
    if let Some(outcome) = client.wait_delete() {
        match outcome {
            Ok(outcome) => info!(?outcome, "delete finished after quit"),
            Err(e) => warn!(error = %e, "delete failed after quit"),
        }
    }

    let stats = client.snapshot().statistics;
    client.shutdown();
    print_summary(&stats, config.dry_run);
    info!(
        kept = stats.kept,
        deleted = stats.deleted,
        still_marked = stats.pending_delete,
        "review session finished"
    );

    result
}

/// Main application loop
fn run_loop<B: ratatui::backend::Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
    client: &mut SyncReviewClient,
    config: &AppConfig,
    user_config: &mut UserConfig,
) -> io::Result<()> {
    let mut view_state = if config.show_welcome {
        ViewState::Welcome
    } else {
        ViewState::Reviewing
    };
    let mut cache = PhotoCache::new();
    let mut status: Option<String> = None;

    loop {
        if let Some(outcome) = client.poll_delete() {
            status = Some(match outcome {
                Ok(DeleteOutcome::Committed { count }) => format!("{} photos deleted", count),
                Ok(DeleteOutcome::NothingPending) => "Nothing marked for deletion".to_string(),
                Err(e) => format!("Delete failed: {}", e),
            });
        }

        let snapshot = client.snapshot();

        terminal.draw(|frame| {
            render(frame, &snapshot, &mut cache, status.as_deref());

            // Render overlays
            match view_state {
                ViewState::Help => render_help_overlay(frame),
                ViewState::Summary => render_summary(frame, &snapshot.statistics),
                ViewState::ConfirmDelete => render_confirm_delete_overlay(
                    frame,
                    snapshot.statistics.pending_delete,
                    config.dry_run,
                ),
                ViewState::Welcome => render_welcome_overlay(frame),
                ViewState::Reviewing => {}
            }
        })?;

        // Handle input
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // Handle overlay-specific input
        match view_state {
            ViewState::Help => {
                // Any key closes help (or toggle with ?)
                let action = handle_key_event(key);
                if matches!(action, KeyAction::Help | KeyAction::Quit | KeyAction::None) {
                    view_state = ViewState::Reviewing;
                }
                continue;
            }
            ViewState::Summary => break,
            ViewState::ConfirmDelete => {
                match handle_confirm_input(key) {
                    KeyAction::ConfirmDelete => {
                        start_delete(client, &mut status);
                        view_state = ViewState::Reviewing;
                    }
                    KeyAction::CancelDelete => view_state = ViewState::Reviewing,
                    _ => {}
                }
                continue;
            }
            ViewState::Welcome => {
                // Any key dismisses welcome and starts reviewing
                view_state = ViewState::Reviewing;

                // Mark welcome as shown and persist
                user_config.welcome_shown = true;
                if let Err(e) = user_config.save() {
                    warn!(error = %e, "failed to save user config");
                }
                continue;
            }
            ViewState::Reviewing => {}
        }

        match handle_key_event(key) {
            KeyAction::Quit => {
                // Show summary before quitting if any decisions were made
                if snapshot.statistics.reviewed() > 0 {
                    view_state = ViewState::Summary;
                } else {
                    break;
                }
            }
            KeyAction::Keep => swipe(client, &snapshot, Decision::Keep, &mut status),
            KeyAction::MarkDelete => swipe(client, &snapshot, Decision::Delete, &mut status),
            KeyAction::DeleteAll => {
                if snapshot.statistics.pending_delete == 0 {
                    status = Some("Nothing marked for deletion".to_string());
                } else if client.is_delete_running() {
                    status = Some("A delete is already running".to_string());
                } else if config.skip_confirm {
                    start_delete(client, &mut status);
                } else {
                    view_state = ViewState::ConfirmDelete;
                }
            }
            KeyAction::Reload => match client.fetch_more() {
                Ok(true) => status = None,
                Ok(false) => status = Some("Already loading".to_string()),
                Err(e) => status = Some(e.to_string()),
            },
            KeyAction::Help => view_state = ViewState::Help,
            KeyAction::ConfirmDelete | KeyAction::CancelDelete => {
                // These actions are only handled in ConfirmDelete state
            }
            KeyAction::None => {}
        }
    }

    Ok(())
}

fn swipe(
    client: &SyncReviewClient,
    snapshot: &pswp::controller::ReviewSnapshot,
    decision: Decision,
    status: &mut Option<String>,
) {
    if snapshot.front().is_none() {
        return;
    }
    match client.swipe_front(decision) {
        Ok(_) => *status = None,
        Err(e) => {
            warn!(error = %e, "swipe rejected");
            *status = Some(e.to_string());
        }
    }
}

fn start_delete(client: &mut SyncReviewClient, status: &mut Option<String>) {
    *status = if client.start_delete() {
        Some("Deleting marked photos...".to_string())
    } else {
        Some("A delete is already running".to_string())
    };
}

fn print_summary(stats: &TriageStatistics, dry_run: bool) {
    let prefix = if dry_run { "[DRY RUN] " } else { "" };
    println!("\n{}Session complete", prefix);
    println!("   Kept: {} photos", stats.kept);
    println!("   Deleted: {} photos", stats.deleted);
    if stats.pending_delete > 0 {
        println!(
            "   Still marked (not deleted): {} photos",
            stats.pending_delete
        );
    }
}
