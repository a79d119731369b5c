// TUI module for rendering the terminal interface
pub mod colors;
pub mod input;

// Re-exports
pub use colors::*;
pub use input::{handle_confirm_input, handle_key_event, KeyAction};

use crate::controller::ReviewSnapshot;
use crate::domain::{AccessResult, AssetId, Photo, ReviewPhase, TriageStatistics};
use crate::imaging;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// UI view state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Swiping through the queue
    Reviewing,
    /// Help overlay visible
    Help,
    /// Confirmation dialog for the bulk delete
    ConfirmDelete,
    /// Welcome screen shown on first launch
    Welcome,
    /// Session summary before exit
    Summary,
}

/// Half-block rendering of the front photo, reused until the photo or the area changes
#[derive(Debug, Default)]
pub struct PhotoCache {
    key: Option<(AssetId, u16, u16)>,
    lines: Vec<Line<'static>>,
}

impl PhotoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines_for(&mut self, photo: &Photo, cols: u16, rows: u16) -> &[Line<'static>] {
        let key = (photo.id.clone(), cols, rows);
        if self.key.as_ref() != Some(&key) {
            self.lines = imaging::render_to_cells(&photo.image, cols, rows);
            self.key = Some(key);
        }
        &self.lines
    }

    pub fn clear(&mut self) {
        self.key = None;
        self.lines.clear();
    }
}

/// Renders the review screen for a controller snapshot
pub fn render(
    frame: &mut Frame,
    snapshot: &ReviewSnapshot,
    cache: &mut PhotoCache,
    status: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header with counters
            Constraint::Min(0),    // Photo
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0], snapshot, status);
    render_content(frame, chunks[1], snapshot, cache);
    render_footer(frame, chunks[2]);
}

/// Renders the summary screen at the end
pub fn render_summary(frame: &mut Frame, stats: &TriageStatistics) {
    let area = frame.area();
    let summary_area = centered_rect(60, 50, area);

    frame.render_widget(Clear, summary_area);

    let block = Block::default()
        .title(" Session Complete ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(summary_area);
    frame.render_widget(block, summary_area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Summary",
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("   Reviewed:  "),
            Span::styled(
                format!("{}", stats.reviewed()),
                Style::default()
                    .fg(ACCENT_HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("   ✓ ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("Kept:      "),
            Span::styled(
                format!("{}", stats.kept),
                Style::default()
                    .fg(ACCENT_SECONDARY)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("   ✗ ", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("Deleted:   "),
            Span::styled(
                format!("{}", stats.deleted),
                Style::default()
                    .fg(ACCENT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("   ○ ", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("Still marked: "),
            Span::styled(
                format!("{}", stats.pending_delete),
                Style::default().fg(TEXT_SECONDARY),
            ),
        ]),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to exit",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Renders the help overlay
pub fn render_help_overlay(frame: &mut Frame) {
    let area = frame.area();
    let help_area = centered_rect(50, 70, area);

    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let help_lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  → ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("or "),
            Span::styled("k", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("     Keep photo"),
        ]),
        Line::from(vec![
            Span::styled("  ← ", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("or "),
            Span::styled("d", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("     Mark for deletion"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  x ", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("          Delete marked photos"),
        ]),
        Line::from(vec![
            Span::styled("  r ", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("          Load more photos"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  q ", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("or "),
            Span::styled("Esc", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("     Quit"),
        ]),
        Line::from(vec![
            Span::styled("  ?", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("           Toggle help"),
        ]),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    let paragraph = Paragraph::new(help_lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Renders the welcome dialog overlay
pub fn render_welcome_overlay(frame: &mut Frame) {
    let area = centered_rect(85, 85, frame.area());

    frame.render_widget(Clear, area);

    let heading = Style::default()
        .fg(ACCENT_HIGHLIGHT)
        .add_modifier(Modifier::BOLD);

    let welcome_lines = vec![
        Line::from(""),
        Line::from(Span::styled("Welcome to pswp!", heading)),
        Line::from(""),
        Line::from(Span::raw(
            "pswp shows your photos one at a time, newest first.",
        )),
        Line::from(Span::raw(
            "Swipe right to keep a photo, left to mark it, then delete everything marked at once.",
        )),
        Line::from(""),
        Line::from(Span::styled("Quick Start:", heading)),
        Line::from(""),
        Line::from(vec![
            Span::styled("  1. ", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("Press "),
            Span::styled(
                "→ (Right Arrow)",
                Style::default()
                    .fg(ACCENT_SECONDARY)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" to "),
            Span::styled("keep", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw(" or "),
            Span::styled(
                "← (Left Arrow)",
                Style::default()
                    .fg(ACCENT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" to "),
            Span::styled("mark", Style::default().fg(ACCENT_PRIMARY)),
        ]),
        Line::from(vec![
            Span::styled("  2. ", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("More photos load by themselves as the queue runs low"),
        ]),
        Line::from(vec![
            Span::styled("  3. ", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("Press "),
            Span::styled("x", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" to delete every marked photo"),
        ]),
        Line::from(""),
        Line::from(Span::styled("Safety Features:", heading)),
        Line::from(""),
        Line::from(vec![
            Span::styled("  •  ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("Photos are moved to your system "),
            Span::styled("trash", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" (not permanently deleted)"),
        ]),
        Line::from(vec![
            Span::styled("  •  ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("Nothing is deleted until you confirm with "),
            Span::styled("x", Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("  •  ", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("Run with "),
            Span::styled("--dry-run", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" to try it without touching any file"),
        ]),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled("Press any key to start swiping...", heading)),
        Line::from(""),
    ];

    let welcome_text = Paragraph::new(welcome_lines)
        .block(
            Block::default()
                .title(Span::styled(" Welcome to pswp ", heading))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
                .style(Style::default().bg(BG_DARK)),
        )
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    frame.render_widget(welcome_text, area);
}

/// Renders the confirmation dialog for the bulk delete
pub fn render_confirm_delete_overlay(frame: &mut Frame, pending: usize, dry_run: bool) {
    let area = frame.area();
    let confirm_area = centered_rect(50, 50, area);

    frame.render_widget(Clear, confirm_area);

    let block = Block::default()
        .title(" ⚠ Confirm Delete ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_PRIMARY))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(confirm_area);
    frame.render_widget(block, confirm_area);

    let noun = if pending == 1 { "photo" } else { "photos" };
    let note = if dry_run {
        "Dry run: no file will be touched."
    } else {
        "They will be moved to the system trash."
    };

    let confirm_lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Delete {} marked {}?", pending, noun),
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(note, Style::default().fg(TEXT_SECONDARY))),
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Y]", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("es  "),
            Span::styled("[Enter]", Style::default().fg(ACCENT_SECONDARY)),
            Span::raw("     "),
            Span::styled("[N]", Style::default().fg(ACCENT_PRIMARY)),
            Span::raw("o  "),
            Span::styled("[Esc]", Style::default().fg(ACCENT_PRIMARY)),
        ]),
        Line::from(""),
    ];

    let paragraph = Paragraph::new(confirm_lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_header(frame: &mut Frame, area: Rect, snapshot: &ReviewSnapshot, status: Option<&str>) {
    let stats = &snapshot.statistics;

    let title_line = Line::from(vec![
        Span::styled(
            " pswp ",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("[{}]", snapshot.phase.label()),
            Style::default().fg(TEXT_SECONDARY),
        ),
        Span::raw("  "),
        Span::styled(
            snapshot
                .front()
                .map(|photo| photo.id.to_string())
                .unwrap_or_default(),
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let mut counters = vec![
        Span::styled(
            format!(" {} queued", stats.queued),
            Style::default().fg(TEXT_SECONDARY),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("✓ {} kept", stats.kept),
            Style::default().fg(ACCENT_SECONDARY),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("✗ {} marked", stats.pending_delete),
            Style::default().fg(ACCENT_PRIMARY),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("{} deleted", stats.deleted),
            Style::default().fg(TEXT_SECONDARY),
        ),
    ];
    if snapshot.is_fetching {
        counters.push(Span::raw("  │  "));
        counters.push(Span::styled(
            "loading…",
            Style::default().fg(ACCENT_HIGHLIGHT),
        ));
    }
    if let Some(message) = status.or(snapshot.last_error.as_deref()) {
        counters.push(Span::raw("  │  "));
        counters.push(Span::styled(
            message.to_string(),
            Style::default().fg(ACCENT_PRIMARY),
        ));
    }

    let header = Paragraph::new(vec![title_line, Line::from(counters)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Left);

    frame.render_widget(header, area);
}

fn render_content(
    frame: &mut Frame,
    area: Rect,
    snapshot: &ReviewSnapshot,
    cache: &mut PhotoCache,
) {
    let Some(photo) = snapshot.front() else {
        cache.clear();
        frame.render_widget(render_empty_state_widget(snapshot), area);
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(format!(" {} ", photo.id));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = cache.lines_for(photo, inner.width, inner.height).to_vec();
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

/// Placeholder shown while the queue has no front photo
fn render_empty_state_widget(snapshot: &ReviewSnapshot) -> Paragraph<'static> {
    let (title, hint) = match (snapshot.phase, snapshot.access) {
        (_, Some(AccessResult::Denied)) => (
            "No Access",
            "The photo library could not be opened.",
        ),
        (ReviewPhase::Idle | ReviewPhase::RequestingAccess, _) => {
            ("Opening Library", "Asking for access to your photos...")
        }
        (ReviewPhase::Fetching, _) => ("Loading Photos", "Decoding the next batch..."),
        (ReviewPhase::Deleting, _) => ("Deleting", "Moving marked photos to the trash..."),
        _ => (
            "All Caught Up",
            "No photos left to review. Press r to look for more.",
        ),
    };

    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            title,
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(TEXT_SECONDARY))),
    ];

    Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR))
                .title(" Photo "),
        )
        .alignment(Alignment::Center)
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let controls = Line::from(vec![
        Span::styled(
            " ← ",
            Style::default()
                .fg(ACCENT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("Mark", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("  │  "),
        Span::styled(
            "→ ",
            Style::default()
                .fg(ACCENT_SECONDARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("Keep", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("  │  "),
        Span::styled("x ", Style::default().fg(ACCENT_PRIMARY)),
        Span::styled("Delete marked", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("  │  "),
        Span::styled("? ", Style::default().fg(TEXT_SECONDARY)),
        Span::styled("Help", Style::default().fg(TEXT_SECONDARY)),
        Span::raw("  │  "),
        Span::styled("q ", Style::default().fg(TEXT_SECONDARY)),
        Span::styled("Quit", Style::default().fg(TEXT_SECONDARY)),
    ]);

    let footer = Paragraph::new(controls)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(footer, area);
}
