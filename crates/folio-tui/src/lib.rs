// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use folio_app::present::{
    BULLET, MessageBlock, PnlClass, classify_pnl, clean_message, format_currency, format_percent,
    format_quantity,
};
use folio_app::{
    AppCommand, AppEvent, AppState, ChartKind, ChatRequest, ChatSender, ChatVisibility,
    ComposerEdit, ERROR_DISPLAY, ErrorToken, FlowError, PortfolioSnapshot, RequestId,
    SUGGESTED_QUESTIONS, SelectedFile, Theme,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const STATUS_DISPLAY: Duration = Duration::from_secs(4);
const PAGE_ROWS: usize = 10;
const CHAT_TRANSCRIPT_LINES: usize = 40;
const ANALYZED_AT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Side effects the front end delegates to its host: the service calls,
/// chart export and the file listing behind the picker.
pub trait AppRuntime {
    fn list_portfolio_files(&mut self) -> Result<Vec<SelectedFile>>;
    fn upload_portfolio(&mut self, file: &SelectedFile) -> Result<PortfolioSnapshot, FlowError>;
    fn ask(&mut self, request: &ChatRequest) -> Result<String, FlowError>;
    fn export_charts(&mut self, snapshot: &PortfolioSnapshot) -> Result<Vec<PathBuf>>;

    /// Runs an upload and reports the outcome on `tx`. The default runs
    /// inline; runtimes backed by a network override this to use a worker.
    fn spawn_upload(
        &mut self,
        request_id: RequestId,
        file: SelectedFile,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let outcome = self.upload_portfolio(&file);
        tx.send(InternalEvent::UploadSettled {
            request_id,
            outcome,
        })
        .map_err(|_| anyhow!("upload event channel closed"))?;
        Ok(())
    }

    fn spawn_chat(
        &mut self,
        request_id: RequestId,
        request: ChatRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let outcome = self.ask(&request);
        tx.send(InternalEvent::ChatSettled {
            request_id,
            outcome,
        })
        .map_err(|_| anyhow!("chat event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    ErrorExpired {
        token: ErrorToken,
    },
    UploadSettled {
        request_id: RequestId,
        outcome: Result<PortfolioSnapshot, FlowError>,
    },
    ChatSettled {
        request_id: RequestId,
        outcome: Result<String, FlowError>,
    },
}

/// Document-level presentation attributes. `data_theme` holds the active
/// theme identifier and is the only input to the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationContext {
    pub data_theme: String,
}

impl PresentationContext {
    pub fn for_theme(theme: Theme) -> Self {
        Self {
            data_theme: theme.as_str().to_owned(),
        }
    }

    fn palette(&self) -> Palette {
        match Theme::parse(&self.data_theme).unwrap_or_default() {
            Theme::Dark => Palette {
                background: Color::Black,
                foreground: Color::White,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                positive: Color::LightGreen,
                negative: Color::LightRed,
                neutral: Color::LightBlue,
                error: Color::Red,
            },
            Theme::Light => Palette {
                background: Color::White,
                foreground: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                positive: Color::Green,
                negative: Color::Red,
                neutral: Color::Blue,
                error: Color::Red,
            },
        }
    }
}

impl Default for PresentationContext {
    fn default() -> Self {
        Self::for_theme(Theme::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    background: Color,
    foreground: Color,
    muted: Color,
    accent: Color,
    positive: Color,
    negative: Color,
    neutral: Color,
    error: Color,
}

impl Palette {
    const fn pnl(self, class: PnlClass) -> Color {
        match class {
            PnlClass::Positive => self.positive,
            PnlClass::Negative => self.negative,
            PnlClass::Neutral | PnlClass::Unknown => self.neutral,
        }
    }

    fn base(self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct FilePickerUiState {
    visible: bool,
    files: Vec<SelectedFile>,
    cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    presentation: PresentationContext,
    picker: FilePickerUiState,
    help_visible: bool,
    table_offset: usize,
    status_token: u64,
}

impl ViewData {
    fn for_state(state: &AppState) -> Self {
        Self {
            presentation: PresentationContext::for_theme(state.theme),
            ..Self::default()
        }
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::for_state(state);
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    // Workers that settle after this point find the receiver gone and
    // their sends fail silently.
    drop(internal_rx);
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::ErrorExpired { token } => {
                dispatch_and_apply(state, runtime, view_data, tx, AppCommand::ExpireError(token));
            }
            InternalEvent::UploadSettled {
                request_id,
                outcome,
            } => {
                let command = AppCommand::UploadSettled {
                    request_id,
                    outcome,
                };
                dispatch_and_apply(state, runtime, view_data, tx, command);
            }
            InternalEvent::ChatSettled {
                request_id,
                outcome,
            } => {
                let command = AppCommand::ChatSettled {
                    request_id,
                    outcome,
                };
                dispatch_and_apply(state, runtime, view_data, tx, command);
            }
        }
    }
}

fn dispatch_and_apply<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    for event in events {
        apply_event(state, runtime, view_data, tx, event);
    }
}

fn apply_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: AppEvent,
) {
    match event {
        AppEvent::UploadRequested { request_id, file } => {
            tracing::info!(%request_id, file = %file.name, "upload requested");
            if let Err(error) = runtime.spawn_upload(request_id, file, tx.clone()) {
                let command = AppCommand::UploadSettled {
                    request_id,
                    outcome: Err(FlowError::Transport(format!("{error:#}"))),
                };
                dispatch_and_apply(state, runtime, view_data, tx, command);
            }
        }
        AppEvent::ChatRequested {
            request_id,
            request,
        } => {
            tracing::info!(
                %request_id,
                turns = request.chat_history.len(),
                "chat requested"
            );
            if let Err(error) = runtime.spawn_chat(request_id, request, tx.clone()) {
                let command = AppCommand::ChatSettled {
                    request_id,
                    outcome: Err(FlowError::Transport(format!("{error:#}"))),
                };
                dispatch_and_apply(state, runtime, view_data, tx, command);
            }
        }
        AppEvent::SnapshotReplaced => {
            view_data.table_offset = 0;
            tracing::info!(
                rows = state.snapshot.table_rows.len(),
                charts = state.snapshot.charts.len(),
                "portfolio snapshot replaced"
            );
        }
        AppEvent::StaleResponseDropped(request_id) => {
            tracing::debug!(%request_id, "dropped response for superseded request");
        }
        AppEvent::ErrorRaised { token, message } => {
            tracing::warn!(%token, %message, "error shown");
            schedule_error_expiry(tx, token);
        }
        AppEvent::ThemeChanged(theme) => {
            view_data.presentation = PresentationContext::for_theme(theme);
        }
        AppEvent::StatusUpdated(_) => {
            view_data.status_token = view_data.status_token.saturating_add(1);
            schedule_status_clear(tx, view_data.status_token);
        }
        AppEvent::FileSelected(_)
        | AppEvent::ComposerChanged
        | AppEvent::TurnAppended(_)
        | AppEvent::ChatVisibilityChanged(_)
        | AppEvent::ErrorCleared
        | AppEvent::StatusCleared => {}
    }
}

fn schedule_error_expiry(internal_tx: &Sender<InternalEvent>, token: ErrorToken) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(ERROR_DISPLAY);
        let _ = sender.send(InternalEvent::ErrorExpired { token });
    });
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_DISPLAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.picker.visible {
        handle_picker_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if state.chat == ChatVisibility::Visible {
        handle_chat_overlay_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('o'), KeyModifiers::NONE) => {
            open_file_picker(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('a') | KeyCode::Char('u'), KeyModifiers::NONE) => {
            dispatch_and_apply(state, runtime, view_data, internal_tx, AppCommand::SubmitUpload);
        }
        (KeyCode::Char('t'), KeyModifiers::NONE) => {
            dispatch_and_apply(state, runtime, view_data, internal_tx, AppCommand::ToggleTheme);
        }
        (KeyCode::Char('@') | KeyCode::Char('c'), _) => {
            dispatch_and_apply(state, runtime, view_data, internal_tx, AppCommand::ToggleChat);
        }
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            export_charts(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('j') | KeyCode::Down, _) => scroll_table(state, view_data, 1),
        (KeyCode::Char('k') | KeyCode::Up, _) => scroll_table(state, view_data, -1),
        (KeyCode::PageDown, _) => scroll_table(state, view_data, PAGE_ROWS as isize),
        (KeyCode::PageUp, _) => scroll_table(state, view_data, -(PAGE_ROWS as isize)),
        (KeyCode::Char('g'), KeyModifiers::NONE) => view_data.table_offset = 0,
        (KeyCode::Char('G'), _) => {
            view_data.table_offset = state.snapshot.table_rows.len().saturating_sub(1);
        }
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        (KeyCode::Esc, _) => {
            dispatch_and_apply(state, runtime, view_data, internal_tx, AppCommand::DismissError);
        }
        _ => {}
    }
    false
}

fn handle_chat_overlay_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let command = match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => AppCommand::CloseChat,
        (KeyCode::Enter, modifiers)
            if modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            AppCommand::Compose(ComposerEdit::Newline)
        }
        (KeyCode::Enter, _) => AppCommand::SubmitChat,
        (KeyCode::Tab, _) => AppCommand::NextSuggestion,
        (KeyCode::Backspace, _) => AppCommand::Compose(ComposerEdit::Backspace),
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            AppCommand::Compose(ComposerEdit::Clear)
        }
        (KeyCode::Char('t'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            AppCommand::ToggleTheme
        }
        (KeyCode::Char(ch), modifiers)
            if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
        {
            AppCommand::Compose(ComposerEdit::Insert(ch))
        }
        _ => return,
    };
    dispatch_and_apply(state, runtime, view_data, internal_tx, command);
}

fn handle_picker_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let picker = &mut view_data.picker;
    match key.code {
        KeyCode::Esc => *picker = FilePickerUiState::default(),
        KeyCode::Char('j') | KeyCode::Down => {
            if picker.cursor + 1 < picker.files.len() {
                picker.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => picker.cursor = picker.cursor.saturating_sub(1),
        KeyCode::Enter => {
            let Some(file) = picker.files.get(picker.cursor).cloned() else {
                return;
            };
            *picker = FilePickerUiState::default();
            let name = file.name.clone();
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::SelectFile(file),
            );
            emit_status(state, view_data, internal_tx, format!("selected {name}"));
        }
        _ => {}
    }
}

fn open_file_picker<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.list_portfolio_files() {
        Ok(files) if files.is_empty() => {
            emit_status(state, view_data, internal_tx, "no .csv files found");
        }
        Ok(files) => {
            let cursor = state
                .selected_file
                .as_ref()
                .and_then(|selected| files.iter().position(|file| file == selected))
                .unwrap_or(0);
            view_data.picker = FilePickerUiState {
                visible: true,
                files,
                cursor,
            };
        }
        Err(error) => {
            let command = AppCommand::ReportError(format!("cannot list files: {error:#}"));
            dispatch_and_apply(state, runtime, view_data, internal_tx, command);
        }
    }
}

fn export_charts<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if state.snapshot.charts.is_empty() {
        emit_status(state, view_data, internal_tx, "no charts to export");
        return;
    }
    match runtime.export_charts(&state.snapshot) {
        Ok(paths) => {
            let location = paths
                .first()
                .and_then(|path| path.parent())
                .map(|dir| dir.display().to_string())
                .unwrap_or_default();
            tracing::info!(count = paths.len(), %location, "charts exported");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("exported {} chart(s) to {location}", paths.len()),
            );
        }
        Err(error) => {
            let command = AppCommand::ReportError(format!("chart export failed: {error:#}"));
            dispatch_and_apply(state, runtime, view_data, internal_tx, command);
        }
    }
}

fn scroll_table(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let last = state.snapshot.table_rows.len().saturating_sub(1);
    view_data.table_offset = view_data.table_offset.saturating_add_signed(delta).min(last);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let palette = view_data.presentation.palette();
    frame.render_widget(Block::default().style(palette.base()), frame.area());

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state)).style(palette.base()).block(
        Block::default()
            .title("folio")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent)),
    );
    frame.render_widget(header, layout[0]);

    let summary = Paragraph::new(summary_lines(state, palette))
        .style(palette.base())
        .block(Block::default().title("summary").borders(Borders::ALL));
    frame.render_widget(summary, layout[1]);

    let charts = Paragraph::new(render_charts_text(&state.snapshot))
        .style(palette.base())
        .block(Block::default().title("charts").borders(Borders::ALL));
    frame.render_widget(charts, layout[2]);

    render_table(frame, layout[3], state, view_data, palette);

    let (status, style) = match &state.error {
        Some(toast) => (
            format!("! {}", toast.message),
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        ),
        None => (status_text(state), Style::default().fg(palette.muted)),
    };
    let status_widget = Paragraph::new(status)
        .style(palette.base().patch(style))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[4]);

    if state.chat == ChatVisibility::Visible {
        let area = centered_rect(72, 70, frame.area());
        frame.render_widget(Clear, area);
        let chat = Paragraph::new(render_chat_overlay_text(state))
            .style(palette.base())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("advisor")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(palette.accent)),
            );
        frame.render_widget(chat, area);
    }

    if view_data.picker.visible {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let picker = Paragraph::new(render_picker_overlay_text(&view_data.picker))
            .style(palette.base())
            .block(Block::default().title("open portfolio").borders(Borders::ALL));
        frame.render_widget(picker, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .style(palette.base())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn header_text(state: &AppState) -> String {
    let file = state
        .selected_file
        .as_ref()
        .map_or("no file selected", |file| file.name.as_str());
    let mut parts = vec![format!("file: {file}")];
    if state.is_uploading() {
        parts.push("analyzing...".to_owned());
    }
    if state.is_chat_pending() {
        parts.push("advisor thinking...".to_owned());
    }
    if let Some(received_at) = state.snapshot.received_at
        && let Ok(stamp) = received_at.format(ANALYZED_AT_FORMAT)
    {
        parts.push(format!("analyzed {stamp} UTC"));
    }
    parts.push(format!("theme: {}", state.theme.as_str()));
    parts.join(" | ")
}

fn summary_lines(state: &AppState, palette: Palette) -> Vec<Line<'static>> {
    let Some(totals) = state.snapshot.totals else {
        return vec![Line::from(Span::styled(
            "No portfolio analyzed yet. Press o to pick a .csv file, then a to analyze.",
            Style::default().fg(palette.muted),
        ))];
    };

    let label = |text: &'static str| Span::styled(text, Style::default().fg(palette.muted));
    vec![
        Line::from(vec![
            label("Total Investment  "),
            Span::raw(format_currency(totals.total_investment)),
        ]),
        Line::from(vec![
            label("Current Value     "),
            Span::styled(
                format_currency(totals.current_value),
                Style::default().fg(palette.pnl(classify_pnl(totals.value_change()))),
            ),
        ]),
        Line::from(vec![
            label("Total P&L         "),
            Span::styled(
                format!(
                    "{} ({})",
                    format_currency(totals.total_pnl),
                    format_percent(totals.pnl_percent)
                ),
                Style::default()
                    .fg(palette.pnl(classify_pnl(totals.total_pnl)))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ]
}

fn render_charts_text(snapshot: &PortfolioSnapshot) -> String {
    if snapshot.charts.is_empty() {
        return "no charts".to_owned();
    }
    let mut lines = ChartKind::ALL
        .iter()
        .map(|kind| {
            let detail = match snapshot.charts.get(kind).map(|chart| chart.decode_png()) {
                Some(Ok(bytes)) => format!("{:.1} KiB png", bytes.len() as f64 / 1024.0),
                Some(Err(error)) => format!("unreadable ({error})"),
                None => "not provided".to_owned(),
            };
            format!("{}: {detail}", kind.title())
        })
        .collect::<Vec<String>>();
    lines.push("x export png".to_owned());
    lines.join("\n")
}

const TABLE_HEADERS: [&str; 9] = [
    "Instrument",
    "Qty",
    "Avg Cost",
    "LTP",
    "Invested",
    "Current",
    "P&L",
    "P&L %",
    "Type",
];

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
    palette: Palette,
) {
    let rows = &state.snapshot.table_rows;
    let title = if rows.is_empty() {
        "holdings".to_owned()
    } else {
        format!(
            "holdings {}-{} of {}",
            view_data.table_offset + 1,
            rows.len(),
            rows.len()
        )
    };

    let body = rows.iter().skip(view_data.table_offset).map(|row| {
        let pnl_style = Style::default().fg(palette.pnl(classify_pnl(row.pnl)));
        Row::new(vec![
            Cell::from(row.instrument.clone()),
            Cell::from(format_quantity(row.qty)),
            Cell::from(format_currency(row.avg_cost)),
            Cell::from(format_currency(row.ltp)),
            Cell::from(format_currency(row.invested)),
            Cell::from(format_currency(row.current_value)),
            Cell::from(format_currency(row.pnl)).style(pnl_style),
            Cell::from(format_percent(row.pnl_percent)).style(pnl_style),
            Cell::from(row.kind.clone().unwrap_or_default()),
        ])
    });

    let widths = [
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(9),
        Constraint::Length(7),
    ];
    let header = Row::new(TABLE_HEADERS.to_vec()).style(
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    );
    let table = Table::new(body, widths)
        .header(header)
        .style(palette.base())
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_chat_overlay_text(state: &AppState) -> String {
    let mut lines = Vec::new();

    if state.transcript.is_empty() {
        lines.push("Ask about your portfolio. Suggestions (tab to use):".to_owned());
        for question in SUGGESTED_QUESTIONS {
            lines.push(format!("  {BULLET} {question}"));
        }
    }

    for turn in &state.transcript {
        lines.push(
            match turn.sender {
                ChatSender::User => "you:",
                ChatSender::Assistant => "advisor:",
            }
            .to_owned(),
        );
        for block in clean_message(&turn.text) {
            match block {
                MessageBlock::Paragraph(text) => {
                    lines.extend(text.lines().map(|line| format!("  {line}")));
                }
                MessageBlock::List(items) => {
                    lines.extend(items.iter().map(|item| format!("  {BULLET} {item}")));
                }
            }
            lines.push(String::new());
        }
    }

    if state.is_chat_pending() {
        lines.push("advisor is thinking...".to_owned());
    }

    let keep = lines.len().saturating_sub(CHAT_TRANSCRIPT_LINES);
    let mut visible = lines.split_off(keep);
    visible.push(String::new());
    let mut composer = state.composer.lines().collect::<Vec<&str>>();
    if state.composer.ends_with('\n') || composer.is_empty() {
        composer.push("");
    }
    for (index, line) in composer.iter().enumerate() {
        let prompt = if index == 0 { "> " } else { "  " };
        visible.push(format!("{prompt}{line}"));
    }

    let send_hint = if state.can_submit_chat() {
        "enter send"
    } else {
        "enter send (disabled)"
    };
    visible.push(format!(
        "{send_hint} | shift/alt+enter newline | tab suggestion | esc close"
    ));
    visible.join("\n")
}

fn render_picker_overlay_text(picker: &FilePickerUiState) -> String {
    let mut lines = picker
        .files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let prefix = if index == picker.cursor { "> " } else { "  " };
            format!("{prefix}{}", file.path.display())
        })
        .collect::<Vec<String>>();
    lines.push(String::new());
    lines.push("j/k move | enter select | esc cancel".to_owned());
    lines.join("\n")
}

fn help_overlay_text() -> &'static str {
    "main: o open csv | a analyze | t theme | @ chat | x export charts | ? help | q quit\n\
table: j/k scroll | pgup/pgdn page | g/G top/bottom | esc dismiss error\n\
chat: enter send | shift+enter or alt+enter newline | tab suggestion | ctrl+u clear | esc close\n\
picker: j/k move | enter select | esc cancel\n\
global: ctrl+c or ctrl+q quit"
}

fn status_text(state: &AppState) -> String {
    let upload_hint = if state.can_submit_upload() {
        "a analyze"
    } else {
        "analyzing..."
    };
    let default =
        format!("o open | {upload_hint} | @ chat | t theme | x export | j/k scroll | ? help | q");
    match &state.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
