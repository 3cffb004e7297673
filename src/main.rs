use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Wrap};

use courtside::api::{HttpScoringApi, ScoringApi};
use courtside::config::ClientConfig;
use courtside::demo_api::DemoScoringApi;
use courtside::directory::DirectoryState;
use courtside::prediction::{Prediction, PredictionOutcome, Streak};
use courtside::provider::spawn_provider;
use courtside::ratings::RatingsState;
use courtside::selection::{Side, TeamChoice};
use courtside::session::Session;
use courtside::state::{Change, Delta, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Dashboard,
    TopTeams,
}

struct App {
    session: Session,
    changes: mpsc::Receiver<Change>,
    screen: Screen,
    focus: Side,
    home_cursor: usize,
    away_cursor: usize,
    dirty: bool,
    should_quit: bool,
    help_overlay: bool,
}

impl App {
    fn new(mut session: Session) -> Self {
        let changes = session.subscribe();
        Self {
            session,
            changes,
            screen: Screen::Dashboard,
            focus: Side::Home,
            home_cursor: 0,
            away_cursor: 0,
            dirty: true,
            should_quit: false,
            help_overlay: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        self.dirty = true;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.screen = Screen::Dashboard,
            KeyCode::Char('2') => self.screen = Screen::TopTeams,
            KeyCode::Tab | KeyCode::Left | KeyCode::Right | KeyCode::Char('h') => {
                self.focus = self.focus.other();
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Enter | KeyCode::Char(' ') => self.select_at_cursor(),
            KeyCode::Char('x') | KeyCode::Backspace | KeyCode::Delete => {
                self.session.clear(self.focus);
            }
            KeyCode::Char('p') | KeyCode::Char('g') => {
                self.session.submit();
            }
            KeyCode::Char('r') => self.session.reload_ratings(),
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            _ => {}
        }
    }

    fn team_count(&self) -> usize {
        self.session
            .state()
            .directory
            .directory()
            .map(|dir| dir.len())
            .unwrap_or(0)
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self.focus {
            Side::Home => &mut self.home_cursor,
            Side::Away => &mut self.away_cursor,
        }
    }

    fn move_cursor(&mut self, step: isize) {
        let total = self.team_count();
        if total == 0 {
            return;
        }
        let cursor = self.cursor_mut();
        *cursor = cursor.saturating_add_signed(step).min(total - 1);
    }

    fn select_at_cursor(&mut self) {
        let cursor = match self.focus {
            Side::Home => self.home_cursor,
            Side::Away => self.away_cursor,
        };
        let id = self
            .session
            .state()
            .directory
            .directory()
            .and_then(|dir| dir.teams().get(cursor))
            .map(|team| team.id);
        if let Some(id) = id {
            self.session.select(self.focus, id);
        }
    }

    fn drain_changes(&mut self) {
        while self.changes.try_recv().is_ok() {
            self.dirty = true;
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = ClientConfig::from_env().context("invalid configuration")?;
    let api: Arc<dyn ScoringApi> = if config.demo_mode {
        Arc::new(DemoScoringApi::new())
    } else {
        Arc::new(HttpScoringApi::new(&config))
    };

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(api, tx, cmd_rx);

    let mut session = Session::new(&config, cmd_tx);
    session.start();
    let mut app = App::new(session);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, rx);
    app.session.teardown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        app.session.pump(&rx);
        app.drain_changes();

        if app.dirty {
            terminal.draw(|f| ui(f, app))?;
            app.dirty = false;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key),
                Event::Resize(_, _) => app.dirty = true,
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let state = app.session.state();
    match app.screen {
        Screen::Dashboard => render_dashboard(frame, chunks[1], app, state),
        Screen::TopTeams => render_top_teams(frame, chunks[1], state),
    }

    render_logs(frame, chunks[2], state);

    let footer =
        Paragraph::new(footer_text(app.screen)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.help_overlay {
        let area = frame.size();
        render_help_overlay(frame, area);
    }
}

fn header_text(app: &App) -> String {
    let title = match app.screen {
        Screen::Dashboard => "COURTSIDE | Select Teams to Predict the Outcome",
        Screen::TopTeams => "COURTSIDE | Top Teams",
    };
    let status = app.session.state().outcome().label();
    format!("  (o)  {title}\n       prediction: {status}")
}

fn footer_text(screen: Screen) -> &'static str {
    match screen {
        Screen::Dashboard => {
            "1 Dashboard | 2 Top teams | Tab Side | j/k Move | Enter Pick | x Clear | p Predict | ? Help | q Quit"
        }
        Screen::TopTeams => "1 Dashboard | 2 Top teams | r Reload ratings | ? Help | q Quit",
    }
}

fn render_dashboard(frame: &mut Frame, area: Rect, app: &App, state: &SessionState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .split(area);

    render_team_picker(frame, cols[0], app, state, Side::Home, app.home_cursor);
    render_team_picker(frame, cols[1], app, state, Side::Away, app.away_cursor);
    render_prediction(frame, cols[2], state);
}

fn render_team_picker(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    state: &SessionState,
    side: Side,
    cursor: usize,
) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let focused = app.focus == side && app.screen == Screen::Dashboard;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let title = match state.selection.choice(side) {
        TeamChoice::Selected(team) => format!("{} Team: {}", side.label(), team.name),
        TeamChoice::Unselected => format!("{} Team", side.label()),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<Line> = match &state.directory {
        DirectoryState::NotLoaded | DirectoryState::Loading => {
            vec![Line::from("Loading teams...")]
        }
        DirectoryState::Unavailable(reason) => {
            vec![Line::from(format!("Team list unavailable: {reason}"))]
        }
        DirectoryState::Ready(dir) if dir.is_empty() => vec![Line::from("No teams")],
        DirectoryState::Ready(dir) => {
            let visible = sections[0].height.saturating_sub(2) as usize;
            let (start, end) = visible_range(cursor, dir.len(), visible);
            let chosen = state.selection.choice(side).id();
            dir.teams()[start..end]
                .iter()
                .enumerate()
                .map(|(i, team)| {
                    let idx = start + i;
                    let marker = if chosen == Some(team.id) { "* " } else { "  " };
                    let style = if idx == cursor && focused {
                        Style::default().fg(Color::White).bg(Color::DarkGray)
                    } else {
                        Style::default()
                    };
                    Line::styled(format!("{marker}{}", team.name), style)
                })
                .collect()
        }
    };
    frame.render_widget(Paragraph::new(lines).block(block), sections[0]);

    if state.selection.error(side) {
        let err = Paragraph::new(format!("Missing {} Team!", side.label()))
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
        frame.render_widget(err, sections[1]);
    }
}

fn render_prediction(frame: &mut Frame, area: Rect, state: &SessionState) {
    let block = Block::default().title("Predictions").borders(Borders::ALL);
    let dim = Style::default().fg(Color::DarkGray);

    let lines: Vec<Line> = match state.outcome() {
        PredictionOutcome::Idle => {
            vec![Line::styled("Select Teams to generate a prediction", dim)]
        }
        PredictionOutcome::Loading(req) => vec![Line::from(format!(
            "Predicting {} vs {}...",
            state.team_name(req.home_team_id),
            state.team_name(req.away_team_id)
        ))],
        PredictionOutcome::Failure(reason) => vec![Line::styled(
            format!("Error occured: {reason}"),
            Style::default().fg(Color::Red),
        )],
        PredictionOutcome::Success(prediction) => prediction_lines(state, prediction),
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(4)])
        .split(inner);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }),
        sections[0],
    );

    if let PredictionOutcome::Success(prediction) = state.outcome() {
        frame.render_widget(win_bar_chart(prediction), sections[1]);
    }
}

fn prediction_lines<'a>(state: &SessionState, p: &Prediction) -> Vec<Line<'a>> {
    let home = state.team_name(p.home_team_id).to_string();
    let away = state.team_name(p.away_team_id).to_string();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    vec![
        Line::styled(format!("{home} vs {away}"), bold),
        Line::from(""),
        Line::from(format!(
            "{home}: {:.0}% win",
            p.home_win_probability * 100.0
        )),
        Line::from(format!(
            "{away}: {:.0}% win",
            p.away_win_probability * 100.0
        )),
        Line::from(""),
        Line::from(format!("{home} last 5: {}", streak_label(&p.home_recent_streak))),
        Line::from(format!("{away} last 5: {}", streak_label(&p.away_recent_streak))),
    ]
}

fn streak_label(streak: &Streak) -> String {
    let heat = if streak.is_hot {
        " (hot)"
    } else if streak.is_cold {
        " (cold)"
    } else {
        ""
    };
    format!("{}W-{}L{heat}", streak.wins, streak.losses)
}

fn win_bar_chart(p: &Prediction) -> BarChart<'static> {
    let home = Bar::default()
        .value((p.home_win_probability * 100.0).round().max(0.0) as u64)
        .label(Line::from("H"))
        .style(Style::default().fg(Color::Green));
    let away = Bar::default()
        .value((p.away_win_probability * 100.0).round().max(0.0) as u64)
        .label(Line::from("A"))
        .style(Style::default().fg(Color::Red));

    BarChart::default()
        .data(BarGroup::default().bars(&[home, away]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .max(100)
}

fn render_top_teams(frame: &mut Frame, area: Rect, state: &SessionState) {
    let block = Block::default().title("Top Teams").borders(Borders::ALL);

    let Some(ranked) = state.ranked.as_ref() else {
        let msg = match &state.ratings {
            RatingsState::Unavailable(reason) => format!("Ratings unavailable: {reason}"),
            _ => "Loading ratings...".to_string(),
        };
        let empty = Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };
    if ranked.is_empty() {
        frame.render_widget(Paragraph::new("No rated teams").block(block), area);
        return;
    }

    // Bars start a little below the weakest team so small gaps stay visible.
    let floor = ranked
        .iter()
        .map(|e| e.rating)
        .fold(f64::INFINITY, f64::min)
        - 100.0;
    let bars: Vec<Bar> = ranked
        .iter()
        .map(|entry| {
            Bar::default()
                .value((entry.rating - floor).max(0.0).round() as u64)
                .label(Line::from(entry.short_name().to_string()))
                .text_value(format!("{:.0}", entry.rating))
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(2);
    frame.render_widget(chart, area);
}

fn render_logs(frame: &mut Frame, area: Rect, state: &SessionState) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = state.logs.len().saturating_sub(visible);
    let lines: Vec<Line> = state
        .logs
        .iter()
        .skip(skip)
        .map(|msg| {
            let style = if msg.contains("[WARN]") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::styled(msg.clone(), style)
        })
        .collect();
    let logs = Paragraph::new(lines).block(Block::default().title("Log").borders(Borders::ALL));
    frame.render_widget(logs, area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Courtside - Help",
        "",
        "Global:",
        "  1            Dashboard",
        "  2            Top teams",
        "  r            Reload ratings",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Dashboard:",
        "  Tab / h      Switch home/away",
        "  j/k or ↑/↓   Move",
        "  Enter        Pick team",
        "  x            Clear side",
        "  p            Generate prediction",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
