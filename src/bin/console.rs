use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};
use robo_ref::command::MANUAL_ADJUST_REASON;
use robo_ref::driver::{self, ConsoleHandle};
use robo_ref::timeout::TimeoutSeverity;
use robo_ref::{
    fmt_clock, Command, Engine, JsonFileSink, MatchConfig, MatchSnapshot, Phase, StoppageReason,
    TeamId,
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Live officiating console for a robot-soccer match.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON match config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name for team A (index 0)
    #[arg(long)]
    team_a: Option<String>,

    /// Name for team B (index 1)
    #[arg(long)]
    team_b: Option<String>,

    /// Where published results are written
    #[arg(long, default_value = "match-result.json")]
    result_file: PathBuf,

    /// Diagnostics log file (the terminal is taken by the UI)
    #[arg(long, default_value = "robo-ref-console.log")]
    log_file: PathBuf,
}

/// What a key press asks for
enum Action {
    Send(Command),
    EditName(TeamId),
    Quit,
    Nothing,
}

struct App {
    handle: ConsoleHandle,
    config: MatchConfig,
    /// Team being renamed and the text typed so far
    editing: Option<(TeamId, String)>,
    notice: Option<(String, Instant)>,
}

impl App {
    fn send(&mut self, cmd: Command) {
        // The driver only goes away on shutdown
        let _ = self.handle.commands.send(cmd);
    }

    fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some((text.into(), Instant::now()));
    }

    fn on_key(&mut self, key: KeyEvent, snap: &MatchSnapshot) -> bool {
        if let Some((team, mut buffer)) = self.editing.take() {
            match key.code {
                KeyCode::Enter => self.send(Command::RenameTeam { team, name: buffer }),
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    buffer.pop();
                    self.editing = Some((team, buffer));
                }
                KeyCode::Char(c) => {
                    buffer.push(c);
                    self.editing = Some((team, buffer));
                }
                _ => self.editing = Some((team, buffer)),
            }
            return true;
        }

        match map_key(key, snap) {
            Action::Send(cmd) => self.send(cmd),
            Action::EditName(team) => {
                self.editing = Some((team, snap.team(team).name.clone()));
            }
            Action::Quit => return false,
            Action::Nothing => {}
        }
        true
    }
}

fn map_key(key: KeyEvent, snap: &MatchSnapshot) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('r') => Action::Send(Command::ResetMatch),
            KeyCode::Char('c') => Action::Quit,
            _ => Action::Nothing,
        };
    }

    let cmd = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return Action::Quit,
        KeyCode::F(1) => return Action::EditName(TeamId::A),
        KeyCode::F(2) => return Action::EditName(TeamId::B),
        KeyCode::Enter => match snap.phase {
            Phase::PreMatch => Command::StartMatch,
            Phase::HalfTime => Command::BeginSecondHalf,
            Phase::Ended => Command::PublishResult,
            Phase::FirstHalf | Phase::SecondHalf => Command::ToggleClock,
        },
        KeyCode::Char(' ') => Command::ToggleClock,
        KeyCode::Char('e') => Command::EndTimeout,
        KeyCode::Char('o') => Command::StartStoppage(StoppageReason::OutOfBounds),
        KeyCode::Char('n') => Command::StartStoppage(StoppageReason::NoPlay),
        KeyCode::Char('s') => Command::StartStoppage(StoppageReason::BotsStuck),
        KeyCode::Char('r') => Command::EndStoppage,
        KeyCode::Char(c) => {
            // Lower case acts on team A, upper case on team B
            let team = if c.is_ascii_uppercase() { TeamId::B } else { TeamId::A };
            match c.to_ascii_lowercase() {
                'g' => Command::Goal(team),
                'f' => Command::EarlyStartFoul(team),
                'k' => Command::TechnicalPoint(team),
                't' => Command::CallTimeout(team),
                'b' => Command::ToggleBotOut(team),
                'm' => Command::AdjustScore {
                    team,
                    delta: -1,
                    reason: MANUAL_ADJUST_REASON.to_string(),
                },
                _ => return Action::Nothing,
            }
        }
        _ => return Action::Nothing,
    };
    Action::Send(cmd)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_dir = args
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let log_name = args
        .log_file
        .file_name()
        .context("log file needs a file name")?
        .to_owned();
    let appender = tracing_appender::rolling::never(log_dir, log_name);
    let (writer, _log_guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("robo_ref=info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let mut config = match &args.config {
        Some(path) => MatchConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MatchConfig::default(),
    };
    if let Some(name) = args.team_a {
        config.team_names[0] = name;
    }
    if let Some(name) = args.team_b {
        config.team_names[1] = name;
    }
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let engine = Engine::new(config.clone()).with_sink(JsonFileSink::new(&args.result_file));
    let (handle, driver) = driver::console(engine);
    let task = runtime.spawn(driver.run());
    info!(result_file = %args.result_file.display(), "console started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App {
        handle,
        config,
        editing: None,
        notice: None,
    };
    let outcome = run_ui(&mut terminal, &mut app, &args.result_file);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    drop(app);
    let engine = runtime.block_on(task)?;
    info!(state_hash = engine.state_hash(), "console closed");
    outcome
}

fn run_ui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    result_file: &std::path::Path,
) -> anyhow::Result<()> {
    loop {
        while let Ok(err) = app.handle.notices.try_recv() {
            app.set_notice(err.to_string());
        }
        if app
            .notice
            .as_ref()
            .is_some_and(|(_, shown)| shown.elapsed() >= NOTICE_TTL)
        {
            app.notice = None;
        }

        let snap = app.handle.snapshots.borrow_and_update().clone();

        // Handle input
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let was_ended = snap.phase == Phase::Ended;
                    if !app.on_key(key, &snap) {
                        return Ok(());
                    }
                    if was_ended && key.code == KeyCode::Enter {
                        app.set_notice(format!("Result published to {}", result_file.display()));
                    }
                }
            }
        }

        terminal.draw(|f| draw(f, app, &snap))?;
    }
}

fn draw(f: &mut Frame, app: &App, snap: &MatchSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(12),   // Teams + clock
            Constraint::Length(6), // Stoppages
            Constraint::Length(3), // Keys
        ])
        .split(f.size());

    // 1. Header
    let header = Block::default().borders(Borders::ALL).title("ROBO SOCCER LEAGUE");
    let title_text = match &app.notice {
        Some((text, _)) => text.clone(),
        None => "Officiating Console".to_string(),
    };
    let title_style = if app.notice.is_some() {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let title = Paragraph::new(title_text)
        .block(header)
        .alignment(Alignment::Center)
        .style(title_style);
    f.render_widget(title, chunks[0]);

    // 2. Teams and sidebar
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(35),
            Constraint::Percentage(30),
        ])
        .split(chunks[1]);
    draw_team(f, top[0], app, snap, TeamId::A, Color::Green);
    draw_team(f, top[1], app, snap, TeamId::B, Color::Magenta);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(3)])
        .split(top[2]);
    draw_clock(f, side[0], snap);
    draw_log(f, side[1], snap);

    // 3. Stoppages & technical
    draw_stoppages(f, chunks[2], &app.config, snap);

    // 4. Keys
    let keys = Paragraph::new(
        "Enter kick-off/pause/2nd half/publish  Space pause  g goal  f early start  m -1  k tech  \
         t timeout  b bot out  (Shift = team B)  e end timeout  o/n/s stoppage  r resume  \
         F1/F2 rename  Ctrl-R reset  q quit",
    )
    .block(Block::default().borders(Borders::ALL).title("Keys"))
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(keys, chunks[3]);
}

fn draw_team(f: &mut Frame, area: Rect, app: &App, snap: &MatchSnapshot, id: TeamId, accent: Color) {
    let team = snap.team(id);

    let name = match &app.editing {
        Some((editing, buffer)) if *editing == id => format!("{buffer}_"),
        _ => team.name.clone(),
    };

    let mut badges = Vec::new();
    if team.disqualified {
        badges.push(Span::styled(" DISQUALIFIED ", Style::default().fg(Color::White).bg(Color::Red)));
        badges.push(Span::raw(" "));
    }
    if team.is_bot_out {
        badges.push(Span::styled(" BOT OUT ", Style::default().fg(Color::Black).bg(Color::Yellow)));
    }

    let timeout_line = if snap.timeout.for_team == Some(id) {
        "Timeout: IN PROGRESS".to_string()
    } else if team.timeouts_used > 0 {
        "Timeout: used".to_string()
    } else {
        "Timeout: available".to_string()
    };

    let lines = vec![
        Line::from(Span::styled(name, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(badges),
        Line::from(""),
        Line::from(Span::styled(
            team.score.to_string(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(""),
        Line::from(timeout_line),
    ];

    let border = if team.disqualified {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(accent)
    };
    let title = format!("Team {} [{}]", id, if id == TeamId::A { "F1" } else { "F2" });
    let card = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border),
    );
    f.render_widget(card, area);
}

fn draw_clock(f: &mut Frame, area: Rect, snap: &MatchSnapshot) {
    let clock_style = match snap.phase {
        Phase::FirstHalf | Phase::SecondHalf if snap.half_remaining <= 10 => {
            Style::default().fg(Color::Red)
        }
        Phase::HalfTime => Style::default().fg(Color::Yellow),
        Phase::Ended => Style::default().fg(Color::Cyan),
        _ => Style::default(),
    }
    .add_modifier(Modifier::BOLD);

    let status = match snap.phase {
        Phase::PreMatch => "Press Enter for kick-off".to_string(),
        Phase::HalfTime => "Break".to_string(),
        Phase::Ended => snap.result_line().unwrap_or_default(),
        _ if snap.clock_disabled => "Held".to_string(),
        _ if snap.running => "Running".to_string(),
        _ => "Paused".to_string(),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(snap.phase_badge(), Style::default().add_modifier(Modifier::REVERSED)),
            Span::raw(format!(
                "  P: {} • R: {}",
                fmt_clock(snap.total_played),
                fmt_clock(snap.total_remaining)
            )),
        ]),
        Line::from(""),
        Line::from(Span::styled(snap.main_clock(), clock_style)).alignment(Alignment::Center),
        Line::from(""),
        Line::from(status).alignment(Alignment::Center),
    ];
    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Clock"));
    f.render_widget(panel, area);
}

fn draw_log(f: &mut Frame, area: Rect, snap: &MatchSnapshot) {
    let items: Vec<ListItem> = if snap.log.is_empty() {
        vec![ListItem::new("No events yet").style(Style::default().fg(Color::DarkGray))]
    } else {
        snap.log.iter().map(|entry| ListItem::new(entry.to_string())).collect()
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Match Log ({})", snap.log.len())),
    );
    f.render_widget(list, area);
}

fn draw_stoppages(f: &mut Frame, area: Rect, config: &MatchConfig, snap: &MatchSnapshot) {
    let mut lines = Vec::new();

    if let (true, Some(team)) = (snap.timeout.running, snap.timeout.for_team) {
        let style = match snap.timeout_severity {
            Some(TimeoutSeverity::Technical) => Style::default().fg(Color::Red),
            Some(TimeoutSeverity::Overrun) => Style::default().fg(Color::Yellow),
            _ => Style::default(),
        };
        lines.push(Line::from(vec![
            Span::raw(format!("Timeout — {}  ", snap.team(team).name)),
            Span::styled(fmt_clock(snap.timeout.elapsed), style.add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(
                    "   Max {} • Tech @{} • DQ @{}",
                    fmt_clock(config.timeout_allowed_seconds),
                    fmt_clock(config.technical_threshold_seconds),
                    fmt_clock(config.disqualification_threshold_seconds)
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    if let (true, Some(reason)) = (snap.stoppage.running, snap.stoppage.reason) {
        lines.push(Line::from(vec![
            Span::raw(format!("{}  ", reason.tag())),
            Span::styled(
                fmt_clock(snap.stoppage.elapsed),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No timeout or stoppage in progress",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Stoppages & Technical"));
    f.render_widget(panel, area);
}
