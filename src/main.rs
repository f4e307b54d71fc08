//! Keyboard Debouncer - chatter filter with a terminal control panel

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode as CtKeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders, Gauge},
    Terminal,
};
use std::io::stdout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use keyboard_debouncer::{
    config::{config_path, Config},
    control::{Controller, MAX_THRESHOLD_MS},
    debounce::DebounceEngine,
    keyboard::CaptureHookup,
    logging::init_logging,
    ui::{App, AppState, AppView, HelpPanel, StatsPanel, StatusBar, TabBar, ThemeColors},
};

#[cfg(target_os = "linux")]
fn platform_hookup() -> Box<dyn CaptureHookup> {
    log::info!("{}", keyboard_debouncer::keyboard::capture_status());
    Box::new(keyboard_debouncer::keyboard::EvdevHookup::new())
}

#[cfg(not(target_os = "linux"))]
fn platform_hookup() -> Box<dyn CaptureHookup> {
    Box::new(keyboard_debouncer::keyboard::SimulatedHookup::unsupported(
        "system-wide capture is only implemented for Linux",
    ))
}

fn main() -> Result<()> {
    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let log_file = init_logging(&config.logging).context("Failed to open log file")?;
    if let Some(e) = load_error {
        log::warn!("Ignoring unreadable config, using defaults: {}", e);
    }

    let engine = DebounceEngine::new(platform_hookup(), config.debounce.clamped_threshold());
    let mut controller = Controller::new(engine, config.clone());
    match config_path() {
        Ok(path) => controller = controller.with_persistence(path),
        Err(e) => log::warn!("Settings will not be saved: {}", e),
    }

    let quit_requested = Arc::new(AtomicBool::new(false));
    {
        let quit_requested = Arc::clone(&quit_requested);
        ctrlc::set_handler(move || quit_requested.store(true, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")?;
    }

    let mut app = App::new(controller);
    app.startup(Instant::now());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let colors = ThemeColors::from_theme(config.ui.theme);
    let tick_rate = config.refresh_interval();
    let result = run(&mut terminal, &mut app, colors, tick_rate, &quit_requested);

    // Release the keyboard before handing the terminal back
    app.controller.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    println!("\nKeyboard Debouncer stopped.");
    println!("Suppressed events: {}", app.controller.suppressed_count());
    println!("Session duration: {}", app.elapsed_formatted());
    if let Some(path) = log_file {
        println!("Log: {}", path.display());
    }

    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    colors: ThemeColors,
    tick_rate: std::time::Duration,
    quit_requested: &AtomicBool,
) -> Result<()> {
    loop {
        app.tick(Instant::now());

        terminal.draw(|frame| {
            let size = frame.area();
            frame.render_widget(Block::default().style(Style::default().bg(colors.bg)), size);

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1), // Tab bar
                    Constraint::Length(3), // Threshold gauge
                    Constraint::Min(8),    // Main content
                    Constraint::Length(1), // Status bar
                ])
                .split(size);

            let tab_names: Vec<&str> = AppView::all().iter().map(|v| v.name()).collect();
            frame.render_widget(TabBar::new(&tab_names, app.view.index()), chunks[0]);

            let threshold = app.controller.threshold_ms();
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .title(" Threshold ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(colors.dim)),
                )
                .gauge_style(Style::default().fg(colors.gauge).bg(colors.bg))
                .ratio((threshold as f64 / MAX_THRESHOLD_MS as f64).min(1.0))
                .label(format!("{} ms", threshold));
            frame.render_widget(gauge, chunks[1]);

            match app.view {
                AppView::Help => frame.render_widget(HelpPanel::new(colors), chunks[2]),
                _ => {
                    let entries = app.entries();
                    let panel = StatsPanel::new(&entries, app.view.name(), colors);
                    frame.render_widget(panel, chunks[2]);
                }
            }

            let status = app.controller.status();
            let elapsed = app.elapsed_formatted();
            let bar = StatusBar::new(
                status.label(),
                app.view.name(),
                &elapsed,
                app.controller.suppressed_count(),
            )
            .message(app.get_status());
            frame.render_widget(bar, chunks[3]);
        })?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        CtKeyCode::Esc => app.quit(),
                        CtKeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.quit()
                        }
                        CtKeyCode::BackTab => app.prev_view(),
                        CtKeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => {
                            app.prev_view()
                        }
                        CtKeyCode::Tab => app.next_view(),
                        CtKeyCode::Char(c) => {
                            app.handle_key(c, Instant::now());
                        }
                        _ => {}
                    }
                }
            }
        }

        if quit_requested.load(Ordering::SeqCst) {
            app.quit();
        }
        if app.state == AppState::Quitting {
            return Ok(());
        }
    }
}
