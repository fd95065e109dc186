mod agenda;
mod api;
mod app;
mod calendar;
mod components;
mod config;
mod error;
mod event;
mod theme;
mod tui;

use std::fs::OpenOptions;
use std::sync::Arc;
use std::time::Duration;

use app::{App, AppMessage, InputMode, ViewMode};
use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::{Paragraph, Wrap};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use crate::api::{ApiClient, ReminderSource, Scope};
use crate::calendar::Month;
use crate::config::Config;

const TICK: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(author, version, about = "Pet health reminders in your terminal")]
struct Cli {
    /// Only show reminders for this pet id
    #[arg(long, global = true)]
    pet: Option<String>,

    /// Override the API base URL from config.toml
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one month of reminders and exit
    Agenda {
        /// Month to list as YYYY-MM (defaults to the current month)
        #[arg(long, value_parser = agenda::parse_month)]
        month: Option<Month>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    init_logging(&config);
    theme::init(&config.theme);

    let scope = cli.pet.map(Scope::Pet).unwrap_or_default();
    let client = ApiClient::from_config(&config);
    log::info!("using API at {} ({})", config.api_url, scope);

    match cli.command {
        Some(Command::Agenda { month }) => {
            let month = month.unwrap_or_else(|| Month::from_date(Local::now().date_naive()));
            let text = agenda::month_agenda(client, scope, config.page_size, month).await?;
            print!("{}", text);
            Ok(())
        }
        None => run_tui(Arc::new(client), scope, config.page_size).await,
    }
}

/// Log to a file under the user data dir; the terminal belongs to the TUI.
fn init_logging(config: &Config) {
    let Some(path) = config::log_path() else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

async fn run_tui(source: Arc<dyn ReminderSource>, scope: Scope, page_size: u32) -> Result<()> {
    let (tx, mut rx) = unbounded_channel();
    let mut app = App::new(source, scope, page_size, tx);

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &mut rx).await;
    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    app: &mut App,
    rx: &mut UnboundedReceiver<AppMessage>,
) -> Result<()> {
    app.start();

    while app.running {
        terminal.draw(|frame| draw(frame, app))?;

        tokio::select! {
            Some(msg) = rx.recv() => app.handle_message(msg),
            _ = tokio::time::sleep(TICK) => {}
        }
        while let Ok(msg) = rx.try_recv() {
            app.handle_message(msg);
        }

        while let Some(key) = event::next_key_event()? {
            handle_key(app, key);
        }
    }

    Ok(())
}

fn draw(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
    let content = layout[0];

    if let Some(err) = app.load_error.as_deref().filter(|_| !app.session.is_loaded()) {
        let msg = Paragraph::new(format!(
            "Could not load reminders.\n\n{}\n\nPress 'r' to retry or 'q' to quit.",
            err
        ))
        .style(theme::current().error)
        .wrap(Wrap { trim: false });
        frame.render_widget(msg, content);
    } else {
        match app.view_mode {
            ViewMode::Month => render_month_layout(frame, content, app),
            ViewMode::Day => components::DayView::render(
                frame,
                content,
                app.selected_date,
                &app.session,
                &app.pets,
                app.selected_index,
            ),
        }
    }

    if let Some(form) = &app.form_state {
        components::ReminderForm::render(frame, area, form, &app.pets);
    }

    if app.detail_open {
        if let Some(rem) = app.selected_reminder() {
            components::day_view::render_detail_popup(frame, area, rem, &app.pets);
        }
    }

    if app.show_help {
        components::help::render_help(frame, area);
    }

    components::StatusBar::render(frame, layout[1], app);
}

fn render_month_layout(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let marks = app
        .session
        .index()
        .days_in(Month::from_date(app.selected_date));
    let loading = app.is_loading();

    if area.width < 60 {
        components::MonthView::render(frame, area, app.selected_date, app.today, &marks, loading);
        return;
    }

    let month_w = if area.width >= 100 { 44 } else { 37 };
    let columns = Layout::horizontal([Constraint::Length(month_w), Constraint::Min(20)]).split(area);

    components::MonthView::render(frame, columns[0], app.selected_date, app.today, &marks, loading);
    components::DayView::render(
        frame,
        columns[1],
        app.selected_date,
        &app.session,
        &app.pets,
        app.selected_index,
    );
}

fn handle_key(app: &mut App, key: KeyEvent) {
    app.status_message = None;

    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            app.show_help = false;
        }
        return;
    }

    if app.detail_open {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => app.detail_open = false,
            KeyCode::Char(' ') => app.toggle_selected(),
            _ => {}
        }
        return;
    }

    match app.input_mode {
        InputMode::Form => handle_form_input(app, key.code),
        InputMode::Normal => handle_normal_input(app, key.code, key.modifiers),
    }
}

fn handle_normal_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Char('1'), _) => app.view_mode = ViewMode::Month,
        (KeyCode::Char('2'), _) => app.view_mode = ViewMode::Day,
        (KeyCode::Char('t'), _) => app.go_to_today(),
        (KeyCode::Char('r'), _) => {
            app.refresh();
            app.status_message = Some("Reloading reminders".to_string());
        }
        (KeyCode::Char('p'), _) => app.cycle_scope(),
        (KeyCode::Char('n'), _) => app.open_form(),
        (KeyCode::Char(' '), _) => app.toggle_selected(),
        (KeyCode::Enter, _) => app.show_detail(),
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.prev_day(),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.next_day(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.select_prev(),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.select_next(),
        (KeyCode::Char('['), _) => app.prev_month(),
        (KeyCode::Char(']'), _) => app.next_month(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_form_input(app: &mut App, code: KeyCode) {
    let pet_count = app.pets.len();
    match code {
        KeyCode::Esc => app.close_form(),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Backspace | KeyCode::Char(_) => {
            let Some(form) = app.form_state.as_mut() else {
                return;
            };
            match code {
                KeyCode::Tab => form.active_field = form.active_field.next(),
                KeyCode::BackTab => form.active_field = form.active_field.prev(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(' ') if form.active_field.is_choice() => form.cycle(pet_count),
                KeyCode::Char(c) => form.input_char(c),
                _ => {}
            }
        }
        _ => {}
    }
}
