use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

use crate::budget::Budget;
use crate::ui::app::{App, InputMode, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

pub(crate) fn as_tui(budget: &Budget) -> Result<()> {
    let mut app = App::new(budget);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, budget);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        log::error!("tui exited with error: {e:#}");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    budget: &Budget,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            // Tab bar, status bar and command bar.
            let content_height = f.area().height.saturating_sub(3) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.show_help {
                app.show_help = false;
                continue;
            }
            match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, budget)?,
                InputMode::Command => handle_command_input(key, app, budget)?,
                InputMode::Confirm => handle_confirm_input(key, app, budget),
            }
        }
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: KeyEvent, app: &mut App, budget: &Budget) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
        }
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('1') => switch_screen(app, budget, Screen::Dashboard),
        KeyCode::Char('2') => switch_screen(app, budget, Screen::Categories),
        KeyCode::Char('3') => switch_screen(app, budget, Screen::Transactions),
        KeyCode::Char('4') => switch_screen(app, budget, Screen::Alerts),
        KeyCode::Tab => {
            let next = cycle_screen(app.screen, 1);
            switch_screen(app, budget, next);
        }
        KeyCode::BackTab => {
            let prev = cycle_screen(app.screen, -1);
            switch_screen(app, budget, prev);
        }
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Char('r') => {
            app.refresh_all(budget);
            app.set_status("Refreshed");
        }
        KeyCode::Char('D') if app.screen == Screen::Categories => {
            commands::handle_command("delete-category", app, budget)?;
        }
        KeyCode::Char('D') if app.screen == Screen::Transactions => {
            commands::handle_command("delete-txn", app, budget)?;
        }
        KeyCode::Esc => {
            app.status_message.clear();
        }
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: KeyEvent, app: &mut App, budget: &Budget) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            // A command may itself switch to Confirm mode.
            commands::handle_command(&input, app, budget)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_confirm_input(key: KeyEvent, app: &mut App, budget: &Budget) {
    app.input_mode = InputMode::Normal;
    app.confirm_message.clear();
    let action = app.pending_action.take();
    match (key.code, action) {
        (KeyCode::Char('y') | KeyCode::Char('Y'), Some(action)) => {
            commands::execute_pending(action, app, budget);
        }
        _ => app.set_status("Cancelled"),
    }
}

// ── Navigation ───────────────────────────────────────────────

fn cycle_screen(current: Screen, step: isize) -> Screen {
    let screens = Screen::all();
    let pos = screens.iter().position(|s| *s == current).unwrap_or(0) as isize;
    let len = screens.len() as isize;
    screens[(pos + step).rem_euclid(len) as usize]
}

fn switch_screen(app: &mut App, budget: &Budget, screen: Screen) {
    app.screen = screen;
    app.refresh_all(budget);
    app.set_status(format!("{screen}"));
}

/// Rows available to a table body: block borders plus the header row.
fn page(app: &App) -> usize {
    app.visible_rows.saturating_sub(3).max(1)
}

fn handle_move_down(app: &mut App) {
    let page = page(app);
    match app.screen {
        Screen::Categories => scroll_down(
            &mut app.category_index,
            &mut app.category_scroll,
            app.summary.categories.len(),
            page,
        ),
        Screen::Transactions => scroll_down(
            &mut app.transaction_index,
            &mut app.transaction_scroll,
            app.transactions.len(),
            page,
        ),
        Screen::Alerts => scroll_down(
            &mut app.alert_index,
            &mut app.alert_scroll,
            app.summary.alerts.len(),
            page,
        ),
        Screen::Dashboard => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Categories => scroll_up(&mut app.category_index, &mut app.category_scroll),
        Screen::Transactions => {
            scroll_up(&mut app.transaction_index, &mut app.transaction_scroll)
        }
        Screen::Alerts => scroll_up(&mut app.alert_index, &mut app.alert_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Categories => scroll_to_top(&mut app.category_index, &mut app.category_scroll),
        Screen::Transactions => {
            scroll_to_top(&mut app.transaction_index, &mut app.transaction_scroll)
        }
        Screen::Alerts => scroll_to_top(&mut app.alert_index, &mut app.alert_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    let page = page(app);
    match app.screen {
        Screen::Categories => scroll_to_bottom(
            &mut app.category_index,
            &mut app.category_scroll,
            app.summary.categories.len(),
            page,
        ),
        Screen::Transactions => scroll_to_bottom(
            &mut app.transaction_index,
            &mut app.transaction_scroll,
            app.transactions.len(),
            page,
        ),
        Screen::Alerts => scroll_to_bottom(
            &mut app.alert_index,
            &mut app.alert_scroll,
            app.summary.alerts.len(),
            page,
        ),
        Screen::Dashboard => {}
    }
}
