//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, Focus, Tab, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::Confirming(_) => {
            handle_confirm_input(app, key);
            return Ok(false);
        }
        AppState::Prompting(_) => {
            handle_prompt_input(app, key);
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('1') => app.switch_tab(Tab::Progress),
        KeyCode::Char('2') => app.switch_tab(Tab::Content),
        KeyCode::Char('3') => app.switch_tab(Tab::Videos),
        KeyCode::Left => app.switch_tab(app.current_tab.prev()),
        KeyCode::Right => app.switch_tab(app.current_tab.next()),
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
        }
        KeyCode::Esc => app.focus = Focus::List,
        KeyCode::Char('u') => app.refresh_current_tab(),
        KeyCode::Char('s') => app.open_section_prompt(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('[') => app.prev_page(),
        KeyCode::Char(']') => app.next_page(),
        KeyCode::Up | KeyCode::Char('k') => move_selection(app, -1),
        KeyCode::Down | KeyCode::Char('j') => move_selection(app, 1),
        KeyCode::PageUp => move_selection(app, -(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => move_selection(app, PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => *app.current_selection_mut() = 0,
        KeyCode::End => {
            let last = app.current_list_len().saturating_sub(1);
            *app.current_selection_mut() = last;
        }
        _ => match app.current_tab {
            Tab::Progress => handle_progress_input(app, key),
            Tab::Content => handle_content_input(app, key),
            Tab::Videos => handle_videos_input(app, key),
        },
    }

    Ok(false)
}

fn handle_confirm_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_dialog(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_dialog(),
        _ => {}
    }
}

fn handle_prompt_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Backspace => {
            if let AppState::Prompting(ref mut prompt) = app.state {
                prompt.pop();
            }
        }
        KeyCode::Char(c) => {
            if let AppState::Prompting(ref mut prompt) = app.state {
                prompt.push(c);
            }
        }
        _ => {}
    }
}

fn handle_progress_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.select_enrollment(),
        KeyCode::Char(' ') | KeyCode::Char('c') if app.focus == Focus::Detail => {
            app.toggle_selected_lesson();
        }
        _ => {}
    }
}

fn handle_content_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('p') => app.toggle_publish_selected_item(),
        KeyCode::Char('n') => app.request_new_content_item(),
        KeyCode::Char('K') => app.move_selected_item(-1),
        KeyCode::Char('J') => app.move_selected_item(1),
        _ => {}
    }
}

fn handle_videos_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') => app.request_add_video(),
        KeyCode::Char('r') => app.request_rename_video(),
        _ => {}
    }
}

/// Move the focused list's selection, clamped to the list bounds
fn move_selection(app: &mut App, delta: isize) {
    let len = app.current_list_len();
    if len == 0 {
        return;
    }
    let selection = app.current_selection_mut();
    let next = (*selection as isize + delta).clamp(0, len as isize - 1);
    *selection = next as usize;
}
