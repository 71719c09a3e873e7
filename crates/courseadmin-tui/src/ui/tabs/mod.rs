//! Tab-specific content rendering.

pub mod content;
pub mod progress;
pub mod videos;

use ratatui::text::{Line, Span};

use crate::app::View;
use crate::ui::styles;

/// Block title with a freshness marker when the view is not fresh.
fn view_title<T>(title: String, view: &View<T>) -> Line<'static> {
    let mut spans = vec![Span::styled(title, styles::title_style())];
    if let Some(label) = view.status_label() {
        spans.push(Span::styled(format!("[{}] ", label), styles::freshness_style(label)));
    }
    Line::from(spans)
}

/// Placeholder lines for a view that has nothing to show yet.
fn empty_view_lines<T>(view: &View<T>, empty: &str) -> Vec<Line<'static>> {
    let text = match (&view.error, view.pending) {
        (Some(e), _) => return vec![Line::from(Span::styled(format!(" {}", e), styles::error_style()))],
        (None, true) => " Loading...".to_string(),
        (None, false) => format!(" {}", empty),
    };
    vec![Line::from(Span::styled(text, styles::muted_style()))]
}
