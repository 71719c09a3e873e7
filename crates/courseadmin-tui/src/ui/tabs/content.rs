use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use courseadmin_core::utils::{format_duration, format_optional, truncate_string};

use crate::app::{App, Focus};
use crate::ui::styles;

use super::{empty_view_lines, view_title};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_item_list(frame, app, chunks[0]);
    render_item_detail(frame, app, chunks[1]);
}

fn render_item_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::List);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let (Some(section), Some(view)) = (app.section_id.as_ref(), app.content_view()) else {
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(" No section selected", styles::muted_style())),
            Line::from(Span::styled(
                " Press [s] to choose one, or set default_section_id",
                styles::muted_style(),
            )),
        ])
        .block(block.title(" Content "));
        frame.render_widget(paragraph, area);
        return;
    };

    let rows = view.data.clone().unwrap_or_default();
    let block = block.title(view_title(format!(" Section {} ({}) ", section, rows.len()), &view));

    if rows.is_empty() {
        let paragraph = Paragraph::new(empty_view_lines(&view, "No content items")).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if i == app.content_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let published = if item.published {
                Span::styled("●", styles::success_style())
            } else {
                Span::styled("○", styles::muted_style())
            };
            let line = Line::from(vec![
                Span::raw(format!("{:>3}. ", item.position)),
                published,
                Span::raw(format!(" {:<9}", item.kind.label())),
                Span::raw(truncate_string(&item.title, 40)),
            ]);
            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(app.content_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_item_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let Some(item) = app.selected_content_item() else {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            " Select a content item from the list",
            styles::muted_style(),
        )))
        .block(block.title(" No Item Selected "));
        frame.render_widget(paragraph, area);
        return;
    };

    let status = if item.published {
        Span::styled("Published", styles::success_style())
    } else {
        Span::styled("Draft", styles::muted_style())
    };
    let duration = item
        .duration_seconds
        .map(format_duration)
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(Span::styled(item.title.clone(), styles::title_style())),
        Line::from(""),
        Line::from(vec![Span::styled("Status:   ", styles::muted_style()), status]),
        Line::from(vec![
            Span::styled("Kind:     ", styles::muted_style()),
            Span::raw(item.kind.label()),
        ]),
        Line::from(vec![
            Span::styled("Position: ", styles::muted_style()),
            Span::raw(item.position.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Duration: ", styles::muted_style()),
            Span::raw(duration),
        ]),
        Line::from(vec![
            Span::styled("Video:    ", styles::muted_style()),
            Span::raw(format_optional(&item.video_id, "-")),
        ]),
        Line::from(vec![
            Span::styled("URL:      ", styles::muted_style()),
            Span::raw(format_optional(&item.url, "-")),
        ]),
        Line::from(vec![
            Span::styled("ID:       ", styles::muted_style()),
            Span::raw(item.id.clone()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "[p] publish  [K/J] move  [n] new  [d] delete",
            styles::muted_style(),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block.title(" Item "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
