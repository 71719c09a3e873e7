use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use courseadmin_core::models::VideoStatus;
use courseadmin_core::utils::{format_date, format_optional, truncate_string};

use crate::app::{App, Focus};
use crate::ui::styles;

use super::{empty_view_lines, view_title};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_video_table(frame, app, chunks[0]);
    render_video_detail(frame, app, chunks[1]);
}

fn status_style(status: &VideoStatus) -> Style {
    match status {
        VideoStatus::Ready => styles::success_style(),
        VideoStatus::Failed => styles::error_style(),
        VideoStatus::Uploading | VideoStatus::Processing => styles::highlight_style(),
        VideoStatus::Unknown => styles::muted_style(),
    }
}

fn render_video_table(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.video_view();
    let focused = matches!(app.focus, Focus::List);

    let (total, pages) = view
        .data
        .as_ref()
        .map(|p| (p.total, p.total_pages(app.video_params.limit)))
        .unwrap_or((0, 1));
    let title = format!(
        " Videos ({}) page {}/{} ",
        total,
        app.video_params.page,
        pages.max(1)
    );
    let block = Block::default()
        .title(view_title(title, &view))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let videos = view.data.as_ref().map(|p| p.items.as_slice()).unwrap_or_default();
    if videos.is_empty() {
        let paragraph = Paragraph::new(empty_view_lines(&view, "Library is empty")).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Title"),
        Cell::from("Status"),
        Cell::from("Length"),
        Cell::from("Size"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = videos
        .iter()
        .enumerate()
        .map(|(i, video)| {
            let style = if i == app.video_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(truncate_string(&video.title, 40)),
                Cell::from(Span::styled(video.status.label(), status_style(&video.status))),
                Cell::from(format!("{:>8}", video.duration_display())),
                Cell::from(format!("{:>9}", video.size_display())),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Length(11),
        Constraint::Length(9),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.video_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_video_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let Some(video) = app.selected_video() else {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            " Select a video from the list",
            styles::muted_style(),
        )))
        .block(block.title(" No Video Selected "));
        frame.render_widget(paragraph, area);
        return;
    };

    let added = video
        .created_at
        .as_deref()
        .map(format_date)
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(Span::styled(video.title.clone(), styles::title_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Status:    ", styles::muted_style()),
            Span::styled(video.status.label(), status_style(&video.status)),
        ]),
        Line::from(vec![
            Span::styled("File:      ", styles::muted_style()),
            Span::raw(format_optional(&video.file_name, "-")),
        ]),
        Line::from(vec![
            Span::styled("Length:    ", styles::muted_style()),
            Span::raw(video.duration_display()),
        ]),
        Line::from(vec![
            Span::styled("Size:      ", styles::muted_style()),
            Span::raw(video.size_display()),
        ]),
        Line::from(vec![
            Span::styled("Added:     ", styles::muted_style()),
            Span::raw(added),
        ]),
        Line::from(vec![
            Span::styled("Thumbnail: ", styles::muted_style()),
            Span::raw(format_optional(&video.thumbnail_url, "-")),
        ]),
        Line::from(vec![
            Span::styled("ID:        ", styles::muted_style()),
            Span::raw(video.id.clone()),
        ]),
        Line::from(""),
        Line::from(Span::styled("[r] rename  [n] add video  [d] delete", styles::muted_style())),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block.title(" Video "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
