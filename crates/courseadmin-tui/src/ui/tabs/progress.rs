use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use courseadmin_core::utils::{format_date, format_optional, format_percent, truncate_string};

use crate::app::{App, Focus};
use crate::ui::styles;

use super::{empty_view_lines, view_title};

/// Render the Progress tab - learner list and enrollment breakdown
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_learner_table(frame, app, chunks[0]);
    render_enrollment_detail(frame, app, chunks[1]);
}

fn render_learner_table(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.progress_view();
    let focused = matches!(app.focus, Focus::List);

    let (total, pages) = view
        .data
        .as_ref()
        .map(|p| (p.total, p.total_pages(app.progress_params.limit)))
        .unwrap_or((0, 1));
    let title = format!(
        " Learners ({}) page {}/{} ",
        total,
        app.progress_params.page,
        pages.max(1)
    );
    let block = Block::default()
        .title(view_title(title, &view))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let rows_data = view.data.as_ref().map(|p| p.items.as_slice()).unwrap_or_default();
    if rows_data.is_empty() {
        let paragraph = Paragraph::new(empty_view_lines(&view, "No learners")).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Learner"),
        Cell::from("Course"),
        Cell::from("Done"),
        Cell::from("Last activity"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = rows_data
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i == app.progress_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let done_style = if row.is_complete() {
                styles::success_style()
            } else {
                style
            };
            let last = row
                .last_activity_at
                .as_deref()
                .map(format_date)
                .unwrap_or_else(|| "-".to_string());

            Row::new(vec![
                Cell::from(truncate_string(&row.name, 24)),
                Cell::from(truncate_string(&row.course_title, 28)),
                Cell::from(Span::styled(format!("{:>4}", format_percent(row.percent_complete)), done_style)),
                Cell::from(last),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(30),
        Constraint::Fill(2),
        Constraint::Length(5),
        Constraint::Length(13),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.progress_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_enrollment_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let (Some(row), Some(view)) = (app.selected_progress(), app.enrollment_view()) else {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            " Select a learner from the list",
            styles::muted_style(),
        )))
        .block(block.title(" No Learner Selected "));
        frame.render_widget(paragraph, area);
        return;
    };

    let block = block.title(view_title(format!(" {} ", row.name), &view));

    let Some(ref detail) = view.data else {
        let paragraph = Paragraph::new(empty_view_lines(&view, "No progress recorded")).block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    // The summary view is authoritative once loaded
    let completed = match app.summary_view().and_then(|v| v.data) {
        Some(summary) => format!(
            "{}/{} lessons ({})",
            summary.completed_lessons,
            summary.total_lessons,
            format_percent(summary.percent())
        ),
        None => format!("{}/{} lessons", detail.completed_count(), detail.lesson_count()),
    };

    let mut lines = vec![
        Line::from(Span::styled(detail.course_title.clone(), styles::title_style())),
        Line::from(vec![
            Span::styled("Email:     ", styles::muted_style()),
            Span::raw(format_optional(&row.email, "-")),
        ]),
        Line::from(vec![
            Span::styled("Completed: ", styles::muted_style()),
            Span::raw(completed),
        ]),
        Line::from(vec![
            Span::styled("Updated:   ", styles::muted_style()),
            Span::raw(view.age.clone()),
        ]),
        Line::from(""),
    ];

    let mut index = 0;
    for topic in &detail.topics {
        lines.push(Line::from(Span::styled(topic.title.clone(), styles::highlight_style())));
        if topic.lessons.is_empty() {
            lines.push(Line::from(Span::styled("  No lessons", styles::muted_style())));
        }
        for lesson in &topic.lessons {
            let (mark, mark_style) = if lesson.completed {
                ("✓", styles::success_style())
            } else {
                ("○", styles::muted_style())
            };
            let style = if focused && index == app.lesson_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let when = lesson
                .completed_at
                .as_deref()
                .map(|d| format!("  {}", format_date(d)))
                .unwrap_or_default();
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(mark, mark_style),
                Span::styled(format!(" {}", lesson.title), style),
                Span::styled(when, styles::muted_style()),
            ]));
            index += 1;
        }
    }

    if focused {
        lines.extend(selected_lesson_lines(app));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "[space] toggle completed  [Esc] back",
            styles::muted_style(),
        )));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Topic and lesson records behind the highlighted lesson
fn selected_lesson_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(view) = app.topic_view() {
        if let Some(ref topic) = view.data {
            let done = topic.lessons.iter().filter(|l| l.completed).count();
            lines.push(Line::from(vec![
                Span::styled("Topic:     ", styles::muted_style()),
                Span::raw(format!("{} ({}/{} done)", topic.title, done, topic.lessons.len())),
            ]));
        }
    }
    if let Some(view) = app.lesson_view() {
        if let Some(ref lesson) = view.data {
            let state = match lesson.completed_at.as_deref() {
                Some(at) => format!("completed {}", format_date(at)),
                None if lesson.completed => "completed".to_string(),
                None => "not completed".to_string(),
            };
            let mut spans = vec![
                Span::styled("Lesson:    ", styles::muted_style()),
                Span::raw(format!("{}, {} ", lesson.title, state)),
            ];
            if let Some(label) = view.status_label() {
                spans.push(Span::styled(format!("[{}]", label), styles::freshness_style(label)));
            }
            lines.push(Line::from(spans));
        }
    }
    if !lines.is_empty() {
        lines.insert(0, Line::from(""));
    }
    lines
}
