//! Confirmation dialog for destructive operations.
//!
//! A delete is staged as a `PendingDelete` and only dispatched after the
//! user accepts the dialog.

use ratatui::{
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use serde_json::{json, Value};

use courseadmin_core::cache::MutationKind;
use courseadmin_core::catalog;
use courseadmin_core::utils::truncate_string;

use super::render::centered_rect_fixed;
use super::styles;

const DIALOG_WIDTH: u16 = 56;
const DIALOG_HEIGHT: u16 = 9;

#[derive(Debug, Clone, PartialEq)]
pub enum PendingDelete {
    Progress {
        enrollment_id: String,
        learner: String,
        course: String,
    },
    ContentItem {
        id: String,
        section_id: String,
        title: String,
    },
    Video {
        id: String,
        title: String,
    },
}

impl PendingDelete {
    pub fn kind(&self) -> MutationKind {
        match self {
            PendingDelete::Progress { .. } => catalog::DELETE_PROGRESS,
            PendingDelete::ContentItem { .. } => catalog::DELETE_CONTENT_ITEM,
            PendingDelete::Video { .. } => catalog::DELETE_VIDEO,
        }
    }

    /// Mutation input, shaped the way the invalidation rules read it
    pub fn input(&self) -> Value {
        match self {
            PendingDelete::Progress { enrollment_id, .. } => json!({ "enrollmentId": enrollment_id }),
            PendingDelete::ContentItem { id, section_id, .. } => json!({ "id": id, "sectionId": section_id }),
            PendingDelete::Video { id, .. } => json!({ "id": id }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PendingDelete::Progress { learner, course, .. } => {
                format!("all progress of {} in {}", learner, course)
            }
            PendingDelete::ContentItem { title, .. } => format!("content item \"{}\"", title),
            PendingDelete::Video { title, .. } => format!("video \"{}\"", title),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmDialog {
    pub action: PendingDelete,
}

impl ConfirmDialog {
    pub fn new(action: PendingDelete) -> Self {
        Self { action }
    }

    pub fn title(&self) -> String {
        format!(" {}? ", catalog::label(&self.action.kind()))
    }
}

pub fn render(frame: &mut Frame, dialog: &ConfirmDialog) {
    let area = centered_rect_fixed(DIALOG_WIDTH, DIALOG_HEIGHT, frame.area());
    frame.render_widget(Clear, area);

    let target = truncate_string(&dialog.action.describe(), (DIALOG_WIDTH - 6) as usize);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("  This will permanently delete", styles::highlight_style())),
        Line::from(Span::styled(format!("  {}", target), styles::list_item_style())),
        Line::from(""),
        Line::from(Span::styled("  It cannot be undone.", styles::muted_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(dialog.title())
        .title_style(styles::error_style())
        .borders(Borders::ALL)
        .border_style(styles::error_style())
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_delete_inputs_match_rules() {
        let progress = PendingDelete::Progress {
            enrollment_id: "E1".into(),
            learner: "Ada".into(),
            course: "Rust".into(),
        };
        assert_eq!(progress.kind(), catalog::DELETE_PROGRESS);
        assert_eq!(progress.input(), json!({"enrollmentId": "E1"}));

        let item = PendingDelete::ContentItem {
            id: "C1".into(),
            section_id: "S1".into(),
            title: "Intro".into(),
        };
        assert_eq!(item.kind(), catalog::DELETE_CONTENT_ITEM);
        assert_eq!(item.input(), json!({"id": "C1", "sectionId": "S1"}));
    }

    #[test]
    fn test_dialog_title_uses_label() {
        let dialog = ConfirmDialog::new(PendingDelete::Video {
            id: "V1".into(),
            title: "Intro".into(),
        });
        assert_eq!(dialog.title(), " Delete video? ");
        assert_eq!(dialog.action.describe(), "video \"Intro\"");
    }
}
