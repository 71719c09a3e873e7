//! Single-line text prompt.
//!
//! Used to pick the content section and to name new or renamed records.
//! Submitting hands the trimmed text back to the `App`.

use ratatui::{
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::render::centered_rect_fixed;
use super::styles;

const PROMPT_WIDTH: u16 = 56;
const PROMPT_HEIGHT: u16 = 7;

/// Longest text a prompt accepts
pub const MAX_PROMPT_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq)]
pub enum PromptAction {
    /// Choose the section shown on the Content tab
    Section,
    NewContentItem { section_id: String },
    /// Register an uploaded file by its storage key
    AddVideo,
    RenameVideo { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub action: PromptAction,
    pub text: String,
}

impl Prompt {
    pub fn new(action: PromptAction) -> Self {
        Self {
            action,
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut end = text.len().min(MAX_PROMPT_LEN);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        self.text = text[..end].to_string();
        self
    }

    pub fn title(&self) -> &'static str {
        match self.action {
            PromptAction::Section => " Choose Section ",
            PromptAction::NewContentItem { .. } => " New Content Item ",
            PromptAction::AddVideo => " Add Video ",
            PromptAction::RenameVideo { .. } => " Rename Video ",
        }
    }

    pub fn label(&self) -> &'static str {
        match self.action {
            PromptAction::Section => "Section id",
            PromptAction::NewContentItem { .. } | PromptAction::RenameVideo { .. } => "Title",
            PromptAction::AddVideo => "Storage key",
        }
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() && self.text.len() + c.len_utf8() <= MAX_PROMPT_LEN {
            self.text.push(c);
        }
    }

    pub fn pop(&mut self) {
        self.text.pop();
    }

    /// The trimmed text, or `None` when blank
    pub fn value(&self) -> Option<&str> {
        Some(self.text.trim()).filter(|v| !v.is_empty())
    }
}

pub fn render(frame: &mut Frame, prompt: &Prompt) {
    let area = centered_rect_fixed(PROMPT_WIDTH, PROMPT_HEIGHT, frame.area());
    frame.render_widget(Clear, area);

    // Show the tail of long input
    let field_width = (PROMPT_WIDTH as usize).saturating_sub(prompt.label().len() + 9);
    let chars: Vec<char> = prompt.text.chars().collect();
    let shown: String = chars[chars.len().saturating_sub(field_width)..].iter().collect();

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  {}: ", prompt.label()), styles::muted_style()),
            Span::styled(format!("{}▌", shown), styles::selected_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to save, ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(prompt.title())
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing() {
        let mut prompt = Prompt::new(PromptAction::AddVideo);
        assert_eq!(prompt.value(), None);

        for c in " intro.mp4 ".chars() {
            prompt.push(c);
        }
        prompt.push('\n');
        assert_eq!(prompt.value(), Some("intro.mp4"));

        prompt.pop();
        prompt.pop();
        assert_eq!(prompt.value(), Some("intro.mp"));
    }

    #[test]
    fn test_length_is_capped() {
        let mut prompt = Prompt::new(PromptAction::Section).with_text("x".repeat(200));
        assert_eq!(prompt.text.len(), MAX_PROMPT_LEN);
        prompt.push('y');
        assert_eq!(prompt.text.len(), MAX_PROMPT_LEN);
    }

    #[test]
    fn test_labels() {
        let prompt = Prompt::new(PromptAction::RenameVideo { id: "V1".into() });
        assert_eq!(prompt.title(), " Rename Video ");
        assert_eq!(prompt.label(), "Title");
        assert_eq!(Prompt::new(PromptAction::Section).label(), "Section id");
    }
}
