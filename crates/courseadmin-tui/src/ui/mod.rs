//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Main frame rendering and layout
//! - `input`: Keyboard event handling
//! - `confirm`: Confirmation dialog for deletes
//! - `prompt`: Single-line text prompt
//! - `styles`: Color schemes and text styling
//! - `tabs`: Tab-specific content rendering (progress, content, videos)

pub mod confirm;
pub mod input;
pub mod prompt;
pub mod render;
pub mod styles;
pub mod tabs;
