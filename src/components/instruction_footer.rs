use ratatui::{
  layout::Rect,
  style::{Color, Style},
  widgets::{Block, Borders, Paragraph},
};

use crate::tui::Frame;

#[derive(Debug, Default)]
pub struct InstructionFooter {}

impl InstructionFooter {
  pub fn text(instructions: &[&str]) -> String {
    instructions.join(" | ")
  }

  pub fn render(&self, frame: &mut Frame<'_>, area: Rect, instructions: Vec<&'static str>) {
    if instructions.is_empty() {
      return;
    }

    let paragraph = Paragraph::new(Self::text(&instructions))
      .block(Block::default().borders(Borders::ALL))
      .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
  }
}
