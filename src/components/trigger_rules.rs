use std::path::PathBuf;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};
use tracing::{debug, error};

use crate::{
  action::Action,
  components::Component,
  trigger::{RowCell, TriggerRuleEditor, row::TypeCell},
  tui::Frame,
};

const TYPE_COLUMN_WIDTH: u16 = 28;
const SELECTED_SYMBOL: &str = "→ ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditState {
  Selecting,
  Editing,
}

/// Table of trigger rules backed by a rules file.
pub struct TriggerRulesComponent {
  editor: TriggerRuleEditor,
  path: PathBuf,
  selected: usize,
  state: EditState,
  status: Option<String>,
}

impl TriggerRulesComponent {
  pub fn new(mut editor: TriggerRuleEditor, path: PathBuf) -> Result<Self> {
    editor.render_pending_rows()?;
    Ok(TriggerRulesComponent { editor, path, selected: 0, state: EditState::Selecting, status: None })
  }

  pub fn editor(&self) -> &TriggerRuleEditor {
    &self.editor
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn is_editing(&self) -> bool {
    self.state == EditState::Editing
  }

  pub fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }

  fn select_next(&mut self) {
    let count = self.editor.len();
    if count > 0 {
      self.selected = (self.selected + 1) % count;
    }
  }

  fn select_previous(&mut self) {
    let count = self.editor.len();
    if count > 0 {
      self.selected = (self.selected + count - 1) % count;
    }
  }

  fn selected_is_editable(&self) -> bool {
    self
      .editor
      .rows()
      .get(self.selected)
      .and_then(|row| row.value_cell())
      .and_then(|cell| cell.control())
      .is_some_and(|control| !control.instructions().is_empty())
  }

  fn save(&mut self) -> Option<Action> {
    match self.editor.save(&self.path) {
      Ok(()) => {
        self.status = Some(format!("Saved {} rules to {}", self.editor.len(), self.path.display()));
        Some(Action::Render)
      },
      Err(e) => {
        error!("Failed to save rules to {}: {}", self.path.display(), e);
        Some(Action::Error(format!("Failed to save rules to {}: {}", self.path.display(), e)))
      },
    }
  }

  fn render_type_cell(&self, f: &mut Frame<'_>, area: Rect, cell: &TypeCell, focused: bool) {
    let label = cell.selector().selected_label();
    let (text, style) = if focused && self.state == EditState::Selecting {
      (format!("‹ {} ›", label), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else {
      (label.to_string(), Style::default())
    };
    f.render_widget(Paragraph::new(text).style(style), area);
  }

  fn render_row(&self, f: &mut Frame<'_>, area: Rect, index: usize) {
    let Some(row) = self.editor.rows().get(index) else {
      return;
    };
    let focused = index == self.selected;
    let [marker_area, cells_area] =
      Layout::new(Direction::Horizontal, [Constraint::Length(2), Constraint::Fill(1)]).areas(area);
    if focused {
      f.render_widget(Paragraph::new(SELECTED_SYMBOL), marker_area);
    }
    let [type_area, value_area] =
      Layout::new(Direction::Horizontal, [Constraint::Length(TYPE_COLUMN_WIDTH), Constraint::Fill(1)])
        .spacing(1)
        .areas(cells_area);

    for cell in row.cells() {
      match cell {
        RowCell::Type(cell) => self.render_type_cell(f, type_area, cell, focused),
        RowCell::Value(cell) => {
          if let Some(control) = cell.control() {
            control.render(f, value_area, focused && self.state == EditState::Editing);
          }
        },
        RowCell::Invalid(cell) => {
          let style = Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC);
          f.render_widget(Paragraph::new(cell.markup).style(style), cells_area);
        },
      }
    }
  }

  fn render_rules(&self, f: &mut Frame<'_>, area: Rect) {
    let title = format!("Trigger Rules ({})", self.path.display());
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if self.editor.is_empty() {
      let hint = Span::styled("No rules. Press a to add one.", Style::default().add_modifier(Modifier::DIM));
      f.render_widget(Paragraph::new(hint), inner);
      return;
    }

    let [header_area, rows_area] =
      Layout::new(Direction::Vertical, [Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    let header_style = Style::default().add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
      Span::raw("  "),
      Span::styled(format!("{:width$}", "Type", width = TYPE_COLUMN_WIDTH as usize + 1), header_style),
      Span::styled("Value", header_style),
    ]);
    f.render_widget(Paragraph::new(header), header_area);

    let visible = rows_area.height as usize;
    if visible == 0 {
      return;
    }
    let first = self.selected.saturating_sub(visible - 1);
    for (line, index) in (first..self.editor.len()).take(visible).enumerate() {
      let area = Rect { y: rows_area.y + line as u16, height: 1, ..rows_area };
      self.render_row(f, area, index);
    }
  }
}

#[async_trait::async_trait]
impl Component for TriggerRulesComponent {
  async fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
    if self.state == EditState::Editing {
      return match key.code {
        KeyCode::Esc | KeyCode::Enter => Ok(Some(Action::EndInputMode)),
        _ => {
          let changed = self.editor.row_mut(self.selected).is_some_and(|row| row.handle_value_key(key));
          Ok(changed.then_some(Action::Render))
        },
      };
    }

    let action = match key.code {
      KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
      KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrevious),
      KeyCode::Right | KeyCode::Char('l') => Some(Action::ChangeRuleType(true)),
      KeyCode::Left | KeyCode::Char('h') => Some(Action::ChangeRuleType(false)),
      KeyCode::Enter if self.selected_is_editable() => Some(Action::EditRuleValue),
      KeyCode::Char('a') => Some(Action::AddRule),
      KeyCode::Char('d') if !self.editor.is_empty() => Some(Action::RemoveRule),
      KeyCode::Char('s') => Some(Action::SaveRules),
      _ => None,
    };
    Ok(action)
  }

  async fn update(&mut self, action: Action) -> Result<Option<Action>> {
    match action {
      Action::SelectNext => {
        self.select_next();
        Ok(Some(Action::Render))
      },
      Action::SelectPrevious => {
        self.select_previous();
        Ok(Some(Action::Render))
      },
      Action::ChangeRuleType(forward) => {
        let changed = self.editor.change_type(self.selected, forward)?;
        Ok(changed.then_some(Action::Render))
      },
      Action::EditRuleValue => {
        if !self.selected_is_editable() {
          return Ok(None);
        }
        self.state = EditState::Editing;
        Ok(Some(Action::StartInputMode))
      },
      Action::EndInputMode => {
        self.state = EditState::Selecting;
        Ok(Some(Action::Render))
      },
      Action::AddRule => {
        self.selected = self.editor.add_row()?;
        self.status = None;
        debug!("Added rule at {}", self.selected);
        Ok(Some(Action::Render))
      },
      Action::RemoveRule => {
        if self.editor.remove_row(self.selected).is_some() {
          self.selected = self.selected.min(self.editor.len().saturating_sub(1));
          self.status = None;
        }
        Ok(Some(Action::Render))
      },
      Action::SaveRules => Ok(self.save()),
      _ => Ok(None),
    }
  }

  fn instructions(&self) -> Vec<&'static str> {
    if self.state == EditState::Editing {
      let mut instructions = self
        .editor
        .rows()
        .get(self.selected)
        .and_then(|row| row.value_cell())
        .and_then(|cell| cell.control())
        .map(|control| control.instructions())
        .unwrap_or_default();
      instructions.push("esc: Done");
      return instructions;
    }

    let mut instructions = vec!["a: Add", "s: Save"];
    if !self.editor.is_empty() {
      instructions.extend(["↑/↓: Select", "←/→: Change type", "d: Remove"]);
    }
    if self.selected_is_editable() {
      instructions.push("enter: Edit value");
    }
    instructions
  }

  fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
    match &self.status {
      Some(status) => {
        let [rules_area, status_area] =
          Layout::new(Direction::Vertical, [Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        self.render_rules(f, rules_area);
        f.render_widget(Paragraph::new(status.as_str()).style(Style::default().fg(Color::Green)), status_area);
      },
      None => self.render_rules(f, area),
    }
    Ok(())
  }
}
