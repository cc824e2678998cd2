use std::sync::atomic::{AtomicU64, Ordering};

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::Paragraph,
};
use serde_json::Value;
use tui_textarea::{CursorMove, Input, TextArea};

use crate::tui::Frame;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a rendered cell or control, stable for the element's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

impl ElementId {
  pub fn next() -> Self {
    ElementId(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
  }
}

/// A value input bound to one rule type. Values are pulled with `read`, never pushed.
pub trait ValueControl: Send + Sync {
  fn id(&self) -> ElementId;

  /// Current value held by the control.
  fn read(&self) -> Value;

  /// Feeds a key press to the control, returning whether its value changed.
  fn handle_key_event(&mut self, _key: KeyEvent) -> bool {
    false
  }

  fn render(&self, frame: &mut Frame<'_>, area: Rect, focused: bool);

  fn instructions(&self) -> Vec<&'static str> {
    vec![]
  }
}

fn focus_style(focused: bool) -> Style {
  if focused { Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD) } else { Style::default() }
}

pub struct TextControl {
  id: ElementId,
  text_input: TextArea<'static>,
  // A non-text hydrated value, read back as is until the text is edited.
  preserved: Option<Value>,
}

impl TextControl {
  pub fn new(initial: &Value) -> Self {
    let (text, preserved) = match initial {
      Value::String(text) => (text.clone(), None),
      Value::Null => (String::new(), None),
      other => (other.to_string(), Some(other.clone())),
    };
    let mut text_input = TextArea::new(vec![text]);
    text_input.set_cursor_line_style(Style::default());
    text_input.move_cursor(CursorMove::End);
    TextControl { id: ElementId::next(), text_input, preserved }
  }

  pub fn text(&self) -> String {
    self.text_input.lines().first().map(|line| line.trim().to_string()).unwrap_or_default()
  }
}

impl ValueControl for TextControl {
  fn id(&self) -> ElementId {
    self.id
  }

  fn read(&self) -> Value {
    match &self.preserved {
      Some(value) => value.clone(),
      None => Value::String(self.text()),
    }
  }

  fn handle_key_event(&mut self, key: KeyEvent) -> bool {
    let changed = match key.code {
      // Single line input.
      KeyCode::Enter => false,
      _ => self.text_input.input(Input::from(key)),
    };
    if changed {
      self.preserved = None;
    }
    changed
  }

  fn render(&self, frame: &mut Frame<'_>, area: Rect, focused: bool) {
    if focused {
      frame.render_widget(&self.text_input, area);
    } else {
      let text = self.text();
      let line = if text.is_empty() {
        Line::from(Span::styled("(empty)", Style::default().add_modifier(Modifier::DIM)))
      } else {
        Line::from(text)
      };
      frame.render_widget(Paragraph::new(line), area);
    }
  }

  fn instructions(&self) -> Vec<&'static str> {
    vec!["type: Edit"]
  }
}

/// Picks one of a fixed set of `(value, label)` options.
/// A hydrated value that is not one of the options is kept until the user picks one.
pub struct ChoiceControl {
  id: ElementId,
  options: &'static [(&'static str, &'static str)],
  selected: usize,
  preserved: Option<Value>,
}

impl ChoiceControl {
  pub fn new(options: &'static [(&'static str, &'static str)], initial: &Value) -> Self {
    let position = initial.as_str().and_then(|initial| options.iter().position(|(value, _label)| *value == initial));
    let preserved = match (position, initial) {
      (None, Value::Null) | (Some(_), _) => None,
      (None, other) => Some(other.clone()),
    };
    ChoiceControl { id: ElementId::next(), options, selected: position.unwrap_or_default(), preserved }
  }

  fn cycle(&mut self, forward: bool) -> bool {
    let count = self.options.len();
    if self.preserved.is_some() && count > 0 {
      self.preserved = None;
      self.selected = if forward { 0 } else { count - 1 };
      return true;
    }
    if count < 2 {
      return false;
    }
    self.selected = if forward { (self.selected + 1) % count } else { (self.selected + count - 1) % count };
    true
  }

  fn label(&self) -> String {
    match &self.preserved {
      Some(Value::String(value)) => value.clone(),
      Some(value) => value.to_string(),
      None => self.options.get(self.selected).map(|(_value, label)| label.to_string()).unwrap_or_default(),
    }
  }
}

impl ValueControl for ChoiceControl {
  fn id(&self) -> ElementId {
    self.id
  }

  fn read(&self) -> Value {
    if let Some(value) = &self.preserved {
      return value.clone();
    }
    self.options.get(self.selected).map(|(value, _label)| Value::String(value.to_string())).unwrap_or(Value::Null)
  }

  fn handle_key_event(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Left | KeyCode::Char('h') => self.cycle(false),
      KeyCode::Right | KeyCode::Char('l' | ' ') => self.cycle(true),
      _ => false,
    }
  }

  fn render(&self, frame: &mut Frame<'_>, area: Rect, focused: bool) {
    let label = self.label();
    let line = if focused { Line::from(format!("‹ {} ›", label)) } else { Line::from(label) };
    frame.render_widget(Paragraph::new(line).style(focus_style(focused)), area);
  }

  fn instructions(&self) -> Vec<&'static str> {
    vec!["←/→: Choose"]
  }
}

pub struct ToggleControl {
  id: ElementId,
  enabled: bool,
  // A non-boolean hydrated value, read back until the first toggle.
  preserved: Option<Value>,
}

impl ToggleControl {
  pub fn new(initial: &Value) -> Self {
    let preserved = match initial {
      Value::Bool(_) | Value::Null => None,
      other => Some(other.clone()),
    };
    ToggleControl { id: ElementId::next(), enabled: initial.as_bool().unwrap_or(false), preserved }
  }
}

impl ValueControl for ToggleControl {
  fn id(&self) -> ElementId {
    self.id
  }

  fn read(&self) -> Value {
    match &self.preserved {
      Some(value) => value.clone(),
      None => Value::Bool(self.enabled),
    }
  }

  fn handle_key_event(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char(' ') => {
        self.enabled = !self.enabled;
        self.preserved = None;
        true
      },
      _ => false,
    }
  }

  fn render(&self, frame: &mut Frame<'_>, area: Rect, focused: bool) {
    let text = match &self.preserved {
      Some(value) => format!("[?] {}", value),
      None if self.enabled => "[x] Enabled".to_string(),
      None => "[ ] Disabled".to_string(),
    };
    frame.render_widget(Paragraph::new(text).style(focus_style(focused)), area);
  }

  fn instructions(&self) -> Vec<&'static str> {
    vec!["space: Toggle"]
  }
}

/// A read-only control that hands back the value it was created with.
pub struct StaticControl {
  id: ElementId,
  label: String,
  value: Value,
}

impl StaticControl {
  pub fn new(label: impl Into<String>, value: Value) -> Self {
    StaticControl { id: ElementId::next(), label: label.into(), value }
  }
}

impl ValueControl for StaticControl {
  fn id(&self) -> ElementId {
    self.id
  }

  fn read(&self) -> Value {
    self.value.clone()
  }

  fn render(&self, frame: &mut Frame<'_>, area: Rect, _focused: bool) {
    let paragraph = Paragraph::new(self.label.as_str()).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
  }
}
