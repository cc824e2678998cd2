use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
  action::Action,
  tui::{Event, Frame},
};

pub mod branch_panel;
pub mod error_component;
pub mod instruction_footer;
pub mod trigger_rules;

#[async_trait::async_trait]
pub trait Component: Send + Sync {
  /// Register an action handler that can send actions for processing if necessary.
  ///
  /// # Arguments
  ///
  /// * `tx` - An unbounded sender that can send actions.
  fn register_action_handler(&mut self, _tx: UnboundedSender<Action>) -> Result<()> {
    Ok(())
  }

  /// Handle incoming events and produce actions if necessary.
  async fn handle_events(&mut self, event: Option<Event>) -> Result<Option<Action>> {
    match event {
      Some(Event::Key(key_event)) => self.handle_key_events(key_event).await,
      _ => Ok(None),
    }
  }

  async fn handle_key_events(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
    Ok(None)
  }

  /// Update the state of the component based on a received action.
  ///
  /// # Returns
  ///
  /// * `Result<Option<Action>>` - A follow up action to be processed or none.
  async fn update(&mut self, _action: Action) -> Result<Option<Action>> {
    Ok(None)
  }

  /// Instructions shown in the footer for the component's current state.
  fn instructions(&self) -> Vec<&'static str> {
    vec![]
  }

  /// Render the component on the screen.
  fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()>;
}
