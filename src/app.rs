use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  widgets::Tabs,
};
use tokio::sync::mpsc;

use crate::{
  action::Action,
  branches::BranchPanel,
  cli::Cli,
  components::{
    Component, branch_panel::BranchPanelComponent, error_component::ErrorComponent,
    instruction_footer::InstructionFooter, trigger_rules::TriggerRulesComponent,
  },
  config::{Backend, Config},
  git::{BranchQueryService, Git2Repo, GitCliRepo},
  mode::Mode,
  trigger::{RuleTypeRegistry, TriggerRuleEditor},
  tui::{self, Frame, Tui},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
  Branches,
  TriggerRules,
  Error,
}

impl View {
  fn tab_index(&self) -> usize {
    match self {
      View::TriggerRules => 1,
      _ => 0,
    }
  }
}

/// Keys the app handles itself before the active view sees them.
fn global_action(mode: Mode, view: View, key: KeyEvent) -> Option<Action> {
  match key {
    KeyEvent { code: KeyCode::Char('c' | 'C'), modifiers: KeyModifiers::CONTROL, .. } => Some(Action::Quit),
    KeyEvent { code: KeyCode::Char('z'), modifiers: KeyModifiers::CONTROL, .. } => Some(Action::Suspend),
    _ if mode == Mode::Input || view == View::Error => None,
    KeyEvent { code: KeyCode::Char('q'), .. } => Some(Action::Quit),
    KeyEvent { code: KeyCode::Tab, .. } => Some(Action::ToggleView),
    _ => None,
  }
}

pub struct App {
  pub branch_panel: Box<dyn Component>,
  pub trigger_rules: Box<dyn Component>,
  pub error: ErrorComponent,
  pub instruction_footer: InstructionFooter,
  pub tick_rate: f64,
  pub frame_rate: f64,
  pub should_quit: bool,
  pub should_suspend: bool,
  pub mode: Mode,
  pub view: View,
  pub previous_view: View,
}

impl App {
  pub fn new(cli: &Cli) -> Result<Self> {
    let config = Config::new(cli.config.as_deref())?;
    let query: Arc<dyn BranchQueryService> = match config.backend {
      Backend::Git2 => Arc::new(Git2Repo::from_cwd()?),
      Backend::Cli => Arc::new(GitCliRepo::from_cwd()?),
    };
    let page_size = cli.page_size.unwrap_or(config.panel.page_size);
    let panel = BranchPanel::new(config.repository.clone())?;
    let branch_panel = BranchPanelComponent::new(panel, query, page_size);

    let rules_path = cli.rules.clone().unwrap_or_else(|| config.rules_path());
    let registry = Arc::new(RuleTypeRegistry::with_builtin_types());
    let editor = TriggerRuleEditor::load(registry, &rules_path)?;
    let trigger_rules = TriggerRulesComponent::new(editor, rules_path)?;

    Ok(Self {
      branch_panel: Box::new(branch_panel),
      trigger_rules: Box::new(trigger_rules),
      error: ErrorComponent::default(),
      instruction_footer: InstructionFooter::default(),
      tick_rate: cli.tick_rate,
      frame_rate: cli.frame_rate,
      should_quit: false,
      should_suspend: false,
      mode: Mode::Default,
      view: View::Branches,
      previous_view: View::Branches,
    })
  }

  fn active_component(&mut self) -> &mut dyn Component {
    match self.view {
      View::Branches => self.branch_panel.as_mut(),
      View::TriggerRules => self.trigger_rules.as_mut(),
      View::Error => &mut self.error,
    }
  }

  // Branch loading runs in the background, so its actions reach the panel whichever view is shown.
  fn component_for(&mut self, action: &Action) -> &mut dyn Component {
    match action {
      Action::Refresh | Action::BranchesLoaded => self.branch_panel.as_mut(),
      _ => self.active_component(),
    }
  }

  fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
    let [tabs_area, body_area, footer_area] =
      Layout::new(Direction::Vertical, [Constraint::Length(1), Constraint::Fill(1), Constraint::Length(3)])
        .areas(area);

    let tabs = Tabs::new(vec!["Branches", "Trigger Rules"])
      .select(self.view.tab_index())
      .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, tabs_area);

    let mut instructions = self.active_component().instructions();
    if self.mode == Mode::Default && self.view != View::Error {
      instructions.extend(["tab: Switch view", "q: Quit"]);
    }
    self.active_component().draw(f, body_area)?;
    self.instruction_footer.render(f, footer_area, instructions);
    Ok(())
  }

  fn render(&mut self, tui: &mut Tui, action_tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
    tui.draw(|f| {
      let area = f.area();
      if let Err(e) = self.draw(f, area) {
        let _ = action_tx.send(Action::Error(format!("Failed to draw: {:?}", e)));
      }
    })?;
    Ok(())
  }

  pub async fn run(&mut self) -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel();

    let mut tui = Tui::new()?.tick_rate(self.tick_rate).frame_rate(self.frame_rate);
    tui.enter()?;

    self.branch_panel.register_action_handler(action_tx.clone())?;
    self.trigger_rules.register_action_handler(action_tx.clone())?;
    self.error.register_action_handler(action_tx.clone())?;

    loop {
      if let Some(e) = tui.next().await {
        match e {
          tui::Event::Quit => action_tx.send(Action::Quit)?,
          tui::Event::Tick => action_tx.send(Action::Tick)?,
          tui::Event::Render => action_tx.send(Action::Render)?,
          tui::Event::Resize(x, y) => action_tx.send(Action::Resize(x, y))?,
          tui::Event::Key(key) => {
            if let Some(action) = global_action(self.mode, self.view, key) {
              action_tx.send(action)?;
            }
          },
          _ => {},
        }

        if let Some(action) = self.active_component().handle_events(Some(e.clone())).await? {
          action_tx.send(action)?;
        }
      }

      while let Ok(action) = action_rx.try_recv() {
        if action != Action::Tick && action != Action::Render {
          log::debug!("{action:?}");
        }

        match &action {
          Action::StartInputMode => self.mode = Mode::Input,
          Action::EndInputMode => self.mode = Mode::Default,
          Action::Quit => self.should_quit = true,
          Action::Suspend => self.should_suspend = true,
          Action::Resume => self.should_suspend = false,
          Action::ToggleView => {
            self.view = match self.view {
              View::Branches => View::TriggerRules,
              View::TriggerRules => View::Branches,
              View::Error => View::Error,
            };
            action_tx.send(Action::Render)?;
          },
          Action::Error(message) => {
            if self.view != View::Error {
              self.previous_view = self.view;
            }
            self.error.set_message(message.clone());
            self.view = View::Error;
            action_tx.send(Action::Render)?;
          },
          Action::ExitError => {
            self.view = self.previous_view;
            action_tx.send(Action::Render)?;
          },
          Action::Resize(w, h) => {
            tui.resize(Rect::new(0, 0, *w, *h))?;
            self.render(&mut tui, &action_tx)?;
          },
          Action::Render => self.render(&mut tui, &action_tx)?,
          _ => {},
        }

        if let Some(action) = self.component_for(&action).update(action.clone()).await? {
          action_tx.send(action)?
        };
      }

      if self.should_suspend {
        tui.suspend()?;
        action_tx.send(Action::Resume)?;
        tui = Tui::new()?.tick_rate(self.tick_rate).frame_rate(self.frame_rate);
        tui.enter()?;
      } else if self.should_quit {
        tui.stop()?;
        break;
      }
    }
    tui.exit()?;
    Ok(())
  }
}
