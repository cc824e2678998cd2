use std::sync::{Arc, Mutex, PoisonError};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Row, Table, TableState as Selection, Wrap},
};
use tokio::{sync::mpsc::UnboundedSender, task::spawn};
use tracing::{error, info};

use crate::{
  action::Action,
  branches::{
    BranchPanel, BranchStatusRow, Pager, TableState,
    panel::{IMPORTING_NOTICE, SummaryValue},
  },
  components::Component,
  git::{BranchQueryService, BranchRef},
  tui::Frame,
};

const DEFAULT_ICON: &str = "★";

// Result of the most recent branch query, tagged with the request that produced it.
#[derive(Default)]
struct LoadState {
  request: u64,
  offset: usize,
  result: Option<Result<Vec<BranchRef>, String>>,
}

pub struct BranchPanelComponent {
  panel: BranchPanel,
  query: Arc<dyn BranchQueryService>,
  pager: Pager,
  load_state: Arc<Mutex<LoadState>>,
  request: u64,
  loading: bool,
  rows: Vec<BranchStatusRow>,
  selection: Selection,
  action_tx: Option<UnboundedSender<Action>>,
}

impl BranchPanelComponent {
  pub fn new(panel: BranchPanel, query: Arc<dyn BranchQueryService>, page_size: usize) -> Self {
    BranchPanelComponent {
      panel,
      query,
      pager: Pager::new(page_size),
      load_state: Arc::new(Mutex::new(LoadState::default())),
      request: 0,
      loading: false,
      rows: vec![],
      selection: Selection::default(),
      action_tx: None,
    }
  }

  pub fn rows(&self) -> &[BranchStatusRow] {
    &self.rows
  }

  pub fn pager(&self) -> &Pager {
    &self.pager
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  fn send_action(&self, action: Action) {
    if let Some(tx) = &self.action_tx {
      if let Err(e) = tx.send(action) {
        error!("Failed to send action: {}", e);
      }
    }
  }

  fn load_branches(&mut self, offset: usize) {
    if !self.panel.should_query() {
      info!("Skipping branch query, panel state is {:?}", self.panel.table_state());
      return;
    }
    self.request += 1;
    self.loading = true;

    let request = self.request;
    let limit = self.pager.fetch_limit();
    let query = self.query.clone();
    let load_state = self.load_state.clone();
    let tx = self.action_tx.clone();

    spawn(async move {
      let repository = query.repository_id();
      let result = query.list_branches(&repository, offset, limit).await.map_err(|err| {
        error!("Failed to list branches of {}: {}", repository, err);
        format!("Failed to load branches: {}", err)
      });
      {
        let mut state = load_state.lock().unwrap_or_else(PoisonError::into_inner);
        state.request = request;
        state.offset = offset;
        state.result = Some(result);
      }
      if let Some(tx) = tx {
        let _ = tx.send(Action::BranchesLoaded);
      }
    });
  }

  fn apply_loaded_branches(&mut self) -> Option<Action> {
    let (offset, result) = {
      let mut state = self.load_state.lock().unwrap_or_else(PoisonError::into_inner);
      if state.request != self.request {
        return None;
      }
      (state.offset, state.result.take()?)
    };
    self.loading = false;

    match result {
      Ok(branches) => {
        let page = self.pager.slice_results(offset, branches);
        info!("Loaded {} branches on page {}", page.len(), self.pager.page_number());
        self.rows = self.panel.rows(&page);
        self.selection.select(if self.rows.is_empty() { None } else { Some(0) });
        Some(Action::Render)
      },
      Err(message) => Some(Action::Error(message)),
    }
  }

  fn select_next(&mut self) {
    if self.rows.is_empty() {
      return;
    }
    let next = match self.selection.selected() {
      Some(index) if index + 1 < self.rows.len() => index + 1,
      _ => 0,
    };
    self.selection.select(Some(next));
  }

  fn select_previous(&mut self) {
    if self.rows.is_empty() {
      return;
    }
    let previous = match self.selection.selected() {
      Some(index) if index > 0 => index - 1,
      _ => self.rows.len() - 1,
    };
    self.selection.select(Some(previous));
  }

  pub fn header_labels(&self) -> Vec<&'static str> {
    let mut labels = vec!["", "Branch"];
    if self.panel.status_column_visible() {
      labels.push("Status");
    }
    labels.extend(["Track", "Autoclose"]);
    labels
  }

  pub fn row_labels(&self, row: &BranchStatusRow) -> Vec<String> {
    let mut labels = vec![if row.is_default { DEFAULT_ICON.to_string() } else { String::new() }, row.name.clone()];
    if self.panel.status_column_visible() {
      labels.push(row.status_label().to_string());
    }
    labels.extend([row.track_label().to_string(), row.autoclose_label().to_string()]);
    labels
  }

  fn title(&self) -> String {
    if self.loading {
      return "Branches (loading...)".to_string();
    }
    format!("Branches (page {})", self.pager.page_number())
  }

  fn render_summary(&self, f: &mut Frame<'_>, area: Rect) {
    let title_style = if self.panel.has_branch_configuration() {
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
      Style::default().add_modifier(Modifier::DIM)
    };
    let summary = self.panel.summary();
    let label_style = Style::default().add_modifier(Modifier::BOLD);
    let lines: Vec<Line> = summary
      .properties()
      .into_iter()
      .map(|(label, value)| Line::from(vec![Span::styled(format!("{}: ", label), label_style), value_span(value)]))
      .collect();
    let title = Span::styled(format!("{} repository", self.panel.config().vcs), title_style);
    let paragraph = Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(paragraph, area);
  }

  fn render_notice(&self, f: &mut Frame<'_>, area: Rect, notice: String) {
    let paragraph = Paragraph::new(notice)
      .wrap(Wrap { trim: true })
      .style(Style::default().add_modifier(Modifier::ITALIC))
      .block(Block::default().title("Branches").borders(Borders::ALL));
    f.render_widget(paragraph, area);
  }

  fn render_table(&mut self, f: &mut Frame<'_>, area: Rect) {
    let header = Row::new(self.header_labels()).style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = self
      .rows
      .iter()
      .map(|row| {
        let style = if row.is_closed { Style::default().add_modifier(Modifier::DIM) } else { Style::default() };
        Row::new(self.row_labels(row)).style(style)
      })
      .collect();

    let mut widths = vec![Constraint::Length(2), Constraint::Fill(1)];
    if self.panel.status_column_visible() {
      widths.push(Constraint::Length(8));
    }
    widths.extend([Constraint::Length(10), Constraint::Length(22)]);

    let table = Table::new(rows, widths)
      .header(header)
      .block(Block::default().title(self.title()).borders(Borders::ALL))
      .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
      .highlight_symbol("→ ");
    f.render_stateful_widget(table, area, &mut self.selection);
  }
}

fn value_span(value: &SummaryValue) -> Span<'static> {
  if value.emphasized {
    Span::styled(value.text.clone(), Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
  } else {
    Span::raw(value.text.clone())
  }
}

#[async_trait::async_trait]
impl Component for BranchPanelComponent {
  fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
    self.action_tx = Some(tx);
    self.send_action(Action::Refresh);
    Ok(())
  }

  async fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
    let action = match key.code {
      KeyCode::Down | KeyCode::Char('j') => Some(Action::SelectNext),
      KeyCode::Up | KeyCode::Char('k') => Some(Action::SelectPrevious),
      // A failed page leaves the pager on the last page that loaded.
      KeyCode::Right | KeyCode::Char('n') if !self.loading && self.pager.has_more() => Some(Action::NextPage),
      KeyCode::Left | KeyCode::Char('p') if !self.loading && self.pager.has_previous() => Some(Action::PreviousPage),
      KeyCode::Char('r') => Some(Action::Refresh),
      _ => None,
    };
    Ok(action)
  }

  async fn update(&mut self, action: Action) -> Result<Option<Action>> {
    match action {
      Action::Refresh => {
        self.load_branches(self.pager.offset());
        Ok(Some(Action::Render))
      },
      Action::BranchesLoaded => Ok(self.apply_loaded_branches()),
      Action::NextPage | Action::PreviousPage if self.loading => Ok(None),
      Action::NextPage => {
        if let Some(offset) = self.pager.next_offset() {
          self.load_branches(offset);
        }
        Ok(Some(Action::Render))
      },
      Action::PreviousPage => {
        if let Some(offset) = self.pager.previous_offset() {
          self.load_branches(offset);
        }
        Ok(Some(Action::Render))
      },
      Action::SelectNext => {
        self.select_next();
        Ok(Some(Action::Render))
      },
      Action::SelectPrevious => {
        self.select_previous();
        Ok(Some(Action::Render))
      },
      _ => Ok(None),
    }
  }

  fn instructions(&self) -> Vec<&'static str> {
    let mut instructions = vec!["↑/↓: Select"];
    if !self.loading && self.pager.has_previous() {
      instructions.push("←: Previous page");
    }
    if !self.loading && self.pager.has_more() {
      instructions.push("→: Next page");
    }
    instructions.push("r: Refresh");
    instructions
  }

  fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
    let layout = Layout::new(Direction::Vertical, [Constraint::Length(5), Constraint::Fill(1)]).split(area);
    self.render_summary(f, layout[0]);

    match self.panel.table_state() {
      TableState::Table => self.render_table(f, layout[1]),
      TableState::Importing => self.render_notice(f, layout[1], IMPORTING_NOTICE.to_string()),
      TableState::Unsupported => self.render_notice(
        f,
        layout[1],
        format!("Branch status is not available for {} repositories.", self.panel.config().vcs),
      ),
    }
    Ok(())
  }
}
