pub mod pager;
pub mod panel;
pub mod repository;
pub mod rules;

pub use pager::Pager;
pub use panel::{BranchPanel, BranchStatusRow, PanelSummary, TableState};
pub use repository::{RepositoryConfig, VcsKind};
