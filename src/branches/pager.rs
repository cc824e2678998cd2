pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Offset based pagination over a query that can over-fetch by one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
  offset: usize,
  page_size: usize,
  has_more: bool,
}

impl Default for Pager {
  fn default() -> Self {
    Pager::new(DEFAULT_PAGE_SIZE)
  }
}

impl Pager {
  pub fn new(page_size: usize) -> Self {
    Pager { offset: 0, page_size: page_size.max(1), has_more: false }
  }

  pub fn offset(&self) -> usize {
    self.offset
  }

  pub fn page_size(&self) -> usize {
    self.page_size
  }

  /// Number of rows to request: one more than a page, to detect a following page.
  pub fn fetch_limit(&self) -> usize {
    self.page_size + 1
  }

  pub fn has_more(&self) -> bool {
    self.has_more
  }

  pub fn has_previous(&self) -> bool {
    self.offset > 0
  }

  pub fn page_number(&self) -> usize {
    self.offset / self.page_size + 1
  }

  /// Records a loaded page: trims an over-fetched result down to one page and notes whether more rows exist.
  pub fn slice_results<T>(&mut self, offset: usize, mut results: Vec<T>) -> Vec<T> {
    self.offset = offset;
    self.has_more = results.len() > self.page_size;
    results.truncate(self.page_size);
    results
  }

  /// Offset of the next page, if there is one. The pager only moves once that page has loaded.
  pub fn next_offset(&self) -> Option<usize> {
    if !self.has_more {
      return None;
    }
    Some(self.offset + self.page_size)
  }

  pub fn previous_offset(&self) -> Option<usize> {
    if self.offset == 0 {
      return None;
    }
    Some(self.offset.saturating_sub(self.page_size))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_slice_results_detects_more_rows() {
    let mut pager = Pager::new(2);

    let page = pager.slice_results(0, vec![1, 2, 3]);

    assert_eq!(pager.fetch_limit(), 3);
    assert_eq!(page, vec![1, 2]);
    assert!(pager.has_more());
  }

  #[test]
  fn test_slice_results_last_page() {
    let mut pager = Pager::new(2);

    let page = pager.slice_results(0, vec![1, 2]);

    assert_eq!(page, vec![1, 2]);
    assert!(!pager.has_more());
    assert_eq!(pager.next_offset(), None);
  }

  #[test]
  fn test_page_navigation() {
    let mut pager = Pager::new(10);
    pager.slice_results(0, (0..11).collect());
    assert_eq!(pager.previous_offset(), None);

    let next = pager.next_offset();
    assert_eq!(next, Some(10));
    assert_eq!(pager.offset(), 0);

    pager.slice_results(10, (10..15).collect::<Vec<_>>());
    assert_eq!(pager.page_number(), 2);
    assert_eq!(pager.next_offset(), None);
    assert_eq!(pager.previous_offset(), Some(0));
  }

  #[test]
  fn test_page_size_is_at_least_one() {
    assert_eq!(Pager::new(0).page_size(), 1);
  }
}
