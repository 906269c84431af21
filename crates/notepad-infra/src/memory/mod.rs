//! In-memory repositories - used when no database is configured and in tests.
//!
//! Data is lost on process restart.

mod chords;
mod users;

pub use chords::InMemoryChordRepository;
pub use users::InMemoryUserRepository;

use notepad_core::pagination::{Page, PageRequest};

/// Slice an already ordered result set into a page.
fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let start = page.offset().min(total) as usize;
    let end = page.end().min(total) as usize;
    Page::new(items[start..end].to_vec(), page, total)
}

fn matches_search(haystack: &str, search: &Option<String>) -> bool {
    match search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}
