//! Which pages are on screen for a navigation index.
//!
//! Desktop shows the cover alone, then pairs displayed pages as
//! `(2, 3), (4, 5), ...`. Mobile shows exactly one page per index.
//! Page numbers here are 1-based, indices are 0-based.

use crate::layout::DeviceClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleSpread {
    Single(u32),
    /// `right` is `None` when the left page is the document's last page
    Pair { left: u32, right: Option<u32> },
}

impl VisibleSpread {
    pub fn pages(&self) -> Vec<u32> {
        match *self {
            Self::Single(page) => vec![page],
            Self::Pair { left, right } => std::iter::once(left).chain(right).collect(),
        }
    }

    pub fn contains(&self, page_number: u32) -> bool {
        self.pages().contains(&page_number)
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Self::Pair { .. })
    }

    /// Navigation index of the first page in this spread.
    pub fn first_index(&self) -> u32 {
        match *self {
            Self::Single(page) => page - 1,
            Self::Pair { left, .. } => left - 1,
        }
    }
}

/// Returns the spread shown at `index`, or `None` for an empty document.
///
/// `index` is expected to be in range; out-of-range indices are clamped.
pub fn spread_for(index: u32, page_count: u32, device: DeviceClass) -> Option<VisibleSpread> {
    if page_count == 0 {
        return None;
    }

    let page = index.min(page_count - 1) + 1;
    if device == DeviceClass::Mobile || page == 1 {
        return Some(VisibleSpread::Single(page));
    }

    let left = if page % 2 == 0 { page } else { page - 1 };
    let right = Some(left + 1).filter(|&right| right <= page_count);
    Some(VisibleSpread::Pair { left, right })
}

/// Index of the first page of the spread after the one shown at `index`.
pub fn next_spread_index(index: u32, page_count: u32, device: DeviceClass) -> Option<u32> {
    let spread = spread_for(index, page_count, device)?;
    let next = match spread {
        VisibleSpread::Single(page) => page,
        VisibleSpread::Pair { left, .. } => left + 1,
    };
    Some(next.min(page_count - 1))
}

/// Index of the first page of the spread before the one shown at `index`.
pub fn prev_spread_index(index: u32, page_count: u32, device: DeviceClass) -> Option<u32> {
    let spread = spread_for(index, page_count, device)?;
    let prev = match spread {
        VisibleSpread::Single(page) => page.saturating_sub(2),
        VisibleSpread::Pair { left, .. } => left.saturating_sub(3),
    };
    let target = spread_for(prev, page_count, device)?;
    Some(target.first_index())
}
