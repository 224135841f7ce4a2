//! Browse state for the interactive desk.
//!
//! All navigation flows through one reducer: every user gesture becomes an
//! [`Action`], [`ViewState::apply`] is the only place state changes, and
//! [`ViewState::visible_markets`] derives the listing from state plus the
//! catalog. Keeps category, search, and sort from drifting apart.

use crate::catalog::{Catalog, Market};

/// Ordering applied to the filtered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortFilter {
    /// Newest markets first.
    #[default]
    Recent,
    /// Most-voted markets first.
    Trending,
    /// Only markets whose title mentions 2025.
    Year2025,
}

impl SortFilter {
    pub const ALL: [SortFilter; 3] = [Self::Recent, Self::Trending, Self::Year2025];

    /// Next chip in the row, wrapping.
    pub fn next(self) -> Self {
        match self {
            Self::Recent => Self::Trending,
            Self::Trending => Self::Year2025,
            Self::Year2025 => Self::Recent,
        }
    }
}

impl std::fmt::Display for SortFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recent => f.write_str("Recent"),
            Self::Trending => f.write_str("Trending"),
            Self::Year2025 => f.write_str("2025"),
        }
    }
}

/// A user gesture in the desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectCategory(String),
    SetSearch(String),
    ClearSearch,
    SetSort(SortFilter),
    CycleSort,
    OpenMarket(u64),
    Back,
}

/// Everything the listing screen depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub category: String,
    pub search: String,
    pub sort: SortFilter,
    /// Market open in the detail screen, if any.
    pub selected: Option<u64>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            category: "Sports".to_string(),
            search: String::new(),
            sort: SortFilter::default(),
            selected: None,
        }
    }
}

impl ViewState {
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SelectCategory(category) => {
                self.category = category;
                // A new shelf closes whatever detail was open.
                self.selected = None;
            }
            Action::SetSearch(term) => self.search = term,
            Action::ClearSearch => self.search.clear(),
            Action::SetSort(sort) => self.sort = sort,
            Action::CycleSort => self.sort = self.sort.next(),
            Action::OpenMarket(id) => self.selected = Some(id),
            Action::Back => self.selected = None,
        }
    }

    /// The listing for the current category, search term, and sort chip.
    pub fn visible_markets<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Market> {
        let mut markets = catalog.search(&self.category, &self.search);
        match self.sort {
            SortFilter::Recent => markets.sort_by(|a, b| b.id.cmp(&a.id)),
            SortFilter::Trending => {
                markets.sort_by(|a, b| {
                    b.total_votes()
                        .cmp(&a.total_votes())
                        .then_with(|| a.id.cmp(&b.id))
                });
            }
            SortFilter::Year2025 => {
                markets.retain(|m| m.title.contains("2025"));
            }
        }
        markets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn defaults_open_the_sports_shelf() {
        let state = ViewState::default();
        assert_eq!(state.category, "Sports");
        assert_eq!(state.sort, SortFilter::Recent);
        assert!(state.search.is_empty());
        assert!(state.selected.is_none());
    }

    #[test]
    fn switching_category_closes_the_detail_screen() {
        let mut state = ViewState::default();
        state.apply(Action::OpenMarket(3));
        assert_eq!(state.selected, Some(3));

        state.apply(Action::SelectCategory("DEFI".to_string()));
        assert_eq!(state.category, "DEFI");
        assert!(state.selected.is_none());
    }

    #[test]
    fn recent_sort_lists_newest_ids_first() {
        let catalog = Catalog::builtin();
        let state = ViewState {
            category: "DEFI".to_string(),
            ..ViewState::default()
        };
        let ids: Vec<u64> = state.visible_markets(&catalog).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![32, 31, 30, 29]);
    }

    #[test]
    fn trending_sort_ranks_by_total_votes() {
        let catalog = Catalog::builtin();
        let mut state = ViewState {
            category: "DEFI".to_string(),
            ..ViewState::default()
        };
        state.apply(Action::SetSort(SortFilter::Trending));
        let ids: Vec<u64> = state.visible_markets(&catalog).iter().map(|m| m.id).collect();
        // id 29 has 1500 total votes, the rest 1300 apiece in id order.
        assert_eq!(ids, vec![29, 30, 31, 32]);
    }

    #[test]
    fn year_filter_keeps_only_2025_titles() {
        let catalog = Catalog::builtin();
        let mut state = ViewState {
            category: "DEFI".to_string(),
            ..ViewState::default()
        };
        state.apply(Action::SetSort(SortFilter::Year2025));
        let markets = state.visible_markets(&catalog);
        assert_eq!(markets.len(), 1);
        assert!(markets[0].title.contains("2025"));
    }

    #[test]
    fn search_narrows_within_the_category() {
        let catalog = Catalog::builtin();
        let mut state = ViewState {
            category: "FloorPrices".to_string(),
            ..ViewState::default()
        };
        state.apply(Action::SetSearch("milady".to_string()));
        let markets = state.visible_markets(&catalog);
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].id, 34);

        state.apply(Action::ClearSearch);
        assert_eq!(state.visible_markets(&catalog).len(), 4);
    }

    #[test]
    fn sort_chips_cycle_in_row_order() {
        let mut state = ViewState::default();
        state.apply(Action::CycleSort);
        assert_eq!(state.sort, SortFilter::Trending);
        state.apply(Action::CycleSort);
        assert_eq!(state.sort, SortFilter::Year2025);
        state.apply(Action::CycleSort);
        assert_eq!(state.sort, SortFilter::Recent);
    }
}
