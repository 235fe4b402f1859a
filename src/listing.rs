//! Page and filter state shared by the Home and Filter listings.
//!
//! Every transition that needs data hands back a [`ListingRequest`] stamped
//! with a generation. Responses are applied only when their generation is the
//! latest one issued, so a slow response for an old page or an old keyword can
//! never overwrite what the user asked for last.

use crate::api::ApiError;
use crate::media::{MoviePage, MovieSummary, Taxonomy};
use crate::route::Route;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub category: Option<String>,
    pub country: Option<String>,
    pub year: Option<u32>,
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.country.is_none() && self.year.is_none()
    }

    pub fn with_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn with_country(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingMode {
    Latest,
    Search { keyword: String },
    Filter(FilterSelection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub mode: ListingMode,
    pub page: u32,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Page(u32),
    Gap,
}

/// First page, last page and the neighbours of `current`, with gaps between.
pub fn page_window(current: u32, total: u32) -> Vec<PageSlot> {
    let mut slots = vec![PageSlot::Page(1)];
    if current > 3 {
        slots.push(PageSlot::Gap);
    }
    let start = current.saturating_sub(1).max(2);
    let end = total.saturating_sub(1).min(current.saturating_add(1));
    slots.extend((start..=end).map(PageSlot::Page));
    if current.saturating_add(2) < total {
        slots.push(PageSlot::Gap);
    }
    if total > 1 {
        slots.push(PageSlot::Page(total));
    }
    slots
}

#[derive(Debug, Clone)]
pub struct ListingState {
    mode: ListingMode,
    current_page: u32,
    total_pages: u32,
    movies: Option<MoviePage>,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

impl ListingState {
    pub fn new(mode: ListingMode) -> Self {
        Self {
            mode,
            current_page: 1,
            total_pages: 0,
            movies: None,
            loading: false,
            error: None,
            generation: 0,
        }
    }

    pub fn latest() -> Self {
        Self::new(ListingMode::Latest)
    }

    pub fn filtered(selection: FilterSelection) -> Self {
        Self::new(ListingMode::Filter(selection))
    }

    /// Restores a listing from a route; detail routes have no listing.
    pub fn from_route(route: &Route) -> Option<Self> {
        let (mode, page) = match route {
            Route::Home {
                keyword: Some(keyword),
                page,
            } => (
                ListingMode::Search {
                    keyword: keyword.clone(),
                },
                *page,
            ),
            Route::Home { keyword: None, page } => (ListingMode::Latest, *page),
            Route::Filter { selection, page } => (ListingMode::Filter(selection.clone()), *page),
            Route::Movie { .. } => return None,
        };
        let mut state = Self::new(mode);
        state.current_page = page.max(1);
        Some(state)
    }

    pub fn route(&self) -> Route {
        match &self.mode {
            ListingMode::Latest => Route::Home {
                keyword: None,
                page: self.current_page,
            },
            ListingMode::Search { keyword } => Route::Home {
                keyword: Some(keyword.clone()),
                page: self.current_page,
            },
            ListingMode::Filter(selection) => Route::Filter {
                selection: selection.clone(),
                page: self.current_page,
            },
        }
    }

    pub fn mode(&self) -> &ListingMode {
        &self.mode
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.mode, ListingMode::Search { .. })
    }

    pub fn keyword(&self) -> Option<&str> {
        match &self.mode {
            ListingMode::Search { keyword } => Some(keyword),
            _ => None,
        }
    }

    pub fn filter(&self) -> FilterSelection {
        match &self.mode {
            ListingMode::Filter(selection) => selection.clone(),
            _ => FilterSelection::default(),
        }
    }

    pub fn movies(&self) -> &[MovieSummary] {
        self.movies
            .as_ref()
            .map(|page| page.items.as_slice())
            .unwrap_or_default()
    }

    pub fn cdn_image_domain(&self) -> Option<&str> {
        self.movies.as_ref()?.cdn_image_domain.as_deref()
    }

    /// Nothing to show yet because the first response has not arrived.
    pub fn is_initial_loading(&self) -> bool {
        self.loading && self.movies.is_none()
    }

    /// A completed fetch came back with no movies.
    pub fn is_empty_result(&self) -> bool {
        !self.loading && self.movies.as_ref().is_some_and(|page| page.items.is_empty())
    }

    pub fn show_pagination(&self) -> bool {
        self.total_pages > 1
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn page_window(&self) -> Vec<PageSlot> {
        page_window(self.current_page, self.total_pages)
    }

    fn issue(&mut self) -> ListingRequest {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        ListingRequest {
            mode: self.mode.clone(),
            page: self.current_page,
            generation: self.generation,
        }
    }

    fn switch_mode(&mut self, mode: ListingMode) -> ListingRequest {
        self.mode = mode;
        self.current_page = 1;
        self.total_pages = 0;
        self.movies = None;
        self.issue()
    }

    /// Fetches the current mode and page again.
    pub fn load(&mut self) -> ListingRequest {
        self.issue()
    }

    pub fn submit_search(&mut self, keyword: &str) -> Option<ListingRequest> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return None;
        }
        Some(self.switch_mode(ListingMode::Search {
            keyword: keyword.to_string(),
        }))
    }

    pub fn clear_search(&mut self) -> Option<ListingRequest> {
        if !self.is_searching() {
            return None;
        }
        Some(self.switch_mode(ListingMode::Latest))
    }

    pub fn go_to_page(&mut self, page: u32) -> Option<ListingRequest> {
        if page < 1 || page > self.total_pages || page == self.current_page {
            return None;
        }
        self.current_page = page;
        Some(self.issue())
    }

    pub fn next_page(&mut self) -> Option<ListingRequest> {
        if !self.can_go_next() {
            return None;
        }
        self.go_to_page(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> Option<ListingRequest> {
        if !self.can_go_previous() {
            return None;
        }
        self.go_to_page(self.current_page - 1)
    }

    pub fn set_filter(&mut self, selection: FilterSelection) -> Option<ListingRequest> {
        let unchanged = self.mode == ListingMode::Filter(selection.clone());
        if unchanged && self.current_page == 1 && self.movies.is_some() {
            return None;
        }
        Some(self.switch_mode(ListingMode::Filter(selection)))
    }

    pub fn set_category(&mut self, category: Option<String>) -> Option<ListingRequest> {
        let selection = FilterSelection {
            category,
            ..self.filter()
        };
        self.set_filter(selection)
    }

    pub fn set_country(&mut self, country: Option<String>) -> Option<ListingRequest> {
        let selection = FilterSelection {
            country,
            ..self.filter()
        };
        self.set_filter(selection)
    }

    pub fn set_year(&mut self, year: Option<u32>) -> Option<ListingRequest> {
        let selection = FilterSelection {
            year,
            ..self.filter()
        };
        self.set_filter(selection)
    }

    /// Applies a response. Returns `false` when the response belongs to a
    /// request that has since been superseded.
    pub fn apply(&mut self, request: &ListingRequest, result: Result<MoviePage, ApiError>) -> bool {
        if request.generation != self.generation {
            log::debug!(
                "dropping stale listing response (generation {} < {})",
                request.generation,
                self.generation
            );
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                self.total_pages = page.pagination.total_pages;
                self.movies = Some(page);
            }
            Err(error) => {
                log::warn!("listing fetch for page {} failed: {}", request.page, error);
                self.error = Some(error.to_string());
            }
        }
        true
    }

    pub fn title(&self, categories: &[Taxonomy], countries: &[Taxonomy]) -> String {
        match &self.mode {
            ListingMode::Latest => String::from("Newly updated movies"),
            ListingMode::Search { keyword } => format!("Search results: \"{}\"", keyword),
            ListingMode::Filter(selection) => filter_title(selection, categories, countries),
        }
    }
}

fn taxonomy_name<'a>(items: &'a [Taxonomy], slug: &'a str) -> &'a str {
    items
        .iter()
        .find(|t| t.slug == slug)
        .map_or(slug, |t| t.name.as_str())
}

fn filter_title(selection: &FilterSelection, categories: &[Taxonomy], countries: &[Taxonomy]) -> String {
    if selection.is_empty() {
        return String::from("All movies");
    }
    let mut parts = Vec::new();
    if let Some(category) = &selection.category {
        parts.push(taxonomy_name(categories, category).to_string());
    }
    if let Some(country) = &selection.country {
        parts.push(taxonomy_name(countries, country).to_string());
    }
    if let Some(year) = selection.year {
        parts.push(year.to_string());
    }
    format!("Movies: {}", parts.join(" · "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::Pagination;

    fn page_of(count: usize, total_pages: u32) -> MoviePage {
        MoviePage {
            items: (0..count)
                .map(|i| MovieSummary {
                    id: i.to_string(),
                    name: format!("Movie {}", i),
                    slug: format!("movie-{}", i),
                    origin_name: String::new(),
                    poster_url: String::new(),
                    thumb_url: String::new(),
                    year: None,
                    rating: None,
                })
                .collect(),
            pagination: Pagination {
                total_items: count as u32 * total_pages,
                total_items_per_page: count as u32,
                current_page: 1,
                total_pages,
            },
            cdn_image_domain: None,
        }
    }

    fn loaded(total_pages: u32) -> ListingState {
        let mut state = ListingState::latest();
        let request = state.load();
        assert!(state.apply(&request, Ok(page_of(24, total_pages))));
        state
    }

    #[test]
    fn window_near_start() {
        use PageSlot::*;
        assert_eq!(page_window(1, 10), vec![Page(1), Page(2), Gap, Page(10)]);
        assert_eq!(page_window(3, 5), vec![Page(1), Page(2), Page(3), Page(4), Page(5)]);
    }

    #[test]
    fn window_in_middle_and_end() {
        use PageSlot::*;
        assert_eq!(
            page_window(5, 10),
            vec![Page(1), Gap, Page(4), Page(5), Page(6), Gap, Page(10)]
        );
        assert_eq!(page_window(10, 10), vec![Page(1), Gap, Page(9), Page(10)]);
        assert_eq!(page_window(8, 10), vec![Page(1), Gap, Page(7), Page(8), Page(9), Page(10)]);
    }

    #[test]
    fn window_for_tiny_totals() {
        use PageSlot::*;
        assert_eq!(page_window(1, 0), vec![Page(1)]);
        assert_eq!(page_window(1, 1), vec![Page(1)]);
        assert_eq!(page_window(1, 2), vec![Page(1), Page(2)]);
        assert_eq!(page_window(2, 2), vec![Page(1), Page(2)]);
    }

    #[test]
    fn first_response_sets_total_pages() {
        let mut state = ListingState::latest();
        let request = state.load();
        assert!(state.is_initial_loading());
        assert!(!state.show_pagination());
        assert!(state.apply(&request, Ok(page_of(24, 50))));
        assert_eq!(state.total_pages(), 50);
        assert_eq!(state.movies().len(), 24);
        assert!(state.show_pagination());
        assert!(!state.can_go_previous());
        assert!(state.can_go_next());
    }

    #[test]
    fn page_navigation_is_bounded() {
        let mut state = loaded(3);
        assert!(state.previous_page().is_none());
        assert!(state.go_to_page(0).is_none());
        assert!(state.go_to_page(4).is_none());
        assert!(state.go_to_page(1).is_none());

        let request = state.go_to_page(3).unwrap();
        assert_eq!(request.page, 3);
        assert_eq!(state.current_page(), 3);
        assert!(state.next_page().is_none());

        let request = state.previous_page().unwrap();
        assert_eq!(request.page, 2);
        assert_eq!(request.mode, ListingMode::Latest);
    }

    #[test]
    fn search_always_fetches_page_one() {
        let mut state = loaded(10);
        state.go_to_page(7).unwrap();
        let request = state.submit_search("  người nhện ").unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(
            request.mode,
            ListingMode::Search {
                keyword: String::from("người nhện")
            }
        );
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.total_pages(), 0);
        assert!(state.movies().is_empty());
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut state = loaded(10);
        assert!(state.submit_search("   ").is_none());
        assert_eq!(state.mode(), &ListingMode::Latest);
    }

    #[test]
    fn clear_search_returns_to_latest() {
        let mut state = loaded(10);
        assert!(state.clear_search().is_none());
        let request = state.submit_search("batman").unwrap();
        state.apply(&request, Ok(page_of(0, 0)));
        assert!(state.is_empty_result());

        let request = state.clear_search().unwrap();
        assert_eq!(request.mode, ListingMode::Latest);
        assert_eq!(request.page, 1);
        assert!(!state.is_searching());
        assert!(!state.is_empty_result());
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut state = loaded(10);
        let slow = state.go_to_page(2).unwrap();
        let fast = state.go_to_page(3).unwrap();

        assert!(state.apply(&fast, Ok(page_of(5, 10))));
        assert!(!state.apply(&slow, Ok(page_of(24, 99))));
        assert_eq!(state.current_page(), 3);
        assert_eq!(state.movies().len(), 5);
        assert_eq!(state.total_pages(), 10);
    }

    #[test]
    fn old_keyword_results_cannot_replace_new_search() {
        let mut state = loaded(10);
        let first = state.submit_search("avatar").unwrap();
        let second = state.submit_search("avengers").unwrap();
        assert!(!state.apply(&first, Ok(page_of(3, 1))));
        assert!(state.is_initial_loading());
        assert!(state.apply(&second, Ok(page_of(7, 2))));
        assert_eq!(state.keyword(), Some("avengers"));
        assert_eq!(state.movies().len(), 7);
    }

    #[test]
    fn failed_page_keeps_previous_movies() {
        let mut state = loaded(10);
        let request = state.next_page().unwrap();
        assert!(state.apply(&request, Err(ApiError::Http(502))));
        assert_eq!(state.movies().len(), 24);
        assert_eq!(state.error(), Some("server returned HTTP 502"));
        assert!(!state.is_loading());
        assert!(state.load().page == 2);
    }

    #[test]
    fn filter_changes_reset_page_and_merge_selection() {
        let mut state = ListingState::filtered(FilterSelection::default());
        let request = state.load();
        state.apply(&request, Ok(page_of(24, 40)));
        state.go_to_page(4).unwrap();

        let request = state.set_category(Some(String::from("hanh-dong"))).unwrap();
        assert_eq!(request.page, 1);
        state.apply(&request, Ok(page_of(24, 8)));

        let request = state.set_year(Some(2024)).unwrap();
        assert_eq!(
            request.mode,
            ListingMode::Filter(FilterSelection {
                category: Some(String::from("hanh-dong")),
                country: None,
                year: Some(2024),
            })
        );
        state.apply(&request, Ok(page_of(24, 2)));

        assert!(state.set_year(Some(2024)).is_none());
        let request = state.set_country(Some(String::from("han-quoc"))).unwrap();
        assert_eq!(state.filter().country.as_deref(), Some("han-quoc"));
        assert_eq!(request.page, 1);
    }

    #[test]
    fn reselecting_same_filter_returns_to_first_page() {
        let mut state = ListingState::filtered(FilterSelection::with_category("hanh-dong"));
        let request = state.load();
        state.apply(&request, Ok(page_of(24, 10)));
        let request = state.go_to_page(6).unwrap();
        state.apply(&request, Ok(page_of(24, 10)));

        let request = state
            .set_filter(FilterSelection::with_category("hanh-dong"))
            .unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(state.current_page(), 1);
        state.apply(&request, Ok(page_of(24, 10)));

        assert!(state
            .set_filter(FilterSelection::with_category("hanh-dong"))
            .is_none());
    }

    #[test]
    fn route_reflects_state_and_restores_it() {
        let mut state = ListingState::filtered(FilterSelection::with_country("nhat-ban"));
        let request = state.load();
        state.apply(&request, Ok(page_of(24, 9)));
        state.go_to_page(5).unwrap();

        let route = state.route();
        assert_eq!(
            route,
            Route::Filter {
                selection: FilterSelection::with_country("nhat-ban"),
                page: 5
            }
        );
        let restored = ListingState::from_route(&route).unwrap();
        assert_eq!(restored.mode(), state.mode());
        assert_eq!(restored.current_page(), 5);

        assert!(ListingState::from_route(&Route::Movie {
            slug: String::from("x")
        })
        .is_none());
    }

    #[test]
    fn titles_use_taxonomy_names() {
        let categories = vec![Taxonomy {
            id: String::from("1"),
            name: String::from("Hành Động"),
            slug: String::from("hanh-dong"),
        }];
        let mut state = ListingState::filtered(FilterSelection {
            category: Some(String::from("hanh-dong")),
            country: Some(String::from("unknown")),
            year: Some(2023),
        });
        assert_eq!(state.title(&categories, &[]), "Movies: Hành Động · unknown · 2023");
        state.set_filter(FilterSelection::default());
        assert_eq!(state.title(&categories, &[]), "All movies");
        assert_eq!(ListingState::latest().title(&[], &[]), "Newly updated movies");
    }
}
