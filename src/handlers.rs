use std::path::PathBuf;

use iced::widget::image::Handle;
use iced::Task;

use crate::api::{load_listing, ApiError, CatalogueClient};
use crate::detail_handlers;
use crate::listing::{FilterSelection, ListingRequest, ListingState};
use crate::media::{ListingKind, Message, MoviePage, Screen, Taxonomy, TaxonomyKind};
use crate::route::Route;
use crate::CineStream;

pub fn handle_message(app: &mut CineStream, message: Message) -> Task<Message> {
    match message {
        Message::Setup(_) => Task::none(),
        Message::NavigateTo(screen) => handle_navigate(app, screen),
        Message::OpenTaxonomy(kind, slug) => handle_open_taxonomy(app, kind, slug),
        Message::CategoriesLoaded(result) => {
            if let Some(items) = taxonomies_or_log("categories", result) {
                app.categories = items;
            }
            Task::none()
        }
        Message::CountriesLoaded(result) => {
            if let Some(items) = taxonomies_or_log("countries", result) {
                app.countries = items;
            }
            Task::none()
        }
        Message::SearchQueryChanged(query) => {
            app.search_query = query;
            Task::none()
        }
        Message::SearchSubmit => handle_search_submit(app),
        Message::ClearSearch => handle_clear_search(app),
        Message::GoToPage(kind, page) => {
            let request = listing_mut(app, kind).go_to_page(page);
            run_listing(app, kind, request)
        }
        Message::NextPage(kind) => {
            let request = listing_mut(app, kind).next_page();
            run_listing(app, kind, request)
        }
        Message::PreviousPage(kind) => {
            let request = listing_mut(app, kind).previous_page();
            run_listing(app, kind, request)
        }
        Message::ListingLoaded(kind, request, result) => {
            handle_listing_loaded(app, kind, request, result)
        }
        Message::RetryListing(kind) => {
            let request = listing_mut(app, kind).load();
            run_listing(app, kind, Some(request))
        }
        Message::SetCategoryFilter(category) => {
            let request = app.filter.set_category(category.map(|c| c.slug));
            show_filter(app, request)
        }
        Message::SetCountryFilter(country) => {
            let request = app.filter.set_country(country.map(|c| c.slug));
            show_filter(app, request)
        }
        Message::SetYearFilter(year) => {
            let request = app.filter.set_year(year);
            show_filter(app, request)
        }
        Message::ResetFilter => {
            let request = app.filter.set_filter(FilterSelection::default());
            show_filter(app, request)
        }
        Message::MovieLoaded(slug, result) => {
            detail_handlers::handle_movie_loaded(app, slug, result)
        }
        Message::RetryMovie => detail_handlers::handle_retry_movie(app),
        Message::SelectEpisode(slug) => detail_handlers::handle_select_episode(app, slug),
        Message::PlayEpisode => detail_handlers::handle_play_episode(app),
        Message::PlaybackFinished(result) => {
            detail_handlers::handle_playback_finished(app, result)
        }
        Message::LoadImage(url) => handle_load_image(app, url),
        Message::ImageLoaded(url, result) => handle_image_loaded(app, url, result),
        Message::ClockTick => {
            app.now = chrono::Local::now();
            Task::none()
        }
    }
}

/// Shows the screen a route points at, restoring its listing state.
pub fn open_route(app: &mut CineStream, route: Route) -> Task<Message> {
    log::debug!("opening {}", route);
    match route {
        Route::Movie { slug } => detail_handlers::handle_open_movie(app, slug),
        Route::Home { .. } => {
            let Some(mut state) = ListingState::from_route(&route) else {
                return Task::none();
            };
            app.search_query = state.keyword().unwrap_or_default().to_string();
            let request = state.load();
            app.home = state;
            app.screen = Screen::Home;
            run_listing(app, ListingKind::Home, Some(request))
        }
        Route::Filter { .. } => {
            let Some(mut state) = ListingState::from_route(&route) else {
                return Task::none();
            };
            let request = state.load();
            app.filter = state;
            app.screen = Screen::Filter;
            run_listing(app, ListingKind::Filter, Some(request))
        }
    }
}

fn listing_mut(app: &mut CineStream, kind: ListingKind) -> &mut ListingState {
    match kind {
        ListingKind::Home => &mut app.home,
        ListingKind::Filter => &mut app.filter,
    }
}

fn listing(app: &CineStream, kind: ListingKind) -> &ListingState {
    match kind {
        ListingKind::Home => &app.home,
        ListingKind::Filter => &app.filter,
    }
}

fn run_listing(
    app: &CineStream,
    kind: ListingKind,
    request: Option<ListingRequest>,
) -> Task<Message> {
    let Some(request) = request else {
        return Task::none();
    };
    let Some(client) = &app.client else {
        return Task::none();
    };
    log::debug!("fetching {:?} page {}", request.mode, request.page);
    let fetch_client = client.clone();
    let pending = request.clone();
    Task::perform(load_listing(fetch_client, request), move |result| {
        Message::ListingLoaded(kind, pending.clone(), result)
    })
}

fn show_filter(app: &mut CineStream, request: Option<ListingRequest>) -> Task<Message> {
    app.screen = Screen::Filter;
    run_listing(app, ListingKind::Filter, request)
}

fn taxonomies_or_log(
    what: &str,
    result: Result<Vec<Taxonomy>, ApiError>,
) -> Option<Vec<Taxonomy>> {
    match result {
        Ok(items) => {
            log::debug!("loaded {} {}", items.len(), what);
            Some(items)
        }
        Err(e) => {
            log::warn!("could not load {}: {}", what, e);
            None
        }
    }
}

fn handle_navigate(app: &mut CineStream, screen: Screen) -> Task<Message> {
    match screen {
        Screen::Movie(slug) => detail_handlers::handle_open_movie(app, slug),
        Screen::Home => {
            app.screen = Screen::Home;
            load_if_untouched(app, ListingKind::Home)
        }
        Screen::Filter => {
            app.screen = Screen::Filter;
            load_if_untouched(app, ListingKind::Filter)
        }
    }
}

fn load_if_untouched(app: &mut CineStream, kind: ListingKind) -> Task<Message> {
    let state = listing(app, kind);
    if state.is_loading() || !state.movies().is_empty() || state.is_empty_result() {
        return Task::none();
    }
    let request = listing_mut(app, kind).load();
    run_listing(app, kind, Some(request))
}

fn handle_open_taxonomy(app: &mut CineStream, kind: TaxonomyKind, slug: String) -> Task<Message> {
    let selection = match kind {
        TaxonomyKind::Category => FilterSelection::with_category(slug),
        TaxonomyKind::Country => FilterSelection::with_country(slug),
    };
    let request = app.filter.set_filter(selection);
    show_filter(app, request)
}

fn handle_search_submit(app: &mut CineStream) -> Task<Message> {
    let request = app.home.submit_search(&app.search_query);
    if request.is_none() {
        return Task::none();
    }
    app.screen = Screen::Home;
    run_listing(app, ListingKind::Home, request)
}

fn handle_clear_search(app: &mut CineStream) -> Task<Message> {
    app.search_query.clear();
    app.screen = Screen::Home;
    match app.home.clear_search() {
        Some(request) => run_listing(app, ListingKind::Home, Some(request)),
        None => load_if_untouched(app, ListingKind::Home),
    }
}

fn handle_listing_loaded(
    app: &mut CineStream,
    kind: ListingKind,
    request: ListingRequest,
    result: Result<MoviePage, ApiError>,
) -> Task<Message> {
    if !listing_mut(app, kind).apply(&request, result) {
        return Task::none();
    }
    let state = listing(app, kind);
    let cdn = state.cdn_image_domain();
    let tasks: Vec<Task<Message>> = state
        .movies()
        .iter()
        .filter_map(|movie| movie.poster_source(cdn))
        .filter(|url| url.starts_with("http") && app.image_cache.needs_load(url))
        .map(|url| Task::done(Message::LoadImage(url)))
        .collect();
    Task::batch(tasks)
}

fn handle_load_image(app: &mut CineStream, url: String) -> Task<Message> {
    if !app.image_cache.needs_load(&url) {
        return Task::none();
    }
    let Some(client) = &app.client else {
        return Task::none();
    };
    let fetch_client = client.clone();
    let cache_path = app.image_cache.get_cache_path(&url);
    app.image_cache.mark_pending(url.clone());
    let image_url = url.clone();

    Task::perform(
        fetch_poster(fetch_client, image_url, cache_path),
        move |result| Message::ImageLoaded(url.clone(), result.map(Handle::from_bytes)),
    )
}

/// Reads a poster from the disk cache, downloading and storing it on a miss.
async fn fetch_poster(
    client: CatalogueClient,
    url: String,
    cache_path: Option<PathBuf>,
) -> Result<Vec<u8>, String> {
    if let Some(ref path) = cache_path {
        if let Ok(bytes) = tokio::fs::read(path).await {
            return Ok(bytes);
        }
    }
    let bytes = client.fetch_image_bytes(url.clone()).await?;
    if let Some(path) = cache_path {
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            log::debug!("could not cache {}: {}", url, e);
        }
    }
    Ok(bytes)
}

fn handle_image_loaded(
    app: &mut CineStream,
    url: String,
    result: Result<Handle, String>,
) -> Task<Message> {
    match result {
        Ok(handle) => app.image_cache.insert(url, handle),
        Err(e) => {
            log::debug!("image {} failed: {}", url, e);
            app.image_cache.fail(&url);
        }
    }
    Task::none()
}
