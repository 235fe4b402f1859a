mod api;
mod cards;
mod components;
mod detail_handlers;
mod detail_page;
mod handlers;
mod listing;
mod listing_page;
mod media;
mod player;
mod route;
mod settings;

use chrono::{DateTime, Local};
use clap::Parser;
use iced::widget::{column, container, scrollable};
use iced::{Element, Font, Length, Size, Subscription, Task, Theme};

use api::{load_categories, load_countries, CatalogueClient};
use detail_handlers::DetailState;
use listing::{FilterSelection, ListingState};
use media::{ImageCache, ListingKind, Message, Screen, Taxonomy, BACKGROUND_DARK};
use route::Route;
use settings::{AppSettings, SetupPage};

#[derive(Debug, Clone, Parser)]
#[command(name = "cinestream", version, about = "Browse, filter and play movies from a catalogue API")]
struct Args {
    /// Screen to open at start-up, e.g. `/filter?category=hanh-dong` or `/movies/<slug>`
    route: Option<String>,

    /// Catalogue API base URL, overriding the config file
    #[arg(long)]
    api_url: Option<String>,

    /// External media player command for HLS streams (e.g. mpv)
    #[arg(long)]
    player: Option<String>,
}

pub struct CineStream {
    pub setup_page: Option<SetupPage>,
    pub settings: AppSettings,
    pub client: Option<CatalogueClient>,
    pub start_route: Route,
    pub screen: Screen,
    pub home: ListingState,
    pub filter: ListingState,
    pub search_query: String,
    pub categories: Vec<Taxonomy>,
    pub countries: Vec<Taxonomy>,
    pub detail: DetailState,
    pub image_cache: ImageCache,
    pub now: DateTime<Local>,
}

impl Default for CineStream {
    fn default() -> Self {
        Self {
            setup_page: None,
            settings: AppSettings::default(),
            client: None,
            start_route: Route::default(),
            screen: Screen::Home,
            home: ListingState::latest(),
            filter: ListingState::filtered(FilterSelection::default()),
            search_query: String::new(),
            categories: Vec::new(),
            countries: Vec::new(),
            detail: DetailState::default(),
            image_cache: ImageCache::default(),
            now: Local::now(),
        }
    }
}

impl CineStream {
    fn new(args: Args) -> (Self, Task<Message>) {
        let start_route = match args.route.as_deref().map(Route::parse) {
            Some(Ok(route)) => route,
            Some(Err(e)) => {
                log::warn!("ignoring start route: {}", e);
                Route::default()
            }
            None => Route::default(),
        };

        let loaded = match AppSettings::load() {
            Ok(Some(settings)) => Ok(settings),
            Ok(None) => Err(None),
            Err(e) => {
                log::warn!("could not load settings: {}", e);
                Err(Some(e.to_string()))
            }
        };

        let mut app = Self {
            start_route,
            image_cache: ImageCache::new(),
            ..Default::default()
        };

        match loaded {
            Ok(settings) => {
                let settings = settings.with_overrides(args.api_url, args.player);
                match settings.validate() {
                    Ok(()) => {
                        let task = app.initialize(settings);
                        (app, task)
                    }
                    Err(e) => {
                        app.show_setup(&settings, Some(e.to_string()));
                        (app, Task::none())
                    }
                }
            }
            Err(error) => {
                let defaults = AppSettings::default().with_overrides(args.api_url, args.player);
                app.show_setup(&defaults, error);
                (app, Task::none())
            }
        }
    }

    fn show_setup(&mut self, settings: &AppSettings, error: Option<String>) {
        let mut page = SetupPage::from_settings(settings);
        page.error = error;
        self.setup_page = Some(page);
    }

    fn initialize(&mut self, settings: AppSettings) -> Task<Message> {
        let client = match CatalogueClient::from_settings(&settings) {
            Ok(client) => client,
            Err(e) => {
                self.show_setup(&settings, Some(e.to_string()));
                return Task::none();
            }
        };
        log::info!("using catalogue API at {}", settings.api_base_url);
        self.client = Some(client.clone());
        self.settings = settings;
        self.setup_page = None;

        let categories = Task::perform(load_categories(client.clone()), Message::CategoriesLoaded);
        let countries = Task::perform(load_countries(client), Message::CountriesLoaded);
        let start_route = self.start_route.clone();
        let route = handlers::open_route(self, start_route);
        Task::batch([categories, countries, route])
    }

    /// Route of whatever screen is on display.
    pub fn current_route(&self) -> Route {
        match &self.screen {
            Screen::Home => self.home.route(),
            Screen::Filter => self.filter.route(),
            Screen::Movie(slug) => Route::Movie { slug: slug.clone() },
        }
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        if let Message::Setup(setup_msg) = message {
            if let Some(ref mut setup) = self.setup_page {
                if let Some(settings) = setup.update(setup_msg) {
                    return self.initialize(settings);
                }
            }
            return Task::none();
        }
        handlers::handle_message(self, message)
    }

    fn view(&self) -> Element<'_, Message> {
        if let Some(ref setup) = self.setup_page {
            return setup.view().map(Message::Setup);
        }

        let body = match &self.screen {
            Screen::Home => self.view_listing_page(&self.home, ListingKind::Home),
            Screen::Filter => self.view_listing_page(&self.filter, ListingKind::Filter),
            Screen::Movie(_) => self.view_detail_page(),
        };

        let page = scrollable(column![body, self.view_footer()].width(Length::Fill))
            .width(Length::Fill)
            .height(Length::Fill);

        container(column![self.view_header(), page])
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_theme| container::Style {
                background: Some(iced::Background::Color(BACKGROUND_DARK)),
                ..Default::default()
            })
            .into()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.setup_page.is_some() {
            return Subscription::none();
        }
        iced::time::every(std::time::Duration::from_secs(1)).map(|_| Message::ClockTick)
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    iced::application(move || CineStream::new(args.clone()), CineStream::update, CineStream::view)
        .title("CineStream")
        .theme(CineStream::theme)
        .window_size(Size::new(1280.0, 800.0))
        .font(iced_fonts::BOOTSTRAP_FONT_BYTES)
        .default_font(Font::DEFAULT)
        .subscription(CineStream::subscription)
        .run()
}
