use iced::Task;

use crate::api::{load_movie, ApiError};
use crate::media::{Episode, LoadingState, Message, MovieWithEpisodes, Screen};
use crate::player::{play_episode, PlaybackError};
use crate::CineStream;

#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub slug: Option<String>,
    pub loading_state: LoadingState,
    pub data: Option<MovieWithEpisodes>,
    pub selected_episode: Option<String>,
    pub launching: bool,
    pub playback_status: Option<Result<String, String>>,
}

impl DetailState {
    /// Switches to `slug`. Returns `true` when the movie has to be fetched.
    pub fn open(&mut self, slug: &str) -> bool {
        let same_movie = self.slug.as_deref() == Some(slug);
        if same_movie && self.data.is_some() {
            return false;
        }
        if !same_movie {
            self.data = None;
            self.selected_episode = None;
            self.playback_status = None;
        }
        self.slug = Some(slug.to_string());
        self.loading_state = LoadingState::Loading;
        true
    }

    /// Applies a fetch result unless the user has already moved to another movie.
    pub fn apply(&mut self, slug: &str, result: Result<MovieWithEpisodes, ApiError>) -> bool {
        if self.slug.as_deref() != Some(slug) {
            log::debug!("dropping detail response for {}", slug);
            return false;
        }
        match result {
            Ok(data) => {
                self.selected_episode = data.first_episode().map(|e| e.slug.clone());
                self.data = Some(data);
                self.loading_state = LoadingState::Idle;
            }
            Err(error) => {
                log::warn!("loading movie {} failed: {}", slug, error);
                self.loading_state = LoadingState::Error(error.to_string());
            }
        }
        true
    }

    pub fn select_episode(&mut self, slug: &str) -> bool {
        let exists = self
            .data
            .as_ref()
            .is_some_and(|d| d.find_episode(slug).is_some());
        if exists {
            self.selected_episode = Some(slug.to_string());
            self.playback_status = None;
        }
        exists
    }

    pub fn selected_episode(&self) -> Option<&Episode> {
        let slug = self.selected_episode.as_deref()?;
        self.data.as_ref()?.find_episode(slug)
    }
}

pub fn handle_open_movie(app: &mut CineStream, slug: String) -> Task<Message> {
    app.screen = Screen::Movie(slug.clone());
    if !app.detail.open(&slug) {
        return Task::none();
    }
    let Some(client) = &app.client else {
        return Task::none();
    };
    let fetch_client = client.clone();
    Task::perform(load_movie(fetch_client, slug.clone()), move |result| {
        Message::MovieLoaded(slug.clone(), result)
    })
}

pub fn handle_movie_loaded(
    app: &mut CineStream,
    slug: String,
    result: Result<MovieWithEpisodes, ApiError>,
) -> Task<Message> {
    if !app.detail.apply(&slug, result) {
        return Task::none();
    }
    let artwork = app
        .detail
        .data
        .as_ref()
        .and_then(|d| d.movie.artwork_source());
    match artwork {
        Some(url) if app.image_cache.needs_load(&url) => Task::done(Message::LoadImage(url)),
        _ => Task::none(),
    }
}

pub fn handle_retry_movie(app: &mut CineStream) -> Task<Message> {
    let Some(slug) = app.detail.slug.clone() else {
        return Task::none();
    };
    app.detail.data = None;
    handle_open_movie(app, slug)
}

pub fn handle_select_episode(app: &mut CineStream, slug: String) -> Task<Message> {
    if !app.detail.select_episode(&slug) {
        log::warn!("episode {} is not part of the current movie", slug);
    }
    Task::none()
}

pub fn handle_play_episode(app: &mut CineStream) -> Task<Message> {
    if app.detail.launching {
        return Task::none();
    }
    let Some(episode) = app.detail.selected_episode().cloned() else {
        return Task::none();
    };
    app.detail.launching = true;
    app.detail.playback_status = None;
    let player = app.settings.external_player.clone();
    Task::perform(play_episode(player, episode), Message::PlaybackFinished)
}

pub fn handle_playback_finished(
    app: &mut CineStream,
    result: Result<String, PlaybackError>,
) -> Task<Message> {
    app.detail.launching = false;
    app.detail.playback_status = Some(result.map_err(|e| e.to_string()));
    Task::none()
}
