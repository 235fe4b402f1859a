use std::path::{Path, PathBuf};

use iced::widget::{button, column, container, text, text_input};
use iced::{Element, Length};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{DEFAULT_API_BASE_URL, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_SEARCH_LIMIT};
use crate::components::primary_button_style;
use crate::media::{ACCENT_BLUE, BACKGROUND_DARK, EPISODE_RED, TEXT_GRAY, TEXT_WHITE};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API address must be an http(s) URL, got {0:?}")]
    InvalidApiUrl(String),
    #[error("search limit must be between 1 and 100, got {0}")]
    InvalidSearchLimit(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api_base_url: String,
    pub search_limit: u32,
    pub cache_ttl_secs: u64,
    pub external_player: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: String::from(DEFAULT_API_BASE_URL),
            search_limit: DEFAULT_SEARCH_LIMIT,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECONDS,
            external_player: None,
        }
    }
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cinestream").join("config.json"))
    }

    pub fn load() -> Result<Option<Self>, SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        Self::load_from(&path)
    }

    /// `Ok(None)` when no config file exists yet.
    pub fn load_from(path: &Path) -> Result<Option<Self>, SettingsError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(Some(settings))
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("saved settings to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let url_ok = url::Url::parse(self.api_base_url.trim())
            .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
            .unwrap_or(false);
        if !url_ok {
            return Err(SettingsError::InvalidApiUrl(self.api_base_url.clone()));
        }
        if !(1..=100).contains(&self.search_limit) {
            return Err(SettingsError::InvalidSearchLimit(self.search_limit));
        }
        Ok(())
    }

    /// Command-line values win over the file.
    pub fn with_overrides(mut self, api_url: Option<String>, player: Option<String>) -> Self {
        if let Some(url) = api_url {
            self.api_base_url = url;
        }
        if let Some(player) = player {
            self.external_player = Some(player).filter(|p| !p.trim().is_empty());
        }
        self
    }
}

#[derive(Debug, Clone)]
pub enum SetupMessage {
    ApiUrlChanged(String),
    PlayerChanged(String),
    Submit,
}

pub struct SetupPage {
    pub api_base_url: String,
    pub external_player: String,
    pub error: Option<String>,
}

impl Default for SetupPage {
    fn default() -> Self {
        Self::from_settings(&AppSettings::default())
    }
}

impl SetupPage {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            api_base_url: settings.api_base_url.clone(),
            external_player: settings.external_player.clone().unwrap_or_default(),
            error: None,
        }
    }

    fn settings(&self) -> AppSettings {
        let player = self.external_player.trim();
        AppSettings {
            api_base_url: self.api_base_url.trim().to_string(),
            external_player: Some(player.to_string()).filter(|p| !p.is_empty()),
            ..AppSettings::default()
        }
    }

    pub fn update(&mut self, message: SetupMessage) -> Option<AppSettings> {
        match message {
            SetupMessage::ApiUrlChanged(url) => {
                self.api_base_url = url;
                self.error = None;
                None
            }
            SetupMessage::PlayerChanged(player) => {
                self.external_player = player;
                None
            }
            SetupMessage::Submit => {
                let settings = self.settings();
                if let Err(e) = settings.validate() {
                    self.error = Some(e.to_string());
                    return None;
                }
                if let Err(e) = settings.save() {
                    self.error = Some(format!("Failed to save: {}", e));
                    return None;
                }
                Some(settings)
            }
        }
    }

    fn can_submit(&self) -> bool {
        !self.api_base_url.trim().is_empty()
    }

    pub fn view(&self) -> Element<'_, SetupMessage> {
        let heading = column![
            text("CINESTREAM").size(48).color(ACCENT_BLUE),
            text("Welcome to CineStream").size(28).color(TEXT_WHITE),
            text("Point the app at a movie catalogue API to get started")
                .size(14)
                .color(TEXT_GRAY),
        ]
        .spacing(6);

        let fields = column![
            setup_field(
                "Catalogue API address",
                "The base URL serving /movies, /categories and /country",
                DEFAULT_API_BASE_URL,
                &self.api_base_url,
                SetupMessage::ApiUrlChanged,
            ),
            setup_field(
                "External player (optional)",
                "e.g. mpv or vlc; leave empty to open episodes in the browser",
                "mpv",
                &self.external_player,
                SetupMessage::PlayerChanged,
            ),
        ]
        .spacing(20);

        let saved_to = AppSettings::config_path()
            .map(|path| format!("Saved to {}", path.display()))
            .unwrap_or_default();

        let mut footer = column![].spacing(10);
        if let Some(error) = &self.error {
            footer = footer.push(text(error).size(14).color(EPISODE_RED));
        }
        footer = footer
            .push(
                button(text("Get Started").size(16))
                    .padding([12, 32])
                    .style(primary_button_style)
                    .on_press_maybe(self.can_submit().then_some(SetupMessage::Submit)),
            )
            .push(text(saved_to).size(11).color(TEXT_GRAY));

        container(
            column![heading, fields, footer]
                .spacing(32)
                .width(Length::Fixed(440.0)),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .style(|_theme| container::Style {
            background: Some(iced::Background::Color(BACKGROUND_DARK)),
            ..Default::default()
        })
        .into()
    }
}

/// Label, hint and input of one setup form field.
fn setup_field<'a>(
    label: &'a str,
    hint: &'a str,
    placeholder: &'a str,
    value: &'a str,
    on_input: fn(String) -> SetupMessage,
) -> Element<'a, SetupMessage> {
    column![
        text(label).size(14).color(TEXT_WHITE),
        text(hint).size(12).color(TEXT_GRAY),
        text_input(placeholder, value)
            .on_input(on_input)
            .on_submit(SetupMessage::Submit)
            .padding(12)
            .size(14)
            .width(Length::Fill),
    ]
    .spacing(4)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppSettings::load_from(&dir.path().join("config.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let settings = AppSettings {
            api_base_url: String::from("http://localhost:4000/api"),
            external_player: Some(String::from("mpv")),
            ..AppSettings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path).unwrap(), Some(settings));
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url": "http://localhost:4000/api"}"#).unwrap();
        let settings = AppSettings::load_from(&path).unwrap().unwrap();
        assert_eq!(settings.search_limit, DEFAULT_SEARCH_LIMIT);
        assert_eq!(settings.cache_ttl_secs, DEFAULT_CACHE_TTL_SECONDS);
        assert_eq!(settings.external_player, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_url = AppSettings {
            api_base_url: String::from("ftp://example.com"),
            ..AppSettings::default()
        };
        assert!(matches!(
            bad_url.validate(),
            Err(SettingsError::InvalidApiUrl(_))
        ));

        let bad_limit = AppSettings {
            search_limit: 0,
            ..AppSettings::default()
        };
        assert!(matches!(
            bad_limit.validate(),
            Err(SettingsError::InvalidSearchLimit(0))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AppSettings::load_from(&path),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn overrides_take_precedence() {
        let settings = AppSettings::default().with_overrides(
            Some(String::from("http://127.0.0.1:4000/api")),
            Some(String::from("  ")),
        );
        assert_eq!(settings.api_base_url, "http://127.0.0.1:4000/api");
        assert_eq!(settings.external_player, None);
    }

    #[test]
    fn setup_rejects_invalid_address_without_saving() {
        let mut page = SetupPage::default();
        assert!(page
            .update(SetupMessage::ApiUrlChanged(String::from("not a url")))
            .is_none());
        assert!(page.update(SetupMessage::Submit).is_none());
        assert!(page.error.is_some());
    }

    #[test]
    fn setup_needs_an_address_before_submitting() {
        let mut page = SetupPage::default();
        assert!(page.can_submit());
        page.update(SetupMessage::ApiUrlChanged(String::from("   ")));
        assert!(!page.can_submit());
    }
}
