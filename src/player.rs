use async_trait::async_trait;
use thiserror::Error;

use crate::media::Episode;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error("episode has no playable link")]
    NoSource,
    #[error("could not start {launcher}: {reason}")]
    Launch { launcher: String, reason: String },
}

#[async_trait]
pub trait EpisodeLauncher: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this launcher has a link it can use for the episode.
    fn can_handle(&self, episode: &Episode) -> bool;

    /// Starts playback and returns a short description of what was opened.
    async fn launch(&self, episode: &Episode) -> Result<String, PlaybackError>;
}

/// Plays the HLS stream through a media player on `PATH`.
pub struct ExternalPlayerLauncher {
    command: String,
}

impl ExternalPlayerLauncher {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl EpisodeLauncher for ExternalPlayerLauncher {
    fn name(&self) -> &str {
        &self.command
    }

    fn can_handle(&self, episode: &Episode) -> bool {
        episode.stream_url().is_some()
    }

    async fn launch(&self, episode: &Episode) -> Result<String, PlaybackError> {
        let url = episode.stream_url().ok_or(PlaybackError::NoSource)?;
        log::info!("starting {} for {}", self.command, url);
        tokio::process::Command::new(&self.command)
            .arg(url)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| PlaybackError::Launch {
                launcher: self.command.clone(),
                reason: e.to_string(),
            })?;
        Ok(format!("Playing episode {} in {}", episode.name, self.command))
    }
}

/// Opens the embed page in the system browser.
pub struct BrowserLauncher;

#[async_trait]
impl EpisodeLauncher for BrowserLauncher {
    fn name(&self) -> &str {
        "browser"
    }

    fn can_handle(&self, episode: &Episode) -> bool {
        episode.embed_url().is_some()
    }

    async fn launch(&self, episode: &Episode) -> Result<String, PlaybackError> {
        let url = episode
            .embed_url()
            .ok_or(PlaybackError::NoSource)?
            .to_string();
        log::info!("opening embed player {}", url);
        tokio::task::spawn_blocking(move || open::that(&url))
            .await
            .map_err(|e| PlaybackError::Launch {
                launcher: String::from("browser"),
                reason: e.to_string(),
            })?
            .map_err(|e| PlaybackError::Launch {
                launcher: String::from("browser"),
                reason: e.to_string(),
            })?;
        Ok(format!("Opened episode {} in the browser", episode.name))
    }
}

pub struct PlaybackService {
    launchers: Vec<Box<dyn EpisodeLauncher>>,
}

impl PlaybackService {
    pub fn new() -> Self {
        Self {
            launchers: Vec::new(),
        }
    }

    pub fn add_launcher<L: EpisodeLauncher + 'static>(&mut self, launcher: L) {
        self.launchers.push(Box::new(launcher));
    }

    pub fn launcher_names(&self) -> Vec<&str> {
        self.launchers.iter().map(|l| l.name()).collect()
    }

    /// Tries each launcher that can handle the episode, in order.
    pub async fn play(&self, episode: &Episode) -> Result<String, PlaybackError> {
        let mut last_error = PlaybackError::NoSource;
        for launcher in self.launchers.iter().filter(|l| l.can_handle(episode)) {
            match launcher.launch(episode).await {
                Ok(status) => return Ok(status),
                Err(e) => {
                    log::warn!("{} failed: {}", launcher.name(), e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

impl Default for PlaybackService {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_playback_service(external_player: Option<&str>) -> PlaybackService {
    let mut service = PlaybackService::new();
    if let Some(command) = external_player.map(str::trim).filter(|c| !c.is_empty()) {
        service.add_launcher(ExternalPlayerLauncher::new(command));
    }
    service.add_launcher(BrowserLauncher);
    service
}

pub async fn play_episode(
    external_player: Option<String>,
    episode: Episode,
) -> Result<String, PlaybackError> {
    create_playback_service(external_player.as_deref())
        .play(&episode)
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn episode(embed: &str, m3u8: &str) -> Episode {
        Episode {
            name: String::from("Tập 01"),
            slug: String::from("tap-01"),
            filename: String::new(),
            link_embed: embed.to_string(),
            link_m3u8: m3u8.to_string(),
        }
    }

    struct Scripted {
        name: &'static str,
        result: Result<String, PlaybackError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EpisodeLauncher for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn can_handle(&self, episode: &Episode) -> bool {
            episode.embed_url().is_some()
        }

        async fn launch(&self, _episode: &Episode) -> Result<String, PlaybackError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn failing(name: &'static str, calls: &Arc<AtomicUsize>) -> Scripted {
        Scripted {
            name,
            result: Err(PlaybackError::Launch {
                launcher: name.to_string(),
                reason: String::from("not installed"),
            }),
            calls: calls.clone(),
        }
    }

    #[tokio::test]
    async fn falls_through_to_next_launcher() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut service = PlaybackService::new();
        service.add_launcher(failing("first", &calls));
        service.add_launcher(Scripted {
            name: "second",
            result: Ok(String::from("ok")),
            calls: calls.clone(),
        });

        let result = service.play(&episode("https://embed/1", "")).await;
        assert_eq!(result, Ok(String::from("ok")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reports_last_error_when_all_fail() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut service = PlaybackService::new();
        service.add_launcher(failing("first", &calls));
        service.add_launcher(failing("second", &calls));

        let result = service.play(&episode("https://embed/1", "")).await;
        assert!(matches!(
            result,
            Err(PlaybackError::Launch { ref launcher, .. }) if launcher == "second"
        ));
    }

    #[tokio::test]
    async fn episode_without_links_has_no_source() {
        let service = create_playback_service(Some("mpv"));
        assert_eq!(
            service.play(&episode("  ", "")).await,
            Err(PlaybackError::NoSource)
        );
    }

    #[test]
    fn external_player_goes_first_when_configured() {
        assert_eq!(
            create_playback_service(Some("mpv")).launcher_names(),
            vec!["mpv", "browser"]
        );
        assert_eq!(
            create_playback_service(Some(" ")).launcher_names(),
            vec!["browser"]
        );
        assert_eq!(create_playback_service(None).launcher_names(), vec!["browser"]);
    }

    #[test]
    fn launchers_check_their_own_link() {
        let stream_only = episode("", "https://cdn/index.m3u8");
        assert!(ExternalPlayerLauncher::new("mpv").can_handle(&stream_only));
        assert!(!BrowserLauncher.can_handle(&stream_only));
    }
}
