use iced::widget::{button, column, container, row, text, Column, Row, Space};
use iced::{Border, Color, Element, Length, Padding};
use scraper::{Html, Node};

use crate::components::{icon, primary_button_style, subtle_button_style, ICON_FILM};
use crate::media::{
    truncate_description, EpisodeServer, LoadingState, Message, MovieWithEpisodes, Screen,
    TaxonomyKind, TaxonomyRef, ACCENT_BLUE, EPISODE_RED, SURFACE_DARK_GRAY, TEXT_GRAY, TEXT_WHITE,
};
use crate::CineStream;

const ICON_PLAY_FILL: char = '\u{F4F4}';
const ICON_ARROW_LEFT: char = '\u{F12F}';
const ICON_GLOBE: char = '\u{F3EF}';

const ARTWORK_WIDTH: f32 = 260.0;
const ARTWORK_HEIGHT: f32 = 390.0;
const DESCRIPTION_MAX_CHARS: usize = 900;

const BLOCK_TAGS: &[&str] = &["br", "p", "div", "li", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Text content of the description markup, entities decoded and whitespace
/// collapsed. Block elements start a new word.
pub fn plain_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let mut out = String::with_capacity(markup.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(&**text),
            Node::Element(element) if BLOCK_TAGS.contains(&element.name()) => out.push(' '),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl CineStream {
    pub fn view_detail_page(&self) -> Element<'_, Message> {
        let back = button(
            row![icon(ICON_ARROW_LEFT).size(13), text("Back to movies").size(13)]
                .spacing(8)
                .align_y(iced::Alignment::Center),
        )
        .padding(Padding::new(8.0).left(14.0).right(14.0))
        .style(subtle_button_style)
        .on_press(Message::NavigateTo(Screen::Home));

        let body: Element<Message> = match (&self.detail.loading_state, &self.detail.data) {
            (LoadingState::Error(error), _) => self.view_error_state(error, Message::RetryMovie),
            (_, Some(data)) => self.view_movie_detail(data),
            _ => container(text("Loading movie...").size(16).color(TEXT_GRAY))
                .width(Length::Fill)
                .padding(48)
                .center_x(Length::Fill)
                .into(),
        };

        container(column![back, body].spacing(24).width(Length::Fill))
            .width(Length::Fill)
            .padding(Padding::new(32.0).left(48.0).right(48.0))
            .into()
    }

    fn view_movie_detail<'a>(&'a self, data: &'a MovieWithEpisodes) -> Element<'a, Message> {
        let movie = &data.movie;

        let title = text(&movie.name)
            .size(32)
            .color(TEXT_WHITE)
            .shaping(text::Shaping::Advanced)
            .font(iced::Font {
                weight: iced::font::Weight::Bold,
                ..Default::default()
            });
        let subtitle = text(movie.subtitle())
            .size(16)
            .color(TEXT_GRAY)
            .shaping(text::Shaping::Advanced);

        let badges: Vec<Element<Message>> = movie
            .badges()
            .into_iter()
            .map(view_badge)
            .collect();

        let description = truncate_description(&plain_text(&movie.content), DESCRIPTION_MAX_CHARS);

        let info = column![
            title,
            subtitle,
            Row::with_children(badges).spacing(8),
            self.view_play_controls(),
            text(description)
                .size(14)
                .color(TEXT_WHITE)
                .shaping(text::Shaping::Advanced),
            view_info_line("Directors", movie.directors()),
            view_info_line("Actors", movie.actors()),
            view_taxonomy_line("Categories", TaxonomyKind::Category, &movie.category),
            view_taxonomy_line("Countries", TaxonomyKind::Country, &movie.country),
        ]
        .spacing(14)
        .width(Length::Fill);

        let header = row![self.view_artwork(data), info]
            .spacing(32)
            .align_y(iced::Alignment::Start);

        column![header, self.view_episode_servers(&data.episodes)]
            .spacing(32)
            .width(Length::Fill)
            .into()
    }

    fn view_artwork(&self, data: &MovieWithEpisodes) -> Element<'_, Message> {
        let handle = data
            .movie
            .artwork_source()
            .and_then(|url| self.image_cache.get(&url).cloned());

        let content: Element<Message> = match handle {
            Some(handle) => iced::widget::image(handle)
                .width(Length::Fixed(ARTWORK_WIDTH))
                .height(Length::Fixed(ARTWORK_HEIGHT))
                .content_fit(iced::ContentFit::Cover)
                .into(),
            None => container(icon(ICON_FILM).size(48).color(TEXT_GRAY))
                .center_x(Length::Fixed(ARTWORK_WIDTH))
                .center_y(Length::Fixed(ARTWORK_HEIGHT))
                .into(),
        };

        container(content)
            .width(Length::Fixed(ARTWORK_WIDTH))
            .height(Length::Fixed(ARTWORK_HEIGHT))
            .style(|_theme| container::Style {
                background: Some(iced::Background::Color(SURFACE_DARK_GRAY)),
                border: Border {
                    radius: 8.0.into(),
                    ..Default::default()
                },
                ..Default::default()
            })
            .into()
    }

    fn view_play_controls(&self) -> Element<'_, Message> {
        let Some(episode) = self.detail.selected_episode() else {
            return text("No episodes available yet.")
                .size(14)
                .color(TEXT_GRAY)
                .into();
        };

        let label = if self.detail.launching {
            String::from("Starting...")
        } else {
            format!("Play {}", episode.name)
        };
        let play = button(
            row![icon(ICON_PLAY_FILL).size(14), text(label).size(15)]
                .spacing(8)
                .align_y(iced::Alignment::Center),
        )
        .padding(Padding::new(10.0).left(24.0).right(24.0))
        .style(primary_button_style)
        .on_press_maybe((!self.detail.launching).then_some(Message::PlayEpisode));

        let mut controls = row![play].spacing(16).align_y(iced::Alignment::Center);

        if let Some(embed) = episode.embed_url() {
            controls = controls.push(
                row![
                    icon(ICON_GLOBE).size(12).color(TEXT_GRAY),
                    text(embed).size(12).color(TEXT_GRAY)
                ]
                .spacing(6)
                .align_y(iced::Alignment::Center),
            );
        }

        let status: Element<Message> = match &self.detail.playback_status {
            Some(Ok(status)) => text(status).size(13).color(TEXT_GRAY).into(),
            Some(Err(error)) => text(error).size(13).color(EPISODE_RED).into(),
            None => Space::new().height(0).into(),
        };

        column![controls, status].spacing(8).into()
    }

    fn view_episode_servers<'a>(&'a self, servers: &'a [EpisodeServer]) -> Element<'a, Message> {
        let selected = self.detail.selected_episode.as_deref();

        let sections: Vec<Element<Message>> = servers
            .iter()
            .filter(|server| !server.server_data.is_empty())
            .map(|server| {
                let buttons: Vec<Element<Message>> = server
                    .server_data
                    .iter()
                    .map(|episode| {
                        let style = if episode.is_selected_by(selected) {
                            primary_button_style
                        } else {
                            subtle_button_style
                        };
                        button(text(&episode.name).size(13).shaping(text::Shaping::Advanced))
                            .padding(Padding::new(8.0).left(14.0).right(14.0))
                            .style(style)
                            .on_press(Message::SelectEpisode(episode.slug.clone()))
                            .into()
                    })
                    .collect();

                column![
                    text(&server.server_name)
                        .size(16)
                        .color(TEXT_WHITE)
                        .shaping(text::Shaping::Advanced),
                    Row::with_children(buttons).spacing(8).wrap()
                ]
                .spacing(12)
                .into()
            })
            .collect();

        if sections.is_empty() {
            return Space::new().height(0).into();
        }

        Column::with_children(sections)
            .spacing(24)
            .width(Length::Fill)
            .into()
    }
}

fn view_badge(label: &str) -> Element<'_, Message> {
    container(text(label).size(12).color(TEXT_WHITE).shaping(text::Shaping::Advanced))
        .padding(Padding::new(4.0).left(10.0).right(10.0))
        .style(|_theme| container::Style {
            background: Some(iced::Background::Color(Color::from_rgba(1.0, 1.0, 1.0, 0.1))),
            border: Border {
                color: Color::from_rgba(1.0, 1.0, 1.0, 0.2),
                width: 1.0,
                radius: 4.0.into(),
            },
            ..Default::default()
        })
        .into()
}

fn view_info_line<'a>(label: &'static str, value: String) -> Element<'a, Message> {
    let value = if value.is_empty() {
        String::from("Updating")
    } else {
        value
    };
    row![
        text(format!("{}:", label)).size(14).color(TEXT_GRAY),
        text(value)
            .size(14)
            .color(TEXT_WHITE)
            .shaping(text::Shaping::Advanced)
    ]
    .spacing(8)
    .into()
}

/// Taxonomy names as links that open the Filter screen on that taxonomy.
fn view_taxonomy_line<'a>(
    label: &'static str,
    kind: TaxonomyKind,
    items: &'a [TaxonomyRef],
) -> Element<'a, Message> {
    let mut line = row![text(format!("{}:", label)).size(14).color(TEXT_GRAY)]
        .spacing(8)
        .align_y(iced::Alignment::Center);

    for item in items {
        line = line.push(
            button(text(&item.name).size(14).shaping(text::Shaping::Advanced))
                .padding(0)
                .style(|_theme, status| button::Style {
                    background: None,
                    text_color: match status {
                        button::Status::Hovered => TEXT_WHITE,
                        _ => ACCENT_BLUE,
                    },
                    border: Border::default(),
                    shadow: iced::Shadow::default(),
                    snap: false,
                })
                .on_press(Message::OpenTaxonomy(kind, item.slug.clone())),
        );
    }
    line.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_from_description() {
        assert_eq!(
            plain_text("<p>Phim&nbsp;hay</p><p>Tập   cuối &amp; kết</p>"),
            "Phim hay Tập cuối & kết"
        );
        assert_eq!(plain_text(""), "");
        assert_eq!(plain_text("no tags"), "no tags");
        assert_eq!(plain_text("<b>Ph</b>im"), "Phim");
    }

    #[test]
    fn decodes_entities_and_keeps_stray_brackets() {
        assert_eq!(plain_text("It&#39;s 5 &lt; 6"), "It's 5 < 6");
        assert_eq!(plain_text("<p>If a < b then</p>"), "If a < b then");
        assert_eq!(plain_text("Line one<br>Line two"), "Line one Line two");
    }
}
