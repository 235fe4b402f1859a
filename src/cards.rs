use iced::widget::{column, container, row, text, Column, Row, Space};
use iced::{Border, Color, Element, Length, Padding, Shadow};

use crate::components::{icon, CARD_HEIGHT, CARD_WIDTH, GRID_COLUMNS, ICON_FILM};
use crate::media::{
    Message, MovieSummary, Screen, ACCENT_PURPLE, SURFACE_DARK_GRAY, TEXT_GRAY, TEXT_WHITE,
};
use crate::CineStream;

const ICON_STAR_FILL: char = '\u{F586}';

impl CineStream {
    pub fn view_movie_grid<'a>(
        &'a self,
        movies: &'a [MovieSummary],
        cdn_domain: Option<&'a str>,
    ) -> Element<'a, Message> {
        let rows: Vec<Element<Message>> = movies
            .chunks(GRID_COLUMNS)
            .map(|chunk| {
                let mut cards: Vec<Element<Message>> = chunk
                    .iter()
                    .map(|movie| self.view_movie_card(movie, cdn_domain))
                    .collect();
                // Pad the last row so cards keep their column positions.
                while cards.len() < GRID_COLUMNS {
                    cards.push(Space::new().width(CARD_WIDTH).into());
                }
                Row::with_children(cards)
                    .spacing(16)
                    .align_y(iced::Alignment::Start)
                    .into()
            })
            .collect();

        Column::with_children(rows)
            .spacing(24)
            .width(Length::Fill)
            .into()
    }

    pub fn view_movie_card<'a>(
        &'a self,
        movie: &'a MovieSummary,
        cdn_domain: Option<&'a str>,
    ) -> Element<'a, Message> {
        let poster = self.view_card_poster(movie, cdn_domain);

        let mut poster_layers = iced::widget::stack![poster];
        if let Some(vote) = movie.vote_average() {
            poster_layers = poster_layers.push(
                container(self.view_rating_badge(vote))
                    .width(Length::Fill)
                    .padding(8)
                    .align_x(iced::alignment::Horizontal::Right),
            );
        }

        let title = text(&movie.name)
            .size(14)
            .color(TEXT_WHITE)
            .shaping(text::Shaping::Advanced)
            .width(Length::Fixed(CARD_WIDTH));

        let subtitle = match movie.year {
            Some(year) if !movie.origin_name.is_empty() => {
                format!("{} ({})", movie.origin_name, year)
            }
            Some(year) => year.to_string(),
            None => movie.origin_name.clone(),
        };
        let subtitle = text(subtitle)
            .size(12)
            .color(TEXT_GRAY)
            .shaping(text::Shaping::Advanced)
            .width(Length::Fixed(CARD_WIDTH));

        let card = column![poster_layers, title, subtitle].spacing(6);

        iced::widget::mouse_area(card)
            .on_press(Message::NavigateTo(Screen::Movie(movie.slug.clone())))
            .interaction(iced::mouse::Interaction::Pointer)
            .into()
    }

    fn view_card_poster(
        &self,
        movie: &MovieSummary,
        cdn_domain: Option<&str>,
    ) -> Element<'_, Message> {
        let handle = movie
            .poster_source(cdn_domain)
            .and_then(|url| self.image_cache.get(&url).cloned());

        let content: Element<Message> = match handle {
            Some(handle) => iced::widget::image(handle)
                .width(Length::Fixed(CARD_WIDTH))
                .height(Length::Fixed(CARD_HEIGHT))
                .content_fit(iced::ContentFit::Cover)
                .into(),
            None => container(icon(ICON_FILM).size(32).color(TEXT_GRAY))
                .width(Length::Fixed(CARD_WIDTH))
                .height(Length::Fixed(CARD_HEIGHT))
                .center_x(Length::Fixed(CARD_WIDTH))
                .center_y(Length::Fixed(CARD_HEIGHT))
                .into(),
        };

        container(content)
            .width(Length::Fixed(CARD_WIDTH))
            .height(Length::Fixed(CARD_HEIGHT))
            .style(|_theme| container::Style {
                background: Some(iced::Background::Color(SURFACE_DARK_GRAY)),
                border: Border {
                    color: Color::TRANSPARENT,
                    width: 0.0,
                    radius: 8.0.into(),
                },
                shadow: Shadow {
                    color: Color::from_rgba(0.0, 0.0, 0.0, 0.3),
                    offset: iced::Vector::new(0.0, 4.0),
                    blur_radius: 8.0,
                },
                ..Default::default()
            })
            .into()
    }

    fn view_rating_badge(&self, vote: f32) -> Element<'_, Message> {
        container(
            row![
                icon(ICON_STAR_FILL).size(10).color(TEXT_WHITE),
                text(format!("{:.1}", vote)).size(11).color(TEXT_WHITE)
            ]
            .spacing(4)
            .align_y(iced::Alignment::Center),
        )
        .padding(Padding::new(3.0).left(6.0).right(6.0))
        .style(|_theme| container::Style {
            background: Some(iced::Background::Color(ACCENT_PURPLE)),
            border: Border {
                radius: 4.0.into(),
                ..Default::default()
            },
            ..Default::default()
        })
        .into()
    }
}
