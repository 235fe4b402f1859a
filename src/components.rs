use iced::widget::{
    button, column, container, pick_list, row, text, text_input, Column, Row, Space,
};
use iced::{Border, Color, Element, Length, Padding, Shadow};

use crate::listing::{ListingState, PageSlot};
use crate::media::{
    ListingKind, Message, Screen, Taxonomy, TaxonomyKind, ACCENT_BLUE, EPISODE_RED,
    SURFACE_DARK_GRAY, TEXT_GRAY, TEXT_WHITE,
};
use crate::CineStream;

pub const ICON_SEARCH: char = '\u{F52A}';
pub const ICON_CHEVRON_LEFT: char = '\u{F284}';
pub const ICON_CHEVRON_RIGHT: char = '\u{F285}';
pub const ICON_X_LG: char = '\u{F659}';
pub const ICON_FILM: char = '\u{F3A9}';
pub const ICON_ARROW_CLOCKWISE: char = '\u{F130}';

pub const GRID_COLUMNS: usize = 6;
pub const CARD_WIDTH: f32 = 170.0;
pub const CARD_HEIGHT: f32 = 255.0;

pub fn icon(icon_char: char) -> iced::widget::Text<'static> {
    text(icon_char.to_string()).font(iced::Font {
        family: iced::font::Family::Name("bootstrap-icons"),
        ..Default::default()
    })
}

pub fn dropdown_style(_theme: &iced::Theme, _status: pick_list::Status) -> pick_list::Style {
    pick_list::Style {
        text_color: TEXT_WHITE,
        placeholder_color: TEXT_GRAY,
        handle_color: TEXT_WHITE,
        background: iced::Background::Color(Color::from_rgba(1.0, 1.0, 1.0, 0.1)),
        border: Border {
            color: Color::from_rgba(1.0, 1.0, 1.0, 0.2),
            width: 1.0,
            radius: 4.0.into(),
        },
    }
}

pub fn primary_button_style(_theme: &iced::Theme, status: button::Status) -> button::Style {
    let background = match status {
        button::Status::Hovered => Color::from_rgb(0.18, 0.4, 0.8),
        button::Status::Disabled => Color::from_rgba(0.231, 0.510, 0.965, 0.4),
        _ => ACCENT_BLUE,
    };
    button::Style {
        background: Some(iced::Background::Color(background)),
        text_color: TEXT_WHITE,
        border: Border {
            color: Color::TRANSPARENT,
            width: 0.0,
            radius: 4.0.into(),
        },
        shadow: Shadow::default(),
        snap: false,
    }
}

pub fn subtle_button_style(_theme: &iced::Theme, status: button::Status) -> button::Style {
    let (bg_alpha, text_color) = match status {
        button::Status::Hovered => (0.2, TEXT_WHITE),
        button::Status::Disabled => (0.03, TEXT_GRAY),
        _ => (0.1, TEXT_WHITE),
    };
    button::Style {
        background: Some(iced::Background::Color(Color::from_rgba(
            1.0, 1.0, 1.0, bg_alpha,
        ))),
        text_color,
        border: Border {
            color: Color::from_rgba(1.0, 1.0, 1.0, 0.2),
            width: 1.0,
            radius: 4.0.into(),
        },
        shadow: Shadow::default(),
        snap: false,
    }
}

/// Dropdown over a taxonomy list with a leading "all" entry.
pub fn taxonomy_dropdown<'a>(
    all_label: &'static str,
    items: &'a [Taxonomy],
    selected: Option<&str>,
    on_select: impl Fn(Option<Taxonomy>) -> Message + 'a,
) -> Element<'a, Message> {
    let mut options: Vec<String> = vec![String::from(all_label)];
    options.extend(items.iter().map(|t| t.name.clone()));

    let selected = selected
        .and_then(|slug| items.iter().find(|t| t.slug == slug))
        .map(|t| t.name.clone())
        .unwrap_or_else(|| String::from(all_label));

    pick_list(options, Some(selected), move |name| {
        on_select(items.iter().find(|t| t.name == name).cloned())
    })
    .text_size(13)
    .padding(Padding::new(8.0).left(12.0).right(12.0))
    .style(dropdown_style)
    .into()
}

impl CineStream {
    pub fn view_header(&self) -> Element<'_, Message> {
        let left_section = row![self.view_logo(), self.view_navigation()]
            .spacing(32)
            .align_y(iced::Alignment::Center);

        let right_section = row![
            self.view_header_dropdown(TaxonomyKind::Category),
            self.view_header_dropdown(TaxonomyKind::Country),
            self.view_search_bar()
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center);

        let header_content = row![
            left_section,
            Space::new().width(Length::Fill),
            right_section
        ]
        .padding(Padding::new(16.0).left(48.0).right(48.0))
        .align_y(iced::Alignment::Center);

        container(header_content)
            .width(Length::Fill)
            .height(Length::Fixed(72.0))
            .style(|_theme| container::Style {
                background: Some(iced::Background::Color(Color::from_rgba(
                    0.0, 0.0, 0.0, 0.5,
                ))),
                ..Default::default()
            })
            .into()
    }

    pub fn view_logo(&self) -> Element<'_, Message> {
        let logo = row![
            icon(ICON_FILM).size(24).color(ACCENT_BLUE),
            text("CineStream")
                .size(26)
                .color(TEXT_WHITE)
                .font(iced::Font {
                    weight: iced::font::Weight::Bold,
                    ..Default::default()
                })
        ]
        .spacing(8)
        .align_y(iced::Alignment::Center);

        button(logo)
            .padding(0)
            .style(|_theme, _status| button::Style {
                background: None,
                text_color: TEXT_WHITE,
                border: Border::default(),
                shadow: Shadow::default(),
                snap: false,
            })
            .on_press(Message::ClearSearch)
            .into()
    }

    pub fn view_navigation(&self) -> Element<'_, Message> {
        let nav_items = [("Home", Screen::Home), ("Filter", Screen::Filter)];

        let nav_buttons: Vec<Element<Message>> = nav_items
            .into_iter()
            .map(|(label, screen)| self.view_nav_button(label, screen))
            .collect();

        Row::with_children(nav_buttons)
            .spacing(16)
            .align_y(iced::Alignment::Center)
            .into()
    }

    fn view_nav_button(&self, label: &'static str, screen: Screen) -> Element<'_, Message> {
        let is_active = self.screen == screen;
        let text_color = if is_active { TEXT_WHITE } else { TEXT_GRAY };

        let button_content: Element<Message> = if is_active {
            let underline = container(Space::new().width(Length::Fill).height(2)).style(|_theme| {
                container::Style {
                    background: Some(iced::Background::Color(ACCENT_BLUE)),
                    ..Default::default()
                }
            });
            column![text(label).size(14).color(text_color), underline]
                .spacing(4)
                .align_x(iced::Alignment::Center)
                .into()
        } else {
            text(label).size(14).color(text_color).into()
        };

        button(button_content)
            .padding(Padding::new(8.0).left(12.0).right(12.0))
            .style(move |_theme, status| {
                let final_color = match status {
                    button::Status::Hovered => TEXT_WHITE,
                    _ if is_active => TEXT_WHITE,
                    _ => TEXT_GRAY,
                };
                button::Style {
                    background: Some(iced::Background::Color(Color::TRANSPARENT)),
                    text_color: final_color,
                    border: Border::default(),
                    shadow: Shadow::default(),
                    snap: false,
                }
            })
            .on_press(Message::NavigateTo(screen))
            .into()
    }

    /// Header dropdowns jump to the Filter screen preselected on one taxonomy.
    fn view_header_dropdown(&self, kind: TaxonomyKind) -> Element<'_, Message> {
        let (label, items) = match kind {
            TaxonomyKind::Category => ("Categories", self.categories.as_slice()),
            TaxonomyKind::Country => ("Countries", self.countries.as_slice()),
        };
        taxonomy_dropdown(label, items, None, move |taxonomy| match taxonomy {
            Some(t) => Message::OpenTaxonomy(kind, t.slug),
            None => Message::NavigateTo(Screen::Filter),
        })
    }

    pub fn view_search_bar(&self) -> Element<'_, Message> {
        let search_icon = icon(ICON_SEARCH).size(14).color(TEXT_GRAY);

        let search_input = text_input("Search movies...", &self.search_query)
            .on_input(Message::SearchQueryChanged)
            .on_submit(Message::SearchSubmit)
            .padding(8)
            .width(Length::Fixed(200.0))
            .style(|_theme, _status| text_input::Style {
                background: iced::Background::Color(Color::TRANSPARENT),
                border: Border::default(),
                icon: TEXT_GRAY,
                placeholder: TEXT_GRAY,
                value: TEXT_WHITE,
                selection: ACCENT_BLUE,
            });

        let mut search_content = row![search_icon, search_input]
            .spacing(8)
            .align_y(iced::Alignment::Center);

        if !self.search_query.is_empty() || self.home.is_searching() {
            let clear = button(icon(ICON_X_LG).size(12).color(TEXT_GRAY))
                .padding(4)
                .style(|_theme, _status| button::Style {
                    background: None,
                    text_color: TEXT_GRAY,
                    border: Border::default(),
                    shadow: Shadow::default(),
                    snap: false,
                })
                .on_press(Message::ClearSearch);
            search_content = search_content.push(clear);
        }

        container(search_content)
            .padding(Padding::new(4.0).left(12.0).right(8.0))
            .style(|_theme| container::Style {
                background: Some(iced::Background::Color(Color::from_rgba(
                    0.0, 0.0, 0.0, 0.7,
                ))),
                border: Border {
                    color: TEXT_GRAY,
                    width: 1.0,
                    radius: 24.0.into(),
                },
                ..Default::default()
            })
            .into()
    }

    pub fn view_footer(&self) -> Element<'_, Message> {
        let copyright = text(format!(
            "© {} CineStream. All rights reserved.",
            self.now.format("%Y")
        ))
        .size(13)
        .color(TEXT_GRAY);

        let clock = text(self.now.format("%d/%m/%Y %H:%M:%S").to_string())
            .size(13)
            .color(TEXT_WHITE)
            .font(iced::Font::MONOSPACE);

        container(
            row![copyright, Space::new().width(Length::Fill), clock]
                .align_y(iced::Alignment::Center),
        )
        .width(Length::Fill)
        .padding(Padding::new(20.0).left(48.0).right(48.0))
        .style(|_theme| container::Style {
            background: Some(iced::Background::Color(SURFACE_DARK_GRAY)),
            ..Default::default()
        })
        .into()
    }

    pub fn view_pagination(&self, state: &ListingState, kind: ListingKind) -> Element<'_, Message> {
        if !state.show_pagination() {
            return Space::new().height(0).into();
        }

        let current = state.current_page();
        let mut controls: Vec<Element<Message>> = Vec::new();

        controls.push(
            button(icon(ICON_CHEVRON_LEFT).size(13))
                .padding(Padding::new(8.0).left(12.0).right(12.0))
                .style(subtle_button_style)
                .on_press_maybe(
                    state
                        .can_go_previous()
                        .then_some(Message::PreviousPage(kind)),
                )
                .into(),
        );

        for slot in state.page_window() {
            let control: Element<Message> = match slot {
                PageSlot::Gap => container(text("...").size(13).color(TEXT_GRAY))
                    .padding(Padding::new(8.0).left(4.0).right(4.0))
                    .into(),
                PageSlot::Page(page) if page == current => {
                    button(text(page.to_string()).size(13))
                        .padding(Padding::new(8.0).left(12.0).right(12.0))
                        .style(primary_button_style)
                        .into()
                }
                PageSlot::Page(page) => button(text(page.to_string()).size(13))
                    .padding(Padding::new(8.0).left(12.0).right(12.0))
                    .style(subtle_button_style)
                    .on_press(Message::GoToPage(kind, page))
                    .into(),
            };
            controls.push(control);
        }

        controls.push(
            button(icon(ICON_CHEVRON_RIGHT).size(13))
                .padding(Padding::new(8.0).left(12.0).right(12.0))
                .style(subtle_button_style)
                .on_press_maybe(state.can_go_next().then_some(Message::NextPage(kind)))
                .into(),
        );

        container(
            Row::with_children(controls)
                .spacing(6)
                .align_y(iced::Alignment::Center),
        )
        .width(Length::Fill)
        .center_x(Length::Fill)
        .padding(Padding::new(24.0))
        .into()
    }

    pub fn view_error_state<'a>(&'a self, error_message: &'a str, retry: Message) -> Element<'a, Message> {
        let error_text = text(error_message).size(16).color(EPISODE_RED);
        let retry_button = button(
            row![icon(ICON_ARROW_CLOCKWISE).size(14), text("Retry").size(14)]
                .spacing(8)
                .align_y(iced::Alignment::Center),
        )
        .padding(Padding::new(10.0).left(20.0).right(20.0))
        .style(primary_button_style)
        .on_press(retry);

        container(
            column![error_text, retry_button]
                .spacing(16)
                .align_x(iced::Alignment::Center),
        )
        .width(Length::Fill)
        .padding(32)
        .center_x(Length::Fill)
        .into()
    }

    pub fn view_skeleton_grid(&self) -> Element<'_, Message> {
        let rows: Vec<Element<Message>> = (0..2)
            .map(|_| {
                let cards: Vec<Element<Message>> = (0..GRID_COLUMNS)
                    .map(|_| {
                        container(Space::new().width(CARD_WIDTH).height(CARD_HEIGHT))
                            .style(skeleton_style(8.0))
                            .into()
                    })
                    .collect();
                Row::with_children(cards).spacing(16).into()
            })
            .collect();

        Column::with_children(rows)
            .spacing(24)
            .width(Length::Fill)
            .into()
    }
}

pub fn skeleton_style(radius: f32) -> impl Fn(&iced::Theme) -> container::Style {
    move |_theme| container::Style {
        background: Some(iced::Background::Color(Color::from_rgba(
            0.2, 0.2, 0.2, 0.5,
        ))),
        border: Border {
            radius: radius.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}
