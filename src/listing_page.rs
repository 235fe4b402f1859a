use chrono::Datelike;
use iced::widget::{button, column, container, pick_list, row, text, Column, Space};
use iced::{Element, Length, Padding};

use crate::components::{
    dropdown_style, icon, primary_button_style, subtle_button_style, taxonomy_dropdown,
    ICON_FILM, ICON_X_LG,
};
use crate::listing::ListingState;
use crate::media::{ListingKind, Message, EPISODE_RED, TEXT_GRAY, TEXT_WHITE};
use crate::CineStream;

const FIRST_RELEASE_YEAR: i32 = 1970;
const ALL_YEARS: &str = "All years";

impl CineStream {
    pub fn view_listing_page<'a>(
        &'a self,
        state: &'a ListingState,
        kind: ListingKind,
    ) -> Element<'a, Message> {
        let mut page = Column::new().spacing(24).width(Length::Fill);

        page = page.push(self.view_listing_title(state));
        if kind == ListingKind::Filter {
            page = page.push(self.view_filter_panel(state));
        }
        page = page.push(self.view_listing_body(state, kind));
        page = page.push(self.view_pagination(state, kind));

        container(page)
            .width(Length::Fill)
            .padding(Padding::new(32.0).left(48.0).right(48.0))
            .into()
    }

    fn view_listing_title<'a>(&'a self, state: &'a ListingState) -> Element<'a, Message> {
        let title = text(state.title(&self.categories, &self.countries))
            .size(26)
            .color(TEXT_WHITE)
            .shaping(text::Shaping::Advanced)
            .font(iced::Font {
                weight: iced::font::Weight::Bold,
                ..Default::default()
            });

        let mut details = vec![state.route().to_path()];
        if state.total_pages() > 0 {
            details.push(format!(
                "page {} of {}",
                state.current_page(),
                state.total_pages()
            ));
        }
        let location = text(details.join("  ·  ")).size(12).color(TEXT_GRAY);

        column![title, location].spacing(6).into()
    }

    fn view_filter_panel<'a>(&'a self, state: &'a ListingState) -> Element<'a, Message> {
        let selection = state.filter();

        let category = taxonomy_dropdown(
            "All categories",
            &self.categories,
            selection.category.as_deref(),
            Message::SetCategoryFilter,
        );
        let country = taxonomy_dropdown(
            "All countries",
            &self.countries,
            selection.country.as_deref(),
            Message::SetCountryFilter,
        );

        let mut years: Vec<String> = vec![String::from(ALL_YEARS)];
        years.extend(year_options(self.now.year()));
        let selected_year = selection
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| String::from(ALL_YEARS));
        let year = pick_list(years, Some(selected_year), |choice: String| {
            Message::SetYearFilter(choice.parse().ok())
        })
        .text_size(13)
        .padding(Padding::new(8.0).left(12.0).right(12.0))
        .style(dropdown_style);

        let reset = button(
            row![icon(ICON_X_LG).size(11), text("Reset").size(13)]
                .spacing(6)
                .align_y(iced::Alignment::Center),
        )
        .padding(Padding::new(8.0).left(16.0).right(16.0))
        .style(subtle_button_style)
        .on_press_maybe((!selection.is_empty()).then_some(Message::ResetFilter));

        row![
            text("Filter:").size(13).color(TEXT_GRAY),
            category,
            country,
            year,
            reset
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center)
        .into()
    }

    fn view_listing_body<'a>(
        &'a self,
        state: &'a ListingState,
        kind: ListingKind,
    ) -> Element<'a, Message> {
        if state.is_initial_loading() {
            return self.view_skeleton_grid();
        }

        if state.movies().is_empty() {
            if let Some(error) = state.error() {
                return self.view_error_state(error, Message::RetryListing(kind));
            }
        }

        if state.is_empty_result() {
            return self.view_empty_result(state, kind);
        }

        let mut body = Column::new().spacing(16).width(Length::Fill);
        if let Some(error) = state.error() {
            body = body.push(self.view_error_banner(error, kind));
        }
        if state.is_loading() {
            body = body.push(text("Loading...").size(13).color(TEXT_GRAY));
        }
        body.push(self.view_movie_grid(state.movies(), state.cdn_image_domain()))
            .into()
    }

    fn view_empty_result(&self, state: &ListingState, kind: ListingKind) -> Element<'_, Message> {
        let (message, show_all) = empty_result_prompt(kind, state.is_searching());

        let mut content = column![
            icon(ICON_FILM).size(40).color(TEXT_GRAY),
            text(message).size(16).color(TEXT_WHITE)
        ]
        .spacing(16)
        .align_x(iced::Alignment::Center);

        if let Some(show_all) = show_all {
            content = content.push(
                button(text("Show all movies").size(14))
                    .padding(Padding::new(10.0).left(20.0).right(20.0))
                    .style(primary_button_style)
                    .on_press(show_all),
            );
        }

        container(content)
            .width(Length::Fill)
            .padding(48)
            .center_x(Length::Fill)
            .into()
    }

    fn view_error_banner<'a>(&'a self, error: &'a str, kind: ListingKind) -> Element<'a, Message> {
        row![
            text(format!("Could not load this page: {}", error))
                .size(13)
                .color(EPISODE_RED),
            Space::new().width(Length::Fill),
            button(text("Retry").size(13))
                .padding(Padding::new(6.0).left(14.0).right(14.0))
                .style(subtle_button_style)
                .on_press(Message::RetryListing(kind))
        ]
        .align_y(iced::Alignment::Center)
        .into()
    }
}

/// Message for an empty listing and the action that widens it again, if any.
fn empty_result_prompt(kind: ListingKind, searching: bool) -> (&'static str, Option<Message>) {
    match kind {
        ListingKind::Home if searching => {
            ("No movies match this search.", Some(Message::ClearSearch))
        }
        ListingKind::Home => ("No new movies have been published yet.", None),
        ListingKind::Filter => ("No movies match these filters.", Some(Message::ResetFilter)),
    }
}

/// Release years offered by the year dropdown, newest first.
pub fn year_options(current_year: i32) -> impl Iterator<Item = String> {
    (FIRST_RELEASE_YEAR..=current_year.max(FIRST_RELEASE_YEAR))
        .rev()
        .map(|y| y.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn years_run_newest_first() {
        let years: Vec<String> = year_options(2026).collect();
        assert_eq!(years.first().map(String::as_str), Some("2026"));
        assert_eq!(years.last().map(String::as_str), Some("1970"));
        assert_eq!(years.len(), 57);
    }

    #[test]
    fn empty_latest_listing_offers_no_reset() {
        let (message, action) = empty_result_prompt(ListingKind::Home, false);
        assert_eq!(message, "No new movies have been published yet.");
        assert!(action.is_none());

        let (_, action) = empty_result_prompt(ListingKind::Home, true);
        assert!(matches!(action, Some(Message::ClearSearch)));
        let (_, action) = empty_result_prompt(ListingKind::Filter, false);
        assert!(matches!(action, Some(Message::ResetFilter)));
    }

    #[test]
    fn years_never_start_before_first_release() {
        assert_eq!(year_options(1900).collect::<Vec<_>>(), vec!["1970"]);
    }
}
