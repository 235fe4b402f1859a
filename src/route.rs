use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::{Position, Url};

use crate::listing::FilterSelection;

const ROUTE_ORIGIN: &str = "http://cinestream.local/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("malformed route {0:?}")]
    Malformed(String),
    #[error("no screen for path {0:?}")]
    UnknownPath(String),
}

/// Location of a screen, in the same path and query shape the web front end
/// used, so links copied from it open the same screen here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home {
        keyword: Option<String>,
        page: u32,
    },
    Filter {
        selection: FilterSelection,
        page: u32,
    },
    Movie {
        slug: String,
    },
}

impl Default for Route {
    fn default() -> Self {
        Route::Home {
            keyword: None,
            page: 1,
        }
    }
}

fn origin() -> Result<Url, RouteError> {
    Url::parse(ROUTE_ORIGIN).map_err(|_| RouteError::Malformed(ROUTE_ORIGIN.to_string()))
}

fn parse_page(value: &str) -> u32 {
    value.trim().parse::<u32>().ok().filter(|p| *p >= 1).unwrap_or(1)
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl Route {
    pub fn parse(input: &str) -> Result<Route, RouteError> {
        let input = input.trim();
        let url = if input.is_empty() {
            origin()?
        } else {
            origin()?
                .join(input)
                .map_err(|_| RouteError::Malformed(input.to_string()))?
        };

        let mut keyword = None;
        let mut page = 1;
        let mut selection = FilterSelection::default();
        for (key, value) in url.query_pairs() {
            match &*key {
                "keyword" => keyword = non_empty(&value),
                "page" => page = parse_page(&value),
                "category" => selection.category = non_empty(&value),
                "country" => selection.country = non_empty(&value),
                "year" => selection.year = value.trim().parse().ok(),
                _ => {}
            }
        }

        let decoded = url
            .path_segments()
            .map(|s| {
                s.filter(|seg| !seg.is_empty())
                    .map(|seg| {
                        percent_decode_str(seg)
                            .decode_utf8()
                            .map(|seg| seg.into_owned())
                            .map_err(|_| RouteError::Malformed(input.to_string()))
                    })
                    .collect::<Result<Vec<String>, RouteError>>()
            })
            .transpose()?
            .unwrap_or_default();
        let segments: Vec<&str> = decoded.iter().map(String::as_str).collect();

        match segments.as_slice() {
            [] => Ok(Route::Home { keyword, page }),
            ["filter"] => Ok(Route::Filter { selection, page }),
            ["category", slug] => Ok(Route::Filter {
                selection: FilterSelection {
                    category: Some(slug.to_string()),
                    ..selection
                },
                page,
            }),
            ["country", slug] => Ok(Route::Filter {
                selection: FilterSelection {
                    country: Some(slug.to_string()),
                    ..selection
                },
                page,
            }),
            ["movies", slug] => Ok(Route::Movie {
                slug: slug.to_string(),
            }),
            _ => Err(RouteError::UnknownPath(url.path().to_string())),
        }
    }

    pub fn to_path(&self) -> String {
        let Ok(mut url) = origin() else {
            return String::from("/");
        };
        let mut params: Vec<(&str, String)> = Vec::new();
        match self {
            Route::Home { keyword, page } => {
                if let Some(keyword) = keyword {
                    params.push(("keyword", keyword.clone()));
                }
                if *page > 1 {
                    params.push(("page", page.to_string()));
                }
            }
            Route::Filter { selection, page } => {
                url.set_path("/filter");
                if let Some(category) = &selection.category {
                    params.push(("category", category.clone()));
                }
                if let Some(country) = &selection.country {
                    params.push(("country", country.clone()));
                }
                if let Some(year) = selection.year {
                    params.push(("year", year.to_string()));
                }
                if *page > 1 {
                    params.push(("page", page.to_string()));
                }
            }
            Route::Movie { slug } => {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.clear().push("movies").push(slug);
                }
            }
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(&params);
        }
        url[Position::BeforePath..].to_string()
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

impl std::str::FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse(s)
    }
}
