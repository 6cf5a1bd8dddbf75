//! Movie record definitions
//!
//! A record is one flat row of the dataset: the film identifier plus every
//! field the extractors know about. Every field except `id` is optional, and
//! `None` means the field was not present on the page.

use serde::{Deserialize, Serialize};

/// Column schema of the dataset, in persisted order
pub const FIELD_NAMES: [&str; 24] = [
    "id",
    "title_ru",
    "title_orig",
    "duration",
    "slogan",
    "year",
    "country",
    "director",
    "cast",
    "script",
    "producer",
    "operator",
    "composer",
    "artist",
    "montage",
    "genre",
    "budget",
    "cash_USA",
    "cash_total",
    "cash_russia",
    "kinopoisk_score",
    "imdb_score",
    "critics_score",
    "synopsis",
];

/// One scraped film
///
/// Field order matches [`FIELD_NAMES`]; serde uses it for the CSV header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: String,
    pub title_ru: Option<String>,
    pub title_orig: Option<String>,
    pub duration: Option<String>,
    pub slogan: Option<String>,
    pub year: Option<String>,
    pub country: Option<String>,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub script: Option<String>,
    pub producer: Option<String>,
    pub operator: Option<String>,
    pub composer: Option<String>,
    pub artist: Option<String>,
    pub montage: Option<String>,
    pub genre: Option<String>,
    pub budget: Option<String>,
    #[serde(rename = "cash_USA")]
    pub cash_usa: Option<String>,
    pub cash_total: Option<String>,
    pub cash_russia: Option<String>,
    pub kinopoisk_score: Option<String>,
    pub imdb_score: Option<String>,
    pub critics_score: Option<String>,
    pub synopsis: Option<String>,
}

impl MovieRecord {
    /// Creates an empty record for the given identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Returns true if a non-empty primary title was extracted
    ///
    /// A page without a title is a CAPTCHA/interstitial, not a film page. An
    /// empty title counts as missing: the CSV dataset cannot tell it apart
    /// from a null cell, so such a row would be dropped on the next load.
    pub fn is_titled(&self) -> bool {
        self.title_ru.as_deref().is_some_and(|title| !title.is_empty())
    }

    /// Looks up an optional field by its column name
    ///
    /// Returns `None` both for unknown names and for absent values; `id` is
    /// always present.
    pub fn get(&self, field: &str) -> Option<&str> {
        let value = match field {
            "id" => return Some(self.id.as_str()),
            "title_ru" => &self.title_ru,
            "title_orig" => &self.title_orig,
            "duration" => &self.duration,
            "slogan" => &self.slogan,
            "year" => &self.year,
            "country" => &self.country,
            "director" => &self.director,
            "cast" => &self.cast,
            "script" => &self.script,
            "producer" => &self.producer,
            "operator" => &self.operator,
            "composer" => &self.composer,
            "artist" => &self.artist,
            "montage" => &self.montage,
            "genre" => &self.genre,
            "budget" => &self.budget,
            "cash_USA" => &self.cash_usa,
            "cash_total" => &self.cash_total,
            "cash_russia" => &self.cash_russia,
            "kinopoisk_score" => &self.kinopoisk_score,
            "imdb_score" => &self.imdb_score,
            "critics_score" => &self.critics_score,
            "synopsis" => &self.synopsis,
            _ => return None,
        };
        value.as_deref()
    }

    /// Returns the optional values in column order, excluding `id`
    pub fn values(&self) -> [Option<&str>; 23] {
        [
            self.title_ru.as_deref(),
            self.title_orig.as_deref(),
            self.duration.as_deref(),
            self.slogan.as_deref(),
            self.year.as_deref(),
            self.country.as_deref(),
            self.director.as_deref(),
            self.cast.as_deref(),
            self.script.as_deref(),
            self.producer.as_deref(),
            self.operator.as_deref(),
            self.composer.as_deref(),
            self.artist.as_deref(),
            self.montage.as_deref(),
            self.genre.as_deref(),
            self.budget.as_deref(),
            self.cash_usa.as_deref(),
            self.cash_total.as_deref(),
            self.cash_russia.as_deref(),
            self.kinopoisk_score.as_deref(),
            self.imdb_score.as_deref(),
            self.critics_score.as_deref(),
            self.synopsis.as_deref(),
        ]
    }

    /// Builds a record from an id and values in column order (excluding `id`)
    pub fn from_values(id: String, values: [Option<String>; 23]) -> Self {
        let [title_ru, title_orig, duration, slogan, year, country, director, cast, script, producer, operator, composer, artist, montage, genre, budget, cash_usa, cash_total, cash_russia, kinopoisk_score, imdb_score, critics_score, synopsis] =
            values;
        Self {
            id,
            title_ru,
            title_orig,
            duration,
            slogan,
            year,
            country,
            director,
            cast,
            script,
            producer,
            operator,
            composer,
            artist,
            montage,
            genre,
            budget,
            cash_usa,
            cash_total,
            cash_russia,
            kinopoisk_score,
            imdb_score,
            critics_score,
            synopsis,
        }
    }
}
