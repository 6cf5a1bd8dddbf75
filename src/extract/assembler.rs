//! Record assembly
//!
//! Runs the whole extractor set over one document and builds a fresh
//! [`MovieRecord`]. No I/O happens here, and a missing field never fails the
//! record.

use crate::extract::fields::{
    parse_cast, parse_critics_score, parse_duration, parse_imdb_score, parse_kinopoisk_score,
    parse_slogan, parse_synopsis, parse_tabular, parse_title_orig, parse_title_ru,
};
use crate::record::MovieRecord;
use scraper::Html;

/// Row labels of the info table, as they appear on the page
pub mod labels {
    pub const YEAR: &str = "год";
    pub const COUNTRY: &str = "страна";
    pub const DIRECTOR: &str = "режиссер";
    pub const SCRIPT: &str = "сценарий";
    pub const PRODUCER: &str = "продюсер";
    pub const OPERATOR: &str = "оператор";
    pub const COMPOSER: &str = "композитор";
    pub const ARTIST: &str = "художник";
    pub const MONTAGE: &str = "монтаж";
    pub const GENRE: &str = "жанр";
    pub const BUDGET: &str = "бюджет";
    pub const CASH_USA: &str = "сборы в США";
    pub const CASH_TOTAL: &str = "сборы в мире";
    pub const CASH_RUSSIA: &str = "сборы в России";
}

/// Builds a record for `id` from an already parsed document
pub fn assemble_record(doc: &Html, id: &str) -> MovieRecord {
    MovieRecord {
        id: id.to_string(),
        title_ru: parse_title_ru(doc),
        title_orig: parse_title_orig(doc),
        duration: parse_duration(doc),
        slogan: parse_slogan(doc),
        year: parse_tabular(doc, labels::YEAR),
        country: parse_tabular(doc, labels::COUNTRY),
        director: parse_tabular(doc, labels::DIRECTOR),
        cast: parse_cast(doc),
        script: parse_tabular(doc, labels::SCRIPT),
        producer: parse_tabular(doc, labels::PRODUCER),
        operator: parse_tabular(doc, labels::OPERATOR),
        composer: parse_tabular(doc, labels::COMPOSER),
        artist: parse_tabular(doc, labels::ARTIST),
        montage: parse_tabular(doc, labels::MONTAGE),
        genre: parse_tabular(doc, labels::GENRE),
        budget: parse_tabular(doc, labels::BUDGET),
        cash_usa: parse_tabular(doc, labels::CASH_USA),
        cash_total: parse_tabular(doc, labels::CASH_TOTAL),
        cash_russia: parse_tabular(doc, labels::CASH_RUSSIA),
        kinopoisk_score: parse_kinopoisk_score(doc),
        imdb_score: parse_imdb_score(doc),
        critics_score: parse_critics_score(doc),
        synopsis: parse_synopsis(doc),
    }
}

/// Parses an HTML body and builds a record for `id`
///
/// The parsed document never outlives this call, so callers can hold the
/// result across an `.await`.
pub fn parse_record(body: &str, id: &str) -> MovieRecord {
    let doc = Html::parse_document(body);
    assemble_record(&doc, id)
}
