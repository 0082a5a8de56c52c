/// Catalog record normalization
///
/// Maps one raw catalog record (movie or series) onto the unified [`ContentItem`]
/// shape. Pure and total: missing optional fields degrade to `None` or a
/// placeholder, never to an error.
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::{ContentItem, MediaType, NextEpisode, RawRecord};

pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const POSTER_PLACEHOLDER_URL: &str = "https://via.placeholder.com/500x750?text=No+Image";

/// Original-language codes whose series land in the asian partition
pub const ASIAN_LANGUAGE_CODES: [&str; 5] = ["ko", "zh", "cn", "ja", "th"];

/// Source statuses after which no further episodes are scheduled
pub const TERMINAL_STATUSES: [&str; 2] = ["Ended", "Canceled"];

pub const MOVIE_LABEL: &str = "Theatrical Release";
pub const AIRED_LABEL: &str = "Season Finale (Aired)";
pub const COMPLETED_LABEL: &str = "Completed";

/// Hour (UTC) assumed for date-only air dates
pub const DEFAULT_AIR_HOUR: u32 = 20;

/// Converts one raw catalog record into a [`ContentItem`]
pub fn normalize(raw: &RawRecord) -> ContentItem {
    let movie_title = RawRecord::field(&raw.title).or(RawRecord::field(&raw.original_title));
    let is_movie = movie_title.is_some();

    let title = movie_title
        .or(RawRecord::field(&raw.name))
        .or(RawRecord::field(&raw.original_name))
        .unwrap_or_default()
        .to_string();

    let media_type = if is_movie {
        MediaType::Movie
    } else {
        series_partition(raw.original_language.as_deref())
    };

    let poster_url = poster_url(raw.poster_path.as_deref());
    let description = raw.overview.clone().unwrap_or_default();

    if is_movie {
        return ContentItem {
            id: raw.id,
            title,
            media_type,
            poster_url,
            description,
            release_instant: raw.release_date.as_deref().and_then(parse_release_date),
            episode_label: MOVIE_LABEL.to_string(),
            episode_title: None,
            is_completed: false,
        };
    }

    let (release_instant, episode_label, episode_title) = match &raw.next_episode_to_air {
        Some(next) => (
            next.air_date.as_deref().and_then(parse_air_date),
            episode_label(next),
            next.name.clone(),
        ),
        None => {
            let label = if raw.status.as_deref() == Some("Ended") {
                COMPLETED_LABEL
            } else {
                AIRED_LABEL
            };
            (
                raw.last_air_date.as_deref().and_then(parse_air_date),
                label.to_string(),
                None,
            )
        }
    };

    let is_completed = raw.next_episode_to_air.is_none()
        && raw
            .status
            .as_deref()
            .map(|status| TERMINAL_STATUSES.contains(&status))
            .unwrap_or(false);

    ContentItem {
        id: raw.id,
        title,
        media_type,
        poster_url,
        description,
        release_instant,
        episode_label,
        episode_title,
        is_completed,
    }
}

/// Language-code membership is the only signal for the series partition
pub fn series_partition(original_language: Option<&str>) -> MediaType {
    match original_language {
        Some(code) if ASIAN_LANGUAGE_CODES.contains(&code) => MediaType::AsianSeries,
        _ => MediaType::WesternSeries,
    }
}

pub fn poster_url(poster_path: Option<&str>) -> String {
    match poster_path.filter(|p| !p.is_empty()) {
        Some(path) => format!("{}{}", POSTER_BASE_URL, path),
        None => POSTER_PLACEHOLDER_URL.to_string(),
    }
}

/// Movie release dates: a calendar date at midnight UTC
pub fn parse_release_date(value: &str) -> Option<DateTime<Utc>> {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))),
        Err(_) => parse_timestamp(value),
    }
}

/// Series air dates: a bare calendar date is pinned to 20:00 UTC so a same-day
/// episode does not read as already aired at midnight
pub fn parse_air_date(value: &str) -> Option<DateTime<Utc>> {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(at_default_air_time(date)),
        Err(_) => parse_timestamp(value),
    }
}

pub fn at_default_air_time(date: NaiveDate) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(DEFAULT_AIR_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(time))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

fn episode_label(next: &NextEpisode) -> String {
    let number = |n: Option<u32>| n.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
    format!(
        "S{} E{}",
        number(next.season_number),
        number(next.episode_number)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64, release_date: Option<&str>) -> RawRecord {
        RawRecord {
            id,
            title: Some("Dune: Part Two".to_string()),
            original_language: Some("en".to_string()),
            poster_path: Some("/dune.jpg".to_string()),
            overview: Some("Paul Atreides unites with the Fremen.".to_string()),
            release_date: release_date.map(str::to_string),
            ..Default::default()
        }
    }

    fn series(id: i64, language: &str) -> RawRecord {
        RawRecord {
            id,
            name: Some("Series".to_string()),
            original_language: Some(language.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_movie_release_date_is_midnight_utc() {
        let item = normalize(&movie(1, Some("2025-03-01")));

        assert_eq!(item.media_type, MediaType::Movie);
        assert_eq!(
            item.release_instant,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(item.episode_label, MOVIE_LABEL);
        assert!(!item.is_completed);
    }

    #[test]
    fn test_movie_without_release_date() {
        let item = normalize(&movie(1, None));
        assert_eq!(item.release_instant, None);
    }

    #[test]
    fn test_movie_with_unparseable_date_degrades_to_none() {
        let item = normalize(&movie(1, Some("soon")));
        assert_eq!(item.release_instant, None);
    }

    #[test]
    fn test_original_title_alone_marks_a_movie() {
        let raw = RawRecord {
            id: 9,
            original_title: Some("Parasite".to_string()),
            original_language: Some("ko".to_string()),
            ..Default::default()
        };
        let item = normalize(&raw);
        assert_eq!(item.media_type, MediaType::Movie);
        assert_eq!(item.title, "Parasite");
    }

    #[test]
    fn test_asian_language_codes_map_to_asian_series() {
        for code in ["ko", "zh", "cn", "ja", "th"] {
            assert_eq!(
                normalize(&series(1, code)).media_type,
                MediaType::AsianSeries,
                "language {}",
                code
            );
        }
    }

    #[test]
    fn test_other_language_codes_map_to_western_series() {
        for code in ["en", "es", "hi", "fr", ""] {
            assert_eq!(
                normalize(&series(1, code)).media_type,
                MediaType::WesternSeries,
                "language {}",
                code
            );
        }
        let unknown = RawRecord {
            id: 1,
            name: Some("No Language".to_string()),
            ..Default::default()
        };
        assert_eq!(normalize(&unknown).media_type, MediaType::WesternSeries);
    }

    #[test]
    fn test_next_episode_date_only_is_pinned_to_8pm() {
        let mut raw = series(1399, "en");
        raw.next_episode_to_air = Some(NextEpisode {
            air_date: Some("2025-03-01".to_string()),
            season_number: Some(2),
            episode_number: Some(5),
            name: Some("The Burning Mill".to_string()),
        });

        let item = normalize(&raw);
        assert_eq!(
            item.release_instant,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap())
        );
        assert_eq!(item.episode_label, "S2 E5");
        assert_eq!(item.episode_title.as_deref(), Some("The Burning Mill"));
        assert!(!item.is_completed);
    }

    #[test]
    fn test_next_episode_with_full_timestamp_is_kept() {
        let mut raw = series(1, "en");
        raw.next_episode_to_air = Some(NextEpisode {
            air_date: Some("2025-03-01T02:30:00Z".to_string()),
            season_number: Some(1),
            episode_number: Some(1),
            name: None,
        });

        let item = normalize(&raw);
        assert_eq!(
            item.release_instant,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 2, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_next_episode_missing_numbers() {
        let mut raw = series(1, "en");
        raw.next_episode_to_air = Some(NextEpisode::default());

        let item = normalize(&raw);
        assert_eq!(item.episode_label, "S? E?");
        assert_eq!(item.release_instant, None);
    }

    #[test]
    fn test_ended_series_is_completed() {
        let mut raw = series(1, "en");
        raw.status = Some("Ended".to_string());
        raw.last_air_date = Some("2019-05-19".to_string());

        let item = normalize(&raw);
        assert!(item.is_completed);
        assert_eq!(item.episode_label, COMPLETED_LABEL);
        assert_eq!(
            item.release_instant,
            Some(Utc.with_ymd_and_hms(2019, 5, 19, 20, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_canceled_series_is_completed_with_aired_label() {
        let mut raw = series(1, "en");
        raw.status = Some("Canceled".to_string());

        let item = normalize(&raw);
        assert!(item.is_completed);
        assert_eq!(item.episode_label, AIRED_LABEL);
    }

    #[test]
    fn test_terminal_status_with_next_episode_is_not_completed() {
        let mut raw = series(1, "en");
        raw.status = Some("Ended".to_string());
        raw.next_episode_to_air = Some(NextEpisode {
            air_date: Some("2030-01-01".to_string()),
            ..Default::default()
        });

        assert!(!normalize(&raw).is_completed);
    }

    #[test]
    fn test_returning_series_on_break() {
        let mut raw = series(1, "ja");
        raw.status = Some("Returning Series".to_string());

        let item = normalize(&raw);
        assert!(!item.is_completed);
        assert_eq!(item.episode_label, AIRED_LABEL);
        assert_eq!(item.release_instant, None);
    }

    #[test]
    fn test_poster_url_and_placeholder() {
        let item = normalize(&movie(1, None));
        assert_eq!(item.poster_url, "https://image.tmdb.org/t/p/w500/dune.jpg");

        let bare = normalize(&series(2, "en"));
        assert_eq!(bare.poster_url, POSTER_PLACEHOLDER_URL);
    }

    #[test]
    fn test_missing_overview_is_empty_description() {
        let item = normalize(&series(2, "en"));
        assert_eq!(item.description, "");
    }
}
