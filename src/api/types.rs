//! Request and response types for the `mediaItems:search` endpoint.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::media::MediaItem;

/// Feature name selecting favourited items.
pub const FAVORITES_FEATURE: &str = "FAVORITES";

/// Search request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub page_size: u32,
    /// Omitted on the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    pub filters: SearchFilters,
}

impl SearchRequest {
    /// Request for one page of items created between `start` and `end`
    /// inclusive. An empty cursor means the first page.
    pub fn date_range(
        start: NaiveDate,
        end: NaiveDate,
        page_size: u32,
        cursor: &str,
        favorites_only: bool,
    ) -> Self {
        let feature_filter = favorites_only.then(|| FeatureFilter {
            included_features: vec![FAVORITES_FEATURE.to_string()],
        });

        Self {
            page_size,
            page_token: (!cursor.is_empty()).then(|| cursor.to_string()),
            filters: SearchFilters {
                date_filter: Some(DateFilter {
                    ranges: vec![DateRange {
                        start_date: start.into(),
                        end_date: end.into(),
                    }],
                }),
                feature_filter,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_filter: Option<DateFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_filter: Option<FeatureFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateFilter {
    pub ranges: Vec<DateRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: Date,
    pub end_date: Date,
}

/// Calendar date in the provider's split representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Date {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFilter {
    pub included_features: Vec<String>,
}

/// One page of search results. An empty page comes back as `{}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn year(y: i32) -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(y, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(y, 12, 31).unwrap(),
        )
    }

    #[test]
    fn test_first_page_body() {
        let (start, end) = year(2021);
        let request = SearchRequest::date_range(start, end, 25, "", false);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "pageSize": 25,
                "filters": {
                    "dateFilter": {
                        "ranges": [{
                            "startDate": {"year": 2021, "month": 1, "day": 1},
                            "endDate": {"year": 2021, "month": 12, "day": 31}
                        }]
                    }
                }
            })
        );
    }

    #[test]
    fn test_cursor_and_favorites() {
        let (start, end) = year(2020);
        let request = SearchRequest::date_range(start, end, 25, "CkgKQnR5", true);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["pageToken"], "CkgKQnR5");
        assert_eq!(
            body["filters"]["featureFilter"],
            json!({"includedFeatures": ["FAVORITES"]})
        );
    }

    #[test]
    fn test_empty_page_response() {
        let page: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(page.media_items.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
