//! Listing catalogue for the posts pass

use std::fmt;

/// Time window for ranked listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Hour,
    Day,
    Week,
}

impl TimeWindow {
    /// Query-parameter value the API expects
    pub fn as_param(self) -> &'static str {
        match self {
            TimeWindow::Hour => "hour",
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

/// One named remote query returning an ordered sequence of posts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSpec {
    New,
    Hot,
    Rising,
    Top(TimeWindow),
    Controversial(TimeWindow),
    /// Subreddit-restricted keyword search, newest first
    Search(String),
}

impl ListingSpec {
    /// Request path for this listing on the given subreddit.
    pub fn request_path(&self, subreddit: &str) -> String {
        match self {
            ListingSpec::New => format!("/r/{subreddit}/new.json"),
            ListingSpec::Hot => format!("/r/{subreddit}/hot.json"),
            ListingSpec::Rising => format!("/r/{subreddit}/rising.json"),
            ListingSpec::Top(_) => format!("/r/{subreddit}/top.json"),
            ListingSpec::Controversial(_) => format!("/r/{subreddit}/controversial.json"),
            ListingSpec::Search(_) => format!("/r/{subreddit}/search.json"),
        }
    }

    /// Query parameters specific to this listing.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            ListingSpec::Top(window) | ListingSpec::Controversial(window) => {
                vec![("t", window.as_param().to_string())]
            }
            ListingSpec::Search(term) => {
                vec![
                    ("q", term.clone()),
                    ("restrict_sr", "1".to_string()),
                    ("sort", "new".to_string()),
                ]
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for ListingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingSpec::New => write!(f, "new"),
            ListingSpec::Hot => write!(f, "hot"),
            ListingSpec::Rising => write!(f, "rising"),
            ListingSpec::Top(window) => write!(f, "top:{}", window.as_param()),
            ListingSpec::Controversial(window) => write!(f, "controversial:{}", window.as_param()),
            ListingSpec::Search(term) => write!(f, "search:{term}"),
        }
    }
}

/// The fixed set of listings one posts pass crawls, in order.
///
/// The order is deterministic so that overlapping listings always resolve
/// the same way: the last listing to mention a post writes its final
/// document. One search listing is appended per configured term.
pub fn default_listings(search_terms: &[String]) -> Vec<ListingSpec> {
    let mut listings = vec![
        ListingSpec::New,
        ListingSpec::Top(TimeWindow::Day),
        ListingSpec::Top(TimeWindow::Hour),
        ListingSpec::Top(TimeWindow::Week),
        ListingSpec::Hot,
        ListingSpec::Controversial(TimeWindow::Day),
        ListingSpec::Controversial(TimeWindow::Hour),
        ListingSpec::Controversial(TimeWindow::Week),
        ListingSpec::Rising,
    ];

    listings.extend(search_terms.iter().cloned().map(ListingSpec::Search));
    listings
}
