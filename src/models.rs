use chrono::{DateTime, Utc};

/// A row from the `links` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub hash: String,
    pub description: String,
    pub url: String,
    pub hits: i64,
    pub time: DateTime<Utc>,
}

/// One entry of a listing page. `hits` is only meaningful for the
/// hit-ordered listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Record {
    pub time: DateTime<Utc>,
    pub hash: String,
    pub description: String,
    pub hits: i64,
}

/// Sort key for [`crate::db::list_recent`]. Both orders are descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    Time,
    Hits,
}

impl ListOrder {
    pub(crate) fn order_by(self) -> &'static str {
        match self {
            ListOrder::Time => "time DESC, id DESC",
            ListOrder::Hits => "hits DESC, id DESC",
        }
    }
}

/// A link as it appears in the RSS feed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedEntry {
    pub hash: String,
    pub description: String,
}
