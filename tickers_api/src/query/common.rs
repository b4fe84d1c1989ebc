//! Shared query infrastructure: the [`Query`] trait, [`QueryCommon`] fields, and [`SortDirection`].

use std::fmt;

use url::Url;

/// Largest page size the reference endpoint accepts.
pub const MAX_LIMIT: u32 = 1000;

/// Trait implemented by all query builders. Provides URL serialization and
/// shared builder methods for page size and sort direction.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;

    /// Returns a mutable reference to the common query fields.
    fn get_common(&mut self) -> &mut QueryCommon;

    /// Sets the number of results per page, clamped to `1..=1000`.
    fn with_limit(mut self, limit: u32) -> Self
    where
        Self: Sized,
    {
        self.get_common().limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    /// Sets the sort direction (ascending or descending).
    fn with_sort_direction(mut self, sort_direction: SortDirection) -> Self
    where
        Self: Sized,
    {
        self.get_common().order = sort_direction;
        self
    }
}

/// Sort order for API results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order. This is the default.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}", s)
    }
}

/// Fields shared by all query types: page size and sort direction.
#[derive(Clone, Copy, Debug)]
pub struct QueryCommon {
    /// Results per page. Defaults to the endpoint maximum of 1000.
    pub limit: u32,
    /// Sort direction. Defaults to ascending.
    pub order: SortDirection,
}

impl Default for QueryCommon {
    fn default() -> QueryCommon {
        QueryCommon {
            limit: MAX_LIMIT,
            order: SortDirection::Asc,
        }
    }
}

impl QueryCommon {
    /// Appends the common ordering and page size parameters to the URL.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("order", &self.order.to_string())
            .append_pair("limit", &self.limit.to_string());
        url
    }
}
