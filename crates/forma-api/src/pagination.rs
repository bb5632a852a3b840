use serde::Deserialize;

use forma_db::Database;
use forma_types::models::{Page, Pagination};

use crate::error::ApiError;
use crate::state::{AppState, blocking};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// `?page=&limit=` as sent by the client. Values are coerced rather than
/// rejected: anything that is not a positive integer falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        coerce(self.page.as_deref()).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u32 {
        coerce(self.limit.as_deref()).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }
}

fn coerce(raw: Option<&str>) -> Option<u32> {
    raw?.trim().parse::<u32>().ok().filter(|n| *n >= 1)
}

/// Fetch one page and the total row count. The two reads run concurrently
/// and are not snapshot-consistent with each other.
pub(crate) async fn fetch_page<R, T, S, C>(
    state: &AppState,
    query: &PageQuery,
    slice: S,
    count: C,
) -> Result<Page<T>, ApiError>
where
    R: Into<T> + Send + 'static,
    S: FnOnce(&Database, u32, u64) -> anyhow::Result<Vec<R>> + Send + 'static,
    C: FnOnce(&Database) -> anyhow::Result<u64> + Send + 'static,
{
    let page = query.page();
    let limit = query.limit();
    let offset = Pagination::new(0, page, limit).offset();

    let slice_state = state.clone();
    let count_state = state.clone();
    let (rows, total) = tokio::try_join!(
        blocking(move || Ok(slice(&slice_state.db, limit, offset)?)),
        blocking(move || Ok(count(&count_state.db)?)),
    )?;

    Ok(Page {
        data: rows.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(total, page, limit),
    })
}
