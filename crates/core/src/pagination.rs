use crate::control::ScanControl;
use crate::traits::ConfluenceApi;
use crate::{Hit, ScanError, SearchResultPage};
use tracing::{debug, error};

/// Expands the first page of a search into every hit of the result set.
///
/// Offsets advance by the `limit` of the most recent successful response.
/// `total_size` is read once from `initial`. A failed follow-up is logged and
/// the walk moves on to the next offset, so the result may have gaps.
pub async fn expand_hits(
    keyword: &str,
    cql: &str,
    initial: &SearchResultPage,
    api: &dyn ConfluenceApi,
    control: &ScanControl,
) -> Result<Vec<Hit>, ScanError> {
    let mut hits = initial.results.clone();
    if initial.is_complete() {
        return Ok(hits);
    }

    if initial.limit == 0 {
        return Err(ScanError::InvalidPage(format!(
            "server reported limit 0 with {} results",
            initial.size
        )));
    }

    let total_size = initial.total_size;
    let mut limit = initial.limit;
    let mut offset = initial.start;
    debug!(keyword, total_size, "fetching all result pages");

    loop {
        offset = match offset.checked_add(limit) {
            Some(next) if next < total_size => next,
            _ => break,
        };
        control.checkpoint().await?;

        match api.search(cql, offset).await {
            Ok(next) => {
                if next.limit > 0 {
                    limit = next.limit;
                }
                hits.extend(next.results);
            }
            Err(ScanError::Cancelled) => return Err(ScanError::Cancelled),
            Err(err) => {
                error!(
                    keyword,
                    offset, "failed to fetch page offset at {offset} due to {err}"
                );
            }
        }
    }

    Ok(hits)
}
