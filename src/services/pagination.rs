use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, Select};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PageMeta {
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMeta {
    /// Page metadata for a 1-based `number`. An empty result still has one
    /// (empty) first page.
    pub fn new(number: u64, per_page: u64, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(per_page).max(1);
        PageMeta {
            number,
            per_page,
            total_items,
            total_pages,
            has_next: number < total_pages,
            has_previous: number > 1,
        }
    }
}

/// Parses the `page` parameter; `last` selects the final page.
pub fn parse_page(raw: Option<&str>, total_pages: u64) -> Result<u64, ApiError> {
    let number = match raw {
        None => 1,
        Some("last") => total_pages,
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ApiError::NotFound("Invalid page".into()))?,
    };
    if number == 0 || number > total_pages {
        return Err(ApiError::NotFound("Invalid page".into()));
    }
    Ok(number)
}

pub async fn paginate<'db, C, E>(
    query: Select<E>,
    db: &'db C,
    page: Option<&str>,
    per_page: u64,
) -> Result<(Vec<E::Model>, PageMeta), ApiError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync + 'db,
{
    let per_page = per_page.max(1);
    let paginator = query.paginate(db, per_page);
    let total_items = paginator.num_items().await?;
    let meta = PageMeta::new(1, per_page, total_items);
    let number = parse_page(page, meta.total_pages)?;
    let items = paginator.fetch_page(number - 1).await?;
    Ok((items, PageMeta::new(number, per_page, total_items)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_has_one_page() {
        let meta = PageMeta::new(1, 8, 0);
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_next);
        assert!(!meta.has_previous);
    }

    #[test]
    fn partial_last_page_counts() {
        let meta = PageMeta::new(2, 8, 17);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_previous);
    }

    #[test]
    fn out_of_range_pages_are_not_found() {
        assert_eq!(parse_page(None, 3).unwrap(), 1);
        assert_eq!(parse_page(Some("last"), 3).unwrap(), 3);
        assert!(matches!(parse_page(Some("4"), 3), Err(ApiError::NotFound(_))));
        assert!(matches!(parse_page(Some("0"), 3), Err(ApiError::NotFound(_))));
        assert!(matches!(parse_page(Some("two"), 3), Err(ApiError::NotFound(_))));
    }
}
