use sea_orm::{EntityTrait, QueryOrder, Select};
use serde::Serialize;

use crate::entities::product;

/// Orderings the catalog accepts in the `sort` parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortOption {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 6] = [
        SortOption::Newest,
        SortOption::Oldest,
        SortOption::PriceAsc,
        SortOption::PriceDesc,
        SortOption::NameAsc,
        SortOption::NameDesc,
    ];

    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|opt| opt.as_param() == value)
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortOption::Newest => "-added",
            SortOption::Oldest => "added",
            SortOption::PriceAsc => "price",
            SortOption::PriceDesc => "-price",
            SortOption::NameAsc => "name",
            SortOption::NameDesc => "-name",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOption::Newest => "Newest first",
            SortOption::Oldest => "Oldest first",
            SortOption::PriceAsc => "Cheapest first",
            SortOption::PriceDesc => "Most expensive first",
            SortOption::NameAsc => "Name A-Z",
            SortOption::NameDesc => "Name Z-A",
        }
    }

    pub fn apply(self, query: Select<product::Entity>) -> Select<product::Entity> {
        // id breaks ties so pages stay stable
        let query = match self {
            SortOption::Newest => query.order_by_desc(product::Column::Added),
            SortOption::Oldest => query.order_by_asc(product::Column::Added),
            SortOption::PriceAsc => query.order_by_asc(product::Column::Price),
            SortOption::PriceDesc => query.order_by_desc(product::Column::Price),
            SortOption::NameAsc => query.order_by_asc(product::Column::Name),
            SortOption::NameDesc => query.order_by_desc(product::Column::Name),
        };
        query.order_by_asc(product::Column::Id)
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct SortItem {
    pub value: &'static str,
    pub label: &'static str,
    pub active: bool,
}

pub fn sort_items(active: SortOption) -> Vec<SortItem> {
    SortOption::ALL
        .into_iter()
        .map(|opt| SortItem {
            value: opt.as_param(),
            label: opt.label(),
            active: opt == active,
        })
        .collect()
}

/// Admin lists always show the newest entries first.
pub fn newest_first<E: EntityTrait>(query: Select<E>, added: E::Column) -> Select<E> {
    query.order_by_desc(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sort_is_rejected() {
        assert_eq!(SortOption::from_param("-price"), Some(SortOption::PriceDesc));
        assert_eq!(SortOption::from_param("price; drop table"), None);
        assert_eq!(SortOption::from_param(""), None);
    }

    #[test]
    fn exactly_one_item_is_active() {
        let items = sort_items(SortOption::PriceAsc);
        assert_eq!(items.len(), SortOption::ALL.len());
        let active: Vec<_> = items.iter().filter(|item| item.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].value, "price");
    }

    #[test]
    fn default_is_newest() {
        assert_eq!(SortOption::default().as_param(), "-added");
    }
}
