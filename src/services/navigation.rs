use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::entities::category;

#[derive(Serialize, Debug, PartialEq)]
pub struct NavSubcategory {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct NavCategory {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub subcategories: Vec<NavSubcategory>,
}

/// Active root categories with their active subcategories, by name.
pub async fn navigation<C: ConnectionTrait>(db: &C) -> Result<Vec<NavCategory>, DbErr> {
    let categories = category::Entity::find()
        .filter(category::Column::IsActive.eq(true))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?;
    Ok(build_tree(categories))
}

pub fn build_tree(categories: Vec<category::Model>) -> Vec<NavCategory> {
    let (roots, children): (Vec<_>, Vec<_>) = categories
        .into_iter()
        .partition(|categ| categ.parent_id.is_none());

    roots
        .into_iter()
        .map(|root| NavCategory {
            subcategories: children
                .iter()
                .filter(|child| child.parent_id == Some(root.id))
                .map(|child| NavSubcategory {
                    id: child.id,
                    name: child.name.clone(),
                    slug: child.slug.clone(),
                })
                .collect(),
            id: root.id,
            name: root.name,
            slug: root.slug,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categ(id: i32, name: &str, parent_id: Option<i32>) -> category::Model {
        category::Model {
            id,
            name: name.to_owned(),
            slug: name.to_lowercase(),
            parent_id,
            level: parent_id.map_or(0, |_| 1),
            is_active: true,
        }
    }

    #[test]
    fn groups_children_under_their_root() {
        let tree = build_tree(vec![
            categ(1, "Kitchen", None),
            categ(2, "Kettles", Some(1)),
            categ(3, "Garden", None),
            categ(4, "Toasters", Some(1)),
        ]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "Kitchen");
        let names: Vec<_> = tree[0].subcategories.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Kettles", "Toasters"]);
        assert!(tree[1].subcategories.is_empty());
    }

    #[test]
    fn orphans_of_inactive_roots_are_dropped() {
        let tree = build_tree(vec![categ(2, "Kettles", Some(1))]);
        assert!(tree.is_empty());
    }
}
