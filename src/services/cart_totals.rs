use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::entities::{cart, product};

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct CartSummary {
    pub total_quantity: u64,
    pub total_price: f64,
}

impl CartSummary {
    pub fn from_entries(entries: &[(cart::Model, Option<product::Model>)]) -> Self {
        entries
            .iter()
            .filter_map(|(entry, prod)| prod.as_ref().map(|prod| (entry.quantity, prod.price)))
            .fold(CartSummary::default(), |mut summary, (quantity, price)| {
                summary.total_quantity = summary.total_quantity.saturating_add(u64::from(quantity));
                summary.total_price += price * f64::from(quantity);
                summary
            })
    }
}

pub async fn cart_entries<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<(cart::Model, Option<product::Model>)>, DbErr> {
    cart::Entity::find()
        .filter(cart::Column::UserId.eq(user_id))
        .find_also_related(product::Entity)
        .all(db)
        .await
}

/// Totals for the caller's cart; anonymous callers get an empty cart.
pub async fn cart_summary<C: ConnectionTrait>(
    db: &C,
    user_id: Option<i32>,
) -> Result<CartSummary, DbErr> {
    match user_id {
        Some(user_id) => Ok(CartSummary::from_entries(&cart_entries(db, user_id).await?)),
        None => Ok(CartSummary::default()),
    }
}

pub async fn quantity_in_cart<C: ConnectionTrait>(
    db: &C,
    user_id: Option<i32>,
    product_id: i32,
) -> Result<u32, DbErr> {
    let Some(user_id) = user_id else {
        return Ok(0);
    };
    let entry = cart::Entity::find()
        .filter(cart::Column::UserId.eq(user_id))
        .filter(cart::Column::ProductId.eq(product_id))
        .one(db)
        .await?;
    Ok(entry.map_or(0, |entry| entry.quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(id: i32, quantity: u32) -> cart::Model {
        cart::Model {
            id,
            user_id: 1,
            product_id: id,
            quantity,
        }
    }

    fn prod(id: i32, price: f64) -> product::Model {
        product::Model {
            id,
            product_id: Uuid::new_v4(),
            name: format!("Product {id}"),
            description: String::new(),
            price,
            added: Utc::now(),
            count: 1,
            is_limited: false,
            category_id: 1,
            manufacturer_id: 1,
        }
    }

    #[test]
    fn sums_quantity_times_price() {
        let summary = CartSummary::from_entries(&[
            (entry(1, 2), Some(prod(1, 10.5))),
            (entry(2, 1), Some(prod(2, 4.0))),
        ]);
        assert_eq!(summary.total_quantity, 3);
        assert!((summary.total_price - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn huge_quantities_do_not_overflow() {
        let summary = CartSummary::from_entries(&[
            (entry(1, u32::MAX), Some(prod(1, 1.0))),
            (entry(2, u32::MAX), Some(prod(2, 1.0))),
        ]);
        assert_eq!(summary.total_quantity, 2 * u64::from(u32::MAX));
    }

    #[test]
    fn entries_without_product_are_skipped() {
        let summary = CartSummary::from_entries(&[(entry(1, 5), None)]);
        assert_eq!(summary, CartSummary::default());
    }
}
