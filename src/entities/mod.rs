pub mod cart;
pub mod category;
pub mod category_feature;
pub mod feature;
pub mod feedback;
pub mod image;
pub mod manufacturer;
pub mod product;
pub mod product_feature;
pub mod user;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Schema,
    Set,
};
use tracing::info;

use crate::error::ApiError;

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement))
        .await
        .map(|_| ())
}

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, category::Entity).await?;
    create_table(db, &schema, feature::Entity).await?;
    create_table(db, &schema, category_feature::Entity).await?;
    create_table(db, &schema, manufacturer::Entity).await?;
    create_table(db, &schema, product::Entity).await?;
    create_table(db, &schema, product_feature::Entity).await?;
    create_table(db, &schema, image::Entity).await?;
    create_table(db, &schema, feedback::Entity).await?;
    create_table(db, &schema, cart::Entity).await?;
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ApiError::PasswordHash(err.to_string()))
}

/// Creates the configured admin account unless a user with that name exists.
pub async fn seed_admin(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<(), ApiError> {
    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let admin = user::ActiveModel {
        username: Set(username.to_owned()),
        password: Set(hash_password(password)?),
        role: Set(user::Role::Admin),
        ..Default::default()
    };
    user::Entity::insert(admin).exec(db).await?;
    info!(username, "Seeded admin account");
    Ok(())
}
