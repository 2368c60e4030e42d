//! Staff directory repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::users;

/// Staff fields shown next to a movement or closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffSummary {
    /// User ID.
    pub id: Uuid,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
}

impl From<users::Model> for StaffSummary {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

/// Input for registering a staff member.
#[derive(Debug, Clone)]
pub struct CreateStaffInput {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Unique email.
    pub email: String,
}

/// User repository for the staff directory.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds the staff projection of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_staff(&self, id: Uuid) -> Result<Option<StaffSummary>, DbErr> {
        Ok(users::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(StaffSummary::from))
    }

    /// Registers a staff member.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails (e.g. duplicate email).
    pub async fn create_staff(&self, input: CreateStaffInput) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }
}
