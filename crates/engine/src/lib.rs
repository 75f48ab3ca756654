//! Query and validation core for the expense service.
//!
//! [`Engine`] wraps the database connection and exposes the selectors
//! (list, date-range filter, per-category monthly summary) plus the CRUD
//! ops on expenses and the user registration side-channel. All inputs
//! arrive in raw wire form and are validated here before any expense query
//! runs; failures are accumulated per field so a caller can fix everything
//! in one round trip.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, DbErr, QueryFilter, QueryOrder, Statement, prelude::*,
};
use uuid::Uuid;

pub use amount::Amount;
pub use category::Category;
pub use error::{EngineError, ErrorKind, FieldError, NON_FIELD, ValidationErrors};
pub use expenses::{CategoryTotal, Expense, ExpenseDraft, ExpensePatch, NewExpense};
pub use users::User;

mod amount;
mod category;
mod error;
mod expenses;
mod users;
pub mod validate;

use expenses::PatchValues;
use validate::Validator;

type ResultEngine<T> = Result<T, EngineError>;

fn user_not_found() -> FieldError {
    FieldError::new(ErrorKind::NotFound, "user with this id does not exist")
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    async fn user_exists(&self, id: Uuid) -> ResultEngine<bool> {
        let user = users::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?;
        Ok(user.is_some())
    }

    /// Register a new user.
    ///
    /// Duplicate usernames or emails surface as
    /// [`EngineError::IntegrityViolation`].
    pub async fn create_user(&self, username: &str, email: &str) -> ResultEngine<User> {
        let mut v = Validator::new();
        let username = v.field("username", validate::username(username));
        let email = v.field("email", validate::email(email));

        let errors = v.finish();
        let (Some(username), Some(email)) = (username, email) else {
            return Err(errors.into());
        };

        let user = User::create(username, email);
        users::ActiveModel::from(&user)
            .insert(&self.database)
            .await
            .map_err(EngineError::from_write)?;
        Ok(user)
    }

    /// Return a stored user.
    pub async fn user(&self, id: Uuid) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("user".to_string()))?;
        User::try_from(model)
    }

    /// List every registered user, ordered by username.
    pub async fn list_users(&self) -> ResultEngine<Vec<User>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Username)
            .all(&self.database)
            .await?;
        models.into_iter().map(User::try_from).collect()
    }

    /// Validates a draft end to end: field shapes plus the storage-backed
    /// user-existence check, with failures accumulated across both.
    async fn validated_draft(&self, draft: &ExpenseDraft) -> ResultEngine<NewExpense> {
        let (input, mut errors) = match draft.parse() {
            Ok(input) => (Some(input), ValidationErrors::default()),
            Err(errors) => (None, errors),
        };

        // The user check runs whenever the id itself parsed, even if other
        // fields failed, so the caller sees every problem at once.
        if !errors.contains("user") {
            if let Ok(user_id) = validate::uuid4(&draft.user) {
                if !self.user_exists(user_id).await? {
                    errors.push("user", user_not_found());
                }
            }
        }

        match input {
            Some(input) if errors.is_empty() => Ok(input),
            _ => Err(errors.into()),
        }
    }

    /// Persist a new expense after validation.
    ///
    /// Returns the stored record including its generated id. Nothing is
    /// persisted when any field fails validation.
    pub async fn create_expense(&self, draft: &ExpenseDraft) -> ResultEngine<Expense> {
        let input = self.validated_draft(draft).await?;

        let expense = Expense::create(input);
        expenses::ActiveModel::from(&expense)
            .insert(&self.database)
            .await
            .map_err(EngineError::from_write)?;
        Ok(expense)
    }

    /// Return a stored expense.
    pub async fn expense(&self, id: Uuid) -> ResultEngine<Expense> {
        let model = expenses::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("expense".to_string()))?;
        Expense::try_from(model)
    }

    /// List every expense for a user, in stable (date, id) order.
    pub async fn list_expenses(&self, user_id: &str) -> ResultEngine<Vec<Expense>> {
        self.list_expenses_in_range(user_id, None, None).await
    }

    /// List a user's expenses with `date` inside the inclusive range.
    ///
    /// Either bound may be absent, leaving that side open. When both are
    /// present, `start_date` must not be after `end_date`; the range check
    /// fails before the expense query runs.
    pub async fn list_expenses_in_range(
        &self,
        user_id: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ResultEngine<Vec<Expense>> {
        let mut v = Validator::new();
        let user = v.field("user_id", validate::uuid4(user_id));
        let start = match start_date {
            Some(raw) => v.field("start_date", validate::date(raw)),
            None => None,
        };
        let end = match end_date {
            Some(raw) => v.field("end_date", validate::date(raw)),
            None => None,
        };
        if let (Some(start), Some(end)) = (start, end) {
            v.non_field(validate::date_range(start, end));
        }

        let mut errors = v.finish();
        if let Some(id) = user {
            if !self.user_exists(id).await? {
                errors.push("user_id", user_not_found());
            }
        }
        let Some(id) = user else {
            return Err(errors.into());
        };
        if !errors.is_empty() {
            return Err(errors.into());
        }

        self.select_expenses(id, start, end).await
    }

    async fn select_expenses(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ResultEngine<Vec<Expense>> {
        let mut query =
            expenses::Entity::find().filter(expenses::Column::UserId.eq(user_id.to_string()));
        if let Some(start) = start {
            query = query.filter(expenses::Column::Date.gte(start));
        }
        if let Some(end) = end {
            query = query.filter(expenses::Column::Date.lte(end));
        }

        let models = query
            .order_by_asc(expenses::Column::Date)
            .order_by_asc(expenses::Column::Id)
            .all(&self.database)
            .await?;
        models.into_iter().map(Expense::try_from).collect()
    }

    /// Per-category totals for a user's expenses in the given calendar
    /// month, across all years.
    ///
    /// Only categories with at least one matching expense appear. Totals
    /// are exact: integer-cent sums computed in the database.
    pub async fn category_summary(
        &self,
        user_id: &str,
        month: &str,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        let mut v = Validator::new();
        let user = v.field("user_id", validate::uuid4(user_id));
        let month = v.field("month", validate::month(month));

        let mut errors = v.finish();
        if let Some(id) = user {
            if !self.user_exists(id).await? {
                errors.push("user_id", user_not_found());
            }
        }
        let (Some(id), Some(month)) = (user, month) else {
            return Err(errors.into());
        };
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT category, COALESCE(SUM(amount_cents), 0) AS total_cents \
             FROM expenses \
             WHERE user_id = ? AND CAST(strftime('%m', date) AS INTEGER) = ? \
             GROUP BY category \
             ORDER BY category",
            vec![id.to_string().into(), i64::from(month).into()],
        );

        let rows = self.database.query_all(stmt).await?;
        let mut summary = Vec::with_capacity(rows.len());
        for row in rows {
            let category: String = row.try_get("", "category")?;
            let total_cents: i64 = row.try_get("", "total_cents")?;
            let category = Category::try_from(category.as_str()).map_err(|err| {
                EngineError::Database(DbErr::Custom(format!("summary row: {}", err.message)))
            })?;
            summary.push(CategoryTotal {
                category,
                total: Amount::from_cents(total_cents),
            });
        }
        Ok(summary)
    }

    /// Fully replace a stored expense (PUT semantics).
    pub async fn update_expense(&self, id: Uuid, draft: &ExpenseDraft) -> ResultEngine<Expense> {
        let input = self.validated_draft(draft).await?;
        self.apply_patch(id, PatchValues::from(input)).await
    }

    /// Update the provided fields of a stored expense (PATCH semantics).
    pub async fn patch_expense(&self, id: Uuid, patch: &ExpensePatch) -> ResultEngine<Expense> {
        let (values, mut errors) = match patch.parse() {
            Ok(values) => (Some(values), ValidationErrors::default()),
            Err(errors) => (None, errors),
        };

        if let Some(raw) = &patch.user {
            if !errors.contains("user") {
                if let Ok(user_id) = validate::uuid4(raw) {
                    if !self.user_exists(user_id).await? {
                        errors.push("user", user_not_found());
                    }
                }
            }
        }

        match values {
            Some(values) if errors.is_empty() => self.apply_patch(id, values).await,
            _ => Err(errors.into()),
        }
    }

    async fn apply_patch(&self, id: Uuid, values: PatchValues) -> ResultEngine<Expense> {
        let model = expenses::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("expense".to_string()))?;

        let mut active: expenses::ActiveModel = model.into();
        if let Some(user_id) = values.user_id {
            active.user_id = ActiveValue::Set(user_id.to_string());
        }
        if let Some(title) = values.title {
            active.title = ActiveValue::Set(title);
        }
        if let Some(amount) = values.amount {
            active.amount_cents = ActiveValue::Set(amount.cents());
        }
        if let Some(date) = values.date {
            active.date = ActiveValue::Set(date);
        }
        if let Some(category) = values.category {
            active.category = ActiveValue::Set(category.as_str().to_string());
        }

        let updated = active
            .update(&self.database)
            .await
            .map_err(EngineError::from_write)?;
        Expense::try_from(updated)
    }

    /// Delete a stored expense.
    pub async fn delete_expense(&self, id: Uuid) -> ResultEngine<()> {
        let result = expenses::Entity::delete_by_id(id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound("expense".to_string()));
        }
        Ok(())
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}
