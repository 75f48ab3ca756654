//! Expense records: the domain type, raw input drafts, and the sea-orm
//! entity.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, DbErr, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Amount, Category, EngineError,
    error::ValidationErrors,
    validate::{self, Validator},
};

/// A stored expense record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub amount: Amount,
    pub date: NaiveDate,
    pub category: Category,
}

impl Expense {
    pub(crate) fn create(input: NewExpense) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            title: input.title,
            amount: input.amount,
            date: input.date,
            category: input.category,
        }
    }
}

/// A fully validated expense payload, ready to persist.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub user_id: Uuid,
    pub title: String,
    pub amount: Amount,
    pub date: NaiveDate,
    pub category: Category,
}

/// Raw, untyped input for creating or fully replacing an expense.
///
/// Fields arrive in their wire form; [`parse`] validates every field and
/// collects all failures.
///
/// [`parse`]: ExpenseDraft::parse
#[derive(Clone, Debug, Default)]
pub struct ExpenseDraft {
    pub user: String,
    pub title: String,
    pub amount: String,
    pub date: String,
    pub category: String,
}

impl ExpenseDraft {
    /// Validates all fields, returning either the typed payload or every
    /// field failure at once.
    ///
    /// The user id is checked for shape only; existence is storage-backed
    /// and handled by the engine ops.
    pub fn parse(&self) -> Result<NewExpense, ValidationErrors> {
        let mut v = Validator::new();
        let user_id = v.field("user", validate::uuid4(&self.user));
        let title = v.field("title", validate::title(&self.title));
        let amount = v.field("amount", validate::amount(&self.amount));
        let date = v.field("date", validate::date(&self.date));
        let category = v.field("category", validate::category(&self.category));

        let errors = v.finish();
        match (user_id, title, amount, date, category) {
            (Some(user_id), Some(title), Some(amount), Some(date), Some(category))
                if errors.is_empty() =>
            {
                Ok(NewExpense {
                    user_id,
                    title,
                    amount,
                    date,
                    category,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Raw, untyped input for partially updating an expense.
///
/// Absent fields are left unchanged; present fields are validated the same
/// way as on create.
#[derive(Clone, Debug, Default)]
pub struct ExpensePatch {
    pub user: Option<String>,
    pub title: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
}

/// Typed, validated values extracted from an [`ExpensePatch`].
#[derive(Clone, Debug, Default)]
pub(crate) struct PatchValues {
    pub(crate) user_id: Option<Uuid>,
    pub(crate) title: Option<String>,
    pub(crate) amount: Option<Amount>,
    pub(crate) date: Option<NaiveDate>,
    pub(crate) category: Option<Category>,
}

impl ExpensePatch {
    pub(crate) fn parse(&self) -> Result<PatchValues, ValidationErrors> {
        let mut v = Validator::new();
        let mut values = PatchValues::default();

        if let Some(raw) = &self.user {
            values.user_id = v.field("user", validate::uuid4(raw));
        }
        if let Some(raw) = &self.title {
            values.title = v.field("title", validate::title(raw));
        }
        if let Some(raw) = &self.amount {
            values.amount = v.field("amount", validate::amount(raw));
        }
        if let Some(raw) = &self.date {
            values.date = v.field("date", validate::date(raw));
        }
        if let Some(raw) = &self.category {
            values.category = v.field("category", validate::category(raw));
        }

        let errors = v.finish();
        if errors.is_empty() {
            Ok(values)
        } else {
            Err(errors)
        }
    }
}

impl From<NewExpense> for PatchValues {
    fn from(input: NewExpense) -> Self {
        Self {
            user_id: Some(input.user_id),
            title: Some(input.title),
            amount: Some(input.amount),
            date: Some(input.date),
            category: Some(input.category),
        }
    }
}

/// One row of the per-category monthly summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Amount,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub amount_cents: i64,
    pub date: Date,
    pub category: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            user_id: ActiveValue::Set(expense.user_id.to_string()),
            title: ActiveValue::Set(expense.title.clone()),
            amount_cents: ActiveValue::Set(expense.amount.cents()),
            date: ActiveValue::Set(expense.date),
            category: ActiveValue::Set(expense.category.as_str().to_string()),
        }
    }
}

fn corrupt(id: &str, what: &str) -> EngineError {
    EngineError::Database(DbErr::Custom(format!("expense {id}: invalid stored {what}")))
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| corrupt(&model.id, "id"))?,
            user_id: Uuid::parse_str(&model.user_id).map_err(|_| corrupt(&model.id, "user id"))?,
            title: model.title,
            amount: Amount::from_cents(model.amount_cents),
            date: model.date,
            category: Category::try_from(model.category.as_str())
                .map_err(|_| corrupt(&model.id, "category"))?,
        })
    }
}
