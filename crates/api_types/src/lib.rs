use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod expense {
    use super::*;

    /// Request body for creating or fully replacing an expense.
    ///
    /// Every field arrives in its raw wire form; the server validates shape
    /// and range and reports failures per field.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        /// Owner id (canonical UUIDv4 string).
        pub user: String,
        pub title: String,
        /// Fixed-point decimal string, e.g. `"50.00"`.
        pub amount: String,
        /// ISO `YYYY-MM-DD`.
        pub date: String,
        pub category: String,
    }

    /// Request body for partially updating an expense.
    ///
    /// Absent fields are left unchanged.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        #[serde(default)]
        pub user: Option<String>,
        #[serde(default)]
        pub title: Option<String>,
        #[serde(default)]
        pub amount: Option<String>,
        #[serde(default)]
        pub date: Option<String>,
        #[serde(default)]
        pub category: Option<String>,
    }

    /// Query parameters for `GET /expenses`.
    ///
    /// `summary=1` selects the per-category monthly summary (requires
    /// `user_id` and `month`); otherwise the date-filtered list is returned
    /// (requires `user_id`, date bounds optional).
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseListParams {
        #[serde(default)]
        pub summary: Option<String>,
        #[serde(default)]
        pub user_id: Option<String>,
        #[serde(default)]
        pub month: Option<String>,
        #[serde(default)]
        pub start_date: Option<String>,
        #[serde(default)]
        pub end_date: Option<String>,
    }

    /// A stored expense as transmitted on the wire.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub user: Uuid,
        pub title: String,
        /// Fixed-point decimal string with exactly 2 fraction digits.
        pub amount: String,
        /// Serialized as ISO `YYYY-MM-DD`.
        pub date: NaiveDate,
        pub category: String,
    }

    /// One per-category total of the monthly summary.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SummaryRow {
        pub category: String,
        /// Fixed-point decimal string with exactly 2 fraction digits,
        /// always non-negative.
        pub total_amount: String,
    }
}
