use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Amount, Category, Engine, EngineError, ErrorKind, ExpenseDraft, ExpensePatch, NON_FIELD,
    ValidationErrors,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

fn draft(user: Uuid, title: &str, amount: &str, date: &str, category: &str) -> ExpenseDraft {
    ExpenseDraft {
        user: user.to_string(),
        title: title.to_string(),
        amount: amount.to_string(),
        date: date.to_string(),
        category: category.to_string(),
    }
}

/// Creates "alice" with the three expenses used by the selector tests:
/// Groceries (food, 50.00, 2024-11-01), Train ticket (travel, 20.00,
/// 2024-11-15), Electricity (utilities, 100.00, 2024-10-30).
async fn user_with_expenses(engine: &Engine) -> Uuid {
    let user = engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();

    for (title, amount, date, category) in [
        ("Groceries", "50.00", "2024-11-01", "food"),
        ("Train ticket", "20.00", "2024-11-15", "travel"),
        ("Electricity", "100.00", "2024-10-30", "utilities"),
    ] {
        engine
            .create_expense(&draft(user.id, title, amount, date, category))
            .await
            .unwrap();
    }

    user.id
}

async fn expense_count(db: &DatabaseConnection) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM expenses",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

fn validation(err: EngineError) -> ValidationErrors {
    match err {
        EngineError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_returns_stored_record() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();

    let expense = engine
        .create_expense(&draft(user.id, "Groceries", "50.00", "2024-11-01", "food"))
        .await
        .unwrap();

    assert_eq!(expense.user_id, user.id);
    assert_eq!(expense.title, "Groceries");
    assert_eq!(expense.amount, Amount::from_cents(5000));
    assert_eq!(expense.category, Category::Food);

    let stored = engine.expense(expense.id).await.unwrap();
    assert_eq!(stored, expense);
}

#[tokio::test]
async fn list_is_ordered_by_date_then_id() {
    let (engine, _db) = engine_with_db().await;
    let user_id = user_with_expenses(&engine).await;

    let expenses = engine.list_expenses(&user_id.to_string()).await.unwrap();
    let titles: Vec<&str> = expenses.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Electricity", "Groceries", "Train ticket"]);

    let mut sorted = expenses.clone();
    sorted.sort_by(|a, b| (a.date, a.id).cmp(&(b.date, b.id)));
    assert_eq!(expenses, sorted);
}

#[tokio::test]
async fn date_range_returns_inclusive_subset() {
    let (engine, _db) = engine_with_db().await;
    let user_id = user_with_expenses(&engine).await;

    let expenses = engine
        .list_expenses_in_range(&user_id.to_string(), Some("2024-11-01"), Some("2024-11-30"))
        .await
        .unwrap();

    let titles: Vec<&str> = expenses.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Groceries", "Train ticket"]);
}

#[tokio::test]
async fn date_range_bounds_are_inclusive() {
    let (engine, _db) = engine_with_db().await;
    let user_id = user_with_expenses(&engine).await;

    // Bounds equal to the stored dates keep both boundary records.
    let expenses = engine
        .list_expenses_in_range(&user_id.to_string(), Some("2024-10-30"), Some("2024-11-15"))
        .await
        .unwrap();
    assert_eq!(expenses.len(), 3);
}

#[tokio::test]
async fn open_ended_range_filters_one_side() {
    let (engine, _db) = engine_with_db().await;
    let user_id = user_with_expenses(&engine).await;

    let from_november = engine
        .list_expenses_in_range(&user_id.to_string(), Some("2024-11-01"), None)
        .await
        .unwrap();
    assert_eq!(from_november.len(), 2);

    let until_october = engine
        .list_expenses_in_range(&user_id.to_string(), None, Some("2024-10-31"))
        .await
        .unwrap();
    assert_eq!(until_october.len(), 1);
    assert_eq!(until_october[0].title, "Electricity");
}

#[tokio::test]
async fn invalid_range_fails_before_querying() {
    let (engine, _db) = engine_with_db().await;
    let user_id = user_with_expenses(&engine).await;

    let err = engine
        .list_expenses_in_range(&user_id.to_string(), Some("2024-11-30"), Some("2024-11-01"))
        .await
        .unwrap_err();

    let errors = validation(err);
    let failures = errors.get(NON_FIELD).unwrap();
    assert_eq!(failures[0].code, ErrorKind::InvalidRange);
}

#[tokio::test]
async fn list_rejects_unknown_user() {
    let (engine, _db) = engine_with_db().await;
    user_with_expenses(&engine).await;

    let err = engine
        .list_expenses(&Uuid::new_v4().to_string())
        .await
        .unwrap_err();

    let errors = validation(err);
    assert_eq!(errors.get("user_id").unwrap()[0].code, ErrorKind::NotFound);
}

#[tokio::test]
async fn summary_groups_by_category_for_month() {
    let (engine, _db) = engine_with_db().await;
    let user_id = user_with_expenses(&engine).await;

    let totals = engine
        .category_summary(&user_id.to_string(), "11")
        .await
        .unwrap();

    // Rows come back in category order; Electricity (October) is absent.
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[0].category, Category::Food);
    assert_eq!(totals[0].total, Amount::from_cents(5000));
    assert_eq!(totals[1].category, Category::Travel);
    assert_eq!(totals[1].total, Amount::from_cents(2000));
}

#[tokio::test]
async fn summary_matches_month_across_years() {
    let (engine, _db) = engine_with_db().await;
    let user_id = user_with_expenses(&engine).await;

    engine
        .create_expense(&draft(user_id, "Groceries 2023", "10.00", "2023-11-20", "food"))
        .await
        .unwrap();

    let totals = engine
        .category_summary(&user_id.to_string(), "11")
        .await
        .unwrap();
    assert_eq!(totals[0].category, Category::Food);
    assert_eq!(totals[0].total, Amount::from_cents(6000));
}

#[tokio::test]
async fn summary_sums_cents_exactly() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();

    // 0.10 + 0.20 + 0.01: exact in cents, famously not in binary floats.
    for amount in ["0.10", "0.20", "0.01"] {
        engine
            .create_expense(&draft(user.id, "Snack", amount, "2024-03-05", "food"))
            .await
            .unwrap();
    }

    let totals = engine
        .category_summary(&user.id.to_string(), "3")
        .await
        .unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].total, Amount::from_cents(31));
}

#[tokio::test]
async fn summary_for_empty_month_is_empty() {
    let (engine, _db) = engine_with_db().await;
    let user_id = user_with_expenses(&engine).await;

    let totals = engine
        .category_summary(&user_id.to_string(), "7")
        .await
        .unwrap();
    assert!(totals.is_empty());
}

#[tokio::test]
async fn summary_collects_month_and_user_failures() {
    let (engine, _db) = engine_with_db().await;
    user_with_expenses(&engine).await;

    let err = engine
        .category_summary(&Uuid::new_v4().to_string(), "13")
        .await
        .unwrap_err();

    let errors = validation(err);
    assert_eq!(errors.get("month").unwrap()[0].code, ErrorKind::OutOfRange);
    assert_eq!(errors.get("user_id").unwrap()[0].code, ErrorKind::NotFound);
}

#[tokio::test]
async fn non_positive_amount_is_rejected_and_nothing_persists() {
    let (engine, db) = engine_with_db().await;
    let user = engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();

    for amount in ["-10.00", "0", "0.00"] {
        let err = engine
            .create_expense(&draft(user.id, "Bad", amount, "2024-11-01", "food"))
            .await
            .unwrap_err();
        let errors = validation(err);
        assert_eq!(errors.get("amount").unwrap()[0].code, ErrorKind::InvalidValue);
    }

    assert_eq!(expense_count(&db).await, 0);
}

#[tokio::test]
async fn unknown_user_is_rejected_and_nothing_persists() {
    let (engine, db) = engine_with_db().await;

    let err = engine
        .create_expense(&draft(Uuid::new_v4(), "Ghost", "10.00", "2024-11-01", "food"))
        .await
        .unwrap_err();

    let errors = validation(err);
    assert_eq!(errors.get("user").unwrap()[0].code, ErrorKind::NotFound);
    assert_eq!(expense_count(&db).await, 0);
}

#[tokio::test]
async fn create_collects_failures_across_fields() {
    let (engine, _db) = engine_with_db().await;

    let bad = ExpenseDraft {
        user: "not-a-uuid".to_string(),
        title: String::new(),
        amount: "-5".to_string(),
        date: "01/11/2024".to_string(),
        category: "groceries".to_string(),
    };
    let errors = validation(engine.create_expense(&bad).await.unwrap_err());

    assert_eq!(errors.get("user").unwrap()[0].code, ErrorKind::InvalidFormat);
    assert_eq!(errors.get("title").unwrap()[0].code, ErrorKind::InvalidValue);
    assert_eq!(errors.get("amount").unwrap()[0].code, ErrorKind::InvalidValue);
    assert_eq!(errors.get("date").unwrap()[0].code, ErrorKind::InvalidFormat);
    assert_eq!(
        errors.get("category").unwrap()[0].code,
        ErrorKind::InvalidValue
    );
}

#[tokio::test]
async fn update_replaces_every_field() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();
    let expense = engine
        .create_expense(&draft(user.id, "Groceries", "50.00", "2024-11-01", "food"))
        .await
        .unwrap();

    let updated = engine
        .update_expense(
            expense.id,
            &draft(user.id, "Bus pass", "30.00", "2024-11-02", "travel"),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, expense.id);
    assert_eq!(updated.title, "Bus pass");
    assert_eq!(updated.amount, Amount::from_cents(3000));
    assert_eq!(updated.category, Category::Travel);

    let stored = engine.expense(expense.id).await.unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn patch_updates_only_provided_fields() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();
    let expense = engine
        .create_expense(&draft(user.id, "Groceries", "50.00", "2024-11-01", "food"))
        .await
        .unwrap();

    let patched = engine
        .patch_expense(
            expense.id,
            &ExpensePatch {
                title: Some("Weekly groceries".to_string()),
                ..ExpensePatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(patched.title, "Weekly groceries");
    assert_eq!(patched.amount, expense.amount);
    assert_eq!(patched.date, expense.date);
    assert_eq!(patched.category, expense.category);
}

#[tokio::test]
async fn patch_with_invalid_amount_leaves_record_unchanged() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();
    let expense = engine
        .create_expense(&draft(user.id, "Groceries", "50.00", "2024-11-01", "food"))
        .await
        .unwrap();

    let err = engine
        .patch_expense(
            expense.id,
            &ExpensePatch {
                amount: Some("-1.00".to_string()),
                ..ExpensePatch::default()
            },
        )
        .await
        .unwrap_err();
    let errors = validation(err);
    assert_eq!(errors.get("amount").unwrap()[0].code, ErrorKind::InvalidValue);

    let stored = engine.expense(expense.id).await.unwrap();
    assert_eq!(stored, expense);
}

#[tokio::test]
async fn delete_removes_the_record() {
    let (engine, db) = engine_with_db().await;
    let user = engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();
    let expense = engine
        .create_expense(&draft(user.id, "Groceries", "50.00", "2024-11-01", "food"))
        .await
        .unwrap();

    engine.delete_expense(expense.id).await.unwrap();
    assert_eq!(expense_count(&db).await, 0);

    assert_eq!(
        engine.expense(expense.id).await.unwrap_err(),
        EngineError::NotFound("expense".to_string())
    );
    assert_eq!(
        engine.delete_expense(expense.id).await.unwrap_err(),
        EngineError::NotFound("expense".to_string())
    );
}

#[tokio::test]
async fn users_are_scoped_in_selectors() {
    let (engine, _db) = engine_with_db().await;
    let alice_id = user_with_expenses(&engine).await;
    let bob = engine.create_user("bob", "bob@example.com").await.unwrap();
    engine
        .create_expense(&draft(bob.id, "Hotel", "200.00", "2024-11-10", "travel"))
        .await
        .unwrap();

    let alice_expenses = engine.list_expenses(&alice_id.to_string()).await.unwrap();
    assert_eq!(alice_expenses.len(), 3);
    assert!(alice_expenses.iter().all(|e| e.user_id == alice_id));

    let totals = engine
        .category_summary(&bob.id.to_string(), "11")
        .await
        .unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].total, Amount::from_cents(20000));
}

#[tokio::test]
async fn duplicate_username_or_email_is_an_integrity_violation() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();

    let err = engine
        .create_user("alice", "other@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::IntegrityViolation(_)));

    let err = engine
        .create_user("alice2", "alice@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::IntegrityViolation(_)));
}

#[tokio::test]
async fn registered_users_can_be_fetched_and_listed() {
    let (engine, _db) = engine_with_db().await;
    let bob = engine.create_user("bob", "bob@example.com").await.unwrap();
    let alice = engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();

    assert_eq!(engine.user(alice.id).await.unwrap(), alice);
    assert_eq!(
        engine.user(Uuid::new_v4()).await.unwrap_err(),
        EngineError::NotFound("user".to_string())
    );

    let users = engine.list_users().await.unwrap();
    assert_eq!(users, [alice, bob]);
}

#[tokio::test]
async fn summary_total_matches_sum_of_listed_amounts() {
    let (engine, _db) = engine_with_db().await;
    let user_id = user_with_expenses(&engine).await;

    let november: Amount = engine
        .list_expenses_in_range(&user_id.to_string(), Some("2024-11-01"), Some("2024-11-30"))
        .await
        .unwrap()
        .iter()
        .map(|e| e.amount)
        .sum();

    let totals = engine
        .category_summary(&user_id.to_string(), "11")
        .await
        .unwrap();
    let summed: Amount = totals.iter().map(|row| row.total).sum();
    assert_eq!(summed, november);
}

#[tokio::test]
async fn expense_serde_round_trip_preserves_amount_precision() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .create_user("alice", "alice@example.com")
        .await
        .unwrap();
    let expense = engine
        .create_expense(&draft(user.id, "Groceries", "50.00", "2024-11-01", "food"))
        .await
        .unwrap();

    let encoded = serde_json::to_string(&expense).unwrap();
    assert!(encoded.contains("\"50.00\""));
    assert!(encoded.contains("\"2024-11-01\""));

    let decoded: engine::Expense = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, expense);
}
