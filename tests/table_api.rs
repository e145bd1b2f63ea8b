mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::TestDb;
use common::http::TestApp;
use medtable::config::load_configuration_for_tests;
use medtable::datamodel::DEFAULT_COLUMNS;
use serde_json::{Value, json};
use serial_test::serial;

static INIT: std::sync::Once = std::sync::Once::new();
fn ensure_config() {
    INIT.call_once(|| {
        load_configuration_for_tests().expect("Failed to load configuration for tests");
    });
}

async fn admin_token(app: &TestApp) -> Result<String> {
    let response = app
        .post_json("/api/admin-auth", &json!({"password": "5123"}).to_string())
        .await?;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json()?;
    Ok(body["token"].as_str().unwrap().to_string())
}

mod table_api_tests {
    use super::*;

    #[tokio::test]
    #[serial]
    async fn test_first_fetch_returns_default_columns_and_no_rows() -> Result<()> {
        ensure_config();
        let test_db = TestDb::new().await?;
        let app = TestApp::new(test_db.storage()).await;

        let response = app.get("/api/data").await?;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json()?;
        let columns: Vec<String> = serde_json::from_value(body["columns"].clone())?;
        assert_eq!(columns, DEFAULT_COLUMNS.to_vec());
        assert_eq!(body["rows"].as_array().unwrap().len(), 0);

        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_update_then_fetch_preserves_creation_order() -> Result<()> {
        ensure_config();
        let test_db = TestDb::new().await?;
        let app = TestApp::new(test_db.storage()).await;
        let token = admin_token(&app).await?;

        let rows: Vec<Value> = (0..15)
            .map(|i| {
                json!({
                    "id": format!("row-{i:02}"),
                    "data": {"Generic Name": format!("drug-{i:02}")}
                })
            })
            .collect();
        let payload = json!({
            "columns": ["Category", "Generic Name"],
            "rows": rows,
        });

        let response = app
            .post_json_with_token("/api/admin-update", &token, &payload.to_string())
            .await?;
        response.assert_status(StatusCode::OK);

        let response = app.get("/api/data").await?;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json()?;
        let ids: Vec<&str> = body["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        let expected: Vec<String> = (0..15).map(|i| format!("row-{i:02}")).collect();
        assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());

        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_update_generates_ids_and_restricts_values() -> Result<()> {
        ensure_config();
        let test_db = TestDb::new().await?;
        let app = TestApp::new(test_db.storage()).await;
        let token = admin_token(&app).await?;

        let payload = json!({
            "columns": ["Category"],
            "rows": [
                {"data": {"Category": "Antibiotic", "Stale": "dropped"}},
                {"id": "  ", "data": {}},
            ],
        });

        let response = app
            .post_json_with_token("/api/admin-update", &token, &payload.to_string())
            .await?;
        response.assert_status(StatusCode::OK);

        let body: Value = app.get("/api/data").await?.json()?;
        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);

        // Missing or blank ids were replaced with generated ones.
        for row in rows {
            assert!(!row["id"].as_str().unwrap().trim().is_empty());
        }
        assert_eq!(rows[0]["data"]["Category"], "Antibiotic");
        assert!(rows[0]["data"].get("Stale").is_none());
        // The second row was backfilled with an empty value for the column.
        assert_eq!(rows[1]["data"]["Category"], "");

        Ok(())
    }

    #[tokio::test]
    #[serial]
    async fn test_fetch_heals_placeholder_columns_left_in_storage() -> Result<()> {
        ensure_config();
        let test_db = TestDb::new().await?;
        let app = TestApp::new(test_db.storage()).await;

        // A legacy import wrote junk names straight into storage.
        let junk = vec![
            "Category".to_string(),
            "".to_string(),
            "Unnamed: 3".to_string(),
            "Dose".to_string(),
        ];
        test_db.storage().replace_table(&junk, &[]).await?;

        let body: Value = app.get("/api/data").await?.json()?;
        let columns: Vec<String> = serde_json::from_value(body["columns"].clone())?;
        assert_eq!(columns, vec!["Category", "Dose"]);

        Ok(())
    }
}
