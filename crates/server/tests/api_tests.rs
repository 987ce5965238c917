use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;

use server::config::ServerConfig;
use server::{create_router, state::AppState};

async fn setup_test_server() -> (TestServer, TempDir) {
    setup_with_config(ServerConfig::default()).await
}

async fn setup_with_config(config: ServerConfig) -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_url = format!("sqlite:{}", temp_dir.path().join("test.db").display());

    let pool = db::create_pool(&db_url).await.expect("Failed to create pool");
    db::run_migrations(&pool).await.expect("Failed to run migrations");

    let state = AppState::new(pool, config).expect("Failed to build state");
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    (server, temp_dir)
}

fn png_part() -> Part {
    Part::bytes(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
        .file_name("capture.png")
        .mime_type("image/png")
}

async fn submit_image(server: &TestServer) -> String {
    let response = server
        .post("/api/components/generate/image")
        .multipart(MultipartForm::new().add_part("image", png_part()))
        .await;

    response.assert_status(axum::http::StatusCode::ACCEPTED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "pending");
    body["taskId"].as_str().expect("taskId missing").to_string()
}

async fn wait_for_terminal(server: &TestServer, task_id: &str) -> Value {
    for _ in 0..200 {
        let response = server
            .get(&format!("/api/components/task/{task_id}"))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        match body["status"].as_str() {
            Some("completed") | Some("failed") | Some("cancelled") => return body,
            _ => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    panic!("task {task_id} did not reach a terminal state");
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server.get("/api/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_detailed_health_reports_database() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server.get("/api/health/detailed").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["database"], "connected");
        assert!(body["data"]["tasksTotal"].is_i64());
        assert!(body["data"]["agents"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a == "vision"));
    }
}

mod cors {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[tokio::test]
    async fn test_configured_origin_is_echoed() {
        let config = ServerConfig {
            cors_origin: Some("http://localhost:5173".to_string()),
            ..ServerConfig::default()
        };
        let (server, _temp_dir) = setup_with_config(config).await;

        let response = server
            .get("/api/health")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("http://localhost:5173"),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:5173"
        );
    }
}

mod generation {
    use super::*;

    #[tokio::test]
    async fn test_image_submission_runs_to_completion() {
        let (server, _temp_dir) = setup_test_server().await;

        let task_id = submit_image(&server).await;
        let body = wait_for_terminal(&server, &task_id).await;

        assert_eq!(body["status"], "completed");
        assert_eq!(body["data"]["progress"], 100);
        assert_eq!(body["data"]["iteration"], 1);
        assert!(body["data"]["metrics"]["passed"].as_bool().unwrap());
        assert!(body["data"]["output"]["files"]["component"].is_string());
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .post("/api/components/generate/image")
            .multipart(MultipartForm::new().add_text("mode", "pixel-perfect"))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_unsupported_file_type_is_rejected() {
        let (server, _temp_dir) = setup_test_server().await;

        let part = Part::bytes(vec![1, 2, 3])
            .file_name("report.pdf")
            .mime_type("application/pdf");
        let response = server
            .post("/api/components/generate/image")
            .multipart(MultipartForm::new().add_part("image", part))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "upload_error");
    }

    #[tokio::test]
    async fn test_invalid_option_value_is_rejected() {
        let (server, _temp_dir) = setup_test_server().await;

        let form = MultipartForm::new()
            .add_part("image", png_part())
            .add_text("framework", "svelte");
        let response = server
            .post("/api/components/generate/image")
            .multipart(form)
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_url_submission_runs_to_completion() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .post("/api/components/generate/url")
            .json(&json!({
                "url": "https://example.com/pricing",
                "options": {"framework": "vue"}
            }))
            .await;

        response.assert_status(axum::http::StatusCode::ACCEPTED);
        let body: Value = response.json();
        let task_id = body["taskId"].as_str().unwrap().to_string();

        let done = wait_for_terminal(&server, &task_id).await;
        assert_eq!(done["status"], "completed");
        assert_eq!(
            done["data"]["output"]["dependencies"],
            json!(["vue"])
        );
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .post("/api/components/generate/url")
            .json(&json!({"url": "not-a-url"}))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_non_http_scheme_is_rejected() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .post("/api/components/generate/url")
            .json(&json!({"url": "ftp://example.com/page"}))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }
}

mod task_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_status_for_unknown_task_is_404_envelope() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .get(&format!("/api/components/task/{}", uuid::Uuid::new_v4()))
            .await;

        response.assert_status(axum::http::StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_result_carries_component_and_metrics() {
        let (server, _temp_dir) = setup_test_server().await;

        let task_id = submit_image(&server).await;
        wait_for_terminal(&server, &task_id).await;

        let response = server
            .get(&format!("/api/components/task/{task_id}/result"))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert!(body["data"]["component"]["id"].is_string());
        assert!(body["data"]["metrics"]["overallScore"].as_f64().unwrap() > 0.85);
        assert_eq!(body["data"]["iterations"], 1);
    }

    #[tokio::test]
    async fn test_result_is_idempotent() {
        let (server, _temp_dir) = setup_test_server().await;

        let task_id = submit_image(&server).await;
        wait_for_terminal(&server, &task_id).await;

        let first: Value = server
            .get(&format!("/api/components/task/{task_id}/result"))
            .await
            .json();
        let second: Value = server
            .get(&format!("/api/components/task/{task_id}/result"))
            .await
            .json();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cancel_after_completion_conflicts() {
        let (server, _temp_dir) = setup_test_server().await;

        let task_id = submit_image(&server).await;
        wait_for_terminal(&server, &task_id).await;

        let response = server
            .delete(&format!("/api/components/task/{task_id}"))
            .await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn test_cancel_unknown_task_is_404() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .delete(&format!("/api/components/task/{}", uuid::Uuid::new_v4()))
            .await;

        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_screenshot_and_preview_after_completion() {
        let (server, _temp_dir) = setup_test_server().await;

        let task_id = submit_image(&server).await;
        wait_for_terminal(&server, &task_id).await;

        let metrics = server
            .get(&format!("/api/components/metrics/{task_id}"))
            .await;
        metrics.assert_status_ok();
        let body: Value = metrics.json();
        assert!(body["data"]["boundingBoxIoU"].is_number());

        let screenshot = server
            .get(&format!("/api/components/preview/{task_id}/screenshot"))
            .await;
        screenshot.assert_status_ok();
        let body: Value = screenshot.json();
        assert!(body["data"]["screenshot"].is_string());

        let preview = server
            .get(&format!("/api/components/preview/{task_id}"))
            .await;
        preview.assert_status_ok();
        assert!(preview.text().contains("GeneratedComponent"));
    }

    #[tokio::test]
    async fn test_metrics_before_any_evaluation_is_404() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .get(&format!("/api/components/metrics/{}", uuid::Uuid::new_v4()))
            .await;

        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}

mod components_crud {
    use super::*;

    #[tokio::test]
    async fn test_list_get_delete_component() {
        let (server, _temp_dir) = setup_test_server().await;

        let task_id = submit_image(&server).await;
        wait_for_terminal(&server, &task_id).await;

        let list = server.get("/api/components/components").await;
        list.assert_status_ok();
        let body: Value = list.json();
        assert!(body["data"]["total"].as_i64().unwrap() >= 1);
        let component_id = body["data"]["components"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let get = server.get(&format!("/api/components/components/{component_id}")).await;
        get.assert_status_ok();
        let component: Value = get.json();
        assert_eq!(component["data"]["id"], component_id.as_str());

        let delete = server
            .delete(&format!("/api/components/components/{component_id}"))
            .await;
        delete.assert_status_ok();

        let gone = server.get(&format!("/api/components/components/{component_id}")).await;
        gone.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_pagination_clamps_input() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .get("/api/components/components?page=0&limit=10000")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["page"], 1);
        assert_eq!(body["data"]["limit"], 100);
    }
}

mod feedback {
    use super::*;

    #[tokio::test]
    async fn test_feedback_on_completed_task_triggers_refinement() {
        let (server, _temp_dir) = setup_test_server().await;

        let task_id = submit_image(&server).await;
        wait_for_terminal(&server, &task_id).await;

        let response = server
            .post(&format!("/api/components/feedback/{task_id}"))
            .json(&json!({
                "feedback": "The header spacing does not match the capture.",
                "rating": 3,
                "improvements": ["tighten header spacing"]
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "processing");

        let done = wait_for_terminal(&server, &task_id).await;
        assert_eq!(done["status"], "completed");
        assert_eq!(done["data"]["iteration"], 2);
    }

    #[tokio::test]
    async fn test_short_feedback_is_rejected() {
        let (server, _temp_dir) = setup_test_server().await;

        let task_id = submit_image(&server).await;

        let response = server
            .post(&format!("/api/components/feedback/{task_id}"))
            .json(&json!({"feedback": "meh"}))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_feedback_length_is_measured_in_characters() {
        let (server, _temp_dir) = setup_test_server().await;

        let task_id = submit_image(&server).await;

        // Nine characters, twelve bytes.
        let response = server
            .post(&format!("/api/components/feedback/{task_id}"))
            .json(&json!({"feedback": "úžasné!!!"}))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);

        // 600 characters, 1200 bytes.
        let response = server
            .post(&format!("/api/components/feedback/{task_id}"))
            .json(&json!({"feedback": "š".repeat(600)}))
            .await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_rejected() {
        let (server, _temp_dir) = setup_test_server().await;

        let task_id = submit_image(&server).await;

        let response = server
            .post(&format!("/api/components/feedback/{task_id}"))
            .json(&json!({
                "feedback": "Colors are close but the palette feels off.",
                "rating": 9
            }))
            .await;

        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_feedback_for_unknown_task_is_404() {
        let (server, _temp_dir) = setup_test_server().await;

        let response = server
            .post(&format!("/api/components/feedback/{}", uuid::Uuid::new_v4()))
            .json(&json!({
                "feedback": "This never existed but the text is long enough."
            }))
            .await;

        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
