mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|posts| posts.iter().filter_map(|p| p["title"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

async fn publish(app: &TestApp, token: &str, mut body: Value, overrides: Value) -> Result<String> {
    if let (Some(target), Some(extra)) = (body.as_object_mut(), overrides.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    let res = app.post("/api/projects", Some(token), body).await?;
    anyhow::ensure!(res.status == StatusCode::CREATED, "publish failed: {}", res.body);
    Ok(res.data()["id"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn listing_excludes_drafts_newest_first() -> Result<()> {
    let app = TestApp::new().await;
    let token = app.signup("ana", &[]).await?;

    publish(&app, &token, app.project_body("First", &[], &[]), json!({})).await?;
    app.post("/api/drafts", Some(&token), app.project_body("Hidden draft", &[], &[])).await?;
    publish(&app, &token, app.project_body("Second", &[], &[]), json!({})).await?;

    let res = app.get("/api/posts", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(titles(&res.body), vec!["Second", "First"]);
    assert_eq!(res.data()[0]["author"]["name"], "Ana Student");
    Ok(())
}

#[tokio::test]
async fn filters_are_anded() -> Result<()> {
    let app = TestApp::new().await;
    let token = app.signup("ana", &[]).await?;
    let subject = app.fixture.subjects[1].id;

    publish(&app, &token, app.project_body("Match", &[], &[]), json!({ "semester": 5, "subjectId": subject })).await?;
    publish(&app, &token, app.project_body("Wrong semester", &[], &[]), json!({ "semester": 2, "subjectId": subject })).await?;
    publish(&app, &token, app.project_body("No subject", &[], &[]), json!({ "semester": 5 })).await?;

    let res = app.get(&format!("/api/posts/filter?semester=5&subjectId={}", subject), None).await?;
    assert_eq!(titles(&res.body), vec!["Match"]);
    assert_eq!(res.data()[0]["subject"], "Databases");

    let res = app.get("/api/posts/filter?semester=5&publishedYear=2024", None).await?;
    assert_eq!(titles(&res.body), vec!["No subject", "Match"]);

    let res = app.get("/api/posts/filter?semester=five", None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn search_by_title_tag_and_professor() -> Result<()> {
    let app = TestApp::new().await;
    let token = app.signup("ana", &[]).await?;

    publish(&app, &token, app.project_body("Graph Neural Nets", &[0], &[0]), json!({})).await?;
    publish(&app, &token, app.project_body("Tiny Compilers", &[1], &[2]), json!({})).await?;

    let res = app.get("/api/posts/search?title=graph", None).await?;
    assert_eq!(titles(&res.body), vec!["Graph Neural Nets"]);

    let res = app.get("/api/posts/search?tag=Software%20Engineering", None).await?;
    assert_eq!(titles(&res.body), vec!["Tiny Compilers"]);

    let res = app.get("/api/posts/search?professorName=hopper", None).await?;
    assert_eq!(titles(&res.body), vec!["Tiny Compilers"]);

    let res = app.get("/api/posts/search?title=100%25", None).await?;
    assert!(titles(&res.body).is_empty());
    Ok(())
}

#[tokio::test]
async fn vocabularies_are_listed_by_name() -> Result<()> {
    let app = TestApp::new().await;

    let res = app.get("/api/trails", None).await?;
    let names: Vec<&str> = res.data().as_array().unwrap().iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names, vec!["Cybersecurity", "Data Science", "Software Engineering"]);

    let res = app.get("/api/tags", None).await?;
    assert_eq!(res.data()["professors"]["status"], "success");
    assert_eq!(res.data()["subjects"]["data"].as_array().map(Vec::len), Some(3));

    let res = app.post("/api/tags/refetch", None, json!({})).await?;
    assert_eq!(res.data()["trails"]["status"], "success");
    Ok(())
}
