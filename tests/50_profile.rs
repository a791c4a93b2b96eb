mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn public_profile_shows_posts_and_drafts() -> Result<()> {
    let app = TestApp::new().await;
    let token = app.signup("ana", &[1]).await?;

    app.post("/api/projects", Some(&token), app.project_body("Shipped", &[0], &[])).await?;
    app.post("/api/drafts", Some(&token), app.project_body("Work in progress", &[], &[])).await?;

    let res = app.get("/api/students/ana", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["username"], "ana");
    assert_eq!(res.data()["trails"], json!(["Software Engineering"]));
    assert_eq!(res.data()["posts"][0]["title"], "Shipped");
    assert_eq!(res.data()["drafts"][0]["title"], "Work in progress");

    assert_eq!(app.get("/api/students/ghost", None).await?.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn me_is_cached_and_refreshed_by_writes() -> Result<()> {
    let app = TestApp::new().await;
    let token = app.signup("ana", &[]).await?;

    let res = app.get("/api/me", Some(&token)).await?;
    assert_eq!(res.data()["status"], "success");
    assert_eq!(res.data()["data"]["semester"], 3);

    let res = app
        .put("/api/students/me", Some(&token), json!({ "semester": 7, "about": "Robots", "trailsIds": [app.fixture.trails[2].id] }))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["data"]["semester"], 7);

    let res = app.get("/api/me", Some(&token)).await?;
    assert_eq!(res.data()["data"]["about"], "Robots");
    assert_eq!(res.data()["data"]["trails"], json!(["Cybersecurity"]));

    app.post("/api/drafts", Some(&token), app.project_body("Idea", &[], &[])).await?;
    let res = app.get("/api/me", Some(&token)).await?;
    assert_eq!(res.data()["data"]["drafts"][0]["title"], "Idea");

    let res = app.post("/api/me/refetch", Some(&token), json!({})).await?;
    assert_eq!(res.data()["status"], "success");
    Ok(())
}

#[tokio::test]
async fn avatar_upload_sets_profile_url() -> Result<()> {
    let app = TestApp::new().await;
    let token = app.signup("ana", &[]).await?;

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/students/me/avatar?filename=me.JPG")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(vec![0xff, 0xd8, 0xff]))?;
    let res = app.send(request).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let url = "http://storage.test/storage/v1/object/public/profile-images/profiles/ana.jpg";
    assert_eq!(res.data()["profileUrl"], url);

    let res = app.get("/api/me", Some(&token)).await?;
    assert_eq!(res.data()["data"]["profileUrl"], url);

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/students/me/avatar?filename=noextension")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(vec![1, 2, 3]))?;
    assert_eq!(app.send(request).await?.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn student_search_by_name() -> Result<()> {
    let app = TestApp::new().await;
    app.fixture.register("ana", &[0]).await;
    app.fixture.register("anabel", &[]).await;
    app.fixture.register("bob", &[]).await;

    let res = app.get("/api/students?name=ana", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    let usernames: Vec<&str> = res.data().as_array().unwrap().iter().filter_map(|s| s["username"].as_str()).collect();
    assert_eq!(usernames, vec!["ana", "anabel"]);
    assert_eq!(res.data()[0]["trails"], json!(["Data Science"]));
    Ok(())
}
