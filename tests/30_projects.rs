mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn draft_save_publish_walkthrough() -> Result<()> {
    let app = TestApp::new().await;
    let token = app.signup("ana", &[0]).await?;
    let (t1, t2) = (app.fixture.trails[0].clone(), app.fixture.trails[1].clone());

    let res = app.post("/api/drafts", Some(&token), app.project_body("P1", &[0], &[])).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let id = res.data()["id"].as_str().unwrap().to_string();

    let mut body = app.project_body("P1", &[0, 1], &[]);
    body["description"] = json!("Now with two trails");
    let res = app.put(&format!("/api/drafts/{}", id), Some(&token), body.clone()).await?;
    assert_eq!(res.status, StatusCode::OK);

    let draft = app.get(&format!("/api/drafts/{}", id), Some(&token)).await?;
    let mut ids: Vec<String> = serde_json::from_value(draft.data()["trailsIds"].clone())?;
    ids.sort();
    let mut expected = vec![t1.id.to_string(), t2.id.to_string()];
    expected.sort();
    assert_eq!(ids, expected);

    body["draftId"] = json!(id);
    let res = app.post("/api/projects", Some(&token), body).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.data()["id"], json!(id));

    let details = app.get(&format!("/api/projects/{}", id), None).await?;
    assert_eq!(details.status, StatusCode::OK);
    assert_eq!(details.data()["status"], "PUBLISHED");
    assert_eq!(details.data()["description"], "Now with two trails");
    let mut names = vec![t1.name, t2.name];
    names.sort();
    assert_eq!(details.data()["trails"], json!(names));
    assert_eq!(details.data()["author"]["username"], "ana");
    Ok(())
}

#[tokio::test]
async fn drafts_are_private_to_their_author() -> Result<()> {
    let app = TestApp::new().await;
    let ana = app.signup("ana", &[]).await?;
    let bob = app.signup("bob", &[]).await?;

    let res = app.post("/api/drafts", Some(&ana), app.project_body("Secret", &[], &[])).await?;
    let id = res.data()["id"].as_str().unwrap().to_string();

    assert_eq!(app.get(&format!("/api/projects/{}", id), None).await?.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&format!("/api/projects/{}", id), Some(&bob)).await?.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&format!("/api/drafts/{}", id), Some(&bob)).await?.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&format!("/api/projects/{}", id), Some(&ana)).await?.status, StatusCode::OK);

    let mut body = app.project_body("Stolen", &[], &[]);
    body["draftId"] = json!(id);
    let res = app.post("/api/projects", Some(&bob), body).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn invalid_ids_and_bodies_are_bad_requests() -> Result<()> {
    let app = TestApp::new().await;
    let token = app.signup("ana", &[]).await?;

    let res = app.get("/api/projects/not-a-uuid", None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["success"], false);

    let res = app.post("/api/projects", Some(&token), json!({ "title": "No year" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let mut body = app.project_body("Blank", &[], &[]);
    body["title"] = json!("  ");
    let res = app.post("/api/projects", Some(&token), body).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn only_the_author_deletes_a_project() -> Result<()> {
    let app = TestApp::new().await;
    let ana = app.signup("ana", &[]).await?;
    let bob = app.signup("bob", &[]).await?;

    let res = app.post("/api/projects", Some(&ana), app.project_body("Robots", &[0], &[0])).await?;
    let id = res.data()["id"].as_str().unwrap().to_string();

    let res = app.delete(&format!("/api/projects/{}", id), Some(&bob)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.delete(&format!("/api/projects/{}", id), Some(&ana)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.get(&format!("/api/projects/{}", id), None).await?.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn comments_and_reports() -> Result<()> {
    let app = TestApp::new().await;
    let ana = app.signup("ana", &[]).await?;
    let bob = app.signup("bob", &[]).await?;

    let res = app.post("/api/projects", Some(&ana), app.project_body("Robots", &[], &[])).await?;
    let project = res.data()["id"].as_str().unwrap().to_string();

    let res = app
        .post(&format!("/api/projects/{}/comments", project), Some(&bob), json!({ "content": "Nice work" }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let comment = res.data()["id"].as_str().unwrap().to_string();
    assert_eq!(res.data()["projectId"], json!(project));

    let details = app.get(&format!("/api/projects/{}", project), None).await?;
    assert_eq!(details.data()["comments"][0]["content"], "Nice work");
    assert_eq!(details.data()["comments"][0]["author"]["username"], "bob");

    let res = app
        .post(&format!("/api/comments/{}/reports", comment), Some(&ana), json!({ "content": "Spam" }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.data()["commentId"], json!(comment));

    assert_eq!(app.delete(&format!("/api/comments/{}", comment), Some(&ana)).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(app.delete(&format!("/api/comments/{}", comment), Some(&bob)).await?.status, StatusCode::OK);

    let details = app.get(&format!("/api/projects/{}", project), None).await?;
    assert_eq!(details.data()["comments"], json!([]));
    Ok(())
}

#[tokio::test]
async fn banner_upload_updates_the_project() -> Result<()> {
    let app = TestApp::new().await;
    let token = app.signup("ana", &[]).await?;
    let res = app.post("/api/projects", Some(&token), app.project_body("Robots", &[], &[])).await?;
    let id = res.data()["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/projects/{}/banner?filename=Cover.PNG", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(vec![0x89, b'P', b'N', b'G']))?;
    let res = app.send(request).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let expected = format!("http://storage.test/storage/v1/object/public/project-banners/banners/{}.png", id);
    assert_eq!(res.data()["bannerUrl"], json!(expected));
    let stored = app.fixture.objects.get("project-banners", &format!("banners/{}.png", id)).await;
    assert!(stored.is_some());

    let details = app.get(&format!("/api/projects/{}", id), None).await?;
    assert_eq!(details.data()["bannerUrl"], json!(expected));
    Ok(())
}
