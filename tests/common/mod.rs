#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use showcase_api::router;
use showcase_api::testing::Fixture;

pub struct TestApp {
    pub fixture: Fixture,
    pub router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let fixture = Fixture::new().await;
        let router = router(fixture.state());
        Self { fixture, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await.context("router call")?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.context("read body")?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response is not JSON")?
        };
        Ok(TestResponse { status, headers, body })
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.call(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.call(Method::DELETE, uri, token, None).await
    }

    /// Register `username` through the fixture and log in over HTTP
    pub async fn signup(&self, username: &str, trails: &[usize]) -> Result<String> {
        self.fixture.register(username, trails).await;
        self.login(username).await
    }

    pub async fn login(&self, username: &str) -> Result<String> {
        let res = self
            .post(
                "/auth/login",
                None,
                serde_json::json!({ "email": format!("{}@uni.edu", username), "password": format!("password-{}", username) }),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "login failed: {} {}", res.status, res.body);
        res.data()["token"].as_str().map(str::to_string).context("token in login response")
    }

    /// Project JSON body for the fixture's project form
    pub fn project_body(&self, title: &str, trails: &[usize], professors: &[usize]) -> Value {
        let form = self.fixture.project_form(title, trails, professors);
        serde_json::json!({
            "title": form.title,
            "description": form.description,
            "content": form.content,
            "publishedYear": form.published_year,
            "semester": form.semester,
            "allowComments": form.allow_comments,
            "trailsIds": form.trails_ids,
            "professorsIds": form.professors_ids,
        })
    }
}
