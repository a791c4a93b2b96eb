//! Seeded in-memory fixtures shared by unit and integration tests.
//! Setup failures panic; nothing here is used by the server itself.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::auth::{Identity, PasswordHashing};
use crate::config::AppConfig;
use crate::database::models::Tag;
use crate::database::{decode_row, row, MemoryStore, Store, Table, WriteBatch, WriteOp};
use crate::services::projects::ProjectForm;
use crate::services::students::{register, RegisterForm};
use crate::state::AppState;
use crate::storage::MemoryObjectStore;

pub const TRAILS: [&str; 3] = ["Data Science", "Software Engineering", "Cybersecurity"];
pub const SUBJECTS: [&str; 3] = ["Algorithms", "Databases", "Computer Networks"];
pub const PROFESSORS: [&str; 3] = ["Ada Lovelace", "Alan Turing", "Grace Hopper"];

pub const STORAGE_URL: &str = "http://storage.test";

pub struct Fixture {
    pub memory: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    /// Cheap argon2 parameters so hashing does not dominate test time
    pub hashing: PasswordHashing,
    pub trails: Vec<Tag>,
    pub subjects: Vec<Tag>,
    pub professors: Vec<Tag>,
}

/// Development config with a session secret and cheap password hashing
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.session_secret = "test-secret".to_string();
    config.security.password_memory_kib = 64;
    config.security.password_iterations = 1;
    config.store.url = STORAGE_URL.to_string();
    config
}

impl Fixture {
    /// Fresh store with the three tag vocabularies seeded, in the order of
    /// `TRAILS`, `SUBJECTS` and `PROFESSORS`.
    pub async fn new() -> Self {
        Self::with_store(MemoryStore::new()).await
    }

    /// Same seeding over a caller-configured store
    pub async fn with_store(store: MemoryStore) -> Self {
        let memory = Arc::new(store);
        let trails = seed(memory.as_ref(), Table::Trails, &TRAILS).await;
        let subjects = seed(memory.as_ref(), Table::Subjects, &SUBJECTS).await;
        let professors = seed(memory.as_ref(), Table::Professors, &PROFESSORS).await;

        Self {
            memory,
            objects: Arc::new(MemoryObjectStore::new(STORAGE_URL)),
            hashing: PasswordHashing::from_config(&test_config().security),
            trails,
            subjects,
            professors,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.memory.as_ref()
    }

    /// Application state over this fixture's stores
    pub fn state(&self) -> AppState {
        AppState::new(test_config(), self.memory.clone(), self.objects.clone())
            .expect("test config carries a session secret")
    }

    /// Registration form for `username` with email `{username}@uni.edu` and
    /// password `password-{username}`, linked to the trails at `trails`.
    pub fn register_form(&self, username: &str, trails: &[usize]) -> RegisterForm {
        let mut first = username.to_string();
        if let Some(c) = first.get_mut(0..1) {
            c.make_ascii_uppercase();
        }
        RegisterForm {
            email: format!("{}@uni.edu", username),
            password: format!("password-{}", username),
            username: username.to_string(),
            first_name: first,
            last_name: "Student".to_string(),
            semester: 3,
            about: None,
            trails: trails.iter().map(|i| self.trails[*i].id).collect(),
        }
    }

    pub async fn register(&self, username: &str, trails: &[usize]) -> Identity {
        let student = register(self.store(), &self.hashing, self.register_form(username, trails))
            .await
            .expect("fixture registration");
        Identity {
            id: student.id,
            email: student.email,
            username: student.username,
            name: student.name,
        }
    }

    /// A valid project form tagged with the trails and professors at the given indexes
    pub fn project_form(&self, title: &str, trails: &[usize], professors: &[usize]) -> ProjectForm {
        ProjectForm {
            title: title.to_string(),
            description: format!("About {}", title),
            content: Some(format!("# {}", title)),
            published_year: 2024,
            semester: 3,
            allow_comments: true,
            subject_id: None,
            trails_ids: Some(trails.iter().map(|i| self.trails[*i].id).collect()),
            professors_ids: Some(professors.iter().map(|i| self.professors[*i].id).collect()),
        }
    }
}

async fn seed(store: &dyn Store, table: Table, names: &[&str]) -> Vec<Tag> {
    let rows = names.iter().map(|name| row(json!({ "id": Uuid::new_v4(), "name": name }))).collect();
    let mut results = store
        .execute(WriteBatch::new().push(WriteOp::insert(table, rows)))
        .await
        .expect("seed vocabulary");
    results
        .pop()
        .unwrap_or_default()
        .into_iter()
        .map(|r| decode_row(r).expect("seeded tag row"))
        .collect()
}
