use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::projects::build_posts;
use super::tags::STUDENT_TRAILS;
use super::views::{DraftSummary, Profile, StudentSearchResult, StudentView};
use super::{query_pairs, require_text, ServiceError, ServiceResult};
use crate::auth::{Identity, PasswordHashing};
use crate::database::models::{Project, Student};
use crate::database::{decode_row, row, Repository, Store, Table, WriteBatch, WriteOp};
use crate::filter::FilterData;
use crate::storage::{self, ObjectStore, PROFILE_IMAGES_BUCKET};
use crate::types::ProjectStatus;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub username: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub semester: i32,
    pub about: Option<String>,
    #[serde(default)]
    pub trails: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProfileForm {
    pub semester: i32,
    pub about: Option<String>,
    #[serde(default)]
    pub trails_ids: Vec<Uuid>,
}

/// Path segments under `/api/students/` that are not profiles
const RESERVED_USERNAMES: [&str; 1] = ["me"];

fn students(store: &dyn Store) -> Repository<'_, Student> {
    Repository::new(Table::Students, store)
}

fn validate_registration(form: &RegisterForm) -> ServiceResult<()> {
    let email = form.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.starts_with('.') => {}
        _ => return Err(ServiceError::Validation("A valid email is required".to_string())),
    }
    if form.username.is_empty() || !form.username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.') {
        return Err(ServiceError::Validation(
            "Username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }
    if RESERVED_USERNAMES.contains(&form.username.as_str()) {
        return Err(ServiceError::Validation(format!("Username '{}' is reserved", form.username)));
    }
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    require_text("First name", &form.first_name)?;
    if form.semester < 1 {
        return Err(ServiceError::Validation("Semester must be positive".to_string()));
    }
    Ok(())
}

/// Create a student and their trail links in one batch.
pub async fn register(store: &dyn Store, hashing: &PasswordHashing, form: RegisterForm) -> ServiceResult<StudentView> {
    validate_registration(&form)?;

    let email = form.email.trim().to_string();
    let taken = students(store)
        .select_one(FilterData::where_(json!({ "$or": [ { "email": email }, { "username": form.username } ] })))
        .await?;
    if let Some(existing) = taken {
        let field = if existing.email == email { "Email" } else { "Username" };
        return Err(ServiceError::Conflict(format!("{} is already registered", field)));
    }

    let password = hashing.hash_blocking(form.password).await?;
    let id = Uuid::new_v4();
    let name = format!("{} {}", form.first_name.trim(), form.last_name.trim()).trim().to_string();

    let batch = WriteBatch::new()
        .push(WriteOp::insert_one(
            Table::Students,
            row(json!({
                "id": id,
                "email": email,
                "password": password,
                "username": form.username,
                "name": name,
                "semester": form.semester,
                "about": form.about,
            })),
        ))
        .extend(STUDENT_TRAILS.link_ops(id, Some(form.trails.as_slice())));

    let mut results = store.execute(batch).await?;
    let student: Student = results
        .first_mut()
        .and_then(|rows| rows.pop())
        .map(decode_row)
        .transpose()?
        .ok_or_else(|| ServiceError::NotFound("student".to_string()))?;

    tracing::info!("Registered student {} ({})", student.username, student.id);
    Ok(student.into())
}

/// Credential check. An unknown email and a wrong password are
/// indistinguishable to the caller.
pub async fn authenticate_student(
    store: &dyn Store,
    hashing: &PasswordHashing,
    email: &str,
    password: &str,
) -> ServiceResult<Identity> {
    let Some(student) = students(store).select_one(FilterData::where_(json!({ "email": email }))).await? else {
        tracing::warn!("Login attempt for unknown email");
        return Err(ServiceError::InvalidCredentials);
    };

    if !hashing.verify_blocking(password.to_string(), student.password.clone()).await? {
        tracing::warn!("Login attempt with wrong password for {}", student.username);
        return Err(ServiceError::InvalidCredentials);
    }

    Ok(Identity {
        id: student.id,
        email: student.email,
        username: student.username,
        name: student.name,
    })
}

pub async fn get_student_profile(store: &dyn Store, username: &str) -> ServiceResult<Profile> {
    let student = students(store)
        .select_one(FilterData::where_(json!({ "username": username })))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Student {}", username)))?;

    let projects = Repository::<Project>::new(Table::Projects, store);
    let (trails, published, drafts) = futures::try_join!(
        STUDENT_TRAILS.names_for(store, student.id),
        async {
            projects
                .select_any(
                    FilterData::where_(json!({ "author_id": student.id, "status": ProjectStatus::Published }))
                        .order_by("created_at desc"),
                )
                .await
                .map_err(ServiceError::from)
        },
        async {
            projects
                .select_any(
                    FilterData::where_(json!({ "author_id": student.id, "status": ProjectStatus::Draft }))
                        .order_by("created_at desc"),
                )
                .await
                .map_err(ServiceError::from)
        },
    )?;

    let posts = build_posts(store, published).await?;

    Ok(Profile {
        id: student.id,
        name: student.name,
        username: student.username,
        semester: student.semester,
        about: student.about,
        profile_url: student.profile_url,
        trails,
        posts: posts.into_iter().map(Into::into).collect(),
        drafts: drafts.into_iter().map(|p| DraftSummary { id: p.id, title: p.title }).collect(),
    })
}

/// Case-insensitive name search; an absent `name` lists everyone.
pub async fn search_students(store: &dyn Store, query: &str) -> ServiceResult<Vec<StudentSearchResult>> {
    let name = query_pairs(query)
        .into_iter()
        .find(|(k, _)| k == "name")
        .map(|(_, v)| v)
        .unwrap_or_default();

    let found = students(store)
        .select_any(
            FilterData::where_(json!({ "name": { "$ilike": format!("%{}%", escape_like(&name)) } })).order_by("name asc"),
        )
        .await?;

    let ids: Vec<Uuid> = found.iter().map(|s| s.id).collect();
    let mut trails: HashMap<Uuid, Vec<String>> = STUDENT_TRAILS.names_by_owner(store, &ids).await?;

    Ok(found
        .into_iter()
        .map(|s| StudentSearchResult {
            trails: trails.remove(&s.id).unwrap_or_default(),
            id: s.id,
            name: s.name,
            username: s.username,
            semester: s.semester,
            profile_url: s.profile_url,
        })
        .collect())
}

/// Update semester/about and replace the student's trails atomically.
pub async fn edit_profile(store: &dyn Store, student_id: Uuid, form: EditProfileForm) -> ServiceResult<()> {
    if form.semester < 1 {
        return Err(ServiceError::Validation("Semester must be positive".to_string()));
    }
    let batch = WriteBatch::new()
        .push(WriteOp::update_existing(
            Table::Students,
            json!({ "id": student_id }),
            row(json!({ "semester": form.semester, "about": form.about })),
        ))
        .extend(STUDENT_TRAILS.replace_ops(student_id, Some(form.trails_ids.as_slice())));

    store.execute(batch).await.map_err(|e| match ServiceError::from(e) {
        ServiceError::NotFound(_) => ServiceError::NotFound("Student".to_string()),
        other => other,
    })?;
    tracing::info!("Updated profile of student {}", student_id);
    Ok(())
}

/// Store the image under `profiles/{username}.{ext}` and point the
/// student's profile_url at it. Returns the public URL.
pub async fn upload_profile_image(
    store: &dyn Store,
    objects: &dyn ObjectStore,
    username: &str,
    file_name: &str,
    bytes: Vec<u8>,
) -> ServiceResult<String> {
    let extension = storage::file_extension(file_name)?;
    let path = storage::profile_image_path(username, &extension);
    objects
        .upload(PROFILE_IMAGES_BUCKET, &path, bytes, storage::content_type_for(&extension))
        .await?;

    let url = objects.public_url(PROFILE_IMAGES_BUCKET, &path);
    let updated = store
        .update(Table::Students, json!({ "username": username }), row(json!({ "profile_url": url })))
        .await?;
    if updated.is_empty() {
        return Err(ServiceError::NotFound(format!("Student {}", username)));
    }
    Ok(url)
}

/// Escape LIKE wildcards so user input only ever matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
