use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::database::manager::DatabaseError;
use crate::filter::FilterData;

/// A row as the store returns it: column name to JSON value
pub type Row = Map<String, Value>;

/// Every table the application reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Students,
    Projects,
    Comments,
    Reports,
    Trails,
    Subjects,
    Professors,
    StudentTrails,
    ProjectTrails,
    ProjectProfessors,
}

/// Foreign key as the store enforces it
#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: Table,
    pub on_delete_cascade: bool,
}

const fn fk(column: &'static str, references: Table, on_delete_cascade: bool) -> ForeignKey {
    ForeignKey { column, references, on_delete_cascade }
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Students,
        Table::Projects,
        Table::Comments,
        Table::Reports,
        Table::Trails,
        Table::Subjects,
        Table::Professors,
        Table::StudentTrails,
        Table::ProjectTrails,
        Table::ProjectProfessors,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Students => "students",
            Table::Projects => "projects",
            Table::Comments => "comments",
            Table::Reports => "reports",
            Table::Trails => "trails",
            Table::Subjects => "subjects",
            Table::Professors => "professors",
            Table::StudentTrails => "student_trails",
            Table::ProjectTrails => "project_trails",
            Table::ProjectProfessors => "project_professors",
        }
    }

    /// Junction tables are keyed by their foreign key pair only
    pub fn has_id(&self) -> bool {
        !matches!(self, Table::StudentTrails | Table::ProjectTrails | Table::ProjectProfessors)
    }

    pub fn has_updated_at(&self) -> bool {
        matches!(self, Table::Students | Table::Projects | Table::Comments)
    }

    pub fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        match self {
            Table::Students => &[&["email"], &["username"]],
            Table::StudentTrails => &[&["student_id", "trail_id"]],
            Table::ProjectTrails => &[&["project_id", "trail_id"]],
            Table::ProjectProfessors => &[&["project_id", "professor_id"]],
            _ => &[],
        }
    }

    /// Reports deliberately carry no key to comments: deleting a comment keeps its reports.
    pub fn foreign_keys(&self) -> &'static [ForeignKey] {
        const PROJECTS: &[ForeignKey] = &[fk("author_id", Table::Students, false), fk("subject_id", Table::Subjects, false)];
        const COMMENTS: &[ForeignKey] = &[fk("author_id", Table::Students, false), fk("project_id", Table::Projects, true)];
        const REPORTS: &[ForeignKey] = &[fk("reporter_id", Table::Students, false)];
        const STUDENT_TRAILS: &[ForeignKey] = &[fk("student_id", Table::Students, true), fk("trail_id", Table::Trails, false)];
        const PROJECT_TRAILS: &[ForeignKey] = &[fk("project_id", Table::Projects, true), fk("trail_id", Table::Trails, false)];
        const PROJECT_PROFESSORS: &[ForeignKey] =
            &[fk("project_id", Table::Projects, true), fk("professor_id", Table::Professors, false)];

        match self {
            Table::Projects => PROJECTS,
            Table::Comments => COMMENTS,
            Table::Reports => REPORTS,
            Table::StudentTrails => STUDENT_TRAILS,
            Table::ProjectTrails => PROJECT_TRAILS,
            Table::ProjectProfessors => PROJECT_PROFESSORS,
            _ => &[],
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One write inside a batch
#[derive(Debug, Clone)]
pub enum WriteOp {
    Insert {
        table: Table,
        rows: Vec<Row>,
    },
    Update {
        table: Table,
        filter: Value,
        changes: Row,
        /// Abort the whole batch with NotFound when nothing matches
        must_match: bool,
    },
    Delete {
        table: Table,
        filter: Value,
    },
}

impl WriteOp {
    pub fn insert(table: Table, rows: Vec<Row>) -> Self {
        WriteOp::Insert { table, rows }
    }

    pub fn insert_one(table: Table, row: Row) -> Self {
        WriteOp::Insert { table, rows: vec![row] }
    }

    pub fn update(table: Table, filter: Value, changes: Row) -> Self {
        WriteOp::Update { table, filter, changes, must_match: false }
    }

    pub fn update_existing(table: Table, filter: Value, changes: Row) -> Self {
        WriteOp::Update { table, filter, changes, must_match: true }
    }

    pub fn delete(table: Table, filter: Value) -> Self {
        WriteOp::Delete { table, filter }
    }

    pub fn table(&self) -> Table {
        match self {
            WriteOp::Insert { table, .. } | WriteOp::Update { table, .. } | WriteOp::Delete { table, .. } => *table,
        }
    }
}

/// Writes that commit together or not at all
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, op: WriteOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn extend(mut self, ops: impl IntoIterator<Item = WriteOp>) -> Self {
        self.ops.extend(ops);
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Generic table store: filtered reads plus atomic write batches.
///
/// `execute` returns one entry per op: inserted, updated or deleted rows.
#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, table: Table, filter: FilterData) -> Result<Vec<Row>, DatabaseError>;

    async fn execute(&self, batch: WriteBatch) -> Result<Vec<Vec<Row>>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn insert(&self, table: Table, row: Row) -> Result<Row, DatabaseError> {
        let mut results = self.execute(WriteBatch::new().push(WriteOp::insert_one(table, row))).await?;
        results
            .pop()
            .and_then(|mut rows| rows.pop())
            .ok_or_else(|| DatabaseError::QueryError(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, table: Table, filter: Value, changes: Row) -> Result<Vec<Row>, DatabaseError> {
        let mut results = self.execute(WriteBatch::new().push(WriteOp::update(table, filter, changes))).await?;
        Ok(results.pop().unwrap_or_default())
    }

    async fn delete(&self, table: Table, filter: Value) -> Result<Vec<Row>, DatabaseError> {
        let mut results = self.execute(WriteBatch::new().push(WriteOp::delete(table, filter))).await?;
        Ok(results.pop().unwrap_or_default())
    }
}

/// Build a row from a JSON object literal
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}
