pub mod comment;
pub mod project;
pub mod student;
pub mod tag;

pub use comment::{Comment, Report};
pub use project::{Project, ProjectProfessor, ProjectTrail};
pub use student::{Student, StudentTrail};
pub use tag::Tag;
