// Public handlers: no session required.
pub mod auth;
pub mod home;
pub mod posts;
pub mod students;
pub mod tags;
