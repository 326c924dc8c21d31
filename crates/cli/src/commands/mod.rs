//! Subcommand implementations.

pub mod admin;
pub mod locations;
pub mod migrate;

/// Database URL from `primary`, falling back to `DATABASE_URL`.
fn database_url(primary: &'static str) -> Option<String> {
    std::env::var(primary)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}
