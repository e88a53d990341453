pub mod sqlite_admin_repo;
pub mod sqlite_event_repo;
pub mod sqlite_guest_repo;

pub mod postgres_admin_repo;
pub mod postgres_event_repo;
pub mod postgres_guest_repo;

/// `%term%` for a `LIKE ... ESCAPE '\'` match, with wildcards in `term` taken literally.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
