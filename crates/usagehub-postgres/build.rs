#![forbid(unsafe_code)]

/// `embed_migrations!` cannot detect changes to the migration files on its
/// own; rebuilding on changes to the migration directory keeps the embedded
/// set current.
fn main() {
    println!("cargo:rerun-if-changed=./migrations");
}
