//! `SeaORM` entity definitions.

pub mod files;

pub mod prelude {
    //! Common entity re-exports.

    pub use super::files::Entity as Files;
}
