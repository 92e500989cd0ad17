//! File repository for database operations.
//!
//! Implements file record persistence using SeaORM.

use chrono::Utc;
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set, SqlErr,
};

use crate::entities::files;
use localcloud_core::access::ListScope;
use localcloud_core::files::{
    FileError, FileRecord, FileRepository as FileRepoTrait, NewFileRecord,
};
use localcloud_core::storage::{StorageClass, StorageError};

/// File repository implementation.
#[derive(Debug, Clone)]
pub struct FileRepository {
    db: DatabaseConnection,
}

impl FileRepository {
    /// Create a new file repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl FileRepoTrait for FileRepository {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, FileError> {
        let size = i64::try_from(record.size)
            .map_err(|_| FileError::repository(format!("size {} out of range", record.size)))?;
        let id = record.id.clone();

        let active_model = files::ActiveModel {
            id: Set(record.id),
            owner_id: Set(record.owner_id),
            storage_class: Set(record.storage_class.as_str().to_string()),
            logical_path: Set(record.logical_path),
            stored_path: Set(record.stored_path),
            size: Set(size),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                FileError::conflict(id)
            } else {
                repository_error(&e)
            }
        })?;

        to_domain(model)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<FileRecord>, FileError> {
        let model = files::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| repository_error(&e))?;

        model.map(to_domain).transpose()
    }

    async fn exists(&self, id: &str) -> Result<bool, FileError> {
        let count: u64 = files::Entity::find_by_id(id.to_string())
            .count(&self.db)
            .await
            .map_err(|e| repository_error(&e))?;

        Ok(count > 0)
    }

    async fn list(&self, scope: &ListScope) -> Result<Vec<FileRecord>, FileError> {
        let query = match scope {
            ListScope::Nothing => return Ok(Vec::new()),
            ListScope::All {
                storage_class,
                path_prefix,
            } => scoped(*storage_class, path_prefix),
            ListScope::Owner {
                owner_id,
                storage_class,
                path_prefix,
            } => scoped(*storage_class, path_prefix)
                .filter(files::Column::OwnerId.eq(owner_id.as_str())),
        };

        let models = query
            .order_by_desc(files::Column::CreatedAt)
            .order_by_asc(files::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| repository_error(&e))?;

        // LIKE folds ASCII case on some backends; the scope's own check is exact.
        let mut records = Vec::with_capacity(models.len());
        for model in models {
            let record = to_domain(model)?;
            if scope.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

/// Base query for one storage class under a logical path prefix.
fn scoped(storage_class: StorageClass, path_prefix: &str) -> Select<files::Entity> {
    let query = files::Entity::find()
        .filter(files::Column::StorageClass.eq(storage_class.as_str()));

    if path_prefix.is_empty() {
        query
    } else {
        let pattern = format!("{}%", escape_like(path_prefix));
        query.filter(files::Column::LogicalPath.like(LikeExpr::new(pattern).escape('\\')))
    }
}

/// Escapes LIKE metacharacters so the prefix matches literally.
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn repository_error(err: &DbErr) -> FileError {
    FileError::repository(err.to_string())
}

/// Convert database model to domain record.
///
/// A stored class outside the enumeration fails closed.
fn to_domain(model: files::Model) -> Result<FileRecord, FileError> {
    let storage_class = StorageClass::parse(&model.storage_class)?;
    let size = u64::try_from(model.size).map_err(|_| {
        FileError::repository(format!("file '{}' has negative size", model.id))
    })?;

    Ok(FileRecord {
        id: model.id,
        owner_id: model.owner_id,
        storage_class,
        logical_path: model.logical_path,
        stored_path: model.stored_path,
        size,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("docs", "docs")]
    #[case("50%", "50\\%")]
    #[case("a_b", "a\\_b")]
    #[case("c:\\tmp", "c:\\\\tmp")]
    fn test_escape_like(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_like(input), expected);
    }

    #[test]
    fn test_to_domain_rejects_unknown_class() {
        let model = files::Model {
            id: "f1".to_string(),
            owner_id: "alice".to_string(),
            storage_class: "Internal".to_string(),
            logical_path: "a.txt".to_string(),
            stored_path: "alice/blob".to_string(),
            size: 1,
            created_at: Utc::now().into(),
        };

        assert!(matches!(
            to_domain(model),
            Err(FileError::Storage(StorageError::InvalidStorageClass { .. }))
        ));
    }

    #[test]
    fn test_to_domain_converts() {
        let model = files::Model {
            id: "f1".to_string(),
            owner_id: "alice".to_string(),
            storage_class: "external".to_string(),
            logical_path: "docs/a.txt".to_string(),
            stored_path: "alice/docs/blob".to_string(),
            size: 11,
            created_at: Utc::now().into(),
        };

        let record = to_domain(model).unwrap();
        assert_eq!(record.storage_class, StorageClass::External);
        assert_eq!(record.size, 11);
    }
}
