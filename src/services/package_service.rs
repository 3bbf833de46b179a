use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::packages;
use crate::error::{AppError, AppResult};
use crate::models::PackageResponse;

// The shared connection lives behind an Arc: DatabaseConnection itself
// is not Clone in every build configuration.
#[derive(Clone)]
pub struct PackageService {
    db: Arc<DatabaseConnection>,
}

impl PackageService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list_active(&self) -> AppResult<Vec<PackageResponse>> {
        let rows = packages::Entity::find()
            .filter(packages::Column::IsActive.eq(true))
            .order_by_asc(packages::Column::Price)
            .all(self.db.as_ref())
            .await?;
        Ok(rows.into_iter().map(PackageResponse::from).collect())
    }

    pub async fn get_active(&self, id: i64) -> AppResult<PackageResponse> {
        let pkg = packages::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound("Package not found".to_string()))?;
        Ok(PackageResponse::from(pkg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DurationType;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn pkg(id: i64, name: &str, price: i64, active: bool) -> packages::Model {
        packages::Model {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
            price,
            duration_type: DurationType::Month,
            duration_value: 1,
            is_active: active,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn lists_active_packages() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pkg(1, "1-Month", 150_000, true)]])
            .into_connection();

        let service = PackageService::new(Arc::new(db));
        let list = service.list_active().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].price, 150_000);
    }

    #[tokio::test]
    async fn inactive_package_reads_as_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pkg(7, "Retired", 100_000, false)]])
            .into_connection();

        let service = PackageService::new(Arc::new(db));
        let err = service.get_active(7).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
