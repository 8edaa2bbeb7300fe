use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, Order, QueryOrder, QuerySelect,
    Set,
};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::MovieFields,
    pagination::{PageRequest, SortDirection, SortField},
};

/// Gateway to the `movies` table. Every call is a single statement; no locking happens here.
#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<movie::Model>> {
        Ok(movie::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn insert(&self, fields: &MovieFields) -> AppResult<movie::Model> {
        let now = now_micros();
        let model = movie::ActiveModel {
            id: NotSet,
            title: Set(fields.title.clone()),
            description: Set(fields.description.clone()),
            rating: Set(fields.rating),
            image: Set(fields.image.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(&self.db).await?)
    }

    /// Overwrites the mutable fields of `existing`. `created_at` is left alone and
    /// `updated_at` always moves forward, even within a single clock tick.
    pub async fn update(
        &self,
        existing: movie::Model,
        fields: &MovieFields,
    ) -> AppResult<movie::Model> {
        let id = existing.id;
        let updated_at = now_micros().max(existing.updated_at.saturating_add(1));

        let mut model: movie::ActiveModel = existing.into();
        model.title = Set(fields.title.clone());
        model.description = Set(fields.description.clone());
        model.rating = Set(fields.rating);
        model.image = Set(fields.image.clone());
        model.updated_at = Set(updated_at);

        match model.update(&self.db).await {
            Ok(updated) => Ok(updated),
            // The row went away between the existence check and the write.
            Err(DbErr::RecordNotUpdated) => Err(AppError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(id));
        }
        Ok(())
    }

    pub async fn list(&self, page: &PageRequest) -> AppResult<Vec<movie::Model>> {
        let mut query = movie::Entity::find()
            .order_by(sort_column(page.sort.field), sort_order(page.sort.direction));
        if page.sort.field != SortField::Id {
            query = query.order_by_asc(movie::Column::Id);
        }

        let rows = query.limit(page.limit).offset(page.offset()).all(&self.db).await?;
        Ok(rows)
    }
}

fn sort_column(field: SortField) -> movie::Column {
    match field {
        SortField::Id => movie::Column::Id,
        SortField::Title => movie::Column::Title,
        SortField::Description => movie::Column::Description,
        SortField::Rating => movie::Column::Rating,
        SortField::CreatedAt => movie::Column::CreatedAt,
        SortField::UpdatedAt => movie::Column::UpdatedAt,
    }
}

fn sort_order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

fn now_micros() -> i64 {
    jiff::Timestamp::now().as_microsecond()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        config::Config,
        db,
        pagination::{PageLimits, PageQuery, Sort},
    };

    pub(crate) async fn memory_store() -> MovieStore {
        let mut config = Config::from_vars(|_| None).unwrap();
        config.database_url = "sqlite::memory:".to_string();
        config.db_max_connections = 1;
        config.migrate_on_start = true;
        MovieStore::new(db::connect(&config).await.unwrap())
    }

    fn fields(title: &str, rating: f32) -> MovieFields {
        MovieFields {
            title: title.to_string(),
            description: format!("about {title}"),
            rating,
            image: String::new(),
        }
    }

    fn page(page: &str, limit: &str, sort: Option<&str>) -> PageRequest {
        let query = PageQuery {
            page: Some(page.to_string()),
            limit: Some(limit.to_string()),
            sort: sort.map(str::to_string),
        };
        PageRequest::resolve(&query, PageLimits::default()).unwrap()
    }

    #[tokio::test]
    async fn insert_sets_both_timestamps_equal() {
        let store = memory_store().await;
        let created = store.insert(&fields("A", 4.5)).await.unwrap();

        assert!(created.id > 0);
        assert_eq!(created.created_at, created.updated_at);

        let found = store.find(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_moves_updated_at() {
        let store = memory_store().await;
        let created = store.insert(&fields("A", 4.5)).await.unwrap();

        let mut next = fields("A2", 3.0);
        next.image = "poster.png".to_string();
        let updated = store.update(created.clone(), &next).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "A2");
        assert_eq!(updated.rating, 3.0);
        assert_eq!(updated.image, "poster.png");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn update_of_vanished_row_is_not_found() {
        let store = memory_store().await;
        let created = store.insert(&fields("A", 4.5)).await.unwrap();
        store.delete(created.id).await.unwrap();

        let err = store.update(created.clone(), &fields("B", 1.0)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(id) if id == created.id));
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let store = memory_store().await;
        let created = store.insert(&fields("A", 4.5)).await.unwrap();

        store.delete(created.id).await.unwrap();
        assert!(store.find(created.id).await.unwrap().is_none());
        assert!(matches!(store.delete(created.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_windows_the_ordered_set() {
        let store = memory_store().await;
        let mut ids = Vec::new();
        for i in 0..12 {
            ids.push(store.insert(&fields(&format!("movie {i:02}"), i as f32)).await.unwrap().id);
        }

        let second = store.list(&page("2", "5", None)).await.unwrap();
        let got: Vec<i32> = second.iter().map(|m| m.id).collect();
        assert_eq!(got, ids[5..10]);

        let last = store.list(&page("3", "5", None)).await.unwrap();
        assert_eq!(last.len(), 2);

        let past_end = store.list(&page("9", "5", None)).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn list_honours_sort_with_id_tiebreak() {
        let store = memory_store().await;
        let low = store.insert(&fields("low", 1.0)).await.unwrap();
        let tie_a = store.insert(&fields("tie a", 5.0)).await.unwrap();
        let tie_b = store.insert(&fields("tie b", 5.0)).await.unwrap();

        let req = page("1", "10", Some("rating desc"));
        assert_eq!(
            req.sort,
            Sort { field: SortField::Rating, direction: SortDirection::Desc }
        );
        let got: Vec<i32> = store.list(&req).await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(got, vec![tie_a.id, tie_b.id, low.id]);
    }
}
