//! Venues repository

use super::{query::SortField, update_row, Crud, Entity, PgRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        query::SqlValue,
        venue::{CreateVenue, UpdateVenue, Venue, VenueQuery},
    },
};

pub type VenuesRepository = PgRepository<Venue>;

impl Entity for Venue {
    type Id = i64;
    type Query = VenueQuery;
    type Create = CreateVenue;
    type Update = UpdateVenue;

    const TABLE: &'static str = "venues";
    const NAME: &'static str = "Venue";
    const SORTABLE: &'static [SortField] = &[
        SortField::column("id"),
        SortField::column("name"),
        SortField::column("address"),
        SortField::column("capacity"),
        SortField::column("city"),
        SortField::column("state"),
        SortField::column("zip"),
        SortField::column("created_at"),
    ];

    fn insert_values(data: &CreateVenue) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("name", data.name.trim().into()),
            ("address", data.address.trim().into()),
            ("capacity", data.capacity.into()),
            ("city", data.city.trim().into()),
            ("state", data.state.trim().into()),
            ("zip", data.zip.trim().into()),
        ]
    }

    fn update_values(data: &UpdateVenue) -> Vec<(&'static str, SqlValue)> {
        let mut values: Vec<(&'static str, SqlValue)> = Vec::new();

        macro_rules! set_text {
            ($field:ident) => {
                if let Some(ref v) = data.$field {
                    values.push((stringify!($field), v.trim().into()));
                }
            };
        }

        set_text!(name);
        set_text!(address);
        if let Some(capacity) = data.capacity {
            values.push(("capacity", capacity.into()));
        }
        set_text!(city);
        set_text!(state);
        set_text!(zip);
        values
    }
}

impl VenuesRepository {
    /// Update a venue, refusing a capacity below the tickets already issued
    /// for any of its events.
    ///
    /// Locks the venue, then its events, the same rows ticket issuance and
    /// event moves lock.
    pub async fn update_within_capacity(&self, id: i64, data: &UpdateVenue) -> AppResult<Venue> {
        let Some(capacity) = data.capacity else {
            return self.update(&id, data).await;
        };

        let mut tx = self.pool().begin().await?;

        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM venues WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(Venue::not_found(&id));
        }

        sqlx::query("SELECT id FROM events WHERE venue_id = $1 FOR UPDATE")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let busiest: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(issued), 0) FROM (
                SELECT COUNT(*) AS issued
                FROM tickets t
                JOIN events e ON e.id = t.event_id
                WHERE e.venue_id = $1
                GROUP BY t.event_id
            ) counts
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if busiest > i64::from(capacity) {
            return Err(AppError::Validation(format!(
                "Capacity {} is below the {} tickets already issued for an event",
                capacity, busiest
            )));
        }

        let venue = update_row::<Venue, _>(&mut *tx, &id, Venue::update_values(data)).await?;
        tx.commit().await?;
        Ok(venue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_only_touches_provided_columns() {
        let update = UpdateVenue {
            name: Some(" Grand Hall  ".to_string()),
            capacity: Some(500),
            ..Default::default()
        };
        let values = Venue::update_values(&update);
        assert_eq!(
            values,
            vec![
                ("name", SqlValue::Text("Grand Hall".to_string())),
                ("capacity", SqlValue::Int(500)),
            ]
        );
        assert!(Venue::update_values(&UpdateVenue::default()).is_empty());
    }

    #[test]
    fn test_listing_query() {
        let query = VenueQuery {
            city: Some("jakarta".to_string()),
            sort: Some("capacity".to_string()),
            order: Some("DESC".to_string()),
            ..Default::default()
        };
        let spec = VenuesRepository::query_spec(&query);
        assert_eq!(
            spec.count_query().sql(),
            "SELECT COUNT(*) FROM venues WHERE city ILIKE $1"
        );
        assert_eq!(spec.order().column, "capacity");
    }
}
