//! Events repository

use super::{query::SortField, tickets::count_for_event, update_row, Crud, Entity, PgRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        event::{CreateEvent, Event, EventQuery, UpdateEvent},
        query::SqlValue,
    },
};

pub type EventsRepository = PgRepository<Event>;

impl Entity for Event {
    type Id = i64;
    type Query = EventQuery;
    type Create = CreateEvent;
    type Update = UpdateEvent;

    const TABLE: &'static str = "events";
    const NAME: &'static str = "Event";
    const SORTABLE: &'static [SortField] = &[
        SortField::column("id"),
        SortField::column("name"),
        SortField::column("description"),
        SortField::column("date"),
        SortField::column("time"),
        SortField::column("venue_id"),
        SortField::new("venueId", "venue_id"),
        SortField::column("created_at"),
    ];

    fn insert_values(data: &CreateEvent) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("venue_id", data.venue_id.into()),
            ("name", data.name.trim().into()),
            ("description", data.description.as_str().into()),
            ("date", data.date.into()),
            ("time", data.time.into()),
        ]
    }

    fn update_values(data: &UpdateEvent) -> Vec<(&'static str, SqlValue)> {
        let mut values: Vec<(&'static str, SqlValue)> = Vec::new();
        if let Some(venue_id) = data.venue_id {
            values.push(("venue_id", venue_id.into()));
        }
        if let Some(ref name) = data.name {
            values.push(("name", name.trim().into()));
        }
        if let Some(ref description) = data.description {
            values.push(("description", description.as_str().into()));
        }
        if let Some(date) = data.date {
            values.push(("date", date.into()));
        }
        if let Some(time) = data.time {
            values.push(("time", time.into()));
        }
        values
    }
}

impl EventsRepository {
    /// Update an event; moving it to another venue requires that venue to
    /// seat every ticket already issued for the event.
    pub async fn update_within_capacity(&self, id: i64, data: &UpdateEvent) -> AppResult<Event> {
        let Some(venue_id) = data.venue_id else {
            return self.update(&id, data).await;
        };

        let mut tx = self.pool().begin().await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT venue_id FROM events WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let current = current.ok_or_else(|| Event::not_found(&id))?;

        if current != venue_id {
            // FOR SHARE holds off a concurrent capacity change on the target
            let capacity: Option<i32> =
                sqlx::query_scalar("SELECT capacity FROM venues WHERE id = $1 FOR SHARE")
                    .bind(venue_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let capacity = capacity
                .ok_or_else(|| AppError::Validation(format!("Venue {} not found", venue_id)))?;

            let issued = count_for_event(&mut *tx, id).await?;
            if issued > i64::from(capacity) {
                return Err(AppError::Validation(format!(
                    "Venue {} seats {}, but {} tickets are already issued",
                    venue_id, capacity, issued
                )));
            }
        }

        let event = update_row::<Event, _>(&mut *tx, &id, Event::update_values(data)).await?;
        tx.commit().await?;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_insert_values() {
        let create = CreateEvent {
            venue_id: 2,
            name: "  Annual Event ".to_string(),
            description: "Yearly gathering".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
        };
        let values = Event::insert_values(&create);
        let columns: Vec<_> = values.iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, vec!["venue_id", "name", "description", "date", "time"]);
        assert_eq!(values[1].1, SqlValue::Text("Annual Event".to_string()));
    }

    #[test]
    fn test_update_values_trim_name() {
        let update = UpdateEvent {
            name: Some("  Closing Night ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            Event::update_values(&update),
            vec![("name", SqlValue::Text("Closing Night".to_string()))]
        );
    }

    #[test]
    fn test_invalid_sort_uses_creation_order() {
        let query = EventQuery {
            sort: Some("password".to_string()),
            order: Some("asc".to_string()),
            ..Default::default()
        };
        let spec = EventsRepository::query_spec(&query);
        assert_eq!(spec.order().column, "created_at");
        assert_eq!(spec.order().direction.as_sql(), "DESC");
    }
}
