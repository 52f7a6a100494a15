//! Repository tests against a real PostgreSQL database (`DATABASE_URL`)

use chrono::{NaiveDate, NaiveTime};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use rust_decimal::Decimal;
use ticketing_server::{
    error::AppError,
    models::{
        event::{CreateEvent, Event, EventQuery, UpdateEvent},
        ticket::{CreateTicket, Ticket, TicketType, UpdateTicket},
        user::{NewUser, Role},
        venue::{CreateVenue, UpdateVenue, Venue, VenueQuery},
    },
    repository::{Crud, Repository},
};

async fn repository() -> Repository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Repository::new(pool)
}

async fn create_venue(repo: &Repository, name: &str) -> Venue {
    create_venue_with_capacity(repo, name, 100).await
}

async fn create_venue_with_capacity(repo: &Repository, name: &str, capacity: i32) -> Venue {
    repo.venues
        .create(&CreateVenue {
            name: name.to_string(),
            address: "1 Main St".to_string(),
            capacity,
            city: "Bandung".to_string(),
            state: "West Java".to_string(),
            zip: "40111".to_string(),
        })
        .await
        .expect("Failed to create venue")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_second_page_of_events() {
    let repo = repository().await;
    let marker = Uuid::new_v4().simple().to_string();
    let venue = create_venue(&repo, &format!("Venue {}", marker)).await;

    for i in 1..=25 {
        repo.events
            .create(&CreateEvent {
                venue_id: venue.id,
                name: format!("Annual Event {} {:02}", marker, i),
                description: String::new(),
                date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            })
            .await
            .expect("Failed to create event");
    }

    let query = EventQuery {
        name: Some(marker.clone()),
        page: Some(2),
        size: Some(10),
        sort: Some("name".to_string()),
        order: Some("asc".to_string()),
        ..Default::default()
    };
    let (events, total) = repo.events.get_paginated(&query).await.unwrap();

    assert_eq!(total, 25);
    let names: Vec<_> = events.iter().map(|e| e.name.clone()).collect();
    let expected: Vec<_> = (11..=20)
        .map(|i| format!("Annual Event {} {:02}", marker, i))
        .collect();
    assert_eq!(names, expected);
}

#[tokio::test]
#[ignore]
async fn test_substring_filter_is_case_insensitive() {
    let repo = repository().await;
    let marker = Uuid::new_v4().simple().to_string();
    let venue = create_venue(&repo, &format!("Venue {}", marker)).await;

    repo.events
        .create(&CreateEvent {
            venue_id: venue.id,
            name: format!("Annual Event {}", marker),
            description: "50% off_early".to_string(),
            date: NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
            time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        })
        .await
        .unwrap();

    let query = EventQuery {
        name: Some("EVE".to_string()),
        venue_id: Some(venue.id),
        ..Default::default()
    };
    let (events, total) = repo.events.get_paginated(&query).await.unwrap();
    assert_eq!(total, 1);
    assert!(events[0].name.starts_with("Annual Event"));

    // Wildcards in the filter value match literally
    let query = EventQuery {
        description: Some("%".to_string()),
        venue_id: Some(venue.id),
        ..Default::default()
    };
    assert_eq!(repo.events.get_paginated(&query).await.unwrap().1, 1);

    let query = EventQuery {
        description: Some("off%early".to_string()),
        venue_id: Some(venue.id),
        ..Default::default()
    };
    assert_eq!(repo.events.get_paginated(&query).await.unwrap().1, 0);
}

#[tokio::test]
#[ignore]
async fn test_missing_rows() {
    let repo = repository().await;

    assert!(matches!(
        repo.venues.get_by_id(&i64::MAX).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        repo.events.update(&i64::MAX, &UpdateEvent::default()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        repo.venues.delete(&i64::MAX).await,
        Err(AppError::NotFound(_))
    ));

    let query = VenueQuery {
        id: Some(i64::MAX),
        ..Default::default()
    };
    let (venues, total) = repo.venues.get_paginated(&query).await.unwrap();
    assert!(venues.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
#[ignore]
async fn test_update_refreshes_timestamp() {
    let repo = repository().await;
    let venue = create_venue(&repo, "Timestamp Hall").await;

    let created = repo
        .events
        .create(&CreateEvent {
            venue_id: venue.id,
            name: "Before".to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2030, 2, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        })
        .await
        .unwrap();

    let after = repo
        .events
        .update(
            &created.id,
            &UpdateEvent {
                name: Some("After".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(after.name, "After");
    assert_eq!(after.date, created.date);
    assert!(after.updated_at >= created.updated_at);
}

async fn create_event(repo: &Repository, venue: &Venue, name: &str) -> Event {
    repo.events
        .create(&CreateEvent {
            venue_id: venue.id,
            name: name.to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2030, 9, 1).unwrap(),
            time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        })
        .await
        .expect("Failed to create event")
}

async fn issue(repo: &Repository, event: &Event, ticket_type: TicketType, count: i64) -> Vec<Ticket> {
    repo.tickets
        .issue(&CreateTicket {
            event_id: event.id,
            price: Decimal::new(2500, 2),
            ticket_type,
            count,
        })
        .await
        .expect("Failed to issue tickets")
}

#[tokio::test]
#[ignore]
async fn test_issue_after_ticket_changes_type() {
    let repo = repository().await;
    let venue = create_venue(&repo, "Renumber Hall").await;
    let event = create_event(&repo, &venue, "Renumber Night").await;

    let vip = issue(&repo, &event, TicketType::Vip, 2).await;
    repo.tickets
        .update(
            vip[1].id,
            &UpdateTicket {
                ticket_type: Some(TicketType::Regular),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let next = issue(&repo, &event, TicketType::Vip, 1).await;
    assert_eq!(next[0].seat_number, "VIP-003");

    let regular = issue(&repo, &event, TicketType::Regular, 1).await;
    assert_eq!(regular[0].seat_number, "REG-001");
}

#[tokio::test]
#[ignore]
async fn test_moving_ticket_into_full_event() {
    let repo = repository().await;
    let venue = create_venue_with_capacity(&repo, "Tiny Room", 2).await;
    let full = create_event(&repo, &venue, "Sold Out Show").await;
    let other = create_event(&repo, &venue, "Quiet Show").await;

    issue(&repo, &full, TicketType::Regular, 2).await;
    let spare = issue(&repo, &other, TicketType::Regular, 1).await;

    let result = repo
        .tickets
        .update(
            spare[0].id,
            &UpdateTicket {
                event_id: Some(full.id),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = repo
        .tickets
        .update(
            spare[0].id,
            &UpdateTicket {
                event_id: Some(i64::MAX),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
#[ignore]
async fn test_venue_cannot_shrink_below_issued_tickets() {
    let repo = repository().await;
    let venue = create_venue_with_capacity(&repo, "Shrinking Hall", 5).await;
    let event = create_event(&repo, &venue, "Busy Night").await;
    issue(&repo, &event, TicketType::Vip, 3).await;

    let result = repo
        .venues
        .update_within_capacity(
            venue.id,
            &UpdateVenue {
                capacity: Some(2),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let venue = repo
        .venues
        .update_within_capacity(
            venue.id,
            &UpdateVenue {
                capacity: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(venue.capacity, 3);
}

#[tokio::test]
#[ignore]
async fn test_event_cannot_move_to_smaller_venue() {
    let repo = repository().await;
    let big = create_venue_with_capacity(&repo, "Big Hall", 10).await;
    let small = create_venue_with_capacity(&repo, "Small Hall", 2).await;
    let event = create_event(&repo, &big, "Moving Show").await;
    issue(&repo, &event, TicketType::Regular, 3).await;

    let result = repo
        .events
        .update_within_capacity(
            event.id,
            &UpdateEvent {
                venue_id: Some(small.id),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(repo.events.get_by_id(&event.id).await.unwrap().venue_id, big.id);
}

#[tokio::test]
#[ignore]
async fn test_sold_ticket_is_protected() {
    let repo = repository().await;
    let venue = create_venue(&repo, "Box Office").await;
    let event = create_event(&repo, &venue, "Premiere").await;
    let tickets = issue(&repo, &event, TicketType::Vip, 2).await;

    let buyer = repo
        .users
        .create(&NewUser {
            name: "Repo Buyer".to_string(),
            email: format!("repo-{}@example.com", Uuid::new_v4()),
            password_hash: "not-a-real-hash".to_string(),
            phone: None,
            role: Role::Buyer,
        })
        .await
        .unwrap();
    let order = repo
        .orders
        .create_with_tickets(buyer.id, &[tickets[0].id])
        .await
        .unwrap();
    assert_eq!(order.tickets.len(), 1);

    assert!(matches!(
        repo.tickets.delete_unsold(tickets[0].id).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        repo.tickets
            .update(
                tickets[0].id,
                &UpdateTicket {
                    price: Some(Decimal::new(1, 0)),
                    ..Default::default()
                },
            )
            .await,
        Err(AppError::Conflict(_))
    ));

    let relabelled = repo
        .tickets
        .update(
            tickets[0].id,
            &UpdateTicket {
                seat_number: Some("VIP-100".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(relabelled.order_id, Some(order.order.id));

    repo.tickets.delete_unsold(tickets[1].id).await.unwrap();
    assert!(matches!(
        repo.tickets.delete_unsold(tickets[1].id).await,
        Err(AppError::NotFound(_))
    ));
}
