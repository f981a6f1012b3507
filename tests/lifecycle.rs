mod common;

use sea_orm::EntityTrait;

use parcel_delivery_backend::entities::booking::{self, BookingStatus};
use parcel_delivery_backend::entities::file::FileKind;
use parcel_delivery_backend::lifecycle::{BookingManager, BookingRequest, Upload};
use parcel_delivery_backend::{Actor, AppError};

use common::*;

#[tokio::test]
async fn test_create_accept_advance_scenario() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;
    let quinn = provider(&db, "Quinn").await;

    let created = bookings
        .create(alice, request_at(service_id, (6.9271, 79.8612), (6.9049, 79.8540)))
        .await
        .unwrap();
    assert_eq!(created.status, BookingStatus::Pending);
    assert_eq!(created.provider_id, None);
    assert_eq!(created.customer_id, alice.id());
    assert_eq!(created.service.as_ref().map(|s| s.id), Some(service_id));
    assert!(created.nearby_bookings.is_none());

    let accepted = bookings.accept(pat, created.id).await.unwrap();
    assert_eq!(accepted.status, BookingStatus::Accepted);
    assert_eq!(accepted.provider_id, Some(pat.id()));
    assert_eq!(accepted.nearby_bookings.as_deref().map(<[_]>::len), Some(0));

    let err = bookings
        .advance_status(pat, created.id, BookingStatus::Started)
        .await
        .unwrap_err();
    match &err {
        AppError::InvalidTransition { current, allowed } => {
            assert_eq!(*current, BookingStatus::Accepted);
            assert_eq!(allowed, &vec![BookingStatus::OnTheWay]);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
    assert!(err.to_string().contains("on_the_way"));

    let moving = bookings
        .advance_status(pat, created.id, BookingStatus::OnTheWay)
        .await
        .unwrap();
    assert_eq!(moving.status, BookingStatus::OnTheWay);

    let err = bookings.accept(quinn, created.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotAvailable));
}

#[tokio::test]
async fn test_create_requires_customer_and_fields() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;

    let err = bookings
        .create(pat, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = bookings
        .create(alice, BookingRequest::default())
        .await
        .unwrap_err();
    match err {
        AppError::Validation(message) => {
            assert!(message.contains("service_id"));
            assert!(message.contains("drop_lng"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = bookings
        .create(alice, request_at(service_id + 100, ORIGIN, ORIGIN))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_concurrent_accepts_have_one_winner() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;
    let quinn = provider(&db, "Quinn").await;

    let created = bookings
        .create(alice, request_at(service_id, ORIGIN, north_of(ORIGIN, 3.0)))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        bookings.accept(pat, created.id),
        bookings.accept(quinn, created.id)
    );

    let winners: Vec<_> = [&first, &second].into_iter().filter(|r| r.is_ok()).collect();
    assert_eq!(winners.len(), 1);
    let loser = if first.is_ok() { &second } else { &first };
    assert!(matches!(loser, Err(AppError::NotAvailable)));

    let stored = booking::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, BookingStatus::Accepted);
    let winner = if first.is_ok() { pat } else { quinn };
    assert_eq!(stored.provider_id, Some(winner.id()));
}

#[tokio::test]
async fn test_transition_table_is_enforced_for_every_status() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;

    let created = bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();
    bookings.accept(pat, created.id).await.unwrap();

    let pipeline = [
        (BookingStatus::Accepted, BookingStatus::OnTheWay),
        (BookingStatus::OnTheWay, BookingStatus::Started),
        (BookingStatus::Started, BookingStatus::Delivered),
        (BookingStatus::Delivered, BookingStatus::Handover),
        (BookingStatus::Handover, BookingStatus::Completed),
    ];

    for (current, next) in pipeline {
        for requested in [
            BookingStatus::Pending,
            BookingStatus::Accepted,
            BookingStatus::OnTheWay,
            BookingStatus::Started,
            BookingStatus::Delivered,
            BookingStatus::Handover,
            BookingStatus::Completed,
            BookingStatus::Rejected,
        ] {
            if requested == next {
                continue;
            }
            let err = bookings
                .advance_status(pat, created.id, requested)
                .await
                .unwrap_err();
            assert!(
                matches!(err, AppError::InvalidTransition { current: c, .. } if c == current),
                "{current} -> {requested} should be refused"
            );
        }

        let moved = bookings.advance_status(pat, created.id, next).await.unwrap();
        assert_eq!(moved.status, next);
    }

    let err = bookings
        .advance_status(pat, created.id, BookingStatus::Completed)
        .await
        .unwrap_err();
    match err {
        AppError::InvalidTransition { current, allowed } => {
            assert_eq!(current, BookingStatus::Completed);
            assert!(allowed.is_empty());
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[tokio::test]
async fn test_only_the_holder_may_advance() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;
    let quinn = provider(&db, "Quinn").await;

    let created = bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();

    // Unclaimed bookings belong to nobody
    let err = bookings
        .advance_status(pat, created.id, BookingStatus::OnTheWay)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    bookings.accept(pat, created.id).await.unwrap();
    let err = bookings
        .advance_status(quinn, created.id, BookingStatus::OnTheWay)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = bookings
        .advance_status(pat, uuid::Uuid::new_v4(), BookingStatus::OnTheWay)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_reject_resets_booking_for_another_provider() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;
    let quinn = provider(&db, "Quinn").await;

    let created = bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();
    bookings.accept(pat, created.id).await.unwrap();
    bookings
        .advance_status(pat, created.id, BookingStatus::OnTheWay)
        .await
        .unwrap();

    let err = bookings.reject(quinn, created.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    bookings.reject(pat, created.id).await.unwrap();

    let stored = booking::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, BookingStatus::Pending);
    assert_eq!(stored.provider_id, None);
    assert!(stored.updated_at >= created.updated_at.fixed_offset());

    let reclaimed = bookings.accept(quinn, created.id).await.unwrap();
    assert_eq!(reclaimed.provider_id, Some(quinn.id()));

    // The original holder lost it
    let err = bookings.reject(pat, created.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_nearby_respects_radius() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;
    let wide = BookingManager::new(db.clone(), 10.0, scratch_dir());
    let narrow = BookingManager::new(db.clone(), 1.0, scratch_dir());

    let far_drop = north_of(ORIGIN, 50.0);
    let first = wide
        .create(alice, request_at(service_id, ORIGIN, far_drop))
        .await
        .unwrap();
    let second = wide
        .create(alice, request_at(service_id, north_of(ORIGIN, 2.0), far_drop))
        .await
        .unwrap();

    let route = wide.nearby_for_route(pat, first.id).await.unwrap();
    assert_eq!(route.current_booking.id, first.id);
    let ids: Vec<_> = route.nearby_bookings.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![second.id]);
    assert_eq!(
        route.nearby_bookings[0].customer.as_ref().map(|c| c.id),
        Some(alice.id())
    );

    let route = narrow.nearby_for_route(pat, first.id).await.unwrap();
    assert!(route.nearby_bookings.is_empty());
}

#[tokio::test]
async fn test_nearby_matches_on_drop_point() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;

    let reference = bookings
        .create(alice, request_at(service_id, ORIGIN, north_of(ORIGIN, 40.0)))
        .await
        .unwrap();
    let drop_nearby = bookings
        .create(
            alice,
            request_at(service_id, north_of(ORIGIN, 80.0), north_of(ORIGIN, 4.0)),
        )
        .await
        .unwrap();
    bookings
        .create(
            alice,
            request_at(service_id, north_of(ORIGIN, 80.0), north_of(ORIGIN, 90.0)),
        )
        .await
        .unwrap();

    let accepted = bookings.accept(pat, reference.id).await.unwrap();
    let ids: Vec<_> = accepted
        .nearby_bookings
        .unwrap()
        .iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(ids, vec![drop_nearby.id]);
}

#[tokio::test]
async fn test_nearby_for_route_forbidden_for_other_provider() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;
    let quinn = provider(&db, "Quinn").await;

    let created = bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();

    // Still pending: any provider may look
    assert!(bookings.nearby_for_route(quinn, created.id).await.is_ok());

    bookings.accept(pat, created.id).await.unwrap();
    let err = bookings.nearby_for_route(quinn, created.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(bookings.nearby_for_route(pat, created.id).await.is_ok());

    let err = bookings.nearby_for_route(alice, created.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_list_for_actor_is_scoped_and_newest_first() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let bob = customer(&db, "Bob").await;
    let pat = provider(&db, "Pat").await;
    let root = admin(&db).await;

    let older = bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let bobs = bookings
        .create(bob, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();

    let ids = |list: Vec<parcel_delivery_backend::lifecycle::BookingView>| {
        list.into_iter().map(|b| b.id).collect::<Vec<_>>()
    };

    assert_eq!(
        ids(bookings.list_for_actor(alice).await.unwrap()),
        vec![newer.id, older.id]
    );
    assert_eq!(ids(bookings.list_for_actor(bob).await.unwrap()), vec![bobs.id]);
    assert!(bookings.list_for_actor(pat).await.unwrap().is_empty());
    assert_eq!(
        ids(bookings.list_for_actor(root).await.unwrap()),
        vec![bobs.id, newer.id, older.id]
    );

    bookings.accept(pat, older.id).await.unwrap();
    assert_eq!(ids(bookings.list_for_actor(pat).await.unwrap()), vec![older.id]);

    // The pending pool drops claimed bookings
    assert_eq!(
        ids(bookings.list_pending(pat).await.unwrap()),
        vec![bobs.id, newer.id]
    );
    let err = bookings.list_pending(alice).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_get_by_id_permissions_and_enrichment() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let bob = customer(&db, "Bob").await;
    let pat = provider(&db, "Pat").await;
    let quinn = provider(&db, "Quinn").await;
    let root = admin(&db).await;

    let created = bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();
    let neighbour = bookings
        .create(bob, request_at(service_id, north_of(ORIGIN, 1.5), ORIGIN))
        .await
        .unwrap();

    assert!(bookings.get_by_id(alice, created.id).await.is_ok());
    assert!(bookings.get_by_id(root, created.id).await.is_ok());
    assert!(matches!(
        bookings.get_by_id(bob, created.id).await,
        Err(AppError::Forbidden(_))
    ));
    // Unclaimed bookings are only visible to providers through the pending pool
    assert!(matches!(
        bookings.get_by_id(pat, created.id).await,
        Err(AppError::Forbidden(_))
    ));

    bookings.accept(pat, created.id).await.unwrap();

    let seen = bookings.get_by_id(pat, created.id).await.unwrap();
    assert_eq!(seen.provider.as_ref().map(|p| p.id), Some(pat.id()));
    let nearby: Vec<_> = seen
        .nearby_bookings
        .unwrap()
        .iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(nearby, vec![neighbour.id]);

    // Customers never get the enrichment
    let seen = bookings.get_by_id(alice, created.id).await.unwrap();
    assert!(seen.nearby_bookings.is_none());

    assert!(matches!(
        bookings.get_by_id(quinn, created.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        bookings.get_by_id(root, uuid::Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_get_by_id_skips_enrichment_once_completed() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;

    let created = bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();
    bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();

    bookings.accept(pat, created.id).await.unwrap();
    for next in [
        BookingStatus::OnTheWay,
        BookingStatus::Started,
        BookingStatus::Delivered,
        BookingStatus::Handover,
        BookingStatus::Completed,
    ] {
        bookings.advance_status(pat, created.id, next).await.unwrap();
    }

    let seen = bookings.get_by_id(pat, created.id).await.unwrap();
    assert_eq!(seen.status, BookingStatus::Completed);
    assert!(seen.nearby_bookings.is_none());
}

#[tokio::test]
async fn test_attach_file_rules() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let upload_dir = scratch_dir();
    let bookings = BookingManager::new(db.clone(), 10.0, upload_dir.clone());
    let alice = customer(&db, "Alice").await;
    let pat = provider(&db, "Pat").await;
    let quinn = provider(&db, "Quinn").await;

    let photo = || {
        Some(Upload {
            file_name: "proof photo.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8, 0xff],
        })
    };

    let err = bookings
        .attach_file(pat, uuid::Uuid::new_v4(), photo())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let created = bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();
    bookings.accept(pat, created.id).await.unwrap();

    let err = bookings
        .attach_file(quinn, created.id, photo())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = bookings.attach_file(pat, created.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let record = bookings
        .attach_file(pat, created.id, photo())
        .await
        .unwrap();
    assert_eq!(record.kind, FileKind::Image);
    assert!(record.file_url.starts_with("/uploads/"));
    assert!(record.file_url.ends_with("-proof_photo.jpg"));

    let stored_name = record.file_url.trim_start_matches("/uploads/");
    let written = tokio::fs::read(upload_dir.join(stored_name)).await.unwrap();
    assert_eq!(written, vec![0xff, 0xd8, 0xff]);

    let slip = bookings
        .attach_file(
            pat,
            created.id,
            Some(Upload {
                file_name: "slip.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: b"%PDF-1.4".to_vec(),
            }),
        )
        .await
        .unwrap();
    assert_eq!(slip.kind, FileKind::Document);

    let seen = bookings.get_by_id(alice, created.id).await.unwrap();
    assert_eq!(seen.files.len(), 2);

    let _ = tokio::fs::remove_dir_all(&upload_dir).await;
}

#[tokio::test]
async fn test_customer_cannot_claim() {
    let db = setup_db().await;
    let service_id = seed_service(&db).await;
    let bookings = manager(&db);
    let alice = customer(&db, "Alice").await;

    let created = bookings
        .create(alice, request_at(service_id, ORIGIN, ORIGIN))
        .await
        .unwrap();

    let as_customer: Actor = alice;
    assert!(matches!(
        bookings.accept(as_customer, created.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        bookings.accept(provider(&db, "Pat").await, uuid::Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));
}
