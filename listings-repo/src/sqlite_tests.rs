//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use listings_types::{
        CorrelationRef, CorrelationStore, CreateListingRequest, DomainError, Listing, ListingId,
        ListingStore, PaymentRequest, PaymentStatus, RepoError, Resolution,
    };

    use crate::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn listing_req(name: &str) -> CreateListingRequest {
        CreateListingRequest {
            business_name: name.to_string(),
            category: "Salon".to_string(),
            city: "Nairobi".to_string(),
            description: "Braids and nails".to_string(),
            whatsapp: "+254 712 345 678".to_string(),
            image_url: None,
        }
    }

    async fn seed_listing(repo: &SqliteRepo) -> Listing {
        repo.create_listing(listing_req("Mama Njeri Salon"))
            .await
            .unwrap()
    }

    fn pending(listing_id: ListingId, n: u64) -> PaymentRequest {
        PaymentRequest::pending(
            CorrelationRef::for_listing(listing_id, n),
            listing_id,
            "254712345678".to_string(),
            50_000,
        )
    }

    #[tokio::test]
    async fn test_create_and_get_listing() {
        let repo = setup_repo().await;

        let created = seed_listing(&repo).await;
        let fetched = repo.get_listing(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.business_name, "Mama Njeri Salon");
        assert!(!fetched.verified);
        assert!(!fetched.featured);
    }

    #[tokio::test]
    async fn test_create_listing_rejects_blank_city() {
        let repo = setup_repo().await;
        let mut req = listing_req("Shop");
        req.city = "  ".to_string();

        let result = repo.create_listing(req).await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::ValidationError(_)))
        ));
    }

    #[tokio::test]
    async fn test_get_listing_not_found() {
        let repo = setup_repo().await;

        let result = repo.get_listing(ListingId::new()).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_set_featured_is_idempotent() {
        let repo = setup_repo().await;
        let listing = seed_listing(&repo).await;

        repo.set_featured(listing.id).await.unwrap();
        repo.set_featured(listing.id).await.unwrap();

        let fetched = repo.get_listing(listing.id).await.unwrap().unwrap();
        assert!(fetched.featured);
    }

    #[tokio::test]
    async fn test_set_featured_unknown_listing() {
        let repo = setup_repo().await;
        let id = ListingId::new();

        let result = repo.set_featured(id).await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::ListingNotFound(missing))) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_toggle_verified() {
        let repo = setup_repo().await;
        let listing = seed_listing(&repo).await;

        let once = repo.toggle_verified(listing.id).await.unwrap();
        assert!(once.verified);

        let twice = repo.toggle_verified(listing.id).await.unwrap();
        assert!(!twice.verified);
    }

    #[tokio::test]
    async fn test_create_payment_request_and_find() {
        let repo = setup_repo().await;
        let listing = seed_listing(&repo).await;
        let req = pending(listing.id, 1);

        repo.create_payment_request(&req).await.unwrap();
        let found = repo.find_by_ref(&req.correlation_ref).await.unwrap().unwrap();

        assert_eq!(found.correlation_ref, req.correlation_ref);
        assert_eq!(found.listing_id, listing.id);
        assert_eq!(found.status, PaymentStatus::Pending);
        assert_eq!(found.amount_minor_units, 50_000);
        assert!(found.checkout_request_id.is_none());
        assert!(found.resolved_at.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_correlation_ref_conflicts() {
        let repo = setup_repo().await;
        let listing = seed_listing(&repo).await;
        let req = pending(listing.id, 1);

        repo.create_payment_request(&req).await.unwrap();
        let result = repo.create_payment_request(&req).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_payment_request_requires_existing_listing() {
        let repo = setup_repo().await;
        let req = pending(ListingId::new(), 1);

        let result = repo.create_payment_request(&req).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_find_by_ref_unknown() {
        let repo = setup_repo().await;

        let result = repo
            .find_by_ref(&CorrelationRef::from("R-unknown-1"))
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_record_checkout_and_find_by_checkout_id() {
        let repo = setup_repo().await;
        let listing = seed_listing(&repo).await;
        let req = pending(listing.id, 1);
        repo.create_payment_request(&req).await.unwrap();

        repo.record_checkout(&req.correlation_ref, "ws_CO_123")
            .await
            .unwrap();
        let found = repo.find_by_checkout_id("ws_CO_123").await.unwrap().unwrap();

        assert_eq!(found.correlation_ref, req.correlation_ref);
        assert_eq!(found.checkout_request_id.as_deref(), Some("ws_CO_123"));
    }

    #[tokio::test]
    async fn test_record_checkout_unknown_ref() {
        let repo = setup_repo().await;

        let result = repo
            .record_checkout(&CorrelationRef::from("R-missing-1"), "ws_CO_1")
            .await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_swap() {
        let repo = setup_repo().await;
        let listing = seed_listing(&repo).await;
        let req = pending(listing.id, 1);
        repo.create_payment_request(&req).await.unwrap();

        let resolution = Resolution {
            result_code: Some(0),
            result_desc: Some("Processed".to_string()),
            receipt_number: Some("QKX123ABC".to_string()),
        };

        let first = repo
            .transition(
                &req.correlation_ref,
                PaymentStatus::Pending,
                PaymentStatus::Succeeded,
                resolution.clone(),
            )
            .await
            .unwrap();
        let second = repo
            .transition(
                &req.correlation_ref,
                PaymentStatus::Pending,
                PaymentStatus::Failed,
                Resolution::with_desc("late"),
            )
            .await
            .unwrap();

        assert!(first);
        assert!(!second);

        let stored = repo.find_by_ref(&req.correlation_ref).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Succeeded);
        assert_eq!(stored.receipt_number.as_deref(), Some("QKX123ABC"));
        assert_eq!(stored.result_code, Some(0));
        assert!(stored.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_transition_out_of_terminal_rejected() {
        let repo = setup_repo().await;

        let result = repo
            .transition(
                &CorrelationRef::from("R-x-1"),
                PaymentStatus::Succeeded,
                PaymentStatus::Failed,
                Resolution::default(),
            )
            .await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_concurrent_transitions_single_winner() {
        let repo = Arc::new(setup_repo().await);
        let listing = seed_listing(&repo).await;
        let req = pending(listing.id, 1);
        repo.create_payment_request(&req).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = Arc::clone(&repo);
            let cref = req.correlation_ref.clone();
            let to = if i % 2 == 0 {
                PaymentStatus::Succeeded
            } else {
                PaymentStatus::Expired
            };
            handles.push(tokio::spawn(async move {
                repo.transition(&cref, PaymentStatus::Pending, to, Resolution::default())
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_list_pending_before_cutoff() {
        let repo = setup_repo().await;
        let listing = seed_listing(&repo).await;
        let now = Utc::now();

        let mut old = pending(listing.id, 1);
        old.created_at = now - Duration::minutes(30);
        let mut older = pending(listing.id, 2);
        older.created_at = now - Duration::minutes(45);
        let fresh = pending(listing.id, 3);
        let mut resolved = pending(listing.id, 4);
        resolved.created_at = now - Duration::minutes(60);

        for req in [&old, &older, &fresh, &resolved] {
            repo.create_payment_request(req).await.unwrap();
        }
        repo.transition(
            &resolved.correlation_ref,
            PaymentStatus::Pending,
            PaymentStatus::Failed,
            Resolution::default(),
        )
        .await
        .unwrap();

        let stale = repo
            .list_pending_before(now - Duration::minutes(15), 10)
            .await
            .unwrap();

        let refs: Vec<_> = stale.iter().map(|r| r.correlation_ref.clone()).collect();
        assert_eq!(refs, vec![older.correlation_ref, old.correlation_ref]);
    }

    #[tokio::test]
    async fn test_list_pending_before_respects_limit() {
        let repo = setup_repo().await;
        let listing = seed_listing(&repo).await;
        let now = Utc::now();

        for n in 0..5 {
            let mut req = pending(listing.id, n);
            req.created_at = now - Duration::minutes(20 + n as i64);
            repo.create_payment_request(&req).await.unwrap();
        }

        let stale = repo.list_pending_before(now, 3).await.unwrap();

        assert_eq!(stale.len(), 3);
    }

    #[tokio::test]
    async fn test_list_for_listing_newest_first() {
        let repo = setup_repo().await;
        let listing = seed_listing(&repo).await;
        let other = repo.create_listing(listing_req("Other")).await.unwrap();
        let now = Utc::now();

        let mut first = pending(listing.id, 1);
        first.created_at = now - Duration::minutes(10);
        let second = pending(listing.id, 2);
        let unrelated = pending(other.id, 3);

        for req in [&first, &second, &unrelated] {
            repo.create_payment_request(req).await.unwrap();
        }

        let history = repo.list_for_listing(listing.id).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].correlation_ref, second.correlation_ref);
        assert_eq!(history[1].correlation_ref, first.correlation_ref);
    }
}
