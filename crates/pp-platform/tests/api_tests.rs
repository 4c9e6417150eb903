//! Platform API Integration Tests
//!
//! Tests for domain models, the admin gate contract, the payment workflow,
//! and error handling.

use pp_platform::{Product, ProductStatus, User, UserRole, Review, Report, Coupon, Payment};
use pp_platform::TsidGenerator;

// Unit tests for domain models
mod domain_tests {
    use super::*;

    #[test]
    fn test_submission_enters_moderation_queue() {
        let product = Product::new("Rustify", "maker@example.com");
        assert_eq!(product.status, ProductStatus::Pending);
        assert!(!product.is_featured);
        assert_eq!(product.upvotes, 0);
        assert!(product.voters.is_empty());
    }

    #[test]
    fn test_moderation_lifecycle() {
        let mut product = Product::new("Rustify", "maker@example.com");

        product.set_status(ProductStatus::Approved);
        assert!(product.is_featured, "approval features the product");

        product.set_status(ProductStatus::Rejected);
        assert!(!product.is_featured, "rejection clears the featured flag");

        product.set_status(ProductStatus::Pending);
        assert!(!product.is_featured);
    }

    #[test]
    fn test_product_builder_fields() {
        let product = Product::new("Rustify", "maker@example.com")
            .with_description("Turns anything into Rust")
            .with_image_url("https://img.example.com/rustify.png")
            .with_external_link("https://rustify.example.com")
            .with_tags(vec!["devtools".into(), "rust".into()]);

        assert_eq!(product.description.as_deref(), Some("Turns anything into Rust"));
        assert_eq!(product.tags.len(), 2);
        assert_eq!(product.owner_email, "maker@example.com");
    }

    #[test]
    fn test_voter_ledger_consistency() {
        let mut product = Product::new("Rustify", "maker@example.com");
        product.voters.push("a@example.com".to_string());
        product.voters.push("b@example.com".to_string());
        product.upvotes = 2;
        assert!(product.voters_consistent());

        // A count that drifts from the voter set is a broken ledger.
        product.upvotes = 3;
        assert!(!product.voters_consistent());
    }

    #[test]
    fn test_user_starts_as_member() {
        let user = User::new("new@example.com");
        assert_eq!(user.role, UserRole::User);
        assert!(!user.role.is_admin());
        assert!(!user.is_subscribed);
    }

    #[test]
    fn test_review_builder() {
        let product_id = TsidGenerator::generate();
        let review = Review::new(&product_id, "Ada", 5)
            .with_description("Exactly what I needed");
        assert_eq!(review.product_id, product_id);
        assert_eq!(review.rating, 5);
        assert_eq!(review.description.as_deref(), Some("Exactly what I needed"));
    }

    #[test]
    fn test_report_references_product() {
        let product_id = TsidGenerator::generate();
        let report = Report::new(&product_id, "watcher@example.com");
        assert_eq!(report.product_id, product_id);
        assert_eq!(report.reporter_email, "watcher@example.com");
    }

    #[test]
    fn test_coupon_builder() {
        let coupon = Coupon::new("SAVE25", 25.0)
            .with_description("Launch week discount");
        assert_eq!(coupon.code, "SAVE25");
        assert_eq!(coupon.discount_percent, 25.0);
        assert!(coupon.expires_at.is_none());
    }

    #[test]
    fn test_payment_with_coupon() {
        let payment = Payment::new("payer@example.com", 7500, "pi_123")
            .with_coupon("SAVE25", 25.0);
        assert_eq!(payment.amount, 7500);
        assert_eq!(payment.coupon.as_deref(), Some("SAVE25"));
        assert_eq!(payment.discount_percent, Some(25.0));
    }

    #[test]
    fn test_entity_json_uses_camel_case() {
        let product = Product::new("Rustify", "maker@example.com");
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("ownerEmail").is_some());
        assert!(json.get("isFeatured").is_some());
        assert!(json.get("owner_email").is_none());
    }
}

// Identifier tests
mod tsid_tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid() {
        for _ in 0..100 {
            let id = TsidGenerator::generate();
            assert_eq!(id.len(), 13);
            assert!(TsidGenerator::is_valid(&id));
        }
    }

    #[test]
    fn test_malformed_ids_are_rejected() {
        for bad in ["", "short", "0123456789ABCDEF", "{$ne: null}", "0HZXEQ5Y8JY5!"] {
            assert!(!TsidGenerator::is_valid(bad), "{:?} must be rejected", bad);
        }
    }
}

// Token verification tests
mod auth_tests {
    use pp_platform::{AuthService, AuthConfig, PlatformError};
    use pp_platform::auth::auth_service::extract_bearer_token;

    #[test]
    fn test_token_round_trip_carries_email() {
        let service = AuthService::new(AuthConfig::default());
        let token = service.generate_token("maker@example.com").unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.email(), "maker@example.com");
    }

    #[test]
    fn test_cross_issuer_tokens_rejected() {
        let other = AuthService::new(AuthConfig {
            issuer: "someone-else".to_string(),
            ..AuthConfig::default()
        });
        let ours = AuthService::new(AuthConfig::default());

        let token = other.generate_token("maker@example.com").unwrap();
        assert!(ours.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_distinct_from_invalid() {
        // Expiry must clear the verifier's default 60s clock-skew leeway.
        let service = AuthService::new(AuthConfig {
            access_token_expiry_secs: -120,
            ..AuthConfig::default()
        });
        let token = service.generate_token("maker@example.com").unwrap();
        assert!(matches!(
            service.validate_token(&token).unwrap_err(),
            PlatformError::TokenExpired
        ));
    }

    #[test]
    fn test_bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer tok"), Some("tok"));
        assert_eq!(extract_bearer_token("bearer tok"), None);
        assert_eq!(extract_bearer_token("tok"), None);
    }
}

// Payment workflow tests against a scripted gateway
mod payment_workflow_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pp_platform::{
        PaymentGateway, PaymentService, ChargeIntent, GatewayCoupon, PlatformError,
    };
    use pp_platform::Result;

    struct ScriptedGateway {
        coupon: Option<GatewayCoupon>,
        fail_coupon_lookup: bool,
        intent_calls: AtomicUsize,
    }

    impl ScriptedGateway {
        fn new(coupon: Option<GatewayCoupon>) -> Self {
            Self { coupon, fail_coupon_lookup: false, intent_calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { coupon: None, fail_coupon_lookup: true, intent_calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl PaymentGateway for ScriptedGateway {
        async fn create_charge_intent(&self, amount_cents: i64) -> Result<ChargeIntent> {
            self.intent_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChargeIntent { client_secret: format!("secret_{}", amount_cents) })
        }

        async fn retrieve_coupon(&self, _code: &str) -> Result<Option<GatewayCoupon>> {
            if self.fail_coupon_lookup {
                return Err(PlatformError::upstream("gateway unreachable"));
            }
            Ok(self.coupon.clone())
        }
    }

    #[tokio::test]
    async fn test_invalid_coupon_blocks_intent() {
        let gateway = Arc::new(ScriptedGateway::new(Some(GatewayCoupon {
            valid: false,
            percent_off: Some(50.0),
        })));
        let service = PaymentService::new(gateway.clone());

        let err = service.create_charge_intent(2000, Some("DEAD")).await.unwrap_err();
        assert!(matches!(err, PlatformError::InvalidCoupon { .. }));
        assert_eq!(gateway.intent_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_discount_applied_before_intent() {
        let gateway = Arc::new(ScriptedGateway::new(Some(GatewayCoupon {
            valid: true,
            percent_off: Some(50.0),
        })));
        let service = PaymentService::new(gateway.clone());

        let intent = service.create_charge_intent(2000, Some("HALF")).await.unwrap();
        assert_eq!(intent.client_secret, "secret_1000");
    }

    #[tokio::test]
    async fn test_validation_swallows_gateway_outage() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let service = PaymentService::new(gateway);

        let result = service.validate_coupon("ANY").await;
        assert!(!result.valid);
        assert!(result.discount_percent.is_none());
    }

    #[tokio::test]
    async fn test_outage_during_intent_coupon_check_is_rejected() {
        // An unreachable gateway makes the coupon unverifiable; the intent
        // must not be created on an unverified discount.
        let gateway = Arc::new(ScriptedGateway::failing());
        let service = PaymentService::new(gateway.clone());

        assert!(service.create_charge_intent(2000, Some("HALF")).await.is_err());
        assert_eq!(gateway.intent_calls.load(Ordering::SeqCst), 0);
    }
}

// Error taxonomy tests
mod error_tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use pp_platform::PlatformError;

    fn status_of(err: PlatformError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(PlatformError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(PlatformError::invalid_coupon("X")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(PlatformError::unauthorized("x")), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(PlatformError::forbidden("x")), StatusCode::FORBIDDEN);
        assert_eq!(status_of(PlatformError::not_found("Product", "x")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(PlatformError::duplicate("User", "email", "a@x.com")),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(PlatformError::upstream("x")), StatusCode::BAD_GATEWAY);
        assert_eq!(status_of(PlatformError::internal("x")), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// Analytics parameter tests
mod analytics_tests {
    use pp_platform::stats::{Metric, Range};

    #[test]
    fn test_metric_parsing() {
        assert_eq!(Metric::parse("revenue").unwrap(), Metric::Revenue);
        assert_eq!(Metric::parse("products").unwrap(), Metric::Products);
        assert_eq!(Metric::parse("users").unwrap(), Metric::Users);
        assert!(Metric::parse("Revenue").is_err());
    }

    #[test]
    fn test_range_windows() {
        assert_eq!(Range::parse("week").unwrap().days(), 7);
        assert_eq!(Range::parse("month").unwrap().days(), 30);
        assert_eq!(Range::parse("year").unwrap().days(), 365);
        assert!(Range::parse("decade").is_err());
    }
}
