use chrono::NaiveDate;
use std::sync::Arc;
use storefront::{ActionOutcome, ReviewError, Reviews};
use storefront_core::mock::MockBackend;
use storefront_core::{
    ApiError, ErrorKind, ProductId, Review, ReviewId, Role, Session, SessionUser,
};

const PRODUCT: ProductId = ProductId(3);

fn review(id: u64, rating: u8) -> Review {
    Review {
        id: ReviewId(id),
        username: "lan".into(),
        rating,
        comment: "Gỗ đẹp, giao nhanh".into(),
        created_at: NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
    }
}

fn customer_session() -> Arc<Session> {
    let session = Session::anonymous();
    session
        .login("jwt", SessionUser::new(1, "khach@example.com", Role::User))
        .unwrap();
    Arc::new(session)
}

async fn loaded(mock: &MockBackend, session: Arc<Session>) -> Reviews {
    mock.expect_list_reviews(PRODUCT).return_ok(vec![review(1, 5)]);
    let reviews = Reviews::new(Arc::new(mock.backend()), session);
    reviews.load(PRODUCT).await.unwrap();
    reviews
}

#[tokio::test]
async fn test_submit_refetches_the_list() {
    let mock = MockBackend::new();
    let reviews = loaded(&mock, customer_session()).await;
    assert_eq!(reviews.average_rating(), Some(5.0));

    mock.expect_create_review(PRODUCT).return_ok(review(2, 4));
    mock.expect_list_reviews(PRODUCT)
        .return_ok(vec![review(1, 5), review(2, 4)]);

    assert_eq!(
        reviews.submit(4, "  Gỗ đẹp, giao nhanh ").await.unwrap(),
        ActionOutcome::Applied
    );
    assert_eq!(reviews.reviews().len(), 2);
    assert_eq!(reviews.average_rating(), Some(4.5));
    assert_eq!(reviews.error(), None);
    assert!(!reviews.is_submitting());
    assert_eq!(
        mock.routes(),
        vec![
            "GET /reviews/product/3",
            "POST /reviews",
            "GET /reviews/product/3"
        ]
    );
    mock.verify();
}

#[tokio::test]
async fn test_invalid_form_is_refused_before_sending() {
    let mock = MockBackend::new();
    let reviews = loaded(&mock, customer_session()).await;

    // 1. No star picked
    assert_eq!(
        reviews.submit(0, "Đẹp").await,
        Err(ReviewError::MissingRating)
    );
    assert_eq!(reviews.error().as_deref(), Some("Vui lòng chọn số sao đánh giá!"));

    // 2. Out of range
    assert_eq!(
        reviews.submit(6, "Đẹp").await,
        Err(ReviewError::InvalidRating(6))
    );

    // 3. Blank comment
    assert_eq!(
        reviews.submit(5, "   ").await,
        Err(ReviewError::EmptyComment)
    );
    assert_eq!(ReviewError::EmptyComment.kind(), ErrorKind::Local);

    assert_eq!(mock.routes(), vec!["GET /reviews/product/3"]);
    mock.verify();
}

#[tokio::test]
async fn test_signed_out_and_unloaded_are_refused() {
    let mock = MockBackend::new();
    let reviews = loaded(&mock, Arc::new(Session::anonymous())).await;
    assert_eq!(
        reviews.submit(5, "Đẹp").await,
        Err(ReviewError::NotSignedIn)
    );
    assert_eq!(
        reviews.error().as_deref(),
        Some("Bạn cần đăng nhập để đánh giá.")
    );

    let fresh = Reviews::new(Arc::new(mock.backend()), customer_session());
    assert_eq!(fresh.submit(5, "Đẹp").await, Err(ReviewError::NoProduct));
    mock.verify();
}

#[tokio::test]
async fn test_forbidden_means_not_delivered_yet() {
    let mock = MockBackend::new();
    let reviews = loaded(&mock, customer_session()).await;

    mock.expect_create_review(PRODUCT)
        .return_err(ApiError::rejected(403, "Forbidden"));
    let err = reviews.submit(5, "Đẹp").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationRejected);
    assert_eq!(
        reviews.error().as_deref(),
        Some("Bạn chỉ được đánh giá sau khi đã mua và nhận hàng thành công!")
    );
    assert_eq!(reviews.reviews().len(), 1);

    // Other rejections are shown verbatim, transport failures generically
    mock.expect_create_review(PRODUCT)
        .return_err(ApiError::bad_request("Bạn đã đánh giá sản phẩm này"));
    assert!(reviews.submit(5, "Đẹp").await.is_err());
    assert_eq!(
        reviews.error().as_deref(),
        Some("Bạn đã đánh giá sản phẩm này")
    );

    mock.expect_create_review(PRODUCT)
        .return_err(ApiError::Transport("reset".into()));
    assert!(reviews.submit(5, "Đẹp").await.is_err());
    assert_eq!(
        reviews.error().as_deref(),
        Some("Có lỗi xảy ra khi gửi đánh giá.")
    );
    mock.verify();
}
