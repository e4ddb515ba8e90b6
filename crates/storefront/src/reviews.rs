//! Product reviews: the list under a product and the form that posts one.
//!
//! The form is validated locally (a star rating must be picked, the comment
//! must not be blank, the user must be signed in) before anything is sent.
//! After a review is accepted the whole list is re-read.

use crate::confirm::ActionOutcome;
use crate::guard::ProcessingGuard;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storefront_core::{
    average_rating, ApiError, ErrorKind, NewReview, ProductId, Review, Session, SharedBackend,
    RATING_RANGE,
};
use tracing::{info, instrument, warn};

pub const SUBMIT_FAILED: &str = "Có lỗi xảy ra khi gửi đánh giá.";
pub const NOT_PURCHASED: &str = "Bạn chỉ được đánh giá sau khi đã mua và nhận hàng thành công!";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReviewError {
    #[error("Vui lòng chọn số sao đánh giá!")]
    MissingRating,
    #[error("Invalid rating: {0}")]
    InvalidRating(u8),
    #[error("Vui lòng nhập nội dung đánh giá.")]
    EmptyComment,
    #[error("Bạn cần đăng nhập để đánh giá.")]
    NotSignedIn,
    #[error("No product loaded")]
    NoProduct,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::Api(e) => e.kind(),
            _ => ErrorKind::Local,
        }
    }
}

#[derive(Debug, Default)]
struct ReviewState {
    product_id: Option<ProductId>,
    reviews: Vec<Review>,
    error: Option<String>,
}

pub struct Reviews {
    backend: SharedBackend,
    session: Arc<Session>,
    state: Mutex<ReviewState>,
    submitting: AtomicBool,
}

impl Reviews {
    pub fn new(backend: SharedBackend, session: Arc<Session>) -> Self {
        Self {
            backend,
            session,
            state: Mutex::new(ReviewState::default()),
            submitting: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, ReviewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the reviews of `product_id` and makes it the reviewed product.
    #[instrument(skip(self))]
    pub async fn load(&self, product_id: ProductId) -> Result<Vec<Review>, ReviewError> {
        let reviews = self.backend.list_reviews(product_id).await?;
        info!(count = reviews.len(), "Reviews loaded");

        let mut state = self.state();
        if state.product_id != Some(product_id) {
            state.error = None;
        }
        state.product_id = Some(product_id);
        state.reviews = reviews.clone();
        Ok(reviews)
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.state().reviews.clone()
    }

    pub fn average_rating(&self) -> Option<f64> {
        average_rating(&self.state().reviews)
    }

    /// The message shown above the form after a refused or failed submit.
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Posts a review for the loaded product, then re-reads the list.
    ///
    /// Local refusals and backend failures both set [`error`](Self::error); a
    /// `403` means the product has not been delivered to this user yet.
    #[instrument(skip(self, comment))]
    pub async fn submit(&self, rating: u8, comment: &str) -> Result<ActionOutcome, ReviewError> {
        let product_id = match self.validate(rating, comment) {
            Ok(product_id) => product_id,
            Err(e) => {
                self.state().error = Some(e.to_string());
                return Err(e);
            }
        };
        let Some(_guard) = ProcessingGuard::acquire(&self.submitting) else {
            return Ok(ActionOutcome::Busy);
        };
        self.state().error = None;

        let review = NewReview {
            product_id,
            rating,
            comment: comment.trim().to_string(),
        };
        match self.backend.create_review(review).await {
            Ok(created) => {
                info!(review_id = %created.id, %product_id, "Review posted");
                if let Err(e) = self.load(product_id).await {
                    warn!(error = %e, "Reload after review failed");
                }
                Ok(ActionOutcome::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Review rejected");
                let message = match &e {
                    ApiError::Rejected { status: 403, .. } => NOT_PURCHASED,
                    other => other.backend_message().unwrap_or(SUBMIT_FAILED),
                };
                self.state().error = Some(message.to_string());
                Err(e.into())
            }
        }
    }

    fn validate(&self, rating: u8, comment: &str) -> Result<ProductId, ReviewError> {
        let product_id = self.state().product_id.ok_or(ReviewError::NoProduct)?;
        if rating == 0 {
            return Err(ReviewError::MissingRating);
        }
        if !RATING_RANGE.contains(&rating) {
            return Err(ReviewError::InvalidRating(rating));
        }
        if comment.trim().is_empty() {
            return Err(ReviewError::EmptyComment);
        }
        if self.session.token().is_none() {
            return Err(ReviewError::NotSignedIn);
        }
        Ok(product_id)
    }
}
