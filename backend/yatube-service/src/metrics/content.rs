use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

lazy_static! {
    /// HTTP requests by method, route pattern and status.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "yatube_http_requests_total",
        "Total HTTP requests segmented by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register yatube_http_requests_total");

    /// HTTP request latency by method and route pattern.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "yatube_http_request_duration_seconds",
        "HTTP request duration segmented by method and route",
        &["method", "route"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("failed to register yatube_http_request_duration_seconds");

    /// Successful writes by kind (post_created, post_edited, ...).
    pub static ref CONTENT_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "yatube_content_writes_total",
        "Content writes segmented by kind",
        &["kind"]
    )
    .expect("failed to register yatube_content_writes_total");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentWrite {
    PostCreated,
    PostEdited,
    CommentCreated,
    UserSignedUp,
}

impl ContentWrite {
    fn label(self) -> &'static str {
        match self {
            ContentWrite::PostCreated => "post_created",
            ContentWrite::PostEdited => "post_edited",
            ContentWrite::CommentCreated => "comment_created",
            ContentWrite::UserSignedUp => "user_signed_up",
        }
    }
}

pub fn record_content_write(kind: ContentWrite) {
    CONTENT_WRITES_TOTAL.with_label_values(&[kind.label()]).inc();
}

pub fn record_http_request(method: &str, route: &str, status: u16, elapsed_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route])
        .observe(elapsed_secs);
}
