lazy_static! {

    pub static ref HANDLER_SECS: prometheus::HistogramVec = register_histogram_vec!(
        "photofeed_handler_secs",
        "Seconds taken for each response, partitioned by endpoint name",
        &["endpoint_name"],
        vec![0.005, 0.025, 0.1, 0.5, 2.0, 8.0] // Prometheus buckets
    )
    .expect("couldn't make HANDLER_SECS");

    pub static ref RESPONSES: prometheus::IntCounterVec = register_int_counter_vec!(
        "photofeed_responses",
        "How many responses of Ok/Err per endpoint",
        &["endpoint_name", "result"]
    )
    .expect("couldn't make RESPONSES");

    pub static ref HTTP_RESPONSES: prometheus::IntCounterVec = register_int_counter_vec!(
        "photofeed_http_responses",
        "Count of each HTTP status code served by photofeed",
        &["status"]
    )
    .expect("couldn't make HTTP_RESPONSES");

    pub static ref FEED_SIZE: prometheus::Histogram = register_histogram!(
        "photofeed_feed_posts",
        "How many posts each feed request returned",
        vec![0.0, 1.0, 10.0, 50.0, 200.0, 1000.0]
    )
    .expect("couldn't make FEED_SIZE");

    pub static ref UPLOADED_BYTES: prometheus::IntCounter = register_int_counter!(
        "photofeed_uploaded_image_bytes",
        "Total bytes of images attached to created or edited posts"
    )
    .expect("couldn't make UPLOADED_BYTES");
}

pub mod endpoint {
    use actix_web::{http, HttpRequest, HttpResponse};
    use prometheus::Encoder;

    pub async fn gather(_req: HttpRequest) -> HttpResponse {
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = vec![];
        let metric_families = prometheus::gather();
        match encoder.encode(&metric_families, &mut buffer) {
            Ok(()) => HttpResponse::build(http::StatusCode::OK)
                .content_type(encoder.format_type())
                .body(buffer),
            Err(e) => {
                let message = format!("{:?}", e);
                HttpResponse::build(http::StatusCode::INTERNAL_SERVER_ERROR).body(message)
            }
        }
    }
}
