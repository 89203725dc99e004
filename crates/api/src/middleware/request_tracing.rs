use tower_http::trace::TraceLayer;

/// Build the tracing layer that logs every request/response pair, including
/// the rejected filter queries the entity routes turn into 400s.
pub fn trace_layer(
) -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>>
{
    TraceLayer::new_for_http()
}
