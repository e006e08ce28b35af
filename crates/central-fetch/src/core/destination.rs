use url::Url;

/// Key under which rate-limit bookkeeping for `url` is tracked.
///
/// This is the host plus an explicit port when one is present, so two
/// services on one machine are limited independently.
pub fn destination_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}
