// Origin serialization for frame tagging and origin checks

use crate::transport::TransportError;
use url::{Origin, Url};

/// Parse `input` as an absolute URL.
pub fn parse_url(input: &str) -> Result<Url, TransportError> {
    let url = Url::parse(input.trim())
        .map_err(|e| TransportError::Protocol(format!("Invalid URL '{}': {}", input, e)))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(TransportError::Protocol(format!("URL has no host: {}", input)));
    }
    Ok(url)
}

/// Serialized origin of `url`.
///
/// Web schemes (`http`, `https`, `ws`, `wss`) get the standard tuple origin:
/// userinfo, path, query and fragment dropped, host lowercased, default port
/// elided. Other schemes such as `stdio://host` have opaque origins; they are
/// serialized as `scheme://host[:port]` so distinct embedders stay distinct.
pub fn serialize_origin(url: &Url) -> String {
    match url.origin() {
        origin @ Origin::Tuple(..) => origin.ascii_serialization(),
        Origin::Opaque(_) => {
            let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
            match url.port() {
                Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
                None => format!("{}://{}", url.scheme(), host),
            }
        }
    }
}

/// Serialized origin of the absolute URL `input`.
pub fn origin_of(input: &str) -> Result<String, TransportError> {
    parse_url(input).map(|url| serialize_origin(&url))
}
