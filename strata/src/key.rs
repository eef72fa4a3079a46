/// Canonical cache key for an inbound request.
///
/// Two requests map to the same key exactly when method, path+query and the
/// caller-supplied extension all agree. The extension is the empty string
/// unless the request carries a key extender.
pub fn derive_key(method: &str, path_and_query: &str, extension: &str) -> String {
    format!("{method}{path_and_query}{extension}")
}
