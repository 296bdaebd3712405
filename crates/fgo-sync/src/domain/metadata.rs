/// Content hash of an off-chain document: the last `/`-separated segment of
/// its URI. `None` for an empty URI or one ending in `/`.
pub fn content_hash(uri: &str) -> Option<&str> {
    uri.rsplit('/').next().filter(|segment| !segment.is_empty())
}
