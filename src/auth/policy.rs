//! Group-based authorization for federated principals.

/// Returns true if the caller may use the hub.
///
/// An empty allow-list authorizes everyone. Otherwise at least one of the
/// caller's groups must be listed.
pub fn is_authorized<S: AsRef<str>>(groups: &[S], allow_list: &[String]) -> bool {
    if allow_list.is_empty() {
        return true;
    }
    groups
        .iter()
        .any(|group| allow_list.iter().any(|allowed| allowed == group.as_ref()))
}
