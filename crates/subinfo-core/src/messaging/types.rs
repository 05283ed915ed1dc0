/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    /// When false, results are sent as new messages and the "fetching"
    /// placeholder is deleted instead of being replaced.
    pub supports_edit: bool,
}
