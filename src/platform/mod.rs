use crate::strategy::AnchorCandidate;

#[cfg(target_os = "linux")]
mod linux;

/// Built-in trust layouts for the target OS, highest precedence first.
pub fn default_anchors() -> Vec<AnchorCandidate> {
    // Dispatch by target OS to keep distribution-specific paths isolated.
    #[cfg(target_os = "linux")]
    {
        linux::anchors()
    }

    // Other platforms have no directory-based layout; configuration may add one.
    #[cfg(not(target_os = "linux"))]
    {
        Vec::new()
    }
}
