use crate::strategy::{AnchorCandidate, TrustAnchorStrategy};

/// (probe dir, pattern, refresh command). RHEL-family first, then Debian,
/// Arch (p11-kit), and openSUSE.
const LAYOUTS: &[(&str, &str, &[&str])] = &[
    (
        "/etc/pki/ca-trust/source/anchors/",
        "/etc/pki/ca-trust/source/anchors/%s.pem",
        &["update-ca-trust", "extract"],
    ),
    (
        "/usr/local/share/ca-certificates/",
        "/usr/local/share/ca-certificates/%s.crt",
        &["update-ca-certificates"],
    ),
    (
        "/etc/ca-certificates/trust-source/anchors/",
        "/etc/ca-certificates/trust-source/anchors/%s.crt",
        &["trust", "extract-compat"],
    ),
    (
        "/usr/share/pki/trust/anchors",
        "/usr/share/pki/trust/anchors/%s.pem",
        &["update-ca-certificates"],
    ),
];

pub fn anchors() -> Vec<AnchorCandidate> {
    LAYOUTS
        .iter()
        .filter_map(|(dir, pattern, refresh)| {
            let refresh = refresh.iter().map(|s| s.to_string()).collect();
            TrustAnchorStrategy::new(*pattern, refresh)
                .ok()
                .map(|strategy| AnchorCandidate::new(dir, strategy))
        })
        .collect()
}
