use std::path::{Path, PathBuf};

use crate::{error::TrustError, probe::PathProber};

const PLACEHOLDER: &str = "%s";

/// How one trust layout stores anchors and how it is told to pick them up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchorStrategy {
    roots_pattern: String,
    refresh_command: Vec<String>,
}

impl TrustAnchorStrategy {
    /// `roots_pattern` must hold exactly one `%s`; `refresh_command` must name a program.
    pub fn new(
        roots_pattern: impl Into<String>,
        refresh_command: Vec<String>,
    ) -> Result<Self, String> {
        let roots_pattern = roots_pattern.into();
        let placeholders = roots_pattern.matches(PLACEHOLDER).count();
        if placeholders != 1 {
            return Err(format!(
                "pattern must contain exactly one {} placeholder, found {}: {}",
                PLACEHOLDER, placeholders, roots_pattern
            ));
        }
        match refresh_command.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => return Err("refresh command must name a program".to_string()),
        }

        Ok(Self {
            roots_pattern,
            refresh_command,
        })
    }

    pub fn roots_pattern(&self) -> &str {
        &self.roots_pattern
    }

    pub fn refresh_command(&self) -> &[String] {
        &self.refresh_command
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        PathBuf::from(self.roots_pattern.replacen(PLACEHOLDER, file_name, 1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorCandidate {
    pub probe_dir: PathBuf,
    pub strategy: TrustAnchorStrategy,
}

impl AnchorCandidate {
    pub fn new(probe_dir: impl AsRef<Path>, strategy: TrustAnchorStrategy) -> Self {
        Self {
            probe_dir: probe_dir.as_ref().to_path_buf(),
            strategy,
        }
    }
}

/// First candidate whose directory exists wins; the list order is the precedence.
pub fn resolve_strategy(
    candidates: &[AnchorCandidate],
    prober: &impl PathProber,
) -> Result<TrustAnchorStrategy, TrustError> {
    candidates
        .iter()
        .find(|c| prober.exists(&c.probe_dir))
        .map(|c| c.strategy.clone())
        .ok_or(TrustError::NoStrategy)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        cell::RefCell,
        collections::HashSet,
        path::{Path, PathBuf},
    };

    use super::{AnchorCandidate, TrustAnchorStrategy, resolve_strategy};
    use crate::{error::TrustError, probe::PathProber};

    /// Prober backed by a fixed set of paths; remembers what it was asked.
    #[derive(Default)]
    pub(crate) struct FakeProber {
        pub present: HashSet<PathBuf>,
        pub probed: RefCell<Vec<PathBuf>>,
    }

    impl FakeProber {
        pub(crate) fn with(paths: &[&str]) -> Self {
            Self {
                present: paths.iter().map(PathBuf::from).collect(),
                probed: RefCell::default(),
            }
        }
    }

    impl PathProber for FakeProber {
        fn exists(&self, path: &Path) -> bool {
            self.probed.borrow_mut().push(path.to_path_buf());
            self.present.contains(path)
        }
    }

    fn strategy(pattern: &str, refresh: &[&str]) -> TrustAnchorStrategy {
        TrustAnchorStrategy::new(pattern, refresh.iter().map(|s| s.to_string()).collect())
            .unwrap()
    }

    fn candidates() -> Vec<AnchorCandidate> {
        vec![
            AnchorCandidate::new("/first", strategy("/first/%s.pem", &["one"])),
            AnchorCandidate::new("/second", strategy("/second/%s.crt", &["two"])),
            AnchorCandidate::new("/third", strategy("/third/%s.crt", &["three", "x"])),
        ]
    }

    #[test]
    fn highest_priority_existing_directory_wins() {
        let prober = FakeProber::with(&["/second", "/third"]);
        let selected = resolve_strategy(&candidates(), &prober).unwrap();
        assert_eq!(selected.roots_pattern(), "/second/%s.crt");
        assert_eq!(selected.refresh_command(), ["two".to_string()]);
    }

    #[test]
    fn every_subset_of_directories_selects_its_first_member() {
        let all = candidates();
        for mask in 1u8..8 {
            let present: Vec<&str> = ["/first", "/second", "/third"]
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1u8 << *i) != 0)
                .map(|(_, p)| *p)
                .collect();
            let prober = FakeProber::with(&present);
            let selected = resolve_strategy(&all, &prober).unwrap();
            let expected = all
                .iter()
                .find(|c| c.probe_dir == Path::new(present[0]))
                .unwrap();
            assert_eq!(selected, expected.strategy, "present={:?}", present);
        }
    }

    #[test]
    fn stops_probing_after_first_match() {
        let prober = FakeProber::with(&["/first", "/second"]);
        resolve_strategy(&candidates(), &prober).unwrap();
        assert_eq!(*prober.probed.borrow(), vec![PathBuf::from("/first")]);
    }

    #[test]
    fn no_existing_directory_is_an_error() {
        let prober = FakeProber::with(&["/elsewhere"]);
        let err = resolve_strategy(&candidates(), &prober).unwrap_err();
        assert!(matches!(err, TrustError::NoStrategy));
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        let prober = FakeProber::with(&["/first"]);
        let err = resolve_strategy(&[], &prober).unwrap_err();
        assert!(matches!(err, TrustError::NoStrategy));
    }

    #[test]
    fn path_for_fills_the_placeholder() {
        let s = strategy("/a/%s.pem", &["refresh"]);
        assert_eq!(
            s.path_for("mkcert_development_CA_12345"),
            PathBuf::from("/a/mkcert_development_CA_12345.pem")
        );
    }

    #[test]
    fn new_rejects_bad_patterns_and_commands() {
        assert!(TrustAnchorStrategy::new("/a/b.pem", vec!["x".into()]).is_err());
        assert!(TrustAnchorStrategy::new("/a/%s/%s.pem", vec!["x".into()]).is_err());
        assert!(TrustAnchorStrategy::new("/a/%s.pem", vec![]).is_err());
        assert!(TrustAnchorStrategy::new("/a/%s.pem", vec![" ".into()]).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn rhel_layout_takes_precedence_over_debian_layout() {
        let prober = FakeProber::with(&[
            "/usr/local/share/ca-certificates/",
            "/etc/pki/ca-trust/source/anchors/",
        ]);
        let selected = resolve_strategy(&crate::platform::default_anchors(), &prober).unwrap();
        assert_eq!(selected.refresh_command(), ["update-ca-trust", "extract"]);
    }
}
