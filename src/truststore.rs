use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::TrustError,
    exec::CommandRunner,
    identity::{self, CertificateIdentity, LEGACY_FILE_NAME},
    logging,
    probe::PathProber,
    strategy::{AnchorCandidate, TrustAnchorStrategy, resolve_strategy},
};

/// Where a given certificate lives (or would live) on this host.
#[derive(Debug, Clone)]
pub struct Placement {
    pub identity: CertificateIdentity,
    pub strategy: TrustAnchorStrategy,
    pub target: PathBuf,
    pub legacy: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    pub removed: PathBuf,
    pub legacy_removed: Option<PathBuf>,
}

/// Sequences identity, strategy and command execution for one host.
/// Holds no state between calls; every operation re-reads and re-resolves.
pub struct Truststore<P, R> {
    candidates: Vec<AnchorCandidate>,
    prober: P,
    runner: R,
}

impl<P: PathProber, R: CommandRunner> Truststore<P, R> {
    pub fn new(candidates: Vec<AnchorCandidate>, prober: P, runner: R) -> Self {
        Self {
            candidates,
            prober,
            runner,
        }
    }

    pub fn strategy(&self) -> Result<TrustAnchorStrategy, TrustError> {
        resolve_strategy(&self.candidates, &self.prober)
    }

    /// Resolve names and paths without touching the trust store.
    pub fn locate(&self, cert_path: &Path) -> Result<Placement, TrustError> {
        let pem = read_certificate(cert_path)?;
        self.place(&pem)
    }

    /// Copy the certificate into the anchor directory, then refresh.
    /// A failed copy never reaches the refresh step.
    pub fn install(&self, cert_path: &Path) -> Result<PathBuf, TrustError> {
        let pem = read_certificate(cert_path)?;
        let placement = self.place(&pem)?;
        let target = path_arg(&placement.target);

        self.runner
            .run(&["tee".to_string(), target.clone()], Some(&pem))?;
        logging::debug("TRUST", &format!("anchor written path={}", target));

        self.refresh(&placement.strategy)?;
        logging::info(
            "TRUST",
            &format!(
                "trust install serial={} path={} status=ok",
                placement.identity.serial_number(),
                target
            ),
        );
        Ok(placement.target)
    }

    /// Remove the serial-named file and any legacy shared-name file, then refresh.
    /// Missing files are not an error.
    pub fn uninstall(&self, cert_path: &Path) -> Result<UninstallReport, TrustError> {
        let pem = read_certificate(cert_path)?;
        let placement = self.place(&pem)?;

        self.remove(&placement.target)?;

        let legacy_removed = if self.prober.exists(&placement.legacy) {
            self.remove(&placement.legacy)?;
            logging::info(
                "TRUST",
                &format!("legacy anchor removed path={}", placement.legacy.display()),
            );
            Some(placement.legacy.clone())
        } else {
            None
        };

        self.refresh(&placement.strategy)?;
        logging::info(
            "TRUST",
            &format!(
                "trust uninstall serial={} path={} status=ok",
                placement.identity.serial_number(),
                placement.target.display()
            ),
        );

        Ok(UninstallReport {
            removed: placement.target,
            legacy_removed,
        })
    }

    fn place(&self, pem: &[u8]) -> Result<Placement, TrustError> {
        let identity = identity::derive_identity(pem)?;
        let strategy = self.strategy()?;
        logging::debug(
            "TRUST",
            &format!(
                "strategy selected pattern={} refresh={:?}",
                strategy.roots_pattern(),
                strategy.refresh_command().join(" ")
            ),
        );

        Ok(Placement {
            target: strategy.path_for(&identity.canonical_file_name()),
            legacy: strategy.path_for(LEGACY_FILE_NAME),
            identity,
            strategy,
        })
    }

    fn remove(&self, path: &Path) -> Result<(), TrustError> {
        self.runner
            .run(&["rm".to_string(), "-f".to_string(), path_arg(path)], None)?;
        Ok(())
    }

    fn refresh(&self, strategy: &TrustAnchorStrategy) -> Result<(), TrustError> {
        self.runner.run(strategy.refresh_command(), None)?;
        Ok(())
    }
}

fn read_certificate(path: &Path) -> Result<Vec<u8>, TrustError> {
    fs::read(path).map_err(|source| TrustError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
