use x509_parser::pem::parse_x509_pem;

use crate::error::TrustError;

/// Prefix of every installed anchor file name, before space folding.
pub const CANONICAL_LABEL: &str = "mkcert development CA ";

/// Shared file name used by installs that predate serial-based naming.
pub const LEGACY_FILE_NAME: &str = "mkcert-rootCA";

const PEM_CERTIFICATE_LABEL: &str = "CERTIFICATE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateIdentity {
    serial_number: String,
}

impl CertificateIdentity {
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// `mkcert development CA <serial>` with spaces turned into underscores.
    /// Serials are decimal digits only, so distinct serials never share a name.
    pub fn canonical_file_name(&self) -> String {
        format!("{}{}", CANONICAL_LABEL, self.serial_number).replace(' ', "_")
    }
}

/// Reads the first PEM block and pulls the decimal serial out of its certificate.
pub fn derive_identity(pem: &[u8]) -> Result<CertificateIdentity, TrustError> {
    if pem.iter().all(u8::is_ascii_whitespace) {
        return Err(TrustError::Parse("certificate file is empty".to_string()));
    }

    let (_, block) =
        parse_x509_pem(pem).map_err(|e| TrustError::Parse(format!("invalid PEM: {}", e)))?;
    if block.label != PEM_CERTIFICATE_LABEL {
        return Err(TrustError::Parse(format!(
            "expected a {} PEM block, found {}",
            PEM_CERTIFICATE_LABEL, block.label
        )));
    }

    let cert = block
        .parse_x509()
        .map_err(|e| TrustError::Parse(format!("invalid X.509 certificate: {}", e)))?;

    Ok(CertificateIdentity {
        serial_number: cert.tbs_certificate.serial.to_string(),
    })
}
