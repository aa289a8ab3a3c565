use creg_domain::settings::Settings;
use creg_kernel::certificate::CertificateEntry;
use creg_kernel::operations::{
    CertificateOperations, CertificateOutput, OperationError, OperationErrorExt, OperationFuture,
};
use creg_kernel::registry::RegistryConfig;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const FULLCHAIN: &str = "fullchain.pem";

/// Runs certbot for issue and renew, and reads issued chains from `CERTS_DIR`.
///
/// Binary, directories and credentials all come from the registry snapshot passed with the
/// call, so a reload applies to the next request as a whole. Invocations are serialised:
/// certbot keeps its own state under the config dir and does not tolerate concurrent runs.
#[derive(Debug, Default)]
pub struct CertbotOperations {
    lock: Mutex<()>,
}

impl CertbotOperations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn run(
        &self,
        registry: &RegistryConfig,
        entry: &CertificateEntry,
        args: Vec<OsString>,
    ) -> Result<CertificateOutput, OperationError> {
        let settings = registry.settings();
        let program = settings.certbot_bin.display().to_string();

        let _guard = self.lock.lock().await;
        info!(key = entry.key(), program = %program, "Running certbot");
        debug!(?args, "Certbot arguments");

        let output = Command::new(&settings.certbot_bin)
            .args(&args)
            .envs(registry.credentials().env_pairs())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .context(format!("spawning {program}"))?;

        if !output.status.success() {
            let status = output.status.code().map_or_else(|| "signal".to_owned(), |c| c.to_string());
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            warn!(key = entry.key(), %status, "Certbot failed");
            return Err(OperationError::Command { program, status, stderr });
        }

        info!(key = entry.key(), "Certbot finished");
        Ok(CertificateOutput {
            key: entry.key().to_owned(),
            path: fullchain_path(settings, entry).display().to_string(),
            body: String::from_utf8_lossy(&output.stdout).trim().to_owned(),
        })
    }
}

impl CertificateOperations for CertbotOperations {
    fn issue<'a>(
        &'a self,
        registry: &'a RegistryConfig,
        entry: &'a CertificateEntry,
    ) -> OperationFuture<'a> {
        Box::pin(async move {
            let args = certonly_args(registry.settings(), entry);
            self.run(registry, entry, args).await
        })
    }

    fn renew<'a>(
        &'a self,
        registry: &'a RegistryConfig,
        entry: &'a CertificateEntry,
    ) -> OperationFuture<'a> {
        Box::pin(async move {
            let args = renew_args(registry.settings(), entry);
            self.run(registry, entry, args).await
        })
    }

    fn read<'a>(
        &'a self,
        registry: &'a RegistryConfig,
        entry: &'a CertificateEntry,
    ) -> OperationFuture<'a> {
        Box::pin(async move {
            let path = fullchain_path(registry.settings(), entry);
            let body = match tokio::fs::read_to_string(&path).await {
                Ok(body) => body,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(OperationError::NotIssued { key: entry.key().to_owned() });
                }
                Err(e) => return Err(e).context(path.display().to_string()),
            };
            Ok(CertificateOutput { key: entry.key().to_owned(), path: path.display().to_string(), body })
        })
    }
}

pub(crate) fn fullchain_path(settings: &Settings, entry: &CertificateEntry) -> PathBuf {
    settings.certs_dir.join("live").join(entry.key()).join(FULLCHAIN)
}

fn common_args(settings: &Settings) -> Vec<OsString> {
    vec![
        "--non-interactive".into(),
        "--config-dir".into(),
        settings.certs_dir.clone().into(),
        "--work-dir".into(),
        settings.certs_dir.join(".work").into(),
        "--logs-dir".into(),
        settings.logs_dir.join("certbot").into(),
    ]
}

pub(crate) fn certonly_args(settings: &Settings, entry: &CertificateEntry) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["certonly".into()];
    args.extend(common_args(settings));
    args.extend([
        "--agree-tos".into(),
        format!("--{}", entry.plugin()).into(),
        "--server".into(),
        settings.acme_server.clone().into(),
        "--email".into(),
        entry.email().into(),
        "--cert-name".into(),
        entry.key().into(),
    ]);
    for domain in entry.domains() {
        args.extend(["-d".into(), domain.into()]);
    }
    args
}

pub(crate) fn renew_args(settings: &Settings, entry: &CertificateEntry) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["renew".into()];
    args.extend(common_args(settings));
    args.extend(["--cert-name".into(), entry.key().into()]);
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use creg_kernel::certificate::parse_certificate_entry;

    fn entry() -> CertificateEntry {
        let raw = serde_yaml::from_str(
            "key: api\nemail: ops@example.com\ndomains: [api.example.com, '*.api.example.com']\nplugin: dns-route53\n",
        )
        .unwrap();
        parse_certificate_entry(&raw).unwrap()
    }

    fn strings(args: &[OsString]) -> Vec<&str> {
        args.iter().filter_map(|a| a.to_str()).collect()
    }

    #[test]
    fn certonly_carries_plugin_server_and_every_domain() {
        let settings = Settings { certs_dir: "/data/certs".into(), ..Settings::default() };
        let args = certonly_args(&settings, &entry());
        let args = strings(&args);

        assert_eq!(args[0], "certonly");
        assert!(args.contains(&"--dns-route53"));
        assert!(args.windows(2).any(|w| w == ["--server", Settings::DEFAULT_ACME_SERVER]));
        assert!(args.windows(2).any(|w| w == ["--email", "ops@example.com"]));
        assert!(args.windows(2).any(|w| w == ["--cert-name", "api"]));
        assert!(args.windows(2).any(|w| w == ["--config-dir", "/data/certs"]));
        assert!(args.windows(2).any(|w| w == ["-d", "api.example.com"]));
        assert!(args.windows(2).any(|w| w == ["-d", "*.api.example.com"]));
    }

    #[test]
    fn renew_targets_one_certificate() {
        let args = renew_args(&Settings::default(), &entry());
        let args = strings(&args);
        assert_eq!(args[0], "renew");
        assert!(args.windows(2).any(|w| w == ["--cert-name", "api"]));
        assert!(!args.contains(&"-d"));
    }

    #[test]
    fn fullchain_lives_under_live_dir() {
        let settings = Settings { certs_dir: "/certs".into(), ..Settings::default() };
        assert_eq!(fullchain_path(&settings, &entry()), PathBuf::from("/certs/live/api/fullchain.pem"));
    }
}
