use crate::{
    admission::Admission,
    core::{DisallowedPrefixes, ResourcePolicy},
    metrics::AdmissionMetrics,
};
use anyhow::{bail, Result};
use clap::Parser;
use kubert::server::{TlsCertPath, TlsKeyPath};
use prometheus_client::registry::Registry;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

#[derive(Debug, Parser)]
#[clap(
    name = "gpu-admission",
    about = "Denies pods that request restricted GPU resources"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "gpu_admission=info,warn",
        env = "GPU_ADMISSION_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// Webhook server port.
    #[clap(long, default_value = "8443")]
    port: u16,

    /// TLS certificate file.
    #[clap(long, default_value = "/etc/webhook/certs/tls.crt")]
    tls_cert: TlsCertPath,

    /// TLS key file.
    #[clap(long, default_value = "/etc/webhook/certs/tls.key")]
    tls_key: TlsKeyPath,

    /// Comma-separated GPU resource prefixes (e.g. nvidia.com,amd.com).
    #[clap(long, default_value = "nvidia.com")]
    gpu_prefixes: DisallowedPrefixes,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            client,
            admin,
            port,
            tls_cert,
            tls_key,
            gpu_prefixes,
        } = self;

        let server = kubert::ServerArgs {
            server_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            server_tls_key: Some(tls_key),
            server_tls_certs: Some(tls_cert),
        };

        let mut prom = <Registry>::default();
        let metrics = AdmissionMetrics::register(prom.sub_registry_with_prefix("gpu_admission"));
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        // The client is only built so that an unusable kubeconfig fails
        // startup; admission decisions never query the API server.
        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .with_optional_server(Some(server))
            .build()
            .await?;

        info!(%port, prefixes = %gpu_prefixes, "Starting webhook server");
        let admission = Admission::new(Arc::new(ResourcePolicy::from(gpu_prefixes)), metrics);
        let runtime = runtime.spawn_server(move || admission.clone());

        // Block the main thread on the shutdown signal.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}
