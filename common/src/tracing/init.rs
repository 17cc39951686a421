use crate::error::{Result, TalkDbError};
use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_sdk::Resource;
use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const ENABLE_VAR: &str = "TALKDB_ENABLE_TRACING";

pub struct OtelGuard {
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            // flush remaining spans on shutdown
            if let Err(e) = provider.shutdown() {
                eprintln!("error shutting down tracer provider: {}", e);
            }
        }
    }
}

fn flag_enabled(value: &str) -> bool {
    let v = value.to_lowercase();
    v == "1" || v == "true" || v == "yes"
}

/// the collector to export to, when export is switched on and has a target
fn otlp_endpoint(enabled: Option<&str>, endpoint: Option<&str>) -> Option<String> {
    if !enabled.map(flag_enabled).unwrap_or(false) {
        return None;
    }
    endpoint
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
}

/// set up logging, exporting spans over otlp when enabled
pub fn init_tracing(service_name: &str) -> Result<OtelGuard> {
    let enabled = env::var(ENABLE_VAR).ok();
    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

    let endpoint_url = match otlp_endpoint(enabled.as_deref(), endpoint.as_deref()) {
        Some(url) => url,
        None => {
            // logs go to stderr so the shell's stdout stays clean
            tracing_subscriber::fmt()
                .with_env_filter(default_filter())
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| TalkDbError::Tracing(e.to_string()))?;

            tracing::debug!("basic logging initialized (service={})", service_name);

            return Ok(OtelGuard {
                tracer_provider: None,
            });
        }
    };

    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint_url)
        .build()
        .map_err(|e| TalkDbError::Tracing(format!("exporter build failed: {}", e)))?;

    let resource = Resource::builder_empty()
        .with_attribute(KeyValue::new("service.name", service_name.to_string()))
        .build();

    let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    let telemetry =
        tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.to_string()));

    tracing_subscriber::registry()
        .with(telemetry)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(default_filter())
        .try_init()
        .map_err(|e| TalkDbError::Tracing(e.to_string()))?;

    tracing::info!(
        "opentelemetry tracing initialized for {} (endpoint: {})",
        service_name,
        endpoint_url
    );

    Ok(OtelGuard {
        tracer_provider: Some(provider),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_enabled_values() {
        assert!(flag_enabled("1"));
        assert!(flag_enabled("TRUE"));
        assert!(flag_enabled("yes"));
        assert!(!flag_enabled("0"));
        assert!(!flag_enabled(""));
    }

    #[test]
    fn test_otlp_export_needs_flag_and_endpoint() {
        let collector = Some("http://localhost:4317");

        assert_eq!(
            otlp_endpoint(Some("true"), collector).as_deref(),
            Some("http://localhost:4317")
        );
        assert_eq!(otlp_endpoint(None, collector), None);
        assert_eq!(otlp_endpoint(Some("0"), collector), None);
        assert_eq!(otlp_endpoint(Some("1"), None), None);
        assert_eq!(otlp_endpoint(Some("1"), Some("  ")), None);
    }
}
