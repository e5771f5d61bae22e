// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::MeterProvider;

#[cfg(any(feature = "metrics", test))]
use crate::telemetry::metrics::Instruments;
use crate::telemetry::{CacheTelemetry, cache::Sinks};

/// Collects the telemetry switches set on the configuration builder.
#[derive(Clone, Debug, Default)]
pub(crate) struct TelemetryConfig {
    logs: bool,
    #[cfg(any(feature = "metrics", test))]
    instruments: Option<Instruments>,
}

impl TelemetryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_logs(self) -> Self {
        Self { logs: true, ..self }
    }

    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub fn with_metrics(self, provider: &dyn MeterProvider) -> Self {
        Self {
            instruments: Some(Instruments::new(provider)),
            ..self
        }
    }

    #[must_use]
    pub fn build(self) -> CacheTelemetry {
        CacheTelemetry::new(Sinks {
            logs: self.logs,
            #[cfg(any(feature = "metrics", test))]
            instruments: self.instruments,
        })
    }
}
