//! Risk aggregation pipeline
//!
//! `SourceSelector -> DerivedMetrics -> hazard -> blend -> composite -> assemble`
//!
//! One call is one independent pass. Nothing is cached between calls.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::blend::{self, PartnerForecast, PartnerForecastSignal};
use crate::composite;
use crate::config::EngineConfig;
use crate::derived::DerivedMetrics;
use crate::hazard;
use crate::request::RiskRequest;
use crate::result::{self, RiskResult};
use crate::source::{AtmosphericProvider, Regime, SourceSelector};
use crate::{Result, RiskError};

pub struct RiskEngine {
    selector: SourceSelector,
    partner: Option<Arc<dyn PartnerForecast>>,
    config: EngineConfig,
}

impl RiskEngine {
    pub fn new(
        reanalysis: Arc<dyn AtmosphericProvider>,
        forecast: Arc<dyn AtmosphericProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            selector: SourceSelector::new(reanalysis, forecast, config.search.clone()),
            partner: None,
            config,
        }
    }

    /// Attach the regional partner forecast used for blending.
    pub fn with_partner(mut self, partner: Arc<dyn PartnerForecast>) -> Self {
        self.partner = Some(partner);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Assess a request against the current wall clock.
    pub async fn assess(&self, request: &RiskRequest) -> Result<RiskResult> {
        self.assess_at(request, Utc::now()).await
    }

    /// Assess a request, treating `now` as the present moment.
    pub async fn assess_at(&self, request: &RiskRequest, now: DateTime<Utc>) -> Result<RiskResult> {
        let window = request.window();

        let (regime, bundle) = self
            .selector
            .fetch(request.location.coordinates, window, now)
            .await?;
        let sample_count = bundle.validate().inspect_err(|e| {
            if e.is_internal() {
                error!(
                    target: "risk_engine::invariant",
                    source = %bundle.source_label,
                    error = %e,
                    "Sample bundle failed validation"
                );
            }
        })?;

        let derived = DerivedMetrics::compute(&bundle);
        let primary = hazard::compute(&bundle, &derived, &self.config.thresholds);
        for (name, pct) in primary.iter() {
            debug!(hazard = name, pct, "Primary likelihood");
        }

        let signal = self.partner_signal(regime, request).await?;
        let blended = blend::apply(primary, signal.as_ref(), &self.config.blend);
        let very_uncomfortable = composite::very_uncomfortable(&blended, &self.config.composite);

        let source_label = match signal {
            Some(signal) => signal.source_label,
            None => bundle.source_label,
        };

        let result = result::assemble(
            window,
            &request.location,
            sample_count,
            source_label,
            blended,
            very_uncomfortable,
        )?;

        info!(
            %regime,
            %window,
            samples = result.sample_count,
            source = %result.source_label,
            very_uncomfortable = result.likelihoods.very_uncomfortable,
            "Risk assessed"
        );
        Ok(result)
    }

    async fn partner_signal(
        &self,
        regime: Regime,
        request: &RiskRequest,
    ) -> Result<Option<PartnerForecastSignal>> {
        let Some(partner) = &self.partner else {
            return Ok(None);
        };
        let Some(place) = blend::eligible_place(regime, &request.location, &self.config.blend) else {
            return Ok(None);
        };

        debug!(place, date = %request.date, "Requesting partner forecast");
        match partner.fetch_signal(place, request.date).await {
            Ok(signal) => {
                if signal.is_none() {
                    debug!(place, "Partner has no signal; blending skipped");
                }
                Ok(signal)
            }
            Err(e) => {
                warn!(place, error = %e, "Partner forecast failed");
                Err(RiskError::PartnerUnavailable(e))
            }
        }
    }
}
