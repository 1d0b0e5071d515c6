// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward")

pub mod types;
pub mod error;
pub mod config;
pub mod grid;
pub mod policy;
pub mod step;
pub mod history;
pub mod pacer;
pub mod conservation;
pub mod simulation;

pub use types::*;
pub use config::{DiseaseParams, ExposureSeed, SimulationConfig};
pub use error::ConfigError;
pub use grid::Grid;
pub use history::History;
pub use policy::{resolve_rates, EffectiveRates};
pub use simulation::{CommitOutcome, EpidemicSimulation};

use serde::Serialize;
use wasm_bindgen::prelude::*;

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

fn js_error(e: ConfigError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PolicyInfo {
    id: &'static str,
    label: &'static str,
    description: &'static str,
    effect: PolicyEffect,
}

#[derive(Serialize)]
struct CadenceInfo {
    id: &'static str,
    label: &'static str,
    interval_ms: u32,
}

#[wasm_bindgen]
impl EpidemicSimulation {
    /// Default constants, or a JSON object overriding any of them.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<EpidemicSimulation, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config = if config.is_undefined() || config.is_null() {
            SimulationConfig::default()
        } else {
            let value: serde_json::Value = serde_wasm_bindgen::from_value(config).map_err(JsValue::from)?;
            SimulationConfig::from_value(value).map_err(js_error)?
        };
        EpidemicSimulation::with_config(config).map_err(js_error)
    }

    /// Host clock in ms; returns the day's summary or `null`.
    pub fn tick(&mut self, now_ms: f64) -> JsValue {
        match self.tick_core(now_ms) {
            Some(summary) => to_js(&summary),
            None => JsValue::NULL,
        }
    }

    #[wasm_bindgen(js_name = advanceDay)]
    pub fn advance_day_js(&mut self) -> JsValue {
        let summary = self.advance_day();
        to_js(&summary)
    }

    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> JsValue {
        to_js(&self.state)
    }

    #[wasm_bindgen(js_name = getHistory)]
    pub fn get_history(&self) -> JsValue {
        to_js(&self.state.history.iter().collect::<Vec<_>>())
    }

    #[wasm_bindgen(js_name = getGrid)]
    pub fn get_grid(&self) -> JsValue {
        to_js(&self.state.grid.rows().collect::<Vec<_>>())
    }

    #[wasm_bindgen(js_name = updateControls)]
    pub fn update_controls_js(&mut self, update: JsValue) -> Result<(), JsValue> {
        let update: ControlsUpdate = serde_wasm_bindgen::from_value(update).map_err(JsValue::from)?;
        self.update_controls(&update).map_err(js_error)
    }

    #[wasm_bindgen(js_name = togglePolicy)]
    pub fn toggle_policy_js(&mut self, policy_id: &str) -> Result<(), JsValue> {
        let policy = Policy::from_id(policy_id).map_err(js_error)?;
        self.toggle_policy(policy);
        Ok(())
    }

    #[wasm_bindgen(js_name = setCadence)]
    pub fn set_cadence_js(&mut self, cadence_id: &str) -> Result<(), JsValue> {
        let cadence = Cadence::from_id(cadence_id).map_err(js_error)?;
        self.set_cadence(cadence);
        Ok(())
    }

    #[wasm_bindgen(js_name = resume)]
    pub fn resume_js(&mut self, now_ms: f64) {
        self.resume(now_ms);
    }

    #[wasm_bindgen(js_name = pause)]
    pub fn pause_js(&mut self) {
        self.pause();
    }

    #[wasm_bindgen(js_name = togglePause)]
    pub fn toggle_pause_js(&mut self, now_ms: f64) {
        self.toggle_pause(now_ms);
    }

    #[wasm_bindgen(js_name = reset)]
    pub fn reset_js(&mut self) {
        self.reset();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running_js(&self) -> bool {
        self.is_running()
    }

    /// Run N days without pacing (batch mode).
    #[wasm_bindgen(js_name = runDays)]
    pub fn run_days_js(&mut self, days: u32) {
        self.run_days(days);
    }
}

#[wasm_bindgen(js_name = policyCatalog)]
pub fn policy_catalog() -> JsValue {
    let catalog: Vec<PolicyInfo> = Policy::ALL
        .iter()
        .map(|p| PolicyInfo { id: p.id(), label: p.label(), description: p.description(), effect: p.effect() })
        .collect();
    to_js(&catalog)
}

#[wasm_bindgen(js_name = cadenceCatalog)]
pub fn cadence_catalog() -> JsValue {
    let catalog: Vec<CadenceInfo> = Cadence::ALL
        .iter()
        .map(|c| CadenceInfo { id: c.id(), label: c.label(), interval_ms: c.interval_ms() })
        .collect();
    to_js(&catalog)
}
