//! Module instance - event loop, differential recomputation and host callbacks
//!
//! The instance sees the switcher only through [`DeviceEvent`]s and talks to the host only through
//! [`ModuleHost`]. Every change batch is classified first and then applied in one pass:
//!
//! ```text
//! DeviceEvent::StateChanged ─▶ classify() per signal ─▶ widest tier wins
//!                                                      │
//!            Structural ──▶ re-register definitions, recompute everything
//!            CategoryWide ─▶ rebuild the named categories
//!            Targeted ─────▶ recompute listed variable groups, check matching instances
//! ```
//!
//! Nothing here returns an error to the host. Bad options and missing state are logged and the
//! call degrades to "no command" or "inactive".

mod classify;
mod facts;

pub use classify::classify;
pub use facts::{Category, Impact, Scope, Target, VariableGroup};

use crate::actions::{self, ActionContext, ActionId, ActionPlan};
use crate::config::ModuleConfig;
use crate::device::{DeviceEvent, SwitcherDevice};
use crate::fade::{FadeScheduler, FadeTarget};
use crate::feedbacks::{self, FeedbackContext, FeedbackId};
use crate::host::{FeedbackValue, ModuleHost};
use crate::models::{auto_detect_default, get_model_spec, model_spec_from_device, ModelSpec};
use crate::options::OptionValues;
use crate::presets;
use crate::state::{tally_channel, AtemState, StateChange, TallyFeed, TallyPublisher, TallyState};
use crate::variables;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// One switcher instance as seen by the host
pub struct AtemInstance<H: ModuleHost, D: SwitcherDevice + 'static> {
    host: Arc<H>,
    device: Arc<D>,
    config: ModuleConfig,
    model: Arc<ModelSpec>,
    state: Arc<AtemState>,
    /// Set by the first full sync, cleared on disconnect
    initialized: bool,
    /// Feedback instance id -> (type, options)
    subscriptions: BTreeMap<String, (FeedbackId, OptionValues)>,
    /// Last values handed to the host
    variable_cache: BTreeMap<String, String>,
    tally_tx: TallyPublisher,
    tally_rx: TallyFeed,
    tally_seen: u64,
    fades: FadeScheduler<D>,
}

impl<H: ModuleHost, D: SwitcherDevice + 'static> AtemInstance<H, D> {
    /// Create an instance and register definitions for the configured model. Values follow once
    /// the device has synced.
    pub fn new(host: Arc<H>, device: Arc<D>, config: ModuleConfig) -> Self {
        let (tally_tx, tally_rx) = tally_channel();
        let fades = FadeScheduler::new(Arc::clone(&device), config.fade_fps);
        let model = Arc::new(
            get_model_spec(config.model_id)
                .unwrap_or_else(auto_detect_default)
                .clone(),
        );
        info!("🎛️ ATEM instance for {} ({})", config.host, model.label);

        let instance = Self {
            host,
            device,
            config,
            model,
            state: Arc::new(AtemState::default()),
            initialized: false,
            subscriptions: BTreeMap::new(),
            variable_cache: BTreeMap::new(),
            tally_tx,
            tally_rx,
            tally_seen: 0,
            fades,
        };
        instance.register_definitions(None);
        instance
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    pub fn state(&self) -> &AtemState {
        &self.state
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Last value handed to the host for `name`
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variable_cache.get(name).map(String::as_str)
    }

    /// Receiver for tally snapshots, for consumers outside the instance
    pub fn tally_feed(&self) -> TallyFeed {
        self.tally_tx.subscribe()
    }

    // ------------------------------------------------------------------
    // Device events
    // ------------------------------------------------------------------

    pub fn handle_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Connected => {
                info!("🔌 Connected to {}:{}", self.config.host, self.config.port);
            }
            DeviceEvent::FullSync(state) => {
                self.state = state;
                self.initialized = true;
                self.model = self.select_model();
                info!("✅ Synced with {}", self.model.label);
                self.full_rebuild();
            }
            DeviceEvent::StateChanged { changes, state } => {
                if !self.initialized {
                    debug!("Dropping {} change(s) received before sync", changes.len());
                    return;
                }
                self.state = state;
                self.apply_changes(&changes);
            }
            DeviceEvent::TallyBySource(sources) => {
                if !self.initialized {
                    trace!("Dropping tally received before sync");
                    return;
                }
                if self.config.poll_tally {
                    self.publish_tally(sources);
                }
            }
            DeviceEvent::Disconnected => {
                warn!("🔌 Disconnected from {}", self.config.host);
                self.initialized = false;
                self.fades.cancel_all();
            }
        }
    }

    /// Configured model wins, then the model the device reports, then a synthesized descriptor
    fn select_model(&self) -> Arc<ModelSpec> {
        let reported = self.state.info.model;
        let configured = self.config.model_id;

        if !configured.is_auto() {
            if let Some(spec) = get_model_spec(configured) {
                if self.initialized && !reported.is_auto() && reported != configured {
                    warn!(
                        "⚠️ Configured model {} ({}) differs from the connected device ({})",
                        configured, spec.label, reported
                    );
                }
                return Arc::new(spec.clone());
            }
        }

        if !self.initialized {
            return Arc::new(auto_detect_default().clone());
        }
        match get_model_spec(reported) {
            Some(spec) => Arc::new(spec.clone()),
            None => {
                warn!("Unknown model {}, deriving capabilities from the device", reported);
                Arc::new(model_spec_from_device(&self.state))
            }
        }
    }

    // ------------------------------------------------------------------
    // Recomputation
    // ------------------------------------------------------------------

    fn live_state(&self) -> Option<&AtemState> {
        self.initialized.then_some(self.state.as_ref())
    }

    fn register_definitions(&self, state: Option<&AtemState>) {
        let model = self.model.as_ref();
        self.host
            .set_action_definitions(actions::definitions(model, state));
        self.host
            .set_feedback_definitions(feedbacks::definitions(model, state));
        self.host
            .set_variable_definitions(variables::definitions(model, state));
        self.host.set_preset_definitions(presets::definitions(
            model,
            state,
            self.config.preset_label_style,
        ));
    }

    /// Structural tier: definitions, every variable, every feedback
    fn full_rebuild(&mut self) {
        let Some(state) = self.live_state() else {
            self.register_definitions(None);
            return;
        };
        info!("🔁 Rebuilding definitions for {}", self.model.label);
        self.register_definitions(Some(state));
        let values = variables::all_values(&self.model, state);
        self.push_variables(values);
        let all: Vec<FeedbackId> = FeedbackId::iter().collect();
        self.host.check_feedbacks(&all);
    }

    /// Apply one batch of change signals
    fn apply_changes(&mut self, changes: &[StateChange]) {
        let mut categories = BTreeSet::new();
        let mut targets: Vec<Target> = Vec::new();

        for change in changes {
            let impact = classify(change);
            trace!("{:?} -> {:?}", change, impact);
            match impact {
                Impact::Ignore => {}
                // Subsumes everything else in the batch
                Impact::Structural => {
                    debug!("Structural change {:?}", change);
                    if matches!(change, StateChange::Info) {
                        self.model = self.select_model();
                    }
                    self.full_rebuild();
                    return;
                }
                Impact::CategoryWide(list) => categories.extend(list),
                Impact::Targeted(list) => {
                    for target in list {
                        if !targets.contains(&target) {
                            targets.push(target);
                        }
                    }
                }
            }
        }

        let state = Arc::clone(&self.state);

        if categories.contains(&Category::Variables) {
            let values = variables::all_values(&self.model, &state);
            self.push_variables(values);
        }
        if categories.contains(&Category::Definitions) {
            self.host
                .set_action_definitions(actions::definitions(&self.model, Some(&state)));
            self.host
                .set_feedback_definitions(feedbacks::definitions(&self.model, Some(&state)));
        }
        if categories.contains(&Category::Presets) {
            self.host.set_preset_definitions(presets::definitions(
                &self.model,
                Some(&state),
                self.config.preset_label_style,
            ));
        }
        let whole_types: Vec<FeedbackId> = categories
            .iter()
            .filter_map(|c| match c {
                Category::Feedback(id) => Some(*id),
                _ => None,
            })
            .collect();
        if !whole_types.is_empty() {
            self.host.check_feedbacks(&whole_types);
        }

        let mut groups = BTreeSet::new();
        let mut instance_ids = BTreeSet::new();
        for target in targets {
            match target {
                Target::Variables(group) => {
                    if !categories.contains(&Category::Variables) {
                        groups.insert(group);
                    }
                }
                Target::Feedback(id, scope) => {
                    if whole_types.contains(&id) {
                        continue;
                    }
                    instance_ids.extend(
                        self.subscriptions
                            .iter()
                            .filter(|(_, (fid, options))| *fid == id && scope.matches(options))
                            .map(|(instance, _)| instance.clone()),
                    );
                }
            }
        }

        if !groups.is_empty() {
            let mut values = BTreeMap::new();
            for group in &groups {
                values.extend(variables::values_for(*group, &self.model, &state));
            }
            debug!(
                "Recomputed {} variable group(s), {} value(s)",
                groups.len(),
                values.len()
            );
            self.push_variables(values);
        }
        if !instance_ids.is_empty() {
            let ids: Vec<String> = instance_ids.into_iter().collect();
            debug!("Checking {} feedback instance(s)", ids.len());
            self.host.check_feedbacks_by_id(&ids);
        }
    }

    /// Hand only the values that differ from what the host already has
    fn push_variables(&mut self, values: BTreeMap<String, String>) {
        let changed: BTreeMap<String, String> = values
            .into_iter()
            .filter(|(name, value)| self.variable_cache.get(name) != Some(value))
            .collect();
        if changed.is_empty() {
            return;
        }
        self.variable_cache
            .extend(changed.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.host.set_variable_values(changed);
    }

    fn publish_tally(&mut self, sources: BTreeMap<u16, TallyState>) {
        self.tally_tx.publish(sources);
        self.on_tally_published();
    }

    fn on_tally_published(&mut self) {
        let version = self.tally_rx.borrow().version;
        if version == self.tally_seen {
            return;
        }
        self.tally_seen = version;
        trace!("Tally snapshot v{}", version);
        self.host.check_feedbacks(&[FeedbackId::InputTally]);
    }

    // ------------------------------------------------------------------
    // Host callbacks
    // ------------------------------------------------------------------

    /// Run an action. Returns whether anything was sent (or a fade started).
    pub async fn execute_action(&self, id: ActionId, options: &OptionValues) -> bool {
        let plan = {
            let ctx = ActionContext {
                model: &self.model,
                state: &self.state,
                parser: self.host.as_ref(),
            };
            actions::build_commands(id, options, &ctx)
        };

        match plan {
            Ok(ActionPlan::Commands(commands)) => {
                trace!("Action {} -> {:?}", id, commands);
                // An immediate gain write wins over a fade still stepping on that target
                for target in commands.iter().filter_map(FadeTarget::of) {
                    self.fades.cancel(target);
                }
                match self.device.send(commands).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Failed to send {} to {}: {:#}", id, self.device.name(), e);
                        false
                    }
                }
            }
            Ok(ActionPlan::Fade(request)) => {
                self.fades.start(request);
                true
            }
            Err(e) => {
                debug!("Skipping action {}: {}", id, e);
                false
            }
        }
    }

    pub fn learn_action(&self, id: ActionId, options: &OptionValues) -> Option<OptionValues> {
        let learned = actions::learn(id, options, &self.model, self.live_state()?);
        if learned.is_none() {
            debug!("Nothing to learn for action {}", id);
        }
        learned
    }

    pub fn evaluate_feedback(&self, id: FeedbackId, options: &OptionValues) -> FeedbackValue {
        let tally = self.tally_rx.borrow().clone();
        let ctx = FeedbackContext {
            model: &self.model,
            state: &self.state,
            tally: &tally,
            parser: self.host.as_ref(),
        };
        feedbacks::evaluate(id, options, &ctx)
    }

    pub fn learn_feedback(&self, id: FeedbackId, options: &OptionValues) -> Option<OptionValues> {
        feedbacks::learn(id, options, &self.model, self.live_state()?)
    }

    /// Track a feedback instance so targeted changes can reach it
    pub fn subscribe_feedback(&mut self, instance_id: &str, id: FeedbackId, options: OptionValues) {
        self.subscriptions
            .insert(instance_id.to_string(), (id, options));
    }

    pub fn unsubscribe_feedback(&mut self, instance_id: &str) {
        self.subscriptions.remove(instance_id);
    }

    /// Apply a new configuration. A different model rebuilds everything.
    pub fn update_config(&mut self, config: ModuleConfig) {
        if config == self.config {
            return;
        }
        let previous = std::mem::replace(&mut self.config, config);
        self.fades.set_fps(self.config.fade_fps);

        if previous.host != self.config.host || previous.port != self.config.port {
            info!(
                "Switcher address is now {}:{}; takes effect on reconnect",
                self.config.host, self.config.port
            );
        }

        let model = self.select_model();
        if *model != *self.model {
            info!("🔁 Model changed: {} -> {}", self.model.label, model.label);
            self.model = model;
            self.full_rebuild();
        } else if previous.preset_label_style != self.config.preset_label_style {
            self.host.set_preset_definitions(presets::definitions(
                &self.model,
                self.live_state(),
                self.config.preset_label_style,
            ));
        }
    }

    /// Process events, config updates and tally snapshots strictly in order until `shutdown`
    /// resolves or the event stream closes.
    pub async fn run<F>(
        mut self,
        mut events: mpsc::Receiver<DeviceEvent>,
        mut configs: mpsc::Receiver<ModuleConfig>,
        shutdown: F,
    ) where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tally = self.tally_rx.clone();
        debug!("Instance loop started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Instance shutting down");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        info!("Device event stream closed");
                        break;
                    }
                },
                Some(config) = configs.recv() => self.update_config(config),
                Ok(()) = tally.changed() => self.on_tally_published(),
            }
        }

        self.fades.cancel_all();
    }
}

#[cfg(test)]
mod tests;
