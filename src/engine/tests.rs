//! Tests for the instance event loop

use super::*;
use crate::device::{ConsoleSwitcher, SwitcherCommand};
use crate::host::{ActionDefinition, FeedbackDefinition, PresetDefinition, VariableDefinition};
use crate::models::{get_model_spec, InternalPortType, MeAvailability, ModelId, SourceAvailability};
use crate::options::VariableParser;
use crate::state::InputChannel;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Actions,
    Feedbacks,
    Variables,
    Presets,
    Values(BTreeMap<String, String>),
    Check(Vec<FeedbackId>),
    CheckIds(Vec<String>),
}

#[derive(Default)]
struct RecordingHost {
    calls: Mutex<Vec<Call>>,
}

impl RecordingHost {
    fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl VariableParser for RecordingHost {
    fn parse_variables(&self, text: &str) -> String {
        text.to_string()
    }
}

impl ModuleHost for RecordingHost {
    fn set_action_definitions(&self, _: Vec<ActionDefinition>) {
        self.calls.lock().push(Call::Actions);
    }
    fn set_feedback_definitions(&self, _: Vec<FeedbackDefinition>) {
        self.calls.lock().push(Call::Feedbacks);
    }
    fn set_variable_definitions(&self, _: Vec<VariableDefinition>) {
        self.calls.lock().push(Call::Variables);
    }
    fn set_preset_definitions(&self, _: Vec<PresetDefinition>) {
        self.calls.lock().push(Call::Presets);
    }
    fn set_variable_values(&self, values: BTreeMap<String, String>) {
        self.calls.lock().push(Call::Values(values));
    }
    fn check_feedbacks(&self, feedbacks: &[FeedbackId]) {
        self.calls.lock().push(Call::Check(feedbacks.to_vec()));
    }
    fn check_feedbacks_by_id(&self, instance_ids: &[String]) {
        self.calls.lock().push(Call::CheckIds(instance_ids.to_vec()));
    }
}

type TestInstance = AtemInstance<RecordingHost, ConsoleSwitcher>;

fn make_instance(model_id: ModelId) -> (TestInstance, Arc<RecordingHost>, Arc<ConsoleSwitcher>) {
    let host = Arc::new(RecordingHost::default());
    let device = Arc::new(ConsoleSwitcher::new("test"));
    let config = ModuleConfig {
        model_id,
        ..ModuleConfig::default()
    };
    let instance = AtemInstance::new(Arc::clone(&host), Arc::clone(&device), config);
    (instance, host, device)
}

fn synced(model_id: ModelId) -> (TestInstance, Arc<RecordingHost>, Arc<ConsoleSwitcher>) {
    let (mut instance, host, device) = make_instance(model_id);
    let model = get_model_spec(model_id).unwrap();
    instance.handle_event(DeviceEvent::FullSync(Arc::new(AtemState::for_model(model))));
    host.take();
    (instance, host, device)
}

fn with_program(state: &AtemState, me: usize, source: u16) -> AtemState {
    let mut next = state.clone();
    if let Some(Some(mix_effect)) = next.video.mix_effects.get_mut(me) {
        mix_effect.program_input = source;
    }
    next
}

fn named(id: u16, long: &str, short: &str) -> InputChannel {
    InputChannel {
        input_id: id,
        long_name: long.into(),
        short_name: short.into(),
        are_names_default: false,
        internal_port_type: InternalPortType::External,
        source_availability: SourceAvailability::ALL,
        me_availability: MeAvailability::default(),
    }
}

fn values_pushed(calls: &[Call]) -> BTreeMap<String, String> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::Values(v) => Some(v.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

#[tokio::test]
async fn test_new_registers_definitions_without_values() {
    let (instance, host, _) = make_instance(ModelId::TWO_ME);
    assert!(!instance.is_initialized());
    assert_eq!(
        host.take(),
        vec![Call::Actions, Call::Feedbacks, Call::Variables, Call::Presets]
    );
}

#[tokio::test]
async fn test_full_sync_pushes_everything() {
    let (mut instance, host, _) = make_instance(ModelId::TWO_ME);
    host.take();

    let model = get_model_spec(ModelId::TWO_ME).unwrap();
    instance.handle_event(DeviceEvent::FullSync(Arc::new(AtemState::for_model(model))));

    assert!(instance.is_initialized());
    let calls = host.take();
    assert!(calls.contains(&Call::Actions));
    assert!(calls.contains(&Call::Presets));
    let values = values_pushed(&calls);
    assert_eq!(values.get("pgm2_input_id").map(String::as_str), Some("0"));
    assert!(calls
        .iter()
        .any(|c| matches!(c, Call::Check(ids) if ids.len() == FeedbackId::iter().count())));
    assert_eq!(instance.variable("pgm1_input_id"), Some("0"));
}

#[tokio::test]
async fn test_changes_before_sync_are_dropped() {
    let (mut instance, host, _) = make_instance(ModelId::TWO_ME);
    host.take();

    let model = get_model_spec(ModelId::TWO_ME).unwrap();
    let state = with_program(&AtemState::for_model(model), 0, 1);
    instance.handle_event(DeviceEvent::StateChanged {
        changes: vec![StateChange::MixEffectProgram { me: 0 }],
        state: Arc::new(state),
    });

    assert!(host.take().is_empty());
    assert_eq!(instance.variable("pgm1_input_id"), None);
}

#[tokio::test]
async fn test_tally_before_sync_is_dropped() {
    let (mut instance, host, _) = make_instance(ModelId::TWO_ME);
    host.take();

    instance.handle_event(DeviceEvent::TallyBySource(BTreeMap::from([(
        1,
        TallyState {
            program: true,
            preview: false,
        },
    )])));

    assert!(host.take().is_empty());
    assert_eq!(instance.tally_feed().borrow().version, 0);
}

#[tokio::test]
async fn test_program_change_checks_only_matching_instances() {
    let (mut instance, host, _) = synced(ModelId::TWO_ME);
    instance.subscribe_feedback(
        "me1",
        FeedbackId::ProgramBg,
        OptionValues::new().with("mixeffect", 0).with("input", 1000),
    );
    instance.subscribe_feedback(
        "me2",
        FeedbackId::ProgramBg,
        OptionValues::new().with("mixeffect", 1).with("input", 1000),
    );
    instance.subscribe_feedback(
        "pvw",
        FeedbackId::PreviewBg,
        OptionValues::new().with("mixeffect", 0).with("input", 1000),
    );
    instance.subscribe_feedback(
        "vars",
        FeedbackId::ProgramBgVariables,
        OptionValues::new()
            .with("mixeffect", "$(atem:me)")
            .with("input", "1"),
    );

    let state = with_program(instance.state(), 0, 1000);
    instance.handle_event(DeviceEvent::StateChanged {
        changes: vec![StateChange::MixEffectProgram { me: 0 }],
        state: Arc::new(state),
    });

    let calls = host.take();
    assert_eq!(
        calls,
        vec![
            Call::Values(BTreeMap::from([
                ("pgm1_input".to_string(), "Bars".to_string()),
                ("pgm1_input_id".to_string(), "1000".to_string()),
            ])),
            Call::CheckIds(vec!["me1".to_string(), "vars".to_string()]),
        ]
    );
}

#[tokio::test]
async fn test_unsubscribed_instances_are_not_checked() {
    let (mut instance, host, _) = synced(ModelId::TWO_ME);
    instance.subscribe_feedback(
        "gone",
        FeedbackId::ProgramBg,
        OptionValues::new().with("mixeffect", 0),
    );
    instance.unsubscribe_feedback("gone");

    let state = with_program(instance.state(), 0, 2);
    instance.handle_event(DeviceEvent::StateChanged {
        changes: vec![StateChange::MixEffectProgram { me: 0 }],
        state: Arc::new(state),
    });

    assert!(!host
        .take()
        .iter()
        .any(|c| matches!(c, Call::CheckIds(_))));
}

#[tokio::test]
async fn test_input_name_rebuilds_named_definitions() {
    let (mut instance, host, _) = synced(ModelId::TWO_ME);

    let mut state = instance.state().clone();
    state.inputs.insert(1, named(1, "Camera One", "CAM1"));
    instance.handle_event(DeviceEvent::StateChanged {
        changes: vec![StateChange::InputName { input: 1 }],
        state: Arc::new(state),
    });

    let calls = host.take();
    assert!(calls.contains(&Call::Actions));
    assert!(calls.contains(&Call::Feedbacks));
    assert!(!calls.contains(&Call::Variables));
    assert!(calls.contains(&Call::Presets));
    assert!(calls.contains(&Call::Check(vec![FeedbackId::ProgramSourceLabel])));
    let values = values_pushed(&calls);
    assert_eq!(values.get("short_1").map(String::as_str), Some("CAM1"));
    assert_eq!(values.get("long_1").map(String::as_str), Some("Camera One"));
    assert!(!values.contains_key("pgm1_input_id"), "unchanged values stay");
}

#[tokio::test]
async fn test_structural_change_subsumes_batch() {
    let (mut instance, host, _) = synced(ModelId::TWO_ME);
    instance.subscribe_feedback(
        "me1",
        FeedbackId::ProgramBg,
        OptionValues::new().with("mixeffect", 0),
    );

    let state = with_program(instance.state(), 0, 3);
    instance.handle_event(DeviceEvent::StateChanged {
        changes: vec![
            StateChange::MixEffectProgram { me: 0 },
            StateChange::MediaPool,
        ],
        state: Arc::new(state),
    });

    let calls = host.take();
    assert!(calls.contains(&Call::Actions));
    assert!(calls.contains(&Call::Feedbacks));
    assert!(!calls.iter().any(|c| matches!(c, Call::CheckIds(_))));
    assert_eq!(instance.variable("pgm1_input_id"), Some("3"));
}

#[tokio::test]
async fn test_tally_checks_once_per_change() {
    let (mut instance, host, _) = synced(ModelId::TWO_ME);
    let map = BTreeMap::from([(
        1,
        TallyState {
            program: true,
            preview: false,
        },
    )]);

    instance.handle_event(DeviceEvent::TallyBySource(map.clone()));
    instance.handle_event(DeviceEvent::TallyBySource(map));

    assert_eq!(host.take(), vec![Call::Check(vec![FeedbackId::InputTally])]);
    let active = instance.evaluate_feedback(
        FeedbackId::InputTally,
        &OptionValues::new().with("input", 1).with("tally", "program"),
    );
    assert!(active.is_active());
    assert_eq!(instance.tally_feed().borrow().version, 1);
}

#[tokio::test]
async fn test_tally_ignored_when_polling_disabled() {
    let (mut instance, host, _) = synced(ModelId::TWO_ME);
    let mut config = instance.config().clone();
    config.poll_tally = false;
    instance.update_config(config);
    host.take();

    instance.handle_event(DeviceEvent::TallyBySource(BTreeMap::from([(
        1,
        TallyState::default(),
    )])));
    assert!(host.take().is_empty());
}

#[tokio::test]
async fn test_execute_action_sends_commands() {
    let (instance, _, device) = synced(ModelId::TWO_ME);

    let options = OptionValues::new().with("mixeffect", 1).with("input", 2);
    assert!(instance.execute_action(ActionId::Program, &options).await);
    assert_eq!(
        device.drain(),
        vec![SwitcherCommand::ProgramInput { me: 1, source: 2 }]
    );

    let bad = OptionValues::new().with("mixeffect", 7).with("input", 2);
    assert!(!instance.execute_action(ActionId::Program, &bad).await);
    assert!(device.sent().is_empty());
}

#[tokio::test]
async fn test_learn_requires_sync() {
    let (instance, _, _) = make_instance(ModelId::TWO_ME);
    let options = OptionValues::new().with("mixeffect", 0).with("input", 5);
    assert_eq!(instance.learn_action(ActionId::Program, &options), None);

    let (instance, _, _) = synced(ModelId::TWO_ME);
    let learned = instance
        .learn_action(ActionId::Program, &options)
        .expect("program is learnable");
    assert_eq!(learned.integer("input").ok(), Some(0));
}

#[tokio::test]
async fn test_model_change_rebuilds_definitions() {
    let (mut instance, host, _) = synced(ModelId::TWO_ME);
    assert_eq!(instance.model().mixeffects, 2);

    let config = ModuleConfig {
        model_id: ModelId::MINI_PRO,
        ..instance.config().clone()
    };
    instance.update_config(config);

    assert_eq!(instance.model().id, ModelId::MINI_PRO);
    let calls = host.take();
    assert!(calls.contains(&Call::Actions));
    assert!(calls.iter().any(|c| matches!(c, Call::Check(_))));
}

#[tokio::test]
async fn test_label_style_change_only_rebuilds_presets() {
    let (mut instance, host, _) = synced(ModelId::TWO_ME);
    let config = ModuleConfig {
        preset_label_style: crate::config::PresetLabelStyle::Long,
        ..instance.config().clone()
    };
    instance.update_config(config);
    assert_eq!(host.take(), vec![Call::Presets]);
}

#[tokio::test]
async fn test_auto_detect_follows_reported_model() {
    let (mut instance, host, _) = make_instance(ModelId::AUTO_DETECT);
    host.take();

    let model = get_model_spec(ModelId::TWO_ME).unwrap();
    instance.handle_event(DeviceEvent::FullSync(Arc::new(AtemState::for_model(model))));
    assert_eq!(instance.model().id, ModelId::TWO_ME);

    instance.handle_event(DeviceEvent::Disconnected);
    assert!(!instance.is_initialized());
}

#[tokio::test]
async fn test_reported_model_change_reselects_model() {
    let (mut instance, host, _) = make_instance(ModelId::AUTO_DETECT);
    let model = get_model_spec(ModelId::TWO_ME).unwrap();
    instance.handle_event(DeviceEvent::FullSync(Arc::new(AtemState::for_model(model))));
    host.take();

    let mut state = instance.state().clone();
    state.info.model = ModelId::MINI_PRO;
    instance.handle_event(DeviceEvent::StateChanged {
        changes: vec![StateChange::Info],
        state: Arc::new(state),
    });

    assert_eq!(instance.model().id, ModelId::MINI_PRO);
    assert!(host.take().contains(&Call::Actions));
}

#[tokio::test(start_paused = true)]
async fn test_immediate_gain_cancels_running_fade() {
    let (instance, _, device) = synced(ModelId::MINI);

    let fade = OptionValues::new()
        .with("source", "1:-65280")
        .with("gain", -20.0)
        .with("fadeDuration", 1000);
    assert!(instance.execute_action(ActionId::FairlightFaderGain, &fade).await);
    tokio::time::sleep(Duration::from_millis(150)).await;

    let jump = OptionValues::new()
        .with("source", "1:-65280")
        .with("gain", 5.0)
        .with("fadeDuration", 0);
    assert!(instance.execute_action(ActionId::FairlightFaderGain, &jump).await);
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(
        device.sent().last(),
        Some(&SwitcherCommand::FairlightFaderGain {
            input: 1,
            source: -65280,
            gain: 5.0
        })
    );
}

#[tokio::test]
async fn test_run_stops_when_events_close() {
    let (instance, host, _) = make_instance(ModelId::TWO_ME);
    let (event_tx, event_rx) = mpsc::channel(8);
    let (_config_tx, config_rx) = mpsc::channel(1);

    let model = get_model_spec(ModelId::TWO_ME).unwrap();
    event_tx
        .send(DeviceEvent::FullSync(Arc::new(AtemState::for_model(model))))
        .await
        .unwrap();
    drop(event_tx);

    tokio::time::timeout(
        Duration::from_secs(1),
        instance.run(event_rx, config_rx, std::future::pending()),
    )
    .await
    .expect("run loop should end with the event stream");

    assert!(host
        .take()
        .iter()
        .any(|c| matches!(c, Call::Values(v) if v.contains_key("pgm1_input"))));
}

#[tokio::test]
async fn test_two_me_program_scenario() {
    let (mut instance, _, _) = synced(ModelId::TWO_ME);

    let mut state = with_program(instance.state(), 0, 1);
    state.inputs.insert(1, named(1, "Camera 1", "CAM1"));
    let state = with_program(&state, 1, 1000);
    instance.handle_event(DeviceEvent::StateChanged {
        changes: vec![
            StateChange::MixEffectProgram { me: 0 },
            StateChange::MixEffectProgram { me: 1 },
        ],
        state: Arc::new(state),
    });

    assert_eq!(instance.variable("pgm1_input"), Some("CAM1"));
    assert_eq!(instance.variable("pgm2_input"), Some("Bars"));

    let on_me2 = OptionValues::new().with("mixeffect", 1).with("input", 1000);
    let on_me1 = OptionValues::new().with("mixeffect", 0).with("input", 1000);
    assert!(instance
        .evaluate_feedback(FeedbackId::ProgramBg, &on_me2)
        .is_active());
    assert!(!instance
        .evaluate_feedback(FeedbackId::ProgramBg, &on_me1)
        .is_active());
}

#[tokio::test]
async fn test_learned_action_reproduces_state() {
    let (mut instance, _, device) = synced(ModelId::TWO_ME);

    let mut state = instance.state().clone();
    if let Some(slot) = state.video.auxiliaries.get_mut(2) {
        *slot = Some(3);
    }
    instance.handle_event(DeviceEvent::StateChanged {
        changes: vec![StateChange::Auxiliary { aux: 2 }],
        state: Arc::new(state),
    });

    let options = OptionValues::new().with("aux", 2).with("input", 0);
    let learned = instance
        .learn_action(ActionId::Aux, &options)
        .expect("aux is learnable");
    assert!(instance.execute_action(ActionId::Aux, &learned).await);
    assert_eq!(
        device.drain(),
        vec![SwitcherCommand::AuxSource { aux: 2, source: 3 }]
    );
}
