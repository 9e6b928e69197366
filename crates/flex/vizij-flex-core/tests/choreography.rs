use std::sync::Arc;

use vizij_flex_core::{
    run_frame, BlendContext, Config, ControllerDesc, ControllerRegistry, EventId, FlexActor,
    FlexAnimTrack, FlexBlendTarget, FlexCurve, FlexSettingLibrary, FrameInputs, FrameOutput,
    ModelDescriptor, SceneEvent, SceneEventKind,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn mk_cfg() -> Config {
    Config {
        controller_capacity: 64,
        delayed_weights: false,
        ..Config::default()
    }
}

fn mk_library() -> FlexSettingLibrary {
    let lib = FlexSettingLibrary::new();
    let json = vizij_test_fixtures::flex_settings::json("expressions").expect("fixture");
    lib.load_json(&json).expect("parse fixture");
    lib
}

fn mk_actor(reg: &ControllerRegistry, cfg: &Config, names: &[&str]) -> FlexActor {
    let model = ModelDescriptor::new(
        "m",
        names
            .iter()
            .map(|n| ControllerDesc::new(n, 0.0, 1.0))
            .collect(),
    );
    FlexActor::new("actor", cfg)
        .with_model(Arc::new(model), reg)
        .expect("valid model")
}

fn mk_expression(id: u32, setting: &str) -> SceneEvent {
    SceneEvent::new(
        EventId(id),
        SceneEventKind::Expression {
            file: "expressions".into(),
            setting: setting.into(),
        },
        0.0,
        10.0,
    )
}

fn mk_track_event(id: u32, tracks: Vec<FlexAnimTrack>, start: f32) -> SceneEvent {
    SceneEvent::new(
        EventId(id),
        SceneEventKind::FlexAnimation { tracks },
        start,
        start + 10.0,
    )
}

fn step(actor: &mut FlexActor, ctx: &BlendContext, scene_time: f32) -> FrameOutput {
    let inputs = FrameInputs::new(scene_time as f64, 0.033).with_scene_time(scene_time);
    run_frame(actor, ctx, &inputs).expect("actor has a model")
}

#[test]
fn expression_is_a_weighted_overwrite() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = mk_library();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["mouth_smile", "cheek_raise"]);
    actor.flex_state_mut().set_controller_weight(0, 0.4);
    actor.flex_state_mut().set_controller_weight(1, 0.4);

    let ev = mk_expression(1, "smile").with_intensity(FlexCurve::constant(0.5));
    actor.flex_state_mut().event_started(ev, &ctx);
    let out = step(&mut actor, &ctx, 1.0);

    assert_eq!(out.stats.scene_events, 1);
    // s = 0.5: 0.4 * 0.5 + 1.0 * 0.5
    approx(out.weights[0], 0.7, 1e-6);
    // s = 0.5 * 0.5: 0.4 * 0.75 + 0.6 * 0.25
    approx(out.weights[1], 0.45, 1e-6);
}

#[test]
fn full_intensity_expression_dominates() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = mk_library();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["mouth_smile"]);
    actor.flex_state_mut().set_controller_weight(0, 0.9);

    actor.flex_state_mut().event_started(mk_expression(1, "frown"), &ctx);
    let out = step(&mut actor, &ctx, 0.0);
    assert_eq!(out.weights[0], 0.0);
}

#[test]
fn later_events_win_on_shared_controllers() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = mk_library();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["mouth_smile", "brow_lower"]);

    actor.flex_state_mut().event_started(mk_expression(1, "smile"), &ctx);
    actor.flex_state_mut().event_started(mk_expression(2, "frown"), &ctx);
    let out = step(&mut actor, &ctx, 0.5);
    assert_eq!(out.weights[0], 0.0);
    approx(out.weights[1], 0.8, 1e-6);

    // restarting smile moves it to the end of the order
    actor.flex_state_mut().event_started(mk_expression(1, "smile"), &ctx);
    let ids: Vec<EventId> = actor
        .flex_state()
        .choreography()
        .active_events()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![EventId(2), EventId(1)]);
    let out = step(&mut actor, &ctx, 0.6);
    assert_eq!(out.weights[0], 1.0);
    approx(out.weights[1], 0.8, 1e-6);
}

#[test]
fn unresolved_expression_is_skipped() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = mk_library();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["brow_raise", "mouth_smile"]);

    actor.flex_state_mut().event_started(mk_expression(1, "no_such_setting"), &ctx);
    let missing_file = SceneEvent::new(
        EventId(2),
        SceneEventKind::Expression {
            file: "no_such_file".into(),
            setting: "smile".into(),
        },
        0.0,
        1.0,
    );
    actor.flex_state_mut().event_started(missing_file, &ctx);
    actor.flex_state_mut().event_started(mk_expression(3, "surprise"), &ctx);

    let out = step(&mut actor, &ctx, 0.0);
    assert_eq!(actor.flex_state().choreography().len(), 3);
    assert_eq!(out.stats.scene_events, 1);
    assert_eq!(out.weights, vec![1.0, 0.0]);
}

#[test]
fn ended_event_stops_contributing() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = mk_library();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["mouth_smile"]);

    actor.flex_state_mut().event_started(mk_expression(7, "smile"), &ctx);
    assert_eq!(step(&mut actor, &ctx, 0.0).weights[0], 1.0);
    assert!(actor.flex_state_mut().event_ended(EventId(7)));
    assert!(!actor.flex_state_mut().event_ended(EventId(7)));
    assert_eq!(step(&mut actor, &ctx, 0.1).weights[0], 0.0);
}

#[test]
fn no_scene_time_skips_scene_events() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = mk_library();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["mouth_smile"]);
    actor.flex_state_mut().event_started(mk_expression(1, "smile"), &ctx);

    let out = run_frame(&mut actor, &ctx, &FrameInputs::new(0.0, 0.033)).unwrap();
    assert_eq!(out.stats.scene_events, 0);
    assert_eq!(out.weights[0], 0.0);
}

#[test]
fn track_event_ramps_in_and_restarts_from_zero() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = FlexSettingLibrary::new();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["jaw_drop"]);
    let track = FlexAnimTrack::new("jaw_drop", FlexCurve::constant(1.0));

    actor
        .flex_state_mut()
        .event_started(mk_track_event(1, vec![track.clone()], 0.0), &ctx);
    let mut last = 0.0;
    for frame in 1..=12 {
        let w = step(&mut actor, &ctx, frame as f32 * 0.033).weights[0];
        assert!(w >= last, "ramp must not decrease");
        if frame <= 10 {
            approx(w, 0.1 * frame as f32, 1e-4);
        }
        last = w;
    }
    assert_eq!(last, 1.0);
    let binding = actor.flex_state().choreography().binding(EventId(1)).unwrap();
    assert!(binding.started);
    assert_eq!(binding.weight, 1.0);

    actor
        .flex_state_mut()
        .event_started(mk_track_event(1, vec![track], 0.0), &ctx);
    assert_eq!(
        actor.flex_state().choreography().binding(EventId(1)).unwrap().weight,
        0.0
    );
    approx(step(&mut actor, &ctx, 1.0).weights[0], 0.1, 1e-6);
}

#[test]
fn track_curves_are_sampled_from_event_start() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = FlexSettingLibrary::new();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["brow_raise"]);
    let track = FlexAnimTrack::new("brow_raise", FlexCurve::linear(&[(0.0, 0.0), (1.0, 1.0)]));
    actor
        .flex_state_mut()
        .event_started(mk_track_event(1, vec![track], 5.0), &ctx);

    // finish the ramp, then sample half a second into the event
    for _ in 0..10 {
        step(&mut actor, &ctx, 5.0);
    }
    approx(step(&mut actor, &ctx, 5.5).weights[0], 0.5, 1e-5);
}

#[test]
fn combo_track_splits_by_balance() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = FlexSettingLibrary::new();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["left_smirk", "right_smirk", "left_sneer", "right_sneer"]);

    let smirk = FlexAnimTrack::combo(
        "smirk",
        FlexCurve::constant(0.8),
        Some(FlexCurve::constant(0.0)),
    );
    let sneer = FlexAnimTrack::combo("sneer", FlexCurve::constant(0.6), None);
    actor
        .flex_state_mut()
        .event_started(mk_track_event(1, vec![smirk, sneer], 0.0), &ctx);

    for _ in 0..9 {
        step(&mut actor, &ctx, 0.0);
    }
    let out = step(&mut actor, &ctx, 0.0);
    approx(out.weights[0], 0.8, 1e-5);
    assert_eq!(out.weights[1], 0.0);
    approx(out.weights[2], 0.6, 1e-5);
    approx(out.weights[3], 0.6, 1e-5);
}

#[test]
fn other_events_are_tracked_but_inert() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = FlexSettingLibrary::new();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["jaw_drop"]);
    actor
        .flex_state_mut()
        .event_started(SceneEvent::new(EventId(4), SceneEventKind::Other, 0.0, 1.0), &ctx);
    let out = step(&mut actor, &ctx, 0.5);
    assert_eq!(out.stats.scene_events, 0);
    assert_eq!(actor.flex_state().choreography().len(), 1);
}

#[test]
fn events_with_malformed_curves_are_ignored() {
    let reg = ControllerRegistry::with_capacity(64);
    let lib = mk_library();
    let cfg = mk_cfg();
    let ctx = BlendContext::new(&reg, &lib, &cfg);
    let mut actor = mk_actor(&reg, &cfg, &["mouth_smile", "jaw_drop"]);

    let bad_intensity = mk_expression(1, "smile")
        .with_intensity(FlexCurve::linear(&[(f32::NAN, 1.0), (1.0, 0.5)]));
    let bad_track = mk_track_event(
        2,
        vec![FlexAnimTrack::new(
            "jaw_drop",
            FlexCurve::linear(&[(0.0, 1.0), (f32::NAN, 0.0)]),
        )],
        0.0,
    );
    actor.flex_state_mut().event_started(bad_intensity, &ctx);
    actor.flex_state_mut().event_started(bad_track, &ctx);
    assert!(actor.flex_state().choreography().is_empty());

    let out = step(&mut actor, &ctx, 0.5);
    assert_eq!(out.stats.scene_events, 0);
    assert_eq!(out.weights, vec![0.0, 0.0]);
}
