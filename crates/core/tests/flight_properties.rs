use gesture_pilot_core::link::{LinkCall, RecordingLink};
use gesture_pilot_core::{
    normalize, ClassifierError, FeatureVector, FlightConfig, FlightEvent, FlightPhase,
    FlightStateMachine, GestureClassifier, GestureTable, KeypointModel, LandmarkFrame,
    MovementFrame, Outcome, PixelPoint,
};
use proptest::prelude::*;

const COOLDOWN_US: u64 = 1_000_000;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn create_machine() -> (FlightStateMachine, RecordingLink) {
    let link = RecordingLink::new(MovementFrame::Body);
    let fsm = FlightStateMachine::new(Box::new(link.clone()), FlightConfig::default());
    (fsm, link)
}

fn event_strategy() -> impl Strategy<Value = FlightEvent> {
    prop_oneof![
        Just(FlightEvent::TakeoffOrAscend),
        Just(FlightEvent::DescendOrLand),
        Just(FlightEvent::MoveForward),
        Just(FlightEvent::MoveBackward),
        Just(FlightEvent::RotateCw),
        Just(FlightEvent::RotateCcw),
        Just(FlightEvent::Flip),
    ]
}

/// Model that returns whatever class id it was built with.
struct ScriptedModel(Vec<usize>);

impl KeypointModel for ScriptedModel {
    fn infer(&mut self, _features: &FeatureVector) -> Result<usize, ClassifierError> {
        self.0
            .pop()
            .ok_or_else(|| ClassifierError::Model("script exhausted".into()))
    }
}

#[tokio::test]
async fn scenario_takeoff_ascend_descend_lands() {
    let (mut fsm, link) = create_machine();

    fsm.dispatch(FlightEvent::TakeoffOrAscend, 0).await;
    assert_eq!(fsm.state().altitude_cm, 2.0);
    fsm.dispatch(FlightEvent::TakeoffOrAscend, 10).await;
    assert_eq!(fsm.state().altitude_cm, 12.0);
    fsm.dispatch(FlightEvent::DescendOrLand, 20).await;

    let state = fsm.state();
    assert_eq!(state.phase, FlightPhase::Grounded);
    assert_eq!(state.altitude_cm, 0.0);
    assert_eq!(link.count("land"), 1);
}

#[tokio::test]
async fn unknown_classification_never_reaches_link() {
    let (mut fsm, link) = create_machine();
    // 9 and 42 are not in the default table; the third call fails in the model
    let model = ScriptedModel(vec![42, 9]);
    let mut classifier = GestureClassifier::new(Box::new(model), GestureTable::default());

    let frame = LandmarkFrame::new(vec![PixelPoint::new(0, 0), PixelPoint::new(3, 4)]).unwrap();
    let features = normalize(&frame).features;

    for t in 0..3u64 {
        if let Some(gesture) = classifier.classify(&features).gesture() {
            fsm.dispatch(gesture.event(), t * 2 * COOLDOWN_US).await;
        }
    }
    assert!(link.calls().is_empty());
}

#[tokio::test]
async fn gesture_table_drives_flight() {
    let (mut fsm, link) = create_machine();
    // Popped from the back: Open (0), then Peace sign (4)
    let model = ScriptedModel(vec![4, 0]);
    let mut classifier = GestureClassifier::new(Box::new(model), GestureTable::default());
    let features = FeatureVector::new(vec![0.0; 42]);

    for t in [0, 2 * COOLDOWN_US] {
        let gesture = classifier.classify(&features).gesture().unwrap();
        assert!(fsm.dispatch(gesture.event(), t).await.is_executed());
    }
    assert_eq!(link.calls(), vec![LinkCall::Takeoff, LinkCall::SetYawRate(30.0)]);
    assert_eq!(fsm.state().yaw_deg, 30.0);
}

proptest! {
    #[test]
    fn gated_actions_respect_cooldown(
        steps in prop::collection::vec((event_strategy(), 0u64..600_000), 1..60)
    ) {
        let rt = runtime();
        let (mut fsm, _link) = create_machine();
        let mut now = 0u64;
        let mut dispatched = Vec::new();

        for (event, gap) in steps {
            now += gap;
            let outcome = rt.block_on(fsm.dispatch(event, now));
            if event.is_gated() && matches!(outcome, Outcome::Executed(_)) {
                dispatched.push(now);
            }
        }

        for pair in dispatched.windows(2) {
            prop_assert!(pair[1] - pair[0] > COOLDOWN_US);
        }
    }

    #[test]
    fn altitude_never_negative(
        steps in prop::collection::vec((event_strategy(), 0u64..3_000_000), 1..60),
        failing in prop::option::of(prop_oneof![Just("land"), Just("set_velocity")])
    ) {
        let rt = runtime();
        let (mut fsm, link) = create_machine();
        if let Some(kind) = failing {
            link.fail(kind);
        }
        let mut now = 0u64;

        for (event, gap) in steps {
            now += gap;
            rt.block_on(fsm.dispatch(event, now));
            prop_assert!(fsm.state().altitude_cm >= 0.0);
            if fsm.state().phase == FlightPhase::Grounded {
                prop_assert_eq!(fsm.state().altitude_cm, 0.0);
            }
        }
    }
}
