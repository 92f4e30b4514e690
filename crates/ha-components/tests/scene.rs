//! Scenes applied to vacuums driven by the real vacuum services

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::WarnCounter;
use ha_components::scene::{apply_scene, find_scene, SceneConfig, SceneError};
use ha_components::vacuum::{
    load_vacuums, register_vacuum_services, VacuumConfig, VacuumReproducePlatform,
};
use ha_core::Context;
use ha_reproduce_state::{RecordingDispatcher, ReproduceError, StateReproducer};
use ha_service_registry::ServiceRegistry;
use ha_state_store::StateStore;
use serde_json::json;

const VACUUMS: &str = r#"
downstairs:
  name: Downstairs
  initial: idle
  fan_speed: low
  fan_speed_list: [low, medium, max]
  options:
    mop: false
upstairs:
  initial: cleaning
"#;

const SCENES: &str = r#"
- name: Deep clean
  entities:
    vacuum.downstairs:
      state: cleaning
      fan_speed: max
      option_list: [mop]
      mop: true
    vacuum.upstairs: docked
- name: Too fast
  entities:
    vacuum.downstairs:
      state: cleaning
      fan_speed: warp
    vacuum.upstairs: paused
- name: No mop
  entities:
    vacuum.downstairs:
      state: idle
      fan_speed: low
      option_list: [mop]
"#;

struct Home {
    states: Arc<StateStore>,
    dispatcher: Arc<RecordingDispatcher>,
    reproducer: StateReproducer,
    scenes: Vec<SceneConfig>,
}

fn setup() -> Home {
    let states = Arc::new(StateStore::new());
    let services = Arc::new(ServiceRegistry::new());
    register_vacuum_services(&services, states.clone()).unwrap();

    let vacuums: HashMap<String, Option<VacuumConfig>> = serde_yaml::from_str(VACUUMS).unwrap();
    assert_eq!(load_vacuums(&vacuums, &states), 2);

    let dispatcher = Arc::new(RecordingDispatcher::forwarding(services));
    let mut reproducer = StateReproducer::new(states.clone(), dispatcher.clone());
    reproducer.register_platform(Arc::new(VacuumReproducePlatform));

    Home {
        states,
        dispatcher,
        reproducer,
        scenes: serde_yaml::from_str(SCENES).unwrap(),
    }
}

#[tokio::test]
async fn test_scene_converges_and_is_idempotent() {
    let home = setup();
    let scene = find_scene(&home.scenes, "Deep clean").unwrap();
    let context = Context::with_user("scene-test");

    let report = apply_scene(&home.reproducer, scene, Some(context.clone()))
        .await
        .unwrap();
    assert_eq!(report.service_calls(), 4);

    let downstairs = home.states.get("vacuum.downstairs").unwrap();
    assert_eq!(downstairs.state, "cleaning");
    assert_eq!(downstairs.attr("fan_speed"), Some(&json!("max")));
    assert_eq!(downstairs.attr("mop"), Some(&json!(true)));
    assert_eq!(downstairs.context, context);
    assert!(home.states.is_state("vacuum.upstairs", "returning"));

    home.dispatcher.clear();
    home.states.set(
        "vacuum.upstairs".parse().unwrap(),
        "docked",
        HashMap::new(),
        Context::new(),
    );
    let (warnings, _guard) = WarnCounter::install();

    let again = apply_scene(&home.reproducer, scene, None).await.unwrap();
    assert_eq!(again.service_calls(), 0);
    assert!(home.dispatcher.calls().is_empty());
    assert_eq!(warnings.count(), 0);
}

#[tokio::test]
async fn test_rejected_fan_speed_fails_only_that_entity() {
    let home = setup();
    let scene = find_scene(&home.scenes, "Too fast").unwrap();

    let err = apply_scene(&home.reproducer, scene, None).await.unwrap_err();
    let err = match err {
        SceneError::Reproduce(err) => err,
        other => panic!("expected a reproduction error, got {other}"),
    };
    let ReproduceError::PartialFailure { failed, .. } = &err;
    assert_eq!(*failed, 1);

    let downstairs = home.states.get("vacuum.downstairs").unwrap();
    assert_eq!(downstairs.state, "cleaning");
    assert_eq!(downstairs.attr("fan_speed"), Some(&json!("low")));
    assert!(home.states.is_state("vacuum.upstairs", "paused"));
    assert_eq!(err.report().outcome("vacuum.upstairs").unwrap().service_calls(), 1);
}

#[tokio::test]
async fn test_cleared_option_stays_cleared() {
    let home = setup();
    let scene = find_scene(&home.scenes, "No mop").unwrap();

    let report = apply_scene(&home.reproducer, scene, None).await.unwrap();
    assert_eq!(home.dispatcher.service_ids(), vec!["vacuum.set_option"]);
    assert_eq!(report.service_calls(), 1);

    let downstairs = home.states.get("vacuum.downstairs").unwrap();
    assert_eq!(downstairs.attr("mop"), Some(&json!(null)));

    home.dispatcher.clear();
    let again = apply_scene(&home.reproducer, scene, None).await.unwrap();
    assert_eq!(again.service_calls(), 0);
    assert!(home.dispatcher.calls().is_empty());
}
