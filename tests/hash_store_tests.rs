use futures::future::join_all;
use moatdb::{
    AttributeType, Entity, MoatError, ModelClass, ModelDescriptor, ModelFactory, ProviderOptions,
    ProviderRegistry, Value,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::oneshot;

fn device_class(max_size: usize) -> ModelClass {
    let registry = Arc::new(ProviderRegistry::with_default_providers());
    registry
        .init_provider("hash", &ProviderOptions::new().max_size(max_size))
        .unwrap();
    let descriptor = ModelDescriptor::new()
        .attribute("x", AttributeType::Int32)
        .attribute("label", AttributeType::Other("string".into()))
        .command("reboot");
    ModelFactory::with_registry(registry)
        .build("Device", &descriptor)
        .unwrap()
}

fn device(class: &ModelClass, uid: &str, x: i64) -> Entity {
    let mut entity = class.new_instance().unwrap();
    entity.set_uid(uid);
    entity.set("x", x).unwrap();
    entity
}

#[tokio::test]
async fn stored_entity_round_trips_by_uid() {
    let class = device_class(10);
    let mut entity = class.new_instance().unwrap();
    entity.set("x", 5).unwrap();

    let added = class.add(&mut entity).unwrap().await.unwrap();
    let uid = entity.uid().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&uid).is_ok());
    assert_eq!(added, entity);

    let found = class.find_by_uid(&uid).unwrap().await.unwrap();
    assert_eq!(found, entity);
    assert_eq!(found.get("x"), Some(&Value::Integer(5)));
    assert_eq!(class.find_all_uids().unwrap().await.unwrap(), vec![uid]);
    assert_eq!(class.count().unwrap().await.unwrap(), 1);
}

#[tokio::test]
async fn store_keeps_its_own_copy() {
    let class = device_class(10);
    let mut entity = device(&class, "d-1", 1);
    class.add(&mut entity).unwrap().await.unwrap();

    entity.set("x", 99).unwrap();
    let mut found = class.find_by_uid("d-1").unwrap().await.unwrap();
    assert_eq!(found.get("x"), Some(&Value::Integer(1)));

    found.set("x", 42).unwrap();
    let again = class.find_by_uid("d-1").unwrap().await.unwrap();
    assert_eq!(again.get("x"), Some(&Value::Integer(1)));
}

#[tokio::test]
async fn capacity_is_never_exceeded() {
    let class = device_class(2);
    for uid in ["a", "b"] {
        class.add(&mut device(&class, uid, 0)).unwrap().await.unwrap();
    }

    let err = class
        .add(&mut device(&class, "c", 0))
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Size full, remove entries prior to adding a new one. Size:2"
    );

    // an upsert of a new uid is capacity-checked too, a replace is not
    assert!(matches!(
        class.update(&device(&class, "c", 0)).unwrap().await,
        Err(MoatError::CapacityExceeded(2))
    ));
    class.update(&device(&class, "a", 7)).unwrap().await.unwrap();
    assert_eq!(class.count().unwrap().await.unwrap(), 2);

    class.remove("b").unwrap().await.unwrap();
    class.add(&mut device(&class, "c", 0)).unwrap().await.unwrap();
    assert_eq!(class.count().unwrap().await.unwrap(), 2);
}

#[tokio::test]
async fn duplicate_uid_is_rejected() {
    let class = device_class(10);
    class.add(&mut device(&class, "dup", 1)).unwrap().await.unwrap();

    let err = class
        .add(&mut device(&class, "dup", 2))
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Duplicate entry, uid:dup");

    let stored = class.find_by_uid("dup").unwrap().await.unwrap();
    assert_eq!(stored.get("x"), Some(&Value::Integer(1)));
}

#[tokio::test]
async fn absent_uid_fails_the_same_way_everywhere() {
    let class = device_class(10);
    let ghost = device(&class, "ghost", 0);

    let found = class.find_by_uid("ghost").unwrap().await.unwrap_err();
    let removed = class.remove("ghost").unwrap().await.unwrap_err();
    let patched = class
        .update_fields(&ghost, &["x"])
        .unwrap()
        .await
        .unwrap_err();

    for err in [found, removed, patched] {
        assert_eq!(err.to_string(), "Missing entry, uid:ghost");
    }
}

#[tokio::test]
async fn update_fields_touches_only_named_fields() {
    let class = device_class(10);
    let mut entity = device(&class, "p-1", 1);
    entity.set("label", "first").unwrap();
    class.add(&mut entity).unwrap().await.unwrap();

    let mut changed = device(&class, "p-1", 2);
    changed.set("label", "second").unwrap();
    let (stored, fields) = class
        .update_fields(&changed, &["x"])
        .unwrap()
        .await
        .unwrap();

    assert_eq!(fields, vec!["x".to_string()]);
    assert_eq!(stored.get("x"), Some(&Value::Integer(2)));
    assert_eq!(stored.get("label").and_then(Value::as_str), Some("first"));

    assert!(matches!(
        class.update_fields(&changed, &[]),
        Err(MoatError::MissingArgument(_))
    ));
    assert!(matches!(
        class.update_fields(&changed, &["colour"]),
        Err(MoatError::UnknownAttribute(_, _))
    ));
}

#[tokio::test]
async fn entities_of_other_models_are_incompatible() {
    let class = device_class(10);
    let other = device_class(10);
    let mut foreign = device(&other, "f-1", 0);

    assert!(matches!(
        class.add(&mut foreign),
        Err(MoatError::IncompatibleEntity)
    ));
    assert!(matches!(
        class.update(&foreign),
        Err(MoatError::IncompatibleEntity)
    ));
    assert_eq!(class.count().unwrap().await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_adds_all_land() {
    let class = device_class(100);
    let completions: Vec<_> = (0..50)
        .map(|i| {
            let mut entity = class.new_instance().unwrap();
            entity.set("x", i as i64).unwrap();
            class.add(&mut entity).unwrap()
        })
        .collect();

    let results = join_all(completions).await;
    let uids: HashSet<String> = results
        .into_iter()
        .map(|stored| stored.unwrap().uid().unwrap().to_string())
        .collect();

    assert_eq!(uids.len(), 50);
    assert_eq!(class.count().unwrap().await.unwrap(), 50);
}

#[tokio::test]
async fn operations_on_one_uid_apply_in_order() {
    let class = device_class(10);
    let add = class.add(&mut device(&class, "o-1", 1)).unwrap();
    let first = class.update(&device(&class, "o-1", 2)).unwrap();
    let second = class.update(&device(&class, "o-1", 3)).unwrap();
    let remove = class.remove("o-1").unwrap();
    let find = class.find_by_uid("o-1").unwrap();

    // awaited out of order on purpose
    assert!(matches!(find.await, Err(MoatError::MissingEntry(_))));
    assert_eq!(
        remove.await.unwrap().get("x"),
        Some(&Value::Integer(3))
    );
    assert_eq!(second.await.unwrap().get("x"), Some(&Value::Integer(3)));
    assert_eq!(first.await.unwrap().get("x"), Some(&Value::Integer(2)));
    assert!(add.await.is_ok());
}

#[tokio::test]
async fn completion_callback_runs_once() {
    let class = device_class(10);
    let completion = class.add(&mut device(&class, "cb-1", 1)).unwrap();
    assert_eq!(completion.correlation_id().to_string(), "add-cb-1");

    let (tx, rx) = oneshot::channel();
    completion
        .on_complete(move |result| {
            let _ = tx.send(result.map(|entity| entity.uid().map(str::to_string)));
        })
        .await
        .unwrap();

    assert_eq!(rx.await.unwrap().unwrap().as_deref(), Some("cb-1"));
    assert_eq!(
        class.count().unwrap().correlation_id().to_string(),
        "count-result"
    );
}
