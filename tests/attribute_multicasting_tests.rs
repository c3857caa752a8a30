
use std::collections::BTreeMap;
use std::rc::Rc;

use fixtures::*;
use multicasting::handlers::{DefaultHandler, Images, Map, RollPaperType, SingleType};
use multicasting::prelude::*;
use serde_json::{Value as JsonValue, json};

fn text(value: &str) -> Value {
    Value::from(value)
}

fn int(value: i64) -> Value {
    Value::Integer(value)
}

fn store() -> Result<Rc<MemoryStore>> {
    Ok(Rc::new(seeded_store()?))
}

#[test]
fn test_types_of_entities() -> Result<()> {
    let store = store()?;

    let definition = additional_fields_of_pages(KeyCache::new())?;
    let model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());
    assert_eq!(model.types_of_entities()?, vec![text("map"), text("images")]);

    let definition = sheet()?;
    let model = model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    assert_eq!(model.types_of_entities()?, vec![text("single"), text("roll")]);

    // A kind without any mapping
    let definition = MulticastDefinition::builder(
        MulticastConfig::new()
            .property_for_entity("properties")
            .source_with_entity_type("type"),
    )
    .build()?;
    let model = model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    let res = model.types_of_entities();
    match res {
        Err(MulticastError::UndefinedEntityTypeMapping) => {}
        _ => panic!("Expected UndefinedEntityTypeMapping, got {:?}", res),
    }

    Ok(())
}

#[test]
fn test_entity_type_by_key() -> Result<()> {
    let store = store()?;

    let definition = additional_fields_of_pages(KeyCache::new())?;
    let model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());
    assert_eq!(model.entity_type_by_key(&int(2), false)?, Some(text("images")));
    assert_eq!(model.entity_type_by_key(&int(3), false)?, Some(text("custom")));
    assert_eq!(model.entity_type_by_key(&int(1), false)?, Some(text("map")));
    assert_eq!(model.entity_type_by_key(&int(15), false)?, None);
    assert_eq!(model.entity_type_by_key(&int(4), false)?, None);

    let definition = sheet()?;
    let model = model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    assert_eq!(model.entity_type_by_key(&text("roll"), false)?, Some(text("roll")));
    assert_eq!(model.entity_type_by_key(&text("unknown"), false)?, Some(text("unknown")));
    assert_eq!(model.entity_type_by_key(&text("undefined"), false)?, None);

    Ok(())
}

#[test]
fn test_entity_key_by_type() -> Result<()> {
    let store = store()?;

    let definition = additional_fields_of_pages(KeyCache::new())?;
    let model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());
    assert_eq!(model.entity_key_by_type(&text("images"), false)?, Some(int(2)));
    assert_eq!(model.entity_key_by_type(&text("custom"), false)?, Some(int(3)));
    assert_eq!(model.entity_key_by_type(&text("map"), false)?, Some(int(1)));
    assert_eq!(model.entity_key_by_type(&text("undefined"), false)?, None);

    let definition = sheet()?;
    let model = model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    assert_eq!(model.entity_key_by_type(&text("roll"), false)?, Some(text("roll")));
    assert_eq!(model.entity_key_by_type(&text("undefined"), false)?, None);

    Ok(())
}

#[test]
fn test_entity_types_and_keys() -> Result<()> {
    let store = store()?;
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());

    // 1. Types keyed by keys, records without a type are skipped
    let all = BTreeMap::from([
        (int(1), text("map")),
        (int(2), text("images")),
        (int(3), text("custom")),
        (int(6), text("local_pages")),
    ]);
    assert_eq!(model.entity_types_with_keys(false)?, all);
    assert_eq!(
        model.entity_types_with_keys(true)?,
        BTreeMap::from([(int(1), text("map")), (int(2), text("images"))])
    );

    // 2. Keys keyed by types
    let all = BTreeMap::from([
        (text("custom"), int(3)),
        (text("images"), int(2)),
        (text("local_pages"), int(6)),
        (text("map"), int(1)),
    ]);
    assert_eq!(model.entity_keys_with_types(false)?, all);
    assert_eq!(
        model.entity_keys_with_types(true)?,
        BTreeMap::from([(text("images"), int(2)), (text("map"), int(1))])
    );

    // 3. Plain lists
    assert_eq!(
        model.entity_types(false)?,
        vec![text("map"), text("images"), text("custom"), text("local_pages")]
    );
    assert_eq!(model.entity_types(true)?, vec![text("map"), text("images")]);
    assert_eq!(model.entity_keys(false)?, vec![int(3), int(2), int(6), int(1)]);
    assert_eq!(model.entity_keys(true)?, vec![int(2), int(1)]);

    // 4. Local source
    let definition = sheet()?;
    let model = model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    assert_eq!(
        model.entity_types_with_keys(false)?,
        BTreeMap::from([
            (text("roll"), text("roll")),
            (text("single"), text("single")),
            (text("unknown"), text("unknown")),
        ])
    );
    assert_eq!(
        model.entity_keys_with_types(true)?,
        BTreeMap::from([(text("roll"), text("roll")), (text("single"), text("single"))])
    );

    Ok(())
}

#[test]
fn test_handler_classes() -> Result<()> {
    let store = store()?;

    let definition = additional_fields_of_pages(KeyCache::new())?;
    let model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());
    assert!(model.has_entity_type(&text("images")));
    assert!(!model.has_entity_type(&text("Images")));
    assert!(!model.has_entity_type(&text("custom")));
    assert!(model.has_default_entity_handler());
    assert_eq!(
        model.default_entity_handler().map(HandlerClass::short_name),
        Some("DefaultHandler")
    );
    assert_eq!(
        model.handler_class_by_type(Some(&text("map"))).map(HandlerClass::short_name),
        Some("Map")
    );
    assert_eq!(model.handler_class_by_type(Some(&text("custom"))), None);
    assert_eq!(
        model.handler_class_or_default(Some(&text("custom"))).map(HandlerClass::short_name),
        Some("DefaultHandler")
    );
    assert_eq!(
        model.handler_class_or_default(None).map(HandlerClass::short_name),
        Some("DefaultHandler")
    );

    let definition = sheet()?;
    let model = model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    assert!(!model.has_default_entity_handler());
    assert_eq!(model.default_entity_handler(), None);
    assert_eq!(model.handler_class_or_default(Some(&text("unknown"))), None);

    Ok(())
}

#[test]
fn test_instance_of_additional_fields() -> Result<()> {
    let store = store()?;
    let definition = additional_fields_of_pages(KeyCache::new())?;

    let mut model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());
    let map = model.instance_as::<Map>()?.expect("map handler");
    assert_eq!(JsonValue::Object(map.to_array()), map_values());
    assert_eq!(map.title(), "This is a map");

    let mut model = model_of(pivot_of_field(store.as_ref(), 2)?, &definition, store.clone());
    let images = model.instance_as::<Images>()?.expect("images handler");
    assert_eq!(images.ids(), vec![1, 2, 3, 4, 5, 6, 7]);
    assert!(images.is_active());
    assert_eq!(JsonValue::Object(images.to_array()), image_values());

    // No mapping for 'custom', the default handler keeps the values
    let mut model = model_of(pivot_of_field(store.as_ref(), 3)?, &definition, store.clone());
    let custom = model.instance_as::<DefaultHandler>()?.expect("default handler");
    assert_eq!(JsonValue::Object(custom.values().clone()), contact_values());

    // Inactive field without a type falls back to the default handler too
    let mut model = model_of(pivot_of_field(store.as_ref(), 7)?, &definition, store.clone());
    let inactive = model.instance_as::<DefaultHandler>()?.expect("default handler");
    assert!(inactive.values().is_empty());

    Ok(())
}

#[test]
fn test_instance_of_sheet() -> Result<()> {
    let store = store()?;
    let definition = sheet()?;

    let mut model = model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    let instance = model.instance()?.expect("single sheet handler");
    assert!(instance.is::<SingleType>());
    let single = instance.downcast_ref::<SingleType>().expect("single type");
    assert_eq!(single.entity_type(), &text("single"));
    assert_eq!((single.height(), single.width()), (200, 150));
    assert_eq!((single.available_height(), single.available_width()), (175, 100));

    let mut model = model_of(sheet_of_type(store.as_ref(), "roll")?, &definition, store.clone());
    let roll = model.instance_as::<RollPaperType>()?.expect("roll handler");
    assert_eq!(roll.indent(), 10);
    assert!(roll.can_contain(199980, 14980));
    assert!(!roll.can_contain(199981, 14981));

    let mut model = model_of(sheet_of_type(store.as_ref(), "unknown")?, &definition, store.clone());
    assert!(model.instance()?.is_none());
    assert!(model.is_resolved());

    Ok(())
}

#[test]
fn test_instance_is_memoized() -> Result<()> {
    let store = Rc::new(CountingStore::new(seeded_store()?));
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.inner(), 1)?, &definition, store.clone());

    assert!(!model.is_resolved());
    assert!(model.current_instance().is_none());

    model.instance_as::<Map>()?.expect("map handler").set_title("Changed");
    let lookups = store.lookups();

    // Second access returns the same handler without touching the store
    let map = model.instance_as::<Map>()?.expect("map handler");
    assert_eq!(map.title(), "Changed");
    assert_eq!(store.lookups(), lookups);

    Ok(())
}

#[test]
fn test_key_cache() -> Result<()> {
    let store = Rc::new(CountingStore::new(seeded_store()?));
    let cache = KeyCache::new();
    let definition = additional_fields_of_pages(cache.clone())?;
    let model = model_of(pivot_of_field(store.inner(), 1)?, &definition, store.clone());

    // 1. Missing key is not cached
    assert_eq!(model.entity_type_by_key(&int(15), true)?, None);
    assert!(!cache.has(&int(15))?);
    assert_eq!(store.lookups(), 1);

    // 2. Found key is cached and read once
    assert_eq!(model.entity_type_by_key(&int(1), true)?, Some(text("map")));
    assert!(cache.has(&int(1))?);
    assert_eq!(store.lookups(), 2);
    assert_eq!(model.entity_type(true)?, Some(text("map")));
    assert_eq!(model.entity_type(true)?, Some(text("map")));
    assert_eq!(store.lookups(), 2);

    // 3. Without cache every call reaches the store
    assert_eq!(model.entity_type(false)?, Some(text("map")));
    assert_eq!(model.entity_type(false)?, Some(text("map")));
    assert_eq!(store.lookups(), 4);

    // 4. Reverse lookups go through the same cache
    assert_eq!(model.entity_key_by_type(&text("map"), true)?, Some(int(1)));
    assert_eq!(store.lookups(), 4);
    assert_eq!(model.entity_key_by_type(&text("images"), true)?, Some(int(2)));
    assert_eq!(store.lookups(), 5);
    assert_eq!(cache.get(&int(2))?, Some(text("images")));

    // 5. Another record kind sharing the cache sees the entries
    let other = additional_fields_of_pages(cache.clone())?;
    let model = model_of(pivot_of_field(store.inner(), 2)?, &other, store.clone());
    assert_eq!(model.entity_type(true)?, Some(text("images")));
    assert_eq!(store.lookups(), 5);

    Ok(())
}

#[test]
fn test_set_instance_of_additional_field() -> Result<()> {
    let store = store()?;
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());

    // 1. Set a changed copy of the handler
    let mut map = model.instance_as::<Map>()?.cloned().expect("map handler");
    map.set_title("New title");
    map.set_address("Minsk");
    model.set_instance(Box::new(map.clone()))?;
    assert_eq!(model.raw_value()?, JsonValue::Object(map.to_array()));

    // 2. Persist and reload
    model.save()?;
    let mut reloaded = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());
    let reloaded_map = reloaded.instance_as::<Map>()?.expect("map handler");
    assert_eq!(*reloaded_map, map);

    Ok(())
}

#[test]
fn test_set_another_instance_of_sheet() -> Result<()> {
    let store = store()?;
    let definition = related_sheet()?;

    let mut roll_model =
        model_of(sheet_of_type(store.as_ref(), "roll")?, &definition, store.clone());
    let roll = roll_model.instance_as::<RollPaperType>()?.cloned().expect("roll handler");

    let mut single_model =
        model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    single_model.set_instance(Box::new(roll))?;
    single_model.save()?;

    // The single sheet now carries the geometry of the roll in its properties
    let mut reloaded =
        model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    let single = reloaded.instance_as::<SingleType>()?.expect("single handler");
    let expected = json!({
        "width": 15000,
        "height": 200000,
        "available_height": 199980,
        "available_width": 14980,
        "margin_top": 10,
        "margin_bottom": 10,
        "margin_left": 10,
        "margin_right": 10,
    });
    assert_eq!(JsonValue::Object(single.to_array()), expected);

    Ok(())
}

#[test]
fn test_sync_without_handler() -> Result<()> {
    let store = store()?;
    let definition = sheet()?;
    let mut model = model_of(sheet_of_type(store.as_ref(), "unknown")?, &definition, store.clone());

    assert_eq!(model.sync_instance_with_property()?, JsonValue::Null);
    assert_eq!(model.raw_value()?, JsonValue::Null);

    Ok(())
}

#[test]
fn test_missing_handler_is_kept_until_reset() -> Result<()> {
    let store = store()?;
    let definition = sheet()?;
    let mut model = model_of(sheet_of_type(store.as_ref(), "unknown")?, &definition, store.clone());
    assert!(model.instance()?.is_none());

    model.record().borrow_mut().set("type", "roll");
    assert!(model.instance()?.is_none());

    model.reset()?;
    assert!(!model.is_resolved());
    assert!(model.instance_as::<RollPaperType>()?.is_some());

    Ok(())
}

#[test]
fn test_update_instance() -> Result<()> {
    let store = store()?;
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());

    // 1. Another concrete type is refused
    let res = model.update_instance(Box::new(Images::default()), true);
    match res {
        Err(MulticastError::DifferentTypesOfEntities) => {}
        _ => panic!("Expected DifferentTypesOfEntities, got {:?}", res),
    }
    assert!(!model.update_instance(Box::new(Images::default()), false)?);
    assert_eq!(model.raw_value()?, map_values());

    // 2. Same type replaces and syncs
    let mut map = Map::default();
    map.set_title("Updated");
    assert!(model.update_instance(Box::new(map.clone()), true)?);
    assert_eq!(model.raw_value()?, JsonValue::Object(map.to_array()));

    // 3. Nothing to update
    let sheets = sheet()?;
    let mut unknown = model_of(sheet_of_type(store.as_ref(), "unknown")?, &sheets, store.clone());
    let res = unknown.update_instance(Box::new(Map::default()), true);
    match res {
        Err(MulticastError::UndefinedCurrentInstance) => {}
        _ => panic!("Expected UndefinedCurrentInstance, got {:?}", res),
    }
    assert!(!unknown.update_instance(Box::new(Map::default()), false)?);

    Ok(())
}

#[test]
fn test_change_entity_type() -> Result<()> {
    let store = store()?;
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());
    assert!(model.instance_as::<Map>()?.is_some());

    // 1. Remote source: the key field points at the new type
    assert!(model.change_entity_type(&text("images"))?);
    assert_eq!(model.record().borrow().scalar("additional_field_id"), Some(int(2)));
    assert_eq!(model.raw_value()?, JsonValue::Null);
    assert!(!model.is_resolved());
    let images = model.instance_as::<Images>()?.expect("images handler");
    assert!(images.list().is_empty());

    // 2. Unknown type leaves the record alone
    assert!(!model.change_entity_type(&text("undefined"))?);
    assert_eq!(model.record().borrow().scalar("additional_field_id"), Some(int(2)));

    // 3. Local source writes the type itself
    let sheets = sheet()?;
    let mut model = model_of(sheet_of_type(store.as_ref(), "single")?, &sheets, store.clone());
    assert!(model.change_entity_type(&text("roll"))?);
    assert_eq!(model.record().borrow().scalar("type"), Some(text("roll")));
    assert_eq!(model.raw_value()?, JsonValue::Null);

    Ok(())
}

#[test]
fn test_replace_type_and_instance() -> Result<()> {
    let store = store()?;
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());

    let mut images = Images::default();
    images.set_active(true);
    assert!(model.replace_type_and_instance(&text("images"), Box::new(images.clone()))?);
    assert_eq!(model.entity_type(false)?, Some(text("images")));
    assert_eq!(model.raw_value()?, JsonValue::Object(images.to_array()));

    assert!(!model.replace_type_and_instance(&text("undefined"), Box::new(Map::default()))?);
    assert_eq!(model.raw_value()?, JsonValue::Object(images.to_array()));

    Ok(())
}

#[test]
fn test_replace_type_and_fill_instance() -> Result<()> {
    let store = store()?;
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());

    assert!(model.replace_type_and_fill_instance(&text("images"), image_values())?);
    let images = model.instance_as::<Images>()?.expect("images handler");
    assert_eq!(images.number_of_visible_images(), 5);
    assert_eq!(model.raw_value()?, image_values());

    // Partial values come back normalized
    assert!(model.replace_type_and_fill_instance(&text("map"), json!({"title": "Only title"}))?);
    let raw = model.raw_value()?;
    assert_eq!(raw["title"], json!("Only title"));
    assert_eq!(raw["address"], json!(""));
    assert_eq!(raw["phones"], json!([]));

    Ok(())
}

#[test]
fn test_make_instance_is_not_memoized() -> Result<()> {
    let store = store()?;
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.as_ref(), 2)?, &definition, store.clone());

    let made = model.make_instance_of_entity()?.expect("images handler");
    assert!(made.is::<Images>());
    assert!(!model.is_resolved());

    let by_type = model.make_instance_by_entity_type(&text("map"))?.expect("map handler");
    assert!(by_type.is::<Map>());

    // Initializing installs the handler without syncing it
    let raw = model.raw_value()?;
    let installed = model
        .initialize_instance_by_entity_type(&text("map"), true)?
        .expect("map handler");
    assert!(installed.is::<Map>());
    assert_eq!(model.raw_value()?, raw);
    assert!(model.is_resolved());

    Ok(())
}

#[test]
fn test_missing_source_or_property() -> Result<()> {
    let store = store()?;

    let definition = MulticastDefinition::builder(
        MulticastConfig::new()
            .property_for_entity("properties")
            .interface_type(EntityConvention::WithModel),
    )
    .entity_type("single", HandlerClass::with_model::<SingleType>())
    .build()?;
    let model = model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    let res = model.entity_type(false);
    match res {
        Err(MulticastError::UndefinedSourceOfType) => {}
        _ => panic!("Expected UndefinedSourceOfType, got {:?}", res),
    }

    let definition =
        MulticastDefinition::builder(MulticastConfig::new().source_with_entity_type("type"))
            .entity_type("single", HandlerClass::independent::<DefaultHandler>())
            .build()?;
    let mut model = model_of(sheet_of_type(store.as_ref(), "single")?, &definition, store.clone());
    let res = model.sync_instance_with_property();
    match res {
        Err(MulticastError::UndefinedPropertyForEntities) => {}
        _ => panic!("Expected UndefinedPropertyForEntities, got {:?}", res),
    }

    Ok(())
}
