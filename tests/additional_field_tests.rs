
use std::rc::Rc;

use fixtures::*;
use multicasting::handlers::{Images, Map, PlainText};
use multicasting::prelude::*;
use serde_json::{Value as JsonValue, json};

#[test]
fn test_values_round_trip_through_handler() -> Result<()> {
    let store = Rc::new(seeded_store()?);
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());

    // 1. Read
    let values = model.values_from_instance()?;
    assert_eq!(JsonValue::Object(values.clone()), map_values());

    // 2. Write back what was read: nothing changes
    model.set_values_to_instance(values)?;
    assert_eq!(model.raw_value()?, map_values());

    // 3. Unknown keys are dropped, missing keys are defaulted
    let partial = json!({"title": "Partial", "unknown": true});
    model.set_values_to_instance(partial.as_object().cloned().unwrap_or_default())?;
    let raw = model.raw_value()?;
    assert_eq!(raw["title"], json!("Partial"));
    assert_eq!(raw["script"], json!(""));
    assert_eq!(raw.get("unknown"), None);

    Ok(())
}

#[test]
fn test_default_handler_keeps_any_values() -> Result<()> {
    let store = Rc::new(seeded_store()?);
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.as_ref(), 3)?, &definition, store.clone());

    let values = json!({"list": [], "note": "free form"});
    model.set_values_to_instance(values.as_object().cloned().unwrap_or_default())?;
    assert_eq!(model.raw_value()?, values);
    assert_eq!(model.sync_instance_with_property()?, values);

    Ok(())
}

#[test]
fn test_images_of_page() -> Result<()> {
    let store = Rc::new(seeded_store()?);
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.as_ref(), 2)?, &definition, store.clone());

    let images = model.instance_as::<Images>()?.expect("images handler");
    let watermarked = images
        .images()
        .iter()
        .filter(|image| image.default_source_type.as_deref() == Some("watermark"))
        .count();
    assert_eq!(watermarked, 2);

    images.set_active(false);
    let kept = images.images().into_iter().take(3).collect::<Vec<_>>();
    images.set_images(&kept);
    model.sync_instance_with_property()?;
    model.save()?;

    let mut reloaded = model_of(pivot_of_field(store.as_ref(), 2)?, &definition, store.clone());
    let images = reloaded.instance_as::<Images>()?.expect("images handler");
    assert!(!images.is_active());
    assert_eq!(images.ids(), vec![1, 2, 3]);

    Ok(())
}

#[test]
fn test_map_is_not_a_single_value() -> Result<()> {
    let store = Rc::new(seeded_store()?);
    let definition = additional_fields_of_pages(KeyCache::new())?;
    let mut model = model_of(pivot_of_field(store.as_ref(), 1)?, &definition, store.clone());

    let res = model.set_value_to_instance(json!("text"));
    match res {
        Err(MulticastError::InvalidTypeOfInstance(Capability::SingleValue)) => {}
        _ => panic!("Expected InvalidTypeOfInstance(SingleValue), got {:?}", res),
    }
    assert!(model.instance_as::<Map>()?.is_some());
    assert_eq!(model.raw_value()?, map_values());

    Ok(())
}

#[test]
fn test_single_value_field() -> Result<()> {
    let store = Rc::new(seeded_store()?);
    store.create_table(TableSchema::new("notes"))?;
    let record = store.insert(
        Record::new("notes")
            .with_field("kind", "text")
            .with_field("body", "  Hello  "),
    )?;

    let definition = MulticastDefinition::builder(
        MulticastConfig::new()
            .property_for_entity("body")
            .source_with_entity_type("kind"),
    )
    .entity_type("text", HandlerClass::independent::<PlainText>())
    .build()?;
    let mut model = model_of(record, &definition, store.clone());

    // 1. Loaded and configured
    let text = model.instance_as::<PlainText>()?.expect("text handler");
    assert_eq!(text.text(), "Hello");
    assert_eq!(text.attribute_name(), "body");

    // 2. Written through the handler
    model.set_value_to_instance(json!(42))?;
    assert_eq!(model.value_from_instance()?, json!("42"));
    assert_eq!(model.raw_value()?, json!("42"));

    model.set_value_to_instance(json!("  trimmed "))?;
    assert_eq!(model.sync_instance_with_property()?, json!("trimmed"));

    // 3. Not related to the record, nothing to save through it
    let res = model.save_instance();
    match res {
        Err(MulticastError::InvalidTypeOfInstance(Capability::Related)) => {}
        _ => panic!("Expected InvalidTypeOfInstance(Related), got {:?}", res),
    }

    Ok(())
}
