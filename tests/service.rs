use anyhow::anyhow;
use serde_json::{Value as JsonValue, json};
use tabform::{
    Attributes, Column, FieldKind, FieldService, SchemaError, Strategy, builtin, frame::Frame,
};

/// Parses the legacy payload by mapping its `undefined` tokens back to JSON
/// `null`, the same trick the front-end test harness uses.
fn parse_legacy(payload: &str) -> JsonValue {
    serde_json::from_str(&payload.replace("undefined", "null")).expect("legacy payload parses")
}

fn sample_frame() -> Frame {
    Frame::builder()
        .integer_column("age", [Some(25), Some(30), Some(35)])
        .text_column("name", [Some("Ana"), Some("Luis"), None])
        .build()
        .expect("frame")
}

#[test]
fn build_resolves_each_column_to_its_strategy() {
    let mut service = FieldService::new();
    service
        .register_all([
            builtin::number_strategy().unwrap(),
            builtin::text_strategy().unwrap(),
        ])
        .expect("register");

    let form = service.build(&sample_frame()).expect("build");
    assert_eq!(form.input.len(), 2);

    let age = &form.input[0];
    assert_eq!(age.base().title, "age");
    assert!(age.base().required);
    assert_eq!(age.base().description, None);
    assert_eq!(age.kind(), FieldKind::Number);

    let name = &form.input[1];
    assert_eq!(name.base().title, "name");
    assert!(!name.base().required);
    assert_eq!(name.kind(), FieldKind::Text);
}

#[test]
fn build_preserves_column_order() {
    let mut service = FieldService::new();
    service
        .register_all(builtin::default_strategies().unwrap())
        .expect("register");

    let frame = Frame::builder()
        .integer_column("age", [Some(1)])
        .text_column("name", [Some("x")])
        .boolean_column("active", [Some(true)])
        .build()
        .expect("frame");

    let form = service.build(&frame).expect("build");
    let titles: Vec<&str> = form
        .input
        .iter()
        .map(|field| field.base().title.as_str())
        .collect();
    assert_eq!(titles, ["age", "name", "active"]);
}

#[test]
fn empty_dataset_is_a_hard_error() {
    let mut service = FieldService::new();
    service.register(builtin::text_strategy().unwrap()).unwrap();

    let empty = Frame::builder().build().expect("empty frame");
    assert!(matches!(
        service.build(&empty).unwrap_err(),
        SchemaError::EmptyInput
    ));
}

#[test]
fn unmatched_dtype_falls_back_to_text_or_fails() {
    let frame = Frame::builder()
        .opaque_column("payload", "complex128", [None])
        .build()
        .expect("frame");

    let mut service = FieldService::new();
    assert!(matches!(
        service.build(&frame).unwrap_err(),
        SchemaError::NoStrategy { .. }
    ));

    service.register(builtin::text_strategy().unwrap()).unwrap();
    let form = service.build(&frame).expect("build with fallback");
    assert_eq!(form.input[0].kind(), FieldKind::Text);
}

#[test]
fn failure_on_a_later_column_discards_the_whole_envelope() {
    let mut service = FieldService::new();
    service
        .register(builtin::number_strategy().unwrap())
        .unwrap();

    // First column resolves, second has no strategy and no fallback.
    let frame = Frame::builder()
        .integer_column("age", [Some(1)])
        .text_column("name", [Some("x")])
        .build()
        .expect("frame");

    match service.build(&frame).unwrap_err() {
        SchemaError::NoStrategy { column, .. } => assert_eq!(column, "name"),
        other => panic!("expected NoStrategy, got {other:?}"),
    }
}

#[test]
fn derive_hook_errors_propagate_unmodified() {
    let mut service = FieldService::new();
    service
        .register(
            Strategy::with_derive(
                "buggy",
                FieldKind::Number,
                ["int64"],
                |_column: &dyn Column| -> anyhow::Result<Attributes> {
                    Err(anyhow!("intentional hook failure"))
                },
            )
            .unwrap(),
        )
        .unwrap();

    let frame = Frame::builder()
        .integer_column("age", [Some(1)])
        .build()
        .expect("frame");
    match service.build(&frame).unwrap_err() {
        SchemaError::Derive(err) => {
            assert_eq!(err.to_string(), "intentional hook failure");
        }
        other => panic!("expected Derive, got {other:?}"),
    }
}

#[test]
fn invalid_derived_attributes_fail_field_validation() {
    let mut service = FieldService::new();
    service
        .register(
            Strategy::with_derive(
                "number",
                FieldKind::Number,
                ["int64"],
                |_column: &dyn Column| {
                    let mut attrs = Attributes::new();
                    attrs.insert("min".to_string(), json!(10.0));
                    attrs.insert("max".to_string(), json!(5.0));
                    Ok(attrs)
                },
            )
            .unwrap(),
        )
        .unwrap();

    let frame = Frame::builder()
        .integer_column("age", [Some(1)])
        .build()
        .expect("frame");
    assert!(matches!(
        service.build(&frame).unwrap_err(),
        SchemaError::FieldValidation { .. }
    ));
}

#[test]
fn custom_strategy_can_read_column_statistics() {
    let mut service = FieldService::new();
    service
        .register(
            Strategy::with_derive(
                "number",
                FieldKind::Number,
                ["float64"],
                |column: &dyn Column| {
                    let mut attrs = Attributes::new();
                    if let Some(min) = column.numeric_min() {
                        attrs.insert("min".to_string(), json!(min));
                    }
                    if let Some(max) = column.numeric_max() {
                        attrs.insert("max".to_string(), json!(max));
                    }
                    Ok(attrs)
                },
            )
            .unwrap(),
        )
        .unwrap();

    let frame = Frame::builder()
        .float_column("score", [Some(1.5), Some(7.25), Some(-2.0)])
        .build()
        .expect("frame");
    let form = service.build(&frame).expect("build");
    let json = serde_json::to_value(&form).expect("serialize");
    assert_eq!(json["input"][0]["min"], json!(-2.0));
    assert_eq!(json["input"][0]["max"], json!(7.25));
}

#[test]
fn structured_mode_omits_unset_attributes() {
    let mut service = FieldService::new();
    service
        .register_all([
            builtin::number_strategy().unwrap(),
            builtin::text_strategy().unwrap(),
        ])
        .expect("register");

    let json = serde_json::to_value(service.build(&sample_frame()).expect("build"))
        .expect("serialize");

    let age = &json["input"][0];
    assert_eq!(age["type"], "number");
    assert_eq!(age["step"], json!(1.0));
    assert!(age.get("min").is_none());
    assert!(age.get("description").is_none());

    let name = &json["input"][1];
    assert_eq!(name["type"], "text");
    assert!(name.get("value").is_none());
}

#[test]
fn legacy_text_payload_matches_the_historical_contract_byte_for_byte() {
    let mut service = FieldService::new();
    service
        .register_all([
            builtin::number_strategy().unwrap(),
            builtin::text_strategy().unwrap(),
        ])
        .expect("register");

    let payload = service.build_text(&sample_frame()).expect("build_text");
    assert_eq!(
        payload,
        concat!(
            r#"{"input": ["#,
            r#"{"title":"age","required":true,"description":undefined,"type":"number","#,
            r#""min":undefined,"max":undefined,"step":1.0,"placeholder":undefined,"#,
            r#""value":undefined,"unit":undefined}, "#,
            r#"{"title":"name","required":false,"description":undefined,"type":"text","#,
            r#""value":undefined,"placeholder":undefined,"minLength":undefined,"#,
            r#""maxLength":undefined,"pattern":undefined}"#,
            r#"]}"#
        )
    );

    // The payload round-trips through the front-end's undefined-to-null trick.
    let parsed = parse_legacy(&payload);
    assert_eq!(parsed["input"][0]["title"], "age");
    assert_eq!(parsed["input"][1]["required"], json!(false));
}

#[test]
fn legacy_null_rewrite_is_global_even_inside_titles() {
    let mut service = FieldService::new();
    service
        .register(builtin::boolean_strategy().unwrap())
        .unwrap();

    let frame = Frame::builder()
        .boolean_column("null_flag", [Some(true)])
        .build()
        .expect("frame");
    let payload = service.build_text(&frame).expect("build_text");
    // The historical contract applies the substring replacement without
    // respecting string boundaries.
    assert!(payload.contains(r#""title":"undefined_flag""#));
    assert!(!payload.contains("null"));
}

#[test]
fn update_replaces_and_unregister_restores_fallback() {
    let mut service = FieldService::new();
    service
        .register_all([
            builtin::text_strategy().unwrap(),
            Strategy::new("custom", FieldKind::Boolean, ["timedelta64[ns]"]).unwrap(),
        ])
        .expect("register");

    let frame = Frame::builder()
        .opaque_column("duration", "timedelta64[ns]", [None])
        .build()
        .expect("frame");

    let form = service.build(&frame).expect("build");
    assert_eq!(form.input[0].kind(), FieldKind::Boolean);

    service.unregister("custom");
    let form = service.build(&frame).expect("build after unregister");
    assert_eq!(form.input[0].kind(), FieldKind::Text);
}

#[test]
fn register_conflicts_surface_through_the_service() {
    let mut service = FieldService::new();
    service.register(builtin::text_strategy().unwrap()).unwrap();
    let err = service
        .register(Strategy::new("alt", FieldKind::Text, ["object"]).unwrap())
        .unwrap_err();
    assert!(err.is_conflict());

    // update resolves the dtype overlap in favor of the newcomer.
    service
        .update(Strategy::new("alt", FieldKind::Text, ["object"]).unwrap())
        .expect("update");
    let frame = Frame::builder()
        .text_column("comment", [Some("hi")])
        .build()
        .expect("frame");
    let form = service.build(&frame).expect("build");
    assert_eq!(form.input[0].base().title, "comment");
}

#[test]
fn service_instances_are_independent() {
    let mut first = FieldService::new();
    let mut second = FieldService::new();
    first
        .register(builtin::number_strategy().unwrap())
        .unwrap();
    second
        .register_all([
            builtin::number_strategy().unwrap(),
            builtin::text_strategy().unwrap(),
        ])
        .expect("register");

    let frame = sample_frame();
    assert!(first.build(&frame).is_err());
    assert!(second.build(&frame).is_ok());
}

#[test]
fn all_builtin_kinds_resolve_end_to_end() {
    let mut service = FieldService::new();
    service
        .register_all(builtin::default_strategies().unwrap())
        .expect("register");

    let mut frame = Frame::builder()
        .integer_column("id", [Some(1), Some(2)])
        .float_column("score", [Some(0.5), None])
        .boolean_column("active", [Some(true), Some(false)])
        .date_column(
            "joined",
            [
                chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
                chrono::NaiveDate::from_ymd_opt(2024, 2, 1),
            ],
        )
        .text_column("segment", [Some("Gold"), Some("Silver")])
        .build()
        .expect("frame");
    frame.set_categorical("segment").expect("categorical");

    let form = service.build(&frame).expect("build");
    let kinds: Vec<FieldKind> = form.input.iter().map(|f| f.kind()).collect();
    assert_eq!(
        kinds,
        [
            FieldKind::Number,
            FieldKind::Number,
            FieldKind::Boolean,
            FieldKind::Date,
            FieldKind::Category,
        ]
    );

    let json = serde_json::to_value(&form).expect("serialize");
    assert_eq!(json["input"][4]["options"], json!(["Gold", "Silver"]));
    assert_eq!(json["input"][3]["step"], json!(1));
}
