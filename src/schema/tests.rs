use super::{Order, ParseOptions, Type, Variant, WrapUnions};
use crate::error::AvroErr;
use crate::value::Value;
use std::collections::HashMap;
use std::str::FromStr;

fn primitive_schema_objects() -> HashMap<&'static str, &'static str> {
    let mut s = HashMap::new();
    s.insert(r##"{ "type": "null" }"##, "null");
    s.insert(r##"{ "type": "boolean" }"##, "boolean");
    s.insert(r##"{ "type": "int" }"##, "int");
    s.insert(r##"{ "type": "long" }"##, "long");
    s.insert(r##"{ "type": "float" }"##, "float");
    s.insert(r##"{ "type": "double" }"##, "double");
    s.insert(r##"{ "type": "bytes" }"##, "bytes");
    s.insert(r##"{ "type": "string" }"##, "string");
    s
}

fn primitive_schema_canonical() -> HashMap<&'static str, &'static str> {
    let mut s = HashMap::new();
    s.insert(r##""null""##, "null");
    s.insert(r##""boolean""##, "boolean");
    s.insert(r##""int""##, "int");
    s.insert(r##""long""##, "long");
    s.insert(r##""float""##, "float");
    s.insert(r##""double""##, "double");
    s.insert(r##""bytes""##, "bytes");
    s.insert(r##""string""##, "string");
    s
}

#[test]
fn parse_primitives_as_json_objects() {
    for (s, name) in primitive_schema_objects() {
        let schema = Type::from_str(s).unwrap();
        assert_eq!(schema.type_name(), name);
    }
}

#[test]
fn parse_primitives_as_defined_types() {
    for (s, name) in primitive_schema_canonical() {
        let schema = Type::from_str(s).unwrap();
        assert_eq!(schema.type_name(), name);
        assert_eq!(schema.to_string(), s);
    }
}

#[test]
fn parse_record() {
    let record_schema = Type::from_str(
        r##"{
        "type": "record",
        "name": "LongOrNull",
        "namespace":"com.test",
        "aliases": ["MaybeLong"],
        "fields" : [
            {"name": "value", "type": "long"},
            {"name": "other", "type": ["null", "LongOrNull"]}
        ]
    }"##,
    )
    .unwrap();

    assert_eq!(record_schema.name().as_deref(), Some("com.test.LongOrNull"));
    assert_eq!(record_schema.aliases(), &["com.test.MaybeLong".to_string()]);
    let fields = record_schema.fields();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name(), "value");
    assert_eq!(fields[0].order(), Order::Ascending);

    let other = record_schema.field_type("other").unwrap();
    assert!(!other.is_wrapped_union());
    let branches = other.branches();
    assert_eq!(branches[0].type_name(), "null");
    // the recursive reference points back at the record itself
    assert_eq!(branches[1].name().as_deref(), Some("com.test.LongOrNull"));
    assert_eq!(branches[1].fields().len(), 2);
}

#[test]
fn parse_fixed() {
    let fixed_schema =
        Type::from_str(r##"{"type": "fixed", "size": 16, "name": "md5"}"##).unwrap();
    assert_eq!(fixed_schema.type_name(), "fixed");
    assert_eq!(fixed_schema.name().as_deref(), Some("md5"));
    assert_eq!(fixed_schema.size(), Some(16));
}

#[test]
fn parse_enum() {
    let json = r##"{
        "type": "enum",
        "name": "Suit",
        "symbols" : ["SPADES", "HEARTS", "DIAMONDS", "CLUBS"]
    }"##;
    let enum_schema = Type::from_str(json).unwrap();
    assert_eq!(enum_schema.name().as_deref(), Some("Suit"));
    assert_eq!(
        enum_schema.symbols(),
        &["SPADES", "HEARTS", "DIAMONDS", "CLUBS"]
    );
}

#[test]
fn enum_default_must_be_a_symbol() {
    let res = Type::from_str(
        r##"{"type": "enum", "name": "E", "symbols": ["A"], "default": "B"}"##,
    );
    assert!(res.is_err());
}

#[test]
fn parse_array() {
    let json = r##"{"type": "array", "items": "string"}"##;
    let array_schema = Type::from_str(json).unwrap();
    assert_eq!(array_schema.items().unwrap().type_name(), "string");
}

#[test]
fn parse_map() {
    let map_schema = Type::from_str(r##"{"type": "map", "values": "long"}"##).unwrap();
    assert_eq!(map_schema.values().unwrap().type_name(), "long");
}

///////////////////////////////////////////////////////////////////////////////
/// Union
///////////////////////////////////////////////////////////////////////////////

#[test]
fn parse_simple_union() {
    let union_schema = Type::from_str(r##"["null", "string"]"##).unwrap();
    assert_eq!(union_schema.type_name(), "union:unwrapped");
    let names: Vec<_> = union_schema
        .branches()
        .iter()
        .map(|b| b.branch_name())
        .collect();
    assert_eq!(names, vec!["null", "string"]);
}

#[test]
fn numeric_branches_force_wrapping() {
    let wrapped = Type::from_str(r##"["int", "long"]"##).unwrap();
    assert!(wrapped.is_wrapped_union());
    let unwrapped = Type::from_str(r##"["int", "string"]"##).unwrap();
    assert!(!unwrapped.is_wrapped_union());

    let buf = wrapped.to_buffer(&Value::union("long", 3i64)).unwrap();
    assert_eq!(buf, vec![0x02, 0x06]);
    assert_eq!(
        wrapped.from_buffer(&buf).unwrap(),
        Value::union("long", 3i64)
    );
}

#[test]
fn wrap_mode_can_be_forced() {
    let always = ParseOptions::new().wrap_unions(WrapUnions::Always);
    let never = ParseOptions::new().wrap_unions(WrapUnions::Never);
    let json = serde_json::json!(["null", "string"]);
    assert!(Type::for_schema_with(&json, &always)
        .unwrap()
        .is_wrapped_union());

    match Type::for_schema_with(&serde_json::json!(["int", "long"]), &never) {
        Err(AvroErr::AmbiguousUnion(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn parse_union_duplicate_primitive_fails() {
    for (s, name) in primitive_schema_canonical() {
        let json = &format!("[{}, {}]", s, s);
        match Type::from_str(json) {
            Err(AvroErr::DuplicateBranch(branch)) => assert_eq!(branch, name),
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn parse_union_with_different_named_type_but_same_schema_succeeds() {
    let union_schema = Type::from_str(
        r##"[
    {
        "type":"record",
        "name": "record_one",
        "fields" : [
            {"name": "value", "type": "long"}
        ]
    },
    {
        "type":"record",
        "name": "record_two",
        "fields" : [
            {"name": "value", "type": "long"}
        ]
    }]"##,
    )
    .unwrap();

    // both records fall in the same bucket
    assert!(union_schema.is_wrapped_union());
    assert_eq!(union_schema.branches()[1].branch_name(), "record_two");
}

#[test]
fn parse_union_with_same_named_type_fails() {
    let union_schema = Type::from_str(
        r##"[
    {
        "type":"record",
        "name": "record_one",
        "fields" : [
            {"name": "value", "type": "long"}
        ]
    },
    {
        "type":"record",
        "name": "record_one",
        "fields" : [
            {"name": "value", "type": "long"}
        ]
    }]"##,
    );

    assert!(union_schema.is_err());
}

#[test]
fn parse_union_field_invalid_default_values() {
    let default_valued_schema = Type::from_str(
        r##"
    {
        "name": "Company",
        "type": "record",
        "fields": [
            {
                "name": "emp_name",
                "type": "string",
                "doc": "employee name"
            },
            {
                "name": "bonus",
                "type": ["null", "long"],
                "default": null,
                "doc": "bonus received on a yearly basis"
            },
            {
                "name": "subordinates",
                "type": ["null", {"type": "map", "values": "string"}],
                "default": {"foo":"bar"},
                "doc": "map of subordinates Name and Designation"
            }
        ]
    }
    "##,
    );

    match default_valued_schema {
        Err(AvroErr::InvalidDefaultValue { field, .. }) => assert_eq!(field, "subordinates"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn parse_default_values_record() {
    let default_valued_schema = Type::from_str(
        r##"
    {
        "name": "Company",
        "type": "record",
        "namespace": "com.test.avrotype",
        "fields": [
            {
                "name": "bonus",
                "type": ["null", "long"],
                "default": null,
                "doc": "bonus received on a yearly basis"
            }
        ]
    }
    "##,
    )
    .unwrap();

    assert_eq!(
        default_valued_schema.fields()[0].default_value(),
        Some(Value::Null)
    );
    assert_eq!(
        default_valued_schema.fields()[0].doc(),
        Some("bonus received on a yearly basis")
    );
}

#[test]
#[should_panic(expected = "DuplicateSchema")]
fn fails_on_duplicate_schema() {
    let schema = r##"{
        "type": "record",
        "namespace": "test.avro.training",
        "name": "SomeMessage",
        "fields": [{
            "name": "is_error",
            "type": "boolean",
            "default": false
        }, {
            "name": "outcome",
            "type": [{
                "type": "record",
                "name": "SomeMessage",
                "fields": []
            }, {
                "type": "record",
                "name": "ErrorRecord",
                "fields": [{
                    "name": "errors",
                    "type": {
                        "type": "map",
                        "values": "string"
                    },
                    "doc": "doc"
                }]
            }]
        }]
    }"##;

    Type::from_str(schema).unwrap();
}

#[test]
#[should_panic(expected = "NoImmediateUnion")]
fn parse_immediate_unions_fails() {
    Type::from_str(r##"["null", "string", ["null", "int"]]"##).unwrap();
}

#[test]
#[should_panic(expected = "CannotRenamePrimitive")]
fn primitives_cannot_be_renamed() {
    Type::from_str(r##"{"type": "fixed", "name": "long", "size": 8}"##).unwrap();
}

#[test]
fn parse_simple_default_values_record() {
    let schema = Type::from_str(
        r##"
    {
        "name": "com.school.Student",
        "type": "record",
        "fields": [
            {
                    "name": "departments",
                    "type":[{"type":"array", "items":"string" }, "null"],
                    "default": ["Computer Science", "Finearts"],
                    "doc": "Departments of a student"
                }
            ]
        }
    "##,
    )
    .unwrap();

    assert_eq!(
        schema.fields()[0].default_value(),
        Some(Value::Array(vec![
            Value::Str("Computer Science".into()),
            Value::Str("Finearts".into())
        ]))
    );
}

#[test]
fn parse_default_record_value_in_union() {
    let schema = Type::from_str(
        r##"
    {
        "name": "com.big.data.avro.schema.Employee",
        "type": "record",
        "fields": [
            {
                    "name": "departments",
                    "type":[
                        {"type":"record",
                        "name": "dept_name",
                        "fields":[{"name":"id","type": "string"}, {"name":"foo", "type": "null"}] }],
                    "default": {"id": "foo", "foo": null}
                }
            ]
        }
    "##,
    )
    .unwrap();

    match schema.fields()[0].default_value() {
        Some(Value::Record(r)) => {
            assert_eq!(r.name(), "com.big.data.avro.schema.dept_name");
            assert_eq!(r.get("id"), Some(&Value::Str("foo".to_string())));
        }
        other => panic!("should be a record, got {:?}", other),
    }
}

#[test]
#[should_panic(expected = "UndefinedTypeName")]
fn named_schema_must_be_defined_before_being_used() {
    let _schema = Type::from_str(
        r##"{
        "type": "record",
        "name": "LongList",
        "aliases": ["LinkedLongs"],
        "fields" : [
          {"name": "value", "type": "long"},
          {"name": "next", "type": ["null", "OtherList"]}
        ]
      }"##,
    )
    .unwrap();
}

#[test]
fn test_two_instance_schema_equality() {
    let raw_schema = r#"
        {
        "type": "record",
        "name": "User",
        "doc": "Hi there.",
        "fields": [
            {"name": "likes_pizza", "type": "boolean", "default": false},
            {"name": "aa-i32",
            "type": {"type": "array", "items": {"type": "array", "items": "int"}},
            "default": [[0], [12, -1]]}
        ]
        }
    "#;

    // field names are not validated beyond uniqueness
    let schema = Type::from_str(raw_schema).unwrap();
    let schema2 = Type::from_str(raw_schema).unwrap();
    assert_eq!(schema, schema2);
}

#[test]
#[should_panic(expected = "DuplicateField")]
fn duplicate_field_name_in_record_fails() {
    let raw_schema = r#"
        {
        "type": "record",
        "name": "Person",
        "doc": "Hi there.",
        "fields": [
            {"name": "id", "type": "string", "default": "dsf8e8"},
            {"name": "id", "type": "int", "default": 56}
        ]
        }
    "#;

    Type::from_str(raw_schema).unwrap();
}

#[test]
fn error_records_are_records() {
    let schema = Type::from_str(
        r##"{"type": "error", "name": "Oops", "fields": [{"name": "msg", "type": "string"}]}"##,
    )
    .unwrap();
    assert_eq!(schema.type_name(), "error");
    assert!(matches!(schema.variant(), Variant::Record(r) if r.is_error));
}

#[test]
fn nested_namespaces_are_inherited_unless_emptied() {
    let schema = Type::from_str(
        r##"{
        "type": "record",
        "name": "Outer",
        "namespace": "a.b",
        "fields": [
            {"name": "x", "type": {"type": "fixed", "name": "Inner", "size": 1}},
            {"name": "y", "type": {"type": "fixed", "name": "Top", "namespace": "", "size": 1}}
        ]
    }"##,
    )
    .unwrap();
    assert_eq!(schema.field_type("x").unwrap().name().as_deref(), Some("a.b.Inner"));
    assert_eq!(schema.field_type("y").unwrap().name().as_deref(), Some("Top"));
}
