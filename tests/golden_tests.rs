//! Golden Tests for Record Normalization
//!
//! Builds records from fixture documents through the blog schemas and checks
//! the raw form against the expected output.

use familiar_jsonmap::{
    Args, ConstructOptions, Field, FieldValue, MappingError, Record, Schema, SchemaSet,
    UnknownKeys,
};
use serde_json::{json, Value};

fn blog_schemas() -> SchemaSet {
    SchemaSet::from_json_str(include_str!("fixtures/blog_schemas.json")).unwrap()
}

fn fixture(json: &str) -> Value {
    serde_json::from_str(json).unwrap()
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn test_post_normalizes_to_golden_output() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();

    let record = Record::from_json(post, fixture(include_str!("fixtures/post_input.json"))).unwrap();

    assert_eq!(record.to_json(), fixture(include_str!("fixtures/post_normalized.json")));
    assert_eq!(
        record.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["title", "author", "pubdate", "views", "rating", "tags", "comments", "meta"]
    );
}

#[test]
fn test_featured_post_defaults_follow_inheritance() {
    let schemas = blog_schemas();
    let featured = schemas.require("FeaturedPost").unwrap();

    let record = Record::empty(featured).unwrap();

    assert_eq!(record.to_json(), fixture(include_str!("fixtures/featured_empty.json")));
    assert_eq!(record.keys().next().map(String::as_str), Some("title"));
    assert_eq!(record.keys().last().map(String::as_str), Some("rank"));
}

#[test]
fn test_normalized_output_is_stable() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();

    let once = Record::from_json(post, fixture(include_str!("fixtures/post_input.json"))).unwrap();
    let twice = Record::from_json(post, once.to_json()).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn test_retained_unknown_keys() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();
    let Value::Object(input) = fixture(include_str!("fixtures/post_input.json")) else {
        panic!("fixture is not an object");
    };

    let options = ConstructOptions {
        unknown_keys: UnknownKeys::Retain,
    };
    let record = Record::with_options(post, input, options).unwrap();

    assert_eq!(record.raw("extra"), Some(&json!(true)));
    assert_eq!(record.len(), 9);
}

#[test]
fn test_retained_unknown_keys_inside_nested_records() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();
    let input = json!({
        "author": {"name": "John Doe", "email": "john@doe.com", "twitter": "@jd"},
        "comments": [{"author": "Jane", "body": "Nice post", "likes": 3}],
        "x": 1
    });
    let Value::Object(input) = input else {
        panic!("input is not an object");
    };

    let record = Record::with_options(post, input, ConstructOptions::retain()).unwrap();

    assert_eq!(record.raw("author").unwrap()["twitter"], json!("@jd"));
    assert_eq!(record.raw("comments").unwrap()[0]["likes"], json!(3));
    assert_eq!(record.raw("x"), Some(&json!(1)));
}

// =============================================================================
// Typed access
// =============================================================================

#[test]
fn test_nested_author_is_a_typed_record() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();
    let record = Record::from_json(post, fixture(include_str!("fixtures/post_input.json"))).unwrap();

    let author = record.get("author").unwrap().into_record().unwrap();
    assert_eq!(author.get("name").unwrap(), FieldValue::from("John Doe"));
    assert_eq!(author.get("email").unwrap(), FieldValue::from("john@doe.com"));
    assert_eq!(author.schema().name(), "Author");
}

#[test]
fn test_nested_author_raw_matches_input() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();
    let input = fixture(include_str!("fixtures/post_input.json"));
    let record = Record::from_json(post, input.clone()).unwrap();

    let author = record.get("author").unwrap().into_record().unwrap();
    assert_eq!(author.to_json(), input["author"]);
}

#[test]
fn test_author_replaced_by_typed_record() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();
    let author = schemas.require("Author").unwrap();
    let mut record = Record::from_json(post, fixture(include_str!("fixtures/post_input.json"))).unwrap();

    let jane = Record::from_values(author, [("name", "Jane Roe"), ("email", "jane@roe.com")]).unwrap();
    record.set("author", jane).unwrap();

    assert_eq!(
        record.raw("author"),
        Some(&json!({"name": "Jane Roe", "email": "jane@roe.com"}))
    );

    let commenter = schemas.require("Comment").unwrap();
    let bob = Record::from_values(commenter, [("author", "Bob"), ("body", "hi")]).unwrap();
    record.set("author", bob).unwrap();

    assert_eq!(record.raw("author"), Some(&json!({"name": null, "email": null})));
}

#[test]
fn test_storage_name_differs_from_attribute() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();
    let mut record = Record::empty(post).unwrap();

    record.set("published", "2010-01-02T03:04:05").unwrap();

    assert_eq!(record.raw("pubdate"), Some(&json!("2010-01-02T03:04:05Z")));
    assert!(!record.contains_key("published"));
    assert_eq!(record.get("published").unwrap().to_string(), "2010-01-02T03:04:05");
}

#[test]
fn test_invalid_date_reports_format_error() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();
    let mut record = Record::empty(post).unwrap();

    let err = record.set("published", "not-a-date").unwrap_err();
    assert!(matches!(
        err,
        MappingError::InvalidFormat { kind: "datetime", ref value } if value == "not-a-date"
    ));
    assert_eq!(record.raw("pubdate"), Some(&Value::Null));

    let err = Record::from_json(post, json!({"pubdate": "not-a-date"})).unwrap_err();
    assert!(matches!(err, MappingError::InvalidFormat { .. }));
}

// =============================================================================
// Sequences
// =============================================================================

#[test]
fn test_datetime_list_append_normalizes() {
    let schema = Schema::builder("Event")
        .field("published", Field::list(Field::datetime()))
        .build();
    let mut record = Record::empty(&schema).unwrap();

    record
        .sequence("published")
        .unwrap()
        .append(Args::one("2007-04-01T15:30:00.25"))
        .unwrap();

    assert_eq!(record.raw("published"), Some(&json!(["2007-04-01T15:30:00Z"])));
}

#[test]
fn test_comment_append_by_keywords() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();
    let mut record = Record::from_json(post, fixture(include_str!("fixtures/post_input.json"))).unwrap();

    {
        let mut comments = record.sequence("comments").unwrap();
        comments
            .append(Args::keywords([
                ("author", "Bob"),
                ("body", "Thanks"),
                ("time", "2007-04-03T09:15:00"),
            ]))
            .unwrap();
        assert_eq!(comments.len(), 2);
    }

    assert_eq!(
        record.raw("comments").unwrap()[1],
        json!({"author": "Bob", "body": "Thanks", "time": "2007-04-03T09:15:00Z"})
    );
}

#[test]
fn test_append_arity_errors() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();
    let mut record = Record::empty(post).unwrap();
    let mut tags = record.sequence("tags").unwrap();

    let err = tags.append(Args::new()).unwrap_err();
    assert!(matches!(err, MappingError::InvalidArity { method: "append", given: 0 }));

    let err = tags.append(Args::new().arg("a").arg("b")).unwrap_err();
    assert!(matches!(err, MappingError::InvalidArity { method: "append", given: 2 }));
    assert_eq!(err.to_string(), "append() takes exactly one value (2 given)");

    assert!(tags.is_empty());
}

#[test]
fn test_tags_edit_in_place() {
    let schemas = blog_schemas();
    let post = schemas.require("Post").unwrap();
    let mut record = Record::from_json(post, fixture(include_str!("fixtures/post_input.json"))).unwrap();

    {
        let mut tags = record.sequence("tags").unwrap();
        tags.insert(0, Args::one("blog")).unwrap();
        tags.remove("json").unwrap();
        assert_eq!(tags.pop().unwrap(), FieldValue::from("rust"));
    }

    assert_eq!(record.raw("tags"), Some(&json!(["blog"])));
}
