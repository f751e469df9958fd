//! Loading gateway configuration files from disk.

use std::path::PathBuf;
use tensorzero_client::config::{Config, FunctionConfig, VariantConfig};
use tensorzero_client::{Error, Family, Variant};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[tokio::test]
async fn loads_yaml_fixture() {
    let config = Config::load(fixture("config.yaml")).await.unwrap();
    let names: Vec<&str> = config.function_names().collect();
    assert_eq!(names, vec!["draft_email", "extract_entities"]);

    let draft = config.function("draft_email").unwrap();
    assert!(matches!(draft, FunctionConfig::Chat(_)));
    let kinds: Vec<(&str, &str)> = draft
        .variants()
        .iter()
        .map(|(name, v)| (name.as_str(), v.variant_type()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("baseline", "chat_completion"),
            ("reasoning", "chain_of_thought"),
            ("tournament", "best_of_n_sampling"),
        ]
    );
    assert_eq!(
        draft.variant("baseline").and_then(VariantConfig::model),
        Some("openai::gpt-4o-mini")
    );

    let extract = config.function("extract_entities").unwrap();
    assert_eq!(extract.variant_type(), "json");
    assert_eq!(
        extract.variant_names().collect::<Vec<_>>(),
        vec!["ensemble", "fewshot"]
    );
}

#[tokio::test]
async fn yaml_and_json_agree() {
    let from_yaml = Config::load(fixture("config.yaml")).await.unwrap();
    let as_json = serde_json::to_string(&from_yaml).unwrap();

    let dir = std::env::temp_dir().join(format!("tz-config-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("tensorzero.json");
    tokio::fs::write(&path, &as_json).await.unwrap();

    let from_json = Config::load(&path).await.unwrap();
    assert_eq!(from_json, from_yaml);
    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn function_configs_round_trip_through_encode() {
    let config = Config::load(fixture("config.yaml")).await.unwrap();
    for (name, function) in &config.functions {
        let encoded = function.encode().unwrap();
        let decoded = FunctionConfig::decode(encoded).unwrap();
        assert_eq!(&decoded, function, "function {name}");
    }
}

#[tokio::test]
async fn missing_file_is_a_configuration_error() {
    let err = Config::load(fixture("does_not_exist.yaml")).await.unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn unknown_variant_kind_is_rejected_with_family() {
    let err = Config::from_yaml_str(
        r#"
functions:
  f:
    type: chat
    variants:
      v:
        type: experimental_router
"#,
    )
    .unwrap_err();
    match err {
        Error::UnknownVariant { family, found } => {
            assert_eq!(family, "variant_config");
            assert_eq!(found.as_deref(), Some("experimental_router"));
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn unknown_function_kind_is_rejected() {
    let err = Config::from_json_str(r#"{"functions": {"f": {"type": "embedding"}}}"#).unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownVariant {
            family: "function_config",
            ..
        }
    ));
}
