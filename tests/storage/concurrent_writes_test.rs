use push_extension_core::models::{ConfigFragment, ConfigScope, MergedConfiguration};
use push_extension_core::storage::{ConfigurationRepository, InMemoryConfigurationRepository};
use serde_json::json;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_keys_never_collide() {
    let repository = Arc::new(InMemoryConfigurationRepository::new());

    let mut handles = Vec::new();
    for scope in ConfigScope::ALL {
        let repository = repository.clone();
        handles.push(tokio::spawn(async move {
            for version in 0..200 {
                repository
                    .save_fragment(&ConfigFragment::new(
                        scope,
                        json!({ "scope": scope.to_string(), "version": version }),
                    ))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let fragments = repository.read_fragments().await.unwrap();
    assert_eq!(fragments.len(), 2);
    for scope in ConfigScope::ALL {
        let fragment = &fragments[&scope];
        assert_eq!(fragment.scope, scope);
        assert_eq!(
            fragment.document,
            json!({ "scope": scope.to_string(), "version": 199 })
        );
    }
}

#[tokio::test]
async fn test_merged_key_is_separate_from_fragments() {
    let repository = InMemoryConfigurationRepository::new();
    repository
        .save_fragment(&ConfigFragment::new(ConfigScope::Global, json!({ "a": 1 })))
        .await
        .unwrap();

    let merged = MergedConfiguration::merge(&repository.read_fragments().await.unwrap());
    repository.save_merged(&merged).await.unwrap();

    assert_eq!(repository.len(), 2);
    assert_eq!(repository.read_merged().await.unwrap(), Some(merged));
    assert_eq!(repository.read_fragments().await.unwrap().len(), 1);
}
