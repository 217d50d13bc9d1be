//! InMemoryStore integration tests — validation, uniqueness, scoped access

use std::sync::Arc;

use serde_json::{json, Value};

use walletfolio_adapters::{
    AdapterError, CollectionSchema, ConnectOptions, Document, DocumentStore, FieldSpec, Filter,
    FindOptions, InMemoryStore, MemoryConnector, StoreConnector,
};

fn schemas() -> Vec<CollectionSchema> {
    vec![
        CollectionSchema::new(
            "people",
            vec![FieldSpec::email("email").required().unique()],
        ),
        CollectionSchema::new(
            "notes",
            vec![
                FieldSpec::text("body").required(),
                FieldSpec::relationship("author", "people").required(),
            ],
        ),
    ]
}

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

async fn person(store: &InMemoryStore, email: &str) -> String {
    let created = store
        .create("people", doc(json!({ "email": email })))
        .await
        .unwrap();
    created["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_assigns_id_and_timestamps() {
    let store = InMemoryStore::new(schemas());
    let created = store
        .create("people", doc(json!({ "email": "a@example.com", "id": "forged" })))
        .await
        .unwrap();

    assert_ne!(created["id"], json!("forged"));
    assert!(created.contains_key("createdAt"));
    assert_eq!(created["createdAt"], created["updatedAt"]);
}

#[tokio::test]
async fn test_unique_field_rejects_duplicates() {
    let store = InMemoryStore::new(schemas());
    person(&store, "a@example.com").await;

    let err = store
        .create("people", doc(json!({ "email": "A@example.com" })))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Duplicate { ref field, .. } if field == "email"));
    assert_eq!(store.count("people", &Filter::All).await.unwrap(), 1);
}

#[tokio::test]
async fn test_relationship_must_exist() {
    let store = InMemoryStore::new(schemas());
    let err = store
        .create("notes", doc(json!({ "body": "hi", "author": "nobody" })))
        .await
        .unwrap_err();
    match err {
        AdapterError::Validation { errors, .. } => assert_eq!(errors[0].field, "author"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_filter_scopes_reads_and_writes() {
    let store = InMemoryStore::new(schemas());
    let alice = person(&store, "alice@example.com").await;
    let bob = person(&store, "bob@example.com").await;

    let note = store
        .create("notes", doc(json!({ "body": "alice's", "author": alice })))
        .await
        .unwrap();
    let id = note["id"].as_str().unwrap();

    let bobs_scope = Filter::equals("author", bob.as_str());
    let found = store.find("notes", &bobs_scope, FindOptions::default()).await.unwrap();
    assert!(found.docs.is_empty());
    assert!(store.find_by_id("notes", id, &bobs_scope).await.unwrap().is_none());

    let patched = store
        .update("notes", id, &bobs_scope, doc(json!({ "body": "bob was here" })))
        .await
        .unwrap();
    assert!(patched.is_none());
    assert!(store.delete("notes", id, &bobs_scope).await.unwrap().is_none());

    let unchanged = store.find_by_id("notes", id, &Filter::All).await.unwrap().unwrap();
    assert_eq!(unchanged["body"], json!("alice's"));
}

#[tokio::test]
async fn test_update_revalidates_and_keeps_identity() {
    let store = InMemoryStore::new(schemas());
    let alice = person(&store, "alice@example.com").await;
    let note = store
        .create("notes", doc(json!({ "body": "v1", "author": alice })))
        .await
        .unwrap();
    let id = note["id"].as_str().unwrap();

    let err = store
        .update("notes", id, &Filter::All, doc(json!({ "body": "" })))
        .await
        .unwrap_err();
    assert!(err.is_client_error());

    let updated = store
        .update("notes", id, &Filter::All, doc(json!({ "body": "v2", "createdAt": "x" })))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated["id"], note["id"]);
    assert_eq!(updated["createdAt"], note["createdAt"]);
    assert_eq!(updated["body"], json!("v2"));
}

#[tokio::test]
async fn test_find_is_newest_first_and_paginated() {
    let store = InMemoryStore::new(schemas());
    for i in 0..3 {
        person(&store, &format!("user{i}@example.com")).await;
    }
    let page = store
        .find("people", &Filter::All, FindOptions { limit: 2, page: 1 })
        .await
        .unwrap();
    assert_eq!(page.total_docs, 3);
    assert_eq!(page.docs.len(), 2);
    assert_eq!(page.docs[0]["email"], json!("user2@example.com"));
    assert!(page.has_next_page);
}

#[tokio::test]
async fn test_unknown_collection_is_rejected() {
    let store = InMemoryStore::new(schemas());
    let err = store.create("ghosts", Document::new()).await.unwrap_err();
    assert!(matches!(err, AdapterError::UnknownCollection(_)));
}

#[tokio::test]
async fn test_connector_checks_scheme() {
    let connector = MemoryConnector::with_store(Arc::new(InMemoryStore::new(schemas())));
    assert!(connector
        .connect(&ConnectOptions::new("mongodb://127.0.0.1:27017/portfolio"))
        .await
        .is_err());

    let store = connector
        .connect(&ConnectOptions::new("memory://portfolio"))
        .await
        .unwrap();
    store.ping().await.unwrap();
    assert_eq!(connector.connections(), 1);
}
