//! The console's invalidation table.
//!
//! Every mutation the console can perform is listed here together with the
//! cached views it makes stale. Rules read identifiers from the mutation
//! input (or, for creations, the result). When an identifier is missing
//! the rule widens to the entity-wide prefix rather than skipping it.

use serde_json::Value;

use super::keys;
use crate::cache::{CacheKey, CacheManager, MutationKind};

pub const MARK_LESSON_COMPLETED: MutationKind = MutationKind::from_static("mark-lesson-completed");
pub const MARK_LESSON_INCOMPLETE: MutationKind = MutationKind::from_static("mark-lesson-incomplete");
pub const DELETE_PROGRESS: MutationKind = MutationKind::from_static("delete-progress");
pub const CREATE_CONTENT_ITEM: MutationKind = MutationKind::from_static("create-content-item");
pub const UPDATE_CONTENT_ITEM: MutationKind = MutationKind::from_static("update-content-item");
pub const DELETE_CONTENT_ITEM: MutationKind = MutationKind::from_static("delete-content-item");
pub const REORDER_CONTENT_ITEMS: MutationKind = MutationKind::from_static("reorder-content-items");
pub const CREATE_VIDEO: MutationKind = MutationKind::from_static("create-video");
pub const UPDATE_VIDEO: MutationKind = MutationKind::from_static("update-video");
pub const DELETE_VIDEO: MutationKind = MutationKind::from_static("delete-video");

/// Every kind with a rule in [`register_defaults`].
pub const ALL_KINDS: [MutationKind; 10] = [
    MARK_LESSON_COMPLETED,
    MARK_LESSON_INCOMPLETE,
    DELETE_PROGRESS,
    CREATE_CONTENT_ITEM,
    UPDATE_CONTENT_ITEM,
    DELETE_CONTENT_ITEM,
    REORDER_CONTENT_ITEMS,
    CREATE_VIDEO,
    UPDATE_VIDEO,
    DELETE_VIDEO,
];

/// Install the console's rules into `cache`.
pub fn register_defaults(cache: &mut CacheManager) {
    cache.register_rule(MARK_LESSON_COMPLETED, lesson_rule);
    cache.register_rule(MARK_LESSON_INCOMPLETE, lesson_rule);
    cache.register_rule(DELETE_PROGRESS, delete_progress_rule);
    cache.register_rule(CREATE_CONTENT_ITEM, create_content_item_rule);
    cache.register_rule(UPDATE_CONTENT_ITEM, content_item_rule);
    cache.register_rule(DELETE_CONTENT_ITEM, content_item_rule);
    cache.register_rule(REORDER_CONTENT_ITEMS, reorder_content_items_rule);
    cache.register_rule(CREATE_VIDEO, create_video_rule);
    cache.register_rule(UPDATE_VIDEO, video_rule);
    cache.register_rule(DELETE_VIDEO, video_rule);
}

/// Human label used in notifications and confirmation prompts.
pub fn label(kind: &MutationKind) -> &'static str {
    match kind.as_str() {
        "mark-lesson-completed" => "Mark lesson completed",
        "mark-lesson-incomplete" => "Mark lesson incomplete",
        "delete-progress" => "Delete progress",
        "create-content-item" => "Create content item",
        "update-content-item" => "Update content item",
        "delete-content-item" => "Delete content item",
        "reorder-content-items" => "Reorder content items",
        "create-video" => "Add video",
        "update-video" => "Update video",
        "delete-video" => "Delete video",
        _ => "Operation",
    }
}

/// Kinds that must only run after explicit user confirmation.
pub fn is_destructive(kind: &MutationKind) -> bool {
    *kind == DELETE_PROGRESS || *kind == DELETE_CONTENT_ITEM || *kind == DELETE_VIDEO
}

/// Read an identifier field as a string. Numbers are accepted and
/// rendered in decimal; anything else counts as missing.
pub fn id_field(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lesson_rule(input: &Value, _result: &Value) -> Vec<CacheKey> {
    let Some(enrollment) = id_field(input, "enrollmentId") else {
        return vec![keys::progress_root()];
    };
    let topic = match id_field(input, "topicId") {
        Some(topic) => keys::progress_topic(&enrollment, &topic),
        None => keys::progress_topics(&enrollment),
    };
    let lesson = match id_field(input, "lessonId") {
        Some(lesson) => keys::progress_lesson(&enrollment, &lesson),
        None => keys::progress_lessons(&enrollment),
    };
    vec![
        keys::progress_detail(&enrollment),
        keys::progress_summary(&enrollment),
        topic,
        lesson,
        keys::progress_users_root(),
    ]
}

fn delete_progress_rule(input: &Value, _result: &Value) -> Vec<CacheKey> {
    let Some(enrollment) = id_field(input, "enrollmentId") else {
        return vec![keys::progress_root()];
    };
    vec![
        keys::progress_detail(&enrollment),
        keys::progress_summary(&enrollment),
        keys::progress_topics(&enrollment),
        keys::progress_lessons(&enrollment),
        keys::progress_users_root(),
    ]
}

fn create_content_item_rule(input: &Value, result: &Value) -> Vec<CacheKey> {
    let Some(section) = id_field(input, "sectionId") else {
        return vec![keys::content_root()];
    };
    let mut prefixes = vec![keys::content_items(&section)];
    if let Some(id) = id_field(result, "id") {
        prefixes.push(keys::content_item(&id));
    }
    prefixes
}

fn content_item_rule(input: &Value, _result: &Value) -> Vec<CacheKey> {
    match (id_field(input, "id"), id_field(input, "sectionId")) {
        (Some(id), Some(section)) => vec![keys::content_item(&id), keys::content_items(&section)],
        // Without the section we cannot tell which list holds the item
        _ => vec![keys::content_root()],
    }
}

fn reorder_content_items_rule(input: &Value, _result: &Value) -> Vec<CacheKey> {
    match id_field(input, "sectionId") {
        Some(section) => vec![keys::content_items(&section)],
        None => vec![keys::content_root()],
    }
}

fn create_video_rule(_input: &Value, result: &Value) -> Vec<CacheKey> {
    let mut prefixes = vec![keys::videos_root()];
    if let Some(id) = id_field(result, "id") {
        prefixes.push(keys::video(&id));
    }
    prefixes
}

fn video_rule(input: &Value, _result: &Value) -> Vec<CacheKey> {
    match id_field(input, "id") {
        Some(id) => vec![keys::videos_root(), keys::video(&id)],
        None => vec![keys::video_root()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_key;
    use crate::models::ListParams;
    use serde_json::json;

    fn defaults() -> CacheManager {
        let mut cache = CacheManager::default();
        register_defaults(&mut cache);
        cache
    }

    fn rule_prefixes(kind: &MutationKind, input: Value, result: Value) -> Vec<CacheKey> {
        defaults().rules().prefixes_for(kind, &input, &result).unwrap()
    }

    #[test]
    fn test_every_kind_registered() {
        let cache = defaults();
        assert_eq!(cache.rules().len(), ALL_KINDS.len());
        for kind in &ALL_KINDS {
            assert!(cache.rules().contains(kind), "missing rule for {}", kind);
            assert_ne!(label(kind), "Operation");
        }
    }

    #[test]
    fn test_mark_lesson_completed_prefixes() {
        let prefixes = rule_prefixes(
            &MARK_LESSON_COMPLETED,
            json!({"enrollmentId": "E1", "lessonId": "L1"}),
            json!({}),
        );
        assert_eq!(
            prefixes,
            vec![
                cache_key!["progress", "detail", "E1"],
                cache_key!["progress", "summary", "E1"],
                cache_key!["progress", "topic", "E1"],
                cache_key!["progress", "lesson", "E1", "L1"],
                cache_key!["progress", "user"],
            ]
        );
    }

    #[test]
    fn test_mark_lesson_completed_with_topic() {
        let prefixes = rule_prefixes(
            &MARK_LESSON_COMPLETED,
            json!({"enrollmentId": "E1", "lessonId": "L1", "topicId": "T1"}),
            Value::Null,
        );
        assert!(prefixes.contains(&cache_key!["progress", "topic", "E1", "T1"]));
        assert!(!prefixes.contains(&cache_key!["progress", "topic", "E1"]));
    }

    #[test]
    fn test_missing_identifier_widens() {
        assert_eq!(
            rule_prefixes(&DELETE_PROGRESS, json!({}), Value::Null),
            vec![cache_key!["progress"]]
        );
        assert_eq!(
            rule_prefixes(&UPDATE_CONTENT_ITEM, json!({"id": "C1"}), Value::Null),
            vec![cache_key!["content-item"]]
        );
        assert_eq!(
            rule_prefixes(&DELETE_VIDEO, json!({"id": ""}), Value::Null),
            vec![cache_key!["video"]]
        );
    }

    #[test]
    fn test_numeric_identifiers() {
        assert_eq!(id_field(&json!({"id": 42}), "id").as_deref(), Some("42"));
        assert_eq!(id_field(&json!({"id": true}), "id"), None);
        assert_eq!(id_field(&Value::Null, "id"), None);
    }

    #[test]
    fn test_create_uses_result_id() {
        let prefixes = rule_prefixes(&CREATE_VIDEO, json!({"title": "New"}), json!({"id": "V9"}));
        assert_eq!(prefixes, vec![cache_key!["video", "list"], cache_key!["video", "detail", "V9"]]);

        let prefixes = rule_prefixes(
            &CREATE_CONTENT_ITEM,
            json!({"sectionId": "S1"}),
            json!({"id": "C7"}),
        );
        assert_eq!(
            prefixes,
            vec![cache_key!["content-item", "list", "S1"], cache_key!["content-item", "detail", "C7"]]
        );
    }

    #[test]
    fn test_delete_progress_stales_every_view_of_enrollment() {
        let mut cache = defaults();
        let others = keys::progress_detail("E2");
        cache.write_value(keys::progress_detail("E1"), json!({}));
        cache.write_value(keys::progress_summary("E1"), json!({}));
        cache.write_value(keys::progress_topic("E1", "T1"), json!({}));
        cache.write_value(keys::progress_lesson("E1", "L1"), json!({}));
        cache.write_value(keys::progress_users(&ListParams::page(3)), json!([]));
        cache.write_value(others.clone(), json!({}));

        let outcome = cache.apply_mutation(&DELETE_PROGRESS, &json!({"enrollmentId": "E1"}), &Value::Null);

        assert_eq!(outcome.entries(), 5);
        assert_eq!(cache.stale_keys().len(), 5);
        assert!(cache.is_fresh(&others));
    }

    #[test]
    fn test_destructive_kinds() {
        assert!(is_destructive(&DELETE_PROGRESS));
        assert!(is_destructive(&DELETE_VIDEO));
        assert!(is_destructive(&DELETE_CONTENT_ITEM));
        assert!(!is_destructive(&UPDATE_VIDEO));
        assert!(!is_destructive(&"unknown-kind".into()));
    }
}
