//! Dotted-path addressing over a `serde_json` settings tree.

use serde_json::{Map, Value};

use super::SettingsError;

/// Looks up the value addressed by a dotted `path` such as
/// `appearance.customCSSPath`.
///
/// Returns `None` when any segment is missing or traverses a non-object.
#[must_use]
pub fn lookup<'tree>(tree: &'tree Value, path: &str) -> Option<&'tree Value> {
    path.split('.')
        .try_fold(tree, |node, segment| node.as_object()?.get(segment))
}

/// Stores `value` at `path`, creating intermediate objects as needed.
///
/// Returns the value previously stored at `path`.
pub(crate) fn assign(
    tree: &mut Value,
    path: &str,
    value: Value,
) -> Result<Option<Value>, SettingsError> {
    let mut segments = path.split('.').peekable();
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(SettingsError::InvalidPath {
            path: path.to_owned(),
        });
    }

    let mut node = tree;
    while let Some(segment) = segments.next() {
        if node.is_null() {
            *node = Value::Object(Map::new());
        }
        let Some(object) = node.as_object_mut() else {
            return Err(SettingsError::NotAnObject {
                path: path.to_owned(),
                segment: segment.to_owned(),
            });
        };
        if segments.peek().is_none() {
            return Ok(object.insert(segment.to_owned(), value));
        }
        node = object
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Ok(None)
}

/// Recursively overlays `overlay` onto `base`.
///
/// Objects merge key by key; any other overlay value replaces the base value.
pub(crate) fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Interprets a settings value the way the renderer's scripts do.
///
/// Missing values, `null`, `false`, zero, and the empty string are falsy;
/// everything else is truthy.
#[must_use]
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number
            .as_f64()
            .is_some_and(|float| float != 0.0 && !float.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn lookup_walks_nested_objects() {
        let tree = json!({ "appearance": { "zoom": 100 } });
        assert_eq!(lookup(&tree, "appearance.zoom"), Some(&json!(100)));
        assert_eq!(lookup(&tree, "appearance"), Some(&json!({ "zoom": 100 })));
        assert_eq!(lookup(&tree, "appearance.zoom.level"), None);
        assert_eq!(lookup(&tree, "playback.ratioVolume"), None);
    }

    #[test]
    fn assign_creates_intermediate_objects() {
        let mut tree = json!({});
        let previous = assign(&mut tree, "integrations.discordPresenceEnabled", json!(true))
            .expect("assign into empty tree");
        assert_eq!(previous, None);
        assert_eq!(tree, json!({ "integrations": { "discordPresenceEnabled": true } }));
    }

    #[test]
    fn assign_returns_the_replaced_value() {
        let mut tree = json!({ "playback": { "ratioVolume": false } });
        let previous =
            assign(&mut tree, "playback.ratioVolume", json!(true)).expect("assign leaf");
        assert_eq!(previous, Some(json!(false)));
    }

    #[rstest]
    #[case("")]
    #[case("playback.")]
    #[case(".ratioVolume")]
    #[case("a..b")]
    fn assign_rejects_malformed_paths(#[case] path: &str) {
        let mut tree = json!({});
        assert!(matches!(
            assign(&mut tree, path, json!(1)),
            Err(SettingsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn assign_refuses_to_descend_through_scalars() {
        let mut tree = json!({ "general": { "startOnBoot": false } });
        let error = assign(&mut tree, "general.startOnBoot.delay", json!(5))
            .expect_err("scalar cannot hold children");
        assert!(matches!(error, SettingsError::NotAnObject { segment, .. } if segment == "delay"));
    }

    #[test]
    fn deep_merge_overlays_nested_keys() {
        let mut base = json!({ "appearance": { "zoom": 100, "customCSSEnabled": false } });
        deep_merge(
            &mut base,
            json!({ "appearance": { "customCSSEnabled": true }, "extra": [1] }),
        );
        assert_eq!(
            base,
            json!({
                "appearance": { "zoom": 100, "customCSSEnabled": true },
                "extra": [1]
            })
        );
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(json!(null)), false)]
    #[case(Some(json!(false)), false)]
    #[case(Some(json!(true)), true)]
    #[case(Some(json!(0)), false)]
    #[case(Some(json!(0.0)), false)]
    #[case(Some(json!(3)), true)]
    #[case(Some(json!("")), false)]
    #[case(Some(json!("yes")), true)]
    #[case(Some(json!([])), true)]
    #[case(Some(json!({})), true)]
    fn truthiness_follows_script_semantics(#[case] value: Option<Value>, #[case] expected: bool) {
        assert_eq!(is_truthy(value.as_ref()), expected);
    }
}
