//! Output helpers shared by the CLI commands.

use serde_json::Value;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

/// Write `content` to `<dir>/<name>.<extension>`.
///
/// Never overwrites: an existing file yields `ErrorKind::AlreadyExists`.
/// The file name must stay inside `dir`; anything else is `InvalidInput`.
pub fn save_to_file(dir: &Path, name: &str, extension: &str, content: &[u8]) -> io::Result<PathBuf> {
    let file_name = format!("{}.{}", name, extension);
    let mut components = Path::new(&file_name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || file_name.contains(['/', '\\']) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to write outside the download directory: {}", file_name),
        ));
    }
    let path = dir.join(file_name);
    let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    file.write_all(content)?;
    file.flush()?;
    Ok(path)
}

/// Follow `path` through nested objects. Missing keys and non-object
/// intermediates yield `None`.
pub fn value_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Keep one result per distinct value at `path`.
///
/// Groups appear in the order their value was first seen; each keeps the
/// last result carrying that value. Results without the field share one
/// group. Sets `unique_count` on the response object.
pub fn apply_unique(response: &mut Value, path: &[&str]) {
    let Some(object) = response.as_object_mut() else {
        return;
    };
    let results = match object.get_mut("results").map(Value::take) {
        Some(Value::Array(results)) => results,
        Some(other) => {
            object.insert("results".to_string(), other);
            return;
        }
        None => return,
    };

    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<Value> = Vec::new();
    for result in results {
        let key = value_at(&result, path)
            .map(Value::to_string)
            .unwrap_or_else(|| "null".to_string());
        match slots.get(&key) {
            Some(&idx) => kept[idx] = result,
            None => {
                slots.insert(key, kept.len());
                kept.push(result);
            }
        }
    }

    let count = kept.len();
    object.insert("results".to_string(), Value::Array(kept));
    object.insert("unique_count".to_string(), Value::from(count));
}
