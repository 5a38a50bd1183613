//! Uploaded file tree building
//!
//! Upload descriptors arrive in the server's `$_FILES`-style layout: each
//! field holds `name`, `type`, `tmp_name`, `error` and `size`, either as
//! scalars (one file) or as parallel nested collections (a group of files).
//! [`create_from_globals`] reshapes them into a [`FileTree`] that follows the
//! shape of the `tmp_name` input, keeping every key.
//!
//! ```text
//! files[avatar][tmp_name][0] = "/tmp/a"        tree[avatar][0] = File(/tmp/a)
//! files[avatar][tmp_name][1] = "/tmp/b"   =>   tree[avatar][1] = File(/tmp/b)
//! files[avatar][size][0]     = 10
//! ...
//! ```

use gale_message::{
    Array, Error, FileNode, FileSource, FileTree, Key, Result, UploadedFile, Value,
};

const TMP_NAME: &str = "tmp_name";
const SIZE: &str = "size";
const ERROR: &str = "error";
const NAME: &str = "name";
const TYPE: &str = "type";

/// Top-level entry of an upload set
#[derive(Debug, Clone)]
pub enum FileInput {
    /// Already constructed, passed through unchanged
    Uploaded(UploadedFile),
    /// Raw descriptor data
    Descriptor(Value),
}

impl From<UploadedFile> for FileInput {
    fn from(file: UploadedFile) -> Self {
        FileInput::Uploaded(file)
    }
}

impl From<Value> for FileInput {
    fn from(value: Value) -> Self {
        FileInput::Descriptor(value)
    }
}

impl From<Array> for FileInput {
    fn from(array: Array) -> Self {
        FileInput::Descriptor(Value::Array(array))
    }
}

/// Create one uploaded file from its parts
pub fn create(
    source: impl Into<FileSource>,
    size: u64,
    error: i64,
    client_filename: Option<String>,
    client_media_type: Option<String>,
) -> Result<UploadedFile> {
    UploadedFile::with_code(source, Some(size), error, client_filename, client_media_type)
}

/// Create one uploaded file from a single descriptor
///
/// `tmp_name`, `size` and `error` are required; `name` and `type` are
/// optional.
pub fn create_from_array(file: &Array) -> Result<UploadedFile> {
    let tmp_name = required(file, TMP_NAME)?;
    let size = required(file, SIZE)?;
    let error = required(file, ERROR)?;
    leaf(tmp_name, size, error, file.get(NAME), file.get(TYPE))
}

/// Build the uploaded-file tree for a whole upload set
///
/// Fails without a partial result if any entry cannot be decomposed.
pub fn create_from_globals<I, K>(files: I) -> Result<FileTree>
where
    I: IntoIterator<Item = (K, FileInput)>,
    K: Into<Key>,
{
    let mut tree = FileTree::new();
    for (key, input) in files {
        let node = match input {
            FileInput::Uploaded(file) => FileNode::File(file),
            FileInput::Descriptor(descriptor) => normalize_descriptor(&descriptor)?,
        };
        tree.insert(key, node);
    }
    Ok(tree)
}

fn normalize_descriptor(descriptor: &Value) -> Result<FileNode> {
    let Some(file) = descriptor.as_array() else {
        return Err(Error::InvalidFileSpec(
            "expected a keyed collection of upload descriptors".to_string(),
        ));
    };

    match file.get(TMP_NAME) {
        None | Some(Value::Null) => {
            let mut tree = FileTree::new();
            for (key, nested) in file.iter() {
                tree.insert(key, normalize_descriptor(nested)?);
            }
            Ok(FileNode::Group(tree))
        }
        Some(Value::Array(_)) => create_multiple(file).map(FileNode::Group),
        Some(_) => create_from_array(file).map(FileNode::File),
    }
}

/// Group whose descriptor keys hold parallel collections
fn create_multiple(files: &Array) -> Result<FileTree> {
    let collection = |key: &str| {
        files.get(key).and_then(Value::as_array).ok_or_else(|| {
            Error::InvalidFileSpec(format!(
                "\"{}\" is missing or is not a collection in a multi-file descriptor",
                key
            ))
        })
    };
    let tmp_names = collection(TMP_NAME)?;
    let sizes = collection(SIZE)?;
    let errors = collection(ERROR)?;

    build_tree(
        tmp_names,
        sizes,
        errors,
        files.get(NAME).and_then(Value::as_array),
        files.get(TYPE).and_then(Value::as_array),
    )
}

fn build_tree(
    tmp_names: &Array,
    sizes: &Array,
    errors: &Array,
    names: Option<&Array>,
    types: Option<&Array>,
) -> Result<FileTree> {
    let mut tree = FileTree::new();

    for (key, tmp_name) in tmp_names.iter() {
        let name = names.and_then(|names| names.get(key));
        let media_type = types.and_then(|types| types.get(key));

        let node = match tmp_name {
            Value::Array(nested) => {
                let sizes = nested_collection(sizes, key, SIZE)?;
                let errors = nested_collection(errors, key, ERROR)?;
                FileNode::Group(build_tree(
                    nested,
                    sizes,
                    errors,
                    name.and_then(Value::as_array),
                    media_type.and_then(Value::as_array),
                )?)
            }
            _ => {
                let size = present(sizes.get(key)).ok_or_else(|| missing_at(SIZE, key))?;
                let error = present(errors.get(key)).ok_or_else(|| missing_at(ERROR, key))?;
                FileNode::File(leaf(tmp_name, size, error, name, media_type)?)
            }
        };
        tree.insert(key, node);
    }

    Ok(tree)
}

fn leaf(
    tmp_name: &Value,
    size: &Value,
    error: &Value,
    name: Option<&Value>,
    media_type: Option<&Value>,
) -> Result<UploadedFile> {
    let location = tmp_name
        .as_text()
        .ok_or_else(|| Error::InvalidFileSpec("\"tmp_name\" must be a location".to_string()))?;
    let size = size
        .as_int()
        .and_then(|size| u64::try_from(size).ok())
        .ok_or_else(|| Error::InvalidFileSpec("\"size\" must be a non-negative integer".to_string()))?;
    let code = error
        .as_int()
        .ok_or_else(|| Error::InvalidFileSpec("\"error\" must be an integer".to_string()))?;

    create(
        location.into_owned(),
        size,
        code,
        optional_text(name),
        optional_text(media_type),
    )
}

fn required<'a>(file: &'a Array, key: &str) -> Result<&'a Value> {
    present(file.get(key)).ok_or_else(|| {
        Error::InvalidFileSpec(format!(
            "one of the items is missing: \"tmp_name\", \"size\" or \"error\" (missing \"{}\")",
            key
        ))
    })
}

fn nested_collection<'a>(values: &'a Array, key: &Key, field: &str) -> Result<&'a Array> {
    values.get(key).and_then(Value::as_array).ok_or_else(|| {
        Error::InvalidFileSpec(format!(
            "\"{}\" at [{}] is missing or is not a collection",
            field, key
        ))
    })
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn missing_at(field: &str, key: &Key) -> Error {
    Error::InvalidFileSpec(format!("\"{}\" is missing at [{}]", field, key))
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_text).map(|text| text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gale_message::UploadError;
    use std::path::Path;

    fn descriptor(name: &str, tmp_name: &str, size: i64) -> Array {
        [
            ("name", Value::from(name)),
            ("type", Value::from("text/plain")),
            ("tmp_name", Value::from(tmp_name)),
            ("error", Value::from(0)),
            ("size", Value::from(size)),
        ]
        .into_iter()
        .collect()
    }

    fn file_at<'a>(tree: &'a FileTree, path: &[Key]) -> &'a UploadedFile {
        tree.file(path).expect("leaf at path")
    }

    #[test]
    fn test_create() {
        let file = create("/tmp/php6hst32", 1024, 0, None, None).unwrap();
        assert_eq!(file.size(), Some(1024));
        assert_eq!(file.error(), UploadError::Ok);
        assert!(file.client_filename().is_none());
        assert!(file.client_media_type().is_none());
        assert!(create("/tmp/php6hst32", 1024, 42, None, None).is_err());
    }

    #[test]
    fn test_create_from_array() {
        let file = create_from_array(&descriptor("file.txt", "/tmp/phpN3FmFr", 1024)).unwrap();
        assert_eq!(file.client_filename(), Some("file.txt"));
        assert_eq!(file.client_media_type(), Some("text/plain"));
        assert_eq!(file.location(), Some(Path::new("/tmp/phpN3FmFr")));
        assert_eq!(file.error(), UploadError::Ok);
        assert_eq!(file.size(), Some(1024));
    }

    #[test]
    fn test_create_from_array_rejects_keyed_collection() {
        let files: Array = [("file1", descriptor("file.txt", "/tmp/a", 1))].into_iter().collect();
        let err = create_from_array(&files).unwrap_err();
        assert!(err.is_input_shape());
    }

    #[test]
    fn test_uploaded_file_passed_through() {
        let file = create("/tmp/a", 1024, 0, Some("a.txt".into()), None).unwrap();
        let tree = create_from_globals([("file", FileInput::from(file))]).unwrap();
        assert_eq!(file_at(&tree, &["file".into()]).client_filename(), Some("a.txt"));
    }

    #[test]
    fn test_one_file() {
        let single: Array = [
            ("tmp_name", Value::from("/tmp/f")),
            ("size", Value::from(1024)),
            ("error", Value::from(0)),
            ("name", Value::from("a.txt")),
        ]
        .into_iter()
        .collect();
        let tree = create_from_globals([("file", FileInput::from(single))]).unwrap();

        assert_eq!(tree.len(), 1);
        let file = file_at(&tree, &["file".into()]);
        assert_eq!(file.size(), Some(1024));
        assert_eq!(file.error().code(), 0);
        assert_eq!(file.client_filename(), Some("a.txt"));
        assert!(file.client_media_type().is_none());
    }

    #[test]
    fn test_nested_one_file() {
        let files = Array::list([descriptor("file.txt", "/tmp/a", 1024)]);
        let tree = create_from_globals([("file", FileInput::from(files))]).unwrap();
        let file = file_at(&tree, &["file".into(), 0.into()]);
        assert_eq!(file.client_filename(), Some("file.txt"));
        assert_eq!(file.location(), Some(Path::new("/tmp/a")));
    }

    #[test]
    fn test_multiple_structured_files() {
        let tree = create_from_globals([
            ("file_1", FileInput::from(descriptor("file.txt", "/tmp/a", 1024))),
            ("file_2", FileInput::from(descriptor("image.png", "/tmp/b", 98760))),
        ])
        .unwrap();
        assert_eq!(file_at(&tree, &["file_1".into()]).size(), Some(1024));
        assert_eq!(file_at(&tree, &["file_2".into()]).client_filename(), Some("image.png"));
    }

    #[test]
    fn test_linear_multiple_files() {
        let group: Array = [
            ("name", Value::from([("file_1", "file.txt"), ("file_2", "image.png")].into_iter().collect::<Array>())),
            ("type", Value::from([("file_1", "text/plain"), ("file_2", "image/png")].into_iter().collect::<Array>())),
            ("tmp_name", Value::from([("file_1", "/tmp/a"), ("file_2", "/tmp/b")].into_iter().collect::<Array>())),
            ("error", Value::from([("file_1", 0), ("file_2", 0)].into_iter().collect::<Array>())),
            ("size", Value::from([("file_1", 1024), ("file_2", 98174)].into_iter().collect::<Array>())),
        ]
        .into_iter()
        .collect();
        let tree = create_from_globals([("files", FileInput::from(group))]).unwrap();

        let second = file_at(&tree, &["files".into(), "file_2".into()]);
        assert_eq!(second.client_filename(), Some("image.png"));
        assert_eq!(second.client_media_type(), Some("image/png"));
        assert_eq!(second.location(), Some(Path::new("/tmp/b")));
        assert_eq!(second.size(), Some(98174));
        assert_eq!(file_at(&tree, &["files".into(), "file_1".into()]).size(), Some(1024));
    }

    #[test]
    fn test_grouped_lists_keep_pairing() {
        let group = |names: [&str; 2], tmp: [&str; 2], sizes: [i64; 2]| -> Array {
            [
                ("name", Value::from(Array::list(names))),
                ("type", Value::from(Array::list(["text/plain", "image/png"]))),
                ("tmp_name", Value::from(Array::list(tmp))),
                ("error", Value::from(Array::list([0, 0]))),
                ("size", Value::from(Array::list(sizes))),
            ]
            .into_iter()
            .collect()
        };
        let tree = create_from_globals([
            ("file_1", FileInput::from(group(["file.txt", "image.png"], ["/tmp/a", "/tmp/b"], [1024, 98760]))),
            ("file_2", FileInput::from(group(["audio.mp3", "video.mp4"], ["/tmp/c", "/tmp/d"], [10245678, 98766432]))),
        ])
        .unwrap();

        assert_eq!(tree.file_count(), 4);
        let expected = [
            ("file_1", 0usize, "file.txt", "/tmp/a", 1024u64),
            ("file_1", 1, "image.png", "/tmp/b", 98760),
            ("file_2", 0, "audio.mp3", "/tmp/c", 10245678),
            ("file_2", 1, "video.mp4", "/tmp/d", 98766432),
        ];
        for (field, index, name, location, size) in expected {
            let file = file_at(&tree, &[field.into(), index.into()]);
            assert_eq!(file.client_filename(), Some(name));
            assert_eq!(file.location(), Some(Path::new(location)));
            assert_eq!(file.size(), Some(size));
        }
    }

    #[test]
    fn test_deeply_nested_group() {
        let nest = |a: Value, b: Value| -> Value {
            let inner: Array = [("file_1", a), ("file_2", b)].into_iter().collect();
            let nested: Array = [("nested", Value::from(inner))].into_iter().collect();
            let data: Array = [("data", Value::from(nested))].into_iter().collect();
            Value::from(data)
        };
        let group: Array = [
            ("name", nest("file.txt".into(), "image.png".into())),
            ("type", nest("text/plain".into(), "image/png".into())),
            ("tmp_name", nest("/tmp/a".into(), "/tmp/b".into())),
            ("error", nest(0.into(), 0.into())),
            ("size", nest(1024.into(), 98174.into())),
        ]
        .into_iter()
        .collect();
        let tree = create_from_globals([("files", FileInput::from(group))]).unwrap();

        let path: Vec<Key> = vec!["files".into(), "data".into(), "nested".into(), "file_2".into()];
        let file = file_at(&tree, &path);
        assert_eq!(file.client_filename(), Some("image.png"));
        assert_eq!(file.size(), Some(98174));
    }

    #[test]
    fn test_name_and_type_optional_in_group() {
        let group: Array = [
            ("tmp_name", Value::from(Array::list(["/tmp/a"]))),
            ("error", Value::from(Array::list([0]))),
            ("size", Value::from(Array::list([5]))),
        ]
        .into_iter()
        .collect();
        let tree = create_from_globals([("upload", FileInput::from(group))]).unwrap();
        let file = file_at(&tree, &["upload".into(), 0.into()]);
        assert!(file.client_filename().is_none());
        assert!(file.client_media_type().is_none());
    }

    #[test]
    fn test_invalid_top_level_values() {
        for value in [
            Value::Null,
            Value::Bool(true),
            Value::Bool(false),
            Value::Int(1),
            Value::Float(1.1),
            Value::from("string"),
        ] {
            let err = create_from_globals([(0usize, FileInput::from(value))]).unwrap_err();
            assert!(err.is_input_shape());
        }
    }

    #[test]
    fn test_one_dimensional_descriptor_rejected() {
        let descriptor = descriptor("file.txt", "/tmp/phpN3FmFr", 1024);
        let entries: Vec<(Key, FileInput)> = descriptor
            .iter()
            .map(|(k, v)| (k.clone(), FileInput::from(v.clone())))
            .collect();
        assert!(create_from_globals(entries).unwrap_err().is_input_shape());
    }

    #[test]
    fn test_missing_required_keys() {
        for field in ["tmp_name", "error", "size"] {
            let mut single = descriptor("file.txt", "/tmp/a", 1024);
            single.remove(field);
            let err = create_from_globals([("file", FileInput::from(single))]).unwrap_err();
            assert!(err.is_input_shape(), "missing {} should be rejected", field);
        }
    }

    #[test]
    fn test_group_missing_collection() {
        for field in ["error", "size"] {
            let mut group: Array = [
                ("tmp_name", Value::from(Array::list(["/tmp/a", "/tmp/b"]))),
                ("error", Value::from(Array::list([0, 0]))),
                ("size", Value::from(Array::list([1, 2]))),
            ]
            .into_iter()
            .collect();
            group.insert(field, "not-a-collection");
            let err = create_from_globals([("files", FileInput::from(group))]).unwrap_err();
            assert!(err.is_input_shape(), "scalar {} should be rejected", field);
        }
    }

    #[test]
    fn test_group_missing_leaf_entry() {
        let group: Array = [
            ("tmp_name", Value::from(Array::list(["/tmp/a", "/tmp/b"]))),
            ("error", Value::from(Array::list([0, 0]))),
            ("size", Value::from(Array::list([1]))),
        ]
        .into_iter()
        .collect();
        let err = create_from_globals([("files", FileInput::from(group))]).unwrap_err();
        assert!(err.is_input_shape());
    }

    #[test]
    fn test_unknown_error_code() {
        let mut single = descriptor("file.txt", "/tmp/a", 1);
        single.insert("error", 99);
        let err = create_from_globals([("file", FileInput::from(single))]).unwrap_err();
        assert!(matches!(err, Error::InvalidUploadedFile(_)));
        assert!(err.is_validation());
        assert!(!err.is_input_shape());
    }

    #[test]
    fn test_failed_upload_kept_in_tree() {
        let mut single = descriptor("", "", 0);
        single.insert("error", 4);
        let tree = create_from_globals([("file", FileInput::from(single))]).unwrap();
        assert_eq!(file_at(&tree, &["file".into()]).error(), UploadError::NoFile);
    }
}
