#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    write_file(path, &bmp_bytes(width, height));
}

pub fn write_file(path: &Path, content: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write file");
}

/// One attribute entry under `ObjectInfo.BoundingBox`.
pub fn part(opened: Option<bool>, position: Option<[f64; 4]>) -> Value {
    let mut value = json!({
        "isVisible": position.is_some(),
        "Position": position.map(|p| p.to_vec()).unwrap_or_default(),
    });
    if let Some(opened) = opened {
        value["Opened"] = json!(opened);
    }
    value
}

/// Builder for annotation JSON documents.
pub struct AnnotationBuilder {
    width: u32,
    height: u32,
    parts: serde_json::Map<String, Value>,
}

impl AnnotationBuilder {
    /// All parts hidden, eyes and mouth marked open.
    pub fn new(width: u32, height: u32) -> Self {
        let mut parts = serde_json::Map::new();
        for key in ["Leye", "Reye", "Mouth"] {
            parts.insert(key.to_string(), part(Some(true), None));
        }
        for key in ["Phone", "Cigar"] {
            parts.insert(key.to_string(), part(None, None));
        }
        Self {
            width,
            height,
            parts,
        }
    }

    pub fn set(mut self, key: &str, opened: Option<bool>, position: Option<[f64; 4]>) -> Self {
        self.parts.insert(key.to_string(), part(opened, position));
        self
    }

    pub fn to_json(&self) -> String {
        json!({
            "FileInfo": { "Width": self.width, "Height": self.height },
            "ObjectInfo": { "BoundingBox": Value::Object(self.parts.clone()) },
        })
        .to_string()
    }

    pub fn write(&self, path: &Path) {
        write_file(path, self.to_json());
    }
}

/// Both eyes closed and visible, on a 640x480 image.
pub fn closed_eyes() -> AnnotationBuilder {
    AnnotationBuilder::new(640, 480)
        .set("Leye", Some(false), Some([100.0, 100.0, 140.0, 120.0]))
        .set("Reye", Some(false), Some([200.0, 100.0, 240.0, 120.0]))
}

/// Sorted relative paths of every file under `root`.
pub fn list_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .expect("under root")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

/// Create `<root>/images/<rel>.bmp` and, when `labelled`, a matching label
/// file with one line per class id.
pub fn add_image(root: &Path, rel_stem: &str, class_ids: Option<&[u32]>) {
    write_bmp(&root.join("images").join(format!("{rel_stem}.bmp")), 4, 4);
    if let Some(ids) = class_ids {
        let content: String = ids
            .iter()
            .map(|id| format!("{id} 0.500000 0.500000 0.250000 0.250000\n"))
            .collect();
        write_file(&root.join("labels").join(format!("{rel_stem}.txt")), content);
    }
}
