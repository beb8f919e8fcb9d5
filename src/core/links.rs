use crate::core::normalize::{clean_mb_id_str, is_missing_id};
use crate::domain::model::ProductRecord;
use crate::domain::settings::LinkTemplates;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static TRAILING_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\w+$").expect("extension pattern is valid"));

/// MB ID → `image_src`, built from the product CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMap {
    entries: HashMap<String, String>,
}

impl ImageMap {
    pub fn get(&self, mb_id: &str) -> Option<&str> {
        self.entries.get(mb_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn build_image_map(products: &[ProductRecord]) -> ImageMap {
    let mut entries = HashMap::new();
    for product in products {
        let mb_id = clean_mb_id_str(&product.mb_id);
        let image_src = product.image_src.trim();
        if is_missing_id(&mb_id) || image_src.is_empty() || image_src.eq_ignore_ascii_case("nan")
        {
            continue;
        }
        entries.insert(mb_id, image_src.to_string());
    }
    ImageMap { entries }
}

fn join_base(base: &str, path: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

impl LinkTemplates {
    /// Product image on the MB file server; blank when there is no source.
    pub fn mb_image_link(&self, image_src: &str) -> String {
        if image_src.is_empty() {
            return String::new();
        }
        join_base(&self.mb_image_base_url, image_src)
    }

    /// PNG rendition of the same file in the design bucket.
    pub fn design_image_link(&self, image_src: &str) -> String {
        if image_src.is_empty() {
            return String::new();
        }
        let png = TRAILING_EXTENSION.replace(image_src, ".png");
        join_base(&self.design_image_base_url, &png)
    }
}
