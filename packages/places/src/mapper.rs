//! Raw place category -> [`GehlCategory`] mapping.

use std::collections::{BTreeMap, BTreeSet};

use gehl_map_places_models::{CategoryMappingConfig, GehlCategory};

use crate::PlacesError;

/// Total mapping from raw Overture categories to Gehl categories.
///
/// Built once from a [`CategoryMappingConfig`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct CategoryMapper {
    mappings: BTreeMap<String, GehlCategory>,
    unmapped_label: String,
}

/// Result of mapping a batch of raw categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categorised {
    /// One category per input, in input order.
    pub categories: Vec<GehlCategory>,
    /// Distinct raw categories that fell back to [`GehlCategory::Unmapped`].
    pub unmapped: BTreeSet<String>,
}

impl CategoryMapper {
    /// Builds a mapper from a mapping config.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::InvalidMapping`] if a raw category is mapped
    /// to the fallback instead of a target category, or if the fallback
    /// label is empty.
    pub fn new(config: CategoryMappingConfig) -> Result<Self, PlacesError> {
        if let Some((raw, _)) = config
            .gehl_category_mappings
            .iter()
            .find(|(_, category)| !category.is_target())
        {
            return Err(PlacesError::InvalidMapping {
                message: format!("'{raw}' must map to one of social, necessary, optional, other"),
            });
        }
        if config.unmapped_category.trim().is_empty() {
            return Err(PlacesError::InvalidMapping {
                message: "unmapped_category must not be empty".to_string(),
            });
        }

        Ok(Self {
            mappings: config.gehl_category_mappings,
            unmapped_label: config.unmapped_category,
        })
    }

    /// Maps one raw category. Absent and unknown categories map to
    /// [`GehlCategory::Unmapped`].
    #[must_use]
    pub fn map(&self, raw: Option<&str>) -> GehlCategory {
        raw.and_then(|r| self.mappings.get(r))
            .copied()
            .unwrap_or(GehlCategory::Unmapped)
    }

    /// The string written to output for a category. The fallback uses the
    /// configured label.
    #[must_use]
    pub fn label(&self, category: GehlCategory) -> &str {
        match category {
            GehlCategory::Unmapped => &self.unmapped_label,
            other => <&'static str>::from(other),
        }
    }

    /// Maps a batch of raw categories and collects the distinct raw values
    /// that had no mapping. Missing raw values map to the fallback but have
    /// no label to report.
    pub fn categorise<'a>(&self, raws: impl IntoIterator<Item = Option<&'a str>>) -> Categorised {
        let mut unmapped = BTreeSet::new();
        let categories = raws
            .into_iter()
            .map(|raw| {
                let category = self.map(raw);
                if category == GehlCategory::Unmapped
                    && let Some(raw) = raw
                {
                    unmapped.insert(raw.to_string());
                }
                category
            })
            .collect();

        Categorised {
            categories,
            unmapped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mapper() -> CategoryMapper {
        CategoryMapper::new(CategoryMappingConfig {
            gehl_category_mappings: BTreeMap::from([
                ("cafe".to_string(), GehlCategory::Social),
                ("bar".to_string(), GehlCategory::Social),
                ("supermarket".to_string(), GehlCategory::Necessary),
                ("park".to_string(), GehlCategory::Optional),
                ("atm".to_string(), GehlCategory::Other),
            ]),
            unmapped_category: "unmapped".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn maps_known_categories() {
        let mapper = mapper();
        assert_eq!(mapper.map(Some("cafe")), GehlCategory::Social);
        assert_eq!(mapper.map(Some("supermarket")), GehlCategory::Necessary);
        assert_eq!(mapper.map(Some("park")), GehlCategory::Optional);
        assert_eq!(mapper.map(Some("atm")), GehlCategory::Other);
    }

    #[test]
    fn unknown_and_missing_fall_back() {
        let mapper = mapper();
        assert_eq!(mapper.map(Some("cathedral")), GehlCategory::Unmapped);
        assert_eq!(mapper.map(Some("Cafe")), GehlCategory::Unmapped);
        assert_eq!(mapper.map(None), GehlCategory::Unmapped);
    }

    #[test]
    fn collects_distinct_unmapped() {
        let result = mapper().categorise([
            Some("cafe"),
            Some("cathedral"),
            None,
            Some("sauna"),
            Some("cathedral"),
        ]);
        assert_eq!(
            result.categories,
            [
                GehlCategory::Social,
                GehlCategory::Unmapped,
                GehlCategory::Unmapped,
                GehlCategory::Unmapped,
                GehlCategory::Unmapped,
            ]
        );
        assert_eq!(
            result.unmapped.into_iter().collect::<Vec<_>>(),
            ["cathedral", "sauna"]
        );
    }

    #[test]
    fn labels_use_configured_fallback() {
        let mapper = CategoryMapper::new(CategoryMappingConfig {
            gehl_category_mappings: BTreeMap::new(),
            unmapped_category: "Unmapped".to_string(),
        })
        .unwrap();
        assert_eq!(mapper.label(GehlCategory::Unmapped), "Unmapped");
        assert_eq!(mapper.label(GehlCategory::Social), "social");
    }

    #[test]
    fn target_labels_outlive_the_category_value() {
        let mapper = mapper();
        let labels: Vec<&str> = GehlCategory::TARGETS
            .into_iter()
            .map(|category| mapper.label(category))
            .collect();
        assert_eq!(labels, ["social", "necessary", "optional", "other"]);
    }

    #[test]
    fn rejects_mapping_to_fallback() {
        let err = CategoryMapper::new(CategoryMappingConfig {
            gehl_category_mappings: BTreeMap::from([(
                "cafe".to_string(),
                GehlCategory::Unmapped,
            )]),
            unmapped_category: "unmapped".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, PlacesError::InvalidMapping { .. }));
    }

    proptest! {
        #[test]
        fn unmapped_set_is_exactly_the_absent_raw_categories(
            raws in proptest::collection::vec("[a-z]{1,8}", 0..40)
        ) {
            let mapper = mapper();
            let result = mapper.categorise(raws.iter().map(|r| Some(r.as_str())));

            let expected: BTreeSet<String> = raws
                .iter()
                .filter(|r| !["cafe", "bar", "supermarket", "park", "atm"].contains(&r.as_str()))
                .cloned()
                .collect();
            prop_assert_eq!(&result.unmapped, &expected);
            prop_assert_eq!(result.categories.len(), raws.len());
            for (raw, category) in raws.iter().zip(&result.categories) {
                prop_assert_eq!(
                    *category == GehlCategory::Unmapped,
                    expected.contains(raw)
                );
            }
        }
    }
}
