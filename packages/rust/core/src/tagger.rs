//! Region/language inference from VTC names.

use tracing::{debug, info};

use vtcfinder_shared::{Result, VtcRecord};
use vtcfinder_storage::CatalogStore;

/// `(keyword, region, language)` hints, checked in order against the
/// lowercased name. The first keyword found wins, so more specific
/// keywords must come before any keyword they contain.
pub const REGION_LANGUAGE_HINTS: &[(&str, &str, &str)] = &[
    // Turkey
    ("turk", "TR", "tr"),
    ("türk", "TR", "tr"),
    ("turkiye", "TR", "tr"),
    ("türkiye", "TR", "tr"),
    // Poland
    ("poland", "PL", "pl"),
    ("polska", "PL", "pl"),
    // Germany
    ("german", "DE", "de"),
    ("deutsch", "DE", "de"),
    ("deutschland", "DE", "de"),
    // Spain
    ("spain", "ES", "es"),
    ("españa", "ES", "es"),
    ("espana", "ES", "es"),
    // France
    ("france", "FR", "fr"),
    ("français", "FR", "fr"),
    ("francais", "FR", "fr"),
    // Italy
    ("italy", "IT", "it"),
    ("italia", "IT", "it"),
    // Portugal / Brazil
    ("portugal", "PT", "pt"),
    ("portuguese", "PT", "pt"),
    ("brasil", "BR", "pt"),
    ("brazil", "BR", "pt"),
    // UK / English (trailing space keeps "uk" from matching inside words)
    ("uk ", "UK", "en"),
    ("united kingdom", "UK", "en"),
    ("england", "UK", "en"),
    ("scotland", "UK", "en"),
    ("wales", "UK", "en"),
    // China
    ("china", "CN", "zh"),
    ("中国", "CN", "zh"),
    // Philippines
    ("philippines", "PH", "en"),
    ("philippine", "PH", "en"),
    // India
    ("india", "IN", "en"),
    // Arabic world
    ("arab", "ARAB", "ar"),
    ("saudi", "SA", "ar"),
    ("egypt", "EG", "ar"),
    // Generic Europe
    ("europe", "EU", "en"),
    ("european", "EU", "en"),
];

/// First `(region, language)` whose keyword occurs in `name`.
pub fn infer_region_language(name: &str) -> Option<(&'static str, &'static str)> {
    let text = name.to_lowercase();
    REGION_LANGUAGE_HINTS
        .iter()
        .find(|(keyword, _, _)| text.contains(keyword))
        .map(|&(_, region, language)| (region, language))
}

/// Counters from a tagging pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagReport {
    /// Records whose name matched a hint (whether or not a field changed).
    pub matched: usize,
    /// Records in the catalog.
    pub total: usize,
}

/// Fill in missing `region`/`language` from each record's name.
///
/// Existing values are never replaced, records without a name are skipped,
/// and running it twice changes nothing the first run did not.
pub fn tag(records: &mut [VtcRecord]) -> TagReport {
    let mut report = TagReport {
        total: records.len(),
        ..Default::default()
    };

    for record in records.iter_mut() {
        if record.region().is_some() && record.language().is_some() {
            continue;
        }
        let Some(name) = record.name() else {
            continue;
        };
        let Some((region, language)) = infer_region_language(name) else {
            continue;
        };

        debug!(vtc_id = record.id, region, language, "inferred from name");
        if record.region().is_none() {
            record.region = Some(region.to_string());
        }
        if record.language().is_none() {
            record.language = Some(language.to_string());
        }
        report.matched += 1;
    }

    report
}

/// Tag the catalog file in place. An empty catalog is left unwritten.
pub fn tag_catalog(store: &CatalogStore) -> Result<TagReport> {
    let mut records = store.load();
    if records.is_empty() {
        info!(path = %store.path().display(), "catalog is empty, nothing to tag");
        return Ok(TagReport::default());
    }

    let report = tag(&mut records);
    info!(
        matched = report.matched,
        total = report.total,
        "updated region/language"
    );

    store.save(&records)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn named(id: u64, name: &str) -> VtcRecord {
        VtcRecord {
            name: Some(name.into()),
            ..VtcRecord::skeleton(id)
        }
    }

    #[test]
    fn first_matching_keyword_wins() {
        assert_eq!(infer_region_language("Türk Lojistik"), Some(("TR", "tr")));
        assert_eq!(infer_region_language("German Express"), Some(("DE", "de")));
        // "european" also contains "europe"; both map to EU.
        assert_eq!(infer_region_language("European Haulers"), Some(("EU", "en")));
        // "arab" appears before "saudi" in the table.
        assert_eq!(infer_region_language("Saudi Arabia Movers"), Some(("ARAB", "ar")));
        assert_eq!(infer_region_language("Nordic Haulers"), None);
    }

    #[test]
    fn uk_keyword_needs_trailing_space() {
        assert_eq!(infer_region_language("UK Convoy Crew"), Some(("UK", "en")));
        assert_eq!(infer_region_language("Ukulele Logistics"), None);
    }

    #[test]
    fn fills_only_unset_fields() {
        let mut records = vec![
            VtcRecord {
                region: Some("NL".into()),
                ..named(1, "Polska Trans")
            },
            named(2, "Italia Cargo"),
            named(3, "Mystery Movers"),
            VtcRecord::skeleton(4),
        ];

        let report = tag(&mut records);

        assert_eq!(report, TagReport { matched: 2, total: 4 });
        assert_eq!(records[0].region.as_deref(), Some("NL"));
        assert_eq!(records[0].language.as_deref(), Some("pl"));
        assert_eq!(records[1].region.as_deref(), Some("IT"));
        assert_eq!(records[1].language.as_deref(), Some("it"));
        assert_eq!(records[2].region, None);
        assert_eq!(records[3].region, None);
    }

    #[test]
    fn empty_strings_are_treated_as_unset() {
        let mut records = vec![VtcRecord {
            region: Some(String::new()),
            language: Some(String::new()),
            ..named(1, "Brazil Road")
        }];
        tag(&mut records);
        assert_eq!(records[0].region.as_deref(), Some("BR"));
        assert_eq!(records[0].language.as_deref(), Some("pt"));
    }

    #[test]
    fn tagging_is_idempotent() {
        let original = vec![
            named(1, "Deutschland Spedition"),
            VtcRecord {
                language: Some("en".into()),
                ..named(2, "India Movers")
            },
            named(3, "Plain Name"),
        ];

        let mut once = original.clone();
        tag(&mut once);
        let mut twice = once.clone();
        tag(&mut twice);

        assert_eq!(once, twice);
        assert_ne!(once, original);
    }

    #[test]
    fn tag_catalog_keeps_records_with_mistyped_fields() {
        let dir = std::env::temp_dir().join(format!("vtcfinder_tag_{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let store = CatalogStore::new(dir.join("vtcs_source.json"));
        std::fs::write(
            store.path(),
            r#"[{"id":1,"name":"Polska Trans"},{"id":2,"name":"Acme","members":"12"},{"id":3,"name":"Beta","discord_invites":null}]"#,
        )
        .unwrap();

        let report = tag_catalog(&store).expect("tag");
        assert_eq!(report, TagReport { matched: 1, total: 3 });

        let saved = store.load();
        let ids: Vec<u64> = saved.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(saved[0].region.as_deref(), Some("PL"));
        assert_eq!(saved[2].name.as_deref(), Some("Beta"));
    }

    #[test]
    fn fully_tagged_records_are_untouched() {
        let record = VtcRecord {
            region: Some("US".into()),
            language: Some("en".into()),
            ..named(1, "Turkish Delight Transport")
        };
        let mut records = vec![record.clone()];
        let report = tag(&mut records);
        assert_eq!(report.matched, 0);
        assert_eq!(records[0], record);
    }
}
