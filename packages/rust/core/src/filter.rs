//! Candidate filtering over a loaded catalog.
//!
//! Pure: the catalog is borrowed, survivors are cloned and annotated.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use vtcfinder_shared::{Recruitment, VtcFinderError, VtcId, VtcRecord, VtcStatus};

/// Which game a VTC must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameFilter {
    Ets2,
    Ats,
    /// Both games required.
    Both,
}

impl GameFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ets2 => "ets2",
            Self::Ats => "ats",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for GameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameFilter {
    type Err = VtcFinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ets2" => Ok(Self::Ets2),
            "ats" => Ok(Self::Ats),
            "both" => Ok(Self::Both),
            other => Err(VtcFinderError::validation(format!(
                "unknown game filter '{other}' (expected ets2, ats or both)"
            ))),
        }
    }
}

/// Filter criteria. Every field is optional; the default keeps everything.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub allowed_statuses: Option<BTreeSet<VtcStatus>>,
    pub game: Option<GameFilter>,
    pub recruitment_only_open: bool,
    /// Only known positive member counts below this are excluded.
    pub min_members: Option<u32>,
    /// Case-insensitive substring of the record's language code.
    pub language: Option<String>,
}

impl FilterCriteria {
    fn matches(&self, record: &VtcRecord) -> bool {
        if let Some(allowed) = &self.allowed_statuses {
            if !allowed.contains(&record.status_or_default()) {
                return false;
            }
        }

        if let Some(game) = self.game {
            let flags = record.game_flags();
            let ok = match game {
                GameFilter::Ets2 => flags.ets2,
                GameFilter::Ats => flags.ats,
                GameFilter::Both => flags.ets2 && flags.ats,
            };
            if !ok {
                return false;
            }
        }

        if self.recruitment_only_open && record.recruitment_or_default() == Recruitment::Closed {
            return false;
        }

        if let (Some(min), Some(members)) = (self.min_members, record.known_members()) {
            if members < min {
                return false;
            }
        }

        if let Some(wanted) = self.language_filter() {
            match record.language() {
                Some(language) if language.to_lowercase().contains(&wanted) => {}
                _ => return false,
            }
        }

        true
    }

    /// Lowercased language constraint, `None` when unset or blank.
    fn language_filter(&self) -> Option<String> {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// A record that passed the filter, annotated with its status class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredVtc {
    #[serde(flatten)]
    pub record: VtcRecord,
    /// Lowercased status, `normal` when unset.
    pub status_class: String,
}

impl FilteredVtc {
    fn new(record: &VtcRecord) -> Self {
        let mut record = record.clone();
        // A stale annotation carried in `extra` would serialize twice.
        record.extra.remove("status_class");
        let status_class = record.status_or_default().as_str().to_string();
        Self {
            record,
            status_class,
        }
    }
}

/// Apply `criteria` to `catalog`, excluding every id in `busy` first.
///
/// Output keeps catalog order.
pub fn filter(
    catalog: &[VtcRecord],
    busy: &HashSet<VtcId>,
    criteria: &FilterCriteria,
) -> Vec<FilteredVtc> {
    catalog
        .iter()
        .filter(|record| !busy.contains(&record.id))
        .filter(|record| criteria.matches(record))
        .map(FilteredVtc::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtcfinder_shared::Game;

    fn vtc(id: VtcId) -> VtcRecord {
        VtcRecord {
            name: Some(format!("VTC #{id}")),
            ..VtcRecord::skeleton(id)
        }
    }

    fn ids(result: &[FilteredVtc]) -> Vec<VtcId> {
        result.iter().map(|f| f.record.id).collect()
    }

    #[test]
    fn no_criteria_keeps_everything_in_order() {
        let catalog = vec![vtc(3), vtc(1), vtc(2)];
        let result = filter(&catalog, &HashSet::new(), &FilterCriteria::default());
        assert_eq!(ids(&result), vec![3, 1, 2]);
        assert!(result.iter().all(|f| f.status_class == "normal"));
    }

    #[test]
    fn busy_ids_are_always_excluded() {
        let catalog = vec![vtc(1), vtc(2), vtc(3)];
        let busy: HashSet<VtcId> = [2, 99].into_iter().collect();
        let result = filter(&catalog, &busy, &FilterCriteria::default());
        assert_eq!(ids(&result), vec![1, 3]);
    }

    #[test]
    fn status_filter_treats_unset_as_normal() {
        let catalog = vec![
            VtcRecord {
                status: Some(VtcStatus::Verified),
                ..vtc(1)
            },
            VtcRecord {
                status: Some(VtcStatus::Validated),
                ..vtc(2)
            },
            vtc(3),
        ];
        let criteria = FilterCriteria {
            allowed_statuses: Some([VtcStatus::Verified, VtcStatus::Normal].into()),
            ..Default::default()
        };
        let result = filter(&catalog, &HashSet::new(), &criteria);
        assert_eq!(ids(&result), vec![1, 3]);
        assert_eq!(result[0].status_class, "verified");
        assert_eq!(result[1].status_class, "normal");
    }

    #[test]
    fn unrecognised_stored_status_counts_as_normal() {
        let stored: VtcRecord =
            serde_json::from_str(r#"{"id": 8, "status": "partner"}"#).unwrap();
        let catalog = vec![stored];

        let normal_only = FilterCriteria {
            allowed_statuses: Some([VtcStatus::Normal].into()),
            ..Default::default()
        };
        let result = filter(&catalog, &HashSet::new(), &normal_only);
        assert_eq!(ids(&result), vec![8]);
        assert_eq!(result[0].status_class, "normal");

        let verified_only = FilterCriteria {
            allowed_statuses: Some([VtcStatus::Verified].into()),
            ..Default::default()
        };
        assert!(filter(&catalog, &HashSet::new(), &verified_only).is_empty());
    }

    #[test]
    fn game_filter_uses_derived_flags() {
        let with_games = |id, games: &[Game]| VtcRecord {
            games: games.iter().copied().collect(),
            ..vtc(id)
        };
        let catalog = vec![
            with_games(1, &[Game::Ets2]),
            with_games(2, &[Game::Ats]),
            with_games(3, &[Game::Ets2, Game::Ats]),
            with_games(4, &[]),
        ];

        let run = |game| {
            let criteria = FilterCriteria {
                game: Some(game),
                ..Default::default()
            };
            ids(&filter(&catalog, &HashSet::new(), &criteria))
        };

        assert_eq!(run(GameFilter::Ets2), vec![1, 3]);
        assert_eq!(run(GameFilter::Ats), vec![2, 3]);
        assert_eq!(run(GameFilter::Both), vec![3]);
    }

    #[test]
    fn only_open_drops_closed_but_keeps_unknown() {
        let catalog = vec![
            VtcRecord {
                recruitment: Some(Recruitment::Open),
                ..vtc(1)
            },
            VtcRecord {
                recruitment: Some(Recruitment::Closed),
                ..vtc(2)
            },
            VtcRecord {
                recruitment: Some(Recruitment::Unknown),
                ..vtc(3)
            },
            vtc(4),
        ];
        let criteria = FilterCriteria {
            recruitment_only_open: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter(&catalog, &HashSet::new(), &criteria)), vec![1, 3, 4]);
    }

    #[test]
    fn unknown_member_counts_survive_min_members() {
        let catalog = vec![
            VtcRecord {
                members: Some(0),
                ..vtc(1)
            },
            vtc(2),
            VtcRecord {
                members: Some(5),
                ..vtc(3)
            },
            VtcRecord {
                members: Some(50),
                ..vtc(4)
            },
        ];
        let criteria = FilterCriteria {
            min_members: Some(10),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&catalog, &HashSet::new(), &criteria)), vec![1, 2, 4]);

        let zero = FilterCriteria {
            min_members: Some(0),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&catalog, &HashSet::new(), &zero)).len(), 4);
    }

    #[test]
    fn language_is_a_case_insensitive_substring() {
        let catalog = vec![
            VtcRecord {
                language: Some("DE".into()),
                ..vtc(1)
            },
            VtcRecord {
                language: Some("en".into()),
                ..vtc(2)
            },
            vtc(3),
        ];
        let criteria = FilterCriteria {
            language: Some("de".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&catalog, &HashSet::new(), &criteria)), vec![1]);

        let blank = FilterCriteria {
            language: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter(&catalog, &HashSet::new(), &blank)).len(), 3);
    }

    #[test]
    fn input_is_not_mutated_and_output_is_annotated() {
        let mut record = VtcRecord {
            status: Some(VtcStatus::Validated),
            ..vtc(7)
        };
        record
            .extra
            .insert("status_class".into(), serde_json::json!("stale"));
        let catalog = vec![record.clone()];

        let result = filter(&catalog, &HashSet::new(), &FilterCriteria::default());

        assert_eq!(catalog[0], record);
        let json = serde_json::to_value(&result[0]).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["status_class"], "validated");
        assert_eq!(json["status"], "validated");
    }

    #[test]
    fn game_filter_parses_case_insensitively() {
        assert_eq!("ETS2".parse::<GameFilter>().unwrap(), GameFilter::Ets2);
        assert_eq!(" both ".parse::<GameFilter>().unwrap(), GameFilter::Both);
        assert!("trucks".parse::<GameFilter>().is_err());
    }
}
