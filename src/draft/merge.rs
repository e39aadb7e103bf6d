//! Draft merging: folds a new extraction into the previous draft.
//!
//! Concrete incoming values win; `Unknown` and `Absent` never erase what the
//! user already said. An `Unknown` over a field never mentioned is kept, so
//! the draft records that the extractor looked and found nothing. List fields are replaced wholesale by a non-empty
//! restatement rather than appended to.

use crate::draft::types::{EventDraft, Host, Location, Occurrence, Price, Slot};

/// Merge `incoming` over `previous`, producing a new draft. Neither input is modified.
pub fn merge(previous: &EventDraft, incoming: &EventDraft) -> EventDraft {
    EventDraft {
        title: pick(&previous.title, &incoming.title),
        description: pick(&previous.description, &incoming.description),
        price: Price {
            value: pick(&previous.price.value, &incoming.price.value),
            text: pick(&previous.price.text, &incoming.price.text),
            currency: pick(&previous.price.currency, &incoming.price.currency),
        },
        town: pick(&previous.town, &incoming.town),
        host: Host {
            name: pick(&previous.host.name, &incoming.host.name),
            phone_contact: pick(&previous.host.phone_contact, &incoming.host.phone_contact),
            social_handle: pick(&previous.host.social_handle, &incoming.host.social_handle),
        },
        location: Location {
            name: pick(&previous.location.name, &incoming.location.name),
            address: pick(&previous.location.address, &incoming.location.address),
            lat: pick(&previous.location.lat, &incoming.location.lat),
            lng: pick(&previous.location.lng, &incoming.location.lng),
        },
        tags: pick_list(&previous.tags, &incoming.tags),
        image_url: pick(&previous.image_url, &incoming.image_url),
        links: pick_list(&previous.links, &incoming.links),
        recurrence_rule: pick(&previous.recurrence_rule, &incoming.recurrence_rule),
        is_on_demand: pick(&previous.is_on_demand, &incoming.is_on_demand),
        occurrences: pick_occurrences(&previous.occurrences, &incoming.occurrences),
    }
}

fn pick<T: Clone>(previous: &Slot<T>, incoming: &Slot<T>) -> Slot<T> {
    match incoming {
        Slot::Known(value) => Slot::Known(value.clone()),
        Slot::Unknown if previous.is_absent() => Slot::Unknown,
        Slot::Unknown | Slot::Absent => previous.clone(),
    }
}

fn pick_list<T: Clone>(previous: &Slot<Vec<T>>, incoming: &Slot<Vec<T>>) -> Slot<Vec<T>> {
    match incoming {
        Slot::Known(items) if !items.is_empty() => Slot::Known(items.clone()),
        _ => previous.clone(),
    }
}

/// Occurrences carrying no concrete time at all do not count as a restatement.
fn pick_occurrences(
    previous: &Slot<Vec<Occurrence>>,
    incoming: &Slot<Vec<Occurrence>>,
) -> Slot<Vec<Occurrence>> {
    let timed: Vec<Occurrence> = incoming
        .known()
        .map(|occ| occ.iter().filter(|o| o.has_time()).cloned().collect())
        .unwrap_or_default();

    if timed.is_empty() {
        previous.clone()
    } else {
        Slot::Known(timed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::completeness::check;
    use crate::draft::types::{Link, Timestamp};

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn full_draft() -> EventDraft {
        EventDraft {
            title: "Salsa night".into(),
            description: "Beginners welcome".into(),
            town: "Cabarete".into(),
            host: Host {
                name: "Mia".into(),
                phone_contact: "+1 809 555 0100".into(),
                ..Default::default()
            },
            location: Location {
                name: "La Casita".into(),
                ..Default::default()
            },
            tags: Slot::Known(vec!["dance".into(), "salsa".into()]),
            links: Slot::Known(vec![Link {
                url: "https://example.com".into(),
                text: "Tickets".into(),
            }]),
            occurrences: Slot::Known(vec![Occurrence::starting(ts("2025-06-01T20:00:00-04:00"))]),
            ..Default::default()
        }
    }

    #[test]
    fn merging_nothing_changes_nothing() {
        let draft = full_draft();
        assert_eq!(merge(&draft, &EventDraft::default()), draft);
        assert_eq!(merge(&EventDraft::default(), &EventDraft::default()), EventDraft::default());
    }

    #[test]
    fn latest_value_wins() {
        let a = EventDraft {
            title: "A".into(),
            ..Default::default()
        };
        let b = EventDraft {
            title: "B".into(),
            ..Default::default()
        };
        let merged = merge(&merge(&EventDraft::default(), &a), &b);
        assert_eq!(merged.title, Slot::Known("B".to_string()));
    }

    #[test]
    fn unknown_does_not_erase_known() {
        let incoming = EventDraft {
            title: Slot::Unknown,
            host: Host {
                name: Slot::Unknown,
                ..Default::default()
            },
            ..Default::default()
        };
        let merged = merge(&full_draft(), &incoming);
        assert_eq!(merged.title, Slot::Known("Salsa night".to_string()));
        assert_eq!(merged.host.name, Slot::Known("Mia".to_string()));
    }

    #[test]
    fn unknown_over_absent_is_recorded() {
        let incoming = EventDraft {
            title: Slot::Unknown,
            location: Location {
                name: Slot::Unknown,
                ..Default::default()
            },
            ..Default::default()
        };
        let merged = merge(&EventDraft::default(), &incoming);
        assert_eq!(merged.title, Slot::Unknown);
        assert_eq!(merged.location.name, Slot::Unknown);
        assert_eq!(merged.host.name, Slot::Absent);

        // a later absent value does not clear the marker
        assert_eq!(merge(&merged, &EventDraft::default()), merged);
    }

    #[test]
    fn nested_fields_merge_independently() {
        let incoming = EventDraft {
            host: Host {
                social_handle: "@mia".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let merged = merge(&full_draft(), &incoming);
        assert_eq!(merged.host.name, Slot::Known("Mia".to_string()));
        assert_eq!(merged.host.phone_contact, Slot::Known("+1 809 555 0100".to_string()));
        assert_eq!(merged.host.social_handle, Slot::Known("@mia".to_string()));
    }

    #[test]
    fn non_empty_lists_replace() {
        let incoming = EventDraft {
            tags: Slot::Known(vec!["bachata".into()]),
            ..Default::default()
        };
        let merged = merge(&full_draft(), &incoming);
        assert_eq!(merged.tags, Slot::Known(vec!["bachata".to_string()]));
    }

    #[test]
    fn empty_lists_keep_previous() {
        let incoming = EventDraft {
            tags: Slot::Known(vec![]),
            links: Slot::Known(vec![]),
            occurrences: Slot::Known(vec![]),
            ..Default::default()
        };
        assert_eq!(merge(&full_draft(), &incoming), full_draft());
    }

    #[test]
    fn occurrences_restatement_replaces_wholesale() {
        let incoming = EventDraft {
            occurrences: Slot::Known(vec![
                Occurrence::starting(ts("2025-06-08T19:00:00-04:00")),
                Occurrence::starting(ts("2025-06-15T19:00:00-04:00")),
            ]),
            ..Default::default()
        };
        let merged = merge(&full_draft(), &incoming);
        let occ = merged.occurrences.known().unwrap();
        assert_eq!(occ.len(), 2);
        assert_eq!(occ[0].start_ts, Slot::Known(ts("2025-06-08T19:00:00-04:00")));
    }

    #[test]
    fn timeless_occurrences_do_not_replace() {
        let incoming = EventDraft {
            occurrences: Slot::Known(vec![Occurrence {
                start_ts: Slot::Unknown,
                end_ts: Slot::Unknown,
            }]),
            ..Default::default()
        };
        let merged = merge(&full_draft(), &incoming);
        assert_eq!(merged.occurrences, full_draft().occurrences);
    }

    #[test]
    fn completeness_survives_unknown_only_merges() {
        let draft = full_draft();
        assert!(check(&draft).complete);

        let unknowns = EventDraft {
            title: Slot::Unknown,
            town: Slot::Unknown,
            host: Host {
                name: Slot::Unknown,
                phone_contact: Slot::Unknown,
                social_handle: Slot::Unknown,
            },
            location: Location {
                name: Slot::Unknown,
                address: Slot::Unknown,
                lat: Slot::Unknown,
                lng: Slot::Unknown,
            },
            occurrences: Slot::Unknown,
            tags: Slot::Unknown,
            ..Default::default()
        };
        assert!(check(&merge(&draft, &unknowns)).complete);
    }
}
