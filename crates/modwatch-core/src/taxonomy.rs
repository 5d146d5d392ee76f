//! Embedded keyword taxonomy backing the safety checker
//!
//! Ten fixed categories, each a list of literal lowercase trigger phrases.
//! The table is immutable after first access; the browser extension fetches
//! it over `/moderation/keywords` so client-side blurring stays in sync
//! with the backend.

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};

/// Category name → trigger phrases.
///
/// A `BTreeMap` keeps category order deterministic in every serialized
/// breakdown. Phrases must already be lowercase; matching never normalizes
/// the table, only the input.
static KEYWORD_CATEGORIES: Lazy<BTreeMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = BTreeMap::new();

    m.insert(
        "self-harm",
        vec![
            "kill myself",
            "suicide",
            "hurt myself",
            "end my life",
            "self harm",
            "cut myself",
            "i want to die",
        ],
    );

    m.insert(
        "violence",
        vec![
            "kill you",
            "kill them",
            "build a bomb",
            "make a bomb",
            "shoot up",
            "murder",
            "stab you",
            "beat you",
            "burn down",
        ],
    );

    m.insert(
        "hate",
        vec![
            "hate crime",
            "genocide",
            "racial slur",
            "kill all",
            "lynch",
            "deport them",
            "inferior race",
        ],
    );

    m.insert(
        "profanity",
        vec![
            "fuck you",
            "shithead",
            "motherfucker",
            "bastard",
            "asshole",
            "bitch",
            "dickhead",
            "cunt",
            "son of a bitch",
            "slut",
            "whore",
        ],
    );

    m.insert(
        "sexual",
        vec![
            "sexual assault",
            "rape",
            "child porn",
            "grooming",
            "explicit sex",
            "force you",
        ],
    );

    m.insert(
        "harassment",
        vec![
            "i will find you",
            "dox you",
            "i will ruin you",
            "stalk you",
            "keep calling you",
            "harass you",
        ],
    );

    m.insert(
        "drugs",
        vec![
            "sell drugs",
            "cocaine",
            "heroin",
            "meth lab",
            "cook meth",
            "buy weed",
        ],
    );

    m.insert(
        "weapons",
        vec![
            "buy a gun",
            "illegal gun",
            "assault rifle",
            "ghost gun",
            "buy explosives",
            "weapon cache",
        ],
    );

    m.insert(
        "terrorism",
        vec![
            "join isis",
            "terror attack",
            "blow up",
            "jihad attack",
            "martyr mission",
        ],
    );

    m.insert(
        "bullying",
        vec![
            "kill yourself",
            "nobody likes you",
            "you should die",
            "loser forever",
            "go die",
        ],
    );

    m
});

/// Get the full category → phrases mapping.
pub fn categories() -> &'static BTreeMap<&'static str, Vec<&'static str>> {
    &KEYWORD_CATEGORIES
}

/// Return every trigger phrase across all categories, sorted and
/// deduplicated (case-normalized union).
pub fn all_keywords() -> Vec<String> {
    let unique: BTreeSet<String> = KEYWORD_CATEGORIES
        .values()
        .flatten()
        .map(|phrase| phrase.trim().to_lowercase())
        .filter(|phrase| !phrase.is_empty())
        .collect();
    unique.into_iter().collect()
}
